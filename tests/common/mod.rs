/// Shared test setup: configure the coroutine stack size and install a
/// tracing subscriber. Mirrors the `GRPCFRAME_STACK_SIZE` parsing the
/// dispatcher uses for handler coroutines.
pub fn setup() {
    let size = std::env::var("GRPCFRAME_STACK_SIZE")
        .ok()
        .and_then(|v| {
            if let Some(hex) = v.strip_prefix("0x") {
                usize::from_str_radix(hex, 16).ok()
            } else {
                v.parse().ok()
            }
        })
        .unwrap_or(0x4000);
    may::config().set_stack_size(size);
    grpcframe::init_tracing();
}
