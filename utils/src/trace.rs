//! Library code only emits `tracing` events; installing a subscriber is left
//! to the embedding binary. `init_test_tracing` is a thin helper for tests
//! and examples across the workspace, gated behind the `test-util` feature.

#[cfg(feature = "test-util")]
static INIT: std::sync::Once = std::sync::Once::new();

/// Install a `fmt` subscriber once for the lifetime of the test binary.
/// Safe to call from every test; later calls are no-ops.
#[cfg(feature = "test-util")]
pub fn init_test_tracing() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    });
}
