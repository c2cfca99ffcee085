/// Runs `$block` and logs how long it took at DEBUG level.
#[macro_export]
macro_rules! timer_debug {
    ($msg:literal, $block:expr) => {{
        let started = jiff::Timestamp::now();
        let result = $block;
        let elapsed = jiff::Timestamp::now().duration_since(started);

        tracing::debug!(elapsed = ?elapsed, "{}", $msg);

        result
    }};
}
