//! Wall-clock pacing for provider calls.

use litscreen_core::Pacer;
use std::time::Duration;

/// Blocks the calling thread for the requested delay.
///
/// Both the CLI `screen` command and the HTTP API run the pipeline inside
/// `tokio::task::spawn_blocking`, so sleeping here never stalls a runtime
/// worker.
#[derive(Debug, Clone, Copy, Default)]
pub struct SleepPacer;

impl Pacer for SleepPacer {
    fn pause(&self, delay: Duration) {
        if !delay.is_zero() {
            tracing::debug!(delay_ms = delay.as_millis() as u64, "Pacing provider call");
            std::thread::sleep(delay);
        }
    }
}
