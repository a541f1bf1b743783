use std::time::Duration;

use rama::http::Uri;

use crate::tally::ErrorTally;

mod human;
mod json;

/// Aggregate result of one load test run.
#[derive(Debug, Clone)]
pub struct LoadTestReport {
    pub url: Uri,
    pub concurrency: usize,
    /// Amount of requests issued, always the configured total.
    pub total: usize,
    pub successes: usize,
    pub errors: usize,
    pub tally: ErrorTally,
    /// Wall clock time from before the first dispatch
    /// until after the last outcome got recorded.
    pub elapsed: Duration,
}

impl LoadTestReport {
    /// Requests per elapsed second,
    /// `None` when no measurable time elapsed.
    pub fn throughput(&self) -> Option<f64> {
        let secs = self.elapsed.as_secs_f64();
        (secs > 0.).then(|| self.total as f64 / secs)
    }
}
