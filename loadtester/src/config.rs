use std::{fmt, str::FromStr, time::Duration};

use rama::{error::BoxError, http::Uri};

/// Applied to every request unless overwritten with
/// [`LoadTestConfig::with_request_timeout`].
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// How request tasks are scheduled onto the runtime.
///
/// Both modes cap the amount of in flight requests
/// to the configured concurrency width.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DispatchMode {
    /// One task per request, gated by a semaphore,
    /// outcomes funneled over a channel into a single aggregator.
    #[default]
    FanOut,
    /// A fixed pool of workers, each running one request at a time,
    /// recording into a lock guarded aggregator.
    WorkerPool,
}

impl DispatchMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FanOut => "fan-out",
            Self::WorkerPool => "worker-pool",
        }
    }
}

impl fmt::Display for DispatchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DispatchMode {
    type Err = BoxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fan-out" | "fanout" => Ok(Self::FanOut),
            "worker-pool" | "pool" => Ok(Self::WorkerPool),
            other => Err(BoxError::from(format!(
                "unknown dispatch mode '{other}' (expected 'fan-out' or 'worker-pool')"
            ))),
        }
    }
}

/// Parameters of a single load test.
///
/// Construct once and pass it to [`crate::run`] as many times as needed;
/// every run starts from zeroed counters.
#[derive(Debug, Clone)]
pub struct LoadTestConfig {
    url: Uri,
    total: usize,
    concurrency: usize,
    request_timeout: Duration,
    mode: DispatchMode,
}

impl LoadTestConfig {
    /// Create a new config, failing when `total` or `concurrency` is zero.
    ///
    /// The target is not resolved nor contacted here,
    /// an unreachable target shows up as transport errors in the report.
    pub fn try_new(url: Uri, total: usize, concurrency: usize) -> Result<Self, BoxError> {
        let cfg = Self {
            url,
            total,
            concurrency,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            mode: DispatchMode::default(),
        };
        cfg.validate()?;
        Ok(cfg)
    }

    rama::utils::macros::generate_set_and_with! {
        /// Set the timeout applied to each individual request.
        pub fn request_timeout(mut self, timeout: Duration) -> Self {
            self.request_timeout = timeout;
            self
        }
    }

    rama::utils::macros::generate_set_and_with! {
        /// Set the [`DispatchMode`] used to schedule the requests.
        pub fn dispatch_mode(mut self, mode: DispatchMode) -> Self {
            self.mode = mode;
            self
        }
    }

    /// Check the preconditions of a run.
    ///
    /// Called by [`Self::try_new`] and again at the start of every run,
    /// as the `with_*` setters do not validate.
    pub fn validate(&self) -> Result<(), BoxError> {
        if self.total == 0 {
            return Err(BoxError::from(
                "invalid load test config: total request count must be at least 1",
            ));
        }
        if self.concurrency == 0 {
            return Err(BoxError::from(
                "invalid load test config: concurrency must be at least 1",
            ));
        }
        if self.request_timeout.is_zero() {
            return Err(BoxError::from(
                "invalid load test config: request timeout must be larger than zero",
            ));
        }
        Ok(())
    }

    pub fn url(&self) -> &Uri {
        &self.url
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Amount of requests that can actually be in flight,
    /// which is never more than the total.
    pub fn effective_concurrency(&self) -> usize {
        self.concurrency.min(self.total)
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    pub fn dispatch_mode(&self) -> DispatchMode {
        self.mode
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target() -> Uri {
        Uri::from_static("http://127.0.0.1:8000/api/hello")
    }

    #[test]
    fn test_try_new_rejects_zero_total() {
        assert!(LoadTestConfig::try_new(target(), 0, 1).is_err());
    }

    #[test]
    fn test_try_new_rejects_zero_concurrency() {
        assert!(LoadTestConfig::try_new(target(), 10, 0).is_err());
    }

    #[test]
    fn test_try_new_defaults() {
        let cfg = LoadTestConfig::try_new(target(), 1000, 100).unwrap();
        assert_eq!(1000, cfg.total());
        assert_eq!(100, cfg.concurrency());
        assert_eq!(DEFAULT_REQUEST_TIMEOUT, cfg.request_timeout());
        assert_eq!(DispatchMode::FanOut, cfg.dispatch_mode());
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let cfg = LoadTestConfig::try_new(target(), 1, 1)
            .unwrap()
            .with_request_timeout(Duration::ZERO);
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_effective_concurrency_capped_by_total() {
        let cfg = LoadTestConfig::try_new(target(), 4, 100).unwrap();
        assert_eq!(4, cfg.effective_concurrency());

        let cfg = LoadTestConfig::try_new(target(), 100, 4).unwrap();
        assert_eq!(4, cfg.effective_concurrency());
    }

    #[test]
    fn test_dispatch_mode_from_str() {
        for (input, expected) in [
            ("fan-out", DispatchMode::FanOut),
            ("FanOut", DispatchMode::FanOut),
            ("worker-pool", DispatchMode::WorkerPool),
            (" pool ", DispatchMode::WorkerPool),
        ] {
            assert_eq!(expected, input.parse::<DispatchMode>().unwrap(), "{input}");
        }
        assert!("round-robin".parse::<DispatchMode>().is_err());
    }
}
