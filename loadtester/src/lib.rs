#![cfg_attr(
    not(test),
    warn(clippy::print_stdout, clippy::dbg_macro),
    deny(clippy::unwrap_used, clippy::expect_used)
)]

//! Concurrent HTTP load tester.
//!
//! Issues a fixed number of GET requests against a single target,
//! never keeping more than a configured number of them in flight,
//! and folds every outcome into one [`LoadTestReport`].

pub mod client;
pub mod config;
pub mod mock;
pub mod outcome;
pub mod report;
pub mod runner;
pub mod tally;
pub mod utils;

pub use self::{
    config::{DEFAULT_REQUEST_TIMEOUT, DispatchMode, LoadTestConfig},
    outcome::{ErrorClass, RequestOutcome},
    report::LoadTestReport,
    runner::{run, run_with_client},
    tally::{Aggregator, ErrorTally, TallyEntry},
};
