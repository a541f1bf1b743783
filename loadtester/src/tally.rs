use std::time::Duration;

use rama::{http::Uri, telemetry::tracing};

use crate::{
    outcome::{ErrorClass, RequestOutcome},
    report::LoadTestReport,
};

/// Occurrences of a single [`ErrorClass`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TallyEntry {
    pub count: usize,
    /// Message of the first error seen for this class.
    pub sample_message: String,
}

/// Error counts per [`ErrorClass`], in order of first occurrence.
///
/// The amount of distinct classes in a run is tiny,
/// hence the linear lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorTally {
    entries: Vec<(ErrorClass, TallyEntry)>,
}

impl ErrorTally {
    pub fn record(&mut self, class: ErrorClass, message: &str) {
        match self.entries.iter_mut().find(|(c, _)| *c == class) {
            Some((_, entry)) => entry.count += 1,
            None => self.entries.push((
                class,
                TallyEntry {
                    count: 1,
                    sample_message: message.to_owned(),
                },
            )),
        }
    }

    pub fn get(&self, class: ErrorClass) -> Option<&TallyEntry> {
        self.entries
            .iter()
            .find_map(|(c, entry)| (*c == class).then_some(entry))
    }

    pub fn iter(&self) -> impl Iterator<Item = (ErrorClass, &TallyEntry)> {
        self.entries.iter().map(|(class, entry)| (*class, entry))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of all counts.
    pub fn total(&self) -> usize {
        self.entries.iter().map(|(_, entry)| entry.count).sum()
    }
}

/// The single point all outcomes of one run are folded into.
///
/// Not shared across runs: every run creates a fresh one.
#[derive(Debug, Default)]
pub struct Aggregator {
    successes: usize,
    errors: usize,
    tally: ErrorTally,
}

impl Aggregator {
    pub fn record(&mut self, outcome: RequestOutcome) {
        match outcome.error() {
            None => self.successes += 1,
            Some((class, message)) => {
                self.errors += 1;
                self.tally.record(class, message);
            }
        }
    }

    /// Amount of outcomes recorded so far.
    pub fn recorded(&self) -> usize {
        self.successes + self.errors
    }

    /// Record a transport error for every request that did not
    /// report an outcome, e.g. because its task panicked.
    pub fn account_for_lost(&mut self, total: usize) {
        let lost = total.saturating_sub(self.recorded());
        if lost == 0 {
            return;
        }
        tracing::warn!(%lost, %total, "request tasks finished without outcome");
        for _ in 0..lost {
            self.record(RequestOutcome::transport(
                "request task aborted before producing an outcome",
            ));
        }
    }

    pub fn into_report(self, url: Uri, concurrency: usize, elapsed: Duration) -> LoadTestReport {
        LoadTestReport {
            url,
            concurrency,
            total: self.recorded(),
            successes: self.successes,
            errors: self.errors,
            tally: self.tally,
            elapsed,
        }
    }
}

#[cfg(test)]
mod tests {
    use rama::http::StatusCode;

    use super::*;

    #[test]
    fn test_tally_keeps_first_message_and_order() {
        let mut tally = ErrorTally::default();
        tally.record(ErrorClass::Transport, "connection refused");
        tally.record(ErrorClass::Status(StatusCode::NOT_FOUND), "no such page");
        tally.record(ErrorClass::Transport, "timeout");
        tally.record(ErrorClass::Status(StatusCode::NOT_FOUND), "gone");

        let entries: Vec<_> = tally
            .iter()
            .map(|(class, entry)| (class, entry.count, entry.sample_message.as_str()))
            .collect();
        assert_eq!(
            vec![
                (ErrorClass::Transport, 2, "connection refused"),
                (ErrorClass::Status(StatusCode::NOT_FOUND), 2, "no such page"),
            ],
            entries
        );
        assert_eq!(4, tally.total());
        assert_eq!(2, tally.len());
    }

    #[test]
    fn test_aggregator_counts() {
        let mut agg = Aggregator::default();
        agg.record(RequestOutcome::from_status(StatusCode::OK, String::new));
        agg.record(RequestOutcome::from_status(StatusCode::OK, String::new));
        agg.record(RequestOutcome::from_status(
            StatusCode::INTERNAL_SERVER_ERROR,
            || "boom".to_owned(),
        ));
        agg.record(RequestOutcome::transport("refused"));

        let report = agg.into_report(
            Uri::from_static("http://localhost/"),
            2,
            Duration::from_secs(1),
        );
        assert_eq!(4, report.total);
        assert_eq!(2, report.successes);
        assert_eq!(2, report.errors);
        assert_eq!(report.errors, report.tally.total());
        assert_eq!(
            "boom",
            report
                .tally
                .get(ErrorClass::Status(StatusCode::INTERNAL_SERVER_ERROR))
                .unwrap()
                .sample_message
        );
    }

    #[test]
    #[tracing_test::traced_test]
    fn test_account_for_lost() {
        let mut agg = Aggregator::default();
        agg.record(RequestOutcome::from_status(StatusCode::OK, String::new));
        agg.account_for_lost(3);
        assert_eq!(3, agg.recorded());
        assert_eq!(2, agg.tally.get(ErrorClass::Transport).unwrap().count);

        // nothing lost: no-op
        agg.account_for_lost(3);
        assert_eq!(3, agg.recorded());
    }
}
