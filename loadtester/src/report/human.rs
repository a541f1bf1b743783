use std::{fmt, time::Duration};

use super::LoadTestReport;

impl LoadTestReport {
    /// Render the report as multi-line text meant for humans.
    pub fn format_report(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for LoadTestReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "target              : {}", self.url)?;
        writeln!(f, "total requests      : {}", self.total)?;
        writeln!(f, "concurrency         : {}", self.concurrency)?;
        writeln!(f, "successful requests : {}", self.successes)?;
        writeln!(f, "errors              : {}", self.errors)?;

        if self.tally.is_empty() {
            writeln!(f, "error breakdown     : none")?;
        } else {
            writeln!(f, "error breakdown     :")?;
            for (class, entry) in self.tally.iter() {
                writeln!(
                    f,
                    "  • {class}: {} time(s), sample: {}",
                    entry.count,
                    single_line(&entry.sample_message),
                )?;
            }
        }

        writeln!(f, "elapsed             : {}", format_elapsed(self.elapsed))?;
        match self.throughput() {
            Some(rps) => writeln!(f, "requests per second : {rps:.2}"),
            None => writeln!(f, "requests per second : n/a"),
        }
    }
}

fn format_elapsed(elapsed: Duration) -> String {
    let millis = Duration::from_millis(u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX));
    if millis.is_zero() {
        return format!("{elapsed:?}");
    }
    humantime::format_duration(millis).to_string()
}

// error bodies can be entire html pages
fn single_line(msg: &str) -> String {
    const MAX_SAMPLE_CHARS: usize = 200;

    let mut out = msg.split_whitespace().collect::<Vec<_>>().join(" ");
    if let Some((idx, _)) = out.char_indices().nth(MAX_SAMPLE_CHARS) {
        out.truncate(idx);
        out.push('…');
    }
    if out.is_empty() {
        out.push_str("<empty>");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::super::tests::report_with;
    use super::*;

    #[test]
    fn test_format_report() {
        let text = report_with(Duration::from_millis(2500)).format_report();
        assert_eq!(
            "\
target              : http://127.0.0.1:8000/api/hello
total requests      : 10
concurrency         : 3
successful requests : 7
errors              : 3
error breakdown     :
  • 404: 2 time(s), sample: not found
  • transport: 1 time(s), sample: request timed out after 100ms
elapsed             : 2s 500ms
requests per second : 4.00
",
            text
        );
    }

    #[test]
    fn test_format_report_zero_elapsed() {
        let text = report_with(Duration::ZERO).format_report();
        assert!(text.contains("requests per second : n/a"));
        assert!(text.contains("elapsed             : 0ns"));
    }

    #[test]
    fn test_format_report_no_errors() {
        let mut report = report_with(Duration::from_secs(1));
        report.tally = Default::default();
        report.errors = 0;
        report.successes = 10;
        assert!(report.format_report().contains("error breakdown     : none\n"));
    }

    #[test]
    fn test_single_line() {
        assert_eq!("<empty>", single_line(""));
        assert_eq!("a b c", single_line("a\n  b\tc\n"));

        let long = "x".repeat(500);
        let line = single_line(&long);
        assert_eq!(201, line.chars().count());
        assert!(line.ends_with('…'));

        let exact = "é".repeat(200);
        assert_eq!(exact, single_line(&exact));

        let line = single_line(&"é".repeat(201));
        assert_eq!(201, line.chars().count());
        assert!(line.starts_with(&"é".repeat(200)));
        assert!(line.ends_with('…'));
    }

    #[test]
    fn test_format_elapsed_saturates() {
        assert_eq!(
            humantime::format_duration(Duration::from_millis(u64::MAX)).to_string(),
            format_elapsed(Duration::MAX)
        );
    }
}
