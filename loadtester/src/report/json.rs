use super::LoadTestReport;

impl LoadTestReport {
    /// Machine readable counterpart of [`Self::format_report`].
    pub fn to_json(&self) -> serde_json::Value {
        let errors: Vec<_> = self
            .tally
            .iter()
            .map(|(class, entry)| {
                serde_json::json!({
                    "class": class.to_string(),
                    "count": entry.count,
                    "sample_message": entry.sample_message,
                })
            })
            .collect();

        serde_json::json!({
            "url": self.url.to_string(),
            "total": self.total,
            "concurrency": self.concurrency,
            "successes": self.successes,
            "errors": self.errors,
            "error_breakdown": errors,
            "elapsed_ms": self.elapsed.as_secs_f64() * 1000.,
            "requests_per_second": self.throughput(),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::super::tests::report_with;

    #[test]
    fn test_to_json() {
        let value = report_with(Duration::from_millis(2500)).to_json();

        assert_eq!(10, value["total"]);
        assert_eq!(3, value["concurrency"]);
        assert_eq!(7, value["successes"]);
        assert_eq!(3, value["errors"]);
        assert_eq!(2500., value["elapsed_ms"]);
        assert_eq!(4., value["requests_per_second"]);

        let breakdown = value["error_breakdown"].as_array().unwrap();
        assert_eq!(2, breakdown.len());
        assert_eq!("404", breakdown[0]["class"]);
        assert_eq!(2, breakdown[0]["count"]);
        assert_eq!("not found", breakdown[0]["sample_message"]);
        assert_eq!("transport", breakdown[1]["class"]);
    }

    #[test]
    fn test_to_json_zero_elapsed() {
        let value = report_with(Duration::ZERO).to_json();
        assert!(value["requests_per_second"].is_null());
    }
}
