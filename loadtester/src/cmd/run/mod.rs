use std::time::Duration;

use rama::{
    error::{BoxError, ErrorContext as _},
    graceful::ShutdownGuard,
    http::Uri,
    telemetry::tracing,
};

use clap::Args;
use loadtester::{DispatchMode, LoadTestConfig};

#[derive(Debug, Clone, Args)]
/// run a load test against a single target
pub struct RunCommand {
    /// URL to send the GET requests to
    #[arg(value_name = "URL", required = true)]
    target: Uri,

    /// total amount of requests to send
    #[arg(long, short = 'n', value_name = "N", default_value_t = 1000)]
    total: usize,

    /// maximum amount of requests in flight at any time
    #[arg(long, short = 'c', value_name = "N", default_value_t = 100)]
    concurrency: usize,

    /// timeout per request (e.g. `500ms`, `30s`)
    #[arg(long, value_name = "DURATION", default_value = "30s")]
    timeout: humantime::Duration,

    /// how request tasks get scheduled: `fan-out` or `worker-pool`
    #[arg(long, value_name = "MODE", default_value = "fan-out")]
    mode: DispatchMode,

    /// report json instead of a human-friendly format
    #[arg(long, default_value_t = false)]
    json: bool,
}

pub async fn exec(guard: ShutdownGuard, args: RunCommand) -> Result<(), BoxError> {
    let timeout: Duration = args.timeout.into();
    let config = LoadTestConfig::try_new(args.target, args.total, args.concurrency)
        .context("create load test config")?
        .with_request_timeout(timeout)
        .with_dispatch_mode(args.mode);

    let report = tokio::select! {
        _ = guard.cancelled() => {
            tracing::warn!("load test interrupted: guard shutdown");
            return Ok(());
        }
        result = loadtester::run(&config) => result?,
    };

    if args.json {
        println!("{}", report.to_json());
    } else {
        print!("{report}");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::Parser as _;

    use crate::{Args, CliCommands};

    use super::*;

    fn parse(args: &[&str]) -> RunCommand {
        let args = Args::try_parse_from(
            std::iter::once("loadtester")
                .chain(std::iter::once("run"))
                .chain(args.iter().copied()),
        )
        .unwrap();
        match args.cmds {
            CliCommands::Run(cmd) => cmd,
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_defaults() {
        let cmd = parse(&["http://127.0.0.1:8000/api/hello"]);
        assert_eq!("http://127.0.0.1:8000/api/hello", cmd.target.to_string());
        assert_eq!(1000, cmd.total);
        assert_eq!(100, cmd.concurrency);
        assert_eq!(Duration::from_secs(30), Duration::from(cmd.timeout));
        assert_eq!(DispatchMode::FanOut, cmd.mode);
        assert!(!cmd.json);
    }

    #[test]
    fn test_overwrites() {
        let cmd = parse(&[
            "http://localhost/",
            "-n",
            "10",
            "--concurrency",
            "3",
            "--timeout",
            "250ms",
            "--mode",
            "worker-pool",
            "--json",
        ]);
        assert_eq!(10, cmd.total);
        assert_eq!(3, cmd.concurrency);
        assert_eq!(Duration::from_millis(250), Duration::from(cmd.timeout));
        assert_eq!(DispatchMode::WorkerPool, cmd.mode);
        assert!(cmd.json);
    }

    #[test]
    fn test_invalid_mode() {
        assert!(
            Args::try_parse_from(["loadtester", "run", "http://localhost/", "--mode", "bogus"])
                .is_err()
        );
    }
}
