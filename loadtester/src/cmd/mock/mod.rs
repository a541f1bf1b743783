use rama::{
    error::{BoxError, ErrorContext as _},
    graceful::ShutdownGuard,
    net::socket::Interface,
    rt::Executor,
    tcp::server::TcpListener,
};

use clap::Args;
use loadtester::mock::{MockTarget, MockTargetConfig, serve_mock_target};

#[derive(Debug, Clone, Args)]
/// run a mock target server to load test against
pub struct MockCommand {
    #[clap(flatten)]
    config: MockTargetConfig,

    /// network interface to bind to
    #[arg(
        long,
        short = 'b',
        value_name = "INTERFACE",
        default_value = "127.0.0.1:8000"
    )]
    pub bind: Interface,
}

pub async fn exec(guard: ShutdownGuard, args: MockCommand) -> Result<(), BoxError> {
    let target = MockTarget::try_new(args.config).context("create mock target")?;

    let exec = Executor::graceful(guard);
    let tcp_listener = TcpListener::bind(args.bind, exec.clone())
        .await
        .context("bind mock target http server")?;

    serve_mock_target(tcp_listener, exec, target).await;

    Ok(())
}
