//! Mock target server to run load tests against,
//! without involving a real (remote) service.

use std::{convert::Infallible, sync::Arc, time::Duration};

use rama::{
    Layer as _, Service,
    error::BoxError,
    http::{
        HeaderValue, Request, Response, StatusCode,
        layer::{required_header::AddRequiredResponseHeadersLayer, trace::TraceLayer},
        server::HttpServer,
        service::web::response::IntoResponse,
    },
    rt::Executor,
    tcp::server::TcpListener,
    telemetry::tracing,
};

use crate::utils::env::user_agent;


/// Behaviour of the [`MockTarget`].
#[derive(Debug, Clone, Default, clap::Args)]
pub struct MockTargetConfig {
    /// Base latency added to every response.
    #[arg(long = "latency", value_name = "SECONDS", default_value_t = 0.)]
    pub base_latency: f64,

    /// Random latency (+/-) added on top of the base latency.
    #[arg(long, value_name = "SECONDS", default_value_t = 0.)]
    pub jitter: f64,

    /// Fraction of requests answered with a 500 (0.0 - 1.0).
    #[arg(long, value_name = "RATE", default_value_t = 0.)]
    pub error_rate: f32,
}

/// Answers every request with either `200 OK` or
/// `500 Internal Server Error`, after an optional delay.
#[derive(Debug, Clone)]
pub struct MockTarget {
    base_latency: f64,
    jitter: f64,
    error_rate: f32,
}

pub const MOCK_OK_BODY: &str = "hello";
pub const MOCK_ERROR_BODY: &str = "internal server error";

impl MockTarget {
    pub fn try_new(cfg: MockTargetConfig) -> Result<Self, BoxError> {
        if !(0. ..=1.).contains(&cfg.error_rate) {
            return Err(BoxError::from("error_rate must be within [0.0, 1.0]"));
        }
        if cfg.base_latency < 0. || cfg.jitter < 0. {
            return Err(BoxError::from("latency and jitter cannot be negative"));
        }

        Ok(Self {
            base_latency: cfg.base_latency,
            jitter: cfg.jitter,
            error_rate: cfg.error_rate,
        })
    }

    fn compute_delay(&self) -> Duration {
        if self.jitter == 0. {
            return Duration::from_secs_f64(self.base_latency);
        }

        let u: f64 = rand::random();
        let delta = (u * self.jitter * 2.) - self.jitter;
        Duration::from_secs_f64((self.base_latency + delta).max(0.))
    }

    fn is_error(&self) -> bool {
        if self.error_rate <= 0. {
            return false;
        }
        rand::random::<f32>() < self.error_rate
    }
}

impl Service<Request> for MockTarget {
    type Output = Response;
    type Error = Infallible;

    async fn serve(&self, _req: Request) -> Result<Self::Output, Self::Error> {
        let delay = self.compute_delay();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        Ok(if self.is_error() {
            (StatusCode::INTERNAL_SERVER_ERROR, MOCK_ERROR_BODY).into_response()
        } else {
            (StatusCode::OK, MOCK_OK_BODY).into_response()
        })
    }
}

/// Serve the [`MockTarget`] over plain HTTP on an already bound listener,
/// until the executor's shutdown guard (if any) is cancelled.
pub async fn serve_mock_target(listener: TcpListener, exec: Executor, target: MockTarget) {
    let http_svc = (
        TraceLayer::new_for_http(),
        AddRequiredResponseHeadersLayer::new()
            .with_server_header_value(HeaderValue::from_static(user_agent())),
    )
        .into_layer(target);

    let http_server = HttpServer::auto(exec).service(Arc::new(http_svc));

    match listener.local_addr() {
        Ok(addr) => tracing::info!("mock target listening on: http://{addr}"),
        Err(err) => tracing::debug!("failed to get mock target bind address: {err}"),
    }

    listener.serve(http_server).await;
}
