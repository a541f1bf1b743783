//! Creation of the default web client used by [`crate::run`].
//!
//! Embedders and tests that want to drive a different stack
//! can pass their own service to [`crate::run_with_client`].

use rama::{
    Layer as _, Service as _,
    error::{BoxError, ErrorContext as _},
    http::{
        HeaderValue, Request, Response,
        client::EasyHttpWebClient,
        layer::{
            map_request_body::MapRequestBodyLayer,
            required_header::AddRequiredRequestHeadersLayer,
        },
    },
    layer::MapErrLayer,
    rt::Executor,
    service::BoxService,
};

use crate::utils::env::user_agent;

/// Create a new pooled HTTP(S) client.
///
/// The connection pool lives as long as the returned service,
/// dropping it closes all pooled connections.
pub fn new_web_client() -> Result<BoxService<Request, Response, BoxError>, BoxError> {
    let inner = EasyHttpWebClient::connector_builder()
        .with_default_transport_connector()
        .without_tls_proxy_support()
        .without_proxy_support()
        .with_tls_support_using_boringssl(None)
        .with_default_http_connector(Executor::default())
        .try_with_default_connection_pool()
        .context("create connection pool for load test web client")?
        .build_client();

    let client = (
        MapErrLayer::new(Into::<BoxError>::into),
        AddRequiredRequestHeadersLayer::new()
            .with_user_agent_header_value(HeaderValue::from_static(user_agent())),
        MapRequestBodyLayer::new_boxed_streaming_body(),
    )
        .into_layer(inner);

    Ok(client.boxed())
}
