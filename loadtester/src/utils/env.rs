/// Value used as `User-Agent` for outgoing requests
/// and as `Server` header by the mock target.
pub const fn user_agent() -> &'static str {
    concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"))
}
