//! Request pipeline steps. Each one either passes the request on or ends
//! it with an `ApiError`.

pub mod error_normalization;
pub mod rate_limit;
pub mod security;

use std::net::SocketAddr;

use axum::extract::{ConnectInfo, Request};

/// Client identity used for rate limiting and logs: the peer IP address,
/// or `"unknown"` when the server was not started with connect info.
pub fn client_key(request: &Request) -> String {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ci| ci.0.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}
