//! Extractor for the network metadata of a scanning client.
//!
//! The origin address is the first of:
//! 1. The first entry of `X-Forwarded-For`
//! 2. `X-Real-IP`
//! 3. The socket peer address (requires serving with
//!    `into_make_service_with_connect_info::<SocketAddr>()`)
//!
//! Anything missing becomes `"unknown"`. None of this is authenticated; it is
//! recorded for the owner's information only.

use std::convert::Infallible;
use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, FromRequestParts},
    http::{HeaderMap, header::USER_AGENT, request::Parts},
};

use crate::models::ClientInfo;

const X_FORWARDED_FOR: &str = "x-forwarded-for";
const X_REAL_IP: &str = "x-real-ip";

impl<S> FromRequestParts<S> for ClientInfo
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip().to_string());

        let ip = client_ip(&parts.headers).or(peer);
        let user_agent = header_str(&parts.headers, USER_AGENT.as_str());

        Ok(Self::new(ip.as_deref(), user_agent))
    }
}

/// Client address reported by a proxy header, if any.
fn client_ip(headers: &HeaderMap) -> Option<String> {
    let forwarded = header_str(headers, X_FORWARDED_FOR)
        .and_then(|list| list.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty());

    forwarded
        .or_else(|| header_str(headers, X_REAL_IP).map(str::trim))
        .filter(|ip| !ip.is_empty())
        .map(String::from)
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}
