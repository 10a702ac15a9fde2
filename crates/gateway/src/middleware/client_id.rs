//! Client identity extractor

use axum::{
    extract::{ConnectInfo, FromRequestParts},
    http::request::Parts,
};
use leadforge_common::{errors::AppError, ratelimit::client_identity};
use std::net::SocketAddr;

use crate::AppState;

/// Identifier a request is rate limited under
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientId(pub String);

impl FromRequestParts<AppState> for ClientId {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);

        Ok(ClientId(client_identity(
            &parts.headers,
            peer,
            state.config.rate_limit.trust_forwarded_headers,
        )))
    }
}
