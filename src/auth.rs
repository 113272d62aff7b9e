//! API-key gate in front of the `/api` routes.
//!
//! Keys are read from `Authorization: Bearer <token>` or, failing that, `x-api-key`. The gate
//! ships in [`GateMode::PassThrough`]: the key is still compared, but a mismatch is only logged.
//! [`GateMode::Enforce`] turns mismatches into `401` responses.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Response},
};
use subtle::ConstantTimeEq;

use crate::api::ApiError;
use crate::config::Config;

/// What the gate does with a missing or wrong key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateMode {
    /// Let every request through.
    PassThrough,
    /// Reject requests without the expected key.
    Enforce,
}

/// Expected key plus enforcement mode.
#[derive(Debug, Clone)]
pub struct ApiKeyGate {
    expected: String,
    mode: GateMode,
}

impl ApiKeyGate {
    /// Build a gate for `expected` in the given mode.
    pub fn new(expected: impl Into<String>, mode: GateMode) -> Self {
        Self {
            expected: expected.into(),
            mode,
        }
    }

    /// Gate derived from `API_KEY` and `API_KEY_ENFORCEMENT`.
    pub fn from_config(config: &Config) -> Self {
        let mode = if config.api_key_enforcement {
            GateMode::Enforce
        } else {
            GateMode::PassThrough
        };
        Self::new(config.api_key.clone(), mode)
    }

    /// Configured mode.
    pub fn mode(&self) -> GateMode {
        self.mode
    }

    /// Whether the headers carry the expected key.
    pub fn is_authorized(&self, headers: &HeaderMap) -> bool {
        extract_api_key(headers).is_some_and(|key| constant_time_eq(key, &self.expected))
    }

    /// Whether a request with these headers may proceed.
    pub fn admits(&self, headers: &HeaderMap) -> bool {
        match self.mode {
            GateMode::PassThrough => true,
            GateMode::Enforce => self.is_authorized(headers),
        }
    }
}

/// Pull the client key from `Authorization: Bearer` or `x-api-key`.
pub fn extract_api_key(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("authorization")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .or_else(|| {
            headers
                .get("x-api-key")
                .and_then(|value| value.to_str().ok())
        })
        .map(str::trim)
        .filter(|key| !key.is_empty())
}

fn constant_time_eq(a: &str, b: &str) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

/// Middleware applying the gate to the routes it wraps.
pub async fn api_key_middleware(
    State(gate): State<Arc<ApiKeyGate>>,
    request: Request,
    next: Next,
) -> Response {
    if gate.admits(request.headers()) {
        if gate.mode == GateMode::PassThrough && !gate.is_authorized(request.headers()) {
            tracing::debug!(path = %request.uri().path(), "API key missing or invalid; passing through");
        }
        next.run(request).await
    } else {
        tracing::warn!(path = %request.uri().path(), "Rejected request without a valid API key");
        ApiError::Unauthorized.into_response()
    }
}
