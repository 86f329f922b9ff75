use axum::extract::FromRequestParts;
use axum::http::HeaderMap;
use axum::http::request::Parts;

use crate::error::AppError;
use crate::state::AppState;

/// `scheme://host` of the current request, used to build absolute image URLs.
///
/// The host comes from the `Host` header (or the request URI authority). When
/// `server.trust_forwarded_headers` is set, `X-Forwarded-Proto` and
/// `X-Forwarded-Host` take precedence. The scheme defaults to `http`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestOrigin(pub String);

impl RequestOrigin {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromRequestParts<AppState> for RequestOrigin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let server = &state.config.server;
        let trusted = |name: &str| {
            if server.trust_forwarded_headers {
                first_header_value(&parts.headers, name)
            } else {
                None
            }
        };

        let scheme = trusted("x-forwarded-proto").unwrap_or_else(|| "http".to_string());
        let host = trusted("x-forwarded-host")
            .or_else(|| first_header_value(&parts.headers, "host"))
            .or_else(|| parts.uri.authority().map(|a| a.to_string()))
            .unwrap_or_else(|| format!("{}:{}", server.host, server.port));

        Ok(RequestOrigin(format!("{scheme}://{host}")))
    }
}

/// First comma-separated entry of a header, trimmed. Proxies append to these lists.
fn first_header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
