//! Cross-origin policy for browser callers.
//!
//! CORS headers only stop a page from reading responses; a cross-site form
//! post still reaches the handler. State-changing requests that carry an
//! `Origin` header are therefore refused unless the origin is allowed, as are
//! WebSocket handshakes, which browsers open cross-origin without CORS.
//! Non-browser clients send no `Origin` and pass.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{
        header::{ORIGIN, UPGRADE},
        HeaderValue, Method, StatusCode,
    },
    middleware::Next,
    response::Response,
};
use tower_http::cors::{AllowOrigin, CorsLayer};

/// Origins allowed to call the API from a browser.
#[derive(Debug, Clone, Default)]
pub struct OriginPolicy {
    allowed: Vec<HeaderValue>,
}

impl OriginPolicy {
    /// Build a policy from origins such as `https://app.example`.
    ///
    /// Returns the first origin that is not a valid header value.
    pub fn new<I, S>(origins: I) -> Result<Self, String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let allowed = origins
            .into_iter()
            .map(|origin| {
                let origin = origin.as_ref().trim_end_matches('/');
                HeaderValue::from_str(origin).map_err(|_| origin.to_string())
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { allowed })
    }

    pub fn is_allowed(&self, origin: &HeaderValue) -> bool {
        self.allowed.iter().any(|allowed| allowed == origin)
    }

    pub fn origins(&self) -> &[HeaderValue] {
        &self.allowed
    }

    /// CORS layer advertising exactly the allowed origins.
    pub fn cors_layer(&self) -> CorsLayer {
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(self.allowed.clone()))
            .allow_methods([Method::GET, Method::POST])
            .allow_headers([
                axum::http::header::CONTENT_TYPE,
                axum::http::header::AUTHORIZATION,
            ])
    }
}

/// Refuse state-changing requests from origins outside the policy.
pub async fn origin_middleware(
    State(policy): State<Arc<OriginPolicy>>,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let safe = matches!(
        *request.method(),
        Method::GET | Method::HEAD | Method::OPTIONS
    );
    let upgrade = request
        .headers()
        .get(UPGRADE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.eq_ignore_ascii_case("websocket"));
    if !safe || upgrade {
        if let Some(origin) = request.headers().get(ORIGIN) {
            if !policy.is_allowed(origin) {
                tracing::warn!(origin = ?origin, path = %request.uri().path(), "cross-origin request refused");
                return Err(StatusCode::FORBIDDEN);
            }
        }
    }
    Ok(next.run(request).await)
}
