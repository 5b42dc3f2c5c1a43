//! Bearer token authentication for protected endpoints.
//!
//! The resource gate validates signature and expiry through the token
//! codec only; it does not consult the token store. Revocation therefore
//! takes effect at introspection, not here. This is a deliberate
//! trade-off: the gate stays a pure computation, and callers that need
//! revocation-aware answers use the introspection endpoint.

use axum::extract::{FromRef, FromRequestParts};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use http::request::Parts;
use serde_json::json;

use crate::http::AppState;
use crate::oauth::{TokenClaims, TokenCodec};

/// Authenticated subject extractor for protected endpoints.
///
/// Parses `Authorization: Bearer <token>`, verifies the token through the
/// codec, and yields the verified claims. Missing, malformed, invalid, or
/// expired tokens are rejected with `401` and a bearer challenge.
#[derive(Clone, Debug)]
pub struct ExtractedAuth(pub TokenClaims);

fn unauthorized_response(error_description: &str) -> Response {
    let body = json!({
        "error": "unauthorized",
        "error_description": error_description
    });

    let mut headers = HeaderMap::new();
    headers.insert("WWW-Authenticate", HeaderValue::from_static("Bearer"));

    (StatusCode::UNAUTHORIZED, headers, axum::Json(body)).into_response()
}

impl<S> FromRequestParts<S> for ExtractedAuth
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);

        let auth_header = parts
            .headers
            .get("Authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| unauthorized_response("Missing Authorization header"))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| unauthorized_response("Bearer authentication required"))?;

        let claims = app_state
            .token_codec
            .verify(token)
            .map_err(|_| unauthorized_response("Invalid or expired token"))?;

        Ok(ExtractedAuth(claims))
    }
}
