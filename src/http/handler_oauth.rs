//! Handlers for the OAuth protocol endpoints: authorize, token,
//! introspect, and revoke.

use axum::{
    Form, Json,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use http::{HeaderValue, header::LOCATION};
use serde::Deserialize;
use serde_json::{Value, json};
use std::collections::HashMap;

use super::context::AppState;
use crate::errors::OAuthError;
use crate::oauth::auth_server::{AuthorizeRequest, TokenForm};
use crate::oauth::types::{IntrospectionResponse, TokenRequest};

/// Map an OAuth error to its wire status and error code
fn oauth_error_response(e: OAuthError) -> (StatusCode, Json<Value>) {
    let (status, error_code) = match e {
        OAuthError::InvalidClient(_) => (StatusCode::UNAUTHORIZED, "invalid_client"),
        OAuthError::InvalidGrant(_) => (StatusCode::BAD_REQUEST, "invalid_grant"),
        OAuthError::UnsupportedGrantType(_) => (StatusCode::BAD_REQUEST, "unsupported_grant_type"),
        OAuthError::UnsupportedResponseType(_) => {
            (StatusCode::BAD_REQUEST, "unsupported_response_type")
        }
        OAuthError::InvalidScope(_) => (StatusCode::BAD_REQUEST, "invalid_scope"),
        OAuthError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "invalid_request"),
        OAuthError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "unauthorized"),
        OAuthError::Forbidden(_) => (StatusCode::FORBIDDEN, "forbidden"),
        _ => (StatusCode::INTERNAL_SERVER_ERROR, "server_error"),
    };

    let error_response = json!({
        "error": error_code,
        "error_description": e.to_string()
    });
    (status, Json(error_response))
}

/// Handle GET /oauth/authorize
///
/// On success responds with a 302 redirect carrying the authorization
/// code. On any validation failure the response is an error body, never
/// a redirect, so an unvalidated redirect URI is never followed.
pub async fn handle_oauth_authorize(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    // Raw query parameters; a missing one maps to invalid_request with
    // the standard error body instead of a framework rejection.
    let request = match AuthorizeRequest::try_from(params) {
        Ok(request) => request,
        Err(e) => return oauth_error_response(e).into_response(),
    };

    match state.auth_server.authorize(&request).await {
        Ok(redirect_url) => match HeaderValue::from_str(&redirect_url) {
            Ok(location) => {
                (StatusCode::FOUND, [(LOCATION, location)]).into_response()
            }
            Err(_) => oauth_error_response(OAuthError::InvalidRequest(
                "Malformed redirect_uri".to_string(),
            ))
            .into_response(),
        },
        Err(e) => oauth_error_response(e).into_response(),
    }
}

/// Handle POST /oauth/token
pub async fn handle_oauth_token(
    State(state): State<AppState>,
    Form(form): Form<TokenForm>,
) -> Response {
    let request = match TokenRequest::try_from(form) {
        Ok(request) => request,
        Err(e) => return oauth_error_response(e).into_response(),
    };

    match state.auth_server.token(&request).await {
        Ok(response) => Json(response).into_response(),
        Err(e) => oauth_error_response(e).into_response(),
    }
}

/// Form body for introspection and revocation requests
#[derive(Debug, Deserialize)]
pub struct TokenActionForm {
    pub token: String,
    pub client_id: String,
    pub client_secret: String,
}

/// Handle POST /oauth/introspect
///
/// Requires client authentication. The response is the uniform
/// `{active: false}` for every inactive token regardless of why it is
/// inactive.
pub async fn handle_oauth_introspect(
    State(state): State<AppState>,
    Form(form): Form<TokenActionForm>,
) -> Result<Json<IntrospectionResponse>, (StatusCode, Json<Value>)> {
    state
        .auth_server
        .authenticate_client(&form.client_id, &form.client_secret)
        .await
        .map_err(oauth_error_response)?;

    let response = state
        .auth_server
        .introspect(&form.token)
        .await
        .map_err(oauth_error_response)?;

    Ok(Json(response))
}

/// Handle POST /oauth/revoke
///
/// Requires client authentication. Succeeds with an empty 200 whether or
/// not the token was known.
pub async fn handle_oauth_revoke(
    State(state): State<AppState>,
    Form(form): Form<TokenActionForm>,
) -> Result<StatusCode, (StatusCode, Json<Value>)> {
    state
        .auth_server
        .authenticate_client(&form.client_id, &form.client_secret)
        .await
        .map_err(oauth_error_response)?;

    state
        .auth_server
        .revoke(&form.token)
        .await
        .map_err(oauth_error_response)?;

    Ok(StatusCode::OK)
}
