//! Handles GET / - Service descriptor listing the OAuth endpoints

use axum::{Json, extract::State};
use serde_json::{Value, json};

use super::context::AppState;

pub async fn handle_index(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "message": "Toolgate OAuth 2.0 API",
        "version": state.config.version,
        "issuer": state.config.external_base,
        "authorization_endpoint": "/oauth/authorize",
        "token_endpoint": "/oauth/token",
        "introspection_endpoint": "/oauth/introspect",
        "revocation_endpoint": "/oauth/revoke"
    }))
}
