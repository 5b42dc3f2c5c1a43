//! Handlers for the protected resource endpoints.
//!
//! All routes here require a valid bearer token. Principal-scoped paths
//! additionally require the token's subject to match the path principal.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};

use super::context::AppState;
use super::middleware_auth::ExtractedAuth;
use crate::oauth::types::Principal;
use crate::storage::{ClientStore, PrincipalStore};

fn error_response(status: StatusCode, error: &str, description: &str) -> Response {
    let body = json!({
        "error": error,
        "error_description": description
    });
    (status, Json(body)).into_response()
}

async fn lookup_principal(state: &AppState, principal_id: i64) -> Result<Principal, Response> {
    state
        .oauth_storage
        .get_principal(principal_id)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "principal lookup failed");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "server_error",
                "Storage unavailable",
            )
        })?
        .ok_or_else(|| {
            error_response(
                StatusCode::NOT_FOUND,
                "not_found",
                "Unknown principal",
            )
        })
}

/// Handle GET /api/users/me/external-tools
///
/// Returns the tool-configuration document for the token's subject.
pub async fn handle_my_external_tools(
    State(state): State<AppState>,
    ExtractedAuth(claims): ExtractedAuth,
) -> Response {
    let Some(principal_id) = claims.principal_id() else {
        return error_response(
            StatusCode::UNAUTHORIZED,
            "unauthorized",
            "Token subject is not a principal id",
        );
    };

    let principal = match lookup_principal(&state, principal_id).await {
        Ok(principal) => principal,
        Err(response) => return response,
    };

    match state.tool_documents.document_for(&principal).await {
        Ok(document) => document.into_response(),
        Err(e) => {
            tracing::error!(error = %e, "tool document generation failed");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "server_error",
                "Error generating tool document",
            )
        }
    }
}

/// Handle GET /api/users/{user_id}/external-tools
///
/// The path principal must equal the token's subject; any other
/// principal's document is forbidden.
pub async fn handle_user_external_tools(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    ExtractedAuth(claims): ExtractedAuth,
) -> Response {
    if claims.principal_id() != Some(user_id) {
        return error_response(
            StatusCode::FORBIDDEN,
            "forbidden",
            "You can only access your own tool document",
        );
    }

    let principal = match lookup_principal(&state, user_id).await {
        Ok(principal) => principal,
        Err(response) => return response,
    };

    match state.tool_documents.document_for(&principal).await {
        Ok(document) => document.into_response(),
        Err(e) => {
            tracing::error!(error = %e, "tool document generation failed");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "server_error",
                "Error generating tool document",
            )
        }
    }
}

/// Handle GET /api/oauth/clients/me
///
/// Returns the metadata of the client owned by the token's subject. The
/// secret hash is never included.
pub async fn handle_my_oauth_client(
    State(state): State<AppState>,
    ExtractedAuth(claims): ExtractedAuth,
) -> Result<Json<Value>, Response> {
    let Some(principal_id) = claims.principal_id() else {
        return Err(error_response(
            StatusCode::UNAUTHORIZED,
            "unauthorized",
            "Token subject is not a principal id",
        ));
    };

    let client = state
        .oauth_storage
        .get_client_for_principal(principal_id)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "client lookup failed");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "server_error",
                "Storage unavailable",
            )
        })?;

    let clients: Vec<Value> = client
        .into_iter()
        .map(|c| {
            json!({
                "client_id": c.client_id,
                "client_name": c.client_name,
                "redirect_uris": c.redirect_uris,
                "grant_types": c.grant_types,
                "created_at": c.created_at.to_rfc3339(),
            })
        })
        .collect();

    Ok(Json(json!(clients)))
}
