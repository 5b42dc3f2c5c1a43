//! Main router configuration assembling the OAuth and resource endpoints.

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::{
    context::AppState,
    handler_index::handle_index,
    handler_oauth::{
        handle_oauth_authorize, handle_oauth_introspect, handle_oauth_revoke, handle_oauth_token,
    },
    handler_resource::{
        handle_my_external_tools, handle_my_oauth_client, handle_user_external_tools,
    },
};

/// Build the application router
pub fn build_router(ctx: AppState) -> Router {
    let oauth_routes = Router::new()
        .route("/authorize", get(handle_oauth_authorize))
        .route("/token", post(handle_oauth_token))
        .route("/introspect", post(handle_oauth_introspect))
        .route("/revoke", post(handle_oauth_revoke));

    let protected_api_routes = Router::new()
        .route("/users/me/external-tools", get(handle_my_external_tools))
        .route(
            "/users/{user_id}/external-tools",
            get(handle_user_external_tools),
        )
        .route("/oauth/clients/me", get(handle_my_oauth_client));

    let cors = CorsLayer::new()
        .allow_methods([axum::http::Method::GET, axum::http::Method::POST])
        .allow_headers([
            axum::http::header::CONTENT_TYPE,
            axum::http::header::AUTHORIZATION,
            axum::http::header::ACCEPT,
        ]);

    Router::new()
        .route("/", get(handle_index))
        .nest("/oauth", oauth_routes)
        .nest("/api", protected_api_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(ctx)
}
