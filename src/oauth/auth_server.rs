//! OAuth 2.0 Authorization Server Implementation
//!
//! Implements the authorization, token, introspection, and revocation
//! operations on top of the storage traits and the token codec.

use chrono::{Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;

use crate::errors::OAuthError;
use crate::oauth::codec::{JwtTokenCodec, TokenCodec};
use crate::oauth::types::*;
use crate::storage::{
    AccessTokenStore, AuthorizationCodeStore, ClientStore, OAuthStorage, PrincipalStore,
};

// Verifying against a fixed hash when the client is unknown keeps the
// timing of the failure path close to the known-client path.
const UNKNOWN_CLIENT_SECRET_HASH: &str =
    "$2b$12$K8HKRn4Je1bHvQZv7r8COeYkIcPW3GmUHV8Mainfjp0nQXn30wG4y";

/// Parameters for an authorization request
#[derive(Debug, Clone)]
pub struct AuthorizeRequest {
    pub response_type: String,
    pub client_id: String,
    pub redirect_uri: String,
    pub scope: Option<String>,
    pub state: Option<String>,
}

impl TryFrom<HashMap<String, String>> for AuthorizeRequest {
    type Error = OAuthError;

    /// Build from raw query parameters so that a missing parameter
    /// surfaces as `invalid_request` rather than a framework rejection.
    fn try_from(mut params: HashMap<String, String>) -> Result<Self, Self::Error> {
        fn require(params: &mut HashMap<String, String>, key: &str) -> Result<String, OAuthError> {
            params
                .remove(key)
                .ok_or_else(|| OAuthError::InvalidRequest(format!("Missing {key} parameter")))
        }

        let response_type = require(&mut params, "response_type")?;
        let client_id = require(&mut params, "client_id")?;
        let redirect_uri = require(&mut params, "redirect_uri")?;

        Ok(AuthorizeRequest {
            response_type,
            client_id,
            redirect_uri,
            scope: params.remove("scope"),
            state: params.remove("state"),
        })
    }
}

/// Raw form body of a token request, before grant-type validation
#[derive(Debug, Clone, serde::Deserialize)]
pub struct TokenForm {
    pub grant_type: String,
    pub code: Option<String>,
    pub redirect_uri: Option<String>,
    pub client_id: String,
    pub client_secret: String,
    pub scope: Option<String>,
}

impl TryFrom<TokenForm> for TokenRequest {
    type Error = OAuthError;

    fn try_from(form: TokenForm) -> Result<Self, Self::Error> {
        let grant_type = form
            .grant_type
            .parse::<GrantType>()
            .map_err(OAuthError::UnsupportedGrantType)?;

        Ok(TokenRequest {
            grant_type,
            code: form.code,
            redirect_uri: form.redirect_uri,
            client_id: form.client_id,
            client_secret: form.client_secret,
            scope: form.scope,
        })
    }
}

/// OAuth 2.0 authorization server
pub struct AuthorizationServer {
    storage: Arc<dyn OAuthStorage>,
    codec: Arc<JwtTokenCodec>,
    access_token_lifetime: Duration,
    auth_code_lifetime: Duration,
    default_scope: String,
}

impl AuthorizationServer {
    pub fn new(
        storage: Arc<dyn OAuthStorage>,
        codec: Arc<JwtTokenCodec>,
        access_token_lifetime: Duration,
        auth_code_lifetime: Duration,
        default_scope: String,
    ) -> Self {
        Self {
            storage,
            codec,
            access_token_lifetime,
            auth_code_lifetime,
            default_scope,
        }
    }

    /// Normalize a requested scope: deduplicated, sorted, whitespace
    /// collapsed. An absent or blank request falls back to the default.
    fn requested_scope(&self, requested: Option<&str>) -> String {
        match requested {
            Some(s) if !s.trim().is_empty() => join_scopes(&parse_scope(s)),
            _ => self.default_scope.clone(),
        }
    }

    /// Process an authorization request and mint a single-use code.
    ///
    /// Returns the full redirect URL carrying `code` and, when supplied,
    /// the caller's `state`. The redirect URI is validated against the
    /// client's allow-list before any redirect is constructed; a request
    /// citing an unlisted URI gets an error response, never a redirect.
    ///
    /// Authorization is auto-approved: each client is tied 1:1 to a
    /// principal, so there is no interactive consent step.
    pub async fn authorize(&self, request: &AuthorizeRequest) -> Result<String, OAuthError> {
        let ResponseType::Code = request
            .response_type
            .parse::<ResponseType>()
            .map_err(OAuthError::UnsupportedResponseType)?;

        let client = self
            .storage
            .get_client(&request.client_id)
            .await
            .map_err(|e| OAuthError::ServerError(e.to_string()))?
            .ok_or_else(|| OAuthError::InvalidClient("Unknown client".to_string()))?;

        if !client.redirect_uris.contains(&request.redirect_uri) {
            return Err(OAuthError::InvalidRequest(
                "redirect_uri is not registered for this client".to_string(),
            ));
        }

        let principal = self
            .storage
            .get_principal(client.principal_id)
            .await
            .map_err(|e| OAuthError::ServerError(e.to_string()))?
            .ok_or_else(|| {
                OAuthError::InvalidRequest("Client has no associated principal".to_string())
            })?;

        let scope = self.requested_scope(request.scope.as_deref());

        let now = Utc::now();
        let auth_code = AuthorizationCode {
            code: generate_token(),
            client_id: client.client_id.clone(),
            principal_id: principal.id,
            redirect_uri: request.redirect_uri.clone(),
            scope,
            created_at: now,
            expires_at: now + self.auth_code_lifetime,
            used: false,
        };

        self.storage
            .store_code(&auth_code)
            .await
            .map_err(|e| OAuthError::ServerError(e.to_string()))?;

        let mut redirect_url = url::Url::parse(&request.redirect_uri)
            .map_err(|_| OAuthError::InvalidRequest("Malformed redirect_uri".to_string()))?;
        redirect_url
            .query_pairs_mut()
            .append_pair("code", &auth_code.code);
        if let Some(state) = &request.state {
            redirect_url.query_pairs_mut().append_pair("state", state);
        }

        tracing::info!(
            client_id = %client.client_id,
            principal_id = principal.id,
            "issued authorization code"
        );

        Ok(redirect_url.to_string())
    }

    /// Authenticate a client by id and secret.
    ///
    /// Unknown client and wrong secret produce the same error; the
    /// response never distinguishes the two.
    pub async fn authenticate_client(
        &self,
        client_id: &str,
        client_secret: &str,
    ) -> Result<Client, OAuthError> {
        let client = self
            .storage
            .get_client(client_id)
            .await
            .map_err(|e| OAuthError::ServerError(e.to_string()))?;

        match client {
            Some(client) => {
                let matches = bcrypt::verify(client_secret, &client.secret_hash)
                    .map_err(|e| OAuthError::ServerError(e.to_string()))?;
                if matches {
                    Ok(client)
                } else {
                    Err(OAuthError::InvalidClient(
                        "Invalid client credentials".to_string(),
                    ))
                }
            }
            None => {
                let _ = bcrypt::verify(client_secret, UNKNOWN_CLIENT_SECRET_HASH);
                Err(OAuthError::InvalidClient(
                    "Invalid client credentials".to_string(),
                ))
            }
        }
    }

    /// Process a token request for either supported grant
    pub async fn token(&self, request: &TokenRequest) -> Result<TokenResponse, OAuthError> {
        let client = self
            .authenticate_client(&request.client_id, &request.client_secret)
            .await?;

        let (principal_id, scope) = match request.grant_type {
            GrantType::AuthorizationCode => {
                let code = request.code.as_deref().ok_or_else(|| {
                    OAuthError::InvalidRequest("Missing code parameter".to_string())
                })?;
                let redirect_uri = request.redirect_uri.as_deref().ok_or_else(|| {
                    OAuthError::InvalidRequest("Missing redirect_uri parameter".to_string())
                })?;

                // The unused-to-used transition happens inside consume_code,
                // before the binding checks. A code presented with the wrong
                // client or redirect URI is burned, not returned to the pool.
                let auth_code = self
                    .storage
                    .consume_code(code, Utc::now())
                    .await
                    .map_err(|e| OAuthError::ServerError(e.to_string()))?
                    .ok_or_else(|| {
                        OAuthError::InvalidGrant("Invalid authorization code".to_string())
                    })?;

                if auth_code.client_id != client.client_id
                    || auth_code.redirect_uri != redirect_uri
                {
                    return Err(OAuthError::InvalidGrant(
                        "Invalid authorization code".to_string(),
                    ));
                }

                (auth_code.principal_id, auth_code.scope)
            }
            GrantType::ClientCredentials => {
                let scope = self.requested_scope(request.scope.as_deref());
                (client.principal_id, scope)
            }
        };

        self.issue_token(&client, principal_id, &scope).await
    }

    /// Sign a bearer token and persist its hash for introspection and
    /// revocation
    async fn issue_token(
        &self,
        client: &Client,
        principal_id: i64,
        scope: &str,
    ) -> Result<TokenResponse, OAuthError> {
        let claims = JwtTokenCodec::claims_for(
            principal_id,
            &client.client_id,
            scope,
            self.access_token_lifetime,
        );
        let access_token = self
            .codec
            .sign(&claims)
            .map_err(|e| OAuthError::ServerError(e.to_string()))?;

        let record = AccessTokenRecord {
            token_hash: hash_token(&access_token),
            client_id: client.client_id.clone(),
            principal_id,
            scope: scope.to_string(),
            created_at: Utc::now(),
            expires_at: Utc::now() + self.access_token_lifetime,
            revoked: false,
        };

        self.storage
            .store_token(&record)
            .await
            .map_err(|e| OAuthError::ServerError(e.to_string()))?;

        tracing::info!(
            client_id = %client.client_id,
            principal_id,
            scope = %scope,
            "issued access token"
        );

        Ok(TokenResponse {
            access_token,
            token_type: "Bearer".to_string(),
            expires_in: self.access_token_lifetime.num_seconds() as u64,
            scope: scope.to_string(),
        })
    }

    /// Introspect a token (RFC 7662).
    ///
    /// Active requires both a valid signature with unexpired claims and a
    /// live store record for the token's hash. The store stands in for
    /// revocation state the signature cannot carry; the signature proves
    /// the token was issued here, which store presence alone cannot.
    pub async fn introspect(&self, token: &str) -> Result<IntrospectionResponse, OAuthError> {
        let claims = match self.codec.verify(token) {
            Ok(claims) => claims,
            Err(_) => return Ok(IntrospectionResponse::inactive()),
        };

        let record = self
            .storage
            .get_token_by_hash(&hash_token(token))
            .await
            .map_err(|e| OAuthError::ServerError(e.to_string()))?;

        let record = match record {
            Some(record) => record,
            None => return Ok(IntrospectionResponse::inactive()),
        };

        if record.revoked || record.expires_at <= Utc::now() {
            return Ok(IntrospectionResponse::inactive());
        }

        Ok(IntrospectionResponse {
            active: true,
            client_id: Some(record.client_id),
            scope: Some(record.scope),
            sub: Some(claims.sub),
            exp: Some(claims.exp),
            iat: Some(claims.iat),
        })
    }

    /// Revoke a token (RFC 7009).
    ///
    /// Always succeeds; revoking an unknown or already-revoked token is a
    /// no-op so callers learn nothing about token validity.
    pub async fn revoke(&self, token: &str) -> Result<(), OAuthError> {
        self.storage
            .revoke_token_by_hash(&hash_token(token))
            .await
            .map_err(|e| OAuthError::ServerError(e.to_string()))?;
        Ok(())
    }
}
