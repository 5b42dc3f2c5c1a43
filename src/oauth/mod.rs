//! OAuth 2.0 authorization server: grants, token codec, client provisioning.

pub mod auth_server;
pub mod codec;
pub mod provisioning;
pub mod types;

// Re-export frequently used items from each module
pub use crate::storage::{
    inmemory::MemoryOAuthStorage,
    traits::{AccessTokenStore, AuthorizationCodeStore, ClientStore, OAuthStorage, PrincipalStore},
};
pub use auth_server::{AuthorizationServer, AuthorizeRequest};
pub use codec::{JwtTokenCodec, TokenClaims, TokenCodec};
pub use provisioning::{ClientProvisioningService, ProvisionedClient};
pub use types::{
    AccessTokenRecord, AuthorizationCode, Client, GrantType, IntrospectionResponse,
    OAuthErrorResponse, Principal, ResponseType, TokenRequest, TokenResponse, generate_token,
    hash_token, join_scopes, parse_scope,
};
