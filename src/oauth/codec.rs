//! Signed bearer token codec.
//!
//! Tokens are HS256 JWTs carrying the subject principal, client, scope,
//! and validity window. Verification checks signature and expiry only;
//! store-backed state (revocation, hash presence) lives elsewhere.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::errors::CodecError;

/// Claims embedded in every issued access token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject principal id, as a string
    pub sub: String,
    /// Client the token was issued to
    pub client_id: String,
    /// Granted scope
    pub scope: String,
    /// Issued-at (unix seconds)
    pub iat: i64,
    /// Expiration (unix seconds)
    pub exp: i64,
}

impl TokenClaims {
    pub fn principal_id(&self) -> Option<i64> {
        self.sub.parse().ok()
    }

    pub fn issued_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.iat, 0)
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }
}

/// Signs and verifies bearer tokens
pub trait TokenCodec: Send + Sync {
    /// Sign claims into a compact token string
    fn sign(&self, claims: &TokenClaims) -> Result<String, CodecError>;

    /// Verify a token string and return its claims.
    ///
    /// Fails on bad signatures, malformed tokens, and expired tokens.
    fn verify(&self, token: &str) -> Result<TokenClaims, CodecError>;
}

/// HS256 JWT codec keyed with a shared signing secret
pub struct JwtTokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtTokenCodec {
    pub fn new(secret: &[u8]) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // No clock skew allowance: a token one second past exp is rejected
        validation.leeway = 0;
        validation.validate_exp = true;
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
        }
    }

    /// Build claims for a fresh token
    pub fn claims_for(
        principal_id: i64,
        client_id: &str,
        scope: &str,
        lifetime: Duration,
    ) -> TokenClaims {
        let now = Utc::now();
        TokenClaims {
            sub: principal_id.to_string(),
            client_id: client_id.to_string(),
            scope: scope.to_string(),
            iat: now.timestamp(),
            exp: (now + lifetime).timestamp(),
        }
    }
}

impl TokenCodec for JwtTokenCodec {
    fn sign(&self, claims: &TokenClaims) -> Result<String, CodecError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|e| CodecError::SigningFailed(e.to_string()))
    }

    fn verify(&self, token: &str) -> Result<TokenClaims, CodecError> {
        decode::<TokenClaims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => CodecError::Expired,
                _ => CodecError::VerificationFailed(e.to_string()),
            })
    }
}
