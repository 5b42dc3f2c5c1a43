//! Environment-based configuration types for the toolgate server runtime.

use anyhow::Result;

use crate::errors::ConfigError;

/// Minimum byte length accepted for the token signing secret.
const MIN_SIGNING_SECRET_BYTES: usize = 16;

/// HTTP server port configuration
#[derive(Clone)]
pub struct HttpPort(u16);

/// Bearer token signing secret (HS256 key material)
#[derive(Clone)]
pub struct SigningSecret(String);

/// Access token lifetime configuration
#[derive(Clone)]
pub struct AccessTokenExpiration(chrono::Duration);

/// Authorization code lifetime configuration
#[derive(Clone)]
pub struct AuthCodeExpiration(chrono::Duration);

/// Default scope granted when a request omits one
#[derive(Clone)]
pub struct DefaultScope(String);

/// Bcrypt cost used when hashing client secrets
#[derive(Clone)]
pub struct ClientSecretHashCost(u32);

/// Main application configuration
#[derive(Clone)]
pub struct Config {
    pub version: String,
    pub http_port: HttpPort,
    pub external_base: String,
    pub token_signing_secret: SigningSecret,
    pub access_token_expiration: AccessTokenExpiration,
    pub auth_code_expiration: AuthCodeExpiration,
    pub default_scope: DefaultScope,
    pub client_secret_hash_cost: ClientSecretHashCost,
    pub storage_backend: String,
    pub database_url: Option<String>,
}

impl Config {
    /// Create a new configuration from environment variables
    pub fn new() -> Result<Self> {
        let http_port: HttpPort = default_env("HTTP_PORT", "8080").try_into()?;
        let external_base = require_env("EXTERNAL_BASE")?;
        let token_signing_secret: SigningSecret =
            require_env("TOKEN_SIGNING_SECRET")?.try_into()?;
        let access_token_expiration: AccessTokenExpiration =
            default_env("ACCESS_TOKEN_EXPIRATION", "30m").try_into()?;
        let auth_code_expiration: AuthCodeExpiration =
            default_env("AUTH_CODE_EXPIRATION", "10m").try_into()?;
        let default_scope: DefaultScope = default_env("DEFAULT_SCOPE", "read:tools").try_into()?;
        let client_secret_hash_cost: ClientSecretHashCost =
            default_env("CLIENT_SECRET_HASH_COST", "12").try_into()?;
        let storage_backend = default_env("STORAGE_BACKEND", "memory");
        let database_url = optional_env("DATABASE_URL");

        Ok(Self {
            version: version()?,
            http_port,
            external_base,
            token_signing_secret,
            access_token_expiration,
            auth_code_expiration,
            default_scope,
            client_secret_hash_cost,
            storage_backend,
            database_url,
        })
    }
}

/// Get application version from build environment
pub fn version() -> Result<String> {
    option_env!("GIT_HASH")
        .or(option_env!("CARGO_PKG_VERSION"))
        .map(|val| val.to_string())
        .ok_or(ConfigError::VersionNotSet.into())
}

fn require_env(name: &str) -> Result<String> {
    std::env::var(name).map_err(|_| ConfigError::EnvVarRequired(name.to_string()).into())
}

pub(crate) fn optional_env(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

fn default_env(name: &str, default_value: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default_value.to_string())
}

impl TryFrom<String> for HttpPort {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if value.is_empty() {
            Ok(Self(8080))
        } else {
            value
                .parse::<u16>()
                .map(Self)
                .map_err(|err| ConfigError::PortParsingFailed(err).into())
        }
    }
}

impl AsRef<u16> for HttpPort {
    fn as_ref(&self) -> &u16 {
        &self.0
    }
}

impl TryFrom<String> for SigningSecret {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if value.len() < MIN_SIGNING_SECRET_BYTES {
            return Err(ConfigError::SigningSecretTooShort(MIN_SIGNING_SECRET_BYTES).into());
        }
        Ok(Self(value))
    }
}

impl AsRef<str> for SigningSecret {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for AccessTokenExpiration {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let duration = duration_str::parse(&value)
            .map_err(|e| ConfigError::DurationParsingFailed(value, e.to_string()))?;
        Ok(Self(chrono::Duration::from_std(duration)?))
    }
}

impl AsRef<chrono::Duration> for AccessTokenExpiration {
    fn as_ref(&self) -> &chrono::Duration {
        &self.0
    }
}

impl TryFrom<String> for AuthCodeExpiration {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let duration = duration_str::parse(&value)
            .map_err(|e| ConfigError::DurationParsingFailed(value, e.to_string()))?;
        Ok(Self(chrono::Duration::from_std(duration)?))
    }
}

impl AsRef<chrono::Duration> for AuthCodeExpiration {
    fn as_ref(&self) -> &chrono::Duration {
        &self.0
    }
}

impl TryFrom<String> for DefaultScope {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Ok(Self(value))
    }
}

impl AsRef<str> for DefaultScope {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ClientSecretHashCost {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let cost = value
            .parse::<u32>()
            .map_err(|e| ConfigError::HashCostParsingFailed(e.to_string()))?;
        if !(4..=31).contains(&cost) {
            return Err(ConfigError::HashCostParsingFailed(format!(
                "cost {} outside bcrypt range 4..=31",
                cost
            ))
            .into());
        }
        Ok(Self(cost))
    }
}

impl AsRef<u32> for ClientSecretHashCost {
    fn as_ref(&self) -> &u32 {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_port_parsing() {
        let port: HttpPort = "9090".to_string().try_into().unwrap();
        assert_eq!(*port.as_ref(), 9090);

        let default: HttpPort = "".to_string().try_into().unwrap();
        assert_eq!(*default.as_ref(), 8080);

        assert!(HttpPort::try_from("not-a-port".to_string()).is_err());
    }

    #[test]
    fn test_signing_secret_minimum_length() {
        assert!(SigningSecret::try_from("short".to_string()).is_err());
        assert!(SigningSecret::try_from("a-secret-of-adequate-length".to_string()).is_ok());
    }

    #[test]
    fn test_expiration_parsing() {
        let ttl: AccessTokenExpiration = "30m".to_string().try_into().unwrap();
        assert_eq!(*ttl.as_ref(), chrono::Duration::minutes(30));

        let code_ttl: AuthCodeExpiration = "10m".to_string().try_into().unwrap();
        assert_eq!(*code_ttl.as_ref(), chrono::Duration::minutes(10));

        assert!(AccessTokenExpiration::try_from("up to a minute".to_string()).is_err());
    }

    #[test]
    fn test_hash_cost_range() {
        assert!(ClientSecretHashCost::try_from("4".to_string()).is_ok());
        assert!(ClientSecretHashCost::try_from("3".to_string()).is_err());
        assert!(ClientSecretHashCost::try_from("32".to_string()).is_err());
    }
}
