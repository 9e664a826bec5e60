use std::net::SocketAddr;
use std::str::FromStr;
use std::{env, fmt};

use crate::error::AppError;
use crate::services::dpop::{DpopPolicy, VerifierOptions};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    pub fn from_env() -> Self {
        Self::parse(&env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()))
    }

    fn parse(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "missing configuration: {}", key),
            ConfigError::Invalid(key) => write!(f, "invalid configuration: {}", key),
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Clone, Debug)]
pub struct Config {
    pub addr: SocketAddr,
    pub app_env: AppEnv,
    pub issuer: String,
    pub audience: String,
    // AS signs access tokens with this private key
    pub access_jwt_private_key_pem: String,
    // Token lifetime (seconds)
    pub access_token_ttl_seconds: u64,
    // DPoP
    pub dpop_policy: DpopPolicy,
    pub dpop_verifier: VerifierOptions,
    // Absolute base URL used to rebuild htu behind proxies, e.g. https://as.example.com
    pub public_base_url: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let port: u16 = optional("AUTH_PORT")?.unwrap_or(4000);

        let addr: SocketAddr = SocketAddr::from_str(&format!("0.0.0.0:{}", port))
            .map_err(|_| ConfigError::Invalid("AUTH_PORT"))?;

        let app_env = AppEnv::from_env();

        let issuer = env::var("AUTH_ISSUER").map_err(|_| ConfigError::Missing("AUTH_ISSUER"))?;
        let audience =
            env::var("AUTH_AUDIENCE").map_err(|_| ConfigError::Missing("AUTH_AUDIENCE"))?;
        let access_jwt_private_key_pem = env::var("ACCESS_JWT_PRIVATE_KEY_PEM")
            .map_err(|_| ConfigError::Missing("ACCESS_JWT_PRIVATE_KEY_PEM"))?
            .replace("\\n", "\n");

        let access_token_ttl_seconds = optional("ACCESS_TOKEN_TTL_SECONDS")?.unwrap_or(600); // 10 min

        let dpop_policy = DpopPolicy {
            mandatory: flag("DPOP_REQUIRED")?,
            bind_http_target: flag("DPOP_BIND_HTTP_TARGET")?,
        };

        let dpop_verifier = VerifierOptions {
            iat_leeway_seconds: optional("DPOP_IAT_LEEWAY_SECONDS")?.unwrap_or(0),
            max_age_seconds: optional("DPOP_MAX_AGE_SECONDS")?,
        };
        if dpop_verifier.iat_leeway_seconds < 0 {
            return Err(ConfigError::Invalid("DPOP_IAT_LEEWAY_SECONDS"));
        }
        if dpop_verifier.max_age_seconds.is_some_and(|s| s < 0) {
            return Err(ConfigError::Invalid("DPOP_MAX_AGE_SECONDS"));
        }

        let public_base_url = env::var("PUBLIC_BASE_URL")
            .ok()
            .map(|s| s.trim().trim_end_matches('/').to_string())
            .filter(|s| !s.is_empty());
        if let Some(base) = public_base_url.as_deref() {
            url::Url::parse(base).map_err(|_| ConfigError::Invalid("PUBLIC_BASE_URL"))?;
        }

        Ok(Config {
            addr,
            app_env,
            issuer,
            audience,
            access_jwt_private_key_pem,
            access_token_ttl_seconds,
            dpop_policy,
            dpop_verifier,
            public_base_url,
        })
    }
}

// Unset or empty => None. Set but unparsable => Invalid (fail fast at startup).
fn optional<T: FromStr>(key: &'static str) -> Result<Option<T>, ConfigError> {
    match env::var(key) {
        Ok(v) if !v.trim().is_empty() => v
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Invalid(key)),
        _ => Ok(None),
    }
}

fn flag(key: &'static str) -> Result<bool, ConfigError> {
    match env::var(key) {
        Ok(v) => parse_flag(&v).ok_or(ConfigError::Invalid(key)),
        Err(_) => Ok(false),
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

impl From<ConfigError> for AppError {
    fn from(_: ConfigError) -> Self {
        AppError::Internal
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags() {
        assert_eq!(parse_flag("TRUE"), Some(true));
        assert_eq!(parse_flag(" on "), Some(true));
        assert_eq!(parse_flag("0"), Some(false));
        assert_eq!(parse_flag(""), Some(false));
        assert_eq!(parse_flag("maybe"), None);
    }

    #[test]
    fn app_env() {
        assert!(AppEnv::parse("PROD").is_production());
        assert!(AppEnv::parse("production").is_production());
        assert!(!AppEnv::parse("staging").is_production());
    }
}
