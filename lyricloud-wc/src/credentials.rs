//! Provider credential resolution
//!
//! Resolves the Genius access token once at start-up.
//!
//! **Priority:** ENV (`GENIUS_TOKEN`, after `.env` is loaded) → TOML
//! (`genius.access_token`)
//!
//! A missing token is fatal: the service refuses to start rather than
//! failing on the first search.

use lyricloud_common::config::TomlConfig;
use lyricloud_common::{Error, Result};
use std::fmt;
use tracing::{info, warn};

/// Environment variable holding the provider access token
pub const TOKEN_ENV_VAR: &str = "GENIUS_TOKEN";

/// Opaque provider access token
///
/// `Debug` never prints the token; there is no `Display`.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Credential(<redacted, {} chars>)", self.0.len())
    }
}

/// Resolve the access token from the environment or TOML config
pub fn load_credential(toml_config: &TomlConfig) -> Result<Credential> {
    let env_key = std::env::var(TOKEN_ENV_VAR).ok();
    let toml_key = toml_config.genius.access_token.as_deref();

    resolve_credential(env_key.as_deref(), toml_key)
}

/// Pick the highest-priority valid token among the sources
pub fn resolve_credential(env_key: Option<&str>, toml_key: Option<&str>) -> Result<Credential> {
    let env_key = env_key.filter(|k| is_valid_key(k));
    let toml_key = toml_key.filter(|k| is_valid_key(k));

    if env_key.is_some() && toml_key.is_some() {
        warn!(
            "Genius token found in both environment and TOML config. Using environment (highest priority)."
        );
    }

    if let Some(key) = env_key {
        info!("Genius token loaded from environment variable");
        return Ok(Credential::new(key.trim()));
    }

    if let Some(key) = toml_key {
        info!("Genius token loaded from TOML config");
        return Ok(Credential::new(key.trim()));
    }

    Err(Error::Config(format!(
        "Genius access token not configured. Please configure using one of:\n\
         1. Environment: {}=your-token (a .env file in the working directory is read)\n\
         2. TOML config: [genius] access_token = \"your-token\"\n\
         \n\
         Obtain a client access token at: https://genius.com/api-clients",
        TOKEN_ENV_VAR
    )))
}

/// Validate token (non-empty, non-whitespace)
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_wins_over_toml() {
        let credential = resolve_credential(Some("env-token"), Some("toml-token")).unwrap();
        assert_eq!(credential.expose(), "env-token");
    }

    #[test]
    fn test_blank_env_falls_back_to_toml() {
        let credential = resolve_credential(Some("   "), Some(" toml-token ")).unwrap();
        assert_eq!(credential.expose(), "toml-token");
    }

    #[test]
    fn test_missing_everywhere_is_config_error() {
        let err = resolve_credential(None, Some("")).unwrap_err();
        match err {
            Error::Config(msg) => assert!(msg.contains(TOKEN_ENV_VAR)),
            other => panic!("expected config error, got {:?}", other),
        }
    }

    #[test]
    fn test_debug_redacts_token() {
        let credential = Credential::new("super-secret");
        let printed = format!("{:?}", credential);
        assert!(!printed.contains("super-secret"));
    }
}
