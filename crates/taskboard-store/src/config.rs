use std::fmt;

use thiserror::Error;

/// Environment variable holding the store base URL.
pub const URL_VAR: &str = "SUPABASE_URL";
/// Environment variable holding the store access key.
pub const KEY_VAR: &str = "SUPABASE_KEY";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing environment variable {0}")]
    Missing(&'static str),
    #[error("environment variable {0} is empty")]
    Empty(&'static str),
}

/// Connection settings for the remote store.
///
/// Both values must be known at process start; there is no fallback.
#[derive(Clone)]
pub struct StoreConfig {
    /// Base URL of the project, e.g. `https://xyz.supabase.co`.
    pub url: String,
    /// Access key sent as `apikey` and bearer token.
    pub key: String,
}

impl StoreConfig {
    pub fn new(url: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            key: key.into(),
        }
    }

    /// Read [`URL_VAR`] and [`KEY_VAR`] from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &'static str| -> Result<String, ConfigError> {
            let value = lookup(name).ok_or(ConfigError::Missing(name))?;
            let value = value.trim();
            if value.is_empty() {
                return Err(ConfigError::Empty(name));
            }
            Ok(value.to_string())
        };

        Ok(Self {
            url: read(URL_VAR)?,
            key: read(KEY_VAR)?,
        })
    }
}

// Keep the key out of logs.
impl fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreConfig")
            .field("url", &self.url)
            .field("key", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| vars.get(name).cloned()
    }

    #[test]
    fn reads_both_values() {
        let cfg = StoreConfig::from_lookup(lookup(&[
            (URL_VAR, "https://demo.supabase.co"),
            (KEY_VAR, " secret "),
        ]))
        .unwrap();
        assert_eq!(cfg.url, "https://demo.supabase.co");
        assert_eq!(cfg.key, "secret");
    }

    #[test]
    fn missing_key_is_an_error() {
        let err = StoreConfig::from_lookup(lookup(&[(URL_VAR, "https://demo.supabase.co")]))
            .unwrap_err();
        assert_eq!(err, ConfigError::Missing(KEY_VAR));
    }

    #[test]
    fn blank_url_is_an_error() {
        let err = StoreConfig::from_lookup(lookup(&[(URL_VAR, "  "), (KEY_VAR, "k")])).unwrap_err();
        assert_eq!(err, ConfigError::Empty(URL_VAR));
    }

    #[test]
    fn debug_redacts_key() {
        let cfg = StoreConfig::new("https://demo.supabase.co", "secret");
        let out = format!("{cfg:?}");
        assert!(!out.contains("secret"));
    }
}
