//! API credentials.
//!
//! Security notes:
//! - The secret is held in `Zeroizing` memory and wiped on drop.
//! - `Debug` output redacts the secret and most of the key.
//! - Never log secret material.

use crate::error::{ExchangeError, ExchangeResult};
use zeroize::Zeroizing;

/// Environment variable holding the API key.
pub const API_KEY_ENV: &str = "BINGX_API_KEY";
/// Environment variable holding the API secret.
pub const API_SECRET_ENV: &str = "BINGX_API_SECRET";

/// API key pair for signed requests.
#[derive(Clone)]
pub struct Credentials {
    api_key: String,
    api_secret: Zeroizing<String>,
}

impl Credentials {
    /// Create credentials, rejecting blank values.
    pub fn new(api_key: impl Into<String>, api_secret: impl Into<String>) -> ExchangeResult<Self> {
        let api_key = api_key.into().trim().to_string();
        let api_secret = Zeroizing::new(api_secret.into().trim().to_string());

        if api_key.is_empty() || api_secret.is_empty() {
            return Err(ExchangeError::Authentication(format!(
                "API keys not configured. Set {API_KEY_ENV} and {API_SECRET_ENV}"
            )));
        }

        Ok(Self {
            api_key,
            api_secret,
        })
    }

    /// Load from `BINGX_API_KEY` / `BINGX_API_SECRET`.
    pub fn from_env() -> ExchangeResult<Self> {
        let api_key = std::env::var(API_KEY_ENV).unwrap_or_default();
        let api_secret = Zeroizing::new(std::env::var(API_SECRET_ENV).unwrap_or_default());
        Self::new(api_key, api_secret.as_str())
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub(crate) fn api_secret(&self) -> &[u8] {
        self.api_secret.as_bytes()
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let visible: String = self.api_key.chars().take(4).collect();
        f.debug_struct("Credentials")
            .field("api_key", &format!("{visible}***"))
            .field("api_secret", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_credentials_rejected() {
        assert!(Credentials::new("", "secret").unwrap_err().is_authentication());
        assert!(Credentials::new("key", "  ").unwrap_err().is_authentication());
    }

    #[test]
    fn test_debug_redacts_secret() {
        let creds = Credentials::new("abcdefgh", "topsecret").unwrap();
        let debug = format!("{creds:?}");
        assert!(debug.contains("abcd***"));
        assert!(!debug.contains("efgh"));
        assert!(!debug.contains("topsecret"));
    }
}
