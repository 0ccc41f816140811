//! Config schema types.
use serde::{Deserialize, Serialize};

/// Default whole-request timeout for calls to the authentication service.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
/// Default TCP connect timeout for calls to the authentication service.
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 5;

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MailpasswdConfig {
    pub auth: AuthConfig,
}

/// Where and how to reach the mail-passwd authentication service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Base URI of the authentication service, e.g. `https://passwd.example.com`.
    /// `/api/authenticate` and `/api/user_lookup` are appended to it.
    pub mail_passwd_uri: String,
    /// Upper bound for a single request, including reading the body.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            mail_passwd_uri: String::new(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
        }
    }
}

impl AuthConfig {
    /// True when no service URI has been configured.
    #[must_use]
    pub fn is_unconfigured(&self) -> bool {
        self.mail_passwd_uri.trim().is_empty()
    }
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_connect_timeout_secs() -> u64 {
    DEFAULT_CONNECT_TIMEOUT_SECS
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_timeouts_fall_back_to_defaults() {
        let cfg: MailpasswdConfig = toml::from_str(
            r#"
[auth]
mail_passwd_uri = "https://passwd.example.com"
"#,
        )
        .unwrap();
        assert_eq!(cfg.auth.mail_passwd_uri, "https://passwd.example.com");
        assert_eq!(cfg.auth.timeout_secs, DEFAULT_TIMEOUT_SECS);
        assert_eq!(cfg.auth.connect_timeout_secs, DEFAULT_CONNECT_TIMEOUT_SECS);
    }

    #[test]
    fn empty_document_is_unconfigured() {
        let cfg: MailpasswdConfig = toml::from_str("").unwrap();
        assert!(cfg.auth.is_unconfigured());
        assert_eq!(cfg, MailpasswdConfig::default());
    }

    #[test]
    fn whitespace_uri_is_unconfigured() {
        let auth = AuthConfig {
            mail_passwd_uri: "   ".into(),
            ..AuthConfig::default()
        };
        assert!(auth.is_unconfigured());
    }
}
