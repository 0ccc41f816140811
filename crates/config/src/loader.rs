use std::{
    path::{Path, PathBuf},
    sync::Mutex,
};

use tracing::{debug, warn};

use crate::{env_subst::substitute_env, schema::MailpasswdConfig};

/// Standard config file names, checked in order.
const CONFIG_FILENAMES: &[&str] = &[
    "mailpasswd.toml",
    "mailpasswd.yaml",
    "mailpasswd.yml",
    "mailpasswd.json",
];

/// Environment variables that override values from the config file.
pub const ENV_URI: &str = "MAILPASSWD_URI";
pub const ENV_TIMEOUT_SECS: &str = "MAILPASSWD_TIMEOUT_SECS";
pub const ENV_CONNECT_TIMEOUT_SECS: &str = "MAILPASSWD_CONNECT_TIMEOUT_SECS";

static CONFIG_DIR_OVERRIDE: Mutex<Option<PathBuf>> = Mutex::new(None);

/// Override the user-global config directory (e.g. from `--config-dir`).
pub fn set_config_dir(path: PathBuf) {
    let mut guard = CONFIG_DIR_OVERRIDE
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    *guard = Some(path);
}

/// Drop a previous [`set_config_dir`] override.
pub fn clear_config_dir() {
    let mut guard = CONFIG_DIR_OVERRIDE
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    *guard = None;
}

/// Returns the user-global config directory.
///
/// Resolution order:
/// 1. programmatic override (`set_config_dir`)
/// 2. `~/.config/mailpasswd`
pub fn config_dir() -> Option<PathBuf> {
    let guard = CONFIG_DIR_OVERRIDE
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    if let Some(dir) = guard.as_ref() {
        return Some(dir.clone());
    }
    directories::ProjectDirs::from("", "", "mailpasswd").map(|d| d.config_dir().to_path_buf())
}

/// Load config from the given path (any supported format).
pub fn load_config(path: &Path) -> anyhow::Result<MailpasswdConfig> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()))?;
    let raw = substitute_env(&raw);
    parse_config(&raw, path)
}

/// Discover and load config from standard locations, then apply env overrides.
///
/// Search order:
/// 1. `./mailpasswd.{toml,yaml,yml,json}` (project-local)
/// 2. `<config dir>/mailpasswd.{toml,yaml,yml,json}` (user-global)
///
/// Falls back to `MailpasswdConfig::default()` if no config file is found or
/// it fails to parse; the service URI can still arrive through `MAILPASSWD_URI`.
pub fn discover_and_load() -> MailpasswdConfig {
    let mut config = match find_config_file() {
        Some(path) => {
            debug!(path = %path.display(), "loading config");
            load_config(&path).unwrap_or_else(|e| {
                warn!(path = %path.display(), error = %e, "failed to load config, using defaults");
                MailpasswdConfig::default()
            })
        },
        None => {
            debug!("no config file found, using defaults");
            MailpasswdConfig::default()
        },
    };
    apply_env_overrides(&mut config);
    config
}

/// Find the first config file in standard locations.
pub(crate) fn find_config_file() -> Option<PathBuf> {
    for name in CONFIG_FILENAMES {
        let p = PathBuf::from(name);
        if p.exists() {
            return Some(p);
        }
    }

    let dir = config_dir()?;
    CONFIG_FILENAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|p| p.exists())
}

/// Returns the path of an existing config file, or the default TOML path.
pub fn find_or_default_config_path() -> PathBuf {
    if let Some(path) = find_config_file() {
        return path;
    }
    config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("mailpasswd.toml")
}

/// Apply `MAILPASSWD_*` environment overrides on top of a loaded config.
pub fn apply_env_overrides(config: &mut MailpasswdConfig) {
    apply_env_overrides_with(config, |name| std::env::var(name).ok());
}

/// Same as [`apply_env_overrides`] with a custom variable lookup.
pub fn apply_env_overrides_with(
    config: &mut MailpasswdConfig,
    lookup: impl Fn(&str) -> Option<String>,
) {
    if let Some(uri) = lookup(ENV_URI).filter(|v| !v.trim().is_empty()) {
        debug!(var = ENV_URI, "overriding auth.mail_passwd_uri from environment");
        config.auth.mail_passwd_uri = uri.trim().to_string();
    }
    if let Some(secs) = parse_secs(ENV_TIMEOUT_SECS, lookup(ENV_TIMEOUT_SECS)) {
        config.auth.timeout_secs = secs;
    }
    if let Some(secs) = parse_secs(ENV_CONNECT_TIMEOUT_SECS, lookup(ENV_CONNECT_TIMEOUT_SECS)) {
        config.auth.connect_timeout_secs = secs;
    }
}

fn parse_secs(var: &str, value: Option<String>) -> Option<u64> {
    let value = value?;
    match value.trim().parse::<u64>() {
        Ok(0) => {
            warn!(var, "ignoring zero timeout override");
            None
        },
        Ok(secs) => Some(secs),
        Err(e) => {
            warn!(var, value = %value, error = %e, "ignoring invalid timeout override");
            None
        },
    }
}

/// Render a config as pretty TOML.
pub fn to_toml_string(config: &MailpasswdConfig) -> anyhow::Result<String> {
    toml::to_string_pretty(config).map_err(|e| anyhow::anyhow!("serialize config: {e}"))
}

fn parse_config(raw: &str, path: &Path) -> anyhow::Result<MailpasswdConfig> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match ext {
        "toml" => Ok(toml::from_str(raw)?),
        "yaml" | "yml" => Ok(serde_yaml::from_str(raw)?),
        "json" => Ok(serde_json::from_str(raw)?),
        _ => anyhow::bail!("unsupported config format: .{ext}"),
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    use crate::schema::{AuthConfig, DEFAULT_TIMEOUT_SECS};

    fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn loads_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            dir.path(),
            "mailpasswd.toml",
            "[auth]\nmail_passwd_uri = \"https://passwd.example.com\"\ntimeout_secs = 3\n",
        );
        let cfg = load_config(&path).unwrap();
        assert_eq!(cfg.auth.mail_passwd_uri, "https://passwd.example.com");
        assert_eq!(cfg.auth.timeout_secs, 3);
    }

    #[test]
    fn loads_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            dir.path(),
            "mailpasswd.yaml",
            "auth:\n  mail_passwd_uri: https://passwd.example.com\n",
        );
        let cfg = load_config(&path).unwrap();
        assert_eq!(cfg.auth.mail_passwd_uri, "https://passwd.example.com");
        assert_eq!(cfg.auth.timeout_secs, DEFAULT_TIMEOUT_SECS);
    }

    #[test]
    fn loads_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            dir.path(),
            "mailpasswd.json",
            r#"{"auth": {"mail_passwd_uri": "http://127.0.0.1:8080", "connect_timeout_secs": 1}}"#,
        );
        let cfg = load_config(&path).unwrap();
        assert_eq!(cfg.auth.mail_passwd_uri, "http://127.0.0.1:8080");
        assert_eq!(cfg.auth.connect_timeout_secs, 1);
    }

    #[test]
    fn rejects_unknown_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "mailpasswd.ini", "uri=x");
        let err = load_config(&path).unwrap_err();
        assert!(err.to_string().contains("unsupported config format"));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = load_config(Path::new("/nonexistent/mailpasswd.toml")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/mailpasswd.toml"));
    }

    #[test]
    fn env_overrides_replace_file_values() {
        let mut cfg = MailpasswdConfig {
            auth: AuthConfig {
                mail_passwd_uri: "https://old.example.com".into(),
                ..AuthConfig::default()
            },
        };
        apply_env_overrides_with(&mut cfg, |name| match name {
            ENV_URI => Some(" https://new.example.com ".into()),
            ENV_TIMEOUT_SECS => Some("30".into()),
            _ => None,
        });
        assert_eq!(cfg.auth.mail_passwd_uri, "https://new.example.com");
        assert_eq!(cfg.auth.timeout_secs, 30);
    }

    #[test]
    fn invalid_env_timeout_is_ignored() {
        let mut cfg = MailpasswdConfig::default();
        apply_env_overrides_with(&mut cfg, |name| match name {
            ENV_CONNECT_TIMEOUT_SECS => Some("soon".into()),
            ENV_URI => Some(String::new()),
            _ => None,
        });
        assert_eq!(cfg, MailpasswdConfig::default());
    }

    #[test]
    fn zero_env_timeout_is_ignored() {
        let mut cfg = MailpasswdConfig::default();
        apply_env_overrides_with(&mut cfg, |name| match name {
            ENV_TIMEOUT_SECS | ENV_CONNECT_TIMEOUT_SECS => Some("0".into()),
            _ => None,
        });
        assert_eq!(cfg.auth.timeout_secs, DEFAULT_TIMEOUT_SECS);
        assert_eq!(
            cfg.auth.connect_timeout_secs,
            crate::schema::DEFAULT_CONNECT_TIMEOUT_SECS
        );
    }

    #[test]
    fn config_dir_override_wins_until_cleared() {
        let dir = tempfile::tempdir().unwrap();
        set_config_dir(dir.path().to_path_buf());
        assert_eq!(config_dir().as_deref(), Some(dir.path()));

        let path = write(dir.path(), "mailpasswd.yml", "auth: {}\n");
        if !Path::new("mailpasswd.toml").exists() {
            assert_eq!(find_config_file(), Some(path));
        }

        clear_config_dir();
        assert_ne!(config_dir().as_deref(), Some(dir.path()));
    }

    #[test]
    fn toml_rendering_reloads() {
        let cfg = MailpasswdConfig {
            auth: AuthConfig {
                mail_passwd_uri: "https://passwd.example.com".into(),
                timeout_secs: 7,
                connect_timeout_secs: 2,
            },
        };
        let rendered = to_toml_string(&cfg).unwrap();
        assert!(rendered.contains("[auth]"));
        let reparsed: MailpasswdConfig = toml::from_str(&rendered).unwrap();
        assert_eq!(reparsed, cfg);
    }
}
