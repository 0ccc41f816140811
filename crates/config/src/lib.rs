//! Configuration loading, validation and env substitution.
//!
//! Config files: `mailpasswd.toml`, `mailpasswd.yaml`, or `mailpasswd.json`
//! Searched in `./` then `~/.config/mailpasswd/`.
//!
//! Supports `${ENV_VAR}` substitution in all string values, and
//! `MAILPASSWD_*` overrides applied after loading.

pub mod env_subst;
pub mod loader;
pub mod schema;
pub mod validate;

pub use {
    loader::{
        apply_env_overrides, apply_env_overrides_with, clear_config_dir, config_dir,
        discover_and_load, find_or_default_config_path, load_config, set_config_dir,
        to_toml_string,
    },
    schema::{AuthConfig, DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_TIMEOUT_SECS, MailpasswdConfig},
    validate::{Diagnostic, Severity, ValidationResult, validate, validate_toml_str},
};
