//! Configuration validation engine.
//!
//! Validates configuration files against the known schema, detects
//! unknown/misspelled fields, and reports settings that would leak
//! passwords or make every login fail.

use std::{collections::HashMap, path::Path};

use url::Url;

use crate::schema::MailpasswdConfig;

/// Severity level for a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warning => write!(f, "warning"),
            Self::Info => write!(f, "info"),
        }
    }
}

/// A single validation diagnostic.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Category: "syntax", "unknown-field", "type-error", "missing",
    /// "invalid-value", "security", "file-ref"
    pub category: &'static str,
    /// Dotted path, e.g. "auth.mail_passwd_uri"
    pub path: String,
    pub message: String,
}

/// Result of validating a configuration file.
#[derive(Debug, Clone)]
pub struct ValidationResult {
    pub diagnostics: Vec<Diagnostic>,
    pub config_path: Option<std::path::PathBuf>,
}

impl ValidationResult {
    /// Returns `true` if any diagnostic is an error.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    /// Count diagnostics by severity.
    #[must_use]
    pub fn count(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }
}

// ── Schema tree for unknown-field detection ─────────────────────────────────

/// Represents the expected shape of the configuration schema.
enum KnownKeys {
    /// A struct with fixed field names.
    Struct(HashMap<&'static str, KnownKeys>),
    /// Scalar value, stop recursion.
    Leaf,
}

/// Build the full schema map mirroring every field in `schema.rs`.
fn build_schema_map() -> KnownKeys {
    use KnownKeys::{Leaf, Struct};

    Struct(HashMap::from([(
        "auth",
        Struct(HashMap::from([
            ("mail_passwd_uri", Leaf),
            ("timeout_secs", Leaf),
            ("connect_timeout_secs", Leaf),
        ])),
    )]))
}

// ── Levenshtein distance ────────────────────────────────────────────────────

/// Compute the Levenshtein edit distance between two strings.
fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j] + cost).min(prev[j + 1] + 1).min(curr[j] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

/// Find the best match for `needle` among `candidates` using Levenshtein
/// distance. Returns `Some(best)` if the distance is <= `max_distance`.
fn suggest<'a>(needle: &str, candidates: &[&'a str], max_distance: usize) -> Option<&'a str> {
    let mut best: Option<(&'a str, usize)> = None;
    for &candidate in candidates {
        let d = levenshtein(needle, candidate);
        if d > 0 && d <= max_distance && best.as_ref().is_none_or(|(_, bd)| d < *bd) {
            best = Some((candidate, d));
        }
    }
    best.map(|(s, _)| s)
}

// ── Core validation ─────────────────────────────────────────────────────────

/// Validate a config file at the given path, or discover the default config
/// file location if `path` is `None`.
#[must_use]
pub fn validate(path: Option<&Path>) -> ValidationResult {
    let config_path = match path {
        Some(p) => Some(p.to_path_buf()),
        None => crate::loader::find_config_file(),
    };

    let Some(ref actual_path) = config_path else {
        return ValidationResult {
            diagnostics: vec![Diagnostic {
                severity: Severity::Info,
                category: "file-ref",
                path: String::new(),
                message: "no config file found; the service URI must come from MAILPASSWD_URI"
                    .into(),
            }],
            config_path: None,
        };
    };

    let is_toml = actual_path
        .extension()
        .and_then(|e| e.to_str())
        .is_none_or(|ext| ext == "toml");

    match std::fs::read_to_string(actual_path) {
        Ok(_) if !is_toml => {
            // Only TOML gets the full field-level walk; other formats are
            // checked by loading them.
            let mut result = match crate::loader::load_config(actual_path) {
                Ok(config) => {
                    let mut diagnostics = Vec::new();
                    check_semantics(&config, &mut diagnostics);
                    ValidationResult {
                        diagnostics,
                        config_path: None,
                    }
                },
                Err(e) => ValidationResult {
                    diagnostics: vec![Diagnostic {
                        severity: Severity::Error,
                        category: "syntax",
                        path: String::new(),
                        message: format!("failed to parse config file: {e}"),
                    }],
                    config_path: None,
                },
            };
            result.config_path = Some(actual_path.clone());
            result
        },
        Ok(content) => {
            let mut result = validate_toml_str(&crate::env_subst::substitute_env(&content));
            result.config_path = Some(actual_path.clone());
            result
        },
        Err(e) => ValidationResult {
            diagnostics: vec![Diagnostic {
                severity: Severity::Error,
                category: "syntax",
                path: String::new(),
                message: format!("failed to read config file: {e}"),
            }],
            config_path: Some(actual_path.clone()),
        },
    }
}

/// Validate a TOML string without file-system side effects.
#[must_use]
pub fn validate_toml_str(toml_str: &str) -> ValidationResult {
    let mut diagnostics = Vec::new();

    // 1. Syntax
    let toml_value: toml::Value = match toml::from_str(toml_str) {
        Ok(v) => v,
        Err(e) => {
            diagnostics.push(Diagnostic {
                severity: Severity::Error,
                category: "syntax",
                path: String::new(),
                message: format!("TOML syntax error: {e}"),
            });
            return ValidationResult {
                diagnostics,
                config_path: None,
            };
        },
    };

    // 2. Unknown fields
    let schema = build_schema_map();
    check_unknown_fields(&toml_value, &schema, "", &mut diagnostics);

    // 3. Types, then semantics on the parsed config
    match toml::from_str::<MailpasswdConfig>(toml_str) {
        Ok(config) => check_semantics(&config, &mut diagnostics),
        Err(e) => diagnostics.push(Diagnostic {
            severity: Severity::Error,
            category: "type-error",
            path: String::new(),
            message: format!("type error: {e}"),
        }),
    }

    ValidationResult {
        diagnostics,
        config_path: None,
    }
}

/// Walk the TOML value tree against the schema tree and flag unknown keys.
fn check_unknown_fields(
    value: &toml::Value,
    schema: &KnownKeys,
    prefix: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let (toml::Value::Table(table), KnownKeys::Struct(fields)) = (value, schema) else {
        // Leaf or type mismatch; type errors are caught later
        return;
    };

    let known_keys: Vec<&str> = fields.keys().copied().collect();
    for (key, child_value) in table {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        if let Some(child_schema) = fields.get(key.as_str()) {
            check_unknown_fields(child_value, child_schema, &path, diagnostics);
            continue;
        }

        let level = if prefix.is_empty() {
            "at top level "
        } else {
            ""
        };
        let msg = match suggest(key, &known_keys, 3) {
            Some(s) => format!("unknown field {level}(did you mean \"{s}\"?)"),
            None => format!("unknown field {level}"),
        };
        diagnostics.push(Diagnostic {
            severity: Severity::Error,
            category: "unknown-field",
            path,
            message: msg.trim().to_string(),
        });
    }
}

/// Run semantic checks on a successfully parsed config.
pub fn check_semantics(config: &MailpasswdConfig, diagnostics: &mut Vec<Diagnostic>) {
    let auth = &config.auth;

    if auth.is_unconfigured() {
        diagnostics.push(Diagnostic {
            severity: Severity::Error,
            category: "missing",
            path: "auth.mail_passwd_uri".into(),
            message: "authentication service URI is not set".into(),
        });
    } else {
        check_uri(auth.mail_passwd_uri.trim(), diagnostics);
    }

    for (path, secs) in [
        ("auth.timeout_secs", auth.timeout_secs),
        ("auth.connect_timeout_secs", auth.connect_timeout_secs),
    ] {
        if secs == 0 {
            diagnostics.push(Diagnostic {
                severity: Severity::Error,
                category: "invalid-value",
                path: path.into(),
                message: "timeout must be at least one second".into(),
            });
        }
    }

    if auth.connect_timeout_secs > auth.timeout_secs {
        diagnostics.push(Diagnostic {
            severity: Severity::Warning,
            category: "invalid-value",
            path: "auth.connect_timeout_secs".into(),
            message: format!(
                "connect timeout ({}s) exceeds the request timeout ({}s) and will never fire",
                auth.connect_timeout_secs, auth.timeout_secs
            ),
        });
    }
}

fn check_uri(uri: &str, diagnostics: &mut Vec<Diagnostic>) {
    let path = "auth.mail_passwd_uri";
    let parsed = match Url::parse(uri) {
        Ok(parsed) => parsed,
        Err(e) => {
            diagnostics.push(Diagnostic {
                severity: Severity::Error,
                category: "invalid-value",
                path: path.into(),
                message: format!("not a valid URI: {e}"),
            });
            return;
        },
    };

    match parsed.scheme() {
        "https" => {},
        "http" => {
            let loopback = match parsed.host() {
                Some(url::Host::Domain(d)) => d == "localhost",
                Some(url::Host::Ipv4(ip)) => ip.is_loopback(),
                Some(url::Host::Ipv6(ip)) => ip.is_loopback(),
                None => false,
            };
            if !loopback {
                diagnostics.push(Diagnostic {
                    severity: Severity::Warning,
                    category: "security",
                    path: path.into(),
                    message: "plain http to a remote host sends passwords in cleartext".into(),
                });
            }
        },
        other => diagnostics.push(Diagnostic {
            severity: Severity::Error,
            category: "invalid-value",
            path: path.into(),
            message: format!("unsupported scheme \"{other}\" (expected http or https)"),
        }),
    }

    if parsed.query().is_some() || parsed.fragment().is_some() {
        diagnostics.push(Diagnostic {
            severity: Severity::Warning,
            category: "invalid-value",
            path: path.into(),
            message: "query and fragment are dropped when building API URLs".into(),
        });
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────
