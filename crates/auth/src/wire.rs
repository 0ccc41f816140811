//! Requests and URLs of the mail-passwd HTTP API.

use {serde::Serialize, url::Url};

use crate::{Error, Result};

pub const AUTHENTICATE_PATH: &str = "/api/authenticate";
pub const USER_LOOKUP_PATH: &str = "/api/user_lookup";

/// Body of `POST /api/authenticate`.
#[derive(Serialize)]
pub struct AuthenticateRequest<'a> {
    pub user: &'a str,
    pub password: &'a str,
}

/// Body of `POST /api/user_lookup`.
#[derive(Debug, Serialize)]
pub struct LookupRequest<'a> {
    pub user: &'a str,
}

/// Absolute URLs of both API calls, derived once from the base URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    base: String,
    authenticate: String,
    user_lookup: String,
}

impl Endpoints {
    /// Validate `base` and append the API paths to it.
    ///
    /// A path prefix on the base (`https://host/passwd`) is kept; a trailing
    /// slash is not doubled.
    pub fn from_base(base: &str) -> Result<Self> {
        let trimmed = base.trim();
        let parsed = Url::parse(trimmed)
            .map_err(|e| Error::invalid_endpoint(trimmed, e.to_string()))?;

        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(Error::invalid_endpoint(
                trimmed,
                format!("unsupported scheme \"{}\"", parsed.scheme()),
            ));
        }
        if parsed.host_str().is_none_or(str::is_empty) {
            return Err(Error::invalid_endpoint(trimmed, "missing host"));
        }

        let mut root = parsed;
        root.set_query(None);
        root.set_fragment(None);
        let root = root.as_str().trim_end_matches('/').to_string();

        Ok(Self {
            authenticate: format!("{root}{AUTHENTICATE_PATH}"),
            user_lookup: format!("{root}{USER_LOOKUP_PATH}"),
            base: root,
        })
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn authenticate(&self) -> &str {
        &self.authenticate
    }

    pub fn user_lookup(&self) -> &str {
        &self.user_lookup
    }
}
