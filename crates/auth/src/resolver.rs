//! Two-step credential resolution against the mail-passwd service.
//!
//! 1. `POST /api/authenticate` with the normalized login and password;
//!    anything but `200 OK` rejects the attempt.
//! 2. `POST /api/user_lookup` with the normalized login; the `id` of the
//!    returned record becomes the user's identity.

use std::time::Duration;

use {
    async_trait::async_trait,
    mailpasswd_config::AuthConfig,
    reqwest::{
        StatusCode,
        header::{ACCEPT, CONTENT_TYPE},
    },
    secrecy::{ExposeSecret, Secret},
    tracing::{debug, error, info, warn},
};

use crate::{
    Error, Result,
    login::normalize_login,
    types::{Credentials, DenialReason, Rejection, Resolution, UserIdentifier, UserRecord},
    wire::{AuthenticateRequest, Endpoints, LookupRequest},
};

const APPLICATION_JSON: &str = "application/json";

/// How much of an error response body ends up in a [`Error::ProtocolViolation`].
const MAX_ERROR_BODY_LEN: usize = 256;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(mailpasswd_config::DEFAULT_TIMEOUT_SECS);
pub const DEFAULT_CONNECT_TIMEOUT: Duration =
    Duration::from_secs(mailpasswd_config::DEFAULT_CONNECT_TIMEOUT_SECS);

/// Immutable settings of a [`CredentialResolver`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverConfig {
    /// Base URI of the authentication service.
    pub endpoint: String,
    /// Upper bound for each of the two requests.
    pub timeout: Duration,
    pub connect_timeout: Duration,
}

impl ResolverConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            timeout: DEFAULT_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_connect_timeout(mut self, connect_timeout: Duration) -> Self {
        self.connect_timeout = connect_timeout;
        self
    }

    pub fn from_auth_config(config: &AuthConfig) -> Self {
        Self {
            endpoint: config.mail_passwd_uri.trim().to_string(),
            timeout: Duration::from_secs(config.timeout_secs),
            connect_timeout: Duration::from_secs(config.connect_timeout_secs),
        }
    }
}

impl From<&AuthConfig> for ResolverConfig {
    fn from(config: &AuthConfig) -> Self {
        Self::from_auth_config(config)
    }
}

/// Something that turns a login and password into a user identity.
///
/// Hosts depend on this rather than on [`CredentialResolver`] so tests can
/// swap in a fake.
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    /// Resolve a login attempt.
    ///
    /// `Ok(Resolution::Rejected(_))` covers every way the attempt can fail
    /// from the user's point of view. `Err` is reserved for the service
    /// breaking its contract.
    async fn resolve(&self, login: &str, password: &Secret<String>) -> Result<Resolution>;

    async fn resolve_credentials(&self, credentials: &Credentials) -> Result<Resolution> {
        self.resolve(&credentials.login, &credentials.password).await
    }

    /// Host-facing entry point: the user identifier on success, the empty
    /// string on rejection.
    async fn login(&self, login: &str, password: &str) -> Result<String> {
        let password = Secret::new(password.to_string());
        self.resolve(login, &password)
            .await
            .map(Resolution::into_sentinel)
    }
}

/// Resolves credentials against the mail-passwd HTTP API.
///
/// Holds no per-call state; clone it or share it behind an `Arc` across
/// tasks. Every call goes to the network.
#[derive(Debug, Clone)]
pub struct CredentialResolver {
    endpoints: Endpoints,
    client: reqwest::Client,
}

impl CredentialResolver {
    pub fn new(config: ResolverConfig) -> Result<Self> {
        let endpoints = Endpoints::from_base(&config.endpoint)?;
        // A zero timeout fails every request, which would look like a wrong
        // password to the user.
        if config.timeout.is_zero() {
            return Err(Error::message("request timeout must be greater than zero"));
        }
        if config.connect_timeout.is_zero() {
            return Err(Error::message("connect timeout must be greater than zero"));
        }
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(|source| Error::external("failed to build http client", source))?;

        debug!(
            endpoint = %endpoints.base(),
            timeout_ms = config.timeout.as_millis() as u64,
            connect_timeout_ms = config.connect_timeout.as_millis() as u64,
            "credential resolver ready"
        );

        Ok(Self { endpoints, client })
    }

    /// Build a resolver from the `[auth]` section of the config file.
    pub fn from_auth_config(config: &AuthConfig) -> Result<Self> {
        if config.is_unconfigured() {
            return Err(Error::invalid_endpoint("", "auth.mail_passwd_uri is not set"));
        }
        Self::new(ResolverConfig::from_auth_config(config))
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// Step 1: `Ok(())` means the service answered `200 OK`.
    async fn authenticate(
        &self,
        user: &str,
        password: &Secret<String>,
    ) -> std::result::Result<(), Rejection> {
        debug!(user, password = "[REDACTED]", "authentication attempt");

        let resp = self
            .client
            .post(self.endpoints.authenticate())
            .header(CONTENT_TYPE, APPLICATION_JSON)
            .json(&AuthenticateRequest {
                user,
                password: password.expose_secret(),
            })
            .send()
            .await
            .map_err(|e| {
                warn!(
                    user,
                    endpoint = %self.endpoints.authenticate(),
                    error = %e,
                    "authentication service unreachable"
                );
                Rejection::Transport
            })?;

        let status = resp.status();
        debug!(user, status = status.as_u16(), "authentication service responded");

        if status == StatusCode::OK {
            return Ok(());
        }

        let reason = DenialReason::from_status(status.as_u16());
        match reason {
            DenialReason::ServiceError | DenialReason::Unexpected => warn!(
                user,
                endpoint = %self.endpoints.authenticate(),
                status = status.as_u16(),
                %reason,
                "authentication service failed the request"
            ),
            _ => info!(user, status = status.as_u16(), %reason, "authentication denied"),
        }

        Err(Rejection::Denied {
            status: status.as_u16(),
            reason,
        })
    }

    /// Step 2: fetch the user record and pull out its `id`.
    async fn lookup(&self, user: &str) -> Result<Resolution> {
        debug!(user, "looking up user identity");

        let resp = match self
            .client
            .post(self.endpoints.user_lookup())
            .header(CONTENT_TYPE, APPLICATION_JSON)
            .header(ACCEPT, APPLICATION_JSON)
            .json(&LookupRequest { user })
            .send()
            .await
        {
            Ok(resp) => resp,
            Err(e) => {
                warn!(
                    user,
                    endpoint = %self.endpoints.user_lookup(),
                    error = %e,
                    "user lookup unreachable after successful authentication"
                );
                return Ok(Resolution::Rejected(Rejection::Transport));
            },
        };

        let status = resp.status();
        debug!(user, status = status.as_u16(), "user lookup responded");

        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            error!(
                user,
                endpoint = %self.endpoints.user_lookup(),
                status = status.as_u16(),
                "user lookup failed for an authenticated user"
            );
            return Err(Error::protocol_violation(
                user,
                format!(
                    "user lookup returned HTTP {status}: {}",
                    truncate_at_char_boundary(&body, MAX_ERROR_BODY_LEN)
                ),
            ));
        }

        let body = match resp.bytes().await {
            Ok(body) => body,
            Err(e) => {
                warn!(user, error = %e, "user lookup response was cut off");
                return Ok(Resolution::Rejected(Rejection::Transport));
            },
        };

        let record: UserRecord = serde_json::from_slice(&body).map_err(|e| {
            error!(
                user,
                endpoint = %self.endpoints.user_lookup(),
                error = %e,
                "user lookup returned an unparseable body"
            );
            Error::protocol_violation(user, format!("response is not a valid user record: {e}"))
        })?;

        let id = match record.id {
            Some(id) if !id.is_empty() => id,
            Some(_) => {
                error!(
                    user,
                    endpoint = %self.endpoints.user_lookup(),
                    "user lookup returned an empty `id`"
                );
                return Err(Error::protocol_violation(user, "`id` field is empty"));
            },
            None => {
                error!(
                    user,
                    endpoint = %self.endpoints.user_lookup(),
                    "user lookup response has no `id`"
                );
                return Err(Error::protocol_violation(user, "missing `id` field"));
            },
        };

        if record.active == Some(false) {
            // The authenticate endpoint is authoritative; just note the mismatch.
            warn!(user, "authenticated user is marked inactive by user lookup");
        }

        debug!(user, id = %id, "login attempt successful");
        Ok(Resolution::Authenticated(UserIdentifier::from(id)))
    }
}

fn truncate_at_char_boundary(text: &str, max_len: usize) -> &str {
    &text[..text.floor_char_boundary(max_len)]
}

#[async_trait]
impl IdentityResolver for CredentialResolver {
    async fn resolve(&self, login: &str, password: &Secret<String>) -> Result<Resolution> {
        let Some(user) = normalize_login(login) else {
            debug!(login, "login is empty once the domain is stripped");
            return Ok(Resolution::Rejected(Rejection::EmptyLogin));
        };

        if let Err(rejection) = self.authenticate(user, password).await {
            return Ok(Resolution::Rejected(rejection));
        }

        self.lookup(user).await
    }
}
