use {
    secrecy::Secret,
    serde::{Deserialize, Serialize},
};

/// A login attempt as handed over by the host server.
#[derive(Clone)]
pub struct Credentials {
    pub login: String,
    pub password: Secret<String>,
}

impl Credentials {
    pub fn new(login: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            login: login.into(),
            password: Secret::new(password.into()),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("login", &self.login)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Opaque, stable identifier of an authenticated user (usually a UUID).
///
/// Never parsed; it is whatever the lookup endpoint put in `id`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserIdentifier(String);

impl UserIdentifier {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl std::fmt::Display for UserIdentifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for UserIdentifier {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Outcome of a login attempt that did not hit a contract violation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Authenticated(UserIdentifier),
    Rejected(Rejection),
}

impl Resolution {
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }

    /// The identifier, or `None` for any kind of rejection.
    #[must_use]
    pub fn identifier(&self) -> Option<&UserIdentifier> {
        match self {
            Self::Authenticated(id) => Some(id),
            Self::Rejected(_) => None,
        }
    }

    /// Collapse into the host contract: the identifier, or the empty string.
    #[must_use]
    pub fn into_sentinel(self) -> String {
        match self {
            Self::Authenticated(id) => id.into_inner(),
            Self::Rejected(_) => String::new(),
        }
    }
}

/// Why a login attempt was turned down. All variants look the same to the
/// caller; they only differ in how loudly they are logged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// Nothing left of the login after normalization.
    EmptyLogin,
    /// The authenticate endpoint answered with something other than 200.
    Denied { status: u16, reason: DenialReason },
    /// The service could not be reached or did not answer in time.
    Transport,
}

/// Meaning of the authenticate endpoint's non-200 answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenialReason {
    /// 400: no such user.
    UnknownUser,
    /// 401: wrong or expired password.
    InvalidPassword,
    /// 403: account disabled by an administrator.
    LoginDisabled,
    /// 5xx: the service failed internally.
    ServiceError,
    /// Any other status code.
    Unexpected,
}

impl DenialReason {
    #[must_use]
    pub fn from_status(status: u16) -> Self {
        match status {
            400 => Self::UnknownUser,
            401 => Self::InvalidPassword,
            403 => Self::LoginDisabled,
            500..=599 => Self::ServiceError,
            _ => Self::Unexpected,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UnknownUser => "unknown user",
            Self::InvalidPassword => "invalid password",
            Self::LoginDisabled => "login disabled",
            Self::ServiceError => "service error",
            Self::Unexpected => "unexpected status",
        }
    }
}

impl std::fmt::Display for DenialReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User record returned by `/api/user_lookup`. Only `id` is required by
/// us; the service sends more (timestamps, expiry) which are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserRecord {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub active: Option<bool>,
}
