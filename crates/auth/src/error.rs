use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// Resolver settings that can never work, such as a zero timeout.
    #[error("{0}")]
    Message(String),

    /// The configured service URI cannot be used to build API URLs.
    #[error("invalid authentication service uri '{uri}': {reason}")]
    InvalidEndpoint { uri: String, reason: String },

    /// The service accepted the password but answered the identity lookup
    /// with something other than a usable user record.
    #[error("authentication service violated the lookup contract for '{user}': {reason}")]
    ProtocolViolation { user: String, reason: String },

    #[error("{context}")]
    External {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl Error {
    #[must_use]
    pub fn message(message: impl Into<String>) -> Self {
        Self::Message(message.into())
    }

    #[must_use]
    pub fn external(
        context: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::External {
            context: context.into(),
            source: Box::new(source),
        }
    }

    #[must_use]
    pub fn invalid_endpoint(uri: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidEndpoint {
            uri: uri.into(),
            reason: reason.into(),
        }
    }

    #[must_use]
    pub fn protocol_violation(user: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ProtocolViolation {
            user: user.into(),
            reason: reason.into(),
        }
    }

    /// True when the upstream service broke its contract, as opposed to a
    /// local configuration problem.
    #[must_use]
    pub fn is_protocol_violation(&self) -> bool {
        matches!(self, Self::ProtocolViolation { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
