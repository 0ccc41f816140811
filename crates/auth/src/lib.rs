//! Credential resolution for hosts that delegate password checks to a
//! mail-passwd service.
//!
//! The host hands over a login and a password; [`CredentialResolver`]
//! strips any `@domain` suffix, asks the service to authenticate the pair
//! and, if it agrees, looks up the user's stable identifier.

pub mod error;
pub mod login;
pub mod resolver;
pub mod types;
pub mod wire;

pub use {
    login::normalize_login,
    resolver::{CredentialResolver, IdentityResolver, ResolverConfig},
    types::{Credentials, DenialReason, Rejection, Resolution, UserIdentifier, UserRecord},
    wire::Endpoints,
};

pub use error::{Error, Result};
