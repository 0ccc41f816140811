//! `mailpasswd-auth resolve`: run one login attempt from the shell.
//!
//! Prints the resolved identifier on stdout, or an empty line when the
//! attempt is rejected, mirroring what a host server would receive.

use std::io::BufRead;

use {
    anyhow::{Context, Result},
    mailpasswd_auth::{CredentialResolver, IdentityResolver},
    mailpasswd_config::MailpasswdConfig,
    tracing::debug,
};

/// Environment variable holding the password; it is never taken from argv.
pub const PASSWORD_ENV: &str = "MAILPASSWD_PASSWORD";

/// Exit status of the `resolve` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveStatus {
    Authenticated = 0,
    Rejected = 1,
    /// The service broke its contract, or the resolver could not be built.
    Failed = 2,
}

impl ResolveStatus {
    pub fn from_sentinel(id: &str) -> Self {
        if id.is_empty() {
            Self::Rejected
        } else {
            Self::Authenticated
        }
    }

    pub fn code(self) -> i32 {
        self as i32
    }
}

pub async fn handle_resolve(
    config: &MailpasswdConfig,
    login: &str,
    password: Option<String>,
) -> ResolveStatus {
    match run(config, login, password).await {
        Ok(id) => {
            println!("{id}");
            ResolveStatus::from_sentinel(&id)
        },
        Err(e) => {
            eprintln!("error: {e:#}");
            ResolveStatus::Failed
        },
    }
}

async fn run(config: &MailpasswdConfig, login: &str, password: Option<String>) -> Result<String> {
    let resolver = CredentialResolver::from_auth_config(&config.auth)
        .context("cannot set up the credential resolver")?;

    let password = match password {
        Some(password) => password,
        None => {
            debug!("reading password from stdin");
            read_password(std::io::stdin().lock())?
        },
    };

    Ok(resolver.login(login, &password).await?)
}

/// Read the password from the first line of `input`, without its line ending.
fn read_password(mut input: impl BufRead) -> Result<String> {
    let mut line = String::new();
    input
        .read_line(&mut line)
        .context("failed to read password from stdin")?;
    let trimmed = line
        .strip_suffix('\n')
        .map(|l| l.strip_suffix('\r').unwrap_or(l))
        .unwrap_or(&line);
    Ok(trimmed.to_string())
}
