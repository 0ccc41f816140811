mod config_commands;
mod resolve_command;

use std::path::{Path, PathBuf};

use {
    clap::{Parser, Subcommand},
    mailpasswd_config::MailpasswdConfig,
    tracing::{debug, warn},
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

#[derive(Parser)]
#[command(
    name = "mailpasswd-auth",
    about = "Resolve logins against a mail-passwd authentication service"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    /// Config file to use instead of searching the standard locations.
    #[arg(long, global = true, env = "MAILPASSWD_CONFIG")]
    config: Option<PathBuf>,

    /// Custom config directory (overrides default ~/.config/mailpasswd/).
    #[arg(long, global = true, env = "MAILPASSWD_CONFIG_DIR")]
    config_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Authenticate a login and print the user's identifier.
    ///
    /// The password is read from the first line of stdin unless
    /// `MAILPASSWD_PASSWORD` is set. Exits 0 on success, 1 on rejection
    /// and 2 when the service misbehaves.
    Resolve {
        /// Login as the user typed it; an `@domain` suffix is ignored.
        login: String,
    },
    /// Configuration management.
    Config {
        #[command(subcommand)]
        action: config_commands::ConfigAction,
    },
}

/// Initialise tracing. Logs go to stderr so stdout only carries results.
fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

/// Load the explicit config file if one was given, else discover one.
fn load_config(explicit: Option<&Path>) -> anyhow::Result<MailpasswdConfig> {
    let Some(path) = explicit else {
        return Ok(mailpasswd_config::discover_and_load());
    };
    let mut config = mailpasswd_config::load_config(path)?;
    mailpasswd_config::apply_env_overrides(&mut config);
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    init_telemetry(&cli);

    debug!(version = env!("CARGO_PKG_VERSION"), "mailpasswd-auth starting");

    if let Some(ref dir) = cli.config_dir {
        mailpasswd_config::set_config_dir(dir.clone());
    }

    let explicit = cli.config.as_deref();

    match cli.command {
        Commands::Resolve { ref login } => {
            let config = match load_config(explicit) {
                Ok(config) => config,
                Err(e) => {
                    warn!(error = %e, "failed to load config");
                    eprintln!("error: {e:#}");
                    std::process::exit(resolve_command::ResolveStatus::Failed.code());
                },
            };
            let password = std::env::var(resolve_command::PASSWORD_ENV).ok();
            let status = resolve_command::handle_resolve(&config, login, password).await;
            std::process::exit(status.code());
        },
        Commands::Config { ref action } => {
            // `check` and `path` look at the file itself, so a file that
            // does not parse must not stop them.
            let code = config_commands::handle_config(action, explicit, || load_config(explicit))?;
            if code != 0 {
                std::process::exit(code);
            }
            Ok(())
        },
    }
}
