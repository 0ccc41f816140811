use std::path::Path;

use {
    anyhow::Result,
    clap::Subcommand,
    mailpasswd_config::{
        MailpasswdConfig,
        validate::{self, Severity, ValidationResult},
    },
};

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Validate the configuration file and report errors/warnings.
    Check {
        /// Show informational diagnostics in addition to errors and warnings.
        #[arg(long)]
        verbose: bool,
    },
    /// Print the effective configuration (file plus environment overrides).
    Show,
    /// Print the path of the config file in use, or where one would go.
    Path,
}

/// Run a config subcommand and return the process exit code.
///
/// `load` is only called by actions that need the parsed config.
pub fn handle_config(
    action: &ConfigAction,
    explicit_path: Option<&Path>,
    load: impl FnOnce() -> Result<MailpasswdConfig>,
) -> Result<i32> {
    match action {
        ConfigAction::Check { verbose } => Ok(check(explicit_path, *verbose)),
        ConfigAction::Show => {
            print!("{}", mailpasswd_config::to_toml_string(&load()?)?);
            Ok(0)
        },
        ConfigAction::Path => {
            let path = explicit_path
                .map(Path::to_path_buf)
                .unwrap_or_else(mailpasswd_config::find_or_default_config_path);
            println!("{}", path.display());
            Ok(0)
        },
    }
}

/// ANSI color codes.
const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const CYAN: &str = "\x1b[36m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

fn check(path: Option<&Path>, verbose: bool) -> i32 {
    let result = validate::validate(path);

    if let Some(ref path) = result.config_path {
        eprintln!("Checking {}\n", path.display());
    } else {
        eprintln!("No config file found.\n");
    }

    let mut shown = 0;
    for d in &result.diagnostics {
        if d.severity == Severity::Info && !verbose {
            continue;
        }

        let color = match d.severity {
            Severity::Error => RED,
            Severity::Warning => YELLOW,
            Severity::Info => CYAN,
        };

        if d.path.is_empty() {
            eprintln!("  {BOLD}{color}{}{RESET} {}", d.severity, d.message);
        } else {
            eprintln!(
                "  {BOLD}{color}{}{RESET} {}: {}",
                d.severity, d.path, d.message
            );
        }
        shown += 1;
    }

    let errors = result.count(Severity::Error);
    let warnings = result.count(Severity::Warning);

    if shown > 0 {
        eprintln!();
    }

    if errors == 0 && warnings == 0 {
        eprintln!("No issues found.");
    } else {
        eprintln!("{errors} error(s), {warnings} warning(s)");
    }

    check_exit_code(&result)
}

fn check_exit_code(result: &ValidationResult) -> i32 {
    i32::from(result.has_errors())
}
