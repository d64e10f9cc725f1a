use {
    anyhow::{Result, bail},
    clap::Subcommand,
    secrecy::Secret,
};

use beeline_config::{
    BeelineConfig,
    validate::{self, Severity},
};

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print the effective settings (defaults merged in).
    Show,
    /// Write a default config file.
    Init {
        /// Store this classifier API key in the file.
        #[arg(long, env = "BEELINE_API_KEY", hide_env_values = true)]
        api_key: Option<String>,
        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },
    /// Validate the configuration file and report errors/warnings.
    Validate {
        /// Show informational diagnostics in addition to errors and warnings.
        #[arg(long)]
        verbose: bool,
    },
}

pub fn handle_config(action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Show => show(),
        ConfigAction::Init { api_key, force } => init(api_key, force),
        ConfigAction::Validate { verbose } => check(verbose),
    }
}

fn show() -> Result<()> {
    let config = beeline_config::discover_and_load();
    println!("{}", serde_json::to_string_pretty(&config.settings)?);
    let key = if config.api_key().is_empty() {
        "not set"
    } else {
        "set"
    };
    println!("api key: {key}");
    Ok(())
}

fn init(api_key: Option<String>, force: bool) -> Result<()> {
    let path = beeline_config::find_or_default_config_path();
    if path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }

    let mut config = BeelineConfig::default();
    config.credentials.api_key = api_key
        .map(|key| key.trim().to_string())
        .filter(|key| !key.is_empty())
        .map(Secret::new);
    beeline_config::save_config(&config, &path)?;
    println!("Config written to: {}", path.display());
    Ok(())
}

/// ANSI color codes.
const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const CYAN: &str = "\x1b[36m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

fn check(verbose: bool) -> Result<()> {
    let result = validate::validate(None);

    if let Some(ref path) = result.config_path {
        eprintln!("Checking {}\n", path.display());
    } else {
        eprintln!("No config file found; checking defaults.\n");
    }

    let mut shown = 0;
    for d in &result.diagnostics {
        if d.severity == Severity::Info && !verbose {
            continue;
        }

        let (color, label) = match d.severity {
            Severity::Error => (RED, "error"),
            Severity::Warning => (YELLOW, "warning"),
            Severity::Info => (CYAN, "info"),
        };

        if d.path.is_empty() {
            eprintln!("  {BOLD}{color}{label}{RESET} {}", d.message);
        } else {
            eprintln!("  {BOLD}{color}{label}{RESET} {}: {}", d.path, d.message);
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

    if errors > 0 {
        bail!("configuration has {errors} error(s)");
    }
    Ok(())
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_writes_once_unless_forced() {
        let dir = tempfile::tempdir().unwrap();
        beeline_config::set_config_dir(dir.path().to_path_buf());
        let path = dir.path().join("beeline.toml");

        init(Some("  sk-test  ".into()), false).unwrap();
        let loaded = beeline_config::load_config(&path).unwrap();
        assert_eq!(loaded.api_key(), "sk-test");
        assert_eq!(loaded.settings, beeline_config::Settings::default());

        assert!(init(None, false).is_err());
        init(None, true).unwrap();
        let reloaded = beeline_config::load_config(&path).unwrap();
        assert!(reloaded.credentials.api_key.is_none());
    }
}
