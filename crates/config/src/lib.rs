//! Configuration loading, defaults, env substitution, and validation.
//!
//! Config files: `beeline.toml`, `beeline.yaml`, or `beeline.json`
//! Searched in `./` then `~/.config/beeline/`.
//!
//! Supports `${ENV_VAR}` substitution in all string values.

pub mod env_subst;
pub mod error;
pub mod loader;
pub mod schema;
pub mod validate;

pub use {
    error::{Error, Result},
    loader::{
        config_dir, discover_and_load, find_or_default_config_path, load_config, save_config,
        set_config_dir,
    },
    schema::{BeelineConfig, CredentialsConfig, FallbackEngine, Settings},
    validate::{Diagnostic, Severity, ValidationResult},
};
