//! Shared types, error definitions, and URL safety rules used across all beeline crates.

pub mod diagnostics;
pub mod error;
pub mod platform;
pub mod types;
pub mod urls;

pub use {
    error::{Error, FromMessage, Result},
    platform::Platform,
    types::AiDecision,
};
