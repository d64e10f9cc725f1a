//! Local, network-free intent resolution.
//!
//! - [`optimize`]: turns free text into a platform search keyword and detects
//!   "latest from creator" phrasing.
//! - [`keyword`]: user keyword-dictionary lookup.
//! - [`builtin`]: built-in `<platform> <query>` matcher.

pub mod builtin;
pub mod keyword;
pub mod optimize;

pub use {
    builtin::resolve_built_in_platform_search,
    keyword::{apply_template, resolve_keyword},
    optimize::{extract_creator_name, is_creator_intent, optimize_search_keyword, wants_latest},
};
