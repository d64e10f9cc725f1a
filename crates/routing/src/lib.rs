//! Navigation orchestrator.
//!
//! Each query gets its own [`RoutingSession`]. Resolution strategies race
//! against it and propose URLs at a [`Stage`]; a proposal only navigates when
//! it outranks (or, at equal rank, differs from) what is already committed.
//!
//! Stages, lowest first:
//! 1. Fallback (generic web search, also what the timeout commits)
//! 2. Non-AI (keyword table, built-in platform match, first-result refinement)
//! 3. AI (remote classifier verdict)
//! 4. Direct (literal `http(s)://` input)

pub mod error;
pub mod router;
pub mod session;

pub use {
    error::{Error, Result},
    router::{Navigator, RouteOutcome, Router, SESSION_TIMEOUT, SettingsSource, StaticSettings},
    session::{CommitOutcome, RoutingSession, Stage},
};
