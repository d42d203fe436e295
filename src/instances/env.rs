//! Environment variable access.
//!
//! Resolution reads the process environment through this trait so tests can
//! supply variables without mutating global state.

#[cfg(test)]
use mockall::automock;

/// Instance definitions as JSON (array or name-keyed object).
pub const INSTANCES_VAR: &str = "VIKUNJA_INSTANCES";
/// Base URL of the single `default` instance.
pub const URL_VAR: &str = "VIKUNJA_URL";
/// API token of the single `default` instance.
pub const TOKEN_VAR: &str = "VIKUNJA_TOKEN";
/// Any non-empty value turns on debug logging.
pub const DEBUG_VAR: &str = "VIKUNJA_DEBUG";

/// Read access to environment variables. Can be mocked in tests.
#[cfg_attr(test, automock)]
pub trait Environment {
    /// Value of `name`, or `None` when unset or not valid unicode.
    fn var(&self, name: &str) -> Option<String>;
}

/// The real process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl Environment for ProcessEnv {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}
