// ── Core error types ──
//
// Almost nothing in this crate propagates errors past its own boundary:
// discovery failures downgrade to "no capabilities", move failures log
// and re-enable, missing readouts are skipped. `CoreError` exists for
// the few genuinely constructive operations (bootstrap wiring, URL
// derivation) that can fail before the page is running.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Wrapped transport-layer error from gridwatch-api.
    #[error("API error: {0}")]
    Api(#[from] gridwatch_api::Error),
}
