//! Error types for driving formula evaluation.
//!
//! These are failures of the driver loop itself. A formula that evaluates to
//! an error object has not failed in this sense; see [`crate::ErrorKind`].

/// Errors that can occur while driving an evaluation to completion.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// `resume` was called while the interpreter was not yielding.
    #[error("cannot resume: no evaluation is waiting on pending requests")]
    InvalidResume,
    /// The formula was still suspended after the configured number of passes.
    #[error("formula still suspended after {passes} passes")]
    PassLimit { passes: usize },
    /// A pass suspended without recording any pending request, so no amount
    /// of resolving can make progress.
    #[error("formula suspended on pass {pass} without reporting a pending request")]
    Stalled { pass: usize },
    /// The host failed to resolve the pending requests.
    #[error("failed to resolve pending requests: {0}")]
    Resolve(String),
}
