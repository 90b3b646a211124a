//! Structured error types for the Adit toolkit.

use thiserror::Error;

/// Unified error type for all Adit operations.
#[derive(Debug, Error)]
pub enum AditError {
    /// I/O error (file not found, permission denied, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error (malformed rule, coreactant, or seed data)
    #[error("parse error: {0}")]
    Parse(String),

    /// Invalid input (bad arguments, unresolvable rule slots, out-of-range values)
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Structure engine failure (unparsable notation, transform failure).
    /// Recoverable at per-candidate scope during expansion.
    #[error("structure engine error: {0}")]
    Engine(String),

    /// Network integrity violation (conflicting records under one identity key).
    /// Fatal: signals corruption of the identity derivation.
    #[error("network integrity error: {0}")]
    Integrity(String),

    /// Catch-all for other errors
    #[error("{0}")]
    Other(String),
}

/// Convenience alias used throughout the Adit crates.
pub type Result<T> = std::result::Result<T, AditError>;
