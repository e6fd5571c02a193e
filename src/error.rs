//! Error types for Diagchat
//!
//! This module defines the error taxonomy used by the conversation controller,
//! the diagnosis service transport, configuration loading and the terminal
//! client, using `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Main error type for Diagchat operations
///
/// Suspicious input held by the input guard and a rewind checkpoint that
/// does not match the local transcript are not errors; they surface as
/// `Submission::Held` and `RewindOutcome::Mismatch` respectively.
#[derive(Error, Debug)]
pub enum DiagchatError {
    /// Network failure, non-success status or undecodable body during an exchange
    #[error("Exchange failed: {0}")]
    ExchangeFailed(String),

    /// A dispatch was attempted while another exchange is still pending
    #[error("An exchange is already in flight")]
    ExchangeInFlight,

    /// Vehicle lookup or reasoning-provider collaborator failures
    #[error("Lookup error: {0}")]
    Lookup(String),

    /// Booking form submitted with required fields left blank
    #[error("Missing required booking fields: {}", .0.join(", "))]
    MissingBookingFields(Vec<String>),

    /// A choice was selected while the current affordance offers none
    #[error("Nothing to select: {0}")]
    NotSelectable(String),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Terminal line editor errors
    #[error("Readline error: {0}")]
    Readline(#[from] rustyline::error::ReadlineError),
}

/// Result type alias for Diagchat operations
///
/// Uses `anyhow::Error` so callers can attach context while still being able
/// to `downcast_ref::<DiagchatError>()` to inspect the failure kind.
pub type Result<T> = anyhow::Result<T>;
