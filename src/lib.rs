//! Diagchat - vehicle diagnostic chat client library
//!
//! This library provides the client side of a multi-step vehicle diagnosis
//! conversation: the controller that drives exchanges with a remote
//! diagnosis service, the pure helpers that decide what the operator can do
//! next, and the terminal front end built on them.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `session`: Transcript store, rewind support and the conversation controller
//! - `service`: Wire model and HTTP client of the diagnosis service
//! - `dispatcher`: Maps the current step and prompt to the live affordance
//! - `guard`: Detection of accidental free-text input
//! - `labels`: Choice label normalization and contextual hints
//! - `step`: Conversation steps, prompt kinds and actions
//! - `config`: Configuration management and validation
//! - `error`: Error types and result aliases
//! - `cli` / `commands`: Command-line interface and its handlers
//!
//! # Example
//!
//! ```no_run
//! use diagchat::service::create_service;
//! use diagchat::session::{ConversationController, NoFocus};
//! use diagchat::Config;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::default();
//!     config.validate()?;
//!
//!     let service = create_service(&config.service)?;
//!     let controller = ConversationController::new(service, Arc::new(NoFocus));
//!     controller.start().await?;
//!     println!("{:?}", controller.snapshot().session.current_step);
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod commands;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod guard;
pub mod labels;
pub mod logging;
pub mod service;
pub mod session;
pub mod step;

// Re-export commonly used types
pub use config::Config;
pub use error::{DiagchatError, Result};
pub use session::ConversationController;
pub use step::{Action, PromptType, Step};

#[cfg(test)]
pub mod test_utils;
