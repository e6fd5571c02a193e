//! Conversation session management
//!
//! This module holds the transcript store, rewind support, and the
//! controller orchestrating a diagnostic conversation.

pub mod controller;
pub mod rewind;
pub mod transcript;

pub use controller::{
    ConversationController, GuardDecision, NoFocus, Session, Snapshot, Submission, TextFocus,
};
pub use rewind::{RewindOutcome, RewindTarget};
pub use transcript::{Role, TranscriptStore, Turn, TurnId};
