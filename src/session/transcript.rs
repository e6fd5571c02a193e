//! Ordered transcript of a diagnostic conversation
//!
//! The store is append-only except for the two destructive operations the
//! controller needs: truncation after a rewind and a full clear on reset.

use crate::service::{Coverage, ExchangeResponse, Prompt, Source, UrgencyInfo};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a turn, unique and strictly increasing within a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TurnId(u64);

impl TurnId {
    /// Numeric value of the id
    pub fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for TurnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Author of a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One entry of the transcript
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub id: TurnId,
    pub role: Role,
    pub content: String,
    /// Diagnostic turn number the entry belongs to, only while diagnosing
    pub diagnostic_turn: Option<u32>,
    pub urgency: Option<UrgencyInfo>,
    pub citations: Vec<Source>,
    pub coverage: Option<Coverage>,
    /// Prompt that produced an assistant turn
    pub prompt: Option<Prompt>,
    pub timestamp: DateTime<Utc>,
}

impl Turn {
    /// Whether the operator authored this turn
    pub fn is_user(&self) -> bool {
        self.role == Role::User
    }
}

/// Append-only log of turns with its own id counter
///
/// # Examples
///
/// ```
/// use diagchat::session::TranscriptStore;
///
/// let mut store = TranscriptStore::new();
/// let first = store.push_user("エンジンがかからない", None);
/// let second = store.push_user("セルは回る", None);
/// assert!(second > first);
/// assert_eq!(store.len(), 2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct TranscriptStore {
    turns: Vec<Turn>,
    next_id: u64,
}

impl TranscriptStore {
    /// Creates an empty store
    pub fn new() -> Self {
        Self::default()
    }

    fn next_id(&mut self) -> TurnId {
        self.next_id += 1;
        TurnId(self.next_id)
    }

    /// Appends an operator turn
    pub fn push_user(&mut self, content: impl Into<String>, diagnostic_turn: Option<u32>) -> TurnId {
        let id = self.next_id();
        self.turns.push(Turn {
            id,
            role: Role::User,
            content: content.into(),
            diagnostic_turn,
            urgency: None,
            citations: Vec::new(),
            coverage: None,
            prompt: None,
            timestamp: Utc::now(),
        });
        id
    }

    /// Appends the assistant turn carried by a response
    ///
    /// The diagnostic turn number is kept only when the response's step is
    /// `diagnosing`.
    pub fn push_assistant(&mut self, response: &ExchangeResponse) -> TurnId {
        let id = self.next_id();
        let diagnostic_turn = if response.current_step.is_diagnosing() {
            response.diagnostic_turn
        } else {
            None
        };
        self.turns.push(Turn {
            id,
            role: Role::Assistant,
            content: response.prompt.message.clone(),
            diagnostic_turn,
            urgency: response.urgency.clone(),
            citations: response.citations.clone(),
            coverage: response.coverage,
            prompt: Some(response.prompt.clone()),
            timestamp: Utc::now(),
        });
        id
    }

    /// All turns in append order
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Index of the first user turn at or past `diagnostic_turn`
    pub fn first_user_at_or_after(&self, diagnostic_turn: u32) -> Option<usize> {
        self.turns.iter().position(|turn| {
            turn.is_user() && turn.diagnostic_turn.map_or(false, |t| t >= diagnostic_turn)
        })
    }

    /// Drops the turn at `index` and everything after it, returning how many
    /// turns were removed
    pub fn truncate_from(&mut self, index: usize) -> usize {
        let removed = self.turns.len().saturating_sub(index);
        self.turns.truncate(index);
        removed
    }

    /// Removes every turn and restarts the id counter
    pub fn clear(&mut self) {
        self.turns.clear();
        self.next_id = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::step::{PromptType, Step};

    fn response(step: Step, diagnostic_turn: Option<u32>) -> ExchangeResponse {
        let mut response =
            ExchangeResponse::new("s-1", step, Prompt::new(PromptType::Text, "症状を教えてください"));
        response.diagnostic_turn = diagnostic_turn;
        response
    }

    #[test]
    fn test_ids_strictly_increase() {
        let mut store = TranscriptStore::new();
        let ids: Vec<TurnId> = vec![
            store.push_user("a", None),
            store.push_assistant(&response(Step::FreeText, None)),
            store.push_user("b", None),
        ];
        assert!(ids.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_ids_stay_unique_after_truncate() {
        let mut store = TranscriptStore::new();
        store.push_user("a", Some(1));
        let second = store.push_user("b", Some(2));
        store.truncate_from(1);
        let third = store.push_user("c", Some(2));
        assert!(third > second);
    }

    #[test]
    fn test_assistant_turn_copies_response() {
        let mut store = TranscriptStore::new();
        let mut resp = response(Step::Diagnosing, Some(3));
        resp.citations = vec![Source {
            content: "取扱説明書の抜粋".to_string(),
            page: 12,
            section: "エンジンの始動".to_string(),
            score: 0.8,
        }];
        resp.coverage = Some(Coverage::Partial);
        store.push_assistant(&resp);

        let turn = &store.turns()[0];
        assert_eq!(turn.role, Role::Assistant);
        assert_eq!(turn.content, "症状を教えてください");
        assert_eq!(turn.diagnostic_turn, Some(3));
        assert_eq!(turn.citations.len(), 1);
        assert_eq!(turn.coverage, Some(Coverage::Partial));
        assert!(turn.prompt.is_some());
    }

    #[test]
    fn test_assistant_diagnostic_turn_only_while_diagnosing() {
        let mut store = TranscriptStore::new();
        store.push_assistant(&response(Step::UrgencyCheck, Some(4)));
        assert_eq!(store.turns()[0].diagnostic_turn, None);
    }

    #[test]
    fn test_first_user_at_or_after_skips_assistant_and_untagged() {
        let mut store = TranscriptStore::new();
        store.push_user("vehicle", None);
        store.push_assistant(&response(Step::Diagnosing, Some(2)));
        store.push_user("u1", Some(1));
        store.push_user("u2", Some(2));
        assert_eq!(store.first_user_at_or_after(2), Some(3));
        assert_eq!(store.first_user_at_or_after(1), Some(2));
        assert_eq!(store.first_user_at_or_after(9), None);
    }

    #[test]
    fn test_truncate_from_reports_removed() {
        let mut store = TranscriptStore::new();
        store.push_user("a", None);
        store.push_user("b", None);
        store.push_user("c", None);
        assert_eq!(store.truncate_from(1), 2);
        assert_eq!(store.len(), 1);
        assert_eq!(store.truncate_from(5), 0);
    }

    #[test]
    fn test_clear_restarts_counter() {
        let mut store = TranscriptStore::new();
        store.push_user("a", None);
        store.clear();
        assert!(store.is_empty());
        assert_eq!(store.push_user("b", None).get(), 1);
    }
}
