//! "Redo from here" support
//!
//! Decides which user turns may be rewound to and applies the server's
//! rewind checkpoint to the local transcript.

use crate::session::transcript::{TranscriptStore, Turn, TurnId};
use crate::step::Step;

/// Result of applying a rewind checkpoint to the transcript
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RewindOutcome {
    /// The matching user turn and everything after it were dropped
    Truncated { removed: usize },
    /// No user turn matched; the transcript was left untouched
    Mismatch,
}

/// A user turn that can be redone
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RewindTarget {
    pub turn_id: TurnId,
    pub index: usize,
    pub diagnostic_turn: u32,
}

/// Diagnostic turn to rewind to when the turn at `index` offers "redo"
///
/// Only user turns tagged with a diagnostic turn qualify, only while
/// diagnosing, and never the most recent user turn.
///
/// # Examples
///
/// ```
/// use diagchat::session::{rewind, TranscriptStore};
/// use diagchat::step::Step;
///
/// let mut store = TranscriptStore::new();
/// store.push_user("ブレーキが鳴る", Some(1));
/// store.push_user("踏むと鳴る", Some(2));
///
/// assert_eq!(rewind::redo_trigger(Step::Diagnosing, store.turns(), 0), Some(1));
/// assert_eq!(rewind::redo_trigger(Step::Diagnosing, store.turns(), 1), None);
/// assert_eq!(rewind::redo_trigger(Step::Reservation, store.turns(), 0), None);
/// ```
pub fn redo_trigger(step: Step, turns: &[Turn], index: usize) -> Option<u32> {
    if !step.is_diagnosing() {
        return None;
    }

    let turn = turns.get(index)?;
    if !turn.is_user() {
        return None;
    }
    let diagnostic_turn = turn.diagnostic_turn?;

    let later_user = turns[index + 1..].iter().any(Turn::is_user);
    later_user.then_some(diagnostic_turn)
}

/// Every turn currently offering "redo", in transcript order
pub fn rewind_targets(step: Step, turns: &[Turn]) -> Vec<RewindTarget> {
    (0..turns.len())
        .filter_map(|index| {
            redo_trigger(step, turns, index).map(|diagnostic_turn| RewindTarget {
                turn_id: turns[index].id,
                index,
                diagnostic_turn,
            })
        })
        .collect()
}

/// Target offering "redo" for `diagnostic_turn`, if any
pub fn find_target(targets: &[RewindTarget], diagnostic_turn: u32) -> Option<&RewindTarget> {
    targets.iter().find(|t| t.diagnostic_turn == diagnostic_turn)
}

/// Apply the server's rewind checkpoint
///
/// Drops the first user turn whose diagnostic turn is at or past
/// `rewound_to` together with everything after it. A missing checkpoint is
/// treated like one that matches nothing.
pub fn truncate(store: &mut TranscriptStore, rewound_to: Option<u32>) -> RewindOutcome {
    let Some(rewound_to) = rewound_to else {
        tracing::warn!("Rewind response carried no checkpoint, transcript left unchanged");
        return RewindOutcome::Mismatch;
    };

    match store.first_user_at_or_after(rewound_to) {
        Some(index) => {
            let removed = store.truncate_from(index);
            tracing::debug!(rewound_to, removed, "Truncated transcript for rewind");
            RewindOutcome::Truncated { removed }
        }
        None => {
            tracing::warn!(
                rewound_to,
                "No user turn matches rewind checkpoint, transcript left unchanged"
            );
            RewindOutcome::Mismatch
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::{ExchangeResponse, Prompt};
    use crate::step::PromptType;

    fn assistant(store: &mut TranscriptStore, turn: u32) {
        let mut response = ExchangeResponse::new(
            "s-1",
            Step::Diagnosing,
            Prompt::new(PromptType::Text, "次の質問です"),
        );
        response.diagnostic_turn = Some(turn);
        store.push_assistant(&response);
    }

    /// [u1(1), a1, u2(2), a2, u3(3)]
    fn diagnosing_store() -> TranscriptStore {
        let mut store = TranscriptStore::new();
        store.push_user("u1", Some(1));
        assistant(&mut store, 1);
        store.push_user("u2", Some(2));
        assistant(&mut store, 2);
        store.push_user("u3", Some(3));
        store
    }

    #[test]
    fn test_truncate_drops_matching_turn_and_rest() {
        let mut store = diagnosing_store();
        let outcome = truncate(&mut store, Some(2));
        assert_eq!(outcome, RewindOutcome::Truncated { removed: 3 });
        let contents: Vec<&str> = store.turns().iter().map(|t| t.content.as_str()).collect();
        assert_eq!(contents, vec!["u1", "次の質問です"]);
    }

    #[test]
    fn test_truncate_to_first_turn_empties_transcript() {
        let mut store = diagnosing_store();
        assert_eq!(
            truncate(&mut store, Some(1)),
            RewindOutcome::Truncated { removed: 5 }
        );
        assert!(store.is_empty());
    }

    #[test]
    fn test_truncate_mismatch_leaves_transcript() {
        let mut store = diagnosing_store();
        assert_eq!(truncate(&mut store, Some(7)), RewindOutcome::Mismatch);
        assert_eq!(store.len(), 5);
    }

    #[test]
    fn test_truncate_without_checkpoint_is_mismatch() {
        let mut store = diagnosing_store();
        assert_eq!(truncate(&mut store, None), RewindOutcome::Mismatch);
        assert_eq!(store.len(), 5);
    }

    #[test]
    fn test_redo_trigger_excludes_latest_user_turn() {
        let store = diagnosing_store();
        assert_eq!(redo_trigger(Step::Diagnosing, store.turns(), 0), Some(1));
        assert_eq!(redo_trigger(Step::Diagnosing, store.turns(), 2), Some(2));
        assert_eq!(redo_trigger(Step::Diagnosing, store.turns(), 4), None);
    }

    #[test]
    fn test_redo_trigger_excludes_assistant_and_untagged() {
        let mut store = TranscriptStore::new();
        store.push_user("2021年 Toyota Prius", None);
        assistant(&mut store, 1);
        store.push_user("u1", Some(1));
        store.push_user("u2", Some(2));
        assert_eq!(redo_trigger(Step::Diagnosing, store.turns(), 0), None);
        assert_eq!(redo_trigger(Step::Diagnosing, store.turns(), 1), None);
        assert_eq!(redo_trigger(Step::Diagnosing, store.turns(), 9), None);
    }

    #[test]
    fn test_redo_trigger_only_while_diagnosing() {
        let store = diagnosing_store();
        assert_eq!(redo_trigger(Step::UrgencyCheck, store.turns(), 0), None);
    }

    #[test]
    fn test_rewind_targets_lists_all_but_latest() {
        let store = diagnosing_store();
        let targets = rewind_targets(Step::Diagnosing, store.turns());
        let turns: Vec<u32> = targets.iter().map(|t| t.diagnostic_turn).collect();
        assert_eq!(turns, vec![1, 2]);
        assert_eq!(targets[1].index, 2);
        assert_eq!(targets[1].turn_id, store.turns()[2].id);
    }

    #[test]
    fn test_find_target_only_accepts_offered_turns() {
        let store = diagnosing_store();
        let targets = rewind_targets(Step::Diagnosing, store.turns());
        assert_eq!(find_target(&targets, 2).map(|t| t.index), Some(2));
        assert!(find_target(&targets, 3).is_none());
        assert!(find_target(&targets, 9).is_none());

        let closed = rewind_targets(Step::Reservation, store.turns());
        assert!(find_target(&closed, 1).is_none());
    }
}
