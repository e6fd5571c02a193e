//! Terminal rendering of transcript turns and interactive panels
//!
//! Every function returns the lines to print so the chat loop stays a thin
//! shell around them.

use crate::dispatcher::{Affordance, Panel};
use crate::service::{BookingSummary, Coverage, Source, UrgencyInfo, UrgencyLevel, VehicleMatch};
use crate::session::{RewindTarget, Role, Snapshot, Turn};
use colored::Colorize;

/// Longest citation excerpt printed under an assistant turn
const CITATION_EXCERPT_CHARS: usize = 60;

/// Lines for one transcript turn
pub fn turn_lines(turn: &Turn, show_citations: bool) -> Vec<String> {
    let mut lines = Vec::new();

    let tag = turn
        .diagnostic_turn
        .map(|t| format!("[Q{}] ", t).dimmed().to_string())
        .unwrap_or_default();

    match turn.role {
        Role::User => lines.push(format!("{}{} {}", tag, "あなた:".cyan().bold(), turn.content)),
        Role::Assistant => {
            lines.push(format!(
                "{}{} {}",
                tag,
                "アシスタント:".green().bold(),
                turn.content
            ));

            if let Some(urgency) = &turn.urgency {
                lines.extend(urgency_lines(urgency));
            }
            if let Some(coverage) = turn.coverage {
                lines.push(format!("  {}", coverage_label(coverage).dimmed()));
            }
            if let Some(summary) = turn.prompt.as_ref().and_then(|p| p.booking_summary.as_ref()) {
                lines.extend(booking_summary_lines(summary));
            }
            if show_citations {
                lines.extend(turn.citations.iter().map(citation_line));
            }
        }
    }

    lines
}

/// Urgency block with level, drivability, visit advice and reasons
pub fn urgency_lines(urgency: &UrgencyInfo) -> Vec<String> {
    let level = format!("緊急度: {}", urgency.level.label());
    let level = match urgency.level {
        UrgencyLevel::Critical => level.red().bold(),
        UrgencyLevel::High => level.red(),
        UrgencyLevel::Medium => level.yellow(),
        UrgencyLevel::Low => level.green(),
    };

    let mut lines = vec![format!("  {}", level)];
    match urgency.can_drive {
        Some(true) => lines.push("  走行: 可能".to_string()),
        Some(false) => lines.push(format!("  {}", "走行: 控えてください".red())),
        None => {}
    }
    if let Some(visit) = urgency.visit_urgency {
        lines.push(format!("  {}", visit.label()));
    } else if urgency.requires_visit {
        lines.push("  販売店での点検をお勧めします".to_string());
    }
    lines.extend(urgency.reasons.iter().map(|r| format!("  - {}", r)));
    lines
}

/// Operator-facing wording of manual coverage
pub fn coverage_label(coverage: Coverage) -> &'static str {
    match coverage {
        Coverage::Full => "取扱説明書に記載があります",
        Coverage::Partial => "取扱説明書に一部記載があります",
        Coverage::None => "取扱説明書に記載がありません",
    }
}

fn booking_summary_lines(summary: &BookingSummary) -> Vec<String> {
    [
        ("お名前", &summary.name),
        ("電話番号", &summary.phone),
        ("住所", &summary.address),
        ("希望日時", &summary.preferred_date),
    ]
    .into_iter()
    .filter_map(|(label, value)| value.as_ref().map(|v| format!("  {}: {}", label, v)))
    .collect()
}

/// One cited manual passage, shortened
pub fn citation_line(source: &Source) -> String {
    let mut excerpt: String = source.content.chars().take(CITATION_EXCERPT_CHARS).collect();
    if source.content.chars().count() > CITATION_EXCERPT_CHARS {
        excerpt.push('…');
    }
    format!("  {} {}", format!("[{}]", source.heading()).blue(), excerpt.dimmed())
}

/// Lines describing the interactive panel
pub fn panel_lines(panel: &Panel, vehicle_results: &[VehicleMatch]) -> Vec<String> {
    let mut lines = Vec::new();

    match &panel.affordance {
        Affordance::Idle => {}
        Affordance::NewSession => {
            lines.push("診断は終了しました。/reset で新しい診断を始めます".yellow().to_string())
        }
        Affordance::GuardConfirm { text } => lines.push(
            format!(
                "「{}」は短いようです。このまま送信しますか？ (y: 送信 / n: 書き直す)",
                text
            )
            .yellow()
            .to_string(),
        ),
        Affordance::VehicleSearch => {
            if vehicle_results.is_empty() {
                lines.push("メーカー名・車種名を入力して検索してください".dimmed().to_string());
            } else {
                lines.extend(vehicle_results.iter().enumerate().map(|(i, found)| {
                    format!("  {}) {}", i + 1, found.vehicle.display_name())
                }));
                lines.push("番号で選択、または別の語で再検索".dimmed().to_string());
            }
        }
        Affordance::PhotoConfirm { photo_url, choices } => {
            if let Some(url) = photo_url {
                lines.push(format!("  写真: {}", url.underline()));
            }
            lines.extend(numbered(choices));
        }
        Affordance::Choices { choices, .. } | Affordance::CandidateGrid { choices } => {
            lines.extend(numbered(choices));
        }
        Affordance::BookingForm { fields, .. } => {
            let labels: Vec<&str> = fields.iter().map(|f| f.label.as_str()).collect();
            lines.push(format!("  予約情報: {}", labels.join(" / ")));
        }
        Affordance::TextInput => {}
    }

    if panel.affordance.offers_free_input() {
        lines.push("  /free) 自由入力".dimmed().to_string());
    }
    if let Some(hint) = panel.hint {
        lines.push(format!("  💡 {}", hint).dimmed().to_string());
    }

    lines
}

fn numbered(choices: &[crate::service::Choice]) -> Vec<String> {
    choices
        .iter()
        .enumerate()
        .map(|(i, choice)| format!("  {}) {}", i + 1, choice.label))
        .collect()
}

/// Message for a `/rewind` turn that is not currently offered
pub fn rewind_refusal(turn: u32, targets: &[RewindTarget]) -> String {
    if targets.is_empty() {
        return format!("質問{}からはやり直せません (やり直せる質問はありません)", turn);
    }
    let turns: Vec<String> = targets
        .iter()
        .map(|t| t.diagnostic_turn.to_string())
        .collect();
    format!(
        "質問{}からはやり直せません (やり直せる質問: {})",
        turn,
        turns.join(", ")
    )
}

/// Status lines shown by `/status`
pub fn status_lines(snapshot: &Snapshot, rewind_targets: &[u32]) -> Vec<String> {
    let mut lines = vec![
        format!(
            "Session:        {}",
            snapshot.session.session_id.as_deref().unwrap_or("(none)")
        ),
        format!(
            "Step:           {} ({})",
            snapshot.session.current_step.colored_tag(),
            snapshot.session.current_step.as_str()
        ),
        format!("Transcript:     {} turns", snapshot.turns.len()),
    ];

    if let Some(turn) = snapshot.session.latest_diagnostic_turn {
        lines.push(format!("Diagnostic turn: {}", turn));
    }
    if !rewind_targets.is_empty() {
        let targets: Vec<String> = rewind_targets.iter().map(u32::to_string).collect();
        lines.push(format!("Rewind targets: {}", targets.join(", ")));
    }
    if let Some(error) = &snapshot.last_error {
        lines.push(format!("Last error:     {}", error.red()));
    }

    lines
}
