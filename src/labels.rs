//! Choice label normalization and contextual hints
//!
//! Candidate causes proposed by the diagnosis service sometimes arrive with
//! terse or technical labels. `normalize` rewrites the known ones into the
//! wording operators recognise, and `get_hint` picks a one-line tip to show
//! above a set of choices.

use crate::service::{Choice, Prompt};
use crate::step::PromptType;

/// Phrase identifying a "pick the closest cause" single-choice prompt
pub const CLOSEST_CAUSE_MARKER: &str = "最も近い";

/// Raw candidate label → canonical label
const CANONICAL_LABELS: &[(&str, &str)] = &[
    ("バッテリー上がり", "バッテリーが上がっている"),
    ("ブレーキパッド摩耗", "ブレーキパッドがすり減っている"),
    ("タイヤ空気圧低下", "タイヤの空気圧が下がっている"),
    ("オイル漏れ", "エンジンオイルが漏れている"),
    ("冷却水不足", "冷却水（クーラント）が不足している"),
    ("セルモーター故障", "セルモーター（スターター）の故障"),
    ("オルタネーター故障", "発電機（オルタネーター）の故障"),
    ("スパークプラグ劣化", "スパークプラグが劣化している"),
    ("ベルト鳴き", "ベルトが滑って鳴いている"),
    ("仕様", "仕様どおりの正常な動作"),
];

/// Ordered (keyword, hint) pairs; the first keyword found wins
const HINTS: &[(&str, &str)] = &[
    (
        "警告灯",
        "メーターに表示されている警告灯の色（赤・黄）や形も教えていただくと正確に判断できます",
    ),
    (
        "ブレーキ",
        "ブレーキに関わる症状は安全に直結します。無理に運転を続けないでください",
    ),
    (
        "におい",
        "焦げ臭い・甘い匂いなど、においの種類も手がかりになります",
    ),
    (
        "音",
        "音が出るタイミング（発進時・減速時・曲がる時など）を思い出してみてください",
    ),
    (
        "バッテリー",
        "ライトやメーターの明るさが普段と違うかも確認してみてください",
    ),
    (
        "わからない",
        "当てはまるものがなければ、自由入力で症状を詳しく教えてください",
    ),
];

/// Replace known raw labels with their canonical wording
///
/// Labels not found in the dictionary pass through unchanged, and canonical
/// labels are never themselves dictionary keys, so applying this twice is
/// the same as applying it once.
///
/// # Examples
///
/// ```
/// use diagchat::labels::normalize;
/// use diagchat::service::Choice;
///
/// let choices = vec![Choice::new("battery", "バッテリー上がり"), Choice::new("other", "その他")];
/// let normalized = normalize(&choices);
/// assert_eq!(normalized[0].label, "バッテリーが上がっている");
/// assert_eq!(normalized[1].label, "その他");
/// ```
pub fn normalize(choices: &[Choice]) -> Vec<Choice> {
    choices
        .iter()
        .map(|choice| match canonical_label(&choice.label) {
            Some(canonical) => Choice {
                label: canonical.to_string(),
                ..choice.clone()
            },
            None => choice.clone(),
        })
        .collect()
}

fn canonical_label(raw: &str) -> Option<&'static str> {
    CANONICAL_LABELS
        .iter()
        .find(|(key, _)| *key == raw)
        .map(|(_, canonical)| *canonical)
}

/// Whether the prompt's choices should go through `normalize`
///
/// Applies to diagnosis candidate grids and to single-choice prompts that
/// ask for the closest cause.
pub fn should_normalize(prompt: &Prompt) -> bool {
    match prompt.kind {
        PromptType::DiagnosisCandidates => true,
        PromptType::SingleChoice => prompt.message.contains(CLOSEST_CAUSE_MARKER),
        PromptType::Text
        | PromptType::VehicleSearch
        | PromptType::PhotoConfirm
        | PromptType::ReservationChoice
        | PromptType::BookingForm
        | PromptType::BookingConfirm => false,
    }
}

/// Choices of a prompt as they should be presented
pub fn presented_choices(prompt: &Prompt) -> Vec<Choice> {
    if should_normalize(prompt) {
        normalize(prompt.choices())
    } else {
        prompt.choices().to_vec()
    }
}

/// Contextual one-line tip for a set of choices
///
/// # Examples
///
/// ```
/// use diagchat::labels::get_hint;
/// use diagchat::service::Choice;
///
/// let hint = get_hint(&[Choice::new("lamp", "警告灯が点いた")]);
/// assert!(hint.unwrap().contains("警告灯"));
/// assert!(get_hint(&[Choice::new("x", "その他")]).is_none());
/// ```
pub fn get_hint(choices: &[Choice]) -> Option<&'static str> {
    let haystack: String = choices
        .iter()
        .flat_map(|c| [c.value.as_str(), c.label.as_str()])
        .collect::<Vec<_>>()
        .join(" ");

    HINTS
        .iter()
        .find(|(keyword, _)| haystack.contains(keyword))
        .map(|(_, hint)| *hint)
}
