//! Suspicious free-text input detection
//!
//! Before free text typed during `free_text` or `diagnosing` is forwarded,
//! it is checked for input that is probably accidental: a stray keystroke,
//! a row of symbols, a held-down key, or a filler word. Suspicious input is
//! held back until the operator confirms it.

/// Short replies that are meaningful answers despite their length
const AGREEMENT_WORDS: &[&str] = &[
    "はい",
    "いいえ",
    "うん",
    "ええ",
    "いや",
    "ある",
    "ない",
    "あり",
    "なし",
    "そう",
    "違う",
    "ちがう",
    "OK",
    "ok",
    "yes",
    "no",
    "y",
    "n",
    "不明",
    "わからない",
    "分からない",
];

/// Filler words and interjections that carry no diagnostic information
const FILLER_WORDS: &[&str] = &[
    "えー",
    "えーと",
    "えっと",
    "あの",
    "あのー",
    "うーん",
    "んー",
    "まあ",
    "test",
    "テスト",
    "hoge",
    "asdf",
    "qwerty",
    "aaa",
    "lol",
];

/// Maximum length (in characters) still subject to the heuristics
const SHORT_INPUT_LIMIT: usize = 10;

/// Classify free text as suspicious
///
/// Rules are evaluated in order and the first match wins:
/// 1. longer than 10 characters: not suspicious
/// 2. a known short agreement (case-insensitive): not suspicious
/// 3. two characters or fewer: suspicious
/// 4. no letter or ideograph at all: suspicious
/// 5. a single character repeated: suspicious
/// 6. a known filler word: suspicious
/// 7. anything else: not suspicious
///
/// # Examples
///
/// ```
/// use diagchat::guard::classify;
///
/// assert!(classify("a"));
/// assert!(!classify("はい"));
/// assert!(classify("www"));
/// assert!(!classify("ブレーキが鳴る"));
/// ```
pub fn classify(text: &str) -> bool {
    let trimmed = text.trim();
    let length = trimmed.chars().count();

    if length > SHORT_INPUT_LIMIT {
        return false;
    }

    let lowered = trimmed.to_lowercase();
    if AGREEMENT_WORDS.contains(&trimmed) || AGREEMENT_WORDS.contains(&lowered.as_str()) {
        return false;
    }

    if length <= 2 {
        return true;
    }

    if !trimmed.chars().any(char::is_alphabetic) {
        return true;
    }

    if is_single_char_run(trimmed) {
        return true;
    }

    FILLER_WORDS.contains(&trimmed) || FILLER_WORDS.contains(&lowered.as_str())
}

fn is_single_char_run(text: &str) -> bool {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => chars.all(|c| c == first),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_latin_letter_is_suspicious() {
        assert!(classify("a"));
    }

    #[test]
    fn test_agreement_is_not_suspicious() {
        assert!(!classify("はい"));
        assert!(!classify("いいえ"));
        assert!(!classify("No"));
        assert!(!classify("OK"));
    }

    #[test]
    fn test_two_char_non_agreement_is_suspicious() {
        assert!(classify("ほほ"));
        assert!(classify("ab"));
    }

    #[test]
    fn test_long_text_is_never_suspicious() {
        assert!(!classify("この音は結構大きいです"));
        assert!(!classify("wwwwwwwwwwwwwwww"));
    }

    #[test]
    fn test_repeated_char_is_suspicious() {
        assert!(classify("www"));
        assert!(classify("ああああ"));
    }

    #[test]
    fn test_symbols_only_is_suspicious() {
        assert!(classify("!?!?"));
        assert!(classify("😀😀😂"));
        assert!(classify("123"));
    }

    #[test]
    fn test_filler_is_suspicious() {
        assert!(classify("えっと"));
        assert!(classify("うーん"));
        assert!(classify("TEST"));
    }

    #[test]
    fn test_short_meaningful_text_passes() {
        assert!(!classify("異音がする"));
        assert!(!classify("ブレーキ"));
        assert!(!classify("警告灯"));
    }

    #[test]
    fn test_surrounding_whitespace_is_ignored() {
        assert!(!classify("  はい  "));
        assert!(classify("  a "));
    }

    #[test]
    fn test_length_is_counted_in_characters() {
        // 3 characters but 9 bytes: still short enough for the run rule
        assert!(classify("ほほほ"));
        assert_eq!("ーーーーーーーーーーー".chars().count(), 11);
        assert!(!classify("ーーーーーーーーーーー"));
    }
}
