//! Live input filters.
//!
//! Applied every time a text value is set, so a form never holds characters
//! its field could not accept. Validation still runs on submit; these only
//! keep obviously wrong keystrokes out.

/// Letters and spaces only (full names, expense type names).
pub fn letters_and_spaces(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_alphabetic() || *c == ' ')
        .collect()
}

/// A username starts with a letter and continues with letters or digits.
///
/// Everything before the first letter is dropped, so `"1abc"` becomes
/// `"abc"`.
pub fn username(raw: &str) -> String {
    leading_letter_then(raw, |c| c.is_ascii_alphanumeric())
}

/// Investment titles: a letter first, then letters, digits, `-`, `_` or
/// spaces.
pub fn title(raw: &str) -> String {
    leading_letter_then(raw, |c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | ' '))
}

/// Digits only, truncated to `max` of them (10 for mobile numbers, 6 for
/// pin codes).
pub fn digits(raw: &str, max: usize) -> String {
    raw.chars().filter(char::is_ascii_digit).take(max).collect()
}

fn leading_letter_then(raw: &str, rest: impl Fn(char) -> bool) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if out.is_empty() {
            if c.is_ascii_alphabetic() {
                out.push(c);
            }
        } else if rest(c) {
            out.push(c);
        }
    }
    out
}
