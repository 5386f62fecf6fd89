//! Normalization of non-finite number tokens.
//!
//! The compiler prints floating-point constants with C formatting, so a
//! constant such as `cellmax / 0.0` reaches the report as a bare `Infinity`
//! (or `NaN`) token. Neither is valid JSON. Before decoding, such tokens are
//! rewritten to `0.0`. Tokens inside string literals are left untouched.

use std::borrow::Cow;

const NON_FINITE_TOKENS: [&str; 2] = ["Infinity", "NaN"];
const REPLACEMENT: &str = "0.0";

/// Rewrites bare `Infinity` / `NaN` tokens outside string literals to `0.0`.
///
/// A leading minus sign is kept, which still yields valid JSON (`-0.0`).
///
/// ```
/// use pawn_records::normalize_non_finite;
///
/// assert_eq!(normalize_non_finite("[Infinity, -Infinity]"), "[0.0, -0.0]");
/// assert_eq!(normalize_non_finite(r#"{"name":"Infinity"}"#), r#"{"name":"Infinity"}"#);
/// ```
#[must_use]
pub fn normalize_non_finite(line: &str) -> Cow<'_, str> {
    if !NON_FINITE_TOKENS.iter().any(|token| line.contains(token)) {
        return Cow::Borrowed(line);
    }

    let bytes = line.as_bytes();
    let mut out = String::with_capacity(line.len());
    let mut copied_up_to = 0;
    let mut in_string = false;
    let mut escaped = false;
    let mut i = 0;

    while i < bytes.len() {
        let byte = bytes[i];

        if in_string {
            if escaped {
                escaped = false;
            } else if byte == b'\\' {
                escaped = true;
            } else if byte == b'"' {
                in_string = false;
            }
            i += 1;
            continue;
        }

        if byte == b'"' {
            in_string = true;
            i += 1;
            continue;
        }

        let at_boundary = i == 0 || !is_identifier_byte(bytes[i - 1]);
        let token = at_boundary
            .then(|| {
                NON_FINITE_TOKENS.iter().find(|token| {
                    let end = i + token.len();
                    bytes[i..].starts_with(token.as_bytes())
                        && bytes.get(end).is_none_or(|b| !is_identifier_byte(*b))
                })
            })
            .flatten();

        match token {
            Some(token) => {
                out.push_str(&line[copied_up_to..i]);
                out.push_str(REPLACEMENT);
                i += token.len();
                copied_up_to = i;
            }
            None => i += 1,
        }
    }

    if copied_up_to == 0 {
        return Cow::Borrowed(line);
    }

    out.push_str(&line[copied_up_to..]);
    Cow::Owned(out)
}

fn is_identifier_byte(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || byte == b'_'
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::bare(r#"{"value":Infinity}"#, r#"{"value":0.0}"#)]
    #[case::negative(r#"{"value":-Infinity}"#, r#"{"value":-0.0}"#)]
    #[case::nan(r#"[NaN,1]"#, r#"[0.0,1]"#)]
    #[case::several(r#"[Infinity, NaN, Infinity]"#, r#"[0.0, 0.0, 0.0]"#)]
    #[case::inside_string(r#"{"name":"Infinity"}"#, r#"{"name":"Infinity"}"#)]
    #[case::escaped_quote(r#"{"m":"a\"Infinity","v":NaN}"#, r#"{"m":"a\"Infinity","v":0.0}"#)]
    #[case::part_of_identifier(r#"[Infinity2, xNaN]"#, r#"[Infinity2, xNaN]"#)]
    #[case::untouched(r#"{"kind":"tags"}"#, r#"{"kind":"tags"}"#)]
    fn normalizes_only_bare_tokens(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(normalize_non_finite(input), expected);
    }

    #[test]
    fn borrows_when_nothing_changes() {
        let line = r#"{"name":"NaN"}"#;
        assert!(matches!(normalize_non_finite(line), Cow::Borrowed(_)));
    }

    #[test]
    fn normalized_line_is_valid_json() {
        let normalized = normalize_non_finite(r#"{"kind":"constants","payload":[{"name":"F","value":-Infinity}]}"#);
        let value: serde_json::Value = serde_json::from_str(&normalized).unwrap();
        assert_eq!(value["payload"][0]["value"], serde_json::json!(-0.0));
    }

    #[test]
    fn multibyte_text_is_preserved() {
        let line = r#"{"m":"ünïcödé","v":Infinity}"#;
        assert_eq!(normalize_non_finite(line), r#"{"m":"ünïcödé","v":0.0}"#);
    }
}
