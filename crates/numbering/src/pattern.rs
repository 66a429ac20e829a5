//! Number pattern parsing and rendering.

use chrono::{Datelike, NaiveDate};

use billcraft_core::{DomainError, DomainResult};

/// Hard default used when a configured pattern is rejected.
pub const DEFAULT_PATTERN: &str = "{YYYY}-{SEQ:0000}";

/// Patterns longer than this are rejected outright.
pub const MAX_PATTERN_LEN: usize = 80;

/// One element of a parsed pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Year4,
    Year2,
    Month,
    Day,
    /// Zero-padded sequence; width is the number of `0`s in the token.
    Seq { width: usize },
    Literal(String),
}

/// Parse a pattern against the token allow-list
/// `{YYYY} {YY} {MM} {DD} {SEQ:0…0}`.
///
/// Anything else inside braces, unbalanced braces, or an oversized pattern
/// is an error; callers fall back to [`DEFAULT_PATTERN`] rather than
/// guessing.
pub fn parse_pattern(pattern: &str) -> DomainResult<Vec<Token>> {
    if pattern.len() > MAX_PATTERN_LEN {
        return Err(DomainError::validation(format!(
            "number pattern exceeds {MAX_PATTERN_LEN} chars"
        )));
    }

    let mut tokens = Vec::new();
    let mut literal = String::new();
    let mut rest = pattern;

    while let Some(open) = rest.find(|c| c == '{' || c == '}') {
        let (before, at_brace) = rest.split_at(open);
        literal.push_str(before);

        if at_brace.starts_with('}') {
            return Err(DomainError::validation("unbalanced '}' in number pattern"));
        }
        let close = at_brace
            .find('}')
            .ok_or_else(|| DomainError::validation("unbalanced '{' in number pattern"))?;
        let inner = &at_brace[1..close];

        let token = match inner {
            "YYYY" => Token::Year4,
            "YY" => Token::Year2,
            "MM" => Token::Month,
            "DD" => Token::Day,
            _ => match inner.strip_prefix("SEQ:") {
                Some(zeros) if !zeros.is_empty() && zeros.bytes().all(|b| b == b'0') => {
                    Token::Seq { width: zeros.len() }
                }
                _ => {
                    return Err(DomainError::validation(format!(
                        "unknown number pattern token '{{{inner}}}'"
                    )));
                }
            },
        };

        if !literal.is_empty() {
            tokens.push(Token::Literal(std::mem::take(&mut literal)));
        }
        tokens.push(token);
        rest = &at_brace[close + 1..];
    }

    literal.push_str(rest);
    if !literal.is_empty() {
        tokens.push(Token::Literal(literal));
    }

    if !tokens.iter().any(|t| matches!(t, Token::Seq { .. })) {
        return Err(DomainError::validation(
            "number pattern must contain a {SEQ:...} token",
        ));
    }

    Ok(tokens)
}

/// Render a parsed pattern for a reference date and sequence value.
pub fn render(tokens: &[Token], date: NaiveDate, sequence: u64) -> String {
    let mut out = String::new();
    for token in tokens {
        match token {
            Token::Year4 => out.push_str(&format!("{:04}", date.year())),
            Token::Year2 => out.push_str(&format!("{:02}", date.year() % 100)),
            Token::Month => out.push_str(&format!("{:02}", date.month())),
            Token::Day => out.push_str(&format!("{:02}", date.day())),
            Token::Seq { width } => out.push_str(&format!("{sequence:0width$}")),
            Token::Literal(text) => out.push_str(text),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn parses_and_renders_all_tokens() {
        let tokens = parse_pattern("PON-{YYYY}{MM}{DD}-{YY}-{SEQ:000}").unwrap();
        let number = render(&tokens, date(2025, 1, 15), 7);
        assert_eq!(number, "PON-20250115-25-007");
    }

    #[test]
    fn sequence_wider_than_padding_is_not_truncated() {
        let tokens = parse_pattern("{SEQ:000}").unwrap();
        assert_eq!(render(&tokens, date(2025, 6, 1), 1234), "1234");
    }

    #[test]
    fn rejects_unknown_tokens() {
        assert!(parse_pattern("{YYY}-{SEQ:000}").is_err());
        assert!(parse_pattern("{SEQ:}").is_err());
        assert!(parse_pattern("{SEQ:00x}").is_err());
    }

    #[test]
    fn rejects_unbalanced_braces_and_missing_seq() {
        assert!(parse_pattern("PON-{YYYY").is_err());
        assert!(parse_pattern("PON-}{SEQ:00}").is_err());
        assert!(parse_pattern("PON-{YYYY}").is_err());
    }

    #[test]
    fn rejects_oversized_patterns() {
        let oversized = format!("{}{{SEQ:000}}", "X".repeat(MAX_PATTERN_LEN));
        assert!(parse_pattern(&oversized).is_err());
    }

    #[test]
    fn default_pattern_parses() {
        assert!(parse_pattern(DEFAULT_PATTERN).is_ok());
    }
}
