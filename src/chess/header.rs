use regex::Regex;
use std::borrow::Cow;
use std::sync::LazyLock;

/// Header lines longer than this skip the regex and go to the fallback scanner.
pub const DEFAULT_HEADER_REGEX_MAX_LEN: usize = 1024;

static HEADER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"^\[\s*([^\s\]"']+)\s*(?:"((?:[^"\\]|\\.)*)"|'((?:[^'\\]|\\.)*)'|([^\]"'\s][^\]]*?)?)\s*\]\s*$"#,
    )
    .expect("header pattern is valid")
});

/// A recognized `[Tag "Value"]` line. The tag borrows from the input line; the
/// value only allocates when unescaping changed it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderLine<'a> {
    pub name: &'a str,
    pub value: Cow<'a, str>,
}

pub fn parse_header_line(line: &str) -> Option<HeaderLine<'_>> {
    try_parse_header_line(line, DEFAULT_HEADER_REGEX_MAX_LEN)
}

/// Recognizes a header line. Returns `None` when neither the regex nor the
/// fallback scanner can find a tag name, in which case the caller treats the
/// line as movetext.
pub fn try_parse_header_line(line: &str, regex_max_len: usize) -> Option<HeaderLine<'_>> {
    let line = line.trim();
    if !line.starts_with('[') {
        return None;
    }

    if line.len() <= regex_max_len
        && let Some(header) = parse_with_regex(line)
    {
        return Some(header);
    }

    parse_with_scanner(line)
}

fn parse_with_regex(line: &str) -> Option<HeaderLine<'_>> {
    let caps = HEADER_RE.captures(line)?;
    let name = caps.get(1)?.as_str();

    let value = if let Some(quoted) = caps.get(2).or_else(|| caps.get(3)) {
        unescape_value(quoted.as_str())
    } else {
        Cow::Borrowed(caps.get(4).map_or("", |m| m.as_str()))
    };

    Some(HeaderLine { name, value })
}

fn parse_with_scanner(line: &str) -> Option<HeaderLine<'_>> {
    let rest = line.strip_prefix('[')?.trim_start();
    let name_len = rest
        .find(|c: char| c.is_whitespace() || matches!(c, ']' | '"' | '\''))
        .unwrap_or(rest.len());
    if name_len == 0 {
        return None;
    }

    let name = &rest[..name_len];
    let rest = rest[name_len..].trim_start();

    let value = match rest.as_bytes().first().copied() {
        Some(quote) if quote == b'"' || quote == b'\'' => {
            let body = &rest[1..];
            let raw = match find_closing_quote(body, quote) {
                Some(end) => &body[..end],
                // Unterminated: take the rest of the line minus the bracket.
                None => body.trim_end().strip_suffix(']').unwrap_or(body).trim_end(),
            };
            unescape_value(raw)
        }
        _ => {
            let end = rest.find(']').unwrap_or(rest.len());
            Cow::Borrowed(rest[..end].trim())
        }
    };

    Some(HeaderLine { name, value })
}

fn find_closing_quote(body: &str, quote: u8) -> Option<usize> {
    let mut escaped = false;
    for (idx, &byte) in body.as_bytes().iter().enumerate() {
        if escaped {
            escaped = false;
        } else if byte == b'\\' {
            escaped = true;
        } else if byte == quote {
            return Some(idx);
        }
    }
    None
}

/// Removes exactly one backslash before any following character. A trailing
/// lone backslash is kept.
pub fn unescape_value(raw: &str) -> Cow<'_, str> {
    if !raw.contains('\\') {
        return Cow::Borrowed(raw);
    }

    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some(next) => out.push(next),
                None => out.push('\\'),
            }
        } else {
            out.push(c);
        }
    }
    Cow::Owned(out)
}

/// Escapes `\` then `"` for writing inside a double-quoted header value.
pub fn escape_value(value: &str) -> Cow<'_, str> {
    if !value.contains(['\\', '"']) {
        return Cow::Borrowed(value);
    }
    Cow::Owned(value.replace('\\', "\\\\").replace('"', "\\\""))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parsed(line: &str) -> Option<(String, String)> {
        parse_header_line(line).map(|h| (h.name.to_string(), h.value.into_owned()))
    }

    fn scanned(line: &str) -> Option<(String, String)> {
        try_parse_header_line(line, 0).map(|h| (h.name.to_string(), h.value.into_owned()))
    }

    fn pair(name: &str, value: &str) -> Option<(String, String)> {
        Some((name.to_string(), value.to_string()))
    }

    #[test]
    fn test_basic_quoted_header() {
        assert_eq!(parsed(r#"[Event "Test Game"]"#), pair("Event", "Test Game"));
        assert_eq!(parsed(r#"  [Site   "Internet" ]  "#), pair("Site", "Internet"));
    }

    #[test]
    fn test_escaped_quotes_and_backslashes() {
        assert_eq!(
            parsed(r#"[Annotator "The \"Beast\" \\ co"]"#),
            pair("Annotator", r#"The "Beast" \ co"#)
        );
    }

    #[test]
    fn test_single_quoted_value() {
        assert_eq!(parsed("[White 'O\\'Kelly']"), pair("White", "O'Kelly"));
    }

    #[test]
    fn test_bare_value() {
        assert_eq!(parsed("[Round 3]"), pair("Round", "3"));
        assert_eq!(parsed(r"[Path C:\games]"), pair("Path", r"C:\games"));
    }

    #[test]
    fn test_empty_values() {
        assert_eq!(parsed(r#"[Event ""]"#), pair("Event", ""));
        assert_eq!(parsed("[Event]"), pair("Event", ""));
    }

    #[test]
    fn test_value_may_contain_brackets() {
        assert_eq!(
            parsed(r#"[Event "Open [rapid]"]"#),
            pair("Event", "Open [rapid]")
        );
    }

    #[test]
    fn test_unterminated_quote_uses_fallback() {
        assert_eq!(
            parsed(r#"[Event "Malformed - incomplete headers"#),
            pair("Event", "Malformed - incomplete headers")
        );
        assert_eq!(parsed(r#"[Event "Dangling]"#), pair("Event", "Dangling"));
    }

    #[test]
    fn test_trailing_text_after_bracket_uses_fallback() {
        assert_eq!(
            parsed(r#"[Event "Casual"] { trailing }"#),
            pair("Event", "Casual")
        );
    }

    #[test]
    fn test_missing_tag_name_is_not_a_header() {
        assert_eq!(parsed("[]"), None);
        assert_eq!(parsed(r#"[ "value"]"#), None);
        assert_eq!(parsed("not a header"), None);
    }

    #[test]
    fn test_scanner_agrees_with_regex() {
        for line in [
            r#"[Event "Test Game"]"#,
            r#"[Annotator "The \"Beast\" \\ co"]"#,
            "[Round 3]",
            r#"[Event ""]"#,
            r#"[Event "Open [rapid]"]"#,
        ] {
            assert_eq!(scanned(line), parsed(line), "line: {line}");
        }
    }

    #[test]
    fn test_long_header_goes_to_scanner() {
        let long_value = "x".repeat(5000);
        let line = format!(r#"[Event "{}"]"#, long_value);
        let header = parse_header_line(&line).unwrap();
        assert_eq!(header.name, "Event");
        assert_eq!(header.value.len(), 5000);
    }

    #[test]
    fn test_unescape_single_pass() {
        assert_eq!(unescape_value(r#"a\"b"#), r#"a"b"#);
        assert_eq!(unescape_value(r"a\\b"), r"a\b");
        assert_eq!(unescape_value(r"a\\\\b"), r"a\\b");
        assert_eq!(unescape_value(r"\x"), "x");
        assert_eq!(unescape_value(r"trailing\"), r"trailing\");
    }

    #[test]
    fn test_escape_backslash_before_quote() {
        assert_eq!(escape_value(r#"a"b\c"#), r#"a\"b\\c"#);
        assert_eq!(escape_value(r#"\""#), r#"\\\""#);
        assert!(matches!(escape_value("plain"), Cow::Borrowed("plain")));
    }

    #[test]
    fn test_escape_then_unescape_is_identity() {
        for value in ["", "plain", r#"q"uote"#, r"back\slash", r#"\"mixed\\"#, "trail\\"] {
            assert_eq!(unescape_value(&escape_value(value)), value);
        }
    }
}
