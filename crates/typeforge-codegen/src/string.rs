//! Python string literals and docstrings.

use std::fmt::Write;

/// A double-quoted Python string literal for `s`.
///
/// With `unicode_prefix` (Python 2), literals containing non-ASCII
/// characters get a `u` prefix so the `\u` escapes are honoured.
pub fn string_literal(s: &str, unicode_prefix: bool) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    if unicode_prefix && !s.is_ascii() {
        out.push('u');
    }
    out.push('"');
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 || c == '\u{7f}' => {
                let _ = write!(out, "\\x{:02x}", c as u32);
            }
            c if c.is_ascii() => out.push(c),
            c if (c as u32) <= 0xffff => {
                let _ = write!(out, "\\u{:04x}", c as u32);
            }
            c => {
                let _ = write!(out, "\\U{:08x}", c as u32);
            }
        }
    }
    out.push('"');
    out
}

/// Lines of a `"""` docstring for `text`.
pub fn docstring_lines(text: &str) -> Vec<String> {
    let escaped = text.replace('\\', "\\\\").replace("\"\"\"", "\\\"\\\"\\\"");
    let escaped = if escaped.ends_with('"') && !escaped.ends_with("\\\"") {
        format!("{}\\\"", &escaped[..escaped.len() - 1])
    } else {
        escaped
    };
    let body: Vec<&str> = escaped.lines().collect();
    match body.as_slice() {
        [] => vec!["\"\"\"\"\"\"".to_string()],
        [only] => vec![format!("\"\"\"{only}\"\"\"")],
        [first, rest @ ..] => {
            let mut lines = vec![format!("\"\"\"{first}")];
            lines.extend(rest.iter().map(|l| l.to_string()));
            lines.push("\"\"\"".to_string());
            lines
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn escapes() {
        assert_eq!(string_literal("plain", false), "\"plain\"");
        assert_eq!(string_literal("a\"b\\c", false), r#""a\"b\\c""#);
        assert_eq!(string_literal("tab\there\n", false), r#""tab\there\n""#);
        assert_eq!(string_literal("\u{1}", false), r#""\x01""#);
        assert_eq!(string_literal("é", false), r#""\u00e9""#);
        assert_eq!(string_literal("é", true), r#"u"\u00e9""#);
        assert_eq!(string_literal("😀", false), r#""\U0001f600""#);
    }

    #[test]
    fn docstrings() {
        assert_eq!(docstring_lines("One line."), vec!["\"\"\"One line.\"\"\""]);
        assert_eq!(
            docstring_lines("First\nsecond"),
            vec!["\"\"\"First", "second", "\"\"\""]
        );
        let escaped_quotes = r#"\"\"\""#;
        assert_eq!(
            docstring_lines(r#"a """ b"#),
            vec![format!(r#""""a {escaped_quotes} b""""#)]
        );
        assert_eq!(docstring_lines(r#"say "hi""#), vec![r#""""say "hi\"""""#]);
    }
}
