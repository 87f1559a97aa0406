//! Case styles.

use crate::grammar::Grammar;
use crate::words::Word;

/// How the words of a label are cased and joined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CaseStyle {
    /// `HttpServer`-style type names; acronyms stay upper case (`HTTPServer`).
    Pascal,
    /// `http_server`
    SnakeLower,
    /// `HTTP_SERVER`
    SnakeUpper,
    /// The label itself, with illegal characters replaced by `_`.
    Original,
}

#[derive(Debug, Clone, Copy)]
enum WordCase {
    FirstUpper,
    Upper,
    Lower,
}

impl WordCase {
    fn apply(self, word: &str) -> String {
        match self {
            WordCase::Upper => word.to_uppercase(),
            WordCase::Lower => word.to_lowercase(),
            WordCase::FirstUpper => {
                let mut chars = word.chars();
                match chars.next() {
                    Some(first) => first
                        .to_uppercase()
                        .chain(chars.as_str().to_lowercase().chars())
                        .collect(),
                    None => String::new(),
                }
            }
        }
    }
}

impl CaseStyle {
    fn word_case(self, word: &Word) -> WordCase {
        match self {
            CaseStyle::Pascal if word.is_acronym => WordCase::Upper,
            CaseStyle::Pascal => WordCase::FirstUpper,
            CaseStyle::SnakeLower => WordCase::Lower,
            CaseStyle::SnakeUpper => WordCase::Upper,
            // `Original` never reaches word casing; see `sanitize`.
            CaseStyle::Original => WordCase::Lower,
        }
    }

    fn separator(self) -> &'static str {
        match self {
            CaseStyle::Pascal | CaseStyle::Original => "",
            CaseStyle::SnakeLower | CaseStyle::SnakeUpper => "_",
        }
    }
}

/// Legalize, case and join `words` into one identifier.
///
/// Falls back to the word `empty` when nothing legal remains, and prefixes
/// `the` when the first styled character cannot start an identifier.
pub fn combine_words(words: &[Word], grammar: Grammar, style: CaseStyle) -> String {
    let mut legal: Vec<Word> = words.iter().flat_map(|w| grammar.legalize(w)).collect();
    if legal.is_empty() {
        legal.push(Word::new("empty", false));
    }

    let mut styled = Vec::with_capacity(legal.len() + 1);
    let first = style.word_case(&legal[0]).apply(&legal[0].text);
    let starts_legally = first.chars().next().is_some_and(|c| grammar.is_start(c));
    if !starts_legally {
        styled.push(style.word_case(&Word::new("the", false)).apply("the"));
        styled.push(first);
    } else {
        styled.push(first);
    }
    styled.extend(
        legal[1..]
            .iter()
            .map(|w| style.word_case(w).apply(&w.text)),
    );

    styled.join(style.separator())
}

/// Keep `label` as written, replacing every character the grammar rejects
/// with `_`.
pub fn sanitize(label: &str, grammar: Grammar) -> String {
    let mut out: String = label
        .chars()
        .map(|c| if grammar.is_part(c) { c } else { '_' })
        .collect();
    if out.is_empty() {
        out.push_str("empty");
    }
    if out.chars().next().is_some_and(|c| !grammar.is_start(c)) {
        out.insert(0, '_');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::words::split_into_words;
    use pretty_assertions::assert_eq;

    fn style(label: &str, grammar: Grammar, style: CaseStyle) -> String {
        combine_words(&split_into_words(label), grammar, style)
    }

    #[test]
    fn pascal_keeps_acronyms_upper() {
        assert_eq!(style("http server", Grammar::Unicode, CaseStyle::Pascal), "HttpServer");
        assert_eq!(style("HTTPServer", Grammar::Unicode, CaseStyle::Pascal), "HTTPServer");
        assert_eq!(style("Class Name!!", Grammar::Unicode, CaseStyle::Pascal), "ClassName");
    }

    #[test]
    fn snake_styles() {
        assert_eq!(style("my-id_2", Grammar::Unicode, CaseStyle::SnakeLower), "my_id_2");
        assert_eq!(style("fooBar", Grammar::Unicode, CaseStyle::SnakeLower), "foo_bar");
        assert_eq!(style("fooBar", Grammar::Unicode, CaseStyle::SnakeUpper), "FOO_BAR");
    }

    #[test]
    fn leading_digit_gets_prefix() {
        assert_eq!(style("3dPoint", Grammar::Unicode, CaseStyle::Pascal), "The3DPoint");
        assert_eq!(style("3dPoint", Grammar::Ascii, CaseStyle::SnakeLower), "the_3_d_point");
        assert_eq!(style("42", Grammar::Unicode, CaseStyle::SnakeUpper), "THE_42");
    }

    #[test]
    fn empty_labels() {
        assert_eq!(style("", Grammar::Unicode, CaseStyle::Pascal), "Empty");
        assert_eq!(style("!!", Grammar::Unicode, CaseStyle::SnakeLower), "empty");
        assert_eq!(style("名前", Grammar::Ascii, CaseStyle::Pascal), "Empty");
        assert_eq!(style("名前", Grammar::Unicode, CaseStyle::Pascal), "名前");
    }

    #[test]
    fn ascii_grammar_does_not_merge_across_dropped_chars() {
        assert_eq!(style("naïve", Grammar::Ascii, CaseStyle::SnakeLower), "na_ve");
        assert_eq!(style("naïve", Grammar::Unicode, CaseStyle::SnakeLower), "naïve");
    }

    #[test]
    fn sanitize_replaces_illegal_chars() {
        assert_eq!(sanitize("my-id", Grammar::Unicode), "my_id");
        assert_eq!(sanitize("fooBar", Grammar::Unicode), "fooBar");
        assert_eq!(sanitize("1st", Grammar::Unicode), "_1st");
        assert_eq!(sanitize("", Grammar::Ascii), "empty");
        assert_eq!(sanitize("été", Grammar::Ascii), "_t_");
    }
}
