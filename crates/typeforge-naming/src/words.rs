//! Word segmentation.
//!
//! A label is scanned for maximal runs of word characters, which are then
//! cut at case boundaries:
//!
//! | Input          | Words                     |
//! |----------------|---------------------------|
//! | `fooBar`       | `foo`, `Bar`              |
//! | `HTTPServer`   | `HTTP` (acronym), `Server`|
//! | `my-id_2`      | `my`, `id`, `2`           |
//! | `Version12b`   | `Version12`, `b`          |
//!
//! Case classes come from Unicode properties, so `ÉcoleNormale` splits the
//! same way `EcoleNormale` does.

use crate::grammar::is_combining_mark;

/// One segment of a label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Word {
    pub text: String,
    /// The word contains no lower-case letters (`URL`, `ID`, `42`).
    pub is_acronym: bool,
}

impl Word {
    pub fn new(text: impl Into<String>, is_acronym: bool) -> Self {
        Self {
            text: text.into(),
            is_acronym,
        }
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || is_combining_mark(c)
}

fn is_lower(c: char) -> bool {
    c.is_lowercase()
}

fn is_upper(c: char) -> bool {
    c.is_uppercase()
}

fn is_digit(c: char) -> bool {
    c.is_numeric()
}

fn is_uncased(c: char) -> bool {
    is_word_char(c) && !is_lower(c) && !is_upper(c)
}

struct Scanner {
    chars: Vec<char>,
    pos: usize,
    start: usize,
    last_lower: Option<usize>,
    words: Vec<Word>,
}

impl Scanner {
    fn at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    fn current(&self) -> char {
        self.chars[self.pos]
    }

    fn skip_while(&mut self, p: impl Fn(char) -> bool) {
        while !self.at_end() {
            let c = self.current();
            if !p(c) {
                break;
            }
            if is_lower(c) {
                self.last_lower = Some(self.pos);
            }
            self.pos += 1;
        }
    }

    fn skip_lower(&mut self) {
        self.skip_while(|c| is_lower(c) || is_combining_mark(c));
    }

    fn skip_upper(&mut self) {
        self.skip_while(|c| is_upper(c) || is_combining_mark(c));
    }

    fn skip_digits(&mut self) {
        self.skip_while(is_digit);
    }

    fn commit(&mut self) {
        debug_assert!(self.pos > self.start, "words are never empty");
        let is_acronym = self.last_lower.map_or(true, |l| l < self.start);
        let text: String = self.chars[self.start..self.pos].iter().collect();
        self.words.push(Word { text, is_acronym });
    }
}

/// Split `label` into words.
pub fn split_into_words(label: &str) -> Vec<Word> {
    let mut s = Scanner {
        chars: label.chars().collect(),
        pos: 0,
        start: 0,
        last_lower: None,
        words: Vec::new(),
    };

    loop {
        s.skip_while(|c| !is_word_char(c));
        if s.at_end() {
            break;
        }

        s.start = s.pos;
        let c = s.current();
        if is_lower(c) {
            s.skip_lower();
            s.skip_digits();
        } else if is_upper(c) {
            s.skip_upper();
            if s.at_end() {
                // whole tail is upper case
            } else if s.pos - s.start == 1 {
                s.skip_lower();
                s.skip_digits();
            } else if is_digit(s.current()) {
                s.skip_digits();
            } else if is_lower(s.current()) {
                // `HTTPServer`: the last capital starts the next word
                s.pos -= 1;
            }
        } else {
            s.skip_while(is_uncased);
        }
        s.commit();
    }

    s.words
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn texts(label: &str) -> Vec<String> {
        split_into_words(label).into_iter().map(|w| w.text).collect()
    }

    #[test]
    fn camel_and_pascal() {
        assert_eq!(texts("fooBarBaz"), ["foo", "Bar", "Baz"]);
        assert_eq!(texts("FooBar"), ["Foo", "Bar"]);
    }

    #[test]
    fn acronyms() {
        let words = split_into_words("HTTPServer");
        assert_eq!(
            words,
            vec![Word::new("HTTP", true), Word::new("Server", false)]
        );
        assert_eq!(texts("parseURL"), ["parse", "URL"]);
        assert!(split_into_words("parseURL")[1].is_acronym);
    }

    #[test]
    fn separators_and_digits() {
        assert_eq!(texts("my-id_2"), ["my", "id", "2"]);
        assert_eq!(texts("Class Name!!"), ["Class", "Name"]);
        assert_eq!(texts("Version12b"), ["Version12", "b"]);
        assert_eq!(texts("ABC123"), ["ABC123"]);
    }

    #[test]
    fn leading_digits_form_their_own_word() {
        let words = split_into_words("3dPoint");
        assert_eq!(
            words,
            vec![
                Word::new("3", true),
                Word::new("d", false),
                Word::new("Point", false)
            ]
        );
    }

    #[test]
    fn unicode_letters() {
        assert_eq!(texts("ÉcoleNormale"), ["École", "Normale"]);
        assert_eq!(texts("größeΔx"), ["größe", "Δx"]);
        assert_eq!(texts("名前 2"), ["名前", "2"]);
    }

    #[test]
    fn combining_marks_stay_inside_words() {
        assert_eq!(texts("cafe\u{301}Bar"), ["cafe\u{301}", "Bar"]);
    }

    #[test]
    fn nothing_to_split() {
        assert!(split_into_words("").is_empty());
        assert!(split_into_words("-_- !").is_empty());
    }
}
