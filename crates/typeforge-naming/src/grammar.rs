//! Identifier grammars.
//!
//! Python 2 only accepts ASCII identifiers; Python 3 accepts the Unicode
//! `XID_Start`/`XID_Continue` classes, plus `_` as a start character.

use serde::{Deserialize, Serialize};
use unicode_ident::{is_xid_continue, is_xid_start};

use crate::words::Word;

/// Which characters may start or continue an identifier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Grammar {
    Ascii,
    #[default]
    Unicode,
}

/// Marks that may continue but never start an identifier (Mn, Mc and the
/// `Other_ID_Continue` characters).
pub(crate) fn is_combining_mark(c: char) -> bool {
    is_xid_continue(c) && !is_xid_start(c) && !c.is_numeric() && !is_connector_punctuation(c)
}

/// Unicode category Pc.
fn is_connector_punctuation(c: char) -> bool {
    matches!(
        c,
        '_' | '\u{203F}'
            | '\u{2040}'
            | '\u{2054}'
            | '\u{FE33}'
            | '\u{FE34}'
            | '\u{FE4D}'..='\u{FE4F}'
            | '\u{FF3F}'
    )
}

impl Grammar {
    pub fn is_start(self, c: char) -> bool {
        match self {
            Grammar::Ascii => c.is_ascii_alphabetic() || c == '_',
            Grammar::Unicode => is_xid_start(c) || c == '_',
        }
    }

    pub fn is_part(self, c: char) -> bool {
        match self {
            Grammar::Ascii => c.is_ascii_alphanumeric() || c == '_',
            Grammar::Unicode => is_xid_continue(c),
        }
    }

    /// Split `word` at every character this grammar rejects.  The pieces
    /// keep the word's acronym flag; empty pieces are dropped.
    pub fn legalize(self, word: &Word) -> Vec<Word> {
        word.text
            .split(|c: char| !self.is_part(c))
            .filter(|piece| !piece.is_empty())
            .map(|piece| Word::new(piece, word.is_acronym))
            .collect()
    }
}
