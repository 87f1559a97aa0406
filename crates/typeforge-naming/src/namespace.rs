//! Namespaces and collision-free name assignment.

use std::collections::BTreeSet;
use std::fmt;

use tracing::trace;
use unicode_normalization::UnicodeNormalization;

use crate::grammar::Grammar;
use crate::style::{combine_words, sanitize, CaseStyle};
use crate::words::split_into_words;

/// An assigned, legal identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Identifier(String);

impl Identifier {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Identifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// What a name is for; decides its case style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Type,
    /// `nice` selects snake case; otherwise the label is kept as written.
    Property { nice: bool },
    EnumCase,
    Function,
}

impl Role {
    pub fn case_style(self) -> CaseStyle {
        match self {
            Role::Type => CaseStyle::Pascal,
            Role::Property { nice: true } | Role::Function => CaseStyle::SnakeLower,
            Role::Property { nice: false } => CaseStyle::Original,
            Role::EnumCase => CaseStyle::SnakeUpper,
        }
    }
}

/// Styles labels for one target grammar.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Styler {
    pub grammar: Grammar,
}

impl Styler {
    pub fn new(grammar: Grammar) -> Self {
        Self { grammar }
    }

    /// The styled, legal form of `label`, before collision checks.  Labels
    /// are NFC-normalized first, so composed and decomposed spellings agree.
    pub fn style(&self, label: &str, role: Role) -> String {
        let label: String = label.nfc().collect();
        match role.case_style() {
            CaseStyle::Original => sanitize(&label, self.grammar),
            style => combine_words(&split_into_words(&label), self.grammar, style),
        }
    }
}

/// A collision domain.
///
/// Names are bound first-come: whatever is assigned earlier keeps its
/// preferred spelling and later entities are disambiguated around it.
#[derive(Debug, Clone, Default)]
pub struct Namespace {
    name: String,
    forbidden: BTreeSet<String>,
    bound: BTreeSet<String>,
}

impl Namespace {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_forbidden<I, S>(name: impl Into<String>, forbidden: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut ns = Self::new(name);
        ns.forbidden.extend(forbidden.into_iter().map(Into::into));
        ns
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_forbidden(&self, candidate: &str) -> bool {
        self.forbidden.contains(candidate)
    }

    pub fn is_taken(&self, candidate: &str) -> bool {
        self.forbidden.contains(candidate) || self.bound.contains(candidate)
    }

    /// Names bound so far, sorted.
    pub fn bound(&self) -> impl Iterator<Item = &str> {
        self.bound.iter().map(String::as_str)
    }

    /// Bind a fresh identifier for `label`.
    ///
    /// A forbidden word is escaped with a trailing underscore (`class` →
    /// `class_`); other collisions retry `"{label}_{n}"` for n = 2, 3, …
    pub fn assign(&mut self, styler: &Styler, label: &str, role: Role) -> Identifier {
        let preferred = styler.style(label, role);
        let chosen = if !self.is_taken(&preferred) {
            preferred
        } else {
            let escaped = format!("{preferred}_");
            if self.is_forbidden(&preferred) && !self.is_taken(&escaped) {
                escaped
            } else {
                let mut n = 2u32;
                loop {
                    let candidate = styler.style(&format!("{label}_{n}"), role);
                    if !self.is_taken(&candidate) {
                        break candidate;
                    }
                    n += 1;
                }
            }
        };

        trace!(namespace = %self.name, label, name = %chosen, "assigned name");
        self.bound.insert(chosen.clone());
        Identifier(chosen)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const UNICODE: Styler = Styler {
        grammar: Grammar::Unicode,
    };

    #[test]
    fn duplicate_labels_are_disambiguated() {
        let mut ns = Namespace::new("global");
        let a = ns.assign(&UNICODE, "Value", Role::Type);
        let b = ns.assign(&UNICODE, "Value", Role::Type);
        let c = ns.assign(&UNICODE, "value", Role::Type);
        assert_eq!(a.as_str(), "Value");
        assert_eq!(b.as_str(), "Value2");
        assert_eq!(c.as_str(), "Value3");
    }

    #[test]
    fn snake_suffix_keeps_separator() {
        let mut ns = Namespace::new("props");
        ns.assign(&UNICODE, "value", Role::Property { nice: true });
        let second = ns.assign(&UNICODE, "Value", Role::Property { nice: true });
        assert_eq!(second.as_str(), "value_2");
    }

    #[test]
    fn forbidden_words_are_escaped() {
        let mut ns = Namespace::with_forbidden("props", ["class", "self"]);
        let role = Role::Property { nice: true };
        assert_eq!(ns.assign(&UNICODE, "class", role).as_str(), "class_");
        assert_eq!(ns.assign(&UNICODE, "Class", role).as_str(), "class_2");
        assert_eq!(ns.assign(&UNICODE, "self", role).as_str(), "self_");
    }

    #[test]
    fn roles_pick_styles() {
        let mut ns = Namespace::new("scratch");
        assert_eq!(ns.assign(&UNICODE, "red apple", Role::EnumCase).as_str(), "RED_APPLE");
        assert_eq!(ns.assign(&UNICODE, "Top Level", Role::Function).as_str(), "top_level");
        assert_eq!(
            ns.assign(&UNICODE, "my-Key", Role::Property { nice: false }).as_str(),
            "my_Key"
        );
        assert_eq!(ns.bound().count(), 3);
    }
}
