//! Two-phase source emission.
//!
//! Renderers append [`Record`]s to named [`Section`]s in whatever order is
//! convenient; [`Emitter::finish`] then lays the sections out in file order,
//! normalizes blank lines and serializes the import block.

use std::collections::{BTreeMap, BTreeSet};

const INDENT: &str = "    ";

/// File regions, in output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Section {
    Header,
    Imports,
    /// Type variables shared by support functions.
    Prelude,
    Support,
    Enums,
    Classes,
    TopLevel,
}

/// One emitted element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Record {
    Line { indent: usize, text: String },
    /// At least `n` blank lines here.
    Blank(usize),
}

/// Deduplicated import statements.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSet {
    from: BTreeMap<String, BTreeSet<String>>,
    plain: BTreeSet<String>,
}

impl ImportSet {
    /// `from module import name`
    pub fn from(&mut self, module: &str, name: &str) {
        self.from
            .entry(module.to_string())
            .or_default()
            .insert(name.to_string());
    }

    /// `import module`
    pub fn module(&mut self, module: &str) {
        self.plain.insert(module.to_string());
    }

    pub fn is_empty(&self) -> bool {
        self.from.is_empty() && self.plain.is_empty()
    }

    pub fn contains(&self, module: &str, name: &str) -> bool {
        self.from.get(module).is_some_and(|names| names.contains(name))
    }

    pub fn lines(&self) -> Vec<String> {
        let from = self.from.iter().map(|(module, names)| {
            let names: Vec<&str> = names.iter().map(String::as_str).collect();
            format!("from {module} import {}", names.join(", "))
        });
        let plain = self.plain.iter().map(|module| format!("import {module}"));
        from.chain(plain).collect()
    }
}

/// Collects records per section.
#[derive(Debug)]
pub struct Emitter {
    sections: BTreeMap<Section, Vec<Record>>,
    current: Section,
    indent: usize,
}

impl Default for Emitter {
    fn default() -> Self {
        Self::new()
    }
}

impl Emitter {
    pub fn new() -> Self {
        Self {
            sections: BTreeMap::new(),
            current: Section::Header,
            indent: 0,
        }
    }

    /// Switch to `section`, resetting indentation.
    pub fn set_section(&mut self, section: Section) {
        self.current = section;
        self.indent = 0;
    }

    fn push(&mut self, record: Record) {
        self.sections.entry(self.current).or_default().push(record);
    }

    pub fn line(&mut self, text: impl Into<String>) {
        let record = Record::Line {
            indent: self.indent,
            text: text.into(),
        };
        self.push(record);
    }

    pub fn blank(&mut self, n: usize) {
        self.push(Record::Blank(n));
    }

    pub fn indent(&mut self) {
        self.indent += 1;
    }

    pub fn dedent(&mut self) {
        self.indent = self.indent.saturating_sub(1);
    }

    /// Run `body` one level deeper.
    pub fn indented(&mut self, body: impl FnOnce(&mut Self)) {
        self.indent();
        body(self);
        self.dedent();
    }

    /// Lay out all sections and serialize.  The result ends in exactly one
    /// newline; sections are separated by two blank lines.
    pub fn finish(mut self, imports: &ImportSet) -> String {
        let import_records = imports
            .lines()
            .into_iter()
            .map(|text| Record::Line { indent: 0, text })
            .collect();
        self.sections.insert(Section::Imports, import_records);

        let rendered: Vec<String> = self
            .sections
            .values()
            .map(|records| render_section(records))
            .filter(|s| !s.is_empty())
            .collect();

        let mut out = rendered.join("\n\n\n");
        out.push('\n');
        out
    }
}

fn render_section(records: &[Record]) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut pending_blank = 0usize;
    for record in records {
        match record {
            Record::Blank(n) => pending_blank = pending_blank.max(*n),
            Record::Line { indent, text } => {
                if !lines.is_empty() {
                    lines.extend(std::iter::repeat(String::new()).take(pending_blank));
                }
                pending_blank = 0;
                if text.is_empty() {
                    lines.push(String::new());
                } else {
                    lines.push(format!("{}{text}", INDENT.repeat(*indent)));
                }
            }
        }
    }
    while lines.last().is_some_and(String::is_empty) {
        lines.pop();
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn sections_are_ordered_and_separated() {
        let mut e = Emitter::new();
        e.set_section(Section::Classes);
        e.line("class A:");
        e.indented(|e| e.line("pass"));
        e.set_section(Section::Header);
        e.line("# header");

        let mut imports = ImportSet::default();
        imports.from("typing", "List");
        imports.from("typing", "Any");
        imports.module("json");

        let out = e.finish(&imports);
        assert_eq!(
            out,
            "# header\n\n\nfrom typing import Any, List\nimport json\n\n\nclass A:\n    pass\n"
        );
    }

    #[test]
    fn blank_runs_collapse_and_edges_trim() {
        let mut e = Emitter::new();
        e.set_section(Section::Support);
        e.blank(2);
        e.line("def a():");
        e.indented(|e| e.line("pass"));
        e.blank(1);
        e.blank(2);
        e.line("def b():");
        e.indented(|e| e.line("pass"));
        e.blank(2);

        let out = e.finish(&ImportSet::default());
        assert_eq!(out, "def a():\n    pass\n\n\ndef b():\n    pass\n");
    }

    #[test]
    fn empty_output_is_one_newline() {
        assert_eq!(Emitter::new().finish(&ImportSet::default()), "\n");
    }
}
