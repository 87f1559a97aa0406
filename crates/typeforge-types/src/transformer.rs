//! Declarative transformer trees.
//!
//! A [`Transformer`] is one step on the way from a generic decoded JSON value
//! to a concrete type (or back).  Steps chain through their `consumer`, which
//! receives the step's output.  Backends compile these trees; they never
//! interpret them at generation time.

use serde::{Deserialize, Serialize};

use crate::TypeRef;

/// How a type is decoded from, and encoded back to, its JSON shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transformation {
    /// The type produced by `transformer`.
    pub target: TypeRef,
    /// Decoding pipeline: JSON shape → `target`.
    pub transformer: Transformer,
    /// Encoding pipeline: `target` → JSON shape.
    pub reverse: Transformer,
}

/// Collection shape for element-wise transforms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Container {
    List,
    Dict,
}

/// One node of a transformer tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transformer {
    /// The type this step consumes.
    pub source: TypeRef,
    #[serde(flatten)]
    pub kind: TransformerKind,
}

/// The step a [`Transformer`] performs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "kebab-case")]
pub enum TransformerKind {
    /// Decode the input as `source` with the primitive decoder for its kind.
    Decode {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        consumer: Option<Box<Transformer>>,
    },
    /// Encode a `source` value to its JSON shape.  Always terminal.
    Encode,
    /// Apply `element` to every item of a list or every value of a dict.
    Elements {
        container: Container,
        element: Box<Transformer>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        consumer: Option<Box<Transformer>>,
    },
    /// Try each branch in order; the first that succeeds wins.
    Choice { branches: Vec<Transformer> },
    /// Assert the runtime type of the input is `member`, then continue.
    UnionMemberMatch {
        member: TypeRef,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        consumer: Option<Box<Transformer>>,
    },
    /// The value already is the chosen union member.
    UnionInstantiation,
    /// Parse a string into the consumer's source kind (or the target).
    ParseString {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        consumer: Option<Box<Transformer>>,
    },
    /// Render `source` as a string.
    Stringify {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        consumer: Option<Box<Transformer>>,
    },
}

impl Transformer {
    pub fn new(source: TypeRef, kind: TransformerKind) -> Self {
        Self { source, kind }
    }

    pub fn decode(source: TypeRef, consumer: Option<Transformer>) -> Self {
        Self::new(
            source,
            TransformerKind::Decode {
                consumer: consumer.map(Box::new),
            },
        )
    }

    pub fn encode(source: TypeRef) -> Self {
        Self::new(source, TransformerKind::Encode)
    }

    pub fn elements(
        source: TypeRef,
        container: Container,
        element: Transformer,
        consumer: Option<Transformer>,
    ) -> Self {
        Self::new(
            source,
            TransformerKind::Elements {
                container,
                element: Box::new(element),
                consumer: consumer.map(Box::new),
            },
        )
    }

    pub fn choice(source: TypeRef, branches: Vec<Transformer>) -> Self {
        Self::new(source, TransformerKind::Choice { branches })
    }

    pub fn member_match(source: TypeRef, member: TypeRef, consumer: Option<Transformer>) -> Self {
        Self::new(
            source,
            TransformerKind::UnionMemberMatch {
                member,
                consumer: consumer.map(Box::new),
            },
        )
    }

    pub fn instantiate(source: TypeRef) -> Self {
        Self::new(source, TransformerKind::UnionInstantiation)
    }

    pub fn parse_string(source: TypeRef, consumer: Option<Transformer>) -> Self {
        Self::new(
            source,
            TransformerKind::ParseString {
                consumer: consumer.map(Box::new),
            },
        )
    }

    pub fn stringify(source: TypeRef, consumer: Option<Transformer>) -> Self {
        Self::new(
            source,
            TransformerKind::Stringify {
                consumer: consumer.map(Box::new),
            },
        )
    }

    /// The next step applied to this step's output, if any.
    pub fn consumer(&self) -> Option<&Transformer> {
        match &self.kind {
            TransformerKind::Decode { consumer }
            | TransformerKind::Elements { consumer, .. }
            | TransformerKind::UnionMemberMatch { consumer, .. }
            | TransformerKind::ParseString { consumer }
            | TransformerKind::Stringify { consumer } => consumer.as_deref(),
            TransformerKind::Encode
            | TransformerKind::Choice { .. }
            | TransformerKind::UnionInstantiation => None,
        }
    }

    /// Short name of the step, for diagnostics.
    pub fn op_name(&self) -> &'static str {
        match &self.kind {
            TransformerKind::Decode { .. } => "decode",
            TransformerKind::Encode => "encode",
            TransformerKind::Elements { .. } => "elements",
            TransformerKind::Choice { .. } => "choice",
            TransformerKind::UnionMemberMatch { .. } => "union-member-match",
            TransformerKind::UnionInstantiation => "union-instantiation",
            TransformerKind::ParseString { .. } => "parse-string",
            TransformerKind::Stringify { .. } => "stringify",
        }
    }

    /// Call `f` for every type reference in this tree, pre-order.
    pub fn visit_refs(&self, f: &mut dyn FnMut(TypeRef)) {
        f(self.source);
        match &self.kind {
            TransformerKind::Choice { branches } => {
                for branch in branches {
                    branch.visit_refs(f);
                }
            }
            TransformerKind::Elements { element, .. } => element.visit_refs(f),
            TransformerKind::UnionMemberMatch { member, .. } => f(*member),
            _ => {}
        }
        if let Some(consumer) = self.consumer() {
            consumer.visit_refs(f);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn consumer_chain_is_visited_after_node() {
        let xfer = Transformer::decode(
            TypeRef(0),
            Some(Transformer::parse_string(TypeRef(0), Some(Transformer::instantiate(TypeRef(1))))),
        );
        let mut seen = Vec::new();
        xfer.visit_refs(&mut |t| seen.push(t.0));
        assert_eq!(seen, vec![0, 0, 1]);
        assert_eq!(xfer.consumer().map(Transformer::op_name), Some("parse-string"));
    }

    #[test]
    fn serializes_with_op_tag() {
        let xfer = Transformer::stringify(TypeRef(2), Some(Transformer::encode(TypeRef(1))));
        let json = serde_json::to_value(&xfer).unwrap();
        assert_eq!(json["op"], "stringify");
        assert_eq!(json["source"], 2);
        assert_eq!(json["consumer"]["op"], "encode");

        let back: Transformer = serde_json::from_value(json).unwrap();
        assert_eq!(back, xfer);
    }
}
