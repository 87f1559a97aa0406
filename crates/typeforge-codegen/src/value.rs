//! Value-or-lambda: the compiled form of a transformation.
//!
//! Expressions are [`Template`]s with holes for a single lambda parameter.
//! Composing two functions substitutes one body into the other, so a chain
//! of N steps is always one expression (or one `lambda x: ...`), never a
//! tower of nested lambdas.

use crate::error::{CodegenError, CodegenResult};

/// Name of the parameter in rendered lambdas.
const PARAM: &str = "x";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Piece {
    Text(String),
    Param,
}

/// A Python expression, possibly with holes for the lambda parameter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Template(Vec<Piece>);

impl Template {
    pub fn text(s: impl Into<String>) -> Self {
        let mut t = Self::default();
        t.push_text(s.into());
        t
    }

    pub fn param() -> Self {
        Self(vec![Piece::Param])
    }

    fn push_text(&mut self, s: String) {
        if s.is_empty() {
            return;
        }
        match self.0.last_mut() {
            Some(Piece::Text(last)) => last.push_str(&s),
            _ => self.0.push(Piece::Text(s)),
        }
    }

    fn push_piece(&mut self, piece: Piece) {
        match piece {
            Piece::Text(s) => self.push_text(s),
            Piece::Param => self.0.push(Piece::Param),
        }
    }

    /// `self` followed by `other`.
    pub fn then(mut self, other: Template) -> Self {
        for piece in other.0 {
            self.push_piece(piece);
        }
        self
    }

    /// `callee(arg, arg, ...)`
    pub fn call(callee: &str, args: impl IntoIterator<Item = Template>) -> Self {
        let mut t = Template::text(format!("{callee}("));
        for (i, arg) in args.into_iter().enumerate() {
            if i > 0 {
                t.push_text(", ".to_string());
            }
            t = t.then(arg);
        }
        t.then(Template::text(")"))
    }

    /// Replace every hole with `arg`.
    pub fn substitute(&self, arg: &Template) -> Template {
        let mut out = Template::default();
        for piece in &self.0 {
            match piece {
                Piece::Text(s) => out.push_text(s.clone()),
                Piece::Param => out = out.then(arg.clone()),
            }
        }
        out
    }

    pub fn render(&self) -> String {
        self.0
            .iter()
            .map(|p| match p {
                Piece::Text(s) => s.as_str(),
                Piece::Param => PARAM,
            })
            .collect()
    }

    /// `f(x)` where `f` is a dotted name: the body of an eta-reducible lambda.
    fn as_plain_call(&self) -> Option<&str> {
        match self.0.as_slice() {
            [Piece::Text(head), Piece::Param, Piece::Text(tail)] if tail == ")" => {
                let callee = head.strip_suffix('(')?;
                let dotted = !callee.is_empty()
                    && callee
                        .split('.')
                        .all(|seg| !seg.is_empty() && seg.chars().all(|c| c.is_alphanumeric() || c == '_'));
                dotted.then_some(callee)
            }
            _ => None,
        }
    }
}

/// A unary function: a callable name or a lambda body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Function {
    Named(String),
    Lambda(Template),
}

impl Function {
    pub fn named(name: impl Into<String>) -> Self {
        Function::Named(name.into())
    }

    /// `lambda x: callee(leading..., x)`
    pub fn partial(callee: &str, leading: impl IntoIterator<Item = String>) -> Self {
        let args = leading
            .into_iter()
            .map(Template::text)
            .chain(std::iter::once(Template::param()));
        Function::Lambda(Template::call(callee, args))
    }

    /// `lambda x: x.method()`
    pub fn method(method: &str) -> Self {
        Function::Lambda(Template::param().then(Template::text(format!(".{method}()"))))
    }

    /// The expression `self(arg)`, beta-reduced.
    pub fn apply(&self, arg: &Template) -> Template {
        match self {
            Function::Named(name) => Template::call(name, [arg.clone()]),
            Function::Lambda(body) => body.substitute(arg),
        }
    }

    /// `next ∘ self`
    pub fn then(&self, next: &Function) -> Function {
        Function::Lambda(next.apply(&self.apply(&Template::param())))
    }

    /// Render as a callable Python expression.
    pub fn render(&self) -> String {
        match self {
            Function::Named(name) => name.clone(),
            Function::Lambda(body) => match body.as_plain_call() {
                Some(callee) => callee.to_string(),
                None => format!("lambda {PARAM}: {}", body.render()),
            },
        }
    }
}

/// How to obtain a transformed value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueOrLambda {
    /// Nothing applied yet.
    Identity,
    /// A finished expression.
    Value(Template),
    /// A pending unary function with no argument yet.
    Lambda(Function),
    /// A pending function and the expression it applies to.
    Applied { function: Function, argument: Template },
}

impl ValueOrLambda {
    pub fn value(expr: impl Into<String>) -> Self {
        ValueOrLambda::Value(Template::text(expr))
    }

    /// Compose `step` after whatever is pending.
    pub fn then(self, step: Function) -> Self {
        match self {
            ValueOrLambda::Identity => ValueOrLambda::Lambda(step),
            ValueOrLambda::Value(argument) => ValueOrLambda::Applied {
                function: step,
                argument,
            },
            ValueOrLambda::Lambda(f) => ValueOrLambda::Lambda(f.then(&step)),
            ValueOrLambda::Applied { function, argument } => ValueOrLambda::Applied {
                function: function.then(&step),
                argument,
            },
        }
    }

    pub fn is_function(&self) -> bool {
        matches!(self, ValueOrLambda::Identity | ValueOrLambda::Lambda(_))
    }

    /// Collapse to a single expression.
    pub fn into_value(self) -> CodegenResult<String> {
        match self {
            ValueOrLambda::Value(v) => Ok(v.render()),
            ValueOrLambda::Applied { function, argument } => Ok(function.apply(&argument).render()),
            ValueOrLambda::Identity | ValueOrLambda::Lambda(_) => Err(CodegenError::Internal(
                "cannot make a value from a function without an argument".into(),
            )),
        }
    }

    /// Collapse to a single unary function.
    pub fn into_lambda(self) -> Function {
        match self {
            ValueOrLambda::Identity => Function::Lambda(Template::param()),
            ValueOrLambda::Value(v) => Function::Lambda(v),
            ValueOrLambda::Lambda(f) => f,
            ValueOrLambda::Applied { function, argument } => {
                Function::Lambda(function.apply(&argument))
            }
        }
    }
}
