//! Logical term data model: functors, arguments, annotations.
//!
//! A [`Term`] is the structured form of a fact, goal, or plan advertisement:
//! a functor plus an ordered argument sequence, optionally carrying an
//! annotation set (metadata terms such as provenance). Terms are immutable
//! once constructed; the builder-style `with_*` methods return new terms.
//!
//! Full unification lives in the reasoning engine. This module only provides
//! the structural one-way match ([`Term::unifies`]) that the belief facade
//! needs for its replace-if-matching algorithm.

use std::collections::HashMap;
use std::fmt;

/// Direction of a mental-state change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Trigger {
    /// Something is being added (`+` in plan notation).
    Addition,
    /// Something is being removed (`-` in plan notation).
    Removal,
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Addition => write!(f, "+"),
            Self::Removal => write!(f, "-"),
        }
    }
}

/// Category of a mental-state change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GoalType {
    /// A fact in the belief base.
    Belief,
    /// An achievement goal (`!g`).
    Achievement,
    /// A test goal (`?g`).
    Test,
    /// A plan advertisement (another agent telling us how).
    TellHow,
    /// Retraction of a previously advertised plan.
    UntellHow,
    /// A request for a plan.
    AskHow,
}

/// `(functor, arity)` key identifying a belief or plan family.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Signature {
    pub functor: String,
    pub arity: usize,
}

impl Signature {
    pub fn new(functor: impl Into<String>, arity: usize) -> Self {
        Self {
            functor: functor.into(),
            arity,
        }
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.functor, self.arity)
    }
}

// ── Value ────────────────────────────────────────────────────────────────

/// One argument position in a term.
///
/// A bare atom is a zero-argument [`Term`]. Numbers compare strictly by
/// variant: `Int(2)` does not match `Float(2.0)`.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// A nested structured term (atoms are the zero-arity case).
    Term(Term),
    Int(i64),
    Float(f64),
    Str(String),
    /// An ordered tuple, rendered as a list literal on the wire.
    Tuple(Vec<Value>),
    /// An unbound variable, optionally named. `None` is the anonymous
    /// wildcard produced when decoding a `_X`-convention body.
    Var(Option<String>),
}

impl Value {
    /// A zero-arity term (an atom).
    pub fn atom(name: impl Into<String>) -> Self {
        Self::Term(Term::atom(name))
    }

    /// The functor of a zero-arity term, if this value is one.
    pub fn as_atom(&self) -> Option<&str> {
        match self {
            Self::Term(t) if t.is_atom() => Some(t.functor()),
            _ => None,
        }
    }

    /// Structural one-way match. Variables match anything; everything else
    /// matches its own variant shape.
    pub fn matches(&self, other: &Value) -> bool {
        match (self, other) {
            (Self::Var(_), _) | (_, Self::Var(_)) => true,
            (Self::Term(a), Self::Term(b)) => a.unifies(b),
            (Self::Tuple(a), Self::Tuple(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.matches(y))
            }
            (a, b) => a == b,
        }
    }

    /// Ground this value against an intention's binding scope, replacing
    /// bound named variables with their values. Unbound variables survive
    /// and render as `_` on the wire.
    pub fn frozen(&self, intention: &Intention) -> Value {
        match self {
            Self::Var(Some(name)) => match intention.lookup(name) {
                Some(bound) => bound.frozen(intention),
                None => self.clone(),
            },
            Self::Term(t) => Self::Term(t.frozen(intention)),
            Self::Tuple(items) => {
                Self::Tuple(items.iter().map(|v| v.frozen(intention)).collect())
            }
            other => other.clone(),
        }
    }
}

// ── Term ─────────────────────────────────────────────────────────────────

/// A structured logical term: functor, ordered arguments, annotation set.
///
/// The annotation set carries set semantics: duplicates are never stored and
/// equality ignores annotation order.
#[derive(Debug, Clone)]
pub struct Term {
    functor: String,
    args: Vec<Value>,
    annots: Vec<Term>,
}

impl Term {
    pub fn new(functor: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            functor: functor.into(),
            args,
            annots: Vec::new(),
        }
    }

    /// A zero-arity term.
    pub fn atom(functor: impl Into<String>) -> Self {
        Self::new(functor, Vec::new())
    }

    /// The `plain_text` wrapper used for raw plan bodies in the how-family
    /// performatives.
    pub fn plain_text(text: impl Into<String>) -> Self {
        Self::new("plain_text", vec![Value::Str(text.into())])
    }

    pub fn functor(&self) -> &str {
        &self.functor
    }

    pub fn args(&self) -> &[Value] {
        &self.args
    }

    pub fn arity(&self) -> usize {
        self.args.len()
    }

    pub fn annots(&self) -> &[Term] {
        &self.annots
    }

    pub fn is_atom(&self) -> bool {
        self.args.is_empty()
    }

    pub fn signature(&self) -> Signature {
        Signature::new(self.functor.clone(), self.args.len())
    }

    /// Attach an annotation, preserving set semantics (duplicates dropped).
    pub fn with_annotation(mut self, annot: Term) -> Self {
        if !self.annots.contains(&annot) {
            self.annots.push(annot);
        }
        self
    }

    /// Attach a `source(<who>)` provenance annotation.
    pub fn with_source(self, who: impl Into<String>) -> Self {
        self.with_annotation(Term::new("source", vec![Value::atom(who.into())]))
    }

    /// The peer named by the first `source` annotation, if any.
    pub fn source(&self) -> Option<&str> {
        self.annots
            .iter()
            .find(|a| a.functor == "source")
            .and_then(|a| a.args.first())
            .and_then(|v| v.as_atom())
    }

    /// Structural one-way match against another term. Annotations are
    /// ignored; variables in either term match anything.
    pub fn unifies(&self, other: &Term) -> bool {
        self.functor == other.functor
            && self.args.len() == other.args.len()
            && self.args.iter().zip(&other.args).all(|(a, b)| a.matches(b))
    }

    /// Ground all arguments against an intention's binding scope.
    /// Annotations are carried over untouched.
    pub fn frozen(&self, intention: &Intention) -> Term {
        Term {
            functor: self.functor.clone(),
            args: self.args.iter().map(|v| v.frozen(intention)).collect(),
            annots: self.annots.clone(),
        }
    }
}

impl PartialEq for Term {
    /// Equality is structural; the annotation set compares order-insensitively.
    fn eq(&self, other: &Self) -> bool {
        self.functor == other.functor
            && self.args == other.args
            && self.annots.len() == other.annots.len()
            && self.annots.iter().all(|a| other.annots.contains(a))
    }
}

// ── Intention ────────────────────────────────────────────────────────────

/// The reasoning context a mental update is applied under.
///
/// The engine owns the full intention stack; the mediation layer only
/// threads this through opaquely and consults the binding scope when
/// freezing outbound payloads.
#[derive(Debug, Clone, Default)]
pub struct Intention {
    scope: HashMap<String, Value>,
}

impl Intention {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a named variable in this intention's scope.
    pub fn bind(mut self, name: impl Into<String>, value: Value) -> Self {
        self.scope.insert(name.into(), value);
        self
    }

    pub fn lookup(&self, name: &str) -> Option<&Value> {
        self.scope.get(name)
    }
}

// ── Tests ────────────────────────────────────────────────────────────────
