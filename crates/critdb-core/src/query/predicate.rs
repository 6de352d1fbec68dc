//! Predicate AST.
//!
//! Pure, schema-agnostic representation of query predicates. No type
//! validation or execution semantics here; interpretation occurs in later
//! passes (validation, then row evaluation in the executor).

use crate::{query::NodeId, value::Value};

///
/// CompareOp
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Lte,
    Gt,
    Gte,
}

///
/// PathExpr
///
/// Attribute reference reachable via zero or more navigation steps:
/// the arena node it hangs off plus the attribute name on that entity.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PathExpr {
    pub node: NodeId,
    pub attribute: String,
}

impl PathExpr {
    #[must_use]
    pub fn new(node: NodeId, attribute: impl Into<String>) -> Self {
        Self {
            node,
            attribute: attribute.into(),
        }
    }
}

///
/// ComparePredicate
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ComparePredicate {
    pub path: PathExpr,
    pub op: CompareOp,
    pub value: Value,
}

///
/// Predicate
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Predicate {
    True,
    And(Vec<Self>),
    Or(Vec<Self>),
    Not(Box<Self>),
    Compare(ComparePredicate),
}

impl Predicate {
    /// Conjunction combinator; `True` is the identity.
    #[must_use]
    pub fn and(self, other: Self) -> Self {
        match (self, other) {
            (Self::True, p) | (p, Self::True) => p,
            (a, b) => Self::And(vec![a, b]),
        }
    }

    /// Disjunction combinator.
    #[must_use]
    pub fn or(self, other: Self) -> Self {
        Self::Or(vec![self, other])
    }
}

/// Equality comparison against a literal.
#[must_use]
pub fn equal(path: PathExpr, value: impl Into<Value>) -> Predicate {
    compare(path, CompareOp::Eq, value)
}

/// Comparison against a literal with an explicit operator.
#[must_use]
pub fn compare(path: PathExpr, op: CompareOp, value: impl Into<Value>) -> Predicate {
    Predicate::Compare(ComparePredicate {
        path,
        op,
        value: value.into(),
    })
}

/// Conjunction over any number of predicates.
#[must_use]
pub fn and(predicates: Vec<Predicate>) -> Predicate {
    Predicate::And(predicates)
}

/// Disjunction over any number of predicates.
#[must_use]
pub fn or(predicates: Vec<Predicate>) -> Predicate {
    Predicate::Or(predicates)
}

/// Negation.
#[must_use]
pub fn not(predicate: Predicate) -> Predicate {
    Predicate::Not(Box::new(predicate))
}

impl Predicate {
    /// Visit every path reference in the tree.
    pub(crate) fn for_each_path<'a>(&'a self, f: &mut impl FnMut(&'a PathExpr)) {
        match self {
            Self::True => {}
            Self::And(children) | Self::Or(children) => {
                for child in children {
                    child.for_each_path(f);
                }
            }
            Self::Not(inner) => inner.for_each_path(f),
            Self::Compare(cmp) => f(&cmp.path),
        }
    }
}
