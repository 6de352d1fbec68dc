//! Criteria query construction, join compilation, and plan validation.
//!
//! Validation ownership contract:
//! - `CriteriaQuery::compile` owns build-time join-shape semantics and
//!   emits `QueryError`.
//! - `validate::validate_query` re-checks compiled trees defensively and
//!   owns predicate-path semantics, emitting `PlanError`.

pub mod builder;
pub mod plan;
pub mod predicate;
pub mod validate;

#[cfg(test)]
mod tests;

pub use builder::{CriteriaQuery, Fetch, Join, Root};
pub use plan::{CompiledQuery, JoinClass, JoinNode};
pub use predicate::{CompareOp, ComparePredicate, PathExpr, Predicate, and, equal, not, or};
pub use validate::{PlanError, validate_query};

use crate::model::ModelError;
use thiserror::Error as ThisError;

///
/// JoinType
///
/// Relational join flavour, fixed at node construction.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum JoinType {
    Inner,
    Left,
}

///
/// NodeId
///
/// Handle into a query's navigation arena. `NodeId::ROOT` is the query
/// root; join nodes are numbered from 1 in construction order.
///

#[derive(Clone, Copy, Debug, Eq, Ord, PartialEq, PartialOrd)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub const ROOT: Self = Self(0);

    #[must_use]
    pub const fn is_root(self) -> bool {
        self.0 == 0
    }
}

///
/// QueryError
///
/// Build-time rejections raised at the call that introduced the violation,
/// before any storage round-trip.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum QueryError {
    /// A fetch-join handle was used as an ordinary-join source. The fetched
    /// association is already bound to populate its parent's collection and
    /// is not independently joinable.
    #[error(
        "fetch join '{fetched}' cannot be used as an ordinary join source \
         (attempted to join '{attempted}')"
    )]
    IllegalJoinShape { fetched: String, attempted: String },

    /// A fetch join must chain from the root through fetch joins only.
    #[error(
        "fetch join '{association}' must chain from the root or another \
         fetch join, not from ordinary join '{parent}'"
    )]
    FetchUnderOrdinary {
        association: String,
        parent: String,
    },

    /// One alias bound twice under the same parent. Fetching and separately
    /// joining the same association requires two distinct aliases.
    #[error("alias '{alias}' is bound more than once under '{parent}'")]
    AmbiguousAlias { alias: String, parent: String },

    #[error(transparent)]
    Model(#[from] ModelError),
}
