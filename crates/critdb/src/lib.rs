//! ## Crate layout
//! - `core`: entity graph model, criteria builder, join compiler, plan
//!   validator, and the in-memory execution engine.
//!
//! The `prelude` module mirrors the surface application code uses: build a
//! `Registry`, open a `Db`, persist `Record` graphs inside a session
//! bracket, and run compiled `CriteriaQuery` plans.

pub use critdb_core as core;

pub use critdb_core::Error;

/// Workspace version re-export for downstream tooling/tests.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

///
/// Prelude
///

pub mod prelude {
    pub use crate::core::{
        db::{Db, Response, ResponseError, RowId, Session, SessionError},
        error::Error,
        model::{AssociationDef, Cardinality, EntityDef, ModelError, Registry},
        query::{
            CompiledQuery, CriteriaQuery, Fetch, Join, JoinClass, JoinType, PlanError, Predicate,
            QueryError, Root, and, equal, not, or, validate_query,
        },
        record::Record,
        value::Value,
    };
}
