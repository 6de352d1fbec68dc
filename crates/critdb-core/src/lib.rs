//! Core runtime for critdb: entity graph model, criteria builder, join
//! compiler, plan validator, and the in-memory execution engine.
#![warn(unreachable_pub)]

pub mod db;
pub mod error;
pub mod model;
pub mod query;
pub mod record;
pub mod value;

pub use error::Error;

///
/// Prelude
///
/// Prelude contains only domain vocabulary; no executors or stores.
///

pub mod prelude {
    pub use crate::{
        db::{Db, Response, RowId, Session},
        error::Error,
        model::{AssociationDef, Cardinality, EntityDef, Registry},
        query::{
            CompiledQuery, CriteriaQuery, JoinType, Predicate, QueryError, and, equal, not, or,
        },
        record::Record,
        value::Value,
    };
}
