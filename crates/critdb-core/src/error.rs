use crate::{
    db::{ResponseError, SessionError, StoreError},
    model::ModelError,
    query::{PlanError, QueryError},
};
use thiserror::Error as ThisError;

///
/// Error
///
/// Crate-boundary error: every component failure surfaces here, raised
/// synchronously at the call that introduced it. Nothing is swallowed or
/// downgraded; storage failures pass through unmodified.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum Error {
    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Query(#[from] QueryError),

    #[error(transparent)]
    Plan(#[from] PlanError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Response(#[from] ResponseError),
}
