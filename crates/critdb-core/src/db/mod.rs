//! Storage collaborator, unit of work, and the execution engine.

pub mod executor;
pub mod response;
pub mod session;
pub mod store;


pub use executor::Executor;
pub use response::{Response, ResponseError};
pub use session::{Db, Session, SessionError};
pub use store::{MemStore, RowId, StoreError};
