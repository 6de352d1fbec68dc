//! Unit of work.
//!
//! One externally scoped transaction bracket per session: `begin`,
//! `persist`/`execute`, then `commit` or `rollback`. Core-detected errors
//! leave the transaction active but uncommitted; rollback is the caller's
//! call.

use crate::{
    db::{
        executor::Executor,
        response::Response,
        store::{MemStore, RowId, StoreSnapshot},
    },
    error::Error,
    model::{Cardinality, Registry},
    query::CompiledQuery,
    record::Record,
};
use std::collections::BTreeMap;
use thiserror::Error as ThisError;

///
/// SessionError
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum SessionError {
    #[error("no active transaction")]
    TransactionInactive,

    #[error("transaction already active")]
    TransactionAlreadyActive,

    /// Cascade persist only descends through one-to-many collections.
    #[error("cascade persist requires a one-to-many association, '{association}' is many-to-one")]
    CascadeManyToOne { association: String },

    /// A one-to-many collection without an owning foreign key cannot be
    /// written.
    #[error("one-to-many association '{association}' has no mapped_by owner")]
    UnmappedCollection { association: String },

    #[error("child under '{association}' is a '{found}', association targets '{expected}'")]
    ChildEntityMismatch {
        association: String,
        expected: String,
        found: String,
    },
}

///
/// Db
///
/// Registry plus storage collaborator. Queries and persists run through
/// sessions obtained from here.
///

#[derive(Debug)]
pub struct Db {
    registry: Registry,
    store: MemStore,
}

impl Db {
    #[must_use]
    pub fn new(registry: Registry) -> Self {
        Self {
            registry,
            store: MemStore::new(),
        }
    }

    #[must_use]
    pub const fn registry(&self) -> &Registry {
        &self.registry
    }

    #[must_use]
    pub const fn store(&self) -> &MemStore {
        &self.store
    }

    #[must_use]
    pub fn session(&mut self) -> Session<'_> {
        Session {
            db: self,
            snapshot: None,
        }
    }
}

///
/// Session
///

pub struct Session<'a> {
    db: &'a mut Db,
    snapshot: Option<StoreSnapshot>,
}

impl Session<'_> {
    pub fn begin(&mut self) -> Result<(), SessionError> {
        if self.snapshot.is_some() {
            return Err(SessionError::TransactionAlreadyActive);
        }
        self.snapshot = Some(self.db.store.snapshot());

        Ok(())
    }

    pub fn commit(&mut self) -> Result<(), SessionError> {
        self.snapshot
            .take()
            .map(|_| ())
            .ok_or(SessionError::TransactionInactive)
    }

    pub fn rollback(&mut self) -> Result<(), SessionError> {
        let snapshot = self
            .snapshot
            .take()
            .ok_or(SessionError::TransactionInactive)?;
        self.db.store.restore(snapshot);

        Ok(())
    }

    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.snapshot.is_some()
    }

    /// Persist an entity graph, cascading through owned one-to-many
    /// collections; the store assigns identities top-down and each child
    /// row receives its owner's foreign key.
    pub fn persist(&mut self, record: &Record) -> Result<RowId, Error> {
        if self.snapshot.is_none() {
            return Err(SessionError::TransactionInactive.into());
        }

        persist_graph(&self.db.registry, &mut self.db.store, record, None)
    }

    /// Execute a compiled query, returning ordered root records.
    pub fn execute(&self, query: &CompiledQuery) -> Result<Response, Error> {
        if self.snapshot.is_none() {
            return Err(SessionError::TransactionInactive.into());
        }

        Executor::new(&self.db.registry, &self.db.store).execute(query)
    }

    /// Execute with the single-result contract.
    pub fn execute_single(&self, query: &CompiledQuery) -> Result<(RowId, Record), Error> {
        Ok(self.execute(query)?.one()?)
    }
}

fn persist_graph(
    registry: &Registry,
    store: &mut MemStore,
    record: &Record,
    owner: Option<(&str, RowId)>,
) -> Result<RowId, Error> {
    let entity = registry.entity(record.entity())?;
    for field in record.fields().keys() {
        registry.attribute(&entity.name, field)?;
    }

    let mut refs = BTreeMap::new();
    if let Some((fk, parent)) = owner {
        refs.insert(fk.to_string(), parent);
    }
    let id = store.insert(record.entity(), record.fields().clone(), refs);

    for (name, children) in record.child_associations() {
        let association = registry.association(record.entity(), name)?;
        if association.cardinality != Cardinality::OneToMany {
            return Err(SessionError::CascadeManyToOne {
                association: name.clone(),
            }
            .into());
        }
        let fk = association
            .mapped_by
            .as_deref()
            .ok_or_else(|| SessionError::UnmappedCollection {
                association: name.clone(),
            })?;

        for child in children {
            if child.entity() != association.target {
                return Err(SessionError::ChildEntityMismatch {
                    association: name.clone(),
                    expected: association.target.clone(),
                    found: child.entity().to_string(),
                }
                .into());
            }
            persist_graph(registry, store, child, Some((fk, id)))?;
        }
    }

    Ok(id)
}
