//! In-memory storage collaborator.
//!
//! Identity-keyed tables with storage-assigned surrogate keys. Rows hold
//! scalar attribute values plus foreign-key references keyed by the owning
//! many-to-one attribute name; associations are index references, never
//! owning pointers, so bidirectional entity shapes cannot form ownership
//! cycles.

use crate::value::Value;
use derive_more::{Deref, Display};
use std::{cell::Cell, collections::BTreeMap};
use thiserror::Error as ThisError;

///
/// RowId
///
/// Surrogate key assigned by the store at insert time. Monotonic within a
/// store, so id order is insertion order.
///

#[derive(Clone, Copy, Debug, Deref, Display, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct RowId(u64);

///
/// Row
///

#[derive(Clone, Debug)]
pub struct Row {
    pub id: RowId,
    pub fields: BTreeMap<String, Value>,
    pub refs: BTreeMap<String, RowId>,
}

///
/// StoreError
///
/// Opaque collaborator failures; the core passes them through unmodified.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum StoreError {
    #[error("row {id} not found in table '{entity}'")]
    MissingRow { entity: String, id: RowId },
}

///
/// MemStore
///

#[derive(Debug, Default)]
pub struct MemStore {
    tables: BTreeMap<String, BTreeMap<RowId, Row>>,
    next_id: u64,
    round_trips: Cell<u64>,
}

/// Snapshot of table state for unit-of-work rollback.
#[derive(Debug)]
pub(crate) struct StoreSnapshot {
    tables: BTreeMap<String, BTreeMap<RowId, Row>>,
    next_id: u64,
}

impl MemStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(
        &mut self,
        entity: &str,
        fields: BTreeMap<String, Value>,
        refs: BTreeMap<String, RowId>,
    ) -> RowId {
        self.next_id += 1;
        let id = RowId(self.next_id);
        self.tables
            .entry(entity.to_string())
            .or_default()
            .insert(id, Row { id, fields, refs });

        id
    }

    /// All rows of a table in id (insertion) order.
    pub(crate) fn scan<'a>(&'a self, entity: &str) -> impl Iterator<Item = &'a Row> {
        self.tables.get(entity).into_iter().flat_map(BTreeMap::values)
    }

    pub(crate) fn row(&self, entity: &str, id: RowId) -> Result<&Row, StoreError> {
        self.tables
            .get(entity)
            .and_then(|table| table.get(&id))
            .ok_or_else(|| StoreError::MissingRow {
                entity: entity.to_string(),
                id,
            })
    }

    /// Rows of `entity` whose foreign key `fk` references `parent`,
    /// in id order.
    pub(crate) fn children<'a>(
        &'a self,
        entity: &str,
        fk: &'a str,
        parent: RowId,
    ) -> impl Iterator<Item = &'a Row> {
        self.scan(entity)
            .filter(move |row| row.refs.get(fk) == Some(&parent))
    }

    /// Number of query round-trips the executor has made against this
    /// store. Rejected queries must leave this untouched.
    #[must_use]
    pub fn round_trips(&self) -> u64 {
        self.round_trips.get()
    }

    pub(crate) fn note_round_trip(&self) {
        self.round_trips.set(self.round_trips.get() + 1);
    }

    pub(crate) fn snapshot(&self) -> StoreSnapshot {
        StoreSnapshot {
            tables: self.tables.clone(),
            next_id: self.next_id,
        }
    }

    pub(crate) fn restore(&mut self, snapshot: StoreSnapshot) {
        self.tables = snapshot.tables;
        self.next_id = snapshot.next_id;
    }
}
