use crate::{db::store::RowId, record::Record};
use thiserror::Error as ThisError;

///
/// ResponseError
/// Single-result contract violations.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum ResponseError {
    #[error("expected exactly one row, found 0 (entity {entity})")]
    NotFound { entity: String },

    #[error("expected exactly one row, found {count} (entity {entity})")]
    NotUnique { entity: String, count: u32 },
}

///
/// Response
/// Materialized query result: ordered `(RowId, Record)` pairs, one per
/// distinct root identity in first-seen order.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Response {
    entity: String,
    rows: Vec<(RowId, Record)>,
}

impl Response {
    pub(crate) const fn new(entity: String, rows: Vec<(RowId, Record)>) -> Self {
        Self { entity, rows }
    }

    #[must_use]
    pub fn entity(&self) -> &str {
        &self.entity
    }

    /// Number of rows in the response, truncated to `u32`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn count(&self) -> u32 {
        self.rows.len() as u32
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(RowId, Record)> {
        self.rows.iter()
    }

    /// Drop the ids, keeping root records in order.
    #[must_use]
    pub fn records(self) -> Vec<Record> {
        self.rows.into_iter().map(|(_, record)| record).collect()
    }

    /// Require exactly one row.
    pub fn one(self) -> Result<(RowId, Record), ResponseError> {
        let count = self.count();

        match count {
            1 => Ok(self.rows.into_iter().next().expect("count checked")),
            0 => Err(ResponseError::NotFound {
                entity: self.entity,
            }),
            _ => Err(ResponseError::NotUnique {
                entity: self.entity,
                count,
            }),
        }
    }
}

impl IntoIterator for Response {
    type Item = (RowId, Record);
    type IntoIter = std::vec::IntoIter<Self::Item>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.into_iter()
    }
}
