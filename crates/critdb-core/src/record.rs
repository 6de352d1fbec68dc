use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

///
/// Record
///
/// API-level entity graph node: scalar attributes plus ordered child
/// collections keyed by one-to-many association name.
///
/// Used in both directions: as persist input (the caller builds the graph
/// top-down and the session cascades through it) and as materialized query
/// output (the executor reconstructs one record per distinct root identity).
/// Surrogate row ids are carried alongside records, never inside them.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Record {
    entity: String,
    fields: BTreeMap<String, Value>,
    children: BTreeMap<String, Vec<Record>>,
}

impl Record {
    #[must_use]
    pub fn new(entity: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            fields: BTreeMap::new(),
            children: BTreeMap::new(),
        }
    }

    /// Set a scalar attribute, replacing any previous value.
    #[must_use]
    pub fn set(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(field.into(), value.into());
        self
    }

    /// Append a child under a one-to-many association, preserving order.
    #[must_use]
    pub fn child(mut self, association: impl Into<String>, child: Self) -> Self {
        self.children.entry(association.into()).or_default().push(child);
        self
    }

    #[must_use]
    pub fn entity(&self) -> &str {
        &self.entity
    }

    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Children under an association; empty when none were attached.
    #[must_use]
    pub fn children(&self, association: &str) -> &[Self] {
        self.children
            .get(association)
            .map_or(&[], Vec::as_slice)
    }

    #[must_use]
    pub const fn fields(&self) -> &BTreeMap<String, Value> {
        &self.fields
    }

    pub(crate) fn child_associations(&self) -> impl Iterator<Item = (&String, &Vec<Self>)> {
        self.children.iter()
    }

    pub(crate) fn insert_field(&mut self, field: String, value: Value) {
        self.fields.insert(field, value);
    }

    pub(crate) fn insert_children(&mut self, association: String, children: Vec<Self>) {
        self.children.insert(association, children);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn child_order_is_preserved() {
        let record = Record::new("Author")
            .child("books", Record::new("Book").set("name", "first"))
            .child("books", Record::new("Book").set("name", "second"));

        let names: Vec<_> = record
            .children("books")
            .iter()
            .map(|b| b.get("name").cloned())
            .collect();

        assert_eq!(
            names,
            vec![Some(Value::from("first")), Some(Value::from("second"))]
        );
    }

    #[test]
    fn missing_association_is_empty() {
        assert!(Record::new("Author").children("books").is_empty());
    }
}
