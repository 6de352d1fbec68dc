//! Executor and result materializer.
//!
//! Validates the compiled plan, performs one round-trip against the store
//! to produce the flat fan-out row set, applies the predicate, and
//! reconstructs deduplicated entity graphs: one root record per distinct
//! root identity in first-seen order, collections deduplicated by child
//! identity.

use crate::{
    db::{
        response::Response,
        store::{MemStore, RowId},
    },
    error::Error,
    model::{Cardinality, Registry},
    query::{
        CompareOp, CompiledQuery, JoinType, PathExpr, PlanError, Predicate, validate_query,
    },
    record::Record,
    value::Value,
};
use std::{cmp::Ordering, collections::BTreeSet};

/// One flat result row: slot 0 is the root, slot `i` the row matched by
/// join node `i`. `None` marks a left join with no match.
type FlatRow = Vec<Option<RowId>>;

///
/// Executor
///

pub struct Executor<'a> {
    registry: &'a Registry,
    store: &'a MemStore,
    debug: bool,
}

impl<'a> Executor<'a> {
    #[must_use]
    pub const fn new(registry: &'a Registry, store: &'a MemStore) -> Self {
        Self {
            registry,
            store,
            debug: false,
        }
    }

    #[must_use]
    pub const fn with_debug(mut self) -> Self {
        self.debug = true;
        self
    }

    fn debug_log(&self, s: impl AsRef<str>) {
        if self.debug {
            println!("[debug] {}", s.as_ref());
        }
    }

    /// Execute a compiled query: validate, fan out, filter, materialize.
    pub fn execute(&self, query: &CompiledQuery) -> Result<Response, Error> {
        validate_query(self.registry, query)?;

        self.store.note_round_trip();
        let rows = self.fan_out(query)?;
        self.debug_log(format!(
            "fan-out produced {} rows for root {}",
            rows.len(),
            query.root
        ));

        let mut kept = Vec::with_capacity(rows.len());
        for row in rows {
            let keep = match &query.predicate {
                Some(predicate) => self.matches(query, &row, predicate)?,
                None => true,
            };
            if keep {
                kept.push(row);
            }
        }

        // distinct roots, first-seen order
        let mut seen = BTreeSet::new();
        let mut roots = Vec::new();
        for row in &kept {
            if let Some(id) = row[0]
                && seen.insert(id)
            {
                roots.push(id);
            }
        }

        let mut out = Vec::with_capacity(roots.len());
        for id in roots {
            out.push((id, self.materialize(&query.root, id)?));
        }

        Ok(Response::new(query.root.clone(), out))
    }

    // Left-deep expansion of the join tree into flat rows, one join node
    // at a time. Parents precede children, so the parent slot is always
    // resolved before its dependents.
    fn fan_out(&self, query: &CompiledQuery) -> Result<Vec<FlatRow>, Error> {
        let width = query.nodes.len() + 1;
        let mut rows: Vec<FlatRow> = self
            .store
            .scan(&query.root)
            .map(|row| {
                let mut flat = vec![None; width];
                flat[0] = Some(row.id);
                flat
            })
            .collect();

        for (i, node) in query.nodes.iter().enumerate() {
            let slot = i + 1;
            let source = query
                .entity_at(node.parent)
                .ok_or(PlanError::DanglingParent { node: slot })?;
            let association = self
                .registry
                .association(source, &node.association)
                .map_err(PlanError::Model)?;

            let mut next = Vec::with_capacity(rows.len());
            for mut row in rows {
                let Some(parent_id) = row[node.parent.0] else {
                    // absent source from an earlier unmatched left join
                    if node.join_type == JoinType::Left {
                        next.push(row);
                    }
                    continue;
                };

                match association.cardinality {
                    Cardinality::OneToMany => {
                        let fk = association.mapped_by.as_deref().ok_or_else(|| {
                            PlanError::UnmappedCollection {
                                association: node.association.clone(),
                            }
                        })?;

                        let mut matched = false;
                        for child in self.store.children(&association.target, fk, parent_id) {
                            matched = true;
                            let mut flat = row.clone();
                            flat[slot] = Some(child.id);
                            next.push(flat);
                        }
                        if !matched && node.join_type == JoinType::Left {
                            next.push(row);
                        }
                    }
                    Cardinality::ManyToOne => {
                        let parent_row = self.store.row(source, parent_id)?;
                        match parent_row.refs.get(&node.association) {
                            Some(target_id) => {
                                row[slot] = Some(*target_id);
                                next.push(row);
                            }
                            None => {
                                if node.join_type == JoinType::Left {
                                    next.push(row);
                                }
                            }
                        }
                    }
                }
            }

            rows = next;
        }

        Ok(rows)
    }

    fn matches(
        &self,
        query: &CompiledQuery,
        row: &FlatRow,
        predicate: &Predicate,
    ) -> Result<bool, Error> {
        match predicate {
            Predicate::True => Ok(true),
            Predicate::And(children) => {
                for child in children {
                    if !self.matches(query, row, child)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            Predicate::Or(children) => {
                for child in children {
                    if self.matches(query, row, child)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            Predicate::Not(inner) => Ok(!self.matches(query, row, inner)?),
            Predicate::Compare(cmp) => {
                let value = self.value_at(query, row, &cmp.path)?;
                Ok(value.is_some_and(|v| apply_op(cmp.op, &v, &cmp.value)))
            }
        }
    }

    // Attribute value at a path for one flat row; `None` when the path
    // crosses an unmatched left join or the attribute is unset.
    fn value_at(
        &self,
        query: &CompiledQuery,
        row: &FlatRow,
        path: &PathExpr,
    ) -> Result<Option<Value>, Error> {
        let Some(id) = row.get(path.node.0).copied().flatten() else {
            return Ok(None);
        };
        let entity = query
            .entity_at(path.node)
            .ok_or(PlanError::UnknownPathNode { node: path.node.0 })?;
        let stored = self.store.row(entity, id)?;

        Ok(stored.fields.get(&path.attribute).cloned())
    }

    // Full owned-graph reconstruction for one root identity: collections
    // populated in declaration order, children deduplicated by id.
    fn materialize(&self, entity: &str, id: RowId) -> Result<Record, Error> {
        let row = self.store.row(entity, id)?;
        let mut record = Record::new(entity);
        for (field, value) in &row.fields {
            record.insert_field(field.clone(), value.clone());
        }

        let def = self.registry.entity(entity)?;
        for association in def.collections() {
            let Some(fk) = association.mapped_by.as_deref() else {
                continue;
            };

            let mut children = Vec::new();
            let mut seen = BTreeSet::new();
            for child in self.store.children(&association.target, fk, id) {
                if seen.insert(child.id) {
                    children.push(self.materialize(&association.target, child.id)?);
                }
            }
            record.insert_children(association.name.clone(), children);
        }

        Ok(record)
    }
}

// Missing values never match; cross-family comparisons never match.
fn apply_op(op: CompareOp, left: &Value, right: &Value) -> bool {
    match op {
        CompareOp::Eq => left == right,
        CompareOp::Ne => !left.is_null() && !right.is_null() && left != right,
        CompareOp::Lt => left.compare(right) == Some(Ordering::Less),
        CompareOp::Lte => matches!(
            left.compare(right),
            Some(Ordering::Less | Ordering::Equal)
        ),
        CompareOp::Gt => left.compare(right) == Some(Ordering::Greater),
        CompareOp::Gte => matches!(
            left.compare(right),
            Some(Ordering::Greater | Ordering::Equal)
        ),
    }
}
