//! Query validator.
//!
//! Walks a compiled join tree before execution and confirms it is shaped
//! legally: structural integrity, fetch ancestry, alias uniqueness, and
//! predicate-path reach. Compile-time rules are re-checked here so that
//! hand-built `CompiledQuery` values get the same rejections as
//! builder-produced ones.

use crate::{
    model::{Cardinality, ModelError, Registry},
    query::{CompiledQuery, JoinClass, NodeId},
};
use thiserror::Error as ThisError;

///
/// PlanError
///
/// Structured rejection naming the offending node and the violated rule.
/// These indicate an illegal query shape, never a storage failure.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum PlanError {
    #[error(transparent)]
    Model(#[from] ModelError),

    /// A join node's parent does not precede it in the tree.
    #[error("join node {node} references a parent that does not precede it")]
    DanglingParent { node: usize },

    /// The compiled target disagrees with the registry's association target.
    #[error("join '{association}' compiled against target '{found}', registry says '{expected}'")]
    TargetMismatch {
        association: String,
        expected: String,
        found: String,
    },

    /// A fetch node has an ordinary-join ancestor.
    #[error("fetch join '{association}' is not reachable from the root through fetch joins only")]
    FetchUnderOrdinary { association: String },

    /// One alias bound twice under the same parent.
    #[error("alias '{alias}' is bound more than once under '{parent}'")]
    DuplicateAlias { alias: String, parent: String },

    /// A one-to-many join has no owning foreign key to navigate.
    #[error("one-to-many association '{association}' has no mapped_by owner")]
    UnmappedCollection { association: String },

    /// The predicate references a node outside the join tree.
    #[error("predicate path references missing join node {node}")]
    UnknownPathNode { node: usize },

    /// The predicate filters through a fetch join.
    #[error("predicate path references fetch join '{association}'; fetch results are not filterable")]
    FetchPathFiltered { association: String },
}

/// Validate a compiled query against the entity graph model.
pub fn validate_query(registry: &Registry, query: &CompiledQuery) -> Result<(), PlanError> {
    registry.entity(&query.root)?;

    for (i, node) in query.nodes.iter().enumerate() {
        let id = NodeId(i + 1);

        if node.parent >= id {
            return Err(PlanError::DanglingParent { node: id.0 });
        }

        // parent precedes the node, so entity_at cannot miss
        let source = query
            .entity_at(node.parent)
            .ok_or(PlanError::DanglingParent { node: id.0 })?;
        let association = registry.association(source, &node.association)?;

        if association.target != node.target {
            return Err(PlanError::TargetMismatch {
                association: node.association.clone(),
                expected: association.target.clone(),
                found: node.target.clone(),
            });
        }

        if association.cardinality == Cardinality::OneToMany && association.mapped_by.is_none() {
            return Err(PlanError::UnmappedCollection {
                association: node.association.clone(),
            });
        }

        if node.class == JoinClass::Fetch && !query.fetch_chain_to_root(id) {
            return Err(PlanError::FetchUnderOrdinary {
                association: node.association.clone(),
            });
        }
    }

    check_aliases(query)?;
    check_predicate_paths(registry, query)?;

    Ok(())
}

fn check_aliases(query: &CompiledQuery) -> Result<(), PlanError> {
    for (i, node) in query.nodes.iter().enumerate() {
        for other in &query.nodes[i + 1..] {
            if node.parent == other.parent && node.alias == other.alias {
                let parent = if node.parent.is_root() {
                    query.root.clone()
                } else {
                    query.nodes[node.parent.0 - 1].association.clone()
                };

                return Err(PlanError::DuplicateAlias {
                    alias: node.alias.clone(),
                    parent,
                });
            }
        }
    }

    Ok(())
}

// Every predicate path must land on the root or an ordinary-reachable
// node, and its attribute must exist on that entity.
fn check_predicate_paths(registry: &Registry, query: &CompiledQuery) -> Result<(), PlanError> {
    let Some(predicate) = &query.predicate else {
        return Ok(());
    };

    let mut failure: Option<PlanError> = None;
    predicate.for_each_path(&mut |path| {
        if failure.is_some() {
            return;
        }

        let Some(entity) = query.entity_at(path.node) else {
            failure = Some(PlanError::UnknownPathNode { node: path.node.0 });
            return;
        };

        if query.crosses_fetch(path.node) {
            let association = query
                .node(path.node)
                .map_or_else(String::new, |n| n.association.clone());
            failure = Some(PlanError::FetchPathFiltered { association });
            return;
        }

        if let Err(err) = registry.attribute(entity, &path.attribute) {
            failure = Some(PlanError::Model(err));
        }
    });

    failure.map_or(Ok(()), Err)
}
