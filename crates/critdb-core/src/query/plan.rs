//! Join compiler.
//!
//! Resolves a builder's navigation arena into an executable join tree,
//! applying the chain rules: ordinary joins compile unconditionally to any
//! depth; fetch joins must reach the root through fetch joins only; one
//! alias cannot be bound twice under the same parent.

use crate::{
    model::Registry,
    query::{CriteriaQuery, JoinType, NodeId, QueryError, predicate::Predicate},
};

///
/// JoinClass
///
/// Ordinary joins extend predicate/selection reach; fetch joins eagerly
/// populate the parent entity's collection association.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum JoinClass {
    Ordinary,
    Fetch,
}

///
/// JoinNode
///
/// One compiled navigation step. `parent` points at the step it navigates
/// from (`NodeId::ROOT` for root-level joins); parents always precede
/// children in the compiled node list.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct JoinNode {
    pub parent: NodeId,
    pub association: String,
    pub target: String,
    pub join_type: JoinType,
    pub class: JoinClass,
    pub alias: String,
}

///
/// CompiledQuery
///
/// {root entity, join tree, optional predicate}. Immutable once produced;
/// re-executable, never re-mutable. Structural equality is meaningful:
/// identical builder call sequences compile to equal values.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CompiledQuery {
    pub root: String,
    pub nodes: Vec<JoinNode>,
    pub predicate: Option<Predicate>,
}

impl CompiledQuery {
    /// Node behind a non-root id.
    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&JoinNode> {
        id.0.checked_sub(1).and_then(|i| self.nodes.get(i))
    }

    /// Entity type sitting at a tree position: the root entity for
    /// `NodeId::ROOT`, otherwise the node's join target.
    #[must_use]
    pub fn entity_at(&self, id: NodeId) -> Option<&str> {
        if id.is_root() {
            Some(&self.root)
        } else {
            self.node(id).map(|n| n.target.as_str())
        }
    }

    /// True when every ancestor of `id` up to the root is a fetch node.
    #[must_use]
    pub fn fetch_chain_to_root(&self, id: NodeId) -> bool {
        let mut current = id;
        while let Some(node) = self.node(current) {
            if node.class != JoinClass::Fetch {
                return false;
            }
            current = node.parent;
        }

        current.is_root()
    }

    /// True when `id` or any of its ancestors is a fetch node.
    #[must_use]
    pub fn crosses_fetch(&self, id: NodeId) -> bool {
        let mut current = id;
        while let Some(node) = self.node(current) {
            if node.class == JoinClass::Fetch {
                return true;
            }
            current = node.parent;
        }

        false
    }
}

impl CriteriaQuery {
    /// Compile the collected intent into a join tree.
    ///
    /// Every navigation is resolved through the registry; rule violations
    /// are reported here, at the earliest statically detectable point.
    pub fn compile(&self, registry: &Registry) -> Result<CompiledQuery, QueryError> {
        registry.entity(&self.root_entity)?;

        let state = self.state.borrow();
        let mut nodes: Vec<JoinNode> = Vec::with_capacity(state.steps.len());

        for step in &state.steps {
            let source = if step.parent.is_root() {
                self.root_entity.clone()
            } else {
                nodes[step.parent.0 - 1].target.clone()
            };
            let association = registry.association(&source, &step.association)?;

            if step.class == JoinClass::Fetch && !step.parent.is_root() {
                let parent = &nodes[step.parent.0 - 1];
                if parent.class == JoinClass::Ordinary {
                    return Err(QueryError::FetchUnderOrdinary {
                        association: step.association.clone(),
                        parent: parent.association.clone(),
                    });
                }
            }

            nodes.push(JoinNode {
                parent: step.parent,
                association: step.association.clone(),
                target: association.target.clone(),
                join_type: step.join_type,
                class: step.class,
                alias: step
                    .alias
                    .clone()
                    .unwrap_or_else(|| step.association.clone()),
            });
        }

        check_alias_uniqueness(&self.root_entity, &nodes)?;

        Ok(CompiledQuery {
            root: self.root_entity.clone(),
            nodes,
            predicate: self.predicate.clone(),
        })
    }
}

// One alias per parent. Fetching and separately filtering the same
// association is legal only under two distinct aliases.
fn check_alias_uniqueness(root_entity: &str, nodes: &[JoinNode]) -> Result<(), QueryError> {
    for (i, node) in nodes.iter().enumerate() {
        for other in &nodes[i + 1..] {
            if node.parent == other.parent && node.alias == other.alias {
                let parent = if node.parent.is_root() {
                    root_entity.to_string()
                } else {
                    nodes[node.parent.0 - 1].association.clone()
                };

                return Err(QueryError::AmbiguousAlias {
                    alias: node.alias.clone(),
                    parent,
                });
            }
        }
    }

    Ok(())
}
