//! Criteria expression builder.
//!
//! Typed, string-free construction of query intent. Handles are cheap
//! clones over a shared navigation arena; the query root is `NodeId::ROOT`
//! and every `join`/`fetch` call appends one immutable arena node. No
//! schema access happens here; association names are resolved against the
//! registry during `compile`.
//!
//! The join-kind split is a closed sum: `Fetch` exposes no ordinary
//! chaining and no attribute paths, so "filter through a fetch join" is
//! unrepresentable in the typed API. The one dynamic escape hatch,
//! [`Fetch::join_list`], reproduces the historical reinterpretation of a
//! fetch handle as a join handle and always fails fast.

use crate::query::{
    JoinType, NodeId, QueryError,
    plan::JoinClass,
    predicate::{PathExpr, Predicate},
};
use std::{cell::RefCell, rc::Rc};

///
/// NavStep
///
/// One arena entry: an edge traversal from the parent node's entity via a
/// named association. Join kind and class are fixed at construction.
///

#[derive(Clone, Debug)]
pub(crate) struct NavStep {
    pub(crate) parent: NodeId,
    pub(crate) association: String,
    pub(crate) join_type: JoinType,
    pub(crate) class: JoinClass,
    pub(crate) alias: Option<String>,
}

#[derive(Debug, Default)]
pub(crate) struct BuilderState {
    pub(crate) steps: Vec<NavStep>,
}

impl BuilderState {
    fn push(&mut self, step: NavStep) -> NodeId {
        self.steps.push(step);

        NodeId(self.steps.len())
    }
}

fn push_step(
    state: &Rc<RefCell<BuilderState>>,
    parent: NodeId,
    association: impl Into<String>,
    join_type: JoinType,
    class: JoinClass,
    alias: Option<String>,
) -> NodeId {
    state.borrow_mut().push(NavStep {
        parent,
        association: association.into(),
        join_type,
        class,
        alias,
    })
}

///
/// CriteriaQuery
///
/// Declarative query intent over a root entity type. Collects navigation
/// steps (through handles) and predicates; `compile` resolves the intent
/// into an immutable `CompiledQuery` join tree.
///

#[derive(Debug)]
pub struct CriteriaQuery {
    pub(crate) root_entity: String,
    pub(crate) state: Rc<RefCell<BuilderState>>,
    pub(crate) predicate: Option<Predicate>,
}

impl CriteriaQuery {
    #[must_use]
    pub fn new(root_entity: impl Into<String>) -> Self {
        Self {
            root_entity: root_entity.into(),
            state: Rc::new(RefCell::new(BuilderState::default())),
            predicate: None,
        }
    }

    /// Handle over the query root, for joining and path construction.
    #[must_use]
    pub fn root(&self) -> Root {
        Root {
            state: Rc::clone(&self.state),
        }
    }

    #[must_use]
    pub fn root_entity(&self) -> &str {
        &self.root_entity
    }

    /// Add a predicate, implicitly AND-ing with any existing predicate.
    #[must_use]
    pub fn filter(mut self, predicate: Predicate) -> Self {
        self.predicate = Some(match self.predicate.take() {
            Some(existing) => existing.and(predicate),
            None => predicate,
        });
        self
    }
}

///
/// Root
///

#[derive(Clone, Debug)]
pub struct Root {
    state: Rc<RefCell<BuilderState>>,
}

impl Root {
    /// Ordinary join off the root.
    #[must_use]
    pub fn join(&self, association: impl Into<String>, join_type: JoinType) -> Join {
        self.join_as(association, join_type, None)
    }

    /// Ordinary join off the root under an explicit alias.
    #[must_use]
    pub fn join_as(
        &self,
        association: impl Into<String>,
        join_type: JoinType,
        alias: Option<&str>,
    ) -> Join {
        Join {
            state: Rc::clone(&self.state),
            node: push_step(
                &self.state,
                NodeId::ROOT,
                association,
                join_type,
                JoinClass::Ordinary,
                alias.map(str::to_string),
            ),
        }
    }

    /// Fetch join off the root: eagerly populates the named collection on
    /// the materialized root entity.
    #[must_use]
    pub fn fetch(&self, association: impl Into<String>, join_type: JoinType) -> Fetch {
        self.fetch_as(association, join_type, None)
    }

    /// Fetch join off the root under an explicit alias.
    #[must_use]
    pub fn fetch_as(
        &self,
        association: impl Into<String>,
        join_type: JoinType,
        alias: Option<&str>,
    ) -> Fetch {
        Fetch {
            state: Rc::clone(&self.state),
            node: push_step(
                &self.state,
                NodeId::ROOT,
                association,
                join_type,
                JoinClass::Fetch,
                alias.map(str::to_string),
            ),
        }
    }

    /// Attribute path on the root entity.
    #[must_use]
    pub fn get(&self, attribute: impl Into<String>) -> PathExpr {
        PathExpr::new(NodeId::ROOT, attribute)
    }
}

///
/// Join
///
/// Ordinary-join handle: extends predicate/selection reach, carries no
/// collection-materialization obligation, and chains to arbitrary depth.
///

#[derive(Clone, Debug)]
pub struct Join {
    state: Rc<RefCell<BuilderState>>,
    pub(crate) node: NodeId,
}

impl Join {
    /// Chain a further ordinary join.
    #[must_use]
    pub fn join(&self, association: impl Into<String>, join_type: JoinType) -> Self {
        self.join_as(association, join_type, None)
    }

    /// Chain a further ordinary join under an explicit alias.
    #[must_use]
    pub fn join_as(
        &self,
        association: impl Into<String>,
        join_type: JoinType,
        alias: Option<&str>,
    ) -> Self {
        Self {
            state: Rc::clone(&self.state),
            node: push_step(
                &self.state,
                self.node,
                association,
                join_type,
                JoinClass::Ordinary,
                alias.map(str::to_string),
            ),
        }
    }

    /// Request a fetch join under this ordinary join. Representable for
    /// compatibility with hand-built trees, but always rejected at compile
    /// time: a fetch chain must reach the root through fetch joins only.
    #[must_use]
    pub fn fetch(&self, association: impl Into<String>, join_type: JoinType) -> Fetch {
        Fetch {
            state: Rc::clone(&self.state),
            node: push_step(
                &self.state,
                self.node,
                association,
                join_type,
                JoinClass::Fetch,
                None,
            ),
        }
    }

    /// Attribute path on this join's target entity.
    #[must_use]
    pub fn get(&self, attribute: impl Into<String>) -> PathExpr {
        PathExpr::new(self.node, attribute)
    }
}

///
/// Fetch
///
/// Fetch-join handle. Its association is bound to populate the parent
/// entity's collection in the materialized result; it is not an
/// independently addressable relation, so no `get` and no ordinary
/// chaining exist here.
///

#[derive(Clone, Debug)]
pub struct Fetch {
    state: Rc<RefCell<BuilderState>>,
    pub(crate) node: NodeId,
}

impl Fetch {
    /// Chain a further fetch join; the chain still describes one coherent
    /// eager-loading graph rooted at the query root.
    #[must_use]
    pub fn fetch(&self, association: impl Into<String>, join_type: JoinType) -> Self {
        self.fetch_as(association, join_type, None)
    }

    /// Chain a further fetch join under an explicit alias.
    #[must_use]
    pub fn fetch_as(
        &self,
        association: impl Into<String>,
        join_type: JoinType,
        alias: Option<&str>,
    ) -> Self {
        Self {
            state: Rc::clone(&self.state),
            node: push_step(
                &self.state,
                self.node,
                association,
                join_type,
                JoinClass::Fetch,
                alias.map(str::to_string),
            ),
        }
    }

    /// Use this fetch handle as an ordinary-join source.
    ///
    /// This is the historical defect surface: reinterpreting a fetch join
    /// as a join handle and chaining a filter-only join from it. The fetch
    /// result is not independently joinable, so this fails at build time
    /// and never reaches storage.
    pub fn join_list(
        &self,
        association: impl Into<String>,
        _join_type: JoinType,
    ) -> Result<Join, QueryError> {
        let fetched = self
            .state
            .borrow()
            .steps
            .get(self.node.0 - 1)
            .map_or_else(String::new, |step| step.association.clone());

        Err(QueryError::IllegalJoinShape {
            fetched,
            attempted: association.into(),
        })
    }
}
