use super::*;
use crate::{
    model::{AssociationDef, EntityDef, ModelError, Registry},
    query::predicate::{CompareOp, ComparePredicate, PathExpr},
    value::Value,
};
use proptest::prelude::*;

fn library() -> Registry {
    let mut registry = Registry::new();
    registry
        .register(
            EntityDef::new("Author")
                .attribute("name")
                .association(AssociationDef::one_to_many("books", "Book", "author")),
        )
        .unwrap();
    registry
        .register(
            EntityDef::new("Book")
                .attribute("name")
                .association(AssociationDef::many_to_one("author", "Author"))
                .association(AssociationDef::one_to_many("chapters", "Chapter", "book")),
        )
        .unwrap();
    registry
        .register(
            EntityDef::new("Chapter")
                .attribute("name")
                .association(AssociationDef::many_to_one("book", "Book")),
        )
        .unwrap();

    registry
}

#[test]
fn ordinary_chain_compiles_to_any_depth() {
    let registry = library();
    let query = CriteriaQuery::new("Author");
    let books = query.root().join("books", JoinType::Left);
    let chapters = books.join("chapters", JoinType::Left);
    let query = query.filter(equal(chapters.get("name"), "Overview of HTTP"));

    let compiled = query.compile(&registry).unwrap();

    assert_eq!(compiled.root, "Author");
    assert_eq!(compiled.nodes.len(), 2);
    assert!(compiled.nodes.iter().all(|n| n.class == JoinClass::Ordinary));
    assert_eq!(compiled.nodes[0].target, "Book");
    assert_eq!(compiled.nodes[1].target, "Chapter");
    assert_eq!(compiled.nodes[1].parent, NodeId(1));
    assert!(validate_query(&registry, &compiled).is_ok());
}

#[test]
fn fetch_chain_from_root_compiles() {
    let registry = library();
    let query = CriteriaQuery::new("Author");
    let books = query.root().fetch("books", JoinType::Left);
    let _chapters = books.fetch("chapters", JoinType::Left);

    let compiled = query.compile(&registry).unwrap();

    assert_eq!(compiled.nodes.len(), 2);
    assert!(compiled.nodes.iter().all(|n| n.class == JoinClass::Fetch));
    assert!(compiled.fetch_chain_to_root(NodeId(2)));
    assert!(validate_query(&registry, &compiled).is_ok());
}

#[test]
fn fetch_handle_rejects_ordinary_chaining() {
    let registry = library();
    let query = CriteriaQuery::new("Author");
    let books = query.root().fetch("books", JoinType::Left);

    let err = books.join_list("chapters", JoinType::Left).unwrap_err();
    assert_eq!(
        err,
        QueryError::IllegalJoinShape {
            fetched: "books".to_string(),
            attempted: "chapters".to_string(),
        }
    );

    // the rejected call must not have touched the arena
    let compiled = query.compile(&registry).unwrap();
    assert_eq!(compiled.nodes.len(), 1);
    assert!(validate_query(&registry, &compiled).is_ok());
}

#[test]
fn fetch_under_ordinary_join_is_rejected_at_compile() {
    let registry = library();
    let query = CriteriaQuery::new("Author");
    let books = query.root().join("books", JoinType::Left);
    let _chapters = books.fetch("chapters", JoinType::Left);

    let err = query.compile(&registry).unwrap_err();
    assert_eq!(
        err,
        QueryError::FetchUnderOrdinary {
            association: "chapters".to_string(),
            parent: "books".to_string(),
        }
    );
}

#[test]
fn same_association_fetched_and_joined_needs_distinct_aliases() {
    let registry = library();

    let query = CriteriaQuery::new("Author");
    let _fetched = query.root().fetch("books", JoinType::Left);
    let _joined = query.root().join("books", JoinType::Left);
    let err = query.compile(&registry).unwrap_err();
    assert_eq!(
        err,
        QueryError::AmbiguousAlias {
            alias: "books".to_string(),
            parent: "Author".to_string(),
        }
    );

    let query = CriteriaQuery::new("Author");
    let _fetched = query.root().fetch("books", JoinType::Left);
    let joined = query.root().join_as("books", JoinType::Left, Some("b"));
    let query = query.filter(equal(joined.get("name"), "HTTP Definitive guide"));
    let compiled = query.compile(&registry).unwrap();
    assert_eq!(compiled.nodes.len(), 2);
    assert!(validate_query(&registry, &compiled).is_ok());
}

#[test]
fn unknown_association_fails_at_compile() {
    let registry = library();
    let query = CriteriaQuery::new("Author");
    let _publishers = query.root().join("publishers", JoinType::Inner);

    let err = query.compile(&registry).unwrap_err();
    assert_eq!(
        err,
        QueryError::Model(ModelError::UnknownAssociation {
            entity: "Author".to_string(),
            association: "publishers".to_string(),
        })
    );
}

#[test]
fn identical_builder_chains_compile_equal() {
    let registry = library();

    let build = || {
        let query = CriteriaQuery::new("Author");
        let books = query.root().join("books", JoinType::Left);
        let chapters = books.join("chapters", JoinType::Left);
        query.filter(equal(chapters.get("name"), "Overview of HTTP"))
    };

    let first = build().compile(&registry).unwrap();
    let second = build().compile(&registry).unwrap();

    assert_eq!(first, second);
    assert_eq!(
        validate_query(&registry, &first),
        validate_query(&registry, &second)
    );
}

#[test]
fn validator_rejects_hand_built_fetch_under_ordinary() {
    let registry = library();
    let compiled = CompiledQuery {
        root: "Author".to_string(),
        nodes: vec![
            JoinNode {
                parent: NodeId::ROOT,
                association: "books".to_string(),
                target: "Book".to_string(),
                join_type: JoinType::Left,
                class: JoinClass::Ordinary,
                alias: "books".to_string(),
            },
            JoinNode {
                parent: NodeId(1),
                association: "chapters".to_string(),
                target: "Chapter".to_string(),
                join_type: JoinType::Left,
                class: JoinClass::Fetch,
                alias: "chapters".to_string(),
            },
        ],
        predicate: None,
    };

    assert_eq!(
        validate_query(&registry, &compiled),
        Err(PlanError::FetchUnderOrdinary {
            association: "chapters".to_string(),
        })
    );
}

#[test]
fn validator_rejects_predicate_through_fetch() {
    let registry = library();
    let compiled = CompiledQuery {
        root: "Author".to_string(),
        nodes: vec![JoinNode {
            parent: NodeId::ROOT,
            association: "books".to_string(),
            target: "Book".to_string(),
            join_type: JoinType::Left,
            class: JoinClass::Fetch,
            alias: "books".to_string(),
        }],
        predicate: Some(Predicate::Compare(ComparePredicate {
            path: PathExpr::new(NodeId(1), "name"),
            op: CompareOp::Eq,
            value: Value::from("HTTP Definitive guide"),
        })),
    };

    assert_eq!(
        validate_query(&registry, &compiled),
        Err(PlanError::FetchPathFiltered {
            association: "books".to_string(),
        })
    );
}

#[test]
fn validator_rejects_unknown_predicate_attribute() {
    let registry = library();
    let query = CriteriaQuery::new("Author");
    let path = query.root().get("pen_name");
    let compiled = query
        .filter(equal(path, "nom de plume"))
        .compile(&registry)
        .unwrap();

    assert_eq!(
        validate_query(&registry, &compiled),
        Err(PlanError::Model(ModelError::UnknownAttribute {
            entity: "Author".to_string(),
            attribute: "pen_name".to_string(),
        }))
    );
}

#[test]
fn validator_rejects_dangling_parent() {
    let registry = library();
    let compiled = CompiledQuery {
        root: "Author".to_string(),
        nodes: vec![JoinNode {
            parent: NodeId(7),
            association: "books".to_string(),
            target: "Book".to_string(),
            join_type: JoinType::Left,
            class: JoinClass::Ordinary,
            alias: "books".to_string(),
        }],
        predicate: None,
    };

    assert_eq!(
        validate_query(&registry, &compiled),
        Err(PlanError::DanglingParent { node: 1 })
    );
}

#[test]
fn predicate_combinators_build_expected_tree() {
    let query = CriteriaQuery::new("Author");
    let root = query.root();
    let predicate = equal(root.get("name"), "David Gourley")
        .and(not(equal(root.get("name"), "nobody")));

    let Predicate::And(children) = predicate else {
        panic!("expected conjunction");
    };
    assert_eq!(children.len(), 2);
    assert!(matches!(children[1], Predicate::Not(_)));
}

proptest! {
    // Compiling the same chain twice is idempotent for any depth and any
    // mix of join types.
    #[test]
    fn compile_is_idempotent(
        depth in 1usize..=2,
        fetch in any::<bool>(),
        left in any::<bool>(),
    ) {
        let registry = library();
        let join_type = if left { JoinType::Left } else { JoinType::Inner };

        let build = || {
            let query = CriteriaQuery::new("Author");
            if fetch {
                let books = query.root().fetch("books", join_type);
                if depth > 1 {
                    let _chapters = books.fetch("chapters", join_type);
                }
            } else {
                let books = query.root().join("books", join_type);
                if depth > 1 {
                    let _chapters = books.join("chapters", join_type);
                }
            }
            query
        };

        let first = build().compile(&registry).unwrap();
        let second = build().compile(&registry).unwrap();

        prop_assert_eq!(&first, &second);
        prop_assert_eq!(
            validate_query(&registry, &first),
            validate_query(&registry, &second)
        );
    }
}
