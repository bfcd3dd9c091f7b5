use crate::{
    access::{Account, ContentType, OP_UPDATE, QueryAccessHandler, build_filter},
    cache::{CacheMetadata, USER_PERMISSIONS},
    compile::{
        CompileError, CompileReport, EntityQueryCompiler, ListingQueryCompiler, QueryAccessOptions,
        QueryCompiler, TableMapping, apply_query_access,
    },
    config::CompileOptions,
    error::ErrorClass,
    filter::{CompareOp, FilterError, FilterTree, Predicate},
    hook::{QueryAccessEvent, SubscriberRegistry},
    query::{JoinKind, JoinSpec, ListingQuery, QueryTarget, SelectQuery},
    test_fixtures::{account, content_type, node_mapping},
    value::Value,
};
use proptest::prelude::*;

fn entity() -> EntityQueryCompiler<TableMapping> {
    EntityQueryCompiler::new(node_mapping())
}

fn listing() -> ListingQueryCompiler<TableMapping> {
    ListingQueryCompiler::new(node_mapping())
}

fn compile_node(tree: &FilterTree) -> (SelectQuery, CompileReport) {
    let mut query = SelectQuery::new("node");
    let report = entity()
        .compile(tree, &mut query, false)
        .expect("tree compiles");

    (query, report)
}

fn join_kind(query: &SelectQuery, alias: &str) -> Option<JoinKind> {
    query
        .joins()
        .iter()
        .find(|join| join.alias == alias)
        .map(|join| join.kind)
}

//
// shared walk
//

#[test]
fn always_false_tree_emits_one_false_clause_and_no_joins() {
    let mut tree = FilterTree::or()
        .with(Predicate::equals("field_tags", 1))
        .with(Predicate::equals("status", 1));
    tree.mark_always_false(true);

    let (query, report) = compile_node(&tree);
    assert_eq!(query.render().sql, "SELECT node.* FROM node node WHERE 1 = 0");
    assert!(query.joins().is_empty());
    assert_eq!(report.clauses, 1);
    assert!(report.always_false);

    let mut listing_query = ListingQuery::new("node_field_data");
    let report = listing()
        .compile(&tree, &mut listing_query, false)
        .expect("tree compiles");
    assert_eq!(
        listing_query.render().sql,
        "SELECT node_field_data.* FROM node_field_data node_field_data WHERE 1 = 0"
    );
    assert!(listing_query.joins().is_empty());
    assert_eq!(report.clauses, 1);
}

#[test]
fn empty_tree_adds_nothing() {
    let (query, report) = compile_node(&FilterTree::or());

    assert_eq!(query.render().sql, "SELECT node.* FROM node node");
    assert!(report.is_unrestricted());
}

#[test]
fn owner_bundle_tree_compiles_against_data_and_base_tables() {
    let tree = build_filter(
        OP_UPDATE,
        &content_type(),
        &account(&["update own page content"]),
    )
    .expect("content builds");

    let (query, report) = compile_node(&tree);
    let rendered = query.render();

    assert_eq!(
        rendered.sql,
        "SELECT node.* FROM node node \
         INNER JOIN node_field_data node_field_data ON node.nid = node_field_data.nid \
         WHERE (node_field_data.uid = ? AND node.type IN (?))"
    );
    assert_eq!(rendered.params, vec![Value::Uint(7), Value::from("page")]);
    assert_eq!(report.clauses, 2);
    assert_eq!(report.joins, ["node_field_data"]);
}

#[test]
fn dedicated_field_under_or_uses_left_join() {
    let tree = FilterTree::or()
        .with(Predicate::equals("field_tags", 5))
        .with(Predicate::equals("status", 1));

    let (query, _) = compile_node(&tree);

    assert_eq!(
        query.render().sql,
        "SELECT node.* FROM node node \
         LEFT JOIN node__field_tags node__field_tags ON node.nid = node__field_tags.entity_id \
         INNER JOIN node_field_data node_field_data ON node.nid = node_field_data.nid \
         WHERE (node__field_tags.field_tags_target_id = ? OR node_field_data.status = ?)"
    );
}

#[test]
fn dedicated_field_under_and_uses_inner_join_unless_null_check() {
    let tree = FilterTree::and()
        .with(Predicate::equals("field_tags", 5))
        .with(Predicate::is_null("body"));

    let (query, _) = compile_node(&tree);

    assert_eq!(join_kind(&query, "node__field_tags"), Some(JoinKind::Inner));
    assert_eq!(join_kind(&query, "node__body"), Some(JoinKind::Left));
    assert!(query.render().sql.ends_with(
        "WHERE (node__field_tags.field_tags_target_id = ? AND node__body.body_value IS NULL)"
    ));
}

#[test]
fn or_context_reaches_nested_and_groups() {
    let nested = FilterTree::and()
        .with(Predicate::equals("field_tags", 1))
        .with(Predicate::equals("nid", 2));
    let tree = FilterTree::or()
        .with(nested)
        .with(Predicate::equals("status", 1));

    let (query, _) = compile_node(&tree);

    assert_eq!(join_kind(&query, "node__field_tags"), Some(JoinKind::Left));
    assert!(query.render().sql.ends_with(
        "WHERE ((node__field_tags.field_tags_target_id = ? AND node.nid = ?) \
         OR node_field_data.status = ?)"
    ));
}

#[test]
fn field_referenced_twice_reuses_its_join() {
    let tree = FilterTree::and()
        .with(Predicate::equals("field_tags", 1))
        .with(Predicate::is_not_null("field_tags.target_id"));

    let (query, report) = compile_node(&tree);

    assert_eq!(query.joins().len(), 1);
    assert_eq!(join_kind(&query, "node__field_tags"), Some(JoinKind::Left));
    assert_eq!(report.joins, ["node__field_tags"]);
    assert_eq!(report.clauses, 2);
}

#[test]
fn multi_property_fields_resolve_named_properties() {
    let tree = FilterTree::and().with(Predicate::equals("body.format", "basic_html"));

    let (query, _) = compile_node(&tree);

    assert!(
        query
            .render()
            .sql
            .ends_with("WHERE node__body.body_format = ?")
    );
}

#[test]
fn existing_data_table_join_is_reused() {
    let mut query = SelectQuery::new("node");
    query.ensure_join(JoinSpec::new(
        "node_field_data",
        JoinKind::Left,
        "node.nid",
        "nid",
    ));
    let tree = FilterTree::and().with(Predicate::equals("status", 1));

    let report = entity()
        .compile(&tree, &mut query, false)
        .expect("tree compiles");

    assert_eq!(query.joins().len(), 1);
    assert_eq!(join_kind(&query, "node_field_data"), Some(JoinKind::Left));
    assert!(report.joins.is_empty());
}

#[test]
fn revision_scoped_compile_uses_revision_tables() {
    let tree = FilterTree::and()
        .with(Predicate::equals("field_tags", 1))
        .with(Predicate::equals("status", 1))
        .with(Predicate::equals("type", "page"));
    let mut query = SelectQuery::new("node_revision");

    entity()
        .compile(&tree, &mut query, true)
        .expect("tree compiles");

    assert_eq!(
        query.render().sql,
        "SELECT node_revision.* FROM node_revision node_revision \
         INNER JOIN node_revision__field_tags node_revision__field_tags \
         ON node_revision.vid = node_revision__field_tags.revision_id \
         INNER JOIN node_field_revision node_field_revision \
         ON node_revision.vid = node_field_revision.vid \
         WHERE (node_revision__field_tags.field_tags_target_id = ? \
         AND node_field_revision.status = ? AND node_revision.type = ?)"
    );
}

#[test]
fn nested_always_false_subtree_becomes_false_expression() {
    let mut denied = FilterTree::and()
        .with(Predicate::equals("nid", 1))
        .with(Predicate::equals("nid", 2));
    denied.mark_always_false(true);
    let tree = FilterTree::or()
        .with(Predicate::equals("status", 1))
        .with(denied);

    let (query, report) = compile_node(&tree);

    assert!(
        query
            .render()
            .sql
            .ends_with("WHERE (node_field_data.status = ? OR 1 = 0)")
    );
    assert_eq!(report.clauses, 2);
    assert!(!report.always_false);
}

//
// operands and the LIKE rewrite
//

#[test]
fn case_insensitive_equality_becomes_escaped_like() {
    let tree = FilterTree::and().with(Predicate::equals("title", "50%_off"));

    let (query, _) = compile_node(&tree);
    let rendered = query.render();

    assert!(
        rendered
            .sql
            .ends_with("WHERE node_field_data.title LIKE ? ESCAPE '\\'")
    );
    assert_eq!(rendered.params, vec![Value::from("50\\%\\_off")]);
}

#[test]
fn case_insensitive_inequality_becomes_not_like() {
    let tree = FilterTree::and().with(Predicate::with_op("title", "Draft", CompareOp::Ne));

    let (query, _) = compile_node(&tree);

    assert!(
        query
            .render()
            .sql
            .ends_with("WHERE node_field_data.title NOT LIKE ? ESCAPE '\\'")
    );
}

#[test]
fn like_rewrite_can_be_disabled() {
    let options = CompileOptions {
        case_insensitive_like: false,
        ..CompileOptions::default()
    };
    let tree = FilterTree::and().with(Predicate::equals("title", "Hello"));
    let mut query = SelectQuery::new("node");

    entity()
        .with_options(options)
        .compile(&tree, &mut query, false)
        .expect("tree compiles");

    assert!(
        query
            .render()
            .sql
            .ends_with("WHERE node_field_data.title = ?")
    );
}

#[test]
fn like_rewrite_skips_case_sensitive_and_non_text_operands() {
    let tree = FilterTree::and()
        .with(Predicate::equals("type", "page"))
        .with(Predicate::equals("title", 5));

    let (query, _) = compile_node(&tree);

    assert!(
        query
            .render()
            .sql
            .ends_with("WHERE (node.type = ? AND node_field_data.title = ?)")
    );
}

#[test]
fn scalar_in_operand_becomes_single_item_list() {
    let tree = FilterTree::and().with(Predicate::with_op("nid", 5, CompareOp::In));

    let (query, _) = compile_node(&tree);
    let rendered = query.render();

    assert!(rendered.sql.ends_with("WHERE node.nid IN (?)"));
    assert_eq!(rendered.params, vec![Value::from(5)]);
}

#[test]
fn between_requires_two_item_list() {
    let tree = FilterTree::and().with(Predicate::with_op("nid", 5, CompareOp::Between));
    let mut query = SelectQuery::new("node");

    let err = entity()
        .compile(&tree, &mut query, false)
        .expect_err("scalar between fails");
    assert_eq!(
        err,
        CompileError::InvalidOperand {
            field: "nid".to_string(),
            op: CompareOp::Between,
        }
    );

    let tree = FilterTree::and().with(Predicate::with_op("nid", vec![1, 9], CompareOp::Between));
    let (query, _) = compile_node(&tree);
    assert!(query.render().sql.ends_with("WHERE node.nid BETWEEN ? AND ?"));
}

#[test]
fn malformed_field_reference_fails() {
    let tree = FilterTree::and().with(Predicate::equals("uid.", 1));
    let mut query = SelectQuery::new("node");

    let err = listing()
        .compile(&tree, &mut query, false)
        .expect_err("malformed reference fails");
    assert_eq!(
        err,
        CompileError::Filter(FilterError::InvalidFieldReference {
            field: "uid.".to_string()
        })
    );
}

//
// unknown fields
//

#[test]
fn entity_backend_rejects_unknown_fields() {
    let tree = FilterTree::and()
        .with(Predicate::equals("status", 1))
        .with(Predicate::equals("legacy", 1));
    let mut query = SelectQuery::new("node");

    let err = entity()
        .compile(&tree, &mut query, false)
        .expect_err("unknown field fails");
    assert_eq!(
        err,
        CompileError::UnknownField {
            field: "legacy".to_string()
        }
    );
}

#[test]
fn entity_backend_rejects_unknown_properties() {
    let tree = FilterTree::and().with(Predicate::equals("status.target_id", 1));
    let mut query = SelectQuery::new("node");

    assert!(matches!(
        entity().compile(&tree, &mut query, false),
        Err(CompileError::UnknownField { field }) if field == "status.target_id"
    ));
}

#[test]
fn listing_backend_skips_unknown_fields() {
    let tree = FilterTree::and()
        .with(Predicate::equals("legacy", 1))
        .with(Predicate::equals("status", 1));
    let mut query = ListingQuery::new("node_field_data");

    let report = listing()
        .compile(&tree, &mut query, false)
        .expect("unknown fields are skipped");

    assert_eq!(report.skipped_fields, ["legacy"]);
    assert_eq!(report.clauses, 1);
    assert_eq!(
        query.render().sql,
        "SELECT node_field_data.* FROM node_field_data node_field_data \
         WHERE node_field_data.status = ?"
    );
}

#[test]
fn listing_backend_drops_a_tree_of_only_unknown_fields() {
    let tree = FilterTree::or()
        .with(Predicate::equals("legacy", 1))
        .with(Predicate::equals("renamed", 2));
    let mut query = ListingQuery::new("node_field_data");

    let report = listing()
        .compile(&tree, &mut query, false)
        .expect("unknown fields are skipped");

    assert_eq!(report.skipped_fields, ["legacy", "renamed"]);
    assert!(report.is_unrestricted());
    assert_eq!(query.render().params, Vec::new());
}

//
// listing relationships
//

#[test]
fn listing_backend_joins_base_table_fields_from_data_table() {
    let tree = FilterTree::and().with(Predicate::equals("type", "page"));
    let mut query = ListingQuery::new("node_field_data");

    listing()
        .compile(&tree, &mut query, false)
        .expect("tree compiles");

    assert_eq!(
        query.render().sql,
        "SELECT node_field_data.* FROM node_field_data node_field_data \
         INNER JOIN node node ON node_field_data.nid = node.nid \
         WHERE node.type = ?"
    );
}

#[test]
fn listing_backend_anchors_on_relationship() {
    let mut query = ListingQuery::new("comment_field_data");
    query
        .add_relationship(
            "node",
            None,
            "node_field_data",
            JoinKind::Inner,
            ("entity_id", "nid"),
        )
        .expect("relationship registers");
    let tree = FilterTree::or()
        .with(Predicate::equals("uid", 7))
        .with(Predicate::equals("field_tags", 3));

    let report = listing()
        .with_relationship("node")
        .compile(&tree, &mut query, false)
        .expect("tree compiles");

    assert_eq!(
        query.render().sql,
        "SELECT comment_field_data.* FROM comment_field_data comment_field_data \
         INNER JOIN node_field_data node_field_data \
         ON comment_field_data.entity_id = node_field_data.nid \
         LEFT JOIN node__field_tags node_field_data_node__field_tags \
         ON node_field_data.nid = node_field_data_node__field_tags.entity_id \
         WHERE (node_field_data.uid = ? \
         OR node_field_data_node__field_tags.field_tags_target_id = ?)"
    );
    assert_eq!(report.joins, ["node_field_data_node__field_tags"]);
}

#[test]
fn listing_backend_rejects_unknown_relationship() {
    let mut query = ListingQuery::new("node_field_data");

    let err = listing()
        .with_relationship("author")
        .compile(&FilterTree::and(), &mut query, false)
        .expect_err("unknown relationship fails");
    assert_eq!(
        err,
        CompileError::UnknownRelationship {
            relationship: "author".to_string()
        }
    );
}

//
// apply_query_access
//

fn content_handler() -> QueryAccessHandler<ContentType> {
    QueryAccessHandler::new(content_type(), SubscriberRegistry::new())
}

#[test]
fn apply_defaults_to_view_and_records_cache_metadata() {
    let handler = content_handler();
    let user = account(&["view content"]);
    let mut query = SelectQuery::new("node");
    let mut cache = CacheMetadata::new();

    let report = apply_query_access(
        &handler,
        &entity(),
        &mut query,
        QueryAccessOptions::default().account(&user),
        &mut cache,
    )
    .expect("access applies")
    .expect("access not skipped");

    assert_eq!(report.clauses, 1);
    assert!(
        query
            .render()
            .sql
            .ends_with("WHERE node_field_data.status = ?")
    );
    assert!(cache.contexts().contains(USER_PERMISSIONS));
}

#[test]
fn apply_skips_when_asked() {
    let handler = content_handler();
    let mut query = SelectQuery::new("node");
    let mut cache = CacheMetadata::new();

    let report = apply_query_access(
        &handler,
        &entity(),
        &mut query,
        QueryAccessOptions::default().skip_access(),
        &mut cache,
    )
    .expect("skipping never fails");

    assert_eq!(report, None);
    assert!(query.conditions().is_empty());
    assert!(cache.is_empty());
}

#[test]
fn apply_denies_anonymous_accounts() {
    let handler = content_handler();
    let mut query = ListingQuery::new("node_field_data");
    let mut cache = CacheMetadata::new();

    let report = apply_query_access(
        &handler,
        &listing(),
        &mut query,
        QueryAccessOptions::default().operation(OP_UPDATE),
        &mut cache,
    )
    .expect("access applies")
    .expect("access not skipped");

    assert!(report.always_false);
    assert!(query.render().sql.ends_with("WHERE 1 = 0"));
}

#[test]
fn apply_sees_subscriber_changes() {
    let mut registry = SubscriberRegistry::new();
    registry.subscribe_all(|event: &mut QueryAccessEvent<'_>| {
        event.tree_mut().add_cache_tags(["node_list"]);
    });
    let handler = QueryAccessHandler::new(content_type(), registry);
    let admin = Account::new(1).with_permission("administer content");
    let mut query = SelectQuery::new("node");
    let mut cache = CacheMetadata::new();

    let report = apply_query_access(
        &handler,
        &entity(),
        &mut query,
        QueryAccessOptions::default().account(&admin),
        &mut cache,
    )
    .expect("access applies")
    .expect("access not skipped");

    assert!(report.is_unrestricted());
    assert!(cache.tags().contains("node_list"));
}

#[test]
fn apply_surfaces_configuration_errors() {
    let mut ty = content_type();
    ty.owner_key = None;
    let handler = QueryAccessHandler::new(ty, SubscriberRegistry::new());
    let mut query = SelectQuery::new("node");

    let err = apply_query_access(
        &handler,
        &entity(),
        &mut query,
        QueryAccessOptions::default(),
        &mut CacheMetadata::new(),
    )
    .expect_err("broken type fails");

    assert_eq!(err.class, ErrorClass::Configuration);
    assert!(query.conditions().is_empty());
}

//
// properties
//

fn predicate() -> impl Strategy<Value = Predicate> {
    let fields = proptest::sample::select(vec![
        "nid",
        "type",
        "uid",
        "status",
        "title",
        "field_tags",
        "body.format",
    ]);

    (fields, 0u8..4, 0i64..100).prop_map(|(field, kind, n)| match kind {
        0 => Predicate::equals(field, n),
        1 => Predicate::with_op(field, vec![n, n + 1], CompareOp::In),
        2 => Predicate::equals(field, format!("v{n}")),
        _ => Predicate::is_null(field),
    })
}

fn tree() -> impl Strategy<Value = FilterTree> {
    let leaf = proptest::collection::vec(predicate(), 0..3)
        .prop_map(|predicates| predicates.into_iter().fold(FilterTree::and(), |t, p| t.with(p)));

    leaf.prop_recursive(3, 32, 3, |inner| {
        (
            any::<bool>(),
            proptest::collection::vec(predicate(), 0..3),
            proptest::collection::vec(inner, 1..3),
            proptest::bool::weighted(0.1),
        )
            .prop_map(|(or, predicates, subtrees, always_false)| {
                let mut tree = if or {
                    FilterTree::or()
                } else {
                    FilterTree::and()
                };
                for predicate in predicates {
                    tree.add(predicate);
                }
                for subtree in subtrees {
                    tree.add(subtree);
                }
                tree.mark_always_false(always_false);
                tree
            })
    })
}

proptest! {
    #[test]
    fn compiling_twice_is_identical(tree in tree(), revision_scoped in any::<bool>()) {
        let mut first = SelectQuery::new("node");
        let mut second = SelectQuery::new("node");

        let first_report = entity().compile(&tree, &mut first, revision_scoped).expect("compiles");
        let second_report = entity().compile(&tree, &mut second, revision_scoped).expect("compiles");

        prop_assert_eq!(first_report, second_report);
        prop_assert_eq!(first.render(), second.render());
        prop_assert_eq!(first, second);
    }

    #[test]
    fn single_child_subtree_compiles_like_its_child(
        predicate in predicate(),
        or in any::<bool>(),
    ) {
        let parent = || {
            let tree = if or { FilterTree::or() } else { FilterTree::and() };
            tree.with(Predicate::equals("nid", 1))
        };
        let wrapped = parent().with(FilterTree::and().with(predicate.clone()));
        let direct = parent().with(predicate);

        let (wrapped_query, _) = compile_node(&wrapped);
        let (direct_query, _) = compile_node(&direct);

        prop_assert_eq!(wrapped_query.render(), direct_query.render());
    }

    #[test]
    fn always_false_trees_compile_to_one_false_clause(tree in tree()) {
        let mut tree = tree;
        tree.mark_always_false(true);

        let (query, report) = compile_node(&tree);
        prop_assert!(query.joins().is_empty());
        prop_assert_eq!(query.render().sql, "SELECT node.* FROM node node WHERE 1 = 0");
        prop_assert_eq!(report.clauses, 1);

        let mut listing_query = ListingQuery::new("node_field_data");
        listing().compile(&tree, &mut listing_query, false).expect("compiles");
        prop_assert!(listing_query.joins().is_empty());
        prop_assert_eq!(listing_query.conditions().clauses().count(), 0);
    }
}
