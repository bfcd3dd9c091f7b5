use rowgate_core::{
    access::{Account, ContentType, OP_UPDATE, OP_VIEW, QueryAccessHandler},
    cache::{CacheMetadata, USER, USER_PERMISSIONS},
    compile::{
        EntityQueryCompiler, EntityTables, FieldDefinition, ListingQueryCompiler,
        QueryAccessOptions, TableMapping, apply_query_access,
    },
    config::Config,
    filter::Predicate,
    hook::{QueryAccessEvent, SubscriberRegistry},
    query::{ListingQuery, SelectQuery},
    value::Value,
};

const CONFIG: &str = r#"
    [compile]
    like_escape = "!"

    [[content_type]]
    id = "content"
    has_owner = true
    owner_key = "uid"
    has_published = true
    published_key = "status"
    bundle_key = "type"
    bundles = ["page", "article"]
    permission_granularity = "bundle"
"#;

fn mapping() -> TableMapping {
    let tables = EntityTables::new("node", "nid").with_data_table("node_field_data");

    TableMapping::new("node", tables)
        .with_field(FieldDefinition::new("type", "target_id"))
        .with_field(FieldDefinition::new("uid", "target_id").on_data_table())
        .with_field(FieldDefinition::new("status", "value").on_data_table())
        .with_field(
            FieldDefinition::new("title", "value")
                .case_insensitive()
                .on_data_table(),
        )
}

fn handler(config: &Config, registry: SubscriberRegistry) -> QueryAccessHandler<ContentType> {
    let ty = config
        .content_type("content")
        .cloned()
        .expect("content type configured");

    QueryAccessHandler::new(ty, registry)
}

#[test]
fn view_pipeline_restricts_to_published_and_own_drafts() {
    let config = Config::from_toml_str(CONFIG).expect("config parses");
    let handler = handler(&config, SubscriberRegistry::new());
    let user = Account::new(12).with_permissions(["view content", "view own unpublished content"]);
    let compiler = EntityQueryCompiler::new(mapping()).with_options(config.compile);
    let mut query = SelectQuery::new("node");
    let mut cache = CacheMetadata::new();

    apply_query_access(
        &handler,
        &compiler,
        &mut query,
        QueryAccessOptions::default().operation(OP_VIEW).account(&user),
        &mut cache,
    )
    .expect("access applies");

    let rendered = query.render();
    assert_eq!(
        rendered.sql,
        "SELECT node.* FROM node node \
         INNER JOIN node_field_data node_field_data ON node.nid = node_field_data.nid \
         WHERE (node_field_data.status = ? \
         OR (node_field_data.uid = ? AND node_field_data.status = ?))"
    );
    assert_eq!(
        rendered.params,
        vec![Value::Int(1), Value::Uint(12), Value::Int(0)]
    );
    assert!(cache.contexts().contains(USER));
    assert!(cache.contexts().contains(USER_PERMISSIONS));
}

#[test]
fn subscribers_narrow_listing_queries() {
    let config = Config::from_toml_str(CONFIG).expect("config parses");
    let mut registry = SubscriberRegistry::new();
    registry.subscribe_type("content", |event: &mut QueryAccessEvent<'_>| {
        if event.operation() == OP_UPDATE {
            event.tree_mut().add(Predicate::equals("title", "100%"));
        }
    });
    let handler = handler(&config, registry);
    let editor = Account::new(3).with_permission("update any content");
    let compiler = ListingQueryCompiler::new(mapping()).with_options(config.compile);
    let mut query = ListingQuery::new("node_field_data");

    let report = apply_query_access(
        &handler,
        &compiler,
        &mut query,
        QueryAccessOptions::default().operation(OP_UPDATE).account(&editor),
        &mut CacheMetadata::new(),
    )
    .expect("access applies")
    .expect("access not skipped");

    let rendered = query.render();
    assert_eq!(
        rendered.sql,
        "SELECT node_field_data.* FROM node_field_data node_field_data \
         WHERE node_field_data.title LIKE ? ESCAPE '!'"
    );
    assert_eq!(rendered.params, vec![Value::from("100!%")]);
    assert_eq!(report.clauses, 1);
}

#[test]
fn accounts_without_grants_see_nothing() {
    let config = Config::from_toml_str(CONFIG).expect("config parses");
    let handler = handler(&config, SubscriberRegistry::new());
    let compiler = EntityQueryCompiler::new(mapping());
    let mut query = SelectQuery::new("node");

    apply_query_access(
        &handler,
        &compiler,
        &mut query,
        QueryAccessOptions::default(),
        &mut CacheMetadata::new(),
    )
    .expect("access applies");

    assert_eq!(query.render().sql, "SELECT node.* FROM node node WHERE 1 = 0");
    assert!(query.joins().is_empty());
}
