//! Shared fixtures: a node-like content type and its storage mapping.

use crate::{
    access::{Account, ContentType},
    compile::{EntityTables, FieldDefinition, TableMapping},
};

pub(crate) const AUTHOR_ID: u64 = 7;

/// Owner, published flag, and per-bundle permissions on `page` / `article`.
pub(crate) fn content_type() -> ContentType {
    ContentType::new("content")
        .with_owner("uid")
        .with_published("status")
        .with_bundles("type", ["page", "article"])
        .with_bundle_granularity()
}

/// Plain type: no owner, no published flag, no bundles.
pub(crate) fn article_type() -> ContentType {
    ContentType::new("article")
}

pub(crate) fn account(permissions: &[&str]) -> Account {
    Account::new(AUTHOR_ID).with_permissions(permissions.iter().copied())
}

pub(crate) fn node_tables() -> EntityTables {
    EntityTables::new("node", "nid")
        .with_data_table("node_field_data")
        .with_revisions(
            "node_revision",
            Some("node_field_revision".to_string()),
            "vid",
        )
}

/// `type` and `nid` on the base table, the rest on the data table, and two
/// dedicated fields.
pub(crate) fn node_mapping() -> TableMapping {
    TableMapping::new("node", node_tables())
        .with_field(FieldDefinition::new("nid", "value"))
        .with_field(FieldDefinition::new("type", "target_id"))
        .with_field(FieldDefinition::new("uid", "target_id").on_data_table())
        .with_field(FieldDefinition::new("status", "value").on_data_table())
        .with_field(
            FieldDefinition::new("title", "value")
                .case_insensitive()
                .on_data_table(),
        )
        .with_field(FieldDefinition::new("field_tags", "target_id").dedicated())
        .with_field(
            FieldDefinition::new("body", "value")
                .with_property("format")
                .dedicated(),
        )
}
