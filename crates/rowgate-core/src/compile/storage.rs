//! Logical field → physical table/column resolution.

use std::collections::BTreeMap;

///
/// CONSTANTS
///

/// Record id column on dedicated field tables.
pub const DEDICATED_ENTITY_COLUMN: &str = "entity_id";

/// Revision id column on dedicated revision tables.
pub const DEDICATED_REVISION_COLUMN: &str = "revision_id";

///
/// EntityTables
///
/// Shared tables of one content type plus the keys that join them.
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct EntityTables {
    pub base_table: String,
    pub data_table: Option<String>,
    pub revision_table: Option<String>,
    pub revision_data_table: Option<String>,
    pub id_key: String,
    pub revision_key: Option<String>,
}

impl EntityTables {
    #[must_use]
    pub fn new(base_table: impl Into<String>, id_key: impl Into<String>) -> Self {
        Self {
            base_table: base_table.into(),
            id_key: id_key.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_data_table(mut self, table: impl Into<String>) -> Self {
        self.data_table = Some(table.into());
        self
    }

    #[must_use]
    pub fn with_revisions(
        mut self,
        revision_table: impl Into<String>,
        revision_data_table: Option<String>,
        revision_key: impl Into<String>,
    ) -> Self {
        self.revision_table = Some(revision_table.into());
        self.revision_data_table = revision_data_table;
        self.revision_key = Some(revision_key.into());
        self
    }

    /// Key joining shared tables, scoped to revisions when asked and
    /// available.
    #[must_use]
    pub fn join_key(&self, revision_scoped: bool) -> &str {
        match (&self.revision_key, revision_scoped) {
            (Some(key), true) => key,
            _ => &self.id_key,
        }
    }
}

///
/// FieldStorage
///
/// Physical location of one property of one field.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FieldStorage {
    pub table: String,
    pub revision_table: Option<String>,
    pub column: String,
    pub dedicated: bool,
    pub case_sensitive: bool,
}

impl FieldStorage {
    #[must_use]
    pub fn table_for(&self, revision_scoped: bool) -> &str {
        match (&self.revision_table, revision_scoped) {
            (Some(table), true) => table,
            _ => &self.table,
        }
    }
}

///
/// StorageResolver
///

pub trait StorageResolver {
    fn tables(&self) -> &EntityTables;

    /// Locate `property` of `field`; `None` property means the field's
    /// main property. Unknown fields or properties resolve to `None`.
    fn resolve_field(&self, field: &str, property: Option<&str>) -> Option<FieldStorage>;
}

impl<R: StorageResolver + ?Sized> StorageResolver for &R {
    fn tables(&self) -> &EntityTables {
        (**self).tables()
    }

    fn resolve_field(&self, field: &str, property: Option<&str>) -> Option<FieldStorage> {
        (**self).resolve_field(field, property)
    }
}

///
/// SharedTable
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum SharedTable {
    #[default]
    Base,
    Data,
}

///
/// FieldDefinition
///
/// Storage definition of one field. Fields on a shared table use the field
/// name as column when they have a single property and
/// `{field}__{property}` otherwise; dedicated fields live in
/// `{type}__{field}` with `{field}_{property}` columns.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FieldDefinition {
    name: String,
    main_property: String,
    properties: BTreeMap<String, bool>,
    dedicated: bool,
    table: SharedTable,
}

impl FieldDefinition {
    /// Field with a single case-sensitive main property.
    #[must_use]
    pub fn new(name: impl Into<String>, main_property: impl Into<String>) -> Self {
        let main_property = main_property.into();

        Self {
            name: name.into(),
            properties: BTreeMap::from([(main_property.clone(), true)]),
            main_property,
            dedicated: false,
            table: SharedTable::Base,
        }
    }

    #[must_use]
    pub fn with_property(mut self, property: impl Into<String>) -> Self {
        self.properties.insert(property.into(), true);
        self
    }

    /// Compare the main property case-insensitively.
    #[must_use]
    pub fn case_insensitive(mut self) -> Self {
        if let Some(case_sensitive) = self.properties.get_mut(&self.main_property) {
            *case_sensitive = false;
        }
        self
    }

    #[must_use]
    pub const fn on_data_table(mut self) -> Self {
        self.table = SharedTable::Data;
        self
    }

    #[must_use]
    pub const fn dedicated(mut self) -> Self {
        self.dedicated = true;
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn main_property(&self) -> &str {
        &self.main_property
    }
}

///
/// TableMapping
///
/// In-memory [`StorageResolver`] built from field definitions.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TableMapping {
    type_id: String,
    tables: EntityTables,
    fields: BTreeMap<String, FieldDefinition>,
}

impl TableMapping {
    #[must_use]
    pub fn new(type_id: impl Into<String>, tables: EntityTables) -> Self {
        Self {
            type_id: type_id.into(),
            tables,
            fields: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_field(mut self, field: FieldDefinition) -> Self {
        self.fields.insert(field.name.clone(), field);
        self
    }

    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldDefinition> {
        self.fields.get(name)
    }

    fn shared_tables(&self, table: SharedTable) -> (&str, Option<&str>) {
        let tables = &self.tables;

        match table {
            SharedTable::Data => (
                tables.data_table.as_deref().unwrap_or(&tables.base_table),
                tables
                    .revision_data_table
                    .as_deref()
                    .or(tables.revision_table.as_deref()),
            ),
            SharedTable::Base => (&tables.base_table, tables.revision_table.as_deref()),
        }
    }
}

impl StorageResolver for TableMapping {
    fn tables(&self) -> &EntityTables {
        &self.tables
    }

    fn resolve_field(&self, field: &str, property: Option<&str>) -> Option<FieldStorage> {
        let definition = self.fields.get(field)?;
        let property = property.unwrap_or(&definition.main_property);
        let case_sensitive = *definition.properties.get(property)?;

        if definition.dedicated {
            return Some(FieldStorage {
                table: format!("{}__{field}", self.type_id),
                revision_table: self
                    .tables
                    .revision_table
                    .as_ref()
                    .map(|_| format!("{}_revision__{field}", self.type_id)),
                column: format!("{field}_{property}"),
                dedicated: true,
                case_sensitive,
            });
        }

        let (table, revision_table) = self.shared_tables(definition.table);
        let column = if definition.properties.len() == 1 {
            field.to_string()
        } else {
            format!("{field}__{property}")
        };

        Some(FieldStorage {
            table: table.to_string(),
            revision_table: revision_table.map(ToString::to_string),
            column,
            dedicated: false,
            case_sensitive,
        })
    }
}
