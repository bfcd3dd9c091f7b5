use serde::Deserialize;

///
/// TypeMetadata
///
/// Access-relevant shape of a content type. The builder inspects this once
/// and branches on it; it never mutates it.
///

pub trait TypeMetadata {
    fn id(&self) -> &str;

    fn admin_permission(&self) -> &str;

    fn has_owner(&self) -> bool;

    /// Owner key name, when the type declares an owner and the key resolves.
    fn owner_key(&self) -> Option<&str>;

    fn has_published(&self) -> bool;

    fn published_key(&self) -> Option<&str>;

    fn bundle_key(&self) -> Option<&str>;

    fn bundles(&self) -> &[String];

    fn is_bundle_granular(&self) -> bool;
}

///
/// PermissionGranularity
///

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum PermissionGranularity {
    #[default]
    EntityType,
    Bundle,
}

///
/// ContentType
///
/// Declarative [`TypeMetadata`], constructed in code or loaded from config.
/// `has_owner` / `has_published` are declared separately from the keys so a
/// broken definition (attribute without key) is detectable.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ContentType {
    pub id: String,
    #[serde(default)]
    pub admin_permission: Option<String>,
    #[serde(default)]
    pub has_owner: bool,
    #[serde(default)]
    pub owner_key: Option<String>,
    #[serde(default)]
    pub has_published: bool,
    #[serde(default)]
    pub published_key: Option<String>,
    #[serde(default)]
    pub bundle_key: Option<String>,
    #[serde(default)]
    pub bundles: Vec<String>,
    #[serde(default)]
    pub permission_granularity: PermissionGranularity,
}

impl ContentType {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();

        Self {
            admin_permission: Some(format!("administer {id}")),
            id,
            has_owner: false,
            owner_key: None,
            has_published: false,
            published_key: None,
            bundle_key: None,
            bundles: Vec::new(),
            permission_granularity: PermissionGranularity::EntityType,
        }
    }

    #[must_use]
    pub fn with_admin_permission(mut self, permission: impl Into<String>) -> Self {
        self.admin_permission = Some(permission.into());
        self
    }

    #[must_use]
    pub fn with_owner(mut self, key: impl Into<String>) -> Self {
        self.has_owner = true;
        self.owner_key = Some(key.into());
        self
    }

    #[must_use]
    pub fn with_published(mut self, key: impl Into<String>) -> Self {
        self.has_published = true;
        self.published_key = Some(key.into());
        self
    }

    #[must_use]
    pub fn with_bundles<I, S>(mut self, key: impl Into<String>, bundles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.bundle_key = Some(key.into());
        self.bundles = bundles.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub const fn with_bundle_granularity(mut self) -> Self {
        self.permission_granularity = PermissionGranularity::Bundle;
        self
    }

    /// Fill defaults a config file may omit.
    pub(crate) fn finish(mut self) -> Self {
        if self.admin_permission.is_none() {
            self.admin_permission = Some(format!("administer {}", self.id));
        }
        self
    }
}

impl TypeMetadata for ContentType {
    fn id(&self) -> &str {
        &self.id
    }

    fn admin_permission(&self) -> &str {
        self.admin_permission.as_deref().unwrap_or_default()
    }

    fn has_owner(&self) -> bool {
        self.has_owner
    }

    fn owner_key(&self) -> Option<&str> {
        self.owner_key.as_deref().filter(|key| !key.is_empty())
    }

    fn has_published(&self) -> bool {
        self.has_published
    }

    fn published_key(&self) -> Option<&str> {
        self.published_key.as_deref().filter(|key| !key.is_empty())
    }

    fn bundle_key(&self) -> Option<&str> {
        self.bundle_key.as_deref().filter(|key| !key.is_empty())
    }

    fn bundles(&self) -> &[String] {
        &self.bundles
    }

    fn is_bundle_granular(&self) -> bool {
        self.permission_granularity == PermissionGranularity::Bundle
    }
}
