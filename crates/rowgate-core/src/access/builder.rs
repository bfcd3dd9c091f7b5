//! Permission-to-filter builder.
//!
//! Internally every branch returns `Option<FilterTree>`: `None` means the
//! account may act on nothing, while an empty tree means the account is
//! unrestricted. Only the public entry point collapses `None` into an
//! always-false tree.

use crate::{
    access::{AccessError, PermissionChecker, TypeMetadata},
    cache::{USER, USER_PERMISSIONS},
    filter::{FilterTree, Predicate},
    value::Value,
};

///
/// CONSTANTS
///

pub const OP_VIEW: &str = "view";
pub const OP_UPDATE: &str = "update";
pub const OP_DUPLICATE: &str = "duplicate";
pub const OP_DELETE: &str = "delete";

///
/// BuilderMode
///
/// How `view` is granted on types with an owner.
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum BuilderMode {
    /// `view` is an entity-level permission (`view {type}`), so the filter
    /// varies by permissions only.
    #[default]
    Cacheable,

    /// `view` honors `view any` / `view own`, so the filter varies by user.
    Uncacheable,
}

///
/// FilterBuilder
///

#[derive(Clone, Copy, Debug, Default)]
pub struct FilterBuilder {
    mode: BuilderMode,
}

impl FilterBuilder {
    #[must_use]
    pub const fn new(mode: BuilderMode) -> Self {
        Self { mode }
    }

    #[must_use]
    pub const fn mode(&self) -> BuilderMode {
        self.mode
    }

    /// Build the filter encoding which records `account` may act on.
    ///
    /// Never returns "access denied" as an error: no access is an
    /// always-false tree. Errors are reserved for broken type definitions.
    pub fn build(
        &self,
        operation: &str,
        ty: &dyn TypeMetadata,
        account: &dyn PermissionChecker,
    ) -> Result<FilterTree, AccessError> {
        let keys = Keys::resolve(ty)?;

        if account.has_permission(ty.admin_permission()) {
            rowgate_log!(
                log::Level::Debug,
                "access.build",
                "type={} op={} outcome=admin",
                ty.id(),
                operation
            );

            return Ok(unrestricted());
        }

        let conditions = match keys.owner {
            Some(owner_key) if !(operation == OP_VIEW && self.mode == BuilderMode::Cacheable) => {
                owner_conditions(operation, ty, account, owner_key, keys.bundle)
            }
            _ => entity_conditions(operation, ty, account, keys.bundle),
        };

        let conditions = match keys.published {
            Some(published_key) if operation == OP_VIEW => {
                published_conditions(ty, account, conditions, published_key, keys.owner)
            }
            _ => conditions,
        };

        let tree = conditions.unwrap_or_else(denied);
        rowgate_log!(
            log::Level::Debug,
            "access.build",
            "type={} op={} outcome={}",
            ty.id(),
            operation,
            outcome(&tree)
        );

        Ok(tree)
    }
}

/// Build with the default (cacheable) builder.
pub fn build_filter(
    operation: &str,
    ty: &dyn TypeMetadata,
    account: &dyn PermissionChecker,
) -> Result<FilterTree, AccessError> {
    FilterBuilder::default().build(operation, ty, account)
}

///
/// Keys
///
/// Key names resolved up front so a broken type definition fails before any
/// permission is consulted.
///

struct Keys<'a> {
    owner: Option<&'a str>,
    published: Option<&'a str>,
    bundle: Option<&'a str>,
}

impl<'a> Keys<'a> {
    fn resolve(ty: &'a dyn TypeMetadata) -> Result<Self, AccessError> {
        let type_id = || ty.id().to_string();

        let owner = if ty.has_owner() {
            Some(ty.owner_key().ok_or_else(|| AccessError::MissingOwnerKey {
                type_id: type_id(),
            })?)
        } else {
            None
        };

        let published = if ty.has_published() {
            Some(
                ty.published_key()
                    .ok_or_else(|| AccessError::MissingPublishedKey { type_id: type_id() })?,
            )
        } else {
            None
        };

        // bundle grants are checked whenever the type has bundles
        let bundle = if ty.is_bundle_granular() || !ty.bundles().is_empty() {
            Some(
                ty.bundle_key()
                    .ok_or_else(|| AccessError::MissingBundleKey { type_id: type_id() })?,
            )
        } else {
            None
        };

        Ok(Self {
            owner,
            published,
            bundle,
        })
    }
}

fn unrestricted() -> FilterTree {
    let mut tree = FilterTree::or();
    tree.add_cache_contexts([USER_PERMISSIONS]);
    tree
}

fn denied() -> FilterTree {
    let mut tree = unrestricted();
    tree.mark_always_false(true);
    tree
}

fn restricted(tree: FilterTree) -> Option<FilterTree> {
    (tree.count() > 0).then_some(tree)
}

const fn outcome(tree: &FilterTree) -> &'static str {
    if tree.is_always_false() {
        "denied"
    } else if tree.is_empty() {
        "unrestricted"
    } else {
        "restricted"
    }
}

fn owner_value(account: &dyn PermissionChecker) -> Value {
    Value::Uint(account.id())
}

// Types without an owner, and `view` in cacheable mode.
fn entity_conditions(
    operation: &str,
    ty: &dyn TypeMetadata,
    account: &dyn PermissionChecker,
    bundle_key: Option<&str>,
) -> Option<FilterTree> {
    let type_id = ty.id();
    let mut tree = unrestricted();

    if account.has_permission(&format!("{operation} {type_id}")) {
        return Some(tree);
    }

    if let Some(bundle_key) = bundle_key {
        let bundles = granted_bundles(ty, |bundle| {
            account.has_permission(&format!("{operation} {bundle} {type_id}"))
        });
        if !bundles.is_empty() {
            tree.add(Predicate::equals(bundle_key, Value::text_list(bundles)));
        }
    }

    restricted(tree)
}

fn owner_conditions(
    operation: &str,
    ty: &dyn TypeMetadata,
    account: &dyn PermissionChecker,
    owner_key: &str,
    bundle_key: Option<&str>,
) -> Option<FilterTree> {
    let type_id = ty.id();
    let mut tree = unrestricted();

    if account.has_permission(&format!("{operation} any {type_id}")) {
        return Some(tree);
    }

    if account.has_permission(&format!("{operation} own {type_id}")) {
        tree.add_cache_contexts([USER]);
        tree.add(Predicate::equals(owner_key, owner_value(account)));
    }

    if let Some(bundle_key) = bundle_key {
        let any_bundles = granted_bundles(ty, |bundle| {
            account.has_permission(&format!("{operation} any {bundle} {type_id}"))
        });
        let own_bundles = granted_bundles(ty, |bundle| {
            account.has_permission(&format!("{operation} own {bundle} {type_id}"))
        });

        if !any_bundles.is_empty() {
            tree.add(Predicate::equals(bundle_key, Value::text_list(any_bundles)));
        }
        if !own_bundles.is_empty() {
            let mut own = FilterTree::and();
            own.add(Predicate::equals(owner_key, owner_value(account)))
                .add(Predicate::equals(bundle_key, Value::text_list(own_bundles)))
                .add_cache_contexts([USER]);
            tree.add(own);
        }
    }

    restricted(tree)
}

// Restrict `conditions` to published rows and grant own unpublished rows.
fn published_conditions(
    ty: &dyn TypeMetadata,
    account: &dyn PermissionChecker,
    conditions: Option<FilterTree>,
    published_key: &str,
    owner_key: Option<&str>,
) -> Option<FilterTree> {
    let published = conditions.map(|conditions| {
        let mut tree = FilterTree::and();
        tree.add_cache_contexts([USER_PERMISSIONS]);
        tree.add(conditions);
        tree.add(Predicate::equals(published_key, 1));
        tree
    });

    let unpublished = owner_key
        .filter(|_| account.has_permission(&format!("view own unpublished {}", ty.id())))
        .map(|owner_key| {
            let mut tree = FilterTree::and();
            tree.add_cache_contexts([USER]);
            tree.add(Predicate::equals(owner_key, owner_value(account)));
            tree.add(Predicate::equals(published_key, 0));
            tree
        });

    match (published, unpublished) {
        (Some(published), Some(unpublished)) => {
            Some(FilterTree::or().with(published).with(unpublished))
        }
        (published, unpublished) => published.or(unpublished),
    }
}

fn granted_bundles(ty: &dyn TypeMetadata, granted: impl Fn(&str) -> bool) -> Vec<String> {
    ty.bundles()
        .iter()
        .filter(|bundle| granted(bundle))
        .cloned()
        .collect()
}
