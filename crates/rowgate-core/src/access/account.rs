use std::collections::BTreeSet;

///
/// PermissionChecker
///
/// Read-only view of the account a filter is built for.
///

pub trait PermissionChecker {
    fn id(&self) -> u64;

    fn has_permission(&self, permission: &str) -> bool;
}

impl<T: PermissionChecker + ?Sized> PermissionChecker for &T {
    fn id(&self) -> u64 {
        (**self).id()
    }

    fn has_permission(&self, permission: &str) -> bool {
        (**self).has_permission(permission)
    }
}

///
/// Account
///
/// Concrete account holding a flat permission set.
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Account {
    id: u64,
    permissions: BTreeSet<String>,
}

impl Account {
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self {
            id,
            permissions: BTreeSet::new(),
        }
    }

    /// Account with id 0 and no permissions.
    #[must_use]
    pub const fn anonymous() -> Self {
        Self::new(0)
    }

    #[must_use]
    pub fn with_permission(mut self, permission: impl Into<String>) -> Self {
        self.permissions.insert(permission.into());
        self
    }

    #[must_use]
    pub fn with_permissions<I, S>(mut self, permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.permissions
            .extend(permissions.into_iter().map(Into::into));
        self
    }

    pub fn grant(&mut self, permission: impl Into<String>) {
        self.permissions.insert(permission.into());
    }

    #[must_use]
    pub const fn permissions(&self) -> &BTreeSet<String> {
        &self.permissions
    }
}

impl PermissionChecker for Account {
    fn id(&self) -> u64 {
        self.id
    }

    fn has_permission(&self, permission: &str) -> bool {
        self.permissions.contains(permission)
    }
}
