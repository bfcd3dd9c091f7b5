//! Cacheability metadata carried by filter trees.
//!
//! A filter's dependency set must never be narrower than what the filter
//! actually varies by; merging is therefore a union of contexts and tags and
//! the most restrictive of the max-ages.

use derive_more::Display;
use std::collections::BTreeSet;

///
/// CONSTANTS
///

/// Varies by the permission set of the current account.
pub const USER_PERMISSIONS: &str = "user.permissions";

/// Varies by the identity of the current account.
pub const USER: &str = "user";

///
/// MaxAge
///
/// Cache lifetime in seconds. `-1` marks a permanent entry and is the
/// neutral element of [`MaxAge::merge`].
///

#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
pub struct MaxAge(i64);

impl MaxAge {
    pub const PERMANENT: Self = Self(-1);
    pub const UNCACHEABLE: Self = Self(0);

    #[must_use]
    pub const fn seconds(seconds: i64) -> Self {
        Self(seconds)
    }

    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }

    #[must_use]
    pub const fn is_permanent(self) -> bool {
        self.0 == Self::PERMANENT.0
    }

    /// Combine two lifetimes, keeping the most restrictive one.
    #[must_use]
    pub const fn merge(self, other: Self) -> Self {
        if self.is_permanent() {
            return other;
        }
        if other.is_permanent() {
            return self;
        }

        if self.0 <= other.0 { self } else { other }
    }
}

impl Default for MaxAge {
    fn default() -> Self {
        Self::PERMANENT
    }
}

impl From<i64> for MaxAge {
    fn from(seconds: i64) -> Self {
        Self(seconds)
    }
}

///
/// CacheMetadata
///
/// Contexts, tags, and lifetime a computed filter depends on.
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct CacheMetadata {
    contexts: BTreeSet<String>,
    tags: BTreeSet<String>,
    max_age: MaxAge,
}

impl CacheMetadata {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn contexts(&self) -> &BTreeSet<String> {
        &self.contexts
    }

    #[must_use]
    pub const fn tags(&self) -> &BTreeSet<String> {
        &self.tags
    }

    #[must_use]
    pub const fn max_age(&self) -> MaxAge {
        self.max_age
    }

    pub fn add_contexts<I, S>(&mut self, contexts: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.contexts.extend(contexts.into_iter().map(Into::into));
    }

    pub fn add_tags<I, S>(&mut self, tags: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
    }

    pub fn merge_max_age(&mut self, max_age: impl Into<MaxAge>) {
        self.max_age = self.max_age.merge(max_age.into());
    }

    /// Fold another dependency set into this one.
    pub fn merge(&mut self, other: &Self) {
        self.contexts.extend(other.contexts.iter().cloned());
        self.tags.extend(other.tags.iter().cloned());
        self.merge_max_age(other.max_age);
    }

    /// Return the union of both dependency sets.
    #[must_use]
    pub fn merged(mut self, other: &Self) -> Self {
        self.merge(other);
        self
    }

    /// Apply this dependency set to a caller-owned render or response context.
    pub fn apply_to(&self, target: &mut Self) {
        target.merge(self);
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.contexts.is_empty() && self.tags.is_empty() && self.max_age.is_permanent()
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn permanent_is_weakest_constraint() {
        assert_eq!(MaxAge::seconds(5).merge(MaxAge::PERMANENT), MaxAge::seconds(5));
        assert_eq!(MaxAge::PERMANENT.merge(MaxAge::seconds(5)), MaxAge::seconds(5));
        assert_eq!(MaxAge::PERMANENT.merge(MaxAge::PERMANENT), MaxAge::PERMANENT);
    }

    #[test]
    fn uncacheable_wins_over_any_lifetime() {
        assert_eq!(
            MaxAge::seconds(300).merge(MaxAge::UNCACHEABLE),
            MaxAge::UNCACHEABLE
        );
    }

    #[test]
    fn merge_unions_contexts_and_tags() {
        let mut left = CacheMetadata::new();
        left.add_contexts([USER_PERMISSIONS]);
        left.add_tags(["node_list"]);

        let mut right = CacheMetadata::new();
        right.add_contexts([USER]);
        right.add_tags(["node_list", "config:node.settings"]);
        right.merge_max_age(MaxAge::seconds(60));

        let merged = left.merged(&right);
        assert_eq!(
            merged.contexts().iter().map(String::as_str).collect::<Vec<_>>(),
            vec![USER, USER_PERMISSIONS]
        );
        assert_eq!(merged.tags().len(), 2);
        assert_eq!(merged.max_age(), MaxAge::seconds(60));
    }

    #[test]
    fn apply_to_widens_target_context() {
        let mut filter = CacheMetadata::new();
        filter.add_contexts([USER]);

        let mut response = CacheMetadata::new();
        response.add_tags(["rendered"]);
        filter.apply_to(&mut response);

        assert!(response.contexts().contains(USER));
        assert!(response.tags().contains("rendered"));
    }

    proptest! {
        #[test]
        fn merge_is_commutative(a in -1i64..10_000, b in -1i64..10_000) {
            let left = MaxAge::seconds(a).merge(MaxAge::seconds(b));
            let right = MaxAge::seconds(b).merge(MaxAge::seconds(a));
            prop_assert_eq!(left, right);
        }

        #[test]
        fn merge_never_exceeds_a_finite_operand(a in 0i64..10_000, b in -1i64..10_000) {
            let merged = MaxAge::seconds(a).merge(MaxAge::seconds(b)).get();
            prop_assert!(merged <= a);
        }
    }
}
