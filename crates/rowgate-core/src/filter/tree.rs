use crate::{
    cache::{CacheMetadata, MaxAge},
    filter::Predicate,
    query::ALWAYS_FALSE,
};
use std::{collections::BTreeSet, fmt};

///
/// Conjunction
///

#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum Conjunction {
    #[default]
    And,
    Or,
}

impl Conjunction {
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::And => "AND",
            Self::Or => "OR",
        }
    }
}

impl fmt::Display for Conjunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

///
/// FilterNode
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum FilterNode {
    Predicate(Predicate),
    Tree(FilterTree),
}

impl From<Predicate> for FilterNode {
    fn from(predicate: Predicate) -> Self {
        Self::Predicate(predicate)
    }
}

impl From<FilterTree> for FilterNode {
    fn from(tree: FilterTree) -> Self {
        Self::Tree(tree)
    }
}

impl fmt::Display for FilterNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Predicate(predicate) => fmt::Display::fmt(predicate, f),
            Self::Tree(tree) => fmt::Display::fmt(tree, f),
        }
    }
}

///
/// FilterTree
///
/// Boolean combinator over predicates and nested trees.
///
/// - zero children and not always-false: no restriction
/// - always-false: matches nothing, whatever the children say
/// - a single-child tree added to a parent is flattened into that child
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct FilterTree {
    conjunction: Conjunction,
    children: Vec<FilterNode>,
    always_false: bool,
    cache: CacheMetadata,
}

impl FilterTree {
    #[must_use]
    pub fn new(conjunction: Conjunction) -> Self {
        Self {
            conjunction,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn and() -> Self {
        Self::new(Conjunction::And)
    }

    #[must_use]
    pub fn or() -> Self {
        Self::new(Conjunction::Or)
    }

    /// Append a predicate or a subtree.
    ///
    /// Subtrees are merged by child count: none appends nothing, one appends
    /// that child directly, two or more append the subtree whole. The
    /// subtree's cache metadata is kept either way. An always-false subtree
    /// is a restriction on its own and is appended whole.
    pub fn add(&mut self, node: impl Into<FilterNode>) -> &mut Self {
        match node.into() {
            FilterNode::Predicate(predicate) => {
                self.children.push(FilterNode::Predicate(predicate));
            }
            FilterNode::Tree(tree) => self.add_tree(tree),
        }

        self
    }

    /// Builder-style [`FilterTree::add`].
    #[must_use]
    pub fn with(mut self, node: impl Into<FilterNode>) -> Self {
        self.add(node);
        self
    }

    fn add_tree(&mut self, mut tree: Self) {
        if tree.always_false {
            self.children.push(FilterNode::Tree(tree));
            return;
        }

        match tree.children.len() {
            0 => self.cache.merge(&tree.cache),
            1 => {
                self.cache.merge(&tree.cache);
                self.children.append(&mut tree.children);
            }
            _ => self.children.push(FilterNode::Tree(tree)),
        }
    }

    pub fn mark_always_false(&mut self, always_false: bool) -> &mut Self {
        self.always_false = always_false;
        self
    }

    #[must_use]
    pub const fn is_always_false(&self) -> bool {
        self.always_false
    }

    #[must_use]
    pub const fn conjunction(&self) -> Conjunction {
        self.conjunction
    }

    #[must_use]
    pub fn children(&self) -> &[FilterNode] {
        &self.children
    }

    /// Number of direct children.
    #[must_use]
    pub const fn count(&self) -> usize {
        self.children.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    // cache metadata

    pub fn add_cache_contexts<I, S>(&mut self, contexts: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.cache.add_contexts(contexts);
        self
    }

    pub fn add_cache_tags<I, S>(&mut self, tags: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.cache.add_tags(tags);
        self
    }

    pub fn merge_cache_max_age(&mut self, max_age: impl Into<MaxAge>) -> &mut Self {
        self.cache.merge_max_age(max_age);
        self
    }

    /// Dependency set of this node and every nested subtree.
    #[must_use]
    pub fn cache_metadata(&self) -> CacheMetadata {
        let mut cache = self.cache.clone();
        for child in &self.children {
            if let FilterNode::Tree(tree) = child {
                cache.merge(&tree.cache_metadata());
            }
        }

        cache
    }

    #[must_use]
    pub fn cache_contexts(&self) -> BTreeSet<String> {
        self.cache_metadata().contexts().clone()
    }

    #[must_use]
    pub fn cache_tags(&self) -> BTreeSet<String> {
        self.cache_metadata().tags().clone()
    }

    #[must_use]
    pub fn cache_max_age(&self) -> MaxAge {
        self.cache_metadata().max_age()
    }
}

impl fmt::Display for FilterTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // denial wins over whatever children are left behind
        if self.always_false {
            return f.write_str(ALWAYS_FALSE);
        }

        match self.children.as_slice() {
            [] => Ok(()),
            [only] => fmt::Display::fmt(only, f),
            children => {
                let separator = format!("\n    {}\n  ", self.conjunction);
                let lines = children
                    .iter()
                    .map(|child| child.to_string().replace('\n', "\n  "))
                    .collect::<Vec<_>>();

                write!(f, "(\n  {}\n)", lines.join(&separator))
            }
        }
    }
}
