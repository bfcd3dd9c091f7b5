use crate::query::{JoinKind, JoinSpec};
use derive_more::{Deref, IntoIterator};
use std::fmt;

///
/// Join
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Join {
    pub kind: JoinKind,
    pub table: String,
    pub alias: String,
    pub left: String,
    pub right_column: String,
}

impl Join {
    fn matches(&self, spec: &JoinSpec) -> bool {
        self.table == spec.table && self.left == spec.left && self.right_column == spec.right_column
    }
}

impl fmt::Display for Join {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} ON {} = {}.{}",
            self.kind.as_sql(),
            self.table,
            self.alias,
            self.left,
            self.alias,
            self.right_column
        )
    }
}

///
/// JoinSet
///
/// Ordered joins with unique aliases. An identical join request returns the
/// existing alias; a LEFT request widens an existing INNER join.
///

#[derive(Clone, Debug, Default, Deref, Eq, IntoIterator, PartialEq)]
#[into_iterator(ref)]
pub struct JoinSet {
    joins: Vec<Join>,
}

impl JoinSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `spec`, naming a new join with `preferred` unless that alias
    /// is already taken by `reserved` or another join.
    pub fn ensure(&mut self, spec: JoinSpec, preferred: &str, reserved: &[&str]) -> String {
        if let Some(existing) = self.joins.iter_mut().find(|join| join.matches(&spec)) {
            existing.kind = existing.kind.widen(spec.kind);
            return existing.alias.clone();
        }

        let alias = self.unique_alias(preferred, reserved);
        rowgate_log!(
            log::Level::Trace,
            "compile.join",
            "table={} alias={} kind={:?}",
            spec.table,
            alias,
            spec.kind
        );

        self.joins.push(Join {
            kind: spec.kind,
            table: spec.table,
            alias: alias.clone(),
            left: spec.left,
            right_column: spec.right_column,
        });

        alias
    }

    #[must_use]
    pub fn find(&self, table: &str, anchor: &str) -> Option<&Join> {
        self.joins.iter().find(|join| {
            join.table == table
                && join
                    .left
                    .split_once('.')
                    .is_some_and(|(alias, _)| alias == anchor)
        })
    }

    #[must_use]
    pub fn by_alias(&self, alias: &str) -> Option<&Join> {
        self.joins.iter().find(|join| join.alias == alias)
    }

    fn unique_alias(&self, preferred: &str, reserved: &[&str]) -> String {
        let taken = |candidate: &str| {
            reserved.contains(&candidate) || self.joins.iter().any(|join| join.alias == candidate)
        };

        if !taken(preferred) {
            return preferred.to_string();
        }

        (2..)
            .map(|n| format!("{preferred}_{n}"))
            .find(|candidate| !taken(candidate))
            .unwrap_or_else(|| preferred.to_string())
    }
}
