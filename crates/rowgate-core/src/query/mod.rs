//! Module: query
//! Responsibility: the join/clause registration contract compilers write
//! into, plus two concrete query objects that render parameterized SQL.
//! Does not own: filter semantics or storage resolution.
//! Boundary: a query object is exclusively owned by the single compile call
//! writing into it.

mod conditions;
mod join;
mod listing;
mod select;


pub use conditions::{Condition, ConditionSet, Group};
pub use join::{Join, JoinSet};
pub use listing::ListingQuery;
pub use select::SelectQuery;

use crate::{
    filter::{CompareOp, Conjunction},
    value::Value,
};
use std::fmt;

///
/// CONSTANTS
///

/// Unconditionally false SQL expression.
pub const ALWAYS_FALSE: &str = "1 = 0";

/// Unconditionally true SQL expression.
pub const ALWAYS_TRUE: &str = "1 = 1";

///
/// GroupId
///
/// Handle to a condition group inside a query. [`GroupId::ROOT`] is the
/// query's top-level AND.
///

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct GroupId(usize);

impl GroupId {
    pub const ROOT: Self = Self(0);

    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

///
/// JoinKind
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum JoinKind {
    Inner,
    Left,
}

impl JoinKind {
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Inner => "INNER JOIN",
            Self::Left => "LEFT JOIN",
        }
    }

    /// The more permissive of two join kinds.
    #[must_use]
    pub const fn widen(self, other: Self) -> Self {
        match (self, other) {
            (Self::Inner, Self::Inner) => Self::Inner,
            _ => Self::Left,
        }
    }
}

///
/// JoinSpec
///
/// Request to join `table` where `left = <alias>.right_column`. `left` is a
/// fully qualified `alias.column` already present in the query.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct JoinSpec {
    pub table: String,
    pub kind: JoinKind,
    pub left: String,
    pub right_column: String,
}

impl JoinSpec {
    #[must_use]
    pub fn new(
        table: impl Into<String>,
        kind: JoinKind,
        left: impl Into<String>,
        right_column: impl Into<String>,
    ) -> Self {
        Self {
            table: table.into(),
            kind,
            left: left.into(),
            right_column: right_column.into(),
        }
    }

    /// Alias that `left` is qualified with.
    #[must_use]
    pub fn anchor(&self) -> &str {
        self.left
            .split_once('.')
            .map_or(self.left.as_str(), |(alias, _)| alias)
    }
}

///
/// Anchor
///
/// A table instance in the query that fields are resolved against.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Anchor {
    pub alias: String,
    pub table: String,
}

///
/// ClauseOp
///
/// Predicate operators plus the pattern operators the case-insensitive
/// rewrite produces. Pattern operators carry their escape character.
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ClauseOp {
    Compare(CompareOp),
    Like(char),
    NotLike(char),
}

impl fmt::Display for ClauseOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Compare(op) => fmt::Display::fmt(op, f),
            Self::Like(_) => f.write_str("LIKE"),
            Self::NotLike(_) => f.write_str("NOT LIKE"),
        }
    }
}

impl From<CompareOp> for ClauseOp {
    fn from(op: CompareOp) -> Self {
        Self::Compare(op)
    }
}

///
/// Clause
///
/// Backend-native predicate against a resolved `alias.column`.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Clause {
    pub column: String,
    pub op: ClauseOp,
    pub value: Value,
}

impl Clause {
    #[must_use]
    pub fn new(column: impl Into<String>, op: impl Into<ClauseOp>, value: Value) -> Self {
        Self {
            column: column.into(),
            op: op.into(),
            value,
        }
    }
}

///
/// QueryTarget
///
/// Capabilities a compiler needs from a caller-supplied query object.
///

pub trait QueryTarget {
    fn base_table(&self) -> &str;

    fn base_alias(&self) -> &str;

    /// Open a new group nested in `parent`.
    fn add_group(&mut self, parent: GroupId, conjunction: Conjunction) -> GroupId;

    fn add_clause(&mut self, group: GroupId, clause: Clause);

    /// Add a raw SQL expression such as [`ALWAYS_FALSE`].
    fn add_expression(&mut self, group: GroupId, expression: &str);

    /// Alias of an existing join of `table` hanging off `anchor`.
    fn find_join(&self, table: &str, anchor: &str) -> Option<String>;

    /// Join `spec.table`, reusing an identical join when one exists.
    fn ensure_join(&mut self, spec: JoinSpec) -> String;

    /// Named relationship registered on the query, if the backend has them.
    fn relationship(&self, _name: &str) -> Option<Anchor> {
        None
    }

    fn base_anchor(&self) -> Anchor {
        Anchor {
            alias: self.base_alias().to_string(),
            table: self.base_table().to_string(),
        }
    }
}

///
/// Rendered
///
/// Parameterized SQL with positional `?` placeholders.
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Rendered {
    pub sql: String,
    pub params: Vec<Value>,
}
