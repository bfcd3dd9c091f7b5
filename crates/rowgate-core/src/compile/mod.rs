//! Module: compile
//! Responsibility: lower a filter tree into clauses and joins on a query
//! target.
//! Does not own: query execution, or deciding which tree applies.
//! Boundary: both backends share one walk and differ only in field
//! placement and unknown-field handling.

mod alter;
mod entity;
mod like;
mod listing;
mod storage;
mod walk;

#[cfg(test)]
mod tests;

pub use alter::{QueryAccessOptions, apply_query_access};
pub use entity::EntityQueryCompiler;
pub use like::escape_like;
pub use listing::ListingQueryCompiler;
pub use storage::{
    DEDICATED_ENTITY_COLUMN, DEDICATED_REVISION_COLUMN, EntityTables, FieldDefinition,
    FieldStorage, SharedTable, StorageResolver, TableMapping,
};

use crate::{
    filter::{CompareOp, FilterError, FilterTree},
    query::QueryTarget,
};
use thiserror::Error as ThisError;

///
/// CompileError
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
#[remain::sorted]
pub enum CompileError {
    #[error(transparent)]
    Filter(#[from] FilterError),

    #[error("operator {op} on field '{field}' needs a two-item list operand")]
    InvalidOperand { field: String, op: CompareOp },

    #[error("no storage definition for field '{field}'")]
    UnknownField { field: String },

    #[error("query has no relationship named '{relationship}'")]
    UnknownRelationship { relationship: String },
}

///
/// CompileReport
///
/// What a compile call added to its query target.
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct CompileReport {
    /// Clauses and raw expressions added.
    pub clauses: usize,

    /// Aliases of joins the compile needed, first use first.
    pub joins: Vec<String>,

    /// Fields the listing backend could not resolve and left out.
    pub skipped_fields: Vec<String>,

    pub always_false: bool,
}

impl CompileReport {
    /// Whether the compile added no restriction at all.
    #[must_use]
    pub const fn is_unrestricted(&self) -> bool {
        self.clauses == 0 && !self.always_false
    }
}

///
/// QueryCompiler
///

pub trait QueryCompiler {
    /// Merge `tree` into `query`. Revision-scoped compiles place fields on
    /// revision tables.
    fn compile(
        &self,
        tree: &FilterTree,
        query: &mut dyn QueryTarget,
        revision_scoped: bool,
    ) -> Result<CompileReport, CompileError>;
}
