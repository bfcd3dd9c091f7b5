//! Module: filter
//! Responsibility: schema-agnostic predicate and filter-tree model.
//! Does not own: permission semantics or physical storage resolution.
//! Boundary: produced by `access`, rewritten by `hook`, consumed by `compile`.

mod field;
mod op;
mod predicate;
mod tree;


pub use field::FieldRef;
pub use op::CompareOp;
pub use predicate::Predicate;
pub use tree::{Conjunction, FilterNode, FilterTree};

use thiserror::Error as ThisError;

///
/// FilterError
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
#[remain::sorted]
pub enum FilterError {
    #[error("invalid field reference '{field}'")]
    InvalidFieldReference { field: String },

    #[error("unsupported operator '{operator}'")]
    InvalidOperator { operator: String },
}
