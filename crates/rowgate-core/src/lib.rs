//! Core runtime for Rowgate: permission-driven filter trees, the extension
//! hook that rewrites them, and the compilers that lower them into
//! relational query predicates.
#![warn(unreachable_pub)]

#[macro_use]
pub(crate) mod logging;

// public exports are one module level down
pub mod access;
pub mod cache;
pub mod compile;
pub mod config;
pub mod error;
pub mod filter;
pub mod hook;
pub mod query;
pub mod value;

// test
#[cfg(test)]
pub(crate) mod test_fixtures;

///
/// CONSTANTS
///

/// Channel every query-access event is dispatched on first.
pub const QUERY_ACCESS_CHANNEL: &str = "rowgate.query_access";

///
/// Prelude
///
/// Prelude contains only domain vocabulary.
/// No compilers, query objects, or error types are re-exported here.
///

pub mod prelude {
    pub use crate::{
        access::{Account, PermissionChecker, TypeMetadata},
        cache::{CacheMetadata, MaxAge},
        filter::{CompareOp, Conjunction, FilterNode, FilterTree, Predicate},
        value::Value,
    };
}
