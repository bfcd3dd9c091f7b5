//! Module: access
//! Responsibility: turn an account's grants on a content type into a filter.
//! Does not own: per-record authorization, authentication, or role mapping.
//! Boundary: output feeds the extension hook and then a compiler.

mod account;
mod builder;
mod handler;
mod metadata;


pub use account::{Account, PermissionChecker};
pub use builder::{
    BuilderMode, FilterBuilder, OP_DELETE, OP_DUPLICATE, OP_UPDATE, OP_VIEW, build_filter,
};
pub use handler::QueryAccessHandler;
pub use metadata::{ContentType, PermissionGranularity, TypeMetadata};

use thiserror::Error as ThisError;

///
/// AccessError
///
/// Broken content-type definitions. Never retried, never downgraded to a
/// permissive filter.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
#[remain::sorted]
pub enum AccessError {
    #[error("content type '{type_id}' declares bundles but has no bundle key")]
    MissingBundleKey { type_id: String },

    #[error("content type '{type_id}' declares an owner but no owner key")]
    MissingOwnerKey { type_id: String },

    #[error("content type '{type_id}' declares a published flag but no published key")]
    MissingPublishedKey { type_id: String },
}
