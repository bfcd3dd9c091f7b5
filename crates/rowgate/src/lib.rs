//! ## Crate layout
//! - `core`: filter model, permission builder, extension hook, query
//!   targets, and the entity/listing compilers.
//!
//! The `prelude` module carries the vocabulary most callers need to build,
//! inspect, and apply access filters.

pub use rowgate_core as core;

//
// Consts
//

/// Workspace version re-export for downstream tooling/tests.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use crate::core::{
    QUERY_ACCESS_CHANNEL,
    error::{Error, ErrorClass, ErrorOrigin},
};

///
/// Prelude
/// using _ brings traits into scope and avoids name conflicts
///

pub mod prelude {
    pub use crate::core::{
        access::{
            ContentType, OP_DELETE, OP_DUPLICATE, OP_UPDATE, OP_VIEW, QueryAccessHandler,
            build_filter,
        },
        compile::{
            EntityQueryCompiler, ListingQueryCompiler, QueryAccessOptions, QueryCompiler as _,
            StorageResolver as _, apply_query_access,
        },
        config::Config,
        hook::{EventBus as _, QueryAccessEvent, SubscriberRegistry},
        prelude::*,
        query::{ListingQuery, QueryTarget as _, SelectQuery},
    };
}
