use crate::{
    access::{OP_VIEW, PermissionChecker, QueryAccessHandler, TypeMetadata},
    cache::CacheMetadata,
    compile::{CompileReport, QueryCompiler},
    error::Error,
    hook::EventBus,
    query::QueryTarget,
};

///
/// QueryAccessOptions
///
/// Per-query access settings. `skip_access` leaves the query untouched;
/// a missing operation means `view`.
///

#[derive(Clone, Copy, Default)]
pub struct QueryAccessOptions<'a> {
    pub operation: Option<&'a str>,
    pub account: Option<&'a dyn PermissionChecker>,
    pub skip_access: bool,
    pub revision_scoped: bool,
}

impl<'a> QueryAccessOptions<'a> {
    #[must_use]
    pub const fn operation(mut self, operation: &'a str) -> Self {
        self.operation = Some(operation);
        self
    }

    #[must_use]
    pub const fn account(mut self, account: &'a dyn PermissionChecker) -> Self {
        self.account = Some(account);
        self
    }

    #[must_use]
    pub const fn skip_access(mut self) -> Self {
        self.skip_access = true;
        self
    }

    #[must_use]
    pub const fn revision_scoped(mut self) -> Self {
        self.revision_scoped = true;
        self
    }
}

/// Restrict `query` to what the account may act on and record the filter's
/// cache dependencies on `cache`.
///
/// Returns `None` when the options skip access checking.
pub fn apply_query_access<M, B>(
    handler: &QueryAccessHandler<M, B>,
    compiler: &dyn QueryCompiler,
    query: &mut dyn QueryTarget,
    options: QueryAccessOptions<'_>,
    cache: &mut CacheMetadata,
) -> Result<Option<CompileReport>, Error>
where
    M: TypeMetadata,
    B: EventBus,
{
    if options.skip_access {
        return Ok(None);
    }

    let operation = options.operation.unwrap_or(OP_VIEW);
    let tree = handler.conditions(operation, options.account)?;
    let report = compiler.compile(&tree, query, options.revision_scoped)?;
    tree.cache_metadata().apply_to(cache);

    Ok(Some(report))
}
