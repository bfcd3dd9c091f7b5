use crate::{
    compile::{
        CompileError, CompileReport, QueryCompiler,
        storage::StorageResolver,
        walk::{FieldLocator, Location, compile_tree, place_field},
    },
    config::CompileOptions,
    filter::{FieldRef, FilterTree},
    query::{Anchor, JoinKind, QueryTarget},
};

///
/// EntityQueryCompiler
///
/// Compiler for generic per-record queries. Every field must resolve; an
/// unknown field fails the compile.
///

#[derive(Clone, Debug)]
pub struct EntityQueryCompiler<R> {
    resolver: R,
    options: CompileOptions,
}

impl<R: StorageResolver> EntityQueryCompiler<R> {
    #[must_use]
    pub fn new(resolver: R) -> Self {
        Self {
            resolver,
            options: CompileOptions::default(),
        }
    }

    #[must_use]
    pub const fn with_options(mut self, options: CompileOptions) -> Self {
        self.options = options;
        self
    }

    #[must_use]
    pub const fn resolver(&self) -> &R {
        &self.resolver
    }
}

impl<R: StorageResolver> QueryCompiler for EntityQueryCompiler<R> {
    fn compile(
        &self,
        tree: &FilterTree,
        query: &mut dyn QueryTarget,
        revision_scoped: bool,
    ) -> Result<CompileReport, CompileError> {
        let locator = EntityLocator {
            resolver: &self.resolver,
            anchor: query.base_anchor(),
            revision_scoped,
        };

        compile_tree(&locator, &self.options, query, tree)
    }
}

///
/// EntityLocator
///

struct EntityLocator<'a, R> {
    resolver: &'a R,
    anchor: Anchor,
    revision_scoped: bool,
}

impl<R: StorageResolver> FieldLocator for EntityLocator<'_, R> {
    fn locate(
        &self,
        query: &mut dyn QueryTarget,
        field: &FieldRef,
        join: JoinKind,
    ) -> Result<Option<Location>, CompileError> {
        let storage = self
            .resolver
            .resolve_field(field.field(), field.column())
            .ok_or_else(|| CompileError::UnknownField {
                field: field.to_string(),
            })?;

        Ok(Some(place_field(
            query,
            self.resolver.tables(),
            &storage,
            &self.anchor,
            self.revision_scoped,
            join,
        )))
    }
}
