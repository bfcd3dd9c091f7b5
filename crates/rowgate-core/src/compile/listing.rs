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
/// ListingQueryCompiler
///
/// Compiler for listing queries. Fields are placed relative to a named
/// relationship (the base table when unset). Fields without a storage
/// definition are left out of the query and reported, so legacy or
/// renamed fields in a filter do not break a listing.
///

#[derive(Clone, Debug)]
pub struct ListingQueryCompiler<R> {
    resolver: R,
    options: CompileOptions,
    relationship: Option<String>,
}

impl<R: StorageResolver> ListingQueryCompiler<R> {
    #[must_use]
    pub fn new(resolver: R) -> Self {
        Self {
            resolver,
            options: CompileOptions::default(),
            relationship: None,
        }
    }

    #[must_use]
    pub const fn with_options(mut self, options: CompileOptions) -> Self {
        self.options = options;
        self
    }

    #[must_use]
    pub fn with_relationship(mut self, relationship: impl Into<String>) -> Self {
        self.relationship = Some(relationship.into());
        self
    }

    #[must_use]
    pub fn relationship(&self) -> Option<&str> {
        self.relationship.as_deref()
    }

    fn anchor(&self, query: &dyn QueryTarget) -> Result<Anchor, CompileError> {
        match &self.relationship {
            Some(name) => {
                query
                    .relationship(name)
                    .ok_or_else(|| CompileError::UnknownRelationship {
                        relationship: name.clone(),
                    })
            }
            None => Ok(query.base_anchor()),
        }
    }
}

impl<R: StorageResolver> QueryCompiler for ListingQueryCompiler<R> {
    fn compile(
        &self,
        tree: &FilterTree,
        query: &mut dyn QueryTarget,
        revision_scoped: bool,
    ) -> Result<CompileReport, CompileError> {
        let locator = ListingLocator {
            resolver: &self.resolver,
            anchor: self.anchor(query)?,
            revision_scoped,
        };

        compile_tree(&locator, &self.options, query, tree)
    }
}

///
/// ListingLocator
///

struct ListingLocator<'a, R> {
    resolver: &'a R,
    anchor: Anchor,
    revision_scoped: bool,
}

impl<R: StorageResolver> FieldLocator for ListingLocator<'_, R> {
    fn locate(
        &self,
        query: &mut dyn QueryTarget,
        field: &FieldRef,
        join: JoinKind,
    ) -> Result<Option<Location>, CompileError> {
        let Some(storage) = self.resolver.resolve_field(field.field(), field.column()) else {
            return Ok(None);
        };

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
