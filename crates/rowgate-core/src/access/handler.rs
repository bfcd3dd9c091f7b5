use crate::{
    access::{Account, AccessError, BuilderMode, FilterBuilder, PermissionChecker, TypeMetadata},
    filter::FilterTree,
    hook::{EventBus, QueryAccessEvent, SubscriberRegistry, dispatch_query_access},
};

///
/// QueryAccessHandler
///
/// Runs the builder for one content type and hands the result to the
/// extension hook. Types without a builder start from an empty tree, so
/// only subscribers can restrict them.
///

pub struct QueryAccessHandler<M, B = SubscriberRegistry> {
    metadata: M,
    bus: B,
    builder: Option<FilterBuilder>,
    current_account: Option<Account>,
}

impl<M, B> QueryAccessHandler<M, B>
where
    M: TypeMetadata,
    B: EventBus,
{
    #[must_use]
    pub fn new(metadata: M, bus: B) -> Self {
        Self {
            metadata,
            bus,
            builder: Some(FilterBuilder::default()),
            current_account: None,
        }
    }

    /// Handler for a type that has no builder of its own.
    #[must_use]
    pub const fn without_builder(metadata: M, bus: B) -> Self {
        Self {
            metadata,
            bus,
            builder: None,
            current_account: None,
        }
    }

    #[must_use]
    pub fn with_mode(mut self, mode: BuilderMode) -> Self {
        self.builder = Some(FilterBuilder::new(mode));
        self
    }

    /// Account used when `conditions` is called without one.
    #[must_use]
    pub fn with_current_account(mut self, account: Account) -> Self {
        self.current_account = Some(account);
        self
    }

    #[must_use]
    pub const fn metadata(&self) -> &M {
        &self.metadata
    }

    /// Compute the filter for `operation` and let subscribers rewrite it.
    ///
    /// A missing account falls back to the current account, then to the
    /// anonymous account.
    pub fn conditions(
        &self,
        operation: &str,
        account: Option<&dyn PermissionChecker>,
    ) -> Result<FilterTree, AccessError> {
        let anonymous = Account::anonymous();
        let account: &dyn PermissionChecker = match (account, &self.current_account) {
            (Some(account), _) => account,
            (None, Some(current)) => current,
            (None, None) => &anonymous,
        };

        let tree = match &self.builder {
            Some(builder) => builder.build(operation, &self.metadata, account)?,
            None => FilterTree::and(),
        };

        let mut event = QueryAccessEvent::new(tree, operation, account, self.metadata.id());
        dispatch_query_access(&self.bus, &mut event);

        Ok(event.into_tree())
    }
}
