//! Module: hook
//! Responsibility: ordered, synchronous broadcast of computed filter trees.
//! Does not own: filter construction or compilation.
//! Boundary: subscribers may add to, replace, or deny the tree in place.
//!
//! Every event goes out on the generic channel first and on the
//! type-specific channel second. Within a channel, subscribers run in
//! registration order.


use crate::{QUERY_ACCESS_CHANNEL, access::PermissionChecker, filter::FilterTree};
use std::collections::BTreeMap;

/// Type-specific channel name for `type_id`.
#[must_use]
pub fn type_channel(type_id: &str) -> String {
    format!("{QUERY_ACCESS_CHANNEL}.{type_id}")
}

///
/// QueryAccessEvent
///
/// Mutable payload handed to each subscriber in turn.
///

pub struct QueryAccessEvent<'a> {
    tree: FilterTree,
    operation: &'a str,
    account: &'a dyn PermissionChecker,
    type_id: &'a str,
}

impl<'a> QueryAccessEvent<'a> {
    #[must_use]
    pub fn new(
        tree: FilterTree,
        operation: &'a str,
        account: &'a dyn PermissionChecker,
        type_id: &'a str,
    ) -> Self {
        Self {
            tree,
            operation,
            account,
            type_id,
        }
    }

    #[must_use]
    pub const fn tree(&self) -> &FilterTree {
        &self.tree
    }

    pub const fn tree_mut(&mut self) -> &mut FilterTree {
        &mut self.tree
    }

    /// Swap in a new tree, returning the previous one.
    pub fn replace_tree(&mut self, tree: FilterTree) -> FilterTree {
        std::mem::replace(&mut self.tree, tree)
    }

    #[must_use]
    pub const fn operation(&self) -> &str {
        self.operation
    }

    #[must_use]
    pub fn account(&self) -> &dyn PermissionChecker {
        self.account
    }

    #[must_use]
    pub const fn type_id(&self) -> &str {
        self.type_id
    }

    #[must_use]
    pub fn into_tree(self) -> FilterTree {
        self.tree
    }
}

///
/// QueryAccessSubscriber
///

pub trait QueryAccessSubscriber {
    fn on_query_access(&self, event: &mut QueryAccessEvent<'_>);
}

impl<F> QueryAccessSubscriber for F
where
    F: Fn(&mut QueryAccessEvent<'_>),
{
    fn on_query_access(&self, event: &mut QueryAccessEvent<'_>) {
        self(event);
    }
}

///
/// EventBus
///

pub trait EventBus {
    fn dispatch(&self, channel: &str, event: &mut QueryAccessEvent<'_>);
}

impl<B: EventBus + ?Sized> EventBus for &B {
    fn dispatch(&self, channel: &str, event: &mut QueryAccessEvent<'_>) {
        (**self).dispatch(channel, event);
    }
}

/// Dispatch on the generic channel, then on the type-specific one.
pub fn dispatch_query_access(bus: &dyn EventBus, event: &mut QueryAccessEvent<'_>) {
    let specific = type_channel(event.type_id());

    bus.dispatch(QUERY_ACCESS_CHANNEL, event);
    bus.dispatch(&specific, event);
}

///
/// SubscriberRegistry
///
/// Subscribers registered at startup, keyed by channel.
///

#[derive(Default)]
pub struct SubscriberRegistry {
    channels: BTreeMap<String, Vec<Box<dyn QueryAccessSubscriber>>>,
}

impl SubscriberRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(
        &mut self,
        channel: impl Into<String>,
        subscriber: impl QueryAccessSubscriber + 'static,
    ) -> &mut Self {
        self.channels
            .entry(channel.into())
            .or_default()
            .push(Box::new(subscriber));
        self
    }

    /// Subscribe to events for every content type.
    pub fn subscribe_all(
        &mut self,
        subscriber: impl QueryAccessSubscriber + 'static,
    ) -> &mut Self {
        self.subscribe(QUERY_ACCESS_CHANNEL, subscriber)
    }

    /// Subscribe to events for one content type.
    pub fn subscribe_type(
        &mut self,
        type_id: &str,
        subscriber: impl QueryAccessSubscriber + 'static,
    ) -> &mut Self {
        self.subscribe(type_channel(type_id), subscriber)
    }

    #[must_use]
    pub fn subscriber_count(&self, channel: &str) -> usize {
        self.channels.get(channel).map_or(0, Vec::len)
    }
}

impl EventBus for SubscriberRegistry {
    fn dispatch(&self, channel: &str, event: &mut QueryAccessEvent<'_>) {
        let Some(subscribers) = self.channels.get(channel) else {
            return;
        };

        rowgate_log!(
            log::Level::Trace,
            "access.dispatch",
            "channel={} subscribers={}",
            channel,
            subscribers.len()
        );

        for subscriber in subscribers {
            subscriber.on_query_access(event);
        }
    }
}
