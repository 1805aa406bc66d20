// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Network signals delivered by the Z-Wave driver.

use std::fmt;
use std::sync::{Arc, Weak};

use super::{NodeSnapshot, NodeStatistics};
use crate::subscription::{CallbackRegistry, Subscription, SubscriptionSource};

/// Kind of network signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignalKind {
    /// A value of the node changed.
    ValueChanged,
    /// The node itself changed (interview progress, wake-up, ...).
    Node,
    /// The driver sent a notification about the node.
    Notification,
}

impl fmt::Display for SignalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::ValueChanged => "value_changed",
            Self::Node => "node",
            Self::Notification => "notification",
        })
    }
}

/// A signal about one node, carrying its current snapshot.
#[derive(Debug, Clone)]
pub struct NodeSignal {
    pub kind: SignalKind,
    pub snapshot: Arc<NodeSnapshot>,
    pub statistics: Option<NodeStatistics>,
}

impl NodeSignal {
    #[must_use]
    pub fn new(
        kind: SignalKind,
        snapshot: impl Into<Arc<NodeSnapshot>>,
        statistics: Option<NodeStatistics>,
    ) -> Self {
        Self {
            kind,
            snapshot: snapshot.into(),
            statistics,
        }
    }

    /// Returns the id of the node the signal is about.
    #[must_use]
    pub fn node_id(&self) -> u8 {
        self.snapshot.node_id
    }
}

/// Fans node signals out to subscribed entities.
///
/// Entities subscribe explicitly and keep the returned [`Subscription`];
/// dropping it stops delivery.
#[derive(Debug, Default)]
pub struct NodeSignalDispatcher {
    registry: Arc<CallbackRegistry<NodeSignal>>,
}

impl NodeSignalDispatcher {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `callback` for every signal.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&NodeSignal) + Send + Sync + 'static,
    {
        let id = self.registry.subscribe(callback);
        let source: Weak<CallbackRegistry<NodeSignal>> = Arc::downgrade(&self.registry);
        let source: Weak<dyn SubscriptionSource> = source;
        Subscription::new(id, source)
    }

    /// Delivers a signal, returning the number of callbacks invoked.
    pub fn dispatch(&self, signal: &NodeSignal) -> usize {
        tracing::trace!(kind = %signal.kind, node_id = signal.node_id(), "Dispatching node signal");
        self.registry.dispatch(signal)
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.registry.callback_count()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[test]
    fn dispatch_reaches_subscribers() {
        let dispatcher = NodeSignalDispatcher::new();
        let seen = Arc::new(AtomicUsize::new(0));
        let seen_clone = Arc::clone(&seen);
        let _subscription = dispatcher.subscribe(move |signal| {
            seen_clone.fetch_add(usize::from(signal.node_id()), Ordering::SeqCst);
        });

        let signal = NodeSignal::new(SignalKind::Node, NodeSnapshot::new(5), None);
        assert_eq!(dispatcher.dispatch(&signal), 1);
        assert_eq!(seen.load(Ordering::SeqCst), 5);
    }

    #[test]
    fn dropping_subscription_stops_delivery() {
        let dispatcher = NodeSignalDispatcher::new();
        let subscription = dispatcher.subscribe(|_| {});
        assert_eq!(dispatcher.subscriber_count(), 1);

        drop(subscription);
        assert_eq!(dispatcher.subscriber_count(), 0);
        let signal = NodeSignal::new(SignalKind::ValueChanged, NodeSnapshot::new(1), None);
        assert_eq!(dispatcher.dispatch(&signal), 0);
    }

    #[test]
    fn subscription_outliving_dispatcher() {
        let dispatcher = NodeSignalDispatcher::new();
        let subscription = dispatcher.subscribe(|_| {});
        drop(dispatcher);
        assert!(!subscription.is_active());
        assert!(!subscription.unsubscribe());
    }

    #[test]
    fn signal_kind_display() {
        assert_eq!(SignalKind::ValueChanged.to_string(), "value_changed");
        assert_eq!(SignalKind::Notification.to_string(), "notification");
    }
}
