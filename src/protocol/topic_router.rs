// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Inbound message routing.
//!
//! The [`TopicRouter`] delivers incoming `(topic, payload)` pairs to every
//! callback whose topic filter matches.
//!
//! # Architecture
//!
//! ```text
//! MQTT Message: home/garage/door/state → closed
//!                     ↓
//!             TopicRouter.route()
//!                     ↓
//!   filters matching "home/garage/door/state"
//!                     ↓
//!        MqttCover.handle_message(topic, payload)
//!                     ↓
//!      CoverStateMachine.on_inbound_payload()
//! ```
//!
//! Routes are owned by the [`Subscription`] returned from
//! [`TopicRouter::subscribe`]; dropping it removes the route.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Arc, Weak};

use parking_lot::RwLock;

use super::topic::topic_matches;
use crate::subscription::{IdGenerator, Subscription, SubscriptionId, SubscriptionSource};
use crate::types::QosLevel;

type MessageCallback = Arc<dyn Fn(&str, &str) + Send + Sync>;

struct Route {
    filter: String,
    qos: QosLevel,
    callback: MessageCallback,
}

/// Routes inbound messages to topic subscribers.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use hubstate_lib::protocol::TopicRouter;
///
/// let router = Arc::new(TopicRouter::new());
/// let hits = Arc::new(AtomicUsize::new(0));
/// let hits_clone = hits.clone();
///
/// let subscription = router.subscribe("home/+/state", move |_topic, _payload| {
///     hits_clone.fetch_add(1, Ordering::SeqCst);
/// });
///
/// assert_eq!(router.route("home/blind/state", "open"), 1);
/// drop(subscription);
/// assert_eq!(router.route("home/blind/state", "open"), 0);
/// assert_eq!(hits.load(Ordering::SeqCst), 1);
/// ```
#[derive(Default)]
pub struct TopicRouter {
    ids: IdGenerator,
    routes: RwLock<HashMap<SubscriptionId, Route>>,
}

impl TopicRouter {
    /// Creates a new empty topic router.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `callback` for messages matching `filter` at the default
    /// QoS.
    ///
    /// The route stays active until the returned [`Subscription`] is
    /// dropped or unsubscribed.
    pub fn subscribe<F>(self: &Arc<Self>, filter: impl Into<String>, callback: F) -> Subscription
    where
        F: Fn(&str, &str) + Send + Sync + 'static,
    {
        self.subscribe_with_qos(filter, QosLevel::default(), callback)
    }

    /// Registers `callback` for messages matching `filter`, requesting
    /// `qos` for the broker subscription.
    ///
    /// Routes sharing a filter are subscribed at the highest QoS any of
    /// them requests, see [`filter_qos`](Self::filter_qos).
    pub fn subscribe_with_qos<F>(
        self: &Arc<Self>,
        filter: impl Into<String>,
        qos: QosLevel,
        callback: F,
    ) -> Subscription
    where
        F: Fn(&str, &str) + Send + Sync + 'static,
    {
        let filter = filter.into();
        let id = self.ids.next();
        tracing::debug!(filter = %filter, %id, %qos, "Registering topic route");
        self.routes.write().insert(
            id,
            Route {
                filter,
                qos,
                callback: Arc::new(callback),
            },
        );

        let source: Weak<Self> = Arc::downgrade(self);
        Subscription::new(id, source)
    }

    /// Delivers a message to every matching route.
    ///
    /// Returns the number of callbacks invoked.
    pub fn route(&self, topic: &str, payload: &str) -> usize {
        let matching: Vec<MessageCallback> = self
            .routes
            .read()
            .values()
            .filter(|route| topic_matches(&route.filter, topic))
            .map(|route| Arc::clone(&route.callback))
            .collect();

        if matching.is_empty() {
            tracing::trace!(topic = %topic, "No route for topic");
        }

        for callback in &matching {
            callback(topic, payload);
        }
        matching.len()
    }

    /// Returns the distinct topic filters currently routed.
    #[must_use]
    pub fn filters(&self) -> BTreeSet<String> {
        self.routes
            .read()
            .values()
            .map(|route| route.filter.clone())
            .collect()
    }

    /// Returns each routed filter with the highest QoS requested for it.
    #[must_use]
    pub fn filter_qos(&self) -> BTreeMap<String, QosLevel> {
        let mut wanted = BTreeMap::new();
        for route in self.routes.read().values() {
            wanted
                .entry(route.filter.clone())
                .and_modify(|qos: &mut QosLevel| *qos = (*qos).max(route.qos))
                .or_insert(route.qos);
        }
        wanted
    }

    /// Returns `true` if any route still uses `filter`.
    #[must_use]
    pub fn has_filter(&self, filter: &str) -> bool {
        self.routes.read().values().any(|route| route.filter == filter)
    }

    /// Returns the number of registered routes.
    #[must_use]
    pub fn route_count(&self) -> usize {
        self.routes.read().len()
    }
}

impl SubscriptionSource for TopicRouter {
    fn release(&self, id: SubscriptionId) -> bool {
        let removed = self.routes.write().remove(&id);
        if let Some(route) = &removed {
            tracing::debug!(filter = %route.filter, %id, "Removed topic route");
        }
        removed.is_some()
    }
}

impl std::fmt::Debug for TopicRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TopicRouter")
            .field("route_count", &self.route_count())
            .finish()
    }
}
