// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Entity representing a Z-Wave node.

use std::sync::{Arc, Weak};

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use serde_json::{Map, Value};

use super::{
    NodeAttributes, NodeQualityTracker, NodeSignal, NodeSignalDispatcher, NodeSnapshot,
    NodeStatistics, NodeStatus, NodeUpdate, Quality, SignalKind,
};
use crate::scheduler::UpdateDebouncer;
use crate::subscription::{CallbackRegistry, Subscription, SubscriptionId};

/// Entity id domain of node entities.
pub const DOMAIN: &str = "zwave";

/// State emitted by a [`ZWaveNodeEntity`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeStateUpdate {
    pub entity_id: String,
    /// Status string, `None` before the first refresh.
    pub state: Option<String>,
    pub attributes: Map<String, Value>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug)]
struct NodeInner {
    node_id: u8,
    entity_id: String,
    tracker: RwLock<NodeQualityTracker>,
    callbacks: CallbackRegistry<NodeStateUpdate>,
}

impl NodeInner {
    fn device_state_attributes(&self) -> Map<String, Value> {
        let tracker = self.tracker.read();
        let mut attrs = Map::new();
        attrs.insert("node_id".to_string(), Value::from(self.node_id));

        let Some(update) = tracker.latest() else {
            return attrs;
        };
        attrs.extend(update.attributes.to_map());
        if let Some(battery) = update.battery_level {
            attrs.insert("battery_level".to_string(), Value::from(battery));
        }
        if let Some(interval) = &update.wake_up_interval {
            attrs.insert("wake_up_interval".to_string(), interval.clone());
        }
        attrs.insert("quality".to_string(), Value::from(update.quality.value()));
        attrs
    }

    fn emit(&self) {
        let state = self.tracker.read().status().map(ToString::to_string);
        let update = NodeStateUpdate {
            entity_id: self.entity_id.clone(),
            state,
            attributes: self.device_state_attributes(),
            updated_at: Utc::now(),
        };
        tracing::debug!(entity_id = %update.entity_id, state = ?update.state, "Emitting node state");
        self.callbacks.dispatch(&update);
    }
}

/// A Z-Wave node exposed as an entity.
///
/// Driver signals refresh the node's attributes, quality and status
/// immediately; the resulting state is emitted through an
/// [`UpdateDebouncer`] so a burst of signals produces one update.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use hubstate_lib::zwave::{NodeSignal, NodeSignalDispatcher, NodeSnapshot, SignalKind, ZWaveNodeEntity};
///
/// let dispatcher = NodeSignalDispatcher::new();
/// let snapshot = NodeSnapshot {
///     name: "Front Door".to_string(),
///     is_ready: true,
///     is_awake: true,
///     ..NodeSnapshot::new(7)
/// };
/// let node = Arc::new(ZWaveNodeEntity::new(&snapshot));
/// assert_eq!(node.entity_id(), "zwave.front_door_7");
///
/// let _subscription = node.subscribe(&dispatcher);
/// dispatcher.dispatch(&NodeSignal::new(SignalKind::Node, snapshot, None));
/// assert_eq!(node.state().as_deref(), Some("Ready"));
/// ```
#[derive(Debug)]
pub struct ZWaveNodeEntity {
    name: String,
    inner: Arc<NodeInner>,
    debouncer: UpdateDebouncer,
}

impl ZWaveNodeEntity {
    /// Creates the entity for a node. State stays unknown until the first
    /// refresh.
    #[must_use]
    pub fn new(snapshot: &NodeSnapshot) -> Self {
        let name = snapshot.display_name();
        let entity_id = format!("{DOMAIN}.{}_{}", slugify(&name), snapshot.node_id);

        let inner = Arc::new(NodeInner {
            node_id: snapshot.node_id,
            entity_id,
            tracker: RwLock::new(NodeQualityTracker::new(snapshot.node_id)),
            callbacks: CallbackRegistry::new(),
        });

        let weak: Weak<NodeInner> = Arc::downgrade(&inner);
        let debouncer = UpdateDebouncer::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.emit();
            }
        });

        Self {
            name,
            inner,
            debouncer,
        }
    }

    #[must_use]
    pub fn node_id(&self) -> u8 {
        self.inner.node_id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn entity_id(&self) -> &str {
        &self.inner.entity_id
    }

    /// Subscribes to node signals for this entity.
    ///
    /// Delivery stops when the returned handle or the entity is dropped.
    pub fn subscribe(self: &Arc<Self>, dispatcher: &NodeSignalDispatcher) -> Subscription {
        let entity = Arc::downgrade(self);
        dispatcher.subscribe(move |signal: &NodeSignal| {
            if let Some(entity) = entity.upgrade() {
                entity.network_node_changed(
                    signal.kind,
                    &signal.snapshot,
                    signal.statistics.as_ref(),
                );
            }
        })
    }

    /// Handles a network signal; signals for other nodes are ignored.
    pub fn network_node_changed(
        &self,
        kind: SignalKind,
        snapshot: &NodeSnapshot,
        stats: Option<&NodeStatistics>,
    ) {
        if snapshot.node_id != self.inner.node_id {
            tracing::trace!(
                node_id = self.inner.node_id,
                other = snapshot.node_id,
                %kind,
                "Ignoring signal for another node"
            );
            return;
        }
        self.node_changed(snapshot, stats);
    }

    /// Refreshes the node and schedules a state emission.
    pub fn node_changed(&self, snapshot: &NodeSnapshot, stats: Option<&NodeStatistics>) -> NodeUpdate {
        let update = self.inner.tracker.write().on_node_changed(snapshot, stats);
        self.debouncer.schedule_update();
        update
    }

    /// Returns the status string, `None` before the first refresh.
    #[must_use]
    pub fn state(&self) -> Option<String> {
        self.status().as_ref().map(ToString::to_string)
    }

    #[must_use]
    pub fn status(&self) -> Option<NodeStatus> {
        self.inner.tracker.read().status().cloned()
    }

    #[must_use]
    pub fn attributes(&self) -> Option<NodeAttributes> {
        self.inner.tracker.read().attributes().cloned()
    }

    #[must_use]
    pub fn quality(&self) -> Option<Quality> {
        self.inner.tracker.read().quality()
    }

    /// Returns the published attribute map.
    ///
    /// Always has `node_id`. After a refresh it also carries the node
    /// attributes, `quality`, and `battery_level` and `wake_up_interval`
    /// when known.
    #[must_use]
    pub fn device_state_attributes(&self) -> Map<String, Value> {
        self.inner.device_state_attributes()
    }

    /// Returns `true` while a debounced emission is pending.
    #[must_use]
    pub fn is_update_pending(&self) -> bool {
        self.debouncer.is_pending()
    }

    pub fn on_state_changed<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&NodeStateUpdate) + Send + Sync + 'static,
    {
        self.inner.callbacks.subscribe(callback)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.inner.callbacks.unsubscribe(id)
    }

    /// Cancels any pending emission and drops all state callbacks.
    pub fn dispose(&self) {
        if self.debouncer.cancel() {
            tracing::debug!(entity_id = %self.inner.entity_id, "Cancelled pending node update");
        }
        self.inner.callbacks.clear();
    }
}

/// Lowercases `name` and joins its alphanumeric runs with `_`.
///
/// Entity ids are ASCII. Accented Latin letters fold to their base letter
/// (`Küche` becomes `kuche`); any other non-ASCII character separates words.
fn slugify(name: &str) -> String {
    let mut folded = String::with_capacity(name.len());
    for c in name.chars() {
        match fold_latin(c) {
            Some(ascii) => folded.push_str(ascii),
            None => folded.push(c),
        }
    }

    folded
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(str::to_ascii_lowercase)
        .collect::<Vec<_>>()
        .join("_")
}

/// ASCII spelling of a Latin-1 or common Latin Extended-A letter.
fn fold_latin(c: char) -> Option<&'static str> {
    let ascii = match c {
        'À'..='Å' | 'à'..='å' | 'Ā' | 'ā' | 'Ą' | 'ą' => "a",
        'Æ' | 'æ' => "ae",
        'Ç' | 'ç' | 'Ć' | 'ć' | 'Č' | 'č' => "c",
        'Ď' | 'ď' | 'Đ' | 'đ' | 'Ð' | 'ð' => "d",
        'È'..='Ë' | 'è'..='ë' | 'Ē' | 'ē' | 'Ę' | 'ę' | 'Ě' | 'ě' => "e",
        'Ì'..='Ï' | 'ì'..='ï' => "i",
        'Ł' | 'ł' => "l",
        'Ñ' | 'ñ' | 'Ń' | 'ń' | 'Ň' | 'ň' => "n",
        'Ò'..='Ö' | 'Ø' | 'ò'..='ö' | 'ø' | 'Ő' | 'ő' => "o",
        'Œ' | 'œ' => "oe",
        'Ř' | 'ř' => "r",
        'Ś' | 'ś' | 'Š' | 'š' => "s",
        'ß' => "ss",
        'Ť' | 'ť' => "t",
        'Þ' | 'þ' => "th",
        'Ù'..='Ü' | 'ù'..='ü' | 'Ů' | 'ů' | 'Ű' | 'ű' => "u",
        'Ý' | 'ý' | 'ÿ' | 'Ÿ' => "y",
        'Ź' | 'ź' | 'Ż' | 'ż' | 'Ž' | 'ž' => "z",
        _ => return None,
    };
    Some(ascii)
}
