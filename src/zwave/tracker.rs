// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Derives attributes, quality, and status from node refreshes.

use serde::Serialize;

use super::{NodeAttributes, NodeSnapshot, NodeStatistics, NodeStatus, Quality};

/// Result of one node refresh.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeUpdate {
    pub attributes: NodeAttributes,
    pub quality: Quality,
    pub status: NodeStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wake_up_interval: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub battery_level: Option<u8>,
}

impl NodeUpdate {
    /// Computes an update from a snapshot and the node's statistics.
    #[must_use]
    pub fn compute(snapshot: &NodeSnapshot, stats: Option<&NodeStatistics>) -> Self {
        let attributes = NodeAttributes::from_snapshot(snapshot);
        let status = NodeStatus::derive(&attributes);
        Self {
            attributes,
            quality: Quality::from_optional(snapshot.node_id, stats),
            status,
            wake_up_interval: snapshot.wake_up_interval(),
            battery_level: snapshot.battery_level,
        }
    }
}

/// Tracks the derived state of one node.
///
/// Every refresh replaces the previous state wholesale.
#[derive(Debug, Clone)]
pub struct NodeQualityTracker {
    node_id: u8,
    latest: Option<NodeUpdate>,
}

impl NodeQualityTracker {
    /// Creates a tracker with no state.
    #[must_use]
    pub fn new(node_id: u8) -> Self {
        Self {
            node_id,
            latest: None,
        }
    }

    /// Returns the tracked node id.
    #[must_use]
    pub fn node_id(&self) -> u8 {
        self.node_id
    }

    /// Refreshes from a snapshot.
    pub fn on_node_changed(
        &mut self,
        snapshot: &NodeSnapshot,
        stats: Option<&NodeStatistics>,
    ) -> NodeUpdate {
        let update = NodeUpdate::compute(snapshot, stats);
        tracing::debug!(
            node_id = self.node_id,
            status = %update.status,
            quality = update.quality.value(),
            "Node refreshed"
        );
        self.latest = Some(update.clone());
        update
    }

    /// Returns the most recent update.
    #[must_use]
    pub fn latest(&self) -> Option<&NodeUpdate> {
        self.latest.as_ref()
    }

    /// Returns the status, `None` before the first refresh.
    #[must_use]
    pub fn status(&self) -> Option<&NodeStatus> {
        self.latest.as_ref().map(|u| &u.status)
    }

    #[must_use]
    pub fn attributes(&self) -> Option<&NodeAttributes> {
        self.latest.as_ref().map(|u| &u.attributes)
    }

    #[must_use]
    pub fn quality(&self) -> Option<Quality> {
        self.latest.as_ref().map(|u| u.quality)
    }
}
