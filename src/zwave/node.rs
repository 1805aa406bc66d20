// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Node snapshots and the attribute map derived from them.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Wake Up command class.
pub const COMMAND_CLASS_WAKE_UP: u8 = 0x84;

/// Sensor Alarm command class.
pub const COMMAND_CLASS_SENSOR_ALARM: u8 = 0x9c;

/// A single value reported by a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeValue {
    /// Command class the value belongs to.
    pub command_class: u8,
    /// Index of the value within its command class.
    #[serde(default)]
    pub index: u8,
    /// Raw value data as reported by the driver.
    #[serde(default)]
    pub data: serde_json::Value,
}

impl NodeValue {
    /// Creates a value.
    #[must_use]
    pub fn new(command_class: u8, index: u8, data: impl Into<serde_json::Value>) -> Self {
        Self {
            command_class,
            index,
            data: data.into(),
        }
    }
}

/// Hexadecimal identifier strings of a node, as reported by the driver.
///
/// Any of them may be blank while the node is still being interviewed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceIds<'a> {
    /// Manufacturer id, e.g. `"0x013c"`.
    pub manufacturer_id: &'a str,
    /// Product type, e.g. `"0x0002"`.
    pub product_type: &'a str,
    /// Product id, e.g. `"0x000d"`.
    pub product_id: &'a str,
}

/// Raw view of a node delivered by the Z-Wave driver.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeSnapshot {
    pub node_id: u8,
    pub name: String,
    pub manufacturer_name: String,
    pub product_name: String,

    pub query_stage: String,
    pub is_awake: bool,
    pub is_ready: bool,
    pub is_failed: bool,
    pub is_info_received: bool,
    pub max_baud_rate: u32,
    pub is_zwave_plus: bool,

    pub capabilities: Vec<String>,
    pub neighbors: Vec<u8>,
    pub location: String,

    pub manufacturer_id: String,
    pub product_type: String,
    pub product_id: String,

    /// Command classes the node supports.
    pub command_classes: BTreeSet<u8>,
    /// Values in driver order.
    pub values: Vec<NodeValue>,
    pub battery_level: Option<u8>,
}

impl NodeSnapshot {
    /// Creates an empty snapshot for `node_id`.
    #[must_use]
    pub fn new(node_id: u8) -> Self {
        Self {
            node_id,
            ..Self::default()
        }
    }

    /// Returns the display name of the node.
    ///
    /// Falls back to `"{manufacturer} {product}"` when the node has no
    /// user-assigned name.
    #[must_use]
    pub fn display_name(&self) -> String {
        let name = self.name.trim();
        if name.is_empty() {
            format!("{} {}", self.manufacturer_name, self.product_name)
                .trim()
                .to_string()
        } else {
            name.to_string()
        }
    }

    /// Returns `true` if the node supports the Wake Up command class.
    #[must_use]
    pub fn can_wake_up(&self) -> bool {
        self.command_classes.contains(&COMMAND_CLASS_WAKE_UP)
    }

    /// Returns the values of a command class in driver order.
    pub fn values_for(&self, command_class: u8) -> impl Iterator<Item = &NodeValue> {
        self.values
            .iter()
            .filter(move |v| v.command_class == command_class)
    }

    /// Returns the wake-up interval, if the node can sleep.
    #[must_use]
    pub fn wake_up_interval(&self) -> Option<serde_json::Value> {
        if !self.can_wake_up() {
            return None;
        }
        self.values_for(COMMAND_CLASS_WAKE_UP)
            .next()
            .map(|v| v.data.clone())
    }

    /// Returns the identifier strings used by workaround lookups.
    #[must_use]
    pub fn device_ids(&self) -> DeviceIds<'_> {
        DeviceIds {
            manufacturer_id: &self.manufacturer_id,
            product_type: &self.product_type,
            product_id: &self.product_id,
        }
    }
}

/// Attributes published for a node.
///
/// The required attributes are always present. Optional ones are `Some`
/// only when the driver reported a non-empty value and are omitted from
/// the serialized map otherwise.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeAttributes {
    pub query_stage: String,
    pub is_awake: bool,
    pub is_ready: bool,
    pub is_failed: bool,
    pub is_info_received: bool,
    pub max_baud_rate: u32,
    pub is_zwave_plus: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capabilities: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub neighbors: Option<Vec<u8>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

impl NodeAttributes {
    /// Builds a fresh attribute set from a snapshot.
    #[must_use]
    pub fn from_snapshot(snapshot: &NodeSnapshot) -> Self {
        Self {
            query_stage: snapshot.query_stage.clone(),
            is_awake: snapshot.is_awake,
            is_ready: snapshot.is_ready,
            is_failed: snapshot.is_failed,
            is_info_received: snapshot.is_info_received,
            max_baud_rate: snapshot.max_baud_rate,
            is_zwave_plus: snapshot.is_zwave_plus,
            capabilities: non_empty_vec(&snapshot.capabilities),
            neighbors: non_empty_vec(&snapshot.neighbors),
            location: Some(snapshot.location.trim())
                .filter(|l| !l.is_empty())
                .map(str::to_string),
        }
    }

    /// Returns the attributes as a JSON object.
    #[must_use]
    pub fn to_map(&self) -> serde_json::Map<String, serde_json::Value> {
        match serde_json::to_value(self) {
            Ok(serde_json::Value::Object(map)) => map,
            _ => serde_json::Map::new(),
        }
    }
}

fn non_empty_vec<T: Clone>(items: &[T]) -> Option<Vec<T>> {
    (!items.is_empty()).then(|| items.to_vec())
}
