// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Z-Wave node state.
//!
//! The Z-Wave driver itself is external: it delivers [`NodeSnapshot`]s
//! and [`NodeStatistics`] through a [`NodeSignalDispatcher`]. This module
//! turns them into published state:
//!
//! - [`NodeQualityTracker`] - attributes, communication quality, status
//! - [`ZWaveNodeEntity`] - the node entity, with debounced emission
//! - [`workaround`] - per-device quirk tables

mod entity;
mod node;
mod quality;
mod signal;
mod tracker;
pub mod workaround;

pub use entity::{DOMAIN, NodeStateUpdate, ZWaveNodeEntity};
pub use node::{
    COMMAND_CLASS_SENSOR_ALARM, COMMAND_CLASS_WAKE_UP, DeviceIds, NodeAttributes, NodeSnapshot,
    NodeValue,
};
pub use quality::{MAX_RTT, NodeStatistics, NodeStatus, Quality};
pub use signal::{NodeSignal, NodeSignalDispatcher, SignalKind};
pub use tracker::{NodeQualityTracker, NodeUpdate};
