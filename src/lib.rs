// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `HubState` Lib - device state derivation for home-automation hubs.
//!
//! This library turns raw vendor telemetry into canonical device state:
//!
//! - **MQTT covers**: blinds and garage doors driven by command tokens,
//!   with state from feedback payloads or optimistic assumptions
//! - **Z-Wave nodes**: attributes, communication quality and lifecycle
//!   status derived from driver snapshots, emitted with a debounce
//! - **Workarounds**: per-device quirk lookup by manufacturer, product
//!   type and product id
//!
//! The transports are seams: [`protocol::Publisher`] for outbound
//! messages and [`protocol::TopicRouter`] for inbound ones. With the `mqtt`
//! feature (on by default) [`protocol::MqttBridge`] implements both on top
//! of `rumqttc`.
//!
//! # Quick Start
//!
//! ## MQTT Cover
//!
//! ```no_run
//! use std::sync::Arc;
//! use hubstate_lib::cover::{CoverConfig, MqttCover};
//! use hubstate_lib::protocol::MqttBridge;
//!
//! #[tokio::main]
//! async fn main() -> hubstate_lib::Result<()> {
//!     let bridge = Arc::new(MqttBridge::connect("mqtt://192.168.1.50:1883").await?);
//!
//!     let config = CoverConfig::new("garage/door/set").with_state_topic("garage/door/state");
//!     let cover = Arc::new(MqttCover::new(config, Arc::clone(&bridge))?);
//!     let _route = cover.subscribe(bridge.router());
//!     bridge.sync_subscriptions().await?;
//!
//!     cover.on_state_changed(|update| {
//!         println!("{} is now {:?}", update.name, update.state.is_closed());
//!     });
//!
//!     cover.open_cover().await;
//!     Ok(())
//! }
//! ```
//!
//! ## Z-Wave Node
//!
//! ```
//! use std::sync::Arc;
//! use hubstate_lib::zwave::{NodeSignal, NodeSignalDispatcher, NodeSnapshot, SignalKind, ZWaveNodeEntity};
//!
//! let dispatcher = NodeSignalDispatcher::new();
//! let snapshot = NodeSnapshot {
//!     name: "Hallway Motion".to_string(),
//!     query_stage: "Probe".to_string(),
//!     is_awake: true,
//!     is_failed: true,
//!     ..NodeSnapshot::new(4)
//! };
//!
//! let node = Arc::new(ZWaveNodeEntity::new(&snapshot));
//! let _subscription = node.subscribe(&dispatcher);
//!
//! dispatcher.dispatch(&NodeSignal::new(SignalKind::Node, snapshot, None));
//! assert_eq!(node.state().as_deref(), Some("Dead (Probe)"));
//! assert_eq!(node.quality().map(|q| q.value()), Some(20));
//! ```

pub mod cover;
pub mod error;
pub mod protocol;
pub mod scheduler;
pub mod subscription;
pub mod template;
pub mod types;
pub mod zwave;

pub use cover::{CoverCommand, CoverConfig, CoverState, CoverStateMachine, MqttCover};
pub use error::{ConfigError, Error, ParseError, ProtocolError, Result, ValueError};
#[cfg(feature = "mqtt")]
pub use protocol::{MqttBridge, MqttBridgeBuilder};
pub use protocol::{Publisher, TopicRouter};
pub use scheduler::UpdateDebouncer;
pub use subscription::{CallbackRegistry, Subscription, SubscriptionId};
pub use types::{Position, QosLevel};
pub use zwave::workaround::{Component, Workaround, WorkaroundTable};
pub use zwave::{NodeQualityTracker, NodeSnapshot, NodeStatistics, NodeStatus, Quality, ZWaveNodeEntity};
