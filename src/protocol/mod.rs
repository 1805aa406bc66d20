// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Transport seams between the adapters and the outside world.
//!
//! # Components
//!
//! - [`Publisher`]: outbound `publish(target, payload, qos, retain)`
//! - [`TopicRouter`]: inbound `(topic, payload)` delivery to subscribers
//! - [`topic_matches`]: MQTT topic filter matching (`+`, `#`)
//! - [`MqttBridge`]: a `rumqttc` broker connection implementing both sides
//!   (feature `mqtt`)

#[cfg(feature = "mqtt")]
mod mqtt;
mod topic;
mod topic_router;

#[cfg(feature = "mqtt")]
pub use mqtt::{MqttBridge, MqttBridgeBuilder};
pub use topic::{is_valid_filter, topic_matches};
pub use topic_router::TopicRouter;

use std::sync::Arc;

use crate::error::ProtocolError;
use crate::types::QosLevel;

/// Trait for transports that can publish a message to a target topic.
///
/// Publishing is a fire-and-forget handoff: success means the transport
/// accepted the message, not that a device acted on it.
#[allow(async_fn_in_trait)]
pub trait Publisher {
    /// Publishes `payload` to `topic`.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError` if the transport refuses the message.
    async fn publish(
        &self,
        topic: &str,
        payload: &str,
        qos: QosLevel,
        retain: bool,
    ) -> Result<(), ProtocolError>;
}

impl<P: Publisher> Publisher for Arc<P> {
    async fn publish(
        &self,
        topic: &str,
        payload: &str,
        qos: QosLevel,
        retain: bool,
    ) -> Result<(), ProtocolError> {
        self.as_ref().publish(topic, payload, qos, retain).await
    }
}
