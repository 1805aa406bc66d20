// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! MQTT cover entity.

use std::sync::{Arc, Weak};

use chrono::Utc;
use parking_lot::RwLock;

use super::{CoverCommand, CoverConfig, CoverState, CoverStateMachine, CoverUpdate};
use crate::error::ConfigError;
use crate::protocol::{Publisher, TopicRouter};
use crate::subscription::{CallbackRegistry, Subscription, SubscriptionId};
use crate::template::ValueTemplate;
use crate::types::Position;

/// A cover controlled over MQTT.
///
/// Commands are published on the command topic. State feedback arrives
/// on the optional state topic and is interpreted by a
/// [`CoverStateMachine`]. Every accepted change is emitted to the
/// callbacks registered with [`on_state_changed`](Self::on_state_changed).
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use hubstate_lib::cover::{CoverConfig, MqttCover};
/// use hubstate_lib::error::ProtocolError;
/// use hubstate_lib::protocol::{Publisher, TopicRouter};
/// use hubstate_lib::types::QosLevel;
///
/// struct Discard;
///
/// impl Publisher for Discard {
///     async fn publish(&self, _: &str, _: &str, _: QosLevel, _: bool) -> Result<(), ProtocolError> {
///         Ok(())
///     }
/// }
///
/// let router = Arc::new(TopicRouter::new());
/// let config = CoverConfig::new("garage/set").with_state_topic("garage/state");
/// let cover = Arc::new(MqttCover::new(config, Discard).unwrap());
///
/// let _subscription = cover.subscribe(&router);
/// router.route("garage/state", "closed");
/// assert_eq!(cover.is_closed(), Some(true));
/// ```
pub struct MqttCover<P> {
    config: CoverConfig,
    machine: RwLock<CoverStateMachine>,
    publisher: P,
    callbacks: CallbackRegistry<CoverUpdate>,
}

impl<P: Publisher> MqttCover<P> {
    /// Creates a cover from its configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the configuration does not validate.
    pub fn new(config: CoverConfig, publisher: P) -> Result<Self, ConfigError> {
        config.validate()?;
        let machine = CoverStateMachine::new(&config)?;
        tracing::debug!(
            name = %config.name,
            command_topic = %config.command_topic,
            optimistic = config.is_optimistic(),
            "Created MQTT cover"
        );
        Ok(Self {
            config,
            machine: RwLock::new(machine),
            publisher,
            callbacks: CallbackRegistry::new(),
        })
    }

    /// Replaces the value template with a custom one.
    #[must_use]
    pub fn with_value_template(self, template: impl ValueTemplate + 'static) -> Self {
        let machine = self.machine.into_inner().with_template(template);
        Self {
            machine: RwLock::new(machine),
            ..self
        }
    }

    /// Returns the entity name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &CoverConfig {
        &self.config
    }

    /// Returns the commands this cover supports.
    #[must_use]
    pub fn supported_features(&self) -> &'static [CoverCommand] {
        &CoverCommand::ALL
    }

    /// Returns the current state.
    #[must_use]
    pub fn state(&self) -> CoverState {
        self.machine.read().state()
    }

    /// Returns the current position, `None` when unknown.
    #[must_use]
    pub fn current_position(&self) -> Option<Position> {
        self.machine.read().position()
    }

    /// Returns whether the cover is closed, `None` when unknown.
    #[must_use]
    pub fn is_closed(&self) -> Option<bool> {
        self.machine.read().is_closed()
    }

    /// Returns `true` if commands update the state without feedback.
    #[must_use]
    pub fn is_optimistic(&self) -> bool {
        self.machine.read().is_optimistic()
    }

    /// Handles a message from the state topic.
    ///
    /// Returns `true` if the payload was accepted and emitted.
    pub fn handle_message(&self, topic: &str, payload: &str) -> bool {
        let accepted = {
            let mut machine = self.machine.write();
            machine
                .on_inbound_payload(payload)
                .map(|change| (change, machine.state()))
        };

        match accepted {
            Some((change, state)) => {
                tracing::debug!(name = %self.config.name, topic = %topic, ?change, "Cover state received");
                self.emit(change, state);
                true
            }
            None => false,
        }
    }

    /// Opens the cover.
    pub async fn open_cover(&self) {
        self.send(CoverCommand::Open).await;
    }

    /// Closes the cover.
    pub async fn close_cover(&self) {
        self.send(CoverCommand::Close).await;
    }

    /// Stops the cover.
    pub async fn stop_cover(&self) {
        self.send(CoverCommand::Stop).await;
    }

    /// Publishes `command` and applies the optimistic update, if any.
    ///
    /// Publish failures are logged; redelivery is the transport's concern.
    pub async fn send(&self, command: CoverCommand) {
        let payload = self.config.payload_for(command);
        if let Err(e) = self
            .publisher
            .publish(
                &self.config.command_topic,
                payload,
                self.config.qos,
                self.config.retain,
            )
            .await
        {
            tracing::warn!(
                name = %self.config.name,
                %command,
                error = %e,
                "Failed to publish cover command"
            );
        }

        let optimistic = {
            let mut machine = self.machine.write();
            machine
                .on_command(command)
                .map(|change| (change, machine.state()))
        };
        if let Some((change, state)) = optimistic {
            self.emit(change, state);
        }
    }

    /// Registers a callback for every emitted state.
    pub fn on_state_changed<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&CoverUpdate) + Send + Sync + 'static,
    {
        self.callbacks.subscribe(callback)
    }

    /// Removes a callback registered with [`on_state_changed`](Self::on_state_changed).
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.callbacks.unsubscribe(id)
    }

    fn emit(&self, change: super::CoverStateChange, state: CoverState) {
        let update = CoverUpdate {
            name: self.config.name.clone(),
            change,
            state,
            updated_at: Utc::now(),
        };
        self.callbacks.dispatch(&update);
    }
}

impl<P> MqttCover<P>
where
    P: Publisher + Send + Sync + 'static,
{
    /// Routes the state topic to this cover at the configured QoS.
    ///
    /// Returns `None` when no state topic is configured. The route lives
    /// as long as the returned [`Subscription`]; it holds only a weak
    /// reference to the cover.
    pub fn subscribe(self: &Arc<Self>, router: &Arc<TopicRouter>) -> Option<Subscription> {
        let topic = self.config.state_topic.as_deref()?;
        let cover: Weak<Self> = Arc::downgrade(self);
        Some(
            router.subscribe_with_qos(topic, self.config.qos, move |topic, payload| {
                if let Some(cover) = cover.upgrade() {
                    cover.handle_message(topic, payload);
                }
            }),
        )
    }
}

impl<P> std::fmt::Debug for MqttCover<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MqttCover")
            .field("name", &self.config.name)
            .field("state", &self.machine.read().state())
            .field("callbacks", &self.callbacks)
            .finish_non_exhaustive()
    }
}
