// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! MQTT transport built on `rumqttc`.
//!
//! [`MqttBridge`] owns one broker connection. Outbound cover commands go
//! through its [`Publisher`] implementation; inbound messages are handed
//! to a shared [`TopicRouter`].

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::RwLock;
use rumqttc::{AsyncClient, EventLoop, MqttOptions};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use super::{Publisher, TopicRouter};
use crate::error::ProtocolError;
use crate::subscription::Subscription;
use crate::types::QosLevel;

/// Global counter for generating unique client IDs.
static CLIENT_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

struct BridgeInner {
    client: AsyncClient,
    router: Arc<TopicRouter>,
    /// Broker-side subscriptions by filter, replayed after reconnects.
    filters: RwLock<HashMap<String, QosLevel>>,
    connected: AtomicBool,
}

/// A connection to an MQTT broker shared by the entities of one hub.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use hubstate_lib::cover::{CoverConfig, MqttCover};
/// use hubstate_lib::protocol::MqttBridge;
///
/// # async fn example() -> hubstate_lib::Result<()> {
/// let bridge = Arc::new(MqttBridge::connect("mqtt://192.168.1.50:1883").await?);
///
/// let config = CoverConfig::new("garage/door/set").with_state_topic("garage/door/state");
/// let cover = Arc::new(MqttCover::new(config, Arc::clone(&bridge))?);
/// let _subscription = cover.subscribe(bridge.router());
/// bridge.sync_subscriptions().await?;
///
/// cover.open_cover().await;
/// # Ok(())
/// # }
/// ```
pub struct MqttBridge {
    inner: Arc<BridgeInner>,
    event_task: JoinHandle<()>,
}

impl MqttBridge {
    /// Creates a new builder for configuring the broker connection.
    #[must_use]
    pub fn builder() -> MqttBridgeBuilder {
        MqttBridgeBuilder::default()
    }

    /// Connects to a broker given as `mqtt://host:port`, `tcp://host:port`
    /// or `host[:port]`.
    ///
    /// # Errors
    ///
    /// Returns error if the URL is invalid or the connection fails.
    pub async fn connect(broker_url: &str) -> Result<Self, ProtocolError> {
        Self::builder().broker(broker_url).build().await
    }

    /// Returns the router receiving every inbound message.
    #[must_use]
    pub fn router(&self) -> &Arc<TopicRouter> {
        &self.inner.router
    }

    /// Returns whether the broker connection is currently up.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.inner.connected.load(Ordering::Acquire)
    }

    /// Routes `filter` to `callback` and subscribes at the broker.
    ///
    /// The broker subscription uses the highest QoS requested by any
    /// route on `filter`, so a weaker request never downgrades it.
    ///
    /// # Errors
    ///
    /// Returns error if the broker subscription cannot be queued.
    pub async fn subscribe<F>(
        &self,
        filter: &str,
        qos: QosLevel,
        callback: F,
    ) -> Result<Subscription, ProtocolError>
    where
        F: Fn(&str, &str) + Send + Sync + 'static,
    {
        let subscription = self
            .inner
            .router
            .subscribe_with_qos(filter, qos, callback);
        let wanted = self
            .inner
            .router
            .filter_qos()
            .get(filter)
            .copied()
            .unwrap_or(qos);
        if self.subscribed_qos(filter) != Some(wanted) {
            self.subscribe_filter(filter, wanted).await?;
        }
        Ok(subscription)
    }

    /// Subscribes at the broker to every filter the router carries that
    /// is not yet subscribed, and drops broker subscriptions whose routes
    /// are gone.
    ///
    /// Each filter is subscribed at the highest QoS its routes request. A
    /// filter already subscribed at a different level is subscribed again
    /// so the broker grant follows the routes.
    ///
    /// Call after entities registered their routes through
    /// [`router`](Self::router) directly.
    ///
    /// # Errors
    ///
    /// Returns error if a subscribe or unsubscribe request cannot be queued.
    pub async fn sync_subscriptions(&self) -> Result<(), ProtocolError> {
        let wanted = self.inner.router.filter_qos();
        let stale: Vec<String> = self
            .inner
            .filters
            .read()
            .keys()
            .filter(|filter| !wanted.contains_key(*filter))
            .cloned()
            .collect();

        for filter in stale {
            self.inner.filters.write().remove(&filter);
            tracing::debug!(filter = %filter, "Unsubscribing from MQTT filter");
            self.inner.client.unsubscribe(&filter).await?;
        }

        for (filter, qos) in wanted {
            if self.subscribed_qos(&filter) != Some(qos) {
                self.subscribe_filter(&filter, qos).await?;
            }
        }
        Ok(())
    }

    /// Returns the QoS the bridge last requested from the broker for
    /// `filter`, or `None` if it is not subscribed.
    #[must_use]
    pub fn subscribed_qos(&self, filter: &str) -> Option<QosLevel> {
        self.inner.filters.read().get(filter).copied()
    }

    async fn subscribe_filter(&self, filter: &str, qos: QosLevel) -> Result<(), ProtocolError> {
        self.inner.filters.write().insert(filter.to_string(), qos);
        tracing::debug!(filter = %filter, %qos, "Subscribing to MQTT filter");
        self.inner.client.subscribe(filter, qos.into()).await?;
        Ok(())
    }

    /// Disconnects from the broker.
    ///
    /// # Errors
    ///
    /// Returns error if the disconnect request cannot be queued.
    pub async fn disconnect(&self) -> Result<(), ProtocolError> {
        self.inner.client.disconnect().await?;
        self.inner.connected.store(false, Ordering::Release);
        Ok(())
    }
}

impl Publisher for MqttBridge {
    async fn publish(
        &self,
        topic: &str,
        payload: &str,
        qos: QosLevel,
        retain: bool,
    ) -> Result<(), ProtocolError> {
        tracing::debug!(topic = %topic, payload = %payload, %qos, retain, "Publishing MQTT message");

        self.inner
            .client
            .publish(topic, qos.into(), retain, payload.as_bytes().to_vec())
            .await
            .map_err(ProtocolError::Mqtt)
    }
}

impl Drop for MqttBridge {
    fn drop(&mut self) {
        self.event_task.abort();
    }
}

impl std::fmt::Debug for MqttBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MqttBridge")
            .field("connected", &self.is_connected())
            .field("filters", &self.inner.filters.read().len())
            .field("router", &self.inner.router)
            .finish_non_exhaustive()
    }
}

/// Builder for an [`MqttBridge`].
///
/// # Examples
///
/// ```no_run
/// use std::time::Duration;
/// use hubstate_lib::protocol::MqttBridge;
///
/// # async fn example() -> hubstate_lib::Result<()> {
/// let bridge = MqttBridge::builder()
///     .broker("mqtt://192.168.1.50:1883")
///     .credentials("hub", "secret")
///     .keep_alive(Duration::from_secs(60))
///     .build()
///     .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct MqttBridgeBuilder {
    broker: Option<String>,
    username: Option<String>,
    password: Option<String>,
    client_id: Option<String>,
    keep_alive: Option<Duration>,
    connection_timeout: Option<Duration>,
    router: Option<Arc<TopicRouter>>,
}

impl MqttBridgeBuilder {
    /// Sets the MQTT broker URL.
    #[must_use]
    pub fn broker(mut self, broker: impl Into<String>) -> Self {
        self.broker = Some(broker.into());
        self
    }

    /// Sets authentication credentials for the MQTT broker.
    #[must_use]
    pub fn credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// Sets a custom client ID.
    #[must_use]
    pub fn client_id(mut self, id: impl Into<String>) -> Self {
        self.client_id = Some(id.into());
        self
    }

    /// Sets the keep-alive interval (default 30s).
    #[must_use]
    pub fn keep_alive(mut self, duration: Duration) -> Self {
        self.keep_alive = Some(duration);
        self
    }

    /// Sets how long to wait for the broker's CONNACK (default 10s).
    #[must_use]
    pub fn connection_timeout(mut self, duration: Duration) -> Self {
        self.connection_timeout = Some(duration);
        self
    }

    /// Uses an existing router instead of creating a new one.
    #[must_use]
    pub fn router(mut self, router: Arc<TopicRouter>) -> Self {
        self.router = Some(router);
        self
    }

    /// Builds and connects the bridge.
    ///
    /// # Errors
    ///
    /// Returns error if the broker is missing or invalid, or if no CONNACK
    /// arrives in time.
    pub async fn build(self) -> Result<MqttBridge, ProtocolError> {
        let broker = self
            .broker
            .ok_or_else(|| ProtocolError::InvalidAddress("broker is required".to_string()))?;
        let (host, port) = parse_mqtt_url(&broker)?;

        // PID + counter to avoid conflicts between processes and bridges
        let client_id = self.client_id.unwrap_or_else(|| {
            let counter = CLIENT_ID_COUNTER.fetch_add(1, Ordering::Relaxed);
            format!("hubstate_{}_{}", std::process::id(), counter)
        });

        let mut mqtt_options = MqttOptions::new(&client_id, host.clone(), port);
        mqtt_options.set_keep_alive(self.keep_alive.unwrap_or(Duration::from_secs(30)));
        mqtt_options.set_clean_session(true);

        if let (Some(username), Some(password)) = (self.username, self.password) {
            mqtt_options.set_credentials(username, password);
        }

        let (client, event_loop) = AsyncClient::new(mqtt_options, 10);

        let inner = Arc::new(BridgeInner {
            client,
            router: self.router.unwrap_or_default(),
            filters: RwLock::new(HashMap::new()),
            connected: AtomicBool::new(false),
        });

        let (connack_tx, connack_rx) = oneshot::channel();
        let event_task = tokio::spawn(handle_bridge_events(
            event_loop,
            Arc::clone(&inner),
            connack_tx,
        ));
        let bridge = MqttBridge { inner, event_task };

        let timeout = self.connection_timeout.unwrap_or(Duration::from_secs(10));
        match tokio::time::timeout(timeout, connack_rx).await {
            Ok(Ok(())) => {
                tracing::info!(host = %host, port, "Connected to MQTT broker");
                Ok(bridge)
            }
            Ok(Err(_)) => Err(ProtocolError::ChannelClosed(
                "MQTT event loop terminated before CONNACK".to_string(),
            )),
            Err(_) => Err(ProtocolError::ConnectionFailed(format!(
                "MQTT connection timeout after {}s",
                timeout.as_secs()
            ))),
        }
    }
}

/// Parses an MQTT URL into host and port.
fn parse_mqtt_url(url: &str) -> Result<(String, u16), ProtocolError> {
    let url = url
        .strip_prefix("mqtt://")
        .or_else(|| url.strip_prefix("tcp://"))
        .unwrap_or(url);

    let (host, port) = if let Some((h, p)) = url.rsplit_once(':') {
        let port = p
            .parse()
            .map_err(|_| ProtocolError::InvalidAddress(format!("Invalid port: {p}")))?;
        (h.to_string(), port)
    } else {
        (url.to_string(), 1883)
    };

    if host.is_empty() {
        return Err(ProtocolError::InvalidAddress(
            "MQTT broker host is required".to_string(),
        ));
    }

    Ok((host, port))
}

/// Drives the `rumqttc` event loop and feeds the router.
async fn handle_bridge_events(
    mut event_loop: EventLoop,
    inner: Arc<BridgeInner>,
    connack_tx: oneshot::Sender<()>,
) {
    use rumqttc::{Event, Packet};

    let mut connack_tx = Some(connack_tx);

    loop {
        match event_loop.poll().await {
            Ok(Event::Incoming(Packet::ConnAck(connack))) => {
                tracing::debug!(?connack, "MQTT bridge connected");
                inner.connected.store(true, Ordering::Release);
                if let Some(tx) = connack_tx.take() {
                    let _ = tx.send(());
                } else {
                    resubscribe(&inner).await;
                }
            }
            Ok(Event::Incoming(Packet::SubAck(suback))) => {
                tracing::debug!(?suback, "MQTT subscription acknowledged");
            }
            Ok(Event::Incoming(Packet::Publish(publish))) => {
                match std::str::from_utf8(&publish.payload) {
                    Ok(payload) => {
                        tracing::debug!(topic = %publish.topic, payload = %payload, "MQTT message received");
                        inner.router.route(&publish.topic, payload);
                    }
                    Err(e) => {
                        tracing::warn!(topic = %publish.topic, error = %e, "Dropping non UTF-8 MQTT payload");
                    }
                }
            }
            Ok(Event::Incoming(Packet::Disconnect)) => {
                tracing::info!("MQTT broker disconnected");
                inner.connected.store(false, Ordering::Release);
                break;
            }
            Ok(_) => {}
            Err(e) => {
                tracing::error!(error = %e, "MQTT bridge event loop error");
                inner.connected.store(false, Ordering::Release);
                if connack_tx.is_some() {
                    // Never connected: let `build` report the failure
                    break;
                }
                // rumqttc reconnects on the next poll
                tokio::time::sleep(Duration::from_secs(1)).await;
            }
        }
    }
}

/// Replays broker subscriptions after a reconnect with a clean session.
async fn resubscribe(inner: &BridgeInner) {
    let filters: Vec<(String, QosLevel)> = inner
        .filters
        .read()
        .iter()
        .map(|(filter, qos)| (filter.clone(), *qos))
        .collect();

    for (filter, qos) in filters {
        if let Err(e) = inner.client.subscribe(&filter, qos.into()).await {
            tracing::warn!(filter = %filter, error = %e, "Failed to resubscribe");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_mqtt_url_with_port() {
        let (host, port) = parse_mqtt_url("mqtt://192.168.1.50:1883").unwrap();
        assert_eq!(host, "192.168.1.50");
        assert_eq!(port, 1883);
    }

    #[test]
    fn parse_mqtt_url_default_port() {
        let (host, port) = parse_mqtt_url("192.168.1.50").unwrap();
        assert_eq!(host, "192.168.1.50");
        assert_eq!(port, 1883);
    }

    #[test]
    fn parse_mqtt_url_tcp_scheme() {
        let (host, port) = parse_mqtt_url("tcp://broker.local:8883").unwrap();
        assert_eq!(host, "broker.local");
        assert_eq!(port, 8883);
    }

    #[test]
    fn parse_mqtt_url_invalid() {
        assert!(matches!(
            parse_mqtt_url("mqtt://broker:port"),
            Err(ProtocolError::InvalidAddress(_))
        ));
        assert!(matches!(
            parse_mqtt_url("mqtt://"),
            Err(ProtocolError::InvalidAddress(_))
        ));
    }

    #[test]
    fn builder_collects_settings() {
        let builder = MqttBridge::builder()
            .broker("mqtt://broker:1883")
            .credentials("user", "pass")
            .client_id("my_client")
            .keep_alive(Duration::from_secs(60))
            .connection_timeout(Duration::from_secs(2));

        assert_eq!(builder.broker, Some("mqtt://broker:1883".to_string()));
        assert_eq!(builder.username, Some("user".to_string()));
        assert_eq!(builder.password, Some("pass".to_string()));
        assert_eq!(builder.client_id, Some("my_client".to_string()));
        assert_eq!(builder.keep_alive, Some(Duration::from_secs(60)));
        assert_eq!(builder.connection_timeout, Some(Duration::from_secs(2)));
    }

    #[tokio::test]
    async fn builder_missing_broker_fails() {
        let result = MqttBridge::builder().build().await;
        assert!(matches!(result, Err(ProtocolError::InvalidAddress(_))));
    }
}
