// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Cover configuration.

use serde::{Deserialize, Serialize};

use super::CoverCommand;
use crate::error::ConfigError;
use crate::template::JsonValueTemplate;
use crate::types::QosLevel;

/// Default entity name.
pub const DEFAULT_NAME: &str = "MQTT Cover";
/// Default open command payload.
pub const DEFAULT_PAYLOAD_OPEN: &str = "OPEN";
/// Default close command payload.
pub const DEFAULT_PAYLOAD_CLOSE: &str = "CLOSE";
/// Default stop command payload.
pub const DEFAULT_PAYLOAD_STOP: &str = "STOP";
/// Default state token reported by an open cover.
pub const DEFAULT_STATE_OPEN: &str = "open";
/// Default state token reported by a closed cover.
pub const DEFAULT_STATE_CLOSED: &str = "closed";

/// Configuration of an MQTT cover.
///
/// Every field except `command_topic` has a default, so a minimal
/// configuration file only names the command topic.
///
/// # Examples
///
/// ```
/// use hubstate_lib::cover::CoverConfig;
/// use hubstate_lib::types::QosLevel;
///
/// let config: CoverConfig = serde_json::from_str(r#"{
///     "command_topic": "garage/door/set",
///     "state_topic": "garage/door/state",
///     "qos": 1
/// }"#).unwrap();
///
/// assert_eq!(config.name, "MQTT Cover");
/// assert_eq!(config.payload_open, "OPEN");
/// assert_eq!(config.qos, QosLevel::AtLeastOnce);
///
/// // Builder style
/// let config = CoverConfig::new("blinds/set")
///     .with_name("Living Room Blinds")
///     .with_state_tokens("up", "down")
///     .with_retain(true);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverConfig {
    /// Entity name.
    #[serde(default = "default_name")]
    pub name: String,
    /// Topic carrying state feedback. Without one the cover is optimistic.
    #[serde(default)]
    pub state_topic: Option<String>,
    /// Topic commands are published to.
    pub command_topic: String,
    /// Quality of service for publishes and the state subscription.
    #[serde(default)]
    pub qos: QosLevel,
    /// Whether commands are published with the retain flag.
    #[serde(default)]
    pub retain: bool,
    /// Payload sent to open the cover.
    #[serde(default = "default_payload_open")]
    pub payload_open: String,
    /// Payload sent to close the cover.
    #[serde(default = "default_payload_close")]
    pub payload_close: String,
    /// Payload sent to stop the cover.
    #[serde(default = "default_payload_stop")]
    pub payload_stop: String,
    /// State payload meaning "open".
    #[serde(default = "default_state_open")]
    pub state_open: String,
    /// State payload meaning "closed".
    #[serde(default = "default_state_closed")]
    pub state_closed: String,
    /// Assume commands succeed without waiting for feedback.
    #[serde(default)]
    pub optimistic: bool,
    /// JSON path applied to state payloads before matching.
    #[serde(default)]
    pub value_template: Option<String>,
}

fn default_name() -> String {
    DEFAULT_NAME.to_string()
}

fn default_payload_open() -> String {
    DEFAULT_PAYLOAD_OPEN.to_string()
}

fn default_payload_close() -> String {
    DEFAULT_PAYLOAD_CLOSE.to_string()
}

fn default_payload_stop() -> String {
    DEFAULT_PAYLOAD_STOP.to_string()
}

fn default_state_open() -> String {
    DEFAULT_STATE_OPEN.to_string()
}

fn default_state_closed() -> String {
    DEFAULT_STATE_CLOSED.to_string()
}

impl CoverConfig {
    /// Creates a configuration with defaults for everything but the
    /// command topic.
    #[must_use]
    pub fn new(command_topic: impl Into<String>) -> Self {
        Self {
            name: default_name(),
            state_topic: None,
            command_topic: command_topic.into(),
            qos: QosLevel::default(),
            retain: false,
            payload_open: default_payload_open(),
            payload_close: default_payload_close(),
            payload_stop: default_payload_stop(),
            state_open: default_state_open(),
            state_closed: default_state_closed(),
            optimistic: false,
            value_template: None,
        }
    }

    /// Sets the entity name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the state feedback topic.
    #[must_use]
    pub fn with_state_topic(mut self, topic: impl Into<String>) -> Self {
        self.state_topic = Some(topic.into());
        self
    }

    /// Sets the quality of service.
    #[must_use]
    pub fn with_qos(mut self, qos: QosLevel) -> Self {
        self.qos = qos;
        self
    }

    /// Sets the retain flag for commands.
    #[must_use]
    pub fn with_retain(mut self, retain: bool) -> Self {
        self.retain = retain;
        self
    }

    /// Sets the open, close, and stop command payloads.
    #[must_use]
    pub fn with_command_payloads(
        mut self,
        open: impl Into<String>,
        close: impl Into<String>,
        stop: impl Into<String>,
    ) -> Self {
        self.payload_open = open.into();
        self.payload_close = close.into();
        self.payload_stop = stop.into();
        self
    }

    /// Sets the state tokens for "open" and "closed".
    #[must_use]
    pub fn with_state_tokens(mut self, open: impl Into<String>, closed: impl Into<String>) -> Self {
        self.state_open = open.into();
        self.state_closed = closed.into();
        self
    }

    /// Requests optimistic mode.
    #[must_use]
    pub fn with_optimistic(mut self, optimistic: bool) -> Self {
        self.optimistic = optimistic;
        self
    }

    /// Sets the JSON path applied to state payloads.
    #[must_use]
    pub fn with_value_template(mut self, template: impl Into<String>) -> Self {
        self.value_template = Some(template.into());
        self
    }

    /// Returns `true` if the cover runs optimistically.
    ///
    /// A cover without a state topic cannot observe the device, so it is
    /// optimistic regardless of the configured flag.
    #[must_use]
    pub fn is_optimistic(&self) -> bool {
        self.optimistic || self.state_topic.is_none()
    }

    /// Returns the payload published for `command`.
    #[must_use]
    pub fn payload_for(&self, command: CoverCommand) -> &str {
        match command {
            CoverCommand::Open => &self.payload_open,
            CoverCommand::Close => &self.payload_close,
            CoverCommand::Stop => &self.payload_stop,
        }
    }

    /// Parses the configured value template, if any.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidTemplate` if the path is malformed.
    pub fn parsed_template(&self) -> Result<Option<JsonValueTemplate>, ConfigError> {
        self.value_template
            .as_deref()
            .map(|path| {
                path.parse()
                    .map_err(|_| ConfigError::InvalidTemplate(path.to_string()))
            })
            .transpose()
    }

    /// Checks the configuration for values the cover cannot work with.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the command topic is empty, the state
    /// topic is present but empty, both state tokens are equal, or the
    /// value template is malformed.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.command_topic.trim().is_empty() {
            return Err(ConfigError::MissingCommandTopic);
        }
        if self
            .state_topic
            .as_deref()
            .is_some_and(|topic| topic.trim().is_empty())
        {
            return Err(ConfigError::EmptyStateTopic);
        }
        if self.state_open == self.state_closed {
            return Err(ConfigError::AmbiguousStateTokens(self.state_open.clone()));
        }
        self.parsed_template()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_uses_defaults() {
        let config: CoverConfig =
            serde_json::from_str(r#"{"command_topic":"cover/set"}"#).unwrap();

        assert_eq!(config, CoverConfig::new("cover/set"));
        assert_eq!(config.name, DEFAULT_NAME);
        assert_eq!(config.state_open, "open");
        assert_eq!(config.state_closed, "closed");
        assert!(!config.retain);
        assert!(config.is_optimistic());
    }

    #[test]
    fn missing_command_topic_fails_to_deserialize() {
        assert!(serde_json::from_str::<CoverConfig>(r#"{"name":"x"}"#).is_err());
    }

    #[test]
    fn invalid_qos_fails_to_deserialize() {
        let json = r#"{"command_topic":"c","qos":3}"#;
        assert!(serde_json::from_str::<CoverConfig>(json).is_err());
    }

    #[test]
    fn optimistic_forced_without_state_topic() {
        let config = CoverConfig::new("c").with_optimistic(false);
        assert!(config.is_optimistic());

        let config = config.with_state_topic("s");
        assert!(!config.is_optimistic());

        let config = config.with_optimistic(true);
        assert!(config.is_optimistic());
    }

    #[test]
    fn payload_for_command() {
        let config = CoverConfig::new("c").with_command_payloads("UP", "DOWN", "HALT");
        assert_eq!(config.payload_for(CoverCommand::Open), "UP");
        assert_eq!(config.payload_for(CoverCommand::Close), "DOWN");
        assert_eq!(config.payload_for(CoverCommand::Stop), "HALT");
    }

    #[test]
    fn validate_rejects_bad_configs() {
        assert_eq!(
            CoverConfig::new("  ").validate(),
            Err(ConfigError::MissingCommandTopic)
        );
        assert_eq!(
            CoverConfig::new("c").with_state_topic("").validate(),
            Err(ConfigError::EmptyStateTopic)
        );
        assert_eq!(
            CoverConfig::new("c").with_state_tokens("x", "x").validate(),
            Err(ConfigError::AmbiguousStateTokens("x".to_string()))
        );
        assert_eq!(
            CoverConfig::new("c").with_value_template("a..b").validate(),
            Err(ConfigError::InvalidTemplate("a..b".to_string()))
        );
    }

    #[test]
    fn serialize_round_trip_keeps_fields() {
        let config = CoverConfig::new("c")
            .with_state_topic("s")
            .with_qos(QosLevel::ExactlyOnce)
            .with_value_template("value_json.pos");
        let json = serde_json::to_string(&config).unwrap();
        let back: CoverConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
