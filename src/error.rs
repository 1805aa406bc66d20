// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the `HubState` library.
//!
//! This module provides the error hierarchy shared by the adapters: value
//! validation, transport communication, telemetry parsing, and entity
//! configuration.

use thiserror::Error;

/// The main error type for this library.
#[derive(Debug, Error)]
pub enum Error {
    /// Error occurred during value validation.
    #[error("value error: {0}")]
    Value(#[from] ValueError),

    /// Error occurred during transport communication.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Error occurred while parsing vendor telemetry.
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// Entity configuration is invalid.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}

/// Errors related to value validation and constraints.
///
/// These errors occur when attempting to create constrained types
/// with invalid values.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValueError {
    /// A numeric value is outside the allowed range.
    #[error("value {actual} is out of range [{min}, {max}]")]
    OutOfRange {
        /// Minimum allowed value.
        min: u16,
        /// Maximum allowed value.
        max: u16,
        /// The actual value that was provided.
        actual: u16,
    },

    /// A position payload could not be read as a percentage.
    #[error("invalid position: {0}")]
    InvalidPosition(String),
}

/// Errors related to transport communication.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// MQTT connection or communication failed.
    #[cfg(feature = "mqtt")]
    #[error("MQTT error: {0}")]
    Mqtt(#[from] rumqttc::ClientError),

    /// Connection to the broker failed.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Invalid URL or address.
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// Internal channel was closed.
    #[error("channel closed: {0}")]
    ChannelClosed(String),
}

/// Errors related to parsing vendor telemetry.
#[derive(Debug, Error)]
pub enum ParseError {
    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// Expected field is missing from the payload.
    #[error("missing field in payload: {0}")]
    MissingField(String),

    /// A device identifier is not a valid hexadecimal string.
    #[error("invalid hex identifier for {field}: {value:?}")]
    InvalidIdentifier {
        /// The identifier that failed to parse.
        field: &'static str,
        /// The raw identifier string.
        value: String,
    },
}

/// Errors related to entity configuration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The command topic is empty.
    #[error("command topic is required")]
    MissingCommandTopic,

    /// A state topic was given but is empty.
    #[error("state topic must not be empty")]
    EmptyStateTopic,

    /// Two configured state tokens are identical.
    #[error("state tokens must differ, both are {0:?}")]
    AmbiguousStateTokens(String),

    /// The value template path is malformed.
    #[error("invalid value template: {0:?}")]
    InvalidTemplate(String),
}

/// A specialized Result type for this library.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_error_display() {
        let err = ValueError::OutOfRange {
            min: 0,
            max: 100,
            actual: 150,
        };
        assert_eq!(err.to_string(), "value 150 is out of range [0, 100]");
    }

    #[test]
    fn error_from_config_error() {
        let err: Error = ConfigError::MissingCommandTopic.into();
        assert!(matches!(err, Error::Config(ConfigError::MissingCommandTopic)));
        assert_eq!(err.to_string(), "config error: command topic is required");
    }

    #[test]
    fn parse_error_display() {
        let err = ParseError::MissingField("sentCnt".to_string());
        assert_eq!(err.to_string(), "missing field in payload: sentCnt");
    }

    #[test]
    fn invalid_identifier_display() {
        let err = ParseError::InvalidIdentifier {
            field: "manufacturer_id",
            value: "0xZZ".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "invalid hex identifier for manufacturer_id: \"0xZZ\""
        );
    }
}
