// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! MQTT quality-of-service level.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ValueError;

/// Delivery guarantee requested for publishes and subscriptions.
///
/// Configuration files express the level as an integer (0, 1 or 2).
/// Levels order by strength, so the strongest of several requests is
/// their `max`.
///
/// # Examples
///
/// ```
/// use hubstate_lib::types::QosLevel;
///
/// let qos = QosLevel::try_from(1).unwrap();
/// assert_eq!(qos, QosLevel::AtLeastOnce);
/// assert_eq!(qos.as_u8(), 1);
///
/// assert!(QosLevel::try_from(3).is_err());
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(try_from = "u8", into = "u8")]
pub enum QosLevel {
    /// Fire and forget (QoS 0).
    #[default]
    AtMostOnce,
    /// Acknowledged delivery (QoS 1).
    AtLeastOnce,
    /// Assured single delivery (QoS 2).
    ExactlyOnce,
}

impl QosLevel {
    /// Returns the numeric level.
    #[must_use]
    pub const fn as_u8(&self) -> u8 {
        match self {
            Self::AtMostOnce => 0,
            Self::AtLeastOnce => 1,
            Self::ExactlyOnce => 2,
        }
    }
}

impl TryFrom<u8> for QosLevel {
    type Error = ValueError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::AtMostOnce),
            1 => Ok(Self::AtLeastOnce),
            2 => Ok(Self::ExactlyOnce),
            _ => Err(ValueError::OutOfRange {
                min: 0,
                max: 2,
                actual: u16::from(value),
            }),
        }
    }
}

impl From<QosLevel> for u8 {
    fn from(qos: QosLevel) -> Self {
        qos.as_u8()
    }
}

#[cfg(feature = "mqtt")]
impl From<QosLevel> for rumqttc::QoS {
    fn from(qos: QosLevel) -> Self {
        match qos {
            QosLevel::AtMostOnce => Self::AtMostOnce,
            QosLevel::AtLeastOnce => Self::AtLeastOnce,
            QosLevel::ExactlyOnce => Self::ExactlyOnce,
        }
    }
}

impl fmt::Display for QosLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "QoS {}", self.as_u8())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn qos_round_trip_numbers() {
        for level in 0..=2 {
            assert_eq!(QosLevel::try_from(level).unwrap().as_u8(), level);
        }
    }

    #[test]
    fn qos_rejects_unknown_level() {
        assert_eq!(
            QosLevel::try_from(5),
            Err(ValueError::OutOfRange {
                min: 0,
                max: 2,
                actual: 5
            })
        );
    }

    #[test]
    fn qos_default_is_at_most_once() {
        assert_eq!(QosLevel::default(), QosLevel::AtMostOnce);
    }

    #[test]
    fn qos_orders_by_strength() {
        assert!(QosLevel::AtMostOnce < QosLevel::AtLeastOnce);
        assert!(QosLevel::AtLeastOnce < QosLevel::ExactlyOnce);
        assert_eq!(
            [QosLevel::AtLeastOnce, QosLevel::ExactlyOnce, QosLevel::AtMostOnce]
                .into_iter()
                .max(),
            Some(QosLevel::ExactlyOnce)
        );
    }

    #[test]
    fn qos_deserializes_from_integer() {
        let qos: QosLevel = serde_json::from_str("2").unwrap();
        assert_eq!(qos, QosLevel::ExactlyOnce);
        assert!(serde_json::from_str::<QosLevel>("3").is_err());
    }

    #[cfg(feature = "mqtt")]
    #[test]
    fn qos_into_rumqttc() {
        assert_eq!(
            rumqttc::QoS::from(QosLevel::AtLeastOnce),
            rumqttc::QoS::AtLeastOnce
        );
    }
}
