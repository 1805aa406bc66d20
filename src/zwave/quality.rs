// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Communication statistics, quality score, and node status.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::NodeAttributes;
use crate::error::ParseError;

/// Round-trip time, in milliseconds, that scores zero.
pub const MAX_RTT: f64 = 10_000.0;

/// Communication counters reported by the driver for one node.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NodeStatistics {
    #[serde(rename = "sentCnt")]
    pub sent_cnt: u64,
    #[serde(rename = "sentFailed")]
    pub sent_failed: u64,
    #[serde(rename = "averageRequestRTT")]
    pub average_request_rtt: f64,
    #[serde(rename = "averageResponseRTT")]
    pub average_response_rtt: f64,
    #[serde(rename = "receivedCnt")]
    pub received_cnt: u64,
    #[serde(rename = "receivedUnsolicited")]
    pub received_unsolicited: u64,
}

impl NodeStatistics {
    const KEYS: [&'static str; 6] = [
        "sentCnt",
        "sentFailed",
        "averageRequestRTT",
        "averageResponseRTT",
        "receivedCnt",
        "receivedUnsolicited",
    ];

    /// Parses the driver's statistics object.
    ///
    /// Returns `Ok(None)` for `null` or an empty object, which the driver
    /// sends for nodes it has not talked to yet.
    ///
    /// # Errors
    ///
    /// Returns `ParseError::MissingField` if a counter is absent, or
    /// `ParseError::Json` if a counter has the wrong type.
    pub fn from_json(value: &serde_json::Value) -> Result<Option<Self>, ParseError> {
        match value {
            serde_json::Value::Null => return Ok(None),
            serde_json::Value::Object(map) if map.is_empty() => return Ok(None),
            serde_json::Value::Object(map) => {
                if let Some(key) = Self::KEYS.iter().find(|k| !map.contains_key(**k)) {
                    return Err(ParseError::MissingField((*key).to_string()));
                }
            }
            _ => {}
        }
        Ok(Some(Self::deserialize(value)?))
    }
}

/// Communication quality score of a node.
///
/// Nominally in `0..=100`, but extreme round-trip times push the raw score
/// outside that range. [`value`](Self::value) keeps the raw score;
/// [`clamped`](Self::clamped) is the presentation view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Quality(i32);

impl Quality {
    /// Score used when no statistics are available.
    pub const FALLBACK: Self = Self(20);

    /// Wraps a raw score.
    #[must_use]
    pub const fn new(value: i32) -> Self {
        Self(value)
    }

    /// Computes the score from statistics.
    ///
    /// Sent success ratio, request RTT, response RTT and unsolicited
    /// ratio are weighted 1, 2, 3 and 1. Counters are compared as signed
    /// values, so more failures than sends give a negative ratio rather
    /// than zero.
    #[must_use]
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
    pub fn from_statistics(stats: &NodeStatistics) -> Self {
        let sent = if stats.sent_cnt > 0 {
            (stats.sent_cnt as f64 - stats.sent_failed as f64) / stats.sent_cnt as f64
        } else {
            0.0
        };
        let request = ((MAX_RTT / 2.0) - stats.average_request_rtt) / (MAX_RTT / 2.0);
        let response = (MAX_RTT - stats.average_response_rtt) / MAX_RTT;
        let unsolicited = if stats.received_cnt > 0 {
            1.0 - (stats.received_cnt as f64 - stats.received_unsolicited as f64)
                / stats.received_cnt as f64
        } else {
            0.0
        };

        let score = (sent + 2.0 * request + 3.0 * response + unsolicited) / 7.0 * 100.0;
        Self(score.round() as i32)
    }

    /// Computes the score, falling back to [`Quality::FALLBACK`].
    #[must_use]
    pub fn from_optional(node_id: u8, stats: Option<&NodeStatistics>) -> Self {
        match stats {
            Some(stats) => Self::from_statistics(stats),
            None => {
                tracing::info!(node_id, "No node statistics");
                Self::FALLBACK
            }
        }
    }

    /// Returns the raw score.
    #[must_use]
    pub const fn value(self) -> i32 {
        self.0
    }

    /// Returns the score saturated to `0..=100`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub const fn clamped(self) -> u8 {
        if self.0 < 0 {
            0
        } else if self.0 > 100 {
            100
        } else {
            self.0 as u8
        }
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle status of a node.
///
/// A node that has not finished its interview carries the query stage as
/// a sub-status, rendered as `"Dead (Probe)"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NodeStatus {
    /// The driver marked the node as failed.
    Dead(Option<String>),
    /// The node is asleep.
    Sleeping(Option<String>),
    /// The interview is complete.
    Ready,
    /// Awake, not failed, and still being interviewed.
    Stage(String),
}

impl NodeStatus {
    /// Derives the status from node attributes.
    #[must_use]
    pub fn derive(attributes: &NodeAttributes) -> Self {
        let stage = (!attributes.is_ready && !attributes.query_stage.is_empty())
            .then(|| attributes.query_stage.clone());

        if attributes.is_failed {
            Self::Dead(stage)
        } else if !attributes.is_awake {
            Self::Sleeping(stage)
        } else if attributes.is_ready {
            Self::Ready
        } else {
            Self::Stage(attributes.query_stage.clone())
        }
    }
}

impl fmt::Display for NodeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (main, stage) = match self {
            Self::Dead(stage) => ("Dead", stage),
            Self::Sleeping(stage) => ("Sleeping", stage),
            Self::Ready => return f.write_str("Ready"),
            Self::Stage(stage) => return f.write_str(stage),
        };
        match stage {
            Some(stage) => write!(f, "{main} ({stage})"),
            None => f.write_str(main),
        }
    }
}

impl Serialize for NodeStatus {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
