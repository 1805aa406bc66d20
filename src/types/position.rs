// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Cover position type.
//!
//! This module provides a type-safe representation of a cover position,
//! ensuring values are always within the valid range of 0-100%.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValueError;

/// Cover position as a percentage (0-100).
///
/// 0 is fully closed and 100 is fully open. Values in between describe
/// partially opened blinds or doors.
///
/// # Examples
///
/// ```
/// use hubstate_lib::types::Position;
///
/// let half = Position::new(50).unwrap();
/// assert_eq!(half.value(), 50);
/// assert!(!half.is_closed());
///
/// assert!(Position::CLOSED.is_closed());
/// assert_eq!(Position::OPEN.value(), 100);
///
/// // Invalid values return error
/// assert!(Position::new(101).is_err());
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "u8", into = "u8")]
pub struct Position(u8);

impl Position {
    /// Fully closed (0%).
    pub const CLOSED: Self = Self(0);

    /// Fully open (100%).
    pub const OPEN: Self = Self(100);

    /// Creates a new position.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::OutOfRange` if value exceeds 100.
    pub fn new(value: u8) -> Result<Self, ValueError> {
        if value > 100 {
            return Err(ValueError::OutOfRange {
                min: 0,
                max: 100,
                actual: u16::from(value),
            });
        }
        Ok(Self(value))
    }

    /// Creates a position, clamping to the valid range.
    ///
    /// ```
    /// use hubstate_lib::types::Position;
    ///
    /// assert_eq!(Position::clamped(150).value(), 100);
    /// ```
    #[must_use]
    pub const fn clamped(value: u8) -> Self {
        if value > 100 { Self(100) } else { Self(value) }
    }

    /// Returns the percentage value.
    #[must_use]
    pub const fn value(&self) -> u8 {
        self.0
    }

    /// Returns `true` if the cover is fully closed.
    #[must_use]
    pub const fn is_closed(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

impl TryFrom<u8> for Position {
    type Error = ValueError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Position> for u8 {
    fn from(position: Position) -> Self {
        position.0
    }
}

/// Parses a bare decimal percentage such as `"42"` or `"007"`.
///
/// Only ASCII digits are accepted: signs, whitespace, and decimal points
/// are rejected.
impl FromStr for Position {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ValueError::InvalidPosition(s.to_string()));
        }

        // Strip leading zeros so long zero-padded inputs do not overflow
        let digits = s.trim_start_matches('0');
        if digits.is_empty() {
            return Ok(Self::CLOSED);
        }
        if digits.len() > 3 {
            return Err(ValueError::InvalidPosition(s.to_string()));
        }

        let value: u16 = digits
            .parse()
            .map_err(|_| ValueError::InvalidPosition(s.to_string()))?;
        if value > 100 {
            return Err(ValueError::OutOfRange {
                min: 0,
                max: 100,
                actual: value,
            });
        }

        // Safe: value is at most 100
        #[allow(clippy::cast_possible_truncation)]
        Ok(Self(value as u8))
    }
}
