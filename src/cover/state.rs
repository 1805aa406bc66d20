// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Cover state and the changes applied to it.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::Position;

/// Commands a cover accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoverCommand {
    /// Move the cover up.
    Open,
    /// Move the cover down.
    Close,
    /// Halt movement.
    Stop,
}

impl CoverCommand {
    /// Every command, in presentation order.
    pub const ALL: [Self; 3] = [Self::Open, Self::Close, Self::Stop];

    /// Position assumed after the command in optimistic mode.
    ///
    /// `Stop` has none: where the cover halts is unknown.
    #[must_use]
    pub const fn optimistic_position(&self) -> Option<Position> {
        match self {
            Self::Open => Some(Position::OPEN),
            Self::Close => Some(Position::CLOSED),
            Self::Stop => None,
        }
    }

    /// Returns the command name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Close => "close",
            Self::Stop => "stop",
        }
    }
}

impl fmt::Display for CoverCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An accepted change of cover state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "position", rename_all = "snake_case")]
pub enum CoverStateChange {
    /// Fully open, from the open state token or an optimistic open.
    Opened,
    /// Fully closed, from the closed state token or an optimistic close.
    Closed,
    /// A numeric position report.
    Moved(Position),
}

impl CoverStateChange {
    /// Returns the position this change sets.
    #[must_use]
    pub const fn position(&self) -> Position {
        match self {
            Self::Opened => Position::OPEN,
            Self::Closed => Position::CLOSED,
            Self::Moved(position) => *position,
        }
    }
}

/// Current state of a cover.
///
/// The position is unknown until the first accepted payload or
/// optimistic command.
///
/// # Examples
///
/// ```
/// use hubstate_lib::cover::{CoverState, CoverStateChange};
/// use hubstate_lib::types::Position;
///
/// let mut state = CoverState::new(false);
/// assert_eq!(state.is_closed(), None);
///
/// state.apply(CoverStateChange::Closed);
/// assert_eq!(state.is_closed(), Some(true));
/// assert_eq!(state.position(), Some(Position::CLOSED));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CoverState {
    position: Option<Position>,
    optimistic: bool,
}

impl CoverState {
    /// Creates a state with unknown position.
    #[must_use]
    pub const fn new(optimistic: bool) -> Self {
        Self {
            position: None,
            optimistic,
        }
    }

    /// Returns the position, `None` when unknown.
    #[must_use]
    pub const fn position(&self) -> Option<Position> {
        self.position
    }

    /// Returns `Some(true)` when closed, `Some(false)` when at least
    /// partly open, `None` when unknown.
    #[must_use]
    pub fn is_closed(&self) -> Option<bool> {
        self.position.map(|position| position.is_closed())
    }

    /// Returns `true` if the state is assumed rather than observed.
    #[must_use]
    pub const fn is_optimistic(&self) -> bool {
        self.optimistic
    }

    /// Applies a change.
    ///
    /// Returns `true` if the position actually changed.
    pub fn apply(&mut self, change: CoverStateChange) -> bool {
        let position = Some(change.position());
        let changed = self.position != position;
        self.position = position;
        changed
    }
}

/// State emitted to subscribers after every accepted change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CoverUpdate {
    /// Entity name.
    pub name: String,
    /// The change that triggered the emission.
    pub change: CoverStateChange,
    /// State after the change.
    pub state: CoverState,
    /// When the change was accepted.
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn optimistic_positions() {
        assert_eq!(CoverCommand::Open.optimistic_position(), Some(Position::OPEN));
        assert_eq!(
            CoverCommand::Close.optimistic_position(),
            Some(Position::CLOSED)
        );
        assert_eq!(CoverCommand::Stop.optimistic_position(), None);
    }

    #[test]
    fn change_positions() {
        assert_eq!(CoverStateChange::Opened.position(), Position::OPEN);
        assert_eq!(CoverStateChange::Closed.position(), Position::CLOSED);
        let half = Position::new(50).unwrap();
        assert_eq!(CoverStateChange::Moved(half).position(), half);
    }

    #[test]
    fn is_closed_is_tri_state() {
        let mut state = CoverState::new(false);
        assert_eq!(state.is_closed(), None);

        state.apply(CoverStateChange::Moved(Position::new(1).unwrap()));
        assert_eq!(state.is_closed(), Some(false));

        state.apply(CoverStateChange::Moved(Position::CLOSED));
        assert_eq!(state.is_closed(), Some(true));
    }

    #[test]
    fn apply_reports_actual_change() {
        let mut state = CoverState::new(true);
        assert!(state.apply(CoverStateChange::Opened));
        assert!(!state.apply(CoverStateChange::Moved(Position::OPEN)));
        assert!(state.apply(CoverStateChange::Closed));
        assert!(state.is_optimistic());
    }

    #[test]
    fn change_serializes_tagged() {
        let json = serde_json::to_string(&CoverStateChange::Moved(Position::new(30).unwrap()))
            .unwrap();
        assert_eq!(json, r#"{"kind":"moved","position":30}"#);
        let json = serde_json::to_string(&CoverStateChange::Opened).unwrap();
        assert_eq!(json, r#"{"kind":"opened"}"#);
    }
}
