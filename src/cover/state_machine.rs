// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Derivation of cover state from vendor payloads and commands.

use super::{CoverCommand, CoverConfig, CoverState, CoverStateChange};
use crate::error::ConfigError;
use crate::template::ValueTemplate;
use crate::types::Position;

/// Turns inbound state payloads and outbound commands into cover state.
///
/// Payload matching, in order:
///
/// 1. the configured value template (if any) is rendered first;
/// 2. the `state_open` token means fully open;
/// 3. the `state_closed` token means fully closed;
/// 4. a bare integer 0-100 is a position;
/// 5. anything else is rejected and leaves the state untouched.
///
/// # Examples
///
/// ```
/// use hubstate_lib::cover::{CoverConfig, CoverStateChange, CoverStateMachine};
///
/// let config = CoverConfig::new("blind/set").with_state_topic("blind/state");
/// let mut machine = CoverStateMachine::new(&config).unwrap();
///
/// assert_eq!(machine.on_inbound_payload("closed"), Some(CoverStateChange::Closed));
/// assert_eq!(machine.is_closed(), Some(true));
///
/// assert!(machine.on_inbound_payload("jammed").is_none());
/// assert_eq!(machine.is_closed(), Some(true));
/// ```
pub struct CoverStateMachine {
    state_open: String,
    state_closed: String,
    template: Option<Box<dyn ValueTemplate>>,
    state: CoverState,
}

impl CoverStateMachine {
    /// Creates a machine from a cover configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidTemplate` if the configured value
    /// template is malformed.
    pub fn new(config: &CoverConfig) -> Result<Self, ConfigError> {
        let template = config
            .parsed_template()?
            .map(|t| Box::new(t) as Box<dyn ValueTemplate>);

        Ok(Self {
            state_open: config.state_open.clone(),
            state_closed: config.state_closed.clone(),
            template,
            state: CoverState::new(config.is_optimistic()),
        })
    }

    /// Replaces the value template with a custom one.
    #[must_use]
    pub fn with_template(mut self, template: impl ValueTemplate + 'static) -> Self {
        self.template = Some(Box::new(template));
        self
    }

    /// Returns the current state.
    #[must_use]
    pub fn state(&self) -> CoverState {
        self.state
    }

    /// Returns the position, `None` when unknown.
    #[must_use]
    pub fn position(&self) -> Option<Position> {
        self.state.position()
    }

    /// Returns whether the cover is closed, `None` when unknown.
    #[must_use]
    pub fn is_closed(&self) -> Option<bool> {
        self.state.is_closed()
    }

    /// Returns `true` if commands update the state without feedback.
    #[must_use]
    pub fn is_optimistic(&self) -> bool {
        self.state.is_optimistic()
    }

    /// Interprets a state payload.
    ///
    /// Returns the accepted change, or `None` if the payload is neither a
    /// state token nor a position. Accepted payloads are reported even
    /// when they repeat the current state.
    pub fn on_inbound_payload(&mut self, raw: &str) -> Option<CoverStateChange> {
        let rendered;
        let payload = match &self.template {
            Some(template) => {
                rendered = template.render(raw);
                rendered.as_str()
            }
            None => raw,
        };

        let change = if payload == self.state_open {
            CoverStateChange::Opened
        } else if payload == self.state_closed {
            CoverStateChange::Closed
        } else if let Ok(position) = payload.parse::<Position>() {
            CoverStateChange::Moved(position)
        } else {
            tracing::warn!(
                payload = %payload,
                "Payload is neither a state token nor an integer 0-100"
            );
            return None;
        };

        self.state.apply(change);
        Some(change)
    }

    /// Records that `command` was sent.
    ///
    /// In optimistic mode open and close are assumed to succeed and the
    /// matching change is returned. Stop, and every command in
    /// non-optimistic mode, leave the state alone.
    pub fn on_command(&mut self, command: CoverCommand) -> Option<CoverStateChange> {
        if !self.state.is_optimistic() {
            return None;
        }
        let position = command.optimistic_position()?;
        let change = if position.is_closed() {
            CoverStateChange::Closed
        } else {
            CoverStateChange::Opened
        };
        self.state.apply(change);
        Some(change)
    }
}

impl std::fmt::Debug for CoverStateMachine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoverStateMachine")
            .field("state_open", &self.state_open)
            .field("state_closed", &self.state_closed)
            .field("has_template", &self.template.is_some())
            .field("state", &self.state)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn machine() -> CoverStateMachine {
        let config = CoverConfig::new("cover/set").with_state_topic("cover/state");
        CoverStateMachine::new(&config).unwrap()
    }

    #[test]
    fn starts_unknown() {
        let m = machine();
        assert_eq!(m.position(), None);
        assert_eq!(m.is_closed(), None);
        assert!(!m.is_optimistic());
    }

    #[test]
    fn state_tokens() {
        let mut m = machine();
        assert_eq!(m.on_inbound_payload("open"), Some(CoverStateChange::Opened));
        assert_eq!(m.position(), Some(Position::OPEN));
        assert_eq!(m.is_closed(), Some(false));

        assert_eq!(m.on_inbound_payload("closed"), Some(CoverStateChange::Closed));
        assert_eq!(m.position(), Some(Position::CLOSED));
        assert_eq!(m.is_closed(), Some(true));
    }

    #[test]
    fn tokens_are_exact_matches() {
        let mut m = machine();
        assert!(m.on_inbound_payload("OPEN").is_none());
        assert!(m.on_inbound_payload(" closed").is_none());
        assert_eq!(m.position(), None);
    }

    #[test]
    fn every_valid_integer_sets_position() {
        let mut m = machine();
        for value in 0..=100u8 {
            let change = m.on_inbound_payload(&value.to_string());
            assert_eq!(
                change,
                Some(CoverStateChange::Moved(Position::new(value).unwrap()))
            );
            assert_eq!(m.position().map(|p| p.value()), Some(value));
        }
    }

    #[test]
    fn invalid_payloads_leave_state_unchanged() {
        let mut m = machine();
        m.on_inbound_payload("40");

        for payload in ["101", "-1", "abc", "", "4.5", "1e2"] {
            assert!(m.on_inbound_payload(payload).is_none(), "{payload:?}");
            assert_eq!(m.position().map(|p| p.value()), Some(40));
        }
    }

    #[test]
    fn repeated_payload_is_still_reported() {
        let mut m = machine();
        assert!(m.on_inbound_payload("closed").is_some());
        assert!(m.on_inbound_payload("closed").is_some());
    }

    #[test]
    fn custom_tokens() {
        let config = CoverConfig::new("c")
            .with_state_topic("s")
            .with_state_tokens("up", "down");
        let mut m = CoverStateMachine::new(&config).unwrap();

        assert!(m.on_inbound_payload("open").is_none());
        assert_eq!(m.on_inbound_payload("down"), Some(CoverStateChange::Closed));
        assert_eq!(m.on_inbound_payload("up"), Some(CoverStateChange::Opened));
    }

    #[test]
    fn configured_template_renders_first() {
        let config = CoverConfig::new("c")
            .with_state_topic("s")
            .with_value_template("value_json.state");
        let mut m = CoverStateMachine::new(&config).unwrap();

        assert_eq!(
            m.on_inbound_payload(r#"{"state":"closed"}"#),
            Some(CoverStateChange::Closed)
        );
        assert_eq!(
            m.on_inbound_payload(r#"{"state":25}"#),
            Some(CoverStateChange::Moved(Position::new(25).unwrap()))
        );
        // Non-JSON payloads pass through the template unchanged
        assert_eq!(m.on_inbound_payload("open"), Some(CoverStateChange::Opened));
    }

    #[test]
    fn custom_template() {
        let mut m = machine().with_template(|raw: &str| raw.to_lowercase());
        assert_eq!(m.on_inbound_payload("CLOSED"), Some(CoverStateChange::Closed));
    }

    #[test]
    fn optimistic_commands() {
        let config = CoverConfig::new("c");
        let mut m = CoverStateMachine::new(&config).unwrap();
        assert!(m.is_optimistic());

        assert_eq!(m.on_command(CoverCommand::Open), Some(CoverStateChange::Opened));
        assert_eq!(m.is_closed(), Some(false));

        assert_eq!(m.on_command(CoverCommand::Stop), None);
        assert_eq!(m.position(), Some(Position::OPEN));

        assert_eq!(m.on_command(CoverCommand::Close), Some(CoverStateChange::Closed));
        assert_eq!(m.is_closed(), Some(true));
    }

    #[test]
    fn optimistic_command_lands_on_command_position() {
        let config = CoverConfig::new("c");
        for command in [CoverCommand::Open, CoverCommand::Close, CoverCommand::Stop] {
            let mut m = CoverStateMachine::new(&config).unwrap();
            let change = m.on_command(command);
            assert_eq!(change.map(|c| c.position()), command.optimistic_position());
            assert_eq!(m.position(), command.optimistic_position());
        }
    }

    #[test]
    fn non_optimistic_commands_change_nothing() {
        let mut m = machine();
        assert_eq!(m.on_command(CoverCommand::Open), None);
        assert_eq!(m.is_closed(), None);

        m.on_inbound_payload("closed");
        assert_eq!(m.on_command(CoverCommand::Open), None);
        assert_eq!(m.is_closed(), Some(true));
    }
}
