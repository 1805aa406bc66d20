// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! MQTT cover (blinds, garage doors).
//!
//! - [`CoverConfig`] - topics, command payloads, state tokens, modes
//! - [`CoverStateMachine`] - derives state from payloads and commands
//! - [`MqttCover`] - the entity: publishes commands, consumes feedback,
//!   emits [`CoverUpdate`]s
//!
//! A cover without a state topic is always optimistic: open and close
//! are assumed to succeed as soon as they are published.

mod config;
mod entity;
mod state;
mod state_machine;

pub use config::{
    CoverConfig, DEFAULT_NAME, DEFAULT_PAYLOAD_CLOSE, DEFAULT_PAYLOAD_OPEN, DEFAULT_PAYLOAD_STOP,
    DEFAULT_STATE_CLOSED, DEFAULT_STATE_OPEN,
};
pub use entity::MqttCover;
pub use state::{CoverCommand, CoverState, CoverStateChange, CoverUpdate};
pub use state_machine::CoverStateMachine;
