// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Subscription system for entity state emissions and inbound events.
//!
//! # Overview
//!
//! - [`SubscriptionId`] - A unique identifier for a registered callback
//! - [`CallbackRegistry`] - Stores callbacks and dispatches values to them
//! - [`Subscription`] - Owned handle returned by setup calls; dropping it
//!   unsubscribes
//!
//! Entities never register themselves with a global dispatcher. Every
//! setup call returns a [`Subscription`] that the owner keeps and releases
//! on teardown.

mod callback;
mod handle;

pub(crate) use callback::IdGenerator;
pub use callback::{CallbackRegistry, SubscriptionId};
pub use handle::{Subscription, SubscriptionSource};
