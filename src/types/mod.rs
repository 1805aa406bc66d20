// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Value types shared by the adapters.
//!
//! These types enforce constraints at construction time so that state
//! derivation never has to re-check ranges.

mod position;
mod qos;

pub use position::Position;
pub use qos::QosLevel;
