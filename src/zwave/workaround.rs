// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Manufacturer-specific workarounds.
//!
//! Some devices misreport their behavior or their device class. The
//! tables here map device identifiers to the quirk to apply. Lookups take
//! the table explicitly; [`WorkaroundTable::builtin`] holds the known
//! devices.

use std::fmt;

use super::{COMMAND_CLASS_SENSOR_ALARM, DeviceIds};
use crate::error::ParseError;

// Manufacturers
const FIBARO: u16 = 0x010f;
const PHILIO: u16 = 0x013c;
const REMOTEC: u16 = 0x5254;
const WENZHOU: u16 = 0x0118;

// Product types
const PHILIO_SENSOR: u16 = 0x0002;
const FGFS101_FLOOD_SENSOR_TYPE: u16 = 0x0b00;
const REMOTEC_THERMOSTAT: u16 = 0x0100;

// Product ids
const PHILIO_SLIM_SENSOR: u16 = 0x0002;
const PHILIO_3_IN_1_SENSOR_GEN_4: u16 = 0x000d;
const REMOTEC_ZXT_120: u16 = 0x8377;

/// A behavioral quirk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Workaround {
    /// Motion sensor that never reports "no motion"; the off event has to
    /// be synthesized.
    TriggerNoOffEvent,
    /// Remotec ZXT-120 thermostat quirks.
    Zxt120,
}

impl Workaround {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::TriggerNoOffEvent => "trigger_no_off_event",
            Self::Zxt120 => "zxt_120",
        }
    }
}

impl fmt::Display for Workaround {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Entity component a value is remapped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum Component {
    BinarySensor,
}

impl Component {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::BinarySensor => "binary_sensor",
        }
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifiers of a value, keying the device table.
///
/// Table entries are exact tuples; a lookup hits only when all four
/// fields match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WorkaroundKey {
    pub manufacturer_id: u16,
    pub product_type: u16,
    pub product_id: u16,
    pub index: u8,
}

impl WorkaroundKey {
    #[must_use]
    pub const fn new(manufacturer_id: u16, product_type: u16, product_id: u16, index: u8) -> Self {
        Self {
            manufacturer_id,
            product_type,
            product_id,
            index,
        }
    }
}

/// Parsed identifiers used to look up the component table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ComponentKey {
    pub manufacturer_id: u16,
    pub product_type: u16,
    pub command_class: u8,
}

/// Immutable workaround tables.
#[derive(Debug, Clone, Copy)]
pub struct WorkaroundTable {
    devices: &'static [(WorkaroundKey, Workaround)],
    components: &'static [(ComponentKey, Component)],
}

static DEVICE_WORKAROUNDS: [(WorkaroundKey, Workaround); 4] = [
    (
        WorkaroundKey::new(PHILIO, PHILIO_SENSOR, PHILIO_SLIM_SENSOR, 0),
        Workaround::TriggerNoOffEvent,
    ),
    (
        WorkaroundKey::new(PHILIO, PHILIO_SENSOR, PHILIO_3_IN_1_SENSOR_GEN_4, 0),
        Workaround::TriggerNoOffEvent,
    ),
    (
        WorkaroundKey::new(WENZHOU, PHILIO_SENSOR, PHILIO_SLIM_SENSOR, 0),
        Workaround::TriggerNoOffEvent,
    ),
    (
        WorkaroundKey::new(REMOTEC, REMOTEC_THERMOSTAT, REMOTEC_ZXT_120, 0),
        Workaround::Zxt120,
    ),
];

static COMPONENT_OVERRIDES: [(ComponentKey, Component); 1] = [(
    ComponentKey {
        manufacturer_id: FIBARO,
        product_type: FGFS101_FLOOD_SENSOR_TYPE,
        command_class: COMMAND_CLASS_SENSOR_ALARM,
    },
    Component::BinarySensor,
)];

static BUILTIN: WorkaroundTable = WorkaroundTable::new(&DEVICE_WORKAROUNDS, &COMPONENT_OVERRIDES);

impl WorkaroundTable {
    /// Creates a table from static entries. Keys are matched exactly.
    #[must_use]
    pub const fn new(
        devices: &'static [(WorkaroundKey, Workaround)],
        components: &'static [(ComponentKey, Component)],
    ) -> Self {
        Self {
            devices,
            components,
        }
    }

    /// Returns the table of known devices.
    #[must_use]
    pub fn builtin() -> &'static Self {
        &BUILTIN
    }

    #[must_use]
    pub fn workaround(&self, key: &WorkaroundKey) -> Option<Workaround> {
        self.devices
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, workaround)| *workaround)
    }

    #[must_use]
    pub fn component(&self, key: &ComponentKey) -> Option<Component> {
        self.components
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, component)| *component)
    }
}

/// Parses a hexadecimal identifier such as `"0x013c"` or `"013C"`.
///
/// # Errors
///
/// Returns `ParseError::InvalidIdentifier` if `value` is not a 16-bit hex
/// number.
pub fn parse_hex_id(field: &'static str, value: &str) -> Result<u16, ParseError> {
    let trimmed = value.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    u16::from_str_radix(digits, 16).map_err(|_| ParseError::InvalidIdentifier {
        field,
        value: value.to_string(),
    })
}

fn parse_or_log(field: &'static str, value: &str) -> Option<u16> {
    parse_hex_id(field, value)
        .inspect_err(|e| tracing::debug!(error = %e, "Skipping workaround lookup"))
        .ok()
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

/// Returns the workaround for a value of a device.
///
/// Devices whose identifiers are still blank (interview not finished)
/// never match.
#[must_use]
pub fn lookup_workaround(table: &WorkaroundTable, ids: DeviceIds<'_>, index: u8) -> Option<Workaround> {
    if is_blank(ids.manufacturer_id) || is_blank(ids.product_type) || is_blank(ids.product_id) {
        return None;
    }
    let key = WorkaroundKey {
        manufacturer_id: parse_or_log("manufacturer_id", ids.manufacturer_id)?,
        product_type: parse_or_log("product_type", ids.product_type)?,
        product_id: parse_or_log("product_id", ids.product_id)?,
        index,
    };
    table.workaround(&key)
}

/// Returns the component a value of a device should be exposed as.
#[must_use]
pub fn lookup_component_override(
    table: &WorkaroundTable,
    ids: DeviceIds<'_>,
    command_class: u8,
) -> Option<Component> {
    if is_blank(ids.manufacturer_id) || is_blank(ids.product_type) {
        return None;
    }
    let key = ComponentKey {
        manufacturer_id: parse_or_log("manufacturer_id", ids.manufacturer_id)?,
        product_type: parse_or_log("product_type", ids.product_type)?,
        command_class,
    };
    table.component(&key)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids<'a>(manufacturer_id: &'a str, product_type: &'a str, product_id: &'a str) -> DeviceIds<'a> {
        DeviceIds {
            manufacturer_id,
            product_type,
            product_id,
        }
    }

    #[test]
    fn philio_motion_sensors() {
        let table = WorkaroundTable::builtin();
        assert_eq!(
            lookup_workaround(table, ids("0x013c", "0x0002", "0x0002"), 0),
            Some(Workaround::TriggerNoOffEvent)
        );
        assert_eq!(
            lookup_workaround(table, ids("0x013c", "0x0002", "0x000d"), 0),
            Some(Workaround::TriggerNoOffEvent)
        );
        assert_eq!(
            lookup_workaround(table, ids("0x0118", "0x0002", "0x0002"), 0),
            Some(Workaround::TriggerNoOffEvent)
        );
    }

    #[test]
    fn index_must_match() {
        let table = WorkaroundTable::builtin();
        assert_eq!(lookup_workaround(table, ids("0x013c", "0x0002", "0x0002"), 1), None);
    }

    #[test]
    fn zxt_120_thermostat() {
        let table = WorkaroundTable::builtin();
        assert_eq!(
            lookup_workaround(table, ids("0x5254", "0x0100", "0x8377"), 0),
            Some(Workaround::Zxt120)
        );
    }

    #[test]
    fn entries_match_exactly() {
        let table = WorkaroundTable::builtin();
        assert_eq!(lookup_workaround(table, ids("0x5254", "0xffff", "0x8377"), 0), None);
        assert_eq!(lookup_workaround(table, ids("0x5254", "0x0100", "0x8377"), 250), None);
        assert_eq!(lookup_workaround(table, ids("0x5254", "0xffff", "0x8377"), 250), None);
        assert_eq!(lookup_workaround(table, ids("0x013c", "0x0003", "0x0002"), 0), None);
    }

    #[test]
    fn blank_identifiers_never_match() {
        let table = WorkaroundTable::builtin();
        assert_eq!(lookup_workaround(table, ids("", "0x0002", "0x0002"), 0), None);
        assert_eq!(lookup_workaround(table, ids("0x013c", "  ", "0x0002"), 0), None);
        assert_eq!(lookup_workaround(table, ids("0x013c", "0x0002", ""), 0), None);
        assert_eq!(
            lookup_component_override(table, ids(" ", "0x0b00", ""), COMMAND_CLASS_SENSOR_ALARM),
            None
        );
    }

    #[test]
    fn malformed_identifiers_never_match() {
        let table = WorkaroundTable::builtin();
        assert_eq!(lookup_workaround(table, ids("0xZZ", "0x0002", "0x0002"), 0), None);
        assert_eq!(lookup_workaround(table, ids("0x13c00", "0x0002", "0x0002"), 0), None);
    }

    #[test]
    fn unknown_device() {
        let table = WorkaroundTable::builtin();
        assert_eq!(lookup_workaround(table, ids("0x0086", "0x0002", "0x0064"), 0), None);
    }

    #[test]
    fn fibaro_flood_sensor_alarm_is_binary_sensor() {
        let table = WorkaroundTable::builtin();
        let fgfs101 = ids("0x010f", "0x0b00", "");
        assert_eq!(
            lookup_component_override(table, fgfs101, COMMAND_CLASS_SENSOR_ALARM),
            Some(Component::BinarySensor)
        );
        assert_eq!(lookup_component_override(table, fgfs101, 0x31), None);
    }

    #[test]
    fn custom_table() {
        static DEVICES: [(WorkaroundKey, Workaround); 1] = [(
            WorkaroundKey::new(0x0001, 0x0002, 0x0003, 4),
            Workaround::Zxt120,
        )];
        let table = WorkaroundTable::new(&DEVICES, &[]);
        assert_eq!(
            lookup_workaround(&table, ids("1", "2", "3"), 4),
            Some(Workaround::Zxt120)
        );
        assert_eq!(lookup_workaround(WorkaroundTable::builtin(), ids("1", "2", "3"), 4), None);
    }

    #[test]
    fn parse_hex_variants() {
        assert_eq!(parse_hex_id("manufacturer_id", "0x013c").unwrap(), 0x013c);
        assert_eq!(parse_hex_id("manufacturer_id", "013C").unwrap(), 0x013c);
        assert_eq!(parse_hex_id("manufacturer_id", " 0X0b00 ").unwrap(), 0x0b00);
        let err = parse_hex_id("product_id", "zz").unwrap_err();
        assert!(matches!(
            err,
            ParseError::InvalidIdentifier { field: "product_id", .. }
        ));
    }

    #[test]
    fn names() {
        assert_eq!(Workaround::TriggerNoOffEvent.to_string(), "trigger_no_off_event");
        assert_eq!(Workaround::Zxt120.as_str(), "zxt_120");
        assert_eq!(Component::BinarySensor.to_string(), "binary_sensor");
    }
}
