// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! MQTT topic filter matching.

/// Returns `true` if `filter` is a well-formed MQTT topic filter.
///
/// `+` must occupy a whole level and `#` must be the whole last level.
#[must_use]
pub fn is_valid_filter(filter: &str) -> bool {
    if filter.is_empty() {
        return false;
    }
    let levels: Vec<&str> = filter.split('/').collect();
    let last = levels.len() - 1;
    levels.iter().enumerate().all(|(i, level)| match *level {
        "#" => i == last,
        "+" => true,
        other => !other.contains(['+', '#']),
    })
}

/// Returns `true` if `topic` matches the MQTT topic `filter`.
///
/// `+` matches exactly one level; `#` matches the parent level and any
/// number of levels below it. Topics starting with `$` are never matched
/// by a leading wildcard.
///
/// # Examples
///
/// ```
/// use hubstate_lib::protocol::topic_matches;
///
/// assert!(topic_matches("home/garage/door", "home/garage/door"));
/// assert!(topic_matches("home/+/door", "home/garage/door"));
/// assert!(topic_matches("home/#", "home/garage/door"));
/// assert!(!topic_matches("home/+", "home/garage/door"));
/// ```
#[must_use]
pub fn topic_matches(filter: &str, topic: &str) -> bool {
    if !is_valid_filter(filter) {
        return false;
    }
    if topic.starts_with('$') && (filter.starts_with('+') || filter.starts_with('#')) {
        return false;
    }

    let mut topic_levels = topic.split('/');
    for level in filter.split('/') {
        match level {
            "#" => return true,
            "+" => {
                if topic_levels.next().is_none() {
                    return false;
                }
            }
            literal => {
                if topic_levels.next() != Some(literal) {
                    return false;
                }
            }
        }
    }
    topic_levels.next().is_none()
}
