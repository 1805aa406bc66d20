// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Payload pre-processing before state matching.
//!
//! A cover may be configured with a value template that extracts the
//! relevant part of a vendor payload before it is compared with the state
//! tokens. Any `Fn(&str) -> String` works as a template; [`JsonValueTemplate`]
//! covers the common case of picking a field out of a JSON document.

use std::fmt;
use std::str::FromStr;

use serde_json::Value;

/// Transforms a raw inbound payload into the string used for matching.
pub trait ValueTemplate: Send + Sync {
    /// Renders the template against `payload`.
    fn render(&self, payload: &str) -> String;
}

impl<F> ValueTemplate for F
where
    F: Fn(&str) -> String + Send + Sync,
{
    fn render(&self, payload: &str) -> String {
        self(payload)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Key(String),
    Index(usize),
}

/// Extracts a value from a JSON payload by path.
///
/// Paths are dot-separated keys, with numeric segments indexing arrays.
/// A leading `value_json.` is accepted and ignored. When the payload is
/// not JSON or the path does not resolve, the raw payload is returned
/// unchanged.
///
/// # Examples
///
/// ```
/// use hubstate_lib::template::{JsonValueTemplate, ValueTemplate};
///
/// let template: JsonValueTemplate = "value_json.shutter.position".parse().unwrap();
/// assert_eq!(template.render(r#"{"shutter":{"position":40}}"#), "40");
/// assert_eq!(template.render("closed"), "closed");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonValueTemplate {
    source: String,
    path: Vec<Segment>,
}

/// Error returned when a template path is empty or has an empty segment.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid template path: {0:?}")]
pub struct TemplatePathError(String);

impl JsonValueTemplate {
    /// Returns the path this template was built from.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    fn lookup<'a>(&self, mut value: &'a Value) -> Option<&'a Value> {
        for segment in &self.path {
            value = match (segment, value) {
                (Segment::Key(key), Value::Object(map)) => map.get(key)?,
                (Segment::Index(index), Value::Array(items)) => items.get(*index)?,
                // Numeric keys are valid object keys too
                (Segment::Index(index), Value::Object(map)) => map.get(&index.to_string())?,
                _ => return None,
            };
        }
        Some(value)
    }
}

impl FromStr for JsonValueTemplate {
    type Err = TemplatePathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let path = trimmed.strip_prefix("value_json.").unwrap_or(trimmed);
        if path.is_empty() {
            return Err(TemplatePathError(s.to_string()));
        }

        let segments = path
            .split('.')
            .map(|part| {
                if part.is_empty() {
                    Err(TemplatePathError(s.to_string()))
                } else if let Ok(index) = part.parse::<usize>() {
                    Ok(Segment::Index(index))
                } else {
                    Ok(Segment::Key(part.to_string()))
                }
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            source: trimmed.to_string(),
            path: segments,
        })
    }
}

impl ValueTemplate for JsonValueTemplate {
    fn render(&self, payload: &str) -> String {
        let Ok(document) = serde_json::from_str::<Value>(payload) else {
            return payload.to_string();
        };

        match self.lookup(&document) {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Null) | None => {
                tracing::debug!(template = %self.source, "Template path not found in payload");
                payload.to_string()
            }
            Some(other) => other.to_string(),
        }
    }
}

impl fmt::Display for JsonValueTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn template(path: &str) -> JsonValueTemplate {
        path.parse().unwrap()
    }

    #[test]
    fn extracts_string_and_number_fields() {
        let t = template("state");
        assert_eq!(t.render(r#"{"state":"open"}"#), "open");

        let t = template("position");
        assert_eq!(t.render(r#"{"position":75}"#), "75");
    }

    #[test]
    fn extracts_nested_and_indexed_fields() {
        let t = template("value_json.covers.1.pos");
        assert_eq!(
            t.render(r#"{"covers":[{"pos":10},{"pos":20}]}"#),
            "20"
        );
    }

    #[test]
    fn falls_back_to_raw_payload() {
        let t = template("position");
        assert_eq!(t.render("not json"), "not json");
        assert_eq!(t.render(r#"{"other":1}"#), r#"{"other":1}"#);
        assert_eq!(t.render(r#"{"position":null}"#), r#"{"position":null}"#);
    }

    #[test]
    fn rejects_empty_paths() {
        assert!("".parse::<JsonValueTemplate>().is_err());
        assert!("value_json.".parse::<JsonValueTemplate>().is_err());
        assert!("a..b".parse::<JsonValueTemplate>().is_err());
    }

    #[test]
    fn closures_are_templates() {
        let upper = |payload: &str| payload.to_uppercase();
        assert_eq!(upper.render("open"), "OPEN");
    }

    #[test]
    fn display_shows_source() {
        assert_eq!(template("value_json.a").to_string(), "value_json.a");
    }
}
