// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! End-to-end cover behavior through the public API.

use std::sync::Arc;

use hubstate_lib::cover::{CoverCommand, CoverConfig, CoverStateChange, CoverUpdate, MqttCover};
use hubstate_lib::error::ProtocolError;
use hubstate_lib::protocol::{Publisher, TopicRouter};
use hubstate_lib::types::{Position, QosLevel};
use parking_lot::Mutex;

/// Publisher that records every message.
#[derive(Debug, Default)]
struct Recorder {
    messages: Mutex<Vec<(String, String)>>,
}

impl Publisher for Recorder {
    async fn publish(
        &self,
        topic: &str,
        payload: &str,
        _qos: QosLevel,
        _retain: bool,
    ) -> Result<(), ProtocolError> {
        self.messages
            .lock()
            .push((topic.to_string(), payload.to_string()));
        Ok(())
    }
}

fn updates_of(cover: &MqttCover<Arc<Recorder>>) -> Arc<Mutex<Vec<CoverUpdate>>> {
    let updates = Arc::new(Mutex::new(Vec::new()));
    let updates_clone = Arc::clone(&updates);
    cover.on_state_changed(move |u| updates_clone.lock().push(u.clone()));
    updates
}

#[tokio::test]
async fn garage_door_with_feedback() {
    let router = Arc::new(TopicRouter::new());
    let recorder = Arc::new(Recorder::default());
    let config: CoverConfig = serde_json::from_value(serde_json::json!({
        "name": "Garage Door",
        "command_topic": "garage/door/set",
        "state_topic": "garage/door/state",
        "payload_open": "UP",
        "payload_close": "DOWN",
        "state_open": "opened",
        "qos": 1
    }))
    .unwrap();

    let cover = Arc::new(MqttCover::new(config, Arc::clone(&recorder)).unwrap());
    let _route = cover.subscribe(&router).unwrap();
    let updates = updates_of(&cover);
    assert!(!cover.is_optimistic());
    assert_eq!(cover.is_closed(), None);

    cover.open_cover().await;
    assert_eq!(cover.is_closed(), None);

    router.route("garage/door/state", "opened");
    assert_eq!(cover.is_closed(), Some(false));

    router.route("garage/door/state", "42");
    assert_eq!(cover.current_position(), Some(Position::new(42).unwrap()));
    assert_eq!(cover.is_closed(), Some(false));

    router.route("garage/door/state", "closed");
    assert_eq!(cover.is_closed(), Some(true));

    router.route("garage/door/state", "jammed");
    assert_eq!(cover.is_closed(), Some(true));

    cover.close_cover().await;
    assert_eq!(
        recorder.messages.lock().clone(),
        vec![
            ("garage/door/set".to_string(), "UP".to_string()),
            ("garage/door/set".to_string(), "DOWN".to_string()),
        ]
    );

    let changes: Vec<CoverStateChange> = updates.lock().iter().map(|u| u.change).collect();
    assert_eq!(
        changes,
        vec![
            CoverStateChange::Opened,
            CoverStateChange::Moved(Position::new(42).unwrap()),
            CoverStateChange::Closed,
        ]
    );
}

#[tokio::test]
async fn optimistic_blind_without_state_topic() {
    let recorder = Arc::new(Recorder::default());
    let cover = MqttCover::new(CoverConfig::new("blind/set"), Arc::clone(&recorder)).unwrap();
    let updates = updates_of(&cover);

    assert!(cover.is_optimistic());
    assert_eq!(cover.supported_features(), &CoverCommand::ALL);

    cover.close_cover().await;
    assert_eq!(cover.is_closed(), Some(true));
    cover.stop_cover().await;
    assert_eq!(cover.is_closed(), Some(true));
    cover.open_cover().await;
    assert_eq!(cover.current_position(), Some(Position::OPEN));

    assert_eq!(updates.lock().len(), 2);
    assert_eq!(recorder.messages.lock().len(), 3);
}

#[tokio::test]
async fn forced_optimistic_still_accepts_feedback() {
    let router = Arc::new(TopicRouter::new());
    let config = CoverConfig::new("awning/set")
        .with_state_topic("awning/state")
        .with_optimistic(true);
    let cover = Arc::new(MqttCover::new(config, Recorder::default()).unwrap());
    let _route = cover.subscribe(&router).unwrap();

    cover.open_cover().await;
    assert_eq!(cover.is_closed(), Some(false));

    router.route("awning/state", "0");
    assert_eq!(cover.is_closed(), Some(true));
}

#[test]
fn json_value_template() {
    let router = Arc::new(TopicRouter::new());
    let config = CoverConfig::new("shutter/set")
        .with_state_topic("shutter/state")
        .with_value_template("value_json.position");
    let cover = Arc::new(MqttCover::new(config, Recorder::default()).unwrap());
    let _route = cover.subscribe(&router).unwrap();

    router.route("shutter/state", r#"{"position": 30}"#);
    assert_eq!(cover.current_position(), Some(Position::new(30).unwrap()));

    router.route("shutter/state", r#"{"position": "closed"}"#);
    assert_eq!(cover.is_closed(), Some(true));
}

#[test]
fn wildcard_route_reaches_several_covers() {
    let router = Arc::new(TopicRouter::new());
    let living = Arc::new(
        MqttCover::new(
            CoverConfig::new("blinds/living/set").with_state_topic("blinds/living/state"),
            Recorder::default(),
        )
        .unwrap(),
    );
    let seen = Arc::new(Mutex::new(Vec::new()));
    let seen_clone = Arc::clone(&seen);
    let _all = router.subscribe("blinds/+/state", move |topic, _| {
        seen_clone.lock().push(topic.to_string());
    });
    let _route = living.subscribe(&router).unwrap();

    assert_eq!(router.route("blinds/living/state", "open"), 2);
    assert_eq!(router.route("blinds/bedroom/state", "open"), 1);
    assert_eq!(living.is_closed(), Some(false));
    assert_eq!(seen.lock().len(), 2);
}
