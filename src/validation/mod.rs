//! Camera batch validation.
//!
//! A batch is checked in full before anything is published. Each group goes
//! through a presence check on the raw JSON followed by a typed decode of
//! every field; both report every offending field at once.

use crate::error::Error;
use crate::models::{CameraGroup, CameraId};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// Keys every camera group must carry. `event_rules` is optional.
pub const REQUIRED_FIELDS: [&str; 5] = ["camera_id", "url", "events", "running", "user_id"];

/// Validate a `{"cameras": [...]}` request body.
///
/// Returns the decoded groups in request order, or the rejection of the
/// first invalid group.
pub fn validate_batch(body: &Value) -> Result<Vec<CameraGroup>, Error> {
    let cameras = match body.get("cameras") {
        Some(Value::Array(cameras)) => cameras,
        Some(value) if !is_blank(value) => {
            return Err(Error::InvalidFields {
                group: 0,
                fields: vec!["cameras".to_string()],
            })
        }
        _ => return Err(Error::EmptyBatch),
    };

    if cameras.is_empty() {
        return Err(Error::EmptyBatch);
    }

    cameras
        .iter()
        .enumerate()
        .map(|(index, camera)| validate_group(index, camera))
        .collect()
}

/// `null`, `false`, `0`, `""` and `{}` all mean "no cameras"
fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(flag) => !flag,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
    }
}

/// Validate a single camera group at position `index` of the batch
pub fn validate_group(index: usize, camera: &Value) -> Result<CameraGroup, Error> {
    let empty = Map::new();
    let fields = camera.as_object().unwrap_or(&empty);

    let missing: Vec<String> = REQUIRED_FIELDS
        .iter()
        .filter(|name| !fields.contains_key(**name))
        .map(|name| name.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(Error::MissingFields {
            group: index,
            fields: missing,
        });
    }

    let mut invalid = Vec::new();

    let camera_ids = decode::<Vec<CameraId>>(&fields["camera_id"]).filter(|ids| !ids.is_empty());
    if camera_ids.is_none() {
        invalid.push("camera_id");
    }

    let urls = decode::<Vec<String>>(&fields["url"]).filter(|urls| !urls.is_empty());
    if urls.is_none() {
        invalid.push("url");
    }

    let events = fields["events"].as_object().filter(|events| !events.is_empty());
    if events.is_none() {
        invalid.push("events");
    }

    // No truthy coercion: 1 or "true" are not booleans.
    let running = fields["running"].as_bool();
    if running.is_none() {
        invalid.push("running");
    }

    let user_id = fields["user_id"].as_str().filter(|id| !id.trim().is_empty());
    if user_id.is_none() {
        invalid.push("user_id");
    }

    let event_rules = match fields.get("event_rules") {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Object(rules)) => Ok(Some(rules.clone())),
        Some(_) => Err(()),
    };
    if event_rules.is_err() {
        invalid.push("event_rules");
    }

    match (camera_ids, urls, events, running, user_id, event_rules) {
        (Some(camera_ids), Some(urls), Some(events), Some(running), Some(user_id), Ok(event_rules)) => {
            Ok(CameraGroup {
                camera_ids,
                urls,
                events: events.clone(),
                event_rules,
                running,
                user_id: user_id.to_string(),
            })
        }
        _ => Err(Error::InvalidFields {
            group: index,
            fields: invalid.into_iter().map(String::from).collect(),
        }),
    }
}

fn decode<T: DeserializeOwned>(value: &Value) -> Option<T> {
    serde_json::from_value(value.clone()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid_group() -> Value {
        json!({
            "camera_id": [10, 20],
            "url": ["rtsp://10.0.0.10/live", "rtsp://10.0.0.20/live"],
            "events": {"intrusion": true},
            "event_rules": {"intrusion": {"zone": "gate"}},
            "running": true,
            "user_id": "user-42"
        })
    }

    fn rejected_fields(result: Result<Vec<CameraGroup>, Error>) -> Vec<String> {
        match result {
            Err(Error::MissingFields { fields, .. }) | Err(Error::InvalidFields { fields, .. }) => fields,
            other => panic!("expected a field rejection, got {:?}", other),
        }
    }

    #[test]
    fn absent_or_blank_cameras_is_an_empty_batch() {
        for body in [
            json!({}),
            json!({"cameras": null}),
            json!({"cameras": []}),
            json!({"cameras": {}}),
            json!({"cameras": ""}),
            json!({"cameras": false}),
            json!({"cameras": 0}),
            json!([1, 2]),
        ] {
            assert!(matches!(validate_batch(&body), Err(Error::EmptyBatch)), "{}", body);
        }
    }

    #[test]
    fn cameras_must_be_a_list() {
        for cameras in [json!({"camera_id": [1]}), json!("cam-1"), json!(true), json!(3)] {
            let fields = rejected_fields(validate_batch(&json!({ "cameras": cameras })));
            assert_eq!(fields, vec!["cameras"]);
        }
    }

    #[test]
    fn valid_group_decodes_without_pairing_ids_and_urls() {
        let groups = validate_batch(&json!({"cameras": [valid_group()]})).unwrap();

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].camera_ids.len(), 2);
        assert_eq!(groups[0].urls.len(), 2);
        assert!(groups[0].running);
        assert_eq!(groups[0].user_id, "user-42");
        assert!(groups[0].event_rules.is_some());
    }

    #[test]
    fn event_rules_may_be_omitted_or_null() {
        let mut group = valid_group();
        group.as_object_mut().unwrap().remove("event_rules");
        let groups = validate_batch(&json!({"cameras": [group.clone()]})).unwrap();
        assert_eq!(groups[0].event_rules, None);

        group["event_rules"] = Value::Null;
        let groups = validate_batch(&json!({"cameras": [group]})).unwrap();
        assert_eq!(groups[0].event_rules, None);
    }

    #[test]
    fn every_missing_field_is_listed() {
        let fields = rejected_fields(validate_batch(&json!({
            "cameras": [{"url": ["rtsp://x"], "events": {"a": 1}}]
        })));
        assert_eq!(fields, vec!["camera_id", "running", "user_id"]);
    }

    #[test]
    fn non_object_group_is_missing_everything() {
        let fields = rejected_fields(validate_batch(&json!({"cameras": ["camera-1"]})));
        assert_eq!(fields, REQUIRED_FIELDS.to_vec());
    }

    #[test]
    fn shape_is_only_checked_after_presence() {
        let result = validate_batch(&json!({
            "cameras": [{"camera_id": [], "url": [], "events": {}, "running": 1}]
        }));
        assert!(matches!(result, Err(Error::MissingFields { ref fields, .. }) if fields == &["user_id"]));
    }

    #[test]
    fn every_shape_violation_is_listed() {
        let fields = rejected_fields(validate_batch(&json!({
            "cameras": [{
                "camera_id": [],
                "url": "rtsp://not-a-list",
                "events": {},
                "event_rules": ["not", "a", "map"],
                "running": "true",
                "user_id": "   "
            }]
        })));
        assert_eq!(
            fields,
            vec!["camera_id", "url", "events", "running", "user_id", "event_rules"]
        );
    }

    #[test]
    fn running_is_not_coerced() {
        for running in [json!(1), json!(0), json!("false"), json!(null)] {
            let mut group = valid_group();
            group["running"] = running;
            let fields = rejected_fields(validate_batch(&json!({"cameras": [group]})));
            assert_eq!(fields, vec!["running"]);
        }
    }

    #[test]
    fn user_id_must_be_a_non_blank_string() {
        for user_id in [json!(""), json!(" \t\n"), json!(42), json!(null)] {
            let mut group = valid_group();
            group["user_id"] = user_id;
            let fields = rejected_fields(validate_batch(&json!({"cameras": [group]})));
            assert_eq!(fields, vec!["user_id"]);
        }
    }

    #[test]
    fn malformed_list_elements_are_invalid() {
        let mut group = valid_group();
        group["camera_id"] = json!([{"id": 1}]);
        group["url"] = json!([1, 2]);
        let fields = rejected_fields(validate_batch(&json!({"cameras": [group]})));
        assert_eq!(fields, vec!["camera_id", "url"]);
    }

    #[test]
    fn first_rejected_group_is_reported_with_its_index() {
        let mut broken = valid_group();
        broken.as_object_mut().unwrap().remove("url");

        let result = validate_batch(&json!({"cameras": [valid_group(), broken, {}]}));
        match result {
            Err(Error::MissingFields { group, fields }) => {
                assert_eq!(group, 1);
                assert_eq!(fields, vec!["url"]);
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
