/// Storage change events as delivered by the database webhook
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EventKind {
    Insert,
    Update,
    Delete,
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventKind::Insert => write!(f, "INSERT"),
            EventKind::Update => write!(f, "UPDATE"),
            EventKind::Delete => write!(f, "DELETE"),
        }
    }
}

/// The changed storage object row. `name` is the object path inside the
/// bucket; the task id is not validated beyond its position in the path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectRecord {
    pub id: String,
    pub name: String,
    pub bucket_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageChangeEvent {
    pub kind: EventKind,
    pub record: ObjectRecord,
}

/// Parse and validate a webhook body.
///
/// Field problems are collected rather than short-circuited, so a caller
/// fixing a malformed sender sees every issue at once.
pub fn parse_storage_event(body: &[u8]) -> Result<StorageChangeEvent, Vec<String>> {
    let value: Value =
        serde_json::from_slice(body).map_err(|e| vec![format!("body: invalid JSON: {}", e)])?;

    let mut errors = Vec::new();

    let kind = match value.get("type").and_then(Value::as_str) {
        Some("INSERT") => Some(EventKind::Insert),
        Some("UPDATE") => Some(EventKind::Update),
        Some("DELETE") => Some(EventKind::Delete),
        Some(other) => {
            errors.push(format!(
                "type: must be one of INSERT, UPDATE, DELETE (got \"{}\")",
                other
            ));
            None
        }
        None => {
            errors.push("type: required string".to_string());
            None
        }
    };

    let record = match value.get("record") {
        Some(record_value) if record_value.is_object() => {
            let id = string_field(record_value, "id", &mut errors);
            let name = string_field(record_value, "name", &mut errors);
            let bucket_id = string_field(record_value, "bucket_id", &mut errors);
            match (id, name, bucket_id) {
                (Some(id), Some(name), Some(bucket_id)) => Some(ObjectRecord {
                    id,
                    name,
                    bucket_id,
                }),
                _ => None,
            }
        }
        Some(_) => {
            errors.push("record: must be an object".to_string());
            None
        }
        None => {
            errors.push("record: required object".to_string());
            None
        }
    };

    match (kind, record) {
        (Some(kind), Some(record)) if errors.is_empty() => {
            Ok(StorageChangeEvent { kind, record })
        }
        _ => Err(errors),
    }
}

fn string_field(record: &Value, field: &str, errors: &mut Vec<String>) -> Option<String> {
    match record.get(field).and_then(Value::as_str) {
        Some(s) => Some(s.to_string()),
        None => {
            errors.push(format!("record.{}: required string", field));
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_well_formed_insert() {
        let body = br#"{"type":"INSERT","record":{"id":"o1","name":"abc123/raw","bucket_id":"images"}}"#;
        let event = parse_storage_event(body).unwrap();

        assert_eq!(event.kind, EventKind::Insert);
        assert_eq!(event.record.id, "o1");
        assert_eq!(event.record.name, "abc123/raw");
        assert_eq!(event.record.bucket_id, "images");
    }

    #[test]
    fn rejects_non_json_bodies() {
        let errors = parse_storage_event(b"not json").unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].starts_with("body: invalid JSON"));
    }

    #[test]
    fn rejects_unknown_event_types() {
        let body = br#"{"type":"TRUNCATE","record":{"id":"o1","name":"n","bucket_id":"b"}}"#;
        let errors = parse_storage_event(body).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("must be one of INSERT, UPDATE, DELETE"));
    }

    #[test]
    fn collects_every_field_error_at_once() {
        let body = br#"{"record":{"id":7}}"#;
        let errors = parse_storage_event(body).unwrap_err();

        assert!(errors.iter().any(|e| e.starts_with("type:")));
        assert!(errors.iter().any(|e| e == "record.id: required string"));
        assert!(errors.iter().any(|e| e == "record.name: required string"));
        assert!(errors.iter().any(|e| e == "record.bucket_id: required string"));
        assert_eq!(errors.len(), 4);
    }

    #[test]
    fn rejects_a_non_object_record() {
        let body = br#"{"type":"INSERT","record":"nope"}"#;
        let errors = parse_storage_event(body).unwrap_err();
        assert_eq!(errors, vec!["record: must be an object".to_string()]);
    }
}
