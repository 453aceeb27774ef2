/// Job payload and enqueue receipt for the image-processing task
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Name the processing task is registered under
pub const TASK_NAME: &str = "process-image";

/// Everything the runner needs: which task, and where its raw upload lives.
/// Field names are camelCase on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessImagePayload {
    pub file_id: String,
    pub image_url: String,
}

/// Receipt returned to the caller when a job is accepted. Serialized as the
/// body of a successful dispatch response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnqueuedJob {
    pub id: Uuid,
    pub task: String,
    pub tags: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_uses_camel_case_on_the_wire() {
        let payload = ProcessImagePayload {
            file_id: "abc123".to_string(),
            image_url: "https://example.test/images/abc123/raw".to_string(),
        };

        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["fileId"], "abc123");
        assert_eq!(json["imageUrl"], "https://example.test/images/abc123/raw");

        let parsed: ProcessImagePayload = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, payload);
    }
}
