// Wire types of the panel command endpoints.
//
// The service answers the command PUT in two shapes: an acknowledgement
// `{id, status}` (HTTP 200) that must be polled, or the completion record
// `{statusCode, messageKey, errorCode}` directly (HTTP 201). The poll
// endpoint always returns the completion record.

use serde::{Deserialize, Deserializer, Serialize};

/// Raw response as seen by the command layer.
///
/// Interpretation is left to the caller: the status mapper branches on the
/// HTTP status first and only then decodes the body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: String,
}

impl PanelResponse {
    /// Whether the declared content type is JSON. A missing header counts
    /// as JSON so the decoder gets a chance to judge the body itself.
    pub fn is_json(&self) -> bool {
        self.content_type
            .as_deref()
            .is_none_or(|ct| ct.to_ascii_lowercase().contains("json"))
    }

    /// Leading part of the body, for log lines and error messages.
    pub fn body_preview(&self) -> &str {
        let mut end = self.body.len().min(200);
        while !self.body.is_char_boundary(end) {
            end -= 1;
        }
        &self.body[..end]
    }
}

/// Acknowledgement of a submitted command (HTTP 200).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SubmitAck {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub status: String,
    /// Only present on rejected submissions.
    #[serde(default, rename = "errorCode")]
    pub error_code: Option<i64>,
}

impl SubmitAck {
    pub fn is_success(&self) -> bool {
        self.status == "success"
    }
}

/// Completion record of a command job (poll response, or HTTP 201).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionStatus {
    pub status_code: i64,
    #[serde(default)]
    pub message_key: Option<String>,
    #[serde(default)]
    pub error_code: Option<i64>,
}

impl CompletionStatus {
    /// The job finished and its result is final.
    pub const COMPLETED: i64 = 2;
    /// The panel gave up on the job ("operation took too long").
    pub const TOO_LONG: i64 = 6;
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Number(i64),
    }

    Ok(match Id::deserialize(deserializer)? {
        Id::Text(s) => s,
        Id::Number(n) => n.to_string(),
    })
}
