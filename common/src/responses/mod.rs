use serde::{Deserialize, Serialize};

/// Body returned by the submit endpoints.
///
/// On success `download_url` points at `/download/{filename}`; on failure it
/// is omitted and `message` carries the reason.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmitResponse {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_url: Option<String>,
}

impl SubmitResponse {
    pub fn ok(message: impl Into<String>, download_url: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            download_url: Some(download_url.into()),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            download_url: None,
        }
    }
}

/// Body returned by `/download/{filename}` when the artifact cannot be served.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DownloadError {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requested: Option<String>,
}

/// Body returned by `/version`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionInfo {
    pub version: String,
    pub app: String,
    pub organization: String,
}
