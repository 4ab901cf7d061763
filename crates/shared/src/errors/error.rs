use serde::Serialize;
use utoipa::ToSchema;

/// Wire body for every failed request.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub status: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            status: "fail".to_string(),
            message: message.into(),
        }
    }
}
