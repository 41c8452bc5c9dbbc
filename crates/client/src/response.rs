use attempt_sync_core::SyncError;
use serde::{Deserialize, Serialize};

/// Envelope wrapping every backend response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    #[serde(default)]
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message.into()),
        }
    }

    /// Unwrap the payload, turning `success: false` into [`SyncError::Api`].
    pub fn into_data(self) -> Result<T, SyncError> {
        self.check()?
            .data
            .ok_or_else(|| SyncError::Decode("response carried no data".to_string()))
    }

    /// For endpoints whose payload is irrelevant.
    pub fn into_unit(self) -> Result<(), SyncError> {
        self.check().map(|_| ())
    }

    fn check(self) -> Result<Self, SyncError> {
        if self.success {
            return Ok(self);
        }
        Err(SyncError::Api(
            self.message
                .unwrap_or_else(|| "request failed".to_string()),
        ))
    }
}
