/// Success envelope
///
/// Every successful handler wraps its payload as
///
/// ```json
/// { "data": { ... }, "message": "Store created", "success": true }
/// ```

use axum::{http::StatusCode, Json};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub data: T,
    pub message: String,
    pub success: bool,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn new(data: T, message: impl Into<String>) -> Self {
        Self {
            data,
            message: message.into(),
            success: true,
        }
    }

    /// 200 response
    pub fn ok(data: T, message: impl Into<String>) -> Json<Self> {
        Json(Self::new(data, message))
    }

    /// 201 response
    pub fn created(data: T, message: impl Into<String>) -> (StatusCode, Json<Self>) {
        (StatusCode::CREATED, Json(Self::new(data, message)))
    }
}
