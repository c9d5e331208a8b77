/// API banner
///
/// ```text
/// GET /api/v1
/// ```
///
/// ```json
/// { "message": "welcome to NORTH BRIDGE 1.0.0" }
/// ```

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::app::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct WelcomeResponse {
    pub message: String,
}

pub fn welcome_message(name: &str, version: &str) -> String {
    format!("welcome to {} {}", name, version)
}

pub async fn welcome(State(state): State<AppState>) -> Json<WelcomeResponse> {
    Json(WelcomeResponse {
        message: welcome_message(&state.config.app.name, &state.config.app.version),
    })
}
