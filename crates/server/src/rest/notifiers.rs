use axum::Json;
use serde::Serialize;

use vulnwatch_engine::rules::{validate_action, ChannelAction};

#[derive(Serialize)]
pub struct TestNotifierResponse {
    pub success: bool,
    pub message: String,
}

/// Shape-checks a channel action without sending anything. The body uses the
/// same `{"channel": ..., "config": ...}` encoding rules carry.
pub async fn test_notifier(Json(body): Json<serde_json::Value>) -> Json<TestNotifierResponse> {
    let action: ChannelAction = match serde_json::from_value(body) {
        Ok(action) => action,
        Err(e) => {
            return Json(TestNotifierResponse {
                success: false,
                message: format!("unrecognized channel config: {e}"),
            });
        }
    };

    match validate_action(&action) {
        Ok(()) => Json(TestNotifierResponse {
            success: true,
            message: format!("{} config valid", action.kind()),
        }),
        Err(e) => Json(TestNotifierResponse {
            success: false,
            message: e.to_string(),
        }),
    }
}
