//! # ヘルスチェック

use axum::Json;
use mintpass_types::HealthResponse;

/// GET / — 稼働確認用の固定メッセージを返す
pub async fn handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        message: "This API is up and running!".to_string(),
    })
}
