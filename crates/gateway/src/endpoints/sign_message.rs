//! # POST /sign_message
//!
//! ミント認可メッセージの署名エンドポイント。

use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use mintpass_types::{SignMessageRequest, SignMessageResponse};

use crate::auth::extract_credential;
use crate::config::GatewayState;
use crate::error::GatewayError;

/// 認可署名リクエストを処理する
pub async fn handler(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    Json(request): Json<SignMessageRequest>,
) -> Result<Json<SignMessageResponse>, GatewayError> {
    let credential = extract_credential(&headers);
    let response = state
        .service
        .sign(credential, &request.address, &request.token_id)?;
    tracing::info!(address = %request.address, token_id = %request.token_id, "署名を発行");
    Ok(Json(response))
}
