//! # Gateway エラー型
//!
//! 全エンドポイントで共通のエラー型。

use axum::http::StatusCode;

/// Gatewayエラー型。
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// クレデンシャルが無効または欠落。署名処理には到達させない。
    #[error("認証に失敗しました")]
    Unauthorized,
    /// トークンIDが16進数として解釈できない
    #[error("不正なトークンID: {0}")]
    InvalidTokenId(String),
    /// アドレスが20バイトの16進数として解釈できない
    #[error("不正なアドレス: {0}")]
    InvalidAddress(String),
    /// 内部エラー（署名失敗等）
    #[error("内部エラー: {0}")]
    Internal(String),
}

impl axum::response::IntoResponse for GatewayError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            GatewayError::Unauthorized => StatusCode::UNAUTHORIZED,
            GatewayError::InvalidTokenId(_) | GatewayError::InvalidAddress(_) => {
                StatusCode::BAD_REQUEST
            }
            GatewayError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, self.to_string()).into_response()
    }
}
