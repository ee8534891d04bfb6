//! # Mintpass Gateway
//!
//! NFTミント認可署名を発行するHTTPサービス。
//!
//! ## 役割
//! - クライアント認証（共有ベアラートークン）
//! - 認可メッセージの正規化・ハッシュ・EIP-191署名
//!
//! ## API エンドポイント
//! - `GET /` — ヘルスチェック
//! - `POST /sign_message` — ミント認可メッセージの署名発行

mod auth;
mod config;
mod endpoints;
mod error;
mod service;

use config::GatewayState;

/// ルーターを組み立てる（テストからも使う）
fn app(state: GatewayState) -> axum::Router {
    axum::Router::new()
        .route("/", axum::routing::get(endpoints::root::handler))
        .route(
            "/sign_message",
            axum::routing::post(endpoints::sign_message::handler),
        )
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let state = GatewayState::from_env()?;

    let addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8000".to_string());
    tracing::info!("Gatewayを {} で起動します", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app(state)).await?;

    Ok(())
}

// ---------------------------------------------------------------------------
// テスト
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthGate;
    use crate::service::SigningService;
    use mintpass_crypto::MessageSigner;
    use mintpass_types::{SignMessageResponse, AUTH_TOKEN_HEADER};
    use std::sync::Arc;

    async fn spawn_gateway() -> String {
        let auth = AuthGate::new(vec!["secret".to_string()]);
        let signer = MessageSigner::random();
        let state = GatewayState {
            service: Arc::new(SigningService::new(auth, Box::new(signer))),
        };
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            axum::serve(listener, app(state)).await.unwrap();
        });
        format!("http://127.0.0.1:{}", port)
    }

    /// GET / がヘルスメッセージを返すこと
    #[tokio::test]
    async fn test_root() {
        let base = spawn_gateway().await;
        let res = reqwest::get(&base).await.unwrap();
        assert_eq!(res.status(), 200);
        let body: serde_json::Value = res.json().await.unwrap();
        assert_eq!(body["message"], "This API is up and running!");
    }

    /// 正常系: 認証ヘッダ付きの署名リクエストが三つ組を返すこと
    #[tokio::test]
    async fn test_sign_message_ok() {
        let base = spawn_gateway().await;
        let client = reqwest::Client::new();
        let res = client
            .post(format!("{}/sign_message", base))
            .header(AUTH_TOKEN_HEADER, "secret")
            .json(&serde_json::json!({
                "address": "0x000000000000000000000000000000000000dEaD",
                "token_id": "2a",
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), 200);
        let body: SignMessageResponse = res.json().await.unwrap();
        assert_eq!(
            body.message,
            "0x000000000000000000000000000000000000dEaD_42"
        );
        assert!(body.signature.starts_with("0x"));
        assert_eq!(body.signature.len(), 2 + 65 * 2);
    }

    /// 認証ヘッダ欠落・不正クレデンシャルは401となること
    #[tokio::test]
    async fn test_sign_message_unauthorized() {
        let base = spawn_gateway().await;
        let client = reqwest::Client::new();

        let body = serde_json::json!({
            "address": "0x000000000000000000000000000000000000dEaD",
            "token_id": "2a",
        });

        let res = client
            .post(format!("{}/sign_message", base))
            .json(&body)
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), 401);

        let res = client
            .post(format!("{}/sign_message", base))
            .header(AUTH_TOKEN_HEADER, "wrong")
            .json(&body)
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), 401);
    }

    /// 不正トークンIDは400となること
    #[tokio::test]
    async fn test_sign_message_bad_token_id() {
        let base = spawn_gateway().await;
        let client = reqwest::Client::new();
        let res = client
            .post(format!("{}/sign_message", base))
            .header(AUTH_TOKEN_HEADER, "secret")
            .json(&serde_json::json!({
                "address": "0x000000000000000000000000000000000000dEaD",
                "token_id": "not-hex",
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), 400);
    }
}
