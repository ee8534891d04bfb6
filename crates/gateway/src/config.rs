//! # 起動時設定
//!
//! 環境変数からのGateway設定読み込み。
//! 鍵未設定時は開発用のランダム鍵にフォールバックするが、
//! 認証トークンは必須（未設定なら起動失敗）。

use std::env;
use std::sync::Arc;

use anyhow::{bail, Context};
use mintpass_crypto::{HashSigner, MessageSigner};

use crate::auth::AuthGate;
use crate::service::SigningService;

/// 全エンドポイントで共有されるアプリケーション状態
#[derive(Clone)]
pub struct GatewayState {
    pub service: Arc<SigningService>,
}

impl GatewayState {
    /// 環境変数から状態を構築する。
    ///
    /// - `AUTH_TOKENS`: カンマ区切りの既知クレデンシャル（必須）
    /// - `SIGNER_PRIVATE_KEY`: 署名鍵の16進表現（未設定ならランダム鍵で起動）
    pub fn from_env() -> anyhow::Result<Self> {
        let raw_tokens =
            env::var("AUTH_TOKENS").context("環境変数 AUTH_TOKENS が設定されていません")?;
        let auth = AuthGate::from_env_value(&raw_tokens);
        if auth.is_empty() {
            bail!("AUTH_TOKENS に有効なトークンが1つも含まれていません");
        }

        let signer = match env::var("SIGNER_PRIVATE_KEY") {
            Ok(key_hex) => MessageSigner::from_hex(&key_hex)
                .context("SIGNER_PRIVATE_KEY の解釈に失敗しました")?,
            Err(_) => {
                tracing::warn!(
                    "SIGNER_PRIVATE_KEY が未設定のためランダム鍵で起動します（開発用）"
                );
                MessageSigner::random()
            }
        };
        tracing::info!(signer = %signer.address(), tokens = auth.len(), "署名サービスを初期化");

        Ok(Self {
            service: Arc::new(SigningService::new(auth, Box::new(signer))),
        })
    }
}
