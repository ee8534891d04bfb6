//! # Gatewayクライアント
//!
//! 署名Gatewayの`POST /sign_message`を呼び出し、認可署名の三つ組を受け取る。

use std::time::Duration;

use anyhow::{bail, Context};
use mintpass_types::{SignMessageRequest, SignMessageResponse, AUTH_TOKEN_HEADER};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// 署名GatewayへのHTTPクライアント
pub struct GatewayClient {
    base_url: String,
    auth_token: String,
    http_client: reqwest::Client,
}

impl GatewayClient {
    pub fn new(base_url: String, auth_token: String) -> anyhow::Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("HTTPクライアントの構築に失敗")?;
        Ok(Self {
            base_url,
            auth_token,
            http_client,
        })
    }

    /// 指定アドレス・トークンIDの認可署名をGatewayに要求する
    pub async fn sign_message(
        &self,
        address: &str,
        token_id_hex: &str,
    ) -> anyhow::Result<SignMessageResponse> {
        let request = SignMessageRequest {
            address: address.to_string(),
            token_id: token_id_hex.to_string(),
        };
        let response = self
            .http_client
            .post(format!("{}/sign_message", self.base_url))
            .header(AUTH_TOKEN_HEADER, &self.auth_token)
            .json(&request)
            .send()
            .await
            .context("Gatewayへの接続に失敗")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            bail!("Gatewayが署名を拒否しました: {} {}", status, body);
        }

        response
            .json()
            .await
            .context("Gatewayの応答の解釈に失敗")
    }
}
