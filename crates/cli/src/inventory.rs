//! # 在庫サービスクライアント
//!
//! 次にミント可能なトークンIDを在庫サービスから取得する。
//! 在庫切れ（非200応答）は`Ok(None)`として呼び出し側に返す。

use std::time::Duration;

use anyhow::Context;
use mintpass_types::InventoryItem;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// 在庫サービスへのHTTPクライアント
pub struct InventoryClient {
    url: String,
    http_client: reqwest::Client,
}

impl InventoryClient {
    pub fn new(url: String) -> anyhow::Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("HTTPクライアントの構築に失敗")?;
        Ok(Self { url, http_client })
    }

    /// 次にミント可能なトークンIDを取得する。
    /// 在庫がない場合（非200応答）は`None`を返す。
    pub async fn next_item(&self) -> anyhow::Result<Option<InventoryItem>> {
        let response = self
            .http_client
            .get(&self.url)
            .send()
            .await
            .context("在庫サービスへの接続に失敗")?;

        if !response.status().is_success() {
            tracing::info!(status = %response.status(), "在庫サービスが在庫なしを返しました");
            return Ok(None);
        }

        let item: InventoryItem = response
            .json()
            .await
            .context("在庫サービスの応答の解釈に失敗")?;
        Ok(Some(item))
    }
}
