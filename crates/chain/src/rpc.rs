//! # ノード接続
//!
//! ブロックチェーンノードのJSON-RPCインターフェースを抽象化する。
//! テストではモック実装に差し替える。

use std::str::FromStr;
use std::time::Duration;

use alloy_primitives::{Address, Bytes, B256};

use crate::error::ChainError;

/// RPCリクエストの送信タイムアウト
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// レシートの抽出結果。
#[derive(Debug, Clone)]
pub struct RpcReceipt {
    /// トランザクションハッシュ
    pub transaction_hash: B256,
    /// オンチェーン実行が成功したか（status == 1）
    pub status: bool,
}

/// ブロックチェーンノードの抽象インターフェース。
///
/// ノンス照会・ブロードキャスト・レシート照会・読み取り呼び出しのみを公開する。
#[async_trait::async_trait]
pub trait ChainRpc: Send + Sync {
    /// アカウントの現在のトランザクション数（= 次のノンス）を照会する
    async fn transaction_count(&self, account: Address) -> Result<u64, ChainError>;

    /// ノードの現在のガス価格を照会する
    async fn gas_price(&self) -> Result<u128, ChainError>;

    /// 署名済みトランザクションをブロードキャストし、ハッシュを返す
    async fn send_raw_transaction(&self, raw: &[u8]) -> Result<B256, ChainError>;

    /// トランザクションレシートを照会する。未確定ならNone。
    async fn transaction_receipt(&self, tx_hash: B256) -> Result<Option<RpcReceipt>, ChainError>;

    /// 読み取り専用のコントラクト呼び出し（eth_call）
    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, ChainError>;
}

/// ブロードキャスト拒否の理由がノンスの重複・陳腐化かどうかを判定する。
/// ノード実装によって文言が異なるため部分一致で判定する。
fn is_nonce_rejection(message: &str) -> bool {
    let lower = message.to_lowercase();
    lower.contains("nonce")
        || lower.contains("already known")
        || lower.contains("replacement transaction")
}

/// `0x`プレフィックス付き16進数のquantityを解釈する
fn parse_quantity(value: &serde_json::Value) -> Result<u128, ChainError> {
    let text = value
        .as_str()
        .ok_or_else(|| ChainError::Encoding("quantityが文字列ではありません".to_string()))?;
    u128::from_str_radix(text.trim_start_matches("0x"), 16)
        .map_err(|e| ChainError::Encoding(format!("quantityの解釈に失敗: {e}")))
}

// ---------------------------------------------------------------------------
// HTTP実装
// ---------------------------------------------------------------------------

/// JSON-RPC 2.0 over HTTPによるノード接続。
pub struct HttpChainClient {
    url: String,
    http_client: reqwest::Client,
}

impl HttpChainClient {
    /// ノードのエンドポイントURLから構築する。
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            http_client: reqwest::Client::new(),
        }
    }

    /// JSON-RPCリクエストを送信し、resultを取り出す。
    /// ノンス起因のエラーは`Nonce`に分類する。
    async fn request(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<serde_json::Value, ChainError> {
        let rpc_request = serde_json::json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        });

        let response = self
            .http_client
            .post(&self.url)
            .timeout(REQUEST_TIMEOUT)
            .json(&rpc_request)
            .send()
            .await
            .map_err(|e| ChainError::Connectivity(format!("RPC送信失敗: {e}")))?;

        let rpc_body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ChainError::Connectivity(format!("RPCレスポンスのパースに失敗: {e}")))?;

        if let Some(error) = rpc_body.get("error") {
            let message = error
                .get("message")
                .and_then(|v| v.as_str())
                .map(str::to_string)
                .unwrap_or_else(|| error.to_string());
            if method == "eth_sendRawTransaction" && is_nonce_rejection(&message) {
                return Err(ChainError::Nonce(message));
            }
            return Err(ChainError::Rpc(format!("{method}: {message}")));
        }

        rpc_body
            .get("result")
            .cloned()
            .ok_or_else(|| ChainError::Rpc(format!("{method}: レスポンスにresultがありません")))
    }
}

#[async_trait::async_trait]
impl ChainRpc for HttpChainClient {
    async fn transaction_count(&self, account: Address) -> Result<u64, ChainError> {
        let result = self
            .request(
                "eth_getTransactionCount",
                serde_json::json!([format!("{account}"), "latest"]),
            )
            .await?;
        let quantity = parse_quantity(&result)?;
        u64::try_from(quantity)
            .map_err(|_| ChainError::Encoding(format!("ノンスがu64を超えています: {quantity}")))
    }

    async fn gas_price(&self) -> Result<u128, ChainError> {
        let result = self.request("eth_gasPrice", serde_json::json!([])).await?;
        parse_quantity(&result)
    }

    async fn send_raw_transaction(&self, raw: &[u8]) -> Result<B256, ChainError> {
        let result = self
            .request(
                "eth_sendRawTransaction",
                serde_json::json!([format!("0x{}", hex::encode(raw))]),
            )
            .await?;
        let text = result
            .as_str()
            .ok_or_else(|| ChainError::Rpc("トランザクションハッシュがありません".to_string()))?;
        B256::from_str(text)
            .map_err(|e| ChainError::Encoding(format!("トランザクションハッシュの解釈に失敗: {e}")))
    }

    async fn transaction_receipt(&self, tx_hash: B256) -> Result<Option<RpcReceipt>, ChainError> {
        let result = self
            .request(
                "eth_getTransactionReceipt",
                serde_json::json!([format!("{tx_hash}")]),
            )
            .await?;

        if result.is_null() {
            return Ok(None);
        }

        let transaction_hash = result
            .get("transactionHash")
            .and_then(|v| v.as_str())
            .and_then(|s| B256::from_str(s).ok())
            .unwrap_or(tx_hash);
        // status欄のないチェーン（pre-Byzantium）は成功扱い
        let status = match result.get("status") {
            Some(value) if !value.is_null() => parse_quantity(value)? == 1,
            _ => true,
        };

        Ok(Some(RpcReceipt {
            transaction_hash,
            status,
        }))
    }

    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, ChainError> {
        let result = self
            .request(
                "eth_call",
                serde_json::json!([
                    {"to": format!("{to}"), "data": format!("{data}")},
                    "latest",
                ]),
            )
            .await?;
        let text = result
            .as_str()
            .ok_or_else(|| ChainError::Rpc("eth_callの戻り値が文字列ではありません".to_string()))?;
        Bytes::from_str(text)
            .map_err(|e| ChainError::Encoding(format!("eth_callの戻り値の解釈に失敗: {e}")))
    }
}
