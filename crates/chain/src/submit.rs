//! # トランザクション送信パイプライン
//!
//! ノンス取得→構築→署名→ブロードキャスト→確認待機を実行する。
//!
//! ## ノンスの規律
//! ノンス取得からブロードキャストまで（ステップ1〜4）は送信アカウントごとの
//! クリティカルセクション。同一アカウントの送信は直列化され、異なる
//! アカウントは並行に進む。確認待機（ステップ5）はブロードキャスト成功後に
//! ロック外で行う。それ以降の順序付けはノード側が行うため。
//!
//! ノンスはローカルにキャッシュ・加算しない。送信のたびにノードへ照会する。
//! ブロードキャスト済みトランザクションの記録は永続化されないため、
//! 確認前にプロセスが落ちるとオンチェーンに着地したかどうかの手掛かりが
//! ローカルに残らない（既知の制約）。

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use alloy_consensus::TxLegacy;
use alloy_primitives::{Address, TxKind, B256, U256};
use mintpass_crypto::MessageSigner;
use tokio::sync::Mutex;

use crate::contract::ChainOperation;
use crate::error::ChainError;
use crate::rpc::ChainRpc;

/// 確認待機のポーリング間隔（デフォルト）
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// 送信の終端成果物。確認済みトランザクションの記録。
#[derive(Debug, Clone)]
pub struct TxReceipt {
    /// トランザクションハッシュ
    pub transaction_hash: B256,
    /// レシートで確認済みか（このモジュールからはtrueのみ返る）
    pub confirmed: bool,
}

/// ノンス順序付きのトランザクション送信器。
pub struct TransactionSubmitter {
    rpc: Arc<dyn ChainRpc>,
    contract: Address,
    chain_id: u64,
    poll_interval: Duration,
    /// 送信アカウントごとの排他ロック。
    /// ノンス取得→ブロードキャスト間の競合を同一プロセス内で防ぐ。
    /// エントリは破棄されない。マップの大きさはプロセス内で送信に使われた
    /// 相異なるアカウント数（通常は運用ウォレット1つ）が上限。
    account_locks: Mutex<HashMap<Address, Arc<Mutex<()>>>>,
}

impl TransactionSubmitter {
    /// ノード接続・コントラクトアドレス・チェーンIDから構築する。
    pub fn new(rpc: Arc<dyn ChainRpc>, contract: Address, chain_id: u64) -> Self {
        Self {
            rpc,
            contract,
            chain_id,
            poll_interval: DEFAULT_POLL_INTERVAL,
            account_locks: Mutex::new(HashMap::new()),
        }
    }

    /// 確認待機のポーリング間隔を変更する（テスト用に短縮可能）。
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// 送信アカウントに対応するロックを取得する。
    async fn account_lock(&self, account: Address) -> Arc<Mutex<()>> {
        let mut locks = self.account_locks.lock().await;
        locks
            .entry(account)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// チェーン操作を送信し、レシートの確認まで待機する。
    ///
    /// 失敗は内部でリトライされない。`Nonce`はノンス再取得のうえ呼び出し側が
    /// 再試行する。`ReceiptTimeout`は「結果不明」であり、トランザクションが
    /// 後から確定する可能性を意味する。
    pub async fn submit(
        &self,
        operation: &ChainOperation,
        signer: &MessageSigner,
        receipt_timeout: Duration,
    ) -> Result<TxReceipt, ChainError> {
        let sender = mintpass_crypto::HashSigner::address(signer);
        let lock = self.account_lock(sender).await;

        // ステップ1〜4: ノンス取得→構築→署名→ブロードキャスト（ロック内）
        let tx_hash = {
            let _guard = lock.lock().await;

            let nonce = self.rpc.transaction_count(sender).await?;
            let gas_price = self.rpc.gas_price().await?;

            let tx = TxLegacy {
                chain_id: Some(self.chain_id),
                nonce,
                gas_price,
                gas_limit: operation.gas_limit(),
                to: TxKind::Call(self.contract),
                value: U256::ZERO,
                input: operation.calldata(),
            };

            let raw = signer.sign_transaction(tx)?;
            let tx_hash = self.rpc.send_raw_transaction(&raw).await?;
            tracing::info!(
                operation = operation.name(),
                %tx_hash,
                nonce,
                "トランザクションをブロードキャストしました"
            );
            tx_hash
        };

        // ステップ5: 確認待機（ロック外）
        self.wait_for_receipt(tx_hash, receipt_timeout).await
    }

    /// レシートが観測されるまでポーリングする。
    /// 期限切れは`ReceiptTimeout`（結果不明）、status 0は`Revert`。
    pub async fn wait_for_receipt(
        &self,
        tx_hash: B256,
        receipt_timeout: Duration,
    ) -> Result<TxReceipt, ChainError> {
        let deadline = tokio::time::Instant::now() + receipt_timeout;

        loop {
            if let Some(receipt) = self.rpc.transaction_receipt(tx_hash).await? {
                if !receipt.status {
                    tracing::warn!(%tx_hash, "トランザクションがリバートしました");
                    return Err(ChainError::Revert { tx_hash });
                }
                tracing::info!(%tx_hash, "トランザクションが確定しました");
                return Ok(TxReceipt {
                    transaction_hash: receipt.transaction_hash,
                    confirmed: true,
                });
            }

            if tokio::time::Instant::now() >= deadline {
                return Err(ChainError::ReceiptTimeout { tx_hash });
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}
