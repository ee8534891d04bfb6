//! # チェーン操作のエラー型
//!
//! どの失敗も内部で自動リトライされない。リトライ方針は呼び出し側の責務。

use alloy_primitives::B256;
use mintpass_crypto::CryptoError;

/// チェーン操作のエラー型。
#[derive(Debug, thiserror::Error)]
pub enum ChainError {
    /// ノード到達不能、またはレスポンスの読み取り失敗。
    /// バックオフ付きで再試行可能（呼び出し側判断）。
    #[error("ノードへの接続に失敗: {0}")]
    Connectivity(String),
    /// ノードがRPCエラーを返した（ノンス起因を除く）
    #[error("RPCエラー: {0}")]
    Rpc(String),
    /// ブロードキャストがノンスの重複・陳腐化で拒否された。
    /// 呼び出し側はノンスを再取得してから再試行する。
    #[error("ノンスが無効です: {0}")]
    Nonce(String),
    /// オンチェーン実行がリバートした（レシートで観測、終端失敗）
    #[error("トランザクションがリバートしました: {tx_hash}")]
    Revert {
        /// リバートしたトランザクションのハッシュ
        tx_hash: B256,
    },
    /// 待機期限内にレシートを観測できなかった。
    /// 結果は「不明」であり、トランザクションは後から確定する可能性がある。
    #[error("レシート待機がタイムアウトしました（結果不明）: {tx_hash}")]
    ReceiptTimeout {
        /// ブロードキャスト済みトランザクションのハッシュ
        tx_hash: B256,
    },
    /// RPCレスポンスやABI戻り値のデコードに失敗
    #[error("デコードに失敗: {0}")]
    Encoding(String),
    /// トランザクション署名の失敗
    #[error("署名処理に失敗: {0}")]
    Signer(#[from] CryptoError),
}
