//! # Mintpass 共有型定義
//!
//! 署名API・インベントリサービスとやり取りするJSONデータ構造をRust構造体として提供する。
//!
//! ## エンコーディング規則
//! - アドレス: `0x`プレフィックス付き16進数文字列（40桁、大文字小文字は呼び出し側のまま保持）
//! - トークンID: プレフィックスなしの16進数文字列（リクエスト時）
//! - ハッシュ・署名: `0x`プレフィックス付き16進数文字列（レスポンス時）

use serde::{Deserialize, Serialize};

/// 認証クレデンシャルを運ぶHTTPヘッダ名。
pub const AUTH_TOKEN_HEADER: &str = "auth-token";

// ---------------------------------------------------------------------------
// GET /
// ---------------------------------------------------------------------------

/// GET / レスポンス。死活確認用。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// 稼働中メッセージ
    pub message: String,
}

// ---------------------------------------------------------------------------
// POST /sign_message
// ---------------------------------------------------------------------------

/// /sign_message リクエスト。
///
/// 認証クレデンシャルはボディではなく`auth-token`ヘッダで運ばれる。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignMessageRequest {
    /// `0x`プレフィックス付きウォレットアドレス（42文字）
    pub address: String,
    /// 16進数文字列のトークンID（プレフィックスなし、base-16として解釈）
    pub token_id: String,
}

/// /sign_message レスポンス。
///
/// この三つ組はverifyAndMintコントラクト呼び出しにそのまま渡される。
/// `message_hash`はEIP-191プレフィックス適用後の最終ハッシュ。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignMessageResponse {
    /// 正規化メッセージ `"{address}_{token_id(10進)}"`
    pub message: String,
    /// `0x`プレフィックス付き32バイトハッシュ
    pub message_hash: String,
    /// `0x`プレフィックス付き65バイトECDSA署名（r||s||v）
    pub signature: String,
}

// ---------------------------------------------------------------------------
// インベントリサービス
// ---------------------------------------------------------------------------

/// インベントリサービスのGETレスポンス。
/// 次にミント可能なトークンIDを16進数文字列で返す。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryItem {
    /// 16進数文字列のトークンID
    pub id: String,
}
