//! # リクエスト認証
//!
//! 共有ベアラートークンによるクレデンシャル検証。
//! 既知トークン集合は起動時に一度だけ読み込まれ、プロセス生存期間を通じて
//! 不変。ローテーションにはプロセス再起動が必要。

use std::collections::HashSet;

use axum::http::HeaderMap;
use mintpass_types::AUTH_TOKEN_HEADER;

/// 既知クレデンシャル集合に対する membership テスト。
/// 純粋・副作用なし。falseを受けた呼び出し側は署名処理に進んではならない。
pub struct AuthGate {
    tokens: HashSet<String>,
}

impl AuthGate {
    /// 既知トークンの一覧から構築する。
    pub fn new(tokens: impl IntoIterator<Item = String>) -> Self {
        Self {
            tokens: tokens.into_iter().collect(),
        }
    }

    /// カンマ区切りの環境変数値から構築する。空要素は無視する。
    pub fn from_env_value(raw: &str) -> Self {
        Self::new(
            raw.split(',')
                .map(str::trim)
                .filter(|token| !token.is_empty())
                .map(str::to_string),
        )
    }

    /// 登録済みトークン数
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// トークンが一つも登録されていないか
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// クレデンシャルが既知集合に含まれるか判定する
    pub fn authorize(&self, credential: &str) -> bool {
        self.tokens.contains(credential)
    }
}

/// リクエストヘッダからクレデンシャルを取り出す
pub fn extract_credential(headers: &HeaderMap) -> Option<&str> {
    headers.get(AUTH_TOKEN_HEADER)?.to_str().ok()
}
