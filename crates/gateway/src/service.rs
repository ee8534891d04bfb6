//! # 署名サービス
//!
//! 認証→検証→正規化→署名のオーケストレーション。
//! 順序は固定かつ短絡的: 前段で失敗したリクエストは後段に到達しない。
//! 特に未認証の呼び出しは署名処理（高コストかつ機微な操作）を
//! 一切起動してはならない。

use mintpass_crypto::{
    canonical_hash, canonical_message, parse_address, parse_token_id, sign_canonical_with,
    HashSigner,
};
use mintpass_types::SignMessageResponse;

use crate::auth::AuthGate;
use crate::error::GatewayError;

/// 署名サービス。認証ゲートと署名器を束ねる。
///
/// 状態はすべて不変のため、リクエスト間の調整なしに並行実行できる。
pub struct SigningService {
    auth: AuthGate,
    signer: Box<dyn HashSigner>,
}

impl SigningService {
    /// 認証ゲートと署名器から構築する。
    pub fn new(auth: AuthGate, signer: Box<dyn HashSigner>) -> Self {
        Self { auth, signer }
    }

    /// 署名鍵に対応するアドレス（検証側が期待する署名権限者アドレス）
    pub fn signer_address(&self) -> alloy_primitives::Address {
        self.signer.address()
    }

    /// 署名リクエストを処理する。
    ///
    /// 認証 → トークンID検証 → アドレス検証 → 正規化 → 署名の順で短絡する。
    /// 成功時は`{message, message_hash, signature}`の三つ組を返す。この形式は
    /// verifyAndMint呼び出しでオンチェーン検証側にそのまま渡される。
    pub fn sign(
        &self,
        credential: Option<&str>,
        address: &str,
        token_id_hex: &str,
    ) -> Result<SignMessageResponse, GatewayError> {
        let credential = credential.ok_or(GatewayError::Unauthorized)?;
        if !self.auth.authorize(credential) {
            return Err(GatewayError::Unauthorized);
        }

        let token_id = parse_token_id(token_id_hex)
            .map_err(|e| GatewayError::InvalidTokenId(e.to_string()))?;
        parse_address(address).map_err(|e| GatewayError::InvalidAddress(e.to_string()))?;

        let message = canonical_message(address, token_id);
        let base_hash = canonical_hash(&message);
        let (message_hash, signature) = sign_canonical_with(self.signer.as_ref(), base_hash)
            .map_err(|e| GatewayError::Internal(e.to_string()))?;

        Ok(SignMessageResponse {
            message,
            message_hash: format!("{message_hash}"),
            signature: format!("0x{}", hex::encode(signature.as_bytes())),
        })
    }
}
