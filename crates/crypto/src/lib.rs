//! # Mintpass 暗号処理
//!
//! 正規化メッセージのハッシュ計算と、署名権限者の秘密鍵によるECDSA署名を実装する。
//!
//! ## 暗号アルゴリズム
//! | 用途 | アルゴリズム |
//! |------|------------|
//! | メッセージハッシュ | Keccak-256 |
//! | メッセージ署名 | secp256k1 ECDSA + EIP-191 personal-messageプレフィックス |
//! | トランザクション署名 | secp256k1 ECDSA（EIP-155 legacy） |
//!
//! ## ハッシュ契約
//! オンチェーン検証コントラクトと再現一致が必要なため、手順はバイト厳密に固定する:
//!
//! 1. `message = "{address}_{token_id(10進)}"`（アドレス文字列は呼び出し側の表記のまま）
//! 2. `base_hash = keccak256(utf8(message))`
//! 3. `message_hash = keccak256("\x19Ethereum Signed Message:\n32" || base_hash)`
//! 4. `signature = ECDSA(message_hash)`（65バイト r||s||v、v = 27/28）
//!
//! 手順3のプレフィックスにより、メッセージ署名をトランザクション署名として
//! 再生することはできない（逆も同様）。

use std::str::FromStr;

use alloy_consensus::{SignableTransaction, TxEnvelope, TxLegacy};
use alloy_eips::eip2718::Encodable2718;
use alloy_primitives::{eip191_hash_message, keccak256, Address, Signature, B256, U256};
use alloy_signer::SignerSync;
use alloy_signer_local::PrivateKeySigner;

/// 暗号処理のエラー型
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    /// アドレスが20バイトの16進数として解釈できない
    #[error("不正なアドレス: {0}")]
    InvalidAddress(String),
    /// トークンIDが16進数として解釈できない
    #[error("不正なトークンID: {0}")]
    InvalidTokenId(String),
    /// 秘密鍵素材が不正（構築時のみ発生、プロセス起動失敗として扱う）
    #[error("不正な秘密鍵: {0}")]
    InvalidKey(String),
    /// ECDSA署名の生成・復元に失敗
    #[error("署名処理に失敗: {0}")]
    Signing(String),
}

// ---------------------------------------------------------------------------
// 入力検証
// ---------------------------------------------------------------------------

/// ウォレットアドレス文字列を検証し、20バイトのアドレスとして解釈する。
///
/// `0x`プレフィックスは任意。16進数部分が40文字（= 20バイト）ちょうどで
/// ない場合は長短どちらも`InvalidAddress`。
pub fn parse_address(address: &str) -> Result<Address, CryptoError> {
    let hex_part = address.strip_prefix("0x").unwrap_or(address);
    if hex_part.len() != 40 {
        return Err(CryptoError::InvalidAddress(format!(
            "アドレスは20バイトの16進数である必要があります（受信: {}文字）",
            hex_part.len()
        )));
    }
    Address::from_str(hex_part).map_err(|e| CryptoError::InvalidAddress(e.to_string()))
}

/// トークンID文字列をbase-16整数として解釈する。
///
/// `0x`プレフィックスは任意。空文字列・16進数以外の文字・256ビット超過は
/// `InvalidTokenId`。
pub fn parse_token_id(token_id_hex: &str) -> Result<U256, CryptoError> {
    let hex_part = token_id_hex.trim();
    let hex_part = hex_part.strip_prefix("0x").unwrap_or(hex_part);
    if hex_part.is_empty() {
        return Err(CryptoError::InvalidTokenId(
            "トークンIDが空です".to_string(),
        ));
    }
    U256::from_str_radix(hex_part, 16)
        .map_err(|e| CryptoError::InvalidTokenId(format!("16進数として解釈できません: {e}")))
}

// ---------------------------------------------------------------------------
// 正規化メッセージ
// ---------------------------------------------------------------------------

/// 正規化メッセージを構築する。
///
/// `"{address}_{token_id}"`（トークンIDは10進表記）。アドレス文字列は
/// 呼び出し側の表記をそのまま使用する。オンチェーン検証側も同じ文字列を
/// 再構築するため、決定論的でなければならない。
pub fn canonical_message(address: &str, token_id: U256) -> String {
    format!("{address}_{token_id}")
}

/// 正規化メッセージのKeccak-256ハッシュを計算する。
pub fn canonical_hash(message: &str) -> B256 {
    keccak256(message.as_bytes())
}

/// EIP-191 personal-messageプレフィックスを適用した最終ハッシュを計算する。
///
/// `keccak256("\x19Ethereum Signed Message:\n32" || base_hash)`。
/// 署名は生のハッシュではなくこの値に対して行われる。
pub fn personal_message_hash(base_hash: B256) -> B256 {
    eip191_hash_message(base_hash)
}

// ---------------------------------------------------------------------------
// 署名器
// ---------------------------------------------------------------------------

/// 32バイトハッシュへのECDSA署名を行う抽象インターフェース。
///
/// 署名サービスのテストで呼び出し回数を観測できるよう、seamとして切り出す。
pub trait HashSigner: Send + Sync {
    /// 署名鍵に対応するアドレス
    fn address(&self) -> Address;
    /// 32バイトハッシュに署名する
    fn sign_hash(&self, hash: B256) -> Result<Signature, CryptoError>;
}

/// 秘密鍵を保持する署名器。
///
/// 秘密鍵素材はこの構造体がプロセス生存期間を通じて排他的に所有し、
/// 他のコンポーネントから読み出すことはできない。
pub struct MessageSigner {
    inner: PrivateKeySigner,
}

impl MessageSigner {
    /// 16進数文字列の秘密鍵から構築する。
    /// 鍵が不正な場合はここで失敗する（呼び出しごとの失敗はない）。
    pub fn from_hex(private_key: &str) -> Result<Self, CryptoError> {
        let inner = PrivateKeySigner::from_str(private_key.trim())
            .map_err(|e| CryptoError::InvalidKey(e.to_string()))?;
        Ok(Self { inner })
    }

    /// ランダムな鍵で構築する（開発環境・テスト用）。
    pub fn random() -> Self {
        Self {
            inner: PrivateKeySigner::random(),
        }
    }

    /// 正規化メッセージのKeccakハッシュにpersonal-message署名を行う。
    /// 戻り値はEIP-191適用後の最終ハッシュと署名の組。
    pub fn sign_canonical(&self, base_hash: B256) -> Result<(B256, Signature), CryptoError> {
        sign_canonical_with(self, base_hash)
    }

    /// legacyトランザクションに署名し、ブロードキャスト可能な
    /// RLPエンコード済みバイト列を返す。
    pub fn sign_transaction(&self, tx: TxLegacy) -> Result<Vec<u8>, CryptoError> {
        let signature = self
            .inner
            .sign_hash_sync(&tx.signature_hash())
            .map_err(|e| CryptoError::Signing(e.to_string()))?;
        let signed = tx.into_signed(signature);
        Ok(TxEnvelope::Legacy(signed).encoded_2718())
    }
}

impl HashSigner for MessageSigner {
    fn address(&self) -> Address {
        self.inner.address()
    }

    fn sign_hash(&self, hash: B256) -> Result<Signature, CryptoError> {
        self.inner
            .sign_hash_sync(&hash)
            .map_err(|e| CryptoError::Signing(e.to_string()))
    }
}

/// 任意の署名器で正規化メッセージのKeccakハッシュにpersonal-message署名を行う。
///
/// EIP-191プレフィックスの適用はここで一元化される。署名経路はすべて
/// この関数を通り、生のハッシュに直接署名する経路は存在しない。
pub fn sign_canonical_with(
    signer: &dyn HashSigner,
    base_hash: B256,
) -> Result<(B256, Signature), CryptoError> {
    let message_hash = personal_message_hash(base_hash);
    let signature = signer.sign_hash(message_hash)?;
    Ok((message_hash, signature))
}

/// personal-message署名から署名者アドレスを復元する。
///
/// オンチェーン検証コントラクトと同じ手順（EIP-191プレフィックス適用後の
/// ハッシュに対するecrecover）で復元する。
pub fn recover_canonical_signer(
    base_hash: B256,
    signature: &Signature,
) -> Result<Address, CryptoError> {
    let message_hash = personal_message_hash(base_hash);
    signature
        .recover_address_from_prehash(&message_hash)
        .map_err(|e| CryptoError::Signing(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::TxKind;

    const DEAD_ADDRESS: &str = "0x000000000000000000000000000000000000dEaD";

    /// canonicalizeが純粋関数であること（同一入力→バイト同一出力）を確認
    #[test]
    fn test_canonicalize_deterministic() {
        let token_id = parse_token_id("2a").unwrap();
        let message1 = canonical_message(DEAD_ADDRESS, token_id);
        let message2 = canonical_message(DEAD_ADDRESS, token_id);
        assert_eq!(message1, message2);
        assert_eq!(canonical_hash(&message1), canonical_hash(&message2));
    }

    /// 具体シナリオ: tokenId 16進 "2a"（= 42）のメッセージ表記を確認
    #[test]
    fn test_canonical_message_format() {
        let token_id = parse_token_id("2a").unwrap();
        let message = canonical_message(DEAD_ADDRESS, token_id);
        assert_eq!(message, "0x000000000000000000000000000000000000dEaD_42");
    }

    /// トークンIDのbase-16解釈を確認（"1e240" → 123456）
    #[test]
    fn test_parse_token_id() {
        assert_eq!(parse_token_id("1e240").unwrap(), U256::from(123456u64));
        assert_eq!(parse_token_id("0x2a").unwrap(), U256::from(42u64));
        assert!(matches!(
            parse_token_id("zzz"),
            Err(CryptoError::InvalidTokenId(_))
        ));
        assert!(matches!(
            parse_token_id(""),
            Err(CryptoError::InvalidTokenId(_))
        ));
    }

    /// アドレス長の検証（短すぎ・長すぎの両方を拒否）を確認
    #[test]
    fn test_parse_address_length() {
        assert!(parse_address(DEAD_ADDRESS).is_ok());
        // プレフィックスなしも許容
        assert!(parse_address("000000000000000000000000000000000000dead").is_ok());
        // 19バイト
        assert!(matches!(
            parse_address("0x0000000000000000000000000000000000dead"),
            Err(CryptoError::InvalidAddress(_))
        ));
        // 21バイト
        assert!(matches!(
            parse_address("0x00000000000000000000000000000000000000dead"),
            Err(CryptoError::InvalidAddress(_))
        ));
        // 16進数以外の文字
        assert!(matches!(
            parse_address("0x0000000000000000000000000000000000000xyz"),
            Err(CryptoError::InvalidAddress(_))
        ));
    }

    /// トレイトオブジェクト経由の署名が直接呼び出しと同一の組を返し、
    /// 復元でも署名者アドレスに一致することを確認
    #[test]
    fn test_sign_canonical_with_matches_direct() {
        let signer = MessageSigner::random();
        let base_hash = canonical_hash("0x000000000000000000000000000000000000dEaD_42");

        let (hash_direct, _) = signer.sign_canonical(base_hash).unwrap();
        let (hash_via_trait, signature) =
            sign_canonical_with(&signer as &dyn HashSigner, base_hash).unwrap();

        assert_eq!(hash_direct, hash_via_trait);
        assert_eq!(hash_via_trait, personal_message_hash(base_hash));
        let recovered = recover_canonical_signer(base_hash, &signature).unwrap();
        assert_eq!(recovered, HashSigner::address(&signer));
    }

    /// 署名→復元のラウンドトリップで署名者アドレスが一致することを確認
    #[test]
    fn test_sign_and_recover() {
        let signer = MessageSigner::random();
        let token_id = parse_token_id("2a").unwrap();
        let message = canonical_message(DEAD_ADDRESS, token_id);
        let base_hash = canonical_hash(&message);

        let (message_hash, signature) = signer.sign_canonical(base_hash).unwrap();
        assert_eq!(message_hash, personal_message_hash(base_hash));

        let recovered = recover_canonical_signer(base_hash, &signature).unwrap();
        assert_eq!(recovered, HashSigner::address(&signer));
    }

    /// EIP-191プレフィックスの構成がバイト厳密であることを確認
    #[test]
    fn test_personal_message_hash_construction() {
        let base_hash = canonical_hash("0x000000000000000000000000000000000000dEaD_42");

        let mut preimage = Vec::new();
        preimage.extend_from_slice(b"\x19Ethereum Signed Message:\n32");
        preimage.extend_from_slice(base_hash.as_slice());

        assert_eq!(personal_message_hash(base_hash), keccak256(&preimage));
        // プレフィックスにより生のハッシュとは必ず異なる
        assert_ne!(personal_message_hash(base_hash), base_hash);
    }

    /// 別の(address, tokenId)に対する署名は別のアドレスには復元されない
    /// （verifyAndMintのリバート条件に対応）
    #[test]
    fn test_signature_does_not_transfer() {
        let signer = MessageSigner::random();
        let token_a = parse_token_id("2a").unwrap();
        let token_b = parse_token_id("2b").unwrap();

        let hash_a = canonical_hash(&canonical_message(DEAD_ADDRESS, token_a));
        let hash_b = canonical_hash(&canonical_message(DEAD_ADDRESS, token_b));
        let (_, signature) = signer.sign_canonical(hash_a).unwrap();

        // 別メッセージのハッシュで復元すると署名者アドレスに一致しない
        let recovered = recover_canonical_signer(hash_b, &signature);
        match recovered {
            Ok(address) => assert_ne!(address, HashSigner::address(&signer)),
            Err(CryptoError::Signing(_)) => {}
            Err(e) => panic!("想定外のエラー: {e}"),
        }
    }

    /// 不正な秘密鍵は構築時に失敗することを確認
    #[test]
    fn test_invalid_key_fails_at_construction() {
        assert!(matches!(
            MessageSigner::from_hex("not-a-key"),
            Err(CryptoError::InvalidKey(_))
        ));
        assert!(matches!(
            MessageSigner::from_hex("0x1234"),
            Err(CryptoError::InvalidKey(_))
        ));
    }

    /// legacyトランザクション署名が空でないRLPバイト列を返すことを確認
    #[test]
    fn test_sign_transaction() {
        let signer = MessageSigner::random();
        let tx = TxLegacy {
            chain_id: Some(421613),
            nonce: 7,
            gas_price: 100_000_000,
            gas_limit: 1_000_000,
            to: TxKind::Call(Address::ZERO),
            value: U256::ZERO,
            input: vec![0xab, 0xcd].into(),
        };
        let raw = signer.sign_transaction(tx).unwrap();
        assert!(!raw.is_empty());
    }
}
