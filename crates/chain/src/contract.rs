//! # コントラクト呼び出しのABIエンコード
//!
//! ミント対象ERC-721コントラクトの呼び出しサーフェスを`sol!`で定義し、
//! 各チェーン操作をcalldataと固定ガス上限に変換する。
//! ガス上限は操作ごとの固定値であり、動的推定は行わない。

use alloy_primitives::{Address, Bytes, U256};
use alloy_sol_types::{sol, SolCall};

sol! {
    /// ミント対象コントラクトの呼び出しインターフェース。
    /// 署名検証付きミント（verifyAndMint）はオフチェーン署名の三つ組を受け取り、
    /// オンチェーンで正規化メッセージを再構築して署名者を検証する。
    interface MintpassItem {
        function mint(address account, uint256 tokenId);
        function safeTransferFrom(address from, address to, uint256 tokenId);
        function setBaseURI(string uri);
        function ownerMint(uint256[] tokenIds, address[] owners);
        function verifyAndMint(string message, bytes signature, address to, uint256 tokenId);
        function setSigner(address signer);
        function getBaseURI() external view returns (string);
        function exists(uint256 tokenId) external view returns (bool);
        function ownerOf(uint256 tokenId) external view returns (address);
    }
}

/// チェーン操作。操作ごとのペイロードを持つタグ付きバリアント。
#[derive(Debug, Clone)]
pub enum ChainOperation {
    /// 指定アカウントへのミント
    Mint {
        /// 受領アドレス
        to: Address,
        /// トークンID
        token_id: U256,
    },
    /// 所有者間の転送（safeTransferFrom）
    Transfer {
        /// 現在の所有者
        from: Address,
        /// 転送先
        to: Address,
        /// トークンID
        token_id: U256,
    },
    /// メタデータのベースURIの設定
    SetBaseUri {
        /// 新しいベースURI
        uri: String,
    },
    /// 運営者による一括ミント
    OwnerMintBatch {
        /// トークンIDの一覧
        token_ids: Vec<U256>,
        /// 各トークンの受領アドレス（token_idsと同順）
        owners: Vec<Address>,
    },
    /// オフチェーン署名を検証してミント。
    /// 署名サービスが返した三つ組のうちmessageとsignatureを運ぶ。
    VerifyAndMint {
        /// 正規化メッセージ `"{address}_{token_id}"`
        message: String,
        /// 65バイトECDSA署名
        signature: Bytes,
        /// 受領アドレス
        to: Address,
        /// トークンID
        token_id: U256,
    },
    /// 署名権限者アドレスの設定
    SetSigner {
        /// 新しい署名権限者アドレス
        signer: Address,
    },
}

impl ChainOperation {
    /// ログ出力用の操作名
    pub fn name(&self) -> &'static str {
        match self {
            ChainOperation::Mint { .. } => "mint",
            ChainOperation::Transfer { .. } => "safeTransferFrom",
            ChainOperation::SetBaseUri { .. } => "setBaseURI",
            ChainOperation::OwnerMintBatch { .. } => "ownerMint",
            ChainOperation::VerifyAndMint { .. } => "verifyAndMint",
            ChainOperation::SetSigner { .. } => "setSigner",
        }
    }

    /// 操作ごとの固定ガス上限
    pub fn gas_limit(&self) -> u64 {
        match self {
            ChainOperation::Mint { .. } => 1_000_000_000,
            ChainOperation::Transfer { .. } => 1_000_000,
            ChainOperation::SetBaseUri { .. } => 1_000_000,
            ChainOperation::OwnerMintBatch { .. } => 700_000_000,
            ChainOperation::VerifyAndMint { .. } => 1_000_000_000,
            ChainOperation::SetSigner { .. } => 100_000,
        }
    }

    /// ABIエンコード済みcalldataを構築する
    pub fn calldata(&self) -> Bytes {
        match self {
            ChainOperation::Mint { to, token_id } => MintpassItem::mintCall {
                account: *to,
                tokenId: *token_id,
            }
            .abi_encode()
            .into(),
            ChainOperation::Transfer { from, to, token_id } => {
                MintpassItem::safeTransferFromCall {
                    from: *from,
                    to: *to,
                    tokenId: *token_id,
                }
                .abi_encode()
                .into()
            }
            ChainOperation::SetBaseUri { uri } => MintpassItem::setBaseURICall {
                uri: uri.clone(),
            }
            .abi_encode()
            .into(),
            ChainOperation::OwnerMintBatch { token_ids, owners } => {
                MintpassItem::ownerMintCall {
                    tokenIds: token_ids.clone(),
                    owners: owners.clone(),
                }
                .abi_encode()
                .into()
            }
            ChainOperation::VerifyAndMint {
                message,
                signature,
                to,
                token_id,
            } => MintpassItem::verifyAndMintCall {
                message: message.clone(),
                signature: signature.clone(),
                to: *to,
                tokenId: *token_id,
            }
            .abi_encode()
            .into(),
            ChainOperation::SetSigner { signer } => MintpassItem::setSignerCall {
                signer: *signer,
            }
            .abi_encode()
            .into(),
        }
    }
}
