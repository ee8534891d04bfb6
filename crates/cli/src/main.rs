//! # Mintpass CLI
//!
//! 運用オペレーション用のコマンドラインツール。
//!
//! ## コマンド
//! - `sign` — Gatewayに認可署名を要求して表示
//! - `mint` — 指定トークン（省略時は在庫から取得）を受領者にミント
//! - `verify-and-mint` — 在庫取得 → Gateway署名 → verifyAndMint送信
//! - `transfer` — 所有者間の転送
//! - `set-base-uri` / `base-uri` — メタデータベースURIの設定・照会
//! - `owner-mint` — JSONファイルに列挙したトークンを一括ミント
//! - `verify-owners` — JSONファイルの所有状態をオンチェーンと照合
//! - `set-signer` — 署名権限者アドレスの設定

mod gateway_client;
mod inventory;

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use alloy_primitives::{Address, U256};
use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use mintpass_chain::{ChainOperation, ContractReader, HttpChainClient, TransactionSubmitter};
use mintpass_crypto::{parse_address, parse_token_id, HashSigner, MessageSigner};

use gateway_client::GatewayClient;
use inventory::InventoryClient;

#[derive(Parser)]
#[command(name = "mintpass-cli", about = "Mintpass運用CLI", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

/// チェーン接続と送信用ウォレットの共通引数
#[derive(Args)]
struct ChainArgs {
    /// EVMノードのJSON-RPCエンドポイント
    #[arg(long, env = "RPC_URL")]
    rpc_url: String,
    /// コントラクトアドレス
    #[arg(long, env = "CONTRACT_ADDRESS")]
    contract: String,
    /// チェーンID
    #[arg(long, env = "CHAIN_ID", default_value_t = 421613)]
    chain_id: u64,
    /// 送信用ウォレットの秘密鍵（16進）
    #[arg(long, env = "PRIVATE_KEY")]
    private_key: String,
    /// レシート確認の待機秒数。超過すると結果不明として打ち切る
    #[arg(long, env = "RECEIPT_TIMEOUT_SECS", default_value_t = 120)]
    receipt_timeout_secs: u64,
}

impl ChainArgs {
    fn contract_address(&self) -> anyhow::Result<Address> {
        parse_address(&self.contract).context("CONTRACT_ADDRESSの解釈に失敗")
    }

    fn wallet(&self) -> anyhow::Result<MessageSigner> {
        MessageSigner::from_hex(&self.private_key).context("PRIVATE_KEYの解釈に失敗")
    }

    fn submitter(&self) -> anyhow::Result<TransactionSubmitter> {
        let rpc = Arc::new(HttpChainClient::new(self.rpc_url.clone()));
        Ok(TransactionSubmitter::new(
            rpc,
            self.contract_address()?,
            self.chain_id,
        ))
    }

    fn reader(&self) -> anyhow::Result<ContractReader> {
        let rpc = Arc::new(HttpChainClient::new(self.rpc_url.clone()));
        Ok(ContractReader::new(rpc, self.contract_address()?))
    }

    fn receipt_timeout(&self) -> Duration {
        Duration::from_secs(self.receipt_timeout_secs)
    }
}

/// 署名Gatewayの共通引数
#[derive(Args)]
struct GatewayArgs {
    /// GatewayのベースURL
    #[arg(long, env = "GATEWAY_URL", default_value = "http://127.0.0.1:8000")]
    gateway_url: String,
    /// Gateway認証トークン
    #[arg(long, env = "AUTH_TOKEN")]
    auth_token: String,
}

impl GatewayArgs {
    fn client(&self) -> anyhow::Result<GatewayClient> {
        GatewayClient::new(self.gateway_url.clone(), self.auth_token.clone())
    }
}

#[derive(Subcommand)]
enum Command {
    /// Gatewayに認可署名を要求して表示する
    Sign {
        #[command(flatten)]
        gateway: GatewayArgs,
        /// 受領アドレス
        #[arg(long)]
        address: String,
        /// トークンID（16進）
        #[arg(long)]
        token_id: String,
    },
    /// トークンを受領者にミントする
    Mint {
        #[command(flatten)]
        chain: ChainArgs,
        /// 受領アドレス
        #[arg(long)]
        to: String,
        /// トークンID（16進）。省略時は在庫サービスから取得
        #[arg(long)]
        token_id: Option<String>,
        /// 在庫サービスのURL（token-id省略時に必須）
        #[arg(long, env = "INVENTORY_URL")]
        inventory_url: Option<String>,
    },
    /// 在庫取得 → Gateway署名 → verifyAndMint送信
    VerifyAndMint {
        #[command(flatten)]
        chain: ChainArgs,
        #[command(flatten)]
        gateway: GatewayArgs,
        /// トークンID（16進）。省略時は在庫サービスから取得
        #[arg(long)]
        token_id: Option<String>,
        /// 在庫サービスのURL（token-id省略時に必須）
        #[arg(long, env = "INVENTORY_URL")]
        inventory_url: Option<String>,
    },
    /// 所有者間の転送
    Transfer {
        #[command(flatten)]
        chain: ChainArgs,
        /// 現在の所有者
        #[arg(long)]
        from: String,
        /// 転送先
        #[arg(long)]
        to: String,
        /// トークンID（16進）
        #[arg(long)]
        token_id: String,
    },
    /// メタデータのベースURIを設定する
    SetBaseUri {
        #[command(flatten)]
        chain: ChainArgs,
        /// 新しいベースURI
        #[arg(long)]
        uri: String,
    },
    /// 現在のベースURIを照会する
    BaseUri {
        #[command(flatten)]
        chain: ChainArgs,
    },
    /// JSONファイルに列挙したトークンを一括ミントする
    OwnerMint {
        #[command(flatten)]
        chain: ChainArgs,
        /// `{"トークンID(16進)": "所有者アドレス"}` 形式のJSONファイル
        #[arg(long)]
        file: PathBuf,
    },
    /// JSONファイルの所有状態をオンチェーンと照合する
    VerifyOwners {
        #[command(flatten)]
        chain: ChainArgs,
        /// `{"トークンID(16進)": "所有者アドレス"}` 形式のJSONファイル
        #[arg(long)]
        file: PathBuf,
    },
    /// 署名権限者アドレスを設定する
    SetSigner {
        #[command(flatten)]
        chain: ChainArgs,
        /// 新しい署名権限者アドレス
        #[arg(long)]
        signer: String,
    },
}

/// 所有者マップJSONを (token_ids, owners) の同順ペアに変換する
fn parse_owner_map(raw: &str) -> anyhow::Result<(Vec<U256>, Vec<Address>)> {
    let map: BTreeMap<String, String> =
        serde_json::from_str(raw).context("所有者マップJSONの解釈に失敗")?;
    let mut token_ids = Vec::with_capacity(map.len());
    let mut owners = Vec::with_capacity(map.len());
    for (token_hex, owner) in &map {
        token_ids.push(
            parse_token_id(token_hex)
                .with_context(|| format!("不正なトークンID: {token_hex}"))?,
        );
        owners.push(
            parse_address(owner).with_context(|| format!("不正な所有者アドレス: {owner}"))?,
        );
    }
    Ok((token_ids, owners))
}

/// トークンIDを引数または在庫サービスから解決する
async fn resolve_token_id(
    token_id: Option<String>,
    inventory_url: Option<String>,
) -> anyhow::Result<String> {
    if let Some(token_id) = token_id {
        return Ok(token_id);
    }
    let Some(url) = inventory_url else {
        bail!("--token-id か --inventory-url のどちらかを指定してください");
    };
    let client = InventoryClient::new(url)?;
    match client.next_item().await? {
        Some(item) => Ok(item.id),
        None => bail!("在庫サービスにミント可能なトークンがありません"),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    match cli.command {
        Command::Sign {
            gateway,
            address,
            token_id,
        } => {
            let response = gateway.client()?.sign_message(&address, &token_id).await?;
            println!("{}", serde_json::to_string_pretty(&response)?);
        }

        Command::Mint {
            chain,
            to,
            token_id,
            inventory_url,
        } => {
            let token_id_hex = resolve_token_id(token_id, inventory_url).await?;
            let operation = ChainOperation::Mint {
                to: parse_address(&to)?,
                token_id: parse_token_id(&token_id_hex)?,
            };
            let wallet = chain.wallet()?;
            let receipt = chain
                .submitter()?
                .submit(&operation, &wallet, chain.receipt_timeout())
                .await?;
            println!("mint確定: tx={}", receipt.transaction_hash);
        }

        Command::VerifyAndMint {
            chain,
            gateway,
            token_id,
            inventory_url,
        } => {
            let token_id_hex = resolve_token_id(token_id, inventory_url).await?;
            let wallet = chain.wallet()?;
            let to = HashSigner::address(&wallet);

            // ウォレット自身のアドレスに対する認可署名をGatewayから取得する
            let signed = gateway
                .client()?
                .sign_message(&format!("{to}"), &token_id_hex)
                .await?;
            let signature = hex::decode(signed.signature.trim_start_matches("0x"))
                .context("Gatewayの署名の解釈に失敗")?;

            let operation = ChainOperation::VerifyAndMint {
                message: signed.message,
                signature: signature.into(),
                to,
                token_id: parse_token_id(&token_id_hex)?,
            };
            let receipt = chain
                .submitter()?
                .submit(&operation, &wallet, chain.receipt_timeout())
                .await?;
            println!("verifyAndMint確定: tx={}", receipt.transaction_hash);
        }

        Command::Transfer {
            chain,
            from,
            to,
            token_id,
        } => {
            let operation = ChainOperation::Transfer {
                from: parse_address(&from)?,
                to: parse_address(&to)?,
                token_id: parse_token_id(&token_id)?,
            };
            let wallet = chain.wallet()?;
            let receipt = chain
                .submitter()?
                .submit(&operation, &wallet, chain.receipt_timeout())
                .await?;
            println!("transfer確定: tx={}", receipt.transaction_hash);
        }

        Command::SetBaseUri { chain, uri } => {
            let operation = ChainOperation::SetBaseUri { uri };
            let wallet = chain.wallet()?;
            let receipt = chain
                .submitter()?
                .submit(&operation, &wallet, chain.receipt_timeout())
                .await?;
            println!("setBaseURI確定: tx={}", receipt.transaction_hash);
        }

        Command::BaseUri { chain } => {
            let base_uri = chain.reader()?.base_uri().await?;
            println!("{}", base_uri);
        }

        Command::OwnerMint { chain, file } => {
            let raw = std::fs::read_to_string(&file)
                .with_context(|| format!("ファイルの読み込みに失敗: {}", file.display()))?;
            let (token_ids, owners) = parse_owner_map(&raw)?;
            if token_ids.is_empty() {
                bail!("所有者マップが空です");
            }
            tracing::info!(count = token_ids.len(), "一括ミントを送信します");
            let operation = ChainOperation::OwnerMintBatch { token_ids, owners };
            let wallet = chain.wallet()?;
            let receipt = chain
                .submitter()?
                .submit(&operation, &wallet, chain.receipt_timeout())
                .await?;
            println!("ownerMint確定: tx={}", receipt.transaction_hash);
        }

        Command::VerifyOwners { chain, file } => {
            let raw = std::fs::read_to_string(&file)
                .with_context(|| format!("ファイルの読み込みに失敗: {}", file.display()))?;
            let (token_ids, owners) = parse_owner_map(&raw)?;
            let reader = chain.reader()?;
            let mut mismatches = 0usize;
            for (token_id, expected) in token_ids.iter().zip(owners.iter()) {
                if !reader.exists(*token_id).await? {
                    println!("token {token_id}: 未ミント");
                    mismatches += 1;
                    continue;
                }
                let actual = reader.owner_of(*token_id).await?;
                if actual != *expected {
                    println!("token {token_id}: 期待 {expected} 実際 {actual}");
                    mismatches += 1;
                }
            }
            if mismatches > 0 {
                bail!("{}件の不一致があります", mismatches);
            }
            println!("全{}件が一致しました", token_ids.len());
        }

        Command::SetSigner { chain, signer } => {
            let operation = ChainOperation::SetSigner {
                signer: parse_address(&signer)?,
            };
            let wallet = chain.wallet()?;
            let receipt = chain
                .submitter()?
                .submit(&operation, &wallet, chain.receipt_timeout())
                .await?;
            println!("setSigner確定: tx={}", receipt.transaction_hash);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 所有者マップの解釈（16進ID・アドレス・順序の対応）を確認
    #[test]
    fn test_parse_owner_map() {
        let raw = r#"{
            "1e240": "0x000000000000000000000000000000000000dEaD",
            "2a": "0x4444444444444444444444444444444444444444"
        }"#;
        let (token_ids, owners) = parse_owner_map(raw).unwrap();
        assert_eq!(token_ids.len(), 2);
        assert_eq!(owners.len(), 2);

        let pos = token_ids
            .iter()
            .position(|id| *id == U256::from(123456u64))
            .unwrap();
        assert_eq!(
            owners[pos],
            parse_address("0x000000000000000000000000000000000000dEaD").unwrap()
        );
    }

    /// 不正な所有者アドレスが拒否されること
    #[test]
    fn test_parse_owner_map_bad_address() {
        let raw = r#"{ "2a": "0x1234" }"#;
        assert!(parse_owner_map(raw).is_err());
    }

    /// 引数のトークンIDが在庫より優先されること
    #[tokio::test]
    async fn test_resolve_token_id_prefers_argument() {
        let id = resolve_token_id(Some("2a".to_string()), None).await.unwrap();
        assert_eq!(id, "2a");
    }

    /// どちらも未指定ならエラーになること
    #[tokio::test]
    async fn test_resolve_token_id_requires_source() {
        assert!(resolve_token_id(None, None).await.is_err());
    }
}
