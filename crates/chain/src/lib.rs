//! # Mintpass チェーン操作
//!
//! ブロックチェーンノードへのJSON-RPC接続と、ノンス順序付きの
//! トランザクション構築・署名・ブロードキャスト・確認待機を実装する。
//!
//! ## 構成
//! - `rpc` — ノード接続の抽象（`ChainRpc`トレイト）とHTTP実装
//! - `contract` — コントラクト呼び出しのABIエンコードと操作ごとのガス上限
//! - `submit` — ノンス取得→構築→署名→ブロードキャスト→確認のパイプライン
//! - `reader` — 読み取り専用のコントラクト照会（`eth_call`）

pub mod contract;
pub mod error;
pub mod reader;
pub mod rpc;
pub mod submit;

pub use contract::ChainOperation;
pub use error::ChainError;
pub use reader::ContractReader;
pub use rpc::{ChainRpc, HttpChainClient, RpcReceipt};
pub use submit::{TransactionSubmitter, TxReceipt};
