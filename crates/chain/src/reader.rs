//! # 読み取り専用のコントラクト照会
//!
//! `eth_call`によるベースURI・トークン存在・所有者の照会。
//! 状態を変更しないためノンスも署名も不要。

use std::sync::Arc;

use alloy_primitives::{Address, U256};
use alloy_sol_types::SolCall;

use crate::contract::MintpassItem;
use crate::error::ChainError;
use crate::rpc::ChainRpc;

/// コントラクトの読み取り専用ビュー。
pub struct ContractReader {
    rpc: Arc<dyn ChainRpc>,
    contract: Address,
}

impl ContractReader {
    /// ノード接続とコントラクトアドレスから構築する。
    pub fn new(rpc: Arc<dyn ChainRpc>, contract: Address) -> Self {
        Self { rpc, contract }
    }

    /// 現在のベースURIを照会する
    pub async fn base_uri(&self) -> Result<String, ChainError> {
        let data = MintpassItem::getBaseURICall {}.abi_encode();
        let output = self.rpc.call(self.contract, data.into()).await?;
        MintpassItem::getBaseURICall::abi_decode_returns(&output)
            .map_err(|e| ChainError::Encoding(format!("getBaseURIの戻り値のデコードに失敗: {e}")))
    }

    /// トークンが存在するかを照会する
    pub async fn exists(&self, token_id: U256) -> Result<bool, ChainError> {
        let data = MintpassItem::existsCall { tokenId: token_id }.abi_encode();
        let output = self.rpc.call(self.contract, data.into()).await?;
        MintpassItem::existsCall::abi_decode_returns(&output)
            .map_err(|e| ChainError::Encoding(format!("existsの戻り値のデコードに失敗: {e}")))
    }

    /// トークンの現在の所有者を照会する
    pub async fn owner_of(&self, token_id: U256) -> Result<Address, ChainError> {
        let data = MintpassItem::ownerOfCall { tokenId: token_id }.abi_encode();
        let output = self.rpc.call(self.contract, data.into()).await?;
        MintpassItem::ownerOfCall::abi_decode_returns(&output)
            .map_err(|e| ChainError::Encoding(format!("ownerOfの戻り値のデコードに失敗: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rpc::RpcReceipt;
    use alloy_primitives::{Bytes, B256};
    use alloy_sol_types::SolValue;
    use std::sync::Mutex;

    /// eth_callに固定レスポンスを返すモック。受け取ったcalldataを記録する。
    struct MockCallRpc {
        response: Vec<u8>,
        requests: Mutex<Vec<Bytes>>,
    }

    impl MockCallRpc {
        fn new(response: Vec<u8>) -> Self {
            Self {
                response,
                requests: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait::async_trait]
    impl ChainRpc for MockCallRpc {
        async fn transaction_count(&self, _account: Address) -> Result<u64, ChainError> {
            unimplemented!("読み取り専用")
        }

        async fn gas_price(&self) -> Result<u128, ChainError> {
            unimplemented!("読み取り専用")
        }

        async fn send_raw_transaction(&self, _raw: &[u8]) -> Result<B256, ChainError> {
            unimplemented!("読み取り専用")
        }

        async fn transaction_receipt(
            &self,
            _tx_hash: B256,
        ) -> Result<Option<RpcReceipt>, ChainError> {
            unimplemented!("読み取り専用")
        }

        async fn call(&self, _to: Address, data: Bytes) -> Result<Bytes, ChainError> {
            self.requests.lock().unwrap().push(data);
            Ok(self.response.clone().into())
        }
    }

    /// base_uriがABI文字列を正しくデコードすることを確認
    #[tokio::test]
    async fn test_base_uri() {
        let encoded = "http://URI/GetItemInfo?ItemId=".to_string().abi_encode();
        let rpc = Arc::new(MockCallRpc::new(encoded));
        let reader = ContractReader::new(rpc.clone(), Address::ZERO);

        let base_uri = reader.base_uri().await.unwrap();
        assert_eq!(base_uri, "http://URI/GetItemInfo?ItemId=");

        let requests = rpc.requests.lock().unwrap();
        assert_eq!(&requests[0][..4], &MintpassItem::getBaseURICall::SELECTOR[..]);
    }

    /// existsがABI boolを正しくデコードすることを確認
    #[tokio::test]
    async fn test_exists() {
        let rpc = Arc::new(MockCallRpc::new(true.abi_encode()));
        let reader = ContractReader::new(rpc, Address::ZERO);
        assert!(reader.exists(U256::from(42u64)).await.unwrap());
    }

    /// ownerOfがABIアドレスを正しくデコードすることを確認
    #[tokio::test]
    async fn test_owner_of() {
        let owner = Address::repeat_byte(0x44);
        let rpc = Arc::new(MockCallRpc::new(owner.abi_encode()));
        let reader = ContractReader::new(rpc, Address::ZERO);
        assert_eq!(reader.owner_of(U256::from(42u64)).await.unwrap(), owner);
    }
}
