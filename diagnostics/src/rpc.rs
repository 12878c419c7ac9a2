use async_trait::async_trait;
use ethers::providers::{Http, Middleware, Provider, ProviderError, RpcError as _};
use ethers::types::{Address, Bytes, H256, U256};
use tracing::instrument;
use url::Url;

use crate::error::RpcError;

/// The subset of a node's JSON-RPC interface the generator relies on.
///
/// Implementations must be cheap to share: submissions are dispatched as
/// independent tasks that each hold a reference to the same client.
#[async_trait]
pub trait NodeRpc: Send + Sync {
    /// Chain id used for replay protection when signing
    async fn chain_id(&self) -> Result<u64, RpcError>;

    /// Current legacy gas price
    async fn gas_price(&self) -> Result<U256, RpcError>;

    /// Suggested `(max_fee_per_gas, max_priority_fee_per_gas)`
    async fn eip1559_fees(&self) -> Result<(U256, U256), RpcError>;

    /// Number of transactions sent from `address`, i.e. its next nonce
    async fn transaction_count(&self, address: Address) -> Result<U256, RpcError>;

    /// Broadcast a signed transaction, returning its hash once the node
    /// accepted it
    async fn send_raw_transaction(&self, raw: Bytes) -> Result<H256, RpcError>;
}

/// [`NodeRpc`] over an ethers HTTP provider
#[derive(Debug, Clone)]
pub struct EthersRpc {
    provider: Provider<Http>,
}

impl EthersRpc {
    /// Create a client for the node at `url`
    pub fn new(url: Url) -> Self {
        Self {
            provider: Provider::new(Http::new(url)),
        }
    }
}

/// A JSON-RPC error object means the node processed and refused the request;
/// everything else is a transport problem.
fn classify(err: ProviderError) -> RpcError {
    match err.as_error_response() {
        Some(response) => RpcError::Rejected(format!("{} ({})", response.message, response.code)),
        None => RpcError::Transport(err.to_string()),
    }
}

/// Chain ids beyond 64 bits cannot be signed for
fn chain_id_from(value: U256) -> Result<u64, RpcError> {
    u64::try_from(value)
        .map_err(|_| RpcError::Transport(format!("Node reported an out of range chain id {value}")))
}

#[async_trait]
impl NodeRpc for EthersRpc {
    async fn chain_id(&self) -> Result<u64, RpcError> {
        let chain_id = self.provider.get_chainid().await.map_err(classify)?;
        chain_id_from(chain_id)
    }

    async fn gas_price(&self) -> Result<U256, RpcError> {
        self.provider.get_gas_price().await.map_err(classify)
    }

    async fn eip1559_fees(&self) -> Result<(U256, U256), RpcError> {
        self.provider
            .estimate_eip1559_fees(None)
            .await
            .map_err(classify)
    }

    #[instrument(skip(self), err)]
    async fn transaction_count(&self, address: Address) -> Result<U256, RpcError> {
        self.provider
            .get_transaction_count(address, None)
            .await
            .map_err(classify)
    }

    async fn send_raw_transaction(&self, raw: Bytes) -> Result<H256, RpcError> {
        let pending = self
            .provider
            .send_raw_transaction(raw)
            .await
            .map_err(classify)?;
        Ok(*pending)
    }
}
