use std::collections::{HashMap, HashSet};
use std::ops::Range;
use std::sync::Mutex;

use async_trait::async_trait;
use ethers::signers::{LocalWallet, Signer};
use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::{Address, Bytes, H256, U256};
use ethers::utils::keccak256;
use rlp::Rlp;

use crate::error::RpcError;
use crate::participants::generate_participants;
use crate::rpc::NodeRpc;
use crate::template::{FeeParams, TxTemplate, TRANSFER_GAS};
use crate::transaction::{Batch, SignedTransaction};

pub const TEST_CHAIN_ID: u64 = 65_010_000;

mockall::mock! {
    pub Rpc {}

    #[async_trait]
    impl NodeRpc for Rpc {
        async fn chain_id(&self) -> Result<u64, RpcError>;
        async fn gas_price(&self) -> Result<U256, RpcError>;
        async fn eip1559_fees(&self) -> Result<(U256, U256), RpcError>;
        async fn transaction_count(&self, address: Address) -> Result<U256, RpcError>;
        async fn send_raw_transaction(&self, raw: Bytes) -> Result<H256, RpcError>;
    }
}

/// A submission received by a [`MockNode`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub hash: H256,
    pub from: Address,
    pub nonce: U256,
    pub accepted: bool,
}

#[derive(Debug, Default)]
struct NodeState {
    transaction_counts: HashMap<Address, U256>,
    rejected: HashSet<(Address, U256)>,
    reachable_for: Option<usize>,
    attempts: usize,
    submissions: Vec<Submission>,
}

/// In-memory node recording every raw transaction it is sent. Decodes and
/// verifies the signature of each one.
#[derive(Debug, Default)]
pub struct MockNode {
    state: Mutex<NodeState>,
}

impl MockNode {
    pub fn set_transaction_count(&self, address: Address, count: U256) {
        self.state
            .lock()
            .unwrap()
            .transaction_counts
            .insert(address, count);
    }

    /// Refuse the transaction of `from` with `nonce`
    pub fn reject(&self, from: Address, nonce: U256) {
        self.state.lock().unwrap().rejected.insert((from, nonce));
    }

    /// Become unreachable after answering `calls` more submissions
    pub fn fail_after(&self, calls: usize) {
        let mut state = self.state.lock().unwrap();
        state.reachable_for = Some(state.attempts + calls);
    }

    pub fn submissions(&self) -> Vec<Submission> {
        self.state.lock().unwrap().submissions.clone()
    }

    fn check_reachable(state: &NodeState) -> Result<(), RpcError> {
        match state.reachable_for {
            Some(limit) if state.attempts >= limit => {
                Err(RpcError::Transport("connection refused".into()))
            }
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl NodeRpc for MockNode {
    async fn chain_id(&self) -> Result<u64, RpcError> {
        Ok(TEST_CHAIN_ID)
    }

    async fn gas_price(&self) -> Result<U256, RpcError> {
        Ok(U256::exp10(9))
    }

    async fn eip1559_fees(&self) -> Result<(U256, U256), RpcError> {
        Ok((U256::exp10(9) * U256::from(2u64), U256::exp10(9)))
    }

    async fn transaction_count(&self, address: Address) -> Result<U256, RpcError> {
        let state = self.state.lock().unwrap();
        Self::check_reachable(&state)?;
        Ok(state
            .transaction_counts
            .get(&address)
            .copied()
            .unwrap_or_default())
    }

    async fn send_raw_transaction(&self, raw: Bytes) -> Result<H256, RpcError> {
        let (tx, from) = decode_raw(&raw);
        let mut state = self.state.lock().unwrap();
        Self::check_reachable(&state)?;
        state.attempts += 1;

        let hash = H256::from(keccak256(&raw));
        let nonce = tx.nonce().copied().unwrap_or_default();
        let accepted = !state.rejected.contains(&(from, nonce));
        state.submissions.push(Submission {
            hash,
            from,
            nonce,
            accepted,
        });
        if accepted {
            Ok(hash)
        } else {
            Err(RpcError::Rejected("nonce too low (-32000)".into()))
        }
    }
}

/// Decode a signed transaction and recover its sender
pub fn decode_raw(raw: &Bytes) -> (TypedTransaction, Address) {
    let (tx, signature) = TypedTransaction::decode_signed(&Rlp::new(raw.as_ref())).unwrap();
    let from = signature.recover(tx.sighash()).unwrap();
    (tx, from)
}

/// Deterministic funded-looking accounts
pub fn test_wallets(count: usize) -> Vec<LocalWallet> {
    generate_participants(count, 1000).unwrap()
}

/// Self transfers of `wallet` signed with the given nonces
pub fn signed_batch(id: u64, wallet: &LocalWallet, nonces: Range<u64>) -> Batch {
    let template = TxTemplate::new(
        TEST_CHAIN_ID,
        TRANSFER_GAS.into(),
        FeeParams::Legacy {
            gas_price: U256::exp10(9),
        },
    );
    let mut batch = Batch::new(id, nonces.clone().count());
    for nonce in nonces {
        let tx = template.build(wallet.address(), wallet.address(), nonce.into(), 1.into());
        let signature = wallet.sign_transaction_sync(&tx).unwrap();
        let raw = tx.rlp_signed(&signature);
        batch.push(SignedTransaction::new(
            raw.clone(),
            H256::from(keccak256(&raw)),
            wallet.address(),
            wallet.address(),
            nonce.into(),
            1.into(),
        ));
    }
    batch
}
