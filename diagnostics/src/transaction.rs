use derive_new::new;
use ethers::types::{Address, Bytes, H256, U256};

/// A transfer signed by its sender, ready to broadcast
#[derive(Debug, Clone, PartialEq, Eq, new)]
pub struct SignedTransaction {
    /// RLP encoding including the signature
    pub raw: Bytes,
    /// keccak256 of `raw`
    pub hash: H256,
    pub from: Address,
    pub to: Address,
    pub nonce: U256,
    pub value: U256,
}

/// Signed transactions produced and submitted together
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    id: u64,
    transactions: Vec<SignedTransaction>,
}

impl Batch {
    pub fn new(id: u64, capacity: usize) -> Self {
        Self {
            id,
            transactions: Vec::with_capacity(capacity),
        }
    }

    /// Sequence number of the batch within a run, starting at 0
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn push(&mut self, tx: SignedTransaction) {
        self.transactions.push(tx);
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    pub fn transactions(&self) -> &[SignedTransaction] {
        &self.transactions
    }

    pub fn into_transactions(self) -> Vec<SignedTransaction> {
        self.transactions
    }
}
