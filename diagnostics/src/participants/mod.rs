//! Accounts taking part in transaction generation and their nonces.

use ethers::signers::{LocalWallet, Signer};
use ethers::types::{Address, U256};
use tracing::{debug, info};

use crate::error::DiagnosticsError;
use crate::rpc::NodeRpc;

pub use file::{generate_participants, read_participants_file, write_participants_file};

mod file;

/// Index of a participant within its [`ParticipantRegistry`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParticipantId(usize);

/// An account with its signing key and the nonce of its next transaction
#[derive(Debug)]
pub struct Participant {
    address: Address,
    wallet: LocalWallet,
    nonce: U256,
}

impl Participant {
    /// Account address
    pub fn address(&self) -> Address {
        self.address
    }

    /// Signing key of the account
    pub fn wallet(&self) -> &LocalWallet {
        &self.wallet
    }

    /// Nonce the next synthesized transaction will use
    pub fn nonce(&self) -> U256 {
        self.nonce
    }
}

/// Participants loaded once at startup. The first participant is the hub.
///
/// The registry is owned by the synthesizer, the only place nonces are read
/// or advanced. Submission only ever sees signed transactions.
#[derive(Debug)]
pub struct ParticipantRegistry {
    participants: Vec<Participant>,
}

impl ParticipantRegistry {
    /// The fan-out source and fan-in sink of the transfer schedule
    pub const HUB: ParticipantId = ParticipantId(0);

    /// Build the registry, fetching each account's transaction count once as
    /// its initial nonce.
    pub async fn load(
        rpc: &dyn NodeRpc,
        accounts_and_keys: Vec<(Address, LocalWallet)>,
    ) -> Result<Self, DiagnosticsError> {
        if accounts_and_keys.len() < 2 {
            return Err(DiagnosticsError::config(format!(
                "At least two participants are required, got {}",
                accounts_and_keys.len()
            )));
        }

        let mut participants = Vec::with_capacity(accounts_and_keys.len());
        for (address, wallet) in accounts_and_keys {
            if wallet.address() != address {
                return Err(DiagnosticsError::config(format!(
                    "Private key for {address:?} belongs to {:?}",
                    wallet.address()
                )));
            }
            if participants
                .iter()
                .any(|p: &Participant| p.address == address)
            {
                return Err(DiagnosticsError::config(format!(
                    "Participant {address:?} is listed twice"
                )));
            }

            let nonce = rpc.transaction_count(address).await?;
            debug!(?address, %nonce, "Loaded participant");
            participants.push(Participant {
                address,
                wallet,
                nonce,
            });
        }

        info!(
            participants = participants.len(),
            hub = ?participants[0].address,
            "Participant registry loaded"
        );
        Ok(Self { participants })
    }

    /// Number of participants, hub included
    pub fn len(&self) -> usize {
        self.participants.len()
    }

    /// Always false: a registry holds at least two participants
    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }

    /// Every participant other than the hub, in load order
    pub fn counterparts(&self) -> impl Iterator<Item = ParticipantId> + '_ {
        (1..self.participants.len()).map(ParticipantId)
    }

    /// Every participant in load order
    pub fn ids(&self) -> impl Iterator<Item = ParticipantId> + '_ {
        (0..self.participants.len()).map(ParticipantId)
    }

    /// Look up a participant
    pub fn participant(&self, id: ParticipantId) -> &Participant {
        &self.participants[id.0]
    }

    /// Hand out the participant's current nonce and advance it
    pub fn next_nonce(&mut self, id: ParticipantId) -> U256 {
        let participant = &mut self.participants[id.0];
        let nonce = participant.nonce;
        participant.nonce = nonce.saturating_add(U256::one());
        nonce
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use crate::error::RpcError;
    use crate::tests::test_utils::{test_wallets, MockNode, MockRpc};

    use super::*;

    fn accounts(count: usize) -> Vec<(Address, LocalWallet)> {
        test_wallets(count)
            .into_iter()
            .map(|wallet| (wallet.address(), wallet))
            .collect()
    }

    #[tokio::test]
    async fn loads_initial_nonces_from_transaction_counts() {
        let accounts = accounts(3);
        let counts: HashMap<Address, U256> = accounts
            .iter()
            .enumerate()
            .map(|(i, (address, _))| (*address, U256::from(10 * i as u64)))
            .collect();

        let mut rpc = MockRpc::new();
        rpc.expect_transaction_count()
            .times(3)
            .returning(move |address| Ok(counts[&address]));

        let registry = ParticipantRegistry::load(&rpc, accounts.clone()).await.unwrap();
        assert_eq!(registry.len(), 3);
        for (id, (address, _)) in registry.ids().zip(&accounts) {
            assert_eq!(registry.participant(id).address(), *address);
        }
        let nonces: Vec<U256> = registry
            .ids()
            .map(|id| registry.participant(id).nonce())
            .collect();
        assert_eq!(nonces, vec![0.into(), 10.into(), 20.into()]);
    }

    #[tokio::test]
    async fn first_participant_is_the_hub() {
        let accounts = accounts(4);
        let registry = ParticipantRegistry::load(&MockNode::default(), accounts.clone())
            .await
            .unwrap();
        assert_eq!(
            registry.participant(ParticipantRegistry::HUB).address(),
            accounts[0].0
        );
        let counterparts: Vec<Address> = registry
            .counterparts()
            .map(|id| registry.participant(id).address())
            .collect();
        let expected: Vec<Address> = accounts[1..].iter().map(|(a, _)| *a).collect();
        assert_eq!(counterparts, expected);
    }

    #[tokio::test]
    async fn fewer_than_two_participants_is_a_configuration_error() {
        let mut rpc = MockRpc::new();
        rpc.expect_transaction_count().never();

        for count in [0, 1] {
            let result = ParticipantRegistry::load(&rpc, accounts(count)).await;
            assert!(matches!(result, Err(DiagnosticsError::Configuration(_))));
        }
    }

    #[tokio::test]
    async fn mismatched_key_is_a_configuration_error() {
        let mut accounts = accounts(3);
        accounts[1].0 = accounts[2].0;
        let result = ParticipantRegistry::load(&MockNode::default(), accounts).await;
        assert!(matches!(result, Err(DiagnosticsError::Configuration(_))));
    }

    #[tokio::test]
    async fn duplicate_participant_is_a_configuration_error() {
        let mut accounts = accounts(3);
        accounts[2] = accounts[0].clone();
        let result = ParticipantRegistry::load(&MockNode::default(), accounts).await;
        assert!(matches!(result, Err(DiagnosticsError::Configuration(_))));
    }

    #[tokio::test]
    async fn nonce_query_failure_aborts_loading() {
        let mut rpc = MockRpc::new();
        rpc.expect_transaction_count()
            .times(1)
            .returning(|_| Err(RpcError::Transport("connection refused".into())));

        let result = ParticipantRegistry::load(&rpc, accounts(3)).await;
        assert!(result.unwrap_err().is_transport());
    }

    #[tokio::test]
    async fn next_nonce_increments_by_one_per_participant() {
        let node = MockNode::default();
        let accounts = accounts(3);
        node.set_transaction_count(accounts[1].0, 7.into());
        let mut registry = ParticipantRegistry::load(&node, accounts).await.unwrap();

        let other = ParticipantId(1);
        let hub = ParticipantRegistry::HUB;
        assert_eq!(registry.next_nonce(other), 7.into());
        assert_eq!(registry.next_nonce(hub), 0.into());
        assert_eq!(registry.next_nonce(other), 8.into());
        assert_eq!(registry.next_nonce(other), 9.into());
        assert_eq!(registry.next_nonce(hub), 1.into());
        assert_eq!(registry.participant(other).nonce(), 10.into());
    }

    #[tokio::test]
    async fn reloading_against_unchanged_chain_state_is_idempotent() {
        let node = MockNode::default();
        let accounts = accounts(4);
        for (i, (address, _)) in accounts.iter().enumerate() {
            node.set_transaction_count(*address, U256::from(3 * i as u64 + 1));
        }

        let first = ParticipantRegistry::load(&node, accounts.clone()).await.unwrap();
        let second = ParticipantRegistry::load(&node, accounts).await.unwrap();
        let nonces = |registry: &ParticipantRegistry| -> Vec<U256> {
            registry
                .ids()
                .map(|id| registry.participant(id).nonce())
                .collect()
        };
        assert_eq!(nonces(&first), nonces(&second));
        assert_eq!(node.submissions().len(), 0);
    }
}
