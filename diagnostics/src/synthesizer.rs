use ethers::types::{H256, U256};
use ethers::utils::keccak256;
use tracing::{debug, info, instrument, trace};

use crate::error::DiagnosticsError;
use crate::participants::{ParticipantId, ParticipantRegistry};
use crate::queue::BatchSender;
use crate::template::TxTemplate;
use crate::transaction::{Batch, SignedTransaction};

/// One value transfer of the schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transfer {
    pub from: ParticipantId,
    pub to: ParticipantId,
    pub value: U256,
}

/// One cycle of the fan-out/fan-in schedule: the hub pays `hub_unit` to every
/// counterpart, then every counterpart pays `hub_unit / participants` back.
pub fn schedule(registry: &ParticipantRegistry, hub_unit: U256) -> Vec<Transfer> {
    let hub = ParticipantRegistry::HUB;
    let fan_in_value = hub_unit / U256::from(registry.len());

    let fan_out = registry.counterparts().map(|to| Transfer {
        from: hub,
        to,
        value: hub_unit,
    });
    let fan_in = registry.counterparts().map(|from| Transfer {
        from,
        to: hub,
        value: fan_in_value,
    });
    fan_out.chain(fan_in).collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesizerConfig {
    /// Transactions per batch
    pub batch_size: usize,
    /// Value of each hub transfer, in wei
    pub hub_unit: U256,
    /// Number of schedule cycles to run, forever if unset
    pub cycles: Option<u64>,
}

/// Counters reported when the synthesizer stops
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SynthesisStats {
    pub transactions: u64,
    pub batches: u64,
}

/// The producer: signs transfers in schedule order and pushes full batches
/// onto the queue. Owns the registry and with it every nonce.
#[derive(Debug)]
pub struct TransactionSynthesizer {
    registry: ParticipantRegistry,
    template: TxTemplate,
    config: SynthesizerConfig,
    next_batch_id: u64,
    stats: SynthesisStats,
}

impl TransactionSynthesizer {
    pub fn new(
        registry: ParticipantRegistry,
        template: TxTemplate,
        config: SynthesizerConfig,
    ) -> Result<Self, DiagnosticsError> {
        if config.batch_size == 0 {
            return Err(DiagnosticsError::config("Batch size must be at least 1"));
        }
        Ok(Self {
            registry,
            template,
            config,
            next_batch_id: 0,
            stats: SynthesisStats::default(),
        })
    }

    pub fn registry(&self) -> &ParticipantRegistry {
        &self.registry
    }

    /// Sign one transfer with the sender's next nonce
    pub fn synthesize(&mut self, transfer: &Transfer) -> Result<SignedTransaction, DiagnosticsError> {
        let nonce = self.registry.next_nonce(transfer.from);
        let sender = self.registry.participant(transfer.from);
        let to = self.registry.participant(transfer.to).address();

        let tx = self
            .template
            .build(sender.address(), to, nonce, transfer.value);
        let signature = sender.wallet().sign_transaction_sync(&tx)?;
        let raw = tx.rlp_signed(&signature);
        let hash = H256::from(keccak256(&raw));
        trace!(?hash, from = ?sender.address(), %nonce, "Signed transaction");

        self.stats.transactions += 1;
        Ok(SignedTransaction::new(
            raw,
            hash,
            sender.address(),
            to,
            nonce,
            transfer.value,
        ))
    }

    /// Produce batches until the configured number of cycles is done, or
    /// forever. Blocks while the queue is full, so it must run on its own
    /// thread. A bounded run pushes its last partial batch before returning.
    #[instrument(skip_all, name = "TransactionSynthesizer::run")]
    pub fn run(mut self, queue: BatchSender) -> Result<SynthesisStats, DiagnosticsError> {
        let schedule = schedule(&self.registry, self.config.hub_unit);
        debug!(
            transfers_per_cycle = schedule.len(),
            batch_size = self.config.batch_size,
            cycles = ?self.config.cycles,
            "Starting transaction synthesis"
        );

        let mut batch = self.new_batch();
        let mut cycle = 0u64;
        while self.config.cycles.map_or(true, |cycles| cycle < cycles) {
            for transfer in &schedule {
                batch.push(self.synthesize(transfer)?);
                if batch.len() == self.config.batch_size {
                    let full = std::mem::replace(&mut batch, self.new_batch());
                    self.push(&queue, full)?;
                }
            }
            cycle += 1;
        }
        if !batch.is_empty() {
            self.push(&queue, batch)?;
        }

        info!(stats = ?self.stats, "Transaction synthesis finished");
        Ok(self.stats)
    }

    fn new_batch(&mut self) -> Batch {
        let batch = Batch::new(self.next_batch_id, self.config.batch_size);
        self.next_batch_id += 1;
        batch
    }

    fn push(&mut self, queue: &BatchSender, batch: Batch) -> Result<(), DiagnosticsError> {
        info!(
            batch = batch.id(),
            transactions = batch.len(),
            queued = queue.len(),
            "created batch"
        );
        queue.push_blocking(batch)?;
        self.stats.batches += 1;
        Ok(())
    }
}
