//! Transaction load generator for Autonity nodes.
//!
//! A [`TransactionSynthesizer`] signs value transfers between participants
//! following a fan-out/fan-in schedule around a hub account and hands them
//! over in batches through a bounded [`BatchQueue`]. A [`BatchSubmitter`]
//! broadcasts each batch without waiting on it and only awaits the oldest
//! batch once too many are in flight. [`TransactionGenerator`] runs the two
//! against a node.

#![deny(clippy::unwrap_used, clippy::panic)]

pub use denom::parse_wei_representation;
pub use error::{DiagnosticsError, RpcError};
pub use generator::{GeneratorReport, TransactionGenerator};
pub use participants::{
    generate_participants, read_participants_file, write_participants_file, Participant,
    ParticipantId, ParticipantRegistry,
};
pub use queue::{BatchQueue, BatchReceiver, BatchSender};
pub use rpc::{EthersRpc, NodeRpc};
pub use settings::{GeneratorSettings, SETTINGS_PREFIX};
pub use submitter::{BatchSubmitter, SubmissionStats};
pub use synthesizer::{schedule, SynthesisStats, SynthesizerConfig, TransactionSynthesizer, Transfer};
pub use template::{FeeParams, TemplateOverrides, TxTemplate, TRANSFER_GAS};
pub use transaction::{Batch, SignedTransaction};

mod denom;
mod error;
mod generator;
mod participants;
mod queue;
mod rpc;
mod settings;
mod submitter;
mod synthesizer;
mod template;
mod transaction;
