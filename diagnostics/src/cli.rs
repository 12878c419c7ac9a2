use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use url::Url;

use aut_diagnostics::GeneratorSettings;

#[derive(Parser, Debug)]
#[command(author, version, about = "Autonity network diagnostics", long_about = None)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write a file of deterministic participant accounts. FOR TESTING ONLY:
    /// the private keys are trivially guessable.
    GenerateParticipants {
        /// Number of participants, the first one being the hub
        #[clap(long, short = 'n', default_value_t = 20)]
        num_participants: usize,
        /// Private key of the first participant. Concurrent generators
        /// must not share key ranges.
        #[clap(long, short, default_value_t = 100)]
        seed: u64,
        /// File to write
        participants_file: PathBuf,
    },
    /// Continuously send transfers between the participants of a
    /// participants file. The hub (first participant) must be funded.
    GenerateTransactions(GenerateTransactions),
}

#[derive(Args, Debug)]
pub struct GenerateTransactions {
    /// Node JSON-RPC endpoint
    #[clap(long, short, env = "WEB3_ENDPOINT")]
    pub rpc_endpoint: Url,
    /// Settings file, any format the config loader understands
    #[clap(long)]
    pub config: Option<PathBuf>,
    /// Transactions per batch
    #[clap(long)]
    pub batch_size: Option<usize>,
    /// Batches queued before signing pauses
    #[clap(long)]
    pub concurrent_batches: Option<usize>,
    /// Batches in flight before the oldest one is awaited
    #[clap(long)]
    pub max_pending_batches: Option<usize>,
    /// Value sent by the hub to each participant, e.g. 1gwei
    #[clap(long)]
    pub hub_unit: Option<String>,
    /// Stop after this many cycles through the participants
    #[clap(long)]
    pub cycles: Option<u64>,
    /// Participants file written by generate-participants
    pub participants_file: PathBuf,
}

impl GenerateTransactions {
    /// Flags win over the settings file and environment
    pub fn apply_to(&self, settings: &mut GeneratorSettings) {
        if let Some(batch_size) = self.batch_size {
            settings.batch_size = batch_size;
        }
        if let Some(concurrent_batches) = self.concurrent_batches {
            settings.concurrent_batches = concurrent_batches;
        }
        if let Some(max_pending_batches) = self.max_pending_batches {
            settings.max_pending_batches = max_pending_batches;
        }
        if let Some(hub_unit) = &self.hub_unit {
            settings.hub_unit = hub_unit.clone();
        }
        if self.cycles.is_some() {
            settings.cycles = self.cycles;
        }
    }
}
