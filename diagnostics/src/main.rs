//! Load generator for Autonity nodes. Signs value transfers between a set of
//! participants on one thread and submits them in batches from another.

#![forbid(unsafe_code)]
#![warn(unused_extern_crates)]

use std::path::Path;
use std::sync::Arc;

use clap::Parser;
use ethers::signers::Signer;
use ethers::utils::to_checksum;
use eyre::Result;

use aut_base::settings::load_settings;
use aut_base::setup_error_handling;
use aut_diagnostics::{
    generate_participants, read_participants_file, write_participants_file, EthersRpc,
    GeneratorSettings, TransactionGenerator, SETTINGS_PREFIX,
};

use crate::cli::{Cli, Commands, GenerateTransactions};

mod cli;

fn generate_participants_file(count: usize, seed: u64, path: &Path) -> Result<()> {
    let participants = generate_participants(count, seed)?;
    write_participants_file(path, &participants)?;
    println!("Participants file written to: {}", path.display());
    if let Some(hub) = participants.first() {
        println!("Fund account: {}", to_checksum(&hub.address(), None));
    }
    Ok(())
}

async fn generate_transactions(args: GenerateTransactions, settings: GeneratorSettings) -> Result<()> {
    let accounts = read_participants_file(&args.participants_file)?;
    let rpc = Arc::new(EthersRpc::new(args.rpc_endpoint));
    let generator = TransactionGenerator::from_settings(&settings, rpc, accounts).await?;
    generator.run().await?;
    Ok(())
}

fn main() -> Result<()> {
    setup_error_handling()?;
    let cli = Cli::parse();

    match cli.command {
        Commands::GenerateParticipants {
            num_participants,
            seed,
            participants_file,
        } => generate_participants_file(num_participants, seed, &participants_file),
        Commands::GenerateTransactions(args) => {
            let mut settings: GeneratorSettings =
                load_settings(SETTINGS_PREFIX, args.config.as_deref())?;
            args.apply_to(&mut settings);
            settings.tracing.start_tracing()?;

            tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()?
                .block_on(generate_transactions(args, settings))
        }
    }
}
