use std::sync::Arc;
use std::thread;

use ethers::signers::LocalWallet;
use ethers::types::Address;
use tracing::{info, warn, Span};

use crate::error::DiagnosticsError;
use crate::participants::ParticipantRegistry;
use crate::queue::BatchQueue;
use crate::rpc::NodeRpc;
use crate::settings::GeneratorSettings;
use crate::submitter::{BatchSubmitter, SubmissionStats};
use crate::synthesizer::{SynthesisStats, TransactionSynthesizer};
use crate::template::TxTemplate;

/// What both halves of a finished run did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GeneratorReport {
    pub synthesis: SynthesisStats,
    pub submission: SubmissionStats,
}

/// Wires the synthesizer to the submitter through a bounded batch queue.
///
/// The synthesizer runs on its own OS thread, the submitter on the calling
/// task. Nothing but batches crosses between the two.
pub struct TransactionGenerator {
    synthesizer: TransactionSynthesizer,
    submitter: BatchSubmitter,
    concurrent_batches: usize,
}

impl TransactionGenerator {
    pub fn new(
        synthesizer: TransactionSynthesizer,
        submitter: BatchSubmitter,
        concurrent_batches: usize,
    ) -> Self {
        Self {
            synthesizer,
            submitter,
            concurrent_batches,
        }
    }

    /// Validate settings, load the participants' nonces and resolve the
    /// transaction template
    pub async fn from_settings(
        settings: &GeneratorSettings,
        rpc: Arc<dyn NodeRpc>,
        accounts_and_keys: Vec<(Address, LocalWallet)>,
    ) -> Result<Self, DiagnosticsError> {
        settings.validate()?;
        let registry = ParticipantRegistry::load(rpc.as_ref(), accounts_and_keys).await?;
        let template = TxTemplate::resolve(rpc.as_ref(), &settings.template_overrides()?).await?;
        let synthesizer =
            TransactionSynthesizer::new(registry, template, settings.synthesizer_config()?)?;
        let submitter = BatchSubmitter::new(rpc, settings.max_pending_batches);
        Ok(Self::new(
            synthesizer,
            submitter,
            settings.concurrent_batches,
        ))
    }

    /// Run until the synthesizer finishes its cycles, or forever if unbounded.
    ///
    /// A submitter failure closes the queue, which stops the synthesizer; the
    /// submitter's error is the one reported.
    pub async fn run(self) -> Result<GeneratorReport, DiagnosticsError> {
        let (sender, receiver) = BatchQueue::bounded(self.concurrent_batches)?;
        let synthesizer = self.synthesizer;
        let span = Span::current();
        let producer = thread::Builder::new()
            .name("synthesizer".to_owned())
            .spawn(move || span.in_scope(|| synthesizer.run(sender)))?;
        info!(
            concurrent_batches = self.concurrent_batches,
            "Transaction generator started"
        );

        let submitted = self.submitter.run(receiver).await;
        let produced = match tokio::task::spawn_blocking(move || producer.join()).await {
            Ok(Ok(result)) => result,
            _ => Err(DiagnosticsError::ProducerPanicked),
        };

        let submission = submitted?;
        let synthesis = produced.map_err(|err| {
            warn!(error = %err, "Transaction synthesis failed");
            err
        })?;
        let report = GeneratorReport {
            synthesis,
            submission,
        };
        info!(?report, "Transaction generator finished");
        Ok(report)
    }
}
