use std::collections::VecDeque;
use std::sync::Arc;

use ethers::types::{Address, H256, U256};
use futures_util::future::join_all;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};

use crate::error::{DiagnosticsError, RpcError};
use crate::queue::BatchReceiver;
use crate::rpc::NodeRpc;
use crate::transaction::Batch;

/// A transaction handed to the node whose outcome has not been awaited yet
#[derive(Debug)]
struct PendingSubmission {
    hash: H256,
    from: Address,
    nonce: U256,
    handle: JoinHandle<Result<H256, RpcError>>,
}

/// The submissions of one batch
#[derive(Debug)]
struct BacklogEntry {
    batch: u64,
    submissions: Vec<PendingSubmission>,
}

/// Counters reported when the submitter stops
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SubmissionStats {
    /// Batches dispatched
    pub batches: u64,
    /// Transactions dispatched
    pub submitted: u64,
    /// Transactions the node accepted
    pub confirmed: u64,
    /// Transactions the node refused
    pub rejected: u64,
    /// Deepest the backlog got, never more than `max_pending_batches + 1`
    pub max_backlog_depth: usize,
}

/// The consumer: dispatches every transaction of a batch without waiting on
/// it, and only awaits the oldest batch once more than `max_pending_batches`
/// are outstanding.
pub struct BatchSubmitter {
    rpc: Arc<dyn NodeRpc>,
    max_pending_batches: usize,
    backlog: VecDeque<BacklogEntry>,
    stats: SubmissionStats,
}

impl BatchSubmitter {
    pub fn new(rpc: Arc<dyn NodeRpc>, max_pending_batches: usize) -> Self {
        Self {
            rpc,
            max_pending_batches,
            backlog: VecDeque::new(),
            stats: SubmissionStats::default(),
        }
    }

    /// Batches dispatched but not awaited yet
    pub fn backlog_depth(&self) -> usize {
        self.backlog.len()
    }

    pub fn stats(&self) -> SubmissionStats {
        self.stats
    }

    /// Dispatch a batch, then retire the oldest backlog entry if the backlog
    /// grew past its threshold. Fails only if the node is unreachable, and
    /// only once the entry holding the failed submission is retired: up to
    /// `max_pending_batches` later batches are dispatched before that.
    pub async fn submit(&mut self, batch: Batch) -> Result<(), DiagnosticsError> {
        self.dispatch(batch);
        if self.backlog.len() > self.max_pending_batches {
            self.retire_oldest().await?;
        }
        Ok(())
    }

    /// Spawn one submission task per transaction and record their handles as
    /// a new backlog entry
    fn dispatch(&mut self, batch: Batch) {
        let batch_id = batch.id();
        let submissions: Vec<PendingSubmission> = batch
            .into_transactions()
            .into_iter()
            .map(|tx| {
                let rpc = self.rpc.clone();
                let raw = tx.raw;
                PendingSubmission {
                    hash: tx.hash,
                    from: tx.from,
                    nonce: tx.nonce,
                    handle: tokio::spawn(async move { rpc.send_raw_transaction(raw).await }),
                }
            })
            .collect();

        let transactions = submissions.len();
        self.stats.batches += 1;
        self.stats.submitted += transactions as u64;
        self.backlog.push_back(BacklogEntry {
            batch: batch_id,
            submissions,
        });
        self.stats.max_backlog_depth = self.stats.max_backlog_depth.max(self.backlog.len());
        info!(
            batch = batch_id,
            transactions,
            backlog = self.backlog.len(),
            "sent batch"
        );
    }

    /// Await every submission of the oldest backlog entry. Rejected
    /// transactions are logged and counted; a transport failure is returned
    /// once all siblings have resolved.
    pub async fn retire_oldest(&mut self) -> Result<(), DiagnosticsError> {
        let Some(BacklogEntry { batch, submissions }) = self.backlog.pop_front() else {
            return Ok(());
        };
        info!(
            batch,
            transactions = submissions.len(),
            backlog = self.backlog.len(),
            "awaiting batch"
        );

        let (details, handles): (Vec<_>, Vec<_>) = submissions
            .into_iter()
            .map(|s| ((s.hash, s.from, s.nonce), s.handle))
            .unzip();
        let results = join_all(handles).await;

        let mut confirmed = 0u64;
        let mut rejected = 0u64;
        let mut fatal = None;
        for ((tx_hash, from, nonce), result) in details.into_iter().zip(results) {
            match result {
                Ok(Ok(hash)) => {
                    confirmed += 1;
                    debug!(?hash, ?from, %nonce, "Transaction accepted");
                }
                Ok(Err(err)) if err.is_rejection() => {
                    rejected += 1;
                    warn!(?tx_hash, ?from, %nonce, error = %err, "Transaction rejected");
                }
                Ok(Err(err)) => {
                    error!(?tx_hash, ?from, %nonce, error = %err, "Node unreachable");
                    fatal.get_or_insert(DiagnosticsError::Rpc(err));
                }
                Err(err) => {
                    error!(?tx_hash, ?from, %nonce, error = %err, "Submission task failed");
                    fatal.get_or_insert(DiagnosticsError::SubmissionTask(err.to_string()));
                }
            }
        }

        self.stats.confirmed += confirmed;
        self.stats.rejected += rejected;
        if let Some(err) = fatal {
            return Err(err);
        }
        info!(batch, confirmed, rejected, "awaited");
        Ok(())
    }

    /// Submit batches until the queue closes, then await the whole backlog.
    ///
    /// A transport failure is observed when its backlog entry is retired, so
    /// the run halts at most `max_pending_batches` batches after the one that
    /// failed. The outstanding submissions are then aborted.
    #[instrument(skip_all, name = "BatchSubmitter::run", fields(max_pending_batches = self.max_pending_batches))]
    pub async fn run(mut self, queue: BatchReceiver) -> Result<SubmissionStats, DiagnosticsError> {
        match self.process(queue).await {
            Ok(()) => {
                info!(stats = ?self.stats, "Batch submission finished");
                Ok(self.stats)
            }
            Err(err) => {
                self.abort_backlog();
                Err(err)
            }
        }
    }

    async fn process(&mut self, mut queue: BatchReceiver) -> Result<(), DiagnosticsError> {
        while let Some(batch) = queue.pop().await {
            self.submit(batch).await?;
        }
        debug!(backlog = self.backlog.len(), "Batch queue closed, draining backlog");
        while !self.backlog.is_empty() {
            self.retire_oldest().await?;
        }
        Ok(())
    }

    fn abort_backlog(&mut self) {
        for entry in self.backlog.drain(..) {
            for submission in entry.submissions {
                submission.handle.abort();
            }
        }
    }
}
