//! Bounded FIFO handing batches from the synthesizer thread to the submitter.
//!
//! This is the only channel between the two: pushing blocks the producer
//! while the queue is full, popping suspends the consumer while it is empty.

use tokio::sync::mpsc;

use crate::error::DiagnosticsError;
use crate::transaction::Batch;

/// Constructor for the two ends of the queue
pub struct BatchQueue;

impl BatchQueue {
    /// A queue holding at most `capacity` batches
    pub fn bounded(capacity: usize) -> Result<(BatchSender, BatchReceiver), DiagnosticsError> {
        if capacity == 0 {
            return Err(DiagnosticsError::config(
                "Batch queue capacity must be at least 1",
            ));
        }
        let (sender, receiver) = mpsc::channel(capacity);
        Ok((BatchSender { sender }, BatchReceiver { receiver }))
    }
}

/// Producer end
#[derive(Debug, Clone)]
pub struct BatchSender {
    sender: mpsc::Sender<Batch>,
}

impl BatchSender {
    /// Push from a thread outside the async runtime, blocking while the queue
    /// is full. Must not be called from within an async context.
    pub fn push_blocking(&self, batch: Batch) -> Result<(), DiagnosticsError> {
        self.sender
            .blocking_send(batch)
            .map_err(|_| DiagnosticsError::QueueClosed)
    }

    /// Push from async code, suspending while the queue is full
    pub async fn push(&self, batch: Batch) -> Result<(), DiagnosticsError> {
        self.sender
            .send(batch)
            .await
            .map_err(|_| DiagnosticsError::QueueClosed)
    }

    /// Batches waiting to be popped
    pub fn len(&self) -> usize {
        self.sender.max_capacity() - self.sender.capacity()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.sender.max_capacity()
    }
}

/// Consumer end
#[derive(Debug)]
pub struct BatchReceiver {
    receiver: mpsc::Receiver<Batch>,
}

impl BatchReceiver {
    /// Next batch in push order, or `None` once every sender is gone and the
    /// queue is drained
    pub async fn pop(&mut self) -> Option<Batch> {
        self.receiver.recv().await
    }
}
