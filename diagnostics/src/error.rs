use ethers::signers::WalletError;

/// Failures reported by a node RPC call
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RpcError {
    /// The node answered with a JSON-RPC error, e.g. a bad nonce or
    /// insufficient funds for a submitted transaction
    #[error("Rejected by node: {0}")]
    Rejected(String),
    /// The node could not be reached or answered with something that is not
    /// a JSON-RPC response
    #[error("RPC transport failure: {0}")]
    Transport(String),
}

impl RpcError {
    /// Whether the failure is limited to the request that caused it
    pub fn is_rejection(&self) -> bool {
        matches!(self, RpcError::Rejected(_))
    }
}

/// Errors raised by the transaction generator
#[derive(Debug, thiserror::Error)]
pub enum DiagnosticsError {
    /// Invalid participants, settings or other startup input
    #[error("Configuration error: {0}")]
    Configuration(String),
    /// A node RPC call failed outside of per-transaction submission
    #[error(transparent)]
    Rpc(#[from] RpcError),
    /// Signing a synthesized transaction failed
    #[error("Failed to sign transaction: {0}")]
    Signing(#[from] WalletError),
    /// The other end of the batch queue is gone
    #[error("Batch queue closed")]
    QueueClosed,
    /// A submission task was cancelled or panicked before resolving
    #[error("Submission task failed: {0}")]
    SubmissionTask(String),
    /// The synthesizer thread panicked
    #[error("Synthesizer thread panicked")]
    ProducerPanicked,
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl DiagnosticsError {
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        DiagnosticsError::Configuration(msg.into())
    }

    /// Whether the pipeline must halt because the node is unreachable
    pub fn is_transport(&self) -> bool {
        matches!(self, DiagnosticsError::Rpc(RpcError::Transport(_)))
    }
}
