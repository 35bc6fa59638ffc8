//! Error definitions shared by every component.

use thiserror::Error;

use crate::wallet::provider::ProviderRpcError;

/// Errors surfaced by the wallet, read and write paths.
///
/// None of these are fatal: each one is recoverable by retrying the action
/// that triggered it.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ClientError {
    /// No wallet provider is present, or it could not produce an account.
    #[error("Wallet unavailable: {0}")]
    WalletUnavailable(String),

    /// The user declined a wallet prompt.
    #[error("Request rejected by user: {0}")]
    UserRejected(String),

    /// The network switch failed or the wallet is on another network.
    #[error("Wrong network: expected chain {expected}, got {actual:?}")]
    WrongNetwork { expected: u64, actual: Option<u64> },

    /// A read-path call failed.
    #[error("Read failed: {0}")]
    ReadFailure(String),

    /// A write was rejected before it was broadcast.
    #[error("Submission failed: {0}")]
    SubmissionFailure(String),

    /// A broadcast transaction reverted or its confirmation wait failed.
    #[error("Transaction failed: {0}")]
    TransactionFailure(String),

    /// The operation needs a connected session.
    #[error("Wallet not connected")]
    NotConnected,
}

/// Discriminant of [`ClientError`], cheap to copy into events and metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    WalletUnavailable,
    UserRejected,
    WrongNetwork,
    ReadFailure,
    SubmissionFailure,
    TransactionFailure,
    NotConnected,
}

impl ErrorKind {
    /// Stable label for logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::WalletUnavailable => "wallet_unavailable",
            ErrorKind::UserRejected => "user_rejected",
            ErrorKind::WrongNetwork => "wrong_network",
            ErrorKind::ReadFailure => "read_failure",
            ErrorKind::SubmissionFailure => "submission_failure",
            ErrorKind::TransactionFailure => "transaction_failure",
            ErrorKind::NotConnected => "not_connected",
        }
    }
}

impl ClientError {
    /// The kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ClientError::WalletUnavailable(_) => ErrorKind::WalletUnavailable,
            ClientError::UserRejected(_) => ErrorKind::UserRejected,
            ClientError::WrongNetwork { .. } => ErrorKind::WrongNetwork,
            ClientError::ReadFailure(_) => ErrorKind::ReadFailure,
            ClientError::SubmissionFailure(_) => ErrorKind::SubmissionFailure,
            ClientError::TransactionFailure(_) => ErrorKind::TransactionFailure,
            ClientError::NotConnected => ErrorKind::NotConnected,
        }
    }

    /// Classify a failed write submission.
    ///
    /// A declined signing prompt is reported as `UserRejected`; everything
    /// else that stops a write before broadcast is a `SubmissionFailure`.
    pub fn from_submission(err: ProviderRpcError) -> Self {
        if err.is_user_rejection() {
            ClientError::UserRejected(err.message)
        } else {
            ClientError::SubmissionFailure(err.to_string())
        }
    }
}

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;
