//! Write-path transaction tracking.
//!
//! # Data Flow
//! ```text
//! ContractGateway (submit)
//!     → pending.rs (PendingTransaction: hash + target + action)
//!     → orchestrator.rs (poll receipt until confirmed or reverted)
//!     → CrowdfundClient (reload campaigns on success only)
//! ```

pub mod orchestrator;
pub mod pending;

pub use orchestrator::{Confirmation, ConfirmationStatus, TransactionOrchestrator};
pub use pending::{PendingTransaction, TxAction};
