//! Wallet session subsystem.
//!
//! # Data Flow
//! ```text
//! WalletProvider (browser wallet, LocalWallet, test double)
//!     → connector.rs (negotiate, enforce required network)
//!     → session.rs (immutable WalletSession snapshots)
//!     → consumed read-only by the gateway and the campaign board
//!
//! Wallet notifications:
//!     provider.rs (HandlerRegistry, Subscription guards)
//!     → watcher.rs (ordered pump into the connector)
//! ```

pub mod connector;
pub mod local;
pub mod provider;
pub mod session;
pub mod watcher;

pub use connector::{ConnectOutcome, ConnectorEvent, ResetReason, WalletConnector};
pub use local::LocalWallet;
pub use provider::{
    EventHandler, HandlerRegistry, ProviderRpcError, Subscription, SubscriptionId, WalletEvent,
    WalletEventKind, WalletProvider,
};
pub use session::{ChainId, ConnectionState, ContractHandles, SessionBinding, WalletSession};
pub use watcher::WalletWatcher;
