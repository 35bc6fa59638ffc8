//! Wallet connection lifecycle.
//!
//! # Responsibilities
//! - Negotiate a session: switch network → request accounts → read chain
//! - Enforce the single required network
//! - React to account and network notifications
//! - Publish immutable session snapshots and lifecycle events
//!
//! # State Machine
//! ```text
//! Disconnected ──connect()──▶ Connecting ──ok──▶ Connected
//!       ▲                         │                  │
//!       └────────── error ────────┘                  │
//!       └──── empty accounts / wrong network ────────┘
//! ```
//!
//! Only one negotiation runs at a time. A connect that finishes after the
//! session was reset underneath it is discarded.

use alloy::primitives::Address;
use arc_swap::ArcSwap;
use serde_json::json;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;

use crate::config::loader::ConfigError;
use crate::config::schema::ClientConfig;
use crate::error::{ClientError, ClientResult, ErrorKind};
use crate::observability::metrics;
use crate::wallet::provider::{
    format_chain_id, parse_chain_id, request_as, ProviderRpcError, WalletEvent, WalletProvider,
};
use crate::wallet::session::{
    ChainId, ConnectionState, ContractHandles, SessionBinding, WalletSession,
};

/// Why a session was reset to disconnected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetReason {
    /// The wallet exposed an empty account set.
    AccountsEmptied,
    /// The wallet moved to a chain other than the required one.
    WrongNetwork(u64),
    /// A connect attempt failed.
    ConnectFailed(ErrorKind),
    /// The host asked to disconnect.
    Requested,
}

impl ResetReason {
    fn as_str(&self) -> &'static str {
        match self {
            ResetReason::AccountsEmptied => "accounts_emptied",
            ResetReason::WrongNetwork(_) => "wrong_network",
            ResetReason::ConnectFailed(_) => "connect_failed",
            ResetReason::Requested => "requested",
        }
    }
}

/// Lifecycle notifications published by the connector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectorEvent {
    Connected { address: Address, chain_id: ChainId },
    Disconnected(ResetReason),
    Failed(ErrorKind),
}

/// Result of a successful `connect()` call.
#[derive(Debug, Clone)]
pub enum ConnectOutcome {
    /// A new session was installed.
    Connected(Arc<WalletSession>),
    /// Another negotiation was already running; nothing was started.
    AlreadyConnecting,
    /// The negotiation finished but the session was reset meanwhile.
    Superseded,
}

/// A RAII guard over the "connection in progress" flag.
struct ConnectGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> ConnectGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for ConnectGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Owner and sole writer of the wallet session.
pub struct WalletConnector {
    provider: Option<Arc<dyn WalletProvider>>,
    required_chain: u64,
    contracts: ContractHandles,
    session: ArcSwap<WalletSession>,
    epoch: AtomicU64,
    connecting: AtomicBool,
    /// Set when the active account changes; the guard holder negotiates again.
    rerun: AtomicBool,
    last_error: Mutex<Option<ClientError>>,
    events: broadcast::Sender<ConnectorEvent>,
}

impl WalletConnector {
    /// Create a connector. `provider` is `None` when no wallet is present.
    pub fn new(
        provider: Option<Arc<dyn WalletProvider>>,
        config: &ClientConfig,
    ) -> Result<Self, ConfigError> {
        let contracts = ContractHandles::from_config(&config.contract)?;
        let (events, _) = broadcast::channel(32);

        if provider.is_none() {
            tracing::warn!("No wallet provider present; connect() will fail");
        }

        Ok(Self {
            provider,
            required_chain: config.network.chain_id,
            contracts,
            session: ArcSwap::from_pointee(WalletSession::disconnected(0)),
            epoch: AtomicU64::new(0),
            connecting: AtomicBool::new(false),
            rerun: AtomicBool::new(false),
            last_error: Mutex::new(None),
            events,
        })
    }

    /// The wallet provider, if one is present.
    pub fn provider(&self) -> Option<&Arc<dyn WalletProvider>> {
        self.provider.as_ref()
    }

    /// The network every session must be bound to.
    pub fn required_chain(&self) -> u64 {
        self.required_chain
    }

    /// Current session snapshot.
    pub fn session(&self) -> Arc<WalletSession> {
        self.session.load_full()
    }

    pub fn state(&self) -> ConnectionState {
        if self.connecting.load(Ordering::Acquire) {
            ConnectionState::Connecting
        } else if self.session.load().is_connected() {
            ConnectionState::Connected
        } else {
            ConnectionState::Disconnected
        }
    }

    /// The most recent connect failure, cleared by the next success.
    pub fn last_error(&self) -> Option<ClientError> {
        self.last_error.lock().ok().and_then(|guard| guard.clone())
    }

    /// Subscribe to lifecycle events.
    pub fn subscribe(&self) -> broadcast::Receiver<ConnectorEvent> {
        self.events.subscribe()
    }

    /// Negotiate a session with the wallet.
    ///
    /// Returns `AlreadyConnecting` without touching the wallet if a
    /// negotiation is in flight. If the active account changes while this
    /// call holds the negotiation, it negotiates again before returning.
    pub async fn connect(&self) -> ClientResult<ConnectOutcome> {
        loop {
            let Some(guard) = ConnectGuard::acquire(&self.connecting) else {
                tracing::debug!("Connect already in progress, not starting another");
                metrics::record_connect("coalesced");
                return Ok(ConnectOutcome::AlreadyConnecting);
            };

            self.rerun.store(false, Ordering::Release);
            let outcome = self.attempt().await;
            drop(guard);

            if !self.rerun.swap(false, Ordering::AcqRel) {
                return outcome;
            }
            tracing::info!("Active account changed during connect, negotiating again");
        }
    }

    async fn attempt(&self) -> ClientResult<ConnectOutcome> {
        let started = self.session.load_full();
        tracing::info!(required_chain = self.required_chain, "Connecting wallet");

        match self.negotiate().await {
            Ok(binding) => {
                let address = binding.account();
                let chain_id = binding.chain_id();
                let next = Arc::new(WalletSession::connected(self.next_epoch(), binding));
                let previous = self.session.compare_and_swap(&started, next.clone());

                if !Arc::ptr_eq(&*previous, &started) {
                    tracing::info!(%address, "Session changed during connect; discarding result");
                    metrics::record_connect("superseded");
                    return Ok(ConnectOutcome::Superseded);
                }

                self.set_last_error(None);
                tracing::info!(%address, chain_id = chain_id.0, "Wallet connected");
                metrics::record_connect("connected");
                let _ = self.events.send(ConnectorEvent::Connected { address, chain_id });
                Ok(ConnectOutcome::Connected(next))
            }
            Err(e) => {
                let kind = e.kind();
                tracing::warn!(error = %e, kind = kind.as_str(), "Wallet connection failed");
                metrics::record_connect(kind.as_str());
                self.set_last_error(Some(e.clone()));
                self.reset(ResetReason::ConnectFailed(kind));
                let _ = self.events.send(ConnectorEvent::Failed(kind));
                Err(e)
            }
        }
    }

    /// Rebind a session the wallet has already authorized, without prompting.
    ///
    /// Runs `connect()` only if the wallet exposes accounts and sits on the
    /// required network.
    pub async fn resume(&self) -> ClientResult<Option<ConnectOutcome>> {
        let Some(provider) = self.provider.as_ref() else {
            return Ok(None);
        };

        let unavailable = |e: ProviderRpcError| {
            tracing::warn!(error = %e, "Reading existing wallet authorization failed");
            ClientError::WalletUnavailable(e.to_string())
        };
        let chain = provider
            .request("eth_chainId", json!([]))
            .await
            .map_err(unavailable)?;
        let accounts: Vec<Address> = request_as(provider.as_ref(), "eth_accounts", json!([]))
            .await
            .map_err(unavailable)?;

        let on_required = parse_chain_id(&chain) == Some(self.required_chain);
        if accounts.is_empty() || !on_required {
            tracing::debug!(
                accounts = accounts.len(),
                on_required_chain = on_required,
                "Existing wallet authorization not resumable"
            );
            return Ok(None);
        }

        self.connect().await.map(Some)
    }

    /// Drop the current session.
    pub fn disconnect(&self) {
        self.reset(ResetReason::Requested);
    }

    /// Apply a wallet notification.
    pub async fn handle_event(&self, event: WalletEvent) -> ClientResult<()> {
        match event {
            WalletEvent::AccountsChanged(accounts) if accounts.is_empty() => {
                self.reset(ResetReason::AccountsEmptied);
            }
            WalletEvent::AccountsChanged(accounts) => {
                tracing::info!(account = ?accounts.first(), "Active account changed, reconnecting");
                self.rerun.store(true, Ordering::Release);
                if self.connecting.load(Ordering::Acquire) {
                    self.invalidate_pending();
                }
                self.connect().await?;
            }
            WalletEvent::ChainChanged(chain_id) if chain_id != self.required_chain => {
                tracing::warn!(
                    chain_id,
                    required_chain = self.required_chain,
                    "Wallet switched to an unsupported network"
                );
                self.reset(ResetReason::WrongNetwork(chain_id));
            }
            WalletEvent::ChainChanged(chain_id) => {
                if self.session.load().is_connected() {
                    tracing::info!(chain_id, "Network changed, reconnecting");
                    self.connect().await?;
                }
            }
        }
        Ok(())
    }

    async fn negotiate(&self) -> ClientResult<SessionBinding> {
        let provider = self
            .provider
            .clone()
            .ok_or_else(|| ClientError::WalletUnavailable("no wallet provider present".to_string()))?;
        let expected = self.required_chain;

        provider
            .request(
                "wallet_switchEthereumChain",
                json!([{ "chainId": format_chain_id(expected) }]),
            )
            .await
            .map_err(|e| {
                if e.is_user_rejection() {
                    ClientError::UserRejected(e.message)
                } else {
                    tracing::debug!(error = %e, "Network switch failed");
                    ClientError::WrongNetwork {
                        expected,
                        actual: None,
                    }
                }
            })?;

        let accounts: Vec<Address> = request_as(provider.as_ref(), "eth_requestAccounts", json!([]))
            .await
            .map_err(|e| {
                if e.is_user_rejection() {
                    ClientError::UserRejected(e.message)
                } else {
                    ClientError::WalletUnavailable(e.to_string())
                }
            })?;
        let account = accounts
            .first()
            .copied()
            .ok_or_else(|| ClientError::WalletUnavailable("no accounts found".to_string()))?;

        let raw_chain = provider
            .request("eth_chainId", json!([]))
            .await
            .map_err(|e| ClientError::WalletUnavailable(e.to_string()))?;
        let chain_id = parse_chain_id(&raw_chain).ok_or_else(|| {
            ClientError::WalletUnavailable(format!("malformed chain id: {}", raw_chain))
        })?;

        if chain_id != expected {
            return Err(ClientError::WrongNetwork {
                expected,
                actual: Some(chain_id),
            });
        }

        Ok(SessionBinding::new(
            provider,
            account,
            ChainId(chain_id),
            self.contracts,
        ))
    }

    fn reset(&self, reason: ResetReason) {
        let next = Arc::new(WalletSession::disconnected(self.next_epoch()));
        let previous = self.session.swap(next);

        if previous.is_connected() {
            tracing::info!(reason = reason.as_str(), "Wallet session reset");
            metrics::record_session_reset(reason.as_str());
            let _ = self.events.send(ConnectorEvent::Disconnected(reason));
        }
    }

    /// Bump the session epoch so an in-flight negotiation cannot commit.
    fn invalidate_pending(&self) {
        self.session
            .rcu(|current| Arc::new(current.with_epoch(self.next_epoch())));
    }

    fn next_epoch(&self) -> u64 {
        self.epoch.fetch_add(1, Ordering::AcqRel) + 1
    }

    fn set_last_error(&self, error: Option<ClientError>) {
        if let Ok(mut guard) = self.last_error.lock() {
            *guard = error;
        }
    }
}

impl std::fmt::Debug for WalletConnector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalletConnector")
            .field("wallet_present", &self.provider.is_some())
            .field("required_chain", &self.required_chain)
            .field("state", &self.state())
            .finish()
    }
}
