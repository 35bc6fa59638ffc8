//! Wallet provider interface.
//!
//! # Responsibilities
//! - Abstract an EIP-1193 style wallet: JSON-RPC `request` plus
//!   account/network change notifications
//! - Keep notification handlers in a registry keyed by subscription id
//! - Release handlers through an RAII [`Subscription`] guard

use alloy::primitives::Address;
use dashmap::DashMap;
use futures_util::future::BoxFuture;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use thiserror::Error;

/// EIP-1193: the user rejected the request.
pub const USER_REJECTED: i64 = 4001;
/// EIP-1193: the requested chain has not been added to the wallet.
pub const UNRECOGNIZED_CHAIN: i64 = 4902;
/// JSON-RPC internal error, used for malformed responses.
pub const INTERNAL_ERROR: i64 = -32603;

/// Error returned by a wallet JSON-RPC request.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("wallet RPC error {code}: {message}")]
pub struct ProviderRpcError {
    pub code: i64,
    pub message: String,
}

impl ProviderRpcError {
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn user_rejected() -> Self {
        Self::new(USER_REJECTED, "User rejected the request.")
    }

    pub fn is_user_rejection(&self) -> bool {
        self.code == USER_REJECTED
    }
}

/// The two notification streams a wallet exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WalletEventKind {
    AccountsChanged,
    ChainChanged,
}

/// A wallet-originated notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalletEvent {
    /// The set of exposed accounts changed; empty means disconnected.
    AccountsChanged(Vec<Address>),
    /// The wallet switched to another chain.
    ChainChanged(u64),
}

impl WalletEvent {
    pub fn kind(&self) -> WalletEventKind {
        match self {
            WalletEvent::AccountsChanged(_) => WalletEventKind::AccountsChanged,
            WalletEvent::ChainChanged(_) => WalletEventKind::ChainChanged,
        }
    }
}

/// Callback invoked for each matching notification.
pub type EventHandler = Arc<dyn Fn(&WalletEvent) + Send + Sync>;

/// Token returned by [`WalletProvider::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

/// A browser-style wallet: the only way the client reaches the chain.
pub trait WalletProvider: Send + Sync {
    /// Issue a JSON-RPC request through the wallet.
    fn request<'a>(
        &'a self,
        method: &'a str,
        params: Value,
    ) -> BoxFuture<'a, Result<Value, ProviderRpcError>>;

    /// Register a notification handler.
    fn subscribe(&self, kind: WalletEventKind, handler: EventHandler) -> SubscriptionId;

    /// Remove a notification handler. Returns false if it was not registered.
    fn unsubscribe(&self, id: SubscriptionId) -> bool;
}

/// Issue a request and deserialize its result.
pub async fn request_as<T: DeserializeOwned>(
    provider: &dyn WalletProvider,
    method: &str,
    params: Value,
) -> Result<T, ProviderRpcError> {
    let value = provider.request(method, params).await?;
    serde_json::from_value(value).map_err(|e| {
        ProviderRpcError::new(INTERNAL_ERROR, format!("malformed {} response: {}", method, e))
    })
}

/// Parse a chain id as wallets report it: a hex quantity string or a number.
pub fn parse_chain_id(value: &Value) -> Option<u64> {
    match value {
        Value::String(s) => {
            let digits = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X"))?;
            u64::from_str_radix(digits, 16).ok()
        }
        Value::Number(n) => n.as_u64(),
        _ => None,
    }
}

/// Format a chain id as the hex quantity wallets expect.
pub fn format_chain_id(chain_id: u64) -> String {
    format!("0x{:x}", chain_id)
}

/// Handler storage for [`WalletProvider`] implementations.
#[derive(Default)]
pub struct HandlerRegistry {
    next_id: AtomicU64,
    handlers: DashMap<u64, (WalletEventKind, EventHandler)>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, kind: WalletEventKind, handler: EventHandler) -> SubscriptionId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.handlers.insert(id, (kind, handler));
        SubscriptionId(id)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.handlers.remove(&id.0).is_some()
    }

    /// Deliver an event to every handler registered for its kind.
    ///
    /// Handlers are collected before being called so a handler may
    /// unsubscribe without deadlocking the map.
    pub fn emit(&self, event: &WalletEvent) -> usize {
        let kind = event.kind();
        let matching: Vec<EventHandler> = self
            .handlers
            .iter()
            .filter(|entry| entry.value().0 == kind)
            .map(|entry| entry.value().1.clone())
            .collect();

        for handler in &matching {
            handler(event);
        }
        matching.len()
    }

    /// Number of live handlers.
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

/// A RAII guard that unsubscribes its handler when dropped.
pub struct Subscription {
    provider: Arc<dyn WalletProvider>,
    id: SubscriptionId,
    kind: WalletEventKind,
}

impl Subscription {
    /// Register `handler` for `kind` on `provider`.
    pub fn new(
        provider: Arc<dyn WalletProvider>,
        kind: WalletEventKind,
        handler: EventHandler,
    ) -> Self {
        let id = provider.subscribe(kind, handler);
        tracing::debug!(subscription = id.0, kind = ?kind, "Wallet subscription registered");
        Self { provider, id, kind }
    }

    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    pub fn kind(&self) -> WalletEventKind {
        self.kind
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .finish()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if self.provider.unsubscribe(self.id) {
            tracing::debug!(subscription = self.id.0, kind = ?self.kind, "Wallet subscription released");
        }
    }
}
