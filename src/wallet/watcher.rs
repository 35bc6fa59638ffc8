//! Wallet notification pump.
//!
//! Subscribes to account and network notifications and feeds them, in
//! order, to [`WalletConnector::handle_event`] on a background task. Both
//! subscriptions are released when the watcher is dropped.

use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::wallet::connector::WalletConnector;
use crate::wallet::provider::{EventHandler, Subscription, WalletEvent, WalletEventKind};

/// Keeps the connector in sync with wallet-originated notifications.
pub struct WalletWatcher {
    _accounts: Subscription,
    _chain: Subscription,
    task: JoinHandle<()>,
}

impl WalletWatcher {
    /// Start watching. Returns `None` when no wallet is present.
    pub fn spawn(connector: Arc<WalletConnector>) -> Option<Self> {
        let provider = connector.provider()?.clone();
        let (tx, mut rx) = mpsc::unbounded_channel::<WalletEvent>();

        let handler: EventHandler = Arc::new(move |event: &WalletEvent| {
            let _ = tx.send(event.clone());
        });

        let accounts = Subscription::new(
            provider.clone(),
            WalletEventKind::AccountsChanged,
            handler.clone(),
        );
        let chain = Subscription::new(provider, WalletEventKind::ChainChanged, handler);

        let task = tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                tracing::debug!(?event, "Wallet notification received");
                if let Err(e) = connector.handle_event(event).await {
                    tracing::warn!(error = %e, "Failed to apply wallet notification");
                }
            }
            tracing::debug!("Wallet watcher stopped");
        });

        tracing::info!("Wallet watcher started");
        Some(Self {
            _accounts: accounts,
            _chain: chain,
            task,
        })
    }

    /// Stop watching and release both subscriptions.
    pub fn shutdown(self) {
        drop(self);
    }
}

impl Drop for WalletWatcher {
    fn drop(&mut self) {
        self.task.abort();
    }
}
