//! The current campaign list.
//!
//! # Responsibilities
//! - Hold the last successfully read campaign list
//! - Allow at most one read pass at a time
//! - Replace the list wholesale, and only with a complete pass
//! - Discard a pass whose session was replaced while it ran

use alloy::primitives::Address;
use arc_swap::ArcSwap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::contract::gateway::ContractGateway;
use crate::contract::types::{Campaign, CampaignId};
use crate::error::ClientResult;
use crate::observability::metrics;
use crate::wallet::connector::WalletConnector;

/// A complete campaign list from a single read pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CampaignSnapshot {
    /// Epoch of the session the list was read with.
    pub session_epoch: u64,
    /// Account the list was read for.
    pub account: Option<Address>,
    /// Live campaigns in ascending id order.
    pub campaigns: Vec<Campaign>,
}

impl CampaignSnapshot {
    pub fn get(&self, id: CampaignId) -> Option<&Campaign> {
        self.campaigns
            .binary_search_by_key(&id, |campaign| campaign.id)
            .ok()
            .map(|index| &self.campaigns[index])
    }

    pub fn len(&self) -> usize {
        self.campaigns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.campaigns.is_empty()
    }
}

/// Result of a `reload()` call that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// A new list with this many campaigns replaced the previous one.
    Committed(usize),
    /// Another load was in flight; nothing was read.
    Skipped,
    /// The session changed during the read; the result was discarded.
    Stale,
}

/// A RAII guard over the "load in progress" flag.
struct LoadGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> LoadGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for LoadGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Single-writer, many-reader holder of the campaign list.
#[derive(Debug, Default)]
pub struct CampaignBoard {
    current: ArcSwap<CampaignSnapshot>,
    loading: AtomicBool,
}

impl CampaignBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// The last committed list.
    pub fn snapshot(&self) -> Arc<CampaignSnapshot> {
        self.current.load_full()
    }

    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::Acquire)
    }

    /// Drop the committed list.
    pub fn clear(&self) {
        self.current.store(Arc::new(CampaignSnapshot::default()));
        metrics::record_campaigns_listed(0);
    }

    /// Read every campaign with the connector's current session and commit
    /// the result.
    ///
    /// On error the previously committed list is left untouched.
    pub async fn reload(
        &self,
        gateway: &ContractGateway,
        connector: &WalletConnector,
    ) -> ClientResult<LoadOutcome> {
        let Some(_guard) = LoadGuard::acquire(&self.loading) else {
            tracing::debug!("Campaign load already in flight, skipping");
            metrics::record_campaign_load("skipped");
            return Ok(LoadOutcome::Skipped);
        };

        let mut reread = false;
        let (session, campaigns) = loop {
            let session = connector.session();
            tracing::debug!(epoch = session.epoch(), "Loading campaigns");

            let campaigns = match gateway.fetch_campaigns(&session).await {
                Ok(campaigns) => campaigns,
                Err(e) => {
                    tracing::warn!(error = %e, "Campaign load failed; keeping previous list");
                    metrics::record_campaign_load("failed");
                    return Err(e);
                }
            };

            let current = connector.session();
            if current.epoch() == session.epoch() {
                break (session, campaigns);
            }
            // One re-read for the new session; a competing reload was skipped.
            if !reread && current.is_connected() {
                tracing::info!(
                    epoch = current.epoch(),
                    "Session changed during campaign load; reading again"
                );
                reread = true;
                continue;
            }

            tracing::info!(
                epoch = session.epoch(),
                "Session changed during campaign load; discarding result"
            );
            metrics::record_campaign_load("stale");
            return Ok(LoadOutcome::Stale);
        };

        let count = campaigns.len();
        self.current.store(Arc::new(CampaignSnapshot {
            session_epoch: session.epoch(),
            account: session.address(),
            campaigns,
        }));

        tracing::info!(count, "Campaign list replaced");
        metrics::record_campaign_load("committed");
        metrics::record_campaigns_listed(count);
        Ok(LoadOutcome::Committed(count))
    }
}
