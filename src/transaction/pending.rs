//! Handles for submitted, not yet confirmed transactions.

use alloy::primitives::{Address, TxHash};
use std::fmt;
use std::sync::Arc;

use crate::contract::types::CampaignId;
use crate::wallet::provider::WalletProvider;

/// The contract operation a transaction performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TxAction {
    Launch,
    Cancel,
    Pledge,
    Unpledge,
    Claim,
    Refund,
    Approve,
}

impl TxAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            TxAction::Launch => "launch",
            TxAction::Cancel => "cancel",
            TxAction::Pledge => "pledge",
            TxAction::Unpledge => "unpledge",
            TxAction::Claim => "claim",
            TxAction::Refund => "refund",
            TxAction::Approve => "approve",
        }
    }
}

impl fmt::Display for TxAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A broadcast transaction, driven to completion by the orchestrator.
#[derive(Clone)]
pub struct PendingTransaction {
    provider: Arc<dyn WalletProvider>,
    tx_hash: TxHash,
    to: Address,
    action: TxAction,
    campaign: Option<CampaignId>,
}

impl PendingTransaction {
    pub fn new(
        provider: Arc<dyn WalletProvider>,
        tx_hash: TxHash,
        to: Address,
        action: TxAction,
        campaign: Option<CampaignId>,
    ) -> Self {
        Self {
            provider,
            tx_hash,
            to,
            action,
            campaign,
        }
    }

    pub fn tx_hash(&self) -> TxHash {
        self.tx_hash
    }

    /// Contract the transaction was sent to.
    pub fn to(&self) -> Address {
        self.to
    }

    pub fn action(&self) -> TxAction {
        self.action
    }

    /// Campaign the action targets; `None` for launches and approvals.
    pub fn campaign(&self) -> Option<CampaignId> {
        self.campaign
    }

    pub(crate) fn provider(&self) -> &dyn WalletProvider {
        self.provider.as_ref()
    }
}

impl fmt::Debug for PendingTransaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingTransaction")
            .field("tx_hash", &self.tx_hash)
            .field("to", &self.to)
            .field("action", &self.action)
            .field("campaign", &self.campaign)
            .finish()
    }
}
