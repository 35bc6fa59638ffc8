//! Transaction confirmation monitoring.
//!
//! # Responsibilities
//! - Poll the wallet for the receipt of a submitted transaction
//! - Report success once included with the configured depth
//! - Report reverts and failed waits as `TransactionFailure`
//!
//! There is no timeout, retry or replacement handling: a transaction that
//! never lands leaves `run` pending.

use alloy::primitives::{Address, Bytes, TxHash, B256, U64};
use alloy::sol_types::SolEvent;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tokio::time::interval;

use crate::config::schema::TransactionConfig;
use crate::contract::bindings::ICrowdFund;
use crate::contract::types::CampaignId;
use crate::error::{ClientError, ClientResult};
use crate::observability::metrics;
use crate::transaction::pending::{PendingTransaction, TxAction};
use crate::wallet::provider::request_as;

/// Transaction confirmation status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmationStatus {
    /// Not yet included in a block.
    Pending,
    /// Included but not deep enough.
    Confirming { current: u32, required: u32 },
    /// Included with the required depth.
    Confirmed { block_number: u64 },
    /// Included and reverted.
    Reverted,
}

/// A transaction that has been confirmed on-chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Confirmation {
    pub tx_hash: TxHash,
    pub block_number: u64,
    pub action: TxAction,
    /// Campaign the action targeted, or the id a launch was assigned.
    pub campaign: Option<CampaignId>,
}

#[derive(Debug, Deserialize)]
struct ReceiptLog {
    address: Address,
    topics: Vec<B256>,
    data: Bytes,
}

/// The receipt fields the orchestrator needs.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReceiptSummary {
    block_number: Option<U64>,
    status: Option<U64>,
    #[serde(default)]
    logs: Vec<ReceiptLog>,
}

impl ReceiptSummary {
    fn succeeded(&self) -> bool {
        // Pre-Byzantium receipts carry no status field.
        self.status.map_or(true, |status| status == U64::from(1))
    }

    fn launched_campaign(&self, contract: Address) -> Option<CampaignId> {
        self.logs
            .iter()
            .filter(|log| log.address == contract)
            .filter(|log| log.topics.first() == Some(&ICrowdFund::Launch::SIGNATURE_HASH))
            .find_map(|log| {
                ICrowdFund::Launch::decode_raw_log(log.topics.iter().copied(), &log.data).ok()
            })
            .and_then(|launch| CampaignId::try_from(launch.id).ok())
    }
}

/// Drives submitted transactions to a final outcome.
#[derive(Debug, Clone)]
pub struct TransactionOrchestrator {
    poll_interval: Duration,
    confirmations: u32,
}

impl TransactionOrchestrator {
    pub fn new(config: &TransactionConfig) -> Self {
        Self {
            poll_interval: Duration::from_millis(config.receipt_poll_interval_ms.max(1)),
            confirmations: config.confirmations.max(1),
        }
    }

    /// Wait for `pending` to be confirmed.
    pub async fn run(&self, pending: PendingTransaction) -> ClientResult<Confirmation> {
        let tx_hash = pending.tx_hash();
        let action = pending.action();
        let mut ticker = interval(self.poll_interval);

        loop {
            ticker.tick().await;

            match self.inspect(&pending).await {
                Ok((ConfirmationStatus::Confirmed { block_number }, launched)) => {
                    tracing::info!(action = action.as_str(), %tx_hash, block_number, "Transaction confirmed");
                    metrics::record_transaction(action.as_str(), "confirmed");
                    return Ok(Confirmation {
                        tx_hash,
                        block_number,
                        action,
                        campaign: pending.campaign().or(launched),
                    });
                }
                Ok((ConfirmationStatus::Reverted, _)) => {
                    tracing::warn!(action = action.as_str(), %tx_hash, "Transaction reverted");
                    metrics::record_transaction(action.as_str(), "reverted");
                    return Err(ClientError::TransactionFailure(format!(
                        "{} transaction {} reverted",
                        action, tx_hash
                    )));
                }
                Ok((ConfirmationStatus::Confirming { current, required }, _)) => {
                    tracing::debug!(%tx_hash, confirmations = current, required, "Waiting for confirmations");
                }
                Ok((ConfirmationStatus::Pending, _)) => {
                    tracing::debug!(%tx_hash, "Transaction pending");
                }
                Err(e) => {
                    tracing::warn!(action = action.as_str(), %tx_hash, error = %e, "Confirmation wait failed");
                    metrics::record_transaction(action.as_str(), "wait_failed");
                    return Err(e);
                }
            }
        }
    }

    /// Check the current status of `pending` once.
    pub async fn poll(&self, pending: &PendingTransaction) -> ClientResult<ConfirmationStatus> {
        self.inspect(pending).await.map(|(status, _)| status)
    }

    /// Status plus the campaign id a confirmed launch was assigned.
    async fn inspect(
        &self,
        pending: &PendingTransaction,
    ) -> ClientResult<(ConfirmationStatus, Option<CampaignId>)> {
        let Some(receipt) = self.receipt(pending).await? else {
            return Ok((ConfirmationStatus::Pending, None));
        };

        if !receipt.succeeded() {
            return Ok((ConfirmationStatus::Reverted, None));
        }

        let Some(tx_block) = receipt.block_number.map(|b| b.to::<u64>()) else {
            return Ok((ConfirmationStatus::Pending, None));
        };

        let launched = match pending.action() {
            TxAction::Launch => receipt.launched_campaign(pending.to()),
            _ => None,
        };
        let confirmed = (
            ConfirmationStatus::Confirmed {
                block_number: tx_block,
            },
            launched,
        );

        if self.confirmations == 1 {
            return Ok(confirmed);
        }

        let current_block: U64 = request_as(pending.provider(), "eth_blockNumber", json!([]))
            .await
            .map_err(|e| wait_failure(pending, e))?;
        let depth = current_block
            .to::<u64>()
            .saturating_sub(tx_block)
            .saturating_add(1);
        let depth = u32::try_from(depth).unwrap_or(u32::MAX);

        if depth >= self.confirmations {
            Ok(confirmed)
        } else {
            Ok((
                ConfirmationStatus::Confirming {
                    current: depth,
                    required: self.confirmations,
                },
                None,
            ))
        }
    }

    async fn receipt(&self, pending: &PendingTransaction) -> ClientResult<Option<ReceiptSummary>> {
        request_as(
            pending.provider(),
            "eth_getTransactionReceipt",
            json!([pending.tx_hash()]),
        )
        .await
        .map_err(|e| wait_failure(pending, e))
    }
}

fn wait_failure(pending: &PendingTransaction, err: impl std::fmt::Display) -> ClientError {
    ClientError::TransactionFailure(format!(
        "waiting for {} transaction {} failed: {}",
        pending.action(),
        pending.tx_hash(),
        err
    ))
}
