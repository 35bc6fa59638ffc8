//! Stateless façade over the crowdfunding contract.
//!
//! # Responsibilities
//! - Encode calls with the `sol!` bindings and route them through the
//!   session's wallet (`eth_call` / `eth_sendTransaction`)
//! - Convert decimal amount strings to base units before submission
//! - Rebuild `Campaign` values from raw slots
//!
//! Submissions return as soon as the wallet hands back a transaction hash;
//! waiting for confirmation is the orchestrator's job.

use alloy::primitives::{Address, Bytes, TxHash, U256};
use alloy::sol_types::SolCall;
use serde_json::json;

use crate::config::schema::ContractConfig;
use crate::contract::bindings::{ICrowdFund, IERC20};
use crate::contract::types::{Campaign, CampaignId, LaunchSchedule};
use crate::contract::units::parse_amount;
use crate::error::{ClientError, ClientResult};
use crate::observability::metrics;
use crate::transaction::pending::{PendingTransaction, TxAction};
use crate::wallet::provider::request_as;
use crate::wallet::session::{SessionBinding, WalletSession};

/// Read and write operations against the crowdfunding contract.
#[derive(Debug, Clone)]
pub struct ContractGateway {
    decimals: u8,
}

impl ContractGateway {
    pub fn new(config: &ContractConfig) -> Self {
        Self {
            decimals: config.amount_decimals,
        }
    }

    /// Decimals used to convert amount strings.
    pub fn decimals(&self) -> u8 {
        self.decimals
    }

    /// Total number of campaign slots ever allocated.
    pub async fn campaign_count(&self, session: &WalletSession) -> ClientResult<u64> {
        let binding = session.binding()?;
        self.count(binding).await
    }

    /// Read every live campaign, in ascending id order.
    ///
    /// Reads are sequential. Any failure aborts the whole pass; nothing
    /// read so far is returned.
    pub async fn fetch_campaigns(&self, session: &WalletSession) -> ClientResult<Vec<Campaign>> {
        let binding = session.binding()?;
        let count = self.count(binding).await?;

        let mut campaigns = Vec::new();
        for id in 1..=count {
            if let Some(campaign) = self.slot(binding, CampaignId(id)).await? {
                campaigns.push(campaign);
            }
        }

        tracing::debug!(
            slots = count,
            live = campaigns.len(),
            "Campaign read pass complete"
        );
        Ok(campaigns)
    }

    /// Read a single campaign; `None` if the slot was cancelled.
    pub async fn campaign(
        &self,
        session: &WalletSession,
        id: CampaignId,
    ) -> ClientResult<Option<Campaign>> {
        let binding = session.binding()?;
        self.slot(binding, id).await
    }

    /// An account's contribution to a campaign.
    pub async fn pledged_amount(
        &self,
        session: &WalletSession,
        id: CampaignId,
        account: Address,
    ) -> ClientResult<U256> {
        let binding = session.binding()?;
        let call = ICrowdFund::pledgedAmountCall {
            id: id.into(),
            account,
        };
        self.call(binding, binding.contracts().crowdfund, call).await
    }

    /// Launch a campaign with a goal given as a decimal string.
    pub async fn launch(
        &self,
        session: &WalletSession,
        goal: &str,
        start_at: u64,
        end_at: u64,
    ) -> ClientResult<PendingTransaction> {
        let binding = session.binding()?;
        let goal = parse_amount(goal, self.decimals)?;
        let schedule = LaunchSchedule::new(start_at, end_at)?;
        let (start_at, end_at) = schedule.as_u32();

        let call = ICrowdFund::launchCall {
            goal,
            startAt: start_at,
            endAt: end_at,
        };
        self.submit(binding, binding.contracts().crowdfund, call, TxAction::Launch, None)
            .await
    }

    /// Cancel a campaign that has not started.
    pub async fn cancel(
        &self,
        session: &WalletSession,
        id: CampaignId,
    ) -> ClientResult<PendingTransaction> {
        let binding = session.binding()?;
        let call = ICrowdFund::cancelCall { id: id.into() };
        self.submit(binding, binding.contracts().crowdfund, call, TxAction::Cancel, Some(id))
            .await
    }

    /// Withdraw the caller's contribution from a failed campaign.
    pub async fn refund(
        &self,
        session: &WalletSession,
        id: CampaignId,
    ) -> ClientResult<PendingTransaction> {
        let binding = session.binding()?;
        let call = ICrowdFund::refundCall { id: id.into() };
        self.submit(binding, binding.contracts().crowdfund, call, TxAction::Refund, Some(id))
            .await
    }

    /// Withdraw the funds of a successful campaign (creator only).
    pub async fn claim(
        &self,
        session: &WalletSession,
        id: CampaignId,
    ) -> ClientResult<PendingTransaction> {
        let binding = session.binding()?;
        let call = ICrowdFund::claimCall { id: id.into() };
        self.submit(binding, binding.contracts().crowdfund, call, TxAction::Claim, Some(id))
            .await
    }

    /// Contribute to a running campaign.
    pub async fn pledge(
        &self,
        session: &WalletSession,
        id: CampaignId,
        amount: &str,
    ) -> ClientResult<PendingTransaction> {
        let binding = session.binding()?;
        let amount = parse_amount(amount, self.decimals)?;
        let call = ICrowdFund::pledgeCall {
            id: id.into(),
            amount,
        };
        self.submit(binding, binding.contracts().crowdfund, call, TxAction::Pledge, Some(id))
            .await
    }

    /// Withdraw part of a contribution before the campaign ends.
    pub async fn unpledge(
        &self,
        session: &WalletSession,
        id: CampaignId,
        amount: &str,
    ) -> ClientResult<PendingTransaction> {
        let binding = session.binding()?;
        let amount = parse_amount(amount, self.decimals)?;
        let call = ICrowdFund::unpledgeCall {
            id: id.into(),
            amount,
        };
        self.submit(binding, binding.contracts().crowdfund, call, TxAction::Unpledge, Some(id))
            .await
    }

    /// Allow `spender` (normally the crowdfunding contract) to move tokens.
    pub async fn approve_tokens(
        &self,
        session: &WalletSession,
        spender: Address,
        amount: &str,
    ) -> ClientResult<PendingTransaction> {
        let binding = session.binding()?;
        let token = binding.contracts().token.ok_or_else(|| {
            ClientError::SubmissionFailure("no token contract configured".to_string())
        })?;
        let amount = parse_amount(amount, self.decimals)?;
        let call = IERC20::approveCall { spender, amount };
        self.submit(binding, token, call, TxAction::Approve, None).await
    }

    async fn count(&self, binding: &SessionBinding) -> ClientResult<u64> {
        let count = self
            .call(binding, binding.contracts().crowdfund, ICrowdFund::countCall {})
            .await?;
        u64::try_from(count)
            .map_err(|_| ClientError::ReadFailure(format!("campaign count {} out of range", count)))
    }

    async fn slot(&self, binding: &SessionBinding, id: CampaignId) -> ClientResult<Option<Campaign>> {
        let call = ICrowdFund::campaignsCall { id: id.into() };
        let slot = self.call(binding, binding.contracts().crowdfund, call).await?;
        Ok(Campaign::from_slot(id, slot))
    }

    async fn call<C: SolCall>(
        &self,
        binding: &SessionBinding,
        to: Address,
        call: C,
    ) -> ClientResult<C::Return> {
        let params = json!([
            {
                "from": binding.account(),
                "to": to,
                "data": Bytes::from(call.abi_encode()),
            },
            "latest"
        ]);

        let output: Bytes = request_as(binding.provider().as_ref(), "eth_call", params)
            .await
            .map_err(|e| {
                tracing::warn!(call = C::SIGNATURE, error = %e, "Contract read failed");
                ClientError::ReadFailure(format!("{}: {}", C::SIGNATURE, e))
            })?;

        C::abi_decode_returns(&output).map_err(|e| {
            tracing::warn!(call = C::SIGNATURE, error = %e, "Undecodable contract response");
            ClientError::ReadFailure(format!("{}: undecodable response: {}", C::SIGNATURE, e))
        })
    }

    async fn submit<C: SolCall>(
        &self,
        binding: &SessionBinding,
        to: Address,
        call: C,
        action: TxAction,
        campaign: Option<CampaignId>,
    ) -> ClientResult<PendingTransaction> {
        let params = json!([{
            "from": binding.account(),
            "to": to,
            "data": Bytes::from(call.abi_encode()),
        }]);

        let tx_hash: TxHash =
            request_as(binding.provider().as_ref(), "eth_sendTransaction", params)
                .await
                .map_err(|e| {
                    tracing::warn!(action = action.as_str(), error = %e, "Transaction submission failed");
                    let err = ClientError::from_submission(e);
                    metrics::record_transaction(action.as_str(), err.kind().as_str());
                    err
                })?;

        tracing::info!(
            action = action.as_str(),
            campaign = ?campaign,
            %tx_hash,
            "Transaction submitted"
        );

        Ok(PendingTransaction::new(
            binding.provider().clone(),
            tx_hash,
            to,
            action,
            campaign,
        ))
    }
}
