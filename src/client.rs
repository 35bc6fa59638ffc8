//! Crowdfunding client facade.
//!
//! # Responsibilities
//! - Wire the connector, gateway, board and orchestrator together
//! - Run the user flows: connect, load, launch, cancel, refund, claim,
//!   pledge, unpledge
//! - Reload the full campaign list after every confirmed write, and never
//!   after a failed one

use alloy::primitives::{Address, U256};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

use crate::campaigns::board::{CampaignBoard, CampaignSnapshot, LoadOutcome};
use crate::config::loader::ConfigError;
use crate::config::schema::ClientConfig;
use crate::config::validation::validate_config;
use crate::contract::gateway::ContractGateway;
use crate::contract::types::{Campaign, CampaignId, LaunchSchedule};
use crate::error::{ClientError, ClientResult};
use crate::status::engine::{derive_status, DerivedStatus};
use crate::transaction::orchestrator::{Confirmation, TransactionOrchestrator};
use crate::transaction::pending::PendingTransaction;
use crate::wallet::connector::{ConnectOutcome, ConnectorEvent, WalletConnector};
use crate::wallet::provider::WalletProvider;
use crate::wallet::watcher::WalletWatcher;

/// A campaign paired with its derived status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CampaignView {
    pub campaign: Campaign,
    pub status: DerivedStatus,
}

/// Background tasks started by [`CrowdfundClient::watch`].
///
/// Dropping it stops both the notification pump and the list sync.
pub struct ClientWatch {
    _wallet: WalletWatcher,
    sync: JoinHandle<()>,
}

impl Drop for ClientWatch {
    fn drop(&mut self) {
        self.sync.abort();
    }
}

/// Entry point for hosts embedding the crowdfunding client.
pub struct CrowdfundClient {
    config: ClientConfig,
    connector: Arc<WalletConnector>,
    gateway: Arc<ContractGateway>,
    board: Arc<CampaignBoard>,
    orchestrator: TransactionOrchestrator,
}

impl CrowdfundClient {
    /// Build a client. `provider` is `None` when no wallet is present.
    pub fn new(
        provider: Option<Arc<dyn WalletProvider>>,
        config: ClientConfig,
    ) -> Result<Self, ConfigError> {
        validate_config(&config).map_err(ConfigError::Validation)?;

        let connector = Arc::new(WalletConnector::new(provider, &config)?);
        let gateway = Arc::new(ContractGateway::new(&config.contract));
        let orchestrator = TransactionOrchestrator::new(&config.transactions);

        tracing::info!(
            network = %config.network.name,
            chain_id = config.network.chain_id,
            contract = %config.contract.address,
            "Crowdfund client initialized"
        );

        Ok(Self {
            config,
            connector,
            gateway,
            board: Arc::new(CampaignBoard::new()),
            orchestrator,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn connector(&self) -> &Arc<WalletConnector> {
        &self.connector
    }

    pub fn gateway(&self) -> &ContractGateway {
        &self.gateway
    }

    pub fn board(&self) -> &CampaignBoard {
        &self.board
    }

    /// Follow wallet notifications and keep the list in step with the
    /// session: reload on every new connection, clear on disconnect.
    ///
    /// Returns `None` when no wallet is present.
    pub fn watch(&self) -> Option<ClientWatch> {
        let mut events = self.connector.subscribe();
        let wallet = WalletWatcher::spawn(self.connector.clone())?;

        let connector = self.connector.clone();
        let gateway = self.gateway.clone();
        let board = self.board.clone();

        let sync = tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(ConnectorEvent::Connected { .. }) => {
                        if let Err(e) = board.reload(&gateway, &connector).await {
                            tracing::warn!(error = %e, "Campaign reload after connect failed");
                        }
                    }
                    Ok(ConnectorEvent::Disconnected(_)) => board.clear(),
                    Ok(ConnectorEvent::Failed(_)) => {}
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "Connector events lagged");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        });

        Some(ClientWatch {
            _wallet: wallet,
            sync,
        })
    }

    /// Connect the wallet and load the campaign list.
    ///
    /// Errors refer to the connection only. A failed first load is logged
    /// and leaves the list empty; retry it with `load_campaigns`.
    pub async fn connect(&self) -> ClientResult<ConnectOutcome> {
        let outcome = self.connector.connect().await?;
        if let ConnectOutcome::Connected(_) = outcome {
            self.load_after_connect().await;
        }
        Ok(outcome)
    }

    /// Resume an already authorized session without prompting.
    pub async fn resume(&self) -> ClientResult<Option<ConnectOutcome>> {
        let outcome = self.connector.resume().await?;
        if let Some(ConnectOutcome::Connected(_)) = outcome {
            self.load_after_connect().await;
        }
        Ok(outcome)
    }

    async fn load_after_connect(&self) {
        match self.load_campaigns().await {
            Ok(outcome) => tracing::debug!(?outcome, "Initial campaign load"),
            Err(e) => tracing::warn!(error = %e, "Initial campaign load failed"),
        }
    }

    /// Drop the session and the campaign list.
    pub fn disconnect(&self) {
        self.connector.disconnect();
        self.board.clear();
    }

    /// Re-read every campaign.
    pub async fn load_campaigns(&self) -> ClientResult<LoadOutcome> {
        self.board.reload(&self.gateway, &self.connector).await
    }

    /// The last committed campaign list.
    pub fn campaigns(&self) -> Arc<CampaignSnapshot> {
        self.board.snapshot()
    }

    /// The committed list with statuses derived at `now` for the connected
    /// account.
    pub fn campaign_views(&self, now: u64) -> Vec<CampaignView> {
        let caller = self.connector.session().address();
        self.board
            .snapshot()
            .campaigns
            .iter()
            .map(|campaign| CampaignView {
                campaign: campaign.clone(),
                status: derive_status(campaign, now, caller),
            })
            .collect()
    }

    /// Launch a campaign with explicit timestamps.
    pub async fn launch(&self, goal: &str, schedule: LaunchSchedule) -> ClientResult<Confirmation> {
        let session = self.connector.session();
        let pending = self
            .gateway
            .launch(&session, goal, schedule.start_at, schedule.end_at)
            .await?;
        self.confirm(pending).await
    }

    /// Launch a campaign starting `start_in_days` from now and lasting
    /// `duration_days`.
    pub async fn launch_in(
        &self,
        goal: &str,
        start_in_days: u64,
        duration_days: u64,
    ) -> ClientResult<Confirmation> {
        let schedule = LaunchSchedule::from_offsets(
            unix_now(),
            start_in_days,
            duration_days,
            self.config.campaigns.max_duration_days,
        )?;
        self.launch(goal, schedule).await
    }

    pub async fn cancel(&self, id: CampaignId) -> ClientResult<Confirmation> {
        let session = self.connector.session();
        let pending = self.gateway.cancel(&session, id).await?;
        self.confirm(pending).await
    }

    pub async fn refund(&self, id: CampaignId) -> ClientResult<Confirmation> {
        let session = self.connector.session();
        let pending = self.gateway.refund(&session, id).await?;
        self.confirm(pending).await
    }

    pub async fn claim(&self, id: CampaignId) -> ClientResult<Confirmation> {
        let session = self.connector.session();
        let pending = self.gateway.claim(&session, id).await?;
        self.confirm(pending).await
    }

    pub async fn pledge(&self, id: CampaignId, amount: &str) -> ClientResult<Confirmation> {
        let session = self.connector.session();
        let pending = self.gateway.pledge(&session, id, amount).await?;
        self.confirm(pending).await
    }

    pub async fn unpledge(&self, id: CampaignId, amount: &str) -> ClientResult<Confirmation> {
        let session = self.connector.session();
        let pending = self.gateway.unpledge(&session, id, amount).await?;
        self.confirm(pending).await
    }

    /// Approve the crowdfunding contract to move `amount` tokens.
    pub async fn approve_tokens(&self, amount: &str) -> ClientResult<Confirmation> {
        let session = self.connector.session();
        let spender = session.binding()?.contracts().crowdfund;
        let pending = self.gateway.approve_tokens(&session, spender, amount).await?;
        self.confirm(pending).await
    }

    /// The connected account's contribution to a campaign.
    pub async fn my_pledge(&self, id: CampaignId) -> ClientResult<U256> {
        let session = self.connector.session();
        let account = session.address().ok_or(ClientError::NotConnected)?;
        self.gateway.pledged_amount(&session, id, account).await
    }

    /// Any account's contribution to a campaign.
    pub async fn pledged_amount(&self, id: CampaignId, account: Address) -> ClientResult<U256> {
        let session = self.connector.session();
        self.gateway.pledged_amount(&session, id, account).await
    }

    async fn confirm(&self, pending: PendingTransaction) -> ClientResult<Confirmation> {
        let confirmation = self.orchestrator.run(pending).await?;

        // The write itself succeeded; a failed reload only leaves the old list.
        match self.load_campaigns().await {
            Ok(outcome) => {
                tracing::debug!(action = confirmation.action.as_str(), ?outcome, "Post-transaction reload")
            }
            Err(e) => {
                tracing::warn!(action = confirmation.action.as_str(), error = %e, "Post-transaction reload failed")
            }
        }

        Ok(confirmation)
    }
}

impl std::fmt::Debug for CrowdfundClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CrowdfundClient")
            .field("connector", &self.connector)
            .field("campaigns", &self.board.snapshot().len())
            .finish()
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or_default()
}
