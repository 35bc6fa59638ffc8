//! Wallet session values.
//!
//! A session is never mutated: the connector builds a new one for every
//! connect, reset and network change and swaps it in whole. Readers hold
//! `Arc<WalletSession>` snapshots.

use alloy::primitives::Address;
use std::fmt;
use std::sync::Arc;

use crate::config::loader::ConfigError;
use crate::config::schema::ContractConfig;
use crate::config::validation::ValidationError;
use crate::error::{ClientError, ClientResult};
use crate::wallet::provider::WalletProvider;

/// Chain ID type for strong typing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChainId(pub u64);

impl From<u64> for ChainId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl From<ChainId> for u64 {
    fn from(id: ChainId) -> Self {
        id.0
    }
}

/// Where the connector sits in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

/// Contract addresses a connected session talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContractHandles {
    /// The crowdfunding contract.
    pub crowdfund: Address,
    /// The ERC-20 token campaigns are denominated in, if configured.
    pub token: Option<Address>,
}

impl ContractHandles {
    pub fn new(crowdfund: Address, token: Option<Address>) -> Self {
        Self { crowdfund, token }
    }

    /// Resolve contract addresses from configuration.
    pub fn from_config(config: &ContractConfig) -> Result<Self, ConfigError> {
        let crowdfund = config.address.parse::<Address>().map_err(|e| {
            ConfigError::Validation(vec![ValidationError {
                field: "contract.address",
                message: format!("invalid address '{}': {}", config.address, e),
            }])
        })?;

        let token = match &config.token_address {
            Some(raw) => Some(raw.parse::<Address>().map_err(|e| {
                ConfigError::Validation(vec![ValidationError {
                    field: "contract.token_address",
                    message: format!("invalid address '{}': {}", raw, e),
                }])
            })?),
            None => None,
        };

        Ok(Self { crowdfund, token })
    }
}

/// Everything a connected session is bound to.
#[derive(Clone)]
pub struct SessionBinding {
    provider: Arc<dyn WalletProvider>,
    account: Address,
    chain_id: ChainId,
    contracts: ContractHandles,
}

impl SessionBinding {
    pub fn new(
        provider: Arc<dyn WalletProvider>,
        account: Address,
        chain_id: ChainId,
        contracts: ContractHandles,
    ) -> Self {
        Self {
            provider,
            account,
            chain_id,
            contracts,
        }
    }

    /// The wallet every read and write goes through.
    pub fn provider(&self) -> &Arc<dyn WalletProvider> {
        &self.provider
    }

    /// The signing account.
    pub fn account(&self) -> Address {
        self.account
    }

    pub fn chain_id(&self) -> ChainId {
        self.chain_id
    }

    pub fn contracts(&self) -> &ContractHandles {
        &self.contracts
    }
}

impl fmt::Debug for SessionBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionBinding")
            .field("account", &self.account)
            .field("chain_id", &self.chain_id)
            .field("contracts", &self.contracts)
            .finish()
    }
}

/// An immutable snapshot of the wallet connection.
#[derive(Debug, Clone)]
pub struct WalletSession {
    /// Increases with every replacement; used to detect stale results.
    epoch: u64,
    binding: Option<SessionBinding>,
}

impl WalletSession {
    pub fn disconnected(epoch: u64) -> Self {
        Self {
            epoch,
            binding: None,
        }
    }

    pub fn connected(epoch: u64, binding: SessionBinding) -> Self {
        Self {
            epoch,
            binding: Some(binding),
        }
    }

    /// The same binding under a new epoch.
    pub fn with_epoch(&self, epoch: u64) -> Self {
        Self {
            epoch,
            binding: self.binding.clone(),
        }
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn is_connected(&self) -> bool {
        self.binding.is_some()
    }

    pub fn address(&self) -> Option<Address> {
        self.binding.as_ref().map(SessionBinding::account)
    }

    pub fn chain_id(&self) -> Option<ChainId> {
        self.binding.as_ref().map(SessionBinding::chain_id)
    }

    /// The binding, or `NotConnected`.
    pub fn binding(&self) -> ClientResult<&SessionBinding> {
        self.binding.as_ref().ok_or(ClientError::NotConnected)
    }
}
