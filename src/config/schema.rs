//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the client.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Sepolia testnet, the network the deployed contract lives on.
pub const SEPOLIA_CHAIN_ID: u64 = 11_155_111;

/// Root configuration for the crowdfunding client.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ClientConfig {
    /// The single network the client may operate against.
    pub network: NetworkConfig,

    /// Contract addresses and amount precision.
    pub contract: ContractConfig,

    /// Confirmation wait settings.
    pub transactions: TransactionConfig,

    /// Launch scheduling limits.
    pub campaigns: CampaignConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Headless wallet settings.
    pub local_wallet: LocalWalletConfig,
}

/// Required network configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Chain ID every session must be bound to.
    pub chain_id: u64,

    /// Human-readable network name for diagnostics.
    pub name: String,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            chain_id: SEPOLIA_CHAIN_ID,
            name: "sepolia".to_string(),
        }
    }
}

/// Crowdfunding contract configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ContractConfig {
    /// Address of the deployed crowdfunding contract.
    pub address: String,

    /// Address of the ERC-20 token campaigns are denominated in.
    pub token_address: Option<String>,

    /// Decimals of the base unit (18 for ether-like tokens).
    pub amount_decimals: u8,
}

impl Default for ContractConfig {
    fn default() -> Self {
        Self {
            address: "0x0B06fDF056D642d9FF1297102a1227c7B2c7ca57".to_string(),
            token_address: None,
            amount_decimals: 18,
        }
    }
}

/// Transaction confirmation settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TransactionConfig {
    /// Interval between receipt polls in milliseconds.
    pub receipt_poll_interval_ms: u64,

    /// Number of block confirmations required (1 = included).
    pub confirmations: u32,
}

impl Default for TransactionConfig {
    fn default() -> Self {
        Self {
            receipt_poll_interval_ms: 2000,
            confirmations: 1,
        }
    }
}

/// Campaign launch limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CampaignConfig {
    /// Longest campaign duration accepted by the launch scheduler.
    pub max_duration_days: u64,
}

impl Default for CampaignConfig {
    fn default() -> Self {
        Self {
            max_duration_days: 90,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit JSON-formatted log lines.
    pub json_logs: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}

/// Headless wallet configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LocalWalletConfig {
    /// JSON-RPC endpoint URL of the node the local wallet talks to.
    pub rpc_url: String,
}

impl Default for LocalWalletConfig {
    fn default() -> Self {
        Self {
            rpc_url: "http://localhost:8545".to_string(),
        }
    }
}
