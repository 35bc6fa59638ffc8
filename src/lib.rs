//! Crowdfunding dApp client library
//!
//! Connects a wallet on the required network, reads the crowdfunding
//! contract, derives campaign status and drives write transactions to
//! confirmation.

pub mod campaigns;
pub mod client;
pub mod config;
pub mod contract;
pub mod error;
pub mod observability;
pub mod status;
pub mod transaction;
pub mod wallet;

pub use client::{CampaignView, ClientWatch, CrowdfundClient};
pub use config::schema::ClientConfig;
pub use error::{ClientError, ClientResult, ErrorKind};
pub use wallet::{LocalWallet, WalletConnector, WalletProvider};
