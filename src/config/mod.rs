//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ClientConfig (validated, immutable)
//!     → shared by value / Arc with the connector, gateway and orchestrator
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    CampaignConfig, ClientConfig, ContractConfig, LocalWalletConfig, NetworkConfig,
    ObservabilityConfig, TransactionConfig, SEPOLIA_CHAIN_ID,
};
pub use validation::{validate_config, ValidationError};
