//! Configuration validation.
//!
//! Serde handles the syntax; this pass checks values. All problems are
//! collected, not just the first one.

use alloy::primitives::Address;
use std::fmt;

use crate::config::schema::ClientConfig;

/// A single semantic problem in a loaded configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: &'static str,
    /// What is wrong with it.
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a configuration, returning every error found.
pub fn validate_config(config: &ClientConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.network.chain_id == 0 {
        errors.push(ValidationError::new("network.chain_id", "must be non-zero"));
    }

    match config.contract.address.parse::<Address>() {
        Ok(addr) if addr == Address::ZERO => {
            errors.push(ValidationError::new("contract.address", "must not be the zero address"));
        }
        Ok(_) => {}
        Err(e) => {
            errors.push(ValidationError::new(
                "contract.address",
                format!("invalid address '{}': {}", config.contract.address, e),
            ));
        }
    }

    if let Some(token) = &config.contract.token_address {
        if let Err(e) = token.parse::<Address>() {
            errors.push(ValidationError::new(
                "contract.token_address",
                format!("invalid address '{}': {}", token, e),
            ));
        }
    }

    // U256 holds at most 77 full decimal digits.
    if config.contract.amount_decimals == 0 || config.contract.amount_decimals > 77 {
        errors.push(ValidationError::new(
            "contract.amount_decimals",
            "must be between 1 and 77",
        ));
    }

    if config.transactions.receipt_poll_interval_ms == 0 {
        errors.push(ValidationError::new(
            "transactions.receipt_poll_interval_ms",
            "must be greater than zero",
        ));
    }

    if config.transactions.confirmations == 0 {
        errors.push(ValidationError::new(
            "transactions.confirmations",
            "must be at least 1",
        ));
    }

    if config.campaigns.max_duration_days == 0 {
        errors.push(ValidationError::new(
            "campaigns.max_duration_days",
            "must be at least 1",
        ));
    }

    if let Err(e) = config.local_wallet.rpc_url.parse::<url::Url>() {
        errors.push(ValidationError::new(
            "local_wallet.rpc_url",
            format!("invalid URL '{}': {}", config.local_wallet.rpc_url, e),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
