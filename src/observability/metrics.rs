//! Metrics collection.
//!
//! # Metrics
//! - `crowdfund_wallet_connects_total` (counter): connect attempts by outcome
//! - `crowdfund_wallet_resets_total` (counter): session resets by reason
//! - `crowdfund_campaign_loads_total` (counter): read passes by outcome
//! - `crowdfund_campaigns_listed` (gauge): size of the committed list
//! - `crowdfund_transactions_total` (counter): writes by action and outcome

use metrics::{counter, gauge};

/// Record the outcome of a connect attempt.
pub fn record_connect(outcome: &'static str) {
    counter!("crowdfund_wallet_connects_total", "outcome" => outcome).increment(1);
}

/// Record a session reset to disconnected.
pub fn record_session_reset(reason: &'static str) {
    counter!("crowdfund_wallet_resets_total", "reason" => reason).increment(1);
}

/// Record the outcome of a campaign read pass.
pub fn record_campaign_load(outcome: &'static str) {
    counter!("crowdfund_campaign_loads_total", "outcome" => outcome).increment(1);
}

/// Record the size of the committed campaign list.
pub fn record_campaigns_listed(count: usize) {
    gauge!("crowdfund_campaigns_listed").set(count as f64);
}

/// Record the outcome of a write transaction.
pub fn record_transaction(action: &'static str, outcome: &'static str) {
    counter!("crowdfund_transactions_total", "action" => action, "outcome" => outcome).increment(1);
}
