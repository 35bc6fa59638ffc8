//! Read-path campaign state.

pub mod board;

pub use board::{CampaignBoard, CampaignSnapshot, LoadOutcome};
