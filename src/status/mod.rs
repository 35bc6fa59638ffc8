//! Campaign status derivation.

pub mod engine;

pub use engine::{derive_status, progress_percent, CampaignStatus, DerivedStatus, StatusNote};
