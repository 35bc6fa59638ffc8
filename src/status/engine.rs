//! Campaign lifecycle derivation.
//!
//! Pure functions of `(campaign, now, caller)`. Nothing here performs I/O
//! or reads the clock.

use alloy::primitives::{Address, U256, U512};
use serde::{Deserialize, Serialize};

use crate::contract::types::Campaign;

/// Lifecycle phase of a campaign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CampaignStatus {
    Upcoming,
    Active,
    Successful,
    Failed,
}

impl CampaignStatus {
    /// Total over all three flags.
    pub fn from_flags(has_started: bool, has_ended: bool, goal_reached: bool) -> Self {
        match (has_ended, goal_reached, has_started) {
            (true, true, _) => CampaignStatus::Successful,
            (true, false, _) => CampaignStatus::Failed,
            (false, _, true) => CampaignStatus::Active,
            (false, _, false) => CampaignStatus::Upcoming,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CampaignStatus::Upcoming => "Upcoming",
            CampaignStatus::Active => "Active",
            CampaignStatus::Successful => "Successful",
            CampaignStatus::Failed => "Failed",
        }
    }
}

/// Why no action is offered for a campaign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatusNote {
    FundsClaimed,
    Ended,
    InProgress,
}

/// Status and permitted actions for one caller at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DerivedStatus {
    pub status: CampaignStatus,
    pub is_creator: bool,
    pub has_started: bool,
    pub has_ended: bool,
    pub goal_reached: bool,
    pub can_cancel: bool,
    pub can_refund: bool,
    /// `floor(pledged * 100 / goal)`, not clamped; 0 when the goal is 0.
    pub progress_percent: u64,
    pub claimed: bool,
}

impl DerivedStatus {
    /// Explanation to show when neither cancel nor refund is offered.
    pub fn note(&self) -> Option<StatusNote> {
        if self.can_cancel || self.can_refund {
            None
        } else if self.claimed {
            Some(StatusNote::FundsClaimed)
        } else if self.has_ended {
            Some(StatusNote::Ended)
        } else {
            Some(StatusNote::InProgress)
        }
    }
}

/// Derive the status of `campaign` at `now` as seen by `caller`.
///
/// Addresses compare by value, so checksummed and lowercase spellings of
/// the same account match.
pub fn derive_status(campaign: &Campaign, now: u64, caller: Option<Address>) -> DerivedStatus {
    let is_creator = caller == Some(campaign.creator);
    let has_started = campaign.start_at <= now;
    let has_ended = campaign.end_at <= now;
    let goal_reached = campaign.pledged >= campaign.goal;

    DerivedStatus {
        status: CampaignStatus::from_flags(has_started, has_ended, goal_reached),
        is_creator,
        has_started,
        has_ended,
        goal_reached,
        can_cancel: is_creator && !has_started,
        can_refund: has_ended && !goal_reached,
        progress_percent: progress_percent(campaign.pledged, campaign.goal),
        claimed: campaign.claimed,
    }
}

/// `floor(pledged * 100 / goal)` in 512-bit arithmetic, saturating at
/// `u64::MAX`; 0 when `goal` is 0.
pub fn progress_percent(pledged: U256, goal: U256) -> u64 {
    if goal.is_zero() {
        return 0;
    }
    let scaled = U512::from(pledged) * U512::from(100u64);
    let percent = scaled / U512::from(goal);
    u64::try_from(percent).unwrap_or(u64::MAX)
}
