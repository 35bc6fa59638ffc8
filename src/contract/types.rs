//! Campaign domain types.

use alloy::primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::contract::bindings::ICrowdFund;
use crate::error::{ClientError, ClientResult};

pub const SECONDS_PER_DAY: u64 = 86_400;

/// Contract-assigned campaign identifier (1-based).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CampaignId(pub u64);

impl From<CampaignId> for U256 {
    fn from(id: CampaignId) -> Self {
        U256::from(id.0)
    }
}

impl TryFrom<U256> for CampaignId {
    type Error = ClientError;

    fn try_from(value: U256) -> Result<Self, Self::Error> {
        u64::try_from(value)
            .map(CampaignId)
            .map_err(|_| ClientError::ReadFailure(format!("campaign id {} out of range", value)))
    }
}

impl fmt::Display for CampaignId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A campaign as observed in one read pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Campaign {
    pub id: CampaignId,
    pub creator: Address,
    /// Funding goal in base units.
    pub goal: U256,
    /// Amount pledged so far in base units.
    pub pledged: U256,
    /// Unix timestamp (seconds) at which pledging opens.
    pub start_at: u64,
    /// Unix timestamp (seconds) at which the campaign ends.
    pub end_at: u64,
    /// Whether the creator has withdrawn the funds.
    pub claimed: bool,
}

impl Campaign {
    /// Build a campaign from a `campaigns(id)` slot.
    ///
    /// Returns `None` for cancelled slots, which the contract clears to the
    /// zero creator.
    pub fn from_slot(id: CampaignId, slot: ICrowdFund::campaignsReturn) -> Option<Self> {
        if slot.creator == Address::ZERO {
            return None;
        }

        Some(Self {
            id,
            creator: slot.creator,
            goal: slot.goal,
            pledged: slot.pledged,
            start_at: u64::from(slot.startAt),
            end_at: u64::from(slot.endAt),
            claimed: slot.claimed,
        })
    }
}

/// Start and end timestamps of a campaign about to be launched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchSchedule {
    pub start_at: u64,
    pub end_at: u64,
}

impl LaunchSchedule {
    /// A schedule from explicit timestamps.
    pub fn new(start_at: u64, end_at: u64) -> ClientResult<Self> {
        let schedule = Self { start_at, end_at };
        schedule.validate()?;
        Ok(schedule)
    }

    /// A schedule starting `start_in_days` after `now` and lasting
    /// `duration_days`.
    pub fn from_offsets(
        now: u64,
        start_in_days: u64,
        duration_days: u64,
        max_duration_days: u64,
    ) -> ClientResult<Self> {
        if duration_days == 0 {
            return Err(ClientError::SubmissionFailure(
                "campaign duration must be at least one day".to_string(),
            ));
        }
        if duration_days > max_duration_days {
            return Err(ClientError::SubmissionFailure(format!(
                "campaign duration of {} days exceeds the maximum of {}",
                duration_days, max_duration_days
            )));
        }

        let overflow = || ClientError::SubmissionFailure("campaign schedule overflows".to_string());
        let start_at = start_in_days
            .checked_mul(SECONDS_PER_DAY)
            .and_then(|offset| now.checked_add(offset))
            .ok_or_else(overflow)?;
        let end_at = duration_days
            .checked_mul(SECONDS_PER_DAY)
            .and_then(|length| start_at.checked_add(length))
            .ok_or_else(overflow)?;

        Self::new(start_at, end_at)
    }

    /// Check ordering and that both timestamps fit the contract's `uint32`.
    pub fn validate(&self) -> ClientResult<()> {
        if self.start_at > self.end_at {
            return Err(ClientError::SubmissionFailure(format!(
                "campaign starts at {} after it ends at {}",
                self.start_at, self.end_at
            )));
        }
        if self.end_at > u64::from(u32::MAX) {
            return Err(ClientError::SubmissionFailure(format!(
                "campaign end {} does not fit a uint32 timestamp",
                self.end_at
            )));
        }
        Ok(())
    }

    pub(crate) fn as_u32(&self) -> (u32, u32) {
        // validate() guarantees both fit.
        (self.start_at as u32, self.end_at as u32)
    }
}
