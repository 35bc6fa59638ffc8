//! Crowdfunding contract access.
//!
//! # Data Flow
//! ```text
//! bindings.rs (sol! ABI for ICrowdFund / IERC20)
//!     → gateway.rs (eth_call / eth_sendTransaction through the session wallet)
//!     → types.rs (Campaign, CampaignId, LaunchSchedule)
//! units.rs converts decimal strings to base units before any write.
//! ```

pub mod bindings;
pub mod gateway;
pub mod types;
pub mod units;

pub use gateway::ContractGateway;
pub use types::{Campaign, CampaignId, LaunchSchedule, SECONDS_PER_DAY};
pub use units::{format_amount, parse_amount};
