//! # Charity Crowdfunding Contracts
//!
//! The campaign ledger and the reward credit it drives:
//!
//! - **Crowdfunding**: campaign creation, contributions, one-shot
//!   finalization and refunds of failed campaigns.
//! - **Reward Token**: an owner/minter-gated fungible ledger credited to
//!   contributors in proportion to their pledge.
//! - **Guard**: the re-entrancy lock shared by every mutating entry point.
//!
//! ## Design Principles
//!
//! 1. All monetary operations check for overflow. Wrapping arithmetic and
//!    money do not mix.
//! 2. Every entry point is all-or-nothing: state and events from a failed
//!    call are rolled back before the error reaches the caller.
//! 3. Checks, then effects, then interactions. The ledger is fully updated
//!    before any value or reward leaves it.
//! 4. Every public type is serializable (serde) for wire transport.

pub mod campaign;
pub mod crowdfunding;
pub mod events;
pub mod guard;
pub mod reward_token;

pub use campaign::{Campaign, CampaignId, CampaignPhase, CampaignStatus};
pub use crowdfunding::{Crowdfunding, CrowdfundingError, ErrorClass};
pub use events::{CrowdfundingEvent, TokenEvent};
pub use reward_token::{RewardToken, TokenError};
