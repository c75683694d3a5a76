//! # Notifications
//!
//! The observable event log. Events are appended inside the same unit of
//! work as the state change they describe, so an aborted call leaves no
//! trace here.
//!
//! Both enums serialize with an internal `"type"` tag for consumers that
//! stream them as JSON.

use charity_protocol::{Address, Amount, Timestamp};
use serde::{Deserialize, Serialize};

use crate::campaign::CampaignId;

/// Events emitted by the crowdfunding service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum CrowdfundingEvent {
    /// A campaign was registered.
    CampaignCreated {
        id: CampaignId,
        creator: Address,
        beneficiary: Address,
        title: String,
        goal: Amount,
        deadline: Timestamp,
    },
    /// Value was pledged and reward credit minted.
    Contributed {
        id: CampaignId,
        contributor: Address,
        amount: Amount,
        reward_minted: Amount,
    },
    /// The campaign's outcome was frozen.
    Finalized {
        id: CampaignId,
        successful: bool,
        total_raised: Amount,
    },
    /// A contributor's pledge was returned.
    Refunded {
        id: CampaignId,
        contributor: Address,
        amount: Amount,
    },
}

impl CrowdfundingEvent {
    /// The campaign the event is indexed under.
    pub fn campaign_id(&self) -> CampaignId {
        match self {
            Self::CampaignCreated { id, .. }
            | Self::Contributed { id, .. }
            | Self::Finalized { id, .. }
            | Self::Refunded { id, .. } => *id,
        }
    }
}

/// Events emitted by the reward token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum TokenEvent {
    /// Balance moved. `from == ZERO` is a mint.
    Transfer {
        from: Address,
        to: Address,
        value: Amount,
    },
    /// An allowance was set.
    Approval {
        owner: Address,
        spender: Address,
        value: Amount,
    },
    /// Ownership changed hands. `new_owner == ZERO` is a renouncement.
    OwnershipTransferred {
        previous_owner: Address,
        new_owner: Address,
    },
    /// The minting capability moved.
    MinterUpdated {
        previous_minter: Address,
        new_minter: Address,
    },
}
