//! Refund engine: returning pledges from failed campaigns.

use charity_protocol::Address;

use super::{Crowdfunding, CrowdfundingError};
use crate::campaign::CampaignId;
use crate::events::CrowdfundingEvent;

impl Crowdfunding {
    /// Returns `contributor`'s whole pledge in campaign `id`.
    ///
    /// Only valid once the campaign has been finalized as failed. The ledger
    /// entry is zeroed before the value leaves escrow, so a contributor can
    /// never be paid twice for the same pledge.
    ///
    /// # Errors
    ///
    /// - [`CrowdfundingError::CampaignNotFound`]
    /// - [`CrowdfundingError::TooEarly`] if not finalized yet
    /// - [`CrowdfundingError::NotRefundable`] if the campaign succeeded
    /// - [`CrowdfundingError::NothingToRefund`] if the entry is zero
    /// - [`CrowdfundingError::TransferFailed`] if the value could not be
    ///   returned; the entry is restored.
    pub fn refund(&self, contributor: &Address, id: CampaignId) -> Result<(), CrowdfundingError> {
        self.atomically("refund", id, Some(contributor), || {
            let amount = {
                let mut ledger = self.ledger.lock();
                let campaign = ledger.store.get(id)?;
                if !campaign.finalized {
                    return Err(CrowdfundingError::TooEarly(id));
                }
                if campaign.successful {
                    return Err(CrowdfundingError::NotRefundable(id));
                }

                let amount = ledger.store.take_contribution(id, contributor);
                if amount == 0 {
                    return Err(CrowdfundingError::NothingToRefund {
                        id,
                        contributor: *contributor,
                    });
                }
                amount
            };

            self.settlement
                .transfer(&self.address, contributor, amount)
                .map_err(CrowdfundingError::TransferFailed)?;

            self.ledger.lock().events.push(CrowdfundingEvent::Refunded {
                id,
                contributor: *contributor,
                amount,
            });

            tracing::info!(campaign = id, %contributor, amount = %amount, "pledge refunded");
            Ok(())
        })
    }
}
