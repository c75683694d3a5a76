//! Finalization engine: the one irreversible transition.

use super::{Crowdfunding, CrowdfundingError};
use crate::campaign::CampaignId;
use crate::events::CrowdfundingEvent;

impl Crowdfunding {
    /// Freezes the outcome of campaign `id` once its deadline has passed.
    ///
    /// A campaign is successful when `total_raised >= goal`; the raised
    /// funds are then released from escrow to the beneficiary. A failed
    /// campaign keeps the funds in escrow for contributors to reclaim.
    ///
    /// Anyone may call this. After it succeeds, `finalized` and `successful`
    /// never change again.
    ///
    /// # Errors
    ///
    /// - [`CrowdfundingError::CampaignNotFound`]
    /// - [`CrowdfundingError::AlreadyFinalized`]
    /// - [`CrowdfundingError::TooEarly`] while `now < deadline`
    /// - [`CrowdfundingError::TransferFailed`] if the release fails; the
    ///   campaign is left unfinalized and the call may be retried.
    pub fn finalize_campaign(&self, id: CampaignId) -> Result<(), CrowdfundingError> {
        self.atomically("finalize_campaign", id, None, || {
            let now = self.clock.now();

            let (successful, total_raised, beneficiary) = {
                let mut ledger = self.ledger.lock();
                let campaign = ledger.store.get_mut(id)?;
                if campaign.finalized {
                    return Err(CrowdfundingError::AlreadyFinalized(id));
                }
                if now < campaign.deadline {
                    return Err(CrowdfundingError::TooEarly(id));
                }

                campaign.finalized = true;
                campaign.successful = campaign.goal_met();
                (campaign.successful, campaign.total_raised, campaign.beneficiary)
            };

            if successful {
                self.settlement
                    .transfer(&self.address, &beneficiary, total_raised)
                    .map_err(CrowdfundingError::TransferFailed)?;
            }

            self.ledger.lock().events.push(CrowdfundingEvent::Finalized {
                id,
                successful,
                total_raised,
            });

            tracing::info!(
                campaign = id,
                successful,
                total_raised = %total_raised,
                %beneficiary,
                "campaign finalized"
            );
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use charity_protocol::{Address, ManualClock, NativeBank, TransferError};

    use super::*;
    use crate::reward_token::RewardToken;

    const START: u64 = 5_000;

    fn fixture(escrow: u128) -> (Crowdfunding, Arc<ManualClock>, Arc<NativeBank>) {
        let owner = Address::from_label("owner");
        let token = Arc::new(RewardToken::new(Address::from_label("token"), "n", "s", 18, owner).unwrap());
        let clock = Arc::new(ManualClock::new(START));
        let bank = Arc::new(NativeBank::new());
        let cf = Crowdfunding::new(
            Address::from_label("crowdfunding"),
            Arc::clone(&token),
            clock.clone(),
            bank.clone(),
        );
        token.set_minter(&owner, &cf.address()).unwrap();
        bank.credit(&cf.address(), escrow).unwrap();
        cf.create_campaign(
            &Address::from_label("creator"),
            "c",
            100,
            60,
            &Address::from_label("beneficiary"),
        )
        .unwrap();
        (cf, clock, bank)
    }

    #[test]
    fn too_early_before_deadline() {
        let (cf, clock, _) = fixture(0);
        clock.set(START + 59);
        assert_eq!(cf.finalize_campaign(0), Err(CrowdfundingError::TooEarly(0)));
        assert!(!cf.campaign(0).unwrap().finalized);
    }

    #[test]
    fn goal_met_exactly_is_successful() {
        let (cf, clock, bank) = fixture(100);
        cf.contribute(&Address::from_label("alice"), 0, 100).unwrap();
        clock.set(START + 60);
        cf.finalize_campaign(0).unwrap();

        let campaign = cf.campaign(0).unwrap();
        assert!(campaign.finalized && campaign.successful);
        assert_eq!(bank.balance_of(&Address::from_label("beneficiary")), 100);
        assert_eq!(bank.balance_of(&cf.address()), 0);
    }

    #[test]
    fn short_of_goal_fails_and_keeps_escrow() {
        let (cf, clock, bank) = fixture(99);
        cf.contribute(&Address::from_label("alice"), 0, 99).unwrap();
        clock.set(START + 60);
        cf.finalize_campaign(0).unwrap();

        let campaign = cf.campaign(0).unwrap();
        assert!(campaign.finalized && !campaign.successful);
        assert_eq!(bank.balance_of(&cf.address()), 99);
    }

    #[test]
    fn second_finalize_is_rejected() {
        let (cf, clock, _) = fixture(0);
        clock.set(START + 60);
        cf.finalize_campaign(0).unwrap();
        assert_eq!(
            cf.finalize_campaign(0),
            Err(CrowdfundingError::AlreadyFinalized(0))
        );
    }

    #[test]
    fn failed_release_leaves_campaign_unfinalized() {
        // Escrow holds nothing, so the release cannot settle.
        let (cf, clock, _) = fixture(0);
        cf.contribute(&Address::from_label("alice"), 0, 150).unwrap();
        clock.set(START + 60);
        let events_before = cf.events().len();

        assert!(matches!(
            cf.finalize_campaign(0),
            Err(CrowdfundingError::TransferFailed(TransferError::InsufficientFunds { .. }))
        ));
        let campaign = cf.campaign(0).unwrap();
        assert!(!campaign.finalized);
        assert!(!campaign.successful);
        assert_eq!(cf.events().len(), events_before);
    }

    #[test]
    fn unknown_campaign() {
        let (cf, _, _) = fixture(0);
        assert_eq!(
            cf.finalize_campaign(42),
            Err(CrowdfundingError::CampaignNotFound(42))
        );
    }
}
