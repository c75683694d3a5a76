//! Contribution engine: pledges and reward issuance.

use charity_protocol::{Address, Amount};

use super::{Crowdfunding, CrowdfundingError};
use crate::campaign::CampaignId;
use crate::events::CrowdfundingEvent;

impl Crowdfunding {
    /// Pledges `amount` from `contributor` to campaign `id`.
    ///
    /// `amount` is the value attached to the call; the environment has
    /// already moved it into this service's escrow. On success the
    /// contributor is credited `amount * reward_rate` reward units.
    ///
    /// # Errors
    ///
    /// Checked in this order:
    /// - [`CrowdfundingError::CampaignNotFound`]
    /// - [`CrowdfundingError::CampaignEnded`] once `now >= deadline`
    /// - [`CrowdfundingError::ZeroContribution`]
    ///
    /// plus [`CrowdfundingError::Reward`] if the token refuses to mint and
    /// [`CrowdfundingError::ReentrancyGuardReentrantCall`] when re-entered.
    pub fn contribute(
        &self,
        contributor: &Address,
        id: CampaignId,
        amount: Amount,
    ) -> Result<(), CrowdfundingError> {
        self.atomically("contribute", id, Some(contributor), || {
            let now = self.clock.now();

            let (reward, total_raised) = {
                let mut ledger = self.ledger.lock();
                let campaign = ledger.store.get(id)?;
                if now >= campaign.deadline {
                    return Err(CrowdfundingError::CampaignEnded(id));
                }
                if amount == 0 {
                    return Err(CrowdfundingError::ZeroContribution);
                }

                let reward = amount
                    .checked_mul(self.reward_rate)
                    .ok_or(CrowdfundingError::ArithmeticOverflow)?;
                let total_raised = ledger.store.record_contribution(id, contributor, amount)?;
                (reward, total_raised)
            };

            // Ledger effects are in place and the lock is released before
            // calling out to the token.
            self.reward_token.mint(&self.address, contributor, reward)?;

            self.ledger.lock().events.push(CrowdfundingEvent::Contributed {
                id,
                contributor: *contributor,
                amount,
                reward_minted: reward,
            });

            tracing::info!(
                campaign = id,
                %contributor,
                amount = %amount,
                reward = %reward,
                total_raised = %total_raised,
                "contribution recorded"
            );
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use charity_protocol::{ManualClock, NativeBank};

    use super::*;
    use crate::reward_token::{RewardToken, TokenError};

    const START: u64 = 1_000;

    struct Fixture {
        cf: Crowdfunding,
        clock: Arc<ManualClock>,
        token: Arc<RewardToken>,
    }

    fn fixture(with_minter: bool) -> Fixture {
        let owner = Address::from_label("owner");
        let token = Arc::new(RewardToken::new(Address::from_label("token"), "n", "s", 18, owner).unwrap());
        let clock = Arc::new(ManualClock::new(START));
        let cf = Crowdfunding::new(
            Address::from_label("crowdfunding"),
            Arc::clone(&token),
            clock.clone(),
            Arc::new(NativeBank::new()),
        );
        if with_minter {
            token.set_minter(&owner, &cf.address()).unwrap();
        }
        cf.create_campaign(
            &Address::from_label("creator"),
            "c",
            1_000,
            100,
            &Address::from_label("beneficiary"),
        )
        .unwrap();
        Fixture { cf, clock, token }
    }

    #[test]
    fn contribution_updates_ledger_and_mints() {
        let f = fixture(true);
        let alice = Address::from_label("alice");
        f.cf.contribute(&alice, 0, 250).unwrap();

        assert_eq!(f.cf.contributions(0, &alice), 250);
        assert_eq!(f.cf.campaign(0).unwrap().total_raised, 250);
        assert_eq!(f.token.balance_of(&alice), 250 * f.cf.reward_rate());
        assert!(matches!(
            f.cf.events().last(),
            Some(CrowdfundingEvent::Contributed { amount: 250, .. })
        ));
    }

    #[test]
    fn validation_order() {
        let f = fixture(true);
        let alice = Address::from_label("alice");

        assert_eq!(
            f.cf.contribute(&alice, 9, 0),
            Err(CrowdfundingError::CampaignNotFound(9))
        );
        assert_eq!(
            f.cf.contribute(&alice, 0, 0),
            Err(CrowdfundingError::ZeroContribution)
        );
        f.clock.advance(100);
        assert_eq!(
            f.cf.contribute(&alice, 0, 0),
            Err(CrowdfundingError::CampaignEnded(0))
        );
    }

    #[test]
    fn last_second_before_deadline_is_accepted() {
        let f = fixture(true);
        f.clock.set(START + 99);
        assert!(f.cf.contribute(&Address::from_label("alice"), 0, 1).is_ok());
        f.clock.set(START + 100);
        assert_eq!(
            f.cf.contribute(&Address::from_label("alice"), 0, 1),
            Err(CrowdfundingError::CampaignEnded(0))
        );
    }

    #[test]
    fn failed_mint_rolls_back_contribution() {
        let f = fixture(false);
        let alice = Address::from_label("alice");
        let events_before = f.cf.events().len();

        let err = f.cf.contribute(&alice, 0, 500).unwrap_err();
        assert!(matches!(err, CrowdfundingError::Reward(TokenError::NotMinter { .. })));

        assert_eq!(f.cf.contributions(0, &alice), 0);
        assert_eq!(f.cf.campaign(0).unwrap().total_raised, 0);
        assert_eq!(f.cf.events().len(), events_before);
        assert_eq!(f.token.total_supply(), 0);
    }

    #[test]
    fn reward_overflow_is_rejected_without_effect() {
        let f = fixture(true);
        let alice = Address::from_label("alice");
        assert_eq!(
            f.cf.contribute(&alice, 0, Amount::MAX),
            Err(CrowdfundingError::ArithmeticOverflow)
        );
        assert_eq!(f.cf.contributions(0, &alice), 0);
    }
}
