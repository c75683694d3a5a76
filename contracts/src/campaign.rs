//! # Campaign Store
//!
//! The durable record of campaigns and per-contributor pledges. Campaigns
//! live in an append-only arena indexed by their sequential id; pledges
//! live in a map keyed by `(campaign, contributor)`.
//!
//! Nothing is ever deleted. A refunded pledge is zeroed, not removed, and a
//! finalized campaign stays readable forever for audit.
//!
//! The store enforces structural validity (goal, duration, beneficiary,
//! arithmetic bounds). Lifecycle rules such as "no contributions after the
//! deadline" belong to the engines in [`crate::crowdfunding`].

use std::collections::HashMap;
use std::fmt;

use charity_protocol::{Address, Amount, Timestamp};
use serde::{Deserialize, Serialize};

use crate::crowdfunding::CrowdfundingError;

/// Sequential campaign identifier, starting at 0.
pub type CampaignId = u64;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Where a campaign is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CampaignPhase {
    /// Not finalized. Accepts contributions until the deadline.
    Active,
    /// Finalized with `total_raised >= goal`. Funds went to the beneficiary.
    Successful,
    /// Finalized short of the goal. Contributors may reclaim their pledges.
    Failed,
}

impl fmt::Display for CampaignPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CampaignPhase::Active => write!(f, "Active"),
            CampaignPhase::Successful => write!(f, "Successful"),
            CampaignPhase::Failed => write!(f, "Failed"),
        }
    }
}

/// A funding drive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Campaign {
    /// Position in the arena.
    pub id: CampaignId,
    /// Display title, set once.
    pub title: String,
    /// Target amount in the smallest value unit. Always positive.
    pub goal: Amount,
    /// Absolute unix deadline: creation time plus duration.
    pub deadline: Timestamp,
    /// Identity that registered the campaign.
    pub creator: Address,
    /// Identity that receives the funds on success. Never the null address.
    pub beneficiary: Address,
    /// Sum of all pledges. Frozen once finalized.
    pub total_raised: Amount,
    /// Flips to `true` exactly once.
    pub finalized: bool,
    /// Only meaningful when `finalized` is set.
    pub successful: bool,
}

/// Derived view over a campaign at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampaignStatus {
    /// Still accepting contributions.
    pub active: bool,
    /// Past the deadline, or finalized.
    pub ended: bool,
    /// Outcome frozen.
    pub finalized: bool,
    /// Goal met (only meaningful once finalized).
    pub successful: bool,
}

impl Campaign {
    /// Status tuple as of `now`.
    pub fn status(&self, now: Timestamp) -> CampaignStatus {
        CampaignStatus {
            active: !self.finalized && now < self.deadline,
            ended: now >= self.deadline || self.finalized,
            finalized: self.finalized,
            successful: self.successful,
        }
    }

    /// Lifecycle phase, independent of the clock.
    pub fn phase(&self) -> CampaignPhase {
        match (self.finalized, self.successful) {
            (false, _) => CampaignPhase::Active,
            (true, true) => CampaignPhase::Successful,
            (true, false) => CampaignPhase::Failed,
        }
    }

    /// Whether the goal has been reached (inclusive).
    pub fn goal_met(&self) -> bool {
        self.total_raised >= self.goal
    }
}

// ---------------------------------------------------------------------------
// CampaignStore
// ---------------------------------------------------------------------------

/// Arena of campaigns plus the contribution ledger.
#[derive(Debug, Clone, Default)]
pub struct CampaignStore {
    campaigns: Vec<Campaign>,
    contributions: HashMap<(CampaignId, Address), Amount>,
}

impl CampaignStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new campaign and returns its id.
    ///
    /// # Errors
    ///
    /// - [`CrowdfundingError::InvalidGoal`] if `goal == 0`.
    /// - [`CrowdfundingError::InvalidDuration`] if `duration == 0` or the
    ///   deadline would not fit in a timestamp.
    /// - [`CrowdfundingError::InvalidBeneficiary`] for the null address.
    pub fn create(
        &mut self,
        creator: Address,
        title: String,
        goal: Amount,
        duration: u64,
        beneficiary: Address,
        now: Timestamp,
    ) -> Result<CampaignId, CrowdfundingError> {
        if goal == 0 {
            return Err(CrowdfundingError::InvalidGoal);
        }
        if duration == 0 {
            return Err(CrowdfundingError::InvalidDuration);
        }
        if beneficiary.is_zero() {
            return Err(CrowdfundingError::InvalidBeneficiary);
        }
        let deadline = now
            .checked_add(duration)
            .ok_or(CrowdfundingError::InvalidDuration)?;

        let id = self.campaigns.len() as CampaignId;
        self.campaigns.push(Campaign {
            id,
            title,
            goal,
            deadline,
            creator,
            beneficiary,
            total_raised: 0,
            finalized: false,
            successful: false,
        });
        Ok(id)
    }

    /// Number of campaigns ever created. Also the next id.
    pub fn count(&self) -> u64 {
        self.campaigns.len() as u64
    }

    /// Looks up a campaign.
    pub fn get(&self, id: CampaignId) -> Result<&Campaign, CrowdfundingError> {
        usize::try_from(id)
            .ok()
            .and_then(|idx| self.campaigns.get(idx))
            .ok_or(CrowdfundingError::CampaignNotFound(id))
    }

    /// Looks up a campaign for mutation.
    pub fn get_mut(&mut self, id: CampaignId) -> Result<&mut Campaign, CrowdfundingError> {
        usize::try_from(id)
            .ok()
            .and_then(|idx| self.campaigns.get_mut(idx))
            .ok_or(CrowdfundingError::CampaignNotFound(id))
    }

    /// All campaigns in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Campaign> {
        self.campaigns.iter()
    }

    /// Pledged amount of `contributor` in campaign `id` (zero by default).
    pub fn contribution(&self, id: CampaignId, contributor: &Address) -> Amount {
        self.contributions
            .get(&(id, *contributor))
            .copied()
            .unwrap_or(0)
    }

    /// Adds a pledge to both the contributor's entry and the campaign total.
    ///
    /// Both sums are computed before either is written, so an overflow
    /// leaves the store untouched.
    pub fn record_contribution(
        &mut self,
        id: CampaignId,
        contributor: &Address,
        amount: Amount,
    ) -> Result<Amount, CrowdfundingError> {
        let entry = self.contribution(id, contributor);
        let campaign = self.get_mut(id)?;

        let new_total = campaign
            .total_raised
            .checked_add(amount)
            .ok_or(CrowdfundingError::ArithmeticOverflow)?;
        let new_entry = entry
            .checked_add(amount)
            .ok_or(CrowdfundingError::ArithmeticOverflow)?;

        campaign.total_raised = new_total;
        self.contributions.insert((id, *contributor), new_entry);
        debug_assert_eq!(self.ledger_sum(id), new_total, "ledger out of sync for campaign {id}");
        Ok(new_total)
    }

    /// Zeroes a contributor's entry and returns what it held.
    pub fn take_contribution(&mut self, id: CampaignId, contributor: &Address) -> Amount {
        match self.contributions.get_mut(&(id, *contributor)) {
            Some(entry) => std::mem::take(entry),
            None => 0,
        }
    }

    /// Sum of every contributor entry for `id`. Matches `total_raised`
    /// until the campaign is finalized.
    pub fn ledger_sum(&self, id: CampaignId) -> Amount {
        self.contributions
            .iter()
            .filter(|((cid, _), _)| *cid == id)
            .fold(0u128, |acc, (_, amount)| acc.saturating_add(*amount))
    }

    /// Captures everything a single guarded call may touch: one campaign
    /// record and, optionally, one contributor entry.
    pub fn checkpoint(&self, id: CampaignId, contributor: Option<&Address>) -> Checkpoint {
        Checkpoint {
            id,
            campaign: self.get(id).ok().cloned(),
            entry: contributor.map(|who| (*who, self.contributions.get(&(id, *who)).copied())),
        }
    }

    /// Puts back what [`checkpoint`](Self::checkpoint) captured.
    pub fn restore(&mut self, checkpoint: Checkpoint) {
        if let Some(campaign) = checkpoint.campaign {
            if let Ok(slot) = self.get_mut(checkpoint.id) {
                *slot = campaign;
            }
        }
        match checkpoint.entry {
            Some((who, Some(amount))) => {
                self.contributions.insert((checkpoint.id, who), amount);
            }
            Some((who, None)) => {
                self.contributions.remove(&(checkpoint.id, who));
            }
            None => {}
        }
    }
}

/// Pre-call copy of the state a guarded call may mutate.
#[derive(Debug, Clone)]
pub struct Checkpoint {
    id: CampaignId,
    campaign: Option<Campaign>,
    entry: Option<(Address, Option<Amount>)>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: Timestamp = 1_700_000_000;

    fn addr(label: &str) -> Address {
        Address::from_label(label)
    }

    fn store_with_campaign() -> (CampaignStore, CampaignId) {
        let mut store = CampaignStore::new();
        let id = store
            .create(addr("creator"), "Flood Relief".into(), 1_000, 3_600, addr("b"), NOW)
            .unwrap();
        (store, id)
    }

    #[test]
    fn ids_are_sequential_from_zero() {
        let mut store = CampaignStore::new();
        for expected in 0..3 {
            let id = store
                .create(addr("c"), format!("#{expected}"), 1, 1, addr("b"), NOW)
                .unwrap();
            assert_eq!(id, expected);
        }
        assert_eq!(store.count(), 3);
    }

    #[test]
    fn create_sets_deadline_and_zero_totals() {
        let (store, id) = store_with_campaign();
        let campaign = store.get(id).unwrap();
        assert_eq!(campaign.deadline, NOW + 3_600);
        assert_eq!(campaign.total_raised, 0);
        assert!(!campaign.finalized);
        assert_eq!(campaign.phase(), CampaignPhase::Active);
    }

    #[test]
    fn create_validates_in_order() {
        let mut store = CampaignStore::new();
        assert!(matches!(
            store.create(addr("c"), "t".into(), 0, 0, Address::ZERO, NOW),
            Err(CrowdfundingError::InvalidGoal)
        ));
        assert!(matches!(
            store.create(addr("c"), "t".into(), 1, 0, Address::ZERO, NOW),
            Err(CrowdfundingError::InvalidDuration)
        ));
        assert!(matches!(
            store.create(addr("c"), "t".into(), 1, 1, Address::ZERO, NOW),
            Err(CrowdfundingError::InvalidBeneficiary)
        ));
        assert_eq!(store.count(), 0);
    }

    #[test]
    fn deadline_overflow_is_invalid_duration() {
        let mut store = CampaignStore::new();
        assert!(matches!(
            store.create(addr("c"), "t".into(), 1, u64::MAX, addr("b"), NOW),
            Err(CrowdfundingError::InvalidDuration)
        ));
    }

    #[test]
    fn unknown_campaign_not_found() {
        let store = CampaignStore::new();
        assert!(matches!(
            store.get(7),
            Err(CrowdfundingError::CampaignNotFound(7))
        ));
    }

    #[test]
    fn contributions_accumulate_in_entry_and_total() {
        let (mut store, id) = store_with_campaign();
        store.record_contribution(id, &addr("a"), 300).unwrap();
        store.record_contribution(id, &addr("a"), 200).unwrap();
        store.record_contribution(id, &addr("d"), 50).unwrap();
        assert_eq!(store.contribution(id, &addr("a")), 500);
        assert_eq!(store.get(id).unwrap().total_raised, 550);
        assert_eq!(store.ledger_sum(id), 550);
    }

    #[test]
    fn overflowing_contribution_leaves_store_untouched() {
        let (mut store, id) = store_with_campaign();
        store.record_contribution(id, &addr("a"), Amount::MAX).unwrap();
        assert!(matches!(
            store.record_contribution(id, &addr("d"), 1),
            Err(CrowdfundingError::ArithmeticOverflow)
        ));
        assert_eq!(store.contribution(id, &addr("d")), 0);
        assert_eq!(store.get(id).unwrap().total_raised, Amount::MAX);
    }

    #[test]
    fn take_contribution_zeroes_once() {
        let (mut store, id) = store_with_campaign();
        store.record_contribution(id, &addr("a"), 42).unwrap();
        assert_eq!(store.take_contribution(id, &addr("a")), 42);
        assert_eq!(store.take_contribution(id, &addr("a")), 0);
        assert_eq!(store.take_contribution(id, &addr("nobody")), 0);
    }

    #[test]
    fn restore_undoes_campaign_and_entry_changes() {
        let (mut store, id) = store_with_campaign();
        store.record_contribution(id, &addr("a"), 10).unwrap();

        let checkpoint = store.checkpoint(id, Some(&addr("a")));
        store.record_contribution(id, &addr("a"), 5).unwrap();
        store.get_mut(id).unwrap().finalized = true;
        store.restore(checkpoint);

        assert_eq!(store.contribution(id, &addr("a")), 10);
        assert_eq!(store.get(id).unwrap().total_raised, 10);
        assert!(!store.get(id).unwrap().finalized);
    }

    #[test]
    fn restore_removes_entries_that_did_not_exist() {
        let (mut store, id) = store_with_campaign();
        let checkpoint = store.checkpoint(id, Some(&addr("new")));
        store.record_contribution(id, &addr("new"), 7).unwrap();
        store.restore(checkpoint);
        assert_eq!(store.contribution(id, &addr("new")), 0);
        assert_eq!(store.ledger_sum(id), 0);
    }

    #[test]
    fn status_tracks_deadline_and_finalization() {
        let (mut store, id) = store_with_campaign();
        let deadline = store.get(id).unwrap().deadline;

        let before = store.get(id).unwrap().status(deadline - 1);
        assert!(before.active && !before.ended);

        let at = store.get(id).unwrap().status(deadline);
        assert!(!at.active && at.ended && !at.finalized);

        let campaign = store.get_mut(id).unwrap();
        campaign.finalized = true;
        let finalized = campaign.status(deadline - 1);
        assert!(!finalized.active && finalized.ended);
        assert_eq!(campaign.phase(), CampaignPhase::Failed);
    }
}
