//! # Crowdfunding Service
//!
//! The single owner of the campaign ledger. Every mutation goes through one
//! of its entry points; nothing else holds a reference into the store.
//!
//! Lifecycle of a campaign:
//!
//! 1. **Create**: goal, duration and beneficiary are fixed forever.
//! 2. **Contribute**: while `now < deadline`, pledges accumulate and each
//!    one mints `amount * REWARD_RATE` reward units to the contributor.
//! 3. **Finalize**: once `now >= deadline`, anyone may freeze the outcome.
//!    Success (`total_raised >= goal`) releases the funds to the beneficiary.
//! 4. **Refund**: after a failed finalization, each contributor reclaims
//!    their own pledge, once.
//!
//! ## Execution Discipline
//!
//! Every mutating entry point runs inside [`Crowdfunding::atomically`]:
//!
//! - the shared [`ReentrancyGuard`] is taken first, so a counterparty that
//!   calls back in while we are mid-transfer is turned away;
//! - the touched campaign and ledger entry are checkpointed;
//! - the body validates, then applies *all* its ledger effects, then performs
//!   the external interaction (mint or value transfer) with the ledger lock
//!   released;
//! - on any error, the checkpoint is restored and the events of the call are
//!   discarded, so the call leaves no trace.

mod contribute;
mod finalize;
mod refund;

use std::sync::Arc;

use charity_protocol::config::REWARD_RATE;
use charity_protocol::{Address, Amount, Clock, Settlement, TransferError};
use parking_lot::Mutex;
use thiserror::Error;

use crate::campaign::{Campaign, CampaignId, CampaignStatus, CampaignStore, Checkpoint};
use crate::events::CrowdfundingEvent;
use crate::guard::{ReentrancyGuard, ReentrantCall};
use crate::reward_token::{RewardToken, TokenError};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that can occur during crowdfunding operations.
///
/// Every error aborts the whole call with no partial effect.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CrowdfundingError {
    /// The goal was zero.
    #[error("InvalidGoal: goal must be positive")]
    InvalidGoal,

    /// The duration was zero, or the deadline would overflow.
    #[error("InvalidDuration: duration must be positive")]
    InvalidDuration,

    /// The beneficiary was the null address.
    #[error("InvalidBeneficiary: beneficiary must not be the null address")]
    InvalidBeneficiary,

    /// A contribution carried no value.
    #[error("ZeroContribution: contribution must carry value")]
    ZeroContribution,

    /// No campaign with this id exists.
    #[error("CampaignNotFound: no campaign {0}")]
    CampaignNotFound(CampaignId),

    /// The campaign's deadline has passed.
    #[error("CampaignEnded: campaign {0} no longer accepts contributions")]
    CampaignEnded(CampaignId),

    /// The campaign was already finalized.
    #[error("AlreadyFinalized: campaign {0} is already finalized")]
    AlreadyFinalized(CampaignId),

    /// Finalization before the deadline, or refund before finalization.
    #[error("TooEarly: campaign {0} cannot be settled yet")]
    TooEarly(CampaignId),

    /// Refund requested from a successful campaign.
    #[error("NotRefundable: campaign {0} reached its goal")]
    NotRefundable(CampaignId),

    /// The caller has no pledge left in this campaign.
    #[error("NothingToRefund: {contributor} has nothing to reclaim from campaign {id}")]
    NothingToRefund {
        /// The campaign.
        id: CampaignId,
        /// The caller.
        contributor: Address,
    },

    /// The outbound value transfer failed; the call was rolled back.
    #[error("TransferFailed: {0}")]
    TransferFailed(#[source] TransferError),

    /// A guarded entry point was re-entered.
    #[error("ReentrancyGuardReentrantCall")]
    ReentrancyGuardReentrantCall,

    /// The reward token refused to mint.
    #[error("reward mint failed: {0}")]
    Reward(#[from] TokenError),

    /// An amount computation overflowed.
    #[error("arithmetic overflow")]
    ArithmeticOverflow,
}

impl From<ReentrantCall> for CrowdfundingError {
    fn from(_: ReentrantCall) -> Self {
        CrowdfundingError::ReentrancyGuardReentrantCall
    }
}

/// Broad category of a failure, for callers deciding what to tell a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Structurally invalid argument. Never retried.
    InputValidation,
    /// Transition not allowed in the current state. Re-check state first.
    Lifecycle,
    /// Re-entrant call. Always fatal to that call.
    Safety,
    /// Funds did not move; the call rolled back and may be retried.
    ValueTransfer,
    /// Caller lacks the capability.
    Authorization,
    /// Balance or allowance violation.
    Accounting,
}

impl CrowdfundingError {
    /// Stable kind name (`"TooEarly"`, `"NotMinter"`, ...).
    pub fn kind(&self) -> &'static str {
        match self {
            CrowdfundingError::InvalidGoal => "InvalidGoal",
            CrowdfundingError::InvalidDuration => "InvalidDuration",
            CrowdfundingError::InvalidBeneficiary => "InvalidBeneficiary",
            CrowdfundingError::ZeroContribution => "ZeroContribution",
            CrowdfundingError::CampaignNotFound(_) => "CampaignNotFound",
            CrowdfundingError::CampaignEnded(_) => "CampaignEnded",
            CrowdfundingError::AlreadyFinalized(_) => "AlreadyFinalized",
            CrowdfundingError::TooEarly(_) => "TooEarly",
            CrowdfundingError::NotRefundable(_) => "NotRefundable",
            CrowdfundingError::NothingToRefund { .. } => "NothingToRefund",
            CrowdfundingError::TransferFailed(_) => "TransferFailed",
            CrowdfundingError::ReentrancyGuardReentrantCall => "ReentrancyGuardReentrantCall",
            CrowdfundingError::Reward(inner) => inner.kind(),
            CrowdfundingError::ArithmeticOverflow => "ArithmeticOverflow",
        }
    }

    /// Taxonomy class of the error.
    pub fn class(&self) -> ErrorClass {
        match self {
            CrowdfundingError::InvalidGoal
            | CrowdfundingError::InvalidDuration
            | CrowdfundingError::InvalidBeneficiary
            | CrowdfundingError::ZeroContribution => ErrorClass::InputValidation,
            CrowdfundingError::CampaignNotFound(_)
            | CrowdfundingError::CampaignEnded(_)
            | CrowdfundingError::AlreadyFinalized(_)
            | CrowdfundingError::TooEarly(_)
            | CrowdfundingError::NotRefundable(_)
            | CrowdfundingError::NothingToRefund { .. } => ErrorClass::Lifecycle,
            CrowdfundingError::ReentrancyGuardReentrantCall => ErrorClass::Safety,
            CrowdfundingError::TransferFailed(_) => ErrorClass::ValueTransfer,
            CrowdfundingError::Reward(inner) => match inner {
                TokenError::NotMinter { .. }
                | TokenError::UnauthorizedAccount { .. }
                | TokenError::InvalidOwner { .. } => ErrorClass::Authorization,
                TokenError::ZeroAddress => ErrorClass::InputValidation,
                _ => ErrorClass::Accounting,
            },
            CrowdfundingError::ArithmeticOverflow => ErrorClass::Accounting,
        }
    }
}

// ---------------------------------------------------------------------------
// Service
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct Ledger {
    store: CampaignStore,
    events: Vec<CrowdfundingEvent>,
}

/// The crowdfunding service: campaign ledger, engines, and their guard.
pub struct Crowdfunding {
    address: Address,
    reward_token: Arc<RewardToken>,
    reward_rate: Amount,
    clock: Arc<dyn Clock>,
    settlement: Arc<dyn Settlement>,
    guard: ReentrancyGuard,
    ledger: Mutex<Ledger>,
}

impl std::fmt::Debug for Crowdfunding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Crowdfunding")
            .field("address", &self.address)
            .field("reward_token", &self.reward_token.address())
            .field("reward_rate", &self.reward_rate)
            .field("campaigns", &self.campaign_count())
            .finish()
    }
}

impl Crowdfunding {
    /// Creates a service holding escrow at `address`.
    ///
    /// The service mints through `reward_token` as itself, so the token's
    /// owner must make `address` the minter before the first contribution.
    pub fn new(
        address: Address,
        reward_token: Arc<RewardToken>,
        clock: Arc<dyn Clock>,
        settlement: Arc<dyn Settlement>,
    ) -> Self {
        Self {
            address,
            reward_token,
            reward_rate: REWARD_RATE,
            clock,
            settlement,
            guard: ReentrancyGuard::new(),
            ledger: Mutex::new(Ledger::default()),
        }
    }

    // -- Reads --------------------------------------------------------------

    /// The service's own address; contributed value is escrowed here.
    pub fn address(&self) -> Address {
        self.address
    }

    /// The token rewards are minted in.
    pub fn reward_token(&self) -> &Arc<RewardToken> {
        &self.reward_token
    }

    /// Reward units minted per unit contributed.
    pub fn reward_rate(&self) -> Amount {
        self.reward_rate
    }

    /// Number of campaigns ever created.
    pub fn campaign_count(&self) -> u64 {
        self.ledger.lock().store.count()
    }

    /// Full record of campaign `id`.
    pub fn campaign(&self, id: CampaignId) -> Result<Campaign, CrowdfundingError> {
        self.ledger.lock().store.get(id).cloned()
    }

    /// Every campaign, in id order.
    pub fn campaigns(&self) -> Vec<Campaign> {
        self.ledger.lock().store.iter().cloned().collect()
    }

    /// `(active, ended, finalized, successful)` for campaign `id`, as of now.
    pub fn status(&self, id: CampaignId) -> Result<CampaignStatus, CrowdfundingError> {
        let now = self.clock.now();
        self.ledger.lock().store.get(id).map(|c| c.status(now))
    }

    /// What `contributor` currently has pledged in campaign `id`.
    pub fn contributions(&self, id: CampaignId, contributor: &Address) -> Amount {
        self.ledger.lock().store.contribution(id, contributor)
    }

    /// Every event emitted so far, in order.
    pub fn events(&self) -> Vec<CrowdfundingEvent> {
        self.ledger.lock().events.clone()
    }

    /// Events emitted after the first `cursor` ones.
    pub fn events_since(&self, cursor: usize) -> Vec<CrowdfundingEvent> {
        let ledger = self.ledger.lock();
        ledger.events.get(cursor..).map(<[_]>::to_vec).unwrap_or_default()
    }

    // -- Creation -----------------------------------------------------------

    /// Registers a campaign that ends `duration` seconds from now.
    ///
    /// # Errors
    ///
    /// [`CrowdfundingError::InvalidGoal`], [`CrowdfundingError::InvalidDuration`]
    /// or [`CrowdfundingError::InvalidBeneficiary`] for bad arguments.
    pub fn create_campaign(
        &self,
        creator: &Address,
        title: impl Into<String>,
        goal: Amount,
        duration: u64,
        beneficiary: &Address,
    ) -> Result<CampaignId, CrowdfundingError> {
        // Guarded so that a creation from inside another call's transfer
        // window cannot be wiped out by that call's rollback.
        let _entered = self.guard.enter()?;

        let title = title.into();
        let now = self.clock.now();
        let mut ledger = self.ledger.lock();

        let id = ledger
            .store
            .create(*creator, title.clone(), goal, duration, *beneficiary, now)?;
        let deadline = ledger.store.get(id)?.deadline;

        ledger.events.push(CrowdfundingEvent::CampaignCreated {
            id,
            creator: *creator,
            beneficiary: *beneficiary,
            title: title.clone(),
            goal,
            deadline,
        });

        tracing::info!(
            campaign = id,
            %creator,
            %beneficiary,
            title = %title,
            goal = %goal,
            deadline,
            "campaign created"
        );
        Ok(id)
    }

    // -- Unit of work -------------------------------------------------------

    /// Runs `body` as one all-or-nothing guarded call touching campaign `id`
    /// and, if given, `contributor`'s ledger entry.
    fn atomically<T>(
        &self,
        operation: &'static str,
        id: CampaignId,
        contributor: Option<&Address>,
        body: impl FnOnce() -> Result<T, CrowdfundingError>,
    ) -> Result<T, CrowdfundingError> {
        let _entered = self.guard.enter().map_err(|err| {
            tracing::warn!(operation, campaign = id, "reentrant call rejected");
            CrowdfundingError::from(err)
        })?;

        let rollback = {
            let ledger = self.ledger.lock();
            Rollback {
                ledger: &self.ledger,
                checkpoint: Some(ledger.store.checkpoint(id, contributor)),
                events_len: ledger.events.len(),
                operation,
                id,
            }
        };

        match body() {
            Ok(value) => {
                rollback.commit();
                Ok(value)
            }
            Err(err) => {
                tracing::warn!(operation, campaign = id, error = %err, "call aborted");
                Err(err)
            }
        }
    }
}

/// Restores the captured checkpoint when dropped, unless committed.
///
/// Runs on the error path and while unwinding out of a panicking
/// settlement or mint, so a call either commits or leaves the ledger as
/// it found it.
struct Rollback<'a> {
    ledger: &'a Mutex<Ledger>,
    checkpoint: Option<Checkpoint>,
    events_len: usize,
    operation: &'static str,
    id: CampaignId,
}

impl Rollback<'_> {
    fn commit(mut self) {
        self.checkpoint = None;
    }
}

impl Drop for Rollback<'_> {
    fn drop(&mut self) {
        if let Some(checkpoint) = self.checkpoint.take() {
            let mut ledger = self.ledger.lock();
            ledger.store.restore(checkpoint);
            ledger.events.truncate(self.events_len);
            tracing::warn!(
                operation = self.operation,
                campaign = self.id,
                "ledger rolled back"
            );
        }
    }
}
