//! # Reward Token
//!
//! The fungible "support badge" credited to contributors. A standard
//! balance/allowance ledger with two capabilities layered on top:
//!
//! - **owner**: may hand the minting capability to someone else, transfer
//!   ownership, or renounce it.
//! - **minter**: the only identity allowed to grow the supply. In a deployed
//!   system this is the crowdfunding service; until the owner calls
//!   [`set_minter`](RewardToken::set_minter) nobody can mint.
//!
//! ## Security Model
//!
//! - **Capability checks are inline.** Every privileged call takes the
//!   caller's address and compares it against the single authority field.
//! - **Validate, then apply.** Every operation computes all new balances with
//!   checked arithmetic before writing any of them, so a rejected call leaves
//!   the ledger exactly as it was.
//! - **Supply is conserved.** `transfer` and `transfer_from` move balance;
//!   only `mint` changes `total_supply`.

use std::collections::HashMap;

use charity_protocol::{Address, Amount};
use parking_lot::Mutex;
use thiserror::Error;

use crate::events::TokenEvent;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that can occur during reward token operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TokenError {
    /// The caller is not the configured minter.
    #[error("NotMinter: {caller} may not mint")]
    NotMinter {
        /// The identity that attempted to mint.
        caller: Address,
    },

    /// The caller is not the owner.
    #[error("OwnableUnauthorizedAccount: {account}")]
    UnauthorizedAccount {
        /// The identity that attempted an owner-only call.
        account: Address,
    },

    /// Ownership cannot be transferred to this address.
    #[error("OwnableInvalidOwner: {owner}")]
    InvalidOwner {
        /// The rejected target.
        owner: Address,
    },

    /// A required address argument was null.
    #[error("ZeroAddress")]
    ZeroAddress,

    /// The sender lacks the balance for a transfer.
    #[error("ERC20InsufficientBalance: {sender} has {balance}, needs {needed}")]
    InsufficientBalance {
        /// The debited account.
        sender: Address,
        /// Its current balance.
        balance: Amount,
        /// The amount the transfer required.
        needed: Amount,
    },

    /// The spender's allowance is too small.
    #[error("ERC20InsufficientAllowance: {spender} may spend {allowance}, needs {needed}")]
    InsufficientAllowance {
        /// The identity spending on someone else's behalf.
        spender: Address,
        /// What it is currently allowed.
        allowance: Amount,
        /// The amount the transfer required.
        needed: Amount,
    },

    /// Null sender.
    #[error("ERC20InvalidSender: {0}")]
    InvalidSender(Address),

    /// Null receiver.
    #[error("ERC20InvalidReceiver: {0}")]
    InvalidReceiver(Address),

    /// Null approver.
    #[error("ERC20InvalidApprover: {0}")]
    InvalidApprover(Address),

    /// Null spender.
    #[error("ERC20InvalidSpender: {0}")]
    InvalidSpender(Address),

    /// Minting would push the supply past `Amount::MAX`.
    #[error("supply overflow: minting {amount} would exceed the maximum supply")]
    SupplyOverflow {
        /// The amount that was attempted.
        amount: Amount,
    },
}

impl TokenError {
    /// Stable kind name, suitable for machine consumption.
    pub fn kind(&self) -> &'static str {
        match self {
            TokenError::NotMinter { .. } => "NotMinter",
            TokenError::UnauthorizedAccount { .. } => "OwnableUnauthorizedAccount",
            TokenError::InvalidOwner { .. } => "OwnableInvalidOwner",
            TokenError::ZeroAddress => "ZeroAddress",
            TokenError::InsufficientBalance { .. } => "ERC20InsufficientBalance",
            TokenError::InsufficientAllowance { .. } => "ERC20InsufficientAllowance",
            TokenError::InvalidSender(_) => "ERC20InvalidSender",
            TokenError::InvalidReceiver(_) => "ERC20InvalidReceiver",
            TokenError::InvalidApprover(_) => "ERC20InvalidApprover",
            TokenError::InvalidSpender(_) => "ERC20InvalidSpender",
            TokenError::SupplyOverflow { .. } => "SupplyOverflow",
        }
    }
}

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct TokenState {
    balances: HashMap<Address, Amount>,
    allowances: HashMap<(Address, Address), Amount>,
    total_supply: Amount,
    owner: Address,
    minter: Address,
    events: Vec<TokenEvent>,
}

impl TokenState {
    fn balance(&self, account: &Address) -> Amount {
        self.balances.get(account).copied().unwrap_or(0)
    }

    fn allowance(&self, owner: &Address, spender: &Address) -> Amount {
        self.allowances
            .get(&(*owner, *spender))
            .copied()
            .unwrap_or(0)
    }

    fn require_owner(&self, caller: &Address) -> Result<(), TokenError> {
        if self.owner.is_zero() || self.owner != *caller {
            return Err(TokenError::UnauthorizedAccount { account: *caller });
        }
        Ok(())
    }

    /// Moves balance between two non-null accounts.
    fn move_balance(
        &mut self,
        from: &Address,
        to: &Address,
        value: Amount,
    ) -> Result<(), TokenError> {
        if from.is_zero() {
            return Err(TokenError::InvalidSender(*from));
        }
        if to.is_zero() {
            return Err(TokenError::InvalidReceiver(*to));
        }

        let from_balance = self.balance(from);
        if from_balance < value {
            return Err(TokenError::InsufficientBalance {
                sender: *from,
                balance: from_balance,
                needed: value,
            });
        }

        if from != to {
            // Cannot overflow: value <= from_balance and total supply bounds both.
            let to_balance = self.balance(to) + value;
            self.balances.insert(*from, from_balance - value);
            self.balances.insert(*to, to_balance);
        }

        self.events.push(TokenEvent::Transfer {
            from: *from,
            to: *to,
            value,
        });
        Ok(())
    }

    fn transfer_ownership_unchecked(&mut self, new_owner: Address) {
        let previous_owner = std::mem::replace(&mut self.owner, new_owner);
        self.events.push(TokenEvent::OwnershipTransferred {
            previous_owner,
            new_owner,
        });
    }
}

/// The reward credit ledger.
///
/// Methods take `&self`: the token is shared (behind an `Arc`) between the
/// crowdfunding service and whoever else holds balances, and every call
/// is serialized through an internal lock that is never held across a call
/// into other code.
#[derive(Debug)]
pub struct RewardToken {
    address: Address,
    name: String,
    symbol: String,
    decimals: u8,
    state: Mutex<TokenState>,
}

impl RewardToken {
    /// Creates a token owned by `owner`, with no minter and zero supply.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::InvalidOwner`] if `owner` is the null address.
    pub fn new(
        address: Address,
        name: impl Into<String>,
        symbol: impl Into<String>,
        decimals: u8,
        owner: Address,
    ) -> Result<Self, TokenError> {
        if owner.is_zero() {
            return Err(TokenError::InvalidOwner { owner });
        }

        let mut state = TokenState::default();
        state.transfer_ownership_unchecked(owner);

        Ok(Self {
            address,
            name: name.into(),
            symbol: symbol.into(),
            decimals,
            state: Mutex::new(state),
        })
    }

    // -- Metadata -----------------------------------------------------------

    /// The token's own address.
    pub fn address(&self) -> Address {
        self.address
    }

    /// Human-readable name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Ticker symbol.
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Decimal places.
    pub fn decimals(&self) -> u8 {
        self.decimals
    }

    // -- Reads --------------------------------------------------------------

    /// Total units in existence.
    pub fn total_supply(&self) -> Amount {
        self.state.lock().total_supply
    }

    /// Balance of `account` (zero if never credited).
    pub fn balance_of(&self, account: &Address) -> Amount {
        self.state.lock().balance(account)
    }

    /// What `spender` may still move out of `owner`'s balance.
    pub fn allowance(&self, owner: &Address, spender: &Address) -> Amount {
        self.state.lock().allowance(owner, spender)
    }

    /// Current owner, or the null address after renouncement.
    pub fn owner(&self) -> Address {
        self.state.lock().owner
    }

    /// Current minter, or the null address if none was ever set.
    pub fn minter(&self) -> Address {
        self.state.lock().minter
    }

    /// Every event emitted so far, in order.
    pub fn events(&self) -> Vec<TokenEvent> {
        self.state.lock().events.clone()
    }

    /// Events emitted after the first `cursor` ones.
    pub fn events_since(&self, cursor: usize) -> Vec<TokenEvent> {
        let state = self.state.lock();
        state.events.get(cursor..).map(<[_]>::to_vec).unwrap_or_default()
    }

    // -- Minting ------------------------------------------------------------

    /// Creates `amount` new units in `to`'s balance.
    ///
    /// # Errors
    ///
    /// - [`TokenError::NotMinter`] unless `caller` is the minter.
    /// - [`TokenError::InvalidReceiver`] if `to` is the null address.
    /// - [`TokenError::SupplyOverflow`] if the supply would overflow.
    pub fn mint(&self, caller: &Address, to: &Address, amount: Amount) -> Result<(), TokenError> {
        let mut state = self.state.lock();

        if state.minter.is_zero() || state.minter != *caller {
            return Err(TokenError::NotMinter { caller: *caller });
        }
        if to.is_zero() {
            return Err(TokenError::InvalidReceiver(*to));
        }

        let new_supply = state
            .total_supply
            .checked_add(amount)
            .ok_or(TokenError::SupplyOverflow { amount })?;
        // A balance never exceeds the supply, so this cannot overflow once
        // the supply check passed.
        let new_balance = state.balance(to) + amount;

        state.total_supply = new_supply;
        state.balances.insert(*to, new_balance);
        state.events.push(TokenEvent::Transfer {
            from: Address::ZERO,
            to: *to,
            value: amount,
        });

        tracing::debug!(token = %self.symbol, %to, amount = %amount, "reward minted");
        Ok(())
    }

    /// Hands the minting capability to `new_minter`.
    ///
    /// # Errors
    ///
    /// - [`TokenError::UnauthorizedAccount`] unless `caller` is the owner.
    /// - [`TokenError::ZeroAddress`] if `new_minter` is the null address.
    pub fn set_minter(&self, caller: &Address, new_minter: &Address) -> Result<(), TokenError> {
        let mut state = self.state.lock();
        state.require_owner(caller)?;
        if new_minter.is_zero() {
            return Err(TokenError::ZeroAddress);
        }

        let previous_minter = std::mem::replace(&mut state.minter, *new_minter);
        state.events.push(TokenEvent::MinterUpdated {
            previous_minter,
            new_minter: *new_minter,
        });

        tracing::info!(token = %self.symbol, %previous_minter, %new_minter, "minter updated");
        Ok(())
    }

    // -- Ownership ----------------------------------------------------------

    /// Passes ownership to `new_owner`.
    ///
    /// # Errors
    ///
    /// - [`TokenError::UnauthorizedAccount`] unless `caller` is the owner.
    /// - [`TokenError::InvalidOwner`] if `new_owner` is the null address.
    pub fn transfer_ownership(&self, caller: &Address, new_owner: &Address) -> Result<(), TokenError> {
        let mut state = self.state.lock();
        state.require_owner(caller)?;
        if new_owner.is_zero() {
            return Err(TokenError::InvalidOwner { owner: *new_owner });
        }
        state.transfer_ownership_unchecked(*new_owner);
        tracing::info!(token = %self.symbol, %new_owner, "ownership transferred");
        Ok(())
    }

    /// Gives up ownership for good. The minter keeps minting, but nobody
    /// can ever change it again.
    pub fn renounce_ownership(&self, caller: &Address) -> Result<(), TokenError> {
        let mut state = self.state.lock();
        state.require_owner(caller)?;
        state.transfer_ownership_unchecked(Address::ZERO);
        tracing::info!(token = %self.symbol, "ownership renounced");
        Ok(())
    }

    // -- ERC-20 -------------------------------------------------------------

    /// Moves `value` from `caller` to `to`.
    pub fn transfer(&self, caller: &Address, to: &Address, value: Amount) -> Result<(), TokenError> {
        self.state.lock().move_balance(caller, to, value)
    }

    /// Sets `spender`'s allowance over `caller`'s balance to `value`.
    pub fn approve(&self, caller: &Address, spender: &Address, value: Amount) -> Result<(), TokenError> {
        if caller.is_zero() {
            return Err(TokenError::InvalidApprover(*caller));
        }
        if spender.is_zero() {
            return Err(TokenError::InvalidSpender(*spender));
        }

        let mut state = self.state.lock();
        state.allowances.insert((*caller, *spender), value);
        state.events.push(TokenEvent::Approval {
            owner: *caller,
            spender: *spender,
            value,
        });
        Ok(())
    }

    /// Moves `value` from `from` to `to`, spending `caller`'s allowance.
    ///
    /// An allowance of `Amount::MAX` is unlimited and is not decremented.
    pub fn transfer_from(
        &self,
        caller: &Address,
        from: &Address,
        to: &Address,
        value: Amount,
    ) -> Result<(), TokenError> {
        let mut state = self.state.lock();

        let allowance = state.allowance(from, caller);
        if allowance < value {
            return Err(TokenError::InsufficientAllowance {
                spender: *caller,
                allowance,
                needed: value,
            });
        }

        // Spending a finite allowance checks its parties before the balance
        // checks run.
        if allowance != Amount::MAX {
            if from.is_zero() {
                return Err(TokenError::InvalidApprover(*from));
            }
            if caller.is_zero() {
                return Err(TokenError::InvalidSpender(*caller));
            }
        }

        // Transfer first: if it fails, the allowance is still untouched.
        state.move_balance(from, to, value)?;

        if allowance != Amount::MAX {
            state.allowances.insert((*from, *caller), allowance - value);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(label: &str) -> Address {
        Address::from_label(label)
    }

    fn token() -> RewardToken {
        let token = RewardToken::new(addr("token"), "SupportBadge", "RWD", 18, addr("owner")).unwrap();
        token.set_minter(&addr("owner"), &addr("minter")).unwrap();
        token
    }

    #[test]
    fn new_token_has_owner_and_no_minter() {
        let token = RewardToken::new(addr("token"), "SupportBadge", "RWD", 18, addr("owner")).unwrap();
        assert_eq!(token.owner(), addr("owner"));
        assert!(token.minter().is_zero());
        assert_eq!(token.total_supply(), 0);
        assert_eq!(token.symbol(), "RWD");
        assert_eq!(token.decimals(), 18);
    }

    #[test]
    fn null_owner_rejected_at_construction() {
        assert!(matches!(
            RewardToken::new(addr("token"), "n", "s", 18, Address::ZERO),
            Err(TokenError::InvalidOwner { .. })
        ));
    }

    #[test]
    fn nobody_can_mint_before_minter_is_set() {
        let token = RewardToken::new(addr("token"), "n", "s", 18, addr("owner")).unwrap();
        assert_eq!(
            token.mint(&addr("owner"), &addr("alice"), 1),
            Err(TokenError::NotMinter { caller: addr("owner") })
        );
    }

    #[test]
    fn mint_increases_supply_and_balance() {
        let token = token();
        token.mint(&addr("minter"), &addr("alice"), 1_000).unwrap();
        assert_eq!(token.total_supply(), 1_000);
        assert_eq!(token.balance_of(&addr("alice")), 1_000);
        assert_eq!(
            token.events().last(),
            Some(&TokenEvent::Transfer {
                from: Address::ZERO,
                to: addr("alice"),
                value: 1_000,
            })
        );
    }

    #[test]
    fn mint_to_null_rejected() {
        let token = token();
        assert_eq!(
            token.mint(&addr("minter"), &Address::ZERO, 1),
            Err(TokenError::InvalidReceiver(Address::ZERO))
        );
    }

    #[test]
    fn mint_overflow_rejected_without_effect() {
        let token = token();
        token.mint(&addr("minter"), &addr("alice"), Amount::MAX).unwrap();
        assert!(matches!(
            token.mint(&addr("minter"), &addr("bob"), 1),
            Err(TokenError::SupplyOverflow { amount: 1 })
        ));
        assert_eq!(token.balance_of(&addr("bob")), 0);
    }

    #[test]
    fn set_minter_is_owner_only_and_non_null() {
        let token = token();
        assert_eq!(
            token.set_minter(&addr("mallory"), &addr("mallory")),
            Err(TokenError::UnauthorizedAccount { account: addr("mallory") })
        );
        assert_eq!(
            token.set_minter(&addr("owner"), &Address::ZERO),
            Err(TokenError::ZeroAddress)
        );
        token.set_minter(&addr("owner"), &addr("new-minter")).unwrap();
        assert_eq!(token.minter(), addr("new-minter"));
    }

    #[test]
    fn transfer_conserves_supply() {
        let token = token();
        token.mint(&addr("minter"), &addr("alice"), 100).unwrap();
        token.transfer(&addr("alice"), &addr("bob"), 40).unwrap();
        assert_eq!(token.balance_of(&addr("alice")), 60);
        assert_eq!(token.balance_of(&addr("bob")), 40);
        assert_eq!(token.total_supply(), 100);
    }

    #[test]
    fn transfer_reports_balance_shortfall() {
        let token = token();
        token.mint(&addr("minter"), &addr("alice"), 10).unwrap();
        assert_eq!(
            token.transfer(&addr("alice"), &addr("bob"), 11),
            Err(TokenError::InsufficientBalance {
                sender: addr("alice"),
                balance: 10,
                needed: 11,
            })
        );
    }

    #[test]
    fn null_parties_rejected() {
        let token = token();
        assert_eq!(
            token.transfer(&Address::ZERO, &addr("bob"), 0),
            Err(TokenError::InvalidSender(Address::ZERO))
        );
        assert_eq!(
            token.transfer(&addr("alice"), &Address::ZERO, 0),
            Err(TokenError::InvalidReceiver(Address::ZERO))
        );
        assert_eq!(
            token.approve(&Address::ZERO, &addr("bob"), 1),
            Err(TokenError::InvalidApprover(Address::ZERO))
        );
        assert_eq!(
            token.approve(&addr("alice"), &Address::ZERO, 1),
            Err(TokenError::InvalidSpender(Address::ZERO))
        );
    }

    #[test]
    fn transfer_from_null_parties_fail_on_the_allowance() {
        let token = token();
        assert_eq!(
            token.transfer_from(&addr("spender"), &Address::ZERO, &addr("bob"), 0),
            Err(TokenError::InvalidApprover(Address::ZERO))
        );
        assert_eq!(
            token.transfer_from(&Address::ZERO, &addr("alice"), &addr("bob"), 0),
            Err(TokenError::InvalidSpender(Address::ZERO))
        );
        // A short allowance is reported before either party is checked.
        assert!(matches!(
            token.transfer_from(&addr("spender"), &Address::ZERO, &addr("bob"), 1),
            Err(TokenError::InsufficientAllowance { .. })
        ));
    }

    #[test]
    fn transfer_from_consumes_allowance() {
        let token = token();
        token.mint(&addr("minter"), &addr("alice"), 100).unwrap();
        token.approve(&addr("alice"), &addr("spender"), 30).unwrap();

        token
            .transfer_from(&addr("spender"), &addr("alice"), &addr("bob"), 20)
            .unwrap();
        assert_eq!(token.allowance(&addr("alice"), &addr("spender")), 10);
        assert_eq!(token.balance_of(&addr("bob")), 20);

        assert_eq!(
            token.transfer_from(&addr("spender"), &addr("alice"), &addr("bob"), 11),
            Err(TokenError::InsufficientAllowance {
                spender: addr("spender"),
                allowance: 10,
                needed: 11,
            })
        );
    }

    #[test]
    fn failed_transfer_from_keeps_allowance() {
        let token = token();
        token.mint(&addr("minter"), &addr("alice"), 5).unwrap();
        token.approve(&addr("alice"), &addr("spender"), 50).unwrap();
        assert!(matches!(
            token.transfer_from(&addr("spender"), &addr("alice"), &addr("bob"), 10),
            Err(TokenError::InsufficientBalance { .. })
        ));
        assert_eq!(token.allowance(&addr("alice"), &addr("spender")), 50);
    }

    #[test]
    fn unlimited_allowance_is_not_decremented() {
        let token = token();
        token.mint(&addr("minter"), &addr("alice"), 100).unwrap();
        token.approve(&addr("alice"), &addr("spender"), Amount::MAX).unwrap();
        token
            .transfer_from(&addr("spender"), &addr("alice"), &addr("bob"), 60)
            .unwrap();
        assert_eq!(token.allowance(&addr("alice"), &addr("spender")), Amount::MAX);
    }

    #[test]
    fn ownership_transfer_and_renounce() {
        let token = token();
        assert_eq!(
            token.transfer_ownership(&addr("owner"), &Address::ZERO),
            Err(TokenError::InvalidOwner { owner: Address::ZERO })
        );
        token.transfer_ownership(&addr("owner"), &addr("heir")).unwrap();
        assert_eq!(token.owner(), addr("heir"));
        assert!(token.set_minter(&addr("owner"), &addr("x")).is_err());

        token.renounce_ownership(&addr("heir")).unwrap();
        assert!(token.owner().is_zero());
        assert_eq!(
            token.set_minter(&addr("heir"), &addr("x")),
            Err(TokenError::UnauthorizedAccount { account: addr("heir") })
        );
        // The existing minter keeps its capability.
        token.mint(&addr("minter"), &addr("alice"), 1).unwrap();
    }

    #[test]
    fn events_since_returns_tail() {
        let token = token();
        let cursor = token.events().len();
        token.mint(&addr("minter"), &addr("alice"), 1).unwrap();
        assert_eq!(token.events_since(cursor).len(), 1);
        assert!(token.events_since(cursor + 10).is_empty());
    }
}
