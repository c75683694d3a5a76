//! # Value Settlement
//!
//! The ledger records who pledged what, but it does not move money itself.
//! Releasing funds to a beneficiary or returning a pledge is delegated to a
//! [`Settlement`] implementation supplied by the host environment.
//!
//! A settlement call either moves the full amount or moves nothing and
//! returns an error. The ledger relies on that to roll its own state back.
//!
//! [`NativeBank`] is the in-memory implementation used by the node and by
//! tests: a flat balance book with checked arithmetic.

use std::collections::HashMap;

use parking_lot::Mutex;
use thiserror::Error;

use crate::identity::Address;

/// An amount of value in the smallest unit.
pub type Amount = u128;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Why a value transfer did not happen.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransferError {
    /// The paying account does not hold enough value.
    #[error("insufficient funds in {account}: available {available}, requested {requested}")]
    InsufficientFunds {
        /// The paying account.
        account: Address,
        /// What it currently holds.
        available: Amount,
        /// What the transfer asked for.
        requested: Amount,
    },

    /// Value cannot be sent to the null identity.
    #[error("cannot transfer to the null address")]
    NullRecipient,

    /// Crediting the recipient would overflow its balance.
    #[error("balance overflow crediting {account}")]
    Overflow {
        /// The account that would have overflowed.
        account: Address,
    },

    /// The receiving side refused the transfer.
    #[error("transfer rejected by {account}: {reason}")]
    Rejected {
        /// The refusing account.
        account: Address,
        /// Free-form reason from the receiver.
        reason: String,
    },
}

impl TransferError {
    /// Stable kind name, for wire error payloads.
    pub fn kind(&self) -> &'static str {
        match self {
            TransferError::InsufficientFunds { .. } => "InsufficientFunds",
            TransferError::NullRecipient => "NullRecipient",
            TransferError::Overflow { .. } => "Overflow",
            TransferError::Rejected { .. } => "Rejected",
        }
    }
}

// ---------------------------------------------------------------------------
// Settlement
// ---------------------------------------------------------------------------

/// "Move funds to an identity."
///
/// Implementations may call back into arbitrary code (a recipient hook, a
/// remote node). Callers must treat a transfer as an untrusted interaction.
pub trait Settlement: Send + Sync {
    /// Moves `amount` from `from` to `to`, all or nothing.
    fn transfer(&self, from: &Address, to: &Address, amount: Amount) -> Result<(), TransferError>;
}

// ---------------------------------------------------------------------------
// NativeBank
// ---------------------------------------------------------------------------

/// In-memory native balance book.
#[derive(Debug, Default)]
pub struct NativeBank {
    balances: Mutex<HashMap<Address, Amount>>,
}

impl NativeBank {
    /// Creates an empty bank.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mints native value into `account`. Dev networks and tests only.
    pub fn credit(&self, account: &Address, amount: Amount) -> Result<Amount, TransferError> {
        let mut balances = self.balances.lock();
        let balance = balances.entry(*account).or_insert(0);
        *balance = balance
            .checked_add(amount)
            .ok_or(TransferError::Overflow { account: *account })?;
        Ok(*balance)
    }

    /// Current balance of `account` (zero if never seen).
    pub fn balance_of(&self, account: &Address) -> Amount {
        self.balances.lock().get(account).copied().unwrap_or(0)
    }

    /// Sum of all balances.
    pub fn total(&self) -> Amount {
        self.balances
            .lock()
            .values()
            .fold(0u128, |acc, b| acc.saturating_add(*b))
    }
}

impl Settlement for NativeBank {
    fn transfer(&self, from: &Address, to: &Address, amount: Amount) -> Result<(), TransferError> {
        if to.is_zero() {
            return Err(TransferError::NullRecipient);
        }

        let mut balances = self.balances.lock();

        let available = balances.get(from).copied().unwrap_or(0);
        if available < amount {
            return Err(TransferError::InsufficientFunds {
                account: *from,
                available,
                requested: amount,
            });
        }

        if from == to {
            return Ok(());
        }

        let receiver_balance = balances.get(to).copied().unwrap_or(0);
        let credited = receiver_balance
            .checked_add(amount)
            .ok_or(TransferError::Overflow { account: *to })?;

        // Both sides validated; apply.
        balances.insert(*from, available - amount);
        balances.insert(*to, credited);

        tracing::debug!(%from, %to, amount = %amount, "native transfer settled");
        Ok(())
    }
}
