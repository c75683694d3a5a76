// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Charity Protocol: Shared Primitives
//!
//! Everything the crowdfunding ledger needs from the world around it, and
//! nothing more. The ledger itself lives in `charity-contracts`; this crate
//! holds the vocabulary both the ledger and its host speak:
//!
//! - **identity**: 20-byte account addresses, including the null identity.
//! - **clock**: the time source. The ledger never calls `now()` on its own.
//! - **settlement**: "move funds to an identity", the one capability the
//!   ledger depends on but does not implement.
//! - **config**: protocol constants (reward rate, token metadata, ports).
//!
//! ## Design Philosophy
//!
//! 1. Time and value transfer are injected, never ambient. Tests control both.
//! 2. Money is `u128` and every operation on it is checked.
//! 3. If it touches money, it has tests. Plural.

pub mod clock;
pub mod config;
pub mod identity;
pub mod settlement;

pub use clock::{Clock, ManualClock, SystemClock, Timestamp};
pub use identity::Address;
pub use settlement::{Amount, NativeBank, Settlement, TransferError};
