//! # Protocol Configuration & Constants
//!
//! Every magic number in the crowdfunding ledger lives here. If you're
//! hardcoding a constant somewhere else, you're doing it wrong.
//!
//! The reward rate and token metadata are part of the ledger's observable
//! behavior: changing them after launch changes what contributors are owed.

// ---------------------------------------------------------------------------
// Protocol Version
// ---------------------------------------------------------------------------

/// The full protocol version string.
pub const PROTOCOL_VERSION: &str = "0.1.0";

// ---------------------------------------------------------------------------
// Rewards
// ---------------------------------------------------------------------------

/// Reward units minted per unit of value contributed.
///
/// Both the native value and the reward token use 18 decimals, so a rate of
/// 100 means one whole coin pledged earns one hundred whole badges.
pub const REWARD_RATE: u128 = 100;

/// Display name of the reward token.
pub const REWARD_TOKEN_NAME: &str = "SupportBadge";

/// Ticker of the reward token.
pub const REWARD_TOKEN_SYMBOL: &str = "RWD";

/// Decimal places of the reward token. Same as the native unit, on purpose.
pub const REWARD_TOKEN_DECIMALS: u8 = 18;

/// One whole native coin in the smallest unit (10^18).
pub const ONE_COIN: u128 = 1_000_000_000_000_000_000;

// ---------------------------------------------------------------------------
// Node Defaults
// ---------------------------------------------------------------------------

/// Default JSON-RPC / REST port.
pub const DEFAULT_RPC_PORT: u16 = 8545;

/// Default Prometheus metrics port.
pub const DEFAULT_METRICS_PORT: u16 = 9742;

/// Broadcast channel capacity for live event streaming. Large enough to
/// absorb a burst of contributions without dropping events for slow
/// WebSocket clients.
pub const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Native value the dev faucet hands out per request: 10 coins.
pub const DEV_FAUCET_AMOUNT: u128 = 10 * ONE_COIN;

/// Label the dev network derives the deployer address from when none is
/// configured.
pub const DEFAULT_DEPLOYER_LABEL: &str = "deployer";
