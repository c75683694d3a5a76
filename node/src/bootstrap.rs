//! # Deployment
//!
//! Brings up the two contracts the way a fresh network would see them
//! deployed:
//!
//! 1. the deployer creates the reward token at `derive_contract(deployer, 0)`
//!    and becomes its owner;
//! 2. the crowdfunding service is created at `derive_contract(deployer, 1)`,
//!    bound to that token;
//! 3. the deployer hands the token's minter role to the service.
//!
//! Escrowed value lives in a [`NativeBank`] shared by the service and the
//! RPC layer.

use std::sync::Arc;

use charity_contracts::{Crowdfunding, RewardToken, TokenError};
use charity_protocol::config::{REWARD_TOKEN_DECIMALS, REWARD_TOKEN_NAME, REWARD_TOKEN_SYMBOL};
use charity_protocol::{Address, Clock, NativeBank};

/// The deployed contracts and the balance book behind them.
pub struct Deployment {
    /// Account that deployed both contracts and owns the token.
    pub deployer: Address,
    /// Reward token, minter set to the crowdfunding service.
    pub token: Arc<RewardToken>,
    /// The crowdfunding service.
    pub crowdfunding: Arc<Crowdfunding>,
    /// Native balances, escrow included.
    pub bank: Arc<NativeBank>,
    /// Time source shared with the service.
    pub clock: Arc<dyn Clock>,
}

/// Deploys the token and the service and wires the minter role.
///
/// # Errors
///
/// [`TokenError::InvalidOwner`] if `deployer` is the null address.
pub fn deploy(deployer: Address, clock: Arc<dyn Clock>) -> Result<Deployment, TokenError> {
    let token = Arc::new(RewardToken::new(
        Address::derive_contract(&deployer, 0),
        REWARD_TOKEN_NAME,
        REWARD_TOKEN_SYMBOL,
        REWARD_TOKEN_DECIMALS,
        deployer,
    )?);
    tracing::info!(address = %token.address(), owner = %deployer, "reward token deployed");

    let bank = Arc::new(NativeBank::new());
    let crowdfunding = Arc::new(Crowdfunding::new(
        Address::derive_contract(&deployer, 1),
        Arc::clone(&token),
        Arc::clone(&clock),
        bank.clone(),
    ));
    tracing::info!(
        address = %crowdfunding.address(),
        reward_token = %token.address(),
        "crowdfunding deployed"
    );

    token.set_minter(&deployer, &crowdfunding.address())?;

    Ok(Deployment {
        deployer,
        token,
        crowdfunding,
        bank,
        clock,
    })
}
