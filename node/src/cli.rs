//! # CLI Interface
//!
//! Defines the command-line argument structure for `charity-node` using
//! `clap` derive. Two subcommands: `run` and `version`.

use charity_protocol::config::{DEFAULT_DEPLOYER_LABEL, DEFAULT_METRICS_PORT, DEFAULT_RPC_PORT};
use charity_protocol::Address;
use clap::{Parser, Subcommand};

/// Charity crowdfunding node.
///
/// Deploys the reward token and the crowdfunding service into an in-memory
/// ledger, serves them over JSON-RPC, and exposes Prometheus metrics.
#[derive(Parser, Debug)]
#[command(
    name = "charity-node",
    about = "Charity crowdfunding node",
    version,
    propagate_version = true
)]
pub struct CharityNodeCli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands for the node binary.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Deploy the contracts and start serving.
    Run(RunArgs),
    /// Print version information and exit.
    Version,
}

/// Arguments for the `run` subcommand.
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Port for the JSON-RPC and REST API.
    #[arg(long, env = "CHARITY_RPC_PORT", default_value_t = DEFAULT_RPC_PORT)]
    pub rpc_port: u16,

    /// Port for the Prometheus metrics endpoint.
    #[arg(long, env = "CHARITY_METRICS_PORT", default_value_t = DEFAULT_METRICS_PORT)]
    pub metrics_port: u16,

    /// Deploying account: a `0x` address, or a label hashed into one.
    ///
    /// The deployer owns the reward token after startup.
    #[arg(long, env = "CHARITY_DEPLOYER", default_value = DEFAULT_DEPLOYER_LABEL)]
    pub deployer: String,

    /// Network identifier. The dev faucet is only served on `devnet`.
    #[arg(long, env = "CHARITY_NETWORK", default_value = "devnet")]
    pub network: String,

    /// Log output format: `pretty` or `json`.
    #[arg(long, env = "CHARITY_LOG_FORMAT", default_value = "pretty")]
    pub log_format: String,
}

impl RunArgs {
    /// Resolves `--deployer` to an address.
    pub fn deployer_address(&self) -> Address {
        self.deployer
            .parse()
            .unwrap_or_else(|_| Address::from_label(&self.deployer))
    }

    /// Whether the dev faucet RPC is enabled.
    pub fn faucet_enabled(&self) -> bool {
        self.network == "devnet"
    }
}
