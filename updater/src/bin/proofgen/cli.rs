use std::path::PathBuf;

use alloy::transports::http::reqwest::Url;
use clap::{Args, Parser, Subcommand, ValueHint};
use ethereum_types::H160;
use gauge_proofs::slots::{DEFAULT_POINTS_WEIGHT_SLOT, DEFAULT_VOTE_USER_SLOPES_SLOT};
use updater::config::{DEFAULT_BLOCK_OFFSET, WEEK};

const SOURCE_HELP_HEADING: &str = "Block source options";
const CONTROLLER_HELP_HEADING: &str = "Controller options";

/// Proof bundle generator for gauge vote oracles
#[derive(Parser)]
#[command(version, propagate_version = true)]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub(crate) command: Command,

    #[clap(flatten)]
    pub(crate) source: SourceArgs,

    #[clap(flatten)]
    pub(crate) layout: LayoutArgs,
}

#[derive(Args)]
pub(crate) struct SourceArgs {
    /// The node RPC URL.
    #[arg(short = 'u', long, env = "UPDATER_RPC_URL", value_hint = ValueHint::Url, help_heading = SOURCE_HELP_HEADING, conflicts_with = "fixture")]
    pub(crate) rpc_url: Option<Url>,

    /// A recorded fixture file to replay instead of a live node.
    #[arg(long, env = "UPDATER_FIXTURE", value_hint = ValueHint::FilePath, help_heading = SOURCE_HELP_HEADING)]
    pub(crate) fixture: Option<PathBuf>,
}

#[derive(Args)]
pub(crate) struct LayoutArgs {
    /// The gauge controller contract address.
    #[arg(short, long, env = "UPDATER_CONTROLLER", value_parser = parse_address, help_heading = CONTROLLER_HELP_HEADING)]
    pub(crate) controller: H160,

    /// Storage slot of the controller's points weight mapping.
    #[arg(long, env = "UPDATER_POINTS_WEIGHT_SLOT", default_value_t = DEFAULT_POINTS_WEIGHT_SLOT, help_heading = CONTROLLER_HELP_HEADING)]
    pub(crate) points_weight_slot: u64,

    /// Storage slot of the controller's vote user slopes mapping.
    #[arg(long, env = "UPDATER_VOTE_USER_SLOPES_SLOT", default_value_t = DEFAULT_VOTE_USER_SLOPES_SLOT, help_heading = CONTROLLER_HELP_HEADING)]
    pub(crate) vote_user_slopes_slot: u64,

    /// Unix timestamp of epoch zero.
    #[arg(short, long, env = "UPDATER_START_EPOCH", help_heading = CONTROLLER_HELP_HEADING)]
    pub(crate) start_epoch: u64,

    /// Seconds between consecutive epochs.
    #[arg(long, env = "UPDATER_WEEK", default_value_t = WEEK, help_heading = CONTROLLER_HELP_HEADING)]
    pub(crate) week: u64,

    /// Blocks to step past the epoch boundary before taking proofs.
    #[arg(long, env = "UPDATER_BLOCK_OFFSET", default_value_t = DEFAULT_BLOCK_OFFSET, help_heading = CONTROLLER_HELP_HEADING)]
    pub(crate) block_offset: u64,
}

#[derive(Subcommand)]
pub(crate) enum Command {
    /// Proves a gauge's points weight at an epoch.
    Gauge {
        /// The gauge address.
        #[arg(short, long, env = "UPDATER_GAUGE", value_parser = parse_address)]
        gauge: H160,
        /// The epoch index.
        #[arg(short, long)]
        epoch: u64,
    },
    /// Proves an account's vote slope on a gauge at an epoch.
    Account {
        /// The gauge address.
        #[arg(short, long, env = "UPDATER_GAUGE", value_parser = parse_address)]
        gauge: H160,
        /// The voting account address.
        #[arg(short, long, value_parser = parse_address)]
        account: H160,
        /// The epoch index.
        #[arg(short, long)]
        epoch: u64,
    },
    /// Plans and proves a catch-up run over an inclusive epoch range.
    Range {
        /// A gauge to prove at each epoch. Repeatable.
        #[arg(long = "gauge", value_parser = parse_address, required = true)]
        gauges: Vec<H160>,
        /// The first epoch of the range (inclusive).
        #[arg(short, long)]
        first: u64,
        /// The last epoch of the range (inclusive).
        #[arg(short, long)]
        last: u64,
        /// An epoch already processed, to be skipped on submission. Repeatable.
        #[arg(short, long = "processed")]
        processed: Vec<u64>,
    },
}

fn parse_address(s: &str) -> Result<H160, String> {
    let digits = s.strip_prefix("0x").unwrap_or(s);
    let bytes = hex::decode(digits).map_err(|e| format!("invalid hex address: {e}"))?;
    if bytes.len() != H160::len_bytes() {
        return Err(format!(
            "expected a {} byte address, got {} bytes",
            H160::len_bytes(),
            bytes.len()
        ));
    }
    Ok(H160::from_slice(&bytes))
}
