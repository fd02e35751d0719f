use std::collections::BTreeSet;

use anyhow::{bail, Result};
use clap::Parser;
use gauge_proofs::slots::SlotLayout;
use serde::Serialize;
use tracing::info;
use updater::config::{align_to_week, UpdaterConfig};
use updater::env::load_dotenvy_vars_if_present;
use updater::fixture::FixtureSource;
use updater::pipeline::Pipeline;
use updater::rpc::HttpBlockSource;
use updater::source::BlockSource;

use self::proofgen::*;
mod proofgen {
    pub mod cli;
}

#[tokio::main]
async fn main() -> Result<()> {
    load_dotenvy_vars_if_present();
    updater::tracing::init();

    let args = cli::Cli::parse();
    let config = UpdaterConfig {
        controller: args.layout.controller,
        layout: SlotLayout {
            points_weight_slot: args.layout.points_weight_slot,
            vote_user_slopes_slot: args.layout.vote_user_slopes_slot,
        },
        start_epoch: align_to_week(args.layout.start_epoch, args.layout.week),
        week: args.layout.week,
        block_offset: args.layout.block_offset,
    };

    match (args.source.rpc_url, args.source.fixture) {
        (Some(rpc_url), None) => {
            run(
                Pipeline::new(HttpBlockSource::new_http(rpc_url), config),
                args.command,
            )
            .await
        }
        (None, Some(path)) => {
            run(
                Pipeline::new(FixtureSource::load(path)?, config),
                args.command,
            )
            .await
        }
        _ => bail!("exactly one of --rpc-url and --fixture must be given"),
    }
}

async fn run<S: BlockSource>(pipeline: Pipeline<S>, command: cli::Command) -> Result<()> {
    let head = pipeline.source().latest_number().await?;
    info!(head, "connected to block source");

    match command {
        cli::Command::Gauge { gauge, epoch } => {
            let bundle = pipeline.gauge_bundle(gauge, epoch).await?;
            emit(&bundle)
        }
        cli::Command::Account {
            gauge,
            account,
            epoch,
        } => {
            let bundle = pipeline.account_bundle(gauge, account, epoch).await?;
            emit(&bundle)
        }
        cli::Command::Range {
            gauges,
            first,
            last,
            processed,
        } => {
            let processed: BTreeSet<u64> = processed.into_iter().collect();
            let updates = pipeline.epoch_range(&gauges, first, last, &processed).await?;
            emit(&updates)
        }
    }
}

fn emit(value: &impl Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
