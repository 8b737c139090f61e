mod pipeline;
mod report;
mod settings;

use crate::pipeline::aggregator::{Aggregator, Report};
use crate::settings::{GameSelection, Settings};
use anyhow::Context;
use log::{info, warn};
use mlb_api::GameId;
use mlb_api::client::MlbApi;
use std::fs::File;

const TOP_N: usize = 5;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    if handle_cli_args() {
        return Ok(());
    }

    better_panic::install();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let settings = Settings::load()?;

    // One HTTP session for the whole run, released when `api` drops.
    let api = MlbApi::new();

    tokio::select! {
        outcome = run(&api, &settings) => outcome,
        _ = tokio::signal::ctrl_c() => {
            warn!("interrupted; in-flight requests abandoned, no report written");
            anyhow::bail!("interrupted")
        }
    }
}

async fn run(api: &MlbApi, settings: &Settings) -> anyhow::Result<()> {
    let ids = resolve_game_ids(api, &settings.games).await?;

    let report = Aggregator::new(api)
        .with_concurrency(settings.concurrency)
        .run(&ids)
        .await;

    log_highlights(&report);

    let path = &settings.report_path;
    let file = File::create(path).with_context(|| format!("could not create {}", path.display()))?;
    report::write_report(&report, file)
        .with_context(|| format!("could not write report to {}", path.display()))?;
    info!("wrote {} games to {}", report.entries.len(), path.display());
    Ok(())
}

async fn resolve_game_ids(api: &MlbApi, games: &GameSelection) -> anyhow::Result<Vec<GameId>> {
    match games {
        GameSelection::Explicit(ids) => Ok(ids.clone()),
        GameSelection::Schedule { team_id, start, end } => {
            info!("loading schedule for team {team_id}, {start} to {end}");
            let ids = api
                .fetch_schedule(*team_id, *start, *end)
                .await
                .context("could not load schedule")?;
            if ids.is_empty() {
                warn!("team {team_id} has no games between {start} and {end}");
            }
            Ok(ids)
        }
    }
}

fn log_highlights(report: &Report) {
    for excluded in &report.excluded {
        warn!("excluded game {}: {}", excluded.game_id, excluded.cause);
    }
    for (rank, entry) in report.ranked().into_iter().take(TOP_N).enumerate() {
        info!(
            "#{} {} @ {} ({}) game {}: {}",
            rank + 1,
            entry.matchup.away_team,
            entry.matchup.home_team,
            entry.matchup.game_date,
            entry.game_id,
            entry.score
        );
    }
    if let Some(best) = report.most_boring() {
        info!("most boring: game {} with {}", best.game_id, best.score);
    }
    if let Some(worst) = report.least_boring() {
        info!("least boring: game {} with {}", worst.game_id, worst.score);
    }
}

fn handle_cli_args() -> bool {
    let mut args = std::env::args().skip(1);
    let Some(arg) = args.next() else {
        return false;
    };

    match arg.as_str() {
        "-h" | "--help" => {
            println!("{}", usage_text());
            true
        }
        "-V" | "--version" => {
            println!("boringball {}", env!("CARGO_PKG_VERSION"));
            true
        }
        _ => {
            eprintln!("Unknown argument: {arg}\n\n{}", usage_text());
            std::process::exit(2);
        }
    }
}

fn usage_text() -> &'static str {
    "boringball - rank MLB games by how boring they were

Usage:
  boringball
  boringball --help
  boringball --version

Environment:
  BORINGBALL_TEAM_ID       Stats API team id (default 108)
  BORINGBALL_START_DATE    First schedule date, YYYY-MM-DD (default 2024-03-28)
  BORINGBALL_END_DATE      Last schedule date, YYYY-MM-DD (default 2024-09-30)
  BORINGBALL_GAME_IDS      Explicit game ids instead of the schedule, e.g. 745001-745010,745020
  BORINGBALL_CONCURRENCY   Max requests in flight (default: all at once)
  BORINGBALL_REPORT        CSV output path (default boring_games_report.csv)
  RUST_LOG                 Log filter (default info)"
}
