use crate::pipeline::fetcher::{GameSource, fetch_all};
use crate::pipeline::scorer::{ScoreResult, score};
use log::{debug, info, warn};
use mlb_api::client::ApiError;
use mlb_api::{GameId, GameRecord, ParseFailure};
use std::fmt;
use std::num::NonZeroUsize;

/// Why a game was left out of the report.
#[derive(Debug)]
pub enum Exclusion {
    Fetch(ApiError),
    Parse(ParseFailure),
}

impl fmt::Display for Exclusion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Exclusion::Fetch(e) => write!(f, "fetch failed: {e}"),
            Exclusion::Parse(e) => write!(f, "unreadable feed: {e}"),
        }
    }
}

#[derive(Debug)]
pub struct Excluded {
    pub game_id: GameId,
    pub cause: Exclusion,
}

/// Scored games in input order, plus every game that had to be skipped.
#[derive(Debug, Default)]
pub struct Report {
    pub entries: Vec<ScoreResult>,
    pub excluded: Vec<Excluded>,
}

impl Report {
    /// Most boring first. Equal scores keep their input order.
    pub fn ranked(&self) -> Vec<&ScoreResult> {
        let mut ranked: Vec<&ScoreResult> = self.entries.iter().collect();
        ranked.sort_by(|a, b| b.score.cmp(&a.score));
        ranked
    }

    /// Highest score; the earliest game wins a tie.
    pub fn most_boring(&self) -> Option<&ScoreResult> {
        self.entries.iter().fold(None, |best, entry| match best {
            Some(best) if best.score >= entry.score => Some(best),
            _ => Some(entry),
        })
    }

    /// Lowest score; the earliest game wins a tie.
    pub fn least_boring(&self) -> Option<&ScoreResult> {
        self.entries.iter().fold(None, |best, entry| match best {
            Some(best) if best.score <= entry.score => Some(best),
            _ => Some(entry),
        })
    }
}

/// Drives fetch → parse → score over a list of game ids.
pub struct Aggregator<'a, S> {
    source: &'a S,
    concurrency: Option<NonZeroUsize>,
}

impl<'a, S: GameSource> Aggregator<'a, S> {
    pub fn new(source: &'a S) -> Self {
        Self { source, concurrency: None }
    }

    pub fn with_concurrency(mut self, concurrency: Option<NonZeroUsize>) -> Self {
        self.concurrency = concurrency;
        self
    }

    /// Score every game in `ids`. Games that fail to fetch or parse are
    /// logged and listed in [`Report::excluded`]; they never stop the run.
    pub async fn run(&self, ids: &[GameId]) -> Report {
        let mut report = Report::default();
        if ids.is_empty() {
            info!("no games to score");
            return report;
        }

        for (game_id, fetched) in fetch_all(self.source, ids, self.concurrency).await {
            let scored = fetched.map_err(Exclusion::Fetch).and_then(|payload| {
                score(&GameRecord::from_feed(game_id, &payload)).map_err(Exclusion::Parse)
            });

            match scored {
                Ok(result) => {
                    debug!("game {game_id} scored {}", result.score);
                    report.entries.push(result);
                }
                Err(cause) => {
                    warn!("skipping game {game_id}: {cause}");
                    report.excluded.push(Excluded { game_id, cause });
                }
            }
        }

        info!(
            "scored {} of {} games ({} skipped)",
            report.entries.len(),
            ids.len(),
            report.excluded.len()
        );
        report
    }
}
