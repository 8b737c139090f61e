//! In-memory game source and feed fixtures shared by the pipeline tests.

use super::fetcher::GameSource;
use mlb_api::client::{ApiError, ApiResult};
use mlb_api::{GameId, RawPayload};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Serves canned feeds; unknown ids fail with `NotFound`. Tracks how many
/// requests were made and how many were ever outstanding at once.
#[derive(Debug, Default)]
pub struct FakeSource {
    feeds: HashMap<GameId, RawPayload>,
    delays_ms: HashMap<GameId, u64>,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl FakeSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_feed(mut self, game_id: GameId, feed: RawPayload) -> Self {
        self.feeds.insert(game_id, feed);
        self
    }

    pub fn with_delay(mut self, game_id: GameId, millis: u64) -> Self {
        self.delays_ms.insert(game_id, millis);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn peak_in_flight(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

impl GameSource for FakeSource {
    async fn game_feed(&self, game_id: GameId) -> ApiResult<RawPayload> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        let delay = self.delays_ms.get(&game_id).copied().unwrap_or(0);
        tokio::time::sleep(Duration::from_millis(delay)).await;

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.feeds
            .get(&game_id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(format!("game {game_id}")))
    }
}

/// A nine-inning 2-1 home win: home scores in the 2nd and 8th, away in the 7th.
pub fn sample_feed(game_pk: GameId) -> Value {
    feed_with_innings(
        game_pk,
        &[(0, 0), (1, 0), (0, 0), (0, 0), (0, 0), (0, 0), (0, 1), (1, 0), (0, 0)],
    )
}

/// Live feed whose linescore has the given `(home, away)` runs per inning.
/// Every run comes with one hit.
pub fn feed_with_innings(game_pk: GameId, runs: &[(u32, u32)]) -> Value {
    let innings: Vec<Value> = runs
        .iter()
        .enumerate()
        .map(|(i, (home, away))| {
            json!({
                "num": i + 1,
                "home": { "runs": home, "hits": home, "errors": 0 },
                "away": { "runs": away, "hits": away, "errors": 0 }
            })
        })
        .collect();
    let home: u32 = runs.iter().map(|(h, _)| h).sum();
    let away: u32 = runs.iter().map(|(_, a)| a).sum();

    json!({
        "gamePk": game_pk,
        "gameData": {
            "datetime": { "originalDate": "2024-05-01" },
            "gameInfo": { "attendance": 25000, "gameDurationMinutes": 150 },
            "teams": {
                "home": { "name": "Los Angeles Angels", "record": { "wins": 10, "losses": 20, "winningPercentage": ".333" } },
                "away": { "name": "Oakland Athletics", "record": { "wins": 12, "losses": 18, "winningPercentage": ".400" } }
            }
        },
        "liveData": {
            "linescore": {
                "innings": innings,
                "teams": {
                    "home": { "runs": home, "hits": home, "leftOnBase": 4 },
                    "away": { "runs": away, "hits": away, "leftOnBase": 6 }
                }
            },
            "boxscore": {
                "teams": {
                    "home": { "pitchers": [1, 2, 3] },
                    "away": { "pitchers": [4, 5] }
                }
            }
        }
    })
}
