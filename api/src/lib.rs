pub mod client;
pub mod statsapi;

use serde::Deserialize;
use std::fmt;

/// Stats API `gamePk`.
pub type GameId = u64;

/// Untouched live-feed document as returned by the data source.
pub type RawPayload = serde_json::Value;

// ---------------------------------------------------------------------------
// Domain types: clean model, independent of Stats API wire format
// ---------------------------------------------------------------------------

/// A pair of values, one per side of the game.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de> + Default"))]
pub struct HomeAway<T> {
    #[serde(default)]
    pub home: T,
    #[serde(default)]
    pub away: T,
}

impl<T> HomeAway<T> {
    pub fn new(home: T, away: T) -> Self {
        Self { home, away }
    }

    pub fn map<U>(&self, f: impl Fn(&T) -> U) -> HomeAway<U> {
        HomeAway { home: f(&self.home), away: f(&self.away) }
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        [&self.home, &self.away].into_iter()
    }
}

impl HomeAway<u32> {
    /// Sum of both sides, widened so payload-sized counts cannot overflow.
    pub fn total(&self) -> u64 {
        u64::from(self.home) + u64::from(self.away)
    }

    pub fn diff(&self) -> u32 {
        self.home.abs_diff(self.away)
    }
}

/// One game as delivered by the data source, validated once.
///
/// `flags` and `matchup` are read leniently so an exempt game can be
/// reported even when the rest of its payload is broken. Everything the
/// scorer needs beyond that lives in `stats`, which holds either the
/// validated numbers or the reason they could not be read.
#[derive(Debug, Clone, PartialEq)]
pub struct GameRecord {
    pub game_id: GameId,
    pub flags: GameFlags,
    pub matchup: Matchup,
    pub stats: Result<GameStats, ParseFailure>,
}

impl GameRecord {
    /// Validate a live-feed payload requested as `game_id`.
    pub fn from_feed(game_id: GameId, payload: &RawPayload) -> Self {
        client::map_game_record(game_id, payload)
    }

    pub fn is_exempt(&self) -> bool {
        self.flags.no_hitter || self.flags.perfect_game
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GameFlags {
    pub no_hitter: bool,
    pub perfect_game: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Matchup {
    pub home_team: String,
    pub away_team: String,
    pub game_date: String,
}

impl Default for Matchup {
    fn default() -> Self {
        Self {
            home_team: UNKNOWN.into(),
            away_team: UNKNOWN.into(),
            game_date: UNKNOWN.into(),
        }
    }
}

pub const UNKNOWN: &str = "Unknown";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GameStats {
    pub duration_minutes: Option<f64>,
    pub delay_minutes: Option<f64>,
    pub attendance: u32,
    pub reviews_used: HomeAway<u32>,
    pub mound_visits_used: HomeAway<u32>,
    pub records: HomeAway<TeamRecord>,
    pub innings: Vec<Inning>,
    pub final_score: HomeAway<u32>,
    pub final_hits: HomeAway<u32>,
    pub left_on_base: HomeAway<u32>,
    pub pitchers_used: HomeAway<u32>,
}

impl GameStats {
    pub fn num_innings(&self) -> usize {
        self.innings.len()
    }
}

/// Season-to-date record of one team going into the game.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TeamRecord {
    pub winning_percentage: f64,
    pub wins: u32,
    pub losses: u32,
}

impl TeamRecord {
    pub fn games_played(&self) -> u64 {
        u64::from(self.wins) + u64::from(self.losses)
    }
}

pub type Inning = HomeAway<HalfInning>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct HalfInning {
    #[serde(default)]
    pub runs: u32,
    #[serde(default)]
    pub hits: u32,
    #[serde(default)]
    pub errors: u32,
}

impl HalfInning {
    /// Nothing happened: no runs, no hits, no errors.
    pub fn is_dead_air(&self) -> bool {
        self.runs == 0 && self.hits == 0 && self.errors == 0
    }
}

// ---------------------------------------------------------------------------
// Parse failures
// ---------------------------------------------------------------------------

/// A payload that arrived fine but could not be read as a game.
///
/// Only the identifier and the offending field name are kept; record
/// contents never end up in here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseFailure {
    pub game_id: GameId,
    pub kind: ParseFailureKind,
    pub field: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseFailureKind {
    MissingField,
    WrongShape,
    IdentifierMismatch,
}

impl ParseFailure {
    pub fn new(game_id: GameId, kind: ParseFailureKind, field: Option<&str>) -> Self {
        Self { game_id, kind, field: field.map(str::to_owned) }
    }
}

impl fmt::Display for ParseFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let what = match self.kind {
            ParseFailureKind::MissingField => "missing required field",
            ParseFailureKind::WrongShape => "malformed field",
            ParseFailureKind::IdentifierMismatch => "payload belongs to another game",
        };
        match &self.field {
            Some(field) => write!(f, "game {}: {what} `{field}`", self.game_id),
            None => write!(f, "game {}: {what}", self.game_id),
        }
    }
}

impl std::error::Error for ParseFailure {}
