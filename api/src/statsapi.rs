//! MLB Stats API raw wire types: serde shapes for deserializing Stats API responses.
//! These map to our clean domain types in client.rs.
//!
//! Only the parts of the live feed the scorer reads are modelled. Unknown keys
//! are ignored; known keys with the wrong JSON type fail the whole feed.
use crate::{GameId, HalfInning, HomeAway};
use serde::Deserialize;

// ---------------------------------------------------------------------------
// Live game feed  (v1.1 API)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct LiveFeed {
    pub game_pk: GameId,
    #[serde(default)]
    pub game_data: FeedGameData,
    pub live_data: FeedLiveData,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(rename_all = "camelCase")]
pub struct FeedGameData {
    #[serde(default)]
    pub game_info: FeedGameInfo,
    #[serde(default)]
    pub review: HomeAway<UsageCounter>,
    #[serde(default)]
    pub mound_visits: HomeAway<UsageCounter>,
    #[serde(default)]
    pub teams: HomeAway<FeedTeam>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(rename_all = "camelCase")]
pub struct FeedGameInfo {
    #[serde(default)]
    pub attendance: u32,
    pub game_duration_minutes: Option<f64>,
    pub delay_duration_minutes: Option<f64>,
}

/// Challenges and mound visits share the same `{used, remaining}` shape.
#[derive(Debug, Deserialize, Default, Clone, Copy)]
pub struct UsageCounter {
    #[serde(default)]
    pub used: u32,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct FeedTeam {
    #[serde(default)]
    pub record: FeedRecord,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(rename_all = "camelCase")]
pub struct FeedRecord {
    pub winning_percentage: Option<NumberOrText>,
    #[serde(default)]
    pub wins: u32,
    #[serde(default)]
    pub losses: u32,
}

/// The Stats API sends percentages as strings (".512") but older feeds used
/// plain numbers.
#[derive(Debug, Deserialize, Clone)]
#[serde(untagged)]
pub enum NumberOrText {
    Number(f64),
    Text(String),
}

#[derive(Debug, Deserialize, Clone)]
pub struct FeedLiveData {
    pub linescore: FeedLinescore,
    #[serde(default)]
    pub boxscore: FeedBoxscore,
}

#[derive(Debug, Deserialize, Clone)]
pub struct FeedLinescore {
    #[serde(default)]
    pub innings: Vec<FeedInning>,
    pub teams: FeedLineTeams,
}

#[derive(Debug, Deserialize, Clone)]
pub struct FeedInning {
    pub num: Option<u32>,
    /// Absent for the bottom half of a game the home team already won.
    #[serde(default)]
    pub home: HalfInning,
    #[serde(default)]
    pub away: HalfInning,
}

#[derive(Debug, Deserialize, Clone)]
pub struct FeedLineTeams {
    pub home: FeedLineTotals,
    pub away: FeedLineTotals,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct FeedLineTotals {
    pub runs: u32,
    pub hits: u32,
    #[serde(default)]
    pub errors: u32,
    #[serde(default)]
    pub left_on_base: u32,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct FeedBoxscore {
    #[serde(default)]
    pub teams: HomeAway<FeedBoxTeam>,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct FeedBoxTeam {
    /// Player ids of every pitcher who appeared.
    #[serde(default)]
    pub pitchers: Vec<u64>,
}

// ---------------------------------------------------------------------------
// Schedule  (v1 API)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Default, Clone)]
pub struct ScheduleResponse {
    #[serde(default)]
    pub dates: Vec<ScheduleDate>,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct ScheduleDate {
    #[serde(default)]
    pub games: Vec<ScheduledGame>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledGame {
    pub game_pk: GameId,
}
