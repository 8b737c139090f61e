use crate::statsapi::{FeedLinescore, LiveFeed, NumberOrText, ScheduleResponse};
use crate::{
    GameFlags, GameId, GameRecord, GameStats, HomeAway, Inning, Matchup, ParseFailure,
    ParseFailureKind, RawPayload, TeamRecord, UNKNOWN,
};
use chrono::NaiveDate;
use log::debug;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashSet;
use std::fmt;
use std::time::Duration;

pub type ApiResult<T> = Result<T, ApiError>;

pub const STATS_API: &str = "https://statsapi.mlb.com";

/// MLB Stats API client. One instance owns one HTTP session; dropping it
/// releases the connection pool.
#[derive(Debug, Clone)]
pub struct MlbApi {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl Default for MlbApi {
    fn default() -> Self {
        Self {
            client: Client::builder()
                .user_agent("boringball/0.1 (game boredom report)")
                .build()
                .unwrap_or_default(),
            base_url: STATS_API.to_owned(),
            timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Debug)]
pub enum ApiError {
    Network(reqwest::Error, String),
    Api(reqwest::Error, String),
    Parsing(reqwest::Error, String),
    NotFound(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Network(e, url) => write!(f, "Network error for {url}: {e}"),
            ApiError::Api(e, url) => write!(f, "API error for {url}: {e}"),
            ApiError::Parsing(e, url) => write!(f, "Parse error for {url}: {e}"),
            ApiError::NotFound(msg) => write!(f, "Not found: {msg}"),
        }
    }
}

impl std::error::Error for ApiError {}

impl MlbApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Point the client at another host, e.g. a local mock server.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self { base_url: base_url.into().trim_end_matches('/').to_owned(), ..Self::default() }
    }

    /// Fetch the full live feed for one game. The body is returned as-is;
    /// turning it into a [`GameRecord`] is a separate step.
    pub async fn fetch_game_feed(&self, game_id: GameId) -> ApiResult<RawPayload> {
        let url = format!("{}/api/v1.1/game/{game_id}/feed/live", self.base_url);
        self.get(&url).await
    }

    /// Resolve a team's schedule window to game ids, in schedule order.
    ///
    /// Postponed games show up once per scheduled date; only the first
    /// occurrence of each `gamePk` is kept.
    pub async fn fetch_schedule(
        &self,
        team_id: u32,
        start: NaiveDate,
        end: NaiveDate,
    ) -> ApiResult<Vec<GameId>> {
        let url = format!(
            "{}/api/v1/schedule?hydrate=team,lineups&sportId=1&teamId={team_id}&startDate={start}&endDate={end}",
            self.base_url
        );
        let raw: ScheduleResponse = self.get(&url).await?;
        Ok(map_schedule(raw))
    }

    async fn get<T: serde::de::DeserializeOwned>(&self, url: &str) -> ApiResult<T> {
        debug!("GET {url}");
        let response = self
            .client
            .get(url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| ApiError::Network(e, url.to_owned()))?;

        match response.error_for_status() {
            Ok(res) => res
                .json::<T>()
                .await
                .map_err(|e| ApiError::Parsing(e, url.to_owned())),
            Err(e) if e.status() == Some(StatusCode::NOT_FOUND) => {
                Err(ApiError::NotFound(url.to_owned()))
            }
            Err(e) => Err(ApiError::Api(e, url.to_owned())),
        }
    }
}

// ---------------------------------------------------------------------------
// Mapping: Stats API wire types → clean domain types
// ---------------------------------------------------------------------------

fn map_schedule(raw: ScheduleResponse) -> Vec<GameId> {
    let mut seen = HashSet::new();
    raw.dates
        .into_iter()
        .flat_map(|d| d.games)
        .map(|g| g.game_pk)
        .filter(|pk| seen.insert(*pk))
        .collect()
}

pub(crate) fn map_game_record(game_id: GameId, payload: &RawPayload) -> GameRecord {
    GameRecord {
        game_id,
        flags: read_flags(payload),
        matchup: read_matchup(payload),
        stats: map_game_stats(game_id, payload),
    }
}

/// Flags decide exemption, so they are read one key at a time and anything
/// odd reads as `false` instead of failing the record.
fn read_flags(payload: &RawPayload) -> GameFlags {
    let flag = |key: &str| {
        payload
            .pointer(&format!("/gameData/flags/{key}"))
            .and_then(Value::as_bool)
            .unwrap_or(false)
    };
    GameFlags { no_hitter: flag("noHitter"), perfect_game: flag("perfectGame") }
}

fn read_matchup(payload: &RawPayload) -> Matchup {
    let text = |pointer: &str| {
        payload
            .pointer(pointer)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_owned)
    };
    Matchup {
        home_team: text("/gameData/teams/home/name").unwrap_or_else(|| UNKNOWN.into()),
        away_team: text("/gameData/teams/away/name").unwrap_or_else(|| UNKNOWN.into()),
        game_date: text("/gameData/datetime/originalDate")
            .or_else(|| text("/gameData/datetime/officialDate"))
            .or_else(|| text("/gameDate"))
            .unwrap_or_else(|| UNKNOWN.into()),
    }
}

fn map_game_stats(game_id: GameId, payload: &RawPayload) -> Result<GameStats, ParseFailure> {
    let feed = LiveFeed::deserialize(payload).map_err(|e| classify_serde_error(game_id, &e))?;

    if feed.game_pk != game_id {
        return Err(ParseFailure::new(
            game_id,
            ParseFailureKind::IdentifierMismatch,
            Some("gamePk"),
        ));
    }

    let game_data = feed.game_data;
    let teams = game_data.teams;
    let boxscore = feed.live_data.boxscore;
    let linescore = feed.live_data.linescore;

    let records = HomeAway::new(
        map_team_record(game_id, teams.home.record)?,
        map_team_record(game_id, teams.away.record)?,
    );

    Ok(GameStats {
        duration_minutes: game_data.game_info.game_duration_minutes,
        delay_minutes: game_data.game_info.delay_duration_minutes,
        attendance: game_data.game_info.attendance,
        reviews_used: game_data.review.map(|r| r.used),
        mound_visits_used: game_data.mound_visits.map(|m| m.used),
        records,
        innings: map_innings(&linescore),
        final_score: HomeAway::new(linescore.teams.home.runs, linescore.teams.away.runs),
        final_hits: HomeAway::new(linescore.teams.home.hits, linescore.teams.away.hits),
        left_on_base: HomeAway::new(
            linescore.teams.home.left_on_base,
            linescore.teams.away.left_on_base,
        ),
        pitchers_used: boxscore.teams.map(|t| t.pitchers.len() as u32),
    })
}

fn map_innings(linescore: &FeedLinescore) -> Vec<Inning> {
    linescore
        .innings
        .iter()
        .map(|i| Inning::new(i.home, i.away))
        .collect()
}

fn map_team_record(
    game_id: GameId,
    record: crate::statsapi::FeedRecord,
) -> Result<TeamRecord, ParseFailure> {
    let winning_percentage = match record.winning_percentage {
        None => 0.0,
        Some(NumberOrText::Number(n)) => n,
        Some(NumberOrText::Text(s)) => s.trim().parse::<f64>().map_err(|_| {
            ParseFailure::new(game_id, ParseFailureKind::WrongShape, Some("winningPercentage"))
        })?,
    };
    if !winning_percentage.is_finite() {
        return Err(ParseFailure::new(
            game_id,
            ParseFailureKind::WrongShape,
            Some("winningPercentage"),
        ));
    }
    Ok(TeamRecord { winning_percentage, wins: record.wins, losses: record.losses })
}

/// Keep the field name serde reports, drop the rest of the message: type
/// errors quote the offending value.
fn classify_serde_error(game_id: GameId, err: &serde_json::Error) -> ParseFailure {
    let message = err.to_string();
    match message
        .strip_prefix("missing field `")
        .and_then(|rest| rest.split('`').next())
    {
        Some(field) => ParseFailure::new(game_id, ParseFailureKind::MissingField, Some(field)),
        None => ParseFailure::new(game_id, ParseFailureKind::WrongShape, None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::HalfInning;
    use serde_json::json;

    fn feed(game_pk: GameId) -> Value {
        json!({
            "gamePk": game_pk,
            "gameData": {
                "flags": { "noHitter": false, "perfectGame": false },
                "datetime": { "originalDate": "2024-04-12", "officialDate": "2024-04-12" },
                "gameInfo": { "attendance": 31245, "gameDurationMinutes": 162 },
                "review": {
                    "hasChallenges": true,
                    "home": { "used": 1, "remaining": 0 },
                    "away": { "used": 0, "remaining": 1 }
                },
                "moundVisits": {
                    "home": { "used": 2, "remaining": 3 },
                    "away": { "used": 3, "remaining": 2 }
                },
                "teams": {
                    "home": {
                        "name": "Los Angeles Angels",
                        "record": { "wins": 6, "losses": 7, "winningPercentage": ".462" }
                    },
                    "away": {
                        "name": "Tampa Bay Rays",
                        "record": { "wins": 8, "losses": 5, "winningPercentage": ".615" }
                    }
                }
            },
            "liveData": {
                "linescore": {
                    "innings": [
                        { "num": 1, "home": { "runs": 1, "hits": 2, "errors": 0 }, "away": { "runs": 0, "hits": 0, "errors": 0 } },
                        { "num": 2, "home": { "runs": 0, "hits": 1, "errors": 1 }, "away": { "runs": 2, "hits": 3, "errors": 0 } },
                        { "num": 3, "away": { "runs": 0, "hits": 1, "errors": 0 } }
                    ],
                    "teams": {
                        "home": { "runs": 1, "hits": 3, "errors": 1, "leftOnBase": 5 },
                        "away": { "runs": 2, "hits": 4, "errors": 0, "leftOnBase": 7 }
                    }
                },
                "boxscore": {
                    "teams": {
                        "home": { "pitchers": [605135, 656302, 663372] },
                        "away": { "pitchers": [641154, 621237] }
                    }
                }
            }
        })
    }

    #[test]
    fn maps_complete_feed() {
        let record = map_game_record(745001, &feed(745001));
        assert_eq!(record.game_id, 745001);
        assert!(!record.is_exempt());
        assert_eq!(record.matchup.home_team, "Los Angeles Angels");
        assert_eq!(record.matchup.game_date, "2024-04-12");

        let stats = record.stats.expect("feed should validate");
        assert_eq!(stats.attendance, 31245);
        assert_eq!(stats.duration_minutes, Some(162.0));
        assert_eq!(stats.delay_minutes, None);
        assert_eq!(stats.reviews_used, HomeAway::new(1, 0));
        assert_eq!(stats.mound_visits_used, HomeAway::new(2, 3));
        assert!((stats.records.home.winning_percentage - 0.462).abs() < 1e-9);
        assert_eq!(stats.records.away.games_played(), 13);
        assert_eq!(stats.final_score, HomeAway::new(1, 2));
        assert_eq!(stats.left_on_base.total(), 12);
        assert_eq!(stats.pitchers_used, HomeAway::new(3, 2));
        assert_eq!(stats.num_innings(), 3);
    }

    #[test]
    fn missing_half_inning_reads_as_zeros() {
        let stats = map_game_record(745001, &feed(745001)).stats.unwrap();
        assert_eq!(stats.innings[2].home, HalfInning::default());
        assert_eq!(stats.innings[2].away.hits, 1);
    }

    #[test]
    fn optional_sections_fall_back_to_defaults() {
        let payload = json!({
            "gamePk": 9,
            "liveData": {
                "linescore": {
                    "teams": { "home": { "runs": 0, "hits": 0 }, "away": { "runs": 0, "hits": 0 } }
                }
            }
        });
        let record = map_game_record(9, &payload);
        assert_eq!(record.matchup, Matchup::default());
        let stats = record.stats.expect("only linescore totals are required");
        assert_eq!(stats.attendance, 0);
        assert_eq!(stats.records.home, TeamRecord::default());
        assert!(stats.innings.is_empty());
        assert_eq!(stats.pitchers_used.total(), 0);
    }

    #[test]
    fn missing_linescore_total_is_a_missing_field() {
        let mut payload = feed(745001);
        payload["liveData"]["linescore"]["teams"]["home"]
            .as_object_mut()
            .unwrap()
            .remove("runs");
        let failure = map_game_record(745001, &payload).stats.unwrap_err();
        assert_eq!(failure.kind, ParseFailureKind::MissingField);
        assert_eq!(failure.field.as_deref(), Some("runs"));
    }

    #[test]
    fn wrong_type_is_wrong_shape_without_contents() {
        let mut payload = feed(745001);
        payload["gameData"]["gameInfo"]["attendance"] = json!("sold out");
        let failure = map_game_record(745001, &payload).stats.unwrap_err();
        assert_eq!(failure.kind, ParseFailureKind::WrongShape);
        assert!(!failure.to_string().contains("sold out"));
    }

    #[test]
    fn unparsable_winning_percentage_is_rejected() {
        let mut payload = feed(745001);
        payload["gameData"]["teams"]["away"]["record"]["winningPercentage"] = json!(".---");
        let failure = map_game_record(745001, &payload).stats.unwrap_err();
        assert_eq!(failure.field.as_deref(), Some("winningPercentage"));
    }

    #[test]
    fn numeric_winning_percentage_is_accepted() {
        let mut payload = feed(745001);
        payload["gameData"]["teams"]["home"]["record"]["winningPercentage"] = json!(0.5);
        let stats = map_game_record(745001, &payload).stats.unwrap();
        assert_eq!(stats.records.home.winning_percentage, 0.5);
    }

    #[test]
    fn mismatched_game_pk_is_rejected() {
        let failure = map_game_record(745002, &feed(745001)).stats.unwrap_err();
        assert_eq!(failure.kind, ParseFailureKind::IdentifierMismatch);
        assert_eq!(failure.game_id, 745002);
    }

    #[test]
    fn flags_survive_a_broken_payload() {
        let payload = json!({
            "gameData": { "flags": { "noHitter": true, "perfectGame": "maybe" } },
            "liveData": "garbage"
        });
        let record = map_game_record(1, &payload);
        assert!(record.flags.no_hitter);
        assert!(!record.flags.perfect_game);
        assert!(record.is_exempt());
        assert!(record.stats.is_err());
    }

    #[test]
    fn schedule_keeps_first_occurrence_of_each_game() {
        let raw: ScheduleResponse = serde_json::from_value(json!({
            "dates": [
                { "games": [ { "gamePk": 3 }, { "gamePk": 1 } ] },
                { "games": [] },
                { "games": [ { "gamePk": 3 }, { "gamePk": 2 } ] }
            ]
        }))
        .unwrap();
        assert_eq!(map_schedule(raw), vec![3, 1, 2]);
    }

    // -----------------------------------------------------------------------
    // HTTP behaviour against a local mock server
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn fetch_game_feed_returns_raw_payload() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/v1.1/game/745001/feed/live")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(feed(745001).to_string())
            .create_async()
            .await;

        let api = MlbApi::with_base_url(server.url());
        let payload = api.fetch_game_feed(745001).await.expect("feed should load");
        assert_eq!(payload["gamePk"], json!(745001));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn fetch_game_feed_maps_404_to_not_found() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/v1.1/game/1/feed/live")
            .with_status(404)
            .create_async()
            .await;

        let api = MlbApi::with_base_url(server.url());
        let err = api.fetch_game_feed(1).await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)), "got {err}");
    }

    #[tokio::test]
    async fn fetch_game_feed_reports_server_errors() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/v1.1/game/2/feed/live")
            .with_status(503)
            .create_async()
            .await;

        let api = MlbApi::with_base_url(server.url());
        let err = api.fetch_game_feed(2).await.unwrap_err();
        assert!(matches!(err, ApiError::Api(_, _)), "got {err}");
    }

    #[tokio::test]
    async fn fetch_game_feed_rejects_non_json_body() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/v1.1/game/3/feed/live")
            .with_status(200)
            .with_body("<html>maintenance</html>")
            .create_async()
            .await;

        let api = MlbApi::with_base_url(server.url());
        let err = api.fetch_game_feed(3).await.unwrap_err();
        assert!(matches!(err, ApiError::Parsing(_, _)), "got {err}");
    }

    #[tokio::test]
    async fn fetch_schedule_sends_window_and_dedups() {
        use mockito::Matcher;

        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/v1/schedule")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("teamId".into(), "108".into()),
                Matcher::UrlEncoded("sportId".into(), "1".into()),
                Matcher::UrlEncoded("startDate".into(), "2024-04-01".into()),
                Matcher::UrlEncoded("endDate".into(), "2024-04-07".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "dates": [
                        { "games": [ { "gamePk": 745001 } ] },
                        { "games": [ { "gamePk": 745002 }, { "gamePk": 745001 } ] }
                    ]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let api = MlbApi::with_base_url(server.url());
        let start = NaiveDate::from_ymd_opt(2024, 4, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 4, 7).unwrap();
        let ids = api.fetch_schedule(108, start, end).await.expect("schedule should load");
        assert_eq!(ids, vec![745001, 745002]);
        mock.assert_async().await;
    }
}
