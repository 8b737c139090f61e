use chrono::NaiveDate;
use mlb_api::GameId;
use std::fmt;
use std::num::NonZeroUsize;
use std::path::PathBuf;

pub const TEAM_ID_VAR: &str = "BORINGBALL_TEAM_ID";
pub const START_DATE_VAR: &str = "BORINGBALL_START_DATE";
pub const END_DATE_VAR: &str = "BORINGBALL_END_DATE";
pub const GAME_IDS_VAR: &str = "BORINGBALL_GAME_IDS";
pub const CONCURRENCY_VAR: &str = "BORINGBALL_CONCURRENCY";
pub const REPORT_VAR: &str = "BORINGBALL_REPORT";

/// Los Angeles Angels.
pub const DEFAULT_TEAM_ID: u32 = 108;
pub const DEFAULT_START_DATE: &str = "2024-03-28";
pub const DEFAULT_END_DATE: &str = "2024-09-30";
pub const DEFAULT_REPORT_PATH: &str = "boring_games_report.csv";

/// Upper bound on ids expanded from one `a-b` range.
const MAX_RANGE_LEN: u64 = 5_000;

/// Which games to score.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameSelection {
    /// Literal ids, scored in the order given.
    Explicit(Vec<GameId>),
    /// Every game on a team's schedule between two dates, inclusive.
    Schedule { team_id: u32, start: NaiveDate, end: NaiveDate },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub games: GameSelection,
    /// `None` fetches every game at once.
    pub concurrency: Option<NonZeroUsize>,
    pub report_path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidTeamId(String),
    InvalidDate { var: &'static str, value: String },
    InvertedDateRange { start: NaiveDate, end: NaiveDate },
    InvalidGameId(String),
    InvertedGameRange { start: GameId, end: GameId },
    GameRangeTooLarge { start: GameId, end: GameId },
    NoGameIds,
    InvalidConcurrency(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidTeamId(v) => write!(f, "{TEAM_ID_VAR}: not a team id: {v:?}"),
            ConfigError::InvalidDate { var, value } => {
                write!(f, "{var}: expected YYYY-MM-DD, got {value:?}")
            }
            ConfigError::InvertedDateRange { start, end } => {
                write!(f, "date range ends ({end}) before it starts ({start})")
            }
            ConfigError::InvalidGameId(v) => write!(f, "{GAME_IDS_VAR}: not a game id: {v:?}"),
            ConfigError::InvertedGameRange { start, end } => {
                write!(f, "{GAME_IDS_VAR}: range {start}-{end} is backwards")
            }
            ConfigError::GameRangeTooLarge { start, end } => write!(
                f,
                "{GAME_IDS_VAR}: range {start}-{end} exceeds {MAX_RANGE_LEN} games"
            ),
            ConfigError::NoGameIds => write!(f, "{GAME_IDS_VAR}: no game ids given"),
            ConfigError::InvalidConcurrency(v) => {
                write!(f, "{CONCURRENCY_VAR}: expected a positive number, got {v:?}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl Settings {
    /// Read settings from the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through `lookup`. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_owned())
                .filter(|v| !v.is_empty())
        };

        let games = match get(GAME_IDS_VAR) {
            Some(ids) => GameSelection::Explicit(parse_game_ids(&ids)?),
            None => {
                let team_id = match get(TEAM_ID_VAR) {
                    Some(v) => v.parse().map_err(|_| ConfigError::InvalidTeamId(v))?,
                    None => DEFAULT_TEAM_ID,
                };
                let start = parse_date(START_DATE_VAR, get(START_DATE_VAR), DEFAULT_START_DATE)?;
                let end = parse_date(END_DATE_VAR, get(END_DATE_VAR), DEFAULT_END_DATE)?;
                if start > end {
                    return Err(ConfigError::InvertedDateRange { start, end });
                }
                GameSelection::Schedule { team_id, start, end }
            }
        };

        let concurrency = get(CONCURRENCY_VAR)
            .map(|v| {
                v.parse::<usize>()
                    .ok()
                    .and_then(NonZeroUsize::new)
                    .ok_or(ConfigError::InvalidConcurrency(v))
            })
            .transpose()?;

        let report_path = get(REPORT_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_REPORT_PATH));

        Ok(Settings { games, concurrency, report_path })
    }
}

fn parse_date(
    var: &'static str,
    value: Option<String>,
    default: &str,
) -> Result<NaiveDate, ConfigError> {
    let value = value.unwrap_or_else(|| default.to_owned());
    NaiveDate::parse_from_str(&value, "%Y-%m-%d")
        .map_err(|_| ConfigError::InvalidDate { var, value })
}

/// Parse `745001-745005,745100` style lists. Ranges are inclusive.
fn parse_game_ids(raw: &str) -> Result<Vec<GameId>, ConfigError> {
    let parse_id = |token: &str| {
        token
            .trim()
            .parse::<GameId>()
            .map_err(|_| ConfigError::InvalidGameId(token.trim().to_owned()))
    };

    let mut ids = Vec::new();
    for token in raw.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        match token.split_once('-') {
            Some((start, end)) => {
                let (start, end) = (parse_id(start)?, parse_id(end)?);
                if start > end {
                    return Err(ConfigError::InvertedGameRange { start, end });
                }
                if end - start >= MAX_RANGE_LEN {
                    return Err(ConfigError::GameRangeTooLarge { start, end });
                }
                ids.extend(start..=end);
            }
            None => ids.push(parse_id(token)?),
        }
    }

    if ids.is_empty() {
        return Err(ConfigError::NoGameIds);
    }
    Ok(ids)
}
