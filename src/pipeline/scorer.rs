use mlb_api::{GameId, GameRecord, GameStats, Inning, Matchup, ParseFailure};

pub const SPECIAL_GAME_REASON: &str = "Special game (no-hitter or perfect game)";
pub const EXTRA_INNINGS_REASON: &str = "Extra innings game; duration score excluded.";

// ---------------------------------------------------------------------------
// Weight table
// ---------------------------------------------------------------------------

const REGULATION_INNINGS: usize = 9;
const LATE_INNING: usize = 7;
const CLOSE_GAME_MARGIN: u32 = 2;
const SEASON_GAMES: f64 = 162.0;

const PAR_DURATION_MINUTES: f64 = 150.0;
const DURATION_MINUTES_PER_POINT: f64 = 3.0;
const DELAY_REASON_MINUTES_PER_POINT: f64 = 1.5;
const PAR_ATTENDANCE: f64 = 25_000.0;
const ATTENDANCE_PER_POINT: f64 = 2_500.0;

const REVIEW_WEIGHT: f64 = 1.0;
const MOUND_VISIT_WEIGHT: f64 = 0.3;
const BAD_TEAMS_SCALE: f64 = 20.0;
const HOME_LOSS_WEIGHT: f64 = 0.06;
const AWAY_LOSS_WEIGHT: f64 = 0.04;
const EXTRA_INNING_WEIGHT: f64 = 2.0;
const DEAD_AIR_WEIGHT: f64 = 1.5;
const LEAD_CHANGE_WEIGHT: f64 = -3.0;

const EARLY_DECISION_INNING: u32 = 3;
const EARLY_DECISION_BONUS: f64 = 4.0;
const CLOSE_LATE_SCORING_BONUS: f64 = -5.0;
const WEIGHTED_HIT_WEIGHT: f64 = -0.5;
const LATE_CLOSE_HIT_WEIGHT: f64 = 1.5;
const LATE_LOPSIDED_HIT_WEIGHT: f64 = 0.5;
const EARLY_HIT_WEIGHT: f64 = 1.0;

const LEFT_ON_BASE_WEIGHT: f64 = 0.4;
const LOW_SCORING_RUNS: std::ops::RangeInclusive<u64> = 3..=5;
const LOW_SCORING_BONUS: f64 = 4.0;
const SLUGFEST_RUNS: u64 = 10;
const SLUGFEST_BONUS: f64 = -3.0;
const PITCHER_WEIGHT: f64 = 0.5;

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// Score for one game. Exempt games carry a `reason` and no diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreResult {
    pub game_id: GameId,
    pub score: i64,
    pub matchup: Matchup,
    pub diagnostics: Option<Diagnostics>,
    pub reason: Option<String>,
}

/// Intermediate signals behind a score, rounded for the report.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Diagnostics {
    pub score_home: u32,
    pub score_away: u32,
    pub score_diff: u32,
    pub total_runs: u64,
    pub total_hits: u64,
    pub late_runs: u64,
    pub last_run_inning: Option<u32>,
    pub lead_changes: u32,
    pub dead_air_innings: u32,
    pub total_left_on_base: u64,
    pub pitchers_used: u64,
    pub mound_visits: u64,
    pub reviews: u64,
    pub duration_score: f64,
    pub delay_minutes: f64,
    pub num_innings: u32,
    pub attendance_score: f64,
    pub bad_teams_penalty: f64,
    pub win_pct_home: f64,
    pub win_pct_away: f64,
    pub season_progress: f64,
    pub weighted_hits: f64,
}

// ---------------------------------------------------------------------------
// Scoring
// ---------------------------------------------------------------------------

/// Score one game. Higher is more boring.
///
/// No-hitters and perfect games are exempt and score 0 whatever else the
/// payload says. Any other game needs valid stats; otherwise the parse
/// failure recorded on the record is handed back.
pub fn score(record: &GameRecord) -> Result<ScoreResult, ParseFailure> {
    if record.is_exempt() {
        return Ok(ScoreResult {
            game_id: record.game_id,
            score: 0,
            matchup: record.matchup.clone(),
            diagnostics: None,
            reason: Some(SPECIAL_GAME_REASON.into()),
        });
    }

    let stats = record.stats.as_ref().map_err(|failure| failure.clone())?;
    let (total, diagnostics, reason) = score_stats(stats);

    Ok(ScoreResult {
        game_id: record.game_id,
        score: total.trunc() as i64,
        matchup: record.matchup.clone(),
        diagnostics: Some(diagnostics),
        reason,
    })
}

fn score_stats(stats: &GameStats) -> (f64, Diagnostics, Option<String>) {
    let mut total = 0.0;
    let num_innings = stats.num_innings();
    let score_diff = stats.final_score.diff();
    let total_runs = stats.final_score.total();
    let delay = stats.delay_minutes.unwrap_or(0.0);

    let (duration_score, reason) = duration_component(stats, num_innings);
    total += duration_score;

    let attendance_score =
        round_half_even((PAR_ATTENDANCE - f64::from(stats.attendance)) / ATTENDANCE_PER_POINT);
    total += attendance_score;

    let reviews = stats.reviews_used.total();
    let mound_visits = stats.mound_visits_used.total();
    total += reviews as f64 * REVIEW_WEIGHT;
    total += mound_visits as f64 * MOUND_VISIT_WEIGHT;

    let quality = team_quality(stats);
    total += quality.bad_teams_penalty;
    total += f64::from(stats.records.home.losses) * HOME_LOSS_WEIGHT
        + f64::from(stats.records.away.losses) * AWAY_LOSS_WEIGHT;

    if num_innings > REGULATION_INNINGS {
        total += (num_innings - REGULATION_INNINGS) as f64 * EXTRA_INNING_WEIGHT;
    }

    let dead_air_innings = count_dead_air(&stats.innings);
    total += f64::from(dead_air_innings) * DEAD_AIR_WEIGHT;

    let lead_changes = count_lead_changes(&stats.innings);
    total += f64::from(lead_changes) * LEAD_CHANGE_WEIGHT;

    let late = late_game(&stats.innings, score_diff);
    if late.last_run_inning.is_some_and(|i| i <= EARLY_DECISION_INNING) {
        total += EARLY_DECISION_BONUS;
    }
    if late.late_runs > 0 && score_diff <= CLOSE_GAME_MARGIN {
        total += CLOSE_LATE_SCORING_BONUS;
    }
    total += late.weighted_hits * WEIGHTED_HIT_WEIGHT;

    let total_left_on_base = stats.left_on_base.total();
    total += total_left_on_base as f64 * LEFT_ON_BASE_WEIGHT;

    if LOW_SCORING_RUNS.contains(&total_runs) {
        total += LOW_SCORING_BONUS;
    } else if total_runs > SLUGFEST_RUNS {
        total += SLUGFEST_BONUS;
    }

    let pitchers_used = stats.pitchers_used.total();
    total += pitchers_used as f64 * PITCHER_WEIGHT;

    let diagnostics = Diagnostics {
        score_home: stats.final_score.home,
        score_away: stats.final_score.away,
        score_diff,
        total_runs,
        total_hits: stats.final_hits.total(),
        late_runs: late.late_runs,
        last_run_inning: late.last_run_inning,
        lead_changes,
        dead_air_innings,
        total_left_on_base,
        pitchers_used,
        mound_visits,
        reviews,
        duration_score: round_to(duration_score, 2),
        delay_minutes: delay,
        num_innings: num_innings as u32,
        attendance_score: round_to(attendance_score, 2),
        bad_teams_penalty: round_to(quality.bad_teams_penalty, 2),
        win_pct_home: round_to(quality.win_pct.home, 3),
        win_pct_away: round_to(quality.win_pct.away, 3),
        season_progress: round_to(quality.season_progress, 3),
        weighted_hits: round_to(late.weighted_hits, 2),
    };

    (total, diagnostics, reason)
}

/// Long games are boring; extra-inning games get their own penalty instead.
fn duration_component(stats: &GameStats, num_innings: usize) -> (f64, Option<String>) {
    if num_innings > REGULATION_INNINGS {
        return (0.0, Some(EXTRA_INNINGS_REASON.into()));
    }

    let delay = stats.delay_minutes.unwrap_or(0.0);
    let duration_score = match stats.duration_minutes {
        Some(minutes) => {
            round_half_even((minutes - PAR_DURATION_MINUTES) / DURATION_MINUTES_PER_POINT)
        }
        None => round_half_even(delay / DURATION_MINUTES_PER_POINT),
    };

    let reason = (delay != 0.0).then(|| {
        let delay_score = duration_score + round_half_even(delay / DELAY_REASON_MINUTES_PER_POINT);
        format!("Game delay excluded. Delay score: {delay_score}")
    });
    (duration_score, reason)
}

struct TeamQuality {
    win_pct: mlb_api::HomeAway<f64>,
    season_progress: f64,
    bad_teams_penalty: f64,
}

/// Two losing teams deep into the season make for a boring matchup.
fn team_quality(stats: &GameStats) -> TeamQuality {
    let win_pct = stats.records.map(|r| r.winning_percentage.max(0.0));
    let games_played = stats
        .records
        .iter()
        .map(|r| r.games_played())
        .max()
        .unwrap_or(0);
    let season_progress = (games_played as f64 / SEASON_GAMES).min(1.0);
    let bad_teams_penalty =
        (1.0 - win_pct.home) * (1.0 - win_pct.away) * season_progress * BAD_TEAMS_SCALE;
    TeamQuality { win_pct, season_progress, bad_teams_penalty }
}

fn count_dead_air(innings: &[Inning]) -> u32 {
    innings
        .iter()
        .flat_map(|inning| inning.iter())
        .filter(|half| half.is_dead_air())
        .count() as u32
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Leader {
    Home,
    Away,
    Tie,
}

/// Counts swaps of the leading team. Ties are stepped over: home, tie, away
/// is one change; home, tie, home is none.
fn count_lead_changes(innings: &[Inning]) -> u32 {
    let mut running = (0u64, 0u64);
    let mut last_leader: Option<Leader> = None;
    let mut changes = 0;

    for inning in innings {
        running.0 += u64::from(inning.home.runs);
        running.1 += u64::from(inning.away.runs);
        let leader = match running.0.cmp(&running.1) {
            std::cmp::Ordering::Greater => Leader::Home,
            std::cmp::Ordering::Less => Leader::Away,
            std::cmp::Ordering::Equal => Leader::Tie,
        };
        if leader == Leader::Tie {
            continue;
        }
        if last_leader.is_some_and(|prev| prev != leader) {
            changes += 1;
        }
        last_leader = Some(leader);
    }
    changes
}

#[derive(Debug, Default)]
struct LateGame {
    late_runs: u64,
    last_run_inning: Option<u32>,
    weighted_hits: f64,
}

fn late_game(innings: &[Inning], score_diff: u32) -> LateGame {
    let mut late = LateGame::default();

    for (number, inning) in (1..).zip(innings) {
        if inning.iter().any(|half| half.runs > 0) {
            late.last_run_inning = Some(number);
        }
        let is_late = number as usize >= LATE_INNING;
        let weight = match (is_late, score_diff <= CLOSE_GAME_MARGIN) {
            (true, true) => LATE_CLOSE_HIT_WEIGHT,
            (true, false) => LATE_LOPSIDED_HIT_WEIGHT,
            (false, _) => EARLY_HIT_WEIGHT,
        };
        for half in inning.iter() {
            if is_late {
                late.late_runs += u64::from(half.runs);
            }
            late.weighted_hits += f64::from(half.hits) * weight;
        }
    }
    late
}

/// Ties go to the even neighbour, so 2.5 rounds to 2 and 3.5 to 4.
fn round_half_even(value: f64) -> f64 {
    value.round_ties_even()
}

fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round_ties_even() / factor
}
