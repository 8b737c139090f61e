use crate::pipeline::aggregator::Report;
use crate::pipeline::scorer::ScoreResult;
use mlb_api::GameId;
use serde::{Deserialize, Serialize};
use std::io;

/// Header row. Must list the [`ReportRow`] fields in declaration order.
const COLUMNS: [&str; 28] = [
    "gamePk",
    "boringScore",
    "homeTeam",
    "awayTeam",
    "gameDate",
    "scoreHome",
    "scoreAway",
    "scoreDiff",
    "totalRuns",
    "totalHits",
    "lateRuns",
    "lastRunInning",
    "leadChanges",
    "deadAirInnings",
    "totalLOB",
    "pitchersUsed",
    "moundVisits",
    "reviews",
    "durationScore",
    "delayMinutes",
    "numInnings",
    "attendanceScore",
    "badTeamsPenalty",
    "winPctHome",
    "winPctAway",
    "seasonProgress",
    "weightedHits",
    "reason",
];

/// One CSV line. Diagnostic cells stay empty for exempt games.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRow {
    pub game_pk: GameId,
    pub boring_score: i64,
    pub home_team: String,
    pub away_team: String,
    pub game_date: String,
    pub score_home: Option<u32>,
    pub score_away: Option<u32>,
    pub score_diff: Option<u32>,
    pub total_runs: Option<u64>,
    pub total_hits: Option<u64>,
    pub late_runs: Option<u64>,
    pub last_run_inning: Option<u32>,
    pub lead_changes: Option<u32>,
    pub dead_air_innings: Option<u32>,
    #[serde(rename = "totalLOB")]
    pub total_lob: Option<u64>,
    pub pitchers_used: Option<u64>,
    pub mound_visits: Option<u64>,
    pub reviews: Option<u64>,
    pub duration_score: Option<f64>,
    pub delay_minutes: Option<f64>,
    pub num_innings: Option<u32>,
    pub attendance_score: Option<f64>,
    pub bad_teams_penalty: Option<f64>,
    pub win_pct_home: Option<f64>,
    pub win_pct_away: Option<f64>,
    pub season_progress: Option<f64>,
    pub weighted_hits: Option<f64>,
    pub reason: Option<String>,
}

impl From<&ScoreResult> for ReportRow {
    fn from(result: &ScoreResult) -> Self {
        let d = result.diagnostics.as_ref();
        ReportRow {
            game_pk: result.game_id,
            boring_score: result.score,
            home_team: result.matchup.home_team.clone(),
            away_team: result.matchup.away_team.clone(),
            game_date: result.matchup.game_date.clone(),
            score_home: d.map(|d| d.score_home),
            score_away: d.map(|d| d.score_away),
            score_diff: d.map(|d| d.score_diff),
            total_runs: d.map(|d| d.total_runs),
            total_hits: d.map(|d| d.total_hits),
            late_runs: d.map(|d| d.late_runs),
            last_run_inning: d.and_then(|d| d.last_run_inning),
            lead_changes: d.map(|d| d.lead_changes),
            dead_air_innings: d.map(|d| d.dead_air_innings),
            total_lob: d.map(|d| d.total_left_on_base),
            pitchers_used: d.map(|d| d.pitchers_used),
            mound_visits: d.map(|d| d.mound_visits),
            reviews: d.map(|d| d.reviews),
            duration_score: d.map(|d| d.duration_score),
            delay_minutes: d.map(|d| d.delay_minutes),
            num_innings: d.map(|d| d.num_innings),
            attendance_score: d.map(|d| d.attendance_score),
            bad_teams_penalty: d.map(|d| d.bad_teams_penalty),
            win_pct_home: d.map(|d| d.win_pct_home),
            win_pct_away: d.map(|d| d.win_pct_away),
            season_progress: d.map(|d| d.season_progress),
            weighted_hits: d.map(|d| d.weighted_hits),
            reason: result.reason.clone(),
        }
    }
}

/// Write the report as CSV in input order. The header is always written, so
/// a run that scored nothing still produces a readable file.
pub fn write_report<W: io::Write>(report: &Report, out: W) -> csv::Result<()> {
    let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(out);
    writer.write_record(COLUMNS)?;
    for entry in &report.entries {
        writer.serialize(ReportRow::from(entry))?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
pub fn read_report<R: io::Read>(input: R) -> csv::Result<Vec<ReportRow>> {
    csv::Reader::from_reader(input).deserialize().collect()
}
