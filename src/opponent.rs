use tracing::debug;

use crate::defaults::{OFFENSE, OPPONENT, block_defaults};
use crate::error::PipelineResult;
use crate::features::DegradedFeature;
use crate::records::{Season, StatCategory, TeamWeekDefense, TeamWeekOffense, Week};
use crate::store::RecordStore;

/// A feature block plus the reason it fell back to defaults, if it did.
#[derive(Debug, Clone)]
pub struct Block {
    pub values: Vec<f64>,
    pub degraded: Option<DegradedFeature>,
}

/// Opponent-defense slots for the player's scheduled opponent in `week`.
///
/// Byes and unresolved schedules fall back to league averages rather than
/// zero, which would read as the weakest defense in the league.
pub fn opponent_defense_block<S: RecordStore + ?Sized>(
    store: &S,
    player_id: &str,
    category: StatCategory,
    week: Week,
    season: Season,
) -> PipelineResult<Block> {
    let Some(opponent) = store.opponent(player_id, week, season)? else {
        debug!(player_id, week, season, "no opponent scheduled; league-average defense");
        return Ok(fallback(OPPONENT, category, DegradedFeature::NoOpponent));
    };
    let Some(row) = store.team_week_defense(&opponent, season, week)? else {
        debug!(%opponent, week, season, "no defense row; league-average defense");
        return Ok(fallback(OPPONENT, category, DegradedFeature::NoDefenseRow));
    };
    Ok(Block {
        values: defense_values(&row, category),
        degraded: None,
    })
}

/// Own-team offense slots, from the player's team row at or before `week`.
pub fn team_offense_block<S: RecordStore + ?Sized>(
    store: &S,
    team: Option<&str>,
    category: StatCategory,
    week: Week,
    season: Season,
) -> PipelineResult<Block> {
    let Some(team) = team else {
        return Ok(fallback(OFFENSE, category, DegradedFeature::NoTeam));
    };
    let Some(row) = store.team_week_offense(team, season, week)? else {
        debug!(team, week, season, "no offense row; league-average offense");
        return Ok(fallback(OFFENSE, category, DegradedFeature::NoOffenseRow));
    };
    Ok(Block {
        values: offense_values(&row, category),
        degraded: None,
    })
}

fn fallback(
    block: std::ops::Range<usize>,
    category: StatCategory,
    reason: DegradedFeature,
) -> Block {
    Block {
        values: block_defaults(block, category),
        degraded: Some(reason),
    }
}

fn defense_values(row: &TeamWeekDefense, category: StatCategory) -> Vec<f64> {
    vec![
        f64::from(row.rank_for(category)),
        row.yards_allowed_for(category),
        f64::from(row.passing_rank),
        f64::from(row.rushing_rank),
        f64::from(row.receiving_rank),
        f64::from(row.overall_rank),
        row.avg_passing_yards_allowed,
        row.avg_rushing_yards_allowed,
        row.avg_receiving_yards_allowed,
        row.tds_allowed_for(category),
    ]
}

fn offense_values(row: &TeamWeekOffense, category: StatCategory) -> Vec<f64> {
    vec![
        f64::from(row.rank_for(category)),
        row.epa_for(category),
        row.yards_for(category),
        f64::from(row.overall_rank),
        row.epa_per_play,
        row.avg_passing_yards,
        row.avg_rushing_yards,
        row.avg_receiving_yards,
        row.avg_pass_attempts,
        row.avg_rush_attempts,
    ]
}
