//! Feature assembly: one fixed-order 75-value vector per (player, prop, week).
//!
//! Slot layout and fallbacks live in [`crate::defaults`]. Assembly never fails
//! on sparse history; it only errors when the player or season is unknown, or
//! when the store itself cannot be read.

use tracing::debug;

use crate::aggregate::PlayerHistory;
use crate::defaults::{
    EARLY_SEASON_MAX_WEEK, FEATURE_COUNT, FEATURE_NAMES, LATE_SEASON_MIN_WEEK, NEXT_GEN,
    SLOT_DEFAULTS,
};
use crate::error::{PipelineError, PipelineResult};
use crate::opponent::{opponent_defense_block, team_offense_block};
use crate::records::{
    Player, PlayerWeekStat, PropType, REGULAR_SEASON_WEEKS, Season, StatCategory, Week,
};
use crate::store::{RecordStore, team_as_of};

/// Secondary data that was missing and replaced by its documented fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DegradedFeature {
    NoHistory,
    NoOpponent,
    NoDefenseRow,
    NoTeam,
    NoOffenseRow,
    NoNextGen,
}

/// Exactly [`FEATURE_COUNT`] finite values in slot order.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    values: Vec<f64>,
}

impl FeatureVector {
    pub fn new(values: Vec<f64>) -> PipelineResult<Self> {
        if values.len() != FEATURE_COUNT {
            return Err(PipelineError::InvalidVector(format!(
                "expected {FEATURE_COUNT} slots, got {}",
                values.len()
            )));
        }
        if let Some(idx) = values.iter().position(|v| !v.is_finite()) {
            return Err(PipelineError::InvalidVector(format!(
                "slot {idx} ({}) is not finite",
                FEATURE_NAMES[idx]
            )));
        }
        Ok(Self { values })
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        FEATURE_NAMES
            .iter()
            .position(|n| *n == name)
            .map(|idx| self.values[idx])
    }

    pub fn block(&self, range: std::ops::Range<usize>) -> &[f64] {
        &self.values[range]
    }
}

#[derive(Debug, Clone)]
pub struct AssembledFeatures {
    pub vector: FeatureVector,
    pub degraded: Vec<DegradedFeature>,
}

/// Assembles vectors from an injected store. Holds no state of its own.
pub struct FeatureAssembler<'a, S: RecordStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: RecordStore + ?Sized> FeatureAssembler<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &'a S {
        self.store
    }

    pub fn assemble(
        &self,
        player_id: &str,
        prop_type: PropType,
        target_week: Week,
        season: Season,
    ) -> PipelineResult<AssembledFeatures> {
        let player = self
            .store
            .player(player_id)?
            .ok_or_else(|| PipelineError::unknown_player(player_id))?;
        if !self.store.season_has_stats(season)? {
            return Err(PipelineError::empty_season(season));
        }
        let stats = self.store.player_week_stats(player_id, season)?;
        self.assemble_with_stats(&player, &stats, prop_type, target_week, season)
    }

    /// Same as [`assemble`](Self::assemble) but reuses already-loaded rows;
    /// the trainer calls this once per recorded week of a player.
    pub fn assemble_with_stats(
        &self,
        player: &Player,
        stats: &[PlayerWeekStat],
        prop_type: PropType,
        target_week: Week,
        season: Season,
    ) -> PipelineResult<AssembledFeatures> {
        let category = prop_type.category();
        let history = PlayerHistory::before(stats, target_week);
        let mut degraded = Vec::new();
        let mut values = Vec::with_capacity(FEATURE_COUNT);

        if history.is_empty() {
            degraded.push(DegradedFeature::NoHistory);
        }

        values.extend(basic_block(history.last(), category));
        values.extend(history.rolling_mean());
        values.extend(history.season_mean());
        values.extend(context_block(&history, target_week, season));

        let opp = opponent_defense_block(
            self.store,
            &player.player_id,
            category,
            target_week,
            season,
        )?;
        degraded.extend(opp.degraded);
        values.extend(opp.values);

        let team = team_as_of(stats, target_week).or(player.team.as_deref());
        let off = team_offense_block(self.store, team, category, target_week, season)?;
        degraded.extend(off.degraded);
        values.extend(off.values);

        let ngs = history.latest_next_gen().fields();
        if ngs.iter().all(Option::is_none) {
            degraded.push(DegradedFeature::NoNextGen);
        }
        for (offset, value) in ngs.into_iter().enumerate() {
            let slot = NEXT_GEN.start + offset;
            values.push(value.unwrap_or_else(|| SLOT_DEFAULTS[slot].value(category)));
        }

        if !degraded.is_empty() {
            debug!(
                player_id = %player.player_id,
                prop = %prop_type,
                week = target_week,
                season,
                ?degraded,
                "assembled with fallbacks"
            );
        }

        Ok(AssembledFeatures {
            vector: FeatureVector::new(values)?,
            degraded,
        })
    }
}

/// Last recorded week's box score, zeroed outside the prop's category.
fn basic_block(last: Option<&PlayerWeekStat>, category: StatCategory) -> [f64; 11] {
    let Some(s) = last else {
        return [0.0; 11];
    };
    let mut out = [
        s.passing_attempts,
        s.passing_completions,
        s.passing_yards,
        s.passing_tds,
        s.rushing_attempts,
        s.rushing_yards,
        s.rushing_tds,
        s.targets,
        s.receptions,
        s.receiving_yards,
        s.receiving_tds,
    ];
    let keep = match category {
        StatCategory::Passing => 0..4,
        StatCategory::Rushing => 4..7,
        StatCategory::Receiving => 7..11,
    };
    for (idx, v) in out.iter_mut().enumerate() {
        if !keep.contains(&idx) {
            *v = 0.0;
        }
    }
    out
}

fn context_block(history: &PlayerHistory<'_>, week: Week, season: Season) -> [f64; 7] {
    [
        f64::from(week),
        f64::from(season),
        flag(week <= EARLY_SEASON_MAX_WEEK),
        flag(week >= LATE_SEASON_MIN_WEEK),
        history.games_played() as f64,
        f64::from(week) / f64::from(REGULAR_SEASON_WEEKS),
        history.weeks_since_last_game(),
    ]
}

fn flag(b: bool) -> f64 {
    if b { 1.0 } else { 0.0 }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vector_rejects_wrong_length_and_nan() {
        assert!(matches!(
            FeatureVector::new(vec![0.0; 74]),
            Err(PipelineError::InvalidVector(_))
        ));
        let mut v = vec![0.0; FEATURE_COUNT];
        v[12] = f64::NAN;
        let err = FeatureVector::new(v).unwrap_err();
        assert!(err.to_string().contains("roll3_pass_cmp"));
    }

    #[test]
    fn basic_block_masks_other_categories() {
        let stat = PlayerWeekStat {
            passing_yards: 250.0,
            rushing_yards: 12.0,
            receiving_yards: 5.0,
            ..Default::default()
        };
        let b = basic_block(Some(&stat), StatCategory::Passing);
        assert_eq!(b[2], 250.0);
        assert_eq!(b[5], 0.0);
        assert_eq!(b[9], 0.0);
    }
}
