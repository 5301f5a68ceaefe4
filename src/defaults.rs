//! Slot layout of the 75-value feature vector and the fallback for every slot.
//!
//! Assembly code never invents its own fill values; whenever underlying data
//! is missing it asks this table.

use crate::records::StatCategory;

pub const FEATURE_COUNT: usize = 75;

pub const BASIC: std::ops::Range<usize> = 0..11;
pub const ROLLING: std::ops::Range<usize> = 11..22;
pub const SEASON: std::ops::Range<usize> = 22..33;
pub const CONTEXT: std::ops::Range<usize> = 33..40;
pub const OPPONENT: std::ops::Range<usize> = 40..50;
pub const OFFENSE: std::ops::Range<usize> = 50..60;
pub const NEXT_GEN: std::ops::Range<usize> = 60..75;

pub const EARLY_SEASON_MAX_WEEK: u8 = 4;
pub const LATE_SEASON_MIN_WEEK: u8 = 15;

pub const LEAGUE_AVG_RANK: f64 = 16.5;
pub const LEAGUE_AVG_PASSING_YARDS: f64 = 225.0;
pub const LEAGUE_AVG_RUSHING_YARDS: f64 = 115.0;
pub const LEAGUE_AVG_RECEIVING_YARDS: f64 = 225.0;
pub const LEAGUE_AVG_PASSING_TDS: f64 = 1.4;
pub const LEAGUE_AVG_RUSHING_TDS: f64 = 0.8;
pub const LEAGUE_AVG_RECEIVING_TDS: f64 = 1.4;
pub const LEAGUE_AVG_PASS_ATTEMPTS: f64 = 34.0;
pub const LEAGUE_AVG_RUSH_ATTEMPTS: f64 = 27.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SlotDefault {
    Zero,
    Const(f64),
    /// League average that depends on the prop's stat category.
    ByCategory {
        passing: f64,
        rushing: f64,
        receiving: f64,
    },
}

impl SlotDefault {
    pub fn value(self, category: StatCategory) -> f64 {
        match self {
            SlotDefault::Zero => 0.0,
            SlotDefault::Const(v) => v,
            SlotDefault::ByCategory {
                passing,
                rushing,
                receiving,
            } => match category {
                StatCategory::Passing => passing,
                StatCategory::Rushing => rushing,
                StatCategory::Receiving => receiving,
            },
        }
    }
}

const Z: SlotDefault = SlotDefault::Zero;
const RANK: SlotDefault = SlotDefault::Const(LEAGUE_AVG_RANK);
const CAT_YARDS: SlotDefault = SlotDefault::ByCategory {
    passing: LEAGUE_AVG_PASSING_YARDS,
    rushing: LEAGUE_AVG_RUSHING_YARDS,
    receiving: LEAGUE_AVG_RECEIVING_YARDS,
};
const CAT_TDS: SlotDefault = SlotDefault::ByCategory {
    passing: LEAGUE_AVG_PASSING_TDS,
    rushing: LEAGUE_AVG_RUSHING_TDS,
    receiving: LEAGUE_AVG_RECEIVING_TDS,
};

#[rustfmt::skip]
pub const SLOT_DEFAULTS: [SlotDefault; FEATURE_COUNT] = [
    // basic
    Z, Z, Z, Z, Z, Z, Z, Z, Z, Z, Z,
    // rolling
    Z, Z, Z, Z, Z, Z, Z, Z, Z, Z, Z,
    // season
    Z, Z, Z, Z, Z, Z, Z, Z, Z, Z, Z,
    // context
    Z, Z, Z, Z, Z, Z, Z,
    // opponent defense
    RANK,
    CAT_YARDS,
    RANK,
    RANK,
    RANK,
    RANK,
    SlotDefault::Const(LEAGUE_AVG_PASSING_YARDS),
    SlotDefault::Const(LEAGUE_AVG_RUSHING_YARDS),
    SlotDefault::Const(LEAGUE_AVG_RECEIVING_YARDS),
    CAT_TDS,
    // team offense
    RANK,
    Z,
    CAT_YARDS,
    RANK,
    Z,
    SlotDefault::Const(LEAGUE_AVG_PASSING_YARDS),
    SlotDefault::Const(LEAGUE_AVG_RUSHING_YARDS),
    SlotDefault::Const(LEAGUE_AVG_RECEIVING_YARDS),
    SlotDefault::Const(LEAGUE_AVG_PASS_ATTEMPTS),
    SlotDefault::Const(LEAGUE_AVG_RUSH_ATTEMPTS),
    // next-gen
    Z, Z, Z, Z, Z, Z, Z, Z, Z, Z, Z, Z, Z, Z, Z,
];

pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "last_pass_att",
    "last_pass_cmp",
    "last_pass_yds",
    "last_pass_td",
    "last_rush_att",
    "last_rush_yds",
    "last_rush_td",
    "last_targets",
    "last_receptions",
    "last_rec_yds",
    "last_rec_td",
    "roll3_pass_att",
    "roll3_pass_cmp",
    "roll3_pass_yds",
    "roll3_rush_att",
    "roll3_rush_yds",
    "roll3_targets",
    "roll3_receptions",
    "roll3_rec_yds",
    "roll3_air_yards",
    "roll3_yac",
    "roll3_target_share",
    "season_pass_att",
    "season_pass_cmp",
    "season_pass_yds",
    "season_rush_att",
    "season_rush_yds",
    "season_targets",
    "season_receptions",
    "season_rec_yds",
    "season_air_yards",
    "season_yac",
    "season_target_share",
    "week",
    "season",
    "early_season",
    "late_season",
    "games_played",
    "season_progress",
    "weeks_since_last_game",
    "opp_category_rank",
    "opp_category_yds_allowed",
    "opp_pass_rank",
    "opp_rush_rank",
    "opp_recv_rank",
    "opp_overall_rank",
    "opp_pass_yds_allowed",
    "opp_rush_yds_allowed",
    "opp_recv_yds_allowed",
    "opp_category_tds_allowed",
    "team_category_rank",
    "team_category_epa",
    "team_category_yds",
    "team_overall_rank",
    "team_epa_per_play",
    "team_pass_yds",
    "team_rush_yds",
    "team_recv_yds",
    "team_pass_att",
    "team_rush_att",
    "ngs_avg_time_to_throw",
    "ngs_avg_completed_air_yards",
    "ngs_avg_intended_air_yards",
    "ngs_avg_air_yards_differential",
    "ngs_aggressiveness",
    "ngs_cpoe",
    "ngs_avg_cushion",
    "ngs_avg_separation",
    "ngs_avg_expected_yac",
    "ngs_avg_yac_above_expectation",
    "ngs_rush_efficiency",
    "ngs_avg_time_to_los",
    "ngs_expected_rush_yards",
    "ngs_rush_yards_over_expected",
    "ngs_rush_yards_over_expected_per_att",
];

/// Fallback values for a block, in slot order.
pub fn block_defaults(block: std::ops::Range<usize>, category: StatCategory) -> Vec<f64> {
    SLOT_DEFAULTS[block]
        .iter()
        .map(|d| d.value(category))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn blocks_tile_the_vector() {
        let blocks = [BASIC, ROLLING, SEASON, CONTEXT, OPPONENT, OFFENSE, NEXT_GEN];
        let mut next = 0;
        for b in blocks {
            assert_eq!(b.start, next);
            next = b.end;
        }
        assert_eq!(next, FEATURE_COUNT);
    }

    #[test]
    fn feature_names_are_unique() {
        let set: HashSet<_> = FEATURE_NAMES.iter().collect();
        assert_eq!(set.len(), FEATURE_COUNT);
    }

    #[test]
    fn opponent_defaults_are_league_average_not_zero() {
        let d = block_defaults(OPPONENT, StatCategory::Rushing);
        assert_eq!(d[0], LEAGUE_AVG_RANK);
        assert_eq!(d[1], LEAGUE_AVG_RUSHING_YARDS);
        assert_eq!(d[9], LEAGUE_AVG_RUSHING_TDS);
        assert!(d.iter().all(|v| *v > 0.0));
    }
}
