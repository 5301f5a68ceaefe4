use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString, IntoStaticStr};

pub type Season = u16;
pub type Week = u8;

pub const REGULAR_SEASON_WEEKS: Week = 18;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
    EnumString,
    IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum StatCategory {
    Passing,
    Rushing,
    Receiving,
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
    EnumString,
    IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum PropType {
    #[strum(to_string = "passing_yards", serialize = "player_pass_yds")]
    PassingYards,
    #[strum(to_string = "passing_attempts", serialize = "player_pass_attempts")]
    PassingAttempts,
    #[strum(to_string = "passing_completions", serialize = "player_pass_completions")]
    PassingCompletions,
    #[strum(to_string = "rushing_yards", serialize = "player_rush_yds")]
    RushingYards,
    #[strum(to_string = "rushing_attempts", serialize = "player_rush_attempts")]
    RushingAttempts,
    #[strum(to_string = "receiving_yards", serialize = "player_reception_yds")]
    ReceivingYards,
    #[strum(to_string = "receptions", serialize = "player_receptions")]
    Receptions,
}

impl PropType {
    pub fn key(self) -> &'static str {
        self.into()
    }

    pub fn category(self) -> StatCategory {
        match self {
            PropType::PassingYards | PropType::PassingAttempts | PropType::PassingCompletions => {
                StatCategory::Passing
            }
            PropType::RushingYards | PropType::RushingAttempts => StatCategory::Rushing,
            PropType::ReceivingYards | PropType::Receptions => StatCategory::Receiving,
        }
    }

    /// The box-score value this prop is graded against.
    pub fn actual(self, stat: &PlayerWeekStat) -> f64 {
        match self {
            PropType::PassingYards => stat.passing_yards,
            PropType::PassingAttempts => stat.passing_attempts,
            PropType::PassingCompletions => stat.passing_completions,
            PropType::RushingYards => stat.rushing_yards,
            PropType::RushingAttempts => stat.rushing_attempts,
            PropType::ReceivingYards => stat.receiving_yards,
            PropType::Receptions => stat.receptions,
        }
    }
}

impl StatCategory {
    /// Opportunity count for the category; zero means the player did not take part.
    pub fn volume(self, stat: &PlayerWeekStat) -> f64 {
        match self {
            StatCategory::Passing => stat.passing_attempts,
            StatCategory::Rushing => stat.rushing_attempts,
            StatCategory::Receiving => stat.targets,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub player_id: String,
    pub name: String,
    pub position: String,
    pub team: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Game {
    pub game_id: String,
    pub season: Season,
    pub week: Week,
    pub home_team: String,
    pub away_team: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub home_score: Option<i32>,
    #[serde(default)]
    pub away_score: Option<i32>,
}

impl Game {
    pub fn opponent_of(&self, team: &str) -> Option<&str> {
        if self.home_team == team {
            Some(&self.away_team)
        } else if self.away_team == team {
            Some(&self.home_team)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct NextGenStats {
    pub avg_time_to_throw: Option<f64>,
    pub avg_completed_air_yards: Option<f64>,
    pub avg_intended_air_yards: Option<f64>,
    pub avg_air_yards_differential: Option<f64>,
    pub aggressiveness: Option<f64>,
    pub completion_pct_above_expectation: Option<f64>,
    pub avg_cushion: Option<f64>,
    pub avg_separation: Option<f64>,
    pub avg_expected_yac: Option<f64>,
    pub avg_yac_above_expectation: Option<f64>,
    pub rush_efficiency: Option<f64>,
    pub avg_time_to_los: Option<f64>,
    pub expected_rush_yards: Option<f64>,
    pub rush_yards_over_expected: Option<f64>,
    pub rush_yards_over_expected_per_att: Option<f64>,
}

pub const NEXT_GEN_FIELD_COUNT: usize = 15;

impl NextGenStats {
    pub fn fields(&self) -> [Option<f64>; NEXT_GEN_FIELD_COUNT] {
        [
            self.avg_time_to_throw,
            self.avg_completed_air_yards,
            self.avg_intended_air_yards,
            self.avg_air_yards_differential,
            self.aggressiveness,
            self.completion_pct_above_expectation,
            self.avg_cushion,
            self.avg_separation,
            self.avg_expected_yac,
            self.avg_yac_above_expectation,
            self.rush_efficiency,
            self.avg_time_to_los,
            self.expected_rush_yards,
            self.rush_yards_over_expected,
            self.rush_yards_over_expected_per_att,
        ]
    }

    pub fn from_fields(f: [Option<f64>; NEXT_GEN_FIELD_COUNT]) -> Self {
        Self {
            avg_time_to_throw: f[0],
            avg_completed_air_yards: f[1],
            avg_intended_air_yards: f[2],
            avg_air_yards_differential: f[3],
            aggressiveness: f[4],
            completion_pct_above_expectation: f[5],
            avg_cushion: f[6],
            avg_separation: f[7],
            avg_expected_yac: f[8],
            avg_yac_above_expectation: f[9],
            rush_efficiency: f[10],
            avg_time_to_los: f[11],
            expected_rush_yards: f[12],
            rush_yards_over_expected: f[13],
            rush_yards_over_expected_per_att: f[14],
        }
    }
}

/// One box-score row per (player, season, week).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerWeekStat {
    pub player_id: String,
    pub season: Season,
    pub week: Week,
    #[serde(default)]
    pub team: Option<String>,

    pub passing_attempts: f64,
    pub passing_completions: f64,
    pub passing_yards: f64,
    pub passing_tds: f64,
    pub rushing_attempts: f64,
    pub rushing_yards: f64,
    pub rushing_tds: f64,
    pub targets: f64,
    pub receptions: f64,
    pub receiving_yards: f64,
    pub receiving_tds: f64,

    pub air_yards: f64,
    pub yac: f64,
    #[serde(default)]
    pub target_share: Option<f64>,
    #[serde(default)]
    pub snap_share: Option<f64>,

    #[serde(default)]
    pub passing_epa: Option<f64>,
    #[serde(default)]
    pub rushing_epa: Option<f64>,
    #[serde(default)]
    pub receiving_epa: Option<f64>,

    #[serde(default)]
    pub next_gen: NextGenStats,

    /// Larger values were ingested later.
    #[serde(default)]
    pub ingest_seq: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TeamWeekDefense {
    pub team: String,
    pub season: Season,
    pub week: Week,
    pub passing_rank: u8,
    pub rushing_rank: u8,
    pub receiving_rank: u8,
    pub overall_rank: u8,
    pub avg_passing_yards_allowed: f64,
    pub avg_rushing_yards_allowed: f64,
    pub avg_receiving_yards_allowed: f64,
    pub avg_passing_tds_allowed: f64,
    pub avg_rushing_tds_allowed: f64,
    pub avg_receiving_tds_allowed: f64,
    pub epa_per_play_allowed: f64,
}

impl TeamWeekDefense {
    pub fn rank_for(&self, category: StatCategory) -> u8 {
        match category {
            StatCategory::Passing => self.passing_rank,
            StatCategory::Rushing => self.rushing_rank,
            StatCategory::Receiving => self.receiving_rank,
        }
    }

    pub fn yards_allowed_for(&self, category: StatCategory) -> f64 {
        match category {
            StatCategory::Passing => self.avg_passing_yards_allowed,
            StatCategory::Rushing => self.avg_rushing_yards_allowed,
            StatCategory::Receiving => self.avg_receiving_yards_allowed,
        }
    }

    pub fn tds_allowed_for(&self, category: StatCategory) -> f64 {
        match category {
            StatCategory::Passing => self.avg_passing_tds_allowed,
            StatCategory::Rushing => self.avg_rushing_tds_allowed,
            StatCategory::Receiving => self.avg_receiving_tds_allowed,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TeamWeekOffense {
    pub team: String,
    pub season: Season,
    pub week: Week,
    pub passing_rank: u8,
    pub rushing_rank: u8,
    pub receiving_rank: u8,
    pub overall_rank: u8,
    pub avg_passing_yards: f64,
    pub avg_rushing_yards: f64,
    pub avg_receiving_yards: f64,
    pub avg_pass_attempts: f64,
    pub avg_rush_attempts: f64,
    pub passing_epa: f64,
    pub rushing_epa: f64,
    pub receiving_epa: f64,
    pub epa_per_play: f64,
}

impl TeamWeekOffense {
    pub fn rank_for(&self, category: StatCategory) -> u8 {
        match category {
            StatCategory::Passing => self.passing_rank,
            StatCategory::Rushing => self.rushing_rank,
            StatCategory::Receiving => self.receiving_rank,
        }
    }

    pub fn epa_for(&self, category: StatCategory) -> f64 {
        match category {
            StatCategory::Passing => self.passing_epa,
            StatCategory::Rushing => self.rushing_epa,
            StatCategory::Receiving => self.receiving_epa,
        }
    }

    pub fn yards_for(&self, category: StatCategory) -> f64 {
        match category {
            StatCategory::Passing => self.avg_passing_yards,
            StatCategory::Rushing => self.avg_rushing_yards,
            StatCategory::Receiving => self.avg_receiving_yards,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropLine {
    pub player_id: String,
    pub prop_type: PropType,
    pub season: Season,
    pub week: Week,
    pub line: f64,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EdgeBucket {
    StrongValue,
    GoodValue,
    Marginal,
}

impl EdgeBucket {
    pub fn label(self) -> &'static str {
        match self {
            EdgeBucket::StrongValue => "strong value",
            EdgeBucket::GoodValue => "good value",
            EdgeBucket::Marginal => "marginal/no edge",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Side {
    Over,
    Under,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub player_id: String,
    pub prop_type: PropType,
    pub season: Season,
    pub week: Week,
    pub line: f64,
    pub projected_value: f64,
    pub over_probability: f64,
    pub under_probability: f64,
    pub edge: f64,
    pub bucket: EdgeBucket,
    pub side: Option<Side>,
    pub confidence_low: f64,
    pub confidence_high: f64,
    pub model_version: String,
    pub generated_at: DateTime<Utc>,
    /// One-line summary of the projection for presentation.
    #[serde(default)]
    pub rationale: String,
}
