//! Trailing-window and season-to-date aggregates over a player's weekly rows.
//!
//! Everything here is recomputed from the raw rows on each call; no state is
//! carried between prediction runs.

use std::collections::BTreeMap;

use crate::records::{NEXT_GEN_FIELD_COUNT, NextGenStats, PlayerWeekStat, Week};

pub const ROLLING_WINDOW: usize = 3;
pub const TRACKED_FIELD_COUNT: usize = 11;

pub const TRACKED_FIELD_NAMES: [&str; TRACKED_FIELD_COUNT] = [
    "pass_att",
    "pass_cmp",
    "pass_yds",
    "rush_att",
    "rush_yds",
    "targets",
    "receptions",
    "rec_yds",
    "air_yards",
    "yac",
    "target_share",
];

pub fn tracked_values(stat: &PlayerWeekStat) -> [f64; TRACKED_FIELD_COUNT] {
    [
        stat.passing_attempts,
        stat.passing_completions,
        stat.passing_yards,
        stat.rushing_attempts,
        stat.rushing_yards,
        stat.targets,
        stat.receptions,
        stat.receiving_yards,
        stat.air_yards,
        stat.yac,
        stat.target_share.unwrap_or(0.0),
    ]
}

/// A player's recorded weeks strictly before `target_week`, one row per week.
#[derive(Debug, Clone)]
pub struct PlayerHistory<'a> {
    weeks: Vec<&'a PlayerWeekStat>,
    target_week: Week,
}

impl<'a> PlayerHistory<'a> {
    /// Duplicate week numbers keep the row with the largest `ingest_seq`; ties
    /// on sequence keep the row that appears last in `stats`.
    pub fn before(stats: &'a [PlayerWeekStat], target_week: Week) -> Self {
        let mut by_week: BTreeMap<Week, &'a PlayerWeekStat> = BTreeMap::new();
        for stat in stats.iter().filter(|s| s.week < target_week) {
            match by_week.get(&stat.week) {
                Some(existing) if existing.ingest_seq > stat.ingest_seq => {}
                _ => {
                    by_week.insert(stat.week, stat);
                }
            }
        }
        Self {
            weeks: by_week.into_values().collect(),
            target_week,
        }
    }

    pub fn weeks(&self) -> &[&'a PlayerWeekStat] {
        &self.weeks
    }

    pub fn games_played(&self) -> usize {
        self.weeks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weeks.is_empty()
    }

    pub fn last(&self) -> Option<&'a PlayerWeekStat> {
        self.weeks.last().copied()
    }

    pub fn weeks_since_last_game(&self) -> f64 {
        self.last()
            .map(|s| f64::from(self.target_week.saturating_sub(s.week)))
            .unwrap_or(0.0)
    }

    /// Mean over the most recent recorded weeks; byes are skipped rather than
    /// counted as zero.
    pub fn rolling_mean(&self) -> [f64; TRACKED_FIELD_COUNT] {
        let start = self.weeks.len().saturating_sub(ROLLING_WINDOW);
        mean_of(&self.weeks[start..])
    }

    pub fn season_mean(&self) -> [f64; TRACKED_FIELD_COUNT] {
        mean_of(&self.weeks)
    }

    /// Each next-gen field from the latest prior week where it was posted.
    pub fn latest_next_gen(&self) -> NextGenStats {
        let mut out: [Option<f64>; NEXT_GEN_FIELD_COUNT] = [None; NEXT_GEN_FIELD_COUNT];
        for stat in self.weeks.iter().rev() {
            for (slot, value) in out.iter_mut().zip(stat.next_gen.fields()) {
                if slot.is_none()
                    && let Some(v) = value
                    && v.is_finite()
                {
                    *slot = Some(v);
                }
            }
            if out.iter().all(Option::is_some) {
                break;
            }
        }
        NextGenStats::from_fields(out)
    }
}

fn mean_of(rows: &[&PlayerWeekStat]) -> [f64; TRACKED_FIELD_COUNT] {
    let mut out = [0.0_f64; TRACKED_FIELD_COUNT];
    if rows.is_empty() {
        return out;
    }
    for row in rows {
        for (acc, v) in out.iter_mut().zip(tracked_values(row)) {
            *acc += v;
        }
    }
    let n = rows.len() as f64;
    for v in &mut out {
        *v /= n;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wk(week: Week, rec_yds: f64, seq: u64) -> PlayerWeekStat {
        PlayerWeekStat {
            player_id: "p".into(),
            season: 2025,
            week,
            receiving_yards: rec_yds,
            ingest_seq: seq,
            ..Default::default()
        }
    }

    #[test]
    fn excludes_target_and_later_weeks() {
        let stats = vec![wk(1, 10.0, 1), wk(2, 20.0, 2), wk(3, 300.0, 3), wk(4, 400.0, 4)];
        let h = PlayerHistory::before(&stats, 3);
        assert_eq!(h.games_played(), 2);
        assert_eq!(h.season_mean()[7], 15.0);
    }

    #[test]
    fn rolling_skips_missing_weeks() {
        // week 3 is a bye
        let stats = vec![
            wk(1, 10.0, 1),
            wk(2, 20.0, 2),
            wk(4, 40.0, 3),
            wk(5, 50.0, 4),
        ];
        let h = PlayerHistory::before(&stats, 6);
        assert_eq!(h.rolling_mean()[7], (20.0 + 40.0 + 50.0) / 3.0);
        assert_eq!(h.weeks_since_last_game(), 1.0);
    }

    #[test]
    fn newest_ingest_wins_duplicate_week() {
        let stats = vec![wk(1, 99.0, 7), wk(1, 10.0, 2), wk(2, 30.0, 3)];
        let h = PlayerHistory::before(&stats, 3);
        assert_eq!(h.games_played(), 2);
        assert_eq!(h.season_mean()[7], (99.0 + 30.0) / 2.0);
    }

    #[test]
    fn next_gen_fields_fall_back_to_earlier_weeks() {
        let mut a = wk(1, 0.0, 1);
        a.next_gen.avg_separation = Some(2.5);
        a.next_gen.avg_cushion = Some(6.0);
        let mut b = wk(2, 0.0, 2);
        b.next_gen.avg_separation = Some(3.5);
        let stats = vec![a, b];
        let ngs = PlayerHistory::before(&stats, 3).latest_next_gen();
        assert_eq!(ngs.avg_separation, Some(3.5));
        assert_eq!(ngs.avg_cushion, Some(6.0));
        assert_eq!(ngs.avg_time_to_throw, None);
    }
}
