//! Read-only access to the statistical record store.
//!
//! The pipeline never reaches for global state: a store is constructed once per
//! run and handed to the assembler and trainer by reference. Implementations
//! must tolerate concurrent readers since prop lines are processed in parallel.

use anyhow::Result;

use crate::records::{
    Player, PlayerWeekStat, PropLine, Season, TeamWeekDefense, TeamWeekOffense, Week,
};

pub trait RecordStore: Sync {
    fn player(&self, player_id: &str) -> Result<Option<Player>>;

    fn season_has_stats(&self, season: Season) -> Result<bool>;

    fn player_ids_with_stats(&self, season: Season) -> Result<Vec<String>>;

    /// All rows for the player in the season, ordered by week ascending.
    /// Duplicate weeks may appear; callers resolve them by `ingest_seq`.
    fn player_week_stats(&self, player_id: &str, season: Season) -> Result<Vec<PlayerWeekStat>>;

    /// Latest row for the team with `week <= as_of_week`.
    fn team_week_defense(
        &self,
        team: &str,
        season: Season,
        as_of_week: Week,
    ) -> Result<Option<TeamWeekDefense>>;

    /// Latest row for the team with `week <= as_of_week`.
    fn team_week_offense(
        &self,
        team: &str,
        season: Season,
        as_of_week: Week,
    ) -> Result<Option<TeamWeekOffense>>;

    /// Scheduled opponent of the team the player suited up for that week
    /// (see [`team_as_of`]); `None` on a bye or when the schedule or the
    /// team is unknown.
    fn opponent(&self, player_id: &str, week: Week, season: Season) -> Result<Option<String>>;

    fn active_prop_lines(&self, season: Season, week: Week) -> Result<Vec<PropLine>>;
}

/// Team on the player's newest stat row at or before `week`. Callers fall
/// back to the current roster only when this is `None`.
pub fn team_as_of(stats: &[PlayerWeekStat], week: Week) -> Option<&str> {
    stats
        .iter()
        .filter(|s| s.week <= week && s.team.is_some())
        .max_by_key(|s| (s.week, s.ingest_seq))
        .and_then(|s| s.team.as_deref())
}

impl<S: RecordStore + ?Sized> RecordStore for &S {
    fn player(&self, player_id: &str) -> Result<Option<Player>> {
        (**self).player(player_id)
    }

    fn season_has_stats(&self, season: Season) -> Result<bool> {
        (**self).season_has_stats(season)
    }

    fn player_ids_with_stats(&self, season: Season) -> Result<Vec<String>> {
        (**self).player_ids_with_stats(season)
    }

    fn player_week_stats(&self, player_id: &str, season: Season) -> Result<Vec<PlayerWeekStat>> {
        (**self).player_week_stats(player_id, season)
    }

    fn team_week_defense(
        &self,
        team: &str,
        season: Season,
        as_of_week: Week,
    ) -> Result<Option<TeamWeekDefense>> {
        (**self).team_week_defense(team, season, as_of_week)
    }

    fn team_week_offense(
        &self,
        team: &str,
        season: Season,
        as_of_week: Week,
    ) -> Result<Option<TeamWeekOffense>> {
        (**self).team_week_offense(team, season, as_of_week)
    }

    fn opponent(&self, player_id: &str, week: Week, season: Season) -> Result<Option<String>> {
        (**self).opponent(player_id, week, season)
    }

    fn active_prop_lines(&self, season: Season, week: Week) -> Result<Vec<PropLine>> {
        (**self).active_prop_lines(season, week)
    }
}
