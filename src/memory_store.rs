use std::collections::HashMap;

use anyhow::Result;

use crate::records::{
    Game, Player, PlayerWeekStat, PropLine, Season, TeamWeekDefense, TeamWeekOffense, Week,
};
use crate::store::{RecordStore, team_as_of};

/// Owned, in-memory record store. Used for tests, benches and the synthetic
/// demo league; behaves like the sqlite store but keeps duplicate week rows so
/// the aggregator's tie-break can be exercised.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    players: HashMap<String, Player>,
    stats: HashMap<(String, Season), Vec<PlayerWeekStat>>,
    defense: HashMap<(String, Season), Vec<TeamWeekDefense>>,
    offense: HashMap<(String, Season), Vec<TeamWeekOffense>>,
    games: Vec<Game>,
    lines: Vec<PropLine>,
    next_seq: u64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_player(&mut self, player: Player) {
        self.players.insert(player.player_id.clone(), player);
    }

    /// Appends a stat row. A zero `ingest_seq` is replaced by the next sequence
    /// number so later inserts always win the duplicate-week tie-break.
    pub fn insert_stat(&mut self, mut stat: PlayerWeekStat) {
        self.next_seq += 1;
        if stat.ingest_seq == 0 {
            stat.ingest_seq = self.next_seq;
        } else {
            self.next_seq = self.next_seq.max(stat.ingest_seq);
        }
        let rows = self
            .stats
            .entry((stat.player_id.clone(), stat.season))
            .or_default();
        rows.push(stat);
        rows.sort_by(|a, b| a.week.cmp(&b.week).then(a.ingest_seq.cmp(&b.ingest_seq)));
    }

    pub fn insert_defense(&mut self, row: TeamWeekDefense) {
        let rows = self.defense.entry((row.team.clone(), row.season)).or_default();
        rows.retain(|r| r.week != row.week);
        rows.push(row);
        rows.sort_by_key(|r| r.week);
    }

    pub fn insert_offense(&mut self, row: TeamWeekOffense) {
        let rows = self.offense.entry((row.team.clone(), row.season)).or_default();
        rows.retain(|r| r.week != row.week);
        rows.push(row);
        rows.sort_by_key(|r| r.week);
    }

    pub fn insert_game(&mut self, game: Game) {
        self.games.retain(|g| g.game_id != game.game_id);
        self.games.push(game);
    }

    pub fn insert_line(&mut self, line: PropLine) {
        self.lines.retain(|l| {
            !(l.player_id == line.player_id
                && l.prop_type == line.prop_type
                && l.season == line.season
                && l.week == line.week)
        });
        self.lines.push(line);
    }

    pub fn players(&self) -> impl Iterator<Item = &Player> {
        self.players.values()
    }

    pub fn games(&self, season: Season) -> Vec<Game> {
        let mut out = self
            .games
            .iter()
            .filter(|g| g.season == season)
            .cloned()
            .collect::<Vec<_>>();
        out.sort_by(|a, b| a.week.cmp(&b.week).then(a.game_id.cmp(&b.game_id)));
        out
    }

    pub fn season_stats(&self, season: Season) -> Vec<PlayerWeekStat> {
        let mut out = self
            .stats
            .iter()
            .filter(|((_, s), _)| *s == season)
            .flat_map(|(_, rows)| rows.iter().cloned())
            .collect::<Vec<_>>();
        out.sort_by(|a, b| {
            a.week
                .cmp(&b.week)
                .then(a.player_id.cmp(&b.player_id))
                .then(a.ingest_seq.cmp(&b.ingest_seq))
        });
        out
    }
}

impl RecordStore for MemoryStore {
    fn player(&self, player_id: &str) -> Result<Option<Player>> {
        Ok(self.players.get(player_id).cloned())
    }

    fn season_has_stats(&self, season: Season) -> Result<bool> {
        Ok(self
            .stats
            .iter()
            .any(|((_, s), rows)| *s == season && !rows.is_empty()))
    }

    fn player_ids_with_stats(&self, season: Season) -> Result<Vec<String>> {
        let mut ids = self
            .stats
            .iter()
            .filter(|((_, s), rows)| *s == season && !rows.is_empty())
            .map(|((id, _), _)| id.clone())
            .collect::<Vec<_>>();
        ids.sort();
        Ok(ids)
    }

    fn player_week_stats(&self, player_id: &str, season: Season) -> Result<Vec<PlayerWeekStat>> {
        Ok(self
            .stats
            .get(&(player_id.to_string(), season))
            .cloned()
            .unwrap_or_default())
    }

    fn team_week_defense(
        &self,
        team: &str,
        season: Season,
        as_of_week: Week,
    ) -> Result<Option<TeamWeekDefense>> {
        Ok(self
            .defense
            .get(&(team.to_string(), season))
            .and_then(|rows| rows.iter().rev().find(|r| r.week <= as_of_week))
            .cloned())
    }

    fn team_week_offense(
        &self,
        team: &str,
        season: Season,
        as_of_week: Week,
    ) -> Result<Option<TeamWeekOffense>> {
        Ok(self
            .offense
            .get(&(team.to_string(), season))
            .and_then(|rows| rows.iter().rev().find(|r| r.week <= as_of_week))
            .cloned())
    }

    fn opponent(&self, player_id: &str, week: Week, season: Season) -> Result<Option<String>> {
        let recorded = self
            .stats
            .get(&(player_id.to_string(), season))
            .and_then(|rows| team_as_of(rows, week));
        let Some(team) = recorded.or_else(|| {
            self.players
                .get(player_id)
                .and_then(|p| p.team.as_deref())
        }) else {
            return Ok(None);
        };
        Ok(self
            .games
            .iter()
            .filter(|g| g.season == season && g.week == week)
            .find_map(|g| g.opponent_of(team))
            .map(str::to_string))
    }

    fn active_prop_lines(&self, season: Season, week: Week) -> Result<Vec<PropLine>> {
        let mut out = self
            .lines
            .iter()
            .filter(|l| l.active && l.season == season && l.week == week)
            .cloned()
            .collect::<Vec<_>>();
        out.sort_by(|a, b| {
            a.player_id
                .cmp(&b.player_id)
                .then(a.prop_type.cmp(&b.prop_type))
        });
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stat(player: &str, week: Week, rec_yds: f64) -> PlayerWeekStat {
        PlayerWeekStat {
            player_id: player.to_string(),
            season: 2025,
            week,
            receiving_yards: rec_yds,
            ..Default::default()
        }
    }

    #[test]
    fn later_inserts_get_larger_sequence() {
        let mut store = MemoryStore::new();
        store.insert_stat(stat("p1", 2, 10.0));
        store.insert_stat(stat("p1", 2, 30.0));
        let rows = store.player_week_stats("p1", 2025).unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows[1].ingest_seq > rows[0].ingest_seq);
        assert_eq!(rows[1].receiving_yards, 30.0);
    }

    #[test]
    fn defense_lookup_respects_as_of_week() {
        let mut store = MemoryStore::new();
        for week in [1, 3, 6] {
            store.insert_defense(TeamWeekDefense {
                team: "KC".into(),
                season: 2025,
                week,
                passing_rank: week,
                ..Default::default()
            });
        }
        let row = store.team_week_defense("KC", 2025, 5).unwrap().unwrap();
        assert_eq!(row.week, 3);
        assert!(store.team_week_defense("KC", 2025, 0).unwrap().is_none());
    }
}
