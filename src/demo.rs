//! Seeded synthetic league used by `seed_demo`, the benches and tests.

use anyhow::{Context, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rusqlite::Connection;

use crate::memory_store::MemoryStore;
use crate::rankings::{derive_team_weeks, team_totals_from_stats};
use crate::records::{
    Game, NextGenStats, Player, PlayerWeekStat, PropLine, PropType, Season, Week,
};
use crate::sqlite_store;

const TEAMS: [&str; 8] = ["KC", "BUF", "DEN", "LV", "MIA", "NYJ", "CIN", "BAL"];

#[derive(Debug, Clone)]
pub struct DemoConfig {
    pub seed: u64,
    pub seasons: Vec<Season>,
    /// Weeks played in every season but the last.
    pub weeks: Week,
    /// Weeks played in the last season; lines are posted for the week after.
    pub current_week: Week,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            seed: 7,
            seasons: vec![2024, 2025],
            weeks: 17,
            current_week: 8,
        }
    }
}

impl DemoConfig {
    pub fn line_week(&self) -> Week {
        self.current_week + 1
    }

    pub fn line_season(&self) -> Season {
        self.seasons.last().copied().unwrap_or(2025)
    }
}

#[derive(Debug, Clone, Default)]
pub struct DemoLeague {
    pub players: Vec<Player>,
    pub games: Vec<Game>,
    pub stats: Vec<PlayerWeekStat>,
    pub lines: Vec<PropLine>,
}

#[derive(Debug, Clone, Copy)]
enum Role {
    Qb,
    Rb,
    Wr,
    Te,
}

#[derive(Debug, Clone)]
struct Profile {
    player: Player,
    role: Role,
    volume: f64,
    efficiency: f64,
}

pub fn build_demo_league(cfg: &DemoConfig) -> DemoLeague {
    let mut rng = StdRng::seed_from_u64(cfg.seed);
    let defense_mult: Vec<f64> = TEAMS.iter().map(|_| rng.gen_range(0.8..1.2)).collect();
    let profiles = roster(&mut rng);

    let mut league = DemoLeague {
        players: profiles.iter().map(|p| p.player.clone()).collect(),
        ..Default::default()
    };

    let last_season = cfg.line_season();
    for &season in &cfg.seasons {
        let played = if season == last_season {
            cfg.current_week
        } else {
            cfg.weeks
        };
        let scheduled = if season == last_season {
            cfg.line_week()
        } else {
            cfg.weeks
        };
        for week in 1..=scheduled {
            let games = pairings(season, week);
            for (home, away) in &games {
                league.games.push(Game {
                    game_id: format!("{season}_{week:02}_{}_{}", TEAMS[*away], TEAMS[*home]),
                    season,
                    week,
                    home_team: TEAMS[*home].to_string(),
                    away_team: TEAMS[*away].to_string(),
                    completed: week <= played,
                    home_score: (week <= played).then(|| rng.gen_range(10..35)),
                    away_score: (week <= played).then(|| rng.gen_range(10..35)),
                });
            }
            if week > played {
                continue;
            }
            for (home, away) in games {
                for (team, opp) in [(home, away), (away, home)] {
                    let on_team = profiles
                        .iter()
                        .filter(|p| p.player.team.as_deref() == Some(TEAMS[team]));
                    for p in on_team {
                        let row = box_score(&mut rng, p, season, week, defense_mult[opp]);
                        league.stats.push(row);
                    }
                }
            }
        }
    }

    league.lines = post_lines(&league, last_season, cfg.line_week());
    league
}

impl DemoLeague {
    /// In-memory store with derived team rankings.
    pub fn into_memory_store(self) -> MemoryStore {
        let mut store = MemoryStore::new();
        let totals = team_totals_from_stats(&self.stats, &self.games);
        let (defense, offense) = derive_team_weeks(&totals);
        for p in self.players {
            store.insert_player(p);
        }
        for g in self.games {
            store.insert_game(g);
        }
        for s in self.stats {
            store.insert_stat(s);
        }
        for d in defense {
            store.insert_defense(d);
        }
        for o in offense {
            store.insert_offense(o);
        }
        for l in self.lines {
            store.insert_line(l);
        }
        store
    }

    pub fn write_sqlite(&self, conn: &mut Connection) -> Result<()> {
        {
            let tx = conn.transaction().context("begin demo seed transaction")?;
            for p in &self.players {
                sqlite_store::upsert_player(&tx, p)?;
            }
            for g in &self.games {
                sqlite_store::upsert_game(&tx, g)?;
            }
            for s in &self.stats {
                sqlite_store::insert_stat(&tx, s)?;
            }
            for l in &self.lines {
                sqlite_store::upsert_prop_line(&tx, l)?;
            }
            tx.commit().context("commit demo seed transaction")?;
        }
        let totals = team_totals_from_stats(&self.stats, &self.games);
        let (defense, offense) = derive_team_weeks(&totals);
        let mut seasons: Vec<Season> = self.games.iter().map(|g| g.season).collect();
        seasons.sort_unstable();
        seasons.dedup();
        for season in seasons {
            let d: Vec<_> = defense.iter().filter(|r| r.season == season).cloned().collect();
            let o: Vec<_> = offense.iter().filter(|r| r.season == season).cloned().collect();
            sqlite_store::replace_team_weeks(conn, season, &d, &o)?;
        }
        Ok(())
    }
}

fn roster(rng: &mut StdRng) -> Vec<Profile> {
    let mut out = Vec::new();
    for team in TEAMS {
        for (slot, role, position) in [
            ("qb1", Role::Qb, "QB"),
            ("rb1", Role::Rb, "RB"),
            ("wr1", Role::Wr, "WR"),
            ("wr2", Role::Wr, "WR"),
            ("te1", Role::Te, "TE"),
        ] {
            let (volume, efficiency) = match role {
                Role::Qb => (rng.gen_range(30.0..38.0), rng.gen_range(6.3..7.8)),
                Role::Rb => (rng.gen_range(12.0..20.0), rng.gen_range(3.8..4.9)),
                Role::Wr => (rng.gen_range(5.0..10.0), rng.gen_range(11.0..14.5)),
                Role::Te => (rng.gen_range(3.5..7.0), rng.gen_range(9.0..11.5)),
            };
            let player_id = format!("{}-{slot}", team.to_lowercase());
            out.push(Profile {
                player: Player {
                    name: format!("{team} {}", slot.to_uppercase()),
                    player_id,
                    position: position.to_string(),
                    team: Some(team.to_string()),
                },
                role,
                volume,
                efficiency,
            });
        }
    }
    out
}

/// Circle-method round robin; every fifth week the first pairing is a bye.
fn pairings(season: Season, week: Week) -> Vec<(usize, usize)> {
    let n = TEAMS.len();
    let round = (usize::from(week) + usize::from(season)) % (n - 1);
    let mut ring: Vec<usize> = (1..n).collect();
    ring.rotate_left(round);
    let mut order = vec![0];
    order.extend(ring);
    let mut games: Vec<(usize, usize)> = (0..n / 2)
        .map(|i| {
            let (a, b) = (order[i], order[n - 1 - i]);
            if week % 2 == 0 { (a, b) } else { (b, a) }
        })
        .collect();
    if week % 5 == 0 {
        games.remove(0);
    }
    games
}

fn box_score(
    rng: &mut StdRng,
    p: &Profile,
    season: Season,
    week: Week,
    defense_mult: f64,
) -> PlayerWeekStat {
    let mut s = PlayerWeekStat {
        player_id: p.player.player_id.clone(),
        season,
        week,
        team: p.player.team.clone(),
        ..Default::default()
    };
    let vol = (p.volume * (1.0 + 0.18 * gauss(rng))).max(0.0).round();
    let eff = (p.efficiency * defense_mult * (1.0 + 0.25 * gauss(rng))).max(0.0);
    match p.role {
        Role::Qb => {
            s.passing_attempts = vol;
            s.passing_completions = (vol * rng.gen_range(0.58..0.72)).round();
            s.passing_yards = (vol * eff).round();
            s.passing_tds = f64::from(rng.gen_range(0..4_u8));
            s.rushing_attempts = f64::from(rng.gen_range(0..6_u8));
            s.rushing_yards = (s.rushing_attempts * rng.gen_range(1.0..6.0)).round();
            s.passing_epa = Some(rng.gen_range(-8.0..14.0));
            s.next_gen = NextGenStats {
                avg_time_to_throw: maybe(rng, 2.5..3.1),
                avg_completed_air_yards: maybe(rng, 5.0..7.5),
                avg_intended_air_yards: maybe(rng, 7.0..9.5),
                avg_air_yards_differential: maybe(rng, -3.0..-1.0),
                aggressiveness: maybe(rng, 10.0..22.0),
                completion_pct_above_expectation: maybe(rng, -5.0..6.0),
                ..Default::default()
            };
        }
        Role::Rb => {
            s.rushing_attempts = vol;
            s.rushing_yards = (vol * eff).round();
            s.rushing_tds = f64::from(rng.gen_range(0..2_u8));
            s.targets = f64::from(rng.gen_range(1..5_u8));
            s.receptions = (s.targets * 0.75).round();
            s.receiving_yards = (s.receptions * rng.gen_range(5.0..9.0)).round();
            s.rushing_epa = Some(rng.gen_range(-5.0..5.0));
            s.receiving_epa = Some(rng.gen_range(-1.0..3.0));
            s.next_gen = NextGenStats {
                rush_efficiency: maybe(rng, 3.2..4.6),
                avg_time_to_los: maybe(rng, 2.6..3.0),
                expected_rush_yards: (s.rushing_attempts > 0.0).then(|| s.rushing_yards * 0.95),
                rush_yards_over_expected: maybe(rng, -10.0..15.0),
                rush_yards_over_expected_per_att: maybe(rng, -0.6..0.9),
                ..Default::default()
            };
        }
        Role::Wr | Role::Te => {
            s.targets = vol;
            s.receptions = (vol * rng.gen_range(0.55..0.78)).round();
            s.receiving_yards = (s.receptions * eff).round();
            s.receiving_tds = f64::from(rng.gen_range(0..2_u8));
            s.air_yards = (vol * rng.gen_range(6.0..12.0)).round();
            s.yac = (s.receiving_yards * rng.gen_range(0.25..0.5)).round();
            s.target_share = Some((vol / 34.0).min(1.0));
            s.receiving_epa = Some(rng.gen_range(-3.0..7.0));
            s.next_gen = NextGenStats {
                avg_cushion: maybe(rng, 5.0..7.0),
                avg_separation: maybe(rng, 2.5..3.8),
                avg_expected_yac: maybe(rng, 3.0..5.5),
                avg_yac_above_expectation: maybe(rng, -1.0..2.0),
                ..Default::default()
            };
        }
    }
    s.snap_share = Some(rng.gen_range(0.55..1.0));
    s
}

fn post_lines(league: &DemoLeague, season: Season, week: Week) -> Vec<PropLine> {
    let mut out = Vec::new();
    for player in &league.players {
        let rows: Vec<&PlayerWeekStat> = league
            .stats
            .iter()
            .filter(|s| s.player_id == player.player_id && s.season == season && s.week < week)
            .collect();
        if rows.is_empty() {
            continue;
        }
        let props: &[PropType] = match player.position.as_str() {
            "QB" => &[
                PropType::PassingYards,
                PropType::PassingAttempts,
                PropType::PassingCompletions,
            ],
            "RB" => &[PropType::RushingYards, PropType::RushingAttempts],
            _ => &[PropType::ReceivingYards, PropType::Receptions],
        };
        for &prop_type in props {
            let avg = rows.iter().map(|s| prop_type.actual(s)).sum::<f64>() / rows.len() as f64;
            out.push(PropLine {
                player_id: player.player_id.clone(),
                prop_type,
                season,
                week,
                line: avg.floor() + 0.5,
                active: true,
            });
        }
    }
    out
}

/// Approximately standard normal (Irwin-Hall, 12 uniforms).
fn gauss(rng: &mut StdRng) -> f64 {
    (0..12).map(|_| rng.gen_range(0.0..1.0_f64)).sum::<f64>() - 6.0
}

/// Posted about 85% of the time.
fn maybe(rng: &mut StdRng, range: std::ops::Range<f64>) -> Option<f64> {
    rng.gen_bool(0.85).then(|| rng.gen_range(range))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_league() {
        let cfg = DemoConfig::default();
        let a = build_demo_league(&cfg);
        let b = build_demo_league(&cfg);
        assert_eq!(a.stats, b.stats);
        assert_eq!(a.lines, b.lines);
    }

    #[test]
    fn lines_target_the_unplayed_week() {
        let cfg = DemoConfig::default();
        let league = build_demo_league(&cfg);
        assert!(!league.lines.is_empty());
        assert!(league.lines.iter().all(|l| l.week == cfg.line_week()));
        assert!(
            !league
                .stats
                .iter()
                .any(|s| s.season == cfg.line_season() && s.week >= cfg.line_week())
        );
    }

    #[test]
    fn every_week_pairs_distinct_teams() {
        for week in 1..=18 {
            let games = pairings(2025, week);
            let mut seen = std::collections::HashSet::new();
            for (h, a) in games {
                assert_ne!(h, a);
                assert!(seen.insert(h) && seen.insert(a));
            }
        }
    }
}
