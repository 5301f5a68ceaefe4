//! Derives per-week team offense/defense rankings from player box scores.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::records::{Game, PlayerWeekStat, Season, TeamWeekDefense, TeamWeekOffense, Week};

/// One team's offensive output in one game.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TeamGameTotals {
    pub team: String,
    pub opponent: String,
    pub season: Season,
    pub week: Week,
    pub passing_yards: f64,
    pub rushing_yards: f64,
    pub receiving_yards: f64,
    pub passing_tds: f64,
    pub rushing_tds: f64,
    pub receiving_tds: f64,
    pub pass_attempts: f64,
    pub rush_attempts: f64,
    pub passing_epa: f64,
    pub rushing_epa: f64,
    pub receiving_epa: f64,
}

impl TeamGameTotals {
    fn plays(&self) -> f64 {
        self.pass_attempts + self.rush_attempts
    }

    fn total_epa(&self) -> f64 {
        self.passing_epa + self.rushing_epa + self.receiving_epa
    }

    fn add(&mut self, other: &TeamGameTotals) {
        self.passing_yards += other.passing_yards;
        self.rushing_yards += other.rushing_yards;
        self.receiving_yards += other.receiving_yards;
        self.passing_tds += other.passing_tds;
        self.rushing_tds += other.rushing_tds;
        self.receiving_tds += other.receiving_tds;
        self.pass_attempts += other.pass_attempts;
        self.rush_attempts += other.rush_attempts;
        self.passing_epa += other.passing_epa;
        self.rushing_epa += other.rushing_epa;
        self.receiving_epa += other.receiving_epa;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    HigherBetter,
    LowerBetter,
}

/// Sums player rows into team-game totals. Rows without a team, or whose team
/// has no scheduled game that week, are dropped. Re-ingested weeks count once.
pub fn team_totals_from_stats(stats: &[PlayerWeekStat], games: &[Game]) -> Vec<TeamGameTotals> {
    let mut newest: HashMap<(&str, Season, Week), &PlayerWeekStat> = HashMap::new();
    for s in stats {
        let key = (s.player_id.as_str(), s.season, s.week);
        match newest.get(&key) {
            Some(existing) if existing.ingest_seq > s.ingest_seq => {}
            _ => {
                newest.insert(key, s);
            }
        }
    }

    let mut totals: BTreeMap<(Season, Week, String), TeamGameTotals> = BTreeMap::new();
    for s in newest.into_values() {
        let Some(team) = s.team.as_deref() else {
            continue;
        };
        let Some(opponent) = games
            .iter()
            .filter(|g| g.season == s.season && g.week == s.week)
            .find_map(|g| g.opponent_of(team))
        else {
            continue;
        };
        let entry = totals
            .entry((s.season, s.week, team.to_string()))
            .or_insert_with(|| TeamGameTotals {
                team: team.to_string(),
                opponent: opponent.to_string(),
                season: s.season,
                week: s.week,
                ..Default::default()
            });
        entry.add(&TeamGameTotals {
            passing_yards: s.passing_yards,
            rushing_yards: s.rushing_yards,
            receiving_yards: s.receiving_yards,
            passing_tds: s.passing_tds,
            rushing_tds: s.rushing_tds,
            receiving_tds: s.receiving_tds,
            pass_attempts: s.passing_attempts,
            rush_attempts: s.rushing_attempts,
            passing_epa: s.passing_epa.unwrap_or(0.0),
            rushing_epa: s.rushing_epa.unwrap_or(0.0),
            receiving_epa: s.receiving_epa.unwrap_or(0.0),
            ..Default::default()
        });
    }
    totals.into_values().collect()
}

#[derive(Debug, Clone, Default)]
struct SeasonToDate {
    games: f64,
    sums: TeamGameTotals,
}

impl SeasonToDate {
    fn avg(&self, f: impl Fn(&TeamGameTotals) -> f64) -> f64 {
        if self.games > 0.0 {
            f(&self.sums) / self.games
        } else {
            0.0
        }
    }

    fn epa_per_play(&self) -> f64 {
        let plays = self.sums.plays();
        if plays > 0.0 {
            self.sums.total_epa() / plays
        } else {
            0.0
        }
    }
}

/// "Entering week" snapshots: the row stored under week `w` only reflects
/// games played in weeks before `w`.
pub fn derive_team_weeks(
    totals: &[TeamGameTotals],
) -> (Vec<TeamWeekDefense>, Vec<TeamWeekOffense>) {
    let mut by_season: BTreeMap<Season, Vec<&TeamGameTotals>> = BTreeMap::new();
    for t in totals {
        by_season.entry(t.season).or_default().push(t);
    }

    let mut defense = Vec::new();
    let mut offense = Vec::new();
    for (season, rows) in by_season {
        let weeks: BTreeSet<Week> = rows.iter().map(|t| t.week).collect();
        let (Some(&first), Some(&last)) = (weeks.first(), weeks.last()) else {
            continue;
        };
        for week in first.saturating_add(1)..=last.saturating_add(1) {
            let played: Vec<&TeamGameTotals> =
                rows.iter().copied().filter(|t| t.week < week).collect();
            let (d, o) = snapshot(season, week, &played);
            defense.extend(d);
            offense.extend(o);
        }
    }
    (defense, offense)
}

fn snapshot(
    season: Season,
    week: Week,
    played: &[&TeamGameTotals],
) -> (Vec<TeamWeekDefense>, Vec<TeamWeekOffense>) {
    let mut off: BTreeMap<&str, SeasonToDate> = BTreeMap::new();
    let mut def: BTreeMap<&str, SeasonToDate> = BTreeMap::new();
    for t in played {
        let o = off.entry(t.team.as_str()).or_default();
        o.games += 1.0;
        o.sums.add(t);
        let d = def.entry(t.opponent.as_str()).or_default();
        d.games += 1.0;
        d.sums.add(t);
    }

    let pass_rank = min_ranks(&def, |s| s.avg(|t| t.passing_yards), Direction::LowerBetter);
    let rush_rank = min_ranks(&def, |s| s.avg(|t| t.rushing_yards), Direction::LowerBetter);
    let recv_rank = min_ranks(&def, |s| s.avg(|t| t.receiving_yards), Direction::LowerBetter);
    let def_overall = overall_ranks(&def, [&pass_rank, &rush_rank, &recv_rank]);

    let defense = def
        .iter()
        .map(|(team, s)| TeamWeekDefense {
            team: team.to_string(),
            season,
            week,
            passing_rank: pass_rank[team],
            rushing_rank: rush_rank[team],
            receiving_rank: recv_rank[team],
            overall_rank: def_overall[team],
            avg_passing_yards_allowed: s.avg(|t| t.passing_yards),
            avg_rushing_yards_allowed: s.avg(|t| t.rushing_yards),
            avg_receiving_yards_allowed: s.avg(|t| t.receiving_yards),
            avg_passing_tds_allowed: s.avg(|t| t.passing_tds),
            avg_rushing_tds_allowed: s.avg(|t| t.rushing_tds),
            avg_receiving_tds_allowed: s.avg(|t| t.receiving_tds),
            epa_per_play_allowed: s.epa_per_play(),
        })
        .collect();

    let pass_rank = min_ranks(&off, |s| s.avg(|t| t.passing_yards), Direction::HigherBetter);
    let rush_rank = min_ranks(&off, |s| s.avg(|t| t.rushing_yards), Direction::HigherBetter);
    let recv_rank = min_ranks(&off, |s| s.avg(|t| t.receiving_yards), Direction::HigherBetter);
    let off_overall = overall_ranks(&off, [&pass_rank, &rush_rank, &recv_rank]);

    let offense = off
        .iter()
        .map(|(team, s)| TeamWeekOffense {
            team: team.to_string(),
            season,
            week,
            passing_rank: pass_rank[team],
            rushing_rank: rush_rank[team],
            receiving_rank: recv_rank[team],
            overall_rank: off_overall[team],
            avg_passing_yards: s.avg(|t| t.passing_yards),
            avg_rushing_yards: s.avg(|t| t.rushing_yards),
            avg_receiving_yards: s.avg(|t| t.receiving_yards),
            avg_pass_attempts: s.avg(|t| t.pass_attempts),
            avg_rush_attempts: s.avg(|t| t.rush_attempts),
            passing_epa: s.avg(|t| t.passing_epa),
            rushing_epa: s.avg(|t| t.rushing_epa),
            receiving_epa: s.avg(|t| t.receiving_epa),
            epa_per_play: s.epa_per_play(),
        })
        .collect();

    (defense, offense)
}

/// Ties share the best rank of the group ("min" method).
fn min_ranks<'a>(
    teams: &BTreeMap<&'a str, SeasonToDate>,
    metric: impl Fn(&SeasonToDate) -> f64,
    direction: Direction,
) -> HashMap<&'a str, u8> {
    let values: Vec<(&'a str, f64)> = teams.iter().map(|(t, s)| (*t, metric(s))).collect();
    rank_values(&values, direction)
}

fn overall_ranks<'a>(
    teams: &BTreeMap<&'a str, SeasonToDate>,
    category_ranks: [&HashMap<&'a str, u8>; 3],
) -> HashMap<&'a str, u8> {
    let values: Vec<(&'a str, f64)> = teams
        .keys()
        .map(|t| {
            let sum: f64 = category_ranks
                .iter()
                .map(|r| f64::from(r.get(t).copied().unwrap_or(0)))
                .sum();
            (*t, sum / 3.0)
        })
        .collect();
    rank_values(&values, Direction::LowerBetter)
}

fn rank_values<'a>(values: &[(&'a str, f64)], direction: Direction) -> HashMap<&'a str, u8> {
    values
        .iter()
        .map(|(team, v)| {
            let better = values
                .iter()
                .filter(|(_, other)| match direction {
                    Direction::HigherBetter => other > v,
                    Direction::LowerBetter => other < v,
                })
                .count();
            (*team, u8::try_from(better + 1).unwrap_or(u8::MAX))
        })
        .collect()
}
