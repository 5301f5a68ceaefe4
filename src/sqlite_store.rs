use std::path::Path;
use std::str::FromStr;
use std::sync::{Mutex, MutexGuard};

use anyhow::{Context, Result, anyhow};
use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, Row, params};
use tracing::warn;

use crate::records::{
    Game, NextGenStats, Player, PlayerWeekStat, PropLine, PropType, Season, TeamWeekDefense,
    TeamWeekOffense, Week,
};
use crate::store::RecordStore;
use crate::writer;

pub fn open_db(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).ok();
    }
    let conn =
        Connection::open(path).with_context(|| format!("open sqlite db {}", path.display()))?;
    init_schema(&conn)?;
    Ok(conn)
}

pub fn open_in_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory().context("open in-memory sqlite db")?;
    init_schema(&conn)?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        PRAGMA journal_mode = WAL;
        CREATE TABLE IF NOT EXISTS players (
            player_id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            position TEXT NOT NULL,
            team TEXT NULL
        );

        CREATE TABLE IF NOT EXISTS games (
            game_id TEXT PRIMARY KEY,
            season INTEGER NOT NULL,
            week INTEGER NOT NULL,
            home_team TEXT NOT NULL,
            away_team TEXT NOT NULL,
            completed INTEGER NOT NULL,
            home_score INTEGER NULL,
            away_score INTEGER NULL
        );
        CREATE INDEX IF NOT EXISTS idx_games_season_week ON games(season, week);

        CREATE TABLE IF NOT EXISTS player_week_stats (
            ingest_seq INTEGER PRIMARY KEY AUTOINCREMENT,
            player_id TEXT NOT NULL,
            season INTEGER NOT NULL,
            week INTEGER NOT NULL,
            team TEXT NULL,
            passing_attempts REAL NOT NULL,
            passing_completions REAL NOT NULL,
            passing_yards REAL NOT NULL,
            passing_tds REAL NOT NULL,
            rushing_attempts REAL NOT NULL,
            rushing_yards REAL NOT NULL,
            rushing_tds REAL NOT NULL,
            targets REAL NOT NULL,
            receptions REAL NOT NULL,
            receiving_yards REAL NOT NULL,
            receiving_tds REAL NOT NULL,
            air_yards REAL NOT NULL,
            yac REAL NOT NULL,
            target_share REAL NULL,
            snap_share REAL NULL,
            passing_epa REAL NULL,
            rushing_epa REAL NULL,
            receiving_epa REAL NULL,
            next_gen_json TEXT NOT NULL,
            ingested_at TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_pws_player_season ON player_week_stats(player_id, season);
        CREATE INDEX IF NOT EXISTS idx_pws_season_week ON player_week_stats(season, week);

        CREATE TABLE IF NOT EXISTS team_week_defense (
            team TEXT NOT NULL,
            season INTEGER NOT NULL,
            week INTEGER NOT NULL,
            passing_rank INTEGER NOT NULL,
            rushing_rank INTEGER NOT NULL,
            receiving_rank INTEGER NOT NULL,
            overall_rank INTEGER NOT NULL,
            avg_passing_yards_allowed REAL NOT NULL,
            avg_rushing_yards_allowed REAL NOT NULL,
            avg_receiving_yards_allowed REAL NOT NULL,
            avg_passing_tds_allowed REAL NOT NULL,
            avg_rushing_tds_allowed REAL NOT NULL,
            avg_receiving_tds_allowed REAL NOT NULL,
            epa_per_play_allowed REAL NOT NULL,
            PRIMARY KEY (team, season, week)
        );

        CREATE TABLE IF NOT EXISTS team_week_offense (
            team TEXT NOT NULL,
            season INTEGER NOT NULL,
            week INTEGER NOT NULL,
            passing_rank INTEGER NOT NULL,
            rushing_rank INTEGER NOT NULL,
            receiving_rank INTEGER NOT NULL,
            overall_rank INTEGER NOT NULL,
            avg_passing_yards REAL NOT NULL,
            avg_rushing_yards REAL NOT NULL,
            avg_receiving_yards REAL NOT NULL,
            avg_pass_attempts REAL NOT NULL,
            avg_rush_attempts REAL NOT NULL,
            passing_epa REAL NOT NULL,
            rushing_epa REAL NOT NULL,
            receiving_epa REAL NOT NULL,
            epa_per_play REAL NOT NULL,
            PRIMARY KEY (team, season, week)
        );

        CREATE TABLE IF NOT EXISTS prop_lines (
            player_id TEXT NOT NULL,
            prop_type TEXT NOT NULL,
            season INTEGER NOT NULL,
            week INTEGER NOT NULL,
            line REAL NOT NULL,
            active INTEGER NOT NULL,
            updated_at TEXT NOT NULL,
            PRIMARY KEY (player_id, prop_type, season, week)
        );
        "#,
    )
    .context("create sqlite schema")?;
    writer::init_predictions_schema(conn)?;
    Ok(())
}

/// Sqlite-backed [`RecordStore`]. The connection sits behind a mutex so that
/// parallel prediction workers can share one store.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self> {
        Ok(Self::new(open_db(path)?))
    }

    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    pub fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow!("record store connection mutex poisoned"))
    }

    pub fn into_inner(self) -> Result<Connection> {
        self.conn
            .into_inner()
            .map_err(|_| anyhow!("record store connection mutex poisoned"))
    }
}

impl RecordStore for SqliteStore {
    fn player(&self, player_id: &str) -> Result<Option<Player>> {
        let conn = self.conn()?;
        conn.query_row(
            "SELECT player_id, name, position, team FROM players WHERE player_id = ?1",
            params![player_id],
            |row| {
                Ok(Player {
                    player_id: row.get(0)?,
                    name: row.get(1)?,
                    position: row.get(2)?,
                    team: row.get(3)?,
                })
            },
        )
        .optional()
        .context("query player")
    }

    fn season_has_stats(&self, season: Season) -> Result<bool> {
        let conn = self.conn()?;
        let n = conn
            .query_row(
                "SELECT COUNT(*) FROM player_week_stats WHERE season = ?1",
                params![season],
                |row| row.get::<_, i64>(0),
            )
            .context("count season stats")?;
        Ok(n > 0)
    }

    fn player_ids_with_stats(&self, season: Season) -> Result<Vec<String>> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(
                "SELECT DISTINCT player_id FROM player_week_stats WHERE season = ?1 ORDER BY player_id",
            )
            .context("prepare player ids query")?;
        let rows = stmt
            .query_map(params![season], |row| row.get::<_, String>(0))
            .context("query player ids")?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row.context("decode player id")?);
        }
        Ok(out)
    }

    fn player_week_stats(&self, player_id: &str, season: Season) -> Result<Vec<PlayerWeekStat>> {
        let conn = self.conn()?;
        let sql = format!(
            "SELECT {STAT_COLUMNS} FROM player_week_stats
             WHERE player_id = ?1 AND season = ?2
             ORDER BY week ASC, ingest_seq ASC"
        );
        let mut stmt = conn.prepare(&sql).context("prepare player stats query")?;
        let rows = stmt
            .query_map(params![player_id, season], stat_from_row)
            .context("query player stats")?;
        collect_stats(rows)
    }

    fn team_week_defense(
        &self,
        team: &str,
        season: Season,
        as_of_week: Week,
    ) -> Result<Option<TeamWeekDefense>> {
        let conn = self.conn()?;
        conn.query_row(
            r#"
            SELECT team, season, week, passing_rank, rushing_rank, receiving_rank, overall_rank,
                   avg_passing_yards_allowed, avg_rushing_yards_allowed, avg_receiving_yards_allowed,
                   avg_passing_tds_allowed, avg_rushing_tds_allowed, avg_receiving_tds_allowed,
                   epa_per_play_allowed
            FROM team_week_defense
            WHERE team = ?1 AND season = ?2 AND week <= ?3
            ORDER BY week DESC
            LIMIT 1
            "#,
            params![team, season, as_of_week],
            |row| {
                Ok(TeamWeekDefense {
                    team: row.get(0)?,
                    season: row.get(1)?,
                    week: row.get(2)?,
                    passing_rank: row.get(3)?,
                    rushing_rank: row.get(4)?,
                    receiving_rank: row.get(5)?,
                    overall_rank: row.get(6)?,
                    avg_passing_yards_allowed: row.get(7)?,
                    avg_rushing_yards_allowed: row.get(8)?,
                    avg_receiving_yards_allowed: row.get(9)?,
                    avg_passing_tds_allowed: row.get(10)?,
                    avg_rushing_tds_allowed: row.get(11)?,
                    avg_receiving_tds_allowed: row.get(12)?,
                    epa_per_play_allowed: row.get(13)?,
                })
            },
        )
        .optional()
        .context("query team week defense")
    }

    fn team_week_offense(
        &self,
        team: &str,
        season: Season,
        as_of_week: Week,
    ) -> Result<Option<TeamWeekOffense>> {
        let conn = self.conn()?;
        conn.query_row(
            r#"
            SELECT team, season, week, passing_rank, rushing_rank, receiving_rank, overall_rank,
                   avg_passing_yards, avg_rushing_yards, avg_receiving_yards,
                   avg_pass_attempts, avg_rush_attempts,
                   passing_epa, rushing_epa, receiving_epa, epa_per_play
            FROM team_week_offense
            WHERE team = ?1 AND season = ?2 AND week <= ?3
            ORDER BY week DESC
            LIMIT 1
            "#,
            params![team, season, as_of_week],
            |row| {
                Ok(TeamWeekOffense {
                    team: row.get(0)?,
                    season: row.get(1)?,
                    week: row.get(2)?,
                    passing_rank: row.get(3)?,
                    rushing_rank: row.get(4)?,
                    receiving_rank: row.get(5)?,
                    overall_rank: row.get(6)?,
                    avg_passing_yards: row.get(7)?,
                    avg_rushing_yards: row.get(8)?,
                    avg_receiving_yards: row.get(9)?,
                    avg_pass_attempts: row.get(10)?,
                    avg_rush_attempts: row.get(11)?,
                    passing_epa: row.get(12)?,
                    rushing_epa: row.get(13)?,
                    receiving_epa: row.get(14)?,
                    epa_per_play: row.get(15)?,
                })
            },
        )
        .optional()
        .context("query team week offense")
    }

    fn opponent(&self, player_id: &str, week: Week, season: Season) -> Result<Option<String>> {
        let conn = self.conn()?;
        let recorded: Option<String> = conn
            .query_row(
                r#"
                SELECT team FROM player_week_stats
                WHERE player_id = ?1 AND season = ?2 AND week <= ?3 AND team IS NOT NULL
                ORDER BY week DESC, ingest_seq DESC
                LIMIT 1
                "#,
                params![player_id, season, week],
                |row| row.get(0),
            )
            .optional()
            .context("query team as of week")?;
        let team = match recorded {
            Some(team) => Some(team),
            None => conn
                .query_row(
                    "SELECT team FROM players WHERE player_id = ?1",
                    params![player_id],
                    |row| row.get::<_, Option<String>>(0),
                )
                .optional()
                .context("query player team")?
                .flatten(),
        };
        let Some(team) = team else {
            return Ok(None);
        };
        conn.query_row(
            r#"
            SELECT CASE WHEN home_team = ?1 THEN away_team ELSE home_team END
            FROM games
            WHERE season = ?2 AND week = ?3 AND (home_team = ?1 OR away_team = ?1)
            ORDER BY game_id
            LIMIT 1
            "#,
            params![team, season, week],
            |row| row.get::<_, String>(0),
        )
        .optional()
        .context("query opponent")
    }

    fn active_prop_lines(&self, season: Season, week: Week) -> Result<Vec<PropLine>> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(
                r#"
                SELECT player_id, prop_type, season, week, line, active
                FROM prop_lines
                WHERE season = ?1 AND week = ?2 AND active = 1
                ORDER BY player_id ASC, prop_type ASC
                "#,
            )
            .context("prepare prop lines query")?;
        let rows = stmt
            .query_map(params![season, week], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, Season>(2)?,
                    row.get::<_, Week>(3)?,
                    row.get::<_, f64>(4)?,
                    row.get::<_, i64>(5)? != 0,
                ))
            })
            .context("query prop lines")?;

        let mut out = Vec::new();
        for row in rows {
            let (player_id, prop_key, season, week, line, active) =
                row.context("decode prop line row")?;
            let Ok(prop_type) = PropType::from_str(&prop_key) else {
                warn!(%player_id, season, week, market = %prop_key, "unknown prop market; line dropped");
                continue;
            };
            out.push(PropLine {
                player_id,
                prop_type,
                season,
                week,
                line,
                active,
            });
        }
        // Stored keys sort by string; keep the enum order callers see elsewhere.
        out.sort_by(|a, b| {
            a.player_id
                .cmp(&b.player_id)
                .then(a.prop_type.cmp(&b.prop_type))
        });
        Ok(out)
    }
}

const STAT_COLUMNS: &str = "ingest_seq, player_id, season, week, team, \
    passing_attempts, passing_completions, passing_yards, passing_tds, \
    rushing_attempts, rushing_yards, rushing_tds, \
    targets, receptions, receiving_yards, receiving_tds, \
    air_yards, yac, target_share, snap_share, \
    passing_epa, rushing_epa, receiving_epa, next_gen_json";

fn stat_from_row(row: &Row<'_>) -> rusqlite::Result<(PlayerWeekStat, String)> {
    let stat = PlayerWeekStat {
        ingest_seq: row.get::<_, i64>(0)?.max(0) as u64,
        player_id: row.get(1)?,
        season: row.get(2)?,
        week: row.get(3)?,
        team: row.get(4)?,
        passing_attempts: row.get(5)?,
        passing_completions: row.get(6)?,
        passing_yards: row.get(7)?,
        passing_tds: row.get(8)?,
        rushing_attempts: row.get(9)?,
        rushing_yards: row.get(10)?,
        rushing_tds: row.get(11)?,
        targets: row.get(12)?,
        receptions: row.get(13)?,
        receiving_yards: row.get(14)?,
        receiving_tds: row.get(15)?,
        air_yards: row.get(16)?,
        yac: row.get(17)?,
        target_share: row.get(18)?,
        snap_share: row.get(19)?,
        passing_epa: row.get(20)?,
        rushing_epa: row.get(21)?,
        receiving_epa: row.get(22)?,
        next_gen: NextGenStats::default(),
    };
    Ok((stat, row.get(23)?))
}

fn collect_stats(
    rows: impl Iterator<Item = rusqlite::Result<(PlayerWeekStat, String)>>,
) -> Result<Vec<PlayerWeekStat>> {
    let mut out = Vec::new();
    for row in rows {
        let (mut stat, ngs_json) = row.context("decode player stat row")?;
        stat.next_gen = serde_json::from_str(&ngs_json).with_context(|| {
            format!(
                "invalid next-gen json for {} {}/{}",
                stat.player_id, stat.season, stat.week
            )
        })?;
        out.push(stat);
    }
    Ok(out)
}

pub fn upsert_player(conn: &Connection, player: &Player) -> Result<()> {
    conn.execute(
        r#"
        INSERT INTO players (player_id, name, position, team)
        VALUES (?1, ?2, ?3, ?4)
        ON CONFLICT(player_id) DO UPDATE SET
            name = excluded.name,
            position = excluded.position,
            team = excluded.team
        "#,
        params![player.player_id, player.name, player.position, player.team],
    )
    .context("upsert player")?;
    Ok(())
}

pub fn upsert_game(conn: &Connection, game: &Game) -> Result<()> {
    conn.execute(
        r#"
        INSERT INTO games (game_id, season, week, home_team, away_team, completed, home_score, away_score)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        ON CONFLICT(game_id) DO UPDATE SET
            season = excluded.season,
            week = excluded.week,
            home_team = excluded.home_team,
            away_team = excluded.away_team,
            completed = excluded.completed,
            home_score = excluded.home_score,
            away_score = excluded.away_score
        "#,
        params![
            game.game_id,
            game.season,
            game.week,
            game.home_team,
            game.away_team,
            bool_to_i64(game.completed),
            game.home_score,
            game.away_score,
        ],
    )
    .context("upsert game")?;
    Ok(())
}

/// Appends a stat row and returns its ingest sequence. Re-ingesting a week
/// adds a newer row rather than rewriting the old one; readers pick the newest.
pub fn insert_stat(conn: &Connection, stat: &PlayerWeekStat) -> Result<u64> {
    let ngs_json = serde_json::to_string(&stat.next_gen).context("encode next-gen stats")?;
    conn.execute(
        r#"
        INSERT INTO player_week_stats (
            player_id, season, week, team,
            passing_attempts, passing_completions, passing_yards, passing_tds,
            rushing_attempts, rushing_yards, rushing_tds,
            targets, receptions, receiving_yards, receiving_tds,
            air_yards, yac, target_share, snap_share,
            passing_epa, rushing_epa, receiving_epa, next_gen_json, ingested_at
        ) VALUES (
            ?1, ?2, ?3, ?4,
            ?5, ?6, ?7, ?8,
            ?9, ?10, ?11,
            ?12, ?13, ?14, ?15,
            ?16, ?17, ?18, ?19,
            ?20, ?21, ?22, ?23, ?24
        )
        "#,
        params![
            stat.player_id,
            stat.season,
            stat.week,
            stat.team,
            stat.passing_attempts,
            stat.passing_completions,
            stat.passing_yards,
            stat.passing_tds,
            stat.rushing_attempts,
            stat.rushing_yards,
            stat.rushing_tds,
            stat.targets,
            stat.receptions,
            stat.receiving_yards,
            stat.receiving_tds,
            stat.air_yards,
            stat.yac,
            stat.target_share,
            stat.snap_share,
            stat.passing_epa,
            stat.rushing_epa,
            stat.receiving_epa,
            ngs_json,
            Utc::now().to_rfc3339(),
        ],
    )
    .context("insert player week stat")?;
    Ok(conn.last_insert_rowid().max(0) as u64)
}

pub fn upsert_prop_line(conn: &Connection, line: &PropLine) -> Result<()> {
    conn.execute(
        r#"
        INSERT INTO prop_lines (player_id, prop_type, season, week, line, active, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        ON CONFLICT(player_id, prop_type, season, week) DO UPDATE SET
            line = excluded.line,
            active = excluded.active,
            updated_at = excluded.updated_at
        "#,
        params![
            line.player_id,
            line.prop_type.key(),
            line.season,
            line.week,
            line.line,
            bool_to_i64(line.active),
            Utc::now().to_rfc3339(),
        ],
    )
    .context("upsert prop line")?;
    Ok(())
}

/// Replaces every derived team-week row for the season in one transaction.
pub fn replace_team_weeks(
    conn: &mut Connection,
    season: Season,
    defense: &[TeamWeekDefense],
    offense: &[TeamWeekOffense],
) -> Result<()> {
    let tx = conn.transaction().context("begin rankings transaction")?;
    tx.execute(
        "DELETE FROM team_week_defense WHERE season = ?1",
        params![season],
    )
    .context("clear team week defense")?;
    tx.execute(
        "DELETE FROM team_week_offense WHERE season = ?1",
        params![season],
    )
    .context("clear team week offense")?;

    for d in defense {
        tx.execute(
            r#"
            INSERT INTO team_week_defense (
                team, season, week, passing_rank, rushing_rank, receiving_rank, overall_rank,
                avg_passing_yards_allowed, avg_rushing_yards_allowed, avg_receiving_yards_allowed,
                avg_passing_tds_allowed, avg_rushing_tds_allowed, avg_receiving_tds_allowed,
                epa_per_play_allowed
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
            "#,
            params![
                d.team,
                d.season,
                d.week,
                d.passing_rank,
                d.rushing_rank,
                d.receiving_rank,
                d.overall_rank,
                d.avg_passing_yards_allowed,
                d.avg_rushing_yards_allowed,
                d.avg_receiving_yards_allowed,
                d.avg_passing_tds_allowed,
                d.avg_rushing_tds_allowed,
                d.avg_receiving_tds_allowed,
                d.epa_per_play_allowed,
            ],
        )
        .context("insert team week defense")?;
    }

    for o in offense {
        tx.execute(
            r#"
            INSERT INTO team_week_offense (
                team, season, week, passing_rank, rushing_rank, receiving_rank, overall_rank,
                avg_passing_yards, avg_rushing_yards, avg_receiving_yards,
                avg_pass_attempts, avg_rush_attempts,
                passing_epa, rushing_epa, receiving_epa, epa_per_play
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)
            "#,
            params![
                o.team,
                o.season,
                o.week,
                o.passing_rank,
                o.rushing_rank,
                o.receiving_rank,
                o.overall_rank,
                o.avg_passing_yards,
                o.avg_rushing_yards,
                o.avg_receiving_yards,
                o.avg_pass_attempts,
                o.avg_rush_attempts,
                o.passing_epa,
                o.rushing_epa,
                o.receiving_epa,
                o.epa_per_play,
            ],
        )
        .context("insert team week offense")?;
    }

    tx.commit().context("commit rankings transaction")?;
    Ok(())
}

pub fn load_games(conn: &Connection, season: Season) -> Result<Vec<Game>> {
    let mut stmt = conn
        .prepare(
            r#"
            SELECT game_id, season, week, home_team, away_team, completed, home_score, away_score
            FROM games
            WHERE season = ?1
            ORDER BY week ASC, game_id ASC
            "#,
        )
        .context("prepare games query")?;
    let rows = stmt
        .query_map(params![season], |row| {
            Ok(Game {
                game_id: row.get(0)?,
                season: row.get(1)?,
                week: row.get(2)?,
                home_team: row.get(3)?,
                away_team: row.get(4)?,
                completed: row.get::<_, i64>(5)? != 0,
                home_score: row.get(6)?,
                away_score: row.get(7)?,
            })
        })
        .context("query games")?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row.context("decode game row")?);
    }
    Ok(out)
}

/// Every stat row recorded for the season, ordered by week then player.
pub fn load_season_stats(conn: &Connection, season: Season) -> Result<Vec<PlayerWeekStat>> {
    let sql = format!(
        "SELECT {STAT_COLUMNS} FROM player_week_stats
         WHERE season = ?1
         ORDER BY week ASC, player_id ASC, ingest_seq ASC"
    );
    let mut stmt = conn.prepare(&sql).context("prepare season stats query")?;
    let rows = stmt
        .query_map(params![season], stat_from_row)
        .context("query season stats")?;
    collect_stats(rows)
}

pub fn load_seasons(conn: &Connection) -> Result<Vec<Season>> {
    let mut stmt = conn
        .prepare("SELECT DISTINCT season FROM player_week_stats ORDER BY season ASC")
        .context("prepare seasons query")?;
    let rows = stmt
        .query_map([], |row| row.get::<_, Season>(0))
        .context("query seasons")?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row.context("decode season")?);
    }
    Ok(out)
}

pub(crate) fn bool_to_i64(v: bool) -> i64 {
    if v { 1 } else { 0 }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded() -> SqliteStore {
        let conn = open_in_memory().unwrap();
        upsert_player(
            &conn,
            &Player {
                player_id: "wr1".into(),
                name: "Test Receiver".into(),
                position: "WR".into(),
                team: Some("KC".into()),
            },
        )
        .unwrap();
        upsert_game(
            &conn,
            &Game {
                game_id: "2025_05_KC_BUF".into(),
                season: 2025,
                week: 5,
                home_team: "BUF".into(),
                away_team: "KC".into(),
                completed: false,
                home_score: None,
                away_score: None,
            },
        )
        .unwrap();
        SqliteStore::new(conn)
    }

    #[test]
    fn opponent_resolves_from_schedule() {
        let store = seeded();
        assert_eq!(
            store.opponent("wr1", 5, 2025).unwrap().as_deref(),
            Some("BUF")
        );
        assert_eq!(store.opponent("wr1", 6, 2025).unwrap(), None);
        assert_eq!(store.opponent("nobody", 5, 2025).unwrap(), None);
    }

    #[test]
    fn reingested_week_gets_newer_sequence() {
        let store = seeded();
        {
            let conn = store.conn().unwrap();
            let mut stat = PlayerWeekStat {
                player_id: "wr1".into(),
                season: 2025,
                week: 1,
                receiving_yards: 40.0,
                ..Default::default()
            };
            stat.next_gen.avg_separation = Some(3.1);
            insert_stat(&conn, &stat).unwrap();
            stat.receiving_yards = 55.0;
            insert_stat(&conn, &stat).unwrap();
        }
        let rows = store.player_week_stats("wr1", 2025).unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows[1].ingest_seq > rows[0].ingest_seq);
        assert_eq!(rows[1].receiving_yards, 55.0);
        assert_eq!(rows[0].next_gen.avg_separation, Some(3.1));
    }
}
