use std::str::FromStr;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{Connection, params};
use tracing::info;

use crate::records::{EdgeBucket, PredictionResult, PropType, Season, Side, Week};

pub fn init_predictions_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS predictions (
            player_id TEXT NOT NULL,
            prop_type TEXT NOT NULL,
            season INTEGER NOT NULL,
            week INTEGER NOT NULL,
            line REAL NOT NULL,
            projected_value REAL NOT NULL,
            over_probability REAL NOT NULL,
            under_probability REAL NOT NULL,
            edge REAL NOT NULL,
            bucket TEXT NOT NULL,
            side TEXT NULL,
            confidence_low REAL NOT NULL,
            confidence_high REAL NOT NULL,
            model_version TEXT NOT NULL,
            generated_at TEXT NOT NULL,
            rationale TEXT NOT NULL DEFAULT '',
            PRIMARY KEY (player_id, prop_type, season, week)
        );
        CREATE INDEX IF NOT EXISTS idx_predictions_season_week ON predictions(season, week);
        "#,
    )
    .context("create predictions schema")?;
    Ok(())
}

/// Upserts every result in one transaction. A re-run supersedes the previous
/// row for the same key; keys not in `results` are left alone.
pub fn write_predictions(conn: &mut Connection, results: &[PredictionResult]) -> Result<usize> {
    let tx = conn.transaction().context("begin predictions transaction")?;
    for r in results {
        tx.execute(
            r#"
            INSERT INTO predictions (
                player_id, prop_type, season, week, line, projected_value,
                over_probability, under_probability, edge, bucket, side,
                confidence_low, confidence_high, model_version, generated_at, rationale
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)
            ON CONFLICT(player_id, prop_type, season, week) DO UPDATE SET
                line = excluded.line,
                projected_value = excluded.projected_value,
                over_probability = excluded.over_probability,
                under_probability = excluded.under_probability,
                edge = excluded.edge,
                bucket = excluded.bucket,
                side = excluded.side,
                confidence_low = excluded.confidence_low,
                confidence_high = excluded.confidence_high,
                model_version = excluded.model_version,
                generated_at = excluded.generated_at,
                rationale = excluded.rationale
            "#,
            params![
                r.player_id,
                r.prop_type.key(),
                r.season,
                r.week,
                r.line,
                r.projected_value,
                r.over_probability,
                r.under_probability,
                r.edge,
                r.bucket.to_string(),
                r.side.map(|s| s.to_string()),
                r.confidence_low,
                r.confidence_high,
                r.model_version,
                r.generated_at.to_rfc3339(),
                r.rationale,
            ],
        )
        .context("upsert prediction")?;
    }
    tx.commit().context("commit predictions transaction")?;
    info!(rows = results.len(), "predictions written");
    Ok(results.len())
}

pub fn load_predictions(
    conn: &Connection,
    season: Season,
    week: Week,
) -> Result<Vec<PredictionResult>> {
    let mut stmt = conn
        .prepare(
            r#"
            SELECT player_id, prop_type, season, week, line, projected_value,
                   over_probability, under_probability, edge, bucket, side,
                   confidence_low, confidence_high, model_version, generated_at, rationale
            FROM predictions
            WHERE season = ?1 AND week = ?2
            ORDER BY player_id ASC, prop_type ASC
            "#,
        )
        .context("prepare predictions query")?;
    let rows = stmt
        .query_map(params![season, week], |row| {
            Ok(RawPrediction {
                player_id: row.get(0)?,
                prop_type: row.get(1)?,
                season: row.get(2)?,
                week: row.get(3)?,
                line: row.get(4)?,
                projected_value: row.get(5)?,
                over_probability: row.get(6)?,
                under_probability: row.get(7)?,
                edge: row.get(8)?,
                bucket: row.get(9)?,
                side: row.get(10)?,
                confidence_low: row.get(11)?,
                confidence_high: row.get(12)?,
                model_version: row.get(13)?,
                generated_at: row.get(14)?,
                rationale: row.get(15)?,
            })
        })
        .context("query predictions")?;

    let mut out = Vec::new();
    for row in rows {
        out.push(row.context("decode prediction row")?.into_result()?);
    }
    Ok(out)
}

struct RawPrediction {
    player_id: String,
    prop_type: String,
    season: Season,
    week: Week,
    line: f64,
    projected_value: f64,
    over_probability: f64,
    under_probability: f64,
    edge: f64,
    bucket: String,
    side: Option<String>,
    confidence_low: f64,
    confidence_high: f64,
    model_version: String,
    generated_at: String,
    rationale: String,
}

impl RawPrediction {
    fn into_result(self) -> Result<PredictionResult> {
        let prop_type = PropType::from_str(&self.prop_type)
            .with_context(|| format!("unknown prop type {:?}", self.prop_type))?;
        let bucket = parse_bucket(&self.bucket)
            .with_context(|| format!("unknown edge bucket {:?}", self.bucket))?;
        let side = match self.side.as_deref() {
            None => None,
            Some("over") => Some(Side::Over),
            Some("under") => Some(Side::Under),
            Some(other) => anyhow::bail!("unknown side {other:?}"),
        };
        let generated_at = DateTime::parse_from_rfc3339(&self.generated_at)
            .with_context(|| format!("bad generated_at {:?}", self.generated_at))?
            .with_timezone(&Utc);
        Ok(PredictionResult {
            player_id: self.player_id,
            prop_type,
            season: self.season,
            week: self.week,
            line: self.line,
            projected_value: self.projected_value,
            over_probability: self.over_probability,
            under_probability: self.under_probability,
            edge: self.edge,
            bucket,
            side,
            confidence_low: self.confidence_low,
            confidence_high: self.confidence_high,
            model_version: self.model_version,
            generated_at,
            rationale: self.rationale,
        })
    }
}

fn parse_bucket(raw: &str) -> Option<EdgeBucket> {
    match raw {
        "strong_value" => Some(EdgeBucket::StrongValue),
        "good_value" => Some(EdgeBucket::GoodValue),
        "marginal" => Some(EdgeBucket::Marginal),
        _ => None,
    }
}
