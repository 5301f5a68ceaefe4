use std::path::Path;

use anyhow::{Context, Result};
use rust_xlsxwriter::{Workbook, Worksheet};

use crate::edge::{DEFAULT_AMERICAN_ODDS, expected_value};
use crate::pipeline::RunReport;
use crate::records::Side;

pub struct ExportSummary {
    pub predictions: usize,
    pub skipped: usize,
}

/// Writes a prediction run to an xlsx workbook with a "Predictions" and a
/// "Skipped" sheet.
pub fn export_predictions_xlsx(path: &Path, report: &RunReport) -> Result<ExportSummary> {
    let mut prediction_rows = vec![
        [
            "Player",
            "Prop",
            "Season",
            "Week",
            "Line",
            "Projected",
            "Edge",
            "Bucket",
            "Side",
            "P(Over)",
            "P(Under)",
            "EV (-110)",
            "90% Low",
            "90% High",
            "Model",
            "Rationale",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect::<Vec<_>>(),
    ];
    for r in &report.results {
        let ev = match r.side {
            Some(Side::Over) => Some(expected_value(r.over_probability, DEFAULT_AMERICAN_ODDS)),
            Some(Side::Under) => Some(expected_value(r.under_probability, DEFAULT_AMERICAN_ODDS)),
            None => None,
        };
        prediction_rows.push(vec![
            r.player_id.clone(),
            r.prop_type.to_string(),
            r.season.to_string(),
            r.week.to_string(),
            format!("{:.1}", r.line),
            format!("{:.1}", r.projected_value),
            format!("{:+.1}", r.edge),
            r.bucket.label().to_string(),
            r.side.map(|s| s.to_string()).unwrap_or_default(),
            format!("{:.3}", r.over_probability),
            format!("{:.3}", r.under_probability),
            ev.map(|v| format!("{:+.3}", v)).unwrap_or_default(),
            format!("{:.1}", r.confidence_low),
            format!("{:.1}", r.confidence_high),
            r.model_version.clone(),
            r.rationale.clone(),
        ]);
    }

    let mut skipped_rows = vec![vec![
        "Player".to_string(),
        "Prop".to_string(),
        "Kind".to_string(),
        "Reason".to_string(),
    ]];
    for s in &report.skipped {
        skipped_rows.push(vec![
            s.player_id.clone(),
            s.prop_type.to_string(),
            s.kind.to_string(),
            s.reason.clone(),
        ]);
    }

    let mut workbook = Workbook::new();
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Predictions")?;
        write_rows(sheet, &prediction_rows)?;
    }
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Skipped")?;
        write_rows(sheet, &skipped_rows)?;
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).ok();
    }
    workbook
        .save(path)
        .with_context(|| format!("save workbook {}", path.display()))?;

    Ok(ExportSummary {
        predictions: report.results.len(),
        skipped: report.skipped.len(),
    })
}

fn write_rows(worksheet: &mut Worksheet, rows: &[Vec<String>]) -> Result<()> {
    for (row_idx, row) in rows.iter().enumerate() {
        for (col_idx, value) in row.iter().enumerate() {
            worksheet
                .write_string(row_idx as u32, col_idx as u16, value)
                .with_context(|| format!("write cell ({row_idx},{col_idx})"))?;
        }
    }
    Ok(())
}
