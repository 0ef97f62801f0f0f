//! CSV reading and writing for event, query and annotation files.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

use fastKde::prelude::*;

#[derive(Debug, Deserialize)]
struct EventRow {
    x: f64,
    y: f64,
}

/// One query row; `id` is the zero-based row index when the column is absent.
#[derive(Debug, Clone, Deserialize)]
pub struct QueryRow {
    #[serde(default)]
    pub id: Option<String>,
    pub x: f64,
    pub y: f64,
}

pub fn read_events(path: &Path) -> Result<Vec<Point<f64>>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to open event file {}", path.display()))?;

    let mut events = Vec::new();
    for (line, row) in reader.deserialize::<EventRow>().enumerate() {
        let row = row.with_context(|| {
            format!("Invalid event row {} in {}", line + 1, path.display())
        })?;
        events.push(Point::new(row.x, row.y));
    }
    Ok(events)
}

pub fn read_queries(path: &Path) -> Result<Vec<QueryRow>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to open query file {}", path.display()))?;

    let mut queries = Vec::new();
    for (line, row) in reader.deserialize::<QueryRow>().enumerate() {
        let mut row = row.with_context(|| {
            format!("Invalid query row {} in {}", line + 1, path.display())
        })?;
        if row.id.is_none() {
            row.id = Some(line.to_string());
        }
        queries.push(row);
    }
    Ok(queries)
}

/// Write `id, x, y` followed by the four prefixed columns.
pub fn write_annotations(
    path: &Path,
    queries: &[QueryRow],
    columns: &RiskColumns<f64>,
) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create output file {}", path.display()))?;

    let [density, zscore, percentile, label] = columns.column_names();
    writer.write_record([
        "id",
        "x",
        "y",
        density.as_str(),
        zscore.as_str(),
        percentile.as_str(),
        label.as_str(),
    ])?;

    for (query, record) in queries.iter().zip(columns.records()) {
        writer.write_record([
            query.id.as_deref().unwrap_or_default(),
            query.x.to_string().as_str(),
            query.y.to_string().as_str(),
            record.density.to_string().as_str(),
            record.zscore.to_string().as_str(),
            record.percentile.to_string().as_str(),
            record.label,
        ])?;
    }
    writer
        .flush()
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}
