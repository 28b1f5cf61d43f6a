//! Polygon source: reads areas of interest from a CSV file.
//!
//! Expected layout: one header row (ignored), then `id,longitude,latitude`
//! data rows. Rows sharing an id accumulate into one polygon's boundary in
//! row order; records come back in the order each distinct id is first
//! seen. The column order is fixed and enforced by range-checking, so a
//! lat/lon file fails loudly instead of producing mirrored polygons.

use crate::error::{Result, RunError};
use crate::models::PolygonRecord;
use csv::ReaderBuilder;
use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

/// Load all polygon records from a CSV file. Pure read, no side effects.
pub fn load(path: &Path) -> Result<Vec<PolygonRecord>> {
    if !path.exists() {
        return Err(RunError::PolygonFileNotFound {
            path: path.to_path_buf(),
        });
    }

    let file = File::open(path)?;
    // Headers handled by hand so a missing header row is reportable.
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(file);

    let mut records: Vec<PolygonRecord> = Vec::new();
    let mut index_by_id: HashMap<String, usize> = HashMap::new();
    let mut first_line_by_id: HashMap<String, usize> = HashMap::new();
    let mut saw_header = false;
    let mut data_rows = 0usize;

    for (row_idx, row) in reader.records().enumerate() {
        let line = row_idx + 1;
        let row = row.map_err(|e| RunError::PolygonFormat {
            line,
            reason: format!("unreadable row: {}", e),
        })?;

        // Blank rows (a trailing newline, typically) are skipped, not errors.
        if row.iter().all(|field| field.trim().is_empty()) {
            continue;
        }

        if !saw_header {
            saw_header = true;
            continue;
        }

        if row.len() < 3 {
            return Err(RunError::PolygonFormat {
                line,
                reason: format!("expected at least 3 columns (id,lon,lat), found {}", row.len()),
            });
        }

        let id = row[0].trim().to_string();
        let lon = parse_coordinate(&row[1], "longitude", line)?;
        let lat = parse_coordinate(&row[2], "latitude", line)?;

        if !(-180.0..=180.0).contains(&lon) {
            return Err(RunError::PolygonFormat {
                line,
                reason: format!("longitude {} is outside [-180, 180]; columns must be id,lon,lat", lon),
            });
        }
        if !(-90.0..=90.0).contains(&lat) {
            return Err(RunError::PolygonFormat {
                line,
                reason: format!("latitude {} is outside [-90, 90]; columns must be id,lon,lat", lat),
            });
        }

        data_rows += 1;
        match index_by_id.get(&id) {
            Some(&idx) => records[idx].boundary.push((lon, lat)),
            None => {
                index_by_id.insert(id.clone(), records.len());
                first_line_by_id.insert(id.clone(), line);
                records.push(PolygonRecord {
                    id,
                    boundary: vec![(lon, lat)],
                });
            }
        }
    }

    if !saw_header {
        return Err(RunError::PolygonFormat {
            line: 1,
            reason: "missing header row".to_string(),
        });
    }

    for record in &records {
        if record.boundary.len() < 3 {
            let line = first_line_by_id.get(&record.id).copied().unwrap_or(0);
            return Err(RunError::PolygonFormat {
                line,
                reason: format!(
                    "polygon {} has only {} point(s); a boundary needs at least 3",
                    record.id,
                    record.boundary.len()
                ),
            });
        }
    }

    tracing::info!(
        polygons = records.len(),
        rows = data_rows,
        first = records.first().map(|r| r.id.as_str()).unwrap_or("-"),
        last = records.last().map(|r| r.id.as_str()).unwrap_or("-"),
        "polygon list loaded"
    );

    Ok(records)
}

fn parse_coordinate(raw: &str, which: &str, line: usize) -> Result<f64> {
    raw.trim().parse::<f64>().map_err(|_| RunError::PolygonFormat {
        line,
        reason: format!("invalid {} value: '{}'", which, raw.trim()),
    })
}
