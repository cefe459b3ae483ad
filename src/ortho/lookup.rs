//! Orthophoto lookup-table operations.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::overlay::Feature;
use crate::resolve::{TileId, LEGACY_TILE_FIELD};

use super::aligner::block_numbers;
use super::{OrthoError, SMALL_TILE_FIRST_YEAR};

/// One row of the orthophoto lookup table.
///
/// `tile_number` granularity depends on `year`: 1x1 km from 2019 onward,
/// 2x2 km blocks before.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrthoUrlRecord {
    /// Numeric ID parameter of the download endpoint.
    pub url_id: u64,
    /// Acquisition year.
    pub year: i32,
    /// Tile or block number, e.g. `"562_5616"`.
    pub tile_number: String,
}

/// Loads a lookup table from CSV.
pub fn load_lookup(path: &Path) -> Result<Vec<OrthoUrlRecord>, OrthoError> {
    let mut reader = csv::Reader::from_path(path)?;
    let records = reader
        .deserialize()
        .collect::<Result<Vec<OrthoUrlRecord>, _>>()?;
    debug!(path = %path.display(), rows = records.len(), "Loaded orthophoto lookup table");
    Ok(records)
}

/// Writes a lookup table as CSV.
pub fn save_lookup(path: &Path, records: &[OrthoUrlRecord]) -> Result<(), OrthoError> {
    let mut writer = csv::Writer::from_path(path)?;
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    debug!(path = %path.display(), rows = records.len(), "Wrote orthophoto lookup table");
    Ok(())
}

/// Extracts the AOI's 1x1 km tile numbers from overlay rows.
///
/// The tile-number grid is published as the legacy elevation footprint
/// layer, so numbers carry the same 2-character prefix as legacy tile
/// identifiers. Rows without the attribute are skipped.
pub fn tile_numbers_from_overlay(rows: &[Feature]) -> Vec<String> {
    rows.iter()
        .filter_map(|row| {
            row.attribute(LEGACY_TILE_FIELD)
                .and_then(TileId::from_legacy)
                .map(|id| id.as_str().to_string())
        })
        .collect()
}

/// Partitions records at the 2019 tile-size change.
///
/// Returns `(from_2019, before_2019)`: records for 1x1 km tiles first,
/// 2x2 km block records second.
pub fn split_by_resolution(
    records: Vec<OrthoUrlRecord>,
) -> (Vec<OrthoUrlRecord>, Vec<OrthoUrlRecord>) {
    records
        .into_iter()
        .partition(|r| r.year >= SMALL_TILE_FIRST_YEAR)
}

/// Records selected for download plus availability notes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelevantSelection {
    /// Lookup rows matching the AOI and year range, in table order.
    pub records: Vec<OrthoUrlRecord>,
    /// Years with orthophotos for only part of the AOI.
    pub partial_years: Vec<i32>,
}

/// Selects the lookup rows relevant for an AOI and year range.
///
/// `aoi_tiles` are the AOI's 1x1 km tile numbers. When the selection
/// targets pre-2019 imagery (the requested range ends before 2019, or the
/// table holds pre-2019 rows and the range starts before 2019), the tile
/// numbers are first snapped to their 2x2 km blocks. Rows survive when
/// their tile number matches and their year falls inside the range.
///
/// Partial-coverage detection is best-effort availability hinting: for
/// pre-2019 selections, a year before 2018 with some but fewer matches
/// than AOI tiles is flagged.
pub fn relevant_records(
    records: &[OrthoUrlRecord],
    aoi_tiles: &[String],
    start_year: i32,
    end_year: i32,
) -> Result<RelevantSelection, OrthoError> {
    let pre_2019 = end_year < SMALL_TILE_FIRST_YEAR
        || (records
            .first()
            .map(|r| r.year < SMALL_TILE_FIRST_YEAR)
            .unwrap_or(false)
            && start_year < SMALL_TILE_FIRST_YEAR);

    let wanted: Vec<String> = if pre_2019 {
        block_numbers(aoi_tiles)?
    } else {
        aoi_tiles.to_vec()
    };

    let selected: Vec<OrthoUrlRecord> = records
        .iter()
        .filter(|r| {
            (start_year..=end_year).contains(&r.year) && wanted.contains(&r.tile_number)
        })
        .cloned()
        .collect();

    let mut partial_years = Vec::new();
    if pre_2019 {
        for year in start_year..=end_year {
            if year >= 2018 {
                continue;
            }
            let count = selected.iter().filter(|r| r.year == year).count();
            if count != 0 && count < wanted.len() {
                partial_years.push(year);
            }
        }
    }

    for year in &partial_years {
        info!(year, "Orthophotos cover only part of the area");
    }

    Ok(RelevantSelection {
        records: selected,
        partial_years,
    })
}
