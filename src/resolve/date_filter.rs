//! Acquisition-date filtering and tile identifier normalization.
//!
//! Metadata rows carry a `YYYY-MM` acquisition attribute and one of two
//! tile-identifier attributes, depending on the epoch that produced the
//! layer: the oldest layers name tiles in a legacy field whose value has a
//! 2-character prefix to strip, newer layers carry the identifier verbatim
//! in a `NAME` field. Callers always receive the normalized form.

use tracing::warn;

use crate::overlay::Feature;
use crate::window::RequestWindow;

/// Attribute holding the `YYYY-MM` acquisition date.
pub const ACQUISITION_FIELD: &str = "ERFASSUNG";

/// Legacy tile-identifier attribute (2-character prefix to strip).
pub const LEGACY_TILE_FIELD: &str = "DGM_1X1";

/// Direct tile-identifier attribute used by newer metadata layers.
pub const NAMED_TILE_FIELD: &str = "NAME";

/// Normalized identifier of one elevation/surface/point-cloud tile.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TileId(String);

impl TileId {
    /// Normalizes a legacy identifier by stripping its 2-character prefix.
    ///
    /// Returns `None` when the raw value is too short to carry a prefix or
    /// when byte offset 2 falls inside a multi-byte character; both indicate
    /// a malformed attribute value.
    pub fn from_legacy(raw: &str) -> Option<Self> {
        let stripped = raw.get(2..)?;
        if stripped.is_empty() {
            return None;
        }
        Some(Self(stripped.to_string()))
    }

    /// Takes a direct-name identifier verbatim.
    pub fn from_name(raw: &str) -> Self {
        Self(raw.to_string())
    }

    /// The normalized identifier string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TileId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Which tile-identifier attribute a metadata layer uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileSchema {
    /// Prefixed identifier in [`LEGACY_TILE_FIELD`].
    Legacy,
    /// Verbatim identifier in [`NAMED_TILE_FIELD`].
    Named,
}

impl TileSchema {
    /// Selects the schema for a filter pass.
    ///
    /// `adjacent` is true while a boundary recheck reads the *adjacent*
    /// epoch's metadata for the given year. The legacy schema applies to
    /// pre-2014 layers: either a normal pass over a pre-2014 year, or the
    /// 2014 recheck, which substitutes the 2010-2013 layer.
    pub fn select(year: i32, adjacent: bool) -> Self {
        if (year < 2014 && !adjacent) || (year == 2014 && adjacent) {
            TileSchema::Legacy
        } else {
            TileSchema::Named
        }
    }
}

/// Outcome of one date-filter pass over the intersected metadata rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TileFilterResult {
    /// Tiles were acquired in the accepted months.
    Found(Vec<TileId>),
    /// No row matched any accepted month of the year.
    NoData,
    /// No row matched, but the window clipped the year's months; data may
    /// exist outside the requested months.
    NoDataThisMonth,
}

impl TileFilterResult {
    /// The found tiles, or an empty slice.
    pub fn tiles(&self) -> &[TileId] {
        match self {
            TileFilterResult::Found(tiles) => tiles,
            _ => &[],
        }
    }

    /// Whether the pass found no tiles.
    pub fn is_empty(&self) -> bool {
        !matches!(self, TileFilterResult::Found(_))
    }
}

/// Filters intersected metadata rows by acquisition month and extracts the
/// normalized tile identifiers.
///
/// The accepted months are the full calendar year, clipped to the window's
/// requested months when `year` is the first or last year of the window.
/// Rows whose identifier attribute is missing or malformed are skipped with
/// a warning; they indicate a metadata quality problem, not a caller error.
pub fn filter_by_date(
    rows: &[Feature],
    year: i32,
    window: &RequestWindow,
    adjacent: bool,
) -> TileFilterResult {
    let (first_month, last_month) = window.months_for(year);
    let accepted: Vec<String> = (first_month..=last_month)
        .map(|month| format!("{year}-{month:02}"))
        .collect();

    let matching: Vec<&Feature> = rows
        .iter()
        .filter(|row| {
            row.attribute(ACQUISITION_FIELD)
                .map(|date| accepted.iter().any(|a| a == date))
                .unwrap_or(false)
        })
        .collect();

    if matching.is_empty() {
        return if window.is_clipped(year) {
            TileFilterResult::NoDataThisMonth
        } else {
            TileFilterResult::NoData
        };
    }

    let schema = TileSchema::select(year, adjacent);
    let mut tiles = Vec::with_capacity(matching.len());
    for row in matching {
        let tile = match schema {
            TileSchema::Legacy => row
                .attribute(LEGACY_TILE_FIELD)
                .and_then(TileId::from_legacy),
            TileSchema::Named => row.attribute(NAMED_TILE_FIELD).map(TileId::from_name),
        };
        match tile {
            Some(tile) => tiles.push(tile),
            None => warn!(
                year,
                ?schema,
                "Metadata row matched by date but has no usable tile identifier"
            ),
        }
    }

    if tiles.is_empty() {
        // All matching rows were malformed; treat like an empty filter.
        return if window.is_clipped(year) {
            TileFilterResult::NoDataThisMonth
        } else {
            TileFilterResult::NoData
        };
    }
    TileFilterResult::Found(tiles)
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo_types::{polygon, Geometry};
    use std::collections::HashMap;

    fn geom() -> Geometry<f64> {
        Geometry::Polygon(polygon![
            (x: 0.0, y: 0.0),
            (x: 1.0, y: 0.0),
            (x: 1.0, y: 1.0),
            (x: 0.0, y: 0.0),
        ])
    }

    fn row(date: &str, legacy: Option<&str>, name: Option<&str>) -> Feature {
        let mut attrs = HashMap::new();
        attrs.insert(ACQUISITION_FIELD.to_string(), date.to_string());
        if let Some(legacy) = legacy {
            attrs.insert(LEGACY_TILE_FIELD.to_string(), legacy.to_string());
        }
        if let Some(name) = name {
            attrs.insert(NAMED_TILE_FIELD.to_string(), name.to_string());
        }
        Feature::with_attributes(geom(), attrs)
    }

    #[test]
    fn test_schema_selection() {
        assert_eq!(TileSchema::select(2013, false), TileSchema::Legacy);
        assert_eq!(TileSchema::select(2011, false), TileSchema::Legacy);
        // The 2013 recheck substitutes the 2014-2019 layer, which names
        // tiles directly.
        assert_eq!(TileSchema::select(2013, true), TileSchema::Named);
        // The 2014 recheck substitutes the 2010-2013 layer.
        assert_eq!(TileSchema::select(2014, true), TileSchema::Legacy);
        assert_eq!(TileSchema::select(2014, false), TileSchema::Named);
        assert_eq!(TileSchema::select(2019, false), TileSchema::Named);
        assert_eq!(TileSchema::select(2019, true), TileSchema::Named);
    }

    #[test]
    fn test_legacy_prefix_stripping() {
        let window = RequestWindow::years(2012, 2012).unwrap();
        let rows = vec![row("2012-06", Some("as650_5606"), None)];
        let result = filter_by_date(&rows, 2012, &window, false);
        assert_eq!(
            result,
            TileFilterResult::Found(vec![TileId::from_name("650_5606")])
        );
    }

    #[test]
    fn test_named_schema_taken_verbatim() {
        let window = RequestWindow::years(2016, 2016).unwrap();
        let rows = vec![row("2016-04", None, Some("651_5607"))];
        let result = filter_by_date(&rows, 2016, &window, false);
        assert_eq!(result.tiles()[0].as_str(), "651_5607");
    }

    #[test]
    fn test_rows_outside_year_excluded() {
        let window = RequestWindow::years(2016, 2016).unwrap();
        let rows = vec![
            row("2015-12", None, Some("old")),
            row("2016-01", None, Some("new")),
            row("2017-01", None, Some("future")),
        ];
        let result = filter_by_date(&rows, 2016, &window, false);
        assert_eq!(result.tiles().len(), 1);
        assert_eq!(result.tiles()[0].as_str(), "new");
    }

    #[test]
    fn test_month_clipping_on_edge_years() {
        let window = RequestWindow::new(2016, 5, 2017, 2).unwrap();
        let rows = vec![
            row("2016-03", None, Some("before_start")),
            row("2016-05", None, Some("at_start")),
            row("2017-02", None, Some("at_end")),
            row("2017-03", None, Some("after_end")),
        ];
        let first = filter_by_date(&rows, 2016, &window, false);
        assert_eq!(first.tiles().len(), 1);
        assert_eq!(first.tiles()[0].as_str(), "at_start");

        let last = filter_by_date(&rows, 2017, &window, false);
        assert_eq!(last.tiles().len(), 1);
        assert_eq!(last.tiles()[0].as_str(), "at_end");
    }

    #[test]
    fn test_empty_result_distinguishes_clipping() {
        let clipped = RequestWindow::new(2016, 5, 2016, 6).unwrap();
        let full = RequestWindow::years(2016, 2016).unwrap();
        let rows = vec![row("2016-02", None, Some("early"))];
        assert_eq!(
            filter_by_date(&rows, 2016, &clipped, false),
            TileFilterResult::NoDataThisMonth
        );
        assert_eq!(
            filter_by_date(&[], 2016, &full, false),
            TileFilterResult::NoData
        );
    }

    #[test]
    fn test_short_legacy_value_skipped() {
        let window = RequestWindow::years(2012, 2012).unwrap();
        let rows = vec![row("2012-06", Some("xy"), None)];
        assert_eq!(
            filter_by_date(&rows, 2012, &window, false),
            TileFilterResult::NoData
        );
    }

    #[test]
    fn test_non_ascii_legacy_value_skipped() {
        // A multi-byte first character puts byte offset 2 inside the
        // character; the row is dropped instead of slicing mid-character.
        assert_eq!(TileId::from_legacy("€650_5606"), None);

        let window = RequestWindow::years(2012, 2012).unwrap();
        let rows = vec![row("2012-06", Some("€650_5606"), None)];
        assert_eq!(
            filter_by_date(&rows, 2012, &window, false),
            TileFilterResult::NoData
        );
    }
}
