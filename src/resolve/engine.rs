//! Engine loop driving epoch resolution, overlay and date filtering.

use std::path::PathBuf;

use tracing::{debug, info_span};

use crate::epoch::Epoch;
use crate::overlay::{overlay, VectorLayer};
use crate::window::RequestWindow;

use super::date_filter::filter_by_date;
use super::reconciler::{Reconciler, Step, YearReport};
use super::ResolveError;

/// Provides the metadata footprint layer for an epoch.
///
/// Abstracted so the resolution engine can be exercised against in-memory
/// layers in tests; production code loads the portal's metadata shapefiles
/// from a local directory via [`ShapefileSource`].
pub trait MetadataSource {
    /// Loads the epoch's metadata layer.
    fn load(&self, epoch: &Epoch) -> Result<VectorLayer, ResolveError>;
}

/// Loads epoch metadata shapefiles from a directory on disk.
///
/// The expected file names are those published by the portal and recorded
/// in the epoch table; the caller is responsible for having downloaded and
/// unpacked the overview archives beforehand.
#[derive(Debug, Clone)]
pub struct ShapefileSource {
    root: PathBuf,
}

impl ShapefileSource {
    /// Creates a source rooted at the given metadata directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl MetadataSource for ShapefileSource {
    fn load(&self, epoch: &Epoch) -> Result<VectorLayer, ResolveError> {
        let path = self.root.join(epoch.metadata_file);
        VectorLayer::from_ogr(&path).map_err(|e| ResolveError::Metadata {
            epoch: epoch.label.to_string(),
            detail: e.to_string(),
        })
    }
}

/// Resolves a request window to per-year tile identifier lists.
///
/// Drives the [`Reconciler`] state machine: for every planned check the
/// epoch's metadata layer is loaded, intersected with the area of interest
/// and filtered by acquisition date; boundary years are automatically
/// rechecked against the adjacent epoch. One [`YearReport`] is produced per
/// requested year (uncovered spans collapse into a single report).
///
/// # Errors
///
/// Fails if a metadata layer cannot be loaded or the overlay fails (for
/// example because the AOI has no defined CRS). "No data" conditions are
/// not errors; they are reported through [`YearReport::coverage`].
pub fn resolve_window<S: MetadataSource>(
    aoi: &VectorLayer,
    source: &S,
    window: RequestWindow,
) -> Result<Vec<YearReport>, ResolveError> {
    let span = info_span!("resolve_window", start = window.start_year(), end = window.end_year());
    let _guard = span.enter();

    let mut machine = Reconciler::new(window);
    let mut reports = Vec::new();

    loop {
        match machine.next() {
            Step::Done => break,
            Step::Report(report) => reports.push(report),
            Step::Check(plan) => {
                debug!(
                    year = plan.year,
                    epoch = plan.epoch.label,
                    adjacent = plan.adjacent,
                    "Running epoch check"
                );
                let layer = source.load(&plan.epoch)?;
                let rows = overlay(aoi, &layer)?;
                let result = filter_by_date(&rows, plan.year, &window, plan.adjacent);
                if let Some(report) = machine.record(result, rows.len()) {
                    reports.push(report);
                }
            }
        }
    }

    Ok(reports)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overlay::{Crs, Feature};
    use crate::resolve::date_filter::{ACQUISITION_FIELD, LEGACY_TILE_FIELD, NAMED_TILE_FIELD};
    use crate::resolve::Coverage;
    use geo_types::{polygon, Geometry};
    use std::collections::HashMap;

    fn square(x0: f64, y0: f64, size: f64) -> Geometry<f64> {
        Geometry::Polygon(polygon![
            (x: x0, y: y0),
            (x: x0 + size, y: y0),
            (x: x0 + size, y: y0 + size),
            (x: x0, y: y0 + size),
            (x: x0, y: y0),
        ])
    }

    fn footprint(x0: f64, y0: f64, date: &str, legacy: &str, name: &str) -> Feature {
        let mut attrs = HashMap::new();
        attrs.insert(ACQUISITION_FIELD.to_string(), date.to_string());
        attrs.insert(LEGACY_TILE_FIELD.to_string(), legacy.to_string());
        attrs.insert(NAMED_TILE_FIELD.to_string(), name.to_string());
        Feature::with_attributes(square(x0, y0, 1000.0), attrs)
    }

    /// In-memory source with one layer per epoch label.
    struct FixtureSource {
        layers: HashMap<&'static str, VectorLayer>,
    }

    impl MetadataSource for FixtureSource {
        fn load(&self, epoch: &Epoch) -> Result<VectorLayer, ResolveError> {
            self.layers
                .get(epoch.label)
                .cloned()
                .ok_or_else(|| ResolveError::Metadata {
                    epoch: epoch.label.to_string(),
                    detail: "missing fixture".to_string(),
                })
        }
    }

    fn aoi() -> VectorLayer {
        VectorLayer::new(
            "aoi",
            Some(Crs::Epsg(25832)),
            vec![Feature::new(square(0.0, 0.0, 2000.0))],
        )
    }

    #[test]
    fn test_straddling_boundary_pulls_tiles_from_both_epochs() {
        // A 2013 acquisition recorded in the old layer, plus a late-2013
        // acquisition that only appears in the 2014-2019 layer.
        let old = VectorLayer::new(
            "meta-old",
            Some(Crs::Epsg(25832)),
            vec![footprint(0.0, 0.0, "2013-05", "as650_5606", "ignored")],
        );
        let new = VectorLayer::new(
            "meta-new",
            Some(Crs::Epsg(25832)),
            vec![footprint(1000.0, 0.0, "2013-12", "xx", "651_5606")],
        );
        let mut layers = HashMap::new();
        layers.insert("2010-2013", old);
        layers.insert("2014-2019", new);
        let source = FixtureSource { layers };

        let window = RequestWindow::years(2013, 2013).unwrap();
        let reports = resolve_window(&aoi(), &source, window).unwrap();

        assert_eq!(reports.len(), 1);
        let ids: Vec<_> = reports[0].tiles.iter().map(|t| t.as_str()).collect();
        assert_eq!(ids, vec!["650_5606", "651_5606"]);
    }

    #[test]
    fn test_year_without_data_is_reported_absent() {
        let empty = VectorLayer::new("meta", Some(Crs::Epsg(25832)), Vec::new());
        let mut layers = HashMap::new();
        layers.insert("2014-2019", empty);
        let source = FixtureSource { layers };

        let window = RequestWindow::years(2016, 2016).unwrap();
        let reports = resolve_window(&aoi(), &source, window).unwrap();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].coverage, Coverage::Absent);
        assert!(reports[0].tiles.is_empty());
    }

    #[test]
    fn test_missing_metadata_layer_is_an_error() {
        let source = FixtureSource {
            layers: HashMap::new(),
        };
        let window = RequestWindow::years(2016, 2016).unwrap();
        assert!(resolve_window(&aoi(), &source, window).is_err());
    }
}
