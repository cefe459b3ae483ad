//! Acquisition epochs of the Thuringian elevation data.
//!
//! The portal organizes terrain models, surface models and point clouds into
//! three acquisition campaigns ("epochs"), each with its own nominal
//! resolution and its own metadata shapefile. Resolving a calendar year to
//! its epoch is a pure table lookup; years outside the covered span are a
//! distinguished "no data" answer, not an error, so the caller can decide
//! whether to skip forward or stop.

use std::fmt;

/// One acquisition campaign period.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Epoch {
    /// Period label as used in download URLs, e.g. `"2014-2019"`.
    pub label: &'static str,
    /// Nominal grid resolution tag embedded in tile URLs (`"1"` or `"2"`).
    pub resolution_tag: &'static str,
    /// Metadata shapefile (tile footprints + acquisition dates) for the epoch.
    pub metadata_file: &'static str,
}

/// Result of resolving a calendar year against the epoch table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EpochLookup {
    /// The year falls into a covered acquisition campaign.
    Epoch(Epoch),
    /// The year predates all campaigns (before 2011).
    TooEarly,
    /// The year postdates all campaigns (after 2025).
    TooLate,
}

impl EpochLookup {
    /// The resolved epoch, if any.
    pub fn epoch(&self) -> Option<&Epoch> {
        match self {
            EpochLookup::Epoch(epoch) => Some(epoch),
            _ => None,
        }
    }
}

/// First year covered by any epoch.
pub const FIRST_COVERED_YEAR: i32 = 2011;

/// Last year covered by any epoch.
pub const LAST_COVERED_YEAR: i32 = 2025;

/// Resolves a calendar year to its acquisition epoch.
///
/// Total over all inputs: every year maps to an [`Epoch`], [`TooEarly`] or
/// [`TooLate`].
///
/// [`TooEarly`]: EpochLookup::TooEarly
/// [`TooLate`]: EpochLookup::TooLate
pub fn resolve_epoch(year: i32) -> EpochLookup {
    match year {
        2011..=2013 => EpochLookup::Epoch(Epoch {
            label: "2010-2013",
            resolution_tag: "2",
            metadata_file: "DGM2_2010-2013_Erfass-lt-Meta_UTM32-UTM_2014-12-10.shp",
        }),
        2014..=2019 => EpochLookup::Epoch(Epoch {
            label: "2014-2019",
            resolution_tag: "1",
            metadata_file: "DGM1_2014-2019_Erfass-lt-Meta_UTM_2020-04-20--17127.shp",
        }),
        2020..=2025 => EpochLookup::Epoch(Epoch {
            label: "2020-2025",
            resolution_tag: "1",
            metadata_file: "DGM1_2020-2025_Erfass-lt-Meta_UTM_2021-03--17127/\
                 DGM1_2020-2025_Erfass-lt-Meta_UTM_2021-03--17127.shp",
        }),
        y if y < FIRST_COVERED_YEAR => EpochLookup::TooEarly,
        _ => EpochLookup::TooLate,
    }
}

/// Elevation data categories served per tile by the portal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElevationKind {
    /// Digital terrain model (`dgm`).
    Terrain,
    /// Digital surface model (`dom`).
    Surface,
    /// Laser scan point cloud (`las`).
    PointCloud,
}

impl fmt::Display for ElevationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ElevationKind::Terrain => "dgm",
            ElevationKind::Surface => "dom",
            ElevationKind::PointCloud => "las",
        };
        f.write_str(s)
    }
}

/// Builds the download URL for one elevation tile.
///
/// The point-cloud URL pattern omits the resolution tag; terrain and surface
/// URLs embed it. `tile` is a normalized tile identifier as produced by the
/// resolution engine.
pub fn tile_download_url(kind: ElevationKind, epoch: &Epoch, tile: &str) -> String {
    match kind {
        ElevationKind::Terrain => format!(
            "https://geoportal.geoportal-th.de/hoehendaten/DGM/dgm_{}/dgm{}_{}_1_th_{}.zip",
            epoch.label, epoch.resolution_tag, tile, epoch.label
        ),
        ElevationKind::Surface => format!(
            "http://geoportal.geoportal-th.de/hoehendaten/DOM/dom_{}/dom{}_{}_1_th_{}.zip",
            epoch.label, epoch.resolution_tag, tile, epoch.label
        ),
        ElevationKind::PointCloud => format!(
            "http://geoportal.geoportal-th.de/hoehendaten/LAS/las_{}/las_{}_1_th_{}.zip",
            epoch.label, tile, epoch.label
        ),
    }
}

/// Builds the download URL for the epoch's metadata overview archive.
pub fn metadata_download_url(epoch: &Epoch) -> String {
    format!(
        "https://geoportal.geoportal-th.de/hoehendaten/Uebersichten/Stand_{}.zip",
        epoch.label
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_covered_year_resolves() {
        for year in FIRST_COVERED_YEAR..=LAST_COVERED_YEAR {
            assert!(
                resolve_epoch(year).epoch().is_some(),
                "year {} should resolve to an epoch",
                year
            );
        }
    }

    #[test]
    fn test_epoch_table() {
        let first = resolve_epoch(2011).epoch().unwrap().clone();
        assert_eq!(first.label, "2010-2013");
        assert_eq!(first.resolution_tag, "2");
        assert_eq!(resolve_epoch(2013).epoch().unwrap(), &first);

        let second = resolve_epoch(2014).epoch().unwrap().clone();
        assert_eq!(second.label, "2014-2019");
        assert_eq!(second.resolution_tag, "1");
        assert_eq!(resolve_epoch(2019).epoch().unwrap(), &second);

        let third = resolve_epoch(2020).epoch().unwrap().clone();
        assert_eq!(third.label, "2020-2025");
        assert_eq!(third.resolution_tag, "1");
        assert_eq!(resolve_epoch(2025).epoch().unwrap(), &third);
    }

    #[test]
    fn test_out_of_range_years() {
        assert_eq!(resolve_epoch(2010), EpochLookup::TooEarly);
        assert_eq!(resolve_epoch(1999), EpochLookup::TooEarly);
        assert_eq!(resolve_epoch(2026), EpochLookup::TooLate);
        assert_eq!(resolve_epoch(2100), EpochLookup::TooLate);
    }

    #[test]
    fn test_terrain_url() {
        let epoch = resolve_epoch(2015).epoch().unwrap().clone();
        let url = tile_download_url(ElevationKind::Terrain, &epoch, "650_5606");
        assert_eq!(
            url,
            "https://geoportal.geoportal-th.de/hoehendaten/DGM/dgm_2014-2019/dgm1_650_5606_1_th_2014-2019.zip"
        );
    }

    #[test]
    fn test_point_cloud_url_has_no_resolution_tag() {
        let epoch = resolve_epoch(2012).epoch().unwrap().clone();
        let url = tile_download_url(ElevationKind::PointCloud, &epoch, "650_5606");
        assert_eq!(
            url,
            "http://geoportal.geoportal-th.de/hoehendaten/LAS/las_2010-2013/las_650_5606_1_th_2010-2013.zip"
        );
    }

    #[test]
    fn test_metadata_url() {
        let epoch = resolve_epoch(2020).epoch().unwrap().clone();
        assert_eq!(
            metadata_download_url(&epoch),
            "https://geoportal.geoportal-th.de/hoehendaten/Uebersichten/Stand_2020-2025.zip"
        );
    }
}
