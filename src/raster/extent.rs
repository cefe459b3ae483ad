//! Spatial extents and raster grouping.

use std::path::PathBuf;

use gdal::Dataset;

use super::RasterError;

/// Axis-aligned bounding box in map units, `[min_x, min_y, max_x, max_y]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extent([f64; 4]);

impl Extent {
    /// Creates an extent from its corner coordinates.
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self([min_x, min_y, max_x, max_y])
    }

    /// Derives the extent of a dataset from its geotransform.
    ///
    /// Handles negative pixel heights (the usual north-up case) and
    /// rotated transforms by taking the componentwise extremes of the two
    /// opposing corners.
    ///
    /// # Errors
    ///
    /// Fails if the dataset carries no geotransform.
    pub fn of_dataset(dataset: &Dataset) -> Result<Self, RasterError> {
        let gt = dataset.geo_transform()?;
        let (width, height) = dataset.raster_size();
        let (width, height) = (width as f64, height as f64);
        let x0 = gt[0];
        let y0 = gt[3];
        let x1 = gt[0] + width * gt[1] + height * gt[2];
        let y1 = gt[3] + width * gt[4] + height * gt[5];
        Ok(Self([x0.min(x1), y0.min(y1), x0.max(x1), y0.max(y1)]))
    }

    /// Returns the componentwise union of two extents.
    pub fn union(&self, other: &Extent) -> Extent {
        Extent([
            self.0[0].min(other.0[0]),
            self.0[1].min(other.0[1]),
            self.0[2].max(other.0[2]),
            self.0[3].max(other.0[3]),
        ])
    }

    pub fn min_x(&self) -> f64 {
        self.0[0]
    }

    pub fn min_y(&self) -> f64 {
        self.0[1]
    }

    pub fn max_x(&self) -> f64 {
        self.0[2]
    }

    pub fn max_y(&self) -> f64 {
        self.0[3]
    }

    /// Returns the extent as `[min_x, min_y, max_x, max_y]`.
    pub fn bounds(&self) -> [f64; 4] {
        self.0
    }
}

/// One input raster with its precomputed extent.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterDescriptor {
    pub path: PathBuf,
    pub extent: Extent,
}

impl RasterDescriptor {
    /// Opens a raster file and reads its extent.
    pub fn from_path(path: impl Into<PathBuf>) -> Result<Self, RasterError> {
        let path = path.into();
        let dataset = Dataset::open(&path)?;
        let extent = Extent::of_dataset(&dataset)?;
        Ok(Self { path, extent })
    }
}

/// A set of rasters destined for one mosaic, with their combined extent.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterGroup {
    paths: Vec<PathBuf>,
    extent: Extent,
}

impl RasterGroup {
    /// Builds a group from descriptors, reducing their extents into the
    /// common bounding box.
    ///
    /// # Errors
    ///
    /// Returns [`RasterError::EmptyGroup`] for an empty descriptor list.
    pub fn from_descriptors(descriptors: &[RasterDescriptor]) -> Result<Self, RasterError> {
        let first = descriptors.first().ok_or(RasterError::EmptyGroup)?;
        let extent = descriptors
            .iter()
            .skip(1)
            .fold(first.extent, |acc, d| acc.union(&d.extent));
        Ok(Self {
            paths: descriptors.iter().map(|d| d.path.clone()).collect(),
            extent,
        })
    }

    /// Opens every file and builds the group from the extents on disk.
    pub fn scan(paths: &[PathBuf]) -> Result<Self, RasterError> {
        let descriptors = paths
            .iter()
            .map(RasterDescriptor::from_path)
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_descriptors(&descriptors)
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    pub fn extent(&self) -> &Extent {
        &self.extent
    }
}
