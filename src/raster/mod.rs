//! Raster mosaicking and elevation correction.
//!
//! Downloaded tiles arrive as one GeoTIFF per 1x1 km square. This module
//! merges the tiles of one acquisition into a single mosaic on a common
//! grid and applies the geoid-offset correction raster to elevation
//! mosaics. All raster I/O goes through GDAL; failures are fatal for the
//! affected mosaic and never retried.

mod correction;
mod extent;
mod mosaic;

pub use correction::ElevationCorrector;
pub use extent::{Extent, RasterDescriptor, RasterGroup};
pub use mosaic::MosaicBuilder;

use thiserror::Error;

/// Errors that can occur during mosaicking and correction.
#[derive(Debug, Error)]
pub enum RasterError {
    /// A GDAL operation failed.
    #[error(transparent)]
    Gdal(#[from] gdal::errors::GdalError),

    /// Reprojection of a dataset failed.
    #[error("Reprojection failed: {detail}")]
    Warp { detail: String },

    /// A mosaic was requested over zero input rasters.
    #[error("Cannot build a mosaic from an empty raster group")]
    EmptyGroup,
}
