//! Mosaicking tile rasters onto a common grid.

use std::ffi::CString;
use std::path::Path;
use std::ptr;

use gdal::programs::raster::{build_vrt, BuildVRTOptions};
use gdal::raster::RasterCreationOptions;
use gdal::spatial_ref::SpatialRef;
use gdal::{Dataset, DriverManager};
use tracing::{debug, info};

use super::{RasterError, RasterGroup};

/// GeoTIFF creation options shared by all outputs.
pub(super) fn geotiff_options() -> RasterCreationOptions {
    RasterCreationOptions::from_iter(["COMPRESS=DEFLATE", "TILED=YES"])
}

/// Merges a raster group into one reprojected GeoTIFF.
///
/// The group's files are first assembled into a virtual mosaic clipped to
/// the group's combined extent, reprojected to the target CRS, and only
/// then materialized, so no intermediate full-size raster ever touches
/// disk.
#[derive(Debug, Clone)]
pub struct MosaicBuilder {
    target_epsg: u32,
}

impl MosaicBuilder {
    /// Creates a builder targeting ETRS89 / UTM zone 32N, the CRS all
    /// portal data is published in.
    pub fn new() -> Self {
        Self { target_epsg: 25832 }
    }

    /// Sets the target CRS of the mosaic.
    pub fn with_target_epsg(mut self, epsg: u32) -> Self {
        self.target_epsg = epsg;
        self
    }

    /// Returns the target CRS.
    pub fn target_epsg(&self) -> u32 {
        self.target_epsg
    }

    /// Builds the mosaic and writes it to `output`.
    ///
    /// # Errors
    ///
    /// Fails if any input cannot be opened, the virtual mosaic cannot be
    /// assembled, or the output cannot be written. Failures are final for
    /// this mosaic.
    pub fn build(&self, group: &RasterGroup, output: &Path) -> Result<(), RasterError> {
        let datasets = group
            .paths()
            .iter()
            .map(Dataset::open)
            .collect::<Result<Vec<_>, _>>()?;

        let bounds = group.extent().bounds();
        debug!(inputs = datasets.len(), ?bounds, "Assembling virtual mosaic");
        let options = BuildVRTOptions::new(vec![
            "-te".to_string(),
            bounds[0].to_string(),
            bounds[1].to_string(),
            bounds[2].to_string(),
            bounds[3].to_string(),
        ])?;
        let mosaic = build_vrt(None::<&Path>, &datasets, Some(options))?;

        let warped = warp_to_epsg(&mosaic, self.target_epsg)?;
        let driver = DriverManager::get_driver_by_name("GTiff")?;
        warped.create_copy(&driver, output, &geotiff_options())?;
        info!(
            output = %output.display(),
            inputs = datasets.len(),
            epsg = self.target_epsg,
            "Mosaic written"
        );
        Ok(())
    }
}

impl Default for MosaicBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Wraps a dataset in a warped VRT targeting the given CRS.
///
/// GDAL computes the output grid itself; when source and target CRS
/// already agree the warp is an identity passthrough.
fn warp_to_epsg(source: &Dataset, epsg: u32) -> Result<Dataset, RasterError> {
    let target = SpatialRef::from_epsg(epsg)?;
    let wkt = CString::new(target.to_wkt()?).map_err(|e| RasterError::Warp {
        detail: format!("target CRS WKT is not a valid C string: {}", e),
    })?;

    let handle = unsafe {
        gdal_sys::GDALAutoCreateWarpedVRT(
            source.c_dataset(),
            ptr::null(),
            wkt.as_ptr(),
            gdal_sys::GDALResampleAlg::GRA_NearestNeighbour,
            0.0,
            ptr::null(),
        )
    };
    if handle.is_null() {
        return Err(RasterError::Warp {
            detail: format!("warped VRT creation for EPSG:{} failed", epsg),
        });
    }
    Ok(unsafe { Dataset::from_c_dataset(handle) })
}
