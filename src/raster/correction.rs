//! Applying the geoid-offset correction raster to elevation mosaics.

use std::path::{Path, PathBuf};
use std::ptr;

use gdal::raster::Buffer;
use gdal::{Dataset, DriverManager};
use tracing::{debug, info};

use super::mosaic::geotiff_options;
use super::RasterError;

/// Adds a correction raster to elevation mosaics.
///
/// Portal elevation data is published relative to the DHHN2016 height
/// datum; converting to ellipsoidal heights means adding the geoid-offset
/// raster. The correction raster rarely shares the mosaic's grid, so it
/// is first warped onto exactly that grid with bilinear resampling (the
/// offset field is smooth, nearest-neighbour would introduce steps) and
/// then combined band 1 against band 1, pixel by pixel, by addition.
#[derive(Debug, Clone)]
pub struct ElevationCorrector {
    correction: PathBuf,
}

impl ElevationCorrector {
    /// Creates a corrector over the given correction raster file.
    pub fn new(correction: impl Into<PathBuf>) -> Self {
        Self {
            correction: correction.into(),
        }
    }

    /// Applies the correction to `target` and writes the result.
    ///
    /// The output is a UInt16 GeoTIFF on the warped correction's grid and
    /// projection, which by construction equals the target mosaic's grid.
    /// Out-of-range sums saturate at the UInt16 bounds.
    ///
    /// # Errors
    ///
    /// Fails if either raster cannot be opened, the warp fails, or the
    /// output cannot be written. Failures are final for this mosaic.
    pub fn apply(&self, target: &Path, output: &Path) -> Result<(), RasterError> {
        let target_ds = Dataset::open(target)?;
        let correction_ds = Dataset::open(&self.correction)?;

        let (width, height) = target_ds.raster_size();
        let geo_transform = target_ds.geo_transform()?;
        let projection = target_ds.projection();

        debug!(
            target = %target.display(),
            width,
            height,
            "Warping correction raster onto mosaic grid"
        );
        let mem = DriverManager::get_driver_by_name("MEM")?;
        let mut warped = mem.create_with_band_type::<f64, _>("", width, height, 1)?;
        warped.set_geo_transform(&geo_transform)?;
        warped.set_projection(&projection)?;
        reproject_bilinear(&correction_ds, &warped)?;

        let elevation = target_ds
            .rasterband(1)?
            .read_as::<f64>((0, 0), (width, height), (width, height), None)?;
        let offsets = warped
            .rasterband(1)?
            .read_as::<f64>((0, 0), (width, height), (width, height), None)?;
        let corrected: Vec<u16> = elevation
            .data()
            .iter()
            .zip(offsets.data())
            .map(|(height, offset)| (height + offset) as u16)
            .collect();

        let driver = DriverManager::get_driver_by_name("GTiff")?;
        let mut out = driver.create_with_band_type_with_options::<u16, _>(
            output,
            width,
            height,
            1,
            &geotiff_options(),
        )?;
        out.set_geo_transform(&warped.geo_transform()?)?;
        out.set_projection(&warped.projection())?;
        let mut band = out.rasterband(1)?;
        let mut buffer = Buffer::new((width, height), corrected);
        band.write((0, 0), (width, height), &mut buffer)?;

        info!(output = %output.display(), "Corrected elevation mosaic written");
        Ok(())
    }
}

/// Warps `source` into `destination` with bilinear resampling.
fn reproject_bilinear(source: &Dataset, destination: &Dataset) -> Result<(), RasterError> {
    let err = unsafe {
        gdal_sys::GDALReprojectImage(
            source.c_dataset(),
            ptr::null(),
            destination.c_dataset(),
            ptr::null(),
            gdal_sys::GDALResampleAlg::GRA_Bilinear,
            0.0,
            0.0,
            None,
            ptr::null_mut(),
            ptr::null_mut(),
        )
    };
    if err != gdal_sys::CPLErr::CE_None {
        return Err(RasterError::Warp {
            detail: "bilinear reprojection of the correction raster failed".to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use gdal::spatial_ref::SpatialRef;
    use tempfile::tempdir;

    fn write_raster_grid(path: &Path, origin: (f64, f64), pixel: f64, size: usize, value: f64) {
        let driver = DriverManager::get_driver_by_name("GTiff").unwrap();
        let mut dataset = driver
            .create_with_band_type::<f64, _>(path, size, size, 1)
            .unwrap();
        dataset
            .set_geo_transform(&[origin.0, pixel, 0.0, origin.1, 0.0, -pixel])
            .unwrap();
        dataset
            .set_spatial_ref(&SpatialRef::from_epsg(25832).unwrap())
            .unwrap();
        let mut band = dataset.rasterband(1).unwrap();
        let mut buffer = Buffer::new((size, size), vec![value; size * size]);
        band.write((0, 0), (size, size), &mut buffer).unwrap();
    }

    fn write_raster_f64(path: &Path, value: f64) {
        write_raster_grid(path, (650_000.0, 5_607_000.0), 100.0, 10, value);
    }

    #[test]
    fn test_correction_is_added_per_pixel() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("mosaic.tif");
        let correction = dir.path().join("offset.tif");
        let output = dir.path().join("corrected.tif");
        write_raster_f64(&target, 100.0);
        write_raster_f64(&correction, 11.5);

        ElevationCorrector::new(&correction)
            .apply(&target, &output)
            .unwrap();

        let out = Dataset::open(&output).unwrap();
        assert_eq!(out.raster_size(), (10, 10));
        let data = out
            .rasterband(1)
            .unwrap()
            .read_as::<u16>((0, 0), (10, 10), (10, 10), None)
            .unwrap();
        // 100.0 + 11.5 truncates into the UInt16 band.
        assert!(data.data().iter().all(|&v| v == 111));
    }

    #[test]
    fn test_output_keeps_target_grid() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("mosaic.tif");
        let correction = dir.path().join("offset.tif");
        let output = dir.path().join("corrected.tif");
        write_raster_f64(&target, 1.0);
        write_raster_f64(&correction, 0.0);

        ElevationCorrector::new(&correction)
            .apply(&target, &output)
            .unwrap();

        let source = Dataset::open(&target).unwrap();
        let out = Dataset::open(&output).unwrap();
        assert_eq!(out.geo_transform().unwrap(), source.geo_transform().unwrap());
    }

    #[test]
    fn test_coarser_correction_is_resampled_onto_target_grid() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("mosaic.tif");
        let correction = dir.path().join("offset.tif");
        let output = dir.path().join("corrected.tif");
        write_raster_f64(&target, 100.0);
        // 250 m pixels over a larger extent, so every target pixel is
        // bilinearly interpolated from interior correction samples.
        write_raster_grid(&correction, (649_500.0, 5_607_500.0), 250.0, 8, 20.25);

        ElevationCorrector::new(&correction)
            .apply(&target, &output)
            .unwrap();

        let source = Dataset::open(&target).unwrap();
        let out = Dataset::open(&output).unwrap();
        assert_eq!(out.raster_size(), source.raster_size());
        assert_eq!(out.geo_transform().unwrap(), source.geo_transform().unwrap());

        let data = out
            .rasterband(1)
            .unwrap()
            .read_as::<u16>((0, 0), (10, 10), (10, 10), None)
            .unwrap();
        // The constant field interpolates to itself: 100.0 + 20.25 -> 120.
        assert!(data.data().iter().all(|&v| v == 120));
    }

    #[test]
    fn test_missing_correction_raster_is_an_error() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("mosaic.tif");
        write_raster_f64(&target, 1.0);

        let corrector = ElevationCorrector::new(dir.path().join("absent.tif"));
        assert!(corrector
            .apply(&target, &dir.path().join("out.tif"))
            .is_err());
    }
}
