//! GeoHarvest - tile resolution and mosaic assembly for the Thuringian
//! open geodata portal.
//!
//! This library answers two questions for a caller that wants historical
//! elevation rasters (DGM/DOM), point clouds or orthophotos for a region:
//!
//! 1. *Which tiles do I need?* An area-of-interest polygon and a year/month
//!    window are resolved against the portal's per-epoch metadata layers,
//!    including the rechecks required where acquisition campaigns straddle
//!    the declared epoch boundaries ([`resolve`]).
//! 2. *How do I turn the downloaded tiles into one raster?* Per-tile rasters
//!    are optionally height-corrected and assembled into a reprojected,
//!    compressed mosaic ([`raster`]).
//!
//! The orthophoto lookup table consumed by [`ortho`] is produced by the
//! concurrent ID crawler in [`crawler`].
//!
//! Downloading, unzipping and directory layout are left to the caller; this
//! crate only decides *what* to fetch and assembles *what was fetched*.

pub mod crawler;
pub mod epoch;
pub mod logging;
pub mod ortho;
pub mod overlay;
pub mod raster;
pub mod resolve;
pub mod window;

/// Version of the geoharvest library.
///
/// Defined in `Cargo.toml` and injected at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
