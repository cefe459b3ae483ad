//! Vector overlay of an area of interest with tile footprint metadata.
//!
//! The portal describes tile coverage as polygon footprint layers with
//! acquisition attributes. This module loads such layers (any OGR-readable
//! source, in practice shapefiles) into a small in-memory model and computes
//! the attribute-preserving spatial inner-join against an arbitrary
//! area-of-interest polygon, reprojecting the first layer into the second's
//! coordinate reference system when they differ.
//!
//! The second layer's CRS is authoritative and is never reprojected. A layer
//! without a defined CRS is a hard failure; everything else is resolved
//! automatically.

mod join;
mod layer;

pub use join::overlay;
pub use layer::{Crs, Feature, VectorLayer};

use thiserror::Error;

/// Errors that can occur while loading or overlaying vector layers.
#[derive(Debug, Error)]
pub enum OverlayError {
    /// One of the layers has no defined coordinate reference system.
    #[error("Layer '{0}' has no defined CRS; cannot overlay")]
    MissingCrs(String),

    /// The underlying GDAL/OGR operation failed.
    #[error("GDAL error: {0}")]
    Gdal(#[from] gdal::errors::GdalError),

    /// A geometry could not be converted to an in-memory representation.
    #[error("Unsupported geometry in layer '{layer}': {detail}")]
    BadGeometry { layer: String, detail: String },
}
