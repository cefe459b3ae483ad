//! Spatial inner-join with automatic reprojection.

use gdal::spatial_ref::{AxisMappingStrategy, CoordTransform, SpatialRef};
use geo::algorithm::map_coords::MapCoords;
use geo::Intersects;
use geo_types::{Coord, Geometry};
use tracing::debug;

use super::{Feature, OverlayError, VectorLayer};

/// Intersects two layers, returning the attribute-preserving inner join.
///
/// If the layers' coordinate reference systems differ, the *first* layer is
/// reprojected into the second's CRS; the second layer is authoritative and
/// is never touched. Each output feature carries the (possibly reprojected)
/// geometry of the first layer's feature and the union of both features'
/// attributes, with the second layer's values winning on key collisions.
///
/// Only feature pairs whose geometries intersect survive.
///
/// # Errors
///
/// Returns [`OverlayError::MissingCrs`] if either layer has no defined CRS,
/// or a GDAL error if the coordinate transform fails.
pub fn overlay(first: &VectorLayer, second: &VectorLayer) -> Result<Vec<Feature>, OverlayError> {
    let first_crs = first
        .crs
        .ok_or_else(|| OverlayError::MissingCrs(first.name.clone()))?;
    let second_crs = second
        .crs
        .ok_or_else(|| OverlayError::MissingCrs(second.name.clone()))?;

    let reprojected;
    let left: &[Feature] = if first_crs != second_crs {
        debug!(
            from = first_crs.epsg(),
            to = second_crs.epsg(),
            layer = %first.name,
            "Reprojecting layer for overlay"
        );
        reprojected = reproject_features(&first.features, first_crs.epsg(), second_crs.epsg())?;
        &reprojected
    } else {
        &first.features
    };

    let mut joined = Vec::new();
    for a in left {
        for b in &second.features {
            if a.geometry.intersects(&b.geometry) {
                let mut attributes = a.attributes.clone();
                attributes.extend(b.attributes.clone());
                joined.push(Feature::with_attributes(a.geometry.clone(), attributes));
            }
        }
    }

    debug!(
        left = %first.name,
        right = %second.name,
        rows = joined.len(),
        "Overlay complete"
    );
    Ok(joined)
}

/// Reprojects every feature geometry from one EPSG code to another.
fn reproject_features(
    features: &[Feature],
    from_epsg: u32,
    to_epsg: u32,
) -> Result<Vec<Feature>, OverlayError> {
    let mut src = SpatialRef::from_epsg(from_epsg)?;
    let mut dst = SpatialRef::from_epsg(to_epsg)?;
    // Keep x/y axis order regardless of authority definition.
    src.set_axis_mapping_strategy(AxisMappingStrategy::TraditionalGisOrder);
    dst.set_axis_mapping_strategy(AxisMappingStrategy::TraditionalGisOrder);
    let transform = CoordTransform::new(&src, &dst)?;

    features
        .iter()
        .map(|feature| {
            let geometry = transform_geometry(&feature.geometry, &transform)?;
            Ok(Feature::with_attributes(
                geometry,
                feature.attributes.clone(),
            ))
        })
        .collect()
}

/// Applies a GDAL coordinate transform to every coordinate of a geometry.
fn transform_geometry(
    geometry: &Geometry<f64>,
    transform: &CoordTransform,
) -> Result<Geometry<f64>, OverlayError> {
    geometry.try_map_coords(|coord: Coord<f64>| -> Result<Coord<f64>, OverlayError> {
        let mut xs = [coord.x];
        let mut ys = [coord.y];
        let mut zs = [0.0f64];
        transform.transform_coords(&mut xs, &mut ys, &mut zs)?;
        Ok(Coord { x: xs[0], y: ys[0] })
    })
}
