//! In-memory vector layer model and OGR loading.

use std::collections::HashMap;
use std::path::Path;

use gdal::vector::{FieldValue, LayerAccess};
use gdal::Dataset;
use geo_types::Geometry;
use tracing::{debug, warn};

use super::OverlayError;

/// Coordinate reference system of a layer.
///
/// Only EPSG-coded systems are supported; that covers every layer the portal
/// publishes (UTM zone 32N, EPSG:25832) and the common AOI inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Crs {
    /// EPSG authority code, e.g. `Epsg(25832)`.
    Epsg(u32),
}

impl Crs {
    /// The EPSG code.
    pub fn epsg(&self) -> u32 {
        match self {
            Crs::Epsg(code) => *code,
        }
    }
}

/// One vector feature: a geometry plus its string attributes.
#[derive(Debug, Clone)]
pub struct Feature {
    /// Feature geometry (polygon or multipolygon for footprints and AOIs).
    pub geometry: Geometry<f64>,
    /// Attribute values keyed by field name, stringified.
    pub attributes: HashMap<String, String>,
}

impl Feature {
    /// Creates a feature with no attributes.
    pub fn new(geometry: Geometry<f64>) -> Self {
        Self {
            geometry,
            attributes: HashMap::new(),
        }
    }

    /// Creates a feature with the given attributes.
    pub fn with_attributes(
        geometry: Geometry<f64>,
        attributes: HashMap<String, String>,
    ) -> Self {
        Self {
            geometry,
            attributes,
        }
    }

    /// Looks up an attribute value by field name.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }
}

/// A named collection of features sharing one CRS.
#[derive(Debug, Clone)]
pub struct VectorLayer {
    /// Label used in log output and error messages (usually the file stem).
    pub name: String,
    /// CRS of all feature geometries, if defined.
    pub crs: Option<Crs>,
    /// The features.
    pub features: Vec<Feature>,
}

impl VectorLayer {
    /// Creates a layer from in-memory features.
    pub fn new(name: impl Into<String>, crs: Option<Crs>, features: Vec<Feature>) -> Self {
        Self {
            name: name.into(),
            crs,
            features,
        }
    }

    /// Loads the first layer of an OGR-readable source (e.g. a shapefile).
    ///
    /// The CRS is taken from the layer's spatial reference, identified via
    /// its EPSG authority code. Features without a geometry are skipped with
    /// a warning; attribute values are stringified.
    ///
    /// # Errors
    ///
    /// Returns an error if the source cannot be opened, has no vector layer,
    /// or a geometry cannot be represented in memory.
    pub fn from_ogr(path: &Path) -> Result<Self, OverlayError> {
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        let dataset = Dataset::open(path)?;
        let mut layer = dataset.layer(0)?;

        let crs = layer.spatial_ref().and_then(|mut srs| {
            srs.auth_code()
                .ok()
                .or_else(|| {
                    srs.auto_identify_epsg().ok()?;
                    srs.auth_code().ok()
                })
                .map(|code| Crs::Epsg(code as u32))
        });

        let mut features = Vec::new();
        for feature in layer.features() {
            let Some(geometry) = feature.geometry() else {
                warn!(layer = %name, "Skipping feature without geometry");
                continue;
            };
            let geometry = geometry.to_geo().map_err(|e| OverlayError::BadGeometry {
                layer: name.clone(),
                detail: e.to_string(),
            })?;

            let mut attributes = HashMap::new();
            for (field, value) in feature.fields() {
                if let Some(value) = value.and_then(stringify_field) {
                    attributes.insert(field, value);
                }
            }
            features.push(Feature::with_attributes(geometry, attributes));
        }

        debug!(
            layer = %name,
            features = features.len(),
            crs = ?crs,
            "Loaded vector layer"
        );

        Ok(Self {
            name,
            crs,
            features,
        })
    }

    /// Number of features in the layer.
    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// Whether the layer contains no features.
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

/// Stringifies the scalar OGR field types used by the portal metadata.
///
/// List and date field types are not used by any known metadata layer and
/// are dropped.
fn stringify_field(value: FieldValue) -> Option<String> {
    match value {
        FieldValue::StringValue(s) => Some(s),
        FieldValue::IntegerValue(i) => Some(i.to_string()),
        FieldValue::Integer64Value(i) => Some(i.to_string()),
        FieldValue::RealValue(r) => Some(r.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo_types::{polygon, Geometry};

    fn square(x0: f64, y0: f64, size: f64) -> Geometry<f64> {
        Geometry::Polygon(polygon![
            (x: x0, y: y0),
            (x: x0 + size, y: y0),
            (x: x0 + size, y: y0 + size),
            (x: x0, y: y0 + size),
            (x: x0, y: y0),
        ])
    }

    #[test]
    fn test_attribute_lookup() {
        let mut attrs = HashMap::new();
        attrs.insert("NAME".to_string(), "650_5606".to_string());
        let feature = Feature::with_attributes(square(0.0, 0.0, 1.0), attrs);
        assert_eq!(feature.attribute("NAME"), Some("650_5606"));
        assert_eq!(feature.attribute("MISSING"), None);
    }

    #[test]
    fn test_layer_len() {
        let layer = VectorLayer::new(
            "aoi",
            Some(Crs::Epsg(25832)),
            vec![Feature::new(square(0.0, 0.0, 1.0))],
        );
        assert_eq!(layer.len(), 1);
        assert!(!layer.is_empty());
    }

    #[test]
    fn test_stringify_scalar_fields() {
        assert_eq!(
            stringify_field(FieldValue::StringValue("2014-05".into())),
            Some("2014-05".to_string())
        );
        assert_eq!(
            stringify_field(FieldValue::IntegerValue(7)),
            Some("7".to_string())
        );
    }
}
