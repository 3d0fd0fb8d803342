//! Region documents as fetched from `countries/*.geo.json`.
//!
//! Only the parts of GeoJSON the globe uses are modeled. Coordinates stay as
//! raw JSON until outline assembly so that one bad ring does not cost the
//! whole document at parse time.

use geo_types::Coord;
use serde::Deserialize;
use serde_json::Value;

/// GeoJSON geometry type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum GeometryKind {
    Point,
    MultiPoint,
    LineString,
    MultiLineString,
    Polygon,
    MultiPolygon,
    GeometryCollection,
    /// Any tag outside the GeoJSON set
    #[serde(other)]
    Other,
}

impl GeometryKind {
    /// Whether this geometry bounds an area and therefore has rings.
    pub fn is_areal(&self) -> bool {
        matches!(self, GeometryKind::Polygon | GeometryKind::MultiPolygon)
    }
}

/// A geometry whose coordinates have not been interpreted yet.
#[derive(Debug, Clone, Deserialize)]
pub struct Geometry {
    #[serde(rename = "type")]
    pub kind: GeometryKind,
    #[serde(default)]
    pub coordinates: Value,
}

/// Coordinates that do not nest the way the geometry type requires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeometryError {
    /// `coordinates` is not an array
    CoordinatesNotArray,
    /// A member of a MultiPolygon is not an array of rings
    PolygonNotArray(usize),
}

impl std::fmt::Display for GeometryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GeometryError::CoordinatesNotArray => write!(f, "coordinates are not an array"),
            GeometryError::PolygonNotArray(idx) => {
                write!(f, "polygon {} is not an array of rings", idx)
            }
        }
    }
}

impl std::error::Error for GeometryError {}

impl Geometry {
    /// Splits the coordinates into polygons, each a slice of raw rings.
    ///
    /// A `Polygon` yields exactly one entry; a `MultiPolygon` yields one per
    /// member polygon. Non-areal geometries yield nothing.
    pub fn polygons(&self) -> Result<Vec<&[Value]>, GeometryError> {
        match self.kind {
            GeometryKind::Polygon => {
                let rings = self
                    .coordinates
                    .as_array()
                    .ok_or(GeometryError::CoordinatesNotArray)?;
                Ok(vec![rings.as_slice()])
            }
            GeometryKind::MultiPolygon => {
                let polygons = self
                    .coordinates
                    .as_array()
                    .ok_or(GeometryError::CoordinatesNotArray)?;
                polygons
                    .iter()
                    .enumerate()
                    .map(|(idx, polygon)| {
                        polygon
                            .as_array()
                            .map(Vec::as_slice)
                            .ok_or(GeometryError::PolygonNotArray(idx))
                    })
                    .collect()
            }
            _ => Ok(Vec::new()),
        }
    }
}

/// A single GeoJSON feature.
#[derive(Debug, Clone, Deserialize)]
pub struct Feature {
    #[serde(default)]
    pub geometry: Option<Geometry>,
    #[serde(default)]
    pub properties: Option<Value>,
}

impl Feature {
    /// Display name from the feature properties, if any.
    pub fn label(&self) -> Option<&str> {
        let props = self.properties.as_ref()?;
        props
            .get("name")
            .or_else(|| props.get("NAME"))
            .and_then(|v| v.as_str())
    }
}

/// One region's document. `features` is `None` when the document has no
/// feature list at all (for example a bare geometry).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegionDocument {
    #[serde(default)]
    pub features: Option<Vec<Feature>>,
}

impl RegionDocument {
    /// Parses a document from JSON text.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Reads a ring of `[lon, lat, ...]` positions.
///
/// Returns `None` if the ring is not an array or any position lacks two
/// numeric entries. Extra entries (altitude) are ignored.
pub fn parse_ring(ring: &Value) -> Option<Vec<Coord<f64>>> {
    ring.as_array()?
        .iter()
        .map(|position| {
            let position = position.as_array()?;
            let lon = position.first()?.as_f64()?;
            let lat = position.get(1)?.as_f64()?;
            Some(Coord { x: lon, y: lat })
        })
        .collect()
}
