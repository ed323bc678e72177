//! WGS84 coordinates and PostGIS geometry decoding.
//!
//! Geometry columns are selected with `ST_AsGeoJSON(..)` and decoded here.
//! Only the exterior ring of each polygon is kept; holes are not drawn by
//! the map client.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::StoreError;

/// A longitude/latitude pair in SRID 4326.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Point {
    /// Longitude.
    #[schema(example = 127.0276)]
    pub lng: f64,
    /// Latitude.
    #[schema(example = 37.4979)]
    pub lat: f64,
}

impl Point {
    /// Create a point from longitude and latitude.
    pub fn new(lng: f64, lat: f64) -> Self {
        Self { lng, lat }
    }
}

/// One exterior ring per polygon of a (multi)polygon.
pub type PolygonRings = Vec<Vec<Point>>;

/// Map viewport given by its south-west and north-east corners.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    /// South-west corner.
    pub south_west: Point,
    /// North-east corner.
    pub north_east: Point,
}

impl Bounds {
    /// Whether the point lies strictly inside the envelope.
    ///
    /// Matches `ST_Contains(ST_MakeEnvelope(..), point)`, which excludes
    /// the boundary.
    pub fn contains(&self, point: &Point) -> bool {
        point.lng > self.south_west.lng
            && point.lng < self.north_east.lng
            && point.lat > self.south_west.lat
            && point.lat < self.north_east.lat
    }
}

type Position = Vec<f64>;

#[derive(Debug, Deserialize)]
#[serde(tag = "type", content = "coordinates")]
enum Geometry {
    Polygon(Vec<Vec<Position>>),
    MultiPolygon(Vec<Vec<Vec<Position>>>),
}

fn to_point(position: &Position) -> Result<Point, StoreError> {
    match position.as_slice() {
        [lng, lat, ..] => Ok(Point::new(*lng, *lat)),
        _ => Err(StoreError::Geometry(format!(
            "position needs two coordinates, got {}",
            position.len()
        ))),
    }
}

fn exterior_ring(rings: &[Vec<Position>]) -> Result<Vec<Point>, StoreError> {
    match rings.first() {
        Some(ring) => ring.iter().map(to_point).collect(),
        None => Ok(Vec::new()),
    }
}

/// Decode a GeoJSON Polygon or MultiPolygon into exterior rings.
pub fn parse_polygon_rings(geojson: &str) -> Result<PolygonRings, StoreError> {
    let geometry: Geometry =
        serde_json::from_str(geojson).map_err(|e| StoreError::Geometry(e.to_string()))?;

    match geometry {
        Geometry::Polygon(rings) => Ok(vec![exterior_ring(&rings)?]),
        Geometry::MultiPolygon(polygons) => polygons
            .iter()
            .map(|rings| exterior_ring(rings))
            .collect(),
    }
}

/// Decode an optional GeoJSON column, treating NULL as no geometry.
pub fn parse_optional_rings(geojson: Option<&str>) -> Result<PolygonRings, StoreError> {
    match geojson {
        Some(text) if !text.trim().is_empty() => parse_polygon_rings(text),
        _ => Ok(Vec::new()),
    }
}
