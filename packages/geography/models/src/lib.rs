#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Jurisdiction boundary and geographic point types.
//!
//! Boundaries travel between services as well-known text (WKT) in
//! WGS84 (SRID 4326). Internally they are parsed into `geo` polygons and
//! containment is evaluated in the plane, boundary-inclusive: a point
//! lying exactly on a ring counts as inside, matching `PostGIS`
//! `ST_Covers`.

use std::collections::BTreeSet;
use std::str::FromStr as _;

use geo::{
    Area as _, Coord, Intersects as _, LineString, MultiPolygon, Point, Polygon, Validation as _,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Spatial reference id of every geometry handled by the system (WGS84).
pub const SRID_WGS84: u32 = 4326;

/// A WGS84 point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeoPoint {
    /// Longitude (x).
    pub longitude: f64,
    /// Latitude (y).
    pub latitude: f64,
}

impl GeoPoint {
    /// Creates a point from latitude and longitude.
    #[must_use]
    pub const fn from_lat_lon(latitude: f64, longitude: f64) -> Self {
        Self {
            longitude,
            latitude,
        }
    }

    /// Returns the point as a planar `geo` point (x = longitude).
    #[must_use]
    pub fn to_point(self) -> Point<f64> {
        Point::new(self.longitude, self.latitude)
    }
}

/// Errors raised when a boundary geometry is not well-formed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeometryError {
    /// The text could not be parsed as WKT.
    #[error("Failed to parse geometry: {message}")]
    Parse {
        /// Parser message.
        message: String,
    },

    /// The geometry parsed but is not a polygon or multipolygon.
    #[error("Expected POLYGON or MULTIPOLYGON, got {kind}")]
    NotPolygonal {
        /// The geometry type that was supplied.
        kind: String,
    },

    /// An `SRID=` prefix named a reference system other than WGS84.
    #[error("Unsupported SRID {srid}: boundaries must be in SRID 4326")]
    UnsupportedSrid {
        /// The supplied SRID text.
        srid: String,
    },

    /// The geometry has no polygons.
    #[error("Boundary is empty")]
    Empty,

    /// A ring's first and last coordinates differ.
    #[error("Ring {ring} is not closed")]
    UnclosedRing {
        /// Zero-based ring index across the whole geometry.
        ring: usize,
    },

    /// A ring has fewer than three distinct vertices.
    #[error("Ring {ring} has {distinct} distinct vertices, need at least 3")]
    TooFewVertices {
        /// Zero-based ring index across the whole geometry.
        ring: usize,
        /// Number of distinct vertices found.
        distinct: usize,
    },

    /// A ring's vertices are collinear, so it encloses no area.
    #[error("Ring {ring} encloses no area")]
    ZeroArea {
        /// Zero-based ring index across the whole geometry.
        ring: usize,
    },

    /// A coordinate is NaN or infinite.
    #[error("Boundary contains a non-finite coordinate")]
    NonFiniteCoordinate,

    /// Topology check failed (self-intersection, overlapping rings, ...).
    #[error("Invalid boundary topology: {message}")]
    Topology {
        /// Description of the first problem found.
        message: String,
    },
}

/// A jurisdiction boundary in WGS84.
///
/// Always holds at least one valid polygon. Single polygons are kept as a
/// one-element [`MultiPolygon`] so containment has one code path.
#[derive(Debug, Clone, PartialEq)]
pub struct Boundary {
    polygons: MultiPolygon<f64>,
}

impl Boundary {
    /// Parses and validates a WKT `POLYGON` or `MULTIPOLYGON`.
    ///
    /// An optional EWKT `SRID=4326;` prefix is accepted; any other SRID is
    /// rejected.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError`] if the text is not parseable WKT, is not
    /// polygonal, or fails validation (see [`Self::from_multi_polygon`]).
    pub fn from_wkt(text: &str) -> Result<Self, GeometryError> {
        let body = strip_srid(text.trim())?;
        let parsed = wkt::Wkt::<f64>::from_str(body).map_err(|e| GeometryError::Parse {
            message: e.to_string(),
        })?;

        let raw_polygons = match parsed {
            wkt::Wkt::Polygon(polygon) => vec![polygon],
            wkt::Wkt::MultiPolygon(multi) => multi.0,
            other => {
                return Err(GeometryError::NotPolygonal {
                    kind: wkt_kind(&other).to_string(),
                });
            }
        };

        let mut ring_index = 0;
        let mut polygons = Vec::with_capacity(raw_polygons.len());
        for raw in raw_polygons {
            let mut rings = Vec::with_capacity(raw.0.len());
            for ring in raw.0 {
                let coords: Vec<Coord<f64>> =
                    ring.0.iter().map(|c| Coord { x: c.x, y: c.y }).collect();
                if coords.first() != coords.last() {
                    return Err(GeometryError::UnclosedRing { ring: ring_index });
                }
                ring_index += 1;
                rings.push(LineString::new(coords));
            }
            let mut rings = rings.into_iter();
            let Some(exterior) = rings.next() else {
                return Err(GeometryError::Empty);
            };
            polygons.push(Polygon::new(exterior, rings.collect()));
        }

        Self::from_multi_polygon(MultiPolygon::new(polygons))
    }

    /// Validates a multipolygon.
    ///
    /// Every ring must have finite coordinates, at least three distinct
    /// vertices, and a non-zero area, and the whole geometry must be topologically valid
    /// (no self-intersecting rings, holes inside shells, no overlapping
    /// members).
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError`] describing the first problem found.
    pub fn from_multi_polygon(polygons: MultiPolygon<f64>) -> Result<Self, GeometryError> {
        if polygons.0.is_empty() {
            return Err(GeometryError::Empty);
        }

        let rings = polygons
            .0
            .iter()
            .flat_map(|p| std::iter::once(p.exterior()).chain(p.interiors()));
        for (ring, line) in rings.enumerate() {
            if line.coords().any(|c| !c.x.is_finite() || !c.y.is_finite()) {
                return Err(GeometryError::NonFiniteCoordinate);
            }
            let distinct = line
                .coords()
                .map(|c| (c.x.to_bits(), c.y.to_bits()))
                .collect::<BTreeSet<_>>()
                .len();
            if distinct < 3 {
                return Err(GeometryError::TooFewVertices { ring, distinct });
            }
            if Polygon::new(line.clone(), vec![]).unsigned_area() <= 0.0 {
                return Err(GeometryError::ZeroArea { ring });
            }
        }

        if let Err(e) = polygons.check_validation() {
            return Err(GeometryError::Topology {
                message: e.to_string(),
            });
        }

        Ok(Self { polygons })
    }

    /// Boundary-inclusive containment: `true` when `point` is in the
    /// interior or on any ring.
    #[must_use]
    pub fn covers(&self, point: GeoPoint) -> bool {
        self.polygons.intersects(&point.to_point())
    }

    /// Spatial reference id of this boundary.
    #[must_use]
    pub const fn srid(&self) -> u32 {
        SRID_WGS84
    }

    /// Serializes to WKT. A single polygon is written as `POLYGON`.
    #[must_use]
    pub fn to_wkt(&self) -> String {
        use wkt::ToWkt as _;

        match self.polygons.0.as_slice() {
            [single] => single.wkt_string(),
            _ => self.polygons.wkt_string(),
        }
    }

    /// Serializes to a `GeoJSON` geometry.
    #[must_use]
    pub fn to_geojson(&self) -> geojson::Geometry {
        match self.polygons.0.as_slice() {
            [single] => geojson::Geometry::new(geojson::Value::from(single)),
            _ => geojson::Geometry::new(geojson::Value::from(&self.polygons)),
        }
    }
}

/// Strips an optional `SRID=<n>;` prefix, rejecting anything but 4326.
fn strip_srid(text: &str) -> Result<&str, GeometryError> {
    let Some((prefix, body)) = text.split_once(';') else {
        return Ok(text);
    };
    let Some(srid) = prefix.trim().strip_prefix("SRID=") else {
        return Ok(text);
    };
    if srid.trim().parse::<u32>().ok() == Some(SRID_WGS84) {
        Ok(body.trim())
    } else {
        Err(GeometryError::UnsupportedSrid {
            srid: srid.trim().to_string(),
        })
    }
}

const fn wkt_kind(geometry: &wkt::Wkt<f64>) -> &'static str {
    match geometry {
        wkt::Wkt::Point(_) => "POINT",
        wkt::Wkt::LineString(_) => "LINESTRING",
        wkt::Wkt::Polygon(_) => "POLYGON",
        wkt::Wkt::MultiPoint(_) => "MULTIPOINT",
        wkt::Wkt::MultiLineString(_) => "MULTILINESTRING",
        wkt::Wkt::MultiPolygon(_) => "MULTIPOLYGON",
        wkt::Wkt::GeometryCollection(_) => "GEOMETRYCOLLECTION",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const UNIT_SQUARE: &str = "POLYGON((0 0, 1 0, 1 1, 0 1, 0 0))";

    #[test]
    fn unit_square_covers_interior_and_rejects_exterior() {
        let boundary = Boundary::from_wkt(UNIT_SQUARE).unwrap();
        assert!(boundary.covers(GeoPoint::from_lat_lon(0.5, 0.5)));
        assert!(!boundary.covers(GeoPoint::from_lat_lon(2.0, 2.0)));
        assert!(!boundary.covers(GeoPoint::from_lat_lon(-0.1, 0.5)));
    }

    #[test]
    fn points_on_the_ring_are_covered() {
        let boundary = Boundary::from_wkt(UNIT_SQUARE).unwrap();
        assert!(boundary.covers(GeoPoint::from_lat_lon(0.0, 0.0)));
        assert!(boundary.covers(GeoPoint::from_lat_lon(0.0, 0.5)));
        assert!(boundary.covers(GeoPoint::from_lat_lon(1.0, 1.0)));
        assert!(boundary.covers(GeoPoint::from_lat_lon(0.5, 1.0)));
    }

    #[test]
    fn holes_are_excluded() {
        let boundary = Boundary::from_wkt(
            "POLYGON((0 0, 10 0, 10 10, 0 10, 0 0), (4 4, 6 4, 6 6, 4 6, 4 4))",
        )
        .unwrap();
        assert!(boundary.covers(GeoPoint::from_lat_lon(2.0, 2.0)));
        assert!(!boundary.covers(GeoPoint::from_lat_lon(5.0, 5.0)));
    }

    #[test]
    fn multipolygon_covers_each_member() {
        let boundary = Boundary::from_wkt(
            "MULTIPOLYGON(((0 0, 1 0, 1 1, 0 1, 0 0)), ((5 5, 6 5, 6 6, 5 6, 5 5)))",
        )
        .unwrap();
        assert!(boundary.covers(GeoPoint::from_lat_lon(0.5, 0.5)));
        assert!(boundary.covers(GeoPoint::from_lat_lon(5.5, 5.5)));
        assert!(!boundary.covers(GeoPoint::from_lat_lon(3.0, 3.0)));
    }

    #[test]
    fn rejects_unclosed_ring() {
        assert_eq!(
            Boundary::from_wkt("POLYGON((0 0, 1 0, 1 1, 0 1))"),
            Err(GeometryError::UnclosedRing { ring: 0 })
        );
    }

    #[test]
    fn rejects_degenerate_ring() {
        let err = Boundary::from_wkt("POLYGON((0 0, 1 1, 0 0, 0 0))").unwrap_err();
        assert!(
            matches!(err, GeometryError::TooFewVertices { ring: 0, distinct: 2 }),
            "unexpected error: {err:?}"
        );
    }

    #[test]
    fn rejects_collinear_ring() {
        let err = Boundary::from_wkt("POLYGON((0 0, 1 0, 2 0, 0 0))").unwrap_err();
        assert_eq!(err, GeometryError::ZeroArea { ring: 0 });

        let err = Boundary::from_wkt(
            "MULTIPOLYGON(((0 0, 1 0, 1 1, 0 1, 0 0)), ((5 5, 6 6, 7 7, 5 5)))",
        )
        .unwrap_err();
        assert_eq!(err, GeometryError::ZeroArea { ring: 1 });
    }

    #[test]
    fn rejects_self_intersecting_ring() {
        // Bow-tie: edges (0 0)-(1 1) and (1 0)-(0 1) cross.
        let err = Boundary::from_wkt("POLYGON((0 0, 1 1, 1 0, 0 1, 0 0))").unwrap_err();
        assert!(
            matches!(err, GeometryError::Topology { .. }),
            "unexpected error: {err:?}"
        );
    }

    #[test]
    fn rejects_non_polygonal_and_garbage() {
        assert!(matches!(
            Boundary::from_wkt("POINT(1 2)"),
            Err(GeometryError::NotPolygonal { .. })
        ));
        assert!(matches!(
            Boundary::from_wkt("not a polygon"),
            Err(GeometryError::Parse { .. })
        ));
    }

    #[test]
    fn srid_prefix_must_be_wgs84() {
        let boundary = Boundary::from_wkt(&format!("SRID=4326;{UNIT_SQUARE}")).unwrap();
        assert_eq!(boundary.srid(), SRID_WGS84);
        assert_eq!(
            Boundary::from_wkt(&format!("SRID=3857;{UNIT_SQUARE}")),
            Err(GeometryError::UnsupportedSrid {
                srid: "3857".to_string()
            })
        );
    }

    #[test]
    fn wkt_output_reparses_to_the_same_ring() {
        let boundary = Boundary::from_wkt(UNIT_SQUARE).unwrap();
        let text = boundary.to_wkt();
        assert!(text.starts_with("POLYGON"), "got {text}");

        let reparsed = Boundary::from_wkt(&text).unwrap();
        assert_eq!(reparsed, boundary);
        assert_eq!(reparsed.srid(), boundary.srid());
        for (lat, lon) in [(0.5, 0.5), (0.0, 1.0), (2.0, 2.0), (-1.0, 0.5)] {
            let p = GeoPoint::from_lat_lon(lat, lon);
            assert_eq!(reparsed.covers(p), boundary.covers(p));
        }
    }

    #[test]
    fn geojson_output_keeps_single_polygons() {
        let boundary = Boundary::from_wkt(UNIT_SQUARE).unwrap();
        let json = serde_json::to_value(boundary.to_geojson()).unwrap();
        assert_eq!(json["type"], "Polygon");
    }
}
