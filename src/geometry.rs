//! Local planar geometry for mission legs
//!
//! Converts lat/lon degree deltas into meters with fixed per-degree factors
//! (equirectangular approximation). Earth curvature beyond the per-degree
//! scaling is ignored.
use nalgebra::Vector3;

/// Meters per degree of latitude
pub const LAT_METERS_PER_DEG: f64 = 113_000.0;

/// A lat/lon/alt position as found in a waypoint record
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
    pub alt: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64, alt: f64) -> Self {
        Self { lat, lon, alt }
    }
}

/// Per-degree metric factors, fixed by the first waypoint of a plan.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GeoScale {
    pub lat_m_per_deg: f64,
    pub lon_m_per_deg: f64,
}

impl GeoScale {
    /// Scale anchored at `ref_lat_deg`: longitude degrees shrink with cos(lat).
    pub fn at_latitude(ref_lat_deg: f64) -> Self {
        Self {
            lat_m_per_deg: LAT_METERS_PER_DEG,
            lon_m_per_deg: (LAT_METERS_PER_DEG * ref_lat_deg.to_radians().cos()).abs(),
        }
    }

    /// Offset from `from` to `to` in local meters [East, North, Up]
    pub fn offset(&self, from: &GeoPoint, to: &GeoPoint) -> Vector3<f64> {
        Vector3::new(
            (to.lon - from.lon) * self.lon_m_per_deg,
            (to.lat - from.lat) * self.lat_m_per_deg,
            to.alt - from.alt,
        )
    }

    /// Compass bearing from `from` to `to` in degrees, [0, 360), 0 = north, 90 = east.
    pub fn bearing_deg(&self, from: &GeoPoint, to: &GeoPoint) -> f64 {
        let d = self.offset(from, to);
        let (east, north) = (d.x, d.y);
        (90.0 - north.atan2(east).to_degrees() + 360.0).rem_euclid(360.0)
    }

    /// Straight-line 3D length of one leg in meters
    pub fn leg_distance_m(&self, from: &GeoPoint, to: &GeoPoint) -> f64 {
        self.offset(from, to).norm()
    }

    /// Summed 3D length of the path `start -> path[0] -> path[1] -> ...`
    pub fn path_length_m(&self, start: &GeoPoint, path: &[GeoPoint]) -> f64 {
        let mut total = 0.0;
        let mut prev = start;
        for point in path {
            total += self.leg_distance_m(prev, point);
            prev = point;
        }
        total
    }
}

/// Round to centimeter precision
pub fn round_cm(meters: f64) -> f64 {
    (meters * 100.0).round() / 100.0
}
