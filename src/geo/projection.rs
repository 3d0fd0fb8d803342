//! Geographic to scene coordinate transformation.
//!
//! Maps (longitude, latitude) in degrees onto a sphere centered at the origin.
//! Latitude is measured from the +Y axis, so latitude 0 lands on the pole at
//! (0, R, 0) and the mapping is independent of longitude there.

use geo_types::Coord;
use glam::{DVec3, Vec3};

/// Projection onto a sphere of fixed radius.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SphereProjection {
    /// Sphere radius in scene units
    pub radius: f64,
}

impl Default for SphereProjection {
    fn default() -> Self {
        Self { radius: 5.0 }
    }
}

impl SphereProjection {
    /// Creates a projection for a sphere of the given radius.
    pub fn new(radius: f64) -> Self {
        Self { radius }
    }

    /// Projects a (lon, lat) coordinate at full precision.
    pub fn project_f64(&self, coord: Coord<f64>) -> DVec3 {
        let lon_rad = coord.x.to_radians();
        let lat_rad = coord.y.to_radians();

        DVec3::new(
            self.radius * lat_rad.sin() * lon_rad.cos(),
            self.radius * lat_rad.cos(),
            self.radius * lat_rad.sin() * lon_rad.sin(),
        )
    }

    /// Projects a (lon, lat) coordinate to a GPU-ready point.
    pub fn project(&self, coord: Coord<f64>) -> Vec3 {
        self.project_f64(coord).as_vec3()
    }
}
