//! Geographic coordinates on the globe.

use glam::Vec3;

/// Convert latitude/longitude in degrees to a point on a sphere.
///
/// Polar angle is measured from +Y (`90° - lat`), azimuth from +X toward +Z
/// (`lon`):
///
/// ```text
/// x = r sin(φ) cos(θ)
/// y = r cos(φ)
/// z = r sin(φ) sin(θ)
/// ```
pub fn lat_lon_to_vec3(lat_deg: f32, lon_deg: f32, radius: f32) -> Vec3 {
    let phi = (90.0 - lat_deg).to_radians();
    let theta = lon_deg.to_radians();
    Vec3::new(
        radius * phi.sin() * theta.cos(),
        radius * phi.cos(),
        radius * phi.sin() * theta.sin(),
    )
}

/// A named place to aim the sun at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub lat: f32,
    pub lon: f32,
}

impl GeoPoint {
    pub const fn new(lat: f32, lon: f32) -> Self {
        Self { lat, lon }
    }

    /// Beijing, the default sun bearing.
    pub const BEIJING: GeoPoint = GeoPoint::new(39.9, 116.4);

    pub fn to_vec3(self, radius: f32) -> Vec3 {
        lat_lon_to_vec3(self.lat, self.lon, radius)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_poles_and_equator() {
        let north = lat_lon_to_vec3(90.0, 0.0, 1.0);
        assert!((north - Vec3::Y).length() < 1e-6);

        let south = lat_lon_to_vec3(-90.0, 45.0, 2.0);
        assert!((south - Vec3::new(0.0, -2.0, 0.0)).length() < 1e-5);

        let prime = lat_lon_to_vec3(0.0, 0.0, 3.0);
        assert!((prime - Vec3::new(3.0, 0.0, 0.0)).length() < 1e-5);

        let east = lat_lon_to_vec3(0.0, 90.0, 1.0);
        assert!((east - Vec3::Z).length() < 1e-6);
    }

    #[test]
    fn test_radius_is_preserved() {
        for &(lat, lon) in &[(12.5, -70.0), (-33.9, 151.2), (64.1, -21.9)] {
            let v = lat_lon_to_vec3(lat, lon, 12.0);
            assert!((v.length() - 12.0).abs() < 1e-4);
        }
    }
}
