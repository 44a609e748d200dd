//! Closed-form orbit model for bulk objects

use fleet_core::coordinates::au_to_scene;
use fleet_core::AsteroidOrbitalElement;
use glam::DVec3;
use std::f64::consts::PI;

/// Position of a bulk object as a pure function of orbital time.
///
/// The mean anomaly is used directly as the polar angle in the orbital plane
/// (no Kepler solve), and inclination tilts the plane about the X axis.
pub trait OrbitModel {
    /// Mean anomaly at orbital time `t`, in [0, 2π)
    fn mean_anomaly_at(&self, t: f64) -> f64;

    /// Conic radius at angle `m` (AU)
    fn radius(&self, m: f64) -> f64;

    /// Heliocentric position at orbital time `t` (AU)
    fn position_au(&self, t: f64) -> DVec3;

    /// Position at orbital time `t` in scene units
    fn scene_position(&self, t: f64) -> DVec3 {
        au_to_scene(self.position_au(t))
    }
}

impl OrbitModel for AsteroidOrbitalElement {
    fn mean_anomaly_at(&self, t: f64) -> f64 {
        // A degenerate period freezes the object at its epoch anomaly
        let advance = if self.period > 0.0 {
            t * (2.0 * PI / self.period)
        } else {
            0.0
        };
        normalize_angle(self.mean_anomaly + advance)
    }

    fn radius(&self, m: f64) -> f64 {
        let e = self.eccentricity;
        self.semi_major_axis * (1.0 - e * e) / (1.0 + e * m.cos())
    }

    fn position_au(&self, t: f64) -> DVec3 {
        let m = self.mean_anomaly_at(t);
        let r = self.radius(m);

        let in_plane_x = r * m.cos();
        let in_plane_y = r * m.sin();
        let (sin_i, cos_i) = self.inclination.sin_cos();

        DVec3::new(in_plane_x, in_plane_y * sin_i, in_plane_y * cos_i)
    }
}

/// Normalize angle to [0, 2π)
fn normalize_angle(angle: f64) -> f64 {
    angle.rem_euclid(2.0 * PI)
}
