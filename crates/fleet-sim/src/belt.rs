//! Synthetic main-belt population

use fleet_core::{AsteroidOrbitalElement, TrackedObject};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Sampling ranges for a generated belt
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BeltConfig {
    pub inner_au: f64,
    pub outer_au: f64,
    pub max_eccentricity: f64,
    /// Inclination is drawn from ±this many degrees
    pub max_inclination_deg: f64,
    pub min_size: f64,
    pub max_size: f64,
}

impl Default for BeltConfig {
    fn default() -> Self {
        Self {
            inner_au: 2.2,
            outer_au: 3.2,
            max_eccentricity: 0.25,
            max_inclination_deg: 5.0,
            min_size: 0.1,
            max_size: 0.4,
        }
    }
}

/// Generate `count` asteroids as snapshot entries (`asteroid_{i}`).
///
/// Periods follow Kepler's third law in years (`sqrt(a^3)` with `a` in AU).
/// The same seed always yields the same belt.
pub fn generate_belt(count: usize, seed: u64, config: &BeltConfig) -> Vec<TrackedObject> {
    let mut rng = StdRng::seed_from_u64(seed);
    let max_inc = config.max_inclination_deg.to_radians();

    (0..count)
        .map(|i| {
            let a = rng.gen_range(config.inner_au..=config.outer_au);
            let elements = AsteroidOrbitalElement {
                semi_major_axis: a,
                eccentricity: rng.gen_range(0.0..=config.max_eccentricity),
                inclination: rng.gen_range(-max_inc..=max_inc),
                mean_anomaly: rng.gen_range(0.0..2.0 * PI),
                period: a.powi(3).sqrt(),
                size: rng.gen_range(config.min_size..=config.max_size),
            };
            TrackedObject::asteroid(format!("asteroid_{i}"), elements)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use fleet_core::{ObjectKind, Snapshot};

    #[test]
    fn test_belt_ranges() {
        let config = BeltConfig::default();
        let belt = generate_belt(500, 42, &config);

        assert_eq!(belt.len(), 500);
        for object in &belt {
            assert_eq!(object.kind, ObjectKind::Asteroid);
            let el = object.orbital_elements.expect("belt entries carry elements");
            assert!(el.semi_major_axis >= 2.2 && el.semi_major_axis <= 3.2);
            assert!(el.eccentricity >= 0.0 && el.eccentricity <= 0.25);
            assert!(el.inclination.abs() <= 5.0_f64.to_radians() + 1e-12);
            assert!((el.period - el.semi_major_axis.powf(1.5)).abs() < 1e-9);
            assert!((object.size - el.size).abs() < 1e-12);
        }
    }

    #[test]
    fn test_belt_is_seeded() {
        let config = BeltConfig::default();
        assert_eq!(generate_belt(20, 7, &config), generate_belt(20, 7, &config));
        assert_ne!(generate_belt(20, 7, &config), generate_belt(20, 8, &config));
    }

    #[test]
    fn test_belt_survives_wire_roundtrip() {
        let belt = generate_belt(10, 1, &BeltConfig::default());
        let json = serde_json::to_string(&belt).unwrap();
        let snapshot = Snapshot::from_json(&json).unwrap();

        assert_eq!(snapshot.bulk.len(), 10);
        assert!(snapshot.discrete.is_empty());
        assert_eq!(snapshot.bulk[3].id, "asteroid_3");
    }
}
