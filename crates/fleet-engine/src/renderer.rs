//! Renderer core (platform-agnostic)
//!
//! Produces the GPU-ready per-asteroid instance transforms the host draws for
//! the bulk belt.

use fleet_core::constants::ASTEROID_CAPACITY;
use fleet_core::BulkObject;
use fleet_sim::OrbitModel;
use glam::{DVec3, Mat4, Vec3};

/// One instanced asteroid (column-major model matrix)
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct AsteroidInstance {
    pub model: [[f32; 4]; 4],
}

impl AsteroidInstance {
    pub fn new(position: DVec3, size: f64) -> Self {
        let model = Mat4::from_scale_rotation_translation(
            Vec3::splat(size as f32),
            glam::Quat::IDENTITY,
            position.as_vec3(),
        );
        Self {
            model: model.to_cols_array_2d(),
        }
    }

    pub fn translation(&self) -> Vec3 {
        Vec3::new(self.model[3][0], self.model[3][1], self.model[3][2])
    }
}

/// Renderer state (platform-agnostic core)
pub struct RendererCore {
    pub instances: Vec<AsteroidInstance>,
    capacity: usize,
    /// Whether the last truncation was already reported
    truncation_warned: bool,
}

impl RendererCore {
    pub fn new() -> Self {
        Self::with_capacity(ASTEROID_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            instances: Vec::with_capacity(capacity),
            capacity,
            truncation_warned: false,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Propagate every bulk entity to `orbit_time` and rewrite the instance buffer.
    ///
    /// Entities past the buffer capacity are dropped; the warning fires once
    /// per oversized set rather than every frame.
    pub fn prepare_instances(&mut self, bulk: &[BulkObject], orbit_time: f64) -> &[AsteroidInstance] {
        if bulk.len() > self.capacity {
            if !self.truncation_warned {
                tracing::warn!(
                    "{} asteroids exceed instance capacity {}, truncating",
                    bulk.len(),
                    self.capacity
                );
                self.truncation_warned = true;
            }
        } else {
            self.truncation_warned = false;
        }

        self.instances.clear();
        self.instances.extend(
            bulk.iter()
                .take(self.capacity)
                .map(|b| AsteroidInstance::new(b.elements.scene_position(orbit_time), b.elements.size)),
        );
        &self.instances
    }
}

impl Default for RendererCore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fleet_core::AsteroidOrbitalElement;

    fn bulk(n: usize) -> Vec<BulkObject> {
        (0..n)
            .map(|i| BulkObject {
                id: format!("asteroid_{i}"),
                elements: AsteroidOrbitalElement {
                    semi_major_axis: 1.0,
                    eccentricity: 0.0,
                    inclination: 0.0,
                    mean_anomaly: 0.0,
                    period: 1.0,
                    size: 0.25,
                },
            })
            .collect()
    }

    #[test]
    fn test_instance_transform() {
        let mut renderer = RendererCore::new();
        let instances = renderer.prepare_instances(&bulk(1), 0.0);

        assert_eq!(instances.len(), 1);
        assert_eq!(instances[0].translation(), Vec3::new(150.0, 0.0, 0.0));
        assert_eq!(instances[0].model[0][0], 0.25);
        assert_eq!(std::mem::size_of_val(instances), 64);
    }

    #[test]
    fn test_buffer_truncates_at_capacity() {
        let mut renderer = RendererCore::new();
        assert_eq!(renderer.prepare_instances(&bulk(2500), 0.0).len(), ASTEROID_CAPACITY);
        assert_eq!(renderer.prepare_instances(&bulk(10), 0.0).len(), 10);
    }

    #[test]
    fn test_instances_follow_orbit_time() {
        let mut renderer = RendererCore::new();
        let quarter = renderer.prepare_instances(&bulk(1), 0.25)[0].translation();
        assert!(quarter.x.abs() < 1e-3);
        assert!((quarter.z - 150.0).abs() < 1e-3);
    }
}
