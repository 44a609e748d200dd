use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::constants::SCENE_SCALE_AU;

/// Position as the backend encodes it (`{x, y, z}` in scene units)
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct WirePosition {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl WirePosition {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn to_dvec3(self) -> DVec3 {
        DVec3::new(self.x, self.y, self.z)
    }
}

impl From<WirePosition> for DVec3 {
    fn from(p: WirePosition) -> Self {
        p.to_dvec3()
    }
}

impl From<DVec3> for WirePosition {
    fn from(v: DVec3) -> Self {
        Self::new(v.x, v.y, v.z)
    }
}

/// Convert an AU-denominated vector to scene units
pub fn au_to_scene(v: DVec3) -> DVec3 {
    v * SCENE_SCALE_AU
}
