//! Ray picking and the current selection

use fleet_core::constants::STARFIELD_RADIUS;
use fleet_core::{ObjectKind, TrackedObject};
use glam::{DVec2, DVec3};
use serde::Serialize;

use crate::camera::Camera;
use crate::reconcile::{Representation, SceneRegistry};

/// Panel text shown when nothing is selected
pub const AWAITING_SELECTION: &str = "Awaiting Selection...";

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ray {
    pub origin: DVec3,
    /// Unit length
    pub direction: DVec3,
}

impl Ray {
    pub fn new(origin: DVec3, direction: DVec3) -> Self {
        Self {
            origin,
            direction: direction.normalize(),
        }
    }

    pub fn from_camera(camera: &Camera, ndc: DVec2) -> Self {
        Self::new(camera.position, camera.ray_direction(ndc))
    }

    pub fn at(&self, t: f64) -> DVec3 {
        self.origin + self.direction * t
    }

    /// Nearest non-negative hit distance; from inside the sphere this is the exit
    pub fn intersect_sphere(&self, center: DVec3, radius: f64) -> Option<f64> {
        let oc = self.origin - center;
        let b = oc.dot(self.direction);
        let c = oc.length_squared() - radius * radius;
        let disc = b * b - c;
        if disc < 0.0 {
            return None;
        }
        let sqrt_d = disc.sqrt();
        let near = -b - sqrt_d;
        let far = -b + sqrt_d;
        if near >= 0.0 {
            Some(near)
        } else if far >= 0.0 {
            Some(far)
        } else {
            None
        }
    }

    /// Hit distance on a flat annulus lying in the horizontal plane through `center`
    pub fn intersect_ring(&self, center: DVec3, inner: f64, outer: f64) -> Option<f64> {
        if self.direction.y.abs() < 1e-12 {
            return None;
        }
        let t = (center.y - self.origin.y) / self.direction.y;
        if t < 0.0 {
            return None;
        }
        let r = (self.at(t) - center).length();
        (inner..=outer).contains(&r).then_some(t)
    }
}

/// What a ray ran into
#[derive(Clone, Debug, PartialEq)]
pub enum HitTarget {
    Body(String),
    /// Ring child; selecting it selects the parent body
    Ring(String),
    Starfield,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Hit {
    pub distance: f64,
    pub target: HitTarget,
}

impl Hit {
    /// Id of the discrete body this hit selects, if any
    pub fn selectable_id(&self) -> Option<&str> {
        match &self.target {
            HitTarget::Body(id) | HitTarget::Ring(id) => Some(id),
            HitTarget::Starfield => None,
        }
    }
}

/// Every hit along the ray, nearest first
pub fn raycast_all(ray: &Ray, registry: &SceneRegistry, starfield: bool) -> Vec<Hit> {
    let mut hits = Vec::new();

    for rep in registry.iter() {
        if let Some(distance) = ray.intersect_sphere(rep.position, rep.size()) {
            hits.push(Hit {
                distance,
                target: HitTarget::Body(rep.id().to_string()),
            });
        }
        if let Some(ring) = rep.ring {
            if let Some(distance) = ray.intersect_ring(rep.position, ring.inner, ring.outer) {
                hits.push(Hit {
                    distance,
                    target: HitTarget::Ring(rep.id().to_string()),
                });
            }
        }
    }

    if starfield {
        if let Some(distance) = ray.intersect_sphere(DVec3::ZERO, STARFIELD_RADIUS) {
            hits.push(Hit {
                distance,
                target: HitTarget::Starfield,
            });
        }
    }

    hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
    hits
}

/// First discrete body along the ray
pub fn pick(ray: &Ray, registry: &SceneRegistry, starfield: bool) -> Option<String> {
    raycast_all(ray, registry, starfield)
        .into_iter()
        .find_map(|hit| hit.selectable_id().map(str::to_string))
}

/// Axis-aligned box around a selected body (and its ring)
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Aabb {
    pub min: DVec3,
    pub max: DVec3,
}

impl Aabb {
    pub fn around(rep: &Representation) -> Self {
        let extent = match rep.ring {
            // Rings are flat, so they only widen X and Z
            Some(_) => {
                let r = rep.bounding_radius();
                DVec3::new(r, rep.size(), r)
            }
            None => DVec3::splat(rep.size()),
        };
        Self {
            min: rep.position - extent,
            max: rep.position + extent,
        }
    }

    pub fn center(&self) -> DVec3 {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> DVec3 {
        self.max - self.min
    }
}

/// Info panel content for a selected object
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SelectionInfo {
    pub title: String,
    #[serde(rename = "type")]
    pub kind: ObjectKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hazardous: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub velocity_kps: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub miss_distance: Option<String>,
}

impl SelectionInfo {
    pub fn from_object(object: &TrackedObject) -> Self {
        let neo = object.kind == ObjectKind::Neo;
        Self {
            title: object.display_name().to_string(),
            kind: object.kind,
            hazardous: neo.then(|| object.hazardous()),
            velocity_kps: if neo { object.velocity_kps } else { None },
            miss_distance: if neo {
                object.miss_distance_km.as_ref().map(|m| m.to_string())
            } else {
                None
            },
        }
    }

    /// Panel lines below the title
    pub fn lines(&self) -> Vec<String> {
        let mut lines = vec![format!("Type: {}", self.kind)];
        if let Some(hazardous) = self.hazardous {
            lines.push(format!("Hazardous: {hazardous}"));
        }
        if let Some(v) = self.velocity_kps {
            lines.push(format!("Velocity: {v} kps"));
        }
        if let Some(miss) = &self.miss_distance {
            lines.push(format!("Miss Distance: {miss}"));
        }
        lines
    }
}

/// Current selection: info panel, plot-target text and highlight box
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Selection {
    pub selected: Option<String>,
    pub info: Option<SelectionInfo>,
    /// Prefilled plot-target input
    pub plot_target: String,
    pub highlight: Option<Aabb>,
}

impl Selection {
    pub fn select(&mut self, rep: &Representation) {
        self.selected = Some(rep.id().to_string());
        self.info = Some(SelectionInfo::from_object(&rep.object));
        self.plot_target = rep.object.display_name().to_string();
        self.highlight = Some(Aabb::around(rep));
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_none()
    }

    /// Panel text; the placeholder when nothing is selected
    pub fn panel_text(&self) -> String {
        match &self.info {
            Some(info) => {
                let mut text = info.title.clone();
                for line in info.lines() {
                    text.push('\n');
                    text.push_str(&line);
                }
                text
            }
            None => AWAITING_SELECTION.to_string(),
        }
    }

    /// Follow the selected body after reconciliation; clears when it is gone
    pub fn refresh(&mut self, registry: &SceneRegistry) {
        let Some(id) = self.selected.clone() else {
            return;
        };
        match registry.get(&id) {
            Some(rep) => self.select(rep),
            None => {
                tracing::debug!("Selected object {} removed, clearing selection", id);
                self.clear();
            }
        }
    }
}
