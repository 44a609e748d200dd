//! Per-kind geometry, material and colour policy

use fleet_core::constants::{ANOMALY_STATUS, SATURN_RING_TEXTURE};
use fleet_core::wire::TextureCatalog;
use fleet_core::{ObjectKind, TrackedObject};
use std::f64::consts::FRAC_PI_2;

use crate::scene::{Geometry, Material, NodeSpec, Shading, Side, Transform};
use glam::DQuat;

/// 24-bit RGB colour (`0xRRGGBB`)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Rgb(pub u32);

impl Rgb {
    pub const WHITE: Rgb = Rgb(0xffffff);
    pub const PLANET_BLUE: Rgb = Rgb(0x4d7cff);
    pub const STAR_GOLD: Rgb = Rgb(0xffd700);
    pub const DEFAULT_VIOLET: Rgb = Rgb(0x8b5cf6);
    pub const ALERT_RED: Rgb = Rgb(0xff3344);
    pub const NEO_AMBER: Rgb = Rgb(0xffaa00);
    pub const ASTEROID_GREY: Rgb = Rgb(0x888888);
    pub const PATH_MAGENTA: Rgb = Rgb(0xff00ff);
    pub const HIGHLIGHT_YELLOW: Rgb = Rgb(0xffff00);

    pub fn hex(self) -> String {
        format!("#{:06x}", self.0)
    }
}

/// Idle spin added on every snapshot update (radians about Y)
pub const IDLE_SPIN_STEP: f64 = 0.001;

/// Base mesh shape of a discrete body
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Shape {
    Sphere,
    Icosahedron,
}

/// Visual policy for one object kind
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BodyStyle {
    pub shape: Shape,
    /// Colour used when no texture is available
    pub flat_color: Rgb,
    /// Shading used when a texture is available
    pub textured_shading: Shading,
    /// Whether the body picks up idle spin on updates
    pub spins: bool,
}

pub fn style_for(kind: ObjectKind) -> BodyStyle {
    match kind {
        ObjectKind::Star => BodyStyle {
            shape: Shape::Sphere,
            flat_color: Rgb::STAR_GOLD,
            textured_shading: Shading::Unlit,
            spins: false,
        },
        ObjectKind::Planet => BodyStyle {
            shape: Shape::Sphere,
            flat_color: Rgb::PLANET_BLUE,
            textured_shading: Shading::Lit,
            spins: true,
        },
        ObjectKind::Satellite => BodyStyle {
            shape: Shape::Sphere,
            flat_color: Rgb::WHITE,
            textured_shading: Shading::Lit,
            spins: true,
        },
        ObjectKind::Neo => BodyStyle {
            shape: Shape::Icosahedron,
            flat_color: Rgb::DEFAULT_VIOLET,
            textured_shading: Shading::Lit,
            spins: true,
        },
        ObjectKind::Asteroid | ObjectKind::Other => BodyStyle {
            shape: Shape::Sphere,
            flat_color: Rgb::DEFAULT_VIOLET,
            textured_shading: Shading::Lit,
            spins: true,
        },
    }
}

impl BodyStyle {
    pub fn geometry(&self, size: f64) -> Geometry {
        match self.shape {
            Shape::Sphere => Geometry::Sphere {
                radius: size,
                width_segments: 32,
                height_segments: 32,
            },
            Shape::Icosahedron => Geometry::Icosahedron {
                radius: size,
                detail: 0,
            },
        }
    }

    /// Texture keyed by object id if the catalog has one, flat colour otherwise
    pub fn material(&self, id: &str, textures: &TextureCatalog) -> Material {
        match textures.get(id) {
            Some(url) => Material::textured(url, self.textured_shading),
            None => Material::flat(self.flat_color),
        }
    }
}

/// Colour forced onto a body by its live status, if its kind has such a rule
pub fn status_color(object: &TrackedObject) -> Option<Rgb> {
    match object.kind {
        ObjectKind::Satellite => {
            if object.status.as_deref() == Some(ANOMALY_STATUS) {
                Some(Rgb::ALERT_RED)
            } else {
                Some(Rgb::WHITE)
            }
        }
        ObjectKind::Neo => {
            if object.hazardous() {
                Some(Rgb::ALERT_RED)
            } else {
                Some(Rgb::NEO_AMBER)
            }
        }
        _ => None,
    }
}

/// Ring radii relative to the body size
pub const RING_INNER: f64 = 1.5;
pub const RING_OUTER: f64 = 2.5;

/// Ring child for bodies that have one (Saturn, when its ring texture exists)
pub fn ring_spec(id: &str, size: f64, textures: &TextureCatalog) -> Option<NodeSpec> {
    if id != "saturn" {
        return None;
    }
    let url = textures.get(SATURN_RING_TEXTURE)?;

    let material = Material::textured(url, Shading::Unlit)
        .with_side(Side::Double)
        .transparent();
    let geometry = Geometry::Ring {
        inner: size * RING_INNER,
        outer: size * RING_OUTER,
        segments: 64,
    };
    // Lay the ring flat in the parent's XZ plane
    let transform = Transform::IDENTITY.with_rotation(DQuat::from_rotation_x(-FRAC_PI_2));

    Some(NodeSpec::new(format!("{id}:ring"), geometry, material).with_transform(transform))
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::DVec3;

    #[test]
    fn test_flat_colour_fallbacks() {
        let textures = TextureCatalog::default();

        let planet = style_for(ObjectKind::Planet).material("mars", &textures);
        assert_eq!(planet.color, Rgb::PLANET_BLUE);
        assert!(planet.map.is_none());

        assert_eq!(style_for(ObjectKind::Star).material("sun", &textures).color, Rgb::STAR_GOLD);
        assert_eq!(
            style_for(ObjectKind::Satellite).material("SAT-01", &textures).color,
            Rgb::WHITE
        );
        assert_eq!(
            style_for(ObjectKind::Other).material("voyager", &textures).color,
            Rgb::DEFAULT_VIOLET
        );
    }

    #[test]
    fn test_texture_wins_over_flat_colour() {
        let mut textures = TextureCatalog::default();
        textures.insert("earth", "/static/textures/earth.jpg");
        textures.insert("sun", "/static/textures/sun.jpg");

        let earth = style_for(ObjectKind::Planet).material("earth", &textures);
        assert_eq!(earth.map.as_deref(), Some("/static/textures/earth.jpg"));
        assert_eq!(earth.shading, Shading::Lit);

        let sun = style_for(ObjectKind::Star).material("sun", &textures);
        assert_eq!(sun.shading, Shading::Unlit);
    }

    #[test]
    fn test_status_colours() {
        let mut sat = TrackedObject::new("SAT-01", ObjectKind::Satellite, DVec3::ZERO, 1.0);
        assert_eq!(status_color(&sat), Some(Rgb::WHITE));
        sat.status = Some(ANOMALY_STATUS.to_string());
        assert_eq!(status_color(&sat), Some(Rgb::ALERT_RED));

        let mut neo = TrackedObject::new("NEO-1", ObjectKind::Neo, DVec3::ZERO, 1.0);
        assert_eq!(status_color(&neo), Some(Rgb::NEO_AMBER));
        neo.is_hazardous = Some(true);
        assert_eq!(status_color(&neo), Some(Rgb::ALERT_RED));

        let planet = TrackedObject::new("mars", ObjectKind::Planet, DVec3::ZERO, 1.0);
        assert_eq!(status_color(&planet), None);
    }

    #[test]
    fn test_neo_is_icosahedron() {
        assert_eq!(
            style_for(ObjectKind::Neo).geometry(2.0),
            Geometry::Icosahedron { radius: 2.0, detail: 0 }
        );
    }

    #[test]
    fn test_ring_only_with_texture() {
        let mut textures = TextureCatalog::default();
        assert!(ring_spec("saturn", 8.0, &textures).is_none());

        textures.insert(SATURN_RING_TEXTURE, "/static/textures/saturn_ring.png");
        let ring = ring_spec("saturn", 8.0, &textures).unwrap();
        assert_eq!(
            ring.geometry,
            Geometry::Ring { inner: 12.0, outer: 20.0, segments: 64 }
        );
        assert!(ring_spec("jupiter", 9.0, &textures).is_none());
    }

    #[test]
    fn test_rgb_hex() {
        assert_eq!(Rgb::WHITE.hex(), "#ffffff");
        assert_eq!(Rgb::ALERT_RED.hex(), "#ff3344");
        assert_eq!(Rgb(0x00ff).hex(), "#0000ff");
    }
}
