//! Retained scene graph the reconciler writes into
//!
//! The rendering backend is reached only through [`SceneGraph`]. The engine
//! ships [`RetainedScene`], an in-memory graph that owns node resources and
//! hands draw data to whatever uploads it to the GPU (the browser host or a
//! native renderer).

use glam::{DQuat, DVec3};
use std::collections::HashMap;

use crate::style::Rgb;

/// Handle to a node owned by a scene graph
pub type NodeId = u64;

#[derive(Clone, Debug, PartialEq)]
pub enum Geometry {
    Sphere {
        radius: f64,
        width_segments: u32,
        height_segments: u32,
    },
    Icosahedron {
        radius: f64,
        detail: u32,
    },
    /// Flat annulus in the node's local XY plane
    Ring {
        inner: f64,
        outer: f64,
        segments: u32,
    },
    Polyline {
        points: Vec<DVec3>,
    },
    /// Unit cube outline, sized through the node transform
    BoxOutline,
    /// Shared base mesh drawn once per instance transform
    Instanced {
        base: Box<Geometry>,
        capacity: usize,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Shading {
    Lit,
    Unlit,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Side {
    Front,
    Back,
    Double,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Material {
    /// Texture URL; the colour tints it when present
    pub map: Option<String>,
    pub color: Rgb,
    pub shading: Shading,
    pub side: Side,
    pub transparent: bool,
}

impl Material {
    pub fn flat(color: Rgb) -> Self {
        Self {
            map: None,
            color,
            shading: Shading::Lit,
            side: Side::Front,
            transparent: false,
        }
    }

    pub fn textured(url: impl Into<String>, shading: Shading) -> Self {
        Self {
            map: Some(url.into()),
            color: Rgb::WHITE,
            shading,
            side: Side::Front,
            transparent: false,
        }
    }

    pub fn unlit(mut self) -> Self {
        self.shading = Shading::Unlit;
        self
    }

    pub fn with_side(mut self, side: Side) -> Self {
        self.side = side;
        self
    }

    pub fn transparent(mut self) -> Self {
        self.transparent = true;
        self
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub position: DVec3,
    pub rotation: DQuat,
    pub scale: DVec3,
}

impl Transform {
    pub const IDENTITY: Self = Self {
        position: DVec3::ZERO,
        rotation: DQuat::IDENTITY,
        scale: DVec3::ONE,
    };

    pub fn at(position: DVec3) -> Self {
        Self {
            position,
            ..Self::IDENTITY
        }
    }

    pub fn with_rotation(mut self, rotation: DQuat) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_scale(mut self, scale: DVec3) -> Self {
        self.scale = scale;
        self
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Everything needed to create a node
#[derive(Clone, Debug, PartialEq)]
pub struct NodeSpec {
    pub label: String,
    pub geometry: Geometry,
    pub material: Material,
    pub transform: Transform,
    pub parent: Option<NodeId>,
    pub visible: bool,
}

impl NodeSpec {
    pub fn new(label: impl Into<String>, geometry: Geometry, material: Material) -> Self {
        Self {
            label: label.into(),
            geometry,
            material,
            transform: Transform::IDENTITY,
            parent: None,
            visible: true,
        }
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    pub fn child_of(mut self, parent: NodeId) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }
}

/// Backend seam: the operations reconciliation needs from a scene graph.
///
/// `detach` releases the node's geometry and material and every child
/// attached under it.
pub trait SceneGraph {
    fn attach(&mut self, spec: NodeSpec) -> NodeId;
    fn set_transform(&mut self, node: NodeId, transform: Transform);
    fn set_color(&mut self, node: NodeId, color: Rgb);
    fn set_visible(&mut self, node: NodeId, visible: bool);
    fn detach(&mut self, node: NodeId);
}

/// A live node in [`RetainedScene`]
#[derive(Clone, Debug, PartialEq)]
pub struct SceneNode {
    pub spec: NodeSpec,
    pub children: Vec<NodeId>,
}

/// In-memory scene graph owning every attached node
#[derive(Debug, Default)]
pub struct RetainedScene {
    nodes: HashMap<NodeId, SceneNode>,
    next_id: NodeId,
    /// Nodes released since creation (parents and children)
    released: u64,
}

impl RetainedScene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node(&self, id: NodeId) -> Option<&SceneNode> {
        self.nodes.get(&id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn released(&self) -> u64 {
        self.released
    }

    /// Visible nodes in attach order, for building draw lists
    pub fn visible_nodes(&self) -> Vec<(NodeId, &SceneNode)> {
        let mut nodes: Vec<_> = self
            .nodes
            .iter()
            .filter(|(_, n)| n.spec.visible)
            .map(|(id, n)| (*id, n))
            .collect();
        nodes.sort_by_key(|(id, _)| *id);
        nodes
    }

    fn release(&mut self, id: NodeId) {
        if let Some(node) = self.nodes.remove(&id) {
            self.released += 1;
            for child in node.children {
                self.release(child);
            }
        }
    }
}

impl SceneGraph for RetainedScene {
    fn attach(&mut self, spec: NodeSpec) -> NodeId {
        let id = self.next_id;
        self.next_id += 1;

        if let Some(parent) = spec.parent.and_then(|p| self.nodes.get_mut(&p)) {
            parent.children.push(id);
        }

        self.nodes.insert(
            id,
            SceneNode {
                spec,
                children: Vec::new(),
            },
        );
        id
    }

    fn set_transform(&mut self, node: NodeId, transform: Transform) {
        if let Some(n) = self.nodes.get_mut(&node) {
            n.spec.transform = transform;
        }
    }

    fn set_color(&mut self, node: NodeId, color: Rgb) {
        if let Some(n) = self.nodes.get_mut(&node) {
            n.spec.material.color = color;
        }
    }

    fn set_visible(&mut self, node: NodeId, visible: bool) {
        if let Some(n) = self.nodes.get_mut(&node) {
            n.spec.visible = visible;
        }
    }

    fn detach(&mut self, node: NodeId) {
        let parent = self.nodes.get(&node).and_then(|n| n.spec.parent);
        if let Some(p) = parent.and_then(|p| self.nodes.get_mut(&p)) {
            p.children.retain(|c| *c != node);
        }
        self.release(node);
    }
}
