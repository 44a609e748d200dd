//! The scene session: every piece of viewer state in one place

use fleet_core::constants::{ASTEROID_CAPACITY, STARFIELD_RADIUS, STARFIELD_TEXTURE};
use fleet_core::wire::TextureCatalog;
use fleet_core::{BulkObject, Snapshot, WirePosition};
use fleet_sim::OrbitClock;
use glam::DVec3;

use crate::camera::{CameraRig, CameraUniform, MoveKey};
use crate::input::{InputEvent, Viewport};
use crate::picking::{self, Ray, Selection};
use crate::reconcile::{ReconcileReport, SceneRegistry};
use crate::renderer::{AsteroidInstance, RendererCore};
use crate::scene::{Geometry, Material, NodeId, NodeSpec, RetainedScene, SceneGraph, Side, Transform};
use crate::style::Rgb;

/// Polyline currently drawn for a plotted trajectory
#[derive(Clone, Debug, PartialEq)]
pub struct PlottedPath {
    pub node: NodeId,
    pub id: String,
    pub points: Vec<DVec3>,
}

/// Per-frame output for the host
#[derive(Clone, Copy, Debug)]
pub struct FrameStats {
    pub orbit_time: f64,
    pub instances: usize,
    pub camera: CameraUniform,
}

/// Scene graph, registry, camera, selection and bulk belt for one viewer.
pub struct SceneSession<G: SceneGraph = RetainedScene> {
    graph: G,
    registry: SceneRegistry,
    textures: TextureCatalog,
    starfield: Option<NodeId>,
    asteroids: NodeId,
    highlight: NodeId,
    path: Option<PlottedPath>,
    bulk: Vec<BulkObject>,
    clock: OrbitClock,
    renderer: RendererCore,
    selection: Selection,
    viewport: Viewport,
    /// Monotonic reading of the latest tick (seconds)
    now: f64,
    pub rig: CameraRig,
}

impl SceneSession<RetainedScene> {
    pub fn new(start_seconds: f64, orbit_rate: f64) -> Self {
        Self::with_graph(RetainedScene::new(), start_seconds, orbit_rate)
    }
}

impl<G: SceneGraph> SceneSession<G> {
    pub fn with_graph(mut graph: G, start_seconds: f64, orbit_rate: f64) -> Self {
        let asteroids = graph.attach(NodeSpec::new(
            "asteroids",
            Geometry::Instanced {
                base: Box::new(Geometry::Icosahedron {
                    radius: 1.0,
                    detail: 0,
                }),
                capacity: ASTEROID_CAPACITY,
            },
            Material::flat(Rgb::ASTEROID_GREY),
        ));
        let highlight = graph.attach(
            NodeSpec::new(
                "selection",
                Geometry::BoxOutline,
                Material::flat(Rgb::HIGHLIGHT_YELLOW).unlit(),
            )
            .hidden(),
        );

        let mut rig = CameraRig::new();
        let viewport = Viewport::default();
        rig.camera.aspect = viewport.aspect();

        Self {
            graph,
            registry: SceneRegistry::new(),
            textures: TextureCatalog::default(),
            starfield: None,
            asteroids,
            highlight,
            path: None,
            bulk: Vec::new(),
            clock: OrbitClock::with_rate(start_seconds, orbit_rate),
            renderer: RendererCore::new(),
            selection: Selection::default(),
            viewport,
            now: start_seconds,
            rig,
        }
    }

    pub fn graph(&self) -> &G {
        &self.graph
    }

    pub fn registry(&self) -> &SceneRegistry {
        &self.registry
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn textures(&self) -> &TextureCatalog {
        &self.textures
    }

    pub fn bulk(&self) -> &[BulkObject] {
        &self.bulk
    }

    pub fn clock(&self) -> &OrbitClock {
        &self.clock
    }

    pub fn plotted_path(&self) -> Option<&PlottedPath> {
        self.path.as_ref()
    }

    pub fn starfield_node(&self) -> Option<NodeId> {
        self.starfield
    }

    pub fn asteroid_node(&self) -> NodeId {
        self.asteroids
    }

    pub fn highlight_node(&self) -> NodeId {
        self.highlight
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn instances(&self) -> &[AsteroidInstance] {
        &self.renderer.instances
    }

    /// Install the texture catalog; attaches the starfield the first time one is available
    pub fn install_textures(&mut self, textures: TextureCatalog) {
        self.textures = textures;
        if self.starfield.is_some() {
            return;
        }
        if let Some(url) = self.textures.get(STARFIELD_TEXTURE) {
            let spec = NodeSpec::new(
                "starfield",
                Geometry::Sphere {
                    radius: STARFIELD_RADIUS,
                    width_segments: 64,
                    height_segments: 64,
                },
                Material::textured(url, crate::scene::Shading::Unlit).with_side(Side::Back),
            );
            self.starfield = Some(self.graph.attach(spec));
            tracing::debug!("Starfield attached");
        }
    }

    /// Reconcile discrete objects and replace the bulk set
    pub fn apply_snapshot(&mut self, snapshot: Snapshot) -> ReconcileReport {
        let mut report = self
            .registry
            .reconcile(&mut self.graph, &snapshot.discrete, &self.textures);

        self.bulk = snapshot.bulk;
        report.bulk = self.bulk.len();

        self.selection.refresh(&self.registry);
        self.sync_highlight();
        report
    }

    /// Advance camera and belt to the monotonic reading `now_seconds`
    pub fn tick(&mut self, now_seconds: f64) -> FrameStats {
        self.now = now_seconds;

        let registry = &self.registry;
        self.rig
            .tick(|id| registry.get(id).map(|rep| (rep.position, rep.size())));

        let orbit_time = self.clock.orbit_time(now_seconds);
        let instances = self.renderer.prepare_instances(&self.bulk, orbit_time).len();

        FrameStats {
            orbit_time,
            instances,
            camera: self.rig.uniform(),
        }
    }

    pub fn handle_input(&mut self, event: InputEvent) {
        match event {
            InputEvent::MouseButton { pressed, .. } => {
                if pressed {
                    self.rig.pointer_down();
                } else {
                    self.rig.pointer_up();
                }
            }
            InputEvent::MouseMove { dx, dy } => self.rig.pointer_move(dx, dy),
            InputEvent::Scroll { delta } => self.rig.wheel(delta),
            InputEvent::Key { code, pressed } => match MoveKey::from_code(&code) {
                Some(key) => self.rig.key(key, pressed),
                None => tracing::trace!("Unbound key {}", code),
            },
            InputEvent::Click { x, y } => {
                self.click(x, y);
            }
            InputEvent::Track { id } => self.track(&id),
            InputEvent::Home => self.rig.go_home(),
            InputEvent::Resize { width, height } => {
                self.viewport = Viewport::new(width, height);
                self.rig.camera.aspect = self.viewport.aspect();
            }
            InputEvent::SetTimeRate { rate } => self.clock.set_rate(self.now, rate),
        }
    }

    /// Follow an object currently in the scene
    pub fn track(&mut self, id: &str) {
        if self.registry.contains(id) {
            self.rig.track(id);
        } else {
            tracing::warn!("Cannot track {}: not in scene", id);
        }
    }

    /// Pick at a pixel position; returns the selected id
    pub fn click(&mut self, x: f64, y: f64) -> Option<String> {
        let ray = Ray::from_camera(&self.rig.camera, self.viewport.to_ndc(x, y));
        let picked = picking::pick(&ray, &self.registry, self.starfield.is_some());

        match picked.as_deref().and_then(|id| self.registry.get(id)) {
            Some(rep) => self.selection.select(rep),
            None => self.selection.clear(),
        }
        self.sync_highlight();
        picked
    }

    /// Replace the plotted trajectory; the previous line is released
    pub fn set_plotted_path(&mut self, id: &str, points: &[WirePosition]) {
        if let Some(old) = self.path.take() {
            self.graph.detach(old.node);
        }
        let points: Vec<DVec3> = points.iter().map(|p| p.to_dvec3()).collect();
        let node = self.graph.attach(NodeSpec::new(
            format!("path:{id}"),
            Geometry::Polyline {
                points: points.clone(),
            },
            Material::flat(Rgb::PATH_MAGENTA).unlit(),
        ));
        self.path = Some(PlottedPath {
            node,
            id: id.to_string(),
            points,
        });
    }

    fn sync_highlight(&mut self) {
        match self.selection.highlight {
            Some(aabb) => {
                self.graph.set_transform(
                    self.highlight,
                    Transform::at(aabb.center()).with_scale(aabb.size()),
                );
                self.graph.set_visible(self.highlight, true);
            }
            None => self.graph.set_visible(self.highlight, false),
        }
    }
}
