//! Snapshot reconciliation for discrete objects
//!
//! Each snapshot is a complete replacement set. The registry diffs it against
//! the ids it already knows and touches the scene graph only for the delta:
//! new ids are attached once, known ids are updated in place, and ids missing
//! from the snapshot are detached (which releases their resources).

use fleet_core::wire::TextureCatalog;
use fleet_core::{DiscreteObject, ObjectKind, TrackedObject};
use glam::{DQuat, DVec3};
use std::collections::{HashMap, HashSet};

use crate::scene::{NodeId, NodeSpec, SceneGraph, Transform};
use crate::style::{self, IDLE_SPIN_STEP, RING_INNER, RING_OUTER};

/// Ring child owned by a representation
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RingChild {
    pub node: NodeId,
    pub inner: f64,
    pub outer: f64,
}

/// Persistent visual representation of one discrete object
#[derive(Clone, Debug, PartialEq)]
pub struct Representation {
    pub node: NodeId,
    pub ring: Option<RingChild>,
    pub position: DVec3,
    /// Accumulated idle spin about Y (radians)
    pub spin: f64,
    /// Metadata from the latest snapshot
    pub object: TrackedObject,
}

impl Representation {
    pub fn id(&self) -> &str {
        &self.object.id
    }

    pub fn kind(&self) -> ObjectKind {
        self.object.kind
    }

    pub fn size(&self) -> f64 {
        self.object.size
    }

    /// Radius of the sphere enclosing the body and its ring
    pub fn bounding_radius(&self) -> f64 {
        match self.ring {
            Some(ring) => ring.outer.max(self.size()),
            None => self.size(),
        }
    }

    fn transform(&self) -> Transform {
        Transform::at(self.position).with_rotation(DQuat::from_rotation_y(self.spin))
    }
}

/// What a reconciliation pass changed
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ReconcileReport {
    pub created: Vec<String>,
    pub updated: usize,
    pub removed: Vec<String>,
    /// Bulk entities now backing the instance buffer (set by the session)
    pub bulk: usize,
}

impl ReconcileReport {
    pub fn is_noop(&self) -> bool {
        self.created.is_empty() && self.removed.is_empty()
    }
}

/// Id → representation map for discrete objects
#[derive(Debug, Default)]
pub struct SceneRegistry {
    reps: HashMap<String, Representation>,
}

impl SceneRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &str) -> Option<&Representation> {
        self.reps.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.reps.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.reps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reps.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Representation> {
        self.reps.values()
    }

    pub fn ids(&self) -> HashSet<&str> {
        self.reps.keys().map(String::as_str).collect()
    }

    /// Bring the registry and the scene graph in line with `incoming`.
    ///
    /// `incoming` must already be free of duplicate ids (see
    /// `Snapshot::partition`).
    pub fn reconcile<G: SceneGraph>(
        &mut self,
        graph: &mut G,
        incoming: &[DiscreteObject],
        textures: &TextureCatalog,
    ) -> ReconcileReport {
        let mut report = ReconcileReport::default();
        let incoming_ids: HashSet<&str> = incoming.iter().map(|d| d.id()).collect();

        for entry in incoming {
            match self.reps.get_mut(entry.id()) {
                Some(rep) => {
                    update_representation(graph, rep, entry);
                    report.updated += 1;
                }
                None => {
                    let mut rep = create_representation(graph, entry, textures);
                    update_representation(graph, &mut rep, entry);
                    report.created.push(entry.id().to_string());
                    self.reps.insert(entry.id().to_string(), rep);
                }
            }
        }

        let stale: Vec<String> = self
            .reps
            .keys()
            .filter(|id| !incoming_ids.contains(id.as_str()))
            .cloned()
            .collect();

        for id in stale {
            if let Some(rep) = self.reps.remove(&id) {
                graph.detach(rep.node);
                report.removed.push(id);
            }
        }

        if !report.is_noop() {
            tracing::debug!(
                "Reconciled scene: +{} ~{} -{}",
                report.created.len(),
                report.updated,
                report.removed.len()
            );
        }

        report
    }
}

fn create_representation<G: SceneGraph>(
    graph: &mut G,
    entry: &DiscreteObject,
    textures: &TextureCatalog,
) -> Representation {
    let body_style = style::style_for(entry.kind());
    let size = entry.size();

    let spec = NodeSpec::new(
        entry.id(),
        body_style.geometry(size),
        body_style.material(entry.id(), textures),
    )
    .with_transform(Transform::at(entry.position));
    let node = graph.attach(spec);

    let ring = style::ring_spec(entry.id(), size, textures).map(|spec| RingChild {
        node: graph.attach(spec.child_of(node)),
        inner: size * RING_INNER,
        outer: size * RING_OUTER,
    });

    Representation {
        node,
        ring,
        position: entry.position,
        spin: 0.0,
        object: entry.object.clone(),
    }
}

/// Update only the mutable fields: metadata, position, spin and status colour
fn update_representation<G: SceneGraph>(
    graph: &mut G,
    rep: &mut Representation,
    entry: &DiscreteObject,
) {
    rep.object = entry.object.clone();
    rep.position = entry.position;
    if style::style_for(entry.kind()).spins {
        rep.spin += IDLE_SPIN_STEP;
    }
    graph.set_transform(rep.node, rep.transform());

    if let Some(color) = style::status_color(&rep.object) {
        graph.set_color(rep.node, color);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{RetainedScene, SceneGraph};
    use crate::style::Rgb;
    use fleet_core::constants::ANOMALY_STATUS;
    use fleet_core::Snapshot;

    /// Counts graph operations so tests can prove what reconciliation touched
    #[derive(Default)]
    struct RecordingGraph {
        inner: RetainedScene,
        attached: usize,
        detached: usize,
    }

    impl SceneGraph for RecordingGraph {
        fn attach(&mut self, spec: NodeSpec) -> NodeId {
            self.attached += 1;
            self.inner.attach(spec)
        }
        fn set_transform(&mut self, node: NodeId, transform: Transform) {
            self.inner.set_transform(node, transform)
        }
        fn set_color(&mut self, node: NodeId, color: Rgb) {
            self.inner.set_color(node, color)
        }
        fn set_visible(&mut self, node: NodeId, visible: bool) {
            self.inner.set_visible(node, visible)
        }
        fn detach(&mut self, node: NodeId) {
            self.detached += 1;
            self.inner.detach(node)
        }
    }

    fn planet(id: &str, x: f64, size: f64) -> TrackedObject {
        TrackedObject::new(id, ObjectKind::Planet, DVec3::new(x, 0.0, 0.0), size)
    }

    fn snapshot(objects: Vec<TrackedObject>) -> Snapshot {
        Snapshot::partition(objects)
    }

    fn ids(registry: &SceneRegistry) -> Vec<String> {
        let mut ids: Vec<String> = registry.ids().into_iter().map(String::from).collect();
        ids.sort();
        ids
    }

    #[test]
    fn test_earth_replaced_by_mars() {
        let mut graph = RecordingGraph::default();
        let mut registry = SceneRegistry::new();
        let textures = TextureCatalog::default();

        let first = snapshot(vec![planet("earth", 1.0, 5.0)]);
        let report = registry.reconcile(&mut graph, &first.discrete, &textures);
        assert_eq!(report.created, vec!["earth".to_string()]);

        let second = snapshot(vec![planet("mars", 2.0, 4.0)]);
        let report = registry.reconcile(&mut graph, &second.discrete, &textures);

        assert_eq!(report.created, vec!["mars".to_string()]);
        assert_eq!(report.removed, vec!["earth".to_string()]);
        assert_eq!(ids(&registry), vec!["mars".to_string()]);
        assert_eq!(graph.inner.len(), 1);
        assert_eq!(registry.get("mars").unwrap().position, DVec3::new(2.0, 0.0, 0.0));
    }

    #[test]
    fn test_same_snapshot_twice_is_idempotent() {
        let mut graph = RecordingGraph::default();
        let mut registry = SceneRegistry::new();
        let textures = TextureCatalog::default();

        let snap = snapshot(vec![
            TrackedObject::new("sun", ObjectKind::Star, DVec3::ZERO, 20.0),
            planet("earth", 150.0, 4.0),
            TrackedObject::new("SAT-01", ObjectKind::Satellite, DVec3::new(151.0, 0.0, 0.0), 0.5),
        ]);

        registry.reconcile(&mut graph, &snap.discrete, &textures);
        let nodes_before: HashMap<String, NodeId> = registry
            .iter()
            .map(|r| (r.id().to_string(), r.node))
            .collect();
        let (attached, detached) = (graph.attached, graph.detached);

        let report = registry.reconcile(&mut graph, &snap.discrete, &textures);

        assert!(report.is_noop());
        assert_eq!(report.updated, 3);
        assert_eq!(graph.attached, attached);
        assert_eq!(graph.detached, detached);
        for rep in registry.iter() {
            assert_eq!(nodes_before[rep.id()], rep.node);
        }
    }

    #[test]
    fn test_registry_tracks_every_snapshot() {
        let mut graph = RecordingGraph::default();
        let mut registry = SceneRegistry::new();
        let textures = TextureCatalog::default();

        let sequence = vec![
            vec!["a", "b", "c"],
            vec!["b", "c", "d"],
            vec![],
            vec!["e"],
            vec!["e", "a", "b"],
            vec!["a"],
        ];

        for ids_in in sequence {
            let snap = snapshot(
                ids_in
                    .iter()
                    .enumerate()
                    .map(|(i, id)| planet(id, i as f64, 1.0))
                    .collect(),
            );
            registry.reconcile(&mut graph, &snap.discrete, &textures);

            let mut expected: Vec<String> = ids_in.iter().map(|s| s.to_string()).collect();
            expected.sort();
            assert_eq!(ids(&registry), expected);
            // One node per representation; nothing leaked
            assert_eq!(graph.inner.len(), expected.len());
        }
    }

    #[test]
    fn test_update_is_in_place() {
        let mut graph = RetainedScene::new();
        let mut registry = SceneRegistry::new();
        let textures = TextureCatalog::default();

        registry.reconcile(&mut graph, &snapshot(vec![planet("earth", 1.0, 5.0)]).discrete, &textures);
        let node = registry.get("earth").unwrap().node;

        registry.reconcile(&mut graph, &snapshot(vec![planet("earth", 7.0, 5.0)]).discrete, &textures);
        let rep = registry.get("earth").unwrap();

        assert_eq!(rep.node, node);
        assert_eq!(graph.node(node).unwrap().spec.transform.position, DVec3::new(7.0, 0.0, 0.0));
        // Spin accumulated once per update, including the creating pass
        assert!((rep.spin - 2.0 * IDLE_SPIN_STEP).abs() < 1e-12);
    }

    #[test]
    fn test_stars_do_not_spin() {
        let mut graph = RetainedScene::new();
        let mut registry = SceneRegistry::new();
        let snap = snapshot(vec![TrackedObject::new("sun", ObjectKind::Star, DVec3::ZERO, 20.0)]);

        for _ in 0..5 {
            registry.reconcile(&mut graph, &snap.discrete, &TextureCatalog::default());
        }
        assert_eq!(registry.get("sun").unwrap().spin, 0.0);
    }

    #[test]
    fn test_satellite_anomaly_colour_follows_status() {
        let mut graph = RetainedScene::new();
        let mut registry = SceneRegistry::new();
        let textures = TextureCatalog::default();

        let mut sat = TrackedObject::new("SAT-03", ObjectKind::Satellite, DVec3::ZERO, 1.0);
        sat.status = Some(ANOMALY_STATUS.to_string());
        registry.reconcile(&mut graph, &snapshot(vec![sat.clone()]).discrete, &textures);
        let node = registry.get("SAT-03").unwrap().node;
        assert_eq!(graph.node(node).unwrap().spec.material.color, Rgb::ALERT_RED);

        sat.status = Some("Nominal".to_string());
        registry.reconcile(&mut graph, &snapshot(vec![sat]).discrete, &textures);
        assert_eq!(graph.node(node).unwrap().spec.material.color, Rgb::WHITE);
    }

    #[test]
    fn test_hazardous_neo_is_red() {
        let mut graph = RetainedScene::new();
        let mut registry = SceneRegistry::new();

        let mut neo = TrackedObject::new("NEO-1", ObjectKind::Neo, DVec3::ONE, 1.0);
        neo.is_hazardous = Some(true);
        registry.reconcile(&mut graph, &snapshot(vec![neo]).discrete, &TextureCatalog::default());

        let node = registry.get("NEO-1").unwrap().node;
        assert_eq!(graph.node(node).unwrap().spec.material.color, Rgb::ALERT_RED);
    }

    #[test]
    fn test_saturn_ring_released_with_body() {
        let mut graph = RetainedScene::new();
        let mut registry = SceneRegistry::new();
        let mut textures = TextureCatalog::default();
        textures.insert("saturn_ring", "/static/textures/saturn_ring.png");

        let snap = snapshot(vec![planet("saturn", 1430.0, 8.0)]);
        registry.reconcile(&mut graph, &snap.discrete, &textures);

        let rep = registry.get("saturn").unwrap();
        let ring = rep.ring.expect("ring attached");
        assert_eq!(ring.outer, 20.0);
        assert_eq!(rep.bounding_radius(), 20.0);
        assert_eq!(graph.len(), 2);

        registry.reconcile(&mut graph, &[], &textures);
        assert!(graph.is_empty());
        assert_eq!(graph.released(), 2);
    }
}
