//! Tracked objects and snapshot partitioning

use glam::DVec3;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::coordinates::WirePosition;

/// Object class as sent in the `type` field
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectKind {
    Star,
    Planet,
    Satellite,
    Neo,
    Asteroid,
    /// Any type string this client does not know about
    #[serde(other)]
    Other,
}

impl ObjectKind {
    pub fn label(&self) -> &'static str {
        match self {
            ObjectKind::Star => "star",
            ObjectKind::Planet => "planet",
            ObjectKind::Satellite => "satellite",
            ObjectKind::Neo => "neo",
            ObjectKind::Asteroid => "asteroid",
            ObjectKind::Other => "other",
        }
    }

    /// Bulk kinds are drawn through instancing and never get a representation of their own
    pub fn is_bulk(&self) -> bool {
        matches!(self, ObjectKind::Asteroid)
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Miss distance, either numeric kilometres or the backend's pre-formatted text
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MissDistance {
    Km(f64),
    Text(String),
}

impl fmt::Display for MissDistance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MissDistance::Km(km) => write!(f, "{km:.0} km"),
            MissDistance::Text(text) => f.write_str(text),
        }
    }
}

/// Immutable orbital parameters of a bulk object.
///
/// Angles are radians, `semi_major_axis` is AU and `period` is in orbital time
/// units (years for the generated belt, where `period = sqrt(a^3)`).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AsteroidOrbitalElement {
    pub semi_major_axis: f64,
    pub eccentricity: f64,
    pub inclination: f64,
    pub mean_anomaly: f64,
    pub period: f64,
    /// Render scale; the backend sends it on the owning object, not here
    #[serde(default)]
    pub size: f64,
}

impl AsteroidOrbitalElement {
    /// Closed orbit: `0 <= e < 1` and a finite semi-major axis
    pub fn is_elliptic(&self) -> bool {
        (0.0..1.0).contains(&self.eccentricity) && self.semi_major_axis.is_finite()
    }
}

/// One entry of an `/orbitaldata` snapshot
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrackedObject {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ObjectKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<WirePosition>,
    #[serde(default)]
    pub size: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_hazardous: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub velocity_kps: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub miss_distance_km: Option<MissDistance>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orbital_elements: Option<AsteroidOrbitalElement>,
}

impl TrackedObject {
    /// Minimal discrete object, mostly useful for tests and demos
    pub fn new(id: impl Into<String>, kind: ObjectKind, position: DVec3, size: f64) -> Self {
        Self {
            id: id.into(),
            kind,
            position: Some(position.into()),
            size,
            name: None,
            status: None,
            is_hazardous: None,
            velocity_kps: None,
            miss_distance_km: None,
            orbital_elements: None,
        }
    }

    /// Bulk object carrying orbital elements instead of a position
    pub fn asteroid(id: impl Into<String>, elements: AsteroidOrbitalElement) -> Self {
        Self {
            id: id.into(),
            kind: ObjectKind::Asteroid,
            position: None,
            size: elements.size,
            name: None,
            status: None,
            is_hazardous: None,
            velocity_kps: None,
            miss_distance_km: None,
            orbital_elements: Some(elements),
        }
    }

    /// Name if the backend sent one, id otherwise
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }

    pub fn hazardous(&self) -> bool {
        self.is_hazardous.unwrap_or(false)
    }
}

/// Object with an individual, persistent representation
#[derive(Clone, Debug, PartialEq)]
pub struct DiscreteObject {
    pub position: DVec3,
    pub object: TrackedObject,
}

impl DiscreteObject {
    pub fn id(&self) -> &str {
        &self.object.id
    }

    pub fn kind(&self) -> ObjectKind {
        self.object.kind
    }

    pub fn size(&self) -> f64 {
        self.object.size
    }
}

/// Object drawn through the shared asteroid instance buffer
#[derive(Clone, Debug, PartialEq)]
pub struct BulkObject {
    pub id: String,
    pub elements: AsteroidOrbitalElement,
}

/// A full authoritative snapshot, split into discrete and bulk sets
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Snapshot {
    pub discrete: Vec<DiscreteObject>,
    pub bulk: Vec<BulkObject>,
    /// Entries that could not be placed in either set
    pub dropped: usize,
}

impl Snapshot {
    /// Partition raw snapshot entries.
    ///
    /// Discrete entries keep their first-seen order; a repeated id replaces the
    /// earlier entry in place. Discrete entries without a position and asteroids
    /// without closed orbital elements are dropped.
    pub fn partition(objects: Vec<TrackedObject>) -> Self {
        let mut snapshot = Snapshot::default();
        let mut index: HashMap<String, usize> = HashMap::new();

        for object in objects {
            if object.kind.is_bulk() {
                match object.orbital_elements {
                    Some(elements) if !elements.is_elliptic() => {
                        tracing::warn!(
                            "Asteroid {} has a non-elliptic orbit (e = {}), skipping",
                            object.id,
                            elements.eccentricity
                        );
                        snapshot.dropped += 1;
                    }
                    Some(mut elements) => {
                        elements.size = object.size;
                        snapshot.bulk.push(BulkObject { id: object.id, elements });
                    }
                    None => {
                        tracing::warn!("Asteroid {} has no orbital elements, skipping", object.id);
                        snapshot.dropped += 1;
                    }
                }
                continue;
            }

            let Some(position) = object.position else {
                tracing::warn!("{} {} has no position, skipping", object.kind, object.id);
                snapshot.dropped += 1;
                continue;
            };

            let entry = DiscreteObject {
                position: position.to_dvec3(),
                object,
            };

            match index.get(entry.id()) {
                Some(&slot) => snapshot.discrete[slot] = entry,
                None => {
                    index.insert(entry.id().to_string(), snapshot.discrete.len());
                    snapshot.discrete.push(entry);
                }
            }
        }

        snapshot
    }

    /// Decode an `/orbitaldata` body.
    ///
    /// Only a body that is not a JSON array is an error; entries that fail to
    /// decode are counted as dropped.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        let raw: Vec<serde_json::Value> = serde_json::from_str(json)?;
        Ok(Self::from_values(raw))
    }

    pub fn from_values(raw: Vec<serde_json::Value>) -> Self {
        let total = raw.len();
        let objects: Vec<TrackedObject> = raw
            .into_iter()
            .filter_map(|value| match serde_json::from_value(value) {
                Ok(object) => Some(object),
                Err(err) => {
                    tracing::warn!("Undecodable snapshot entry: {}", err);
                    None
                }
            })
            .collect();
        let undecodable = total - objects.len();

        let mut snapshot = Self::partition(objects);
        snapshot.dropped += undecodable;
        snapshot
    }

    pub fn discrete_ids(&self) -> impl Iterator<Item = &str> {
        self.discrete.iter().map(|d| d.id())
    }
}
