//! Shared data model for the FleetBridge viewer.
//!
//! Everything the backend sends over the wire is described here, along with
//! the snapshot partitioning rules the scene engine relies on. No I/O lives in
//! this crate so it builds unchanged for native and wasm32 targets.

pub mod constants;
pub mod coordinates;
pub mod object;
pub mod wire;

pub use coordinates::WirePosition;
pub use object::{
    AsteroidOrbitalElement, BulkObject, DiscreteObject, MissDistance, ObjectKind, Snapshot,
    TrackedObject,
};
