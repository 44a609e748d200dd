/// Scene units per astronomical unit
pub const SCENE_SCALE_AU: f64 = 150.0;

/// Radius of the background starfield sphere (scene units)
pub const STARFIELD_RADIUS: f64 = 20_000.0;

/// Maximum number of instanced asteroids drawn per frame
pub const ASTEROID_CAPACITY: usize = 2000;

/// Satellite status string that flags an anomaly
pub const ANOMALY_STATUS: &str = "Anomaly Detected";

/// Texture catalog key for the background sphere
pub const STARFIELD_TEXTURE: &str = "starfield";

/// Texture catalog key for the ring drawn around Saturn
pub const SATURN_RING_TEXTURE: &str = "saturn_ring";
