//! Maps a monotonic clock reading to orbital time

/// Orbital time clock with an adjustable rate.
///
/// The clock stores only an anchor pair and a rate, so every reading is a pure
/// function of the monotonic time passed in. Changing the rate re-anchors at
/// the current reading, which keeps orbital time continuous.
#[derive(Clone, Debug, PartialEq)]
pub struct OrbitClock {
    /// Monotonic reading (seconds) at the anchor
    anchor_real: f64,
    /// Orbital time at the anchor
    anchor_orbit: f64,
    /// Orbital time units per real second
    rate: f64,
}

impl OrbitClock {
    pub fn new(start_seconds: f64) -> Self {
        Self::with_rate(start_seconds, rates::DASHBOARD)
    }

    pub fn with_rate(start_seconds: f64, rate: f64) -> Self {
        Self {
            anchor_real: start_seconds,
            anchor_orbit: 0.0,
            rate: clamp_rate(rate),
        }
    }

    /// Orbital time at the given monotonic reading
    pub fn orbit_time(&self, now_seconds: f64) -> f64 {
        self.anchor_orbit + (now_seconds - self.anchor_real) * self.rate
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }

    /// Change the rate without a jump in orbital time
    pub fn set_rate(&mut self, now_seconds: f64, rate: f64) {
        self.anchor_orbit = self.orbit_time(now_seconds);
        self.anchor_real = now_seconds;
        self.rate = clamp_rate(rate);
        tracing::debug!("Orbit clock rate set to {:.4} units/s", self.rate);
    }
}

impl Default for OrbitClock {
    fn default() -> Self {
        Self::new(0.0)
    }
}

fn clamp_rate(rate: f64) -> f64 {
    if rate.is_finite() {
        rate.clamp(-1e6, 1e6)
    } else {
        rates::DASHBOARD
    }
}

/// Preset clock rates (orbital time units per real second)
pub mod rates {
    /// Default dashboard pace: one orbital unit every ten seconds
    pub const DASHBOARD: f64 = 0.1;
}
