pub mod belt;
pub mod clock;
pub mod elements;

pub use belt::{generate_belt, BeltConfig};
pub use clock::{rates, OrbitClock};
pub use elements::OrbitModel;
