pub mod config;
pub mod math;
pub mod rng;
pub mod transposition_hash;

pub use config::*;
pub use math::*;
pub use rng::*;
pub use transposition_hash::*;
