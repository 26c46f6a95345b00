pub mod fleet;

pub use fleet::{FeedConfig, FleetGenerator};
