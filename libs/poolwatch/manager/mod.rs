pub mod builder;
pub mod manager;

pub use builder::{NoSource, WatcherBuilder};
pub use manager::PositionManager;
