pub mod config;
pub mod serialization;
pub mod units;

pub use config::{AgentOverride, AgentOverrides, ConversionConfig};
pub use units::{SpatialUnit, TimeUnit};
