pub mod accumulator;
pub mod features;
pub mod loader;
pub mod network;

pub use accumulator::Accumulator;
pub use features::{feature_index, FeatureUpdate, INPUTS};
pub use network::{install, network, Network, HIDDEN};
