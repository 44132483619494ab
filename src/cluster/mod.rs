//! Connected nodes and their execution capacity.

pub mod capacity;
pub mod node;
pub mod registry;

pub use capacity::{CapacityTracker, SlotCounter};
pub use node::{ConnectionWrapper, WorkerNode};
pub use registry::NodeRegistry;
