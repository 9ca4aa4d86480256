pub mod asanas;
pub mod geometry;
pub mod registry;

pub use geometry::angle_between;
pub use registry::{PoseDefinition, PosePredicate, PoseRegistry};
