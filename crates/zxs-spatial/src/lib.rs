pub mod hit;

pub use hit::{Element, SpatialIndex};
