pub mod preprocessing;
pub mod extraction;
pub mod geometry;
pub mod channels;

pub use preprocessing::*;
pub use extraction::*;
pub use geometry::*;
pub use channels::*;
