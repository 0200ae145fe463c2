//! Device-agnostic passes of the frame.

pub mod geometry;
pub mod screen_space;

pub use geometry::{render_geometry_pass, GeometryOutput};
pub use screen_space::{render_screen_space, Stage};
