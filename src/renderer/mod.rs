//! WebGPU rendering module
//!
//! Draws a simulation snapshot as flat-colored rectangles.

pub mod pipeline;
pub mod shapes;
pub mod vertex;

pub use pipeline::RenderState;
pub use vertex::Vertex;
