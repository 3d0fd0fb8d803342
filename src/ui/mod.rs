//! UI modules for the globe viewer.
//!
//! The whole window is a single canvas: the 3D globe drawn through an OpenGL
//! paint callback, with a small status overlay in the top-left corner.

mod canvas;

pub use canvas::render_canvas;
