//! Country border geometry.
//!
//! This module turns GeoJSON region documents into line-segment batches on
//! the surface of the globe.

mod document;
mod outline;
mod projection;

pub use document::RegionDocument;
pub use outline::{
    assemble_outlines, LineSegmentBatch, MalformedRingPolicy, OutlineBuilder, SegmentMode,
};
pub use projection::SphereProjection;
