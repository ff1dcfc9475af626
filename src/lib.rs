//! Map Edit Library - Spatial Index Core for Interactive Map Editing
//!
//! This library provides the data structures that back every interactive
//! operation of a map editor: hit-testing mouse clicks, collecting the
//! geometry visible in a viewport, and snapping to the nearest node or
//! street. The two central structures are a bucket PR-quadtree for
//! point-like entries ([`PointTree`]) and a per-zoom-level segment quadtree
//! ([`LineTree`]), fed by Douglas-Peucker polyline simplification
//! ([`simplify`]) at load time and complemented by a thread-safe LRU tile
//! cache ([`TileCache`]).
//!
//! # Architecture
//!
//! - **[`PointTree`]**: exclusive-partition quadtree for nodes and markers
//! - **[`LineTree`]**: replicated-insertion quadtree for street segments,
//!   one independent root per zoom level
//! - **[`simplify`]**: builds the reduced per-zoom geometry inserted into
//!   the line tree
//! - **[`TileCache`]**: bounds memory for loaded map tiles
//! - **[`RoadLayer`] / [`MarkerLayer`]**: the editable domain model that
//!   owns the indexed entities
//!
//! # Performance Characteristics
//!
//! - **Build Time**: O(N log N) per layer, per-street work parallelizable
//! - **Query Time**: O(log D + K) where D=depth, K=results
//! - **Memory**: O(N) entries for points, O(N x L) for segments replicated
//!   across L overlapping leaves

mod cache;
pub mod geom;
mod layer;
mod line_tree;
mod model;
mod point_tree;
mod simplify;
pub mod utils;

// Public API exports
pub use cache::TileCache;
pub use geom::{EPSILON, Point, Region};
pub use layer::{MarkerLayer, RoadLayer};
pub use line_tree::{Line, LineTree};
pub use model::{IdAllocator, Link, Marker, Node, ObjectId, Street, StreetKind};
pub use point_tree::{HasPosition, PointTree};
pub use simplify::{simplify, simplify_into};

/// Error types for the index core
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    #[error("position ({x}, {y}) is outside the indexed bounds")]
    OutOfBounds { x: f64, y: f64 },

    #[error("polyline needs at least 2 points, got {count}")]
    NotEnoughPoints { count: usize },

    #[error("zoom level {zoom} out of range (tree has {levels} levels)")]
    ZoomLevelOutOfRange { zoom: usize, levels: usize },
}

pub type Result<T> = std::result::Result<T, IndexError>;
