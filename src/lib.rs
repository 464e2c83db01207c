//! Scatter Coalesce - Point-Density Reduction for Association Scatter Plots
//!
//! This library reduces very large 2-D scatter data sets (such as genome-wide
//! association results, with position on one axis and significance on the other)
//! to a visually equivalent subset before rendering. Significant points are kept
//! as-is while clusters of redundant points are merged into weighted synthetic
//! points.
//!
//! # Architecture
//!
//! - **[`Quadtree`]**: Spatial index with one source point per leaf
//! - **[`CoalescePolicy`]**: Per-axis gap thresholds and inclusion bounds
//! - **[`Coalesced`]**: Output points, either pass-through originals or
//!   weighted synthetic stand-ins
//! - **[`Series`]**: Validated point storage with cached coordinates
//! - **[`ScatterCollection`]**: High-level manager for series and reductions
//!
//! # Performance Characteristics
//!
//! - **Build Time**: O(N log N) per series, parallelizable across series
//! - **Reduction Time**: sub-linear in dense regions (whole subtrees collapse
//!   without being visited)
//! - **Memory**: O(N) for raw data + O(N) for the index

mod coalesce;
mod collection;
mod point;
mod quadtree;
mod series;
pub mod utils;

// Public API exports
pub use coalesce::{
    AxisPolicy, CoalescePolicy, coalesce_sequential, coalesce_sequential_with,
    default_subtree_point,
};
pub use collection::{CollectionInfo, Config, ScatterCollection};
pub use point::{Coalesced, SyntheticPoint};
pub use quadtree::{Node, Quadtree, count_leaves};
pub use series::Series;

/// Error types for index construction and reduction
#[derive(Debug, thiserror::Error)]
pub enum ScatterError {
    #[error("invalid extent: {0}")]
    InvalidExtent(String),

    #[error("non-finite coordinate ({x}, {y}) at input index {index}")]
    NonFiniteCoordinate { index: usize, x: f64, y: f64 },

    #[error("point ({x}, {y}) at input index {index} lies outside the supplied extent")]
    OutOfExtent { index: usize, x: f64, y: f64 },
}

pub type Result<T> = std::result::Result<T, ScatterError>;
