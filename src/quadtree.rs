//! Quadtree spatial index over 2-D scatter points
//!
//! This module provides the point quadtree used by the indexed reduction mode.
//! Each internal node owns a bounding box and up to four quadrant children;
//! each leaf owns exactly one source point. The tree is built once from an
//! immutable input collection and never mutated afterwards.

use crate::{Result, ScatterError, utils};
use geo::{Coord, Rect};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Maximum subdivision depth to prevent unbounded recursion
///
/// Coincident points (and points closer than ~extent * 2^-32 apart) collide
/// in the same quadrant at every level; at this depth they are parked in free
/// sibling slots instead of splitting further, so the wrapping boxes stay
/// small enough for any realistic gap threshold to collapse them.
const MAX_DEPTH: u32 = 32;

/// A single node of the spatial index
///
/// Quadrant slots are explicit options; a slot may legitimately be absent, and
/// coincident input points may occupy slots outside their true quadrant.
/// Traversals must treat absent slots uniformly as contributing zero leaves.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Node<P> {
    /// Terminal node owning one source point and its extracted coordinates
    Leaf { point: P, x: f64, y: f64 },
    /// Branch node owning a bounding box and its quadrant children
    /// (NW, NE, SW, SE order)
    Internal {
        bounds: Rect<f64>,
        children: [Option<Box<Node<P>>>; 4],
    },
}

impl<P> Node<P> {
    /// Number of leaves reachable from this node
    pub fn leaf_count(&self) -> usize {
        match self {
            Self::Leaf { .. } => 1,
            Self::Internal { children, .. } => children
                .iter()
                .map(|child| count_leaves(child.as_deref()))
                .sum(),
        }
    }

    /// Bounding box of this node; leaves carry no box of their own
    #[inline]
    pub fn bounding_box(&self) -> Option<Rect<f64>> {
        match self {
            Self::Leaf { .. } => None,
            Self::Internal { bounds, .. } => Some(*bounds),
        }
    }

    /// Quadrant children of an internal node
    #[inline]
    pub fn children(&self) -> Option<&[Option<Box<Node<P>>>; 4]> {
        match self {
            Self::Leaf { .. } => None,
            Self::Internal { children, .. } => Some(children),
        }
    }
}

/// Count leaves below a possibly-absent node reference
///
/// Absent references contribute zero, so sparse and irregular trees traverse
/// without special cases.
pub fn count_leaves<P>(node: Option<&Node<P>>) -> usize {
    match node {
        None => 0,
        Some(node) => node.leaf_count(),
    }
}

/// Spatial index over an immutable point collection
///
/// Built via [`Quadtree::build`] (extent inferred from the data) or
/// [`Quadtree::build_with_extents`] (caller-supplied per-axis extents).
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Quadtree<P> {
    root: Option<Box<Node<P>>>,
    bounds: Rect<f64>,
    len: usize,
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl<P> Quadtree<P> {
    /// Build an index over `points`, inferring the extent per axis from the
    /// data min/max
    ///
    /// # Errors
    /// - [`ScatterError::InvalidExtent`] if `points` is empty (min/max are
    ///   undefined there)
    /// - [`ScatterError::NonFiniteCoordinate`] if an accessor produces NaN or
    ///   an infinity
    pub fn build<FX, FY>(points: Vec<P>, x_accessor: FX, y_accessor: FY) -> Result<Self>
    where
        FX: Fn(&P) -> f64,
        FY: Fn(&P) -> f64,
    {
        Self::build_with_extents(points, x_accessor, y_accessor, None, None)
    }

    /// Build an index over `points` with optional explicit per-axis extents
    ///
    /// An empty input is valid when both extents are supplied and yields an
    /// empty index. Points outside a supplied extent are rejected with
    /// [`ScatterError::OutOfExtent`] rather than silently mis-placed.
    pub fn build_with_extents<FX, FY>(
        points: Vec<P>,
        x_accessor: FX,
        y_accessor: FY,
        x_extent: Option<(f64, f64)>,
        y_extent: Option<(f64, f64)>,
    ) -> Result<Self>
    where
        FX: Fn(&P) -> f64,
        FY: Fn(&P) -> f64,
    {
        #[cfg(feature = "profiling")]
        profiling::scope!("quadtree::build");

        // Extract and validate all coordinates up front so no partial index
        // is ever returned.
        let mut coords = Vec::with_capacity(points.len());
        for (index, point) in points.iter().enumerate() {
            let x = x_accessor(point);
            let y = y_accessor(point);
            if !utils::is_finite_pair(x, y) {
                return Err(ScatterError::NonFiniteCoordinate { index, x, y });
            }
            coords.push(Coord { x, y });
        }

        let (x_lo, x_hi) = resolve_extent("x", x_extent, coords.iter().map(|c| c.x))?;
        let (y_lo, y_hi) = resolve_extent("y", y_extent, coords.iter().map(|c| c.y))?;
        let bounds = Rect::new(Coord { x: x_lo, y: y_lo }, Coord { x: x_hi, y: y_hi });

        // Inferred extents contain the data by construction; only supplied
        // ones can exclude a point.
        if x_extent.is_some() || y_extent.is_some() {
            for (index, coord) in coords.iter().enumerate() {
                if !utils::rect_contains(&bounds, coord.x, coord.y) {
                    return Err(ScatterError::OutOfExtent {
                        index,
                        x: coord.x,
                        y: coord.y,
                    });
                }
            }
        }

        let len = points.len();
        let mut root: Option<Box<Node<P>>> = None;
        for (point, coord) in points.into_iter().zip(coords) {
            insert(&mut root, point, coord.x, coord.y, bounds, 0);
        }

        tracing::debug!(points = len, "built quadtree index");
        Ok(Self { root, bounds, len })
    }

    /// Root node, absent for an empty index
    #[inline]
    pub fn root(&self) -> Option<&Node<P>> {
        self.root.as_deref()
    }

    /// Extent covered by the index
    #[inline]
    pub fn bounds(&self) -> Rect<f64> {
        self.bounds
    }

    /// Number of indexed points
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// True if the index holds no points
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Recount leaves by walking the tree
    ///
    /// Always equals [`Quadtree::len`]; exposed as a structural diagnostic.
    pub fn leaf_count(&self) -> usize {
        count_leaves(self.root())
    }
}

/// Resolve one axis extent: validate a supplied range or infer it from values
fn resolve_extent(
    axis: &str,
    supplied: Option<(f64, f64)>,
    values: impl Iterator<Item = f64>,
) -> Result<(f64, f64)> {
    match supplied {
        Some((lo, hi)) => {
            if !lo.is_finite() || !hi.is_finite() || lo > hi {
                return Err(ScatterError::InvalidExtent(format!(
                    "supplied {axis} extent [{lo}, {hi}] is not a finite min/max range"
                )));
            }
            Ok((lo, hi))
        }
        None => utils::axis_range(values).ok_or_else(|| {
            ScatterError::InvalidExtent(format!(
                "cannot infer {axis} extent from an empty point collection"
            ))
        }),
    }
}

/// Quadrant slot index for a coordinate within `bounds` (NW, NE, SW, SE)
///
/// Points exactly on a midline resolve east/north, so every point has a
/// unique quadrant.
fn quadrant(bounds: &Rect<f64>, x: f64, y: f64) -> usize {
    let mid_x = (bounds.min().x + bounds.max().x) / 2.0;
    let mid_y = (bounds.min().y + bounds.max().y) / 2.0;
    let east = x >= mid_x;
    let north = y >= mid_y;
    match (east, north) {
        (false, true) => 0,  // NW
        (true, true) => 1,   // NE
        (false, false) => 2, // SW
        (true, false) => 3,  // SE
    }
}

/// Bounding box of quadrant slot `q` of `bounds`
///
/// The four quadrant boxes exactly partition the parent box.
fn quadrant_bounds(bounds: &Rect<f64>, q: usize) -> Rect<f64> {
    let min = bounds.min();
    let max = bounds.max();
    let mid_x = (min.x + max.x) / 2.0;
    let mid_y = (min.y + max.y) / 2.0;

    match q {
        0 => Rect::new(Coord { x: min.x, y: mid_y }, Coord { x: mid_x, y: max.y }),
        1 => Rect::new(Coord { x: mid_x, y: mid_y }, Coord { x: max.x, y: max.y }),
        2 => Rect::new(Coord { x: min.x, y: min.y }, Coord { x: mid_x, y: mid_y }),
        _ => Rect::new(Coord { x: mid_x, y: min.y }, Coord { x: max.x, y: mid_y }),
    }
}

/// Insert one point below `slot`, splitting leaves on collision
fn insert<P>(
    slot: &mut Option<Box<Node<P>>>,
    point: P,
    x: f64,
    y: f64,
    bounds: Rect<f64>,
    depth: u32,
) {
    let Some(existing) = slot.take() else {
        *slot = Some(Box::new(Node::Leaf { point, x, y }));
        return;
    };

    match *existing {
        Node::Internal {
            bounds: node_bounds,
            mut children,
        } => {
            let q = quadrant(&node_bounds, x, y);
            let child_bounds = quadrant_bounds(&node_bounds, q);
            insert(&mut children[q], point, x, y, child_bounds, depth + 1);
            *slot = Some(Box::new(Node::Internal {
                bounds: node_bounds,
                children,
            }));
        }
        Node::Leaf {
            point: prev,
            x: prev_x,
            y: prev_y,
        } => {
            let mut children: [Option<Box<Node<P>>>; 4] = [None, None, None, None];

            if depth >= MAX_DEPTH {
                // Subdivision can no longer separate these points (coincident,
                // or closer than the subdivision floor). Keep the first in its
                // true quadrant and park the newcomer in a free sibling slot;
                // traversals tolerate slots outside their quadrant.
                let q = quadrant(&bounds, prev_x, prev_y);
                children[q] = Some(Box::new(Node::Leaf {
                    point: prev,
                    x: prev_x,
                    y: prev_y,
                }));
                let mut parked = Some(Box::new(Node::Leaf { point, x, y }));
                for child in children.iter_mut() {
                    if child.is_none() {
                        *child = parked.take();
                        break;
                    }
                }
            } else {
                let q_prev = quadrant(&bounds, prev_x, prev_y);
                insert(
                    &mut children[q_prev],
                    prev,
                    prev_x,
                    prev_y,
                    quadrant_bounds(&bounds, q_prev),
                    depth + 1,
                );
                let q_new = quadrant(&bounds, x, y);
                insert(
                    &mut children[q_new],
                    point,
                    x,
                    y,
                    quadrant_bounds(&bounds, q_new),
                    depth + 1,
                );
            }

            *slot = Some(Box::new(Node::Internal { bounds, children }));
        }
    }
}
