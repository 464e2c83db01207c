//! Gap/bounds coalescing of scatter points
//!
//! Two traversal strategies share one decision rule ("is this span small
//! enough, and entirely inside the inclusion band, on both axes?"):
//!
//! - [`coalesce_sequential`] scans a pre-sorted flat sequence and merges each
//!   point into the previously emitted one while the rule holds, producing
//!   run centroids weighted by run length.
//! - [`Quadtree::coalesce`] walks the spatial index pre-order and collapses
//!   every admissible subtree into a single synthetic point without visiting
//!   its leaves.
//!
//! Points whose coordinates fall outside an axis inclusion band are
//! "significant": they are never merged away and they terminate the run or
//! subtree collapse around them.

use crate::point::{Coalesced, SyntheticPoint};
use crate::quadtree::{Node, Quadtree};
use geo::Rect;
use rayon::prelude::*;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Per-axis coalescing rule: a gap tolerance plus an inclusion band
///
/// `gap` may be infinite to disable the distance test on this axis; the
/// bounds test still applies. Bounds may be infinite to disable the band.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AxisPolicy {
    /// Maximum coordinate span that may still coalesce
    pub gap: f64,
    /// Lower edge of the inclusion band
    pub min: f64,
    /// Upper edge of the inclusion band
    pub max: f64,
}

impl AxisPolicy {
    /// Create a rule from a gap threshold and inclusion bounds
    pub fn new(gap: f64, min: f64, max: f64) -> Self {
        Self { gap, min, max }
    }

    /// A rule that never blocks coalescing on this axis
    pub fn unbounded() -> Self {
        Self {
            gap: f64::INFINITY,
            min: f64::NEG_INFINITY,
            max: f64::INFINITY,
        }
    }

    /// A rule that only admits exactly overlapping coordinates
    pub fn coincident_only() -> Self {
        Self {
            gap: 0.0,
            min: f64::NEG_INFINITY,
            max: f64::INFINITY,
        }
    }

    /// Whether two coordinates are close enough, and both inside the
    /// inclusion band, to coalesce on this axis
    ///
    /// Symmetric in its arguments: for ordered pairs this is the usual
    /// `|b - a| <= gap && a >= min && b <= max` span test.
    #[inline]
    pub fn admits(&self, a: f64, b: f64) -> bool {
        (b - a).abs() <= self.gap && a.min(b) >= self.min && a.max(b) <= self.max
    }
}

/// Full coalescing policy: one rule per axis, conjoined
///
/// A pair or region coalesces only if both the x and y rules hold.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CoalescePolicy {
    pub x: AxisPolicy,
    pub y: AxisPolicy,
}

impl CoalescePolicy {
    /// Create a policy from per-axis rules
    pub fn new(x: AxisPolicy, y: AxisPolicy) -> Self {
        Self { x, y }
    }

    /// Whether two points are mergeable under this policy
    #[inline]
    pub fn admits(&self, last_x: f64, last_y: f64, x: f64, y: f64) -> bool {
        self.x.admits(last_x, x) && self.y.admits(last_y, y)
    }

    /// Whether a whole region is collapsible under this policy
    #[inline]
    pub fn admits_region(&self, bounds: &Rect<f64>) -> bool {
        self.x.admits(bounds.min().x, bounds.max().x) && self.y.admits(bounds.min().y, bounds.max().y)
    }
}

/// Default merge rule for the flat mode: weighted running mean
///
/// Absorbing a point into a run moves the synthetic point to the centroid of
/// every point absorbed so far and bumps the weight by one, so a run of N
/// mergeable points ends as its arithmetic centroid with weight N.
fn merge_mean(last_x: f64, last_y: f64, last_weight: usize, x: f64, y: f64) -> SyntheticPoint {
    let w = last_weight as f64;
    SyntheticPoint {
        x: (last_x * w + x) / (w + 1.0),
        y: (last_y * w + y) / (w + 1.0),
        weight: last_weight + 1,
    }
}

/// Coalesce an ordered flat sequence of points
///
/// The caller is responsible for presenting points pre-sorted along a
/// meaningful axis (typically x ascending); this mode does no spatial
/// reasoning beyond adjacency. Each point is compared against the last
/// *emitted* point only: a strictly two-element sliding comparison.
pub fn coalesce_sequential<P, FX, FY>(
    points: impl IntoIterator<Item = P>,
    x_accessor: FX,
    y_accessor: FY,
    policy: &CoalescePolicy,
) -> Vec<Coalesced<P>>
where
    FX: Fn(&P) -> f64,
    FY: Fn(&P) -> f64,
{
    coalesce_sequential_with(points, x_accessor, y_accessor, policy, merge_mean)
}

/// Flat-sequence coalescing with a caller-supplied merge rule
///
/// `merge` receives `(last_x, last_y, last_weight, current_x, current_y)` and
/// returns the synthetic point replacing the pair; `last_weight` is 1 when the
/// last emitted point was an original.
pub fn coalesce_sequential_with<P, FX, FY, M>(
    points: impl IntoIterator<Item = P>,
    x_accessor: FX,
    y_accessor: FY,
    policy: &CoalescePolicy,
    merge: M,
) -> Vec<Coalesced<P>>
where
    FX: Fn(&P) -> f64,
    FY: Fn(&P) -> f64,
    M: Fn(f64, f64, usize, f64, f64) -> SyntheticPoint,
{
    let mut out: Vec<Coalesced<P>> = Vec::new();

    for point in points {
        let x = x_accessor(&point);
        let y = y_accessor(&point);

        // The explicit accumulator: coordinates and weight of the last
        // emitted point, absent before the first emission.
        let last = match out.last() {
            Some(Coalesced::Original(p)) => Some((x_accessor(p), y_accessor(p), 1)),
            Some(Coalesced::Synthetic(s)) => Some((s.x, s.y, s.weight)),
            None => None,
        };

        match last {
            Some((last_x, last_y, last_weight)) if policy.admits(last_x, last_y, x, y) => {
                out.pop();
                out.push(Coalesced::Synthetic(merge(last_x, last_y, last_weight, x, y)));
            }
            _ => out.push(Coalesced::Original(point)),
        }
    }

    out
}

/// Default synthetic-point constructor for a collapsed subtree
///
/// Position is half the box span per axis (the offset convention the
/// downstream renderer expects); weight is the subtree's leaf count.
pub fn default_subtree_point<P>(node: &Node<P>, bounds: Rect<f64>) -> SyntheticPoint {
    SyntheticPoint {
        x: (bounds.max().x - bounds.min().x) / 2.0,
        y: (bounds.max().y - bounds.min().y) / 2.0,
        weight: node.leaf_count(),
    }
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl<P> Quadtree<P> {
    /// Reduce the index with the default synthetic-point constructor
    ///
    /// Pre-order traversal: leaves are always emitted unchanged; an internal
    /// node whose box is admissible collapses into exactly one synthetic
    /// point and its subtree is not visited. Result ordering is
    /// index-structural, not x-ascending; re-sort if needed.
    pub fn coalesce(&self, policy: &CoalescePolicy) -> Vec<Coalesced<&P>> {
        self.coalesce_with(policy, default_subtree_point)
    }

    /// Reduce the index with a caller-supplied synthetic-point constructor
    ///
    /// `make_synthetic` receives the collapsing node and its bounding box and
    /// may compute any representative point (e.g. the true box center) while
    /// reusing the traversal and decision logic.
    pub fn coalesce_with<F>(&self, policy: &CoalescePolicy, make_synthetic: F) -> Vec<Coalesced<&P>>
    where
        F: Fn(&Node<P>, Rect<f64>) -> SyntheticPoint,
    {
        #[cfg(feature = "profiling")]
        profiling::scope!("quadtree::coalesce");

        let mut out = Vec::new();
        if let Some(root) = self.root() {
            walk(root, policy, &make_synthetic, &mut out);
        }
        out
    }

    /// Reduce the index in parallel, fanning out over the root's subtrees
    ///
    /// Each subtree's collapse decisions are independent and side-effect
    /// free, so the only synchronization point is concatenating the per-child
    /// outputs back in child order. The result is identical to
    /// [`Quadtree::coalesce`].
    pub fn coalesce_par(&self, policy: &CoalescePolicy) -> Vec<Coalesced<&P>>
    where
        P: Sync,
    {
        #[cfg(feature = "profiling")]
        profiling::scope!("quadtree::coalesce_par");

        match self.root() {
            Some(Node::Internal { bounds, children }) if !policy.admits_region(bounds) => {
                let per_child: Vec<Vec<Coalesced<&P>>> = children
                    .par_iter()
                    .map(|child| {
                        let mut out = Vec::new();
                        if let Some(node) = child.as_deref() {
                            walk(node, policy, &default_subtree_point, &mut out);
                        }
                        out
                    })
                    .collect();
                per_child.into_iter().flatten().collect()
            }
            // Leaf root, collapsible root, or empty index: nothing to fan out.
            _ => self.coalesce(policy),
        }
    }
}

/// Pre-order descent with early termination on collapse
fn walk<'a, P, F>(
    node: &'a Node<P>,
    policy: &CoalescePolicy,
    make_synthetic: &F,
    out: &mut Vec<Coalesced<&'a P>>,
) where
    F: Fn(&Node<P>, Rect<f64>) -> SyntheticPoint,
{
    match node {
        // Leaves are never coalesced away on their own.
        Node::Leaf { point, .. } => out.push(Coalesced::Original(point)),
        Node::Internal { bounds, children } => {
            if policy.admits_region(bounds) {
                out.push(Coalesced::Synthetic(make_synthetic(node, *bounds)));
            } else {
                // Absent slots contribute zero leaves and are skipped.
                for child in children.iter() {
                    if let Some(child) = child.as_deref() {
                        walk(child, policy, make_synthetic, out);
                    }
                }
            }
        }
    }
}
