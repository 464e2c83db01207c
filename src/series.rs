//! Validated point storage with cached coordinates and a per-series index
//!
//! A [`Series`] owns one caller-supplied point collection. Coordinates are
//! extracted through the accessors exactly once at construction and cached,
//! and the spatial index is built over point *indices* so the raw points are
//! never copied.

use crate::coalesce::{CoalescePolicy, coalesce_sequential};
use crate::point::Coalesced;
use crate::quadtree::Quadtree;
use crate::{Result, ScatterError, utils};
use geo::{Coord, Rect};

/// One scatter data set, validated and spatially indexed
#[derive(Clone, Debug)]
pub struct Series<P> {
    /// Raw points in their original order
    points: Vec<P>,
    /// Cached coordinates, parallel to `points`
    coords: Vec<Coord<f64>>,
    /// Spatial index over indices into `points`
    quadtree: Quadtree<usize>,
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl<P> Series<P> {
    /// Create a series, rejecting non-finite coordinates
    ///
    /// # Errors
    /// - [`ScatterError::NonFiniteCoordinate`] if an accessor produces NaN or
    ///   an infinity
    /// - [`ScatterError::InvalidExtent`] if `points` is empty and an extent is
    ///   not supplied
    /// - [`ScatterError::OutOfExtent`] if a point lies outside a supplied
    ///   extent
    pub fn new<FX, FY>(
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
        profiling::scope!("series::new");

        let mut coords = Vec::with_capacity(points.len());
        for (index, point) in points.iter().enumerate() {
            let x = x_accessor(point);
            let y = y_accessor(point);
            if !utils::is_finite_pair(x, y) {
                return Err(ScatterError::NonFiniteCoordinate { index, x, y });
            }
            coords.push(Coord { x, y });
        }

        Self::from_validated(points, coords, x_extent, y_extent)
    }

    /// Create a series, dropping non-finite coordinates with a warning
    ///
    /// The lenient counterpart of [`Series::new`] for callers with dirty
    /// upstream data; every dropped point is logged.
    pub fn new_lossy<FX, FY>(
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
        profiling::scope!("series::new_lossy");

        let mut kept = Vec::with_capacity(points.len());
        let mut coords = Vec::with_capacity(points.len());
        for (index, point) in points.into_iter().enumerate() {
            let x = x_accessor(&point);
            let y = y_accessor(&point);
            if !utils::is_finite_pair(x, y) {
                tracing::warn!("dropping point with non-finite coordinates ({x}, {y}) at index {index}");
                continue;
            }
            kept.push(point);
            coords.push(Coord { x, y });
        }

        Self::from_validated(kept, coords, x_extent, y_extent)
    }

    fn from_validated(
        points: Vec<P>,
        coords: Vec<Coord<f64>>,
        x_extent: Option<(f64, f64)>,
        y_extent: Option<(f64, f64)>,
    ) -> Result<Self> {
        let indices: Vec<usize> = (0..points.len()).collect();
        let quadtree = Quadtree::build_with_extents(
            indices,
            |i: &usize| coords[*i].x,
            |i: &usize| coords[*i].y,
            x_extent,
            y_extent,
        )?;

        Ok(Self {
            points,
            coords,
            quadtree,
        })
    }

    /// Number of points in the series
    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// True if the series holds no points
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Extent covered by the series' index
    #[inline]
    pub fn bounds(&self) -> Rect<f64> {
        self.quadtree.bounds()
    }

    /// Raw points in their original order
    #[inline]
    pub fn points(&self) -> &[P] {
        &self.points
    }

    /// Cached coordinates, parallel to [`Series::points`]
    #[inline]
    pub fn coords(&self) -> &[Coord<f64>] {
        &self.coords
    }

    /// The spatial index over indices into [`Series::points`]
    #[inline]
    pub fn quadtree(&self) -> &Quadtree<usize> {
        &self.quadtree
    }

    /// Reduce via the spatial index (indexed mode)
    ///
    /// Output ordering is index-structural; re-sort if the renderer needs
    /// x-ascending output.
    pub fn reduce(&self, policy: &CoalescePolicy) -> Vec<Coalesced<&P>> {
        #[cfg(feature = "profiling")]
        profiling::scope!("series::reduce");

        let reduced = self.quadtree.coalesce(policy);
        let out = reduced
            .into_iter()
            .map(|item| match item {
                Coalesced::Original(i) => Coalesced::Original(&self.points[*i]),
                Coalesced::Synthetic(s) => Coalesced::Synthetic(s),
            })
            .collect::<Vec<_>>();
        tracing::debug!(
            input = self.points.len(),
            output = out.len(),
            "reduced series via spatial index"
        );
        out
    }

    /// Reduce by scanning points in their stored order (flat-sequence mode)
    ///
    /// Appropriate when the points were supplied pre-sorted along a
    /// meaningful axis, such as association data ordered by genomic position.
    pub fn reduce_sequential(&self, policy: &CoalescePolicy) -> Vec<Coalesced<&P>> {
        #[cfg(feature = "profiling")]
        profiling::scope!("series::reduce_sequential");

        let reduced = coalesce_sequential(
            0..self.points.len(),
            |i| self.coords[*i].x,
            |i| self.coords[*i].y,
            policy,
        );
        reduced
            .into_iter()
            .map(|item| match item {
                Coalesced::Original(i) => Coalesced::Original(&self.points[i]),
                Coalesced::Synthetic(s) => Coalesced::Synthetic(s),
            })
            .collect()
    }
}
