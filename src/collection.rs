//! ScatterCollection - Top-level manager for series, indices, and reductions
//!
//! This module provides the high-level API for managing multiple scatter
//! series (e.g. one per plot panel), building their spatial indices, and
//! running density reductions against a shared policy.

use crate::coalesce::CoalescePolicy;
use crate::point::Coalesced;
use crate::series::Series;
use crate::{AxisPolicy, Result, utils};

use geo::Rect;
use rayon::prelude::*;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Configuration for the scatter collection
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Config {
    /// Coalescing policy applied by [`ScatterCollection::reduce`] and friends.
    /// The default merges only exactly overlapping adjacent markers (a
    /// flat-mode dedup; index boxes always have positive span, so indexed
    /// reductions are a no-op until the gaps are widened to match the
    /// viewport's pixel resolution).
    pub policy: CoalescePolicy,
    /// Explicit x extent for the per-series indices; inferred from each
    /// series' data when absent
    pub x_extent: Option<(f64, f64)>,
    /// Explicit y extent for the per-series indices; inferred from each
    /// series' data when absent
    pub y_extent: Option<(f64, f64)>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            policy: CoalescePolicy::new(
                AxisPolicy::coincident_only(),
                AxisPolicy::coincident_only(),
            ),
            x_extent: None,
            y_extent: None,
        }
    }
}

/// Information about the scatter collection
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CollectionInfo {
    /// Number of series loaded
    pub series_count: usize,
    /// Total number of points across all series
    pub total_points: usize,
    /// Combined extent of all series, `None` when empty
    pub extent: Option<Rect<f64>>,
}

/// Cached statistics for the collection
///
/// These are updated incrementally when series are added, avoiding
/// recalculation on every query.
#[derive(Debug, Clone, Default)]
struct CachedStats {
    /// Total number of points across all series
    total_points: usize,
    /// Combined extent of all series (None if empty)
    extent: Option<Rect<f64>>,
}

/// Top-level manager for all series and reductions
#[derive(Clone, Debug)]
pub struct ScatterCollection<P> {
    /// All loaded series
    series: Vec<Series<P>>,
    /// Configuration settings
    config: Config,
    /// Cached statistics (incrementally updated)
    cached_stats: CachedStats,
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl<P> ScatterCollection<P> {
    /// Create a new scatter collection with the given configuration
    pub fn new(config: Config) -> Self {
        Self {
            series: Vec::new(),
            config,
            cached_stats: CachedStats::default(),
        }
    }

    /// Add a series to the collection
    ///
    /// Validates the points, builds the series' spatial index, and updates
    /// the cached statistics. Returns the new series' index.
    pub fn add_series<FX, FY>(
        &mut self,
        points: Vec<P>,
        x_accessor: FX,
        y_accessor: FY,
    ) -> Result<usize>
    where
        FX: Fn(&P) -> f64,
        FY: Fn(&P) -> f64,
    {
        #[cfg(feature = "profiling")]
        profiling::scope!("collection::add_series");

        let series = Series::new(
            points,
            x_accessor,
            y_accessor,
            self.config.x_extent,
            self.config.y_extent,
        )?;
        self.update_stats_for_added_series(&series);
        self.series.push(series);
        Ok(self.series.len() - 1)
    }

    /// Add multiple series in parallel
    ///
    /// More efficient than adding series one by one since validation and
    /// index construction are parallelized across series.
    pub fn add_series_parallel<FX, FY>(
        &mut self,
        batches: Vec<Vec<P>>,
        x_accessor: FX,
        y_accessor: FY,
    ) -> Result<()>
    where
        P: Send + Sync,
        FX: Fn(&P) -> f64 + Sync,
        FY: Fn(&P) -> f64 + Sync,
    {
        #[cfg(feature = "profiling")]
        profiling::scope!("collection::add_series_parallel");

        let (x_extent, y_extent) = (self.config.x_extent, self.config.y_extent);
        let built: Result<Vec<Series<P>>> = batches
            .into_par_iter()
            .map(|points| Series::new(points, &x_accessor, &y_accessor, x_extent, y_extent))
            .collect();

        for series in built? {
            self.update_stats_for_added_series(&series);
            self.series.push(series);
        }
        Ok(())
    }

    /// Reduce one series via its spatial index
    ///
    /// Returns `None` for an out-of-range index.
    #[inline]
    pub fn reduce(&self, index: usize) -> Option<Vec<Coalesced<&P>>> {
        let series = self.series.get(index)?;
        Some(series.reduce(&self.config.policy))
    }

    /// Reduce one series by scanning it in stored order (flat-sequence mode)
    ///
    /// Returns `None` for an out-of-range index.
    #[inline]
    pub fn reduce_sequential(&self, index: usize) -> Option<Vec<Coalesced<&P>>> {
        let series = self.series.get(index)?;
        Some(series.reduce_sequential(&self.config.policy))
    }

    /// Reduce every series in parallel
    ///
    /// Each series reduces independently; results come back in series order.
    pub fn reduce_all(&self) -> Vec<Vec<Coalesced<&P>>>
    where
        P: Sync,
    {
        #[cfg(feature = "profiling")]
        profiling::scope!("collection::reduce_all");

        self.series
            .par_iter()
            .map(|series| series.reduce(&self.config.policy))
            .collect()
    }

    /// Get total number of series
    #[inline]
    pub fn series_count(&self) -> usize {
        self.series.len()
    }

    /// Get total number of points across all series
    ///
    /// This is O(1) as the value is cached and updated incrementally.
    #[inline]
    pub fn total_points(&self) -> usize {
        self.cached_stats.total_points
    }

    /// Combined extent of all series, `None` when the collection is empty
    ///
    /// This is O(1) as the extent is cached and updated incrementally.
    #[inline]
    pub fn extent(&self) -> Option<Rect<f64>> {
        self.cached_stats.extent
    }

    /// Get collection information
    #[inline]
    pub fn get_info(&self) -> CollectionInfo {
        CollectionInfo {
            series_count: self.series.len(),
            total_points: self.cached_stats.total_points,
            extent: self.cached_stats.extent,
        }
    }

    /// Get a reference to the configuration
    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get a reference to a specific series by index
    #[inline]
    pub fn get_series(&self, index: usize) -> Option<&Series<P>> {
        self.series.get(index)
    }

    /// Check if the collection is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Clear all series from the collection
    pub fn clear(&mut self) {
        self.series.clear();
        self.cached_stats = CachedStats::default();
    }

    /// Update cached statistics when a series is added
    fn update_stats_for_added_series(&mut self, series: &Series<P>) {
        self.cached_stats.total_points += series.len();

        if series.is_empty() {
            return;
        }
        let bounds = series.bounds();
        self.cached_stats.extent = Some(match self.cached_stats.extent {
            Some(extent) => utils::rect_union(extent, bounds),
            None => bounds,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::Coord;

    fn create_test_points(count: usize, base_x: f64, base_y: f64) -> Vec<(f64, f64)> {
        (0..count)
            .map(|i| (base_x + i as f64, base_y + (i % 7) as f64 * 0.1))
            .collect()
    }

    fn x_of(p: &(f64, f64)) -> f64 {
        p.0
    }

    fn y_of(p: &(f64, f64)) -> f64 {
        p.1
    }

    #[test]
    fn test_collection_creation() {
        let collection: ScatterCollection<(f64, f64)> = ScatterCollection::new(Config::default());
        assert_eq!(collection.series_count(), 0);
        assert!(collection.is_empty());
        assert!(collection.extent().is_none());
    }

    #[test]
    fn test_config_default_merges_only_coincident() {
        let config = Config::default();
        assert_eq!(config.policy.x.gap, 0.0);
        assert_eq!(config.policy.y.gap, 0.0);
        assert!(config.x_extent.is_none());
    }

    #[test]
    fn test_add_series() {
        let mut collection = ScatterCollection::new(Config::default());
        let index = collection
            .add_series(create_test_points(100, 0.0, 0.0), x_of, y_of)
            .unwrap();
        assert_eq!(index, 0);
        assert_eq!(collection.series_count(), 1);
        assert_eq!(collection.total_points(), 100);
        assert!(!collection.is_empty());
    }

    #[test]
    fn test_add_series_parallel() {
        let mut collection = ScatterCollection::new(Config::default());
        let batches: Vec<Vec<(f64, f64)>> = (0..10)
            .map(|i| create_test_points(100, i as f64 * 1000.0, 0.0))
            .collect();
        collection.add_series_parallel(batches, x_of, y_of).unwrap();
        assert_eq!(collection.series_count(), 10);
        assert_eq!(collection.total_points(), 1000);
    }

    #[test]
    fn test_add_series_propagates_validation_errors() {
        let mut collection = ScatterCollection::new(Config::default());
        let result = collection.add_series(vec![(0.0, f64::NAN)], x_of, y_of);
        assert!(result.is_err());
        // A failed add leaves the collection untouched.
        assert_eq!(collection.series_count(), 0);
        assert_eq!(collection.total_points(), 0);
    }

    #[test]
    fn test_incremental_extent_union() {
        let mut collection = ScatterCollection::new(Config::default());
        collection
            .add_series(vec![(0.0, 0.0), (10.0, 10.0)], x_of, y_of)
            .unwrap();
        let first = collection.extent().unwrap();
        assert_eq!(first.max(), Coord { x: 10.0, y: 10.0 });

        collection
            .add_series(vec![(-5.0, 3.0), (20.0, 4.0)], x_of, y_of)
            .unwrap();
        let combined = collection.extent().unwrap();
        assert_eq!(combined.min(), Coord { x: -5.0, y: 0.0 });
        assert_eq!(combined.max(), Coord { x: 20.0, y: 10.0 });
    }

    #[test]
    fn test_default_policy_merges_duplicate_markers() {
        // In flat mode the zero-gap default collapses adjacent coincident
        // points; the distinct one survives.
        let mut collection = ScatterCollection::new(Config::default());
        collection
            .add_series(vec![(1.0, 1.0), (1.0, 1.0), (5.0, 5.0)], x_of, y_of)
            .unwrap();

        let out = collection.reduce_sequential(0).unwrap();
        let total: usize = out.iter().map(Coalesced::weight).sum();
        assert_eq!(total, 3);
        assert_eq!(out.iter().filter(|c| c.is_synthetic()).count(), 1);
    }

    #[test]
    fn test_reduce_all_matches_per_series_reduce() {
        let mut collection = ScatterCollection::new(Config::default());
        for i in 0..4 {
            collection
                .add_series(create_test_points(50, i as f64 * 100.0, 0.0), x_of, y_of)
                .unwrap();
        }

        let all = collection.reduce_all();
        assert_eq!(all.len(), 4);
        for (i, reduced) in all.iter().enumerate() {
            let single = collection.reduce(i).unwrap();
            assert_eq!(reduced.len(), single.len());
            let total: usize = reduced.iter().map(Coalesced::weight).sum();
            assert_eq!(total, 50);
        }
    }

    #[test]
    fn test_reduce_out_of_range() {
        let collection: ScatterCollection<(f64, f64)> = ScatterCollection::new(Config::default());
        assert!(collection.reduce(0).is_none());
        assert!(collection.reduce_sequential(0).is_none());
    }

    #[test]
    fn test_get_info() {
        let mut collection = ScatterCollection::new(Config::default());
        collection
            .add_series(create_test_points(25, 0.0, 0.0), x_of, y_of)
            .unwrap();

        let info = collection.get_info();
        assert_eq!(info.series_count, 1);
        assert_eq!(info.total_points, 25);
        assert!(info.extent.is_some());
    }

    #[test]
    fn test_get_series() {
        let mut collection = ScatterCollection::new(Config::default());
        collection
            .add_series(create_test_points(5, 0.0, 0.0), x_of, y_of)
            .unwrap();
        assert!(collection.get_series(0).is_some());
        assert!(collection.get_series(1).is_none());
    }

    #[test]
    fn test_clear() {
        let mut collection = ScatterCollection::new(Config::default());
        collection
            .add_series(create_test_points(10, 0.0, 0.0), x_of, y_of)
            .unwrap();
        assert_eq!(collection.series_count(), 1);

        collection.clear();
        assert_eq!(collection.series_count(), 0);
        assert!(collection.is_empty());
        assert_eq!(collection.total_points(), 0);
        assert!(collection.extent().is_none());
    }

    #[test]
    fn test_shared_extent_config() {
        // With a fixed extent every series indexes the same region, so
        // per-series reductions are comparable across panels.
        let config = Config {
            x_extent: Some((0.0, 1000.0)),
            y_extent: Some((0.0, 100.0)),
            ..Config::default()
        };
        let mut collection = ScatterCollection::new(config);
        collection
            .add_series(vec![(10.0, 5.0), (900.0, 50.0)], x_of, y_of)
            .unwrap();
        let series = collection.get_series(0).unwrap();
        assert_eq!(series.bounds().max(), Coord { x: 1000.0, y: 100.0 });

        // A point outside the shared extent is rejected.
        let result = collection.add_series(vec![(2000.0, 5.0)], x_of, y_of);
        assert!(result.is_err());
    }
}
