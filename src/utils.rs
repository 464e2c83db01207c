//! Helpers for extents and coordinate validation

use geo::{Coord, Rect};

/// Check that both coordinates of a pair are finite (no NaN, no infinities)
#[inline(always)]
pub fn is_finite_pair(x: f64, y: f64) -> bool {
    x.is_finite() && y.is_finite()
}

/// Compute the bounding extent of a coordinate sequence
///
/// Returns `None` for an empty sequence, since min/max are undefined there.
pub fn extent_of(coords: &[Coord<f64>]) -> Option<Rect<f64>> {
    let first = coords.first()?;
    let mut min_x = first.x;
    let mut min_y = first.y;
    let mut max_x = first.x;
    let mut max_y = first.y;

    for coord in &coords[1..] {
        min_x = min_x.min(coord.x);
        min_y = min_y.min(coord.y);
        max_x = max_x.max(coord.x);
        max_y = max_y.max(coord.y);
    }

    Some(Rect::new(
        Coord { x: min_x, y: min_y },
        Coord { x: max_x, y: max_y },
    ))
}

/// Compute the min/max range of a value sequence, `None` if it is empty
pub fn axis_range(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    values.fold(None, |range, value| match range {
        None => Some((value, value)),
        Some((lo, hi)) => Some((lo.min(value), hi.max(value))),
    })
}

/// Smallest rectangle containing both inputs
pub fn rect_union(a: Rect<f64>, b: Rect<f64>) -> Rect<f64> {
    Rect::new(
        Coord {
            x: a.min().x.min(b.min().x),
            y: a.min().y.min(b.min().y),
        },
        Coord {
            x: a.max().x.max(b.max().x),
            y: a.max().y.max(b.max().y),
        },
    )
}

/// Check if a coordinate pair lies within a rectangle (boundary inclusive)
#[inline(always)]
pub fn rect_contains(rect: &Rect<f64>, x: f64, y: f64) -> bool {
    x >= rect.min().x && x <= rect.max().x && y >= rect.min().y && y <= rect.max().y
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_finite_pair() {
        assert!(is_finite_pair(0.0, -1.5));
        assert!(!is_finite_pair(f64::NAN, 0.0));
        assert!(!is_finite_pair(0.0, f64::INFINITY));
        assert!(!is_finite_pair(f64::NEG_INFINITY, f64::NAN));
    }

    #[test]
    fn test_extent_of() {
        let coords = vec![
            Coord { x: 2.0, y: -1.0 },
            Coord { x: -3.0, y: 4.0 },
            Coord { x: 0.5, y: 0.5 },
        ];
        let extent = extent_of(&coords).unwrap();
        assert_eq!(extent.min(), Coord { x: -3.0, y: -1.0 });
        assert_eq!(extent.max(), Coord { x: 2.0, y: 4.0 });
    }

    #[test]
    fn test_extent_of_empty() {
        assert!(extent_of(&[]).is_none());
    }

    #[test]
    fn test_extent_of_single_point_is_degenerate() {
        let coords = vec![Coord { x: 1.0, y: 2.0 }];
        let extent = extent_of(&coords).unwrap();
        assert_eq!(extent.min(), extent.max());
    }

    #[test]
    fn test_axis_range() {
        assert_eq!(axis_range([3.0, -1.0, 2.0].into_iter()), Some((-1.0, 3.0)));
        assert_eq!(axis_range(std::iter::empty()), None);
    }

    #[test]
    fn test_rect_union() {
        let a = Rect::new(Coord { x: 0.0, y: 0.0 }, Coord { x: 1.0, y: 1.0 });
        let b = Rect::new(Coord { x: -2.0, y: 0.5 }, Coord { x: 0.5, y: 3.0 });
        let u = rect_union(a, b);
        assert_eq!(u.min(), Coord { x: -2.0, y: 0.0 });
        assert_eq!(u.max(), Coord { x: 1.0, y: 3.0 });
    }

    #[test]
    fn test_rect_contains() {
        let rect = Rect::new(Coord { x: 0.0, y: 0.0 }, Coord { x: 10.0, y: 10.0 });
        assert!(rect_contains(&rect, 5.0, 5.0));
        assert!(rect_contains(&rect, 0.0, 10.0)); // boundary inclusive
        assert!(!rect_contains(&rect, -0.1, 5.0));
        assert!(!rect_contains(&rect, 5.0, 10.1));
    }
}
