//! Output point structures consumed by the rendering layer

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A synthetic point standing in for two or more merged source points
///
/// `weight` is the number of source points the synthetic point absorbed and is
/// always at least 2; downstream consumers use it to size or label markers.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SyntheticPoint {
    pub x: f64,
    pub y: f64,
    pub weight: usize,
}

impl SyntheticPoint {
    /// Create a new synthetic point
    pub fn new(x: f64, y: f64, weight: usize) -> Self {
        Self { x, y, weight }
    }
}

/// One element of a reduced output sequence
///
/// Either an untouched source point (all original fields preserved) or a
/// synthetic stand-in for a merged cluster. Renderers must handle both shapes
/// polymorphically when styling.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Coalesced<P> {
    /// A source point passed through unchanged, implicit weight 1
    Original(P),
    /// A merged cluster represented by one weighted point
    Synthetic(SyntheticPoint),
}

impl<P> Coalesced<P> {
    /// Number of source points this output element represents
    #[inline]
    pub fn weight(&self) -> usize {
        match self {
            Self::Original(_) => 1,
            Self::Synthetic(s) => s.weight,
        }
    }

    /// True for merged stand-ins, false for pass-through originals
    #[inline]
    pub fn is_synthetic(&self) -> bool {
        matches!(self, Self::Synthetic(_))
    }

    /// The source point, if this element is a pass-through
    #[inline]
    pub fn as_original(&self) -> Option<&P> {
        match self {
            Self::Original(p) => Some(p),
            Self::Synthetic(_) => None,
        }
    }

    /// The synthetic point, if this element is a merged stand-in
    #[inline]
    pub fn as_synthetic(&self) -> Option<&SyntheticPoint> {
        match self {
            Self::Original(_) => None,
            Self::Synthetic(s) => Some(s),
        }
    }
}
