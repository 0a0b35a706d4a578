//! Piecewise-quadratic approximations of neuron response curves.
//!
//! Everything here lives in normalised coordinates u = x / radius ∈ [−1, 1].

use crate::common::polynomial;

/// One quadratic piece on [lo, hi].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PolySegment {
    /// Left end.
    pub lo: f64,
    /// Right end.
    pub hi: f64,
    /// Ascending coefficients in u.
    pub coeffs: [f64; 3],
}

impl PolySegment {
    /// Value of the piece at `u` (no range check).
    pub fn eval(&self, u: f64) -> f64 {
        polynomial::eval(&self.coeffs, u)
    }
}

/// A polynomial on an interval, as seen by [`overlap_integral`].
pub(crate) trait Piece {
    fn bounds(&self) -> (f64, f64);
    fn coefficients(&self) -> &[f64];
}

impl Piece for PolySegment {
    fn bounds(&self) -> (f64, f64) {
        (self.lo, self.hi)
    }

    fn coefficients(&self) -> &[f64] {
        &self.coeffs
    }
}

/// Response curve of one neuron: zero outside its active domain, one
/// quadratic per segment inside it.
///
/// Segments are sorted, contiguous and cover [lo, hi] exactly. A neuron that
/// never fires on [−1, 1] has no segments and lo == hi.
#[derive(Debug, Clone, PartialEq)]
pub struct PiecewisePolynomialApprox {
    /// Encoder sign of the neuron.
    pub encoder: f64,
    /// Left end of the active domain.
    pub lo: f64,
    /// Right end of the active domain.
    pub hi: f64,
    /// Quadratic pieces, ascending.
    pub segments: Vec<PolySegment>,
}

impl PiecewisePolynomialApprox {
    /// Number of segments.
    pub fn n_segments(&self) -> usize {
        self.segments.len()
    }

    /// True when `u` lies in the active domain.
    pub fn is_active(&self, u: f64) -> bool {
        !self.segments.is_empty() && u >= self.lo && u <= self.hi
    }

    /// Approximate response at `u`; zero outside the active domain.
    pub fn eval(&self, u: f64) -> f64 {
        if !self.is_active(u) {
            return 0.0;
        }
        let idx = self.segments.partition_point(|s| s.hi < u);
        self.segments
            .get(idx)
            .or_else(|| self.segments.last())
            .map_or(0.0, |s| s.eval(u))
    }

    /// Exact ∫ self · other du over [−1, 1].
    pub fn inner_product(&self, other: &Self) -> f64 {
        overlap_integral(&self.segments, &other.segments)
    }
}

/// Exact integral of the product of two sorted piecewise polynomials,
/// each zero outside its pieces.
///
/// A two-pointer sweep over the pieces visits every overlap once.
pub(crate) fn overlap_integral<A: Piece, B: Piece>(a: &[A], b: &[B]) -> f64 {
    let (mut i, mut j) = (0, 0);
    let mut total = 0.0;
    while i < a.len() && j < b.len() {
        let (a_lo, a_hi) = a[i].bounds();
        let (b_lo, b_hi) = b[j].bounds();
        let (lo, hi) = (a_lo.max(b_lo), a_hi.min(b_hi));
        if hi > lo {
            let product = polynomial::mul(a[i].coefficients(), b[j].coefficients());
            total += polynomial::integrate(&product, lo, hi);
        }
        if a_hi < b_hi {
            i += 1;
        } else {
            j += 1;
        }
    }
    total
}
