//! Target functions for decoder solves.

use crate::common::polynomial;
use crate::decode::error::{DecodeError, DecodeResult};
use crate::decode::piecewise::Piece;
use std::fmt;
use std::sync::Arc;

/// A scalar function of the represented value x.
#[derive(Clone)]
pub enum TargetFunction {
    /// Ascending coefficients in x.
    Polynomial(Vec<f64>),
    /// Polynomial pieces between ascending `breakpoints`; piece k covers
    /// [breakpoints[k], breakpoints[k + 1]] with ascending coefficients in x.
    PiecewisePolynomial {
        breakpoints: Vec<f64>,
        pieces: Vec<Vec<f64>>,
    },
    /// Any function, accepted where it is locally polynomial to within the
    /// solver's quadrature tolerance.
    Smooth(Arc<dyn Fn(f64) -> f64 + Send + Sync>),
}

impl TargetFunction {
    /// f(x) = x
    pub fn identity() -> Self {
        Self::Polynomial(vec![0.0, 1.0])
    }

    /// Wrap a closure as a [`TargetFunction::Smooth`] target.
    pub fn smooth<F>(f: F) -> Self
    where
        F: Fn(f64) -> f64 + Send + Sync + 'static,
    {
        Self::Smooth(Arc::new(f))
    }

    /// Value at x; piecewise targets are zero outside their breakpoints.
    pub fn eval(&self, x: f64) -> f64 {
        match self {
            Self::Polynomial(c) => polynomial::eval(c, x),
            Self::PiecewisePolynomial { breakpoints, pieces } => {
                if breakpoints.is_empty() || x < breakpoints[0] {
                    return 0.0;
                }
                let k = breakpoints.partition_point(|&b| b <= x);
                // x at the last breakpoint belongs to the last piece.
                let k = if k == breakpoints.len() && x == breakpoints[k - 1] {
                    k - 1
                } else {
                    k
                };
                pieces
                    .get(k - 1)
                    .map_or(0.0, |c| polynomial::eval(c, x))
            }
            Self::Smooth(f) => f(x),
        }
    }

    /// Pieces in u = x / radius over [−1, 1], or `None` for smooth targets.
    pub(crate) fn normalized_pieces(&self, radius: f64) -> DecodeResult<Option<Vec<TargetPiece>>> {
        match self {
            Self::Polynomial(c) => Ok(Some(normalize_pieces(&[-1.0, 1.0], &[c], radius))),
            Self::PiecewisePolynomial { breakpoints, pieces } => {
                if pieces.is_empty() || breakpoints.len() != pieces.len() + 1 {
                    return Err(DecodeError::InvalidParameter {
                        parameter: "breakpoints".to_string(),
                        message: format!(
                            "need one more breakpoint than pieces, got {} and {}",
                            breakpoints.len(),
                            pieces.len()
                        ),
                    });
                }
                if breakpoints.windows(2).any(|w| !(w[0] < w[1])) {
                    return Err(DecodeError::InvalidParameter {
                        parameter: "breakpoints".to_string(),
                        message: "must be strictly ascending".to_string(),
                    });
                }
                let (first, last) = (breakpoints[0], breakpoints[pieces.len()]);
                if first > -radius || last < radius {
                    return Err(DecodeError::NonPolynomialTarget {
                        context: format!(
                            "pieces cover [{}, {}], not the represented interval [{}, {}]",
                            first, last, -radius, radius
                        ),
                    });
                }
                let u: Vec<f64> = breakpoints
                    .iter()
                    .map(|b| (b / radius).clamp(-1.0, 1.0))
                    .collect();
                let refs: Vec<&Vec<f64>> = pieces.iter().collect();
                Ok(Some(normalize_pieces(&u, &refs, radius)))
            }
            Self::Smooth(_) => Ok(None),
        }
    }
}

/// A target polynomial on [lo, hi] in u.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct TargetPiece {
    pub lo: f64,
    pub hi: f64,
    pub coeffs: Vec<f64>,
}

impl Piece for TargetPiece {
    fn bounds(&self) -> (f64, f64) {
        (self.lo, self.hi)
    }

    fn coefficients(&self) -> &[f64] {
        &self.coeffs
    }
}

/// Rescale each x-polynomial to u (c_k → c_k · radiusᵏ) and keep the
/// pieces of positive width.
fn normalize_pieces(u_breaks: &[f64], pieces: &[&Vec<f64>], radius: f64) -> Vec<TargetPiece> {
    pieces
        .iter()
        .zip(u_breaks.windows(2))
        .filter(|(_, w)| w[1] > w[0])
        .map(|(c, w)| TargetPiece {
            lo: w[0],
            hi: w[1],
            coeffs: c
                .iter()
                .scan(1.0, |scale, &ck| {
                    let v = ck * *scale;
                    *scale *= radius;
                    Some(v)
                })
                .collect(),
        })
        .collect()
}

impl fmt::Debug for TargetFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Polynomial(c) => f.debug_tuple("Polynomial").field(c).finish(),
            Self::PiecewisePolynomial { breakpoints, pieces } => f
                .debug_struct("PiecewisePolynomial")
                .field("breakpoints", breakpoints)
                .field("pieces", pieces)
                .finish(),
            Self::Smooth(_) => f.write_str("Smooth(..)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn abs_target() -> TargetFunction {
        TargetFunction::PiecewisePolynomial {
            breakpoints: vec![-2.0, 0.0, 2.0],
            pieces: vec![vec![0.0, -1.0], vec![0.0, 1.0]],
        }
    }

    #[test]
    fn test_eval() {
        assert_eq!(TargetFunction::identity().eval(0.3), 0.3);
        let t = abs_target();
        assert_eq!(t.eval(-1.5), 1.5);
        assert_eq!(t.eval(0.0), 0.0);
        assert_eq!(t.eval(2.0), 2.0);
        assert_eq!(t.eval(2.5), 0.0);
        assert_eq!(TargetFunction::smooth(f64::cos).eval(0.0), 1.0);
    }

    #[test]
    fn test_normalized_pieces_rescale_and_clip() {
        let pieces = TargetFunction::Polynomial(vec![1.0, 2.0, 3.0])
            .normalized_pieces(2.0)
            .unwrap()
            .unwrap();
        assert_eq!(pieces.len(), 1);
        assert_eq!(pieces[0].coeffs, vec![1.0, 4.0, 12.0]);

        let pieces = abs_target().normalized_pieces(1.0).unwrap().unwrap();
        assert_eq!((pieces[0].lo, pieces[0].hi), (-1.0, 0.0));
        assert_eq!((pieces[1].lo, pieces[1].hi), (0.0, 1.0));

        assert!(TargetFunction::smooth(f64::sin)
            .normalized_pieces(1.0)
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_pieces_must_cover_radius() {
        assert!(matches!(
            abs_target().normalized_pieces(3.0),
            Err(DecodeError::NonPolynomialTarget { .. })
        ));
        let bad = TargetFunction::PiecewisePolynomial {
            breakpoints: vec![-1.0, 1.0, 0.5],
            pieces: vec![vec![0.0], vec![1.0]],
        };
        assert!(matches!(
            bad.normalized_pieces(1.0),
            Err(DecodeError::InvalidParameter { .. })
        ));
    }
}
