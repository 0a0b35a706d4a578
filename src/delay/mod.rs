//! Rational approximation of pure delays and the window basis they induce.
//!
//! A [p/q] Padé approximant of e^{−θs} is a q-state LTI system whose state
//! compresses the last θ seconds of its input. [`DelayApproximation`] builds
//! the approximant; [`WindowBasisAlgorithms`] turns its state into readouts
//! of any point of that window, or of functions of the whole window.
//!
//! # Order Tradeoff
//!
//! | order q | states | error below 1e-2 up to θω ≈ |
//! |---------|--------|----------------------------|
//! | 2       | 2      | 0.9                        |
//! | 6       | 6      | 6.5                        |
//! | 12      | 12     | 16.5                       |
//!
//! Higher orders follow faster input changes and delay them more faithfully,
//! but cost more states and a stiffer system matrix. See
//! [`DelayApproximation::pade_delay_error`] for the exact frequency-domain
//! error.
//!
//! # Example
//!
//! ```ignore
//! use lindyn::delay::{DelayApproximation, WindowBasisAlgorithms};
//! use lindyn::realize::{RealizationAlgorithms, Realizer};
//!
//! let delay = client.pade_delay(0.1, 6)?;
//! let real = client.realize(&delay.system, Realizer::Balanced)?;
//! let basis = client.window_basis(&delay, &real, 1000)?;
//! let decoding = client.decode(&basis, &windows, |w| w.iter().copied().fold(f64::MIN, f64::max))?;
//! ```

mod cpu;
pub mod traits;
pub mod types;

pub use traits::{DelayApproximation, WindowBasisAlgorithms};
pub use types::{BasisSet, DelayForm, PadeDelay, WindowDecoding};
