//! Analytic decoders for one-dimensional populations.
//!
//! A sampled least-squares solver estimates the Gram matrix Γ = AᵀA from
//! activities at random evaluation points. The geometric solver computes
//! the same quantity by exact integration instead: each tuning curve is
//! replaced by a piecewise quadratic over its active domain and all
//! integrals become sums over segment overlaps.
//!
//! | Neuron family     | Threshold | Active domain            |
//! |-------------------|-----------|--------------------------|
//! | `RectifiedLinear` | j = 0     | intercept to ±1          |
//! | `Sigmoid`         | none      | all of [−1, 1]           |
//! | `LifRate`         | j = 1     | intercept to ±1          |
//!
//! Regularisation follows the sampled solver's convention, so the two are
//! comparable at equal `regularization` and `n_samples`.
//!
//! # Example
//!
//! ```ignore
//! use lindyn::decode::*;
//!
//! let pop = Population::from_tuning(NeuronType::default(), &rates, &intercepts, &encoders, &device)?;
//! let dec = client.solve_geometric(&pop, &TargetFunction::identity(), &GeometricSolverOptions::default())?;
//! let estimate = client.predict(&pop, &dec, &points)?;
//! ```

mod cpu;
pub mod error;
pub mod neurons;
pub mod piecewise;
pub mod target;
pub mod traits;
pub mod types;

pub use error::{DecodeError, DecodeResult};
pub use neurons::NeuronType;
pub use piecewise::{PiecewisePolynomialApprox, PolySegment};
pub use target::TargetFunction;
pub use traits::GeometricDecoderAlgorithms;
pub use types::{Decoder, GeometricSolverOptions, Population};
