//! Delay algorithm traits.

pub mod pade;
pub mod window;

pub use pade::DelayApproximation;
pub use window::WindowBasisAlgorithms;
