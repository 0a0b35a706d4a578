//! LTI algorithm traits.

pub mod algebra;
pub mod conversions;
pub mod simulation;

pub use algebra::LtiAlgebra;
pub use conversions::StateSpaceConversions;
pub use simulation::LtiSimulation;
