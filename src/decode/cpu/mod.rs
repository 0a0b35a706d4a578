//! CPU implementation of decoder solvers.

pub(crate) mod geometric;
