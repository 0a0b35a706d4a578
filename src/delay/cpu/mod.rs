//! CPU implementation of delay algorithms.

pub(crate) mod pade;
pub(crate) mod window;
