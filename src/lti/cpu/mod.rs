//! CPU implementation of LTI algorithms.

pub(crate) mod algebra;
pub(crate) mod conversions;
pub(crate) mod helpers;
pub(crate) mod simulation;
