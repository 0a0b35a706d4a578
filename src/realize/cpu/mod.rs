//! CPU implementation of realization algorithms.

pub(crate) mod gramians;
pub(crate) mod realize;
