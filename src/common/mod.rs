//! Common numerical utilities shared across lindyn modules.
//!
//! This module contains the small dense kernels, the numr-backed
//! factorizations and the polynomial helpers used by multiple submodules
//! (lti, realize, delay, embed, decode).

pub(crate) mod dense;
pub(crate) mod linalg;
pub(crate) mod polynomial;
pub(crate) mod quadrature;
