//! CPU implementation of synapse embedding.

pub(crate) mod embed;
