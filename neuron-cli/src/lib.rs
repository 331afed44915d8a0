//! Document shapes accepted by the `neuron` CLI binary, split out as a
//! library target so `tests/` can exercise parsing directly.

pub mod config;
pub mod error;
