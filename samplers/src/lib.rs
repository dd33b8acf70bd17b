//! Parameter samplers
//!
//! This crate turns parameter domains into the ordered list of request
//! parameter sets for a run:
//!
//! - Cartesian enumeration of the full product
//! - Seeded random sampling
//! - Stratified interleaving over (address, language) pairs

#![warn(missing_docs)]
#![warn(clippy::all)]

mod domains;
mod error;
mod sampler;

pub use domains::ParameterDomains;
pub use error::SamplerError;
pub use sampler::{sample, ParameterSampler};
