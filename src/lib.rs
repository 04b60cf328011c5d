//! Exploratory analysis of neutrino-detector events and a linear
//! shower/track classifier.
//!
//! Pipeline of the `train` binary:
//! ```text
//!  event files ─▶ data::loader ─▶ balance::equalize ─▶ normalize
//!                                                         │
//!        classifier ◀── balance::split ◀── snapshot ◀─────┘
//! ```
//! The plotting binaries read the loader's output directly and hand their
//! results to `analysis`.

pub mod analysis;
pub mod balance;
pub mod classifier;
pub mod config;
pub mod data;
pub mod error;
pub mod normalize;
pub mod pipeline;

pub use error::{EmptyGroupError, LoadError, PipelineError, Result, SchemaError};
