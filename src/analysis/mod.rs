//! Numbers behind the exploratory plots: histograms of the reconstruction
//! likelihoods and a kernel density of track positions. Results are written
//! as CSV for whatever plotting tool is at hand.

pub mod density;
pub mod histogram;
pub mod likelihood;
