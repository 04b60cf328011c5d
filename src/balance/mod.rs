//! Group-aware resampling of event tables.
//!
//! * [`groups`]   – rows per combination of grouping-column values
//! * [`equalize`] – downsample every group to the smallest one
//! * [`split`]    – train/validation split that preserves group proportions

pub mod equalize;
pub mod groups;
pub mod split;
