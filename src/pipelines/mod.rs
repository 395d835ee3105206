//! Render pipelines and the bind group resources they consume.
//!
//! - `basic` is the lit pipeline used for every mesh
//! - `environment` owns the GPU copy of the scene environment
//! - `light` packs the scene lights into a uniform

pub mod basic;
pub mod environment;
pub mod light;
