//! Engine data structures: models, textures, scene graphs, and instances.
//!
//! - `environment` holds the decoded panoramic lighting
//! - `instance` holds node transforms and their GPU layout
//! - `model` contains mesh and material definitions, GPU resources for 3D models
//! - `scene_graph` enables hierarchical scene organization
//! - `text` builds extruded text geometry from font outlines
//! - `texture` contains GPU texture wrapper and creation utilities

pub mod environment;
pub mod instance;
pub mod model;
pub mod scene_graph;
pub mod text;
pub mod texture;
