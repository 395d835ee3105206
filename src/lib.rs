//! food-art-scene
//!
//! An interactive single-page 3D showcase that runs in the browser (WebGL2) and
//! natively. It lights a glTF model with an HDR panorama, puts an extruded title
//! behind it that ripples on every click, lets the visitor orbit the camera and
//! starts looped background music on the first click.
//!
//! High-level modules
//! - `audio`: looped playback started from a user gesture
//! - `camera`: camera, projection and the damped orbit controller
//! - `config`: every tunable of the page with its default
//! - `context`: central GPU and window context that owns device/queue/pipeline and the scene
//! - `data_structures`: scene graph, meshes, materials, textures, environment maps and text geometry
//! - `flow`: flow trait and the event loop driving it
//! - `pipelines`: the lit render pipeline and its light/environment bindings
//! - `render`: drawing the scene
//! - `resources`: loading models, fonts, images and panoramas
//! - `showcase`: the page itself, composed of flows
//! - `tween`: property tweening timelines
//!

pub mod audio;
pub mod camera;
pub mod config;
pub mod context;
pub mod data_structures;
pub mod flow;
pub mod pipelines;
pub mod render;
pub mod resources;
pub mod showcase;
pub mod tween;

// Re-exports commonly used types for convenience in downstream code.
pub use config::SceneConfig;
pub use flow::{GraphicsFlow, Out, run};
pub use winit::event::WindowEvent;

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

/// Entry point of the web build.
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    showcase::run(SceneConfig::default()).map_err(|e| JsValue::from_str(&format!("{:#}", e)))
}
