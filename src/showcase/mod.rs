//! The "Food Art & Design" page.
//!
//! - `stage`: light rig, environment and model
//! - `title`: extruded title and its wave
//! - `music`: background audio

use winit::event::{ElementState, MouseButton, TouchPhase, WindowEvent};

use crate::{
    config::SceneConfig,
    data_structures::{environment::EnvironmentMap, scene_graph::ContainerNode},
    flow::{self, GraphicsFlow},
    resources::font::Font,
};

pub mod music;
pub mod stage;
pub mod title;

pub use music::MusicFlow;
pub use stage::StageFlow;
pub use title::TitleFlow;

/// Results of the asynchronous loads, delivered to the event loop.
pub enum ShowcaseEvent {
    EnvironmentLoaded(anyhow::Result<EnvironmentMap>),
    ModelLoaded(anyhow::Result<ContainerNode>),
    FontLoaded(anyhow::Result<Font>),
}

impl std::fmt::Debug for ShowcaseEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (name, ok) = match self {
            Self::EnvironmentLoaded(result) => ("EnvironmentLoaded", result.is_ok()),
            Self::ModelLoaded(result) => ("ModelLoaded", result.is_ok()),
            Self::FontLoaded(result) => ("FontLoaded", result.is_ok()),
        };
        f.debug_struct(name).field("ok", &ok).finish()
    }
}

/// A page click: the primary button or a finger released over the window.
pub fn is_click(event: &WindowEvent) -> bool {
    match event {
        WindowEvent::MouseInput {
            state: ElementState::Released,
            button: MouseButton::Left,
            ..
        } => true,
        WindowEvent::Touch(touch) => touch.phase == TouchPhase::Ended,
        _ => false,
    }
}

pub fn flows() -> Vec<Box<dyn GraphicsFlow<ShowcaseEvent>>> {
    vec![
        Box::new(StageFlow::new()),
        Box::new(TitleFlow::new()),
        Box::new(MusicFlow::new()),
    ]
}

pub fn run(settings: SceneConfig) -> anyhow::Result<()> {
    flow::run(flows(), settings)
}
