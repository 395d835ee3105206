//! Lights, environment and the showcased model.

use instant::Duration;
use winit::event::WindowEvent;

use crate::{
    config::{LightRigConfig, SceneConfig},
    context::Context,
    data_structures::{
        environment::EnvironmentMap,
        scene_graph::{ContainerNode, Light, NodeId, Scene, SceneNode},
    },
    flow::{GraphicsFlow, Out, flow_future},
    resources::{environment::load_environment, load_model_gltf},
    showcase::ShowcaseEvent,
};

/// Adds one ambient and one directional light aimed at the origin.
pub fn install_light_rig(scene: &mut Scene, rig: &LightRigConfig) {
    scene.add_light(Light::Ambient {
        colour: rig.ambient_colour,
        intensity: rig.ambient_intensity,
    });
    scene.add_light(Light::Directional {
        colour: rig.directional_colour,
        intensity: rig.directional_intensity,
        position: rig.directional_position,
        target: cgmath::Point3::new(0.0, 0.0, 0.0),
    });
}

/// Scales the loaded model uniformly and attaches it. A failed load is logged and
/// leaves the scene untouched.
pub fn install_model(
    scene: &mut Scene,
    loaded: anyhow::Result<ContainerNode>,
    scale: f32,
) -> Option<NodeId> {
    match loaded {
        Ok(mut root) => {
            root.local_transform_mut().scale *= scale;
            Some(scene.add(Box::new(root)))
        }
        Err(e) => {
            log::error!("An error happened while loading the model: {:#}", e);
            None
        }
    }
}

/// Installs the environment, replacing any previous one. Failures only cost the
/// environment lighting and are logged as warnings.
pub fn install_environment(scene: &mut Scene, loaded: anyhow::Result<EnvironmentMap>) -> bool {
    match loaded {
        Ok(environment) => {
            let (width, height) = environment.dimensions();
            log::info!("Environment installed ({}x{})", width, height);
            scene.set_environment(environment);
            true
        }
        Err(e) => {
            log::warn!("Environment could not be loaded: {:#}", e);
            false
        }
    }
}

/// Sets up the lights and starts the environment and model loads.
#[derive(Debug, Default)]
pub struct StageFlow;

impl StageFlow {
    pub fn new() -> Self {
        Self
    }
}

/// The loads of the stage; each resolves on its own.
pub fn stage_loads(settings: &SceneConfig) -> Out<ShowcaseEvent> {
    let environment = settings.assets.environment.clone();
    let model = settings.assets.model.clone();
    Out::FutEvent(vec![
        flow_future(async move {
            Some(ShowcaseEvent::EnvironmentLoaded(
                load_environment(&environment).await,
            ))
        }),
        flow_future(async move { Some(ShowcaseEvent::ModelLoaded(load_model_gltf(&model).await)) }),
    ])
}

impl GraphicsFlow<ShowcaseEvent> for StageFlow {
    fn on_init(&mut self, ctx: &mut Context) -> Out<ShowcaseEvent> {
        install_light_rig(&mut ctx.scene, &ctx.settings.lights);
        stage_loads(&ctx.settings)
    }

    fn on_update(&mut self, _ctx: &mut Context, _dt: Duration) -> Out<ShowcaseEvent> {
        Out::Empty
    }

    fn on_window_events(&mut self, _ctx: &mut Context, _event: &WindowEvent) -> Out<ShowcaseEvent> {
        Out::Empty
    }

    fn on_custom_events(&mut self, ctx: &mut Context, event: ShowcaseEvent) -> Option<ShowcaseEvent> {
        match event {
            ShowcaseEvent::EnvironmentLoaded(loaded) => {
                install_environment(&mut ctx.scene, loaded);
                None
            }
            ShowcaseEvent::ModelLoaded(loaded) => {
                install_model(&mut ctx.scene, loaded, ctx.settings.model_scale);
                None
            }
            other => Some(other),
        }
    }
}
