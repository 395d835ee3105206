//! The extruded title and its click-triggered vertex wave.

use instant::Duration;
use rand::{Rng, SeedableRng, rngs::StdRng};
use winit::event::WindowEvent;

use crate::{
    config::{TitleConfig, WaveConfig},
    context::Context,
    data_structures::{
        instance::Instance,
        model::{Material, Mesh, Model},
        scene_graph::{ModelNode, NodeId, Scene, SceneNode},
        text::build_text_mesh,
    },
    flow::{GraphicsFlow, Out, flow_future},
    resources::font::{Font, load_font},
    showcase::{ShowcaseEvent, is_click},
    tween::{Animator, PropertyTween, Timeline, Tween, TweenTarget},
};

/// Builds one tween per vertex moving its Y and Z coordinates by a random offset
/// in `[-amplitude, amplitude)` from their current values. Vertex `i` of `V` starts
/// after `i / V * stagger` seconds.
pub fn wave_timeline<T, R>(target: &T, settings: &WaveConfig, rng: &mut R) -> Timeline
where
    T: TweenTarget + ?Sized,
    R: Rng,
{
    let mut timeline = Timeline::new();
    let vertices = target.property_count() / 3;
    for i in 0..vertices {
        let properties = [1, 2]
            .into_iter()
            .filter_map(|axis| {
                let index = i * 3 + axis;
                let value = target.property(index)?;
                let offset = if settings.amplitude > 0.0 {
                    rng.random_range(-settings.amplitude..settings.amplitude)
                } else {
                    0.0
                };
                Some(PropertyTween::new(index, value + offset))
            })
            .collect();
        let delay = i as f32 / vertices as f32 * settings.stagger;
        timeline.add(
            Tween::to(properties, settings.duration)
                .with_delay(delay)
                .with_repeat(settings.repeat)
                .with_yoyo(settings.yoyo),
        );
    }
    timeline
}

/// Adds the title built from `font` to the scene.
pub fn spawn_title(scene: &mut Scene, font: &Font, settings: &TitleConfig) -> anyhow::Result<NodeId> {
    let mesh = build_text_mesh(font, settings)?;
    log::info!("Title built with {} vertices", mesh.vertex_count());
    let mut material = Material::new("title", settings.colour);
    material.metallic = 0.0;
    material.roughness = 1.0;
    let mut node = ModelNode::new(Model {
        meshes: vec![mesh],
        materials: vec![material].into(),
    });
    *node.local_transform_mut() = Instance {
        position: settings.position,
        ..Instance::new().with_rotation_x(settings.tilt)
    };
    Ok(scene.add(Box::new(node)))
}

fn title_mesh(scene: &mut Scene, node: NodeId) -> Option<&mut Mesh> {
    scene.node_mut(node)?.model_mut()?.meshes.first_mut()
}

/// Owns the wave timelines of the title. Clicks before the title exists are
/// ignored; every later click adds a wave on top of the running ones.
pub struct TitleAnimation {
    node: Option<NodeId>,
    animator: Animator,
    rng: StdRng,
}

impl TitleAnimation {
    pub fn new(rng: StdRng) -> Self {
        Self {
            node: None,
            animator: Default::default(),
            rng,
        }
    }

    pub fn attach(&mut self, node: NodeId) {
        self.node = Some(node);
    }

    /// Number of waves still running.
    pub fn active_waves(&self) -> usize {
        self.animator.active()
    }

    /// Starts a new wave. Returns `false` when there is no title yet.
    pub fn on_click(&mut self, scene: &mut Scene, settings: &WaveConfig) -> bool {
        let Some(node) = self.node else {
            return false;
        };
        let Some(mesh) = title_mesh(scene, node) else {
            return false;
        };
        let timeline = wave_timeline(&*mesh, settings, &mut self.rng);
        self.animator.push(timeline);
        true
    }

    /// Advances every wave by `dt` seconds.
    pub fn advance(&mut self, scene: &mut Scene, dt: f32) {
        if self.animator.is_idle() {
            return;
        }
        let Some(node) = self.node else {
            return;
        };
        let Some(mesh) = title_mesh(scene, node) else {
            return;
        };
        self.animator.advance(dt, mesh);
    }
}

/// Loads the font, builds the title once it arrives and animates it on click.
pub struct TitleFlow {
    animation: TitleAnimation,
}

impl TitleFlow {
    pub fn new() -> Self {
        // seeded from the clock; `getrandom` is not available on every target
        let seed = (instant::now() * 1000.0) as u64;
        Self {
            animation: TitleAnimation::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl Default for TitleFlow {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphicsFlow<ShowcaseEvent> for TitleFlow {
    fn on_init(&mut self, ctx: &mut Context) -> Out<ShowcaseEvent> {
        let font = ctx.settings.assets.font.clone();
        Out::single(flow_future(async move {
            Some(ShowcaseEvent::FontLoaded(load_font(&font).await))
        }))
    }

    fn on_update(&mut self, ctx: &mut Context, dt: Duration) -> Out<ShowcaseEvent> {
        self.animation.advance(&mut ctx.scene, dt.as_secs_f32());
        Out::Empty
    }

    fn on_window_events(&mut self, ctx: &mut Context, event: &WindowEvent) -> Out<ShowcaseEvent> {
        if is_click(event) {
            self.animation.on_click(&mut ctx.scene, &ctx.settings.wave);
        }
        Out::Empty
    }

    fn on_custom_events(&mut self, ctx: &mut Context, event: ShowcaseEvent) -> Option<ShowcaseEvent> {
        match event {
            ShowcaseEvent::FontLoaded(Ok(font)) => {
                match spawn_title(&mut ctx.scene, &font, &ctx.settings.title) {
                    Ok(node) => self.animation.attach(node),
                    Err(e) => log::warn!("Title could not be built: {:#}", e),
                }
                None
            }
            ShowcaseEvent::FontLoaded(Err(e)) => {
                log::warn!("Font could not be loaded: {:#}", e);
                None
            }
            other => Some(other),
        }
    }
}
