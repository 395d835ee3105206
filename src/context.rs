use std::sync::Arc;

use anyhow::Context as _;
use winit::window::Window;

use crate::{
    camera::{Camera, CameraResources, OrbitController, Projection},
    config::SceneConfig,
    data_structures::{
        model::Uploader,
        scene_graph::Scene,
        texture::{RenderTarget, Texture},
    },
    pipelines::{basic::mk_basic_pipeline, environment::EnvironmentResources, light::LightResources},
    resources::texture::material_layout,
};

/// GPU state, the camera rig and the scene shared by every flow.
pub struct Context {
    pub(crate) window: Arc<Window>,
    pub(crate) depth: RenderTarget,
    pub(crate) msaa: Option<RenderTarget>,
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    pub camera: CameraResources,
    pub projection: Projection,
    pub light: LightResources,
    pub environment: EnvironmentResources,
    pub pipeline: wgpu::RenderPipeline,
    pub material_layout: wgpu::BindGroupLayout,
    pub blank_texture: Texture,
    pub scene: Scene,
    pub settings: SceneConfig,
    pub clear_colour: wgpu::Color,
}

impl Context {
    pub async fn new(window: Arc<Window>, settings: SceneConfig) -> anyhow::Result<Self> {
        let size = window.inner_size();

        log::info!("WGPU setup");
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            #[cfg(not(target_arch = "wasm32"))]
            backends: wgpu::Backends::PRIMARY,
            #[cfg(target_arch = "wasm32")]
            backends: wgpu::Backends::GL,
            ..Default::default()
        });

        let surface = instance
            .create_surface(window.clone())
            .context("Cannot create a surface for the window")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("No graphics adapter is compatible with the surface")?;

        log::info!("device and queue");
        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: None,
                required_features: wgpu::Features::empty(),
                // WebGL doesn't support all of wgpu's features
                required_limits: if cfg!(target_arch = "wasm32") {
                    wgpu::Limits::downlevel_webgl2_defaults()
                } else {
                    wgpu::Limits::default()
                },
                ..Default::default()
            })
            .await
            .context("Cannot acquire a device")?;

        let surface_caps = surface.get_capabilities(&adapter);
        // Colours are written in linear space; an sRGB surface does the conversion.
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first().copied())
            .context("The surface supports no texture format")?;
        // Keeps the page behind the canvas visible through the transparent clear colour.
        let alpha_mode = if surface_caps
            .alpha_modes
            .contains(&wgpu::CompositeAlphaMode::PreMultiplied)
        {
            wgpu::CompositeAlphaMode::PreMultiplied
        } else {
            surface_caps.alpha_modes[0]
        };
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: surface_caps.present_modes[0],
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };

        let viewport = &settings.viewport;
        let camera = Camera::new(viewport.camera_position, settings.controls.target);
        let projection = Projection::new(
            config.width,
            config.height,
            viewport.fovy,
            viewport.znear,
            viewport.zfar,
        );
        let controller = OrbitController::new(&settings.controls);
        let camera = CameraResources::new(&device, camera, controller, &projection);

        let sample_count = viewport.sample_count.max(1);
        let depth = RenderTarget::create_depth_texture(
            &device,
            [config.width, config.height],
            sample_count,
            "depth_texture",
        );
        let msaa =
            (sample_count > 1).then(|| RenderTarget::create_msaa_target(&device, &config, sample_count));

        let material_layout = material_layout(&device);
        let blank_texture = Texture::blank(&device, &queue)?;
        let light = LightResources::new(&device);
        let environment = EnvironmentResources::new(&device, &queue)?;
        let pipeline = mk_basic_pipeline(
            &device,
            &config,
            sample_count,
            &material_layout,
            &camera.bind_group_layout,
            &light.bind_group_layout,
            &environment.bind_group_layout,
        );
        let clear_colour = viewport.clear_colour;

        Ok(Self {
            window,
            depth,
            msaa,
            surface,
            device,
            queue,
            config,
            camera,
            projection,
            light,
            environment,
            pipeline,
            material_layout,
            blank_texture,
            scene: Scene::new(),
            settings,
            clear_colour,
        })
    }

    pub fn sample_count(&self) -> u32 {
        self.settings.viewport.sample_count.max(1)
    }

    /// Reconfigures the surface and every size dependent resource. Zero sized
    /// requests (minimised windows) are ignored.
    pub fn resize(&mut self, width: u32, height: u32) -> bool {
        if width == 0 || height == 0 {
            return false;
        }
        self.config.width = width;
        self.config.height = height;
        self.projection.resize(width, height);
        self.surface.configure(&self.device, &self.config);
        let sample_count = self.sample_count();
        self.depth = RenderTarget::create_depth_texture(
            &self.device,
            [width, height],
            sample_count,
            "depth_texture",
        );
        if sample_count > 1 {
            self.msaa = Some(RenderTarget::create_msaa_target(
                &self.device,
                &self.config,
                sample_count,
            ));
        }
        true
    }

    /// Copies the camera uniform to the GPU.
    pub fn write_camera(&mut self) {
        self.camera
            .uniform
            .update_view_proj(&self.camera.camera, &self.projection);
        self.queue.write_buffer(
            &self.camera.buffer,
            0,
            bytemuck::cast_slice(&[self.camera.uniform]),
        );
    }

    /// Moves the scene's lights, environment and meshes to the GPU.
    pub fn sync_scene(&mut self) {
        self.scene.update_world_transforms();
        self.light.sync(&self.queue, &self.scene);
        self.environment
            .sync(&self.device, &self.queue, &self.scene);
        let uploader = Uploader {
            device: &self.device,
            queue: &self.queue,
            material_layout: &self.material_layout,
            blank: &self.blank_texture,
        };
        self.scene.write_to_buffers(&uploader);
    }
}
