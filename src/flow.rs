//! Flow control and application event loop.
//!
//! A "flow" is a self-contained part of the page (the stage, the title, the music)
//! that reacts to window events, advances its animations every frame and starts
//! asynchronous work. The event loop owns the [`Context`] and hands it to every
//! flow hook; asynchronous results come back as custom events so the scene is only
//! ever mutated on the event loop thread.
//!
//! # User-facing types
//!
//! - [`GraphicsFlow<E>`] is the trait every part of the page implements
//! - [`Out<E>`] is the output type for asynchronous event handling
//!
//! # Lifecycle Flow
//!
//! Each frame the event loop
//! 1. advances the orbit controller and uploads the camera
//! 2. calls `on_update` on all flows
//! 3. propagates world transforms and uploads dirty GPU data
//! 4. renders the scene and presents the frame

use std::{fmt::Debug, iter, sync::Arc};

use futures::FutureExt;
use instant::{Duration, Instant};
use winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, EventLoop, EventLoopProxy},
    window::Window,
};

use crate::{config::SceneConfig, context::Context, render::draw_scene};

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

/// A boxed future as the current platform can run it: `Send` for the native tokio
/// runtime, local to the browser's event queue on the web.
#[cfg(not(target_arch = "wasm32"))]
pub type FlowFuture<T> = futures::future::BoxFuture<'static, T>;
#[cfg(target_arch = "wasm32")]
pub type FlowFuture<T> = futures::future::LocalBoxFuture<'static, T>;

#[cfg(not(target_arch = "wasm32"))]
pub fn flow_future<F>(future: F) -> FlowFuture<F::Output>
where
    F: Future + Send + 'static,
{
    future.boxed()
}

#[cfg(target_arch = "wasm32")]
pub fn flow_future<F>(future: F) -> FlowFuture<F::Output>
where
    F: Future + 'static,
{
    future.boxed_local()
}

///
/// This is the Output Type for every lifecycle hook where a flow can pass async events that are
/// handled according to the platform the page runs on.
///
/// `Out::FutEvent` holds futures that are spawned independently. Each one that resolves to
/// `Some(event)` puts the event in the event queue where it is handed to
/// [`GraphicsFlow::on_custom_events`]. `None` results are dropped.
///
/// `Empty` is the default output used when no eventing/futures need to be handled.
///
pub enum Out<E> {
    FutEvent(Vec<FlowFuture<Option<E>>>),
    Empty,
}

impl<E> Default for Out<E> {
    fn default() -> Self {
        Self::Empty
    }
}

impl<E> Out<E> {
    pub fn single(future: FlowFuture<Option<E>>) -> Self {
        Self::FutEvent(vec![future])
    }

    pub fn into_futures(self) -> Vec<FlowFuture<Option<E>>> {
        match self {
            Out::FutEvent(futures) => futures,
            Out::Empty => Vec::new(),
        }
    }
}

/// Trait for implementing a part of the page.
///
/// # Lifecycle
///
/// 1. `on_init()` is called once when the context exists; add nodes and lights, start loads
/// 2. `on_window_events()` is called for each winit window event
/// 3. `on_update()` is called every frame before the scene is drawn
/// 4. `on_custom_events()` is called with the results of the futures returned by any hook
///
pub trait GraphicsFlow<E> {
    /// Set up the flow's part of the scene and start asynchronous loads.
    fn on_init(&mut self, ctx: &mut Context) -> Out<E>;

    /// Update state every frame.
    ///
    /// Called every frame with the elapsed time `dt`. Use for animations.
    fn on_update(&mut self, ctx: &mut Context, dt: Duration) -> Out<E>;

    /// Handle window events (mouse, touch, resizing, etc.).
    fn on_window_events(&mut self, ctx: &mut Context, event: &WindowEvent) -> Out<E>;

    /// Handle custom application events.
    ///
    /// Returns the event if it was not consumed, allowing it to be passed to
    /// the next flow. Returning `None` means the event was consumed.
    fn on_custom_events(&mut self, ctx: &mut Context, event: E) -> Option<E>;
}

impl<Event> Debug for dyn GraphicsFlow<Event> + 'static {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("GraphicsFlow")
    }
}

/// Application state bundle: GPU context and surface status.
pub struct AppState {
    pub(crate) ctx: Context,
    is_surface_configured: bool,
}

impl AppState {
    async fn new(window: Arc<Window>, settings: SceneConfig) -> anyhow::Result<Self> {
        let ctx = Context::new(window, settings).await?;
        Ok(Self {
            ctx,
            is_surface_configured: false,
        })
    }

    fn resize(&mut self, width: u32, height: u32) {
        if self.ctx.resize(width, height) {
            self.is_surface_configured = true;
        }
    }

    fn render(&mut self) -> Result<(), wgpu::SurfaceError> {
        // invoke main render loop
        self.ctx.window.request_redraw();

        // Rendering requires the surface to be configured
        if !self.is_surface_configured {
            return Ok(());
        }

        let output = self.ctx.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        // Draw into the multisampled target and resolve into the frame.
        let (target, resolve_target) = match &self.ctx.msaa {
            Some(msaa) => (&msaa.view, Some(&view)),
            None => (&view, None),
        };

        let mut encoder = self
            .ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target,
                    resolve_target,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.ctx.clear_colour),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.ctx.depth.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
                multiview_mask: None,
            });

            draw_scene(&self.ctx, &mut render_pass);
        }

        self.ctx.queue.submit(iter::once(encoder.finish()));
        output.present();
        Ok(())
    }
}

pub struct App<Event: 'static> {
    #[cfg(not(target_arch = "wasm32"))]
    async_runtime: tokio::runtime::Runtime,
    proxy: EventLoopProxy<FlowEvent<Event>>,
    state: Option<AppState>,
    graphics_flows: Vec<Box<dyn GraphicsFlow<Event>>>,
    // taken once the window exists
    settings: Option<SceneConfig>,
    last_time: Instant,
}

impl<Event: Send + 'static> App<Event> {
    fn new(
        event_loop: &EventLoop<FlowEvent<Event>>,
        graphics_flows: Vec<Box<dyn GraphicsFlow<Event>>>,
        settings: SceneConfig,
    ) -> anyhow::Result<Self> {
        let proxy = event_loop.create_proxy();
        #[cfg(not(target_arch = "wasm32"))]
        let async_runtime = tokio::runtime::Runtime::new()?;
        Ok(Self {
            #[cfg(not(target_arch = "wasm32"))]
            async_runtime,
            proxy,
            state: None,
            graphics_flows,
            settings: Some(settings),
            last_time: Instant::now(),
        })
    }

    fn initialize(&mut self, mut state: AppState) {
        let size = state.ctx.window.inner_size();
        state.resize(size.width, size.height);
        for flow in self.graphics_flows.iter_mut() {
            let out = flow.on_init(&mut state.ctx);
            spawn_flow_output(
                #[cfg(not(target_arch = "wasm32"))]
                &self.async_runtime,
                &self.proxy,
                out,
            );
        }
        state.ctx.window.request_redraw();
        self.last_time = Instant::now();
        self.state = Some(state);
    }
}

pub(crate) enum FlowEvent<Event: 'static> {
    #[cfg(target_arch = "wasm32")]
    Initialized(Box<AppState>),
    Custom(Event),
}

impl<Event> Debug for FlowEvent<Event> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            #[cfg(target_arch = "wasm32")]
            Self::Initialized(_) => f.write_str("Initialized"),
            Self::Custom(_) => f.write_str("Custom(E)"),
        }
    }
}

impl<Event: Send + 'static> ApplicationHandler<FlowEvent<Event>> for App<Event> {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        let Some(settings) = self.settings.take() else {
            return;
        };

        #[allow(unused_mut)]
        let mut window_attributes = Window::default_attributes().with_title("Food Art & Design");

        #[cfg(target_arch = "wasm32")]
        {
            use winit::platform::web::WindowAttributesExtWebSys;
            // winit creates the canvas; it is appended to the body and stretched below
            window_attributes = window_attributes.with_append(true);
        }

        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                log::error!("Cannot create a window: {}", e);
                event_loop.exit();
                return;
            }
        };

        #[cfg(target_arch = "wasm32")]
        {
            use winit::platform::web::WindowExtWebSys;
            if let Some(canvas) = window.canvas() {
                let style = canvas.style();
                let _ = style.set_property("width", "100vw");
                let _ = style.set_property("height", "100vh");
                let _ = style.set_property("display", "block");
            }
        }

        let init_future = AppState::new(window, settings);

        #[cfg(not(target_arch = "wasm32"))]
        {
            match self.async_runtime.block_on(init_future) {
                Ok(state) => self.initialize(state),
                Err(e) => {
                    log::error!("App initialization failed. Cannot create the main context: {:#}", e);
                    event_loop.exit();
                }
            }
        }

        #[cfg(target_arch = "wasm32")]
        {
            let proxy = self.proxy.clone();
            wasm_bindgen_futures::spawn_local(async move {
                match init_future.await {
                    Ok(state) => {
                        if proxy
                            .send_event(FlowEvent::Initialized(Box::new(state)))
                            .is_err()
                        {
                            log::error!("Event loop closed before the context was ready");
                        }
                    }
                    Err(e) => {
                        log::error!("App initialization failed. Cannot create the main context: {:#}", e)
                    }
                }
            });
        }
    }

    fn user_event(&mut self, _event_loop: &ActiveEventLoop, event: FlowEvent<Event>) {
        match event {
            #[cfg(target_arch = "wasm32")]
            FlowEvent::Initialized(state) => {
                // This is the message from our wasm `spawn_local`
                self.initialize(*state);
            }
            FlowEvent::Custom(custom_event) => {
                let Some(state) = &mut self.state else {
                    return;
                };
                let result = self
                    .graphics_flows
                    .iter_mut()
                    .try_fold(custom_event, |event, flow| {
                        match flow.on_custom_events(&mut state.ctx, event) {
                            Some(event) => Ok(event),
                            None => Err(()),
                        }
                    });
                if result.is_ok() {
                    log::warn!("Warning! Custom event was not consumed this cycle");
                }
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        let state = match &mut self.state {
            Some(state) => state,
            None => return,
        };

        {
            let ctx = &mut state.ctx;
            let viewport_height = ctx.config.height as f32;
            ctx.camera.controller.handle_window_events(
                &event,
                &ctx.camera.camera,
                &ctx.projection,
                viewport_height,
            );
        }

        for flow in self.graphics_flows.iter_mut() {
            let out = flow.on_window_events(&mut state.ctx, &event);
            spawn_flow_output(
                #[cfg(not(target_arch = "wasm32"))]
                &self.async_runtime,
                &self.proxy,
                out,
            );
        }

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => state.resize(size.width, size.height),
            WindowEvent::RedrawRequested => {
                let dt = self.last_time.elapsed();
                self.last_time = Instant::now();

                // Update the camera
                let ctx = &mut state.ctx;
                ctx.camera.controller.update(&mut ctx.camera.camera);
                ctx.write_camera();

                // Update custom stuff
                for flow in self.graphics_flows.iter_mut() {
                    let out = flow.on_update(&mut state.ctx, dt);
                    spawn_flow_output(
                        #[cfg(not(target_arch = "wasm32"))]
                        &self.async_runtime,
                        &self.proxy,
                        out,
                    );
                }
                state.ctx.sync_scene();

                match state.render() {
                    Ok(_) => {}
                    // Reconfigure the surface if it's lost or outdated
                    Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                        let size = state.ctx.window.inner_size();
                        state.resize(size.width, size.height);
                    }
                    Err(e) => {
                        log::error!("Unable to render {}", e);
                    }
                }
            }
            _ => {}
        }
    }
}

/// Spawns every future of `out`; resolved events are sent back to the event loop.
fn spawn_flow_output<Event: Send + 'static>(
    #[cfg(not(target_arch = "wasm32"))] async_runtime: &tokio::runtime::Runtime,
    proxy: &EventLoopProxy<FlowEvent<Event>>,
    out: Out<Event>,
) {
    for future in out.into_futures() {
        let proxy = proxy.clone();
        let task = async move {
            if let Some(event) = future.await {
                if proxy.send_event(FlowEvent::Custom(event)).is_err() {
                    log::error!("Event loop was closed before the event could be processed.");
                }
            }
        };
        #[cfg(not(target_arch = "wasm32"))]
        async_runtime.spawn(task);
        #[cfg(target_arch = "wasm32")]
        wasm_bindgen_futures::spawn_local(task);
    }
}

pub fn run<Event: Send + 'static>(
    flows: Vec<Box<dyn GraphicsFlow<Event>>>,
    settings: SceneConfig,
) -> anyhow::Result<()> {
    #[cfg(not(target_arch = "wasm32"))]
    {
        if let Err(e) = env_logger::try_init() {
            eprintln!("Warning: Could not initialize logger: {}", e);
        };
    }

    #[cfg(target_arch = "wasm32")]
    {
        std::panic::set_hook(Box::new(console_error_panic_hook::hook));
        console_log::init_with_level(log::Level::Info).unwrap_throw();
    }

    let event_loop: EventLoop<FlowEvent<Event>> = EventLoop::with_user_event().build()?;

    let mut app = App::new(&event_loop, flows, settings)?;

    event_loop.run_app(&mut app)?;

    Ok(())
}
