//! Flow control and application event loop.
//!
//! This module provides the main event loop and the flow abstraction. A
//! "flow" represents a scene that handles user input, updates its state and
//! provides renderable objects each frame. The engine drives every active flow
//! and composes their renders into one frame.
//!
//! # User-facing types
//!
//! - [`GraphicsFlow<S, E>`] is the trait for scenes that handle events and rendering
//! - [`Out<S, E>`] is the output type for async event handling and context configuration
//!
//! # Lifecycle Flow
//!
//! The event loop follows this pattern each frame:
//! 1. Collect window/device events and forward them to `on_<device/window/custom>_event`
//! 2. Turn a left click into a world space ray and pass it to `on_click`
//! 3. Advance the orbit controller and upload the camera
//! 4. Update flow state (via `on_update` / `on_tick`)
//! 5. Collect every flow's `on_render()` and batch it per pipeline
//! 6. Render the shadow maps, then the frame, submit once and present

use std::{fmt::Debug, iter, pin::Pin, sync::Arc};

#[cfg(not(target_arch = "wasm32"))]
use futures::{FutureExt, StreamExt, stream::FuturesUnordered};
use instant::{Duration, Instant};

#[cfg(feature = "integration-tests")]
use tokio::runtime::Runtime;
use winit::{
    application::ApplicationHandler,
    event::{DeviceEvent, DeviceId, MouseButton, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop},
    window::Window,
};

use crate::{
    camera::Ray,
    context::{Context, InitContext, MouseButtonState},
    data_structures::{model::DrawModel, texture::Texture},
    render::{Batches, Instanced},
};

///
/// This is the Output Type for every lifecycle hook where the user can pass async events that are
/// handled according to the platform you're running on.
///
/// `Out::FutEvent` can be used to resolve a future of an Event that is put in the Event Queue after
/// being resolved. The caller is responsible for handling the event later on and it will have no
/// side effects unless handled. Natively every pending future is polled once at the start of each
/// frame, on the web each one is spawned on its own. Either way a future never holds up a frame
/// and its event arrives whenever it is done.
///
/// `Out::FutFn` can be used to directly modify the state and the mutation is handled internally with
/// no further action required by the callee. Mutations are scheduled like events.
///
/// `Out::Configure` can be used to modify the Context during runtime for instance to change the tick
/// speed or the clear colour.
///
/// `Empty` is the default output used when no eventing/futures need to be handled.
///
pub enum Out<S, E> {
    FutEvent(Vec<Box<dyn Future<Output = E>>>),
    FutFn(Vec<Box<dyn Future<Output = Box<dyn FnOnce(&mut S)>>>>),
    Configure(Box<dyn FnOnce(&mut Context)>),
    Empty,
}

impl<S, E> Default for Out<S, E> {
    fn default() -> Self {
        Self::Empty
    }
}

#[cfg(feature = "integration-tests")]
pub enum ImageTestResult {
    Passed,
    Waiting,
    Failed,
}

/// Trait for implementing a renderable scene.
///
/// # Lifecycle
///
/// 1. `on_init()` is called once when the flow is created; configure context (camera, clear color, etc.)
/// 2. `on_window_events()` and `on_device_events()` are called for each winit input event
/// 3. `on_click()` is called with a pointer ray whenever the left mouse button goes down
/// 4. `on_update()` is called every frame
/// 5. `on_tick()` is called every `tick_duration_millis`
/// 6. `on_custom_events()` is called for custom application events
/// 7. `on_render()` is called each frame and specifies how to render `self`
///
pub trait GraphicsFlow<S, E> {
    /// Initialize the flow and configure the context.
    ///
    /// This is the place to configure things such as the background colour or
    /// the camera start position, and to kick off asset loads.
    fn on_init(&mut self, ctx: &mut Context, state: &mut S) -> Out<S, E>;

    /// Handle a left click.
    ///
    /// `ray` starts at the camera and passes through the clicked pixel. Flows
    /// run their own hit tests against it; a miss is not an error.
    fn on_click(&mut self, ctx: &Context, state: &mut S, ray: &Ray) -> Out<S, E>;

    /// Update state every frame.
    ///
    /// Called every frame with the elapsed time `dt`, after the camera moved
    /// and before anything is drawn.
    fn on_update(&mut self, ctx: &Context, state: &mut S, dt: Duration) -> Out<S, E>;

    /// Update state periodically.
    ///
    /// Called every `tick_duration_millis` milliseconds (configurable via context).
    fn on_tick(&mut self, ctx: &Context, state: &mut S) -> Out<S, E>;

    /// Handle raw device events (keyboard, mouse hardware input).
    fn on_device_events(&mut self, ctx: &Context, state: &mut S, event: &DeviceEvent) -> Out<S, E>;

    /// Handle window events (keyboard, mouse, window resizing, etc.).
    fn on_window_events(&mut self, ctx: &Context, state: &mut S, event: &WindowEvent) -> Out<S, E>;

    /// Handle custom application events.
    ///
    /// Returns the event if it was not consumed, allowing it to be passed to
    /// the next flow. Returning `None` means the event was consumed.
    fn on_custom_events(&mut self, ctx: &Context, state: &mut S, event: E) -> Option<E>;

    /// Return renderable objects for this flow.
    ///
    /// Called each frame. Collect your objects into a [`Render`](crate::render::Render) and return it.
    fn on_render(&self) -> crate::render::Render<'_>;

    #[cfg(feature = "integration-tests")]
    fn render_to_texture(
        &self,
        ctx: &Context,
        state: &mut S,
        texture: &mut image::ImageBuffer<image::Rgba<u8>, wgpu::BufferView>,
    ) -> Result<ImageTestResult, anyhow::Error>;
}

// Dummy impl to make wasm work
impl<State, Event> Debug for dyn GraphicsFlow<State, Event> + 'static {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("GraphicsFlow")
    }
}

/// Type alias for a flow constructor (factory function).
///
/// A flow constructor takes an `InitContext` and asynchronously returns a
/// boxed `GraphicsFlow`. This allows lazy initialization and resource loading.
pub type FlowConstructor<S, E> =
    Box<dyn FnOnce(InitContext) -> Pin<Box<dyn Future<Output = Box<dyn GraphicsFlow<S, E>>>>>>;

#[cfg(feature = "integration-tests")]
#[derive(Debug, Default)]
enum TestVerdict {
    #[default]
    Running,
    Passed,
    Failed(String),
}

/// Application state bundle: GPU context, app state, and surface status.
#[derive(Debug)]
pub struct AppState<State: 'static> {
    pub(crate) ctx: Context,
    state: State,
    is_surface_configured: bool,
}

impl<State: Default> AppState<State> {
    async fn new(window: Arc<Window>) -> anyhow::Result<Self> {
        let ctx = Context::new(window).await?;
        Ok(Self {
            ctx,
            state: State::default(),
            is_surface_configured: false,
        })
    }

    fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.ctx.config.width = width;
            self.ctx.config.height = height;
            self.is_surface_configured = true;
            self.ctx.projection.resize(width, height);
            self.ctx
                .surface
                .configure(&self.ctx.device, &self.ctx.config);
            self.ctx.depth_texture = Texture::create_depth_texture(
                &self.ctx.device,
                [self.ctx.config.width, self.ctx.config.height],
                "depth_texture",
            );
        }
    }

    /// Move the camera by the controller's pending input and upload it.
    fn update_camera(&mut self) {
        let ctx = &mut self.ctx;
        ctx.camera
            .controller
            .update(&mut ctx.camera.camera, &ctx.projection);
        ctx.camera
            .uniform
            .update_view_proj(&ctx.camera.camera, &ctx.projection);
        ctx.queue.write_buffer(
            &ctx.camera.buffer,
            0,
            bytemuck::cast_slice(&[ctx.camera.uniform]),
        );
    }

    #[cfg(feature = "integration-tests")]
    fn get_test_texture(&self, extent3d: wgpu::Extent3d, format: wgpu::TextureFormat) -> wgpu::Texture {
        self.ctx.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Golden Image Test Output Texture"),
            size: extent3d,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::COPY_SRC | wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        })
    }

    #[cfg(feature = "integration-tests")]
    fn get_width_height(&self) -> (u32, u32) {
        // rows of the copy must be 256 byte aligned, 64 pixels of 4 bytes each
        let width = self.ctx.config.width.div_ceil(64) * 64;
        (width, self.ctx.config.height)
    }

    #[cfg(feature = "integration-tests")]
    fn get_test_3d_extent(&self) -> wgpu::Extent3d {
        let (width, height) = self.get_width_height();
        wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        }
    }

    fn render<Event>(
        &mut self,
        graphics_flows: &[Box<dyn GraphicsFlow<State, Event>>],
        #[cfg(feature = "integration-tests")] async_runtime: &Runtime,
        #[cfg(feature = "integration-tests")] verdict: &mut TestVerdict,
    ) {
        // invoke main render loop
        self.ctx.window.request_redraw();

        // Rendering requires the surface to be configured
        if !self.is_surface_configured {
            return;
        }

        let output = match self.ctx.surface.get_current_texture() {
            wgpu::CurrentSurfaceTexture::Success(frame)
            | wgpu::CurrentSurfaceTexture::Suboptimal(frame) => frame,
            wgpu::CurrentSurfaceTexture::Timeout | wgpu::CurrentSurfaceTexture::Occluded => {
                log::warn!("Surface is not ready, skipping this frame.");
                return;
            }
            // Reconfigure the surface if it's lost or outdated
            wgpu::CurrentSurfaceTexture::Outdated | wgpu::CurrentSurfaceTexture::Lost => {
                let size = self.ctx.window.inner_size();
                self.resize(size.width, size.height);
                return;
            }
            wgpu::CurrentSurfaceTexture::Validation => {
                log::error!("Unable to acquire the next surface texture.");
                return;
            }
        };
        #[cfg(not(feature = "integration-tests"))]
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        // pipelines are built for the surface format, so the capture uses it too
        #[cfg(feature = "integration-tests")]
        let (tex, depth) = {
            let extent3d = self.get_test_3d_extent();
            let tex = self.get_test_texture(extent3d, self.ctx.config.format);
            let depth = Texture::create_depth_texture(
                &self.ctx.device,
                [extent3d.width, extent3d.height],
                "test_depth_texture",
            );
            (tex, depth)
        };
        #[cfg(feature = "integration-tests")]
        let view = tex.create_view(&wgpu::TextureViewDescriptor::default());
        #[cfg(feature = "integration-tests")]
        let depth_view = &depth.view;
        #[cfg(not(feature = "integration-tests"))]
        let depth_view = &self.ctx.depth_texture.view;

        let mut encoder: wgpu::CommandEncoder =
            self.ctx
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("Render Encoder"),
                });

        let mut batches = Batches::default();
        graphics_flows
            .iter()
            .for_each(|flow| flow.on_render().set_pipelines(&mut batches));

        // maps of lights that cast nothing are still cleared
        for (shadow_map, casting) in self.ctx.lights.shadow_maps() {
            let mut shadow_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Shadow Pass"),
                color_attachments: &[],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &shadow_map.view,
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
            if casting {
                shadow_pass.set_pipeline(&self.ctx.pipelines.shadow);
                shadow_pass.set_bind_group(0, &shadow_map.bind_group, &[]);
                draw_depth(&mut shadow_pass, &batches.casters);
            }
        }

        {
            let mut render_pass: wgpu::RenderPass<'_> =
                encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("Render Pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: &view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Clear(self.ctx.clear_colour),
                            store: wgpu::StoreOp::Store,
                        },
                        depth_slice: None,
                    })],
                    depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                        view: depth_view,
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

            if let Some(sky) = batches.sky {
                render_pass.set_pipeline(&self.ctx.pipelines.sky);
                render_pass.set_bind_group(0, sky, &[]);
                render_pass.set_bind_group(1, &self.ctx.camera.bind_group, &[]);
                render_pass.draw(0..3, 0..1);
            }

            render_pass.set_pipeline(&self.ctx.pipelines.basic);
            draw_instanced(&mut render_pass, &self.ctx, batches.lit);

            render_pass.set_pipeline(&self.ctx.pipelines.unlit);
            draw_instanced(&mut render_pass, &self.ctx, batches.unlit);

            for custom in batches.custom {
                custom(&self.ctx, &mut render_pass);
            }
        }

        #[cfg(feature = "integration-tests")]
        let output_buffer = {
            let u32_size = std::mem::size_of::<u32>() as u32;
            let (width, height) = self.get_width_height();
            let output_buffer = self.ctx.device.create_buffer(&wgpu::BufferDescriptor {
                size: (u32_size * width * height) as wgpu::BufferAddress,
                usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
                label: Some("Golden Image Test Output Buffer"),
                mapped_at_creation: false,
            });
            encoder.copy_texture_to_buffer(
                wgpu::TexelCopyTextureInfo {
                    aspect: wgpu::TextureAspect::All,
                    texture: &tex,
                    mip_level: 0,
                    origin: wgpu::Origin3d::ZERO,
                },
                wgpu::TexelCopyBufferInfo {
                    buffer: &output_buffer,
                    layout: wgpu::TexelCopyBufferLayout {
                        offset: 0,
                        bytes_per_row: Some(u32_size * width),
                        rows_per_image: Some(height),
                    },
                },
                self.get_test_3d_extent(),
            );
            output_buffer
        };

        self.ctx.queue.submit(iter::once(encoder.finish()));

        #[cfg(feature = "integration-tests")]
        {
            *verdict = match async_runtime.block_on(self.read_capture(&output_buffer)) {
                Err(e) => TestVerdict::Failed(format!("{e:#}")),
                Ok(mut img) => {
                    let ctx = &self.ctx;
                    let state = &mut self.state;
                    let mut outcome = TestVerdict::Passed;
                    for flow in graphics_flows {
                        match flow.render_to_texture(ctx, state, &mut img) {
                            Err(e) => {
                                outcome = TestVerdict::Failed(format!("{e:#}"));
                                break;
                            }
                            Ok(ImageTestResult::Failed) => {
                                outcome = TestVerdict::Failed("Assertion failed".to_string());
                                break;
                            }
                            Ok(ImageTestResult::Waiting) => outcome = TestVerdict::Running,
                            Ok(ImageTestResult::Passed) => (),
                        }
                    }
                    outcome
                }
            };
        }

        output.present();
    }

    #[cfg(feature = "integration-tests")]
    async fn read_capture(
        &self,
        output_buffer: &wgpu::Buffer,
    ) -> anyhow::Result<image::ImageBuffer<image::Rgba<u8>, wgpu::BufferView>> {
        let (tx, rx) = futures_intrusive::channel::shared::oneshot_channel();
        let buffer_slice = output_buffer.slice(..);
        buffer_slice.map_async(wgpu::MapMode::Read, move |result| {
            // the receiver only disappears if the capture was abandoned
            let _ = tx.send(result);
        });
        self.ctx.device.poll(wgpu::PollType::Wait {
            submission_index: None,
            timeout: Some(Duration::from_secs(3)),
        })?;
        rx.receive()
            .await
            .ok_or_else(|| anyhow::anyhow!("The capture buffer was never mapped"))??;
        let data = buffer_slice.get_mapped_range();
        let (width, height) = self.get_width_height();
        image::ImageBuffer::<image::Rgba<u8>, _>::from_raw(width, height, data)
            .ok_or_else(|| anyhow::anyhow!("The capture buffer is smaller than {width}x{height}"))
    }
}

fn draw_instanced<'a>(
    render_pass: &mut wgpu::RenderPass<'a>,
    ctx: &'a Context,
    instances: Vec<Instanced<'a>>,
) {
    for instanced in instances {
        if instanced.amount == 0 || instanced.instance.size() == 0 {
            log::debug!("Skipping a model with zero instances.");
            continue;
        }
        render_pass.set_vertex_buffer(1, instanced.instance.slice(..));
        render_pass.draw_model_instanced(
            instanced.model,
            0..instanced.amount as u32,
            &ctx.camera.bind_group,
            &ctx.lights.bind_group,
        );
    }
}

fn draw_depth<'a>(shadow_pass: &mut wgpu::RenderPass<'a>, casters: &[Instanced<'a>]) {
    for instanced in casters {
        if instanced.amount == 0 || instanced.instance.size() == 0 {
            continue;
        }
        shadow_pass.set_vertex_buffer(1, instanced.instance.slice(..));
        shadow_pass.draw_model_depth(instanced.model, 0..instanced.amount as u32);
    }
}

/// Futures handed out by the flows that have not finished yet.
#[cfg(not(target_arch = "wasm32"))]
struct Pending<State, Event> {
    events: FuturesUnordered<Pin<Box<dyn Future<Output = Event>>>>,
    mutations: FuturesUnordered<Pin<Box<dyn Future<Output = Box<dyn FnOnce(&mut State)>>>>>,
}

#[cfg(not(target_arch = "wasm32"))]
impl<State, Event> Default for Pending<State, Event> {
    fn default() -> Self {
        Self {
            events: FuturesUnordered::new(),
            mutations: FuturesUnordered::new(),
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl<State, Event> Pending<State, Event> {
    /// Poll every future once without blocking. Finished events are queued on
    /// the event loop, finished mutations are applied to `state` right away.
    fn poll(
        &mut self,
        state: &mut State,
        proxy: &winit::event_loop::EventLoopProxy<FlowEvent<State, Event>>,
    ) {
        while let Some(Some(event)) = self.events.next().now_or_never() {
            if proxy.send_event(FlowEvent::Custom(event)).is_err() {
                log::error!("Event loop was closed before all events could be processed.");
                return;
            }
        }
        while let Some(Some(mutation)) = self.mutations.next().now_or_never() {
            mutation(state);
        }
    }
}

pub struct App<State: 'static, Event: 'static> {
    #[cfg(not(target_arch = "wasm32"))]
    async_runtime: tokio::runtime::Runtime,
    #[cfg(not(target_arch = "wasm32"))]
    pending: Pending<State, Event>,
    proxy: winit::event_loop::EventLoopProxy<FlowEvent<State, Event>>,
    state: Option<AppState<State>>,
    // This will hold the fully initialized flows once they are ready.
    graphics_flows: Vec<Box<dyn GraphicsFlow<State, Event>>>,
    // This holds the constructors at the start.
    // We use Option to `take()` it after use.
    constructors: Option<Vec<FlowConstructor<State, Event>>>,
    last_time: Instant,
    time_since_tick: Duration,
    #[cfg(feature = "integration-tests")]
    verdict: TestVerdict,
    fatal: Option<String>,
}

impl<State, Event> App<State, Event>
where
    State: 'static,
    Event: 'static,
{
    fn new(
        event_loop: &EventLoop<FlowEvent<State, Event>>,
        constructors: Vec<FlowConstructor<State, Event>>,
    ) -> anyhow::Result<Self> {
        let proxy = event_loop.create_proxy();
        #[cfg(not(target_arch = "wasm32"))]
        let async_runtime = tokio::runtime::Runtime::new()?;
        Ok(Self {
            #[cfg(not(target_arch = "wasm32"))]
            async_runtime,
            #[cfg(not(target_arch = "wasm32"))]
            pending: Pending::default(),
            proxy,
            state: None,
            graphics_flows: Vec::new(),
            constructors: Some(constructors),
            last_time: Instant::now(),
            time_since_tick: Duration::from_millis(0),
            #[cfg(feature = "integration-tests")]
            verdict: TestVerdict::Running,
            fatal: None,
        })
    }

    fn abort(&mut self, event_loop: &ActiveEventLoop, message: String) {
        log::error!("{message}");
        self.fatal = Some(message);
        event_loop.exit();
    }
}

// natively only `Custom` is ever sent, the rest come from spawned wasm tasks
pub(crate) enum FlowEvent<State: 'static, Event: 'static> {
    #[cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]
    Initialized {
        state: AppState<State>,
        flows: Vec<Box<dyn GraphicsFlow<State, Event>>>,
    },
    #[cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]
    InitFailed(String),
    #[cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]
    Mut(Box<dyn FnOnce(&mut State)>),
    Custom(Event),
}

impl<State, Event> Debug for FlowEvent<State, Event> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Initialized { state: _, flows } => {
                f.debug_struct("Initialized").field("flows", flows).finish()
            }
            Self::InitFailed(message) => f.debug_tuple("InitFailed").field(message).finish(),
            Self::Mut(_) => f.write_str("Mut(|&mut State| -> {...})"),
            Self::Custom(_) => f.write_str("Custom(E)"),
        }
    }
}

impl<State: 'static + Default, Event: 'static> App<State, Event> {
    fn run_on_init(&mut self) {
        let Some(app_state) = self.state.as_mut() else {
            return;
        };
        let size = app_state.ctx.window.inner_size();
        app_state.resize(size.width, size.height);
        self.graphics_flows.iter_mut().for_each(|flow| {
            let events = flow.on_init(&mut app_state.ctx, &mut app_state.state);
            handle_flow_output(
                #[cfg(not(target_arch = "wasm32"))]
                &mut self.pending,
                &mut app_state.ctx,
                self.proxy.clone(),
                events,
            );
        });
        // on_init may have moved the camera
        app_state.update_camera();
        app_state.ctx.window.request_redraw();
    }
}

impl<State: 'static + Default, Event: 'static> ApplicationHandler<FlowEvent<State, Event>>
    for App<State, Event>
{
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        let Some(constructors) = self.constructors.take() else {
            return;
        };

        #[allow(unused_mut)]
        let mut window_attributes = Window::default_attributes().with_title("Firefly Grove");

        #[cfg(target_arch = "wasm32")]
        {
            use winit::platform::web::WindowAttributesExtWebSys;

            // winit appends the canvas to the document body
            window_attributes = window_attributes.with_append(true);
        }

        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => return self.abort(event_loop, format!("Could not create a window: {e}")),
        };

        #[cfg(target_arch = "wasm32")]
        if let Some(browser) = web_sys::window() {
            let width = browser.inner_width().ok().and_then(|w| w.as_f64());
            let height = browser.inner_height().ok().and_then(|h| h.as_f64());
            if let (Some(width), Some(height)) = (width, height) {
                let _ = window.request_inner_size(winit::dpi::LogicalSize::new(width, height));
            }
        }

        let init_future = async move {
            let app_state = AppState::new(window).await?;

            let flow_futures: Vec<_> = constructors
                .into_iter()
                // The clone in into() leverages the internal Arcs of Device and Queue and thus only clones the ref
                .map(|constructor| constructor((&app_state.ctx).into()))
                .collect();
            let flows: Vec<_> = futures::future::join_all(flow_futures).await;
            anyhow::Ok((app_state, flows))
        };

        #[cfg(not(target_arch = "wasm32"))]
        {
            match self.async_runtime.block_on(init_future) {
                Ok((app_state, flows)) => {
                    self.state = Some(app_state);
                    self.graphics_flows = flows;
                    self.run_on_init();
                }
                Err(e) => self.abort(
                    event_loop,
                    format!("App initialization failed. Cannot create the main context: {e:#}"),
                ),
            }
        }

        #[cfg(target_arch = "wasm32")]
        {
            let proxy = self.proxy.clone();
            wasm_bindgen_futures::spawn_local(async move {
                let event = match init_future.await {
                    Ok((state, flows)) => FlowEvent::Initialized { state, flows },
                    Err(e) => FlowEvent::InitFailed(format!(
                        "App initialization failed. Cannot create the main context: {e:#}"
                    )),
                };
                if proxy.send_event(event).is_err() {
                    log::error!("The event loop closed before the app was initialized.");
                }
            });
        }
    }

    fn user_event(&mut self, event_loop: &ActiveEventLoop, event: FlowEvent<State, Event>) {
        match event {
            FlowEvent::Initialized { state, flows } => {
                // This is the message from our wasm `spawn_local`
                self.state = Some(state);
                self.graphics_flows = flows;
                self.run_on_init();
            }
            FlowEvent::InitFailed(message) => self.abort(event_loop, message),
            FlowEvent::Custom(custom_event) => {
                if let Some(state) = &mut self.state {
                    let result = self
                        .graphics_flows
                        .iter_mut()
                        .fold(Some(custom_event), |event, flow| {
                            flow.on_custom_events(&state.ctx, &mut state.state, event?)
                        });
                    if result.is_some() {
                        log::warn!("Warning! Custom event was not consumed this cycle");
                    }
                }
            }
            FlowEvent::Mut(fn_once) => {
                if let Some(state) = &mut self.state {
                    fn_once(&mut state.state);
                }
            }
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: DeviceId,
        event: DeviceEvent,
    ) {
        let state = match &mut self.state {
            Some(state) => state,
            None => return,
        };
        self.graphics_flows.iter_mut().for_each(|f| {
            let events = f.on_device_events(&state.ctx, &mut state.state, &event);
            handle_flow_output(
                #[cfg(not(target_arch = "wasm32"))]
                &mut self.pending,
                &mut state.ctx,
                self.proxy.clone(),
                events,
            );
        });
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

        // general stuff
        state.ctx.camera.controller.handle_window_events(&event);

        if let WindowEvent::CursorMoved { position, .. } = event {
            let dx = position.x - state.ctx.mouse.coords.x;
            let dy = position.y - state.ctx.mouse.coords.y;
            let height = state.ctx.config.height;
            match state.ctx.mouse.pressed {
                MouseButtonState::Left => state.ctx.camera.controller.handle_rotate(dx, dy, height),
                MouseButtonState::Right => state.ctx.camera.controller.handle_pan(dx, dy, height),
                MouseButtonState::None => (),
            }
            state.ctx.mouse.coords = position;
        };

        self.graphics_flows.iter_mut().for_each(|f| {
            let events = f.on_window_events(&state.ctx, &mut state.state, &event);
            handle_flow_output(
                #[cfg(not(target_arch = "wasm32"))]
                &mut self.pending,
                &mut state.ctx,
                self.proxy.clone(),
                events,
            );
        });

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => state.resize(size.width, size.height),
            WindowEvent::RedrawRequested => {
                let dt = self.last_time.elapsed();
                self.last_time = Instant::now();
                self.time_since_tick += dt;

                state.update_camera();

                #[cfg(not(target_arch = "wasm32"))]
                {
                    // tokio::fs needs the runtime in scope while it is polled
                    let _guard = self.async_runtime.enter();
                    self.pending.poll(&mut state.state, &self.proxy);
                }

                // Update custom stuff
                self.graphics_flows.iter_mut().for_each(|f| {
                    let events = f.on_update(&state.ctx, &mut state.state, dt);
                    handle_flow_output(
                        #[cfg(not(target_arch = "wasm32"))]
                        &mut self.pending,
                        &mut state.ctx,
                        self.proxy.clone(),
                        events,
                    );
                });
                if self.time_since_tick >= Duration::from_millis(state.ctx.tick_duration_millis) {
                    self.graphics_flows.iter_mut().for_each(|f| {
                        let events = f.on_tick(&state.ctx, &mut state.state);
                        handle_flow_output(
                            #[cfg(not(target_arch = "wasm32"))]
                            &mut self.pending,
                            &mut state.ctx,
                            self.proxy.clone(),
                            events,
                        );
                    });
                    self.time_since_tick = Duration::from_millis(0);
                }

                state.render(
                    &self.graphics_flows,
                    #[cfg(feature = "integration-tests")]
                    &self.async_runtime,
                    #[cfg(feature = "integration-tests")]
                    &mut self.verdict,
                );

                #[cfg(feature = "integration-tests")]
                {
                    match std::mem::take(&mut self.verdict) {
                        TestVerdict::Running => (),
                        TestVerdict::Passed => event_loop.exit(),
                        TestVerdict::Failed(message) => self.abort(event_loop, message),
                    }
                }
            }
            WindowEvent::MouseInput {
                state: button_state,
                button,
                ..
            } => match (button, button_state.is_pressed()) {
                (MouseButton::Left, true) => {
                    state.ctx.mouse.pressed = MouseButtonState::Left;
                    let (width, height) = state.ctx.surface_size();
                    let ray = state.ctx.camera.camera.cast_ray_from_mouse(
                        state.ctx.mouse.coords,
                        width,
                        height,
                        &state.ctx.projection,
                    );
                    self.graphics_flows.iter_mut().for_each(|flow| {
                        let events = flow.on_click(&state.ctx, &mut state.state, &ray);
                        handle_flow_output(
                            #[cfg(not(target_arch = "wasm32"))]
                            &mut self.pending,
                            &mut state.ctx,
                            self.proxy.clone(),
                            events,
                        );
                    });
                }
                (MouseButton::Right, true) => {
                    state.ctx.mouse.pressed = MouseButtonState::Right;
                }
                (_, false) => state.ctx.mouse.pressed = MouseButtonState::None,
                _ => (),
            },
            _ => {}
        }
    }
}

fn handle_flow_output<State, Event>(
    #[cfg(not(target_arch = "wasm32"))] pending: &mut Pending<State, Event>,
    ctx: &mut Context,
    #[cfg_attr(not(target_arch = "wasm32"), allow(unused_variables))]
    proxy: winit::event_loop::EventLoopProxy<FlowEvent<State, Event>>,
    out: Out<State, Event>,
) {
    match out {
        // Send the events passed by the user to winit
        Out::FutEvent(futures) => {
            #[cfg(not(target_arch = "wasm32"))]
            pending.events.extend(futures.into_iter().map(Pin::from));

            #[cfg(target_arch = "wasm32")]
            {
                // every future settles on its own schedule
                for future in futures {
                    let proxy = proxy.clone();
                    wasm_bindgen_futures::spawn_local(async move {
                        let event = Pin::from(future).await;
                        if proxy.send_event(FlowEvent::Custom(event)).is_err() {
                            log::error!("Event loop was closed before an event could be processed.");
                        }
                    });
                }
            }
        }
        // Natively the mutation is applied when polled, on the web it comes back as an event
        Out::FutFn(futures) => {
            #[cfg(not(target_arch = "wasm32"))]
            pending.mutations.extend(futures.into_iter().map(Pin::from));

            #[cfg(target_arch = "wasm32")]
            {
                let fut = futures::future::join_all(futures.into_iter().map(Pin::from));
                wasm_bindgen_futures::spawn_local(async move {
                    for mutation in fut.await {
                        if proxy.send_event(FlowEvent::Mut(mutation)).is_err() {
                            log::error!("Event loop was closed before a state change could be applied.");
                            return;
                        }
                    }
                });
            }
        }
        Out::Configure(f) => f(ctx),
        Out::Empty => (),
    }
}

pub fn run<State: 'static + Default, Event: 'static>(
    constructors: Vec<FlowConstructor<State, Event>>,
) -> anyhow::Result<()> {
    #[cfg(not(target_arch = "wasm32"))]
    {
        if let Err(e) = env_logger::try_init() {
            eprintln!("Warning: Could not initialize logger: {}", e);
        };
    }

    #[cfg(target_arch = "wasm32")]
    {
        if let Err(e) = console_log::init_with_level(log::Level::Info) {
            web_sys::console::warn_1(&format!("Could not initialize logger: {e}").into());
        }
    }

    #[cfg(all(feature = "integration-tests", target_os = "linux"))]
    let event_loop: EventLoop<FlowEvent<State, Event>> = {
        use winit::platform::wayland::EventLoopBuilderExtWayland;

        winit::event_loop::EventLoop::with_user_event()
            .with_any_thread(true)
            .build()?
    };

    #[cfg(all(feature = "integration-tests", target_os = "windows"))]
    let event_loop: EventLoop<FlowEvent<State, Event>> = {
        use winit::platform::windows::EventLoopBuilderExtWindows;

        winit::event_loop::EventLoop::with_user_event()
            .with_any_thread(true)
            .build()?
    };

    #[cfg(not(all(
        feature = "integration-tests",
        any(target_os = "linux", target_os = "windows")
    )))]
    let event_loop: EventLoop<FlowEvent<State, Event>> = EventLoop::with_user_event().build()?;

    let mut app: App<State, Event> = App::new(&event_loop, constructors)?;

    event_loop.run_app(&mut app)?;

    match app.fatal {
        Some(message) => Err(anyhow::anyhow!(message)),
        None => Ok(()),
    }
}
