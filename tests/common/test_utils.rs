#[cfg(feature = "integration-tests")]
use firefly_grove::{
    camera::Ray,
    context::Context,
    flow::{GraphicsFlow, ImageTestResult, Out},
    render::Render,
};

/// Lifecycle bookkeeping shared by the flow integration tests.
pub(crate) struct State {
    frame_counter: u32,
    init_invocations: u32,
    click_invocations: u32,
    update_invocations: u32,
    pub dummy_state: String,
}

impl State {
    pub fn new() -> Self {
        Self {
            frame_counter: 0,
            init_invocations: 0,
            click_invocations: 0,
            update_invocations: 0,
            dummy_state: String::new(),
        }
    }

    pub fn frame(&mut self) {
        self.frame_counter += 1;
    }

    pub fn init(&mut self) {
        self.init_invocations += 1;
    }

    pub fn click(&mut self) {
        self.click_invocations += 1;
    }

    pub fn update(&mut self) {
        self.update_invocations += 1;
    }

    pub fn frame_counter(&self) -> u32 {
        self.frame_counter
    }

    pub fn init_invocations(&self) -> u32 {
        self.init_invocations
    }

    pub fn update_invocations(&self) -> u32 {
        self.update_invocations
    }

    pub fn click_invocations(&self) -> u32 {
        self.click_invocations
    }
}

impl Default for State {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Default)]
pub(crate) struct FrameCounter(pub(crate) u32);

impl FrameCounter {
    pub(crate) fn frame(&self) -> u32 {
        self.0
    }

    pub(crate) fn progress(&mut self) {
        self.0 += 1;
    }
}

#[cfg(feature = "integration-tests")]
pub(crate) type Capture = image::ImageBuffer<image::Rgba<u8>, wgpu::BufferView>;

#[cfg(feature = "integration-tests")]
type Validate = Box<
    dyn Fn(&Context, &mut FrameCounter, &mut Capture) -> Result<ImageTestResult, anyhow::Error>,
>;

/// A flow that draws nothing and hands every captured frame to `validate`.
#[cfg(feature = "integration-tests")]
pub(crate) struct TestRender {
    setup: Box<dyn Fn(&mut Context)>,
    validate: Validate,
}

#[cfg(feature = "integration-tests")]
impl TestRender {
    pub(crate) fn new(
        setup: impl Fn(&mut Context) + 'static,
        validate: impl Fn(&Context, &mut FrameCounter, &mut Capture) -> Result<ImageTestResult, anyhow::Error>
        + 'static,
    ) -> Self {
        Self {
            setup: Box::new(setup),
            validate: Box::new(validate),
        }
    }
}

#[cfg(feature = "integration-tests")]
impl GraphicsFlow<FrameCounter, ()> for TestRender {
    fn on_init(&mut self, ctx: &mut Context, _: &mut FrameCounter) -> Out<FrameCounter, ()> {
        (self.setup)(ctx);
        Out::Empty
    }

    fn on_click(&mut self, _: &Context, _: &mut FrameCounter, _: &Ray) -> Out<FrameCounter, ()> {
        Out::Empty
    }

    fn on_update(
        &mut self,
        _: &Context,
        state: &mut FrameCounter,
        _: instant::Duration,
    ) -> Out<FrameCounter, ()> {
        state.progress();
        Out::Empty
    }

    fn on_tick(&mut self, _: &Context, _: &mut FrameCounter) -> Out<FrameCounter, ()> {
        Out::Empty
    }

    fn on_device_events(
        &mut self,
        _: &Context,
        _: &mut FrameCounter,
        _: &firefly_grove::DeviceEvent,
    ) -> Out<FrameCounter, ()> {
        Out::Empty
    }

    fn on_window_events(
        &mut self,
        _: &Context,
        _: &mut FrameCounter,
        _: &firefly_grove::WindowEvent,
    ) -> Out<FrameCounter, ()> {
        Out::Empty
    }

    fn on_custom_events(&mut self, _: &Context, _: &mut FrameCounter, event: ()) -> Option<()> {
        Some(event)
    }

    fn on_render(&self) -> Render<'_> {
        Render::None
    }

    fn render_to_texture(
        &self,
        ctx: &Context,
        state: &mut FrameCounter,
        texture: &mut Capture,
    ) -> Result<ImageTestResult, anyhow::Error> {
        (self.validate)(ctx, state, texture)
    }
}

#[macro_export]
macro_rules! golden_image_test {
    ($graphics_elem:expr) => {{
        use firefly_grove::flow::{FlowConstructor, GraphicsFlow};
        use $crate::common::test_utils::FrameCounter;
        let model_constructor: FlowConstructor<FrameCounter, ()> = Box::new(|_| {
            Box::pin(async move {
                let g_flow: Box<dyn GraphicsFlow<FrameCounter, ()>> = Box::new($graphics_elem);
                g_flow
            })
        });

        firefly_grove::flow::run(vec![model_constructor])
            .expect("Failed to run flow for integration test.");
    }};
    // a flow over its own state, built from the engine's init context
    ($state:ty, $event:ty, $make_flow:expr) => {{
        use firefly_grove::flow::{FlowConstructor, GraphicsFlow};
        let make_flow = $make_flow;
        let model_constructor: FlowConstructor<$state, $event> = Box::new(move |init| {
            Box::pin(async move {
                let g_flow: Box<dyn GraphicsFlow<$state, $event>> = Box::new(make_flow(init));
                g_flow
            })
        });

        firefly_grove::flow::run(vec![model_constructor])
            .expect("Failed to run flow for integration test.");
    }};
}
