#[cfg(feature = "integration-tests")]
use firefly_grove::{
    camera::Ray,
    context::{Context, InitContext},
    flow::{GraphicsFlow, ImageTestResult, Out},
    render::Render,
    resources::asset::AssetStatus,
    scene::{
        GroveState,
        config::AssetId,
        grove::{GroveEvent, GroveFlow},
    },
};

#[cfg(feature = "integration-tests")]
mod common;

/// Runs the grove unchanged and checks how its assets settled once it reports done.
#[cfg(feature = "integration-tests")]
struct SettledGrove(GroveFlow);

#[cfg(feature = "integration-tests")]
impl GraphicsFlow<GroveState, GroveEvent> for SettledGrove {
    fn on_init(&mut self, ctx: &mut Context, state: &mut GroveState) -> Out<GroveState, GroveEvent> {
        self.0.on_init(ctx, state)
    }

    fn on_click(&mut self, ctx: &Context, state: &mut GroveState, ray: &Ray) -> Out<GroveState, GroveEvent> {
        self.0.on_click(ctx, state, ray)
    }

    fn on_update(
        &mut self,
        ctx: &Context,
        state: &mut GroveState,
        dt: instant::Duration,
    ) -> Out<GroveState, GroveEvent> {
        self.0.on_update(ctx, state, dt)
    }

    fn on_tick(&mut self, ctx: &Context, state: &mut GroveState) -> Out<GroveState, GroveEvent> {
        self.0.on_tick(ctx, state)
    }

    fn on_device_events(
        &mut self,
        ctx: &Context,
        state: &mut GroveState,
        event: &firefly_grove::DeviceEvent,
    ) -> Out<GroveState, GroveEvent> {
        self.0.on_device_events(ctx, state, event)
    }

    fn on_window_events(
        &mut self,
        ctx: &Context,
        state: &mut GroveState,
        event: &firefly_grove::WindowEvent,
    ) -> Out<GroveState, GroveEvent> {
        self.0.on_window_events(ctx, state, event)
    }

    fn on_custom_events(
        &mut self,
        ctx: &Context,
        state: &mut GroveState,
        event: GroveEvent,
    ) -> Option<GroveEvent> {
        self.0.on_custom_events(ctx, state, event)
    }

    fn on_render(&self) -> Render<'_> {
        self.0.on_render()
    }

    fn render_to_texture(
        &self,
        ctx: &Context,
        state: &mut GroveState,
        texture: &mut image::ImageBuffer<image::Rgba<u8>, wgpu::BufferView>,
    ) -> Result<ImageTestResult, anyhow::Error> {
        let verdict = self.0.render_to_texture(ctx, state, texture)?;
        if let ImageTestResult::Passed = verdict {
            // there is no assets/ directory next to the manifest, every load fails
            for id in AssetId::ALL {
                match state.assets.status(id) {
                    Some(AssetStatus::Failed(_)) => (),
                    other => anyhow::bail!("{id:?} settled as {other:?} instead of failing"),
                }
            }
            assert!(state.frames > 0, "the grove never advanced");
        }
        Ok(verdict)
    }
}

#[test]
#[cfg(feature = "integration-tests")]
fn should_settle_every_missing_asset_as_failed() {
    golden_image_test!(GroveState, GroveEvent, |init: InitContext| SettledGrove(
        GroveFlow::new(init)
    ));
}
