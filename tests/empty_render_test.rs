#[cfg(feature = "integration-tests")]
mod common;

#[test]
#[cfg(feature = "integration-tests")]
fn should_render_clear_colour() {
    use firefly_grove::{context::Context, flow::ImageTestResult};
    use wgpu::Color;

    use crate::common::test_utils::{FrameCounter, TestRender};

    golden_image_test!(TestRender::new(
        |ctx: &mut Context| {
            ctx.clear_colour = Color::WHITE;
            ctx.camera.camera.position = [0.0, 5.0, 2.0].into();
        },
        |_, state: &mut FrameCounter, texture| {
            if state.frame() == 0 {
                return Ok(ImageTestResult::Waiting);
            }
            let desired_pixel = image::Rgba([255, 255, 255, 255]);
            for pixel in texture.pixels() {
                assert_eq!(*pixel, desired_pixel);
            }
            Ok(ImageTestResult::Passed)
        },
    ));
}
