use cgmath::{Deg, EuclideanSpace, InnerSpace, Point3, Vector3, Vector4};
use firefly_grove::{
    PhysicalPosition,
    camera::{Camera, OrbitController, Projection, Ray},
};

fn assert_close(actual: Point3<f32>, expected: Point3<f32>, tolerance: f32) {
    let diff = actual - expected;
    assert!(diff.magnitude() <= tolerance, "{actual:?} is not within {tolerance} of {expected:?}");
}

fn front_camera() -> (Camera, Projection) {
    (
        Camera::new((0.0, 0.0, 10.0), (0.0, 0.0, 0.0)),
        Projection::new(800, 600, Deg(75.0), 0.1, 1000.0),
    )
}

#[test]
fn should_cast_the_centre_ray_straight_ahead() {
    let (camera, projection) = front_camera();
    let ray = camera.cast_ray_from_mouse(PhysicalPosition::new(400.0, 300.0), 800, 600, &projection);
    assert_eq!(ray.origin, camera.position);
    assert!((ray.direction - Vector3::new(0.0, 0.0, -1.0)).magnitude() < 1e-6);
}

#[test]
fn should_cast_rays_that_project_back_onto_their_pixel() {
    let camera = Camera::new((3.0, 4.0, 12.0), (0.0, 1.0, 0.0));
    let projection = Projection::new(800, 600, Deg(75.0), 0.1, 1000.0);
    let view_proj = projection.calc_matrix() * camera.calc_matrix();

    // top right quadrant: ndc (0.5, 0.5)
    let ray = camera.cast_ray_from_mouse(PhysicalPosition::new(600.0, 150.0), 800, 600, &projection);
    let point = ray.at(25.0);
    let clip: Vector4<f32> = view_proj * point.to_vec().extend(1.0);
    let (x, y) = (clip.x / clip.w, clip.y / clip.w);

    assert!((x - 0.5).abs() < 1e-3, "ndc x was {x}");
    assert!((y - 0.5).abs() < 1e-3, "ndc y was {y}");
}

#[test]
fn should_hit_the_near_side_of_a_sphere() {
    let ray = Ray::new(Point3::new(0.0, 0.0, 10.0), Vector3::new(0.0, 0.0, -2.0));
    assert_eq!(ray.direction, Vector3::new(0.0, 0.0, -1.0));
    let hit = ray.intersect_sphere(Point3::origin(), 2.0).expect("hit");
    assert!((hit - 8.0).abs() < 1e-5);
}

#[test]
fn should_hit_the_far_side_from_inside() {
    let ray = Ray::new(Point3::origin(), Vector3::unit_x());
    let hit = ray.intersect_sphere(Point3::origin(), 3.0).expect("hit");
    assert!((hit - 3.0).abs() < 1e-5);
}

#[test]
fn should_miss_a_sphere_off_to_the_side() {
    let ray = Ray::new(Point3::new(0.0, 0.0, 10.0), Vector3::new(0.0, 0.0, -1.0));
    assert_eq!(ray.intersect_sphere(Point3::new(5.0, 0.0, 0.0), 2.0), None);
}

#[test]
fn should_leave_the_camera_alone_without_input() {
    let (mut camera, projection) = front_camera();
    let mut controller = OrbitController::new(0.25);
    assert!(controller.is_idle());
    controller.update(&mut camera, &projection);
    assert_eq!(camera.position, Point3::new(0.0, 0.0, 10.0));
}

#[test]
fn should_ease_a_rotation_out_over_many_frames() {
    let (mut camera, projection) = front_camera();
    let mut controller = OrbitController::new(0.25);

    // a sixth of the viewport height is a sixth of a turn
    controller.handle_rotate(100.0, 0.0, 600);
    controller.update(&mut camera, &projection);
    let after_one = camera.position;
    for _ in 0..200 {
        controller.update(&mut camera, &projection);
    }

    assert!(after_one.x > -8.66, "the first frame should only apply part of the turn");
    let angle = -std::f32::consts::FRAC_PI_3;
    assert_close(
        camera.position,
        Point3::new(10.0 * angle.sin(), 0.0, 10.0 * angle.cos()),
        1e-2,
    );
    assert!(((camera.position - camera.target).magnitude() - 10.0).abs() < 1e-3);
    assert!(controller.is_idle());
}

#[test]
fn should_zoom_towards_the_target() {
    let (mut camera, projection) = front_camera();
    let mut controller = OrbitController::new(0.25);
    controller.handle_zoom(1.0);
    controller.update(&mut camera, &projection);
    assert!(((camera.position - camera.target).magnitude() - 9.5).abs() < 1e-4);
}

#[test]
fn should_clamp_the_zoom_distance() {
    let (mut camera, projection) = front_camera();
    let mut controller = OrbitController::new(0.25);
    controller.handle_zoom(1000.0);
    controller.update(&mut camera, &projection);
    assert!(((camera.position - camera.target).magnitude() - controller.min_distance).abs() < 1e-4);
}

#[test]
fn should_never_flip_over_the_pole() {
    let (mut camera, projection) = front_camera();
    let mut controller = OrbitController::new(1.0);
    controller.handle_rotate(0.0, 6000.0, 600);
    controller.update(&mut camera, &projection);
    let offset = camera.position - camera.target;
    assert!(offset.y.abs() < 10.0);
    assert!(offset.x.is_finite() && offset.z.is_finite());
}

#[test]
fn should_pan_the_target_with_the_camera() {
    let (mut camera, projection) = front_camera();
    let mut controller = OrbitController::new(1.0);
    controller.handle_pan(60.0, 0.0, 600);
    controller.update(&mut camera, &projection);
    // dragging right moves the view left
    assert!(camera.target.x < 0.0);
    assert!((camera.position.x - camera.target.x).abs() < 1e-4);
    assert!(((camera.position - camera.target).magnitude() - 10.0).abs() < 1e-3);
}
