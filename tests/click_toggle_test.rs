use cgmath::{Deg, Point3, Vector3};
use firefly_grove::{
    PhysicalPosition,
    camera::{Camera, Projection, Ray},
    scene::{
        GroveState,
        config::GroveConfig,
        fireflies::Swarm,
        toggle::{SLOT_OFF, SLOT_ON, ToggleLight},
    },
};

fn hit_ray() -> Ray {
    Ray::new(Point3::new(2.0, 24.0, 10.0), Vector3::new(0.0, 0.0, -1.0))
}

fn miss_ray() -> Ray {
    Ray::new(Point3::new(2.0, 24.0, 10.0), Vector3::new(0.0, 1.0, 0.0))
}

#[test]
fn should_start_switched_on() {
    let lamp = ToggleLight::new(&GroveConfig::default());
    assert!(lamp.is_on());
    assert_eq!(lamp.material_slot(), SLOT_ON);
    assert!(lamp.point_light().visible);
}

#[test]
fn should_flip_on_every_hit() {
    let mut lamp = ToggleLight::new(&GroveConfig::default());

    assert!(lamp.handle_click(&hit_ray()));
    assert!(!lamp.is_on());
    assert_eq!(lamp.material_slot(), SLOT_OFF);
    assert!(!lamp.point_light().visible);

    assert!(lamp.handle_click(&hit_ray()));
    assert!(lamp.is_on());
    assert_eq!(lamp.material_slot(), SLOT_ON);
}

#[test]
fn should_ignore_misses() {
    let mut lamp = ToggleLight::new(&GroveConfig::default());
    assert!(!lamp.handle_click(&miss_ray()));
    assert!(!lamp.handle_click(&miss_ray()));
    assert!(lamp.is_on());
}

#[test]
fn should_not_hit_a_lamp_behind_the_ray() {
    let mut lamp = ToggleLight::new(&GroveConfig::default());
    let away = Ray::new(Point3::new(2.0, 24.0, 10.0), Vector3::new(0.0, 0.0, 1.0));
    assert!(!lamp.handle_click(&away));
    assert!(lamp.is_on());
}

#[test]
fn should_toggle_through_a_click_in_the_middle_of_the_screen() {
    let mut lamp = ToggleLight::new(&GroveConfig::default());
    let camera = Camera::new((2.0, 24.0, 10.0), (2.0, 24.0, -6.0));
    let projection = Projection::new(800, 600, Deg(75.0), 0.1, 1000.0);

    let corner = camera.cast_ray_from_mouse(PhysicalPosition::new(0.0, 0.0), 800, 600, &projection);
    assert!(!lamp.handle_click(&corner));
    assert!(lamp.is_on());

    let centre = camera.cast_ray_from_mouse(PhysicalPosition::new(400.0, 300.0), 800, 600, &projection);
    assert!(lamp.handle_click(&centre));
    assert!(!lamp.is_on());
}

#[test]
fn should_drop_exactly_one_uploaded_light_when_switched_off() {
    let mut state = GroveState::from_config(GroveConfig::default().with_seed(11));
    let on = state.scene_lights().to_uniform().point_count;

    assert!(state.lamp.handle_click(&hit_ray()));
    let off = state.scene_lights().to_uniform().point_count;

    assert_eq!(on, 51);
    assert_eq!(off, on - 1);
}

#[test]
fn should_keep_the_lamp_light_at_the_lamp() {
    let state = GroveState::with_swarm(GroveConfig::default(), Swarm::default());
    let lights = state.scene_lights();
    assert_eq!(lights.points.len(), 1);
    let lamp = &lights.points[0];
    assert_eq!(lamp.position, Point3::new(2.0, 24.0, -6.0));
    assert_eq!(lamp.intensity, 15.0);
    assert_eq!(lamp.range, 15.0);
}
