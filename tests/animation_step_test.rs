use cgmath::{Point3, Vector3};
use firefly_grove::scene::{
    GroveState,
    animator::{Orbit, orbit_position},
    config::{GroveConfig, Role},
    fireflies::{Firefly, Swarm},
};
use instant::Duration;
use rand::{SeedableRng, rngs::StdRng};

const FRAME: Duration = Duration::from_millis(16);

fn dyadic_swarm() -> Swarm {
    Swarm::from_fireflies(vec![
        Firefly {
            position: Point3::new(0.5, 0.25, -1.0),
            velocity: Vector3::new(0.125, -0.0625, 0.25),
        },
        Firefly {
            position: Point3::new(-3.0, 4.5, 2.0),
            velocity: Vector3::new(-0.5, 0.0, 0.03125),
        },
    ])
}

fn assert_close(actual: Point3<f32>, expected: Point3<f32>, tolerance: f32) {
    let diff = actual - expected;
    assert!(
        diff.x.abs() <= tolerance && diff.y.abs() <= tolerance && diff.z.abs() <= tolerance,
        "{actual:?} is not within {tolerance} of {expected:?}"
    );
}

#[test]
fn should_move_every_firefly_by_its_velocity_each_step() {
    let swarm = dyadic_swarm();
    let initial = swarm.clone();
    let mut state = GroveState::with_swarm(GroveConfig::default(), swarm);

    for _ in 0..8 {
        state.step(FRAME);
    }

    for (firefly, start) in state.swarm.fireflies.iter().zip(&initial.fireflies) {
        assert_eq!(firefly.position, start.position + start.velocity * 8.0);
        assert_eq!(firefly.velocity, start.velocity);
    }
}

#[test]
fn should_never_wrap_drifting_fireflies() {
    let mut swarm = Swarm::from_fireflies(vec![Firefly {
        position: Point3::new(49.0, 0.0, 0.0),
        velocity: Vector3::new(1.0, 0.0, 0.0),
    }]);
    for _ in 0..100 {
        swarm.step();
    }
    assert_eq!(swarm.fireflies[0].position, Point3::new(149.0, 0.0, 0.0));
}

#[test]
fn should_spin_x_and_y_but_not_z() {
    let mut config = GroveConfig::default();
    config.spin_delta = 0.125;
    let mut state = GroveState::with_swarm(config, Swarm::default());

    for _ in 0..16 {
        state.step(FRAME);
    }

    for role in [Role::Cube, Role::Cylinder] {
        let spinner = state.spinner(role).expect("spinner exists");
        assert_eq!(spinner.orientation.x.0, 2.0);
        assert_eq!(spinner.orientation.y.0, 2.0);
        assert_eq!(spinner.orientation.z.0, 0.0);
    }
}

#[test]
fn should_start_the_orbit_on_the_x_axis() {
    let orbit = Orbit::new(500.0, 30_000.0);
    assert_close(orbit.position, Point3::new(500.0, 0.0, 0.0), 1e-4);
    assert_close(orbit_position(0.0, 30_000.0, 500.0), Point3::new(500.0, 0.0, 0.0), 1e-4);
}

#[test]
fn should_share_sin_between_y_and_z_a_quarter_period_in() {
    let mut state = GroveState::with_swarm(GroveConfig::default(), Swarm::default());
    state.step(Duration::from_millis(7_500));
    assert_close(state.sun.position, Point3::new(0.0, 500.0, 500.0), 1e-2);
    assert_eq!(state.sun.position.y, state.sun.position.z);
}

#[test]
fn should_return_to_the_start_after_a_full_period() {
    let mut state = GroveState::with_swarm(GroveConfig::default(), Swarm::default());
    for _ in 0..4 {
        state.step(Duration::from_millis(7_500));
    }
    assert_close(state.sun.position, Point3::new(500.0, 0.0, 0.0), 1e-2);
    assert_eq!(state.frames, 4);
}

#[test]
fn should_scatter_the_same_swarm_for_the_same_seed() {
    let config = GroveConfig::default();
    let a = Swarm::scatter(&mut StdRng::seed_from_u64(42), &config);
    let b = Swarm::scatter(&mut StdRng::seed_from_u64(42), &config);
    assert_eq!(a, b);
    assert_eq!(a.len(), 50);
}

#[test]
fn should_scatter_inside_the_grove() {
    let config = GroveConfig::default();
    let swarm = Swarm::scatter(&mut StdRng::seed_from_u64(3), &config);
    let half_area = config.firefly_area / 2.0;
    let half_speed = config.firefly_speed / 2.0;
    for firefly in &swarm.fireflies {
        let p = firefly.position;
        assert!(p.x.abs() <= half_area && p.z.abs() <= half_area, "{p:?}");
        assert!((0.0..=config.firefly_max_height).contains(&p.y), "{p:?}");
        let v = firefly.velocity;
        assert!(v.x.abs() <= half_speed && v.y.abs() <= half_speed && v.z.abs() <= half_speed);
    }
}
