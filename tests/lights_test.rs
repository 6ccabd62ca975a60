use cgmath::{Matrix4, Point3, Vector4};
use firefly_grove::{
    data_structures::model::MaterialUniform,
    pipelines::light::{
        DirectionalLight, Fog, LightUniform, MAX_POINT_LIGHTS, PointLight, SceneLights, SpotLight,
    },
};

fn spot(casts_shadow: bool) -> SpotLight {
    SpotLight {
        position: Point3::new(0.0, 80.0, -40.0),
        target: Point3::new(0.0, 1.0, -40.0),
        colour: [1.0; 3],
        intensity: 50.0,
        range: 200.0,
        angle: std::f32::consts::FRAC_PI_4,
        penumbra: 0.5,
        decay: 1.0,
        casts_shadow,
    }
}

fn sun(position: [f32; 3], casts_shadow: bool) -> DirectionalLight {
    DirectionalLight {
        position: position.into(),
        colour: [1.0; 3],
        intensity: 5.0,
        visible: true,
        casts_shadow,
    }
}

/// Shadow map uv and depth of `world`, as the lit shader computes them.
fn shadow_coords(view_proj: Matrix4<f32>, world: [f32; 3]) -> (f32, f32, f32) {
    let clip = view_proj * Vector4::new(world[0], world[1], world[2], 1.0);
    let ndc = clip.truncate() / clip.w;
    (ndc.x * 0.5 + 0.5, 0.5 - ndc.y * 0.5, ndc.z)
}

fn point(x: f32, visible: bool) -> PointLight {
    PointLight {
        position: Point3::new(x, 0.0, 0.0),
        colour: [1.0, 1.0, 0.5],
        intensity: 10.0,
        range: 5.0,
        visible,
    }
}

#[test]
fn should_upload_only_visible_point_lights() {
    let lights = SceneLights {
        points: vec![point(0.0, true), point(1.0, false), point(2.0, true)],
        ..Default::default()
    };
    let uniform = lights.to_uniform();
    assert_eq!(uniform.point_count, 2);
    let xs: Vec<f32> = uniform.active_points().iter().map(|p| p.position[0]).collect();
    assert_eq!(xs, vec![0.0, 2.0]);
}

#[test]
fn should_truncate_to_the_uniform_capacity() {
    let lights = SceneLights {
        points: (0..MAX_POINT_LIGHTS + 6).map(|i| point(i as f32, true)).collect(),
        ..Default::default()
    };
    let uniform = lights.to_uniform();
    assert_eq!(uniform.point_count as usize, MAX_POINT_LIGHTS);
    assert_eq!(
        uniform.active_points().last().map(|p| p.position[0]),
        Some((MAX_POINT_LIGHTS - 1) as f32)
    );
}

#[test]
fn should_disable_fog_sun_and_spot_by_default() {
    let uniform = SceneLights::default().to_uniform();
    assert!(uniform.fog_far < uniform.fog_near);
    assert_eq!(uniform.sun.enabled, 0);
    assert_eq!(uniform.spot.enabled, 0);
    assert_eq!(uniform.point_count, 0);
}

#[test]
fn should_aim_the_spot_cone_at_its_target() {
    let lights = SceneLights {
        spot: Some(spot(false)),
        ..Default::default()
    };
    let spot = lights.to_uniform().spot;
    assert_eq!(spot.enabled, 1);
    assert!((spot.aim[1] + 1.0).abs() < 1e-6);
    assert!((spot.cos_outer - std::f32::consts::FRAC_PI_4.cos()).abs() < 1e-6);
    assert!((spot.cos_inner - (std::f32::consts::FRAC_PI_8).cos()).abs() < 1e-6);
    assert!(spot.cos_inner > spot.cos_outer);
}

#[test]
fn should_carry_the_fog_range() {
    let lights = SceneLights {
        fog: Fog {
            colour: [1.0; 3],
            near: 10.0,
            far: 150.0,
        },
        ..Default::default()
    };
    let uniform = lights.to_uniform();
    assert_eq!((uniform.fog_near, uniform.fog_far), (10.0, 150.0));
}

#[test]
fn should_match_the_shader_struct_layouts() {
    // offsets in lit.wgsl: points start at 272, each one takes 32 bytes
    assert_eq!(std::mem::size_of::<LightUniform>(), 272 + MAX_POINT_LIGHTS * 32);
    assert_eq!(std::mem::size_of::<MaterialUniform>(), 64);
}

#[test]
fn should_flag_only_casting_lights_for_shadows() {
    let uniform = SceneLights {
        sun: sun([0.0, 500.0, 0.0], true),
        spot: Some(spot(false)),
        ..Default::default()
    }
    .to_uniform();
    assert_eq!((uniform.sun_shadow, uniform.spot_shadow), (1, 0));

    let hidden_sun = DirectionalLight {
        visible: false,
        ..sun([0.0, 500.0, 0.0], true)
    };
    let uniform = SceneLights {
        sun: hidden_sun,
        spot: Some(spot(true)),
        ..Default::default()
    }
    .to_uniform();
    assert_eq!((uniform.sun_shadow, uniform.spot_shadow), (0, 1));
    assert_eq!(SceneLights::default().to_uniform().spot_shadow, 0);
}

#[test]
fn should_centre_the_sun_shadow_on_the_origin() {
    for position in [[0.0, 500.0, 0.0], [500.0, 0.0, 0.0], [300.0, 400.0, -100.0]] {
        let view_proj = sun(position, true).view_proj();
        let (u, v, depth) = shadow_coords(view_proj, [0.0, 0.0, 0.0]);
        assert!((u - 0.5).abs() < 1e-4 && (v - 0.5).abs() < 1e-4, "{position:?}: {u} {v}");
        assert!(depth > 0.0 && depth < 1.0, "{position:?}: depth {depth}");
    }
}

#[test]
fn should_put_closer_casters_in_front_for_the_sun() {
    let view_proj = sun([0.0, 500.0, 0.0], true).view_proj();
    let (_, _, ground) = shadow_coords(view_proj, [4.0, 0.0, 4.0]);
    let (_, _, cube) = shadow_coords(view_proj, [4.0, 15.0, 4.0]);
    assert!(cube < ground);
    let (u, _, _) = shadow_coords(view_proj, [150.0, 0.0, 0.0]);
    assert!(!(0.0..=1.0).contains(&u), "outside the covered square, u = {u}");
}

#[test]
fn should_centre_the_spot_shadow_on_its_target() {
    let spot = spot(true);
    let (u, v, depth) = shadow_coords(spot.view_proj(), spot.target.into());
    assert!((u - 0.5).abs() < 1e-4 && (v - 0.5).abs() < 1e-4, "{u} {v}");
    assert!(depth > 0.0 && depth < 1.0, "depth {depth}");

    let uniform = SceneLights {
        spot: Some(spot.clone()),
        ..Default::default()
    }
    .to_uniform();
    assert_eq!(uniform.spot_view_proj, Into::<[[f32; 4]; 4]>::into(spot.view_proj()));
}
