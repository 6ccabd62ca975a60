use cgmath::{InnerSpace, Point3, Vector3};
use firefly_grove::scene::{
    GroveState,
    assembly::{Blueprint, Shading, Shape},
    config::{AssetId, GroveConfig, Role},
    toggle::{SLOT_OFF, SLOT_ON},
};

fn seeded_state() -> GroveState {
    GroveState::from_config(GroveConfig::default().with_seed(2024))
}

#[test]
fn should_place_fifty_fireflies_and_one_ground() {
    let blueprint = Blueprint::assemble(&seeded_state());
    assert_eq!(blueprint.count(Role::Firefly), 50);
    assert_eq!(blueprint.count(Role::Ground), 1);
    assert_eq!(blueprint.count(Role::Lamp), 1);
    assert_eq!(blueprint.count(Role::Sun), 1);
    assert_eq!(blueprint.props.iter().filter(|p| p.role == Role::Ground).count(), 1);
}

#[test]
fn should_light_every_firefly_where_it_is() {
    let state = seeded_state();
    let blueprint = Blueprint::assemble(&state);
    let points = &blueprint.lights.points;

    assert_eq!(points.len(), 51);
    for (light, position) in points.iter().zip(state.swarm.positions()) {
        assert_eq!(light.position, position);
        assert_eq!(light.intensity, 10.0);
        assert_eq!(light.range, 5.0);
    }
    let lamp = points.last().expect("lamp light");
    assert_eq!(lamp.position, Point3::new(2.0, 24.0, -6.0));
}

#[test]
fn should_lay_the_ground_flat_and_tiled() {
    let blueprint = Blueprint::assemble(&seeded_state());
    let ground = blueprint.prop(Role::Ground).expect("ground");

    assert_eq!(
        ground.shape,
        Shape::Plane {
            width: 150.0,
            height: 150.0
        }
    );
    assert_eq!(ground.surfaces[0].texture, Some(AssetId::FloorTexture));
    assert_eq!(ground.surfaces[0].uv_repeat, [10.0, 10.0]);

    let placement = &ground.placements[0];
    assert_eq!(placement.position, Vector3::new(0.0, 1.0, 0.0));
    let up = placement.rotation * Vector3::unit_z();
    assert!((up - Vector3::unit_y()).magnitude() < 1e-5, "{up:?}");
}

#[test]
fn should_draw_the_lamp_unlit_with_two_looks() {
    let blueprint = Blueprint::assemble(&seeded_state());
    let lamp = blueprint.prop(Role::Lamp).expect("lamp");

    assert_eq!(lamp.shading, Shading::Unlit);
    assert_eq!(lamp.surfaces.len(), 2);
    assert_eq!(lamp.surfaces[SLOT_ON].colour, 0xffff00);
    assert_eq!(lamp.surfaces[SLOT_OFF].colour, 0x555555);
}

#[test]
fn should_make_fireflies_glow_without_a_base_colour() {
    let blueprint = Blueprint::assemble(&seeded_state());
    let fireflies = blueprint.prop(Role::Firefly).expect("fireflies");
    let uniform = fireflies.surfaces[0].uniform();

    assert_eq!(fireflies.shading, Shading::Lit);
    assert_eq!(uniform.base_colour, [0.0, 0.0, 0.0, 1.0]);
    assert_eq!(uniform.emissive_intensity, 20.0);
    assert!(uniform.emissive.iter().all(|channel| *channel > 0.0));
}

#[test]
fn should_fetch_the_three_models_and_all_textures() {
    let blueprint = Blueprint::assemble(&seeded_state());

    let models: Vec<AssetId> = blueprint.models.iter().map(|m| m.asset).collect();
    assert_eq!(models, vec![AssetId::MasterSword, AssetId::Forest, AssetId::Link]);
    assert_eq!(
        blueprint.textures(),
        vec![AssetId::FloorTexture, AssetId::Skybox, AssetId::NaviTexture]
    );
    assert_eq!(blueprint.background, AssetId::Skybox);
}

#[test]
fn should_put_the_spinners_where_they_spin() {
    let blueprint = Blueprint::assemble(&seeded_state());
    let cube = blueprint.prop(Role::Cube).expect("cube");
    let cylinder = blueprint.prop(Role::Cylinder).expect("cylinder");
    assert_eq!(cube.placements[0].position, Vector3::new(8.0, 15.0, 3.0));
    assert_eq!(cylinder.placements[0].position, Vector3::new(-2.0, 15.0, -6.0));
    assert_eq!(cube.surfaces[0].texture, Some(AssetId::NaviTexture));
}

#[test]
fn should_only_aim_the_spotlight_once_the_sword_is_loaded() {
    let mut state = seeded_state();
    for id in AssetId::ALL {
        state.assets.register(id);
    }
    assert!(Blueprint::assemble(&state).lights.spot.is_none());

    state.assets.resolve::<(), String>(AssetId::Forest, &Ok(()));
    assert!(state.scene_lights().spot.is_none());

    state.assets.resolve::<(), String>(AssetId::MasterSword, &Ok(()));
    let spot = state.scene_lights().spot.expect("spotlight");
    assert_eq!(spot.position, Point3::new(0.0, 80.0, -40.0));
    assert_eq!(spot.target, Point3::new(0.0, 1.0, -40.0));
    assert_eq!(spot.intensity, 50.0);
}

#[test]
fn should_keep_the_spotlight_off_when_the_sword_fails() {
    let mut state = seeded_state();
    state.assets.register(AssetId::MasterSword);
    state
        .assets
        .resolve::<(), String>(AssetId::MasterSword, &Err("404".to_string()));
    assert!(state.scene_lights().spot.is_none());
}

#[test]
fn should_fog_and_light_the_grove() {
    let lights = Blueprint::assemble(&seeded_state()).lights;
    assert_eq!(lights.fog.near, 10.0);
    assert_eq!(lights.fog.far, 150.0);
    assert_eq!(lights.ambient, [0.0; 3]);
    assert!(lights.sun.visible);
    assert_eq!(lights.sun.intensity, 5.0);
}

#[test]
fn should_cast_from_the_spinners_onto_the_ground() {
    let blueprint = Blueprint::assemble(&seeded_state());
    let flags = |role| {
        let prop = blueprint.prop(role).expect("prop");
        (prop.casts_shadow, prop.receives_shadow)
    };
    assert_eq!(flags(Role::Ground), (false, true));
    assert_eq!(flags(Role::Cube), (true, false));
    assert_eq!(flags(Role::Cylinder), (true, false));
    for role in [Role::Lamp, Role::Firefly, Role::Sun] {
        assert_eq!(flags(role), (false, false), "{role:?}");
    }

    let ground = blueprint.prop(Role::Ground).expect("ground");
    assert_eq!(ground.material(&ground.surfaces[0]).receives_shadows, 1);
    let cube = blueprint.prop(Role::Cube).expect("cube");
    assert_eq!(cube.material(&cube.surfaces[0]).receives_shadows, 0);
}

#[test]
fn should_let_only_the_sword_take_part_in_shadows() {
    let config = GroveConfig::default();
    let sword = config.placement(AssetId::MasterSword).expect("sword");
    assert!(sword.casts_shadow && sword.receives_shadow);
    for id in [AssetId::Forest, AssetId::Link] {
        let placement = config.placement(id).expect("model");
        assert!(!placement.casts_shadow && !placement.receives_shadow, "{id:?}");
    }
}

#[test]
fn should_cast_shadows_from_the_sun_and_the_spotlight() {
    let mut state = seeded_state();
    state.assets.register(AssetId::MasterSword);
    state.assets.resolve::<(), String>(AssetId::MasterSword, &Ok(()));
    let lights = state.scene_lights();
    assert!(lights.sun.casts_shadow);
    assert!(lights.spot.expect("spotlight").casts_shadow);
}
