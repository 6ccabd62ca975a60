//! The grove as a [`GraphicsFlow`].

use cgmath::{Deg, Point3, Vector3};
use instant::Duration;
use winit::event::{DeviceEvent, WindowEvent};

#[cfg(feature = "integration-tests")]
use crate::flow::ImageTestResult;
use crate::{
    camera::{Camera, OrbitController, Projection, Ray},
    context::{Context, InitContext},
    data_structures::{
        instance::Instance,
        model::{Material, Model},
        scene_graph::{ModelNode, SceneNode},
        texture::Texture,
    },
    flow::{GraphicsFlow, Out},
    render::Render,
    resources::{load_model_gltf, texture::{load_texture, sky_bind_group}},
    scene::{
        GroveState,
        assembly::{Blueprint, Prop, Shading},
        config::{AssetId, Role},
    },
};

const WHITE: [u8; 4] = [255, 255, 255, 255];

/// A finished asset load. Failures carry the formatted error chain.
pub enum GroveEvent {
    Texture(AssetId, Result<Texture, String>),
    Model(AssetId, Result<Box<dyn SceneNode>, String>),
}

struct PropNode {
    prop: Prop,
    node: ModelNode,
}

struct LoadedModel {
    casts_shadow: bool,
    node: Box<dyn SceneNode>,
}

pub struct GroveFlow {
    init: InitContext,
    props: Vec<PropNode>,
    models: Vec<LoadedModel>,
    sky: Option<wgpu::BindGroup>,
}

impl GroveFlow {
    pub fn new(init: InitContext) -> Self {
        Self {
            init,
            props: Vec::new(),
            models: Vec::new(),
            sky: None,
        }
    }

    fn node_mut(&mut self, role: Role) -> Option<&mut ModelNode> {
        self.props
            .iter_mut()
            .find(|prop| prop.prop.role == role)
            .map(|prop| &mut prop.node)
    }

    fn upload(&self, prop: Prop) -> PropNode {
        let device = &self.init.device;
        let name = format!("{:?}", prop.role);
        let mesh = prop.shape.mesh().upload(device, &name, 0);
        let materials = prop
            .surfaces
            .iter()
            .map(|surface| {
                Material::new(
                    device,
                    &name,
                    Texture::from_colour(WHITE, device, &self.init.queue),
                    prop.material(surface),
                    &self.init.material_layout,
                )
            })
            .collect();
        let model = Model {
            meshes: vec![mesh],
            materials,
        };
        let mut node = ModelNode::from_model(0, device, model);
        node.add_instances(prop.placements.clone());
        node.update_world_transform_all();
        node.write_to_buffers(&self.init.queue, device);
        PropNode { prop, node }
    }

    /// Swap the white placeholder of every surface waiting for `id`.
    fn apply_texture(&mut self, id: AssetId, texture: &Texture) {
        let init = &self.init;
        for PropNode { prop, node } in self.props.iter_mut() {
            for (slot, surface) in prop.surfaces.iter().enumerate() {
                if surface.texture != Some(id) {
                    continue;
                }
                let material = Material::new(
                    &init.device,
                    &format!("{:?} {:?}", prop.role, id),
                    texture.clone(),
                    prop.material(surface),
                    &init.material_layout,
                );
                if let Some(old) = node.model_mut().materials.get_mut(slot) {
                    *old = material;
                }
            }
        }
    }

    fn sync_instances(&mut self, state: &GroveState, ctx: &Context) {
        for PropNode { prop, node } in self.props.iter_mut() {
            match prop.role {
                Role::Firefly => {
                    let fireflies = &state.swarm.fireflies;
                    node.set_local_transform_all(&mut |idx, instance| {
                        if let Some(firefly) = fireflies.get(idx) {
                            *instance = firefly.instance();
                        }
                    });
                }
                Role::Cube | Role::Cylinder => {
                    if let Some(spinner) = state.spinner(prop.role) {
                        node.set_local_transform(0, spinner.instance());
                    }
                }
                Role::Sun => {
                    let sun = state.sun.position;
                    node.set_local_transform(0, Instance::from(Vector3::new(sun.x, sun.y, sun.z)));
                }
                Role::Ground | Role::Lamp => continue,
            }
            node.update_world_transform_all();
            node.write_to_buffers(&ctx.queue, &ctx.device);
        }
    }

    fn load_futures(
        &self,
        state: &mut GroveState,
        blueprint: &Blueprint,
    ) -> Vec<Box<dyn Future<Output = GroveEvent>>> {
        let mut futures: Vec<Box<dyn Future<Output = GroveEvent>>> = Vec::new();
        for id in blueprint.textures() {
            state.assets.register(id);
            let init = self.init.clone();
            futures.push(Box::new(async move {
                let texture = load_texture(id.path(), false, &init.device, &init.queue, None)
                    .await
                    .map_err(|e| format!("{e:#}"));
                GroveEvent::Texture(id, texture)
            }));
        }
        for placement in &blueprint.models {
            let id = placement.asset;
            state.assets.register(id);
            let init = self.init.clone();
            futures.push(Box::new(async move {
                let model = load_model_gltf(id.path(), &init.device, &init.queue, &init.material_layout)
                    .await
                    .map_err(|e| format!("{e:#}"));
                GroveEvent::Model(id, model)
            }));
        }
        futures
    }
}

impl GraphicsFlow<GroveState, GroveEvent> for GroveFlow {
    fn on_init(&mut self, ctx: &mut Context, state: &mut GroveState) -> Out<GroveState, GroveEvent> {
        let blueprint = Blueprint::assemble(state);

        let camera = &blueprint.camera;
        ctx.camera.camera = Camera::new(camera.position, camera.target);
        ctx.camera.controller = OrbitController::new(camera.damping);
        let (width, height) = ctx.surface_size();
        ctx.projection = Projection::new(width, height, Deg(camera.fov_degrees), camera.znear, camera.zfar);

        self.props = blueprint
            .props
            .iter()
            .cloned()
            .map(|prop| self.upload(prop))
            .collect();
        let slot = state.lamp.material_slot();
        if let Some(lamp) = self.node_mut(Role::Lamp) {
            lamp.model_mut().use_material(slot);
        }
        ctx.lights.write(&ctx.queue, &blueprint.lights);
        log::info!(
            "Grove assembled: {} props, {} fireflies, {} point lights",
            blueprint.props.len(),
            blueprint.count(Role::Firefly),
            blueprint.lights.points.len()
        );

        Out::FutEvent(self.load_futures(state, &blueprint))
    }

    fn on_click(
        &mut self,
        _ctx: &Context,
        state: &mut GroveState,
        ray: &Ray,
    ) -> Out<GroveState, GroveEvent> {
        if state.lamp.handle_click(ray) {
            let slot = state.lamp.material_slot();
            if let Some(lamp) = self.node_mut(Role::Lamp) {
                lamp.model_mut().use_material(slot);
            }
        }
        Out::Empty
    }

    fn on_update(
        &mut self,
        ctx: &Context,
        state: &mut GroveState,
        dt: Duration,
    ) -> Out<GroveState, GroveEvent> {
        state.step(dt);
        self.sync_instances(state, ctx);
        let lights = state.scene_lights();
        Out::Configure(Box::new(move |ctx: &mut Context| {
            ctx.lights.write(&ctx.queue, &lights)
        }))
    }

    fn on_tick(&mut self, _ctx: &Context, state: &mut GroveState) -> Out<GroveState, GroveEvent> {
        log::debug!(
            "frame {}, {} assets pending",
            state.frames,
            state.assets.pending().len()
        );
        Out::Empty
    }

    fn on_device_events(
        &mut self,
        _: &Context,
        _: &mut GroveState,
        _: &DeviceEvent,
    ) -> Out<GroveState, GroveEvent> {
        Out::Empty
    }

    fn on_window_events(
        &mut self,
        _: &Context,
        _: &mut GroveState,
        _: &WindowEvent,
    ) -> Out<GroveState, GroveEvent> {
        Out::Empty
    }

    fn on_custom_events(
        &mut self,
        ctx: &Context,
        state: &mut GroveState,
        event: GroveEvent,
    ) -> Option<GroveEvent> {
        match event {
            GroveEvent::Texture(id, result) => {
                if !state.assets.resolve(id, &result) {
                    return None;
                }
                let Ok(texture) = result else {
                    return None;
                };
                if id == AssetId::Skybox {
                    self.sky = Some(sky_bind_group(&ctx.device, &ctx.sky_layout, &texture));
                } else {
                    self.apply_texture(id, &texture);
                }
            }
            GroveEvent::Model(id, result) => {
                if !state.assets.resolve(id, &result) {
                    return None;
                }
                let Ok(mut model) = result else {
                    return None;
                };
                let mut casts_shadow = false;
                if let Some(placement) = state.config.placement(id) {
                    let position = Point3::from(placement.position);
                    let instance = Instance::from(Vector3::new(position.x, position.y, position.z))
                        .with_uniform_scale(placement.scale);
                    model.set_local_transform(0, instance);
                    if placement.receives_shadow {
                        model.visit_models_mut(&mut |m| m.set_receives_shadows(&ctx.queue, true));
                    }
                    casts_shadow = placement.casts_shadow;
                }
                model.update_world_transform_all();
                model.write_to_buffers(&ctx.queue, &ctx.device);
                self.models.push(LoadedModel {
                    casts_shadow,
                    node: model,
                });
            }
        }
        None
    }

    fn on_render(&self) -> Render<'_> {
        let mut renders = Vec::with_capacity(2 * (self.props.len() + self.models.len()) + 1);
        if let Some(sky) = &self.sky {
            renders.push(Render::Sky(sky));
        }
        for PropNode { prop, node } in &self.props {
            renders.push(match prop.shading {
                Shading::Lit => Render::lit(node),
                Shading::Unlit => Render::unlit(node),
            });
            if prop.casts_shadow {
                renders.push(Render::casters(node));
            }
        }
        for model in &self.models {
            renders.push(Render::lit(model.node.as_ref()));
            if model.casts_shadow {
                renders.push(Render::casters(model.node.as_ref()));
            }
        }
        Render::Composed(renders)
    }

    #[cfg(feature = "integration-tests")]
    fn render_to_texture(
        &self,
        _ctx: &Context,
        state: &mut GroveState,
        _texture: &mut image::ImageBuffer<image::Rgba<u8>, wgpu::BufferView>,
    ) -> Result<ImageTestResult, anyhow::Error> {
        Ok(if state.assets.all_settled() {
            ImageTestResult::Passed
        } else {
            ImageTestResult::Waiting
        })
    }
}
