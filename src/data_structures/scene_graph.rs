//! Scene graph and hierarchical scene organization.
//!
//! Every node holds a list of instances as `(local, world)` pairs. World
//! transforms are pushed down the tree by
//! [`update_world_transforms`](SceneNode::update_world_transforms). Instance
//! `i` of a parent drives instance `i` of each child.

use std::ops::Range;

use log::warn;
use wgpu::util::DeviceExt;

use crate::{
    data_structures::{
        instance::{Instance, InstanceRaw},
        model::{self, ModelVertex},
    },
    render::Instanced,
};

/// Turn a glTF node and its children into scene nodes.
///
/// `mats` is the material table of the whole document. Primitives without a
/// material use `default_material`.
pub fn to_scene_node(
    node: gltf::scene::Node,
    buf: &[Vec<u8>],
    device: &wgpu::Device,
    mats: &[model::Material],
    default_material: usize,
) -> Box<dyn SceneNode> {
    let mut scene_node: Box<dyn SceneNode> = match node.mesh() {
        Some(mesh) => {
            let mesh_name = mesh.name().unwrap_or("unknown_mesh");
            let meshes = mesh
                .primitives()
                .filter(|primitive| primitive.mode() == gltf::mesh::Mode::Triangles)
                .map(|primitive| {
                    let reader = primitive.reader(|buffer| buf.get(buffer.index()).map(Vec::as_slice));

                    let mut vertices: Vec<ModelVertex> = reader
                        .read_positions()
                        .map(|positions| {
                            positions
                                .map(|position| ModelVertex {
                                    position,
                                    tex_coords: [0.0; 2],
                                    normal: [0.0, 1.0, 0.0],
                                })
                                .collect()
                        })
                        .unwrap_or_default();
                    if let Some(normals) = reader.read_normals() {
                        vertices
                            .iter_mut()
                            .zip(normals)
                            .for_each(|(vertex, normal)| vertex.normal = normal);
                    }
                    if let Some(tex_coords) = reader.read_tex_coords(0) {
                        vertices
                            .iter_mut()
                            .zip(tex_coords.into_f32())
                            .for_each(|(vertex, uv)| vertex.tex_coords = uv);
                    }

                    let indices: Vec<u32> = match reader.read_indices() {
                        Some(indices) => indices.into_u32().collect(),
                        // non-indexed geometry draws its vertices in order
                        None => (0..vertices.len() as u32).collect(),
                    };

                    let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                        label: Some(&format!("{mesh_name} Vertex Buffer")),
                        contents: bytemuck::cast_slice(&vertices),
                        usage: wgpu::BufferUsages::VERTEX,
                    });
                    let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                        label: Some(&format!("{mesh_name} Index Buffer")),
                        contents: bytemuck::cast_slice(&indices),
                        usage: wgpu::BufferUsages::INDEX,
                    });
                    let material = primitive
                        .material()
                        .index()
                        .filter(|idx| *idx < mats.len())
                        .unwrap_or(default_material);

                    model::Mesh {
                        name: mesh_name.to_string(),
                        vertex_buffer,
                        index_buffer,
                        num_elements: indices.len() as u32,
                        material,
                    }
                })
                .filter(|mesh| mesh.num_elements > 0)
                .collect();
            let model = model::Model {
                meshes,
                materials: mats.to_vec(),
            };
            Box::new(ModelNode::from_model(1, device, model))
        }
        None => Box::new(ContainerNode::new(1)),
    };
    let (position, rotation, scale) = node.transform().decomposed();
    let instance = Instance {
        position: position.into(),
        rotation: rotation.into(),
        scale: scale.into(),
    };
    scene_node.set_local_transform(0, instance);
    for child in node.children() {
        let child_node = to_scene_node(child, buf, device, mats, default_material);
        scene_node.add_child(child_node);
    }

    scene_node
}

pub trait SceneNode {
    fn get_world_transforms(&self) -> Vec<Instance>;

    fn get_local_transform(&self, idx: usize) -> Option<Instance>;

    fn get_children(&self) -> &Vec<Box<dyn SceneNode>>;

    fn get_children_mut(&mut self) -> &mut Vec<Box<dyn SceneNode>>;

    fn add_child(&mut self, child: Box<dyn SceneNode>);

    fn set_local_transform(&mut self, idx: usize, instance: Instance);

    /// Mutate every local transform. The closure also receives the instance index.
    fn set_local_transform_all(&mut self, mutation: &mut dyn FnMut(usize, &mut Instance));

    fn write_to_buffers(&mut self, queue: &wgpu::Queue, device: &wgpu::Device);

    /**
     * Multiple instances of a parent can be passed down to multiple instances of multiple children.
     * The argument `parents_world_transform` with a matching `range` size provides control over which instances are transformed.
     */
    fn update_world_transforms(&mut self, range: Range<usize>, parents_world_transform: &[Instance]);

    fn update_world_transform_all(&mut self);

    fn add_instance(&mut self, instance: Instance) -> usize;

    fn add_instances(&mut self, instances: Vec<Instance>) -> usize;

    fn remove_instance(&mut self, idx: usize) -> Option<(Instance, Instance)>;

    fn instance_count(&self) -> usize;

    fn get_render(&self) -> Vec<Instanced<'_>>;

    /// Visit every model in this node and its descendants.
    fn visit_models_mut(&mut self, visit: &mut dyn FnMut(&mut model::Model));
}

/// Shared by both node kinds: write `parent * local` into the world half of each pair.
fn propagate(
    instances: &mut [(Instance, Instance)],
    range: Range<usize>,
    parents_world_transform: &[Instance],
) -> Option<Vec<Instance>> {
    if parents_world_transform.len() > instances.len() {
        warn!(
            "You tried to transform with len {}, but there are only {} instances to transform.",
            parents_world_transform.len(),
            instances.len()
        );
        return None;
    }
    let Some(slice) = instances.get_mut(range.clone()) else {
        warn!(
            "You tried to transform range {}..{}, which is out of bounds for parent len {}.",
            range.start,
            range.end,
            instances.len(),
        );
        return None;
    };
    let world_transforms = slice
        .iter_mut()
        .zip(parents_world_transform.iter())
        .map(|((local, world), parent)| {
            *world = parent * &*local;
            world.clone()
        })
        .collect();
    Some(world_transforms)
}

fn identity_pairs(amount: usize) -> Vec<(Instance, Instance)> {
    (0..amount)
        .map(|_| (Instance::default(), Instance::default()))
        .collect()
}

/// A node without geometry that only groups and transforms its children.
pub struct ContainerNode {
    pub children: Vec<Box<dyn SceneNode>>,
    pub instances: Vec<(Instance, Instance)>,
}

impl ContainerNode {
    pub fn new(amount: usize) -> Self {
        Self {
            instances: identity_pairs(amount),
            children: vec![],
        }
    }
}

impl SceneNode for ContainerNode {
    fn add_child(&mut self, child: Box<dyn SceneNode>) {
        self.children.push(child);
    }

    fn set_local_transform(&mut self, idx: usize, instance: Instance) {
        if let Some((local, _)) = self.instances.get_mut(idx) {
            *local = instance;
        }
    }

    fn set_local_transform_all(&mut self, mutation: &mut dyn FnMut(usize, &mut Instance)) {
        self.instances
            .iter_mut()
            .enumerate()
            .for_each(|(idx, (local, _))| mutation(idx, local));
    }

    fn get_world_transforms(&self) -> Vec<Instance> {
        self.instances.iter().map(|(_, world)| world.clone()).collect()
    }

    fn update_world_transforms(&mut self, range: Range<usize>, parents_world_transform: &[Instance]) {
        let Some(world_transforms) = propagate(&mut self.instances, range.clone(), parents_world_transform)
        else {
            return;
        };
        for child in self.children.iter_mut() {
            child.update_world_transforms(range.clone(), &world_transforms);
        }
    }

    fn get_children(&self) -> &Vec<Box<dyn SceneNode>> {
        &self.children
    }

    fn get_children_mut(&mut self) -> &mut Vec<Box<dyn SceneNode>> {
        &mut self.children
    }

    fn get_local_transform(&self, idx: usize) -> Option<Instance> {
        self.instances.get(idx).map(|(local, _)| local.clone())
    }

    fn write_to_buffers(&mut self, queue: &wgpu::Queue, device: &wgpu::Device) {
        self.children
            .iter_mut()
            .for_each(|child| child.write_to_buffers(queue, device));
    }

    fn add_instance(&mut self, instance: Instance) -> usize {
        self.instances.push((instance.clone(), instance));
        for child in &mut self.children {
            child.add_instance(Instance::default());
        }
        self.instances.len()
    }

    fn add_instances(&mut self, instances: Vec<Instance>) -> usize {
        let len = instances.len();
        self.instances
            .extend(instances.into_iter().map(|instance| (instance.clone(), instance)));
        for child in &mut self.children {
            child.add_instances(vec![Instance::default(); len]);
        }
        self.instances.len()
    }

    fn remove_instance(&mut self, idx: usize) -> Option<(Instance, Instance)> {
        if idx >= self.instances.len() {
            return None;
        }
        self.children.iter_mut().for_each(|c| {
            c.remove_instance(idx);
        });
        Some(self.instances.remove(idx))
    }

    fn update_world_transform_all(&mut self) {
        let parents = vec![Instance::default(); self.instances.len()];
        self.update_world_transforms(0..self.instances.len(), &parents);
    }

    fn instance_count(&self) -> usize {
        self.instances.len()
    }

    fn get_render(&self) -> Vec<Instanced<'_>> {
        self.children
            .iter()
            .flat_map(|child| child.get_render())
            .collect()
    }

    fn visit_models_mut(&mut self, visit: &mut dyn FnMut(&mut model::Model)) {
        self.children
            .iter_mut()
            .for_each(|child| child.visit_models_mut(visit));
    }
}

/// A model drawn once per instance from a single instance buffer.
pub struct ModelNode {
    children: Vec<Box<dyn SceneNode>>,
    instance_buffer: wgpu::Buffer,
    instances: Vec<(Instance, Instance)>,
    buffer_size_needs_change: bool,
    model: model::Model,
}

impl ModelNode {
    pub fn from_model(amount: usize, device: &wgpu::Device, model: model::Model) -> Self {
        let instances = identity_pairs(amount);
        let instance_buffer = mk_instance_buffer(device, &instances);

        Self {
            children: vec![],
            instance_buffer,
            instances,
            model,
            buffer_size_needs_change: false,
        }
    }

    pub fn model(&self) -> &model::Model {
        &self.model
    }

    pub fn model_mut(&mut self) -> &mut model::Model {
        &mut self.model
    }
}

fn mk_instance_buffer(device: &wgpu::Device, instances: &[(Instance, Instance)]) -> wgpu::Buffer {
    let raw_instances: Vec<InstanceRaw> = instances.iter().map(|(_, world)| world.to_raw()).collect();
    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("Instance Buffer"),
        contents: bytemuck::cast_slice(&raw_instances),
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
    })
}

impl SceneNode for ModelNode {
    fn add_child(&mut self, child: Box<dyn SceneNode>) {
        self.children.push(child);
    }

    fn set_local_transform(&mut self, idx: usize, instance: Instance) {
        if let Some((local, _)) = self.instances.get_mut(idx) {
            *local = instance;
        }
    }

    fn set_local_transform_all(&mut self, mutation: &mut dyn FnMut(usize, &mut Instance)) {
        self.instances
            .iter_mut()
            .enumerate()
            .for_each(|(idx, (local, _))| mutation(idx, local));
    }

    fn get_world_transforms(&self) -> Vec<Instance> {
        self.instances.iter().map(|(_, world)| world.clone()).collect()
    }

    fn update_world_transforms(&mut self, range: Range<usize>, parents_world_transform: &[Instance]) {
        let Some(world_transforms) = propagate(&mut self.instances, range.clone(), parents_world_transform)
        else {
            return;
        };
        for child in self.children.iter_mut() {
            child.update_world_transforms(range.clone(), &world_transforms);
        }
    }

    fn get_children(&self) -> &Vec<Box<dyn SceneNode>> {
        &self.children
    }

    fn get_children_mut(&mut self) -> &mut Vec<Box<dyn SceneNode>> {
        &mut self.children
    }

    fn get_local_transform(&self, idx: usize) -> Option<Instance> {
        self.instances.get(idx).map(|(local, _)| local.clone())
    }

    fn write_to_buffers(&mut self, queue: &wgpu::Queue, device: &wgpu::Device) {
        if self.buffer_size_needs_change {
            self.instance_buffer = mk_instance_buffer(device, &self.instances);
            self.buffer_size_needs_change = false;
        } else if !self.instances.is_empty() {
            let raw_instances: Vec<InstanceRaw> =
                self.instances.iter().map(|(_, world)| world.to_raw()).collect();
            queue.write_buffer(&self.instance_buffer, 0, bytemuck::cast_slice(&raw_instances));
        }
        self.children
            .iter_mut()
            .for_each(|child| child.write_to_buffers(queue, device));
    }

    fn add_instance(&mut self, instance: Instance) -> usize {
        self.instances.push((instance.clone(), instance));
        for child in &mut self.children {
            child.add_instance(Instance::default());
        }
        self.buffer_size_needs_change = true;
        self.instances.len()
    }

    fn add_instances(&mut self, instances: Vec<Instance>) -> usize {
        let len = instances.len();
        self.instances
            .extend(instances.into_iter().map(|instance| (instance.clone(), instance)));
        for child in &mut self.children {
            child.add_instances(vec![Instance::default(); len]);
        }
        self.buffer_size_needs_change = true;
        self.instances.len()
    }

    fn remove_instance(&mut self, idx: usize) -> Option<(Instance, Instance)> {
        if idx >= self.instances.len() {
            return None;
        }
        self.children.iter_mut().for_each(|c| {
            c.remove_instance(idx);
        });
        self.buffer_size_needs_change = true;
        Some(self.instances.remove(idx))
    }

    fn update_world_transform_all(&mut self) {
        let parents = vec![Instance::default(); self.instances.len()];
        self.update_world_transforms(0..self.instances.len(), &parents);
    }

    fn instance_count(&self) -> usize {
        self.instances.len()
    }

    fn get_render(&self) -> Vec<Instanced<'_>> {
        self.children
            .iter()
            .flat_map(|child| child.get_render())
            .chain([Instanced {
                instance: &self.instance_buffer,
                model: &self.model,
                amount: self.instances.len(),
            }])
            .collect()
    }

    fn visit_models_mut(&mut self, visit: &mut dyn FnMut(&mut model::Model)) {
        visit(&mut self.model);
        self.children
            .iter_mut()
            .for_each(|child| child.visit_models_mut(visit));
    }
}
