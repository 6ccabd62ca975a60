use std::io::{BufReader, Cursor};

use anyhow::Context as _;

use crate::{
    data_structures::{
        model::{self, MaterialUniform},
        scene_graph::{ContainerNode, SceneNode, to_scene_node},
        texture::Texture,
    },
    resources::texture::{load_binary, load_texture},
};

/**
 * This module contains all logic for loading textures and models from external files.
 */
pub mod asset;
pub mod texture;

const WHITE: [u8; 4] = [255, 255, 255, 255];

/// Load a `.glb`/`.gltf` file into a scene graph.
///
/// Materials carry their base colour factor, base colour texture and the
/// metallic/roughness factors. Materials without a texture sample a white
/// pixel instead. A trailing default material is appended for primitives
/// that do not name one.
pub async fn load_model_gltf(
    file_name: &str,
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    layout: &wgpu::BindGroupLayout,
) -> anyhow::Result<Box<dyn SceneNode>> {
    let gltf_bytes = load_binary(file_name).await?;
    let gltf_reader = BufReader::new(Cursor::new(gltf_bytes));
    let gltf = gltf::Gltf::from_reader(gltf_reader)
        .with_context(|| format!("{file_name} is not a valid glTF document"))?;

    // Load buffers
    let mut buffer_data = Vec::new();
    for buffer in gltf.buffers() {
        match buffer.source() {
            gltf::buffer::Source::Bin => {
                let blob = gltf
                    .blob
                    .as_deref()
                    .with_context(|| format!("{file_name} references a missing binary chunk"))?;
                buffer_data.push(blob.to_vec());
            }
            gltf::buffer::Source::Uri(uri) => {
                buffer_data.push(load_binary(uri).await?);
            }
        }
    }

    // Load materials
    let mut materials = Vec::new();
    for material in gltf.materials() {
        let pbr = material.pbr_metallic_roughness();
        let diffuse_texture = match pbr.base_color_texture() {
            Some(info) => match info.texture().source().source() {
                gltf::image::Source::View { view, mime_type } => {
                    let start = view.offset();
                    let end = start + view.length();
                    let bytes = buffer_data
                        .get(view.buffer().index())
                        .and_then(|data| data.get(start..end))
                        .with_context(|| format!("{file_name} has an image outside its buffer"))?;
                    Texture::from_bytes(
                        device,
                        queue,
                        bytes,
                        file_name,
                        mime_type.split('/').next_back(),
                        false,
                    )?
                }
                gltf::image::Source::Uri { uri, mime_type } => {
                    load_texture(
                        uri,
                        false,
                        device,
                        queue,
                        mime_type.and_then(|mt| mt.split('/').next_back()),
                    )
                    .await?
                }
            },
            None => Texture::from_colour(WHITE, device, queue),
        };
        let [r, g, b, a] = pbr.base_color_factor();
        let emissive = material.emissive_factor();
        let uniform = MaterialUniform {
            base_colour: [r, g, b, a],
            emissive,
            metalness: pbr.metallic_factor(),
            roughness: pbr.roughness_factor(),
            ..Default::default()
        };
        let name = material.name().unwrap_or(file_name);
        materials.push(model::Material::new(device, name, diffuse_texture, uniform, layout));
    }
    let default_material = materials.len();
    materials.push(model::Material::new(
        device,
        &format!("{file_name} default"),
        Texture::from_colour(WHITE, device, queue),
        MaterialUniform::default(),
        layout,
    ));

    let mut models = Vec::new();
    let scene = gltf
        .default_scene()
        .or_else(|| gltf.scenes().next())
        .with_context(|| format!("{file_name} contains no scene"))?;
    for node in scene.nodes() {
        models.push(to_scene_node(node, &buffer_data, device, &materials, default_material));
    }

    let mut root_node = ContainerNode::new(1);
    root_node.children = models;
    Ok(Box::new(root_node))
}
