//! Render composition and pipeline batching.
//!
//! This module defines the [`Render`] enum, which flows return every frame to
//! describe what they want drawn. The engine sorts the pieces into batches for
//! the shadow, sky, lit and unlit pipelines and runs custom closures in between.
//!
//! # Key types
//!
//! - [`Render<'a>`] is the primary enum describing render operations
//! - [`Instanced<'a>`] contains data for instanced rendering (model + instance buffer)
//!

use crate::{
    context::Context,
    data_structures::{model::Model, scene_graph::SceneNode},
};

/// Data for instanced object rendering: a model and its instance buffer.
///
/// The instance buffer contains per-instance transformation data.
pub struct Instanced<'a> {
    pub instance: &'a wgpu::Buffer,
    pub model: &'a Model,
    pub amount: usize,
}

/// Specifies how a scene object should be rendered.
///
/// # Variants
///
/// - `None` renders nothing
/// - `Default(Instanced)` renders a single lit instanced object
/// - `Defaults(Vec<Instanced>)` renders a batch of lit instanced objects
/// - `Unlit(Instanced)` renders a single instanced object without lighting
/// - `Unlits(Vec<Instanced>)` renders a batch of unlit objects
/// - `Casters(Vec<Instanced>)` draws into the shadow maps only, next to a lit or unlit draw
/// - `Sky(BindGroup)` draws an equirectangular background behind everything
/// - `Composed(Vec<Render>)` recursively renders composition of multiple renders
/// - `Custom(...)` invokes a user-defined closure for custom rendering
///
pub enum Render<'a> {
    None,
    Default(Instanced<'a>),
    Defaults(Vec<Instanced<'a>>),
    Unlit(Instanced<'a>),
    Unlits(Vec<Instanced<'a>>),
    Casters(Vec<Instanced<'a>>),
    Sky(&'a wgpu::BindGroup),
    Composed(Vec<Render<'a>>),
    Custom(Box<dyn 'a + FnOnce(&Context, &mut wgpu::RenderPass<'_>)>),
}

/// Render work sorted by pipeline.
#[derive(Default)]
pub(crate) struct Batches<'a> {
    pub sky: Option<&'a wgpu::BindGroup>,
    pub lit: Vec<Instanced<'a>>,
    pub unlit: Vec<Instanced<'a>>,
    pub casters: Vec<Instanced<'a>>,
    pub custom: Vec<Box<dyn 'a + FnOnce(&Context, &mut wgpu::RenderPass<'_>)>>,
}

impl<'a> Render<'a> {
    pub(crate) fn set_pipelines(self, batches: &mut Batches<'a>) {
        match self {
            Render::Default(instanced) => batches.lit.push(instanced),
            Render::Defaults(mut vec) => batches.lit.append(&mut vec),
            Render::Unlit(instanced) => batches.unlit.push(instanced),
            Render::Unlits(mut vec) => batches.unlit.append(&mut vec),
            Render::Casters(mut vec) => batches.casters.append(&mut vec),
            Render::Sky(group) => {
                if batches.sky.replace(group).is_some() {
                    log::warn!("More than one background was submitted, only the last one is drawn.");
                }
            }
            Render::Composed(renders) => renders
                .into_iter()
                .for_each(|render| render.set_pipelines(batches)),
            Render::Custom(f) => batches.custom.push(f),
            Render::None => (),
        }
    }

    /// Lit instanced draws for every model in a scene graph.
    pub fn lit(sn: &'a dyn SceneNode) -> Self {
        Render::Defaults(sn.get_render())
    }

    /// Unlit instanced draws for every model in a scene graph.
    pub fn unlit(sn: &'a dyn SceneNode) -> Self {
        Render::Unlits(sn.get_render())
    }

    /// Every model in a scene graph as a shadow caster.
    pub fn casters(sn: &'a dyn SceneNode) -> Self {
        Render::Casters(sn.get_render())
    }
}

impl<'a> From<&'a dyn SceneNode> for Render<'a> {
    fn from(sn: &'a dyn SceneNode) -> Self {
        Render::lit(sn)
    }
}
