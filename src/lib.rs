//! firefly-grove
//!
//! A small instancing scene engine on wgpu and winit, and the firefly grove
//! built with it. The same code runs natively and in the browser through
//! WebGL2.
//!
//! High-level modules
//! - `camera`: camera, projection, orbit controller and pointer rays
//! - `context`: central GPU and window context that owns device/queue/pipelines
//! - `data_structures`: engine data models (meshes, instances, textures, geometry)
//! - `flow`: high level flow control (scenes / update loops)
//! - `pipelines`: lit, unlit and sky pipelines plus the light uniform
//! - `resources`: helpers to load textures/models and track their status
//! - `render`: render composition for efficient pipeline reuse
//! - `scene`: the grove itself
//!

pub mod camera;
pub mod context;
pub mod data_structures;
pub mod flow;
pub mod pipelines;
pub mod render;
pub mod resources;
pub mod scene;

// Re-exports commonly used types for convenience in downstream code.
pub use cgmath::*;
pub use wgpu::*;
pub use winit::dpi::PhysicalPosition;
pub use winit::event::DeviceEvent;
pub use winit::event::WindowEvent;

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

/// Browser entry point, called once the module is instantiated.
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    scene::run().map_err(|e| JsValue::from_str(&format!("{e:#}")))
}
