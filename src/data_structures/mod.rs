//! Engine data structures: models, textures, scene graphs, and instances.
//!
//! This module contains the core data types for scene representation:
//!
//! - `colour` converts sRGB hex colours to the linear values shaders expect
//! - `geometry` builds vertex and index data for the primitive shapes
//! - `model` contains mesh and material definitions, GPU resources for 3D models
//! - `texture` contains GPU texture wrapper and creation utilities
//! - `instance` holds per-instance transformation and attribute data
//! - `scene_graph` enables hierarchical scene organization

pub mod colour;
pub mod geometry;
pub mod instance;
pub mod model;
pub mod scene_graph;
pub mod texture;
