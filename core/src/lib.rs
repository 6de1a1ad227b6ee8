//! # sceneport core
//!
//! Asset-import translators converting two interchange formats (a
//! JSON-described scene format and a binary DCC interchange format) into
//! one engine-neutral representation: typed strided vertex buffers,
//! flattened column-oriented scene graphs, and layered material attribute
//! bags.

pub mod fbx;
#[cfg(feature = "gltf")]
pub mod gltf;
pub mod image;
pub mod io;
pub mod material;
pub mod mesh;
pub mod scene;
pub mod texture;

/// Core library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
