//! Engine-neutral mesh containers.
//!
//! This module provides the mesh types produced by the format translators:
//!
//! - [`VertexFormat`] - Component type, arity, and normalization of one attribute
//! - [`AttributeSemantic`] - What an attribute means (position, normal, ...)
//! - [`AttributeView`] - Offset/stride view of one attribute inside the vertex block
//! - [`MeshData`] - One translated mesh: vertex block, attribute views, indices
//!
//! Unlike interleaved GPU-upload layouts, attributes here keep whatever
//! offsets and strides the source document used; consumers address the
//! single vertex block through the per-attribute views.

mod data;
mod format;

pub use data::{AttributeView, IndexData, IndexFormat, MeshData, PrimitiveTopology};
pub use format::{AttributeSemantic, ComponentType, VertexFormat};
