//! Translated mesh data.
//!
//! This module provides:
//! - [`PrimitiveTopology`] - How vertices are assembled into primitives
//! - [`IndexFormat`] / [`IndexData`] - Index buffer with its element width
//! - [`AttributeView`] - One attribute's placement inside the vertex block
//! - [`MeshData`] - The complete output of one mesh-chunk translation

use super::format::{AttributeSemantic, VertexFormat};

/// Primitive topology describing how vertices are assembled into primitives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PrimitiveTopology {
    /// Each vertex is a separate point.
    PointList,
    /// Every two vertices form a line.
    LineList,
    /// Vertices form a closed loop of lines.
    LineLoop,
    /// Vertices form a connected strip of lines.
    LineStrip,
    /// Every three vertices form a triangle.
    #[default]
    TriangleList,
    /// Vertices form a connected strip of triangles.
    TriangleStrip,
    /// Triangles fan out from the first vertex.
    TriangleFan,
}

impl PrimitiveTopology {
    /// Get the number of vertices per primitive (for non-strip topologies).
    pub fn vertices_per_primitive(&self) -> Option<u32> {
        match self {
            Self::PointList => Some(1),
            Self::LineList => Some(2),
            Self::TriangleList => Some(3),
            Self::LineLoop | Self::LineStrip | Self::TriangleStrip | Self::TriangleFan => None,
        }
    }
}

/// Index element width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum IndexFormat {
    /// 8-bit unsigned integers.
    Uint8,
    /// 16-bit unsigned integers.
    #[default]
    Uint16,
    /// 32-bit unsigned integers.
    Uint32,
}

impl IndexFormat {
    /// Get the size in bytes of each index.
    pub fn size(&self) -> usize {
        match self {
            Self::Uint8 => 1,
            Self::Uint16 => 2,
            Self::Uint32 => 4,
        }
    }
}

/// An index buffer together with its element width.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexData {
    /// Index element width.
    pub format: IndexFormat,
    /// Raw index bytes, `count * format.size()` long.
    pub data: Vec<u8>,
    /// Number of indices.
    pub count: u32,
}

impl IndexData {
    /// Decode the indices to `u32` regardless of the stored width.
    pub fn to_u32(&self) -> Vec<u32> {
        match self.format {
            IndexFormat::Uint8 => self.data.iter().map(|&i| u32::from(i)).collect(),
            IndexFormat::Uint16 => bytemuck::cast_slice::<u8, u16>(&self.data)
                .iter()
                .map(|&i| u32::from(i))
                .collect(),
            IndexFormat::Uint32 => bytemuck::cast_slice::<u8, u32>(&self.data).to_vec(),
        }
    }
}

/// Placement of one attribute inside a [`MeshData`] vertex block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttributeView {
    /// What the attribute means.
    pub semantic: AttributeSemantic,
    /// Element format.
    pub format: VertexFormat,
    /// Byte offset of the first element inside the vertex block.
    pub offset: usize,
    /// Byte distance between consecutive elements.
    pub stride: usize,
}

/// One translated mesh: a single vertex byte block addressed through
/// per-attribute strided views, plus an optional index buffer.
///
/// The vertex block keeps whatever offsets and strides the source document
/// used, so attributes of one mesh may interleave, pad, or alias freely.
/// A mesh with no attributes and no indices is valid and carries only a
/// topology (degenerate but well-formed source documents produce these).
#[derive(Clone)]
pub struct MeshData {
    topology: PrimitiveTopology,
    vertex_count: u32,
    vertex_data: Vec<u8>,
    attributes: Vec<AttributeView>,
    indices: Option<IndexData>,
}

impl MeshData {
    /// Create a new mesh with the given topology and vertex count.
    pub fn new(topology: PrimitiveTopology, vertex_count: u32) -> Self {
        Self {
            topology,
            vertex_count,
            vertex_data: Vec::new(),
            attributes: Vec::new(),
            indices: None,
        }
    }

    /// Set the vertex byte block.
    #[must_use]
    pub fn with_vertex_data(mut self, data: Vec<u8>) -> Self {
        self.vertex_data = data;
        self
    }

    /// Set the attribute views.
    #[must_use]
    pub fn with_attributes(mut self, attributes: Vec<AttributeView>) -> Self {
        self.attributes = attributes;
        self
    }

    /// Set the index buffer.
    #[must_use]
    pub fn with_indices(mut self, indices: IndexData) -> Self {
        self.indices = Some(indices);
        self
    }

    /// Set index data from u32 indices.
    #[must_use]
    pub fn with_indices_u32(self, indices: &[u32]) -> Self {
        self.with_indices(IndexData {
            format: IndexFormat::Uint32,
            data: bytemuck::cast_slice(indices).to_vec(),
            count: indices.len() as u32,
        })
    }

    /// Get the primitive topology.
    pub fn topology(&self) -> PrimitiveTopology {
        self.topology
    }

    /// Get the number of vertices.
    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    /// Get the raw vertex block.
    pub fn vertex_data(&self) -> &[u8] {
        &self.vertex_data
    }

    /// Get all attribute views.
    pub fn attributes(&self) -> &[AttributeView] {
        &self.attributes
    }

    /// Find the view for a semantic, if present.
    pub fn attribute(&self, semantic: AttributeSemantic) -> Option<&AttributeView> {
        self.attributes.iter().find(|a| a.semantic == semantic)
    }

    /// Get the index buffer, if present.
    pub fn indices(&self) -> Option<&IndexData> {
        self.indices.as_ref()
    }

    /// Check if this mesh uses indexed drawing.
    pub fn is_indexed(&self) -> bool {
        self.indices.is_some()
    }

    /// Read one attribute's elements into a packed `Vec<T>`.
    ///
    /// `T` must match the attribute's element size exactly; returns `None`
    /// when the semantic is absent or the size differs.
    pub fn read_attribute<T: bytemuck::Pod>(&self, semantic: AttributeSemantic) -> Option<Vec<T>> {
        let view = self.attribute(semantic)?;
        let elem_size = view.format.size();
        if elem_size != std::mem::size_of::<T>() {
            return None;
        }
        let mut out = Vec::with_capacity(self.vertex_count as usize);
        for i in 0..self.vertex_count as usize {
            let start = view.offset + i * view.stride;
            let bytes = &self.vertex_data[start..start + elem_size];
            out.push(bytemuck::pod_read_unaligned::<T>(bytes));
        }
        Some(out)
    }
}

impl std::fmt::Debug for MeshData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MeshData")
            .field("topology", &self.topology)
            .field("vertex_count", &self.vertex_count)
            .field("vertex_bytes", &self.vertex_data.len())
            .field(
                "attributes",
                &self
                    .attributes
                    .iter()
                    .map(|a| a.semantic)
                    .collect::<Vec<_>>(),
            )
            .field("index_count", &self.indices.as_ref().map(|i| i.count))
            .finish()
    }
}
