//! Mesh-chunk assembly.
//!
//! Each source primitive becomes one [`MeshData`]: all vertex attributes
//! of a primitive must live in a single buffer, and the union of their
//! byte ranges is copied once, preserving whatever offsets and strides
//! the document used. Texture coordinates are V-flipped in place unless
//! the flip is deferred to material texture matrices.

use crate::io::FileLoader;
use crate::mesh::{
    AttributeSemantic, AttributeView, ComponentType, IndexData, IndexFormat, MeshData,
    PrimitiveTopology, VertexFormat,
};

use super::accessor::{self, AccessorLayout};
use super::buffer::BufferStore;
use super::config::GltfConfig;
use super::error::GltfImportError;

pub(crate) fn map_topology(mode: gltf_dep::mesh::Mode) -> PrimitiveTopology {
    use gltf_dep::mesh::Mode;
    match mode {
        Mode::Points => PrimitiveTopology::PointList,
        Mode::Lines => PrimitiveTopology::LineList,
        Mode::LineLoop => PrimitiveTopology::LineLoop,
        Mode::LineStrip => PrimitiveTopology::LineStrip,
        Mode::Triangles => PrimitiveTopology::TriangleList,
        Mode::TriangleStrip => PrimitiveTopology::TriangleStrip,
        Mode::TriangleFan => PrimitiveTopology::TriangleFan,
    }
}

/// Full source name of an attribute, used for ordering and for custom
/// attribute registration.
pub(crate) fn semantic_name(semantic: &gltf_dep::Semantic) -> String {
    use gltf_dep::Semantic;
    match semantic {
        Semantic::Positions => "POSITION".to_string(),
        Semantic::Normals => "NORMAL".to_string(),
        Semantic::Tangents => "TANGENT".to_string(),
        Semantic::Colors(set) => format!("COLOR_{}", set),
        Semantic::TexCoords(set) => format!("TEXCOORD_{}", set),
        Semantic::Joints(set) => format!("JOINTS_{}", set),
        Semantic::Weights(set) => format!("WEIGHTS_{}", set),
        Semantic::Extras(name) => format!("_{}", name),
    }
}

/// Id of a custom attribute name, registering it on first sight.
pub(crate) fn custom_id(names: &mut Vec<String>, name: &str) -> u32 {
    if let Some(id) = names.iter().position(|n| n == name) {
        return id as u32;
    }
    names.push(name.to_string());
    (names.len() - 1) as u32
}

/// Register every custom attribute name appearing in the document, in
/// order of first appearance, so name queries work before any mesh is
/// assembled.
pub(crate) fn register_custom_attributes(
    document: &gltf_dep::Document,
    config: &GltfConfig,
    names: &mut Vec<String>,
) {
    for mesh in document.meshes() {
        for primitive in mesh.primitives() {
            for (semantic, _) in primitive.attributes() {
                if let gltf_dep::Semantic::Extras(raw) = &semantic {
                    let name = format!("_{}", raw);
                    if name != config.object_id_attribute {
                        custom_id(names, &name);
                    }
                }
            }
        }
    }
}

/// Whether any texture coordinate set uses a type the in-buffer V flip
/// cannot represent. Such documents defer the flip to material texture
/// matrices.
pub(crate) fn texcoords_require_material_flip(document: &gltf_dep::Document) -> bool {
    use gltf_dep::accessor::DataType;
    for mesh in document.meshes() {
        for primitive in mesh.primitives() {
            for (semantic, acc) in primitive.attributes() {
                if !matches!(semantic, gltf_dep::Semantic::TexCoords(_)) {
                    continue;
                }
                let signed = matches!(acc.data_type(), DataType::I8 | DataType::I16);
                let unnormalized_int = acc.data_type() != DataType::F32 && !acc.normalized();
                if signed || unnormalized_int {
                    return true;
                }
            }
        }
    }
    false
}

fn map_semantic(
    semantic: &gltf_dep::Semantic,
    name: &str,
    config: &GltfConfig,
    custom_names: &mut Vec<String>,
) -> AttributeSemantic {
    use gltf_dep::Semantic;
    match semantic {
        Semantic::Positions => AttributeSemantic::Position,
        Semantic::Normals => AttributeSemantic::Normal,
        Semantic::Tangents => AttributeSemantic::Tangent(0),
        Semantic::Colors(set) => AttributeSemantic::Color(*set),
        Semantic::TexCoords(set) => AttributeSemantic::TexCoord(*set),
        Semantic::Joints(set) => AttributeSemantic::Joints(*set),
        Semantic::Weights(set) => AttributeSemantic::Weights(*set),
        Semantic::Extras(_) if name == config.object_id_attribute => AttributeSemantic::ObjectId,
        Semantic::Extras(_) => AttributeSemantic::Custom(custom_id(custom_names, name)),
    }
}

/// Check the accessor format against the per-semantic whitelist.
fn attribute_format(
    semantic: AttributeSemantic,
    name: &str,
    layout: &AccessorLayout,
) -> Result<VertexFormat, String> {
    use gltf_dep::accessor::Dimensions as Dim;
    let c = layout.component;
    let n = layout.normalized;
    let dim = layout.dimensions;
    let supported = match semantic {
        AttributeSemantic::Position => {
            dim == Dim::Vec3
                && matches!(
                    (c, n),
                    (ComponentType::F32, false)
                        | (ComponentType::I8, _)
                        | (ComponentType::U8, _)
                        | (ComponentType::I16, _)
                        | (ComponentType::U16, _)
                )
        }
        AttributeSemantic::Normal => {
            dim == Dim::Vec3
                && matches!(
                    (c, n),
                    (ComponentType::F32, false)
                        | (ComponentType::I8, true)
                        | (ComponentType::I16, true)
                )
        }
        AttributeSemantic::Tangent(_) => {
            dim == Dim::Vec4
                && matches!(
                    (c, n),
                    (ComponentType::F32, false)
                        | (ComponentType::I8, true)
                        | (ComponentType::I16, true)
                )
        }
        AttributeSemantic::TexCoord(_) => {
            dim == Dim::Vec2
                && matches!(
                    (c, n),
                    (ComponentType::F32, false)
                        | (ComponentType::I8, _)
                        | (ComponentType::U8, _)
                        | (ComponentType::I16, _)
                        | (ComponentType::U16, _)
                )
        }
        AttributeSemantic::Color(_) => {
            matches!(dim, Dim::Vec3 | Dim::Vec4)
                && matches!(
                    (c, n),
                    (ComponentType::F32, false)
                        | (ComponentType::U8, true)
                        | (ComponentType::U16, true)
                )
        }
        AttributeSemantic::Joints(_) => {
            dim == Dim::Vec4
                && matches!((c, n), (ComponentType::U8, false) | (ComponentType::U16, false))
        }
        AttributeSemantic::Weights(_) => {
            dim == Dim::Vec4
                && matches!(
                    (c, n),
                    (ComponentType::F32, false)
                        | (ComponentType::U8, true)
                        | (ComponentType::U16, true)
                )
        }
        AttributeSemantic::ObjectId => {
            dim == Dim::Scalar
                && !n
                && matches!(c, ComponentType::U8 | ComponentType::U16 | ComponentType::U32)
        }
        AttributeSemantic::Custom(_) => {
            matches!(dim, Dim::Scalar | Dim::Vec2 | Dim::Vec3 | Dim::Vec4)
                && !(c == ComponentType::F32 && n)
        }
        // Only the binary format produces bitangents.
        AttributeSemantic::Bitangent(_) => false,
    };
    if !supported {
        return Err(format!(
            "unsupported {} format: {:?}x{}{}",
            name,
            c,
            layout.component_count,
            if n { ", normalized" } else { "" }
        ));
    }
    Ok(VertexFormat::new(c, layout.component_count as u8, n))
}

fn warn_sparse_sets(
    mesh: usize,
    primitive: usize,
    family: &str,
    sets: impl Iterator<Item = u32>,
) {
    let mut max = None;
    let mut count = 0u32;
    for set in sets {
        max = Some(max.map_or(set, |m: u32| m.max(set)));
        count += 1;
    }
    if let Some(max) = max {
        if max + 1 != count {
            log::warn!(
                "mesh {} primitive {}: {} sets are not contiguous",
                mesh,
                primitive,
                family
            );
        }
    }
}

/// Flip the V coordinate of one texture coordinate attribute in place.
fn flip_v(block: &mut [u8], view: &AttributeView, vertex_count: usize) {
    let comp = view.format.component;
    for i in 0..vertex_count {
        let at = view.offset + i * view.stride + comp.size();
        match comp {
            ComponentType::F32 => {
                let v = f32::from_le_bytes([block[at], block[at + 1], block[at + 2], block[at + 3]]);
                block[at..at + 4].copy_from_slice(&(1.0 - v).to_le_bytes());
            }
            ComponentType::U8 => block[at] = 255 - block[at],
            ComponentType::U16 => {
                let v = u16::from_le_bytes([block[at], block[at + 1]]);
                block[at..at + 2].copy_from_slice(&(65535 - v).to_le_bytes());
            }
            // Signed and unnormalized coordinate types force the flip
            // into material texture matrices instead.
            _ => {}
        }
    }
}

/// Assemble one primitive of one source mesh into a [`MeshData`].
#[allow(clippy::too_many_arguments)]
pub(crate) fn assemble(
    document: &gltf_dep::Document,
    buffers: &mut BufferStore,
    blob: Option<&[u8]>,
    loader: &mut Option<Box<FileLoader<'_>>>,
    mesh_index: usize,
    primitive_index: usize,
    config: &GltfConfig,
    flip_in_material: bool,
    custom_names: &mut Vec<String>,
) -> Result<MeshData, GltfImportError> {
    let error = |reason: String| GltfImportError::Mesh {
        mesh: mesh_index,
        primitive: primitive_index,
        reason,
    };
    let mesh = document
        .meshes()
        .nth(mesh_index)
        .ok_or_else(|| error("mesh index out of range".to_string()))?;
    let primitive = mesh
        .primitives()
        .nth(primitive_index)
        .ok_or_else(|| error("primitive index out of range".to_string()))?;
    let topology = map_topology(primitive.mode());

    let mut raw: Vec<(String, gltf_dep::Semantic, gltf_dep::Accessor)> = primitive
        .attributes()
        .map(|(semantic, acc)| (semantic_name(&semantic), semantic, acc))
        .collect();
    raw.sort_by(|a, b| a.0.cmp(&b.0));

    let mut sources: Vec<(AttributeSemantic, VertexFormat, AccessorLayout)> = Vec::new();
    let mut kept_names: Vec<String> = Vec::new();
    for (name, semantic, acc) in raw {
        if kept_names.last() == Some(&name) {
            log::warn!(
                "mesh {} primitive {}: duplicate attribute {}, skipping",
                mesh_index,
                primitive_index,
                name
            );
            continue;
        }
        let layout = accessor::validate(&acc)?;
        let mapped = map_semantic(&semantic, &name, config, custom_names);
        let format = attribute_format(mapped, &name, &layout).map_err(error)?;
        sources.push((mapped, format, layout));
        kept_names.push(name);
    }

    let sets = |family: fn(&AttributeSemantic) -> Option<u32>| {
        sources.iter().filter_map(move |(s, _, _)| family(s))
    };
    warn_sparse_sets(mesh_index, primitive_index, "TEXCOORD", sets(|s| match s {
        AttributeSemantic::TexCoord(i) => Some(*i),
        _ => None,
    }));
    warn_sparse_sets(mesh_index, primitive_index, "COLOR", sets(|s| match s {
        AttributeSemantic::Color(i) => Some(*i),
        _ => None,
    }));
    warn_sparse_sets(mesh_index, primitive_index, "JOINTS", sets(|s| match s {
        AttributeSemantic::Joints(i) => Some(*i),
        _ => None,
    }));
    warn_sparse_sets(mesh_index, primitive_index, "WEIGHTS", sets(|s| match s {
        AttributeSemantic::Weights(i) => Some(*i),
        _ => None,
    }));

    let mut vertex_count = 0usize;
    let mut buffer_index = None;
    for (_, _, layout) in &sources {
        if let Some(index) = buffer_index {
            if index != layout.buffer {
                return Err(error("attributes span multiple buffers".to_string()));
            }
            if vertex_count != layout.count {
                return Err(error(format!(
                    "attributes have mismatched counts {} and {}",
                    vertex_count, layout.count
                )));
            }
        } else {
            buffer_index = Some(layout.buffer);
            vertex_count = layout.count;
        }
    }

    let mut result = MeshData::new(topology, vertex_count as u32);

    if let Some(buffer_index) = buffer_index {
        let begin = sources.iter().map(|s| s.2.begin).min().unwrap_or(0);
        let end = sources.iter().map(|s| s.2.end).max().unwrap_or(0);
        let buffer = document
            .buffers()
            .nth(buffer_index)
            .ok_or_else(|| error("attribute buffer index out of range".to_string()))?;
        let bytes = buffers.fetch(buffer, blob, loader)?;
        let mut block = bytes[begin..end].to_vec();

        let views: Vec<AttributeView> = sources
            .iter()
            .map(|(semantic, format, layout)| AttributeView {
                semantic: *semantic,
                format: *format,
                offset: layout.begin - begin,
                stride: layout.stride,
            })
            .collect();

        if !flip_in_material {
            for view in views.iter().filter(|v| v.semantic.is_texcoord()) {
                flip_v(&mut block, view, vertex_count);
            }
        }
        result = result.with_vertex_data(block).with_attributes(views);
    }

    if let Some(acc) = primitive.indices() {
        let layout = accessor::validate(&acc)?;
        if layout.dimensions != gltf_dep::accessor::Dimensions::Scalar || layout.normalized {
            return Err(error("index accessor must hold unnormalized scalars".to_string()));
        }
        let format = match layout.component {
            ComponentType::U8 => IndexFormat::Uint8,
            ComponentType::U16 => IndexFormat::Uint16,
            ComponentType::U32 => IndexFormat::Uint32,
            other => {
                return Err(error(format!("unsupported index type {:?}", other)));
            }
        };
        if layout.stride != layout.elem_size {
            return Err(error("index buffer is not contiguous".to_string()));
        }
        let buffer = document
            .buffers()
            .nth(layout.buffer)
            .ok_or_else(|| error("index buffer index out of range".to_string()))?;
        let bytes = buffers.fetch(buffer, blob, loader)?;
        result = result.with_indices(IndexData {
            format,
            data: bytes[layout.begin..layout.end].to_vec(),
            count: layout.count as u32,
        });
    }

    Ok(result)
}
