//! Mesh chunking and per-corner vertex assembly.
//!
//! A source mesh is split at open into chunks, one per (material slot,
//! topology) pair that actually occurs. Assembly expands every face
//! corner into its own output vertex (no index sharing), fan-
//! triangulating polygons, and writes all attribute sets interleaved
//! into one vertex block with an identity index buffer on top.

use nalgebra::{Matrix3, Matrix4, Point3, Quaternion, UnitQuaternion, Vector3};

use crate::mesh::{
    AttributeSemantic, AttributeView, ComponentType, MeshData, PrimitiveTopology, VertexFormat,
};

use super::config::{set_limit, FbxConfig};
use super::error::FbxImportError;
use super::types::{FbxMesh, FbxScene, FbxTransform};

/// One output mesh: faces of one material slot with one topology.
#[derive(Debug, Clone, Copy)]
pub(crate) struct FbxMeshChunk {
    pub mesh: usize,
    pub slot: usize,
    pub topology: PrimitiveTopology,
    /// Expanded vertex count, precomputed at open.
    pub vertex_count: u32,
}

/// Range of one mesh's chunks within the flat chunk list.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct ChunkRange {
    pub base: u32,
    pub count: u32,
}

/// Corner counts of one slot, split by face topology.
struct SlotCounts {
    point_vertices: u32,
    line_vertices: u32,
    triangle_vertices: u32,
}

fn count_slot(mesh: &FbxMesh, slot: usize) -> SlotCounts {
    let mut counts = SlotCounts {
        point_vertices: 0,
        line_vertices: 0,
        triangle_vertices: 0,
    };
    for &face_index in &mesh.materials[slot].face_indices {
        let Some(face) = mesh.faces.get(face_index as usize) else {
            continue;
        };
        match face.num_indices {
            0 => {}
            1 => counts.point_vertices += 1,
            2 => counts.line_vertices += 2,
            // A fan yields n - 2 triangles per n-gon.
            n => counts.triangle_vertices += (n - 2) * 3,
        }
    }
    counts
}

/// Split every mesh into chunks, returning the flat chunk list and the
/// per-mesh range into it.
pub(crate) fn build_chunks(scene: &FbxScene) -> (Vec<FbxMeshChunk>, Vec<ChunkRange>) {
    let mut chunks = Vec::new();
    let mut ranges = Vec::with_capacity(scene.meshes.len());
    for (mesh_index, mesh) in scene.meshes.iter().enumerate() {
        let base = chunks.len() as u32;
        for slot in 0..mesh.materials.len() {
            let counts = count_slot(mesh, slot);
            let mut push = |topology, vertex_count| {
                if vertex_count > 0 {
                    chunks.push(FbxMeshChunk {
                        mesh: mesh_index,
                        slot,
                        topology,
                        vertex_count,
                    });
                }
            };
            push(PrimitiveTopology::PointList, counts.point_vertices);
            push(PrimitiveTopology::LineList, counts.line_vertices);
            push(PrimitiveTopology::TriangleList, counts.triangle_vertices);
        }
        ranges.push(ChunkRange {
            base,
            count: chunks.len() as u32 - base,
        });
    }
    (chunks, ranges)
}

fn trs_matrix(transform: &FbxTransform) -> Matrix4<f64> {
    let [x, y, z, w] = transform.rotation;
    let translation = Matrix4::new_translation(&Vector3::new(
        transform.translation[0],
        transform.translation[1],
        transform.translation[2],
    ));
    let rotation =
        UnitQuaternion::from_quaternion(Quaternion::new(w, x, y, z)).to_homogeneous();
    let scale = Matrix4::new_nonuniform_scaling(&Vector3::new(
        transform.scale[0],
        transform.scale[1],
        transform.scale[2],
    ));
    translation * rotation * scale
}

/// A geometry transform baked into vertex data: point matrix plus the
/// inverse-transpose for direction attributes. The direction matrix is
/// absent when the transform is singular; directions pass through
/// unchanged then.
struct GeometryBake {
    points: Matrix4<f64>,
    directions: Option<Matrix3<f64>>,
}

impl GeometryBake {
    fn new(transform: &FbxTransform) -> Self {
        let points = trs_matrix(transform);
        let linear = points.fixed_view::<3, 3>(0, 0).into_owned();
        let directions = linear.try_inverse().map(|inverse| inverse.transpose());
        Self { points, directions }
    }

    fn point(&self, value: [f64; 3]) -> [f64; 3] {
        let p = self
            .points
            .transform_point(&Point3::new(value[0], value[1], value[2]));
        [p.x, p.y, p.z]
    }

    fn direction(&self, value: [f64; 3]) -> [f64; 3] {
        let Some(matrix) = &self.directions else {
            return value;
        };
        let v = matrix * Vector3::new(value[0], value[1], value[2]);
        let norm = v.norm();
        if norm > 0.0 {
            let v = v / norm;
            [v.x, v.y, v.z]
        } else {
            value
        }
    }
}

fn write_f32(block: &mut [u8], at: usize, values: &[f64]) {
    for (i, &value) in values.iter().enumerate() {
        let bytes = (value as f32).to_le_bytes();
        block[at + i * 4..at + i * 4 + 4].copy_from_slice(&bytes);
    }
}

/// Assemble one chunk into a mesh. `bake` carries the geometry
/// transform to fold into vertex data, if any.
pub(crate) fn assemble(
    scene: &FbxScene,
    chunk: &FbxMeshChunk,
    config: &FbxConfig,
    bake: Option<&FbxTransform>,
) -> Result<MeshData, FbxImportError> {
    let error = |reason: String| FbxImportError::Mesh {
        mesh: chunk.mesh,
        slot: chunk.slot,
        reason,
    };
    let mesh = &scene.meshes[chunk.mesh];
    let slot = &mesh.materials[chunk.slot];
    let bake = bake.map(GeometryBake::new);

    let uv_count = mesh.uv_sets.len().min(set_limit(config.max_uv_sets));
    let color_count = mesh.color_sets.len().min(set_limit(config.max_color_sets));

    // Tangent frames are taken per UV set until the first set with an
    // incomplete frame; past that the implicit set mapping would break.
    let mut tangent_count = uv_count.min(set_limit(config.max_tangent_sets));
    let mut bitangent_count = tangent_count;
    for (i, set) in mesh.uv_sets.iter().take(tangent_count).enumerate() {
        if set.tangents.is_none() || set.bitangents.is_none() {
            tangent_count = i + usize::from(set.tangents.is_some());
            bitangent_count = i + usize::from(set.bitangents.is_some());
            break;
        }
    }

    let has_normals = mesh.normals.is_some();
    let mut attributes = Vec::new();
    let mut offset = 0usize;
    let mut push = |semantic, components: u8| {
        attributes.push(AttributeView {
            semantic,
            format: VertexFormat::new(ComponentType::F32, components, false),
            offset,
            stride: 0, // patched below once the full stride is known
        });
        offset += components as usize * 4;
    };
    push(AttributeSemantic::Position, 3);
    if has_normals {
        push(AttributeSemantic::Normal, 3);
    }
    for i in 0..uv_count {
        push(AttributeSemantic::TexCoord(i as u32), 2);
    }
    for i in 0..tangent_count {
        push(AttributeSemantic::Tangent(i as u32), 3);
    }
    for i in 0..bitangent_count {
        push(AttributeSemantic::Bitangent(i as u32), 3);
    }
    for i in 0..color_count {
        push(AttributeSemantic::Color(i as u32), 4);
    }
    let stride = offset;
    for attribute in &mut attributes {
        attribute.stride = stride;
    }

    let vertex_count = chunk.vertex_count as usize;
    let mut block = vec![0u8; stride * vertex_count];
    let mut fan: Vec<u32> = Vec::new();
    let mut dst = 0usize;

    for &face_index in &slot.face_indices {
        let face = mesh
            .faces
            .get(face_index as usize)
            .ok_or_else(|| error(format!("face index {} out of range", face_index)))?;

        fan.clear();
        match chunk.topology {
            PrimitiveTopology::PointList => {
                if face.num_indices == 1 {
                    fan.push(face.index_begin);
                }
            }
            PrimitiveTopology::LineList => {
                if face.num_indices == 2 {
                    fan.extend([face.index_begin, face.index_begin + 1]);
                }
            }
            _ => {
                for i in 1..face.num_indices.saturating_sub(1) {
                    fan.extend([
                        face.index_begin,
                        face.index_begin + i,
                        face.index_begin + i + 1,
                    ]);
                }
            }
        }

        for &corner in &fan {
            let at = dst * stride;
            let mut cursor = at;
            let corner_error =
                || error(format!("corner {} out of range of an attribute stream", corner));

            let mut position = mesh.positions.get(corner).ok_or_else(corner_error)?;
            if let Some(bake) = &bake {
                position = bake.point(position);
            }
            write_f32(&mut block, cursor, &position);
            cursor += 12;

            if let Some(normals) = &mesh.normals {
                let mut normal = normals.get(corner).ok_or_else(corner_error)?;
                if let Some(bake) = &bake {
                    normal = bake.direction(normal);
                }
                write_f32(&mut block, cursor, &normal);
                cursor += 12;
            }
            for set in mesh.uv_sets.iter().take(uv_count) {
                let uv = set.uvs.get(corner).ok_or_else(corner_error)?;
                write_f32(&mut block, cursor, &uv);
                cursor += 8;
            }
            for set in mesh.uv_sets.iter().take(tangent_count) {
                let stream = set.tangents.as_ref().ok_or_else(corner_error)?;
                let mut tangent = stream.get(corner).ok_or_else(corner_error)?;
                if let Some(bake) = &bake {
                    tangent = bake.direction(tangent);
                }
                write_f32(&mut block, cursor, &tangent);
                cursor += 12;
            }
            for set in mesh.uv_sets.iter().take(bitangent_count) {
                let stream = set.bitangents.as_ref().ok_or_else(corner_error)?;
                let mut bitangent = stream.get(corner).ok_or_else(corner_error)?;
                if let Some(bake) = &bake {
                    bitangent = bake.direction(bitangent);
                }
                write_f32(&mut block, cursor, &bitangent);
                cursor += 12;
            }
            for set in mesh.color_sets.iter().take(color_count) {
                let color = set.colors.get(corner).ok_or_else(corner_error)?;
                write_f32(&mut block, cursor, &color);
                cursor += 16;
            }
            debug_assert_eq!(cursor - at, stride);
            dst += 1;
        }
    }
    debug_assert_eq!(dst, vertex_count);

    // Corners are expanded, so indices are the identity sequence.
    let indices: Vec<u32> = (0..chunk.vertex_count).collect();
    Ok(MeshData::new(chunk.topology, chunk.vertex_count)
        .with_vertex_data(block)
        .with_attributes(attributes)
        .with_indices_u32(&indices))
}
