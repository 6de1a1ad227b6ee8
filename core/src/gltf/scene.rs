//! Scene flattening.
//!
//! Scenes come out as column-oriented [`SceneRecord`]s: objects in
//! breadth-first order with parents preceding children, transforms split
//! into TRS columns (with a combined-matrix column only when some node
//! carries a raw matrix), and mesh references fanned out per chunk.

use std::collections::VecDeque;

use crate::scene::{Field, MeshReferences, SceneRecord, TrsColumns};

use super::config::GltfConfig;
use super::error::GltfImportError;

/// Detect cycles in the node hierarchy by racing two pointers up every
/// node's parent chain. Cyclic documents are refused at open.
pub(crate) fn check_cycles(document: &gltf_dep::Document) -> Result<(), GltfImportError> {
    let node_count = document.nodes().len();
    let mut parents: Vec<Option<usize>> = vec![None; node_count];
    for node in document.nodes() {
        for child in node.children() {
            parents[child.index()] = Some(node.index());
        }
    }
    for start in 0..node_count {
        let mut p1 = start;
        let mut p2 = start;
        loop {
            p1 = match parents[p1] {
                Some(p) => p,
                None => break,
            };
            p2 = match parents[p2].and_then(|p| parents[p]) {
                Some(p) => p,
                None => break,
            };
            if p1 == p2 {
                return Err(GltfImportError::HierarchyCycle(start));
            }
        }
    }
    Ok(())
}

fn flatten_matrix(m: &[[f32; 4]; 4]) -> [f32; 16] {
    let mut out = [0.0; 16];
    for (c, column) in m.iter().enumerate() {
        out[c * 4..c * 4 + 4].copy_from_slice(column);
    }
    out
}

fn compose_trs(t: [f32; 3], r: [f32; 4], s: [f32; 3]) -> [f32; 16] {
    let translation = nalgebra::Matrix4::new_translation(&nalgebra::Vector3::from(t));
    let rotation =
        nalgebra::UnitQuaternion::from_quaternion(nalgebra::Quaternion::new(r[3], r[0], r[1], r[2]))
            .to_homogeneous();
    let scaling = nalgebra::Matrix4::new_nonuniform_scaling(&nalgebra::Vector3::from(s));
    let m = translation * rotation * scaling;
    let mut out = [0.0f32; 16];
    out.copy_from_slice(m.as_slice());
    out
}

fn normalized_rotation(rotation: [f32; 4], config: &GltfConfig, renormalized: &mut usize) -> [f32; 4] {
    let q = nalgebra::Quaternion::new(rotation[3], rotation[0], rotation[1], rotation[2]);
    let norm = q.norm();
    if !config.normalize_quaternions || norm == 0.0 || (norm - 1.0).abs() <= 1.0e-4 {
        return rotation;
    }
    *renormalized += 1;
    let q = q / norm;
    [q.i, q.j, q.k, q.w]
}

/// Flatten one scene. `mesh_offsets` maps a source mesh index to the
/// output id of its first chunk.
pub(crate) fn flatten(
    document: &gltf_dep::Document,
    scene_index: usize,
    mesh_offsets: &[u32],
    config: &GltfConfig,
) -> Result<SceneRecord, GltfImportError> {
    let scene = document
        .scenes()
        .nth(scene_index)
        .ok_or_else(|| GltfImportError::Scene {
            index: scene_index,
            reason: "scene index out of range".to_string(),
        })?;

    let mut nodes = Vec::new();
    let mut objects = Vec::new();
    let mut parents = Vec::new();
    let mut queue: VecDeque<(gltf_dep::Node, i32)> =
        scene.nodes().map(|node| (node, -1)).collect();
    while let Some((node, parent)) = queue.pop_front() {
        let id = node.index() as u32;
        objects.push(id);
        parents.push(parent);
        for child in node.children() {
            queue.push_back((child, id as i32));
        }
        nodes.push(node);
    }

    let has_matrix = nodes
        .iter()
        .any(|n| matches!(n.transform(), gltf_dep::scene::Transform::Matrix { .. }));

    let mut trs = TrsColumns::default();
    let mut transformations: Field<[f32; 16]> = Field::default();
    let mut renormalized = 0usize;
    for node in &nodes {
        let id = node.index() as u32;
        match node.transform() {
            gltf_dep::scene::Transform::Matrix { matrix } => {
                transformations.objects.push(id);
                transformations.values.push(flatten_matrix(&matrix));
            }
            gltf_dep::scene::Transform::Decomposed {
                translation,
                rotation,
                scale,
            } => {
                let rotation = normalized_rotation(rotation, config, &mut renormalized);
                trs.objects.push(id);
                trs.translations.push(translation);
                trs.rotations.push(rotation);
                trs.scalings.push(scale);
                if has_matrix {
                    transformations.objects.push(id);
                    transformations.values.push(compose_trs(translation, rotation, scale));
                }
            }
        }
    }
    if renormalized > 0 {
        log::warn!(
            "scene {}: rotation quaternions of {} nodes were renormalized",
            scene_index,
            renormalized
        );
    }

    let mut meshes = MeshReferences::default();
    let mut cameras: Field<u32> = Field::default();
    let mut lights: Field<u32> = Field::default();
    let mut skins: Field<u32> = Field::default();
    for node in &nodes {
        let id = node.index() as u32;
        if let Some(mesh) = node.mesh() {
            let first = mesh_offsets[mesh.index()];
            for (p, primitive) in mesh.primitives().enumerate() {
                meshes.objects.push(id);
                meshes.meshes.push(first + p as u32);
                meshes
                    .materials
                    .push(primitive.material().index().map_or(-1, |i| i as i32));
            }
        }
        if let Some(camera) = node.camera() {
            cameras.objects.push(id);
            cameras.values.push(camera.index() as u32);
        }
        if let Some(light) = node.light() {
            lights.objects.push(id);
            lights.values.push(light.index() as u32);
        }
        if let Some(skin) = node.skin() {
            skins.objects.push(id);
            skins.values.push(skin.index() as u32);
        }
    }

    let mapping_bound = objects.iter().max().map_or(0, |&max| max + 1);
    Ok(SceneRecord {
        name: scene.name().map(str::to_string),
        mapping_bound,
        objects,
        parents,
        trs: (!trs.is_empty()).then_some(trs),
        transformations: (!transformations.is_empty()).then_some(transformations),
        meshes: (!meshes.is_empty()).then_some(meshes),
        cameras: (!cameras.is_empty()).then_some(cameras),
        lights: (!lights.is_empty()).then_some(lights),
        skins: (!skins.is_empty()).then_some(skins),
        visibilities: None,
        geometry_helpers: None,
        geometry_transforms: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn document(json: &str) -> gltf_dep::Gltf {
        gltf_dep::Gltf::from_slice(json.as_bytes()).unwrap()
    }

    #[test]
    fn breadth_first_order_and_parents() {
        let gltf = document(
            r#"{"asset":{"version":"2.0"},
            "scenes":[{"name":"main","nodes":[0,3]}],
            "nodes":[
                {"children":[1,2],"translation":[1,2,3]},
                {},
                {"scale":[2,2,2]},
                {}]}"#,
        );
        let record = flatten(&gltf.document, 0, &[], &GltfConfig::default()).unwrap();
        assert_eq!(record.name.as_deref(), Some("main"));
        // Roots first, then their children.
        assert_eq!(record.objects, vec![0, 3, 1, 2]);
        assert_eq!(record.parents, vec![-1, -1, 0, 0]);
        assert_eq!(record.mapping_bound, 4);

        // All nodes decompose, so no combined-matrix column.
        assert!(record.transformations.is_none());
        let trs = record.trs.unwrap();
        assert_eq!(trs.len(), 4);
        assert_eq!(trs.translations[0], [1.0, 2.0, 3.0]);
        assert_eq!(trs.rotations[0], [0.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn matrix_node_forces_combined_column() {
        let gltf = document(
            r#"{"asset":{"version":"2.0"},
            "scenes":[{"nodes":[0,1]}],
            "nodes":[
                {"matrix":[1,0,0,0, 0,1,0,0, 0,0,1,0, 5,6,7,1]},
                {"translation":[1,0,0]}]}"#,
        );
        let record = flatten(&gltf.document, 0, &[], &GltfConfig::default()).unwrap();
        let transformations = record.transformations.unwrap();
        // Both the matrix node and the composed TRS node appear.
        assert_eq!(transformations.objects, vec![0, 1]);
        assert_eq!(transformations.values[0][12..15], [5.0, 6.0, 7.0]);
        assert_eq!(transformations.values[1][12..15], [1.0, 0.0, 0.0]);
        assert_eq!(record.trs.unwrap().objects, vec![1]);
    }

    #[test]
    fn mesh_references_fan_out_per_chunk() {
        let gltf = document(
            r#"{"asset":{"version":"2.0"},
            "scenes":[{"nodes":[0]}],
            "nodes":[{"mesh":1}],
            "materials":[{}],
            "meshes":[
                {"primitives":[{"attributes":{}}]},
                {"primitives":[{"attributes":{},"material":0},{"attributes":{}}]}]}"#,
        );
        let record = flatten(&gltf.document, 0, &[0, 1], &GltfConfig::default()).unwrap();
        let meshes = record.meshes.unwrap();
        assert_eq!(meshes.objects, vec![0, 0]);
        assert_eq!(meshes.meshes, vec![1, 2]);
        assert_eq!(meshes.materials, vec![0, -1]);
    }

    #[test]
    fn cyclic_hierarchy_is_refused() {
        let gltf = document(
            r#"{"asset":{"version":"2.0"},
            "nodes":[{"children":[1]},{"children":[0]}]}"#,
        );
        assert!(matches!(
            check_cycles(&gltf.document),
            Err(GltfImportError::HierarchyCycle(_))
        ));
    }

    #[test]
    fn acyclic_hierarchy_passes() {
        let gltf = document(
            r#"{"asset":{"version":"2.0"},
            "nodes":[{"children":[1,2]},{},{"children":[3]},{}]}"#,
        );
        assert!(check_cycles(&gltf.document).is_ok());
    }
}
