//! Hierarchy flattening into a column-oriented scene record.
//!
//! The parsed node array flattens into one scene. Object ids are node
//! indices shifted down by one when the implicit root is elided, and
//! geometry transforms resolve per node according to the configured
//! handling: kept as dedicated columns, moved onto synthesized helper
//! child nodes appended after the genuine ones, or baked into vertex
//! data upstream of this module.

use crate::scene::{Field, MeshReferences, SceneRecord, TrsColumns};

use super::config::{FbxConfig, GeometryTransformHandling};
use super::error::FbxImportError;
use super::mesh::{ChunkRange, FbxMeshChunk};
use super::types::{FbxAttachment, FbxNode, FbxScene, FbxTransform};

/// Resolution of one node's geometry transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum GeometryPlan {
    /// Nothing to synthesize: the transform is identity, affects no
    /// attachment, or stays in dedicated columns.
    Keep,
    /// Synthesize a helper child carrying the transform and the node's
    /// attachments.
    Helper,
    /// Bake the transform into the attached meshes' vertex data.
    Bake,
}

/// Decide per node how its geometry transform is represented.
pub(crate) fn plan_geometry(scene: &FbxScene, config: &FbxConfig) -> Vec<GeometryPlan> {
    scene
        .nodes
        .iter()
        .map(|node| {
            if node.geometry_transform.is_identity() || node.attachments.is_empty() {
                return GeometryPlan::Keep;
            }
            match config.geometry_transform_handling {
                GeometryTransformHandling::Preserve => GeometryPlan::Keep,
                GeometryTransformHandling::HelperNodes => GeometryPlan::Helper,
                GeometryTransformHandling::ModifyGeometry => {
                    // Baking is only sound when nothing but single-
                    // instance meshes would inherit the transform.
                    let bakeable = node.attachments.iter().all(|attachment| {
                        matches!(attachment, FbxAttachment::Mesh(mesh)
                            if scene
                                .meshes
                                .get(*mesh as usize)
                                .is_some_and(|m| m.instances.len() == 1))
                    });
                    if bakeable {
                        GeometryPlan::Bake
                    } else {
                        GeometryPlan::Helper
                    }
                }
            }
        })
        .collect()
}

/// Geometry transform to bake per mesh, derived from the plan.
pub(crate) fn baked_transforms(
    scene: &FbxScene,
    plan: &[GeometryPlan],
) -> Vec<Option<FbxTransform>> {
    let mut baked = vec![None; scene.meshes.len()];
    for (node, _) in scene
        .nodes
        .iter()
        .zip(plan)
        .filter(|(_, plan)| **plan == GeometryPlan::Bake)
    {
        for attachment in &node.attachments {
            if let FbxAttachment::Mesh(mesh) = attachment {
                if let Some(slot) = baked.get_mut(*mesh as usize) {
                    *slot = Some(node.geometry_transform);
                }
            }
        }
    }
    baked
}

/// Reject documents whose parent chain loops, using two cursors
/// advancing at different speeds.
pub(crate) fn check_cycles(nodes: &[FbxNode]) -> Result<(), FbxImportError> {
    let parent = |index: usize| -> Option<usize> {
        nodes.get(index).and_then(|n| n.parent).map(|p| p as usize)
    };
    for start in 0..nodes.len() {
        let mut slow = start;
        let mut fast = start;
        loop {
            let Some(step) = parent(fast) else { break };
            let Some(step) = parent(step) else { break };
            fast = step;
            let Some(step) = parent(slow) else { break };
            slow = step;
            if slow == fast {
                return Err(FbxImportError::HierarchyCycle(start));
            }
        }
    }
    Ok(())
}

fn push_trs(columns: &mut TrsColumns, object: u32, transform: &FbxTransform) {
    columns.objects.push(object);
    columns
        .translations
        .push(transform.translation.map(|v| v as f32));
    columns.rotations.push(transform.rotation.map(|v| v as f32));
    columns.scalings.push(transform.scale.map(|v| v as f32));
}

#[allow(clippy::too_many_arguments)]
fn push_attachments(
    scene: &FbxScene,
    chunks: &[FbxMeshChunk],
    ranges: &[ChunkRange],
    node_index: usize,
    object: u32,
    meshes: &mut MeshReferences,
    cameras: &mut Field<u32>,
    lights: &mut Field<u32>,
) -> Result<(), FbxImportError> {
    let error = |reason: String| FbxImportError::Node {
        index: node_index,
        reason,
    };
    let node = &scene.nodes[node_index];
    // Instance material overrides are consumed one per emitted chunk,
    // in attachment order.
    let mut material_cursor = 0usize;
    for attachment in &node.attachments {
        match *attachment {
            FbxAttachment::Mesh(mesh) => {
                let range = ranges
                    .get(mesh as usize)
                    .ok_or_else(|| error(format!("mesh index {} out of range", mesh)))?;
                for chunk_id in range.base..range.base + range.count {
                    let chunk = &chunks[chunk_id as usize];
                    let slot_material = scene.meshes[chunk.mesh].materials[chunk.slot].material;
                    let material = node
                        .materials
                        .get(material_cursor)
                        .copied()
                        .or(slot_material);
                    material_cursor += 1;
                    meshes.objects.push(object);
                    meshes.meshes.push(chunk_id);
                    meshes.materials.push(material.map_or(-1, |m| m as i32));
                }
            }
            FbxAttachment::Camera(camera) => {
                if camera as usize >= scene.cameras.len() {
                    return Err(error(format!("camera index {} out of range", camera)));
                }
                cameras.objects.push(object);
                cameras.values.push(camera);
            }
            FbxAttachment::Light(light) => {
                if light as usize >= scene.lights.len() {
                    return Err(error(format!("light index {} out of range", light)));
                }
                lights.objects.push(object);
                lights.values.push(light);
            }
        }
    }
    Ok(())
}

/// Flatten the node hierarchy into the scene record. Helpers planned by
/// `plan` get ids following every genuine node's, so genuine ids stay
/// stable across handling modes.
pub(crate) fn flatten(
    scene: &FbxScene,
    config: &FbxConfig,
    chunks: &[FbxMeshChunk],
    ranges: &[ChunkRange],
    plan: &[GeometryPlan],
) -> Result<SceneRecord, FbxImportError> {
    let offset = usize::from(!config.preserve_root());
    let node_count = scene.nodes.len().saturating_sub(offset);
    let preserve_columns =
        config.geometry_transform_handling == GeometryTransformHandling::Preserve;

    if offset == 1 {
        if let Some(root) = scene.nodes.first() {
            if !root.attachments.is_empty() {
                log::warn!(
                    "dropping {} attachment(s) on the elided root node",
                    root.attachments.len()
                );
            }
        }
    }

    let helper_count = plan
        .iter()
        .skip(offset)
        .filter(|plan| **plan == GeometryPlan::Helper)
        .count();
    let total = node_count + helper_count;

    let mut objects = Vec::with_capacity(total);
    let mut parents = Vec::with_capacity(total);
    let mut trs = TrsColumns::default();
    let mut visibilities = Vec::with_capacity(total);
    let mut helper_flags = Vec::with_capacity(total);
    let mut geometry = preserve_columns.then(TrsColumns::default);
    let mut meshes = MeshReferences::default();
    let mut cameras = Field::default();
    let mut lights = Field::default();

    for (index, node) in scene.nodes.iter().enumerate().skip(offset) {
        let object = (index - offset) as u32;
        let parent = match node.parent {
            Some(p) if (p as usize) < offset => -1,
            Some(p) if (p as usize) < scene.nodes.len() => (p as usize - offset) as i32,
            Some(p) => {
                return Err(FbxImportError::Node {
                    index,
                    reason: format!("parent index {} out of range", p),
                })
            }
            None => -1,
        };
        objects.push(object);
        parents.push(parent);
        push_trs(&mut trs, object, &node.local_transform);
        visibilities.push(node.visible);
        helper_flags.push(false);
        if let Some(geometry) = &mut geometry {
            push_trs(geometry, object, &node.geometry_transform);
        }
        if plan[index] != GeometryPlan::Helper {
            push_attachments(
                scene,
                chunks,
                ranges,
                index,
                object,
                &mut meshes,
                &mut cameras,
                &mut lights,
            )?;
        }
    }

    let mut next = node_count as u32;
    for (index, node) in scene.nodes.iter().enumerate().skip(offset) {
        if plan[index] != GeometryPlan::Helper {
            continue;
        }
        let object = next;
        next += 1;
        objects.push(object);
        parents.push((index - offset) as i32);
        push_trs(&mut trs, object, &node.geometry_transform);
        visibilities.push(node.visible);
        helper_flags.push(true);
        if let Some(geometry) = &mut geometry {
            push_trs(geometry, object, &FbxTransform::IDENTITY);
        }
        push_attachments(
            scene,
            chunks,
            ranges,
            index,
            object,
            &mut meshes,
            &mut cameras,
            &mut lights,
        )?;
    }

    Ok(SceneRecord {
        name: None,
        mapping_bound: total as u32,
        objects,
        parents,
        trs: Some(trs),
        transformations: None,
        meshes: (!meshes.is_empty()).then_some(meshes),
        cameras: (!cameras.is_empty()).then_some(cameras),
        lights: (!lights.is_empty()).then_some(lights),
        skins: None,
        visibilities: Some(visibilities),
        geometry_helpers: Some(helper_flags),
        geometry_transforms: geometry,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fbx::config::UnitNormalizationHandling;
    use crate::fbx::mesh::build_chunks;
    use crate::fbx::types::{FbxFace, FbxMesh, FbxMeshSlot, FbxVertexStream};

    fn triangle_mesh(instances: Vec<u32>) -> FbxMesh {
        FbxMesh {
            positions: FbxVertexStream {
                values: vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
                indices: vec![0, 1, 2],
            },
            faces: vec![FbxFace {
                index_begin: 0,
                num_indices: 3,
            }],
            materials: vec![FbxMeshSlot {
                material: Some(7),
                face_indices: vec![0],
            }],
            instances,
            ..Default::default()
        }
    }

    fn node(parent: Option<u32>, attachments: Vec<FbxAttachment>) -> FbxNode {
        FbxNode {
            parent,
            visible: true,
            attachments,
            ..Default::default()
        }
    }

    fn flatten_scene(scene: &FbxScene, config: &FbxConfig) -> SceneRecord {
        let (chunks, ranges) = build_chunks(scene);
        let plan = plan_geometry(scene, config);
        flatten(scene, config, &chunks, &ranges, &plan).unwrap()
    }

    #[test]
    fn cycle_is_detected() {
        let a = node(Some(1), Vec::new());
        let b = node(Some(0), Vec::new());
        let error = check_cycles(&[a, b]).unwrap_err();
        assert!(matches!(error, FbxImportError::HierarchyCycle(_)));

        let root = node(None, Vec::new());
        let child = node(Some(0), Vec::new());
        assert!(check_cycles(&[root, child]).is_ok());
    }

    #[test]
    fn root_elision_shifts_object_ids() {
        let scene = FbxScene {
            nodes: vec![
                node(None, Vec::new()),
                node(Some(0), Vec::new()),
                node(Some(1), Vec::new()),
            ],
            ..Default::default()
        };

        let record = flatten_scene(&scene, &FbxConfig::default());
        assert_eq!(record.objects, vec![0, 1]);
        assert_eq!(record.parents, vec![-1, 0]);
        assert_eq!(record.mapping_bound, 2);
        assert_eq!(record.visibilities, Some(vec![true, true]));

        let config = FbxConfig::default()
            .with_unit_normalization_handling(UnitNormalizationHandling::TransformRoot);
        let record = flatten_scene(&scene, &config);
        assert_eq!(record.objects, vec![0, 1, 2]);
        assert_eq!(record.parents, vec![-1, 0, 1]);
    }

    #[test]
    fn helper_node_carries_transform_and_attachments() {
        let mut carrier = node(Some(0), vec![FbxAttachment::Mesh(0)]);
        carrier.geometry_transform = FbxTransform {
            translation: [0.0, 5.0, 0.0],
            ..FbxTransform::IDENTITY
        };
        let scene = FbxScene {
            nodes: vec![node(None, Vec::new()), carrier, node(Some(0), Vec::new())],
            meshes: vec![triangle_mesh(vec![1])],
            ..Default::default()
        };

        let record = flatten_scene(&scene, &FbxConfig::default());
        // Two genuine objects plus one helper appended at the end.
        assert_eq!(record.objects, vec![0, 1, 2]);
        assert_eq!(record.parents, vec![-1, -1, 0]);
        assert_eq!(record.geometry_helpers, Some(vec![false, false, true]));
        let trs = record.trs.as_ref().unwrap();
        assert_eq!(trs.translations[2], [0.0, 5.0, 0.0]);
        // The mesh hangs off the helper, not the carrier.
        let meshes = record.meshes.as_ref().unwrap();
        assert_eq!(meshes.objects, vec![2]);
        assert_eq!(meshes.materials, vec![7]);
        assert!(record.geometry_transforms.is_none());
    }

    #[test]
    fn preserve_mode_emits_geometry_columns() {
        let mut carrier = node(Some(0), vec![FbxAttachment::Mesh(0)]);
        carrier.geometry_transform = FbxTransform {
            scale: [2.0, 2.0, 2.0],
            ..FbxTransform::IDENTITY
        };
        let scene = FbxScene {
            nodes: vec![node(None, Vec::new()), carrier],
            meshes: vec![triangle_mesh(vec![1])],
            ..Default::default()
        };

        let config = FbxConfig::default()
            .with_geometry_transform_handling(GeometryTransformHandling::Preserve);
        let record = flatten_scene(&scene, &config);
        assert_eq!(record.objects, vec![0]);
        assert_eq!(record.geometry_helpers, Some(vec![false]));
        let geometry = record.geometry_transforms.as_ref().unwrap();
        assert_eq!(geometry.objects, vec![0]);
        assert_eq!(geometry.scalings[0], [2.0, 2.0, 2.0]);
        let meshes = record.meshes.as_ref().unwrap();
        assert_eq!(meshes.objects, vec![0]);
    }

    #[test]
    fn bake_plan_requires_single_instance_meshes() {
        let mut carrier = node(Some(0), vec![FbxAttachment::Mesh(0)]);
        carrier.geometry_transform = FbxTransform {
            translation: [1.0, 0.0, 0.0],
            ..FbxTransform::IDENTITY
        };
        let mut scene = FbxScene {
            nodes: vec![node(None, Vec::new()), carrier],
            meshes: vec![triangle_mesh(vec![1])],
            ..Default::default()
        };

        let config = FbxConfig::default()
            .with_geometry_transform_handling(GeometryTransformHandling::ModifyGeometry);
        let plan = plan_geometry(&scene, &config);
        assert_eq!(plan[1], GeometryPlan::Bake);
        let baked = baked_transforms(&scene, &plan);
        assert_eq!(baked[0].unwrap().translation, [1.0, 0.0, 0.0]);

        // Attachments stay on the carrier when baking.
        let (chunks, ranges) = build_chunks(&scene);
        let record = flatten(&scene, &config, &chunks, &ranges, &plan).unwrap();
        assert_eq!(record.objects, vec![0]);
        assert_eq!(record.meshes.as_ref().unwrap().objects, vec![0]);

        // A second instance forces the helper fallback.
        scene.meshes[0].instances.push(2);
        scene.nodes.push(node(Some(0), vec![FbxAttachment::Mesh(0)]));
        let plan = plan_geometry(&scene, &config);
        assert_eq!(plan[1], GeometryPlan::Helper);
        assert!(baked_transforms(&scene, &plan)[0].is_none());
    }

    #[test]
    fn bake_plan_rejects_mixed_attachments() {
        let mut carrier = node(
            Some(0),
            vec![FbxAttachment::Mesh(0), FbxAttachment::Light(0)],
        );
        carrier.geometry_transform = FbxTransform {
            translation: [1.0, 0.0, 0.0],
            ..FbxTransform::IDENTITY
        };
        let scene = FbxScene {
            nodes: vec![node(None, Vec::new()), carrier],
            meshes: vec![triangle_mesh(vec![1])],
            lights: vec![crate::fbx::types::FbxLight {
                name: None,
                kind: crate::fbx::types::FbxLightKind::Point,
                color: [1.0, 1.0, 1.0],
                intensity: 1.0,
                decay: crate::fbx::types::FbxLightDecay::Quadratic,
                inner_angle_deg: 0.0,
                outer_angle_deg: 0.0,
            }],
            ..Default::default()
        };

        let config = FbxConfig::default()
            .with_geometry_transform_handling(GeometryTransformHandling::ModifyGeometry);
        let plan = plan_geometry(&scene, &config);
        assert_eq!(plan[1], GeometryPlan::Helper);
    }

    #[test]
    fn instance_materials_override_slot_materials() {
        let mut mesh = triangle_mesh(vec![1, 2]);
        mesh.materials.push(FbxMeshSlot {
            material: None,
            face_indices: Vec::new(),
        });
        let mut with_override = node(Some(0), vec![FbxAttachment::Mesh(0)]);
        with_override.materials = vec![3];
        let scene = FbxScene {
            nodes: vec![
                node(None, Vec::new()),
                with_override,
                node(Some(0), vec![FbxAttachment::Mesh(0)]),
            ],
            meshes: vec![mesh],
            ..Default::default()
        };

        let record = flatten_scene(&scene, &FbxConfig::default());
        let meshes = record.meshes.as_ref().unwrap();
        // Empty second slot produces no chunk, so each node emits one
        // reference: the override on node 1, the slot material on node 2.
        assert_eq!(meshes.objects, vec![0, 1]);
        assert_eq!(meshes.materials, vec![3, 7]);
    }

    #[test]
    fn out_of_range_references_fail() {
        let scene = FbxScene {
            nodes: vec![
                node(None, Vec::new()),
                node(Some(0), vec![FbxAttachment::Camera(0)]),
            ],
            ..Default::default()
        };
        let config = FbxConfig::default();
        let (chunks, ranges) = build_chunks(&scene);
        let plan = plan_geometry(&scene, &config);
        let error = flatten(&scene, &config, &chunks, &ranges, &plan).unwrap_err();
        assert!(matches!(error, FbxImportError::Node { index: 1, .. }));
    }
}
