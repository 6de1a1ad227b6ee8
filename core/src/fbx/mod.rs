//! Translator for the binary DCC interchange format.
//!
//! The container itself is parsed by an external collaborator; this
//! translator consumes the parsed [`FbxScene`] object graph and answers
//! the same queries as the JSON-format translator: one
//! [`MeshData`](crate::mesh::MeshData) per (material slot, topology)
//! chunk, a single flattened [`SceneRecord`](crate::scene::SceneRecord),
//! layered [`MaterialData`](crate::material::MaterialData), textures,
//! images, cameras, and lights.
//!
//! The format has no skins or animation clips; rigging data does not
//! survive the parser's normalization.

pub mod types;

mod config;
mod error;
mod material;
mod mesh;
mod scene;

use std::collections::HashMap;

use crate::image::{DecodedImage, DecoderSlot, ImageDecoder};
use crate::io::{CachePolicy, FileLoader};
use crate::material::MaterialData;
use crate::mesh::MeshData;
use crate::scene::{CameraData, CameraProjection, LightData, LightKind, SceneRecord};
use crate::texture::{AddressMode, FilterMode, MipmapMode, TextureData};

use mesh::{ChunkRange, FbxMeshChunk};
use scene::GeometryPlan;
use types::{
    FbxLightDecay, FbxLightKind, FbxProjection, FbxScene, FbxTransform, FbxWrapMode,
};

pub use config::{FbxConfig, GeometryTransformHandling, UnitNormalizationHandling};
pub use error::FbxImportError;

/// Names of the format-specific scene columns, addressable through
/// [`scene_field_for_name`].
pub const SCENE_FIELD_NAMES: [&str; 5] = [
    "Visibility",
    "GeometryTransformHelper",
    "GeometryTranslation",
    "GeometryRotation",
    "GeometryScaling",
];

/// Name of one format-specific scene column.
pub fn scene_field_name(field: u32) -> Option<&'static str> {
    SCENE_FIELD_NAMES.get(field as usize).copied()
}

/// Find a format-specific scene column by name.
pub fn scene_field_for_name(name: &str) -> Option<u32> {
    SCENE_FIELD_NAMES
        .iter()
        .position(|&n| n == name)
        .map(|i| i as u32)
}

/// One output texture: a file-backed source texture.
#[derive(Debug, Clone, Copy)]
struct FileTexture {
    /// Index into the parsed texture array.
    texture: u32,
    /// Index into the parsed texture file array.
    file: u32,
}

#[derive(Default)]
struct NameCaches {
    objects: Option<HashMap<String, u32>>,
    meshes: Option<HashMap<String, u32>>,
    materials: Option<HashMap<String, u32>>,
    textures: Option<HashMap<String, u32>>,
    images: Option<HashMap<String, u32>>,
    cameras: Option<HashMap<String, u32>>,
    lights: Option<HashMap<String, u32>>,
}

fn cached_lookup<'n>(
    cache: &mut Option<HashMap<String, u32>>,
    names: impl Iterator<Item = (Option<&'n str>, u32)>,
    name: &str,
) -> Option<u32> {
    let map = cache.get_or_insert_with(|| {
        let mut map = HashMap::new();
        for (entry, id) in names {
            if let Some(entry) = entry {
                // The first entity with a duplicated name wins.
                map.entry(entry.to_string()).or_insert(id);
            }
        }
        map
    });
    map.get(name).copied()
}

/// An opened document of the binary interchange format.
///
/// Queries take `&mut self`: the image decoder is resolved on demand and
/// cached for the document's lifetime.
pub struct FbxDocument<'a> {
    scene: FbxScene,
    config: FbxConfig,
    loader: Option<Box<FileLoader<'a>>>,
    chunks: Vec<FbxMeshChunk>,
    chunk_ranges: Vec<ChunkRange>,
    plan: Vec<GeometryPlan>,
    baked: Vec<Option<FbxTransform>>,
    object_count: usize,
    textures: Vec<FileTexture>,
    texture_remap: Vec<i32>,
    names: NameCaches,
    decoder: DecoderSlot<Box<dyn ImageDecoder>>,
    decoder_factory: Option<Box<dyn FnMut() -> Box<dyn ImageDecoder> + 'a>>,
}

impl<'a> FbxDocument<'a> {
    /// Open a parsed scene. External image files cannot be resolved; use
    /// [`open_with_loader`](Self::open_with_loader) when the document
    /// references them.
    pub fn open(scene: FbxScene, config: FbxConfig) -> Result<Self, FbxImportError> {
        Self::open_impl(scene, config, None)
    }

    /// Open a parsed scene, resolving external files through `loader`.
    pub fn open_with_loader(
        scene: FbxScene,
        config: FbxConfig,
        loader: Box<FileLoader<'a>>,
    ) -> Result<Self, FbxImportError> {
        Self::open_impl(scene, config, Some(loader))
    }

    fn open_impl(
        scene: FbxScene,
        config: FbxConfig,
        loader: Option<Box<FileLoader<'a>>>,
    ) -> Result<Self, FbxImportError> {
        for warning in &scene.warnings {
            if warning.count > 1 {
                log::warn!("{} (x{})", warning.description, warning.count);
            } else {
                log::warn!("{}", warning.description);
            }
        }

        scene::check_cycles(&scene.nodes)?;

        let (chunks, chunk_ranges) = mesh::build_chunks(&scene);
        let plan = scene::plan_geometry(&scene, &config);
        let baked = scene::baked_transforms(&scene, &plan);

        let offset = usize::from(!config.preserve_root());
        let helper_count = plan
            .iter()
            .skip(offset)
            .filter(|p| **p == GeometryPlan::Helper)
            .count();
        let object_count = scene.nodes.len().saturating_sub(offset) + helper_count;

        // Textures without a backing file are filtered from the output;
        // materials reach the survivors through the remap.
        let mut textures = Vec::new();
        let mut texture_remap = vec![-1; scene.textures.len()];
        for (index, texture) in scene.textures.iter().enumerate() {
            if let Some(file) = texture.file {
                texture_remap[index] = textures.len() as i32;
                textures.push(FileTexture {
                    texture: index as u32,
                    file,
                });
            }
        }

        Ok(Self {
            scene,
            config,
            loader,
            chunks,
            chunk_ranges,
            plan,
            baked,
            object_count,
            textures,
            texture_remap,
            names: NameCaches::default(),
            decoder: DecoderSlot::new(),
            decoder_factory: None,
        })
    }

    /// Replace the default image decoder with a custom one; `factory` is
    /// invoked once per image being decoded.
    #[must_use]
    pub fn with_image_decoder(
        mut self,
        factory: impl FnMut() -> Box<dyn ImageDecoder> + 'a,
    ) -> Self {
        self.decoder_factory = Some(Box::new(factory));
        self
    }

    /// The configuration the document was opened with.
    pub fn config(&self) -> &FbxConfig {
        &self.config
    }

    // -- Counts and names --

    /// Number of scenes; the format always has exactly one.
    pub fn scene_count(&self) -> usize {
        1
    }

    /// The default scene.
    pub fn default_scene(&self) -> Option<u32> {
        Some(0)
    }

    /// Number of objects, including synthesized helper nodes.
    pub fn object_count(&self) -> usize {
        self.object_count
    }

    /// Name of an object; helper nodes are unnamed.
    pub fn object_name(&self, index: usize) -> Option<&str> {
        let offset = usize::from(!self.config.preserve_root());
        self.scene.nodes.get(index + offset)?.name.as_deref()
    }

    /// Find an object by name.
    pub fn object_for_name(&mut self, name: &str) -> Option<u32> {
        let offset = usize::from(!self.config.preserve_root());
        let nodes = &self.scene.nodes;
        cached_lookup(
            &mut self.names.objects,
            nodes
                .iter()
                .skip(offset)
                .enumerate()
                .map(|(id, node)| (node.name.as_deref(), id as u32)),
            name,
        )
    }

    /// Number of output meshes. A source mesh counts once per (material
    /// slot, topology) pair with any faces.
    pub fn mesh_count(&self) -> usize {
        self.chunks.len()
    }

    /// Name of an output mesh: the name of the source mesh it was split
    /// from.
    pub fn mesh_name(&self, index: usize) -> Option<&str> {
        let chunk = self.chunks.get(index)?;
        self.scene.meshes[chunk.mesh].name.as_deref()
    }

    /// Find a mesh by source name; returns the id of its first chunk.
    pub fn mesh_for_name(&mut self, name: &str) -> Option<u32> {
        let meshes = &self.scene.meshes;
        let ranges = &self.chunk_ranges;
        cached_lookup(
            &mut self.names.meshes,
            meshes
                .iter()
                .zip(ranges)
                .filter(|(_, range)| range.count > 0)
                .map(|(mesh, range)| (mesh.name.as_deref(), range.base)),
            name,
        )
    }

    /// Number of materials.
    pub fn material_count(&self) -> usize {
        self.scene.materials.len()
    }

    /// Name of a material.
    pub fn material_name(&self, index: usize) -> Option<&str> {
        self.scene.materials.get(index)?.name.as_deref()
    }

    /// Find a material by name.
    pub fn material_for_name(&mut self, name: &str) -> Option<u32> {
        let materials = &self.scene.materials;
        cached_lookup(
            &mut self.names.materials,
            materials
                .iter()
                .enumerate()
                .map(|(id, m)| (m.name.as_deref(), id as u32)),
            name,
        )
    }

    /// Number of textures backed by a file.
    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }

    /// Name of a texture.
    pub fn texture_name(&self, index: usize) -> Option<&str> {
        let texture = self.textures.get(index)?;
        self.scene.textures[texture.texture as usize].name.as_deref()
    }

    /// Find a texture by name.
    pub fn texture_for_name(&mut self, name: &str) -> Option<u32> {
        let textures = &self.textures;
        let scene = &self.scene;
        cached_lookup(
            &mut self.names.textures,
            textures.iter().enumerate().map(|(id, t)| {
                (scene.textures[t.texture as usize].name.as_deref(), id as u32)
            }),
            name,
        )
    }

    /// Number of images.
    pub fn image_count(&self) -> usize {
        self.scene.texture_files.len()
    }

    /// Name of an image: its document-relative path.
    pub fn image_name(&self, index: usize) -> Option<&str> {
        let file = self.scene.texture_files.get(index)?;
        (!file.relative_path.is_empty()).then_some(file.relative_path.as_str())
    }

    /// Find an image by its document-relative path.
    pub fn image_for_name(&mut self, name: &str) -> Option<u32> {
        let files = &self.scene.texture_files;
        cached_lookup(
            &mut self.names.images,
            files.iter().enumerate().map(|(id, f)| {
                let name = (!f.relative_path.is_empty()).then_some(f.relative_path.as_str());
                (name, id as u32)
            }),
            name,
        )
    }

    /// Number of cameras.
    pub fn camera_count(&self) -> usize {
        self.scene.cameras.len()
    }

    /// Name of a camera.
    pub fn camera_name(&self, index: usize) -> Option<&str> {
        self.scene.cameras.get(index)?.name.as_deref()
    }

    /// Find a camera by name.
    pub fn camera_for_name(&mut self, name: &str) -> Option<u32> {
        let cameras = &self.scene.cameras;
        cached_lookup(
            &mut self.names.cameras,
            cameras
                .iter()
                .enumerate()
                .map(|(id, c)| (c.name.as_deref(), id as u32)),
            name,
        )
    }

    /// Number of lights.
    pub fn light_count(&self) -> usize {
        self.scene.lights.len()
    }

    /// Name of a light.
    pub fn light_name(&self, index: usize) -> Option<&str> {
        self.scene.lights.get(index)?.name.as_deref()
    }

    /// Find a light by name.
    pub fn light_for_name(&mut self, name: &str) -> Option<u32> {
        let lights = &self.scene.lights;
        cached_lookup(
            &mut self.names.lights,
            lights
                .iter()
                .enumerate()
                .map(|(id, l)| (l.name.as_deref(), id as u32)),
            name,
        )
    }

    // -- Translation queries --

    /// Translate one output mesh.
    pub fn mesh(&mut self, index: usize) -> Result<MeshData, FbxImportError> {
        let chunk = self.chunks.get(index).ok_or_else(|| FbxImportError::Mesh {
            mesh: index,
            slot: 0,
            reason: "mesh index out of range".to_string(),
        })?;
        let bake = self.baked[chunk.mesh];
        mesh::assemble(&self.scene, chunk, &self.config, bake.as_ref())
    }

    /// Flatten the scene.
    pub fn scene(&mut self, index: usize) -> Result<SceneRecord, FbxImportError> {
        if index != 0 {
            return Err(FbxImportError::Scene {
                index,
                reason: "scene index out of range".to_string(),
            });
        }
        scene::flatten(
            &self.scene,
            &self.config,
            &self.chunks,
            &self.chunk_ranges,
            &self.plan,
        )
    }

    /// Translate one material.
    pub fn material(&mut self, index: usize) -> Result<MaterialData, FbxImportError> {
        if index >= self.scene.materials.len() {
            return Err(FbxImportError::Material {
                index,
                reason: "material index out of range".to_string(),
            });
        }
        material::translate(&self.scene, index, &self.config, &self.texture_remap)
    }

    /// Translate one texture. The format stores no filtering state, so
    /// samplers come out trilinear.
    pub fn texture(&mut self, index: usize) -> Result<TextureData, FbxImportError> {
        let file_texture = self
            .textures
            .get(index)
            .ok_or_else(|| FbxImportError::Texture {
                index,
                reason: "texture index out of range".to_string(),
            })?;
        let texture = &self.scene.textures[file_texture.texture as usize];
        let address = |mode: FbxWrapMode| match mode {
            FbxWrapMode::Repeat => AddressMode::Repeat,
            FbxWrapMode::Clamp => AddressMode::ClampToEdge,
        };
        Ok(TextureData {
            image: file_texture.file,
            mag_filter: FilterMode::Linear,
            min_filter: FilterMode::Linear,
            mipmap: MipmapMode::Linear,
            address_mode_u: address(texture.wrap_u),
            address_mode_v: address(texture.wrap_v),
        })
    }

    /// Resolve and decode one image, preferring embedded content over
    /// the referenced file.
    pub fn image(&mut self, index: usize) -> Result<DecodedImage, FbxImportError> {
        let error = |reason: String| FbxImportError::Image { index, reason };
        if index >= self.scene.texture_files.len() {
            return Err(error("image index out of range".to_string()));
        }
        let file = &self.scene.texture_files[index];
        let factory = &mut self.decoder_factory;
        let loader = &mut self.loader;
        let decoder = self.decoder.setup_or_reuse(index as u32, || {
            let mut decoder: Box<dyn ImageDecoder> = match factory.as_mut() {
                Some(make) => make(),
                None => {
                    #[cfg(feature = "image")]
                    {
                        Box::new(crate::image::DefaultImageDecoder::new())
                    }
                    #[cfg(not(feature = "image"))]
                    {
                        log::error!("image {}: no image decoder installed", index);
                        return None;
                    }
                }
            };
            let path = if file.relative_path.is_empty() {
                file.absolute_path.as_str()
            } else {
                file.relative_path.as_str()
            };
            let opened = if let Some(content) = &file.content {
                decoder.open_data(content)
            } else if path.is_empty() {
                log::error!("image {}: no embedded content and no file path", index);
                return None;
            } else if let Some(loader) = loader.as_mut() {
                match loader(path, CachePolicy::Permanent) {
                    Some(bytes) => decoder.open_data(&bytes),
                    None => {
                        log::error!("image {}: could not load {}", index, path);
                        return None;
                    }
                }
            } else {
                decoder.open_file(path)
            };
            if let Err(e) = opened {
                log::error!("image {}: {}", index, e);
                return None;
            }
            if decoder.image_count() != 1 {
                log::error!(
                    "image {}: expected exactly one image, got {}",
                    index,
                    decoder.image_count()
                );
                return None;
            }
            Some(decoder)
        });
        let Some(decoder) = decoder else {
            return Err(error("image could not be opened".to_string()));
        };
        decoder
            .decode(0)
            .map_err(|e| FbxImportError::Image {
                index,
                reason: e.to_string(),
            })
    }

    /// Translate one camera.
    pub fn camera(&mut self, index: usize) -> Result<CameraData, FbxImportError> {
        let camera = self
            .scene
            .cameras
            .get(index)
            .ok_or_else(|| FbxImportError::Camera {
                index,
                reason: "camera index out of range".to_string(),
            })?;
        let projection = match camera.projection {
            FbxProjection::Perspective => {
                let fov_y = (camera.field_of_view_deg as f32).to_radians();
                let near = camera.near_plane as f32;
                let height = 2.0 * near * (fov_y * 0.5).tan();
                CameraProjection::Perspective {
                    size: [height * camera.aspect_ratio as f32, height],
                    near,
                    far: camera.far_plane as f32,
                }
            }
            FbxProjection::Orthographic => CameraProjection::Orthographic {
                size: [
                    camera.orthographic_size[0] as f32,
                    camera.orthographic_size[1] as f32,
                ],
                near: camera.near_plane as f32,
                far: camera.far_plane as f32,
            },
        };
        Ok(CameraData { projection })
    }

    /// Translate one light.
    pub fn light(&mut self, index: usize) -> Result<LightData, FbxImportError> {
        let error = |reason: String| FbxImportError::Light { index, reason };
        let light = self
            .scene
            .lights
            .get(index)
            .ok_or_else(|| error("light index out of range".to_string()))?;

        let kind = match light.kind {
            FbxLightKind::Point => LightKind::Point,
            FbxLightKind::Directional => LightKind::Directional,
            FbxLightKind::Spot => LightKind::Spot,
            FbxLightKind::Area | FbxLightKind::Volume => {
                return Err(error("area and volume lights are not supported".to_string()));
            }
        };

        let mut attenuation = match light.decay {
            FbxLightDecay::None => [1.0, 0.0, 0.0],
            FbxLightDecay::Linear => [0.0, 1.0, 0.0],
            FbxLightDecay::Quadratic => [0.0, 0.0, 1.0],
            FbxLightDecay::Cubic => {
                log::warn!(
                    "light {}: cubic attenuation not supported, patching to quadratic",
                    index
                );
                [0.0, 0.0, 1.0]
            }
        };
        // Modeling programs rarely constrain decay to match the light
        // type.
        if kind == LightKind::Directional && attenuation != [1.0, 0.0, 0.0] {
            log::warn!(
                "light {}: patching attenuation {:?} to constant for a directional light",
                index,
                attenuation
            );
            attenuation = [1.0, 0.0, 0.0];
        }

        let full_circle = 2.0 * std::f32::consts::PI;
        let (inner, outer) = if kind == LightKind::Spot {
            let inner = light.inner_angle_deg.clamp(0.0, 360.0);
            let outer = light.outer_angle_deg.clamp(inner, 360.0);
            (inner.to_radians(), outer.to_radians())
        } else {
            (full_circle, full_circle)
        };

        Ok(LightData {
            kind,
            color: light.color,
            intensity: light.intensity,
            attenuation,
            range: f32::INFINITY,
            inner_cone_angle: inner,
            outer_cone_angle: outer,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::types::{
        FbxAttachment, FbxCamera, FbxFace, FbxLight, FbxMaterial, FbxMesh, FbxMeshSlot, FbxNode,
        FbxTexture, FbxTextureFile, FbxVertexStream,
    };

    fn triangle_mesh(name: &str, instances: Vec<u32>) -> FbxMesh {
        FbxMesh {
            name: Some(name.to_string()),
            positions: FbxVertexStream {
                values: vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
                indices: vec![0, 1, 2],
            },
            faces: vec![FbxFace {
                index_begin: 0,
                num_indices: 3,
            }],
            materials: vec![FbxMeshSlot {
                material: None,
                face_indices: vec![0],
            }],
            instances,
            ..Default::default()
        }
    }

    fn simple_scene() -> FbxScene {
        FbxScene {
            nodes: vec![
                FbxNode {
                    visible: true,
                    ..Default::default()
                },
                FbxNode {
                    name: Some("cube".to_string()),
                    parent: Some(0),
                    visible: true,
                    attachments: vec![FbxAttachment::Mesh(0)],
                    ..Default::default()
                },
            ],
            meshes: vec![triangle_mesh("cube_mesh", vec![1])],
            materials: vec![FbxMaterial {
                name: Some("paint".to_string()),
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    #[test]
    fn counts_and_names() {
        let mut doc = FbxDocument::open(simple_scene(), FbxConfig::default()).unwrap();
        assert_eq!(doc.scene_count(), 1);
        assert_eq!(doc.default_scene(), Some(0));
        // The implicit root is elided by default.
        assert_eq!(doc.object_count(), 1);
        assert_eq!(doc.object_name(0), Some("cube"));
        assert_eq!(doc.object_for_name("cube"), Some(0));
        assert_eq!(doc.object_for_name("missing"), None);
        assert_eq!(doc.mesh_count(), 1);
        assert_eq!(doc.mesh_name(0), Some("cube_mesh"));
        assert_eq!(doc.mesh_for_name("cube_mesh"), Some(0));
        assert_eq!(doc.material_for_name("paint"), Some(0));
    }

    #[test]
    fn preserved_root_counts_as_object() {
        let config = FbxConfig::default()
            .with_unit_normalization_handling(UnitNormalizationHandling::TransformRoot);
        let mut doc = FbxDocument::open(simple_scene(), config).unwrap();
        assert_eq!(doc.object_count(), 2);
        assert_eq!(doc.object_for_name("cube"), Some(1));
    }

    #[test]
    fn cyclic_hierarchy_fails_to_open() {
        let scene = FbxScene {
            nodes: vec![
                FbxNode {
                    parent: Some(1),
                    ..Default::default()
                },
                FbxNode {
                    parent: Some(0),
                    ..Default::default()
                },
            ],
            ..Default::default()
        };
        assert!(matches!(
            FbxDocument::open(scene, FbxConfig::default()),
            Err(FbxImportError::HierarchyCycle(_))
        ));
    }

    #[test]
    fn file_less_textures_are_filtered() {
        let mut scene = simple_scene();
        scene.textures = vec![
            FbxTexture {
                name: Some("procedural".to_string()),
                file: None,
                ..Default::default()
            },
            FbxTexture {
                name: Some("albedo".to_string()),
                file: Some(0),
                wrap_u: FbxWrapMode::Clamp,
                ..Default::default()
            },
        ];
        scene.texture_files = vec![FbxTextureFile {
            relative_path: "textures/albedo.png".to_string(),
            ..Default::default()
        }];

        let mut doc = FbxDocument::open(scene, FbxConfig::default()).unwrap();
        assert_eq!(doc.texture_count(), 1);
        assert_eq!(doc.texture_name(0), Some("albedo"));
        assert_eq!(doc.texture_for_name("procedural"), None);

        let texture = doc.texture(0).unwrap();
        assert_eq!(texture.image, 0);
        assert_eq!(texture.mag_filter, FilterMode::Linear);
        assert_eq!(texture.mipmap, MipmapMode::Linear);
        assert_eq!(texture.address_mode_u, AddressMode::ClampToEdge);
        assert_eq!(texture.address_mode_v, AddressMode::Repeat);

        assert_eq!(doc.image_count(), 1);
        assert_eq!(doc.image_name(0), Some("textures/albedo.png"));
        assert_eq!(doc.image_for_name("textures/albedo.png"), Some(0));
    }

    #[test]
    fn perspective_camera_near_plane_size() {
        let mut scene = simple_scene();
        scene.cameras = vec![
            FbxCamera {
                name: None,
                projection: FbxProjection::Perspective,
                field_of_view_deg: 90.0,
                aspect_ratio: 2.0,
                near_plane: 1.0,
                far_plane: 100.0,
                orthographic_size: [0.0, 0.0],
            },
            FbxCamera {
                name: None,
                projection: FbxProjection::Orthographic,
                field_of_view_deg: 0.0,
                aspect_ratio: 1.0,
                near_plane: 0.1,
                far_plane: 50.0,
                orthographic_size: [6.0, 4.0],
            },
        ];

        let mut doc = FbxDocument::open(scene, FbxConfig::default()).unwrap();
        let camera = doc.camera(0).unwrap();
        let CameraProjection::Perspective { size, near, far } = camera.projection else {
            panic!("expected a perspective camera");
        };
        // Height = 2 * near * tan(fov / 2) = 2, width doubled by aspect.
        assert!((size[1] - 2.0).abs() < 1.0e-5);
        assert!((size[0] - 4.0).abs() < 1.0e-5);
        assert_eq!(near, 1.0);
        assert_eq!(far, 100.0);

        let camera = doc.camera(1).unwrap();
        assert_eq!(
            camera.projection,
            CameraProjection::Orthographic {
                size: [6.0, 4.0],
                near: 0.1,
                far: 50.0
            }
        );
    }

    #[test]
    fn light_decay_maps_to_attenuation() {
        let light = |kind, decay| FbxLight {
            name: None,
            kind,
            color: [1.0, 1.0, 1.0],
            intensity: 1.0,
            decay,
            inner_angle_deg: 30.0,
            outer_angle_deg: 20.0,
        };
        let mut scene = simple_scene();
        scene.lights = vec![
            light(FbxLightKind::Point, FbxLightDecay::Quadratic),
            light(FbxLightKind::Directional, FbxLightDecay::Linear),
            light(FbxLightKind::Spot, FbxLightDecay::Cubic),
            light(FbxLightKind::Area, FbxLightDecay::None),
        ];

        let mut doc = FbxDocument::open(scene, FbxConfig::default()).unwrap();
        let point = doc.light(0).unwrap();
        assert_eq!(point.kind, LightKind::Point);
        assert_eq!(point.attenuation, [0.0, 0.0, 1.0]);
        assert_eq!(point.range, f32::INFINITY);

        // Non-constant attenuation is patched for directional lights.
        let directional = doc.light(1).unwrap();
        assert_eq!(directional.attenuation, [1.0, 0.0, 0.0]);

        // Cubic decay patches to quadratic; the outer cone angle is
        // clamped to at least the inner one.
        let spot = doc.light(2).unwrap();
        assert_eq!(spot.attenuation, [0.0, 0.0, 1.0]);
        assert!((spot.inner_cone_angle - 30.0f32.to_radians()).abs() < 1.0e-6);
        assert!((spot.outer_cone_angle - 30.0f32.to_radians()).abs() < 1.0e-6);

        assert!(matches!(
            doc.light(3),
            Err(FbxImportError::Light { index: 3, .. })
        ));
    }

    #[test]
    fn modify_geometry_bakes_into_vertices() {
        let mut scene = simple_scene();
        scene.nodes[1].geometry_transform = FbxTransform {
            translation: [5.0, 0.0, 0.0],
            ..FbxTransform::IDENTITY
        };

        let config = FbxConfig::default()
            .with_geometry_transform_handling(GeometryTransformHandling::ModifyGeometry);
        let mut doc = FbxDocument::open(scene, config).unwrap();
        // Baking leaves no helper behind.
        assert_eq!(doc.object_count(), 1);
        let mesh = doc.mesh(0).unwrap();
        let positions: Vec<[f32; 3]> = mesh
            .read_attribute(crate::mesh::AttributeSemantic::Position)
            .unwrap();
        assert_eq!(positions[0], [5.0, 0.0, 0.0]);

        let record = doc.scene(0).unwrap();
        assert_eq!(record.geometry_helpers, Some(vec![false]));
    }

    #[test]
    fn helper_nodes_extend_object_count() {
        let mut scene = simple_scene();
        scene.nodes[1].geometry_transform = FbxTransform {
            translation: [5.0, 0.0, 0.0],
            ..FbxTransform::IDENTITY
        };

        let mut doc = FbxDocument::open(scene, FbxConfig::default()).unwrap();
        assert_eq!(doc.object_count(), 2);
        assert_eq!(doc.object_name(1), None);
        let record = doc.scene(0).unwrap();
        assert_eq!(record.geometry_helpers, Some(vec![false, true]));
        assert_eq!(record.meshes.as_ref().unwrap().objects, vec![1]);
    }

    #[test]
    fn scene_index_is_checked() {
        let mut doc = FbxDocument::open(simple_scene(), FbxConfig::default()).unwrap();
        assert!(doc.scene(0).is_ok());
        assert!(matches!(
            doc.scene(1),
            Err(FbxImportError::Scene { index: 1, .. })
        ));
    }

    #[test]
    fn scene_field_names_round_trip() {
        assert_eq!(scene_field_name(0), Some("Visibility"));
        assert_eq!(scene_field_for_name("GeometryTransformHelper"), Some(1));
        assert_eq!(scene_field_for_name("GeometryScaling"), Some(4));
        assert_eq!(scene_field_for_name("Parent"), None);
        assert_eq!(scene_field_name(9), None);
    }
}
