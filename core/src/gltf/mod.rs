//! Translator for the JSON-described interchange format.
//!
//! [`GltfDocument`] opens a document from bytes (binary container or bare
//! JSON) and answers queries producing the engine-neutral representation:
//! [`MeshData`](crate::mesh::MeshData) per source primitive,
//! [`SceneRecord`](crate::scene::SceneRecord) per scene,
//! [`MaterialData`](crate::material::MaterialData) per material, and so
//! on. Multi-primitive meshes are split into one output mesh per
//! primitive ("chunks"); scenes reference chunk ids.
//!
//! Buffers and images resolve lazily: external files are fetched through
//! an optional [`FileLoader`] callback, each at most once.

mod accessor;
mod animation;
mod buffer;
mod config;
mod error;
mod material;
mod mesh;
mod scene;
mod texture;

use std::collections::HashMap;

use crate::image::{DecodedImage, DecoderSlot, ImageDecoder};
use crate::io::FileLoader;
use crate::material::MaterialData;
use crate::mesh::MeshData;
use crate::scene::{
    AnimationClip, CameraData, CameraProjection, LightData, LightKind, SceneRecord, SkinData,
};
use crate::texture::TextureData;

use buffer::BufferStore;

pub use config::GltfConfig;
pub use error::GltfImportError;
pub(crate) use texture::ImagePayload;

/// Extensions this translator understands.
const SUPPORTED_EXTENSIONS: &[&str] = &[
    "KHR_lights_punctual",
    "KHR_materials_clearcoat",
    "KHR_materials_emissive_strength",
    "KHR_materials_ior",
    "KHR_materials_pbrSpecularGlossiness",
    "KHR_materials_sheen",
    "KHR_materials_specular",
    "KHR_materials_transmission",
    "KHR_materials_unlit",
    "KHR_materials_volume",
    "KHR_mesh_quantization",
    "KHR_texture_basisu",
    "KHR_texture_transform",
    "GOOGLE_texture_basis",
    "MSFT_texture_dds",
];

/// One output mesh: a (source mesh, primitive) pair.
#[derive(Debug, Clone, Copy)]
struct MeshChunk {
    mesh: usize,
    primitive: usize,
}

#[derive(Default)]
struct NameCaches {
    scenes: Option<HashMap<String, u32>>,
    objects: Option<HashMap<String, u32>>,
    meshes: Option<HashMap<String, u32>>,
    materials: Option<HashMap<String, u32>>,
    textures: Option<HashMap<String, u32>>,
    images: Option<HashMap<String, u32>>,
    cameras: Option<HashMap<String, u32>>,
    lights: Option<HashMap<String, u32>>,
    skins: Option<HashMap<String, u32>>,
    animations: Option<HashMap<String, u32>>,
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

/// An opened document of the JSON scene format.
///
/// Queries take `&mut self`: buffer payloads and the image decoder are
/// resolved on demand and cached for the document's lifetime.
pub struct GltfDocument<'a> {
    document: gltf_dep::Document,
    blob: Option<Vec<u8>>,
    config: GltfConfig,
    loader: Option<Box<FileLoader<'a>>>,
    buffers: BufferStore,
    chunks: Vec<MeshChunk>,
    mesh_offsets: Vec<u32>,
    custom_attributes: Vec<String>,
    flip_in_material: bool,
    names: NameCaches,
    decoder: DecoderSlot<Box<dyn ImageDecoder>>,
    decoder_factory: Option<Box<dyn FnMut() -> Box<dyn ImageDecoder> + 'a>>,
}

impl std::fmt::Debug for GltfDocument<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GltfDocument").finish_non_exhaustive()
    }
}

impl<'a> GltfDocument<'a> {
    /// Open a document from its bytes. External buffer and image files
    /// cannot be resolved; use [`open_with_loader`](Self::open_with_loader)
    /// when the document references them.
    pub fn open(bytes: &[u8], config: GltfConfig) -> Result<Self, GltfImportError> {
        Self::open_impl(bytes, config, None)
    }

    /// Open a document, resolving external files through `loader`.
    pub fn open_with_loader(
        bytes: &[u8],
        config: GltfConfig,
        loader: Box<FileLoader<'a>>,
    ) -> Result<Self, GltfImportError> {
        Self::open_impl(bytes, config, Some(loader))
    }

    fn open_impl(
        bytes: &[u8],
        config: GltfConfig,
        loader: Option<Box<FileLoader<'a>>>,
    ) -> Result<Self, GltfImportError> {
        let gltf = gltf_dep::Gltf::from_slice(bytes)?;
        let (document, blob) = (gltf.document, gltf.blob);

        for extension in document.extensions_required() {
            if SUPPORTED_EXTENSIONS.contains(&extension) {
                continue;
            }
            if config.ignore_required_extensions {
                log::warn!("ignoring required extension {}", extension);
            } else {
                return Err(GltfImportError::RequiredExtension(extension.to_string()));
            }
        }

        scene::check_cycles(&document)?;

        let mut chunks = Vec::new();
        let mut mesh_offsets = Vec::with_capacity(document.meshes().len());
        for m in document.meshes() {
            mesh_offsets.push(chunks.len() as u32);
            for (p, _) in m.primitives().enumerate() {
                chunks.push(MeshChunk {
                    mesh: m.index(),
                    primitive: p,
                });
            }
        }

        let mut custom_attributes = Vec::new();
        mesh::register_custom_attributes(&document, &config, &mut custom_attributes);

        let mut flip_in_material = config.texture_coordinate_y_flip_in_material;
        if !flip_in_material && mesh::texcoords_require_material_flip(&document) {
            log::info!(
                "texture coordinates cannot be flipped in place, \
                 expressing the flip in material texture matrices instead"
            );
            flip_in_material = true;
        }

        let buffers = BufferStore::new(document.buffers().len());
        Ok(Self {
            document,
            blob,
            config,
            loader,
            buffers,
            chunks,
            mesh_offsets,
            custom_attributes,
            flip_in_material,
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
    pub fn config(&self) -> &GltfConfig {
        &self.config
    }

    /// Whether texture coordinate V-flipping is expressed in material
    /// texture matrices instead of in vertex data.
    pub fn texture_coordinate_y_flip_in_material(&self) -> bool {
        self.flip_in_material
    }

    // -- Counts and names --

    /// Number of scenes.
    pub fn scene_count(&self) -> usize {
        self.document.scenes().len()
    }

    /// The document's default scene, if it declares one.
    pub fn default_scene(&self) -> Option<u32> {
        self.document.default_scene().map(|s| s.index() as u32)
    }

    /// Name of a scene.
    pub fn scene_name(&self, index: usize) -> Option<&str> {
        self.document.scenes().nth(index)?.name()
    }

    /// Find a scene by name.
    pub fn scene_for_name(&mut self, name: &str) -> Option<u32> {
        let document = &self.document;
        cached_lookup(
            &mut self.names.scenes,
            document.scenes().map(|s| (s.name(), s.index() as u32)),
            name,
        )
    }

    /// Number of objects (nodes).
    pub fn object_count(&self) -> usize {
        self.document.nodes().len()
    }

    /// Name of an object.
    pub fn object_name(&self, index: usize) -> Option<&str> {
        self.document.nodes().nth(index)?.name()
    }

    /// Find an object by name.
    pub fn object_for_name(&mut self, name: &str) -> Option<u32> {
        let document = &self.document;
        cached_lookup(
            &mut self.names.objects,
            document.nodes().map(|n| (n.name(), n.index() as u32)),
            name,
        )
    }

    /// Number of output meshes. Multi-primitive source meshes count once
    /// per primitive.
    pub fn mesh_count(&self) -> usize {
        self.chunks.len()
    }

    /// Name of an output mesh: the name of the source mesh it was split
    /// from.
    pub fn mesh_name(&self, index: usize) -> Option<&str> {
        let chunk = self.chunks.get(index)?;
        self.document.meshes().nth(chunk.mesh)?.name()
    }

    /// Find a mesh by source name; returns the id of its first chunk.
    pub fn mesh_for_name(&mut self, name: &str) -> Option<u32> {
        let document = &self.document;
        let offsets = &self.mesh_offsets;
        cached_lookup(
            &mut self.names.meshes,
            document.meshes().map(|m| (m.name(), offsets[m.index()])),
            name,
        )
    }

    /// Name of a registered custom vertex attribute.
    pub fn mesh_attribute_name(&self, id: u32) -> Option<&str> {
        self.custom_attributes.get(id as usize).map(String::as_str)
    }

    /// Find a custom vertex attribute id by its source name.
    pub fn mesh_attribute_for_name(&self, name: &str) -> Option<u32> {
        self.custom_attributes
            .iter()
            .position(|n| n == name)
            .map(|i| i as u32)
    }

    /// Number of materials.
    pub fn material_count(&self) -> usize {
        self.document.materials().len()
    }

    /// Name of a material.
    pub fn material_name(&self, index: usize) -> Option<&str> {
        self.document.materials().nth(index)?.name()
    }

    /// Find a material by name.
    pub fn material_for_name(&mut self, name: &str) -> Option<u32> {
        let document = &self.document;
        cached_lookup(
            &mut self.names.materials,
            document
                .materials()
                .filter_map(|m| m.index().map(|i| (m.name(), i as u32))),
            name,
        )
    }

    /// Number of textures.
    pub fn texture_count(&self) -> usize {
        self.document.textures().len()
    }

    /// Name of a texture.
    ///
    /// Texture names live in the raw document; the wrapper type does not
    /// lend them out for the document's lifetime.
    pub fn texture_name(&self, index: usize) -> Option<&str> {
        self.document.as_json().textures.get(index)?.name.as_deref()
    }

    /// Find a texture by name.
    pub fn texture_for_name(&mut self, name: &str) -> Option<u32> {
        let document = &self.document;
        cached_lookup(
            &mut self.names.textures,
            document
                .as_json()
                .textures
                .iter()
                .enumerate()
                .map(|(id, t)| (t.name.as_deref(), id as u32)),
            name,
        )
    }

    /// Number of images.
    pub fn image_count(&self) -> usize {
        self.document.images().len()
    }

    /// Name of an image.
    pub fn image_name(&self, index: usize) -> Option<&str> {
        self.document.images().nth(index)?.name()
    }

    /// Find an image by name.
    pub fn image_for_name(&mut self, name: &str) -> Option<u32> {
        let document = &self.document;
        cached_lookup(
            &mut self.names.images,
            document.images().map(|i| (i.name(), i.index() as u32)),
            name,
        )
    }

    /// Number of cameras.
    pub fn camera_count(&self) -> usize {
        self.document.cameras().len()
    }

    /// Name of a camera.
    pub fn camera_name(&self, index: usize) -> Option<&str> {
        self.document.cameras().nth(index)?.name()
    }

    /// Find a camera by name.
    pub fn camera_for_name(&mut self, name: &str) -> Option<u32> {
        let document = &self.document;
        cached_lookup(
            &mut self.names.cameras,
            document.cameras().map(|c| (c.name(), c.index() as u32)),
            name,
        )
    }

    /// Number of lights.
    pub fn light_count(&self) -> usize {
        self.document.lights().map_or(0, |lights| lights.len())
    }

    /// Name of a light.
    pub fn light_name(&self, index: usize) -> Option<&str> {
        self.document.lights()?.nth(index)?.name()
    }

    /// Find a light by name.
    pub fn light_for_name(&mut self, name: &str) -> Option<u32> {
        let document = &self.document;
        cached_lookup(
            &mut self.names.lights,
            document
                .lights()
                .into_iter()
                .flatten()
                .map(|l| (l.name(), l.index() as u32)),
            name,
        )
    }

    /// Number of skins.
    pub fn skin_count(&self) -> usize {
        self.document.skins().len()
    }

    /// Name of a skin.
    pub fn skin_name(&self, index: usize) -> Option<&str> {
        self.document.skins().nth(index)?.name()
    }

    /// Find a skin by name.
    pub fn skin_for_name(&mut self, name: &str) -> Option<u32> {
        let document = &self.document;
        cached_lookup(
            &mut self.names.skins,
            document.skins().map(|s| (s.name(), s.index() as u32)),
            name,
        )
    }

    /// Number of animation clips; any number of source animations counts
    /// as one clip when clip merging is enabled.
    pub fn animation_count(&self) -> usize {
        let count = self.document.animations().len();
        if self.config.merge_animation_clips {
            count.min(1)
        } else {
            count
        }
    }

    /// Name of an animation clip; merged clips are unnamed.
    pub fn animation_name(&self, index: usize) -> Option<&str> {
        if self.config.merge_animation_clips {
            return None;
        }
        self.document.animations().nth(index)?.name()
    }

    /// Find an animation clip by name.
    pub fn animation_for_name(&mut self, name: &str) -> Option<u32> {
        if self.config.merge_animation_clips {
            return None;
        }
        let document = &self.document;
        cached_lookup(
            &mut self.names.animations,
            document.animations().map(|a| (a.name(), a.index() as u32)),
            name,
        )
    }

    // -- Translation queries --

    /// Translate one output mesh.
    pub fn mesh(&mut self, index: usize) -> Result<MeshData, GltfImportError> {
        let chunk = *self
            .chunks
            .get(index)
            .ok_or_else(|| GltfImportError::Mesh {
                mesh: index,
                primitive: 0,
                reason: "mesh index out of range".to_string(),
            })?;
        mesh::assemble(
            &self.document,
            &mut self.buffers,
            self.blob.as_deref(),
            &mut self.loader,
            chunk.mesh,
            chunk.primitive,
            &self.config,
            self.flip_in_material,
            &mut self.custom_attributes,
        )
    }

    /// Flatten one scene.
    pub fn scene(&mut self, index: usize) -> Result<SceneRecord, GltfImportError> {
        scene::flatten(&self.document, index, &self.mesh_offsets, &self.config)
    }

    /// Translate one material.
    pub fn material(&mut self, index: usize) -> Result<MaterialData, GltfImportError> {
        material::translate(&self.document, index, &self.config, self.flip_in_material)
    }

    /// Translate one texture.
    pub fn texture(&mut self, index: usize) -> Result<TextureData, GltfImportError> {
        texture::translate(&self.document, index)
    }

    /// Resolve and decode one image.
    pub fn image(&mut self, index: usize) -> Result<DecodedImage, GltfImportError> {
        let payload = texture::image_payload(
            &self.document,
            &mut self.buffers,
            self.blob.as_deref(),
            &mut self.loader,
            index,
        )?;
        let factory = &mut self.decoder_factory;
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
            let opened = match &payload {
                ImagePayload::Bytes(bytes) => decoder.open_data(bytes),
                ImagePayload::Path(path) => decoder.open_file(path),
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
            return Err(GltfImportError::Image {
                index,
                reason: "image could not be opened".to_string(),
            });
        };
        decoder.decode(0).map_err(|e| GltfImportError::Image {
            index,
            reason: e.to_string(),
        })
    }

    /// Translate one camera.
    pub fn camera(&mut self, index: usize) -> Result<CameraData, GltfImportError> {
        let camera = self
            .document
            .cameras()
            .nth(index)
            .ok_or_else(|| GltfImportError::Camera {
                index,
                reason: "camera index out of range".to_string(),
            })?;
        let projection = match camera.projection() {
            gltf_dep::camera::Projection::Perspective(p) => {
                let aspect = p.aspect_ratio().unwrap_or(1.0);
                let height = 2.0 * p.znear() * (p.yfov() * 0.5).tan();
                CameraProjection::Perspective {
                    size: [height * aspect, height],
                    near: p.znear(),
                    far: p.zfar().unwrap_or(f32::INFINITY),
                }
            }
            gltf_dep::camera::Projection::Orthographic(o) => CameraProjection::Orthographic {
                size: [2.0 * o.xmag(), 2.0 * o.ymag()],
                near: o.znear(),
                far: o.zfar(),
            },
        };
        Ok(CameraData { projection })
    }

    /// Translate one light.
    pub fn light(&mut self, index: usize) -> Result<LightData, GltfImportError> {
        use gltf_dep::khr_lights_punctual::Kind;
        let error = |reason: String| GltfImportError::Light { index, reason };
        let light = self
            .document
            .lights()
            .and_then(|mut lights| lights.nth(index))
            .ok_or_else(|| error("light index out of range".to_string()))?;

        // A range of zero is the format's unbounded sentinel, same as an
        // absent range.
        let range = match light.range() {
            Some(range) if range != 0.0 => range,
            _ => f32::INFINITY,
        };
        let full_circle = 2.0 * std::f32::consts::PI;
        let (kind, attenuation, inner, outer) = match light.kind() {
            Kind::Directional => {
                if range.is_finite() {
                    return Err(error("directional lights cannot have a range".to_string()));
                }
                (
                    LightKind::Directional,
                    [1.0, 0.0, 0.0],
                    full_circle,
                    full_circle,
                )
            }
            Kind::Point => (LightKind::Point, [1.0, 0.0, 1.0], full_circle, full_circle),
            Kind::Spot {
                inner_cone_angle,
                outer_cone_angle,
            } => {
                let half_pi = std::f32::consts::FRAC_PI_2;
                // A full half-angle of 90 degrees would open the cone into
                // a plane; the translated spot keeps outer strictly below.
                if !(0.0..outer_cone_angle).contains(&inner_cone_angle)
                    || outer_cone_angle >= half_pi
                {
                    return Err(error(format!(
                        "invalid spot cone angles, inner {} outer {}",
                        inner_cone_angle, outer_cone_angle
                    )));
                }
                (
                    LightKind::Spot,
                    [1.0, 0.0, 1.0],
                    2.0 * inner_cone_angle,
                    2.0 * outer_cone_angle,
                )
            }
        };
        Ok(LightData {
            kind,
            color: light.color(),
            intensity: light.intensity(),
            attenuation,
            range,
            inner_cone_angle: inner,
            outer_cone_angle: outer,
        })
    }

    /// Translate one skin.
    pub fn skin(&mut self, index: usize) -> Result<SkinData, GltfImportError> {
        let error = |reason: String| GltfImportError::Skin { index, reason };
        let skin = self
            .document
            .skins()
            .nth(index)
            .ok_or_else(|| error("skin index out of range".to_string()))?;
        let joints: Vec<u32> = skin.joints().map(|n| n.index() as u32).collect();
        if joints.is_empty() {
            return Err(error("skin has no joints".to_string()));
        }
        let mut inverse_bind_matrices = Vec::new();
        if let Some(acc) = skin.inverse_bind_matrices() {
            let layout = accessor::validate(&acc)?;
            if layout.component != crate::mesh::ComponentType::F32
                || layout.dimensions != gltf_dep::accessor::Dimensions::Mat4
                || layout.normalized
            {
                return Err(error(
                    "inverse bind matrices must be 4x4 float matrices".to_string(),
                ));
            }
            if layout.count != joints.len() {
                return Err(error(format!(
                    "expected {} inverse bind matrices, got {}",
                    joints.len(),
                    layout.count
                )));
            }
            let buffer = self
                .document
                .buffers()
                .nth(layout.buffer)
                .ok_or_else(|| error("buffer index out of range".to_string()))?;
            let bytes = self
                .buffers
                .fetch(buffer, self.blob.as_deref(), &mut self.loader)?;
            let view = accessor::StridedView::new(&layout, bytes);
            for i in 0..view.count() {
                let mut matrix = [0.0f32; 16];
                view.read_f32(i, &mut matrix);
                inverse_bind_matrices.push(matrix);
            }
        }
        Ok(SkinData {
            name: skin.name().map(str::to_string),
            joints,
            inverse_bind_matrices,
        })
    }

    /// Translate one animation clip.
    pub fn animation(&mut self, index: usize) -> Result<AnimationClip, GltfImportError> {
        animation::translate(
            &self.document,
            &mut self.buffers,
            self.blob.as_deref(),
            &mut self.loader,
            index,
            &self.config,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open(json: &str) -> GltfDocument<'static> {
        GltfDocument::open(json.as_bytes(), GltfConfig::default()).unwrap()
    }

    #[test]
    fn counts_and_names() {
        let mut doc = open(
            r#"{"asset":{"version":"2.0"},
            "scene":1,
            "scenes":[{"name":"a"},{"name":"b"}],
            "nodes":[{"name":"root"}],
            "materials":[{"name":"steel"},{"name":"wood"}],
            "images":[{"uri":"a.png","name":"albedo"}],
            "textures":[{"source":0},{"source":0,"name":"albedo_map"}],
            "meshes":[
                {"name":"body","primitives":[{"attributes":{}},{"attributes":{}}]},
                {"name":"wheel","primitives":[{"attributes":{}}]}]}"#,
        );
        assert_eq!(doc.scene_count(), 2);
        assert_eq!(doc.default_scene(), Some(1));
        assert_eq!(doc.scene_for_name("b"), Some(1));
        assert_eq!(doc.object_for_name("root"), Some(0));
        assert_eq!(doc.object_for_name("missing"), None);
        assert_eq!(doc.material_for_name("wood"), Some(1));
        assert_eq!(doc.texture_name(0), None);
        assert_eq!(doc.texture_name(1), Some("albedo_map"));
        assert_eq!(doc.texture_for_name("albedo_map"), Some(1));
        assert_eq!(doc.image_for_name("albedo"), Some(0));

        // Two primitives of "body" plus one of "wheel".
        assert_eq!(doc.mesh_count(), 3);
        assert_eq!(doc.mesh_name(1), Some("body"));
        assert_eq!(doc.mesh_name(2), Some("wheel"));
        assert_eq!(doc.mesh_for_name("wheel"), Some(2));
    }

    #[test]
    fn unsupported_required_extension_is_fatal() {
        let json = r#"{"asset":{"version":"2.0"},
            "extensionsRequired":["VENDOR_quantum_compression"]}"#;
        let error = GltfDocument::open(json.as_bytes(), GltfConfig::default()).unwrap_err();
        assert!(
            matches!(error, GltfImportError::RequiredExtension(name) if name == "VENDOR_quantum_compression")
        );

        let config = GltfConfig::default().with_ignore_required_extensions(true);
        assert!(GltfDocument::open(json.as_bytes(), config).is_ok());
    }

    #[test]
    fn cyclic_document_fails_to_open() {
        let json = r#"{"asset":{"version":"2.0"},
            "nodes":[{"children":[1]},{"children":[0]}]}"#;
        assert!(matches!(
            GltfDocument::open(json.as_bytes(), GltfConfig::default()),
            Err(GltfImportError::HierarchyCycle(_))
        ));
    }

    #[test]
    fn perspective_camera_near_plane_size() {
        let mut doc = open(
            r#"{"asset":{"version":"2.0"},
            "cameras":[
                {"type":"perspective","perspective":{"yfov":1.5707963,"znear":1.0,"aspectRatio":2.0}},
                {"type":"orthographic","orthographic":{"xmag":3.0,"ymag":2.0,"znear":0.1,"zfar":100.0}}]}"#,
        );
        let camera = doc.camera(0).unwrap();
        let CameraProjection::Perspective { size, near, far } = camera.projection else {
            panic!("expected a perspective camera");
        };
        // Height = 2 * near * tan(fov / 2) = 2, width doubled by aspect.
        assert!((size[1] - 2.0).abs() < 1.0e-5);
        assert!((size[0] - 4.0).abs() < 1.0e-5);
        assert_eq!(near, 1.0);
        assert_eq!(far, f32::INFINITY);

        let camera = doc.camera(1).unwrap();
        assert_eq!(
            camera.projection,
            CameraProjection::Orthographic {
                size: [6.0, 4.0],
                near: 0.1,
                far: 100.0
            }
        );
    }

    #[test]
    fn lights_are_translated() {
        let mut doc = open(
            r#"{"asset":{"version":"2.0"},
            "extensionsUsed":["KHR_lights_punctual"],
            "extensions":{"KHR_lights_punctual":{"lights":[
                {"type":"point","color":[1.0,0.5,0.25],"intensity":2.0,"range":10.0},
                {"type":"spot","spot":{"innerConeAngle":0.25,"outerConeAngle":0.5}},
                {"type":"directional","range":5.0}]}}}"#,
        );
        assert_eq!(doc.light_count(), 3);
        let light = doc.light(0).unwrap();
        assert_eq!(light.kind, LightKind::Point);
        assert_eq!(light.color, [1.0, 0.5, 0.25]);
        assert_eq!(light.range, 10.0);

        let light = doc.light(1).unwrap();
        assert_eq!(light.kind, LightKind::Spot);
        // Half angles are doubled to full cone angles.
        assert_eq!(light.inner_cone_angle, 0.5);
        assert_eq!(light.outer_cone_angle, 1.0);

        // A directional light with a finite range is invalid.
        assert!(matches!(
            doc.light(2),
            Err(GltfImportError::Light { index: 2, .. })
        ));
    }

    #[test]
    fn zero_light_range_is_unbounded() {
        let mut doc = open(
            r#"{"asset":{"version":"2.0"},
            "extensionsUsed":["KHR_lights_punctual"],
            "extensions":{"KHR_lights_punctual":{"lights":[
                {"type":"point","range":0.0},
                {"type":"directional","range":0.0},
                {"type":"spot","spot":{"innerConeAngle":0.5,"outerConeAngle":1.5707963267948966}}]}}}"#,
        );
        // An explicit zero range reads as the unbounded sentinel, so the
        // directional light stays valid.
        assert_eq!(doc.light(0).unwrap().range, f32::INFINITY);
        assert_eq!(doc.light(1).unwrap().range, f32::INFINITY);

        // An outer half angle of exactly 90 degrees is rejected.
        assert!(matches!(
            doc.light(2),
            Err(GltfImportError::Light { index: 2, .. })
        ));
    }

    #[test]
    fn skin_with_inverse_bind_matrices() {
        let mut doc = open(
            r#"{"asset":{"version":"2.0"},
            "buffers":[{"byteLength":128,"uri":"data:application/octet-stream;base64,AACAPwAAAAAAAAAAAAAAAAAAAAAAAIA/AAAAAAAAAAAAAAAAAAAAAAAAgD8AAAAAAAAAAAAAAAAAAAAAAACAPwAAgD8AAAAAAAAAAAAAAAAAAAAAAACAPwAAAAAAAAAAAAAAAAAAAAAAAIA/AAAAAAAAAAAAAAAAAAAAAAAAgD8="}],
            "bufferViews":[{"buffer":0,"byteOffset":0,"byteLength":128}],
            "accessors":[{"bufferView":0,"componentType":5126,"count":2,"type":"MAT4"}],
            "nodes":[{},{}],
            "skins":[{"name":"rig","joints":[0,1],"inverseBindMatrices":0}]}"#,
        );
        let skin = doc.skin(0).unwrap();
        assert_eq!(skin.name.as_deref(), Some("rig"));
        assert_eq!(skin.joints, vec![0, 1]);
        assert_eq!(skin.inverse_bind_matrices.len(), 2);
        assert_eq!(skin.inverse_bind_matrices[0][0], 1.0);
        assert_eq!(skin.inverse_bind_matrices[1][15], 1.0);
    }

    #[test]
    fn custom_attributes_are_registered_at_open() {
        let doc = open(
            r#"{"asset":{"version":"2.0"},
            "buffers":[{"byteLength":4,"uri":"data:application/octet-stream;base64,AAAAAA=="}],
            "bufferViews":[{"buffer":0,"byteOffset":0,"byteLength":4}],
            "accessors":[{"bufferView":0,"componentType":5126,"count":1,"type":"SCALAR"}],
            "meshes":[{"primitives":[{"attributes":{"_TEMPERATURE":0,"_OBJECT_ID":0}}]}]}"#,
        );
        // The object-id attribute maps to a dedicated semantic, not a
        // custom registration.
        assert_eq!(doc.mesh_attribute_for_name("_TEMPERATURE"), Some(0));
        assert_eq!(doc.mesh_attribute_name(0), Some("_TEMPERATURE"));
        assert_eq!(doc.mesh_attribute_for_name("_OBJECT_ID"), None);
    }
}
