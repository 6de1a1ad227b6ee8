//! Parsed object graph of the binary DCC interchange format.
//!
//! Parsing the container itself is an external concern; the translator
//! consumes an [`FbxScene`] the parser produced. The shapes here mirror
//! the parser's object model closely: geometry streams stay indexed
//! per corner, material properties stay grouped into the modern PBR map
//! set and the legacy map set, and the implicit root node stays in the
//! node array (always at index 0).
//!
//! All geometry values are `f64`; the translator truncates to `f32` on
//! output.

/// A diagnostic the parser collected while loading, replayed at open.
#[derive(Debug, Clone)]
pub struct FbxWarning {
    /// Human-readable description.
    pub description: String,
    /// How many times the condition occurred.
    pub count: u32,
}

/// A decomposed local transform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FbxTransform {
    /// Translation [x, y, z].
    pub translation: [f64; 3],
    /// Rotation quaternion [x, y, z, w].
    pub rotation: [f64; 4],
    /// Scale [x, y, z].
    pub scale: [f64; 3],
}

impl FbxTransform {
    /// The identity transform.
    pub const IDENTITY: Self = Self {
        translation: [0.0; 3],
        rotation: [0.0, 0.0, 0.0, 1.0],
        scale: [1.0; 3],
    };

    /// Whether this transform is exactly the identity.
    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }
}

impl Default for FbxTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// What a node carries besides its transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FbxAttachment {
    /// Mesh index into [`FbxScene::meshes`].
    Mesh(u32),
    /// Camera index into [`FbxScene::cameras`].
    Camera(u32),
    /// Light index into [`FbxScene::lights`].
    Light(u32),
}

/// One node of the hierarchy. Node 0 is the implicit root; parents
/// always precede their children in [`FbxScene::nodes`].
#[derive(Debug, Clone, Default)]
pub struct FbxNode {
    /// Node name, if any.
    pub name: Option<String>,
    /// Parent node index; `None` only for the root.
    pub parent: Option<u32>,
    /// Local transform relative to the parent.
    pub local_transform: FbxTransform,
    /// Transform applying to the node's own geometry but not to
    /// children.
    pub geometry_transform: FbxTransform,
    /// Whether the node is visible.
    pub visible: bool,
    /// Attached elements, in declaration order.
    pub attachments: Vec<FbxAttachment>,
    /// Per-instance material ids overriding the mesh's own slots, one
    /// per consumed mesh chunk.
    pub materials: Vec<u32>,
}

/// An indexed per-corner attribute stream: `indices` holds one entry
/// per mesh corner, pointing into `values`.
#[derive(Debug, Clone, Default)]
pub struct FbxVertexStream<T> {
    /// Deduplicated attribute values.
    pub values: Vec<T>,
    /// One value index per corner.
    pub indices: Vec<u32>,
}

impl<T: Copy> FbxVertexStream<T> {
    /// Value for one corner, `None` when either index is out of range.
    pub fn get(&self, corner: u32) -> Option<T> {
        let index = *self.indices.get(corner as usize)?;
        self.values.get(index as usize).copied()
    }
}

/// One polygon: a contiguous corner range.
#[derive(Debug, Clone, Copy)]
pub struct FbxFace {
    /// First corner index.
    pub index_begin: u32,
    /// Number of corners (1 = point, 2 = line, >= 3 = polygon).
    pub num_indices: u32,
}

/// One UV set with its optional tangent frame.
#[derive(Debug, Clone, Default)]
pub struct FbxUvSet {
    /// Set name.
    pub name: String,
    /// Texture coordinates.
    pub uvs: FbxVertexStream<[f64; 2]>,
    /// Tangents, if the set carries them.
    pub tangents: Option<FbxVertexStream<[f64; 3]>>,
    /// Bitangents, if the set carries them.
    pub bitangents: Option<FbxVertexStream<[f64; 3]>>,
}

/// One vertex color set.
#[derive(Debug, Clone, Default)]
pub struct FbxColorSet {
    /// Set name.
    pub name: String,
    /// RGBA colors.
    pub colors: FbxVertexStream<[f64; 4]>,
}

/// One material slot of a mesh: the faces assigned to one material.
/// Every mesh has at least one slot; faces with no material land in a
/// slot whose `material` is `None`.
#[derive(Debug, Clone, Default)]
pub struct FbxMeshSlot {
    /// Material index into [`FbxScene::materials`], if assigned.
    pub material: Option<u32>,
    /// Indices into [`FbxMesh::faces`] belonging to this slot.
    pub face_indices: Vec<u32>,
}

/// One mesh: polygon soup with per-corner attribute streams.
#[derive(Debug, Clone, Default)]
pub struct FbxMesh {
    /// Mesh name, if any.
    pub name: Option<String>,
    /// Polygons.
    pub faces: Vec<FbxFace>,
    /// Positions; always present.
    pub positions: FbxVertexStream<[f64; 3]>,
    /// Normals, if present.
    pub normals: Option<FbxVertexStream<[f64; 3]>>,
    /// UV sets in declaration order.
    pub uv_sets: Vec<FbxUvSet>,
    /// Color sets in declaration order.
    pub color_sets: Vec<FbxColorSet>,
    /// Material slots; never empty.
    pub materials: Vec<FbxMeshSlot>,
    /// Node indices instancing this mesh.
    pub instances: Vec<u32>,
}

// -- Materials --

/// Modern PBR material map identifiers, indexing
/// [`FbxMaterial::pbr`]. The set follows the Autodesk Standard
/// Surface parameterization the parser normalizes vendor models into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(usize)]
pub enum FbxPbrMap {
    BaseColor,
    BaseFactor,
    Roughness,
    Glossiness,
    Metalness,
    DiffuseRoughness,
    SpecularColor,
    SpecularFactor,
    SpecularIor,
    SpecularAnisotropy,
    SpecularRotation,
    TransmissionFactor,
    TransmissionColor,
    TransmissionDepth,
    TransmissionScatter,
    TransmissionScatterAnisotropy,
    TransmissionDispersion,
    TransmissionRoughness,
    TransmissionGlossiness,
    TransmissionExtraRoughness,
    TransmissionPriority,
    TransmissionEnableInAov,
    SubsurfaceFactor,
    SubsurfaceColor,
    SubsurfaceRadius,
    SubsurfaceScale,
    SubsurfaceAnisotropy,
    SubsurfaceTintColor,
    SubsurfaceType,
    SheenFactor,
    SheenColor,
    SheenRoughness,
    CoatFactor,
    CoatColor,
    CoatRoughness,
    CoatGlossiness,
    CoatIor,
    CoatAnisotropy,
    CoatRotation,
    CoatNormal,
    CoatAffectBaseColor,
    CoatAffectBaseRoughness,
    ThinFilmThickness,
    ThinFilmIor,
    EmissionColor,
    EmissionFactor,
    Opacity,
    IndirectDiffuse,
    IndirectSpecular,
    NormalMap,
    TangentMap,
    Displacement,
    MatteFactor,
    MatteColor,
    AmbientOcclusion,
}

impl FbxPbrMap {
    /// Number of PBR map slots.
    pub const COUNT: usize = Self::AmbientOcclusion as usize + 1;
}

/// Legacy diffuse/specular material map identifiers, indexing
/// [`FbxMaterial::legacy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(usize)]
pub enum FbxLegacyMap {
    DiffuseColor,
    DiffuseFactor,
    SpecularColor,
    SpecularFactor,
    SpecularExponent,
    ReflectionColor,
    ReflectionFactor,
    TransparencyColor,
    TransparencyFactor,
    EmissionColor,
    EmissionFactor,
    AmbientColor,
    AmbientFactor,
    NormalMap,
    Bump,
    BumpFactor,
    Displacement,
    DisplacementFactor,
    VectorDisplacement,
    VectorDisplacementFactor,
}

impl FbxLegacyMap {
    /// Number of legacy map slots.
    pub const COUNT: usize = Self::VectorDisplacementFactor as usize + 1;
}

/// A material map's value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FbxMapValue {
    /// Scalar.
    Real(f64),
    /// 3-vector.
    Vec3([f64; 3]),
    /// 4-vector.
    Vec4([f64; 4]),
    /// Integer.
    Int(i64),
    /// Boolean.
    Bool(bool),
}

/// One material property map: an optional value and an optional
/// texture connection.
#[derive(Debug, Clone, Copy, Default)]
pub struct FbxMaterialMap {
    /// Declared value, if any.
    pub value: Option<FbxMapValue>,
    /// Connected texture index into [`FbxScene::textures`], if any.
    pub texture: Option<u32>,
}

impl FbxMaterialMap {
    /// A map holding a scalar value.
    pub fn real(value: f64) -> Self {
        Self {
            value: Some(FbxMapValue::Real(value)),
            texture: None,
        }
    }

    /// A map holding a 3-vector value.
    pub fn vec3(value: [f64; 3]) -> Self {
        Self {
            value: Some(FbxMapValue::Vec3(value)),
            texture: None,
        }
    }

    /// A map holding a texture connection only.
    pub fn textured(texture: u32) -> Self {
        Self {
            value: None,
            texture: Some(texture),
        }
    }

    /// Whether the map contributes anything.
    pub fn used(&self) -> bool {
        self.value.is_some() || self.texture.is_some()
    }

    /// The value coerced to a scalar.
    pub fn value_real(&self) -> f64 {
        match self.value {
            Some(FbxMapValue::Real(v)) => v,
            Some(FbxMapValue::Vec3(v)) => v[0],
            Some(FbxMapValue::Vec4(v)) => v[0],
            Some(FbxMapValue::Int(v)) => v as f64,
            Some(FbxMapValue::Bool(v)) => f64::from(u8::from(v)),
            None => 0.0,
        }
    }

    /// The value coerced to a 3-vector; scalars splat.
    pub fn value_vec3(&self) -> [f64; 3] {
        match self.value {
            Some(FbxMapValue::Vec3(v)) => v,
            Some(FbxMapValue::Vec4(v)) => [v[0], v[1], v[2]],
            Some(FbxMapValue::Real(v)) => [v; 3],
            _ => [self.value_real(); 3],
        }
    }

    /// The value coerced to a 4-vector; a missing fourth component
    /// defaults to one.
    pub fn value_vec4(&self) -> [f64; 4] {
        match self.value {
            Some(FbxMapValue::Vec4(v)) => v,
            _ => {
                let v = self.value_vec3();
                [v[0], v[1], v[2], 1.0]
            }
        }
    }

    /// The value coerced to an integer.
    pub fn value_int(&self) -> i64 {
        match self.value {
            Some(FbxMapValue::Int(v)) => v,
            Some(FbxMapValue::Bool(v)) => i64::from(v),
            _ => self.value_real() as i64,
        }
    }

    /// Whether the declared value is a plain scalar.
    pub fn is_scalar(&self) -> bool {
        matches!(
            self.value,
            Some(FbxMapValue::Real(_) | FbxMapValue::Int(_) | FbxMapValue::Bool(_))
        )
    }
}

/// A fixed-size table of material maps indexed by [`FbxPbrMap`] or
/// [`FbxLegacyMap`].
#[derive(Debug, Clone)]
pub struct FbxMaterialMaps {
    maps: Vec<FbxMaterialMap>,
}

impl FbxMaterialMaps {
    /// An all-empty map table of the given slot count.
    pub fn empty(count: usize) -> Self {
        Self {
            maps: vec![FbxMaterialMap::default(); count],
        }
    }

    /// Map at one slot.
    pub fn map(&self, slot: usize) -> &FbxMaterialMap {
        &self.maps[slot]
    }

    /// Set the map at one slot.
    pub fn set(&mut self, slot: usize, map: FbxMaterialMap) {
        self.maps[slot] = map;
    }
}

/// One material: the parser-normalized PBR map set plus the legacy
/// diffuse/specular set filled as a fallback by most DCC exports.
#[derive(Debug, Clone)]
pub struct FbxMaterial {
    /// Material name, if any.
    pub name: Option<String>,
    /// Whether the material declares a PBR shading model; the PBR map
    /// set holds implicitly derived values otherwise and is ignored.
    pub pbr_enabled: bool,
    /// PBR maps indexed by [`FbxPbrMap`].
    pub pbr: FbxMaterialMaps,
    /// Legacy maps indexed by [`FbxLegacyMap`].
    pub legacy: FbxMaterialMaps,
}

impl Default for FbxMaterial {
    fn default() -> Self {
        Self {
            name: None,
            pbr_enabled: false,
            pbr: FbxMaterialMaps::empty(FbxPbrMap::COUNT),
            legacy: FbxMaterialMaps::empty(FbxLegacyMap::COUNT),
        }
    }
}

impl FbxMaterial {
    /// Map accessor for the PBR set.
    pub fn pbr_map(&self, slot: FbxPbrMap) -> &FbxMaterialMap {
        self.pbr.map(slot as usize)
    }

    /// Map accessor for the legacy set.
    pub fn legacy_map(&self, slot: FbxLegacyMap) -> &FbxMaterialMap {
        self.legacy.map(slot as usize)
    }
}

// -- Textures and images --

/// Texture wrapping mode; the format knows only these two.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FbxWrapMode {
    /// Repeat.
    #[default]
    Repeat,
    /// Clamp to edge.
    Clamp,
}

/// Blend mode of one layered-texture layer, carried through as a
/// string attribute on the material.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FbxBlendMode {
    Translucent,
    Additive,
    Multiply,
    Multiply2x,
    Over,
    Replace,
    Dissolve,
    Darken,
    ColorBurn,
    LinearBurn,
    DarkerColor,
    Lighten,
    Screen,
    ColorDodge,
    LinearDodge,
    LighterColor,
    SoftLight,
    HardLight,
    VividLight,
    LinearLight,
    PinLight,
    HardMix,
    Difference,
    Exclusion,
    Subtract,
    Divide,
    Hue,
    Saturation,
    Color,
    Luminosity,
    Overlay,
}

impl FbxBlendMode {
    /// Stable lowercase name used for the material attribute value.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Translucent => "translucent",
            Self::Additive => "additive",
            Self::Multiply => "multiply",
            Self::Multiply2x => "multiply2x",
            Self::Over => "over",
            Self::Replace => "replace",
            Self::Dissolve => "dissolve",
            Self::Darken => "darken",
            Self::ColorBurn => "colorBurn",
            Self::LinearBurn => "linearBurn",
            Self::DarkerColor => "darkerColor",
            Self::Lighten => "lighten",
            Self::Screen => "screen",
            Self::ColorDodge => "colorDodge",
            Self::LinearDodge => "linearDodge",
            Self::LighterColor => "lighterColor",
            Self::SoftLight => "softLight",
            Self::HardLight => "hardLight",
            Self::VividLight => "vividLight",
            Self::LinearLight => "linearLight",
            Self::PinLight => "pinLight",
            Self::HardMix => "hardMix",
            Self::Difference => "difference",
            Self::Exclusion => "exclusion",
            Self::Subtract => "subtract",
            Self::Divide => "divide",
            Self::Hue => "hue",
            Self::Saturation => "saturation",
            Self::Color => "color",
            Self::Luminosity => "luminosity",
            Self::Overlay => "overlay",
        }
    }
}

/// One layer of a layered texture.
#[derive(Debug, Clone, Copy)]
pub struct FbxTextureLayer {
    /// Texture index into [`FbxScene::textures`].
    pub texture: u32,
    /// Blend mode of this layer over the previous ones.
    pub blend_mode: FbxBlendMode,
    /// Blend opacity.
    pub alpha: f32,
}

/// One texture. Plain file textures list themselves as their only file
/// texture; layered and shader-graph textures list every file texture
/// they reference.
#[derive(Debug, Clone, Default)]
pub struct FbxTexture {
    /// Texture name, if any.
    pub name: Option<String>,
    /// Backing file index into [`FbxScene::texture_files`]; `None` for
    /// procedural textures.
    pub file: Option<u32>,
    /// U wrapping mode.
    pub wrap_u: FbxWrapMode,
    /// V wrapping mode.
    pub wrap_v: FbxWrapMode,
    /// UV-to-texture transform, column-major, when not identity.
    pub uv_transform: Option<[[f32; 3]; 3]>,
    /// Flattened file-texture chain.
    pub file_textures: Vec<u32>,
    /// Layer list when this is a layered texture.
    pub layers: Vec<FbxTextureLayer>,
}

/// One image file referenced by textures.
#[derive(Debug, Clone, Default)]
pub struct FbxTextureFile {
    /// Path relative to the document, empty when unknown.
    pub relative_path: String,
    /// Absolute path, empty when unknown.
    pub absolute_path: String,
    /// Embedded content, if the document carries the file inline.
    pub content: Option<Vec<u8>>,
}

// -- Cameras and lights --

/// Camera projection kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FbxProjection {
    /// Perspective projection.
    Perspective,
    /// Orthographic projection.
    Orthographic,
}

/// One camera.
#[derive(Debug, Clone)]
pub struct FbxCamera {
    /// Camera name, if any.
    pub name: Option<String>,
    /// Projection kind.
    pub projection: FbxProjection,
    /// Vertical field of view in degrees (perspective).
    pub field_of_view_deg: f64,
    /// Aspect ratio (width / height).
    pub aspect_ratio: f64,
    /// Near plane distance.
    pub near_plane: f64,
    /// Far plane distance.
    pub far_plane: f64,
    /// Full orthographic extent [width, height] (orthographic).
    pub orthographic_size: [f64; 2],
}

/// Light kind; area and volume lights are not supported by the
/// translator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FbxLightKind {
    Point,
    Directional,
    Spot,
    Area,
    Volume,
}

/// Intensity falloff declared on a light.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FbxLightDecay {
    /// No falloff.
    None,
    /// Linear falloff.
    Linear,
    /// Quadratic falloff.
    Quadratic,
    /// Cubic falloff; patched to quadratic on output.
    Cubic,
}

/// One light.
#[derive(Debug, Clone)]
pub struct FbxLight {
    /// Light name, if any.
    pub name: Option<String>,
    /// Light kind.
    pub kind: FbxLightKind,
    /// Linear RGB color.
    pub color: [f32; 3],
    /// Intensity.
    pub intensity: f32,
    /// Falloff mode.
    pub decay: FbxLightDecay,
    /// Full inner cone angle in degrees (spot).
    pub inner_angle_deg: f32,
    /// Full outer cone angle in degrees (spot).
    pub outer_angle_deg: f32,
}

/// The parsed document the external parser hands over.
#[derive(Debug, Clone, Default)]
pub struct FbxScene {
    /// Parser diagnostics, replayed as warnings at open.
    pub warnings: Vec<FbxWarning>,
    /// Node hierarchy; node 0 is the implicit root.
    pub nodes: Vec<FbxNode>,
    /// Meshes.
    pub meshes: Vec<FbxMesh>,
    /// Materials.
    pub materials: Vec<FbxMaterial>,
    /// Textures.
    pub textures: Vec<FbxTexture>,
    /// Image files textures point at.
    pub texture_files: Vec<FbxTextureFile>,
    /// Cameras.
    pub cameras: Vec<FbxCamera>,
    /// Lights.
    pub lights: Vec<FbxLight>,
}
