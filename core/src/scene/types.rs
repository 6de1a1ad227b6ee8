//! Flattened scene record and per-entity data types.
//!
//! All types use plain arrays (`[f32; 3]`, `[f32; 4]`, etc.) instead of
//! math library types so consumers can convert to whatever math crate
//! they use.

/// One sparse scene field: an object-id mapping array and a value array
/// of the same length. The mapping is ordered (monotonic in traversal
/// order) unless documented otherwise.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Field<T> {
    /// Object ids the values belong to.
    pub objects: Vec<u32>,
    /// One value per mapped object.
    pub values: Vec<T>,
}

impl<T> Field<T> {
    /// Number of (object, value) pairs.
    pub fn len(&self) -> usize {
        debug_assert_eq!(self.objects.len(), self.values.len());
        self.values.len()
    }

    /// Whether the field holds no pairs.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// First value mapped to `object`, if any.
    pub fn get(&self, object: u32) -> Option<&T> {
        let index = self.objects.iter().position(|&o| o == object)?;
        Some(&self.values[index])
    }
}

/// Translation/rotation/scale columns sharing one mapping array.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TrsColumns {
    /// Object ids the transforms belong to.
    pub objects: Vec<u32>,
    /// Translation [x, y, z] per object.
    pub translations: Vec<[f32; 3]>,
    /// Rotation quaternion [x, y, z, w] per object.
    pub rotations: Vec<[f32; 4]>,
    /// Scale [x, y, z] per object.
    pub scalings: Vec<[f32; 3]>,
}

impl TrsColumns {
    /// Number of transformed objects.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Whether no object carries a transform.
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

/// Mesh references fanned out per (node, chunk) pair, with the per-instance
/// material id (or -1 for none) alongside.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MeshReferences {
    /// Object ids the references belong to (ordered mapping).
    pub objects: Vec<u32>,
    /// Output mesh id (flattened chunk index) per reference.
    pub meshes: Vec<u32>,
    /// Material id per reference, -1 when the chunk has no material.
    pub materials: Vec<i32>,
}

impl MeshReferences {
    /// Number of mesh references.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Whether no node references a mesh.
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

/// One flattened scene.
///
/// `objects` and `parents` form the implicit mapping shared by every
/// universally-present column (`visibilities`, `geometry_helpers`, and
/// the geometry TRS columns when present). Every object id stored in any
/// field is strictly less than [`SceneRecord::mapping_bound`].
#[derive(Debug, Clone, Default)]
pub struct SceneRecord {
    /// Scene name, if any.
    pub name: Option<String>,
    /// Exclusive upper bound on object ids referenced by this scene.
    pub mapping_bound: u32,
    /// Object ids in emission (breadth-first) order.
    pub objects: Vec<u32>,
    /// Parent object id per object, -1 for roots. A parent always precedes
    /// its children in `objects`.
    pub parents: Vec<i32>,
    /// TRS columns for objects that decompose, if any do.
    pub trs: Option<TrsColumns>,
    /// Combined column-major 4x4 matrices for objects carrying a raw
    /// transform. Omitted entirely when every transformable object has TRS.
    pub transformations: Option<Field<[f32; 16]>>,
    /// Mesh references with per-instance materials.
    pub meshes: Option<MeshReferences>,
    /// Camera references.
    pub cameras: Option<Field<u32>>,
    /// Light references.
    pub lights: Option<Field<u32>>,
    /// Skin references.
    pub skins: Option<Field<u32>>,
    /// Per-object visibility, sharing the implicit mapping (format B).
    pub visibilities: Option<Vec<bool>>,
    /// Marks synthesized geometry-transform helper nodes, sharing the
    /// implicit mapping (format B).
    pub geometry_helpers: Option<Vec<bool>>,
    /// Geometry transforms retained per object, sharing the implicit
    /// mapping (format B, `preserve` handling only).
    pub geometry_transforms: Option<TrsColumns>,
}

impl SceneRecord {
    /// Number of objects in the scene.
    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    /// All (object, mesh, material) references for one object id.
    pub fn meshes_for_object(&self, object: u32) -> Vec<(u32, i32)> {
        let Some(refs) = &self.meshes else {
            return Vec::new();
        };
        refs.objects
            .iter()
            .zip(refs.meshes.iter().zip(refs.materials.iter()))
            .filter(|(&o, _)| o == object)
            .map(|(_, (&m, &mat))| (m, mat))
            .collect()
    }
}

// -- Cameras --

/// A translated camera.
#[derive(Debug, Clone, PartialEq)]
pub struct CameraData {
    /// Projection type and parameters.
    pub projection: CameraProjection,
}

/// Camera projection parameters.
///
/// Perspective cameras store the near-plane rectangle size rather than a
/// field-of-view angle; the size is derived as
/// `2 * near * tan(yfov / 2) * (aspect, 1)` so the representation is
/// unambiguous across source conventions.
#[derive(Debug, Clone, PartialEq)]
pub enum CameraProjection {
    /// Perspective projection.
    Perspective {
        /// Size of the near clipping plane rectangle [width, height].
        size: [f32; 2],
        /// Near clipping plane distance.
        near: f32,
        /// Far clipping plane distance; `f32::INFINITY` when unbounded.
        far: f32,
    },
    /// Orthographic projection.
    Orthographic {
        /// Full extent of the view volume [width, height].
        size: [f32; 2],
        /// Near clipping plane distance.
        near: f32,
        /// Far clipping plane distance.
        far: f32,
    },
}

// -- Lights --

/// Light source kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightKind {
    /// Light radiating in all directions from a point.
    Point,
    /// Light arriving from one direction at infinity.
    Directional,
    /// Cone-shaped light.
    Spot,
}

/// A translated light.
#[derive(Debug, Clone, PartialEq)]
pub struct LightData {
    /// Light kind.
    pub kind: LightKind,
    /// Linear RGB color.
    pub color: [f32; 3],
    /// Intensity in the source document's units.
    pub intensity: f32,
    /// Attenuation polynomial [constant, linear, quadratic].
    pub attenuation: [f32; 3],
    /// Cutoff distance; `f32::INFINITY` when unbounded.
    pub range: f32,
    /// Full inner cone angle in radians; 2π for non-spot lights.
    pub inner_cone_angle: f32,
    /// Full outer cone angle in radians; 2π for non-spot lights.
    pub outer_cone_angle: f32,
}

// -- Skins --

/// A translated skin for skeletal animation.
#[derive(Debug, Clone, PartialEq)]
pub struct SkinData {
    /// Skin name, if any.
    pub name: Option<String>,
    /// Joint object ids.
    pub joints: Vec<u32>,
    /// Inverse bind matrices (column-major 4x4, one per joint). Empty when
    /// the source omits them (identity is implied).
    pub inverse_bind_matrices: Vec<[f32; 16]>,
}
