//! Open-time configuration for the JSON scene-format translator.

/// Options controlling how a document is translated. All options are
/// fixed at open time.
#[derive(Debug, Clone, PartialEq)]
pub struct GltfConfig {
    /// Open documents even when they require an extension this translator
    /// does not implement. A warning is logged per ignored extension.
    pub ignore_required_extensions: bool,
    /// Flip neighboring animation rotation keys so interpolation takes
    /// the shortest path.
    pub optimize_quaternion_shortest_path: bool,
    /// Renormalize rotation quaternions in node transforms and animation
    /// keys, with an aggregated warning when any needed it.
    pub normalize_quaternions: bool,
    /// Expose all animations of the document as one unnamed clip.
    pub merge_animation_clips: bool,
    /// Mirror base-color attributes into Phong diffuse equivalents so
    /// consumers written against classic lighting models keep working.
    pub phong_material_fallback: bool,
    /// Source attribute name translated to the per-vertex object id
    /// semantic.
    pub object_id_attribute: String,
    /// Leave texture coordinates untouched and express the V flip as a
    /// texture transformation matrix in materials instead. Enabled
    /// implicitly when coordinates use types the in-buffer flip cannot
    /// represent.
    pub texture_coordinate_y_flip_in_material: bool,
}

impl Default for GltfConfig {
    fn default() -> Self {
        Self {
            ignore_required_extensions: false,
            optimize_quaternion_shortest_path: true,
            normalize_quaternions: true,
            merge_animation_clips: false,
            phong_material_fallback: true,
            object_id_attribute: "_OBJECT_ID".to_string(),
            texture_coordinate_y_flip_in_material: false,
        }
    }
}

impl GltfConfig {
    /// Create the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set [`ignore_required_extensions`](Self::ignore_required_extensions).
    #[must_use]
    pub fn with_ignore_required_extensions(mut self, value: bool) -> Self {
        self.ignore_required_extensions = value;
        self
    }

    /// Set [`optimize_quaternion_shortest_path`](Self::optimize_quaternion_shortest_path).
    #[must_use]
    pub fn with_optimize_quaternion_shortest_path(mut self, value: bool) -> Self {
        self.optimize_quaternion_shortest_path = value;
        self
    }

    /// Set [`normalize_quaternions`](Self::normalize_quaternions).
    #[must_use]
    pub fn with_normalize_quaternions(mut self, value: bool) -> Self {
        self.normalize_quaternions = value;
        self
    }

    /// Set [`merge_animation_clips`](Self::merge_animation_clips).
    #[must_use]
    pub fn with_merge_animation_clips(mut self, value: bool) -> Self {
        self.merge_animation_clips = value;
        self
    }

    /// Set [`phong_material_fallback`](Self::phong_material_fallback).
    #[must_use]
    pub fn with_phong_material_fallback(mut self, value: bool) -> Self {
        self.phong_material_fallback = value;
        self
    }

    /// Set [`object_id_attribute`](Self::object_id_attribute).
    #[must_use]
    pub fn with_object_id_attribute(mut self, name: impl Into<String>) -> Self {
        self.object_id_attribute = name.into();
        self
    }

    /// Set [`texture_coordinate_y_flip_in_material`](Self::texture_coordinate_y_flip_in_material).
    #[must_use]
    pub fn with_texture_coordinate_y_flip_in_material(mut self, value: bool) -> Self {
        self.texture_coordinate_y_flip_in_material = value;
        self
    }
}
