//! Translation options for the binary interchange format.

/// How a node's geometry transform (a transform affecting only the
/// node's own attached geometry, not its children) is represented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GeometryTransformHandling {
    /// Keep geometry transforms as dedicated scene columns; consumers
    /// must apply them themselves.
    Preserve,
    /// Synthesize a helper child node carrying the transform and the
    /// node's attachments.
    #[default]
    HelperNodes,
    /// Bake the transform into vertex data where possible (the mesh
    /// has a single instance and the node carries nothing but meshes),
    /// falling back to a helper node otherwise.
    ModifyGeometry,
}

/// How unit and axis normalization performed by the parser is
/// reflected in the node hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnitNormalizationHandling {
    /// The conversion is applied to the root node's transform; the
    /// root is then meaningful and preserved in the output.
    TransformRoot,
    /// The conversion is folded into root-level node transforms; the
    /// implicit root stays elided.
    #[default]
    AdjustTransforms,
}

/// Options for [`FbxDocument`](super::FbxDocument).
///
/// The parser passthrough flags (`normalize_units`,
/// `generate_missing_normals`, `strict`) do not change translation;
/// they are forwarded to the external parser by the host and carried
/// here so one struct describes the whole import.
#[derive(Debug, Clone)]
pub struct FbxConfig {
    /// Geometry transform representation. Default
    /// [`GeometryTransformHandling::HelperNodes`].
    pub geometry_transform_handling: GeometryTransformHandling,
    /// Unit normalization representation; also decides whether the
    /// implicit root node is preserved. Default
    /// [`UnitNormalizationHandling::AdjustTransforms`].
    pub unit_normalization_handling: UnitNormalizationHandling,
    /// Normalize units and axes to meters / right-handed Y-up
    /// (parser passthrough). Default `false`.
    pub normalize_units: bool,
    /// Generate normals for meshes lacking them (parser passthrough).
    /// Default `true`.
    pub generate_missing_normals: bool,
    /// Fail on any recoverable parse irregularity (parser
    /// passthrough). Default `false`.
    pub strict: bool,
    /// Keep material factor properties as separate attributes instead
    /// of premultiplying them into values. Default `false`.
    pub preserve_material_factors: bool,
    /// Maximum UV sets per mesh; negative means unbounded. Default -1.
    pub max_uv_sets: i32,
    /// Maximum tangent/bitangent sets per mesh; negative means
    /// unbounded. Default -1.
    pub max_tangent_sets: i32,
    /// Maximum color sets per mesh; negative means unbounded.
    /// Default -1.
    pub max_color_sets: i32,
}

impl Default for FbxConfig {
    fn default() -> Self {
        Self {
            geometry_transform_handling: GeometryTransformHandling::HelperNodes,
            unit_normalization_handling: UnitNormalizationHandling::AdjustTransforms,
            normalize_units: false,
            generate_missing_normals: true,
            strict: false,
            preserve_material_factors: false,
            max_uv_sets: -1,
            max_tangent_sets: -1,
            max_color_sets: -1,
        }
    }
}

impl FbxConfig {
    /// Create a config with the default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the geometry transform handling mode.
    #[must_use]
    pub fn with_geometry_transform_handling(mut self, mode: GeometryTransformHandling) -> Self {
        self.geometry_transform_handling = mode;
        self
    }

    /// Set the unit normalization handling mode.
    #[must_use]
    pub fn with_unit_normalization_handling(mut self, mode: UnitNormalizationHandling) -> Self {
        self.unit_normalization_handling = mode;
        self
    }

    /// Set unit normalization.
    #[must_use]
    pub fn with_normalize_units(mut self, enabled: bool) -> Self {
        self.normalize_units = enabled;
        self
    }

    /// Set missing-normal generation.
    #[must_use]
    pub fn with_generate_missing_normals(mut self, enabled: bool) -> Self {
        self.generate_missing_normals = enabled;
        self
    }

    /// Set strict parsing.
    #[must_use]
    pub fn with_strict(mut self, enabled: bool) -> Self {
        self.strict = enabled;
        self
    }

    /// Set material factor preservation.
    #[must_use]
    pub fn with_preserve_material_factors(mut self, enabled: bool) -> Self {
        self.preserve_material_factors = enabled;
        self
    }

    /// Set the UV set limit.
    #[must_use]
    pub fn with_max_uv_sets(mut self, max: i32) -> Self {
        self.max_uv_sets = max;
        self
    }

    /// Set the tangent set limit.
    #[must_use]
    pub fn with_max_tangent_sets(mut self, max: i32) -> Self {
        self.max_tangent_sets = max;
        self
    }

    /// Set the color set limit.
    #[must_use]
    pub fn with_max_color_sets(mut self, max: i32) -> Self {
        self.max_color_sets = max;
        self
    }

    /// Whether the implicit root node is preserved in the output.
    pub(crate) fn preserve_root(&self) -> bool {
        self.unit_normalization_handling == UnitNormalizationHandling::TransformRoot
    }
}

/// A negative set limit means unbounded.
pub(crate) fn set_limit(value: i32) -> usize {
    if value < 0 {
        usize::MAX
    } else {
        value as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = FbxConfig::default();
        assert_eq!(
            config.geometry_transform_handling,
            GeometryTransformHandling::HelperNodes
        );
        assert_eq!(
            config.unit_normalization_handling,
            UnitNormalizationHandling::AdjustTransforms
        );
        assert!(!config.preserve_root());
        assert!(!config.preserve_material_factors);
        assert_eq!(config.max_uv_sets, -1);
    }

    #[test]
    fn builders() {
        let config = FbxConfig::new()
            .with_geometry_transform_handling(GeometryTransformHandling::ModifyGeometry)
            .with_unit_normalization_handling(UnitNormalizationHandling::TransformRoot)
            .with_preserve_material_factors(true)
            .with_max_uv_sets(2);
        assert_eq!(
            config.geometry_transform_handling,
            GeometryTransformHandling::ModifyGeometry
        );
        assert!(config.preserve_root());
        assert!(config.preserve_material_factors);
        assert_eq!(config.max_uv_sets, 2);
    }

    #[test]
    fn set_limits() {
        assert_eq!(set_limit(-1), usize::MAX);
        assert_eq!(set_limit(0), 0);
        assert_eq!(set_limit(3), 3);
    }
}
