//! Vertex attribute formats and semantics.

/// Scalar component type of a vertex attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentType {
    /// Signed 8-bit integer.
    I8,
    /// Unsigned 8-bit integer.
    U8,
    /// Signed 16-bit integer.
    I16,
    /// Unsigned 16-bit integer.
    U16,
    /// Unsigned 32-bit integer.
    U32,
    /// 32-bit float.
    F32,
}

impl ComponentType {
    /// Size of one component in bytes.
    pub fn size(&self) -> usize {
        match self {
            Self::I8 | Self::U8 => 1,
            Self::I16 | Self::U16 => 2,
            Self::U32 | Self::F32 => 4,
        }
    }

    /// Whether this is an unsigned integer type.
    pub fn is_unsigned(&self) -> bool {
        matches!(self, Self::U8 | Self::U16 | Self::U32)
    }
}

/// Format of one vertex attribute: component type, component count, and
/// whether integer values are normalized to `[0, 1]` / `[-1, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexFormat {
    /// Scalar component type.
    pub component: ComponentType,
    /// Number of components (1 to 4, or 16 for a 4x4 matrix).
    pub count: u8,
    /// Normalized integer flag. Always false for [`ComponentType::F32`].
    pub normalized: bool,
}

impl VertexFormat {
    /// Create a new format.
    pub const fn new(component: ComponentType, count: u8, normalized: bool) -> Self {
        Self {
            component,
            count,
            normalized,
        }
    }

    /// Tightly packed size of one element in bytes.
    pub fn size(&self) -> usize {
        self.component.size() * self.count as usize
    }
}

/// What a vertex attribute means. Numbered variants carry the set index
/// (texcoord 0, texcoord 1, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeSemantic {
    /// Vertex position.
    Position,
    /// Vertex normal.
    Normal,
    /// Tangent set. Format A always uses set 0.
    Tangent(u32),
    /// Bitangent set (format B only).
    Bitangent(u32),
    /// Texture coordinate set.
    TexCoord(u32),
    /// Vertex color set.
    Color(u32),
    /// Skinning joint index set.
    Joints(u32),
    /// Skinning weight set.
    Weights(u32),
    /// Per-vertex object id.
    ObjectId,
    /// Custom attribute; the id indexes the document's custom-attribute
    /// name registry.
    Custom(u32),
}

impl AttributeSemantic {
    /// The set index for numbered semantics, 0 otherwise.
    pub fn set_index(&self) -> u32 {
        match *self {
            Self::Tangent(i)
            | Self::Bitangent(i)
            | Self::TexCoord(i)
            | Self::Color(i)
            | Self::Joints(i)
            | Self::Weights(i) => i,
            _ => 0,
        }
    }

    /// Whether this semantic participates in texture-coordinate V-flipping.
    pub fn is_texcoord(&self) -> bool {
        matches!(self, Self::TexCoord(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn component_sizes() {
        assert_eq!(ComponentType::I8.size(), 1);
        assert_eq!(ComponentType::U16.size(), 2);
        assert_eq!(ComponentType::F32.size(), 4);
        assert!(ComponentType::U32.is_unsigned());
        assert!(!ComponentType::I16.is_unsigned());
    }

    #[test]
    fn format_size() {
        let f = VertexFormat::new(ComponentType::F32, 3, false);
        assert_eq!(f.size(), 12);
        let f = VertexFormat::new(ComponentType::U8, 4, true);
        assert_eq!(f.size(), 4);
    }

    #[test]
    fn semantic_set_index() {
        assert_eq!(AttributeSemantic::TexCoord(2).set_index(), 2);
        assert_eq!(AttributeSemantic::Position.set_index(), 0);
        assert!(AttributeSemantic::TexCoord(0).is_texcoord());
        assert!(!AttributeSemantic::Color(0).is_texcoord());
    }
}
