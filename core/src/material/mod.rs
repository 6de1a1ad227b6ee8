//! Layered material attribute bags.
//!
//! A translated material is a flat list of named, typed attributes split
//! into ordered layers. Layer 0 is the unnamed base layer; every later
//! layer starts with a [`LAYER_NAME`] string attribute. Attribute names
//! starting with an uppercase letter are reserved for the built-in
//! catalog (`BaseColor`, `Roughness`, ...); custom names are lowercased
//! on import. Layer names starting with `#` identify vendor extension
//! blocks carried over verbatim.
//!
//! Every attribute must fit a fixed encoded size so downstream consumers
//! can store attributes in fixed-size slots; see
//! [`MaterialAttribute::encoded_size`].

use std::ops::Range;

/// Name of the string attribute that opens every layer after the base one.
pub const LAYER_NAME: &str = "LayerName";

/// Maximum encoded size of one attribute (name, type tag, and value).
pub const MAX_ATTRIBUTE_SIZE: usize = 64;

/// A typed material attribute value.
#[derive(Debug, Clone, PartialEq)]
pub enum MaterialValue {
    /// Boolean flag.
    Bool(bool),
    /// Signed integer.
    Long(i64),
    /// Unsigned integer; also used for texture and UV-set references.
    UnsignedInt(u32),
    /// Scalar float.
    Float(f32),
    /// 2-component float vector.
    Vector2([f32; 2]),
    /// 3-component float vector.
    Vector3([f32; 3]),
    /// 4-component float vector.
    Vector4([f32; 4]),
    /// Column-major 3x3 matrix, used for UV transforms.
    Matrix3([[f32; 3]; 3]),
    /// UTF-8 string.
    String(String),
}

impl MaterialValue {
    /// Size of the encoded value payload in bytes. Strings count their
    /// bytes plus a terminating NUL and a length byte.
    pub fn payload_size(&self) -> usize {
        match self {
            Self::Bool(_) => 1,
            Self::Long(_) => 8,
            Self::UnsignedInt(_) | Self::Float(_) => 4,
            Self::Vector2(_) => 8,
            Self::Vector3(_) => 12,
            Self::Vector4(_) => 16,
            Self::Matrix3(_) => 36,
            Self::String(s) => s.len() + 2,
        }
    }

    /// Convenience accessor for float values.
    pub fn as_float(&self) -> Option<f32> {
        match self {
            Self::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// Convenience accessor for unsigned integer values.
    pub fn as_uint(&self) -> Option<u32> {
        match self {
            Self::UnsignedInt(v) => Some(*v),
            _ => None,
        }
    }

    /// Convenience accessor for string values.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }
}

/// One named, typed material attribute.
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialAttribute {
    /// Attribute name.
    pub name: String,
    /// Attribute value.
    pub value: MaterialValue,
}

impl MaterialAttribute {
    /// Create a new attribute.
    pub fn new(name: impl Into<String>, value: MaterialValue) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }

    /// Encoded size: name bytes, name NUL, one type tag byte, and the
    /// value payload.
    pub fn encoded_size(&self) -> usize {
        self.name.len() + 1 + 1 + self.value.payload_size()
    }

    /// Whether the attribute fits the fixed encoded bound.
    pub fn fits(&self) -> bool {
        self.encoded_size() <= MAX_ATTRIBUTE_SIZE
    }
}

/// Bit set of broad material classifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MaterialTypes(u8);

impl MaterialTypes {
    /// Unshaded flat color.
    pub const FLAT: Self = Self(1 << 0);
    /// Legacy diffuse/specular model.
    pub const PHONG: Self = Self(1 << 1);
    /// Metallic/roughness PBR model.
    pub const PBR_METALLIC_ROUGHNESS: Self = Self(1 << 2);
    /// Specular/glossiness PBR model.
    pub const PBR_SPECULAR_GLOSSINESS: Self = Self(1 << 3);
    /// Clear-coat layer present.
    pub const PBR_CLEAR_COAT: Self = Self(1 << 4);

    /// Empty set.
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Whether all bits of `other` are set.
    pub fn contains(&self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Whether no bit is set.
    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }
}

impl std::ops::BitOr for MaterialTypes {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl std::ops::BitOrAssign for MaterialTypes {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// A translated material: type flags, a flat attribute list, and layer
/// boundaries.
///
/// `layer_offsets` stores the exclusive end offset of each layer into
/// `attributes`; the final element always equals the attribute count, so
/// a material has at least one (possibly empty) base layer.
#[derive(Debug, Clone, Default)]
pub struct MaterialData {
    types: MaterialTypes,
    attributes: Vec<MaterialAttribute>,
    layer_offsets: Vec<u32>,
}

impl MaterialData {
    /// Create a material from its flat attribute list and layer end
    /// offsets. An empty `layer_offsets` gets the implicit single base
    /// layer appended.
    pub fn new(
        types: MaterialTypes,
        attributes: Vec<MaterialAttribute>,
        mut layer_offsets: Vec<u32>,
    ) -> Self {
        if layer_offsets.is_empty() {
            layer_offsets.push(attributes.len() as u32);
        }
        debug_assert_eq!(*layer_offsets.last().unwrap() as usize, attributes.len());
        Self {
            types,
            attributes,
            layer_offsets,
        }
    }

    /// Broad material classification flags.
    pub fn types(&self) -> MaterialTypes {
        self.types
    }

    /// Number of layers, including the base layer.
    pub fn layer_count(&self) -> usize {
        self.layer_offsets.len()
    }

    /// All attributes across all layers, in layer order.
    pub fn attributes(&self) -> &[MaterialAttribute] {
        &self.attributes
    }

    /// Index range of one layer's attributes.
    pub fn layer_range(&self, layer: usize) -> Range<usize> {
        let begin = if layer == 0 {
            0
        } else {
            self.layer_offsets[layer - 1] as usize
        };
        begin..self.layer_offsets[layer] as usize
    }

    /// Attributes of one layer.
    pub fn layer_attributes(&self, layer: usize) -> &[MaterialAttribute] {
        &self.attributes[self.layer_range(layer)]
    }

    /// Name of a layer: the base layer is unnamed, later layers take their
    /// leading [`LAYER_NAME`] attribute if present.
    pub fn layer_name(&self, layer: usize) -> Option<&str> {
        if layer == 0 {
            return None;
        }
        let attrs = self.layer_attributes(layer);
        attrs
            .first()
            .filter(|a| a.name == LAYER_NAME)
            .and_then(|a| a.value.as_str())
    }

    /// Find a layer by name.
    pub fn layer_for_name(&self, name: &str) -> Option<usize> {
        (1..self.layer_count()).find(|&layer| self.layer_name(layer) == Some(name))
    }

    /// Find an attribute by name within one layer.
    pub fn attribute(&self, layer: usize, name: &str) -> Option<&MaterialValue> {
        self.layer_attributes(layer)
            .iter()
            .find(|a| a.name == name)
            .map(|a| &a.value)
    }

    /// Find an attribute by name in the base layer.
    pub fn base_attribute(&self, name: &str) -> Option<&MaterialValue> {
        self.attribute(0, name)
    }

    /// Whether one layer contains an attribute with the given name.
    pub fn has_attribute(&self, layer: usize, name: &str) -> bool {
        self.attribute(layer, name).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attribute_encoded_size() {
        let attr = MaterialAttribute::new("Roughness", MaterialValue::Float(0.5));
        // 9 name bytes + NUL + tag + 4 payload bytes
        assert_eq!(attr.encoded_size(), 15);
        assert!(attr.fits());

        let attr = MaterialAttribute::new("name", MaterialValue::String("value".into()));
        // 4 + 1 + 1 + (5 + 2)
        assert_eq!(attr.encoded_size(), 13);

        let long_name = "a".repeat(62);
        let attr = MaterialAttribute::new(long_name, MaterialValue::Bool(true));
        assert_eq!(attr.encoded_size(), 65);
        assert!(!attr.fits());
    }

    #[test]
    fn type_flags() {
        let mut types = MaterialTypes::empty();
        assert!(types.is_empty());
        types |= MaterialTypes::PBR_METALLIC_ROUGHNESS;
        types |= MaterialTypes::PBR_CLEAR_COAT;
        assert!(types.contains(MaterialTypes::PBR_METALLIC_ROUGHNESS));
        assert!(!types.contains(MaterialTypes::PHONG));
        assert!(
            types.contains(MaterialTypes::PBR_METALLIC_ROUGHNESS | MaterialTypes::PBR_CLEAR_COAT)
        );
    }

    #[test]
    fn layer_queries() {
        let attributes = vec![
            MaterialAttribute::new("BaseColor", MaterialValue::Vector4([1.0, 0.0, 0.0, 1.0])),
            MaterialAttribute::new(LAYER_NAME, MaterialValue::String("ClearCoat".into())),
            MaterialAttribute::new("LayerFactor", MaterialValue::Float(1.0)),
            MaterialAttribute::new("Roughness", MaterialValue::Float(0.25)),
        ];
        let material = MaterialData::new(MaterialTypes::empty(), attributes, vec![1, 4]);

        assert_eq!(material.layer_count(), 2);
        assert_eq!(material.layer_name(0), None);
        assert_eq!(material.layer_name(1), Some("ClearCoat"));
        assert_eq!(material.layer_for_name("ClearCoat"), Some(1));
        assert_eq!(material.layer_for_name("sheen"), None);
        assert_eq!(
            material.base_attribute("BaseColor"),
            Some(&MaterialValue::Vector4([1.0, 0.0, 0.0, 1.0]))
        );
        assert_eq!(
            material.attribute(1, "Roughness"),
            Some(&MaterialValue::Float(0.25))
        );
        assert!(material.attribute(0, "Roughness").is_none());
    }

    #[test]
    fn empty_material_has_base_layer() {
        let material = MaterialData::new(MaterialTypes::empty(), Vec::new(), Vec::new());
        assert_eq!(material.layer_count(), 1);
        assert!(material.layer_attributes(0).is_empty());
    }
}
