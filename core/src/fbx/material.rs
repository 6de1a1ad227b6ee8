//! Material translation into layered attribute bags.
//!
//! Four mapping lists drive the translation: modern PBR values, legacy
//! diffuse/specular values, and the two corresponding factor lists.
//! Lists run in that order and share one exclusion bitmask, so when the
//! same concept appears in several lists (normal maps, emission,
//! displacement) the first hit wins. The PBR lists only apply to
//! materials declaring a PBR shading model, and the factor lists only
//! when factors are preserved instead of premultiplied.

use crate::material::{MaterialAttribute, MaterialData, MaterialTypes, MaterialValue, LAYER_NAME};

use super::config::FbxConfig;
use super::error::FbxImportError;
use super::types::{FbxLegacyMap, FbxPbrMap, FbxScene};

/// Static layer names; index 0 is the unnamed base layer.
pub(crate) const LAYER_NAMES: [&str; 6] =
    ["", "ClearCoat", "transmission", "subsurface", "sheen", "matte"];

const BASE: usize = 0;
const COAT: usize = 1;
const TRANSMISSION: usize = 2;
const SUBSURFACE: usize = 3;
const SHEEN: usize = 4;
const MATTE: usize = 5;

const EXCLUDE_NORMAL: u8 = 1 << 0;
const EXCLUDE_EMISSION: u8 = 1 << 1;
const EXCLUDE_DISPLACEMENT: u8 = 1 << 2;

#[derive(Clone, Copy)]
enum MappedValue {
    /// Texture-only mapping, no value attribute.
    None,
    Float,
    Vector3,
    Vector4,
    Long,
    Bool,
}

#[derive(Clone, Copy)]
enum TextureRule {
    /// Texture attribute named after the value attribute plus "Texture".
    Derived,
    /// Explicitly named texture attribute.
    Named(&'static str),
    /// No texture attribute even when the map connects one.
    Disallowed,
}

struct Mapping {
    layer: usize,
    value: MappedValue,
    attribute: &'static str,
    texture: TextureRule,
    value_map: usize,
    factor_map: Option<usize>,
    exclusion: u8,
}

const fn map(layer: usize, value: MappedValue, attribute: &'static str, value_map: usize) -> Mapping {
    Mapping {
        layer,
        value,
        attribute,
        texture: TextureRule::Derived,
        value_map,
        factor_map: None,
        exclusion: 0,
    }
}

impl Mapping {
    const fn with_factor(mut self, factor_map: usize) -> Self {
        self.factor_map = Some(factor_map);
        self
    }

    const fn with_texture(mut self, name: &'static str) -> Self {
        self.texture = TextureRule::Named(name);
        self
    }

    const fn without_texture(mut self) -> Self {
        self.texture = TextureRule::Disallowed;
        self
    }

    const fn excluding(mut self, group: u8) -> Self {
        self.exclusion = group;
        self
    }
}

const fn pbr(slot: FbxPbrMap) -> usize {
    slot as usize
}

const fn legacy(slot: FbxLegacyMap) -> usize {
    slot as usize
}

const PBR_VALUES: &[Mapping] = &[
    map(BASE, MappedValue::Vector4, "BaseColor", pbr(FbxPbrMap::BaseColor))
        .with_factor(pbr(FbxPbrMap::BaseFactor)),
    map(BASE, MappedValue::Float, "Roughness", pbr(FbxPbrMap::Roughness)),
    map(BASE, MappedValue::Float, "Glossiness", pbr(FbxPbrMap::Glossiness)),
    map(BASE, MappedValue::Float, "Metalness", pbr(FbxPbrMap::Metalness)),
    map(BASE, MappedValue::Float, "diffuseRoughness", pbr(FbxPbrMap::DiffuseRoughness)),
    // Not the Phong specular color: this tints the specular implied by
    // BaseColor and Metalness.
    map(BASE, MappedValue::Vector3, "specularColor", pbr(FbxPbrMap::SpecularColor))
        .with_factor(pbr(FbxPbrMap::SpecularFactor)),
    map(BASE, MappedValue::Float, "specularIor", pbr(FbxPbrMap::SpecularIor)),
    map(BASE, MappedValue::Float, "specularAnisotropy", pbr(FbxPbrMap::SpecularAnisotropy)),
    map(BASE, MappedValue::Float, "specularRotation", pbr(FbxPbrMap::SpecularRotation)),
    map(TRANSMISSION, MappedValue::Float, "LayerFactor", pbr(FbxPbrMap::TransmissionFactor)),
    map(TRANSMISSION, MappedValue::Vector3, "color", pbr(FbxPbrMap::TransmissionColor)),
    map(TRANSMISSION, MappedValue::Float, "depth", pbr(FbxPbrMap::TransmissionDepth)),
    map(TRANSMISSION, MappedValue::Float, "scatter", pbr(FbxPbrMap::TransmissionScatter)),
    map(
        TRANSMISSION,
        MappedValue::Float,
        "scatterAnisotropy",
        pbr(FbxPbrMap::TransmissionScatterAnisotropy),
    ),
    map(TRANSMISSION, MappedValue::Float, "dispersion", pbr(FbxPbrMap::TransmissionDispersion)),
    map(TRANSMISSION, MappedValue::Float, "roughness", pbr(FbxPbrMap::TransmissionRoughness)),
    map(TRANSMISSION, MappedValue::Float, "glossiness", pbr(FbxPbrMap::TransmissionGlossiness)),
    map(
        TRANSMISSION,
        MappedValue::Float,
        "extraRoughness",
        pbr(FbxPbrMap::TransmissionExtraRoughness),
    ),
    map(TRANSMISSION, MappedValue::Long, "priority", pbr(FbxPbrMap::TransmissionPriority)),
    map(TRANSMISSION, MappedValue::Bool, "enableInAov", pbr(FbxPbrMap::TransmissionEnableInAov)),
    map(SUBSURFACE, MappedValue::Float, "LayerFactor", pbr(FbxPbrMap::SubsurfaceFactor)),
    map(SUBSURFACE, MappedValue::Vector3, "color", pbr(FbxPbrMap::SubsurfaceColor)),
    map(SUBSURFACE, MappedValue::Float, "radius", pbr(FbxPbrMap::SubsurfaceRadius)),
    map(SUBSURFACE, MappedValue::Float, "scale", pbr(FbxPbrMap::SubsurfaceScale)),
    map(SUBSURFACE, MappedValue::Float, "anisotropy", pbr(FbxPbrMap::SubsurfaceAnisotropy)),
    map(SUBSURFACE, MappedValue::Vector3, "tintColor", pbr(FbxPbrMap::SubsurfaceTintColor)),
    map(SUBSURFACE, MappedValue::Long, "type", pbr(FbxPbrMap::SubsurfaceType)),
    map(SHEEN, MappedValue::Float, "LayerFactor", pbr(FbxPbrMap::SheenFactor)),
    map(SHEEN, MappedValue::Vector3, "color", pbr(FbxPbrMap::SheenColor)),
    map(SHEEN, MappedValue::Float, "roughness", pbr(FbxPbrMap::SheenRoughness)),
    map(COAT, MappedValue::Float, "LayerFactor", pbr(FbxPbrMap::CoatFactor)),
    map(COAT, MappedValue::Vector3, "color", pbr(FbxPbrMap::CoatColor)),
    map(COAT, MappedValue::Float, "Roughness", pbr(FbxPbrMap::CoatRoughness)),
    map(COAT, MappedValue::Float, "Glossiness", pbr(FbxPbrMap::CoatGlossiness)),
    map(COAT, MappedValue::Float, "ior", pbr(FbxPbrMap::CoatIor)),
    map(COAT, MappedValue::Float, "anisotropy", pbr(FbxPbrMap::CoatAnisotropy)),
    map(COAT, MappedValue::Float, "rotation", pbr(FbxPbrMap::CoatRotation)),
    map(COAT, MappedValue::None, "", pbr(FbxPbrMap::CoatNormal)).with_texture("NormalTexture"),
    map(COAT, MappedValue::Float, "affectBaseColor", pbr(FbxPbrMap::CoatAffectBaseColor)),
    map(COAT, MappedValue::Float, "affectBaseRoughness", pbr(FbxPbrMap::CoatAffectBaseRoughness)),
    map(BASE, MappedValue::Float, "thinFilmThickness", pbr(FbxPbrMap::ThinFilmThickness)),
    map(BASE, MappedValue::Float, "thinFilmIor", pbr(FbxPbrMap::ThinFilmIor)),
    map(BASE, MappedValue::Vector3, "EmissiveColor", pbr(FbxPbrMap::EmissionColor))
        .with_factor(pbr(FbxPbrMap::EmissionFactor))
        .with_texture("EmissiveTexture")
        .excluding(EXCLUDE_EMISSION),
    map(BASE, MappedValue::Float, "opacity", pbr(FbxPbrMap::Opacity)),
    map(BASE, MappedValue::Float, "indirectDiffuse", pbr(FbxPbrMap::IndirectDiffuse)),
    map(BASE, MappedValue::Float, "indirectSpecular", pbr(FbxPbrMap::IndirectSpecular)),
    map(BASE, MappedValue::None, "", pbr(FbxPbrMap::NormalMap))
        .with_texture("NormalTexture")
        .excluding(EXCLUDE_NORMAL),
    map(BASE, MappedValue::None, "", pbr(FbxPbrMap::TangentMap)).with_texture("tangentTexture"),
    map(BASE, MappedValue::None, "", pbr(FbxPbrMap::Displacement))
        .with_texture("displacementTexture")
        .excluding(EXCLUDE_DISPLACEMENT),
    map(MATTE, MappedValue::Float, "LayerFactor", pbr(FbxPbrMap::MatteFactor)),
    map(MATTE, MappedValue::Vector3, "color", pbr(FbxPbrMap::MatteColor)),
    map(BASE, MappedValue::None, "", pbr(FbxPbrMap::AmbientOcclusion))
        .with_texture("OcclusionTexture"),
];

const LEGACY_VALUES: &[Mapping] = &[
    map(BASE, MappedValue::Vector4, "DiffuseColor", legacy(FbxLegacyMap::DiffuseColor))
        .with_factor(legacy(FbxLegacyMap::DiffuseFactor))
        .with_texture("DiffuseTexture"),
    map(BASE, MappedValue::Vector4, "SpecularColor", legacy(FbxLegacyMap::SpecularColor))
        .with_factor(legacy(FbxLegacyMap::SpecularFactor))
        .with_texture("SpecularTexture"),
    map(BASE, MappedValue::Float, "Shininess", legacy(FbxLegacyMap::SpecularExponent))
        .with_texture("shininessTexture"),
    map(BASE, MappedValue::Vector4, "reflectionColor", legacy(FbxLegacyMap::ReflectionColor))
        .with_factor(legacy(FbxLegacyMap::ReflectionFactor))
        .with_texture("reflectionTexture"),
    map(BASE, MappedValue::Vector4, "transparencyColor", legacy(FbxLegacyMap::TransparencyColor))
        .with_factor(legacy(FbxLegacyMap::TransparencyFactor))
        .with_texture("transparencyTexture"),
    map(BASE, MappedValue::Vector3, "EmissiveColor", legacy(FbxLegacyMap::EmissionColor))
        .with_factor(legacy(FbxLegacyMap::EmissionFactor))
        .with_texture("EmissiveTexture")
        .excluding(EXCLUDE_EMISSION),
    map(BASE, MappedValue::Vector4, "AmbientColor", legacy(FbxLegacyMap::AmbientColor))
        .with_factor(legacy(FbxLegacyMap::AmbientFactor))
        .with_texture("AmbientTexture"),
    map(BASE, MappedValue::None, "", legacy(FbxLegacyMap::NormalMap))
        .with_texture("NormalTexture")
        .excluding(EXCLUDE_NORMAL),
    map(BASE, MappedValue::None, "", legacy(FbxLegacyMap::Bump))
        .with_texture("NormalTexture")
        .excluding(EXCLUDE_NORMAL),
    map(BASE, MappedValue::None, "", legacy(FbxLegacyMap::Bump)).with_texture("bumpTexture"),
    map(BASE, MappedValue::Float, "", legacy(FbxLegacyMap::BumpFactor))
        .with_texture("bumpFactor"),
    map(BASE, MappedValue::None, "", legacy(FbxLegacyMap::Displacement))
        .with_texture("displacementTexture")
        .excluding(EXCLUDE_DISPLACEMENT),
    map(BASE, MappedValue::Float, "", legacy(FbxLegacyMap::DisplacementFactor))
        .with_texture("displacementFactor"),
    map(BASE, MappedValue::None, "", legacy(FbxLegacyMap::VectorDisplacement))
        .with_texture("vectorDisplacementTexture"),
    map(BASE, MappedValue::Float, "", legacy(FbxLegacyMap::VectorDisplacementFactor))
        .with_texture("vectorDisplacementFactor"),
];

const PBR_FACTORS: &[Mapping] = &[
    map(BASE, MappedValue::Float, "baseColorFactor", pbr(FbxPbrMap::BaseFactor))
        .without_texture(),
    map(BASE, MappedValue::Float, "specularColorFactor", pbr(FbxPbrMap::SpecularFactor))
        .without_texture(),
    map(BASE, MappedValue::Float, "emissiveColorFactor", pbr(FbxPbrMap::EmissionFactor))
        .without_texture(),
];

const LEGACY_FACTORS: &[Mapping] = &[
    map(BASE, MappedValue::Float, "diffuseColorFactor", legacy(FbxLegacyMap::DiffuseFactor))
        .without_texture(),
    map(BASE, MappedValue::Float, "specularColorFactor", legacy(FbxLegacyMap::SpecularFactor))
        .without_texture(),
    map(BASE, MappedValue::Float, "reflectionColorFactor", legacy(FbxLegacyMap::ReflectionFactor))
        .without_texture(),
    map(
        BASE,
        MappedValue::Float,
        "transparencyColorFactor",
        legacy(FbxLegacyMap::TransparencyFactor),
    )
    .without_texture(),
    map(BASE, MappedValue::Float, "emissiveColorFactor", legacy(FbxLegacyMap::EmissionFactor))
        .without_texture(),
    map(BASE, MappedValue::Float, "ambientColorFactor", legacy(FbxLegacyMap::AmbientFactor))
        .without_texture(),
];

#[derive(Default)]
struct LayerBucket {
    base: Vec<MaterialAttribute>,
    /// Extra texture layers, populated by layered textures.
    extra: Vec<Vec<MaterialAttribute>>,
}

/// Translate one material. `texture_remap` maps parsed texture indices
/// to output texture ids, -1 for textures without a backing file.
pub(crate) fn translate(
    scene: &FbxScene,
    index: usize,
    config: &FbxConfig,
    texture_remap: &[i32],
) -> Result<MaterialData, FbxImportError> {
    let error = |reason: String| FbxImportError::Material { index, reason };
    let material = &scene.materials[index];

    struct List {
        mappings: &'static [Mapping],
        pbr: bool,
        factor: bool,
    }
    let lists = [
        List { mappings: PBR_VALUES, pbr: true, factor: false },
        List { mappings: LEGACY_VALUES, pbr: false, factor: false },
        List { mappings: PBR_FACTORS, pbr: true, factor: true },
        List { mappings: LEGACY_FACTORS, pbr: false, factor: true },
    ];

    let mut types = MaterialTypes::empty();
    // A declared legacy diffuse color means the fallback model is well
    // defined.
    if material.legacy_map(FbxLegacyMap::DiffuseColor).used() {
        types |= MaterialTypes::PHONG;
    }
    // The two PBR parameterizations are mutually exclusive.
    if material.pbr_map(FbxPbrMap::Metalness).used()
        && material.pbr_map(FbxPbrMap::Roughness).used()
    {
        types |= MaterialTypes::PBR_METALLIC_ROUGHNESS;
    } else if material.pbr_map(FbxPbrMap::SpecularColor).used()
        && material.pbr_map(FbxPbrMap::Glossiness).used()
    {
        types |= MaterialTypes::PBR_SPECULAR_GLOSSINESS;
    }
    if material.pbr_map(FbxPbrMap::CoatFactor).used() {
        types |= MaterialTypes::PBR_CLEAR_COAT;
    }

    let mut buckets: [LayerBucket; LAYER_NAMES.len()] =
        std::array::from_fn(|_| LayerBucket::default());
    let mut seen_exclusions = 0u8;

    for list in &lists {
        // Implicitly derived PBR values are dropped for non-PBR
        // materials, factors unless explicitly retained.
        if list.pbr && !material.pbr_enabled {
            continue;
        }
        if list.factor && !config.preserve_material_factors {
            continue;
        }
        let maps = if list.pbr { &material.pbr } else { &material.legacy };

        for mapping in list.mappings {
            let value_map = maps.map(mapping.value_map);
            if !value_map.used() {
                continue;
            }
            if mapping.exclusion != 0 {
                if seen_exclusions & mapping.exclusion != 0 {
                    continue;
                }
                seen_exclusions |= mapping.exclusion;
            }

            let mut factor = 1.0;
            if let Some(factor_slot) = mapping.factor_map {
                let factor_map = maps.map(factor_slot);
                if factor_map.value.is_some() && !config.preserve_material_factors {
                    factor = factor_map.value_real();
                }
            }

            // A scalar opacity patches the base color alpha.
            let mut opacity = 1.0;
            if list.pbr && !list.factor && mapping.value_map == pbr(FbxPbrMap::BaseColor) {
                let opacity_map = material.pbr_map(FbxPbrMap::Opacity);
                if opacity_map.is_scalar() {
                    opacity = opacity_map.value_real();
                }
            }

            let bucket = &mut buckets[mapping.layer];

            if !mapping.attribute.is_empty() && value_map.value.is_some() {
                let value = match mapping.value {
                    MappedValue::Float => {
                        Some(MaterialValue::Float((value_map.value_real() * factor) as f32))
                    }
                    MappedValue::Vector3 => {
                        let v = value_map.value_vec3();
                        Some(MaterialValue::Vector3([
                            (v[0] * factor) as f32,
                            (v[1] * factor) as f32,
                            (v[2] * factor) as f32,
                        ]))
                    }
                    MappedValue::Vector4 => {
                        let v = value_map.value_vec4();
                        Some(MaterialValue::Vector4([
                            (v[0] * factor) as f32,
                            (v[1] * factor) as f32,
                            (v[2] * factor) as f32,
                            (v[3] * opacity) as f32,
                        ]))
                    }
                    MappedValue::Long => Some(MaterialValue::Long(value_map.value_int())),
                    MappedValue::Bool => Some(MaterialValue::Bool(value_map.value_int() != 0)),
                    MappedValue::None => None,
                };
                if let Some(value) = value {
                    bucket.base.push(MaterialAttribute::new(mapping.attribute, value));
                }
            }

            let texture_name = match mapping.texture {
                TextureRule::Disallowed => None,
                TextureRule::Named(name) => Some(name.to_owned()),
                TextureRule::Derived => Some(format!("{}Texture", mapping.attribute)),
            };
            let (Some(chain_index), Some(texture_name)) = (value_map.texture, texture_name)
            else {
                continue;
            };
            let chain = scene
                .textures
                .get(chain_index as usize)
                .ok_or_else(|| error(format!("texture index {} out of range", chain_index)))?;

            // A plain file texture lists itself as its only file
            // texture; layered and shader-graph textures list every
            // file texture they reference.
            let mut layer = 0usize;
            for &file_texture in &chain.file_textures {
                let remapped = *texture_remap
                    .get(file_texture as usize)
                    .ok_or_else(|| error(format!("texture index {} out of range", file_texture)))?;
                if remapped < 0 {
                    continue;
                }
                if layer > 0 && bucket.extra.len() < layer {
                    bucket.extra.resize_with(layer, Vec::new);
                }
                let attributes = if layer == 0 {
                    &mut bucket.base
                } else {
                    &mut bucket.extra[layer - 1]
                };

                attributes.push(MaterialAttribute::new(
                    texture_name.clone(),
                    MaterialValue::UnsignedInt(remapped as u32),
                ));

                let file = &scene.textures[file_texture as usize];
                if let Some(matrix) = file.uv_transform {
                    attributes.push(MaterialAttribute::new(
                        format!("{}Matrix", texture_name),
                        MaterialValue::Matrix3(matrix),
                    ));
                }

                // Blend attributes only for genuine layered-texture
                // layers; shader graphs may list more file textures
                // than layers.
                if let Some(texture_layer) = chain.layers.get(layer) {
                    if texture_layer.texture == file_texture {
                        attributes.push(MaterialAttribute::new(
                            format!("{}BlendMode", texture_name),
                            MaterialValue::String(texture_layer.blend_mode.name().to_owned()),
                        ));
                        attributes.push(MaterialAttribute::new(
                            format!("{}BlendAlpha", texture_name),
                            MaterialValue::Float(texture_layer.alpha),
                        ));
                    }
                }

                layer += 1;
            }
        }
    }

    // Concatenate static layers; the base layer stays unnamed and is
    // emitted even when empty.
    let mut attributes = Vec::new();
    let mut offsets = Vec::new();
    for (layer, bucket) in buckets.iter_mut().enumerate() {
        if layer != 0 && bucket.base.is_empty() {
            continue;
        }
        if layer != 0 {
            attributes.push(MaterialAttribute::new(
                LAYER_NAME,
                MaterialValue::String(LAYER_NAMES[layer].to_owned()),
            ));
        }
        attributes.append(&mut bucket.base);
        offsets.push(attributes.len() as u32);

        for extra in &mut bucket.extra {
            if layer != 0 {
                attributes.push(MaterialAttribute::new(
                    LAYER_NAME,
                    MaterialValue::String(LAYER_NAMES[layer].to_owned()),
                ));
            }
            attributes.append(extra);
            offsets.push(attributes.len() as u32);
        }
    }

    Ok(MaterialData::new(types, attributes, offsets))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fbx::types::{
        FbxBlendMode, FbxMaterial, FbxMaterialMap, FbxMaterialMaps, FbxMapValue, FbxTexture,
        FbxTextureLayer,
    };

    fn scene_with(material: FbxMaterial) -> FbxScene {
        FbxScene {
            materials: vec![material],
            ..Default::default()
        }
    }

    fn set_legacy(material: &mut FbxMaterial, slot: FbxLegacyMap, map: FbxMaterialMap) {
        material.legacy.set(slot as usize, map);
    }

    fn set_pbr(material: &mut FbxMaterial, slot: FbxPbrMap, map: FbxMaterialMap) {
        material.pbr.set(slot as usize, map);
    }

    #[test]
    fn legacy_factor_premultiplies() {
        let mut material = FbxMaterial::default();
        set_legacy(&mut material, FbxLegacyMap::DiffuseColor, FbxMaterialMap::vec3([0.8, 0.4, 0.2]));
        set_legacy(&mut material, FbxLegacyMap::DiffuseFactor, FbxMaterialMap::real(0.5));
        let scene = scene_with(material);

        let data = translate(&scene, 0, &FbxConfig::default(), &[]).unwrap();
        assert!(data.types().contains(MaterialTypes::PHONG));
        assert_eq!(
            data.base_attribute("DiffuseColor"),
            Some(&MaterialValue::Vector4([0.4, 0.2, 0.1, 1.0]))
        );
        assert!(data.base_attribute("diffuseColorFactor").is_none());
        assert_eq!(data.layer_count(), 1);
    }

    #[test]
    fn preserved_factors_stay_separate() {
        let mut material = FbxMaterial::default();
        set_legacy(&mut material, FbxLegacyMap::DiffuseColor, FbxMaterialMap::vec3([0.8, 0.4, 0.2]));
        set_legacy(&mut material, FbxLegacyMap::DiffuseFactor, FbxMaterialMap::real(0.5));
        let scene = scene_with(material);

        let config = FbxConfig::default().with_preserve_material_factors(true);
        let data = translate(&scene, 0, &config, &[]).unwrap();
        assert_eq!(
            data.base_attribute("DiffuseColor"),
            Some(&MaterialValue::Vector4([0.8, 0.4, 0.2, 1.0]))
        );
        assert_eq!(
            data.base_attribute("diffuseColorFactor"),
            Some(&MaterialValue::Float(0.5))
        );
    }

    #[test]
    fn scalar_opacity_patches_base_color_alpha() {
        let mut material = FbxMaterial::default();
        material.pbr_enabled = true;
        set_pbr(&mut material, FbxPbrMap::BaseColor, FbxMaterialMap::vec3([1.0, 0.5, 0.25]));
        set_pbr(&mut material, FbxPbrMap::Opacity, FbxMaterialMap::real(0.75));
        set_pbr(&mut material, FbxPbrMap::Metalness, FbxMaterialMap::real(0.0));
        set_pbr(&mut material, FbxPbrMap::Roughness, FbxMaterialMap::real(0.5));
        let scene = scene_with(material);

        let data = translate(&scene, 0, &FbxConfig::default(), &[]).unwrap();
        assert!(data.types().contains(MaterialTypes::PBR_METALLIC_ROUGHNESS));
        assert_eq!(
            data.base_attribute("BaseColor"),
            Some(&MaterialValue::Vector4([1.0, 0.5, 0.25, 0.75]))
        );
        assert_eq!(data.base_attribute("opacity"), Some(&MaterialValue::Float(0.75)));
    }

    #[test]
    fn pbr_maps_ignored_without_pbr_shading_model() {
        let mut material = FbxMaterial::default();
        set_pbr(&mut material, FbxPbrMap::BaseColor, FbxMaterialMap::vec3([1.0, 0.0, 0.0]));
        let scene = scene_with(material);

        let data = translate(&scene, 0, &FbxConfig::default(), &[]).unwrap();
        assert!(data.base_attribute("BaseColor").is_none());
        assert!(data.attributes().is_empty());
    }

    #[test]
    fn normal_map_exclusion_keeps_first_hit() {
        let mut material = FbxMaterial::default();
        set_legacy(&mut material, FbxLegacyMap::NormalMap, FbxMaterialMap::textured(0));
        set_legacy(&mut material, FbxLegacyMap::Bump, FbxMaterialMap::textured(1));
        let mut scene = scene_with(material);
        scene.textures = vec![
            FbxTexture { file: Some(0), file_textures: vec![0], ..Default::default() },
            FbxTexture { file: Some(1), file_textures: vec![1], ..Default::default() },
        ];

        let data = translate(&scene, 0, &FbxConfig::default(), &[0, 1]).unwrap();
        let normals: Vec<_> = data
            .attributes()
            .iter()
            .filter(|a| a.name == "NormalTexture")
            .collect();
        assert_eq!(normals.len(), 1);
        assert_eq!(normals[0].value, MaterialValue::UnsignedInt(0));
    }

    #[test]
    fn coat_factor_creates_named_layer() {
        let mut material = FbxMaterial::default();
        material.pbr_enabled = true;
        set_pbr(&mut material, FbxPbrMap::CoatFactor, FbxMaterialMap::real(0.6));
        set_pbr(&mut material, FbxPbrMap::CoatRoughness, FbxMaterialMap::real(0.1));
        let scene = scene_with(material);

        let data = translate(&scene, 0, &FbxConfig::default(), &[]).unwrap();
        assert!(data.types().contains(MaterialTypes::PBR_CLEAR_COAT));
        let layer = data.layer_for_name("ClearCoat").unwrap();
        assert_eq!(data.attribute(layer, "LayerFactor"), Some(&MaterialValue::Float(0.6)));
        assert_eq!(data.attribute(layer, "Roughness"), Some(&MaterialValue::Float(0.1)));
    }

    #[test]
    fn layered_texture_spills_into_extra_layers() {
        let mut material = FbxMaterial::default();
        set_legacy(&mut material, FbxLegacyMap::DiffuseColor, FbxMaterialMap {
            value: Some(FbxMapValue::Vec3([1.0, 1.0, 1.0])),
            texture: Some(2),
        });
        let mut scene = scene_with(material);
        scene.textures = vec![
            FbxTexture { file: Some(0), file_textures: vec![0], ..Default::default() },
            FbxTexture { file: Some(1), file_textures: vec![1], ..Default::default() },
            FbxTexture {
                file: None,
                file_textures: vec![0, 1],
                layers: vec![
                    FbxTextureLayer { texture: 0, blend_mode: FbxBlendMode::Over, alpha: 1.0 },
                    FbxTextureLayer { texture: 1, blend_mode: FbxBlendMode::Additive, alpha: 0.5 },
                ],
                ..Default::default()
            },
        ];

        let data = translate(&scene, 0, &FbxConfig::default(), &[0, 1, -1]).unwrap();
        assert_eq!(data.layer_count(), 2);
        // Extra texture layers of the base static layer carry no name.
        assert_eq!(data.layer_name(1), None);
        assert_eq!(data.base_attribute("DiffuseTexture"), Some(&MaterialValue::UnsignedInt(0)));
        assert_eq!(
            data.base_attribute("DiffuseTextureBlendMode"),
            Some(&MaterialValue::String("over".to_owned()))
        );
        assert_eq!(data.attribute(1, "DiffuseTexture"), Some(&MaterialValue::UnsignedInt(1)));
        assert_eq!(
            data.attribute(1, "DiffuseTextureBlendMode"),
            Some(&MaterialValue::String("additive".to_owned()))
        );
        assert_eq!(
            data.attribute(1, "DiffuseTextureBlendAlpha"),
            Some(&MaterialValue::Float(0.5))
        );
    }

    #[test]
    fn uv_transform_emits_matrix_attribute() {
        let matrix = [[2.0, 0.0, 0.0], [0.0, 2.0, 0.0], [0.25, 0.25, 1.0]];
        let mut material = FbxMaterial::default();
        set_legacy(&mut material, FbxLegacyMap::DiffuseColor, FbxMaterialMap {
            value: Some(FbxMapValue::Vec3([1.0, 1.0, 1.0])),
            texture: Some(0),
        });
        let mut scene = scene_with(material);
        scene.textures = vec![FbxTexture {
            file: Some(0),
            file_textures: vec![0],
            uv_transform: Some(matrix),
            ..Default::default()
        }];

        let data = translate(&scene, 0, &FbxConfig::default(), &[0]).unwrap();
        assert_eq!(
            data.base_attribute("DiffuseTextureMatrix"),
            Some(&MaterialValue::Matrix3(matrix))
        );
    }
}
