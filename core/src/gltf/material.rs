//! Material normalization.
//!
//! Source materials become layered attribute bags: core metallic/roughness
//! properties land in the base layer (emitted only when they differ from
//! their defaults), the clear-coat extension becomes a `ClearCoat` layer,
//! known vendor extensions become `#`-prefixed layers with their original
//! property names, and unrecognized extensions are carried over
//! generically, one layer each. Document extras merge into the base layer.

use crate::material::{
    MaterialAttribute, MaterialData, MaterialTypes, MaterialValue, LAYER_NAME,
};

use super::config::GltfConfig;
use super::error::GltfImportError;

/// Vendor extensions translated with their property names kept.
const KNOWN_EXTENSION_LAYERS: &[&str] = &[
    "KHR_materials_ior",
    "KHR_materials_specular",
    "KHR_materials_transmission",
    "KHR_materials_volume",
    "KHR_materials_sheen",
    "KHR_materials_emissive_strength",
];

/// Extensions consumed by dedicated translation paths.
const HANDLED_EXTENSIONS: &[&str] = &[
    "KHR_materials_unlit",
    "KHR_materials_pbrSpecularGlossiness",
    "KHR_materials_clearcoat",
];

#[derive(Debug, Clone, Copy)]
struct TransformData {
    offset: [f32; 2],
    rotation: f32,
    scale: [f32; 2],
    tex_coord: Option<u32>,
}

/// A texture reference with everything needed to emit its attributes.
#[derive(Debug, Clone, Copy)]
struct TextureRef {
    texture: u32,
    tex_coord: u32,
    transform: Option<TransformData>,
}

impl TextureRef {
    fn from_info(info: &gltf_dep::texture::Info<'_>) -> Self {
        Self {
            texture: info.texture().index() as u32,
            tex_coord: info.tex_coord(),
            transform: info.texture_transform().as_ref().map(map_transform),
        }
    }

    // The normal and occlusion infos expose no typed
    // KHR_texture_transform accessor; their transform lives in the raw
    // extension JSON.
    fn from_normal(info: &gltf_dep::material::NormalTexture<'_>) -> Self {
        Self {
            texture: info.texture().index() as u32,
            tex_coord: info.tex_coord(),
            transform: transform_from_extensions(info.extensions()),
        }
    }

    fn from_occlusion(info: &gltf_dep::material::OcclusionTexture<'_>) -> Self {
        Self {
            texture: info.texture().index() as u32,
            tex_coord: info.tex_coord(),
            transform: transform_from_extensions(info.extensions()),
        }
    }
}

fn map_transform(t: &gltf_dep::texture::TextureTransform<'_>) -> TransformData {
    TransformData {
        offset: t.offset(),
        rotation: t.rotation(),
        scale: t.scale(),
        tex_coord: t.tex_coord(),
    }
}

/// Combined UV transform: the declared transform composed with the
/// deferred V flip, `None` when neither applies.
fn texture_matrix(transform: Option<&TransformData>, flip: bool) -> Option<[[f32; 3]; 3]> {
    if transform.is_none() && !flip {
        return None;
    }
    let mut m = nalgebra::Matrix3::identity();
    if let Some(t) = transform {
        m = nalgebra::Matrix3::new_translation(&nalgebra::Vector2::from(t.offset))
            * nalgebra::Matrix3::new_rotation(-t.rotation)
            * nalgebra::Matrix3::new_nonuniform_scaling(&nalgebra::Vector2::from(t.scale));
    }
    if flip {
        m = nalgebra::Matrix3::new_translation(&nalgebra::Vector2::new(0.0, 1.0))
            * nalgebra::Matrix3::new_nonuniform_scaling(&nalgebra::Vector2::new(1.0, -1.0))
            * m;
    }
    let mut out = [[0.0f32; 3]; 3];
    for c in 0..3 {
        for r in 0..3 {
            out[c][r] = m[(r, c)];
        }
    }
    Some(out)
}

/// Emit the attributes of one texture reference. The texture id goes
/// under `id_name`; the UV matrix and non-zero UV set index go under
/// every prefix in `prefixes` (the combined metallic/roughness texture
/// shares one id between two logical textures).
fn emit_texture(
    attrs: &mut Vec<MaterialAttribute>,
    id_name: &str,
    prefixes: &[&str],
    r: &TextureRef,
    flip: bool,
) {
    attrs.push(MaterialAttribute::new(
        id_name,
        MaterialValue::UnsignedInt(r.texture),
    ));
    if let Some(matrix) = texture_matrix(r.transform.as_ref(), flip) {
        for prefix in prefixes {
            attrs.push(MaterialAttribute::new(
                format!("{}Matrix", prefix),
                MaterialValue::Matrix3(matrix),
            ));
        }
    }
    let coords = r
        .transform
        .as_ref()
        .and_then(|t| t.tex_coord)
        .unwrap_or(r.tex_coord);
    if coords != 0 {
        for prefix in prefixes {
            attrs.push(MaterialAttribute::new(
                format!("{}Coordinates", prefix),
                MaterialValue::UnsignedInt(coords),
            ));
        }
    }
}

fn json_vec2(value: Option<&serde_json::Value>) -> Option<[f32; 2]> {
    let array = value?.as_array()?;
    if array.len() != 2 {
        return None;
    }
    Some([array[0].as_f64()? as f32, array[1].as_f64()? as f32])
}

/// Transform parameters of a raw `KHR_texture_transform` JSON object.
fn json_transform(t: &serde_json::Map<String, serde_json::Value>) -> TransformData {
    TransformData {
        offset: json_vec2(t.get("offset")).unwrap_or([0.0, 0.0]),
        rotation: t.get("rotation").and_then(|v| v.as_f64()).unwrap_or(0.0) as f32,
        scale: json_vec2(t.get("scale")).unwrap_or([1.0, 1.0]),
        tex_coord: t.get("texCoord").and_then(|v| v.as_u64()).map(|v| v as u32),
    }
}

fn transform_from_extensions(
    extensions: Option<&serde_json::Map<String, serde_json::Value>>,
) -> Option<TransformData> {
    let transform = extensions?.get("KHR_texture_transform")?.as_object()?;
    Some(json_transform(transform))
}

/// Texture reference from a raw JSON texture-info object.
fn json_texture_ref(
    value: &serde_json::Value,
    texture_count: usize,
) -> Option<TextureRef> {
    let obj = value.as_object()?;
    let texture = obj.get("index")?.as_u64()? as usize;
    if texture >= texture_count {
        return None;
    }
    let tex_coord = obj.get("texCoord").and_then(|v| v.as_u64()).unwrap_or(0) as u32;
    let transform = obj
        .get("extensions")
        .and_then(|e| e.get("KHR_texture_transform"))
        .and_then(|t| t.as_object())
        .map(json_transform);
    Some(TextureRef {
        texture: texture as u32,
        tex_coord,
        transform,
    })
}

/// Lowercase a leading uppercase letter; uppercase names are reserved for
/// the built-in attribute catalog.
fn custom_attribute_name(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_uppercase() => {
            format!("{}{}", first.to_ascii_lowercase(), chars.as_str())
        }
        _ => name.to_string(),
    }
}

/// Translate one JSON value into a material attribute, appending texture
/// sub-attributes for texture-info objects. Values that do not map are
/// skipped with a warning.
fn append_json_attribute(
    material: usize,
    name: &str,
    value: &serde_json::Value,
    texture_count: usize,
    flip: bool,
    attrs: &mut Vec<MaterialAttribute>,
) {
    if name.is_empty() {
        log::warn!("material {}: ignoring attribute with an empty name", material);
        return;
    }
    let name = custom_attribute_name(name);
    let mapped = match value {
        serde_json::Value::Bool(b) => Some(MaterialValue::Bool(*b)),
        serde_json::Value::Number(n) => n.as_f64().map(|v| MaterialValue::Float(v as f32)),
        serde_json::Value::String(s) => Some(MaterialValue::String(s.clone())),
        serde_json::Value::Array(array) => {
            let floats: Option<Vec<f32>> =
                array.iter().map(|v| v.as_f64().map(|f| f as f32)).collect();
            match floats.as_deref() {
                Some([x, y]) => Some(MaterialValue::Vector2([*x, *y])),
                Some([x, y, z]) => Some(MaterialValue::Vector3([*x, *y, *z])),
                Some([x, y, z, w]) => Some(MaterialValue::Vector4([*x, *y, *z, *w])),
                _ => None,
            }
        }
        serde_json::Value::Object(_) if name.ends_with("Texture") || name.ends_with("texture") => {
            match json_texture_ref(value, texture_count) {
                Some(r) => {
                    let before = attrs.len();
                    emit_texture(attrs, &name, &[&name], &r, flip);
                    for attr in &attrs[before..] {
                        debug_assert!(attr.fits());
                    }
                    return;
                }
                None => {
                    log::warn!(
                        "material {}: invalid texture reference in attribute {}, skipping",
                        material,
                        name
                    );
                    return;
                }
            }
        }
        _ => None,
    };
    match mapped {
        Some(value) => {
            let attr = MaterialAttribute::new(name, value);
            if attr.fits() {
                attrs.push(attr);
            } else {
                log::warn!(
                    "material {}: attribute {} is too large, skipping",
                    material,
                    attr.name
                );
            }
        }
        None => log::warn!(
            "material {}: attribute {} has an unrepresentable value, skipping",
            material,
            name
        ),
    }
}

fn extras_object(raw: &Option<Box<serde_json::value::RawValue>>) -> Option<serde_json::Value> {
    let raw = raw.as_ref()?;
    serde_json::from_str(raw.get()).ok()
}

/// Translate one material.
pub(crate) fn translate(
    document: &gltf_dep::Document,
    index: usize,
    config: &GltfConfig,
    flip: bool,
) -> Result<MaterialData, GltfImportError> {
    let material = document
        .materials()
        .nth(index)
        .ok_or_else(|| GltfImportError::Material {
            index,
            reason: "material index out of range".to_string(),
        })?;
    let texture_count = document.textures().len();
    let extensions = material.extensions().cloned().unwrap_or_default();

    let mut types = MaterialTypes::PBR_METALLIC_ROUGHNESS;
    if extensions.contains_key("KHR_materials_unlit") {
        types |= MaterialTypes::FLAT;
    }

    let mut attrs: Vec<MaterialAttribute> = Vec::new();
    let pbr = material.pbr_metallic_roughness();
    if pbr.base_color_factor() != [1.0, 1.0, 1.0, 1.0] {
        attrs.push(MaterialAttribute::new(
            "BaseColor",
            MaterialValue::Vector4(pbr.base_color_factor()),
        ));
    }
    if let Some(info) = pbr.base_color_texture() {
        emit_texture(
            &mut attrs,
            "BaseColorTexture",
            &["BaseColorTexture"],
            &TextureRef::from_info(&info),
            flip,
        );
    }
    if pbr.metallic_factor() != 1.0 {
        attrs.push(MaterialAttribute::new(
            "Metalness",
            MaterialValue::Float(pbr.metallic_factor()),
        ));
    }
    if pbr.roughness_factor() != 1.0 {
        attrs.push(MaterialAttribute::new(
            "Roughness",
            MaterialValue::Float(pbr.roughness_factor()),
        ));
    }
    if let Some(info) = pbr.metallic_roughness_texture() {
        emit_texture(
            &mut attrs,
            "NoneRoughnessMetallicTexture",
            &["RoughnessTexture", "MetalnessTexture"],
            &TextureRef::from_info(&info),
            flip,
        );
    }
    if let Some(info) = material.normal_texture() {
        let r = TextureRef::from_normal(&info);
        emit_texture(&mut attrs, "NormalTexture", &["NormalTexture"], &r, flip);
        if info.scale() != 1.0 {
            attrs.push(MaterialAttribute::new(
                "NormalTextureScale",
                MaterialValue::Float(info.scale()),
            ));
        }
    }
    if let Some(info) = material.occlusion_texture() {
        let r = TextureRef::from_occlusion(&info);
        emit_texture(&mut attrs, "OcclusionTexture", &["OcclusionTexture"], &r, flip);
        if info.strength() != 1.0 {
            attrs.push(MaterialAttribute::new(
                "OcclusionTextureStrength",
                MaterialValue::Float(info.strength()),
            ));
        }
    }
    if material.emissive_factor() != [0.0, 0.0, 0.0] {
        attrs.push(MaterialAttribute::new(
            "EmissiveColor",
            MaterialValue::Vector3(material.emissive_factor()),
        ));
    }
    if let Some(info) = material.emissive_texture() {
        emit_texture(
            &mut attrs,
            "EmissiveTexture",
            &["EmissiveTexture"],
            &TextureRef::from_info(&info),
            flip,
        );
    }
    match material.alpha_mode() {
        gltf_dep::material::AlphaMode::Opaque => {}
        gltf_dep::material::AlphaMode::Mask => attrs.push(MaterialAttribute::new(
            "AlphaMask",
            MaterialValue::Float(material.alpha_cutoff().unwrap_or(0.5)),
        )),
        gltf_dep::material::AlphaMode::Blend => {
            attrs.push(MaterialAttribute::new("AlphaBlend", MaterialValue::Bool(true)))
        }
    }
    if material.double_sided() {
        attrs.push(MaterialAttribute::new(
            "DoubleSided",
            MaterialValue::Bool(true),
        ));
    }

    if let Some(sg) = extensions
        .get("KHR_materials_pbrSpecularGlossiness")
        .and_then(|v| v.as_object())
    {
        types |= MaterialTypes::PBR_SPECULAR_GLOSSINESS;
        if let Some(array) = sg.get("diffuseFactor").and_then(|v| v.as_array()) {
            let diffuse: Vec<f32> = array
                .iter()
                .filter_map(|v| v.as_f64().map(|f| f as f32))
                .collect();
            if let [r, g, b, a] = diffuse[..] {
                if [r, g, b, a] != [1.0, 1.0, 1.0, 1.0] {
                    attrs.push(MaterialAttribute::new(
                        "DiffuseColor",
                        MaterialValue::Vector4([r, g, b, a]),
                    ));
                }
            }
        }
        if let Some(r) = sg
            .get("diffuseTexture")
            .and_then(|v| json_texture_ref(v, texture_count))
        {
            emit_texture(&mut attrs, "DiffuseTexture", &["DiffuseTexture"], &r, flip);
        }
        if let Some(array) = sg.get("specularFactor").and_then(|v| v.as_array()) {
            let specular: Vec<f32> = array
                .iter()
                .filter_map(|v| v.as_f64().map(|f| f as f32))
                .collect();
            if let [r, g, b] = specular[..] {
                if [r, g, b] != [1.0, 1.0, 1.0] {
                    attrs.push(MaterialAttribute::new(
                        "SpecularColor",
                        MaterialValue::Vector4([r, g, b, 1.0]),
                    ));
                }
            }
        }
        if let Some(glossiness) = sg.get("glossinessFactor").and_then(|v| v.as_f64()) {
            if glossiness != 1.0 {
                attrs.push(MaterialAttribute::new(
                    "Glossiness",
                    MaterialValue::Float(glossiness as f32),
                ));
            }
        }
        if let Some(r) = sg
            .get("specularGlossinessTexture")
            .and_then(|v| json_texture_ref(v, texture_count))
        {
            emit_texture(
                &mut attrs,
                "SpecularGlossinessTexture",
                &["SpecularTexture", "GlossinessTexture"],
                &r,
                flip,
            );
        }
    }

    if let Some(extras) = extras_object(material.extras()) {
        match extras.as_object() {
            Some(object) => {
                for (name, value) in object {
                    append_json_attribute(index, name, value, texture_count, flip, &mut attrs);
                }
            }
            None => log::warn!("material {}: extras is not an object, ignoring", index),
        }
    }

    if config.phong_material_fallback {
        types |= MaterialTypes::PHONG;
        let mapping = [
            ("BaseColor", "DiffuseColor"),
            ("BaseColorTexture", "DiffuseTexture"),
            ("BaseColorTextureMatrix", "DiffuseTextureMatrix"),
            ("BaseColorTextureCoordinates", "DiffuseTextureCoordinates"),
        ];
        let mut copies = Vec::new();
        for (source, target) in mapping {
            if attrs.iter().any(|a| a.name == target) {
                continue;
            }
            if let Some(attr) = attrs.iter().find(|a| a.name == source) {
                copies.push(MaterialAttribute::new(target, attr.value.clone()));
            }
        }
        attrs.extend(copies);
    }

    let mut layer_offsets = vec![attrs.len() as u32];

    if let Some(cc) = extensions
        .get("KHR_materials_clearcoat")
        .and_then(|v| v.as_object())
    {
        types |= MaterialTypes::PBR_CLEAR_COAT;
        attrs.push(MaterialAttribute::new(
            LAYER_NAME,
            MaterialValue::String("ClearCoat".to_string()),
        ));
        let factor = cc
            .get("clearcoatFactor")
            .and_then(|v| v.as_f64())
            .unwrap_or(0.0) as f32;
        attrs.push(MaterialAttribute::new(
            "LayerFactor",
            MaterialValue::Float(factor),
        ));
        if let Some(r) = cc
            .get("clearcoatTexture")
            .and_then(|v| json_texture_ref(v, texture_count))
        {
            emit_texture(
                &mut attrs,
                "LayerFactorTexture",
                &["LayerFactorTexture"],
                &r,
                flip,
            );
            attrs.push(MaterialAttribute::new(
                "LayerFactorTextureSwizzle",
                MaterialValue::String("R".to_string()),
            ));
        }
        let roughness = cc
            .get("clearcoatRoughnessFactor")
            .and_then(|v| v.as_f64())
            .unwrap_or(0.0) as f32;
        attrs.push(MaterialAttribute::new(
            "Roughness",
            MaterialValue::Float(roughness),
        ));
        if let Some(r) = cc
            .get("clearcoatRoughnessTexture")
            .and_then(|v| json_texture_ref(v, texture_count))
        {
            emit_texture(&mut attrs, "RoughnessTexture", &["RoughnessTexture"], &r, flip);
            attrs.push(MaterialAttribute::new(
                "RoughnessTextureSwizzle",
                MaterialValue::String("G".to_string()),
            ));
        }
        if let Some(normal) = cc.get("clearcoatNormalTexture") {
            if let Some(r) = json_texture_ref(normal, texture_count) {
                emit_texture(&mut attrs, "NormalTexture", &["NormalTexture"], &r, flip);
                if let Some(scale) = normal.get("scale").and_then(|v| v.as_f64()) {
                    if scale != 1.0 {
                        attrs.push(MaterialAttribute::new(
                            "NormalTextureScale",
                            MaterialValue::Float(scale as f32),
                        ));
                    }
                }
            }
        }
        layer_offsets.push(attrs.len() as u32);
    }

    for &ext in KNOWN_EXTENSION_LAYERS {
        let Some(object) = extensions.get(ext).and_then(|v| v.as_object()) else {
            continue;
        };
        attrs.push(MaterialAttribute::new(
            LAYER_NAME,
            MaterialValue::String(format!("#{}", ext)),
        ));
        for (name, value) in object {
            // The volume extension expresses "unbounded" as the largest
            // finite float.
            if ext == "KHR_materials_volume" && name == "attenuationDistance" {
                if let Some(v) = value.as_f64() {
                    let v = v as f32;
                    let v = if v >= f32::MAX { f32::INFINITY } else { v };
                    attrs.push(MaterialAttribute::new(
                        "attenuationDistance",
                        MaterialValue::Float(v),
                    ));
                    continue;
                }
            }
            append_json_attribute(index, name, value, texture_count, flip, &mut attrs);
        }
        layer_offsets.push(attrs.len() as u32);
    }

    for (ext, value) in &extensions {
        if KNOWN_EXTENSION_LAYERS.contains(&ext.as_str())
            || HANDLED_EXTENSIONS.contains(&ext.as_str())
        {
            continue;
        }
        let Some(object) = value.as_object() else {
            log::warn!(
                "material {}: extension {} is not an object, skipping",
                index,
                ext
            );
            continue;
        };
        let layer_name = MaterialAttribute::new(
            LAYER_NAME,
            MaterialValue::String(format!("#{}", ext)),
        );
        if !layer_name.fits() {
            log::warn!(
                "material {}: extension name {} is too long, skipping",
                index,
                ext
            );
            continue;
        }
        attrs.push(layer_name);
        for (name, value) in object {
            append_json_attribute(index, name, value, texture_count, flip, &mut attrs);
        }
        layer_offsets.push(attrs.len() as u32);
    }

    Ok(MaterialData::new(types, attrs, layer_offsets))
}
