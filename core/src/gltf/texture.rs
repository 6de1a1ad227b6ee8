//! Texture and image translation.
//!
//! Textures resolve their sampler state (defaulting to linear/repeat)
//! and their image source, honoring compressed-texture extensions that
//! override the source image. Image payloads resolve to either in-memory
//! bytes or a file path handed to the image decoder.

use crate::io::{CachePolicy, FileLoader};
use crate::texture::{AddressMode, FilterMode, MipmapMode, TextureData};

use super::buffer::{parse_data_uri, BufferStore};
use super::error::GltfImportError;

/// Extensions that substitute the sampled image with a compressed one.
const SOURCE_OVERRIDE_EXTENSIONS: &[&str] = &[
    "KHR_texture_basisu",
    "GOOGLE_texture_basis",
    "MSFT_texture_dds",
];

fn map_mag_filter(filter: gltf_dep::texture::MagFilter) -> FilterMode {
    match filter {
        gltf_dep::texture::MagFilter::Nearest => FilterMode::Nearest,
        gltf_dep::texture::MagFilter::Linear => FilterMode::Linear,
    }
}

fn map_min_filter(filter: gltf_dep::texture::MinFilter) -> (FilterMode, MipmapMode) {
    use gltf_dep::texture::MinFilter;
    match filter {
        MinFilter::Nearest => (FilterMode::Nearest, MipmapMode::Base),
        MinFilter::Linear => (FilterMode::Linear, MipmapMode::Base),
        MinFilter::NearestMipmapNearest => (FilterMode::Nearest, MipmapMode::Nearest),
        MinFilter::LinearMipmapNearest => (FilterMode::Linear, MipmapMode::Nearest),
        MinFilter::NearestMipmapLinear => (FilterMode::Nearest, MipmapMode::Linear),
        MinFilter::LinearMipmapLinear => (FilterMode::Linear, MipmapMode::Linear),
    }
}

fn map_wrapping(mode: gltf_dep::texture::WrappingMode) -> AddressMode {
    match mode {
        gltf_dep::texture::WrappingMode::ClampToEdge => AddressMode::ClampToEdge,
        gltf_dep::texture::WrappingMode::MirroredRepeat => AddressMode::MirrorRepeat,
        gltf_dep::texture::WrappingMode::Repeat => AddressMode::Repeat,
    }
}

/// Translate one texture.
pub(crate) fn translate(
    document: &gltf_dep::Document,
    index: usize,
) -> Result<TextureData, GltfImportError> {
    let texture = document
        .textures()
        .nth(index)
        .ok_or_else(|| GltfImportError::Texture {
            index,
            reason: "texture index out of range".to_string(),
        })?;

    // Compressed-texture extensions point at a substitute image; the
    // last one present wins.
    let mut image = texture.source().index();
    if let Some(extensions) = texture.extensions() {
        for (name, value) in extensions {
            if !SOURCE_OVERRIDE_EXTENSIONS.contains(&name.as_str()) {
                continue;
            }
            let source = value
                .get("source")
                .and_then(|v| v.as_u64())
                .ok_or_else(|| GltfImportError::Texture {
                    index,
                    reason: format!("extension {} has no source image", name),
                })? as usize;
            if source >= document.images().len() {
                return Err(GltfImportError::Texture {
                    index,
                    reason: format!("extension {} source image {} out of range", name, source),
                });
            }
            image = source;
        }
    }

    let sampler = texture.sampler();
    let mag_filter = sampler
        .mag_filter()
        .map_or(FilterMode::Linear, map_mag_filter);
    let (min_filter, mipmap) = sampler
        .min_filter()
        .map_or((FilterMode::Linear, MipmapMode::Linear), map_min_filter);
    Ok(TextureData {
        image: image as u32,
        mag_filter,
        min_filter,
        mipmap,
        address_mode_u: map_wrapping(sampler.wrap_s()),
        address_mode_v: map_wrapping(sampler.wrap_t()),
    })
}

/// Where an image payload comes from.
pub(crate) enum ImagePayload {
    /// In-memory encoded bytes.
    Bytes(Vec<u8>),
    /// A file path for the decoder to open itself.
    Path(String),
}

/// Resolve one image's payload: an embedded buffer view slice, a data
/// URI, bytes fetched through the file loader, or a bare path when no
/// loader is installed.
pub(crate) fn image_payload(
    document: &gltf_dep::Document,
    buffers: &mut BufferStore,
    blob: Option<&[u8]>,
    loader: &mut Option<Box<FileLoader<'_>>>,
    index: usize,
) -> Result<ImagePayload, GltfImportError> {
    let image = document
        .images()
        .nth(index)
        .ok_or_else(|| GltfImportError::Image {
            index,
            reason: "image index out of range".to_string(),
        })?;
    match image.source() {
        gltf_dep::image::Source::View { view, .. } => {
            let begin = view.offset();
            let end = begin + view.length();
            if end > view.buffer().length() {
                return Err(GltfImportError::Image {
                    index,
                    reason: format!(
                        "buffer view [{}, {}) is out of bounds of the buffer",
                        begin, end
                    ),
                });
            }
            let bytes = buffers.fetch(view.buffer(), blob, loader)?;
            Ok(ImagePayload::Bytes(bytes[begin..end].to_vec()))
        }
        gltf_dep::image::Source::Uri { uri, .. } if uri.starts_with("data:") => parse_data_uri(uri)
            .map(ImagePayload::Bytes)
            .ok_or_else(|| GltfImportError::Image {
                index,
                reason: "invalid data URI".to_string(),
            }),
        gltf_dep::image::Source::Uri { uri, .. } => match loader.as_mut() {
            Some(loader) => loader(uri, CachePolicy::Permanent)
                .map(ImagePayload::Bytes)
                .ok_or_else(|| GltfImportError::Image {
                    index,
                    reason: format!("file {} could not be loaded", uri),
                }),
            None => Ok(ImagePayload::Path(uri.to_string())),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn document(json: &str) -> gltf_dep::Gltf {
        gltf_dep::Gltf::from_slice(json.as_bytes()).unwrap()
    }

    #[test]
    fn missing_sampler_defaults_to_linear_repeat() {
        let gltf = document(
            r#"{"asset":{"version":"2.0"},
            "images":[{"uri":"a.png"}],
            "textures":[{"source":0}]}"#,
        );
        let texture = translate(&gltf.document, 0).unwrap();
        assert_eq!(texture, TextureData::linear_repeat(0));
    }

    #[test]
    fn sampler_state_is_mapped() {
        let gltf = document(
            r#"{"asset":{"version":"2.0"},
            "images":[{"uri":"a.png"}],
            "samplers":[{"magFilter":9728,"minFilter":9986,"wrapS":33071,"wrapT":33648}],
            "textures":[{"source":0,"sampler":0}]}"#,
        );
        let texture = translate(&gltf.document, 0).unwrap();
        assert_eq!(texture.mag_filter, FilterMode::Nearest);
        assert_eq!(texture.min_filter, FilterMode::Nearest);
        assert_eq!(texture.mipmap, MipmapMode::Linear);
        assert_eq!(texture.address_mode_u, AddressMode::ClampToEdge);
        assert_eq!(texture.address_mode_v, AddressMode::MirrorRepeat);
    }

    #[test]
    fn compressed_extension_overrides_source() {
        let gltf = document(
            r#"{"asset":{"version":"2.0"},
            "images":[{"uri":"a.png"},{"uri":"a.ktx2"}],
            "textures":[{"source":0,"extensions":{"KHR_texture_basisu":{"source":1}}}]}"#,
        );
        let texture = translate(&gltf.document, 0).unwrap();
        assert_eq!(texture.image, 1);
    }

    #[test]
    fn override_with_bad_source_is_an_error() {
        let gltf = document(
            r#"{"asset":{"version":"2.0"},
            "images":[{"uri":"a.png"}],
            "textures":[{"source":0,"extensions":{"MSFT_texture_dds":{"source":7}}}]}"#,
        );
        assert!(matches!(
            translate(&gltf.document, 0),
            Err(GltfImportError::Texture { index: 0, .. })
        ));
    }

    #[test]
    fn data_uri_image_resolves_to_bytes() {
        let gltf = document(
            r#"{"asset":{"version":"2.0"},
            "images":[{"uri":"data:image/png;base64,AAECAw=="}]}"#,
        );
        let mut buffers = BufferStore::new(0);
        let mut loader = None;
        let payload =
            image_payload(&gltf.document, &mut buffers, None, &mut loader, 0).unwrap();
        match payload {
            ImagePayload::Bytes(bytes) => assert_eq!(bytes, vec![0, 1, 2, 3]),
            ImagePayload::Path(_) => panic!("expected bytes"),
        }
    }

    #[test]
    fn external_image_without_loader_is_a_path() {
        let gltf = document(
            r#"{"asset":{"version":"2.0"},
            "images":[{"uri":"textures/albedo.png"}]}"#,
        );
        let mut buffers = BufferStore::new(0);
        let mut loader = None;
        let payload =
            image_payload(&gltf.document, &mut buffers, None, &mut loader, 0).unwrap();
        match payload {
            ImagePayload::Path(path) => assert_eq!(path, "textures/albedo.png"),
            ImagePayload::Bytes(_) => panic!("expected a path"),
        }
    }
}
