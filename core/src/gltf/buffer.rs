//! Buffer resolution and caching.
//!
//! Buffer payloads come from three places: the binary chunk of a
//! container file, embedded `data:` URIs and external files fetched
//! through the host's [`FileLoader`]. Payloads are resolved on first use
//! and cached for the document's lifetime, so queries that never touch a
//! buffer never pay for it.

use crate::io::{CachePolicy, FileLoader};

use super::error::GltfImportError;

/// Lazily resolved buffer payloads, one slot per document buffer.
pub(crate) struct BufferStore {
    slots: Vec<Option<Vec<u8>>>,
}

impl BufferStore {
    pub(crate) fn new(buffer_count: usize) -> Self {
        Self {
            slots: (0..buffer_count).map(|_| None).collect(),
        }
    }

    /// Bytes of `buffer`, resolving and caching them on first use. The
    /// resolved payload may be longer than the declared length but never
    /// shorter.
    pub(crate) fn fetch(
        &mut self,
        buffer: gltf_dep::Buffer<'_>,
        blob: Option<&[u8]>,
        loader: &mut Option<Box<FileLoader<'_>>>,
    ) -> Result<&[u8], GltfImportError> {
        let index = buffer.index();
        match &mut self.slots[index] {
            Some(bytes) => Ok(bytes),
            slot => {
                let bytes = resolve(&buffer, blob, loader)?;
                if bytes.len() < buffer.length() {
                    return Err(GltfImportError::Buffer {
                        index,
                        reason: format!(
                            "payload is shorter than declared, {} < {}",
                            bytes.len(),
                            buffer.length()
                        ),
                    });
                }
                Ok(slot.insert(bytes))
            }
        }
    }
}

fn resolve(
    buffer: &gltf_dep::Buffer<'_>,
    blob: Option<&[u8]>,
    loader: &mut Option<Box<FileLoader<'_>>>,
) -> Result<Vec<u8>, GltfImportError> {
    let index = buffer.index();
    match buffer.source() {
        gltf_dep::buffer::Source::Bin => blob.map(<[u8]>::to_vec).ok_or_else(|| {
            GltfImportError::Buffer {
                index,
                reason: "buffer references a binary chunk but the file has none".to_string(),
            }
        }),
        gltf_dep::buffer::Source::Uri(uri) if uri.starts_with("data:") => parse_data_uri(uri)
            .ok_or_else(|| GltfImportError::Buffer {
                index,
                reason: "invalid data URI".to_string(),
            }),
        gltf_dep::buffer::Source::Uri(uri) => {
            let loader = loader.as_mut().ok_or_else(|| GltfImportError::Buffer {
                index,
                reason: format!("external file {} requires a file loader", uri),
            })?;
            loader(uri, CachePolicy::Temporary).ok_or_else(|| GltfImportError::Buffer {
                index,
                reason: format!("file {} could not be loaded", uri),
            })
        }
    }
}

/// Decode a base64 `data:` URI. Returns `None` for malformed URIs and
/// for non-base64 encodings, which are not supported.
pub(crate) fn parse_data_uri(uri: &str) -> Option<Vec<u8>> {
    let rest = uri.strip_prefix("data:")?;
    let payload_start = rest.find(";base64,")? + ";base64,".len();
    decode_base64(&rest[payload_start..])
}

fn base64_value(byte: u8) -> Option<u32> {
    match byte {
        b'A'..=b'Z' => Some(u32::from(byte - b'A')),
        b'a'..=b'z' => Some(u32::from(byte - b'a') + 26),
        b'0'..=b'9' => Some(u32::from(byte - b'0') + 52),
        b'+' => Some(62),
        b'/' => Some(63),
        _ => None,
    }
}

fn decode_base64(input: &str) -> Option<Vec<u8>> {
    let bytes: Vec<u8> = input
        .bytes()
        .filter(|b| !b.is_ascii_whitespace())
        .collect();
    let mut out = Vec::with_capacity(bytes.len() / 4 * 3);
    for chunk in bytes.chunks(4) {
        let mut acc = 0u32;
        let mut count = 0u32;
        for &b in chunk {
            if b == b'=' {
                break;
            }
            acc = (acc << 6) | base64_value(b)?;
            count += 1;
        }
        if count == 0 {
            break;
        }
        // A lone character encodes fewer than 8 bits.
        if count == 1 {
            return None;
        }
        acc <<= 6 * (4 - count);
        out.push((acc >> 16) as u8);
        if count >= 3 {
            out.push((acc >> 8) as u8);
        }
        if count == 4 {
            out.push(acc as u8);
        }
    }
    Some(out)
}
