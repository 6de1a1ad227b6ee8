//! Error types for the JSON scene-format translator.

use thiserror::Error;

/// Errors produced while opening a document or translating one of its
/// entities. Entity-level errors name the offending index so failures
/// stay greppable; they leave the document open and other entities
/// queryable.
#[derive(Debug, Error)]
pub enum GltfImportError {
    /// The document itself could not be parsed.
    #[error("failed to parse document: {0}")]
    Parse(#[from] gltf_dep::Error),
    /// The document requires an extension this translator does not
    /// implement.
    #[error("required extension {0} is not supported")]
    RequiredExtension(String),
    /// The node hierarchy contains a cycle; the document cannot be opened.
    #[error("node tree contains a cycle starting at node {0}")]
    HierarchyCycle(usize),
    /// A buffer failed to resolve or was shorter than declared.
    #[error("buffer {index}: {reason}")]
    Buffer {
        /// Buffer index in the document.
        index: usize,
        /// What went wrong.
        reason: String,
    },
    /// An accessor failed validation.
    #[error("accessor {index}: {reason}")]
    Accessor {
        /// Accessor index in the document.
        index: usize,
        /// What went wrong.
        reason: String,
    },
    /// A mesh primitive could not be assembled.
    #[error("mesh {mesh} primitive {primitive}: {reason}")]
    Mesh {
        /// Mesh index in the document.
        mesh: usize,
        /// Primitive index within the mesh.
        primitive: usize,
        /// What went wrong.
        reason: String,
    },
    /// A scene could not be flattened.
    #[error("scene {index}: {reason}")]
    Scene {
        /// Scene index in the document.
        index: usize,
        /// What went wrong.
        reason: String,
    },
    /// A material could not be translated.
    #[error("material {index}: {reason}")]
    Material {
        /// Material index in the document.
        index: usize,
        /// What went wrong.
        reason: String,
    },
    /// A texture definition is invalid.
    #[error("texture {index}: {reason}")]
    Texture {
        /// Texture index in the document.
        index: usize,
        /// What went wrong.
        reason: String,
    },
    /// An image could not be resolved or decoded.
    #[error("image {index}: {reason}")]
    Image {
        /// Image index in the document.
        index: usize,
        /// What went wrong.
        reason: String,
    },
    /// A camera definition is invalid.
    #[error("camera {index}: {reason}")]
    Camera {
        /// Camera index in the document.
        index: usize,
        /// What went wrong.
        reason: String,
    },
    /// A light definition is invalid.
    #[error("light {index}: {reason}")]
    Light {
        /// Light index in the document.
        index: usize,
        /// What went wrong.
        reason: String,
    },
    /// A skin could not be translated.
    #[error("skin {index}: {reason}")]
    Skin {
        /// Skin index in the document.
        index: usize,
        /// What went wrong.
        reason: String,
    },
    /// An animation clip could not be translated.
    #[error("animation {index}: {reason}")]
    Animation {
        /// Animation index in the document (0 for merged clips).
        index: usize,
        /// What went wrong.
        reason: String,
    },
}
