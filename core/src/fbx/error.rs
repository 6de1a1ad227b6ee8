//! Error types for the binary interchange-format translator.

use thiserror::Error;

/// Errors produced while opening a parsed document or translating one
/// of its entities. As with the JSON-format translator, entity-level
/// failures name the offending index and leave the document open.
#[derive(Debug, Error)]
pub enum FbxImportError {
    /// The node hierarchy contains a cycle; the document cannot be
    /// opened.
    #[error("node tree contains a cycle starting at node {0}")]
    HierarchyCycle(usize),
    /// A node is malformed.
    #[error("node {index}: {reason}")]
    Node {
        /// Node index in the parsed graph.
        index: usize,
        /// What went wrong.
        reason: String,
    },
    /// A mesh chunk could not be assembled.
    #[error("mesh {mesh} slot {slot}: {reason}")]
    Mesh {
        /// Mesh index in the parsed graph.
        mesh: usize,
        /// Material slot within the mesh.
        slot: usize,
        /// What went wrong.
        reason: String,
    },
    /// A scene could not be flattened.
    #[error("scene {index}: {reason}")]
    Scene {
        /// Scene index; the format has exactly one scene, index 0.
        index: usize,
        /// What went wrong.
        reason: String,
    },
    /// A material could not be translated.
    #[error("material {index}: {reason}")]
    Material {
        /// Material index in the parsed graph.
        index: usize,
        /// What went wrong.
        reason: String,
    },
    /// A texture definition is invalid.
    #[error("texture {index}: {reason}")]
    Texture {
        /// Output texture index (after file-less textures are filtered
        /// out).
        index: usize,
        /// What went wrong.
        reason: String,
    },
    /// An image could not be resolved or decoded.
    #[error("image {index}: {reason}")]
    Image {
        /// Image file index in the parsed graph.
        index: usize,
        /// What went wrong.
        reason: String,
    },
    /// A camera definition is invalid.
    #[error("camera {index}: {reason}")]
    Camera {
        /// Camera index in the parsed graph.
        index: usize,
        /// What went wrong.
        reason: String,
    },
    /// A light definition is invalid or unsupported.
    #[error("light {index}: {reason}")]
    Light {
        /// Light index in the parsed graph.
        index: usize,
        /// What went wrong.
        reason: String,
    },
}
