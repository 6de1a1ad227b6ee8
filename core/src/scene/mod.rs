//! Flattened scene graph types.
//!
//! A translated scene is column-oriented: each field pairs an object-id
//! mapping array with a value array of the same length. Fields present on
//! every node (parent, TRS, visibility) share the record's implicit
//! mapping; sparse fields (mesh, camera, light, skin) carry their own
//! ordered mapping produced in traversal order.
//!
//! - [`SceneRecord`] - One flattened scene
//! - [`Field`] / [`TrsColumns`] / [`MeshReferences`] - Column groups
//! - [`CameraData`] / [`LightData`] / [`SkinData`] - Per-entity data
//! - [`AnimationClip`] / [`AnimationTrack`] - Keyframe animation clips

mod animation;
mod types;

pub use animation::{AnimationClip, AnimationTarget, AnimationTrack, Interpolation};
pub use types::{
    CameraData, CameraProjection, Field, LightData, LightKind, MeshReferences, SceneRecord,
    SkinData, TrsColumns,
};
