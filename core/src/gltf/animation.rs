//! Animation clip translation.
//!
//! Source samplers referencing the same accessor are packed into the clip
//! blob once, so tracks sharing key times alias one array. Cubic-spline
//! tangents are pre-multiplied by their key time delta at translation
//! time; because that mutates shared data, reusing one spline value
//! accessor under two different time tracks, or sharing it with a
//! non-spline track, is refused.

use std::collections::HashMap;

use crate::io::FileLoader;
use crate::mesh::ComponentType;
use crate::scene::{AnimationClip, AnimationTarget, AnimationTrack, Interpolation};

use super::accessor::{self, AccessorLayout, StridedView};
use super::buffer::BufferStore;
use super::config::GltfConfig;
use super::error::GltfImportError;

fn map_interpolation(i: gltf_dep::animation::Interpolation) -> Interpolation {
    match i {
        gltf_dep::animation::Interpolation::Step => Interpolation::Step,
        gltf_dep::animation::Interpolation::Linear => Interpolation::Linear,
        gltf_dep::animation::Interpolation::CubicSpline => Interpolation::CubicSpline,
    }
}

/// Copy one accessor's elements into the packed f32 blob, deduplicated by
/// accessor identity. Returns the f32 offset and whether the range was
/// newly packed.
#[allow(clippy::too_many_arguments)]
fn pack(
    data: &mut Vec<f32>,
    ranges: &mut HashMap<usize, usize>,
    accessor_index: usize,
    layout: &AccessorLayout,
    document: &gltf_dep::Document,
    buffers: &mut BufferStore,
    blob: Option<&[u8]>,
    loader: &mut Option<Box<FileLoader<'_>>>,
) -> Result<(usize, bool), GltfImportError> {
    if let Some(&offset) = ranges.get(&accessor_index) {
        return Ok((offset, false));
    }
    let buffer = document
        .buffers()
        .nth(layout.buffer)
        .ok_or_else(|| GltfImportError::Accessor {
            index: accessor_index,
            reason: "buffer index out of range".to_string(),
        })?;
    let bytes = buffers.fetch(buffer, blob, loader)?;
    let view = StridedView::new(layout, bytes);
    let offset = data.len();
    let comps = layout.component_count as usize;
    let mut element = vec![0.0f32; comps];
    for i in 0..view.count() {
        view.read_f32(i, &mut element);
        data.extend_from_slice(&element);
    }
    ranges.insert(accessor_index, offset);
    Ok((offset, true))
}

/// Multiply in/out tangents by the neighboring key time delta, turning
/// normalized spline tangents into absolute ones.
fn scale_spline_tangents(
    data: &mut [f32],
    times_offset: usize,
    values_offset: usize,
    key_count: usize,
    comps: usize,
) {
    // Values are always packed after the times they go with.
    let (head, tail) = data.split_at_mut(values_offset);
    let times = &head[times_offset..times_offset + key_count];
    let values = &mut tail[..key_count * comps * 3];
    for k in 0..key_count.saturating_sub(1) {
        let dt = times[k + 1] - times[k];
        for v in &mut values[(k * 3 + 2) * comps..(k * 3 + 3) * comps] {
            *v *= dt;
        }
        for v in &mut values[(k + 1) * 3 * comps..((k + 1) * 3 + 1) * comps] {
            *v *= dt;
        }
    }
}

/// Flip rotation keys onto the shortest interpolation path and
/// renormalize them, per configuration.
fn postprocess_rotations(values: &mut [f32], config: &GltfConfig, renormalized: &mut usize) {
    if config.optimize_quaternion_shortest_path {
        for k in 1..values.len() / 4 {
            let base = k * 4;
            let dot: f32 = (0..4).map(|c| values[base - 4 + c] * values[base + c]).sum();
            if dot < 0.0 {
                for c in 0..4 {
                    values[base + c] = -values[base + c];
                }
            }
        }
    }
    if config.normalize_quaternions {
        for q in values.chunks_exact_mut(4) {
            let norm = (q[0] * q[0] + q[1] * q[1] + q[2] * q[2] + q[3] * q[3]).sqrt();
            if norm != 0.0 && (norm - 1.0).abs() > 1.0e-4 {
                for v in q {
                    *v /= norm;
                }
                *renormalized += 1;
            }
        }
    }
}

/// Translate one animation clip. With clip merging enabled, clip 0 holds
/// every animation of the document and carries no name.
pub(crate) fn translate(
    document: &gltf_dep::Document,
    buffers: &mut BufferStore,
    blob: Option<&[u8]>,
    loader: &mut Option<Box<FileLoader<'_>>>,
    index: usize,
    config: &GltfConfig,
) -> Result<AnimationClip, GltfImportError> {
    let error = |reason: String| GltfImportError::Animation { index, reason };

    let mut animations: Vec<gltf_dep::Animation> = Vec::new();
    let mut name = None;
    if config.merge_animation_clips {
        if index != 0 || document.animations().len() == 0 {
            return Err(error("animation index out of range".to_string()));
        }
        animations.extend(document.animations());
    } else {
        let animation = document
            .animations()
            .nth(index)
            .ok_or_else(|| error("animation index out of range".to_string()))?;
        name = animation.name().map(str::to_string);
        animations.push(animation);
    }

    let mut data: Vec<f32> = Vec::new();
    let mut ranges: HashMap<usize, usize> = HashMap::new();
    // Output accessor -> time accessor whose deltas scaled its tangents.
    let mut spline_times: HashMap<usize, usize> = HashMap::new();
    let mut tracks = Vec::new();
    let mut renormalized = 0usize;

    for animation in &animations {
        for channel in animation.channels() {
            let sampler = channel.sampler();
            let interpolation = map_interpolation(sampler.interpolation());
            let target = match channel.target().property() {
                gltf_dep::animation::Property::Translation => AnimationTarget::Translation,
                gltf_dep::animation::Property::Rotation => AnimationTarget::Rotation,
                gltf_dep::animation::Property::Scale => AnimationTarget::Scaling,
                gltf_dep::animation::Property::MorphTargetWeights => {
                    return Err(error("morph target weights are not supported".to_string()));
                }
            };

            let input = sampler.input();
            let input_layout = accessor::validate(&input)?;
            if input_layout.component != ComponentType::F32
                || input_layout.dimensions != gltf_dep::accessor::Dimensions::Scalar
                || input_layout.normalized
            {
                return Err(error(format!(
                    "key times of accessor {} must be float scalars",
                    input.index()
                )));
            }
            let key_count = input_layout.count;

            let output = sampler.output();
            let output_layout = accessor::validate(&output)?;
            let expected_dim = match target.component_count() {
                3 => gltf_dep::accessor::Dimensions::Vec3,
                _ => gltf_dep::accessor::Dimensions::Vec4,
            };
            if output_layout.component != ComponentType::F32
                || output_layout.dimensions != expected_dim
                || output_layout.normalized
            {
                return Err(error(format!(
                    "values of accessor {} have an unsupported format",
                    output.index()
                )));
            }
            let expected_count = match interpolation {
                Interpolation::CubicSpline => key_count * 3,
                _ => key_count,
            };
            if output_layout.count != expected_count {
                return Err(error(format!(
                    "accessor {} holds {} values, expected {}",
                    output.index(),
                    output_layout.count,
                    expected_count
                )));
            }

            let (times_offset, _) = pack(
                &mut data,
                &mut ranges,
                input.index(),
                &input_layout,
                document,
                buffers,
                blob,
                loader,
            )?;
            let (values_offset, newly_packed) = pack(
                &mut data,
                &mut ranges,
                output.index(),
                &output_layout,
                document,
                buffers,
                blob,
                loader,
            )?;

            let comps = target.component_count();
            if interpolation == Interpolation::CubicSpline {
                match spline_times.get(&output.index()) {
                    Some(&previous) if previous != input.index() => {
                        return Err(error(format!(
                            "spline values of accessor {} are shared between different time tracks",
                            output.index()
                        )));
                    }
                    Some(_) => {}
                    None if !newly_packed => {
                        // The range was packed for a non-spline track and
                        // must stay unscaled.
                        return Err(error(format!(
                            "spline values of accessor {} are shared with a non-spline track",
                            output.index()
                        )));
                    }
                    None => {
                        scale_spline_tangents(&mut data, times_offset, values_offset, key_count, comps);
                        spline_times.insert(output.index(), input.index());
                    }
                }
            } else if spline_times.contains_key(&output.index()) {
                return Err(error(format!(
                    "values of accessor {} were already scaled as spline tangents",
                    output.index()
                )));
            } else if target == AnimationTarget::Rotation && newly_packed {
                let values = &mut data[values_offset..values_offset + key_count * 4];
                postprocess_rotations(values, config, &mut renormalized);
            }

            tracks.push(AnimationTrack {
                target_object: channel.target().node().index() as u32,
                target,
                interpolation,
                key_count: key_count as u32,
                times_offset: times_offset * 4,
                values_offset: values_offset * 4,
            });
        }
    }

    if renormalized > 0 {
        log::warn!(
            "animation {}: {} rotation keys were renormalized",
            index,
            renormalized
        );
    }

    Ok(AnimationClip {
        name,
        data: bytemuck::cast_slice(&data).to_vec(),
        tracks,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    // Key times [0, 1, 2], three vec3 translations, three quaternions of
    // which the second points the long way round and the third is
    // unnormalized.
    const ANIM: &str = "AAAAAAAAgD8AAABAAAAAAAAAAAAAAAAAAACAPwAAAEAAAEBAAACAQAAAoEAAAMBAAAAAAAAAAAAAAAAAAACAPwAAAAAAAAAAAAAAAAAAgL8AAAAAAAAAAAAAAAAAAABA";

    fn animation_doc(merged: bool) -> String {
        let animations = if merged {
            r#"[{"samplers":[{"input":0,"output":1,"interpolation":"LINEAR"}],
                "channels":[{"sampler":0,"target":{"node":0,"path":"translation"}}]},
               {"samplers":[{"input":0,"output":2,"interpolation":"LINEAR"}],
                "channels":[{"sampler":0,"target":{"node":1,"path":"rotation"}}]}]"#
                .to_string()
        } else {
            r#"[{"name":"move",
                "samplers":[
                    {"input":0,"output":1,"interpolation":"LINEAR"},
                    {"input":0,"output":2,"interpolation":"LINEAR"}],
                "channels":[
                    {"sampler":0,"target":{"node":0,"path":"translation"}},
                    {"sampler":1,"target":{"node":1,"path":"rotation"}}]}]"#
                .to_string()
        };
        format!(
            r#"{{"asset":{{"version":"2.0"}},
            "buffers":[{{"byteLength":96,"uri":"data:application/octet-stream;base64,{ANIM}"}}],
            "bufferViews":[
                {{"buffer":0,"byteOffset":0,"byteLength":12}},
                {{"buffer":0,"byteOffset":12,"byteLength":36}},
                {{"buffer":0,"byteOffset":48,"byteLength":48}}],
            "accessors":[
                {{"bufferView":0,"componentType":5126,"count":3,"type":"SCALAR"}},
                {{"bufferView":1,"componentType":5126,"count":3,"type":"VEC3"}},
                {{"bufferView":2,"componentType":5126,"count":3,"type":"VEC4"}}],
            "nodes":[{{}},{{}}],
            "animations":{animations}}}"#
        )
    }

    fn translate_doc(doc: &str, index: usize, config: &GltfConfig) -> Result<AnimationClip, GltfImportError> {
        let gltf = gltf_dep::Gltf::from_slice(doc.as_bytes()).unwrap();
        let mut buffers = BufferStore::new(1);
        let mut loader = None;
        translate(&gltf.document, &mut buffers, None, &mut loader, index, config)
    }

    #[test]
    fn shared_times_are_packed_once() {
        let clip = translate_doc(&animation_doc(false), 0, &GltfConfig::default()).unwrap();
        assert_eq!(clip.name.as_deref(), Some("move"));
        assert_eq!(clip.tracks.len(), 2);
        assert_eq!(clip.tracks[0].times_offset, clip.tracks[1].times_offset);
        assert_eq!(clip.times(&clip.tracks[0]), &[0.0, 1.0, 2.0]);
        assert_eq!(
            clip.values_vec3(&clip.tracks[0]),
            &[[0.0, 0.0, 0.0], [1.0, 2.0, 3.0], [4.0, 5.0, 6.0]]
        );
    }

    #[test]
    fn rotations_are_flipped_and_renormalized() {
        let clip = translate_doc(&animation_doc(false), 0, &GltfConfig::default()).unwrap();
        let rotation = &clip.tracks[1];
        assert_eq!(rotation.target, AnimationTarget::Rotation);
        let values = clip.values_vec4(rotation);
        // The second key had a negative dot with the first and was
        // flipped; the third had norm 2 and was renormalized.
        assert_eq!(values[1], [0.0, 0.0, 0.0, 1.0]);
        assert_eq!(values[2], [0.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn rotations_kept_verbatim_when_disabled() {
        let config = GltfConfig::default()
            .with_optimize_quaternion_shortest_path(false)
            .with_normalize_quaternions(false);
        let clip = translate_doc(&animation_doc(false), 0, &config).unwrap();
        let values = clip.values_vec4(&clip.tracks[1]);
        assert_eq!(values[1], [0.0, 0.0, 0.0, -1.0]);
        assert_eq!(values[2], [0.0, 0.0, 0.0, 2.0]);
    }

    #[test]
    fn merged_clips_form_one_unnamed_clip() {
        let config = GltfConfig::default().with_merge_animation_clips(true);
        let clip = translate_doc(&animation_doc(true), 0, &config).unwrap();
        assert_eq!(clip.name, None);
        assert_eq!(clip.tracks.len(), 2);
        // Accessor deduplication spans source animations.
        assert_eq!(clip.tracks[0].times_offset, clip.tracks[1].times_offset);
        assert!(translate_doc(&animation_doc(true), 1, &config).is_err());
    }

    #[test]
    fn spline_tangents_are_scaled_by_time_delta() {
        // Two keys at t = 0 and 2; one vec3 spline value pair.
        let doc = r#"{"asset":{"version":"2.0"},
            "buffers":[{"byteLength":80,"uri":"data:application/octet-stream;base64,AAAAAAAAAEAAAIA/AACAPwAAgD8AAIA/AACAPwAAgD8AAIA/AACAPwAAgD8AAIA/AACAPwAAgD8AAIA/AACAPwAAgD8AAIA/AACAPwAAgD8="}],
            "bufferViews":[
                {"buffer":0,"byteOffset":0,"byteLength":8},
                {"buffer":0,"byteOffset":8,"byteLength":72}],
            "accessors":[
                {"bufferView":0,"componentType":5126,"count":2,"type":"SCALAR"},
                {"bufferView":1,"componentType":5126,"count":6,"type":"VEC3"}],
            "nodes":[{}],
            "animations":[{"samplers":[{"input":0,"output":1,"interpolation":"CUBICSPLINE"}],
                "channels":[{"sampler":0,"target":{"node":0,"path":"translation"}}]}]}"#;
        let clip = translate_doc(doc, 0, &GltfConfig::default()).unwrap();
        let values = clip.values_vec3(&clip.tracks[0]);
        // dt = 2: out-tangent of key 0 and in-tangent of key 1 scaled.
        assert_eq!(values[0], [1.0, 1.0, 1.0]); // in-tangent, key 0
        assert_eq!(values[1], [1.0, 1.0, 1.0]); // value, key 0
        assert_eq!(values[2], [2.0, 2.0, 2.0]); // out-tangent, key 0
        assert_eq!(values[3], [2.0, 2.0, 2.0]); // in-tangent, key 1
        assert_eq!(values[4], [1.0, 1.0, 1.0]); // value, key 1
        assert_eq!(values[5], [1.0, 1.0, 1.0]); // out-tangent, key 1
    }

    // A spline track and a linear track both reading value accessor 1.
    // Accessor 2 overlays part of the value range to serve as the linear
    // track's six key times.
    fn shared_output_doc(channels: &str) -> String {
        format!(
            r#"{{"asset":{{"version":"2.0"}},
            "buffers":[{{"byteLength":80,"uri":"data:application/octet-stream;base64,AAAAAAAAAEAAAIA/AACAPwAAgD8AAIA/AACAPwAAgD8AAIA/AACAPwAAgD8AAIA/AACAPwAAgD8AAIA/AACAPwAAgD8AAIA/AACAPwAAgD8="}}],
            "bufferViews":[
                {{"buffer":0,"byteOffset":0,"byteLength":8}},
                {{"buffer":0,"byteOffset":8,"byteLength":72}},
                {{"buffer":0,"byteOffset":8,"byteLength":24}}],
            "accessors":[
                {{"bufferView":0,"componentType":5126,"count":2,"type":"SCALAR"}},
                {{"bufferView":1,"componentType":5126,"count":6,"type":"VEC3"}},
                {{"bufferView":2,"componentType":5126,"count":6,"type":"SCALAR"}}],
            "nodes":[{{}},{{}}],
            "animations":[{{"samplers":[
                    {{"input":2,"output":1,"interpolation":"LINEAR"}},
                    {{"input":0,"output":1,"interpolation":"CUBICSPLINE"}}],
                "channels":{channels}}}]}}"#
        )
    }

    #[test]
    fn spline_values_shared_with_linear_track_are_refused() {
        // Linear first: the spline track must not scale the range the
        // linear track already aliases.
        let doc = shared_output_doc(
            r#"[{"sampler":0,"target":{"node":0,"path":"translation"}},
                {"sampler":1,"target":{"node":1,"path":"translation"}}]"#,
        );
        let error = translate_doc(&doc, 0, &GltfConfig::default()).unwrap_err();
        assert!(error.to_string().contains("non-spline track"));

        // Spline first: the linear track would read scaled tangents.
        let doc = shared_output_doc(
            r#"[{"sampler":1,"target":{"node":1,"path":"translation"}},
                {"sampler":0,"target":{"node":0,"path":"translation"}}]"#,
        );
        let error = translate_doc(&doc, 0, &GltfConfig::default()).unwrap_err();
        assert!(error.to_string().contains("spline tangents"));
    }
}
