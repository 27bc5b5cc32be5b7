//! # Audio Track Resolver
//!
//! Enumerates and selects audio tracks from an engine's track mapping.
//!
//! ## Canonical order
//!
//! Tracks are walked renderer by renderer, then group by group, then track by
//! track. Only audio renderers are visited and only tracks the device can
//! actually play ([`TrackSupport::Handled`]) are counted. The position of a
//! track in that walk is its index for both listing and index-based selection.
//!
//! ## Single untagged track
//!
//! When the walk yields exactly one track and it carries no language tag,
//! [`list_audio_tracks`] reports no tracks at all. Other platforms behave the
//! same way and hosts rely on the parity. The track still plays and can still
//! be selected by index 0.

use bridge_traits::{
    MappedTrackInfo, TrackSelectionOverride, TrackSelectionParameters, TrackType,
};
use serde::{Deserialize, Serialize};

/// Language tag reported for tracks that declare none.
pub const UNDETERMINED_LANGUAGE: &str = "und";

/// A playable audio track as reported to the host.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioTrack {
    /// Position in canonical order. Only valid for the current track mapping.
    pub index: usize,
    pub language: String,
}

impl AudioTrack {
    pub fn new(index: usize, language: impl Into<String>) -> Self {
        Self {
            index,
            language: language.into(),
        }
    }
}

#[derive(Debug, Clone)]
struct SupportedTrack {
    selection: TrackSelectionOverride,
    language: String,
}

fn supported_audio_tracks(info: &MappedTrackInfo) -> Vec<SupportedTrack> {
    let mut tracks = Vec::new();

    for (renderer_index, renderer) in info.renderers.iter().enumerate() {
        if renderer.renderer_type != TrackType::Audio {
            continue;
        }

        for (group_index, group) in renderer.groups.iter().enumerate() {
            for (track_index, track) in group.tracks.iter().enumerate() {
                if !track.support.is_handled() {
                    continue;
                }

                tracks.push(SupportedTrack {
                    selection: TrackSelectionOverride::new(renderer_index, group_index, track_index),
                    language: normalize_language(track.format.language.as_deref()),
                });
            }
        }
    }

    tracks
}

fn normalize_language(language: Option<&str>) -> String {
    match language {
        Some(tag) if !tag.is_empty() => tag.to_string(),
        _ => UNDETERMINED_LANGUAGE.to_string(),
    }
}

/// Lists supported audio tracks in canonical order.
pub fn list_audio_tracks(info: &MappedTrackInfo) -> Vec<AudioTrack> {
    let tracks: Vec<AudioTrack> = supported_audio_tracks(info)
        .into_iter()
        .enumerate()
        .map(|(index, track)| AudioTrack::new(index, track.language))
        .collect();

    if tracks.len() == 1 && tracks[0].language == UNDETERMINED_LANGUAGE {
        return Vec::new();
    }

    tracks
}

/// First supported audio track whose language equals `language`.
pub fn find_by_language(info: &MappedTrackInfo, language: &str) -> Option<TrackSelectionOverride> {
    supported_audio_tracks(info)
        .into_iter()
        .find(|track| track.language == language)
        .map(|track| track.selection)
}

/// Supported audio track at canonical position `index`.
pub fn find_by_index(info: &MappedTrackInfo, index: usize) -> Option<TrackSelectionOverride> {
    supported_audio_tracks(info)
        .into_iter()
        .nth(index)
        .map(|track| track.selection)
}

/// New parameters pinning `selection` as the only audio track.
///
/// Overrides on every audio renderer in `info` are cleared, as well as on the
/// selection's own renderer, so at most one audio override survives. The
/// renderer is re-enabled in case something disabled it earlier.
pub fn apply_override(
    parameters: &TrackSelectionParameters,
    info: Option<&MappedTrackInfo>,
    selection: TrackSelectionOverride,
) -> TrackSelectionParameters {
    let audio_renderers = info.into_iter().flat_map(|info| {
        info.renderers
            .iter()
            .enumerate()
            .filter(|(_, renderer)| renderer.renderer_type == TrackType::Audio)
            .map(|(index, _)| index)
    });

    audio_renderers
        .fold(parameters.build_upon(), |builder, index| {
            builder.clear_overrides_on_renderer(index)
        })
        .clear_overrides_on_renderer(selection.renderer_index)
        .renderer_disabled(selection.renderer_index, false)
        .add_override(selection)
        .build()
}

/// The audio override currently installed in `parameters`, if any.
///
/// Without a mapping the renderer type cannot be checked; the session only
/// ever installs audio overrides, so the first override is taken.
pub fn audio_override(
    parameters: &TrackSelectionParameters,
    info: Option<&MappedTrackInfo>,
) -> Option<TrackSelectionOverride> {
    match info {
        Some(info) => parameters
            .overrides()
            .find(|o| info.renderer_type(o.renderer_index) == Some(TrackType::Audio))
            .copied(),
        None => parameters.overrides().next().copied(),
    }
}

/// Canonical index of the pinned audio track, if one is pinned and supported.
pub fn active_audio_track_index(
    parameters: &TrackSelectionParameters,
    info: &MappedTrackInfo,
) -> Option<usize> {
    supported_audio_tracks(info).iter().position(|track| {
        parameters.override_for_renderer(track.selection.renderer_index) == Some(&track.selection)
    })
}
