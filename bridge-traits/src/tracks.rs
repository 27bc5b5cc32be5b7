//! Track mapping and track-selection parameters.
//!
//! Engines expose what they found in the media as a [`MappedTrackInfo`]: one
//! entry per renderer, each holding the track groups mapped to it and a
//! per-track device-support verdict. Selection is expressed the other way
//! round, through an immutable [`TrackSelectionParameters`] value that callers
//! rebuild (via [`TrackSelectionParameters::build_upon`]) and hand back to the
//! engine as a whole.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Kind of media a renderer consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TrackType {
    Audio,
    Video,
    Text,
    Other,
}

/// How well the device can play a given track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TrackSupport {
    /// The device can decode and render the track.
    Handled,
    /// Known format, but beyond the device's capabilities (e.g. too many channels).
    ExceedsCapabilities,
    /// Known type, unsupported subtype/codec.
    UnsupportedSubtype,
    /// The renderer cannot handle this type of track at all.
    UnsupportedType,
}

impl TrackSupport {
    /// Returns `true` if the track is actually playable on this device.
    pub fn is_handled(self) -> bool {
        self == TrackSupport::Handled
    }
}

/// Declared properties of a single track.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackFormat {
    /// Container-level track id, when present.
    pub id: Option<String>,
    /// Declared language (BCP-47 / ISO 639-2), when present.
    pub language: Option<String>,
    /// Human readable label, when present.
    pub label: Option<String>,
}

impl TrackFormat {
    /// Format with a declared language.
    pub fn with_language(language: impl Into<String>) -> Self {
        Self {
            language: Some(language.into()),
            ..Self::default()
        }
    }

    /// Format without any language information.
    pub fn untagged() -> Self {
        Self::default()
    }
}

/// A track together with its support verdict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappedTrack {
    pub format: TrackFormat,
    pub support: TrackSupport,
}

impl MappedTrack {
    pub fn new(format: TrackFormat, support: TrackSupport) -> Self {
        Self { format, support }
    }
}

/// Group of tracks that are alternatives of each other (e.g. bitrate ladder).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappedTrackGroup {
    pub tracks: Vec<MappedTrack>,
}

impl MappedTrackGroup {
    pub fn new(tracks: Vec<MappedTrack>) -> Self {
        Self { tracks }
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }
}

/// Track groups mapped to one renderer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappedRenderer {
    pub renderer_type: TrackType,
    pub groups: Vec<MappedTrackGroup>,
}

impl MappedRenderer {
    pub fn new(renderer_type: TrackType, groups: Vec<MappedTrackGroup>) -> Self {
        Self {
            renderer_type,
            groups,
        }
    }
}

/// Engine-reported mapping of tracks onto renderers.
///
/// Only available once the engine has prepared the media; stable until the
/// media or the renderer set changes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappedTrackInfo {
    pub renderers: Vec<MappedRenderer>,
}

impl MappedTrackInfo {
    pub fn new(renderers: Vec<MappedRenderer>) -> Self {
        Self { renderers }
    }

    pub fn renderer_count(&self) -> usize {
        self.renderers.len()
    }

    pub fn renderer_type(&self, renderer_index: usize) -> Option<TrackType> {
        self.renderers.get(renderer_index).map(|r| r.renderer_type)
    }

    /// Look up a single track by its full coordinates.
    pub fn track(&self, selection: &TrackSelectionOverride) -> Option<&MappedTrack> {
        self.renderers
            .get(selection.renderer_index)?
            .groups
            .get(selection.group_index)?
            .tracks
            .get(selection.track_index)
    }
}

/// Pins one renderer to exactly one track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TrackSelectionOverride {
    pub renderer_index: usize,
    pub group_index: usize,
    pub track_index: usize,
}

impl TrackSelectionOverride {
    pub fn new(renderer_index: usize, group_index: usize, track_index: usize) -> Self {
        Self {
            renderer_index,
            group_index,
            track_index,
        }
    }
}

/// Immutable track-selection constraints applied to an engine.
///
/// There is no in-place mutation; every change goes through
/// [`build_upon`](Self::build_upon) and produces a fresh value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackSelectionParameters {
    preferred_audio_language: Option<String>,
    disabled_renderers: BTreeSet<usize>,
    overrides: BTreeMap<usize, TrackSelectionOverride>,
}

impl TrackSelectionParameters {
    /// Start from engine defaults.
    pub fn builder() -> TrackSelectionParametersBuilder {
        TrackSelectionParametersBuilder::default()
    }

    /// Start a builder pre-populated with these parameters.
    pub fn build_upon(&self) -> TrackSelectionParametersBuilder {
        TrackSelectionParametersBuilder {
            inner: self.clone(),
        }
    }

    pub fn preferred_audio_language(&self) -> Option<&str> {
        self.preferred_audio_language.as_deref()
    }

    pub fn is_renderer_disabled(&self, renderer_index: usize) -> bool {
        self.disabled_renderers.contains(&renderer_index)
    }

    pub fn override_for_renderer(&self, renderer_index: usize) -> Option<&TrackSelectionOverride> {
        self.overrides.get(&renderer_index)
    }

    /// All overrides ordered by renderer index.
    pub fn overrides(&self) -> impl Iterator<Item = &TrackSelectionOverride> {
        self.overrides.values()
    }
}

/// Builder for [`TrackSelectionParameters`].
#[derive(Debug, Clone, Default)]
pub struct TrackSelectionParametersBuilder {
    inner: TrackSelectionParameters,
}

impl TrackSelectionParametersBuilder {
    pub fn preferred_audio_language(mut self, language: Option<String>) -> Self {
        self.inner.preferred_audio_language = language;
        self
    }

    pub fn renderer_disabled(mut self, renderer_index: usize, disabled: bool) -> Self {
        if disabled {
            self.inner.disabled_renderers.insert(renderer_index);
        } else {
            self.inner.disabled_renderers.remove(&renderer_index);
        }
        self
    }

    pub fn clear_overrides_on_renderer(mut self, renderer_index: usize) -> Self {
        self.inner.overrides.remove(&renderer_index);
        self
    }

    /// Install an override, replacing any previous one on the same renderer.
    pub fn add_override(mut self, selection: TrackSelectionOverride) -> Self {
        self.inner
            .overrides
            .insert(selection.renderer_index, selection);
        self
    }

    pub fn build(self) -> TrackSelectionParameters {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_upon_leaves_original_untouched() {
        let original = TrackSelectionParameters::builder()
            .preferred_audio_language(Some("en".to_string()))
            .build();

        let updated = original
            .build_upon()
            .add_override(TrackSelectionOverride::new(1, 0, 2))
            .build();

        assert!(original.override_for_renderer(1).is_none());
        assert_eq!(
            updated.override_for_renderer(1),
            Some(&TrackSelectionOverride::new(1, 0, 2))
        );
        assert_eq!(updated.preferred_audio_language(), Some("en"));
    }

    #[test]
    fn add_override_replaces_previous_on_same_renderer() {
        let params = TrackSelectionParameters::builder()
            .add_override(TrackSelectionOverride::new(1, 0, 0))
            .add_override(TrackSelectionOverride::new(1, 2, 1))
            .build();

        assert_eq!(params.overrides().count(), 1);
        assert_eq!(
            params.override_for_renderer(1),
            Some(&TrackSelectionOverride::new(1, 2, 1))
        );
    }

    #[test]
    fn renderer_disable_toggle() {
        let params = TrackSelectionParameters::builder()
            .renderer_disabled(3, true)
            .build();
        assert!(params.is_renderer_disabled(3));

        let params = params.build_upon().renderer_disabled(3, false).build();
        assert!(!params.is_renderer_disabled(3));
    }

    #[test]
    fn mapped_track_lookup() {
        let info = MappedTrackInfo::new(vec![
            MappedRenderer::new(TrackType::Video, vec![]),
            MappedRenderer::new(
                TrackType::Audio,
                vec![MappedTrackGroup::new(vec![MappedTrack::new(
                    TrackFormat::with_language("fr"),
                    TrackSupport::Handled,
                )])],
            ),
        ]);

        let track = info.track(&TrackSelectionOverride::new(1, 0, 0)).unwrap();
        assert_eq!(track.format.language.as_deref(), Some("fr"));
        assert!(info.track(&TrackSelectionOverride::new(1, 1, 0)).is_none());
        assert_eq!(info.renderer_type(0), Some(TrackType::Video));
        assert_eq!(info.renderer_count(), 2);
    }
}
