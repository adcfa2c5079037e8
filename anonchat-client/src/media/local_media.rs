use crate::media::track::{MediaTrack, TrackKind};
use uuid::Uuid;

/// Camera/microphone tracks acquired once and reused across matches.
#[derive(Debug, Clone)]
pub struct LocalMedia {
    stream_id: String,
    tracks: Vec<MediaTrack>,
}

impl LocalMedia {
    pub fn new(tracks: Vec<MediaTrack>) -> Self {
        Self {
            stream_id: format!("local-{}", Uuid::new_v4()),
            tracks,
        }
    }

    pub fn stream_id(&self) -> &str {
        &self.stream_id
    }

    pub fn tracks(&self) -> &[MediaTrack] {
        &self.tracks
    }

    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }

    pub fn audio_tracks(&self) -> impl Iterator<Item = &MediaTrack> {
        self.tracks_of(TrackKind::Audio)
    }

    pub fn video_tracks(&self) -> impl Iterator<Item = &MediaTrack> {
        self.tracks_of(TrackKind::Video)
    }

    pub fn is_muted(&self) -> bool {
        self.all_disabled(TrackKind::Audio)
    }

    pub fn is_video_off(&self) -> bool {
        self.all_disabled(TrackKind::Video)
    }

    /// Flip every audio track's enabled flag. Returns whether audio is now muted.
    pub fn toggle_audio(&self) -> bool {
        self.toggle(TrackKind::Audio)
    }

    /// Flip every video track's enabled flag. Returns whether video is now off.
    pub fn toggle_video(&self) -> bool {
        self.toggle(TrackKind::Video)
    }

    /// Stop sending on every track. Used when the media is released for good.
    pub fn stop(&self) {
        for track in &self.tracks {
            track.set_enabled(false);
        }
    }

    fn tracks_of(&self, kind: TrackKind) -> impl Iterator<Item = &MediaTrack> {
        self.tracks.iter().filter(move |track| track.kind() == kind)
    }

    fn all_disabled(&self, kind: TrackKind) -> bool {
        let mut tracks = self.tracks_of(kind).peekable();
        tracks.peek().is_some() && tracks.all(|track| !track.is_enabled())
    }

    fn toggle(&self, kind: TrackKind) -> bool {
        let now_disabled = !self.all_disabled(kind);
        for track in self.tracks_of(kind) {
            track.set_enabled(!now_disabled);
        }
        now_disabled && self.tracks_of(kind).next().is_some()
    }
}
