use crate::media::track::TrackKind;
use std::sync::Arc;

/// Handle to a track the partner is sending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteTrack {
    pub id: String,
    pub stream_id: String,
    pub kind: TrackKind,
}

/// Immutable view of the partner's media for one match.
///
/// Adding a track yields a new value; values already handed to the
/// presentation layer never change. Each match gets a new `generation`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteStream {
    generation: u64,
    tracks: Arc<[RemoteTrack]>,
}

impl RemoteStream {
    pub fn empty(generation: u64) -> Self {
        Self {
            generation,
            tracks: Arc::from(Vec::new()),
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn tracks(&self) -> &[RemoteTrack] {
        &self.tracks
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// New stream value with `track` appended. Tracks already present are not
    /// duplicated.
    pub fn with_track(&self, track: RemoteTrack) -> Self {
        if self.tracks.iter().any(|t| t.id == track.id) {
            return self.clone();
        }
        let mut tracks = self.tracks.to_vec();
        tracks.push(track);
        Self {
            generation: self.generation,
            tracks: Arc::from(tracks),
        }
    }
}

impl Default for RemoteStream {
    fn default() -> Self {
        Self::empty(0)
    }
}
