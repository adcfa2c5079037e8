use crate::error::MediaError;
use crate::media::local_media::LocalMedia;
use crate::media::track::{MediaTrack, TrackKind};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tracing::info;

/// Grants access to camera and microphone.
#[async_trait]
pub trait MediaSource: Send + Sync + 'static {
    async fn acquire(&self, audio: bool, video: bool) -> Result<LocalMedia, MediaError>;
}

/// Device-less source producing tracks that carry no samples. Useful for
/// headless clients and tests; can be told to refuse permission.
#[derive(Debug, Default)]
pub struct SyntheticMediaSource {
    deny: AtomicBool,
    acquisitions: AtomicUsize,
}

impl SyntheticMediaSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// A source whose permission prompt is always refused.
    pub fn denying() -> Self {
        let source = Self::new();
        source.set_denied(true);
        source
    }

    pub fn set_denied(&self, denied: bool) {
        self.deny.store(denied, Ordering::SeqCst);
    }

    /// How many times media was successfully handed out.
    pub fn acquisitions(&self) -> usize {
        self.acquisitions.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MediaSource for SyntheticMediaSource {
    async fn acquire(&self, audio: bool, video: bool) -> Result<LocalMedia, MediaError> {
        if self.deny.load(Ordering::SeqCst) {
            return Err(MediaError::PermissionDenied(
                "camera and microphone".to_owned(),
            ));
        }
        if !audio && !video {
            return Err(MediaError::DeviceUnavailable("media".to_owned()));
        }

        let mut tracks = Vec::new();
        if audio {
            tracks.push(MediaTrack::new(TrackKind::Audio));
        }
        if video {
            tracks.push(MediaTrack::new(TrackKind::Video));
        }

        self.acquisitions.fetch_add(1, Ordering::SeqCst);
        info!("Acquired {} synthetic track(s)", tracks.len());
        Ok(LocalMedia::new(tracks))
    }
}
