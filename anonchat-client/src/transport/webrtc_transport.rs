use crate::config::SessionConfig;
use crate::media::{LocalMedia, MediaTrack, RemoteTrack, TrackKind};
use crate::transport::peer_transport::{PeerTransport, TransportFactory};
use crate::transport::transport_event::{LinkState, TransportEvent};
use anonchat_core::{IceCandidate, SdpType, SessionDescription};
use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use webrtc::api::APIBuilder;
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::{MIME_TYPE_OPUS, MIME_TYPE_VP8, MediaEngine};
use webrtc::data_channel::RTCDataChannel;
use webrtc::data_channel::data_channel_message::DataChannelMessage;
use webrtc::data_channel::data_channel_state::RTCDataChannelState;
use webrtc::ice_transport::ice_candidate::{RTCIceCandidate, RTCIceCandidateInit};
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::interceptor::registry::Registry;
use webrtc::media::Sample;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::sdp::sdp_type::RTCSdpType;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::rtp_transceiver::rtp_codec::{RTCRtpCodecCapability, RTPCodecType};
use webrtc::track::track_local::TrackLocal;
use webrtc::track::track_local::track_local_static_sample::TrackLocalStaticSample;

pub const CHAT_CHANNEL_LABEL: &str = "chat";

const OPUS_SILENCE: &[u8] = &[0xf8, 0xff, 0xfe];
const BLANK_VIDEO_FRAME: &[u8] = &[0x10, 0x02, 0x00, 0x9d, 0x01, 0x2a];

type ChatSlot = Arc<Mutex<Option<Arc<RTCDataChannel>>>>;

/// [`PeerTransport`] over a real WebRTC peer connection.
pub struct WebRtcTransport {
    peer_connection: Arc<RTCPeerConnection>,
    events: mpsc::Sender<TransportEvent>,
    chat: ChatSlot,
    pumps: Mutex<Vec<JoinHandle<()>>>,
}

impl WebRtcTransport {
    /// Build a peer connection and route its callbacks into `event_tx`.
    pub async fn new(
        config: &SessionConfig,
        event_tx: mpsc::Sender<TransportEvent>,
    ) -> Result<Self> {
        let mut m = MediaEngine::default();
        m.register_default_codecs()?;
        let registry = register_default_interceptors(Registry::new(), &mut m)?;

        let api = APIBuilder::new()
            .with_media_engine(m)
            .with_interceptor_registry(registry)
            .build();

        let rtc_config = RTCConfiguration {
            ice_servers: config
                .ice_servers
                .iter()
                .map(|server| RTCIceServer {
                    urls: server.urls.clone(),
                    username: server.username.clone().unwrap_or_default(),
                    credential: server.credential.clone().unwrap_or_default(),
                })
                .collect(),
            ..Default::default()
        };

        let peer_connection = Arc::new(api.new_peer_connection(rtc_config).await?);
        let chat: ChatSlot = Arc::new(Mutex::new(None));

        let state_tx = event_tx.clone();
        peer_connection.on_peer_connection_state_change(Box::new(
            move |s: RTCPeerConnectionState| {
                let tx = state_tx.clone();

                Box::pin(async move {
                    info!("Peer connection state changed: {}", s);
                    let state = match s {
                        RTCPeerConnectionState::New | RTCPeerConnectionState::Connecting => {
                            LinkState::Connecting
                        }
                        RTCPeerConnectionState::Connected => LinkState::Connected,
                        RTCPeerConnectionState::Disconnected => LinkState::Disconnected,
                        RTCPeerConnectionState::Failed => LinkState::Failed,
                        RTCPeerConnectionState::Closed => LinkState::Closed,
                        RTCPeerConnectionState::Unspecified => return,
                    };
                    let _ = tx.send(TransportEvent::StateChanged(state)).await;
                })
            },
        ));

        let ice_tx = event_tx.clone();
        peer_connection.on_ice_candidate(Box::new(move |c: Option<RTCIceCandidate>| {
            let tx = ice_tx.clone();

            Box::pin(async move {
                let Some(candidate) = c else { return };
                let init = match candidate.to_json() {
                    Ok(init) => init,
                    Err(e) => {
                        warn!("Could not serialize local candidate: {}", e);
                        return;
                    }
                };
                let _ = tx
                    .send(TransportEvent::CandidateGenerated(IceCandidate {
                        candidate: init.candidate,
                        sdp_mid: init.sdp_mid,
                        sdp_m_line_index: init.sdp_mline_index,
                        username_fragment: init.username_fragment,
                    }))
                    .await;
            })
        }));

        let track_tx = event_tx.clone();
        peer_connection.on_track(Box::new(move |track, _receiver, _transceiver| {
            let tx = track_tx.clone();

            Box::pin(async move {
                let kind = match track.kind() {
                    RTPCodecType::Audio => TrackKind::Audio,
                    RTPCodecType::Video => TrackKind::Video,
                    RTPCodecType::Unspecified => return,
                };
                let remote = RemoteTrack {
                    id: track.id(),
                    stream_id: track.stream_id(),
                    kind,
                };
                info!("Remote {} track {} arrived", kind, remote.id);
                let _ = tx.send(TransportEvent::TrackAdded(remote)).await;

                // Keep the receiver draining so the interceptors stay fed.
                tokio::spawn(async move { while track.read_rtp().await.is_ok() {} });
            })
        }));

        let dc_tx = event_tx.clone();
        let dc_slot = chat.clone();
        peer_connection.on_data_channel(Box::new(move |dc: Arc<RTCDataChannel>| {
            let tx = dc_tx.clone();
            let slot = dc_slot.clone();

            Box::pin(async move {
                if dc.label() != CHAT_CHANNEL_LABEL {
                    debug!("Ignoring data channel '{}'", dc.label());
                    return;
                }
                wire_chat_channel(&dc, tx);
                *slot.lock().await = Some(dc);
            })
        }));

        Ok(Self {
            peer_connection,
            events: event_tx,
            chat,
            pumps: Mutex::new(Vec::new()),
        })
    }

    async fn install_local(
        &self,
        description: RTCSessionDescription,
    ) -> Result<SessionDescription> {
        self.peer_connection
            .set_local_description(description.clone())
            .await?;
        Ok(match description.sdp_type {
            RTCSdpType::Offer => {
                SessionDescription::offer(description.sdp)
            }
            _ => SessionDescription::answer(description.sdp),
        })
    }
}

fn wire_chat_channel(dc: &Arc<RTCDataChannel>, tx: mpsc::Sender<TransportEvent>) {
    let label = dc.label().to_owned();
    dc.on_open(Box::new(move || {
        Box::pin(async move {
            info!("Data channel '{}' open", label);
        })
    }));

    dc.on_message(Box::new(move |msg: DataChannelMessage| {
        let tx = tx.clone();
        Box::pin(async move {
            match String::from_utf8(msg.data.to_vec()) {
                Ok(text) => {
                    let _ = tx.send(TransportEvent::TextReceived(text)).await;
                }
                Err(_) => warn!("Dropping non-UTF-8 chat message"),
            }
        })
    }));
}

fn codec_for(kind: TrackKind) -> (RTCRtpCodecCapability, Bytes, Duration) {
    match kind {
        TrackKind::Audio => (
            RTCRtpCodecCapability {
                mime_type: MIME_TYPE_OPUS.to_owned(),
                clock_rate: 48000,
                channels: 2,
                ..Default::default()
            },
            Bytes::from_static(OPUS_SILENCE),
            Duration::from_millis(20),
        ),
        TrackKind::Video => (
            RTCRtpCodecCapability {
                mime_type: MIME_TYPE_VP8.to_owned(),
                clock_rate: 90000,
                ..Default::default()
            },
            Bytes::from_static(BLANK_VIDEO_FRAME),
            Duration::from_millis(33),
        ),
    }
}

/// Feed placeholder frames into `local` for as long as `track` is enabled.
fn spawn_sample_pump(local: Arc<TrackLocalStaticSample>, track: MediaTrack) -> JoinHandle<()> {
    let (_, frame, duration) = codec_for(track.kind());

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(duration);
        loop {
            ticker.tick().await;
            if !track.is_enabled() {
                continue;
            }
            let sample = Sample {
                data: frame.clone(),
                duration,
                ..Default::default()
            };
            if let Err(e) = local.write_sample(&sample).await {
                debug!("Sample pump for {} stopped: {}", track.id(), e);
                break;
            }
        }
    })
}

#[async_trait]
impl PeerTransport for WebRtcTransport {
    async fn add_local_media(&self, media: &LocalMedia) -> Result<()> {
        let mut pumps = self.pumps.lock().await;

        for track in media.tracks() {
            let (codec, _, _) = codec_for(track.kind());
            let local = Arc::new(TrackLocalStaticSample::new(
                codec,
                track.id().to_owned(),
                media.stream_id().to_owned(),
            ));

            let sender = self
                .peer_connection
                .add_track(Arc::clone(&local) as Arc<dyn TrackLocal + Send + Sync>)
                .await
                .with_context(|| format!("add_track({}) failed", track.kind()))?;

            // RTCP has to be read for the interceptors to work.
            tokio::spawn(async move {
                let mut rtcp_buf = vec![0u8; 1500];
                while sender.read(&mut rtcp_buf).await.is_ok() {}
            });

            pumps.push(spawn_sample_pump(local, track.clone()));
        }

        debug!("Attached {} local track(s)", media.track_count());
        Ok(())
    }

    async fn create_offer(&self) -> Result<SessionDescription> {
        let dc = self
            .peer_connection
            .create_data_channel(CHAT_CHANNEL_LABEL, None)
            .await?;
        wire_chat_channel(&dc, self.events.clone());
        *self.chat.lock().await = Some(dc);

        let offer = self.peer_connection.create_offer(None).await?;
        self.install_local(offer).await
    }

    async fn create_answer(&self) -> Result<SessionDescription> {
        let answer = self.peer_connection.create_answer(None).await?;
        self.install_local(answer).await
    }

    async fn set_remote_description(&self, description: SessionDescription) -> Result<()> {
        let desc = match description.sdp_type {
            SdpType::Offer => RTCSessionDescription::offer(description.sdp)?,
            SdpType::Answer => RTCSessionDescription::answer(description.sdp)?,
        };
        self.peer_connection.set_remote_description(desc).await?;
        Ok(())
    }

    async fn has_remote_description(&self) -> bool {
        self.peer_connection.remote_description().await.is_some()
    }

    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<()> {
        let init = RTCIceCandidateInit {
            candidate: candidate.candidate,
            sdp_mid: candidate.sdp_mid,
            sdp_mline_index: candidate.sdp_m_line_index,
            username_fragment: candidate.username_fragment,
        };
        self.peer_connection
            .add_ice_candidate(init)
            .await
            .context("Failed to add remote ICE candidate")?;
        Ok(())
    }

    async fn send_text(&self, text: &str) -> Result<()> {
        let chat = self.chat.lock().await;
        let dc = chat
            .as_ref()
            .filter(|dc| dc.ready_state() == RTCDataChannelState::Open)
            .ok_or_else(|| anyhow!("chat channel is not open"))?;
        dc.send_text(text.to_owned()).await?;
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        for pump in self.pumps.lock().await.drain(..) {
            pump.abort();
        }
        self.chat.lock().await.take();
        self.peer_connection.close().await?;
        Ok(())
    }
}

/// Produces a [`WebRtcTransport`] per match.
#[derive(Debug, Clone, Copy, Default)]
pub struct WebRtcTransportFactory;

#[async_trait]
impl TransportFactory for WebRtcTransportFactory {
    async fn create(
        &self,
        config: &SessionConfig,
        events: mpsc::Sender<TransportEvent>,
    ) -> Result<Box<dyn PeerTransport>> {
        Ok(Box::new(WebRtcTransport::new(config, events).await?))
    }
}
