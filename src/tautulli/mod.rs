mod client;
pub(crate) mod de;

pub use client::TautulliClient;

use serde::Deserialize;
use std::str::FromStr;

use crate::error::{FetchError, FormatError};
use de::{deserialize_f64, deserialize_flag, deserialize_text, deserialize_u64};

/// Number of history entries requested and shown
pub const HISTORY_LENGTH: usize = 5;

/// Height in pixels of proxied thumbnails
pub const THUMB_HEIGHT: u32 = 70;

/// The four Tautulli commands this plugin uses.
///
/// Implemented over HTTP by [`TautulliClient`]; tests substitute fixed payloads.
#[allow(async_fn_in_trait)]
pub trait TautulliApi {
    /// `get_activity`: live sessions and aggregate bandwidth
    async fn activity(&self) -> Result<ActivitySnapshot, FetchError>;
    /// `get_history`: the most recent completed sessions
    async fn history(&self) -> Result<Vec<HistoryEntry>, FetchError>;
    /// `get_geoip_lookup` for a remote client address
    async fn geoip_lookup(&self, ip_address: &str) -> Result<GeoInfo, FetchError>;
    /// `pms_image_proxy`: raw image bytes for a Plex thumbnail path
    async fn image_proxy(&self, thumb: &str) -> Result<Vec<u8>, FetchError>;
}

/// `{"response": {"data": ...}}`
#[derive(Debug, Deserialize)]
pub(crate) struct Envelope<T> {
    pub response: EnvelopeBody<T>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct EnvelopeBody<T> {
    pub data: T,
}

/// Point-in-time server state from `get_activity`
#[derive(Debug, Clone, Deserialize)]
pub struct ActivitySnapshot {
    #[serde(deserialize_with = "deserialize_u64")]
    pub stream_count: u64,
    /// kbps
    #[serde(default, deserialize_with = "deserialize_u64")]
    pub lan_bandwidth: u64,
    /// kbps
    #[serde(default, deserialize_with = "deserialize_u64")]
    pub wan_bandwidth: u64,
    pub sessions: Vec<Session>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Episode,
    Movie,
    Track,
    Photo,
    #[default]
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackState {
    Playing,
    Paused,
    /// Buffering and anything newer servers report
    #[default]
    #[serde(other)]
    Other,
}

/// How a stream reaches the client
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    DirectPlay,
    /// Remuxed without re-encoding
    Copy,
    Transcode,
}

impl Decision {
    pub fn label(self) -> &'static str {
        match self {
            Decision::DirectPlay => "Direct Play",
            Decision::Copy => "Direct Stream",
            Decision::Transcode => "Transcode",
        }
    }
}

impl FromStr for Decision {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "direct play" => Ok(Decision::DirectPlay),
            "copy" => Ok(Decision::Copy),
            "transcode" => Ok(Decision::Transcode),
            other => Err(FormatError::UnknownDecision(other.to_string())),
        }
    }
}

/// One active playback.
///
/// Type-specific fields (`grandparent_title`, `year`, ...) are only meaningful
/// for the matching `media_type`; the rest arrive empty.
#[derive(Debug, Clone, Deserialize)]
pub struct Session {
    pub media_type: MediaType,
    pub username: String,
    #[serde(default)]
    pub state: PlaybackState,
    pub full_title: String,
    #[serde(deserialize_with = "deserialize_text")]
    pub rating_key: String,

    /// Episode name or track name
    #[serde(default, deserialize_with = "deserialize_text")]
    pub title: String,
    /// Show (episode) or artist (track)
    #[serde(default, deserialize_with = "deserialize_text")]
    pub grandparent_title: String,
    /// Album (track)
    #[serde(default, deserialize_with = "deserialize_text")]
    pub parent_title: String,
    /// Season number (episode)
    #[serde(default, deserialize_with = "deserialize_text")]
    pub parent_media_index: String,
    /// Episode number or track number
    #[serde(default, deserialize_with = "deserialize_text")]
    pub media_index: String,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub year: String,

    #[serde(default, deserialize_with = "deserialize_text")]
    pub video_codec: String,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub video_full_resolution: String,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub stream_video_codec: String,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub stream_video_full_resolution: String,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub stream_video_decision: String,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub stream_video_dynamic_range: String,
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub transcode_hw_decoding: bool,
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub transcode_hw_encoding: bool,

    #[serde(default, deserialize_with = "deserialize_text")]
    pub audio_codec: String,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub audio_channel_layout: String,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub stream_audio_codec: String,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub stream_audio_channel_layout: String,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub stream_audio_decision: String,

    /// `lan`, `wan` or `cellular`
    pub location: String,
    pub ip_address: String,
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub secure: bool,

    /// Milliseconds
    #[serde(default, deserialize_with = "deserialize_u64")]
    pub duration: u64,
    #[serde(default, deserialize_with = "deserialize_f64")]
    pub progress_percent: f64,

    #[serde(default, deserialize_with = "deserialize_text")]
    pub thumb: String,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub parent_thumb: String,

    #[serde(default, deserialize_with = "deserialize_text")]
    pub quality_profile: String,
    /// kbps
    #[serde(default, deserialize_with = "deserialize_u64")]
    pub stream_bitrate: u64,
    /// kbps, as reported for audio
    #[serde(default, deserialize_with = "deserialize_text")]
    pub bitrate: String,
}

impl Session {
    pub fn is_playing(&self) -> bool {
        self.state == PlaybackState::Playing
    }

    pub fn is_wan(&self) -> bool {
        self.location == "wan"
    }

    /// Poster to show next to the session: the season poster for episodes
    pub fn thumbnail(&self) -> Option<&str> {
        let thumb = match self.media_type {
            MediaType::Episode => &self.parent_thumb,
            _ => &self.thumb,
        };
        (!thumb.is_empty()).then_some(thumb.as_str())
    }

    pub fn video_decision(&self) -> Result<Decision, FormatError> {
        self.stream_video_decision.parse()
    }

    pub fn audio_decision(&self) -> Result<Decision, FormatError> {
        self.stream_audio_decision.parse()
    }
}

/// `get_history` wraps its rows in a second `data` object
#[derive(Debug, Deserialize)]
pub(crate) struct HistoryPage {
    pub data: Vec<HistoryEntry>,
}

/// A completed playback
#[derive(Debug, Clone, Deserialize)]
pub struct HistoryEntry {
    pub user: String,
    pub media_type: MediaType,
    pub full_title: String,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub grandparent_title: String,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub parent_media_index: String,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub media_index: String,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub title: String,
    /// Epoch seconds
    #[serde(deserialize_with = "deserialize_u64")]
    pub stopped: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct GeoInfo {
    #[serde(deserialize_with = "deserialize_text")]
    pub city: String,
    #[serde(deserialize_with = "deserialize_text")]
    pub region: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_activity_envelope() {
        let body = json!({
            "response": {
                "result": "success",
                "data": {
                    "stream_count": "2",
                    "lan_bandwidth": 0,
                    "wan_bandwidth": "8200",
                    "sessions": [{
                        "media_type": "movie",
                        "username": "alice",
                        "state": "buffering",
                        "full_title": "Heat",
                        "rating_key": 42,
                        "year": 1995,
                        "location": "wan",
                        "ip_address": "203.0.113.9",
                        "secure": "1",
                        "transcode_hw_decoding": 1,
                        "stream_video_decision": "transcode"
                    }]
                }
            }
        });

        let envelope: Envelope<ActivitySnapshot> = serde_json::from_value(body).unwrap();
        let activity = envelope.response.data;
        assert_eq!(activity.stream_count, 2);
        assert_eq!(activity.wan_bandwidth, 8200);

        let session = &activity.sessions[0];
        assert_eq!(session.media_type, MediaType::Movie);
        assert_eq!(session.state, PlaybackState::Other);
        assert_eq!(session.rating_key, "42");
        assert_eq!(session.year, "1995");
        assert!(session.secure);
        assert!(session.transcode_hw_decoding);
        assert!(!session.transcode_hw_encoding);
        assert!(session.is_wan());
        assert_eq!(session.video_decision().unwrap(), Decision::Transcode);
    }

    #[test]
    fn test_activity_without_sessions_is_rejected() {
        let body = json!({"response": {"data": {"stream_count": "1"}}});
        let result: Result<Envelope<ActivitySnapshot>, _> = serde_json::from_value(body);
        assert!(result.is_err());
    }

    #[test]
    fn test_history_error_envelope_is_rejected() {
        let body = json!({"response": {"result": "error", "data": {}}});
        let result: Result<Envelope<HistoryPage>, _> = serde_json::from_value(body);
        assert!(result.is_err());
    }

    #[test]
    fn test_geoip_requires_city_and_region() {
        assert!(serde_json::from_value::<GeoInfo>(json!({})).is_err());
        assert!(serde_json::from_value::<GeoInfo>(json!({"city": "Lyon"})).is_err());

        // Tautulli sends null for addresses it cannot place
        let geo: GeoInfo = serde_json::from_value(json!({"city": null, "region": "ARA"})).unwrap();
        assert_eq!(geo.city, "");
        assert_eq!(geo.region, "ARA");
    }

    #[test]
    fn test_unknown_media_type_maps_to_other() {
        let entry: HistoryEntry = serde_json::from_value(json!({
            "user": "bob",
            "media_type": "clip",
            "full_title": "Trailer",
            "stopped": 1700000000
        }))
        .unwrap();
        assert_eq!(entry.media_type, MediaType::Other);
    }

    #[test]
    fn test_session_missing_username_is_rejected() {
        let result: Result<Session, _> = serde_json::from_value(json!({
            "media_type": "movie",
            "full_title": "Heat",
            "rating_key": "1",
            "location": "lan",
            "ip_address": "10.0.0.2"
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_decision_labels() {
        assert_eq!("direct play".parse::<Decision>().unwrap().label(), "Direct Play");
        assert_eq!("copy".parse::<Decision>().unwrap().label(), "Direct Stream");
        assert_eq!("transcode".parse::<Decision>().unwrap().label(), "Transcode");
        assert!(matches!(
            "remux".parse::<Decision>(),
            Err(FormatError::UnknownDecision(d)) if d == "remux"
        ));
    }

    #[test]
    fn test_episode_thumbnail_uses_season_poster() {
        let session: Session = serde_json::from_value(json!({
            "media_type": "episode",
            "username": "alice",
            "full_title": "Foo - Pilot",
            "rating_key": "7",
            "location": "lan",
            "ip_address": "10.0.0.2",
            "thumb": "/library/metadata/7/thumb",
            "parent_thumb": "/library/metadata/6/thumb"
        }))
        .unwrap();
        assert_eq!(session.thumbnail(), Some("/library/metadata/6/thumb"));
    }
}
