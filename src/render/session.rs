use base64::Engine;

use super::{format_duration, Directive, DisplayLine};
use crate::error::FormatError;
use crate::tautulli::{Decision, GeoInfo, MediaType, Session};

const PLAYING: &str = "►";
const PAUSED: &str = "❙ ❙";
const HW_MARKER: &str = "[HW]";

/// `5.1(side)` -> `5.1`
fn channels(layout: &str) -> &str {
    layout.split('(').next().unwrap_or(layout)
}

fn with_hw(codec: &str, hardware: bool) -> String {
    let codec = codec.to_uppercase();
    if hardware {
        format!("{codec}{HW_MARKER}")
    } else {
        codec
    }
}

/// Type-specific title, secondary line joined with `<br>`
fn session_title(session: &Session) -> String {
    match session.media_type {
        MediaType::Episode => format!(
            "{} - S{} • E{}<br>{}",
            session.grandparent_title,
            session.parent_media_index,
            session.media_index,
            session.title
        ),
        MediaType::Movie => format!("{}<br>{}", session.full_title, session.year),
        MediaType::Track => format!(
            "{}. {}<br>{} — {}",
            session.media_index, session.title, session.grandparent_title, session.parent_title
        ),
        MediaType::Photo | MediaType::Other => session.full_title.clone(),
    }
}

/// Who is watching what, linked to the item page in Tautulli.
///
/// `thumbnail` is the raw proxied poster; it is attached inline when present.
pub fn session_summary(
    session: &Session,
    base_url: &str,
    thumbnail: Option<&[u8]>,
) -> DisplayLine {
    let state = if session.is_playing() { PLAYING } else { PAUSED };
    let mut line = DisplayLine::new(format!(
        "{}<br>{state} {}",
        session.username,
        session_title(session)
    ));

    if let Some(bytes) = thumbnail {
        let image = base64::engine::general_purpose::STANDARD.encode(bytes);
        line = line.with(Directive::Image(image));
    }

    line.with(Directive::Href(format!(
        "{base_url}/info?rating_key={}",
        session.rating_key
    )))
}

/// `⏱ 12:34 / 45:00`, when the duration is known
pub fn session_time(session: &Session) -> Option<DisplayLine> {
    if session.duration == 0 {
        return None;
    }
    let progress = session.progress_percent.clamp(0.0, 100.0);
    let watched_ms = (session.duration as f64 * progress / 100.0) as u64;
    Some(DisplayLine::new(format!(
        "⏱ {} / {}",
        format_duration(watched_ms / 1000),
        format_duration(session.duration / 1000)
    )))
}

/// Video decision and codecs; tracks have no video line
pub fn session_video(session: &Session) -> Result<Option<DisplayLine>, FormatError> {
    if session.media_type == MediaType::Track {
        return Ok(None);
    }

    let decision = session.video_decision()?;
    let text = match decision {
        Decision::Transcode => {
            let decoding = format!(
                "{} {}",
                with_hw(&session.video_codec, session.transcode_hw_decoding),
                session.video_full_resolution
            );
            let encoding = format!(
                "{} {}",
                with_hw(&session.stream_video_codec, session.transcode_hw_encoding),
                session.stream_video_full_resolution
            );
            format!("🎥{} / {decoding} → {encoding}", decision.label())
        }
        Decision::DirectPlay | Decision::Copy => format!(
            "🎥{} / {} {}",
            decision.label(),
            session.stream_video_codec.to_uppercase(),
            session.stream_video_full_resolution
        ),
    };
    Ok(Some(DisplayLine::new(text)))
}

/// Audio decision, codecs and channel layout
pub fn session_audio(session: &Session) -> Result<DisplayLine, FormatError> {
    let decision = session.audio_decision()?;
    let stream = format!(
        "{} {}",
        session.stream_audio_codec.to_uppercase(),
        channels(&session.stream_audio_channel_layout)
    );
    let text = match decision {
        Decision::Transcode => {
            let source = format!(
                "{} {}",
                session.audio_codec.to_uppercase(),
                channels(&session.audio_channel_layout)
            );
            format!("🔈{} / {source} → {stream}", decision.label())
        }
        Decision::DirectPlay | Decision::Copy => format!("🔈{} / {stream}", decision.label()),
    };
    Ok(DisplayLine::new(text))
}

/// `🔒WAN: 203.0.113.9 / Lyon, Auvergne-Rhône-Alpes`
///
/// `geo` is only consulted for WAN sessions.
pub fn session_location(session: &Session, geo: Option<&GeoInfo>) -> DisplayLine {
    let lock = if session.secure { "🔒" } else { "🔓" };
    let mut text = format!(
        "{lock}{}: {}",
        session.location.to_uppercase(),
        session.ip_address
    );
    if let (true, Some(geo)) = (session.is_wan(), geo) {
        text.push_str(&format!(" / {}, {}", geo.city, geo.region));
    }
    DisplayLine::new(text)
}

/// Quality profile, spelled out when the client streams the original file
pub fn session_quality(session: &Session) -> String {
    if session.quality_profile != "Original" {
        return session.quality_profile.clone();
    }

    if session.media_type == MediaType::Track {
        return format!("{} kbps", session.bitrate);
    }

    let mut resolution = session.stream_video_full_resolution.clone();
    if session.stream_video_dynamic_range == "HDR" {
        resolution.push_str(" HDR");
    }
    format!(
        "{resolution} / {:.1} Mbps",
        session.stream_bitrate as f64 / 1000.0
    )
}
