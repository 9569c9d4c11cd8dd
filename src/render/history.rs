use chrono::TimeZone;

use super::DisplayLine;
use crate::tautulli::{HistoryEntry, MediaType};

fn media_icon(media_type: MediaType) -> &'static str {
    match media_type {
        MediaType::Episode => "📺",
        MediaType::Movie => "🎞",
        MediaType::Track => "🎵",
        MediaType::Photo => "📷",
        MediaType::Other => "▶",
    }
}

/// `Mar 04 / alice / 📺 Foo - S1 • E2 - Pilot`
///
/// The stop date is rendered in `tz`; callers pass `chrono::Local`.
pub fn history_summary<Tz: TimeZone>(entry: &HistoryEntry, tz: &Tz) -> DisplayLine
where
    Tz::Offset: std::fmt::Display,
{
    let title = match entry.media_type {
        MediaType::Episode => format!(
            "{} - S{} • E{} - {}",
            entry.grandparent_title, entry.parent_media_index, entry.media_index, entry.title
        ),
        _ => entry.full_title.clone(),
    };
    let ended = i64::try_from(entry.stopped)
        .ok()
        .and_then(|secs| tz.timestamp_opt(secs, 0).earliest())
        .map(|stopped| stopped.format("%b %d").to_string())
        .unwrap_or_default();

    DisplayLine::new(format!(
        "{ended} / {} / {} {title}",
        entry.user,
        media_icon(entry.media_type)
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    fn entry(value: serde_json::Value) -> HistoryEntry {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_episode_entry() {
        let episode = entry(json!({
            "user": "alice",
            "media_type": "episode",
            "full_title": "Foo - Pilot",
            "grandparent_title": "Foo",
            "parent_media_index": 1,
            "media_index": 2,
            "title": "Pilot",
            // 2024-03-04 12:00:00 UTC
            "stopped": 1709553600
        }));
        assert_eq!(
            history_summary(&episode, &Utc).text,
            "Mar 04 / alice / 📺 Foo - S1 • E2 - Pilot"
        );
    }

    #[test]
    fn test_movie_and_track_keep_full_title() {
        let movie = entry(json!({
            "user": "bob",
            "media_type": "movie",
            "full_title": "Heat",
            "stopped": "1709553600"
        }));
        assert_eq!(history_summary(&movie, &Utc).text, "Mar 04 / bob / 🎞 Heat");

        let track = entry(json!({
            "user": "bob",
            "media_type": "track",
            "full_title": "Massive Attack - Angel",
            "stopped": 1709553600
        }));
        assert_eq!(
            history_summary(&track, &Utc).text,
            "Mar 04 / bob / 🎵 Massive Attack - Angel"
        );
    }

    #[test]
    fn test_date_follows_time_zone() {
        let late = entry(json!({
            "user": "carol",
            "media_type": "clip",
            "full_title": "Trailer",
            // 2024-03-04 23:30:00 UTC
            "stopped": 1709595000
        }));
        let plus_two = chrono::FixedOffset::east_opt(2 * 3600).unwrap();
        assert!(history_summary(&late, &Utc).text.starts_with("Mar 04"));
        assert_eq!(history_summary(&late, &plus_two).text, "Mar 05 / carol / ▶ Trailer");
    }
}
