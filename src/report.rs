//! Assembles the full menu from the Tautulli API.

use anyhow::{Context, Result};
use chrono::TimeZone;

use crate::config::Config;
use crate::error::FetchError;
use crate::render::{
    bandwidth_line, history_summary, session_audio, session_location, session_summary,
    session_time, session_video, stream_count_line, title_badge, Directive, DisplayLine,
};
use crate::tautulli::{MediaType, Session, TautulliApi, HISTORY_LENGTH};

/// What a failed secondary fetch does to the report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Log and carry on without the data
    Degrade,
    /// Fail the whole report
    Abort,
}

/// Thumbnails are decoration
pub const IMAGE_POLICY: FailurePolicy = FailurePolicy::Degrade;
/// A WAN session without its location is reported as a fault
pub const GEO_POLICY: FailurePolicy = FailurePolicy::Abort;

impl FailurePolicy {
    pub fn apply<T>(
        self,
        what: &str,
        result: Result<T, FetchError>,
    ) -> Result<Option<T>, FetchError> {
        match (self, result) {
            (_, Ok(value)) => Ok(Some(value)),
            (FailurePolicy::Degrade, Err(e)) => {
                tracing::warn!(error = %e, "{what} unavailable, continuing without it");
                Ok(None)
            }
            (FailurePolicy::Abort, Err(e)) => Err(e),
        }
    }
}

/// Lines for one live session, in menu order
async fn session_block<A: TautulliApi>(
    api: &A,
    config: &Config,
    session: &Session,
) -> Result<Vec<DisplayLine>> {
    let thumbnail = match session.thumbnail() {
        Some(thumb) => IMAGE_POLICY.apply("thumbnail", api.image_proxy(thumb).await)?,
        None => None,
    };

    let geo = if session.is_wan() {
        GEO_POLICY
            .apply("location", api.geoip_lookup(&session.ip_address).await)
            .with_context(|| format!("GeoIP lookup for {}", session.ip_address))?
    } else {
        None
    };

    let mut lines = vec![session_summary(
        session,
        &config.base_url,
        thumbnail.as_deref(),
    )];
    lines.extend(session_time(session));
    lines.extend(session_video(session)?);
    lines.push(session_audio(session)?);
    lines.push(session_location(session, geo.as_ref()));
    Ok(lines)
}

/// Fetch activity and history and lay out the whole menu.
///
/// Nothing is printed here, so a fault anywhere leaves no partial output.
pub async fn build_report<A, Tz>(api: &A, config: &Config, tz: &Tz) -> Result<Vec<DisplayLine>>
where
    A: TautulliApi,
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let activity = api.activity().await.context("fetching activity")?;
    let history = api.history().await.context("fetching history")?;

    let mut lines = vec![title_badge(activity.stream_count), DisplayLine::separator()];

    lines.push(
        DisplayLine::new("Open Tautulli")
            .with(Directive::Href(format!("{}/home", config.base_url)))
            .with(Directive::SfImage("chart.bar.xaxis".to_string())),
    );
    if let Some(plex_url) = &config.plex_url {
        lines.push(
            DisplayLine::new("Open Plex")
                .with(Directive::Href(format!("{plex_url}/web")))
                .with(Directive::SfImage("play.rectangle".to_string())),
        );
    }
    lines.push(DisplayLine::separator());

    if activity.stream_count == 0 {
        lines.push(DisplayLine::new("Idle"));
    } else {
        // Upstream total, photo sessions included
        lines.push(stream_count_line(activity.stream_count));
        lines.extend(bandwidth_line("LAN", activity.lan_bandwidth));
        lines.extend(bandwidth_line("WAN", activity.wan_bandwidth));

        for session in activity
            .sessions
            .iter()
            .filter(|s| s.media_type != MediaType::Photo)
        {
            lines.push(DisplayLine::separator());
            let block = session_block(api, config, session)
                .await
                .with_context(|| format!("session of {}", session.username))?;
            lines.extend(block);
        }
    }

    if !history.is_empty() {
        lines.push(DisplayLine::separator());
        lines.extend(
            history
                .iter()
                .take(HISTORY_LENGTH)
                .map(|entry| history_summary(entry, tz)),
        );
    }

    Ok(lines)
}

/// The only output of a failed run
pub fn error_report(error: &anyhow::Error) -> Vec<DisplayLine> {
    vec![
        DisplayLine::new("Script error:"),
        DisplayLine::new(format!("{error:#}")),
        DisplayLine::separator(),
    ]
}

/// [`build_report`] behind the top-level guard: always yields printable lines
pub async fn run<A, Tz>(api: &A, config: &Config, tz: &Tz) -> Vec<DisplayLine>
where
    A: TautulliApi,
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    match build_report(api, config, tz).await {
        Ok(lines) => lines,
        Err(e) => {
            tracing::error!("report failed: {e:#}");
            error_report(&e)
        }
    }
}
