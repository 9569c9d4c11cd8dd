//! Menu-bar line protocol and the formatters that produce it.
//!
//! Every printed line is `text` or `text | key=value key=value`; a line that
//! is exactly `---` starts a new menu section.

mod history;
mod session;

pub use history::history_summary;
pub use session::{
    session_audio, session_location, session_quality, session_summary, session_time,
    session_video,
};

use std::fmt;

pub const SEPARATOR: &str = "---";

/// Orange used for the menu-bar label while something is streaming
pub const ACTIVE_COLOR: &str = "#cc7b19";

const SUBSCRIPTS: [char; 10] = ['₀', '₁', '₂', '₃', '₄', '₅', '₆', '₇', '₈', '₉'];

/// Display directive understood by the host
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    Size(u32),
    Color(String),
    Href(String),
    /// Base64-encoded image bytes
    Image(String),
    /// SF Symbol name
    SfImage(String),
}

impl fmt::Display for Directive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Directive::Size(size) => write!(f, "size={size}"),
            Directive::Color(color) => write!(f, "color={color}"),
            Directive::Href(href) => write!(f, "href={href}"),
            Directive::Image(image) => write!(f, "image={image}"),
            Directive::SfImage(name) => write!(f, "sfimage={name}"),
        }
    }
}

/// One output line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayLine {
    pub text: String,
    pub directives: Vec<Directive>,
}

impl DisplayLine {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            directives: Vec::new(),
        }
    }

    pub fn separator() -> Self {
        Self::new(SEPARATOR)
    }

    pub fn with(mut self, directive: Directive) -> Self {
        self.directives.push(directive);
        self
    }
}

impl fmt::Display for DisplayLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)?;
        if !self.directives.is_empty() {
            f.write_str(" |")?;
            for directive in &self.directives {
                write!(f, " {directive}")?;
            }
        }
        Ok(())
    }
}

/// `2` -> `₂`, `0` -> empty
pub fn subscript(count: u64) -> String {
    if count == 0 {
        return String::new();
    }
    count
        .to_string()
        .chars()
        .filter_map(|c| c.to_digit(10).map(|d| SUBSCRIPTS[d as usize]))
        .collect()
}

/// Menu-bar label: stream count in subscript digits, colored while active
pub fn title_badge(count: u64) -> DisplayLine {
    let line = DisplayLine::new(format!("{} ❯", subscript(count))).with(Directive::Size(16));
    if count > 0 {
        line.with(Directive::Color(ACTIVE_COLOR.to_string()))
    } else {
        line
    }
}

pub fn stream_count_line(count: u64) -> DisplayLine {
    let unit = if count == 1 { "stream" } else { "streams" };
    DisplayLine::new(format!("{count} {unit}"))
}

/// `LAN: 12.3 Mbps`, or nothing when idle
pub fn bandwidth_line(label: &str, kbps: u64) -> Option<DisplayLine> {
    if kbps == 0 {
        return None;
    }
    Some(DisplayLine::new(format!(
        "{label}: {:.1} Mbps",
        kbps as f64 / 1000.0
    )))
}

/// `1:02:03` with hours, `4:05` without
pub fn format_duration(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;
    if hours > 0 {
        format!("{hours}:{minutes:02}:{secs:02}")
    } else {
        format!("{minutes}:{secs:02}")
    }
}
