//! Pure extraction functions over cleaned device responses.
//!
//! Nothing in here fails loudly: a value that cannot be found comes back as
//! `None` and the snapshot builder renders it as the `None` sentinel.
use crate::prelude::*;
use crate::catalog;

use regex::Regex;
use std::sync::LazyLock;

static ANSI: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\x1B|\[|0;37m|0m").expect("invalid ansi regex"));

pub static VOLUME: LazyLock<Regex> = LazyLock::new(|| field_pattern("volume:"));
pub static MUTE: LazyLock<Regex> = LazyLock::new(|| field_pattern("mute:"));
pub static SYSTEM_VERSION: LazyLock<Regex> = LazyLock::new(|| field_pattern("System Version"));
pub static AUDIO_VERSION: LazyLock<Regex> = LazyLock::new(|| field_pattern("Audio"));

static NETWORK: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    catalog::NETWORK_FIELDS
        .iter()
        .map(|(name, label)| (*name, field_pattern(label)))
        .collect()
});

static STREAM: LazyLock<HashMap<&'static str, Regex>> = LazyLock::new(|| {
    catalog::STREAM_FIELDS
        .iter()
        .map(|f| (f.name, field_pattern(f.label)))
        .collect()
});

/// `<label><value>\r\n` at the start of a line, capturing the value.
fn field_pattern(label: &str) -> Regex {
    let pattern = format!(r"(?m)^[ \t]*{}(.*?)\r\n", regex::escape(label));
    Regex::new(&pattern).expect("invalid field pattern")
}

/// Strips the terminal colour codes the device wraps its output in.
pub fn clean_response(raw: &str) -> String {
    ANSI.replace_all(raw, "").into_owned()
}

pub fn extract(raw: &str, pattern: &Regex) -> Option<String> {
    pattern
        .captures(raw)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Positional extraction for replies that carry a bare value on the line
/// after the echoed command.
pub fn extract_line(raw: &str, offset: usize) -> Option<String> {
    if raw.contains(catalog::SYNTAX_ERROR) || raw.contains("Error:") {
        return None;
    }
    let (_, rest) = raw.split_once(' ')?;
    rest.split("\r\n")
        .nth(offset)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// First numeric token, so `-1`, `-1 dB` and `-1.0` all read as -1.0.
pub fn parse_level(text: &str) -> Option<f32> {
    text.split_whitespace().find_map(|t| t.parse::<f32>().ok())
}

/// Integer shown next to a slider; truncates toward zero.
pub fn current_value(level: f32) -> i32 {
    level.trunc() as i32
}

/// Slider-side text for a level, always with a fractional part.
pub fn format_level(level: f32) -> String {
    format!("{:?}", level)
}

pub fn parse_volume(raw: &str) -> Option<f32> {
    extract(raw, &VOLUME).and_then(|v| parse_level(&v))
}

pub fn parse_mute(raw: &str) -> Option<bool> {
    extract(raw, &MUTE).map(|v| v.eq_ignore_ascii_case(catalog::ON))
}

pub fn parse_gain(raw: &str) -> Option<f32> {
    extract_line(raw, 1).and_then(|v| parse_level(&v))
}

/// Display names of the inputs routed to an output, joined with `, `.
pub fn parse_routes(raw: &str) -> Option<String> {
    let line = extract_line(raw, 1)?.replace(['[', ']'], "");
    let names: Vec<&str> = line
        .split_whitespace()
        .filter_map(|token| match catalog::input_by_token(token) {
            Some(input) => Some(input.display),
            None => {
                debug!("ignoring unknown route token {:?}", token);
                None
            }
        })
        .collect();

    if names.is_empty() {
        None
    } else {
        Some(names.join(", "))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamMode {
    Usb,
    Ip,
}

pub fn parse_stream_mode(raw: &str) -> Option<StreamMode> {
    if raw.contains(catalog::IP_STREAM_MODE) {
        Some(StreamMode::Ip)
    } else if raw.contains(catalog::USB_STREAM_MODE) {
        Some(StreamMode::Usb)
    } else {
        None
    }
}

pub fn parse_network(raw: &str) -> Vec<(&'static str, Option<String>)> {
    NETWORK
        .iter()
        .map(|(name, pattern)| (*name, extract(raw, pattern)))
        .collect()
}

pub fn parse_stream_field(raw: &str, name: &str) -> Option<String> {
    STREAM.get(name).and_then(|pattern| extract(raw, pattern))
}
