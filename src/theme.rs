use ratatui::style::{Color, Modifier, Style};
use regex_lite::Regex;
use std::sync::OnceLock;

pub(crate) const BASE_STYLE: Style = Style::new().fg(Color::White).bg(Color::Black);

pub(crate) const STATUS_STYLE: Style = Style::new().fg(Color::Black).bg(Color::Gray);

pub(crate) const MARKED_STYLE: Style = Style::new()
    .fg(Color::LightRed)
    .bg(Color::Black)
    .add_modifier(Modifier::BOLD);

/// Page elements at or above this opacity are drawn at full intensity
const DIM_BELOW_OPACITY: f64 = 0.8;

/// Parses `rgb(r, g, b)`, `rgba(r, g, b, a)`, `#rrggbb`, and `#rgb`
pub(crate) fn css_color(s: &str) -> Option<Color> {
    static RGB: OnceLock<Regex> = OnceLock::new();
    let s = s.trim();
    if let Some(hex) = s.strip_prefix('#') {
        return hex_color(hex);
    }
    let rgb = RGB.get_or_init(|| {
        Regex::new(r"(?i)rgba?\(\s*(\d+)\s*,\s*(\d+)\s*,\s*(\d+)").expect("rgb() regex")
    });
    let caps = rgb.captures(s)?;
    let channel = |i: usize| caps.get(i)?.as_str().parse::<u8>().ok();
    Some(Color::Rgb(channel(1)?, channel(2)?, channel(3)?))
}

fn hex_color(hex: &str) -> Option<Color> {
    let expanded: String = match hex.len() {
        3 => hex.chars().flat_map(|c| [c, c]).collect(),
        6 => hex.to_owned(),
        _ => return None,
    };
    let channel = |i: usize| {
        expanded
            .get(i..i + 2)
            .and_then(|s| u8::from_str_radix(s, 16).ok())
    };
    Some(Color::Rgb(channel(0)?, channel(2)?, channel(4)?))
}

/// Terminal style approximating a page element's computed color and opacity
pub(crate) fn element_style(color: &str, opacity: f64) -> Style {
    let mut style = BASE_STYLE;
    if let Some(fg) = css_color(color) {
        style = style.fg(fg);
    }
    if opacity < DIM_BELOW_OPACITY {
        style = style.add_modifier(Modifier::DIM);
    }
    style
}
