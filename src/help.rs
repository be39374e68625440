use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Clear, Padding, Paragraph, Widget},
};

/// Keys understood by the preview and what they do
const KEYS: [(&str, &str); 4] = [
    ("r", "run the calendar again"),
    ("?", "this help"),
    ("q / Esc", "quit"),
    ("Ctrl-C", "quit"),
];

const NOTES: [&str; 2] = ["Resizing the terminal reruns the", "calendar once it settles."];

/// Overlay listing the preview's keys, drawn over the middle of the screen
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) struct KeyHelp {
    style: Style,
}

impl KeyHelp {
    pub(crate) fn new(style: Style) -> KeyHelp {
        KeyHelp { style }
    }

    fn lines(&self) -> Vec<Line<'static>> {
        let key_width = KEYS.iter().map(|(k, _)| k.len()).max().unwrap_or(0);
        let key_style = self.style.add_modifier(Modifier::BOLD);
        let mut lines = KEYS
            .iter()
            .map(|&(key, what)| {
                Line::from(vec![
                    Span::styled(format!("{key:<key_width$}  "), key_style),
                    Span::raw(what),
                ])
            })
            .collect::<Vec<_>>();
        lines.push(Line::default());
        lines.extend(NOTES.iter().map(|&s| Line::raw(s)));
        lines
    }
}

impl Widget for KeyHelp {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let lines = self.lines();
        let text_width = lines.iter().map(Line::width).max().unwrap_or(0);
        // Border plus one column of padding on each side
        let width = u16::try_from(text_width)
            .unwrap_or(u16::MAX)
            .saturating_add(4);
        let height = u16::try_from(lines.len())
            .unwrap_or(u16::MAX)
            .saturating_add(2);
        let overlay = centered(area, width, height);
        Clear.render(overlay, buf);
        Paragraph::new(lines)
            .block(
                Block::bordered()
                    .title(Line::from(" Keys ").centered())
                    .title_bottom(Line::from(" any key closes ").centered())
                    .padding(Padding::horizontal(1)),
            )
            .style(self.style)
            .render(overlay, buf);
    }
}

/// A `width` by `height` rectangle in the middle of `area`, shrunk to fit
fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(buffer: &Buffer) -> Vec<String> {
        (0..buffer.area.height)
            .map(|y| {
                (0..buffer.area.width)
                    .map(|x| buffer[(x, y)].symbol().to_owned())
                    .collect()
            })
            .collect()
    }

    #[test]
    fn test_key_help_overlay() {
        let area = Rect::new(0, 0, 40, 11);
        let mut buffer = Buffer::empty(area);
        KeyHelp::new(Style::new()).render(area, &mut buffer);
        assert_eq!(
            rows(&buffer),
            [
                "                                        ",
                "  ┌────────────── Keys ──────────────┐  ",
                "  │ r        run the calendar again  │  ",
                "  │ ?        this help               │  ",
                "  │ q / Esc  quit                    │  ",
                "  │ Ctrl-C   quit                    │  ",
                "  │                                  │  ",
                "  │ Resizing the terminal reruns the │  ",
                "  │ calendar once it settles.        │  ",
                "  └───────── any key closes ─────────┘  ",
                "                                        ",
            ]
        );
        // Keys are bold, their descriptions are not
        assert!(buffer[(4, 2)].style().add_modifier.contains(Modifier::BOLD));
        assert!(!buffer[(13, 2)].style().add_modifier.contains(Modifier::BOLD));
    }

    #[test]
    fn test_centered() {
        let area = Rect::new(5, 2, 40, 11);
        assert_eq!(centered(area, 36, 9), Rect::new(7, 3, 36, 9));
        assert_eq!(centered(area, 50, 20), area);
        assert_eq!(centered(Rect::new(0, 0, 0, 0), 36, 9), Rect::new(0, 0, 0, 0));
    }
}
