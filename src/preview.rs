use crate::render::MARKED_CLASS;
use crate::surface::{Element, LayoutBox, MemorySurface};
use crate::theme::{element_style, MARKED_STYLE};
use ratatui::{prelude::*, widgets::*};

/// Draws the visible text of a page, squeezing its layout into the given
/// area.  Each element's text is printed at its box's top-left corner.
#[derive(Clone, Copy, Debug)]
pub(crate) struct PagePreview<'a> {
    page: &'a MemorySurface,
}

impl<'a> PagePreview<'a> {
    pub(crate) fn new(page: &'a MemorySurface) -> PagePreview<'a> {
        PagePreview { page }
    }

    /// The region of the page holding every drawable element, as
    /// `(left, top, right, bottom)`
    fn extent(&self) -> Option<(f64, f64, f64, f64)> {
        self.page
            .elements()
            .iter()
            .filter(|el| drawable(el))
            .filter_map(Element::layout)
            .map(|b| (b.left, b.top, b.left + b.width, b.top + b.height))
            .reduce(|a, b| (a.0.min(b.0), a.1.min(b.1), a.2.max(b.2), a.3.max(b.3)))
    }
}

impl Widget for PagePreview<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let Some((left, top, right, bottom)) = self.extent() else {
            return;
        };
        let width = if self.page.width() > 0.0 {
            self.page.width().max(right - left)
        } else {
            right - left
        };
        let sx = f64::from(area.width.saturating_sub(4)) / width.max(1.0);
        let sy = f64::from(area.height.saturating_sub(1)) / (bottom - top).max(1.0);
        let mut canvas = BufferCanvas::new(area, buf);
        for el in self.page.elements().iter().filter(|el| drawable(el)) {
            let Some(LayoutBox { left: x, top: y, .. }) = el.layout() else {
                continue;
            };
            let (Some(col), Some(row)) = (
                to_cell((x - left) * sx, area.width),
                to_cell((y - top) * sy, area.height),
            ) else {
                continue;
            };
            let cs = el.computed_style();
            if el.has_class(MARKED_CLASS) {
                canvas.mvprint(row, col, format!("♥{}", el.plain_text()), Some(MARKED_STYLE));
            } else {
                canvas.mvprint(row, col, el.plain_text(), Some(element_style(&cs.color, cs.opacity)));
            }
        }
    }
}

fn drawable(el: &Element) -> bool {
    !el.is_hidden() && !el.plain_text().trim().is_empty()
}

/// The cell index in `0..limit` nearest to `v`, if any is within half a cell
fn to_cell(v: f64, limit: u16) -> Option<u16> {
    (0..limit).find(|&c| (f64::from(c) - v).abs() <= 0.5)
}

#[derive(Debug, Eq, PartialEq)]
struct BufferCanvas<'a> {
    area: Rect,
    buf: &'a mut Buffer,
}

impl<'a> BufferCanvas<'a> {
    fn new(area: Rect, buf: &'a mut Buffer) -> Self {
        Self { area, buf }
    }

    fn mvprint<S: AsRef<str>>(&mut self, y: u16, x: u16, s: S, style: Option<Style>) {
        if y < self.area.height && x < self.area.width {
            let text = Text::styled(s.as_ref(), style.unwrap_or_default());
            let width = u16::try_from(text.width()).unwrap_or(u16::MAX);
            // Using a Paragraph lets us truncate text that extends beyond the
            // area, though we need to be sure that the Rect passed to the
            // Paragraph is entirely within the frame lest a panic result.
            Paragraph::new(text).render(
                Rect {
                    x: x + self.area.x,
                    y: y + self.area.y,
                    width: (self.area.width - x).min(width),
                    height: 1,
                },
                self.buf,
            );
        }
    }
}
