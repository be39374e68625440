mod marker;
pub(crate) use self::marker::{MarkerChain, MarkerLocator};
use crate::calendar::{month_title, AssignedCell};
use crate::config::Content;
use crate::surface::{LayoutBox, Surface, SurfaceError};
use std::collections::BTreeSet;
use time::Date;
use tracing::debug;

/// Class added to the cell showing the target day
pub(crate) const MARKED_CLASS: &str = "day-marked";

const MARKER_SIZE_PROP: &str = "--day-marker-size";
const MARKER_TEXT_PROP: &str = "--day-marker-text";

const STYLESHEET_KEY: &str = "daygrid-marker";

static MARKER_CSS: &str = "\
.day-marked{position:relative!important;overflow:visible!important;display:flex!important;align-items:center!important;justify-content:center!important;}
.day-marked .day-marker{position:absolute;left:50%;top:50%;width:var(--day-marker-size,18px);height:var(--day-marker-size,18px);transform:translate(-50%,-55%);pointer-events:none;z-index:1;}
.day-marked .day-marker-svg{width:100%;height:100%;display:block;shape-rendering:geometricPrecision;}
.day-marked .day-marker-svg path{fill:var(--day-marker-color,#ff6f8a);}
.day-marked .day-marker-num{position:relative;z-index:2;color:var(--day-marker-text,#ffffda)!important;line-height:1!important;font-weight:400!important;}
";

static HEART_PATH: &str = "M12 21.35l-1.45-1.32C5.4 15.36 2 12.28 2 8.5 2 5.42 4.42 3 7.5 3c1.74 0 3.41.81 4.5 2.09C13.09 3.81 14.76 3 16.5 3 19.58 3 22 5.42 22 8.5c0 3.78-3.4 6.86-8.55 11.54L12 21.35z";

/// Cells below this opacity are taken as examples of out-of-month days
const GREY_OPACITY_THRESHOLD: f64 = 0.8;

const FALLBACK_TEXT_COLOR: &str = "#3d3d3d";
const FALLBACK_GREY_OPACITY: f64 = 0.25;
const FALLBACK_HIGHLIGHT_COLOR: &str = "#ffffda";
const FALLBACK_FONT_SIZE: f64 = 32.0;

/// Bounds on the marker's edge length, in pixels
const MARKER_MIN_PX: f64 = 45.0;
const MARKER_MAX_PX: f64 = 50.0;

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct TextStyle {
    pub(crate) color: String,
    pub(crate) opacity: f64,
}

/// The looks applied to day cells during one run.  They are read off the page
/// itself so that the calendar matches whatever theme the page uses.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct StyleContext {
    pub(crate) normal: TextStyle,
    pub(crate) grey: TextStyle,
    pub(crate) highlight: String,
}

impl StyleContext {
    /// `cells` are searched in order for the first faded cell (the grey
    /// example) and the first opaque one (the normal example), skipping the
    /// cell marked by an earlier run.  The highlight color is the color of
    /// the `title` element.
    pub(crate) fn sample<'a, S, I>(surface: &S, cells: I, title: Option<&str>) -> StyleContext
    where
        S: Surface + ?Sized,
        I: IntoIterator<Item = &'a str>,
    {
        let mut normal = None;
        let mut grey = None;
        for id in cells {
            if surface.has_class(id, MARKED_CLASS) {
                continue;
            }
            let Some(cs) = surface.computed_style(id) else {
                continue;
            };
            let slot = if cs.opacity < GREY_OPACITY_THRESHOLD {
                &mut grey
            } else {
                &mut normal
            };
            if slot.is_none() {
                *slot = Some(TextStyle {
                    color: cs.color,
                    opacity: cs.opacity,
                });
            }
            if normal.is_some() && grey.is_some() {
                break;
            }
        }
        let highlight = title
            .and_then(|id| surface.computed_style(id))
            .map_or_else(|| String::from(FALLBACK_HIGHLIGHT_COLOR), |cs| cs.color);
        StyleContext {
            normal: normal.unwrap_or_else(|| TextStyle {
                color: String::from(FALLBACK_TEXT_COLOR),
                opacity: 1.0,
            }),
            grey: grey.unwrap_or_else(|| TextStyle {
                color: String::from(FALLBACK_TEXT_COLOR),
                opacity: FALLBACK_GREY_OPACITY,
            }),
            highlight,
        }
    }
}

/// State that outlives a single run.  Owned by whoever drives the runs and
/// passed into each one.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub(crate) struct RunCache {
    stylesheets: BTreeSet<String>,
}

impl RunCache {
    /// Installs the marker stylesheet unless this cache already installed it
    /// on a surface that still has it
    pub(crate) fn ensure_stylesheet<S: Surface + ?Sized>(
        &mut self,
        surface: &mut S,
    ) -> Result<(), SurfaceError> {
        if self.stylesheets.contains(STYLESHEET_KEY) && surface.has_stylesheet(STYLESHEET_KEY) {
            return Ok(());
        }
        surface.install_stylesheet(STYLESHEET_KEY, MARKER_CSS)?;
        self.stylesheets.insert(String::from(STYLESHEET_KEY));
        Ok(())
    }

    pub(crate) fn installed(&self) -> usize {
        self.stylesheets.len()
    }
}

/// Paints one day cell.  Everything an earlier run may have applied is reset
/// first, so repeating a run leaves the cell unchanged.
pub(crate) fn render_cell<S: Surface + ?Sized>(
    surface: &mut S,
    assigned: &AssignedCell,
    ctx: &StyleContext,
) -> Result<(), SurfaceError> {
    let id = assigned.cell.id.as_str();
    let day = assigned.date.day().to_string();
    keep_read_only(surface.set_text(id, &day))?;

    surface.remove_class(id, MARKED_CLASS)?;
    surface.remove_style_property(id, MARKER_SIZE_PROP)?;
    surface.remove_style_property(id, MARKER_TEXT_PROP)?;
    surface.remove_style_property(id, "color")?;
    surface.remove_style_property(id, "opacity")?;
    surface.set_style_property(id, "font-weight", "400")?;

    let base = if assigned.style.in_month {
        &ctx.normal
    } else {
        &ctx.grey
    };
    surface.set_style_property(id, "color", &base.color)?;
    surface.set_style_property(id, "opacity", &base.opacity.to_string())?;

    if assigned.style.is_target_day {
        let font_size = surface
            .computed_style(id)
            .map(|cs| cs.font_size)
            .filter(|fs| *fs > 0.0)
            .unwrap_or(FALLBACK_FONT_SIZE);
        let size = marker_size(font_size, surface.layout_box(id));
        surface.add_class(id, MARKED_CLASS)?;
        surface.set_style_property(id, MARKER_SIZE_PROP, &format!("{size}px"))?;
        surface.set_style_property(id, MARKER_TEXT_PROP, &ctx.highlight)?;
        keep_read_only(surface.set_markup(id, &marker_markup(&day)))?;
        surface.set_style_property(id, "opacity", "1")?;
        surface.set_style_property(id, "color", &ctx.highlight)?;
    }
    Ok(())
}

/// Link cells keep their own content but are still styled
fn keep_read_only(r: Result<(), SurfaceError>) -> Result<(), SurfaceError> {
    match r {
        Err(SurfaceError::ReadOnly(id)) => {
            debug!(%id, "day cell is a link; leaving its content as is");
            Ok(())
        }
        r => r,
    }
}

/// Edge length of the marker drawn behind the target day: proportional to
/// the font and the cell, within [`MARKER_MIN_PX`, `MARKER_MAX_PX`]
pub(crate) fn marker_size(font_size: f64, layout: Option<LayoutBox>) -> f64 {
    let base = match layout {
        Some(b) if b.width > 0.0 && b.height > 0.0 => b.width.min(b.height),
        _ => font_size * 1.8,
    };
    (font_size * 1.5)
        .min(base * 0.5)
        .clamp(MARKER_MIN_PX, MARKER_MAX_PX)
        .round()
}

fn marker_markup(day: &str) -> String {
    format!(
        concat!(
            "<span class=\"day-marker\" aria-hidden=\"true\">",
            "<svg class=\"day-marker-svg\" viewBox=\"0 0 24 24\" focusable=\"false\" aria-hidden=\"true\">",
            "<path d=\"{path}\" /></svg></span>",
            "<span class=\"day-marker-num\">{day}</span>",
        ),
        path = HEART_PATH,
        day = v_htmlescape::escape(day),
    )
}

/// Writes the month name and the year into their heading elements, where
/// configured
pub(crate) fn render_headings<S: Surface + ?Sized>(
    surface: &mut S,
    content: &Content,
    target: Date,
) -> Result<(), SurfaceError> {
    if let Some(id) = content.month_title_id() {
        let title = month_title(target.month(), content.calendar.month_names.as_deref());
        surface.set_text(id, &title)?;
    }
    if let Some(id) = content.year_id() {
        surface.set_text(id, &target.year().to_string())?;
    }
    Ok(())
}

/// Hides the decoration found by `locator`, if any, returning its id
pub(crate) fn hide_legacy_marker<S: Surface>(
    surface: &mut S,
    locator: &dyn MarkerLocator,
) -> Result<Option<String>, SurfaceError> {
    let Some(id) = locator.locate(&*surface) else {
        return Ok(None);
    };
    surface.set_hidden(&id, true)?;
    Ok(Some(id))
}
