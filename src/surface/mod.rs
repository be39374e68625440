mod memory;
pub(crate) use self::memory::{Element, MemorySurface};
use serde::Deserialize;
use thiserror::Error;

/// An element's box in layout coordinates, i.e., unaffected by any visual
/// zoom or scale transform applied to the page
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq)]
pub(crate) struct LayoutBox {
    pub(crate) left: f64,
    pub(crate) top: f64,
    pub(crate) width: f64,
    pub(crate) height: f64,
}

impl LayoutBox {
    pub(crate) fn area(&self) -> f64 {
        self.width.max(0.0) * self.height.max(0.0)
    }
}

/// The subset of an element's computed style that the calendar samples
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct ComputedStyle {
    pub(crate) color: String,
    pub(crate) opacity: f64,
    pub(crate) font_size: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct ImageInfo {
    pub(crate) id: String,
    pub(crate) source: String,
    pub(crate) layout: LayoutBox,
}

/// The page the calendar is painted onto.
///
/// Queries return `None` for elements that are not (or not yet) on the page.
/// Mutations fail with [`SurfaceError`] instead; callers treat such failures
/// as affecting only the element concerned.
pub(crate) trait Surface {
    fn layout_box(&self, id: &str) -> Option<LayoutBox>;

    fn computed_style(&self, id: &str) -> Option<ComputedStyle>;

    fn has_class(&self, id: &str, class: &str) -> bool;

    fn images(&self) -> Vec<ImageInfo>;

    fn has_stylesheet(&self, key: &str) -> bool;

    /// Replace the element's content with plain text
    fn set_text(&mut self, id: &str, text: &str) -> Result<(), SurfaceError>;

    /// Replace the element's content with already-escaped markup
    fn set_markup(&mut self, id: &str, markup: &str) -> Result<(), SurfaceError>;

    fn set_style_property(&mut self, id: &str, name: &str, value: &str)
        -> Result<(), SurfaceError>;

    fn remove_style_property(&mut self, id: &str, name: &str) -> Result<(), SurfaceError>;

    fn add_class(&mut self, id: &str, class: &str) -> Result<(), SurfaceError>;

    fn remove_class(&mut self, id: &str, class: &str) -> Result<(), SurfaceError>;

    fn set_hidden(&mut self, id: &str, hidden: bool) -> Result<(), SurfaceError>;

    fn install_stylesheet(&mut self, key: &str, css: &str) -> Result<(), SurfaceError>;
}

#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub(crate) enum SurfaceError {
    #[error("no element with id {0:?} on the page")]
    MissingElement(String),
    #[error("element {0:?} is a link and is left untouched")]
    ReadOnly(String),
}
