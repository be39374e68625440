use super::{ComputedStyle, ImageInfo, LayoutBox, Surface, SurfaceError};
use crate::config::LooseString;
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};

const DEFAULT_COLOR: &str = "rgb(0, 0, 0)";
const DEFAULT_FONT_SIZE: f64 = 16.0;

/// A page held entirely in memory, loaded from a JSON snapshot of the
/// elements the calendar cares about.  Computed styles are the snapshot's
/// base style overridden by whatever inline properties have been set since.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub(crate) struct MemorySurface {
    #[serde(default)]
    width: f64,
    #[serde(default)]
    framework_hook: bool,
    #[serde(default)]
    elements: Vec<Element>,
    #[serde(skip)]
    stylesheets: BTreeMap<String, String>,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub(crate) struct Element {
    id: LooseString,
    #[serde(default, rename = "box")]
    layout: Option<LayoutBox>,
    #[serde(default)]
    style: BaseStyle,
    #[serde(default)]
    text: String,
    #[serde(default)]
    image: Option<String>,
    #[serde(default)]
    link: bool,
    #[serde(skip)]
    markup: Option<String>,
    #[serde(skip)]
    inline: BTreeMap<String, String>,
    #[serde(skip)]
    classes: BTreeSet<String>,
    #[serde(skip)]
    hidden: bool,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
struct BaseStyle {
    color: Option<String>,
    opacity: Option<f64>,
    font_size: Option<f64>,
}

impl MemorySurface {
    pub(crate) fn from_json(s: &str) -> Result<MemorySurface, serde_json::Error> {
        serde_json::from_str(s)
    }

    /// Width of the page the layout coordinates were designed for; zero if
    /// the snapshot did not say
    pub(crate) fn width(&self) -> f64 {
        self.width
    }

    /// Whether the page builder behind this snapshot signals when its own
    /// layout pass has finished
    pub(crate) fn framework_hook(&self) -> bool {
        self.framework_hook
    }

    pub(crate) fn elements(&self) -> &[Element] {
        &self.elements
    }

    pub(crate) fn element(&self, id: &str) -> Option<&Element> {
        self.elements.iter().find(|el| el.id.as_str() == id)
    }

    fn element_mut(&mut self, id: &str) -> Result<&mut Element, SurfaceError> {
        self.elements
            .iter_mut()
            .find(|el| el.id.as_str() == id)
            .ok_or_else(|| SurfaceError::MissingElement(id.to_owned()))
    }

    fn writable_mut(&mut self, id: &str) -> Result<&mut Element, SurfaceError> {
        let el = self.element_mut(id)?;
        if el.link {
            Err(SurfaceError::ReadOnly(id.to_owned()))
        } else {
            Ok(el)
        }
    }
}

impl Element {
    pub(crate) fn id(&self) -> &str {
        self.id.as_str()
    }

    pub(crate) fn layout(&self) -> Option<LayoutBox> {
        self.layout
    }

    pub(crate) fn is_hidden(&self) -> bool {
        self.hidden
    }

    pub(crate) fn has_class(&self, class: &str) -> bool {
        self.classes.contains(class)
    }

    /// The element's visible text, with any markup tags stripped
    pub(crate) fn plain_text(&self) -> String {
        let Some(markup) = self.markup.as_deref() else {
            return self.text.clone();
        };
        let mut out = String::with_capacity(markup.len());
        let mut in_tag = false;
        for ch in markup.chars() {
            match ch {
                '<' => in_tag = true,
                '>' => in_tag = false,
                c if !in_tag => out.push(c),
                _ => (),
            }
        }
        out
    }

    pub(crate) fn computed_style(&self) -> ComputedStyle {
        let color = self
            .inline
            .get("color")
            .cloned()
            .or_else(|| self.style.color.clone())
            .unwrap_or_else(|| String::from(DEFAULT_COLOR));
        let opacity = self
            .inline
            .get("opacity")
            .and_then(|s| s.trim().parse::<f64>().ok())
            .or(self.style.opacity)
            .unwrap_or(1.0);
        let font_size = self
            .inline
            .get("font-size")
            .and_then(|s| s.trim().trim_end_matches("px").parse::<f64>().ok())
            .or(self.style.font_size)
            .unwrap_or(DEFAULT_FONT_SIZE);
        ComputedStyle {
            color,
            opacity,
            font_size,
        }
    }
}

/// Builders and accessors for assembling pages in tests
#[cfg(test)]
impl MemorySurface {
    pub(crate) fn push(&mut self, element: Element) {
        self.elements.push(element);
    }
}

#[cfg(test)]
impl Element {
    pub(crate) fn new(id: &str, layout: LayoutBox) -> Element {
        Element {
            id: LooseString(id.to_owned()),
            layout: Some(layout),
            ..Element::default()
        }
    }

    pub(crate) fn with_text(mut self, text: &str) -> Element {
        text.clone_into(&mut self.text);
        self
    }

    pub(crate) fn with_style(mut self, color: &str, opacity: f64, font_size: f64) -> Element {
        self.style = BaseStyle {
            color: Some(color.to_owned()),
            opacity: Some(opacity),
            font_size: Some(font_size),
        };
        self
    }

    pub(crate) fn with_image(mut self, source: &str) -> Element {
        self.image = Some(source.to_owned());
        self
    }

    pub(crate) fn as_link(mut self) -> Element {
        self.link = true;
        self
    }

    pub(crate) fn markup(&self) -> Option<&str> {
        self.markup.as_deref()
    }

    pub(crate) fn style_property(&self, name: &str) -> Option<&str> {
        self.inline.get(name).map(String::as_str)
    }
}

impl Surface for MemorySurface {
    fn layout_box(&self, id: &str) -> Option<LayoutBox> {
        self.element(id).and_then(Element::layout)
    }

    fn computed_style(&self, id: &str) -> Option<ComputedStyle> {
        self.element(id).map(Element::computed_style)
    }

    fn has_class(&self, id: &str, class: &str) -> bool {
        self.element(id).is_some_and(|el| el.has_class(class))
    }

    fn images(&self) -> Vec<ImageInfo> {
        self.elements
            .iter()
            .filter_map(|el| {
                Some(ImageInfo {
                    id: el.id().to_owned(),
                    source: el.image.clone()?,
                    layout: el.layout.unwrap_or_default(),
                })
            })
            .collect()
    }

    fn has_stylesheet(&self, key: &str) -> bool {
        self.stylesheets.contains_key(key)
    }

    fn set_text(&mut self, id: &str, text: &str) -> Result<(), SurfaceError> {
        let el = self.writable_mut(id)?;
        text.clone_into(&mut el.text);
        el.markup = None;
        Ok(())
    }

    fn set_markup(&mut self, id: &str, markup: &str) -> Result<(), SurfaceError> {
        let el = self.writable_mut(id)?;
        el.markup = Some(markup.to_owned());
        Ok(())
    }

    fn set_style_property(
        &mut self,
        id: &str,
        name: &str,
        value: &str,
    ) -> Result<(), SurfaceError> {
        self.element_mut(id)?
            .inline
            .insert(name.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove_style_property(&mut self, id: &str, name: &str) -> Result<(), SurfaceError> {
        self.element_mut(id)?.inline.remove(name);
        Ok(())
    }

    fn add_class(&mut self, id: &str, class: &str) -> Result<(), SurfaceError> {
        self.element_mut(id)?.classes.insert(class.to_owned());
        Ok(())
    }

    fn remove_class(&mut self, id: &str, class: &str) -> Result<(), SurfaceError> {
        self.element_mut(id)?.classes.remove(class);
        Ok(())
    }

    fn set_hidden(&mut self, id: &str, hidden: bool) -> Result<(), SurfaceError> {
        self.element_mut(id)?.hidden = hidden;
        Ok(())
    }

    fn install_stylesheet(&mut self, key: &str, css: &str) -> Result<(), SurfaceError> {
        self.stylesheets.insert(key.to_owned(), css.to_owned());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static PAGE: &str = r##"{
        "width": 1200,
        "frameworkHook": true,
        "elements": [
            {"id": 1, "box": {"left": 10, "top": 20, "width": 40, "height": 30},
             "style": {"color": "#3d3d3d", "opacity": 0.3, "fontSize": 28}, "text": "31"},
            {"id": "menu", "text": "RSVP", "link": true},
            {"id": "heart", "box": {"left": 0, "top": 0, "width": 60, "height": 50}, "image": "/img/s.png"}
        ]
    }"##;

    #[test]
    fn test_load_snapshot() {
        let page = MemorySurface::from_json(PAGE).unwrap();
        assert!(page.framework_hook());
        assert_eq!(page.elements().len(), 3);
        assert_eq!(
            page.layout_box("1"),
            Some(LayoutBox {
                left: 10.0,
                top: 20.0,
                width: 40.0,
                height: 30.0
            })
        );
        assert_eq!(page.layout_box("menu"), None);
        assert_eq!(page.layout_box("nope"), None);
        let images = page.images();
        assert_eq!(images.len(), 1);
        assert_eq!(images[0].id, "heart");
    }

    #[test]
    fn test_inline_overrides_base_style() {
        let mut page = MemorySurface::from_json(PAGE).unwrap();
        let base = page.computed_style("1").unwrap();
        assert_eq!(base.color, "#3d3d3d");
        page.set_style_property("1", "color", "rgb(1, 2, 3)").unwrap();
        page.set_style_property("1", "opacity", "1").unwrap();
        let style = page.computed_style("1").unwrap();
        assert_eq!(style.color, "rgb(1, 2, 3)");
        assert!(style.opacity > 0.99);
        page.remove_style_property("1", "opacity").unwrap();
        assert!(page.computed_style("1").unwrap().opacity < 0.5);
    }

    #[test]
    fn test_links_are_read_only() {
        let mut page = MemorySurface::from_json(PAGE).unwrap();
        assert_eq!(
            page.set_text("menu", "x"),
            Err(SurfaceError::ReadOnly("menu".into()))
        );
        assert_eq!(
            page.set_text("ghost", "x"),
            Err(SurfaceError::MissingElement("ghost".into()))
        );
    }

    #[test]
    fn test_markup_and_text() {
        let mut page = MemorySurface::from_json(PAGE).unwrap();
        page.set_markup("1", "<span class=\"a\"></span><b>18</b>").unwrap();
        assert_eq!(page.element("1").unwrap().plain_text(), "18");
        page.set_text("1", "19").unwrap();
        assert_eq!(page.element("1").unwrap().markup(), None);
        assert_eq!(page.element("1").unwrap().plain_text(), "19");
    }
}
