//! Finding the decoration that marked the target day before this calendar
//! painted its own, so that it can be hidden.
//!
//! The reliable way is an element id from the content document.  Pages that
//! predate that setting can opt into [`LargestImageMarker`], a heuristic scan
//! for the biggest image whose source contains a hint.
use crate::config::{Content, LooseString};
use crate::surface::Surface;
use std::fmt;

pub(crate) trait MarkerLocator: fmt::Debug {
    fn locate(&self, surface: &dyn Surface) -> Option<String>;
}

/// The element with the configured id, if it is on the page
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct ConfiguredMarker(pub(crate) String);

impl MarkerLocator for ConfiguredMarker {
    fn locate(&self, surface: &dyn Surface) -> Option<String> {
        surface.computed_style(&self.0).map(|_| self.0.clone())
    }
}

/// Among images whose source contains `hint`, the one covering the largest
/// layout area.  Pages often reuse the same picture as a small icon elsewhere,
/// hence the area comparison; on a tie the earlier image wins.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct LargestImageMarker {
    pub(crate) hint: String,
}

impl MarkerLocator for LargestImageMarker {
    fn locate(&self, surface: &dyn Surface) -> Option<String> {
        let mut best: Option<(f64, String)> = None;
        for img in surface.images() {
            if !img.source.contains(&self.hint) {
                continue;
            }
            let area = img.layout.area();
            if best.as_ref().map_or(true, |(best_area, _)| area > *best_area) {
                best = Some((area, img.id));
            }
        }
        best.map(|(_, id)| id)
    }
}

/// Tries each locator in turn
#[derive(Debug, Default)]
pub(crate) struct MarkerChain(Vec<Box<dyn MarkerLocator>>);

impl MarkerChain {
    pub(crate) fn for_content(content: &Content) -> MarkerChain {
        let mut chain: Vec<Box<dyn MarkerLocator>> = Vec::new();
        if let Some(id) = content.legacy_marker_id() {
            chain.push(Box::new(ConfiguredMarker(id.to_owned())));
        }
        if let Some(hint) = content
            .calendar
            .heart_image_hint
            .as_ref()
            .and_then(LooseString::non_blank)
        {
            chain.push(Box::new(LargestImageMarker {
                hint: hint.to_owned(),
            }));
        }
        MarkerChain(chain)
    }
}

impl MarkerLocator for MarkerChain {
    fn locate(&self, surface: &dyn Surface) -> Option<String> {
        self.0.iter().find_map(|loc| loc.locate(surface))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::{Element, LayoutBox, MemorySurface};

    fn sized(w: f64, h: f64) -> LayoutBox {
        LayoutBox {
            left: 0.0,
            top: 0.0,
            width: w,
            height: h,
        }
    }

    fn page() -> MemorySurface {
        let mut page = MemorySurface::default();
        page.push(Element::new("icon", sized(16.0, 16.0)).with_image("/img/s.png"));
        page.push(Element::new("photo", sized(900.0, 600.0)).with_image("/img/couple.jpg"));
        page.push(Element::new("big", sized(60.0, 50.0)).with_image("/img/s.png?v=2"));
        page.push(Element::new("twin", sized(50.0, 60.0)).with_image("/img/s.png"));
        page
    }

    #[test]
    fn test_largest_image() {
        let loc = LargestImageMarker {
            hint: "s.png".into(),
        };
        assert_eq!(loc.locate(&page()), Some("big".into()));
        let loc = LargestImageMarker {
            hint: "nothing".into(),
        };
        assert_eq!(loc.locate(&page()), None);
    }

    #[test]
    fn test_configured_before_heuristic() {
        let content = Content::from_json(
            r#"{"calendar": {"heartElemId": "icon", "heartImageHint": "s.png"}}"#,
        )
        .unwrap();
        let chain = MarkerChain::for_content(&content);
        assert_eq!(chain.locate(&page()), Some("icon".into()));
    }

    #[test]
    fn test_configured_but_absent() {
        let content = Content::from_json(
            r#"{"calendar": {"heartElemId": "gone", "heartImageHint": "s.png"}}"#,
        )
        .unwrap();
        let chain = MarkerChain::for_content(&content);
        assert_eq!(chain.locate(&page()), Some("big".into()));
        let content = Content::from_json(r#"{"calendar": {"heartElemId": "gone"}}"#).unwrap();
        assert_eq!(MarkerChain::for_content(&content).locate(&page()), None);
    }
}
