use crate::config::Candidate;
use crate::surface::Surface;

/// A day cell and where it currently sits on the page
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct CellRef {
    pub(crate) id: String,
    pub(crate) top: f64,
    pub(crate) left: f64,
}

impl CellRef {
    pub(crate) fn new(id: &str, top: f64, left: f64) -> CellRef {
        CellRef {
            id: id.to_owned(),
            top,
            left,
        }
    }
}

/// Positions each candidate, preferring the live layout and falling back to
/// the position stored alongside it in the content document.  Candidates with
/// neither are dropped.  Output order is input order.
pub(crate) fn sample<S: Surface + ?Sized>(surface: &S, candidates: &[Candidate]) -> Vec<CellRef> {
    candidates
        .iter()
        .filter_map(|cand| {
            let (top, left) = match surface.layout_box(&cand.id) {
                Some(layout) => (layout.top, layout.left),
                None => cand.stored?,
            };
            Some(CellRef::new(&cand.id, top, left))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::{Element, LayoutBox, MemorySurface};

    #[test]
    fn test_live_layout_wins() {
        let mut page = MemorySurface::default();
        page.push(Element::new(
            "a",
            LayoutBox {
                left: 5.0,
                top: 7.0,
                width: 10.0,
                height: 10.0,
            },
        ));
        let candidates = [
            Candidate {
                id: "a".into(),
                stored: Some((100.0, 200.0)),
            },
            Candidate {
                id: "b".into(),
                stored: Some((300.0, 400.0)),
            },
            Candidate {
                id: "c".into(),
                stored: None,
            },
        ];
        let cells = sample(&page, &candidates);
        assert_eq!(
            cells,
            vec![CellRef::new("a", 7.0, 5.0), CellRef::new("b", 300.0, 400.0)]
        );
    }
}
