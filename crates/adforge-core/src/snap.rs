//! Snap guides: alignment candidates derived from the canvas and sibling
//! elements, matched against the active element's edges during a drag.

use crate::canvas::AdSize;
use crate::element::{Element, MIN_ELEMENT_SIZE};
use crate::transform::MovingEdges;
use kurbo::{Point, Rect, Vec2};

/// Distance within which an edge locks onto a guide (px).
pub const SNAP_THRESHOLD: f64 = 5.0;

/// Guide line orientation. A vertical guide is a constant-x line, a
/// horizontal guide a constant-y line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuideOrientation {
    Vertical,
    Horizontal,
}

/// Where a guide came from, for rendering emphasis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuideSource {
    CanvasEdge,
    CanvasCenter,
    /// Edge or center of the sibling element with this id.
    Element(String),
}

/// A single alignment candidate line.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapGuide {
    pub orientation: GuideOrientation,
    pub value: f64,
    pub source: GuideSource,
}

/// Outcome of snapping a candidate position.
#[derive(Debug, Clone)]
pub struct SnapResult {
    /// Adjusted top-left position.
    pub position: Point,
    /// Guides that matched (at most one per axis), for display.
    pub guides: Vec<SnapGuide>,
}

/// Display-only spacing measurement between the active element and one
/// sibling, along an axis where their extents do not overlap.
#[derive(Debug, Clone, PartialEq)]
pub struct SpacingMeasure {
    pub other_id: String,
    pub orientation: GuideOrientation,
    /// Shortest gap between the two rects along this axis (px).
    pub gap: f64,
}

/// Alignment candidates for one active-element drag.
///
/// Guides are generated fresh per drag in a fixed priority order: canvas
/// edges, canvas center, then every non-active, non-locked sibling. The
/// first guide within threshold wins on each axis; ties are not re-resolved
/// by distance.
#[derive(Debug, Clone)]
pub struct GuideSet {
    vertical: Vec<SnapGuide>,
    horizontal: Vec<SnapGuide>,
    threshold: f64,
}

impl GuideSet {
    /// Collect guides for a drag of `active_id` over `elements`.
    pub fn for_drag(ad_size: AdSize, elements: &[Element], active_id: &str) -> Self {
        Self::with_threshold(ad_size, elements, active_id, SNAP_THRESHOLD)
    }

    pub fn with_threshold(
        ad_size: AdSize,
        elements: &[Element],
        active_id: &str,
        threshold: f64,
    ) -> Self {
        let canvas = ad_size.bounds();
        let mut vertical = vec![
            SnapGuide {
                orientation: GuideOrientation::Vertical,
                value: canvas.x0,
                source: GuideSource::CanvasEdge,
            },
            SnapGuide {
                orientation: GuideOrientation::Vertical,
                value: canvas.x1,
                source: GuideSource::CanvasEdge,
            },
            SnapGuide {
                orientation: GuideOrientation::Vertical,
                value: canvas.center().x,
                source: GuideSource::CanvasCenter,
            },
        ];
        let mut horizontal = vec![
            SnapGuide {
                orientation: GuideOrientation::Horizontal,
                value: canvas.y0,
                source: GuideSource::CanvasEdge,
            },
            SnapGuide {
                orientation: GuideOrientation::Horizontal,
                value: canvas.y1,
                source: GuideSource::CanvasEdge,
            },
            SnapGuide {
                orientation: GuideOrientation::Horizontal,
                value: canvas.center().y,
                source: GuideSource::CanvasCenter,
            },
        ];

        for el in elements {
            if el.id == active_id || el.locked {
                continue;
            }
            let bounds = el.bounds();
            for x in [bounds.x0, bounds.center().x, bounds.x1] {
                vertical.push(SnapGuide {
                    orientation: GuideOrientation::Vertical,
                    value: x,
                    source: GuideSource::Element(el.id.clone()),
                });
            }
            for y in [bounds.y0, bounds.center().y, bounds.y1] {
                horizontal.push(SnapGuide {
                    orientation: GuideOrientation::Horizontal,
                    value: y,
                    source: GuideSource::Element(el.id.clone()),
                });
            }
        }

        Self {
            vertical,
            horizontal,
            threshold,
        }
    }

    /// First guide within threshold of any of `edges`, with the shift that
    /// puts the matched edge exactly on the guide.
    fn match_axis(guides: &[SnapGuide], edges: &[f64], threshold: f64) -> Option<(f64, SnapGuide)> {
        for guide in guides {
            for &edge in edges {
                if (edge - guide.value).abs() <= threshold {
                    return Some((guide.value - edge, guide.clone()));
                }
            }
        }
        None
    }

    /// Snap a move candidate: compares the rect's left/right/center on each
    /// axis and shifts the whole rect so the matched edge sits on the guide.
    /// Axes snap independently.
    pub fn snap_move(&self, candidate: Rect) -> SnapResult {
        let mut shift = Vec2::ZERO;
        let mut guides = Vec::new();

        let x_edges = [candidate.x0, candidate.x1, candidate.center().x];
        if let Some((dx, guide)) = Self::match_axis(&self.vertical, &x_edges, self.threshold) {
            shift.x = dx;
            guides.push(guide);
        }

        let y_edges = [candidate.y0, candidate.y1, candidate.center().y];
        if let Some((dy, guide)) = Self::match_axis(&self.horizontal, &y_edges, self.threshold) {
            shift.y = dy;
            guides.push(guide);
        }

        SnapResult {
            position: candidate.origin() + shift,
            guides,
        }
    }

    /// Snap a resize candidate: only the dragged edges are compared and
    /// adjusted, so the anchored edges stay exact. A snap that would push a
    /// dimension under the minimum size is skipped.
    pub fn snap_resize(&self, candidate: Rect, moving: MovingEdges) -> (Rect, Vec<SnapGuide>) {
        let mut rect = candidate;
        let mut guides = Vec::new();

        let x_edge = if moving.left {
            Some(candidate.x0)
        } else if moving.right {
            Some(candidate.x1)
        } else {
            None
        };
        if let Some(edge) = x_edge {
            if let Some((dx, guide)) = Self::match_axis(&self.vertical, &[edge], self.threshold) {
                let snapped = if moving.left {
                    Rect::new(rect.x0 + dx, rect.y0, rect.x1, rect.y1)
                } else {
                    Rect::new(rect.x0, rect.y0, rect.x1 + dx, rect.y1)
                };
                if snapped.width() >= MIN_ELEMENT_SIZE {
                    rect = snapped;
                    guides.push(guide);
                }
            }
        }

        let y_edge = if moving.top {
            Some(candidate.y0)
        } else if moving.bottom {
            Some(candidate.y1)
        } else {
            None
        };
        if let Some(edge) = y_edge {
            if let Some((dy, guide)) = Self::match_axis(&self.horizontal, &[edge], self.threshold) {
                let snapped = if moving.top {
                    Rect::new(rect.x0, rect.y0 + dy, rect.x1, rect.y1)
                } else {
                    Rect::new(rect.x0, rect.y0, rect.x1, rect.y1 + dy)
                };
                if snapped.height() >= MIN_ELEMENT_SIZE {
                    rect = snapped;
                    guides.push(guide);
                }
            }
        }

        (rect, guides)
    }
}

/// Shortest gaps between the active rect and each sibling, along the axes
/// where their extents do not overlap. Purely informational.
pub fn spacing_measurements(active: Rect, elements: &[Element], active_id: &str) -> Vec<SpacingMeasure> {
    let mut measures = Vec::new();
    for el in elements {
        if el.id == active_id {
            continue;
        }
        let other = el.bounds();

        let x_gap = if active.x1 <= other.x0 {
            Some(other.x0 - active.x1)
        } else if other.x1 <= active.x0 {
            Some(active.x0 - other.x1)
        } else {
            None
        };
        if let Some(gap) = x_gap {
            measures.push(SpacingMeasure {
                other_id: el.id.clone(),
                orientation: GuideOrientation::Horizontal,
                gap,
            });
        }

        let y_gap = if active.y1 <= other.y0 {
            Some(other.y0 - active.y1)
        } else if other.y1 <= active.y0 {
            Some(active.y0 - other.y1)
        } else {
            None
        };
        if let Some(gap) = y_gap {
            measures.push(SpacingMeasure {
                other_id: el.id.clone(),
                orientation: GuideOrientation::Vertical,
                gap,
            });
        }
    }
    measures
}
