//! Transform engine: converts pointer-drag gestures into element geometry.
//!
//! Each gesture captures what it needs at pointer-down (grab offset, initial
//! rect, start angle) and maps every subsequent pointer position to a
//! candidate geometry. Gestures never mutate elements themselves; the editor
//! commits the result through the sync layer.

use crate::canvas::{AdSize, clamp_into};
use crate::element::{Element, MIN_ELEMENT_SIZE, normalize_degrees};
use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};

/// Distance from the element's top edge to the rotate handle (px).
pub const ROTATE_HANDLE_OFFSET: f64 = 25.0;
/// Handle hit tolerance in canvas px.
pub const HANDLE_HIT_TOLERANCE: f64 = 12.0;

/// Corner positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

/// Edge midpoint positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Edge {
    Top,
    Right,
    Bottom,
    Left,
}

/// Type of transform handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HandleKind {
    /// Corner resize handle.
    Corner(Corner),
    /// Edge-midpoint resize handle.
    Edge(Edge),
    /// Rotation handle above the top-center.
    Rotate,
}

/// Which sides of the rect a resize handle drags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MovingEdges {
    pub left: bool,
    pub right: bool,
    pub top: bool,
    pub bottom: bool,
}

impl HandleKind {
    /// The edges this handle moves; `None` for the rotate handle.
    pub fn moving_edges(self) -> Option<MovingEdges> {
        let mut m = MovingEdges::default();
        match self {
            HandleKind::Corner(Corner::TopLeft) => {
                m.left = true;
                m.top = true;
            }
            HandleKind::Corner(Corner::TopRight) => {
                m.right = true;
                m.top = true;
            }
            HandleKind::Corner(Corner::BottomLeft) => {
                m.left = true;
                m.bottom = true;
            }
            HandleKind::Corner(Corner::BottomRight) => {
                m.right = true;
                m.bottom = true;
            }
            HandleKind::Edge(Edge::Top) => m.top = true,
            HandleKind::Edge(Edge::Right) => m.right = true,
            HandleKind::Edge(Edge::Bottom) => m.bottom = true,
            HandleKind::Edge(Edge::Left) => m.left = true,
            HandleKind::Rotate => return None,
        }
        Some(m)
    }
}

/// A transform handle with its canvas position.
#[derive(Debug, Clone, Copy)]
pub struct Handle {
    pub position: Point,
    pub kind: HandleKind,
}

impl Handle {
    pub fn new(position: Point, kind: HandleKind) -> Self {
        Self { position, kind }
    }

    /// Check whether a pointer position hits this handle.
    pub fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        let dx = point.x - self.position.x;
        let dy = point.y - self.position.y;
        dx * dx + dy * dy <= tolerance * tolerance
    }
}

/// Transform handles for an element: four corners, four edge midpoints, and
/// the rotate handle, placed with the element's visual rotation applied.
///
/// Locked elements expose no handles.
pub fn handles_for(element: &Element) -> Vec<Handle> {
    if element.locked {
        return Vec::new();
    }

    let bounds = element.bounds();
    let center = bounds.center();
    let half_w = bounds.width() / 2.0;
    let half_h = bounds.height() / 2.0;
    let rotation = element.rotation.to_radians();
    let (sin_r, cos_r) = rotation.sin_cos();

    let rotate_point = |dx: f64, dy: f64| -> Point {
        Point::new(
            center.x + dx * cos_r - dy * sin_r,
            center.y + dx * sin_r + dy * cos_r,
        )
    };

    vec![
        Handle::new(rotate_point(-half_w, -half_h), HandleKind::Corner(Corner::TopLeft)),
        Handle::new(rotate_point(half_w, -half_h), HandleKind::Corner(Corner::TopRight)),
        Handle::new(rotate_point(-half_w, half_h), HandleKind::Corner(Corner::BottomLeft)),
        Handle::new(rotate_point(half_w, half_h), HandleKind::Corner(Corner::BottomRight)),
        Handle::new(rotate_point(0.0, -half_h), HandleKind::Edge(Edge::Top)),
        Handle::new(rotate_point(half_w, 0.0), HandleKind::Edge(Edge::Right)),
        Handle::new(rotate_point(0.0, half_h), HandleKind::Edge(Edge::Bottom)),
        Handle::new(rotate_point(-half_w, 0.0), HandleKind::Edge(Edge::Left)),
        Handle::new(
            rotate_point(0.0, -half_h - ROTATE_HANDLE_OFFSET),
            HandleKind::Rotate,
        ),
    ]
}

/// Find which handle (if any) is hit at the given point.
pub fn hit_test_handles(element: &Element, point: Point, tolerance: f64) -> Option<HandleKind> {
    handles_for(element)
        .into_iter()
        .find(|h| h.hit_test(point, tolerance))
        .map(|h| h.kind)
}

/// Move gesture: drags the whole element by the pointer delta, keeping the
/// grab point under the cursor.
#[derive(Debug, Clone, Copy)]
pub struct MoveGesture {
    grab_offset: Vec2,
    size: kurbo::Size,
}

impl MoveGesture {
    /// Capture the grab offset at pointer-down.
    pub fn begin(element: &Element, pointer: Point) -> Self {
        Self {
            grab_offset: pointer - element.position,
            size: element.size,
        }
    }

    /// Candidate position for the current pointer, clamped into the canvas.
    pub fn update(&self, pointer: Point, ad_size: AdSize) -> Point {
        clamp_into(pointer - self.grab_offset, self.size, ad_size)
    }
}

/// Resize gesture: drags the handle's edges while the opposite edges stay
/// anchored exactly.
#[derive(Debug, Clone, Copy)]
pub struct ResizeGesture {
    moving: MovingEdges,
    initial: Rect,
    start_pointer: Point,
}

impl ResizeGesture {
    /// Start a resize on the given handle. Returns `None` for the rotate
    /// handle, which is not a resize.
    pub fn begin(element: &Element, handle: HandleKind, pointer: Point) -> Option<Self> {
        Some(Self {
            moving: handle.moving_edges()?,
            initial: element.bounds(),
            start_pointer: pointer,
        })
    }

    /// Which edges this gesture drags.
    pub fn moving_edges(&self) -> MovingEdges {
        self.moving
    }

    /// Candidate rect for the current pointer position.
    ///
    /// The anchored edges keep their initial coordinates untouched. Each
    /// moving edge is clamped twice: against the minimum size (the drag goes
    /// inert in the shrinking direction once the floor is hit, while the
    /// other axis keeps responding) and against the canvas bounds.
    pub fn update(&self, pointer: Point, ad_size: AdSize) -> Rect {
        let delta = pointer - self.start_pointer;
        let canvas = ad_size.bounds();

        let mut left = self.initial.x0;
        let mut right = self.initial.x1;
        let mut top = self.initial.y0;
        let mut bottom = self.initial.y1;

        if self.moving.left {
            left = (self.initial.x0 + delta.x).clamp(canvas.x0, right - MIN_ELEMENT_SIZE);
        }
        if self.moving.right {
            right = (self.initial.x1 + delta.x).clamp(left + MIN_ELEMENT_SIZE, canvas.x1);
        }
        if self.moving.top {
            top = (self.initial.y0 + delta.y).clamp(canvas.y0, bottom - MIN_ELEMENT_SIZE);
        }
        if self.moving.bottom {
            bottom = (self.initial.y1 + delta.y).clamp(top + MIN_ELEMENT_SIZE, canvas.y1);
        }

        Rect::new(left, top, right, bottom)
    }
}

/// Rotate gesture: tracks the angle of the vector from the element center to
/// the pointer, relative to where the gesture started.
#[derive(Debug, Clone, Copy)]
pub struct RotateGesture {
    center: Point,
    start_angle: f64,
    initial_rotation: f64,
}

impl RotateGesture {
    /// Capture the start angle at pointer-down on the rotate handle.
    pub fn begin(element: &Element, pointer: Point) -> Self {
        let center = element.center();
        Self {
            center,
            start_angle: angle_degrees(center, pointer),
            initial_rotation: element.rotation,
        }
    }

    /// Rotation in degrees for the current pointer, normalized to `[0, 360)`.
    pub fn update(&self, pointer: Point) -> f64 {
        let angle = angle_degrees(self.center, pointer);
        normalize_degrees(self.initial_rotation + angle - self.start_angle)
    }
}

/// Angle of the vector `center -> point` in degrees.
fn angle_degrees(center: Point, point: Point) -> f64 {
    (point.y - center.y).atan2(point.x - center.x).to_degrees()
}
