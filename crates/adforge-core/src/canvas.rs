//! Canvas state: ad metadata plus the ordered element list.

use crate::element::{Element, ElementKind};
use crate::error::{CanvasError, CanvasResult};
use kurbo::{Point, Rect, Size, Vec2};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::str::FromStr;
use uuid::Uuid;

/// Offset applied to a duplicated element so the copy is visibly apart
/// from its source.
pub const DUPLICATE_OFFSET: Vec2 = Vec2::new(16.0, 16.0);

/// Canvas pixel dimensions, parsed from the ad-format string (`"300x250"`).
///
/// The single source of truth for canvas size; everything that clamps
/// geometry derives its bounds from here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct AdSize {
    pub width: u32,
    pub height: u32,
}

impl AdSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Canvas bounds as a rect anchored at the origin.
    pub fn bounds(&self) -> Rect {
        Rect::new(0.0, 0.0, f64::from(self.width), f64::from(self.height))
    }

    pub fn size(&self) -> Size {
        Size::new(f64::from(self.width), f64::from(self.height))
    }
}

impl FromStr for AdSize {
    type Err = CanvasError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || CanvasError::InvalidAdSize(s.to_string());
        let (w, h) = s.split_once(['x', 'X']).ok_or_else(invalid)?;
        let width: u32 = w.trim().parse().map_err(|_| invalid())?;
        let height: u32 = h.trim().parse().map_err(|_| invalid())?;
        if width == 0 || height == 0 {
            return Err(invalid());
        }
        Ok(Self { width, height })
    }
}

impl std::fmt::Display for AdSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl From<AdSize> for String {
    fn from(size: AdSize) -> Self {
        size.to_string()
    }
}

impl TryFrom<String> for AdSize {
    type Error = CanvasError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Ad metadata carried alongside the element list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanvasMeta {
    pub ad_size: AdSize,
    /// URL of the generated scene behind all elements, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_image: Option<String>,
}

/// The full serializable scene: metadata plus elements in insertion order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanvasState {
    pub meta: CanvasMeta,
    pub elements: Vec<Element>,
}

impl CanvasState {
    /// Create an empty canvas of the given ad size.
    pub fn new(ad_size: AdSize) -> Self {
        Self {
            meta: CanvasMeta {
                ad_size,
                background_image: None,
            },
            elements: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn element(&self, id: &str) -> Option<&Element> {
        self.elements.iter().find(|el| el.id == id)
    }

    pub fn element_mut(&mut self, id: &str) -> Option<&mut Element> {
        self.elements.iter_mut().find(|el| el.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.element(id).is_some()
    }

    /// z-index a newly added element should get: one above everything else,
    /// never below 1.
    pub fn next_z_index(&self) -> i64 {
        self.elements.iter().map(|el| el.z_index).max().unwrap_or(0).max(0) + 1
    }

    /// Construct a default element of `kind` at `position` and add it on top.
    /// Returns the new element's id.
    pub fn add_element(&mut self, kind: ElementKind, position: Point) -> String {
        let mut element = Element::new(kind, position);
        element.z_index = self.next_z_index();
        element.position = clamp_into(position, element.size, self.meta.ad_size);
        let id = element.id.clone();
        self.elements.push(element);
        id
    }

    /// Insert a fully-formed element verbatim (asset drops, generated
    /// creatives). Rejects malformed or duplicate ids.
    pub fn insert_element(&mut self, element: Element) -> CanvasResult<()> {
        if !element.is_structurally_valid() {
            return Err(CanvasError::InvalidElement(element.id));
        }
        if self.contains(&element.id) {
            return Err(CanvasError::DuplicateId(element.id));
        }
        self.elements.push(element);
        Ok(())
    }

    /// Remove an element, returning it if present.
    pub fn remove_element(&mut self, id: &str) -> Option<Element> {
        let idx = self.elements.iter().position(|el| el.id == id)?;
        Some(self.elements.remove(idx))
    }

    /// Clone an element with a fresh id, a fixed position offset, and the
    /// highest z-index. Returns the clone's id.
    pub fn duplicate_element(&mut self, id: &str) -> Option<String> {
        let source = self.element(id)?.clone();
        let mut copy = source;
        copy.id = format!("{}-{}", copy.kind.slug(), Uuid::new_v4());
        copy.z_index = self.next_z_index();
        copy.position = clamp_into(copy.position + DUPLICATE_OFFSET, copy.size, self.meta.ad_size);
        let new_id = copy.id.clone();
        self.elements.push(copy);
        Some(new_id)
    }

    /// Elements in paint order: ascending `z_index`, ties broken by
    /// insertion order. Structurally invalid elements are filtered out
    /// rather than crashing the render.
    pub fn elements_ordered(&self) -> Vec<&Element> {
        let mut ordered: Vec<&Element> = self
            .elements
            .iter()
            .filter(|el| {
                let valid = el.is_structurally_valid();
                if !valid {
                    log::warn!("skipping structurally invalid element {:?}", el.id);
                }
                valid
            })
            .collect();
        ordered.sort_by_key(|el| el.z_index);
        ordered
    }

    /// Check the id-uniqueness invariant.
    pub fn validate(&self) -> CanvasResult<()> {
        let mut seen = HashSet::new();
        for el in &self.elements {
            if !seen.insert(el.id.as_str()) {
                return Err(CanvasError::DuplicateId(el.id.clone()));
            }
        }
        Ok(())
    }

    /// Serialize to JSON.
    pub fn to_json(&self) -> CanvasResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Deserialize from JSON.
    pub fn from_json(json: &str) -> CanvasResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Clamp a top-left position so a box of `size` stays inside the canvas.
///
/// When the box is larger than the canvas on an axis the position pins to 0
/// (the box overflows right/bottom, never left/top).
pub fn clamp_into(position: Point, size: Size, ad_size: AdSize) -> Point {
    let max_x = (f64::from(ad_size.width) - size.width).max(0.0);
    let max_y = (f64::from(ad_size.height) - size.height).max(0.0);
    Point::new(position.x.clamp(0.0, max_x), position.y.clamp(0.0, max_y))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::ElementKind;

    fn canvas() -> CanvasState {
        CanvasState::new(AdSize::new(300, 250))
    }

    #[test]
    fn test_ad_size_parse() {
        let size: AdSize = "300x250".parse().unwrap();
        assert_eq!(size, AdSize::new(300, 250));
        assert_eq!(size.to_string(), "300x250");

        assert!("300".parse::<AdSize>().is_err());
        assert!("0x250".parse::<AdSize>().is_err());
        assert!("wide x tall".parse::<AdSize>().is_err());
    }

    #[test]
    fn test_add_assigns_increasing_z() {
        let mut state = canvas();
        let a = state.add_element(ElementKind::Text, Point::new(10.0, 10.0));
        let b = state.add_element(ElementKind::Button, Point::new(10.0, 80.0));
        assert_eq!(state.element(&a).unwrap().z_index, 1);
        assert_eq!(state.element(&b).unwrap().z_index, 2);
    }

    #[test]
    fn test_add_clamps_into_bounds() {
        let mut state = canvas();
        let id = state.add_element(ElementKind::Text, Point::new(1000.0, -50.0));
        let el = state.element(&id).unwrap();
        assert!((el.position.x - (300.0 - el.size.width)).abs() < f64::EPSILON);
        assert!((el.position.y - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_insert_rejects_duplicate_and_artifact_ids() {
        let mut state = canvas();
        let mut el = Element::new(ElementKind::Image, Point::ZERO);
        el.id = "image-1".to_string();
        state.insert_element(el.clone()).unwrap();

        assert!(matches!(
            state.insert_element(el.clone()),
            Err(CanvasError::DuplicateId(_))
        ));

        el.id = "[object Object]".to_string();
        assert!(matches!(
            state.insert_element(el),
            Err(CanvasError::InvalidElement(_))
        ));
    }

    #[test]
    fn test_duplicate_offsets_and_tops() {
        let mut state = canvas();
        let id = state.add_element(ElementKind::Button, Point::new(30.0, 40.0));
        let copy_id = state.duplicate_element(&id).unwrap();
        assert_ne!(copy_id, id);

        let copy = state.element(&copy_id).unwrap();
        assert!((copy.position.x - 46.0).abs() < f64::EPSILON);
        assert!((copy.position.y - 56.0).abs() < f64::EPSILON);
        assert_eq!(copy.z_index, 2);
    }

    #[test]
    fn test_paint_order_sorts_by_z_with_stable_ties() {
        let mut state = canvas();
        let a = state.add_element(ElementKind::Text, Point::ZERO);
        let b = state.add_element(ElementKind::Text, Point::ZERO);
        let c = state.add_element(ElementKind::Text, Point::ZERO);
        state.element_mut(&a).unwrap().z_index = 5;
        state.element_mut(&b).unwrap().z_index = 5;
        state.element_mut(&c).unwrap().z_index = 1;

        let order: Vec<&str> = state.elements_ordered().iter().map(|el| el.id.as_str()).collect();
        assert_eq!(order, vec![c.as_str(), a.as_str(), b.as_str()]);
    }

    #[test]
    fn test_paint_order_filters_invalid_elements() {
        let mut state = canvas();
        let good = state.add_element(ElementKind::Text, Point::ZERO);
        let bad = state.add_element(ElementKind::Text, Point::ZERO);
        state.element_mut(&bad).unwrap().id = "[object Object]".to_string();

        let order = state.elements_ordered();
        assert_eq!(order.len(), 1);
        assert_eq!(order[0].id, good);
    }

    #[test]
    fn test_json_roundtrip() {
        let mut state = canvas();
        state.meta.background_image = Some("https://cdn.example/bg.png".to_string());
        state.add_element(ElementKind::Product, Point::new(50.0, 50.0));

        let json = state.to_json().unwrap();
        let back = CanvasState::from_json(&json).unwrap();
        assert_eq!(back.meta.ad_size, state.meta.ad_size);
        assert_eq!(back.len(), 1);
        assert_eq!(back.meta.background_image, state.meta.background_image);
    }

    #[test]
    fn test_validate_catches_duplicate_ids() {
        let mut state = canvas();
        let id = state.add_element(ElementKind::Text, Point::ZERO);
        let mut dup = Element::new(ElementKind::Text, Point::ZERO);
        dup.id = id;
        state.elements.push(dup);
        assert!(state.validate().is_err());
    }
}
