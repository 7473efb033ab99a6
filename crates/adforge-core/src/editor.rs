//! Editor facade: the single mutation entry point over a canvas state,
//! wiring gestures, snapping, selection, and debounced style batching.

use crate::canvas::CanvasState;
use crate::element::{Element, ElementKind, ElementStyle, Role, StylePatch};
use crate::error::CanvasResult;
use crate::snap::{GuideSet, SnapGuide, SpacingMeasure, spacing_measurements};
use crate::sync::{ElementPatch, InternalOwner, StateOwner, StyleBatcher, apply_patch};
use crate::transform::{Handle, HandleKind, MoveGesture, ResizeGesture, RotateGesture, handles_for};
use kurbo::{Point, Rect};
use std::collections::HashSet;
use std::time::Instant;

/// Where a new element lands when no position is given.
pub const DEFAULT_ADD_POSITION: Point = Point::new(24.0, 24.0);

/// Flattened creative summary handed to downstream publishing.
///
/// Extraction is a direct [`Role`] lookup; a field is `None` when no element
/// carries the role.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CreativePayload {
    pub headline: Option<String>,
    pub description: Option<String>,
    pub cta: Option<String>,
    pub primary_image: Option<String>,
}

/// Ephemeral selection state, tracked outside the committed canvas state.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    primary: Option<String>,
    multi: HashSet<String>,
}

impl Selection {
    /// Select a single element, clearing any previous selection.
    pub fn select(&mut self, id: &str) {
        self.multi.clear();
        self.multi.insert(id.to_string());
        self.primary = Some(id.to_string());
    }

    /// Add an element to the multi-selection; it becomes primary.
    pub fn add(&mut self, id: &str) {
        self.multi.insert(id.to_string());
        self.primary = Some(id.to_string());
    }

    pub fn remove(&mut self, id: &str) {
        self.multi.remove(id);
        if self.primary.as_deref() == Some(id) {
            self.primary = self.multi.iter().next().cloned();
        }
    }

    pub fn clear(&mut self) {
        self.multi.clear();
        self.primary = None;
    }

    pub fn primary(&self) -> Option<&str> {
        self.primary.as_deref()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.multi.contains(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.multi.iter().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.multi.is_empty()
    }
}

enum ActiveGesture {
    Move {
        id: String,
        gesture: MoveGesture,
        guides: GuideSet,
    },
    Resize {
        id: String,
        gesture: ResizeGesture,
        guides: GuideSet,
    },
    Rotate {
        id: String,
        gesture: RotateGesture,
    },
}

/// The canvas editor.
///
/// Generic over the [`StateOwner`] strategy picked at construction: internal
/// ownership or delegation to an external parent. Every mutation funnels
/// through [`CanvasEditor::update_with`], which resolves against the owner's
/// latest state.
pub struct CanvasEditor<O: StateOwner> {
    owner: O,
    selection: Selection,
    styles: StyleBatcher,
    gesture: Option<ActiveGesture>,
    snap_enabled: bool,
    active_guides: Vec<SnapGuide>,
    spacing: Vec<SpacingMeasure>,
}

/// Editor that owns its state outright.
pub type InternalEditor = CanvasEditor<InternalOwner>;

impl InternalEditor {
    /// Convenience constructor for internally owned state.
    pub fn with_state(state: CanvasState) -> Self {
        Self::new(InternalOwner::new(state))
    }
}

impl<O: StateOwner> CanvasEditor<O> {
    pub fn new(owner: O) -> Self {
        Self {
            owner,
            selection: Selection::default(),
            styles: StyleBatcher::new(),
            gesture: None,
            snap_enabled: true,
            active_guides: Vec::new(),
            spacing: Vec::new(),
        }
    }

    /// Latest known canvas state.
    pub fn state(&self) -> &CanvasState {
        self.owner.read()
    }

    /// Access the owner, e.g. to feed a [`DelegatingOwner`] an inbound state.
    ///
    /// [`DelegatingOwner`]: crate::sync::DelegatingOwner
    pub fn owner_mut(&mut self) -> &mut O {
        &mut self.owner
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn selection_mut(&mut self) -> &mut Selection {
        &mut self.selection
    }

    pub fn set_snap_enabled(&mut self, enabled: bool) {
        self.snap_enabled = enabled;
    }

    /// Guides matched by the current gesture, for rendering.
    pub fn active_guides(&self) -> &[SnapGuide] {
        &self.active_guides
    }

    /// Spacing measurements for the current gesture, for rendering.
    pub fn spacing(&self) -> &[SpacingMeasure] {
        &self.spacing
    }

    /// Apply an updater against the latest state and commit the result.
    pub fn update_with(&mut self, updater: impl FnOnce(&mut CanvasState)) {
        let mut next = self.owner.read().clone();
        updater(&mut next);
        self.owner.write(next);
    }

    /// Replace the whole state (full-state patch).
    pub fn replace_state(&mut self, next: CanvasState) {
        self.owner.write(next);
    }

    /// Add a default element of `kind`, optionally at a position and with a
    /// style preset. Returns the new element's id.
    pub fn add_element(
        &mut self,
        kind: ElementKind,
        position: Option<Point>,
        preset: Option<ElementStyle>,
    ) -> String {
        let position = position.unwrap_or(DEFAULT_ADD_POSITION);
        let mut id = String::new();
        self.update_with(|state| {
            id = state.add_element(kind, position);
            if let Some(preset) = preset {
                if let Some(el) = state.element_mut(&id) {
                    el.style = preset;
                }
            }
        });
        id
    }

    /// Insert a fully-formed element verbatim (asset drag-and-drop,
    /// generated-creative seeding).
    pub fn insert_element(&mut self, element: Element) -> CanvasResult<String> {
        let id = element.id.clone();
        let mut outcome = Ok(());
        self.update_with(|state| outcome = state.insert_element(element));
        outcome.map(|()| id)
    }

    /// Apply a partial patch to one element.
    ///
    /// Style-only patches are coalesced per element and committed as one
    /// batch once the quiet window elapses (see [`CanvasEditor::flush_styles`]);
    /// everything else applies immediately, force-flushing that element's
    /// pending styles first so ordering is preserved.
    pub fn update_element(&mut self, id: &str, patch: ElementPatch, now: Instant) {
        if patch.is_style_only() {
            if let Some(style) = patch.style {
                self.styles.queue(id, style, now);
            }
            return;
        }
        let pending = self.styles.take(id);
        self.apply_now(id, patch, pending);
    }

    fn apply_now(&mut self, id: &str, patch: ElementPatch, pending: Option<StylePatch>) {
        let id = id.to_string();
        self.update_with(|state| {
            let ad_size = state.meta.ad_size;
            if let Some(el) = state.element_mut(&id) {
                if let Some(style) = pending {
                    el.style.merge(&style);
                }
                apply_patch(el, &patch, ad_size);
            } else {
                log::debug!("patch for unknown element {id} dropped");
            }
        });
    }

    /// Commit every style batch whose quiet window has elapsed. Returns how
    /// many batches were flushed.
    pub fn flush_styles(&mut self, now: Instant) -> usize {
        let due = self.styles.take_due(now);
        self.commit_style_batches(due)
    }

    /// Commit all pending style batches regardless of deadlines.
    pub fn flush_all_styles(&mut self) -> usize {
        let due = self.styles.take_all();
        self.commit_style_batches(due)
    }

    /// Instant at which the next style batch becomes due.
    pub fn next_style_deadline(&self) -> Option<Instant> {
        self.styles.next_deadline()
    }

    fn commit_style_batches(&mut self, batches: Vec<(String, StylePatch)>) -> usize {
        if batches.is_empty() {
            return 0;
        }
        let count = batches.len();
        self.update_with(|state| {
            for (id, style) in batches {
                if let Some(el) = state.element_mut(&id) {
                    el.style.merge(&style);
                }
            }
        });
        count
    }

    /// Delete an element and drop any selection or gesture attached to it.
    pub fn delete_element(&mut self, id: &str) {
        self.selection.remove(id);
        self.styles.take(id);
        if self.gesture_element() == Some(id) {
            self.end_gesture();
        }
        let id = id.to_string();
        self.update_with(|state| {
            state.remove_element(&id);
        });
    }

    /// Clone an element with a fresh id, a fixed offset, and the topmost
    /// z-index. Returns the clone's id.
    pub fn duplicate_element(&mut self, id: &str) -> Option<String> {
        let id = id.to_string();
        let mut new_id = None;
        self.update_with(|state| new_id = state.duplicate_element(&id));
        new_id
    }

    /// Set the generated background image behind all elements.
    pub fn set_background_image(&mut self, url: Option<String>) {
        self.update_with(|state| state.meta.background_image = url);
    }

    /// Transform handles for the primary selection. Locked elements expose
    /// none.
    pub fn handles(&self) -> Vec<Handle> {
        self.selection
            .primary()
            .and_then(|id| self.owner.read().element(id))
            .map(handles_for)
            .unwrap_or_default()
    }

    fn gesture_element(&self) -> Option<&str> {
        match &self.gesture {
            Some(ActiveGesture::Move { id, .. })
            | Some(ActiveGesture::Resize { id, .. })
            | Some(ActiveGesture::Rotate { id, .. }) => Some(id.as_str()),
            None => None,
        }
    }

    fn guides_for(&self, active_id: &str) -> GuideSet {
        let state = self.owner.read();
        GuideSet::for_drag(state.meta.ad_size, &state.elements, active_id)
    }

    /// Start dragging an element. Returns false if it is missing or locked.
    pub fn begin_move(&mut self, id: &str, pointer: Point) -> bool {
        let Some(element) = self.owner.read().element(id) else {
            return false;
        };
        if element.locked {
            return false;
        }
        let gesture = MoveGesture::begin(element, pointer);
        let guides = self.guides_for(id);
        self.gesture = Some(ActiveGesture::Move {
            id: id.to_string(),
            gesture,
            guides,
        });
        true
    }

    /// Start resizing via a corner or edge handle. Returns false for locked
    /// or missing elements and for the rotate handle.
    pub fn begin_resize(&mut self, id: &str, handle: HandleKind, pointer: Point) -> bool {
        let Some(element) = self.owner.read().element(id) else {
            return false;
        };
        if element.locked {
            return false;
        }
        let Some(gesture) = ResizeGesture::begin(element, handle, pointer) else {
            return false;
        };
        let guides = self.guides_for(id);
        self.gesture = Some(ActiveGesture::Resize {
            id: id.to_string(),
            gesture,
            guides,
        });
        true
    }

    /// Start rotating from the rotate handle.
    pub fn begin_rotate(&mut self, id: &str, pointer: Point) -> bool {
        let Some(element) = self.owner.read().element(id) else {
            return false;
        };
        if element.locked {
            return false;
        }
        let gesture = RotateGesture::begin(element, pointer);
        self.gesture = Some(ActiveGesture::Rotate {
            id: id.to_string(),
            gesture,
        });
        true
    }

    /// Feed the current pointer position into the active gesture and commit
    /// the resulting geometry patch immediately.
    pub fn pointer_moved(&mut self, pointer: Point) {
        let Some(active) = &self.gesture else { return };
        let ad_size = self.owner.read().meta.ad_size;

        let (id, patch, guides) = match active {
            ActiveGesture::Move { id, gesture, guides } => {
                let Some(element) = self.owner.read().element(id) else {
                    return;
                };
                let size = element.size;
                let position = gesture.update(pointer, ad_size);
                if self.snap_enabled {
                    let result = guides.snap_move(Rect::from_origin_size(position, size));
                    (id.clone(), ElementPatch::position(result.position), result.guides)
                } else {
                    (id.clone(), ElementPatch::position(position), Vec::new())
                }
            }
            ActiveGesture::Resize { id, gesture, guides } => {
                let candidate = gesture.update(pointer, ad_size);
                let (rect, matched) = if self.snap_enabled {
                    guides.snap_resize(candidate, gesture.moving_edges())
                } else {
                    (candidate, Vec::new())
                };
                (
                    id.clone(),
                    ElementPatch::geometry(rect.origin(), rect.size()),
                    matched,
                )
            }
            ActiveGesture::Rotate { id, gesture } => (
                id.clone(),
                ElementPatch::rotation(gesture.update(pointer)),
                Vec::new(),
            ),
        };

        self.active_guides = guides;
        let pending = self.styles.take(&id);
        self.apply_now(&id, patch, pending);

        let spacing = {
            let state = self.owner.read();
            state
                .element(&id)
                .map(|el| spacing_measurements(el.bounds(), &state.elements, &id))
        };
        self.spacing = spacing.unwrap_or_default();
    }

    /// Pointer released: the gesture ends and guide overlays clear.
    pub fn end_gesture(&mut self) {
        self.gesture = None;
        self.active_guides.clear();
        self.spacing.clear();
    }

    /// Derive the flattened creative summary for downstream publishing by
    /// direct role lookup.
    pub fn publish(&self) -> CreativePayload {
        let state = self.owner.read();
        let find = |role: Role| {
            state
                .elements_ordered()
                .into_iter()
                .find(|el| el.role == Some(role))
                .map(|el| el.content.clone())
        };
        CreativePayload {
            headline: find(Role::Headline),
            description: find(Role::Description),
            cta: find(Role::Cta),
            primary_image: find(Role::PrimaryImage),
        }
    }
}
