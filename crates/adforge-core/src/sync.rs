//! State synchronization: ownership strategies, patch validation, and
//! debounced style batching.
//!
//! The canvas state is owned either by the editor itself or by an external
//! parent that persists it. Both cases go through the same [`StateOwner`]
//! contract, picked once at construction, so the update path has no
//! "callback if present" branching. Updater closures are always resolved
//! against the owner's latest state, never a stale snapshot.

use crate::canvas::{AdSize, CanvasState, clamp_into};
use crate::element::{Element, MIN_ELEMENT_SIZE, Role, StylePatch, normalize_degrees};
use kurbo::{Point, Size};
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Quiet window after the last style patch before a pending batch flushes.
///
/// Continuous controls (sliders, color pickers) emit many patches per
/// second; committing each one causes redundant downstream persistence.
pub const STYLE_FLUSH_WINDOW: Duration = Duration::from_millis(40);

/// Observer invoked with the state after every committed write.
pub type StateObserver = Box<dyn FnMut(&CanvasState) + Send>;

/// Strategy for who holds the canonical canvas state.
pub trait StateOwner {
    /// Latest known state.
    fn read(&self) -> &CanvasState;
    /// Commit a new state.
    fn write(&mut self, next: CanvasState);
}

/// The editor holds the only copy; an optional observer is notified after
/// each commit (external persistence hook).
pub struct InternalOwner {
    state: CanvasState,
    on_change: Option<StateObserver>,
}

impl InternalOwner {
    pub fn new(state: CanvasState) -> Self {
        Self {
            state,
            on_change: None,
        }
    }

    /// Register the change observer, replacing any previous one.
    pub fn set_observer(&mut self, observer: StateObserver) {
        self.on_change = Some(observer);
    }
}

impl StateOwner for InternalOwner {
    fn read(&self) -> &CanvasState {
        &self.state
    }

    fn write(&mut self, next: CanvasState) {
        self.state = next;
        if let Some(on_change) = &mut self.on_change {
            on_change(&self.state);
        }
    }
}

/// A parent owns the canonical state. Inbound snapshots arrive through
/// [`DelegatingOwner::accept`]; outbound commits go through the write
/// callback. The local snapshot is kept current on both paths so updater
/// closures never observe a stale value.
pub struct DelegatingOwner {
    latest: CanvasState,
    outbound: StateObserver,
}

impl DelegatingOwner {
    pub fn new(initial: CanvasState, outbound: StateObserver) -> Self {
        Self {
            latest: initial,
            outbound,
        }
    }

    /// Absorb a newly arrived external state as the freshest known value.
    pub fn accept(&mut self, state: CanvasState) {
        self.latest = state;
    }
}

impl StateOwner for DelegatingOwner {
    fn read(&self) -> &CanvasState {
        &self.latest
    }

    fn write(&mut self, next: CanvasState) {
        self.latest = next;
        (self.outbound)(&self.latest);
    }
}

/// Partial element update. Fields left `None` keep their current value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ElementPatch {
    pub content: Option<String>,
    pub position: Option<Point>,
    pub size: Option<Size>,
    pub rotation: Option<f64>,
    pub z_index: Option<i64>,
    pub locked: Option<bool>,
    pub interactive: Option<bool>,
    pub role: Option<Role>,
    pub style: Option<StylePatch>,
}

impl ElementPatch {
    pub fn position(position: Point) -> Self {
        Self {
            position: Some(position),
            ..Self::default()
        }
    }

    pub fn geometry(position: Point, size: Size) -> Self {
        Self {
            position: Some(position),
            size: Some(size),
            ..Self::default()
        }
    }

    pub fn rotation(rotation: f64) -> Self {
        Self {
            rotation: Some(rotation),
            ..Self::default()
        }
    }

    pub fn style(style: StylePatch) -> Self {
        Self {
            style: Some(style),
            ..Self::default()
        }
    }

    /// A patch touching only `style` is eligible for debounced batching.
    pub fn is_style_only(&self) -> bool {
        self.style.is_some()
            && self.content.is_none()
            && self.position.is_none()
            && self.size.is_none()
            && self.rotation.is_none()
            && self.z_index.is_none()
            && self.locked.is_none()
            && self.interactive.is_none()
            && self.role.is_none()
    }
}

/// Apply a patch to one element, enforcing the geometry invariants.
///
/// Geometry parts with non-finite numbers are discarded silently (the
/// element keeps its prior geometry); locked elements reject geometry
/// entirely but still take content/style. Returns whether anything changed.
pub fn apply_patch(element: &mut Element, patch: &ElementPatch, ad_size: AdSize) -> bool {
    let mut changed = false;

    if !element.locked {
        if let Some(size) = patch.size {
            if size.width.is_finite() && size.height.is_finite() {
                let clamped = Size::new(
                    size.width.clamp(MIN_ELEMENT_SIZE, f64::from(ad_size.width)),
                    size.height.clamp(MIN_ELEMENT_SIZE, f64::from(ad_size.height)),
                );
                if element.size != clamped {
                    element.size = clamped;
                    changed = true;
                }
            } else {
                log::debug!("discarding non-finite size patch for {}", element.id);
            }
        }
        if let Some(position) = patch.position {
            if position.x.is_finite() && position.y.is_finite() {
                let clamped = clamp_into(position, element.size, ad_size);
                if element.position != clamped {
                    element.position = clamped;
                    changed = true;
                }
            } else {
                log::debug!("discarding non-finite position patch for {}", element.id);
            }
        } else if patch.size.is_some() {
            // A size change alone can push the box out of bounds.
            let clamped = clamp_into(element.position, element.size, ad_size);
            if element.position != clamped {
                element.position = clamped;
                changed = true;
            }
        }
        if let Some(rotation) = patch.rotation {
            if rotation.is_finite() {
                let normalized = normalize_degrees(rotation);
                if (element.rotation - normalized).abs() > f64::EPSILON {
                    element.rotation = normalized;
                    changed = true;
                }
            } else {
                log::debug!("discarding non-finite rotation patch for {}", element.id);
            }
        }
    }

    if let Some(content) = &patch.content {
        if &element.content != content {
            element.content = content.clone();
            changed = true;
        }
    }
    if let Some(z_index) = patch.z_index {
        if element.z_index != z_index {
            element.z_index = z_index;
            changed = true;
        }
    }
    if let Some(locked) = patch.locked {
        if element.locked != locked {
            element.locked = locked;
            changed = true;
        }
    }
    if let Some(interactive) = patch.interactive {
        if element.interactive != interactive {
            element.interactive = interactive;
            changed = true;
        }
    }
    if let Some(role) = patch.role {
        if element.role != Some(role) {
            element.role = Some(role);
            changed = true;
        }
    }
    if let Some(style) = &patch.style {
        element.style.merge(style);
        changed = true;
    }

    changed
}

struct PendingStyle {
    patch: StylePatch,
    last_update: Instant,
}

/// Coalesces rapid per-element style patches into one batched update.
///
/// The flush clock is explicit: callers hand in `now`, in the manner of a
/// deadline poll, so the batcher stays deterministic under test and adds no
/// timers of its own.
pub struct StyleBatcher {
    pending: HashMap<String, PendingStyle>,
    window: Duration,
}

impl Default for StyleBatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl StyleBatcher {
    pub fn new() -> Self {
        Self::with_window(STYLE_FLUSH_WINDOW)
    }

    pub fn with_window(window: Duration) -> Self {
        Self {
            pending: HashMap::new(),
            window,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Merge a style patch into the element's pending batch and restart its
    /// quiet window.
    pub fn queue(&mut self, id: &str, patch: StylePatch, now: Instant) {
        match self.pending.get_mut(id) {
            Some(pending) => {
                pending.patch.merge(&patch);
                pending.last_update = now;
            }
            None => {
                self.pending.insert(
                    id.to_string(),
                    PendingStyle {
                        patch,
                        last_update: now,
                    },
                );
            }
        }
    }

    /// Drain every batch whose quiet window has elapsed as of `now`.
    pub fn take_due(&mut self, now: Instant) -> Vec<(String, StylePatch)> {
        let window = self.window;
        let due: Vec<String> = self
            .pending
            .iter()
            .filter(|(_, p)| now.saturating_duration_since(p.last_update) >= window)
            .map(|(id, _)| id.clone())
            .collect();
        due.into_iter()
            .filter_map(|id| self.pending.remove(&id).map(|p| (id, p.patch)))
            .collect()
    }

    /// Force-flush one element's pending batch (used before a non-style
    /// patch to the same element so update ordering is preserved).
    pub fn take(&mut self, id: &str) -> Option<StylePatch> {
        self.pending.remove(id).map(|p| p.patch)
    }

    /// Drain everything regardless of deadlines.
    pub fn take_all(&mut self) -> Vec<(String, StylePatch)> {
        self.pending
            .drain()
            .map(|(id, p)| (id, p.patch))
            .collect()
    }

    /// Earliest instant at which a pending batch becomes due.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending
            .values()
            .map(|p| p.last_update + self.window)
            .min()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::{AdSize, CanvasState};
    use crate::element::{ElementKind, Rgba};
    use std::sync::{Arc, Mutex};

    fn ad_size() -> AdSize {
        AdSize::new(300, 250)
    }

    fn element() -> Element {
        let mut el = Element::new(ElementKind::Text, Point::new(50.0, 50.0));
        el.size = Size::new(100.0, 40.0);
        el
    }

    #[test]
    fn test_non_finite_position_is_discarded() {
        let mut el = element();
        let before = el.position;
        let changed = apply_patch(
            &mut el,
            &ElementPatch::position(Point::new(f64::NAN, 10.0)),
            ad_size(),
        );
        assert!(!changed);
        assert_eq!(el.position, before);
    }

    #[test]
    fn test_non_finite_size_is_discarded() {
        let mut el = element();
        let before = el.size;
        let patch = ElementPatch {
            size: Some(Size::new(120.0, f64::INFINITY)),
            ..ElementPatch::default()
        };
        assert!(!apply_patch(&mut el, &patch, ad_size()));
        assert_eq!(el.size, before);
    }

    #[test]
    fn test_position_patch_clamps_into_canvas() {
        let mut el = element();
        apply_patch(&mut el, &ElementPatch::position(Point::new(280.0, -30.0)), ad_size());
        assert!((el.position.x - 200.0).abs() < f64::EPSILON);
        assert!((el.position.y - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_size_patch_floors_at_minimum() {
        let mut el = element();
        let patch = ElementPatch {
            size: Some(Size::new(4.0, 4.0)),
            ..ElementPatch::default()
        };
        apply_patch(&mut el, &patch, ad_size());
        assert_eq!(el.size, Size::new(MIN_ELEMENT_SIZE, MIN_ELEMENT_SIZE));
    }

    #[test]
    fn test_locked_rejects_geometry_accepts_content() {
        let mut el = element();
        el.locked = true;
        let patch = ElementPatch {
            content: Some("updated".to_string()),
            position: Some(Point::new(10.0, 10.0)),
            rotation: Some(45.0),
            ..ElementPatch::default()
        };
        assert!(apply_patch(&mut el, &patch, ad_size()));
        assert_eq!(el.content, "updated");
        assert_eq!(el.position, Point::new(50.0, 50.0));
        assert!((el.rotation - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_rotation_is_normalized() {
        let mut el = element();
        apply_patch(&mut el, &ElementPatch::rotation(-90.0), ad_size());
        assert!((el.rotation - 270.0).abs() < 1e-9);
    }

    #[test]
    fn test_style_only_detection() {
        let style = ElementPatch::style(StylePatch {
            fill: Some(Rgba::black()),
            ..StylePatch::default()
        });
        assert!(style.is_style_only());

        let mixed = ElementPatch {
            style: style.style.clone(),
            position: Some(Point::ZERO),
            ..ElementPatch::default()
        };
        assert!(!mixed.is_style_only());
        assert!(!ElementPatch::default().is_style_only());
    }

    #[test]
    fn test_batcher_waits_for_quiet_window() {
        let mut batcher = StyleBatcher::new();
        let t0 = Instant::now();
        batcher.queue(
            "el",
            StylePatch {
                font_size: Some(12.0),
                ..StylePatch::default()
            },
            t0,
        );

        assert!(batcher.take_due(t0 + Duration::from_millis(10)).is_empty());
        let due = batcher.take_due(t0 + STYLE_FLUSH_WINDOW);
        assert_eq!(due.len(), 1);
        assert!(batcher.is_empty());
    }

    #[test]
    fn test_batcher_window_restarts_on_each_patch() {
        let mut batcher = StyleBatcher::new();
        let t0 = Instant::now();
        batcher.queue(
            "el",
            StylePatch {
                font_size: Some(12.0),
                ..StylePatch::default()
            },
            t0,
        );
        // Second patch 30ms later restarts the quiet window.
        let t1 = t0 + Duration::from_millis(30);
        batcher.queue(
            "el",
            StylePatch {
                font_size: Some(14.0),
                ..StylePatch::default()
            },
            t1,
        );

        assert!(batcher.take_due(t0 + STYLE_FLUSH_WINDOW).is_empty());
        let due = batcher.take_due(t1 + STYLE_FLUSH_WINDOW);
        assert_eq!(due.len(), 1);
        // Batches coalesced, later value wins.
        assert_eq!(due[0].1.font_size, Some(14.0));
    }

    #[test]
    fn test_batcher_take_force_flushes_one_element() {
        let mut batcher = StyleBatcher::new();
        let t0 = Instant::now();
        batcher.queue(
            "a",
            StylePatch {
                opacity: Some(0.4),
                ..StylePatch::default()
            },
            t0,
        );
        batcher.queue(
            "b",
            StylePatch {
                opacity: Some(0.6),
                ..StylePatch::default()
            },
            t0,
        );

        let taken = batcher.take("a").unwrap();
        assert_eq!(taken.opacity, Some(0.4));
        assert!(batcher.take("a").is_none());
        assert!(!batcher.is_empty());
    }

    #[test]
    fn test_internal_owner_notifies_observer() {
        let seen = Arc::new(Mutex::new(0usize));
        let seen_clone = Arc::clone(&seen);

        let mut owner = InternalOwner::new(CanvasState::new(ad_size()));
        owner.set_observer(Box::new(move |state| {
            *seen_clone.lock().unwrap() = state.len();
        }));

        let mut next = owner.read().clone();
        next.add_element(ElementKind::Text, Point::ZERO);
        owner.write(next);

        assert_eq!(*seen.lock().unwrap(), 1);
    }

    #[test]
    fn test_delegating_owner_reads_accepted_state() {
        let sent = Arc::new(Mutex::new(Vec::<usize>::new()));
        let sent_clone = Arc::clone(&sent);

        let mut owner = DelegatingOwner::new(
            CanvasState::new(ad_size()),
            Box::new(move |state| sent_clone.lock().unwrap().push(state.len())),
        );

        // Parent pushes a fresh canonical state with one element.
        let mut external = CanvasState::new(ad_size());
        external.add_element(ElementKind::Text, Point::ZERO);
        owner.accept(external);
        assert_eq!(owner.read().len(), 1);

        // A local write built on the accepted state sees both elements.
        let mut next = owner.read().clone();
        next.add_element(ElementKind::Button, Point::ZERO);
        owner.write(next);

        assert_eq!(owner.read().len(), 2);
        assert_eq!(*sent.lock().unwrap(), vec![2]);
    }
}
