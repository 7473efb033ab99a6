//! AdForge Core Library
//!
//! Headless data structures and interaction logic for the AdForge ad-creative
//! editor: the canvas scene model, pointer-gesture transforms, snap guides,
//! and the state synchronization layer.

pub mod canvas;
pub mod editor;
pub mod element;
pub mod error;
pub mod snap;
pub mod sync;
pub mod transform;

pub use canvas::{AdSize, CanvasMeta, CanvasState, DUPLICATE_OFFSET};
pub use editor::{CanvasEditor, CreativePayload, InternalEditor, Selection};
pub use element::{
    Element, ElementKind, ElementStyle, MIN_ELEMENT_SIZE, Rgba, Role, ShapeKind, StylePatch,
};
pub use error::{CanvasError, CanvasResult};
pub use snap::{GuideSet, SNAP_THRESHOLD, SnapGuide, SnapResult, SpacingMeasure};
pub use sync::{
    DelegatingOwner, ElementPatch, InternalOwner, STYLE_FLUSH_WINDOW, StateOwner, StyleBatcher,
};
pub use transform::{
    Corner, Edge, Handle, HandleKind, MoveGesture, ResizeGesture, RotateGesture,
    ROTATE_HANDLE_OFFSET, handles_for, hit_test_handles,
};
