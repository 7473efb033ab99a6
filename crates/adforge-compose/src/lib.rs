//! AdForge compositing pipeline
//!
//! Client-side image processing for ad creatives: background removal via a
//! border-seeded flood fill, product-on-background composition with cover-fit
//! scaling and a drop shadow, and aspect-ratio-aware crop/fit resizing.

pub mod compose;
pub mod decode;
pub mod error;
pub mod removal;
pub mod resize;

pub use compose::{
    PRODUCT_BASE_FRACTION, PRODUCT_MAX_SCALE, PRODUCT_MIN_SCALE, ProductPlacement, compose_product,
    cover_fit,
};
pub use decode::decode_rgba;
pub use error::{ComposeError, ComposeResult};
pub use removal::{DEFAULT_COLOR_TOLERANCE, estimate_background, remove_background};
pub use resize::{CropRect, auto_crop_rect, resize_to_fill, resize_to_fit};
