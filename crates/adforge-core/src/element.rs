//! Canvas elements - the positioned, styled building blocks of a creative.

use kurbo::{Point, Rect, Size};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Minimum interactive element size (px) on either axis.
///
/// Anything smaller cannot be reliably grabbed on a touch screen, so resize
/// and patch application both floor dimensions here.
pub const MIN_ELEMENT_SIZE: f64 = 20.0;

/// Marker left behind when a non-string id was stringified upstream.
/// Ids carrying it are structurally invalid and get filtered, never rendered.
const ID_ARTIFACT: &str = "[object";

/// The kind of content an element carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    /// Editable text block.
    Text,
    /// Call-to-action button.
    Button,
    /// Raster image (content is a URL).
    Image,
    /// Product photo, typically background-removed.
    Product,
    /// Geometric shape (see [`ShapeKind`]).
    Shape,
    /// Decorative overlay artwork.
    Decorative,
    /// Full-canvas background layer.
    Background,
}

impl ElementKind {
    /// Short slug used when generating element ids.
    pub fn slug(self) -> &'static str {
        match self {
            ElementKind::Text => "text",
            ElementKind::Button => "button",
            ElementKind::Image => "image",
            ElementKind::Product => "product",
            ElementKind::Shape => "shape",
            ElementKind::Decorative => "decorative",
            ElementKind::Background => "background",
        }
    }

    /// Default content for a freshly added element of this kind.
    pub fn default_content(self) -> &'static str {
        match self {
            ElementKind::Text => "New text",
            ElementKind::Button => "Shop Now",
            _ => "",
        }
    }

    /// Default size for a freshly added element of this kind.
    pub fn default_size(self) -> Size {
        match self {
            ElementKind::Text => Size::new(220.0, 44.0),
            ElementKind::Button => Size::new(160.0, 48.0),
            ElementKind::Image | ElementKind::Product => Size::new(200.0, 200.0),
            ElementKind::Shape | ElementKind::Decorative => Size::new(120.0, 120.0),
            ElementKind::Background => Size::new(300.0, 250.0),
        }
    }
}

/// Geometric shape variants for [`ElementKind::Shape`] elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
    Rectangle,
    Circle,
    Triangle,
    Line,
    Arrow,
}

/// Semantic role of an element within the creative.
///
/// Roles are assigned at creation time and make [`publish`] extraction a
/// direct lookup instead of guessing from id substrings.
///
/// [`publish`]: crate::editor::CanvasEditor::publish
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Headline,
    Description,
    Cta,
    PrimaryImage,
}

/// Serializable color representation (RGBA8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn black() -> Self {
        Self::new(0, 0, 0, 255)
    }

    pub fn white() -> Self {
        Self::new(255, 255, 255, 255)
    }
}

/// Font families available to text and button elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FontFamily {
    #[default]
    Inter,
    Roboto,
    Georgia,
    Montserrat,
}

impl FontFamily {
    /// Display name for style panels.
    pub fn name(&self) -> &'static str {
        match self {
            FontFamily::Inter => "Inter",
            FontFamily::Roboto => "Roboto",
            FontFamily::Georgia => "Georgia",
            FontFamily::Montserrat => "Montserrat",
        }
    }

    pub fn all() -> &'static [FontFamily] {
        &[
            FontFamily::Inter,
            FontFamily::Roboto,
            FontFamily::Georgia,
            FontFamily::Montserrat,
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FontWeight {
    Light,
    #[default]
    Regular,
    Bold,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    Left,
    #[default]
    Center,
    Right,
}

/// Visual style of an element.
///
/// A closed record: every property the renderer understands is an explicit
/// field, so a typo'd property name is a compile error rather than a silently
/// ignored map entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementStyle {
    /// Fill / background color (buttons, shapes).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill: Option<Rgba>,
    /// Text color.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<Rgba>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_family: Option<FontFamily>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_weight: Option<FontWeight>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_align: Option<TextAlign>,
    /// Corner radius in px (buttons, rectangle shapes).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub border_radius: Option<f64>,
    /// Overall opacity (0.0 = fully transparent, 1.0 = fully opaque).
    #[serde(default = "default_opacity")]
    pub opacity: f64,
}

fn default_opacity() -> f64 {
    1.0
}

impl Default for ElementStyle {
    fn default() -> Self {
        Self {
            fill: None,
            color: None,
            font_size: None,
            font_family: None,
            font_weight: None,
            text_align: None,
            border_radius: None,
            opacity: 1.0,
        }
    }
}

impl ElementStyle {
    /// Apply a partial style update, overwriting only the populated fields.
    pub fn merge(&mut self, patch: &StylePatch) {
        if let Some(fill) = patch.fill {
            self.fill = Some(fill);
        }
        if let Some(color) = patch.color {
            self.color = Some(color);
        }
        if let Some(font_size) = patch.font_size {
            self.font_size = Some(font_size);
        }
        if let Some(font_family) = patch.font_family {
            self.font_family = Some(font_family);
        }
        if let Some(font_weight) = patch.font_weight {
            self.font_weight = Some(font_weight);
        }
        if let Some(text_align) = patch.text_align {
            self.text_align = Some(text_align);
        }
        if let Some(border_radius) = patch.border_radius {
            self.border_radius = Some(border_radius);
        }
        if let Some(opacity) = patch.opacity {
            self.opacity = opacity.clamp(0.0, 1.0);
        }
    }
}

/// Partial style update. Fields left `None` keep their current value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StylePatch {
    pub fill: Option<Rgba>,
    pub color: Option<Rgba>,
    pub font_size: Option<f64>,
    pub font_family: Option<FontFamily>,
    pub font_weight: Option<FontWeight>,
    pub text_align: Option<TextAlign>,
    pub border_radius: Option<f64>,
    pub opacity: Option<f64>,
}

impl StylePatch {
    pub fn is_empty(&self) -> bool {
        *self == StylePatch::default()
    }

    /// Layer a later patch on top of this one (later fields win).
    pub fn merge(&mut self, later: &StylePatch) {
        macro_rules! take {
            ($field:ident) => {
                if later.$field.is_some() {
                    self.$field = later.$field;
                }
            };
        }
        take!(fill);
        take!(color);
        take!(font_size);
        take!(font_family);
        take!(font_weight);
        take!(text_align);
        take!(border_radius);
        take!(opacity);
    }
}

/// One positioned, sized, styled object on the canvas.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Element {
    /// Unique id within a canvas state.
    pub id: String,
    pub kind: ElementKind,
    /// Text content or image URL, depending on `kind`.
    pub content: String,
    /// Top-left corner position in canvas px.
    pub position: Point,
    /// Size in canvas px.
    pub size: Size,
    /// Paint order; higher paints later. Ties break by insertion order.
    pub z_index: i64,
    #[serde(default)]
    pub style: ElementStyle,
    /// Rotation in degrees, normalized to `[0, 360)`. Visual only, around
    /// the element center.
    #[serde(default)]
    pub rotation: f64,
    /// Locked elements accept content/style updates but reject geometry.
    #[serde(default)]
    pub locked: bool,
    #[serde(default = "default_interactive")]
    pub interactive: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shape: Option<ShapeKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

fn default_interactive() -> bool {
    true
}

impl Element {
    /// Create a default element of the given kind at a position.
    pub fn new(kind: ElementKind, position: Point) -> Self {
        Self {
            id: format!("{}-{}", kind.slug(), Uuid::new_v4()),
            kind,
            content: kind.default_content().to_string(),
            position,
            size: kind.default_size(),
            z_index: 0,
            style: ElementStyle::default(),
            rotation: 0.0,
            locked: false,
            interactive: true,
            shape: match kind {
                ElementKind::Shape => Some(ShapeKind::Rectangle),
                _ => None,
            },
            role: None,
        }
    }

    /// Builder-style role assignment.
    pub fn with_role(mut self, role: Role) -> Self {
        self.role = Some(role);
        self
    }

    /// Builder-style style preset.
    pub fn with_style(mut self, style: ElementStyle) -> Self {
        self.style = style;
        self
    }

    /// Bounding rectangle (rotation is not applied; it is visual only).
    pub fn bounds(&self) -> Rect {
        Rect::new(
            self.position.x,
            self.position.y,
            self.position.x + self.size.width,
            self.position.y + self.size.height,
        )
    }

    pub fn center(&self) -> Point {
        self.bounds().center()
    }

    /// Whether this element is well-formed enough to render.
    ///
    /// Malformed elements (empty or artifact-bearing id, non-finite or
    /// non-positive geometry) are skipped by paint-order iteration instead
    /// of failing the whole render.
    pub fn is_structurally_valid(&self) -> bool {
        if self.id.is_empty() || self.id.contains(ID_ARTIFACT) {
            return false;
        }
        let finite = self.position.x.is_finite()
            && self.position.y.is_finite()
            && self.size.width.is_finite()
            && self.size.height.is_finite();
        finite && self.size.width > 0.0 && self.size.height > 0.0
    }
}

/// Normalize an angle in degrees to `[0, 360)`.
pub fn normalize_degrees(angle: f64) -> f64 {
    let wrapped = angle % 360.0;
    if wrapped < 0.0 { wrapped + 360.0 } else { wrapped }
}
