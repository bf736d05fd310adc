//! The map provider boundary.
//!
//! Everything the area calculator needs from a map provider is reached
//! through the types in this module: a bootstrap loader, a [`MapHandle`]
//! capability for the constructed map, drawing-manager configuration,
//! completion notifications and the spherical geometry utility.

pub mod loader;
pub mod spherical;
mod subscription;

use serde::{Deserialize, Serialize};
use std::fmt;

pub use loader::{LoaderHandle, LoaderRequest, SdkLoadError};
pub use subscription::{ListenerRegistry, Subscription};

/// A geographic coordinate in degrees
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

impl fmt::Display for LatLng {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.6}, {:.6})", self.lat, self.lng)
    }
}

/// Feature modules that can be requested at bootstrap
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Library {
    Drawing,
    Geometry,
}

impl Library {
    pub fn name(self) -> &'static str {
        match self {
            Library::Drawing => "drawing",
            Library::Geometry => "geometry",
        }
    }
}

/// Shape kinds the drawing manager can produce
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OverlayType {
    Polygon,
    Rectangle,
}

impl OverlayType {
    pub fn label(self) -> &'static str {
        match self {
            OverlayType::Polygon => "Polygon",
            OverlayType::Rectangle => "Rectangle",
        }
    }
}

/// Where a map control is anchored
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ControlPosition {
    TopLeft,
    TopCenter,
    TopRight,
    BottomLeft,
    BottomCenter,
    BottomRight,
}

/// Styling applied to shapes created by a drawing manager
#[derive(Clone, Debug, PartialEq)]
pub struct ShapeStyle {
    /// Fill color as `#RRGGBB`
    pub fill_color: String,
    /// 0.0 (transparent) to 1.0 (solid)
    pub fill_opacity: f64,
    /// Stroke color as `#RRGGBB`
    pub stroke_color: String,
    /// Stroke width in braille pixels
    pub stroke_weight: u8,
    /// Provider hints; the terminal map does not enforce either
    pub clickable: bool,
    pub editable: bool,
}

impl Default for ShapeStyle {
    fn default() -> Self {
        Self {
            fill_color: "#000000".to_string(),
            fill_opacity: 0.3,
            stroke_color: "#000000".to_string(),
            stroke_weight: 1,
            clickable: true,
            editable: false,
        }
    }
}

/// Configuration for a drawing-tool overlay
#[derive(Clone, Debug, PartialEq)]
pub struct DrawingManagerOptions {
    /// Show the mode toolbar
    pub drawing_control: bool,
    pub control_position: ControlPosition,
    /// Modes offered by the toolbar, in display order
    pub drawing_modes: Vec<OverlayType>,
    pub polygon_options: ShapeStyle,
    pub rectangle_options: ShapeStyle,
}

impl Default for DrawingManagerOptions {
    fn default() -> Self {
        Self {
            drawing_control: true,
            control_position: ControlPosition::TopCenter,
            drawing_modes: vec![OverlayType::Polygon, OverlayType::Rectangle],
            polygon_options: ShapeStyle::default(),
            rectangle_options: ShapeStyle::default(),
        }
    }
}

/// Identifies a shape on the map
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OverlayId(pub u64);

/// Identifies a drawing manager attached to a map
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DrawingManagerId(pub u64);

/// A completed shape: its declared type and its vertex path
#[derive(Clone, Debug, PartialEq)]
pub struct Overlay {
    pub id: OverlayId,
    pub overlay_type: OverlayType,
    /// Vertices in drawing order; the closing edge is implicit
    pub path: Vec<LatLng>,
}

/// Notification emitted when the user finishes drawing a shape
#[derive(Clone, Debug, PartialEq)]
pub struct OverlayCompleteEvent {
    pub manager: DrawingManagerId,
    pub overlay_type: OverlayType,
    pub overlay: Overlay,
}

/// Capability handed to the view once the map is constructed.
pub trait MapHandle {
    /// Create a drawing manager with `options` and attach it to this map.
    fn attach_drawing_manager(&mut self, options: DrawingManagerOptions) -> DrawingManagerId;

    /// Detach a drawing manager. Shapes it already produced stay on the map.
    fn detach_drawing_manager(&mut self, id: DrawingManagerId);

    /// Register for overlay-complete notifications from `manager`.
    /// Delivery stops once the returned subscription is dropped.
    fn subscribe_overlay_complete(&mut self, manager: DrawingManagerId) -> Subscription;

    /// Take a shape off the map. Unknown ids are ignored.
    fn remove_overlay(&mut self, id: OverlayId);

    fn has_overlay(&self, id: OverlayId) -> bool;
}
