//! Freehand shape drawing driven by pointer input.

use crate::map::projection::Viewport;
use crate::provider::{DrawingManagerOptions, LatLng, OverlayType, ShapeStyle};

/// Clicking within this many braille pixels of the first vertex closes a polygon
pub const SNAP_RADIUS_PX: f64 = 3.0;

/// Shape currently being drawn
#[derive(Clone, Debug, PartialEq)]
enum Sketch {
    Idle,
    Polygon(Vec<LatLng>),
    Rectangle { anchor: LatLng, corner: LatLng },
}

/// A finished shape handed back to the map
#[derive(Clone, Debug, PartialEq)]
pub struct CompletedShape {
    pub overlay_type: OverlayType,
    pub path: Vec<LatLng>,
}

/// Drawing-tool state for one attached manager
pub struct DrawingManager {
    options: DrawingManagerOptions,
    mode: Option<OverlayType>,
    sketch: Sketch,
}

impl DrawingManager {
    pub fn new(options: DrawingManagerOptions) -> Self {
        Self {
            options,
            mode: None,
            sketch: Sketch::Idle,
        }
    }

    pub fn options(&self) -> &DrawingManagerOptions {
        &self.options
    }

    /// `None` is the hand (pan) mode
    pub fn mode(&self) -> Option<OverlayType> {
        self.mode
    }

    pub fn style(&self, overlay_type: OverlayType) -> &ShapeStyle {
        match overlay_type {
            OverlayType::Polygon => &self.options.polygon_options,
            OverlayType::Rectangle => &self.options.rectangle_options,
        }
    }

    /// Switch mode, dropping any unfinished sketch.
    /// Returns false for modes this manager does not offer.
    pub fn set_mode(&mut self, mode: Option<OverlayType>) -> bool {
        if let Some(m) = mode {
            if !self.options.drawing_modes.contains(&m) {
                return false;
            }
        }
        self.mode = mode;
        self.sketch = Sketch::Idle;
        true
    }

    pub fn is_sketching(&self) -> bool {
        self.sketch != Sketch::Idle
    }

    /// Vertices of the unfinished shape, for preview rendering
    pub fn sketch_path(&self) -> Vec<LatLng> {
        match &self.sketch {
            Sketch::Idle => Vec::new(),
            Sketch::Polygon(vertices) => vertices.clone(),
            Sketch::Rectangle { anchor, corner } => rectangle_path(*anchor, *corner),
        }
    }

    /// Whether the preview should be drawn as a closed ring
    pub fn sketch_is_closed(&self) -> bool {
        matches!(self.sketch, Sketch::Rectangle { .. })
    }

    /// Primary button pressed at `at`
    pub fn press(&mut self, at: LatLng, viewport: &Viewport) -> Option<CompletedShape> {
        match self.mode? {
            OverlayType::Polygon => {
                if !matches!(self.sketch, Sketch::Polygon(_)) {
                    self.sketch = Sketch::Polygon(vec![at]);
                    return None;
                }
                let Sketch::Polygon(vertices) = &mut self.sketch else {
                    return None;
                };

                let cursor = viewport.project_f(at);
                let near = |p: &LatLng| viewport.project_f(*p).distance(cursor);
                let closes_on_first = vertices.first().is_some_and(|p| near(p) <= SNAP_RADIUS_PX);
                let repeats_last = vertices.last().is_some_and(|p| near(p) < 1.0);

                if vertices.len() >= 3 && (closes_on_first || repeats_last) {
                    return self.close();
                }
                // Snapping onto a too-short ring adds nothing
                if !repeats_last && !closes_on_first {
                    vertices.push(at);
                }
                None
            }
            OverlayType::Rectangle => {
                self.sketch = Sketch::Rectangle { anchor: at, corner: at };
                None
            }
        }
    }

    /// Pointer moved with the button held
    pub fn drag(&mut self, at: LatLng) {
        if let Sketch::Rectangle { corner, .. } = &mut self.sketch {
            *corner = at;
        }
    }

    /// Primary button released at `at`
    pub fn release(&mut self, at: LatLng, viewport: &Viewport) -> Option<CompletedShape> {
        let Sketch::Rectangle { anchor, .. } = self.sketch else {
            return None;
        };
        self.sketch = Sketch::Idle;

        let (a, b) = (viewport.project_f(anchor), viewport.project_f(at));
        if (a.x - b.x).abs() < 1.0 || (a.y - b.y).abs() < 1.0 {
            return None;
        }
        Some(CompletedShape {
            overlay_type: OverlayType::Rectangle,
            path: rectangle_path(anchor, at),
        })
    }

    /// Finish the polygon being drawn. Fewer than three vertices are discarded.
    pub fn close(&mut self) -> Option<CompletedShape> {
        match std::mem::replace(&mut self.sketch, Sketch::Idle) {
            Sketch::Polygon(path) if path.len() >= 3 => Some(CompletedShape {
                overlay_type: OverlayType::Polygon,
                path,
            }),
            Sketch::Rectangle { anchor, corner } => {
                // Not a polygon gesture; keep dragging state
                self.sketch = Sketch::Rectangle { anchor, corner };
                None
            }
            _ => None,
        }
    }

    /// Drop the unfinished sketch; returns whether there was one
    pub fn cancel(&mut self) -> bool {
        std::mem::replace(&mut self.sketch, Sketch::Idle) != Sketch::Idle
    }
}

/// Corners of the lat/lng box spanned by two opposite corners, counter-clockwise
fn rectangle_path(a: LatLng, b: LatLng) -> Vec<LatLng> {
    let (south, north) = (a.lat.min(b.lat), a.lat.max(b.lat));
    let (west, east) = (a.lng.min(b.lng), a.lng.max(b.lng));
    vec![
        LatLng::new(south, west),
        LatLng::new(south, east),
        LatLng::new(north, east),
        LatLng::new(north, west),
    ]
}
