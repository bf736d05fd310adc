use std::collections::{BTreeMap, VecDeque};

use crate::braille::BrailleCanvas;
use crate::map::basemap::{Basemap, BasemapLayers};
use crate::map::drawing::{CompletedShape, DrawingManager};
use crate::map::projection::Viewport;
use crate::map::raster::{draw_marker, draw_path, draw_ring, fill_polygon};
use crate::provider::{
    DrawingManagerId, DrawingManagerOptions, LatLng, ListenerRegistry, MapHandle, Overlay,
    OverlayCompleteEvent, OverlayId, OverlayType, ShapeStyle, Subscription,
};

/// Map construction parameters
#[derive(Clone, Debug)]
pub struct MapOptions {
    pub center: LatLng,
    /// Web-map zoom level
    pub zoom: f64,
    /// Container size in braille pixels
    pub width: usize,
    pub height: usize,
}

/// One shape rendered in its own colors
pub struct OverlayLayer {
    pub fill: BrailleCanvas,
    pub stroke: BrailleCanvas,
    pub fill_color: String,
    pub stroke_color: String,
}

/// Everything needed to paint one frame of the map
pub struct MapLayers {
    pub basemap: BasemapLayers,
    pub overlays: Vec<OverlayLayer>,
    pub sketch: BrailleCanvas,
    pub sketch_color: String,
}

struct PlacedOverlay {
    overlay: Overlay,
    style: ShapeStyle,
}

/// Braille-rendered map with drawing support
pub struct TerminalMap {
    pub viewport: Viewport,
    basemap: Basemap,
    overlays: BTreeMap<OverlayId, PlacedOverlay>,
    managers: Vec<(DrawingManagerId, DrawingManager)>,
    listeners: ListenerRegistry,
    events: VecDeque<OverlayCompleteEvent>,
    next_id: u64,
    /// Last pointer position while panning in hand mode
    pan_anchor: Option<(i32, i32)>,
}

impl TerminalMap {
    pub fn new(options: MapOptions, basemap: Basemap) -> Self {
        log::info!(
            "Map created at {} zoom {} ({}x{} px, {} basemap lines)",
            options.center,
            options.zoom,
            options.width,
            options.height,
            basemap.line_count()
        );
        Self {
            viewport: Viewport::from_zoom_level(
                options.center,
                options.zoom,
                options.width,
                options.height,
            ),
            basemap,
            overlays: BTreeMap::new(),
            managers: Vec::new(),
            listeners: ListenerRegistry::new(),
            events: VecDeque::new(),
            next_id: 1,
            pan_anchor: None,
        }
    }

    pub fn resize(&mut self, width: usize, height: usize) {
        self.viewport.width = width;
        self.viewport.height = height;
    }

    fn next_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// The manager receiving pointer input (most recently attached)
    pub fn active_manager(&self) -> Option<&DrawingManager> {
        self.managers.last().map(|(_, manager)| manager)
    }

    pub fn drawing_manager_count(&self) -> usize {
        self.managers.len()
    }

    pub fn overlay_count(&self) -> usize {
        self.overlays.len()
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.listener_count()
    }

    pub fn set_drawing_mode(&mut self, mode: Option<OverlayType>) -> bool {
        match self.managers.last_mut() {
            Some((_, manager)) => manager.set_mode(mode),
            None => false,
        }
    }

    pub fn drawing_mode(&self) -> Option<OverlayType> {
        self.active_manager().and_then(DrawingManager::mode)
    }

    /// Primary button down at a canvas pixel
    pub fn pointer_down(&mut self, px: i32, py: i32) {
        let at = self.viewport.unproject(px, py);
        let viewport = &self.viewport;
        let completed = match self.managers.last_mut() {
            Some((id, manager)) if manager.mode().is_some() => {
                manager.press(at, viewport).map(|shape| (*id, shape))
            }
            _ => {
                self.pan_anchor = Some((px, py));
                None
            }
        };
        if let Some((id, shape)) = completed {
            self.complete(id, shape);
        }
    }

    pub fn pointer_drag(&mut self, px: i32, py: i32) {
        if let Some((last_x, last_y)) = self.pan_anchor {
            self.viewport.pan(last_x - px, last_y - py);
            self.pan_anchor = Some((px, py));
            return;
        }
        let at = self.viewport.unproject(px, py);
        if let Some((_, manager)) = self.managers.last_mut() {
            manager.drag(at);
        }
    }

    pub fn pointer_up(&mut self, px: i32, py: i32) {
        if self.pan_anchor.take().is_some() {
            return;
        }
        let at = self.viewport.unproject(px, py);
        let viewport = &self.viewport;
        let completed = self
            .managers
            .last_mut()
            .and_then(|(id, manager)| manager.release(at, viewport).map(|shape| (*id, shape)));
        if let Some((id, shape)) = completed {
            self.complete(id, shape);
        }
    }

    /// Finish the polygon being drawn (Enter / right click)
    pub fn close_sketch(&mut self) {
        let completed = self
            .managers
            .last_mut()
            .and_then(|(id, manager)| manager.close().map(|shape| (*id, shape)));
        if let Some((id, shape)) = completed {
            self.complete(id, shape);
        }
    }

    pub fn cancel_sketch(&mut self) -> bool {
        self.managers
            .last_mut()
            .is_some_and(|(_, manager)| manager.cancel())
    }

    /// Place a finished shape on the map and queue its notification
    fn complete(&mut self, manager_id: DrawingManagerId, shape: CompletedShape) {
        let Some(style) = self
            .managers
            .iter()
            .find(|(id, _)| *id == manager_id)
            .map(|(_, manager)| manager.style(shape.overlay_type).clone())
        else {
            return;
        };

        let overlay = Overlay {
            id: OverlayId(self.next_id()),
            overlay_type: shape.overlay_type,
            path: shape.path,
        };
        log::debug!(
            "{} {:?} completed with {} vertices",
            overlay.overlay_type.label(),
            overlay.id,
            overlay.path.len()
        );

        self.events.push_back(OverlayCompleteEvent {
            manager: manager_id,
            overlay_type: overlay.overlay_type,
            overlay: overlay.clone(),
        });
        self.overlays.insert(overlay.id, PlacedOverlay { overlay, style });
    }

    /// Take pending notifications for managers that still have listeners
    pub fn drain_events(&mut self) -> Vec<OverlayCompleteEvent> {
        let listeners = &self.listeners;
        self.events
            .drain(..)
            .filter(|event| listeners.is_subscribed(event.manager))
            .collect()
    }

    /// Render into `width` x `height` character canvases
    pub fn render(&self, width: usize, height: usize) -> MapLayers {
        let basemap = self.basemap.render(width, height, &self.viewport);

        let overlays = self
            .overlays
            .values()
            .map(|placed| {
                let mut fill = BrailleCanvas::new(width, height);
                let mut stroke = BrailleCanvas::new(width, height);
                let ring: Vec<_> = placed
                    .overlay
                    .path
                    .iter()
                    .map(|&p| self.viewport.project_f(p))
                    .collect();
                let pixels: Vec<(i32, i32)> = placed
                    .overlay
                    .path
                    .iter()
                    .map(|&p| self.viewport.project(p))
                    .collect();
                fill_polygon(&mut fill, &ring, placed.style.fill_opacity);
                draw_ring(&mut stroke, &pixels, placed.style.stroke_weight);
                OverlayLayer {
                    fill,
                    stroke,
                    fill_color: placed.style.fill_color.clone(),
                    stroke_color: placed.style.stroke_color.clone(),
                }
            })
            .collect();

        let mut sketch = BrailleCanvas::new(width, height);
        let mut sketch_color = String::new();
        if let Some(manager) = self.active_manager().filter(|m| m.is_sketching()) {
            let pixels: Vec<(i32, i32)> = manager
                .sketch_path()
                .iter()
                .map(|&p| self.viewport.project(p))
                .collect();
            if manager.sketch_is_closed() {
                draw_ring(&mut sketch, &pixels, 1);
            } else {
                draw_path(&mut sketch, &pixels, 1);
                for &(x, y) in &pixels {
                    draw_marker(&mut sketch, x, y, 1);
                }
            }
            if let Some(mode) = manager.mode() {
                sketch_color = manager.style(mode).stroke_color.clone();
            }
        }

        MapLayers {
            basemap,
            overlays,
            sketch,
            sketch_color,
        }
    }
}

impl MapHandle for TerminalMap {
    fn attach_drawing_manager(&mut self, options: DrawingManagerOptions) -> DrawingManagerId {
        let id = DrawingManagerId(self.next_id());
        log::debug!("Drawing manager {:?} attached with modes {:?}", id, options.drawing_modes);
        self.managers.push((id, DrawingManager::new(options)));
        id
    }

    fn detach_drawing_manager(&mut self, id: DrawingManagerId) {
        self.managers.retain(|(manager_id, _)| *manager_id != id);
        self.events.retain(|event| event.manager != id);
    }

    fn subscribe_overlay_complete(&mut self, manager: DrawingManagerId) -> Subscription {
        self.listeners.subscribe(manager)
    }

    fn remove_overlay(&mut self, id: OverlayId) {
        self.overlays.remove(&id);
    }

    fn has_overlay(&self, id: OverlayId) -> bool {
        self.overlays.contains_key(&id)
    }
}
