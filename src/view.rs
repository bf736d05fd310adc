//! The area calculator: wires a drawing manager onto the map and turns
//! completed polygons into an area readout.

use std::fmt;

use crate::provider::spherical;
use crate::provider::{
    ControlPosition, DrawingManagerId, DrawingManagerOptions, MapHandle, OverlayCompleteEvent,
    OverlayType, SdkLoadError, ShapeStyle, Subscription,
};

pub const LOAD_ERROR_PREFIX: &str = "Error loading Google Maps API: ";
pub const LOADING_TEXT: &str = "Loading Google Maps...";
pub const PANEL_TITLE: &str = "Draw Area Calculator";
pub const PROMPT_TEXT: &str = "Use the drawing tools to draw a polygon and calculate the area.";

/// Provider bootstrap progress. `Failed` is terminal.
#[derive(Clone, Debug, PartialEq)]
pub enum SdkState {
    Loading,
    Ready,
    Failed(SdkLoadError),
}

/// What the view shows
#[derive(Clone, Debug, PartialEq)]
pub enum ViewOutput {
    LoadError(String),
    Loading,
    Map(StatusPanel),
}

/// Overlay panel on top of the map
#[derive(Clone, Debug, PartialEq)]
pub struct StatusPanel {
    pub title: &'static str,
    pub body: PanelBody,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PanelBody {
    Prompt,
    /// Square meters
    Area(f64),
}

impl PanelBody {
    /// Area with two decimals, without unit
    pub fn formatted_area(area: f64) -> String {
        format!("{area:.2}")
    }
}

impl fmt::Display for PanelBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PanelBody::Prompt => f.write_str(PROMPT_TEXT),
            PanelBody::Area(area) => {
                write!(f, "Selected Area: {} m²", Self::formatted_area(*area))
            }
        }
    }
}

/// Drawing manager this view attached, and the listener on it
struct Wiring {
    manager: DrawingManagerId,
    _subscription: Subscription,
}

pub struct AreaCalculatorView {
    state: SdkState,
    /// Area of the last completed polygon; replaced, never accumulated
    area: Option<f64>,
    wiring: Option<Wiring>,
}

impl Default for AreaCalculatorView {
    fn default() -> Self {
        Self::new()
    }
}

impl AreaCalculatorView {
    pub fn new() -> Self {
        Self {
            state: SdkState::Loading,
            area: None,
            wiring: None,
        }
    }

    pub fn state(&self) -> &SdkState {
        &self.state
    }

    pub fn area(&self) -> Option<f64> {
        self.area
    }

    pub fn drawing_manager(&self) -> Option<DrawingManagerId> {
        self.wiring.as_ref().map(|w| w.manager)
    }

    /// Drawing tools: polygon and rectangle at the bottom center
    pub fn drawing_options() -> DrawingManagerOptions {
        DrawingManagerOptions {
            drawing_control: true,
            control_position: ControlPosition::BottomCenter,
            drawing_modes: vec![OverlayType::Polygon, OverlayType::Rectangle],
            polygon_options: ShapeStyle {
                fill_color: "#2196F3".to_string(),
                fill_opacity: 0.5,
                stroke_color: "#0D47A1".to_string(),
                stroke_weight: 2,
                clickable: true,
                editable: true,
            },
            rectangle_options: ShapeStyle::default(),
        }
    }

    /// Record the bootstrap outcome. Only the first outcome counts.
    pub fn on_sdk_result(&mut self, result: Result<(), SdkLoadError>) {
        if self.state != SdkState::Loading {
            log::warn!("Ignoring late provider load result: {:?}", result);
            return;
        }
        self.state = match result {
            Ok(()) => SdkState::Ready,
            Err(e) => {
                log::error!("{LOAD_ERROR_PREFIX}{e}");
                SdkState::Failed(e)
            }
        };
    }

    /// Map constructed: attach the drawing tools and listen for completions.
    ///
    /// Returns the attached manager, or `None` if the provider is not ready.
    /// Calling again replaces the previous wiring.
    pub fn on_map_load<M: MapHandle + ?Sized>(&mut self, map: &mut M) -> Option<DrawingManagerId> {
        if self.state != SdkState::Ready {
            log::warn!("Map load before provider is ready, ignoring");
            return None;
        }
        self.teardown(map);

        let manager = map.attach_drawing_manager(Self::drawing_options());
        let subscription = map.subscribe_overlay_complete(manager);
        log::info!("Map loaded, drawing manager {:?} attached", manager);

        self.wiring = Some(Wiring {
            manager,
            _subscription: subscription,
        });
        Some(manager)
    }

    /// A shape was finished on the map
    pub fn on_overlay_complete<M: MapHandle + ?Sized>(
        &mut self,
        event: OverlayCompleteEvent,
        map: &mut M,
    ) {
        if self.drawing_manager() != Some(event.manager) {
            log::debug!("Dropping event from foreign drawing manager {:?}", event.manager);
            return;
        }

        match event.overlay_type {
            OverlayType::Polygon => {
                let path = &event.overlay.path;
                let area = spherical::compute_area(path);
                let points: Vec<String> = path.iter().map(ToString::to_string).collect();
                log::info!("Polygon completed: [{}]", points.join(", "));
                log::info!(
                    "Polygon area (m²): {area}, perimeter (m): {:.2}",
                    spherical::compute_perimeter(path)
                );

                self.area = Some(area);
                map.remove_overlay(event.overlay.id);
            }
            OverlayType::Rectangle => {
                log::debug!("Rectangle {:?} completed, no area computed", event.overlay.id);
            }
        }
    }

    /// Detach the drawing tools and release the listener
    pub fn teardown<M: MapHandle + ?Sized>(&mut self, map: &mut M) {
        if let Some(wiring) = self.wiring.take() {
            map.detach_drawing_manager(wiring.manager);
        }
    }

    pub fn render(&self) -> ViewOutput {
        match &self.state {
            SdkState::Failed(e) => ViewOutput::LoadError(format!("{LOAD_ERROR_PREFIX}{e}")),
            SdkState::Loading => ViewOutput::Loading,
            SdkState::Ready => ViewOutput::Map(StatusPanel {
                title: PANEL_TITLE,
                body: self.area.map_or(PanelBody::Prompt, PanelBody::Area),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{LatLng, ListenerRegistry, Overlay, OverlayId};
    use approx::assert_relative_eq;
    use std::collections::HashSet;

    /// Map double that records what the view does to it
    #[derive(Default)]
    struct RecordingMap {
        attached: Vec<DrawingManagerId>,
        options: Vec<DrawingManagerOptions>,
        overlays: HashSet<OverlayId>,
        listeners: ListenerRegistry,
        next: u64,
    }

    impl MapHandle for RecordingMap {
        fn attach_drawing_manager(&mut self, options: DrawingManagerOptions) -> DrawingManagerId {
            self.options.push(options);
            self.next += 1;
            let id = DrawingManagerId(self.next);
            self.attached.push(id);
            id
        }

        fn detach_drawing_manager(&mut self, id: DrawingManagerId) {
            self.attached.retain(|m| *m != id);
        }

        fn subscribe_overlay_complete(&mut self, manager: DrawingManagerId) -> Subscription {
            self.listeners.subscribe(manager)
        }

        fn remove_overlay(&mut self, id: OverlayId) {
            self.overlays.remove(&id);
        }

        fn has_overlay(&self, id: OverlayId) -> bool {
            self.overlays.contains(&id)
        }
    }

    fn ready_view(map: &mut RecordingMap) -> AreaCalculatorView {
        let mut view = AreaCalculatorView::new();
        view.on_sdk_result(Ok(()));
        view.on_map_load(map).expect("wired");
        view
    }

    fn square() -> Vec<LatLng> {
        vec![
            LatLng::new(37.70, -122.50),
            LatLng::new(37.70, -122.40),
            LatLng::new(37.80, -122.40),
            LatLng::new(37.80, -122.50),
        ]
    }

    fn complete(
        map: &mut RecordingMap,
        view: &AreaCalculatorView,
        id: u64,
        overlay_type: OverlayType,
        path: Vec<LatLng>,
    ) -> OverlayCompleteEvent {
        let id = OverlayId(id);
        map.overlays.insert(id);
        OverlayCompleteEvent {
            manager: view.drawing_manager().expect("wired"),
            overlay_type,
            overlay: Overlay { id, overlay_type, path },
        }
    }

    #[test]
    fn test_one_manager_per_map_load() {
        let mut map = RecordingMap::default();
        let mut view = ready_view(&mut map);
        assert_eq!(map.attached.len(), 1);
        assert_eq!(map.listeners.listener_count(), 1);

        let options = &map.options[0];
        assert!(options.drawing_control);
        assert_eq!(options.control_position, ControlPosition::BottomCenter);
        assert_eq!(
            options.drawing_modes,
            vec![OverlayType::Polygon, OverlayType::Rectangle]
        );
        let polygon = &options.polygon_options;
        assert_eq!(polygon.fill_color, "#2196F3");
        assert_relative_eq!(polygon.fill_opacity, 0.5);
        assert_eq!(polygon.stroke_color, "#0D47A1");
        assert_eq!(polygon.stroke_weight, 2);
        assert!(polygon.clickable);
        assert!(polygon.editable);

        view.on_map_load(&mut map);
        assert_eq!(map.attached.len(), 1);
        assert_eq!(map.listeners.listener_count(), 1);
    }

    #[test]
    fn test_map_load_requires_ready() {
        let mut map = RecordingMap::default();
        let mut view = AreaCalculatorView::new();
        assert!(view.on_map_load(&mut map).is_none());
        view.on_sdk_result(Err(SdkLoadError::Provider("nope".into())));
        assert!(view.on_map_load(&mut map).is_none());
        assert!(map.attached.is_empty());
    }

    #[test]
    fn test_polygon_area_stored_and_overlay_removed() {
        let mut map = RecordingMap::default();
        let mut view = ready_view(&mut map);
        let event = complete(&mut map, &view, 10, OverlayType::Polygon, square());

        view.on_overlay_complete(event, &mut map);

        let area = view.area().expect("area stored");
        assert!(area > 0.0);
        assert_relative_eq!(area, spherical::compute_area(&square()));
        assert!(!map.has_overlay(OverlayId(10)));
    }

    #[test]
    fn test_new_polygon_replaces_area() {
        let mut map = RecordingMap::default();
        let mut view = ready_view(&mut map);
        let big = complete(&mut map, &view, 1, OverlayType::Polygon, square());
        view.on_overlay_complete(big, &mut map);

        let small_path = square()[..3].to_vec();
        let small = complete(&mut map, &view, 2, OverlayType::Polygon, small_path.clone());
        view.on_overlay_complete(small, &mut map);

        assert_relative_eq!(
            view.area().expect("area"),
            spherical::compute_area(&small_path)
        );
    }

    #[test]
    fn test_clockwise_polygon_area_is_positive() {
        let mut map = RecordingMap::default();
        let mut view = ready_view(&mut map);
        let cw: Vec<_> = square().into_iter().rev().collect();
        let event = complete(&mut map, &view, 3, OverlayType::Polygon, cw);
        view.on_overlay_complete(event, &mut map);
        assert!(view.area().is_some_and(|a| a > 0.0));
    }

    #[test]
    fn test_rectangle_completion_ignored() {
        let mut map = RecordingMap::default();
        let mut view = ready_view(&mut map);
        let polygon = complete(&mut map, &view, 1, OverlayType::Polygon, square());
        view.on_overlay_complete(polygon, &mut map);
        let before = view.area();

        let rect = complete(&mut map, &view, 2, OverlayType::Rectangle, square());
        view.on_overlay_complete(rect, &mut map);

        assert_eq!(view.area(), before);
        // Rectangles stay on the map
        assert!(map.has_overlay(OverlayId(2)));
    }

    #[test]
    fn test_events_from_other_managers_ignored() {
        let mut map = RecordingMap::default();
        let mut view = ready_view(&mut map);
        let mut event = complete(&mut map, &view, 4, OverlayType::Polygon, square());
        event.manager = DrawingManagerId(999);
        view.on_overlay_complete(event, &mut map);
        assert_eq!(view.area(), None);
        assert!(map.has_overlay(OverlayId(4)));
    }

    #[test]
    fn test_render_states() {
        let mut view = AreaCalculatorView::new();
        assert_eq!(view.render(), ViewOutput::Loading);

        view.on_sdk_result(Ok(()));
        let ViewOutput::Map(panel) = view.render() else {
            panic!("expected map output");
        };
        assert_eq!(panel.title, "Draw Area Calculator");
        assert_eq!(panel.body, PanelBody::Prompt);
        assert_eq!(
            panel.body.to_string(),
            "Use the drawing tools to draw a polygon and calculate the area."
        );
    }

    #[test]
    fn test_render_area_two_decimals() {
        assert_eq!(
            PanelBody::Area(1234.5).to_string(),
            "Selected Area: 1234.50 m²"
        );
        assert_eq!(PanelBody::formatted_area(0.004), "0.00");
    }

    #[test]
    fn test_render_load_error_verbatim() {
        let mut view = AreaCalculatorView::new();
        view.on_sdk_result(Err(SdkLoadError::Provider("quota exceeded".into())));
        assert_eq!(
            view.render(),
            ViewOutput::LoadError("Error loading Google Maps API: quota exceeded".into())
        );

        // Terminal: a later success does not recover
        view.on_sdk_result(Ok(()));
        assert!(matches!(view.state(), SdkState::Failed(_)));
    }

    #[test]
    fn test_teardown_releases_listener() {
        let mut map = RecordingMap::default();
        let mut view = ready_view(&mut map);
        view.teardown(&mut map);
        assert!(map.attached.is_empty());
        assert_eq!(map.listeners.listener_count(), 0);
        assert!(view.drawing_manager().is_none());
    }

    #[test]
    fn test_dropping_view_releases_listener() {
        let mut map = RecordingMap::default();
        let view = ready_view(&mut map);
        assert_eq!(map.listeners.listener_count(), 1);
        drop(view);
        assert_eq!(map.listeners.listener_count(), 0);
    }
}
