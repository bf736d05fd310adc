use crossterm::event::{KeyCode, MouseButton, MouseEvent, MouseEventKind};
use ratatui::layout::{Position, Rect};

use crate::config::AppConfig;
use crate::map::{Basemap, MapOptions, TerminalMap};
use crate::provider::{loader, LoaderHandle, OverlayType, SdkLoadError};
use crate::ui;
use crate::view::AreaCalculatorView;

/// Application state
pub struct App {
    pub config: AppConfig,
    pub view: AreaCalculatorView,
    /// Present once the provider finished loading
    pub map: Option<TerminalMap>,
    loader: Option<LoaderHandle>,
    /// Screen rect of the map canvas, in characters
    pub map_area: Rect,
    /// Current mouse position for cursor marker
    pub mouse_pos: Option<(u16, u16)>,
    pub should_quit: bool,
}

impl App {
    /// Start the provider loader and wait for it in the background
    pub fn new(config: AppConfig, frame_area: Rect) -> Self {
        let handle = loader::spawn(config.loader_request());
        let mut app = Self::without_loader(config, frame_area);
        app.loader = Some(handle);
        app
    }

    /// App whose load outcome is supplied through [`App::finish_loading`]
    pub fn without_loader(config: AppConfig, frame_area: Rect) -> Self {
        Self {
            config,
            view: AreaCalculatorView::new(),
            map: None,
            loader: None,
            map_area: ui::map_inner_area(frame_area),
            mouse_pos: None,
            should_quit: false,
        }
    }

    /// Per-frame housekeeping: collect the load outcome, route map events
    pub fn tick(&mut self) {
        if let Some(result) = self.loader.as_mut().and_then(LoaderHandle::poll) {
            self.loader = None;
            self.finish_loading(result);
        }
        self.dispatch_events();
    }

    /// Apply the provider bootstrap outcome
    pub fn finish_loading(&mut self, result: Result<Basemap, SdkLoadError>) {
        match result {
            Ok(basemap) => {
                self.view.on_sdk_result(Ok(()));
                let mut map = TerminalMap::new(
                    MapOptions {
                        center: self.config.center,
                        zoom: self.config.zoom,
                        width: self.map_area.width as usize * 2,
                        height: self.map_area.height as usize * 4,
                    },
                    basemap,
                );
                self.view.on_map_load(&mut map);
                self.map = Some(map);
            }
            Err(e) => self.view.on_sdk_result(Err(e)),
        }
    }

    /// Hand queued completion notifications to the view
    pub fn dispatch_events(&mut self) {
        let Some(map) = self.map.as_mut() else {
            return;
        };
        for event in map.drain_events() {
            self.view.on_overlay_complete(event, map);
        }
    }

    /// Rebuild the original view (keeps drawn shapes and the area)
    pub fn reset_view(&mut self) {
        if let Some(map) = self.map.as_mut() {
            let (width, height) = (map.viewport.width, map.viewport.height);
            map.viewport = crate::map::Viewport::from_zoom_level(
                self.config.center,
                self.config.zoom,
                width,
                height,
            );
        }
    }

    /// Update canvas size when the terminal resizes
    pub fn resize(&mut self, width: u16, height: u16) {
        self.map_area = ui::map_inner_area(Rect::new(0, 0, width, height));
        if let Some(map) = self.map.as_mut() {
            map.resize(self.map_area.width as usize * 2, self.map_area.height as usize * 4);
        }
    }

    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    pub fn handle_key(&mut self, code: KeyCode) {
        if matches!(code, KeyCode::Char('q')) {
            self.quit();
            return;
        }
        let Some(map) = self.map.as_mut() else {
            return;
        };

        match code {
            KeyCode::Left | KeyCode::Char('h') => map.viewport.pan(-10, 0),
            KeyCode::Right | KeyCode::Char('l') => map.viewport.pan(10, 0),
            KeyCode::Up | KeyCode::Char('k') => map.viewport.pan(0, -8),
            KeyCode::Down | KeyCode::Char('j') => map.viewport.pan(0, 8),
            KeyCode::Char('+') | KeyCode::Char('=') => map.viewport.zoom_in(),
            KeyCode::Char('-') | KeyCode::Char('_') => map.viewport.zoom_out(),

            KeyCode::Char('p') => {
                map.set_drawing_mode(Some(OverlayType::Polygon));
            }
            KeyCode::Char('r') => {
                map.set_drawing_mode(Some(OverlayType::Rectangle));
            }
            KeyCode::Char('m') => {
                map.set_drawing_mode(None);
            }
            KeyCode::Enter => map.close_sketch(),
            KeyCode::Esc => {
                // First Esc drops the sketch, second leaves the drawing tool
                if !map.cancel_sketch() {
                    map.set_drawing_mode(None);
                }
            }
            KeyCode::Char('0') => self.reset_view(),
            _ => {}
        }
        self.dispatch_events();
    }

    /// Terminal cell to braille pixel inside the map canvas (cell center)
    fn canvas_pixel(&self, col: u16, row: u16) -> Option<(i32, i32)> {
        if !self.map_area.contains(Position::new(col, row)) {
            return None;
        }
        let px = i32::from(col - self.map_area.x) * 2 + 1;
        let py = i32::from(row - self.map_area.y) * 4 + 2;
        Some((px, py))
    }

    /// Toolbar button under a cell, if any
    fn control_hit(&self, col: u16, row: u16) -> Option<Option<OverlayType>> {
        let manager = self.map.as_ref()?.active_manager()?;
        ui::control_buttons(self.map_area, manager.options())
            .into_iter()
            .find(|(rect, _)| rect.contains(Position::new(col, row)))
            .map(|(_, mode)| mode)
    }

    pub fn handle_mouse(&mut self, mouse: MouseEvent) {
        self.mouse_pos = Some((mouse.column, mouse.row));

        if let (MouseEventKind::Down(MouseButton::Left), Some(mode)) =
            (mouse.kind, self.control_hit(mouse.column, mouse.row))
        {
            if let Some(map) = self.map.as_mut() {
                map.set_drawing_mode(mode);
            }
            return;
        }

        let pixel = self.canvas_pixel(mouse.column, mouse.row);
        let Some(map) = self.map.as_mut() else {
            return;
        };

        match (mouse.kind, pixel) {
            (MouseEventKind::ScrollUp, Some((px, py))) => map.viewport.zoom_in_at(px, py),
            (MouseEventKind::ScrollDown, Some((px, py))) => map.viewport.zoom_out_at(px, py),
            (MouseEventKind::ScrollLeft, _) => map.viewport.pan(-15, 0),
            (MouseEventKind::ScrollRight, _) => map.viewport.pan(15, 0),
            (MouseEventKind::Down(MouseButton::Left), Some((px, py))) => map.pointer_down(px, py),
            (MouseEventKind::Drag(MouseButton::Left), Some((px, py))) => map.pointer_drag(px, py),
            (MouseEventKind::Up(MouseButton::Left), Some((px, py))) => map.pointer_up(px, py),
            // Releasing outside the canvas still ends a drag
            (MouseEventKind::Up(MouseButton::Left), None) => {
                let (w, h) = (map.viewport.width as i32, map.viewport.height as i32);
                let col = i32::from(mouse.column.saturating_sub(self.map_area.x)) * 2;
                let row = i32::from(mouse.row.saturating_sub(self.map_area.y)) * 4;
                map.pointer_up(col.clamp(0, w), row.clamp(0, h));
            }
            (MouseEventKind::Down(MouseButton::Right), _) => map.close_sketch(),
            _ => {}
        }
        self.dispatch_events();
    }

    pub fn zoom_level(&self) -> String {
        self.map
            .as_ref()
            .map_or_else(|| "-".to_string(), |m| format!("{:.1}", m.viewport.zoom_level()))
    }

    pub fn center_coords(&self) -> String {
        let Some(map) = &self.map else {
            return String::new();
        };
        let c = map.viewport.center;
        format!(
            "{:.4}°{}, {:.4}°{}",
            c.lat.abs(),
            if c.lat >= 0.0 { "N" } else { "S" },
            c.lng.abs(),
            if c.lng >= 0.0 { "E" } else { "W" }
        )
    }

    pub fn mode_label(&self) -> &'static str {
        match self.map.as_ref().and_then(TerminalMap::drawing_mode) {
            Some(mode) => mode.label(),
            None => "Pan",
        }
    }
}

impl Drop for App {
    fn drop(&mut self) {
        if let Some(map) = self.map.as_mut() {
            self.view.teardown(map);
        }
    }
}
