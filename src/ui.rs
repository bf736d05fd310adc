use crate::app::App;
use crate::braille::{BrailleCanvas, BLANK};
use crate::map::MapLayers;
use crate::provider::{ControlPosition, DrawingManagerOptions, OverlayType};
use crate::view::{PanelBody, StatusPanel, ViewOutput};
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Position, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Widget},
    Frame,
};

/// Screen split: map on top, one-line status bar below
fn layout(area: Rect) -> (Rect, Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(1)])
        .split(area);
    (chunks[0], chunks[1])
}

fn map_block() -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
}

/// Character area the map canvas occupies for a given terminal size
pub fn map_inner_area(frame_area: Rect) -> Rect {
    map_block().inner(layout(frame_area).0)
}

/// Toolbar buttons as (screen rect, mode) pairs; `None` is the hand tool
pub fn control_buttons(
    map_area: Rect,
    options: &DrawingManagerOptions,
) -> Vec<(Rect, Option<OverlayType>)> {
    if !options.drawing_control || map_area.height == 0 {
        return Vec::new();
    }

    let modes: Vec<Option<OverlayType>> = std::iter::once(None)
        .chain(options.drawing_modes.iter().copied().map(Some))
        .collect();
    let widths: Vec<u16> = modes.iter().map(|m| button_label(*m).chars().count() as u16).collect();
    let total = widths.iter().sum::<u16>() + widths.len().saturating_sub(1) as u16;

    let left = map_area.x + 1;
    let right = (map_area.x + map_area.width).saturating_sub(total + 1).max(left);
    let center = (map_area.x + map_area.width.saturating_sub(total) / 2).max(left);
    let top = map_area.y;
    let bottom = map_area.y + map_area.height - 1;

    let (mut x, y) = match options.control_position {
        ControlPosition::TopLeft => (left, top),
        ControlPosition::TopCenter => (center, top),
        ControlPosition::TopRight => (right, top),
        ControlPosition::BottomLeft => (left, bottom),
        ControlPosition::BottomCenter => (center, bottom),
        ControlPosition::BottomRight => (right, bottom),
    };

    let mut buttons = Vec::with_capacity(modes.len());
    for (mode, width) in modes.into_iter().zip(widths) {
        let rect = Rect::new(x, y, width, 1).intersection(map_area);
        if !rect.is_empty() {
            buttons.push((rect, mode));
        }
        x = x.saturating_add(width + 1);
    }
    buttons
}

fn button_label(mode: Option<OverlayType>) -> String {
    match mode {
        None => "[ Pan ]".to_string(),
        Some(m) => format!("[ {} ]", m.label()),
    }
}

/// Render the UI
pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();
    match app.view.render() {
        ViewOutput::LoadError(text) => frame.render_widget(Paragraph::new(text), area),
        ViewOutput::Loading => {
            frame.render_widget(Paragraph::new(crate::view::LOADING_TEXT), area)
        }
        ViewOutput::Map(panel) => {
            let (map_area, status_area) = layout(area);
            render_map(frame, app, map_area);
            render_panel(frame, &panel, map_block().inner(map_area));
            render_status_bar(frame, app, status_area);
        }
    }
}

fn render_map(frame: &mut Frame, app: &App, area: Rect) {
    let block = map_block().title(Span::styled(
        " Map ",
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
    ));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let Some(map) = &app.map else {
        return;
    };

    let layers = map.render(inner.width as usize, inner.height as usize);
    let cursor = app
        .mouse_pos
        .filter(|&(col, row)| inner.contains(Position::new(col, row)));
    frame.render_widget(MapWidget { layers, cursor }, inner);

    if let Some(manager) = map.active_manager() {
        let buf = frame.buffer_mut();
        for (rect, mode) in control_buttons(inner, manager.options()) {
            let style = if mode == manager.mode() {
                Style::default().fg(Color::Black).bg(Color::Cyan).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::White).bg(Color::DarkGray)
            };
            buf.set_stringn(rect.x, rect.y, button_label(mode), rect.width as usize, style);
        }
    }
}

/// Braille map layers with overlays and sketch on top
struct MapWidget {
    layers: MapLayers,
    cursor: Option<(u16, u16)>,
}

fn parse_color(hex: &str, fallback: Color) -> Color {
    hex.parse().unwrap_or(fallback)
}

fn render_layer(canvas: &BrailleCanvas, color: Color, area: Rect, buf: &mut Buffer) {
    for (row_idx, row) in canvas.rows().enumerate().take(area.height as usize) {
        let y = area.y + row_idx as u16;
        for (col_idx, ch) in row.chars().enumerate().take(area.width as usize) {
            if ch == BLANK {
                continue;
            }
            let x = area.x + col_idx as u16;
            // Merge dots with whatever a lower layer already drew
            let merged = match buf[(x, y)].symbol().chars().next() {
                Some(below) if ('\u{2800}'..='\u{28FF}').contains(&below) => {
                    char::from_u32(below as u32 | ch as u32).unwrap_or(ch)
                }
                _ => ch,
            };
            buf[(x, y)].set_char(merged).set_fg(color);
        }
    }
}

impl Widget for MapWidget {
    fn render(self, area: Rect, buf: &mut Buffer) {
        render_layer(&self.layers.basemap.coastlines, Color::Cyan, area, buf);
        render_layer(&self.layers.basemap.borders, Color::DarkGray, area, buf);

        for overlay in &self.layers.overlays {
            let fill_color = parse_color(&overlay.fill_color, Color::Blue);
            let stroke_color = parse_color(&overlay.stroke_color, Color::White);
            render_layer(&overlay.fill, fill_color, area, buf);
            render_layer(&overlay.stroke, stroke_color, area, buf);
        }

        render_layer(
            &self.layers.sketch,
            parse_color(&self.layers.sketch_color, Color::Yellow),
            area,
            buf,
        );

        if let Some((x, y)) = self.cursor {
            buf[(x, y)].set_char('╋').set_fg(Color::Red);
        }
    }
}

/// Area readout box in the top-left corner of the map
fn render_panel(frame: &mut Frame, panel: &StatusPanel, map_area: Rect) {
    let body = match panel.body {
        PanelBody::Prompt => Line::from(panel.body.to_string()),
        PanelBody::Area(area) => Line::from(vec![
            Span::raw("Selected Area: "),
            Span::styled(
                PanelBody::formatted_area(area),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::raw(" m²"),
        ]),
    };

    let content_width = (body.width() as u16).max(panel.title.len() as u16);
    let rect =
        Rect::new(map_area.x + 1, map_area.y + 1, content_width + 4, 4).intersection(map_area);
    if rect.is_empty() {
        return;
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Gray))
        .padding(ratatui::widgets::Padding::horizontal(1));
    let text = vec![
        Line::from(Span::styled(
            panel.title,
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        )),
        body,
    ];

    frame.render_widget(Clear, rect);
    frame.render_widget(Paragraph::new(text).block(block), rect);
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let status = Line::from(vec![
        Span::styled(" Zoom: ", Style::default().fg(Color::DarkGray)),
        Span::styled(app.zoom_level(), Style::default().fg(Color::Yellow)),
        Span::styled(" | Tool: ", Style::default().fg(Color::DarkGray)),
        Span::styled(app.mode_label(), Style::default().fg(Color::Green)),
        Span::styled(" | ", Style::default().fg(Color::DarkGray)),
        Span::styled(app.center_coords(), Style::default().fg(Color::Cyan)),
        Span::styled(
            " | p:polygon r:rectangle m:pan enter:close esc:cancel hjkl:pan +/-:zoom q:quit",
            Style::default().fg(Color::DarkGray),
        ),
    ]);
    frame.render_widget(Paragraph::new(status), area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::data;
    use crate::provider::SdkLoadError;
    use ratatui::{backend::TestBackend, Terminal};

    fn screen(app: &App) -> String {
        let backend = TestBackend::new(100, 30);
        let mut terminal = Terminal::new(backend).expect("terminal");
        terminal.draw(|frame| render(frame, app)).expect("draw");
        let buffer = terminal.backend().buffer();
        let mut out = String::new();
        for y in 0..buffer.area.height {
            for x in 0..buffer.area.width {
                out.push_str(buffer[(x, y)].symbol());
            }
            out.push('\n');
        }
        out
    }

    fn app() -> App {
        App::without_loader(AppConfig::default(), Rect::new(0, 0, 100, 30))
    }

    #[test]
    fn test_loading_screen() {
        assert!(screen(&app()).starts_with("Loading Google Maps..."));
    }

    #[test]
    fn test_error_screen() {
        let mut app = app();
        app.finish_loading(Err(SdkLoadError::Provider("quota exceeded".into())));
        assert!(screen(&app).starts_with("Error loading Google Maps API: quota exceeded"));
    }

    #[test]
    fn test_ready_screen_shows_prompt_and_toolbar() {
        let mut app = app();
        app.finish_loading(Ok(data::simple_world()));
        let out = screen(&app);
        assert!(out.contains("Draw Area Calculator"));
        assert!(out.contains("Use the drawing tools to draw a polygon and calculate the area."));
        assert!(out.contains("[ Polygon ]"));
        assert!(out.contains("[ Rectangle ]"));
    }

    #[test]
    fn test_area_readout_after_drawing() {
        let mut app = app();
        app.finish_loading(Ok(data::simple_world()));
        let map = app.map.as_mut().expect("map constructed");
        map.set_drawing_mode(Some(OverlayType::Polygon));
        for (x, y) in [(40, 40), (120, 40), (120, 90)] {
            map.pointer_down(x, y);
        }
        map.close_sketch();
        app.dispatch_events();

        let area = app.view.area().expect("area computed");
        let expected = format!("Selected Area: {} m²", PanelBody::formatted_area(area));
        let out = screen(&app);
        assert!(out.contains(&expected));
        assert!(!out.contains("Use the drawing tools"));
    }

    #[test]
    fn test_toolbar_positions() {
        let area = Rect::new(1, 1, 80, 20);
        let mut options = DrawingManagerOptions {
            control_position: ControlPosition::BottomCenter,
            ..DrawingManagerOptions::default()
        };
        let buttons = control_buttons(area, &options);
        assert_eq!(buttons.len(), 3);
        assert!(buttons.iter().all(|(r, _)| r.y == 20));
        assert_eq!(buttons[0].1, None);
        assert_eq!(buttons[1].1, Some(OverlayType::Polygon));
        assert!(buttons[0].0.x > area.x + 10);

        options.control_position = ControlPosition::TopLeft;
        let buttons = control_buttons(area, &options);
        assert_eq!(buttons[0].0, Rect::new(2, 1, 7, 1));

        options.drawing_control = false;
        assert!(control_buttons(area, &options).is_empty());
    }
}
