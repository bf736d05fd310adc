use rayon::prelude::*;

use crate::braille::BrailleCanvas;
use crate::map::projection::Viewport;
use crate::map::raster::draw_line;
use crate::provider::LatLng;

/// A geographic line as (lng, lat) pairs, GeoJSON axis order
pub type LineString = Vec<(f64, f64)>;

/// Level of detail for basemap data
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Lod {
    Low,    // 110m - world view
    Medium, // 50m - continental
    High,   // 10m - regional
}

impl Lod {
    pub fn from_zoom(zoom: f64) -> Self {
        if zoom < 4.0 {
            Lod::Low
        } else if zoom < 32.0 {
            Lod::Medium
        } else {
            Lod::High
        }
    }
}

/// Rendered basemap layers, back to front
pub struct BasemapLayers {
    pub coastlines: BrailleCanvas,
    pub borders: BrailleCanvas,
}

/// Static vector backdrop the user draws on
#[derive(Default, Debug)]
pub struct Basemap {
    coastlines_low: Vec<LineString>,
    coastlines_medium: Vec<LineString>,
    coastlines_high: Vec<LineString>,
    borders: Vec<LineString>,
}

type Segment = ((i32, i32), (i32, i32));

impl Basemap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Finest coastlines available at or below `lod`
    fn coastlines(&self, lod: Lod) -> &[LineString] {
        let candidates = match lod {
            Lod::High => [&self.coastlines_high, &self.coastlines_medium, &self.coastlines_low],
            Lod::Medium => [&self.coastlines_medium, &self.coastlines_low, &self.coastlines_low],
            Lod::Low => [&self.coastlines_low, &self.coastlines_medium, &self.coastlines_high],
        };
        candidates
            .into_iter()
            .find(|lines| !lines.is_empty())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Render into canvases of `width` x `height` characters
    pub fn render(&self, width: usize, height: usize, viewport: &Viewport) -> BasemapLayers {
        let lod = Lod::from_zoom(viewport.zoom);
        let mut coastlines = BrailleCanvas::new(width, height);
        let mut borders = BrailleCanvas::new(width, height);

        for (a, b) in visible_segments(self.coastlines(lod), viewport) {
            draw_line(&mut coastlines, a.0, a.1, b.0, b.1);
        }
        for (a, b) in visible_segments(&self.borders, viewport) {
            draw_line(&mut borders, a.0, a.1, b.0, b.1);
        }

        BasemapLayers { coastlines, borders }
    }

    pub fn add_coastline(&mut self, line: LineString, lod: Lod) {
        match lod {
            Lod::Low => self.coastlines_low.push(line),
            Lod::Medium => self.coastlines_medium.push(line),
            Lod::High => self.coastlines_high.push(line),
        }
    }

    pub fn add_border(&mut self, line: LineString) {
        self.borders.push(line);
    }

    pub fn has_data(&self) -> bool {
        !self.coastlines_low.is_empty()
            || !self.coastlines_medium.is_empty()
            || !self.coastlines_high.is_empty()
            || !self.borders.is_empty()
    }

    pub fn line_count(&self) -> usize {
        self.coastlines_low.len()
            + self.coastlines_medium.len()
            + self.coastlines_high.len()
            + self.borders.len()
    }
}

/// Project lines in parallel and keep only on-screen segments
fn visible_segments(lines: &[LineString], viewport: &Viewport) -> Vec<Segment> {
    lines
        .par_iter()
        .filter(|line| line.len() >= 2)
        .flat_map_iter(|line| {
            let projected: Vec<(i32, i32)> = line
                .iter()
                .map(|&(lng, lat)| viewport.project(LatLng::new(lat, lng)))
                .collect();
            projected
                .windows(2)
                .map(|w| (w[0], w[1]))
                .filter(|&(a, b)| {
                    // Segments longer than the screen are antimeridian jumps
                    let dist = ((a.0 - b.0).abs() + (a.1 - b.1).abs()) as usize;
                    dist < viewport.width.max(1) * 4 && viewport.line_might_be_visible(a, b)
                })
                .collect::<Vec<_>>()
        })
        .collect()
}
