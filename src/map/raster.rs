use glam::DVec2;

use crate::braille::BrailleCanvas;

/// 4x4 ordered-dither thresholds, scaled to 0..16
const BAYER4: [[u8; 4]; 4] = [[0, 8, 2, 10], [12, 4, 14, 6], [3, 11, 1, 9], [15, 7, 13, 5]];

/// Draw a line using Bresenham's algorithm
pub fn draw_line(canvas: &mut BrailleCanvas, x0: i32, y0: i32, x1: i32, y1: i32) {
    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;
    let (mut x, mut y) = (x0, y0);

    loop {
        canvas.set_pixel_signed(x, y);
        if x == x1 && y == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            if x == x1 {
                break;
            }
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            if y == y1 {
                break;
            }
            err += dx;
            y += sy;
        }
    }
}

/// Clip a segment to the canvas plus a one pixel margin (Liang-Barsky).
/// `None` if it lies fully outside.
fn clip_segment(
    canvas: &BrailleCanvas,
    a: (i32, i32),
    b: (i32, i32),
) -> Option<((i32, i32), (i32, i32))> {
    let (x0, y0) = (f64::from(a.0), f64::from(a.1));
    let (dx, dy) = (f64::from(b.0) - x0, f64::from(b.1) - y0);
    let (max_x, max_y) = (canvas.pixel_width() as f64, canvas.pixel_height() as f64);

    let (mut t0, mut t1) = (0.0_f64, 1.0_f64);
    for (p, q) in [(-dx, x0 + 1.0), (dx, max_x - x0), (-dy, y0 + 1.0), (dy, max_y - y0)] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
        } else {
            let r = q / p;
            if p < 0.0 {
                t0 = t0.max(r);
            } else {
                t1 = t1.min(r);
            }
        }
    }
    if t0 > t1 {
        return None;
    }
    let at = |t: f64| ((x0 + t * dx).round() as i32, (y0 + t * dy).round() as i32);
    Some((at(t0), at(t1)))
}

/// Line of the given stroke weight (1 = hairline)
pub fn draw_stroke(canvas: &mut BrailleCanvas, a: (i32, i32), b: (i32, i32), weight: u8) {
    let Some((a, b)) = clip_segment(canvas, a, b) else {
        return;
    };
    draw_line(canvas, a.0, a.1, b.0, b.1);
    for w in 1..i32::from(weight.max(1)) {
        draw_line(canvas, a.0 + w, a.1, b.0 + w, b.1);
        draw_line(canvas, a.0, a.1 + w, b.0, b.1 + w);
    }
}

/// Outline of a closed ring
pub fn draw_ring(canvas: &mut BrailleCanvas, points: &[(i32, i32)], weight: u8) {
    if points.len() < 2 {
        return;
    }
    for pair in points.windows(2) {
        draw_stroke(canvas, pair[0], pair[1], weight);
    }
    draw_stroke(canvas, points[points.len() - 1], points[0], weight);
}

/// Open polyline (in-progress sketches)
pub fn draw_path(canvas: &mut BrailleCanvas, points: &[(i32, i32)], weight: u8) {
    for pair in points.windows(2) {
        draw_stroke(canvas, pair[0], pair[1], weight);
    }
}

/// Vertex marker (small cross)
pub fn draw_marker(canvas: &mut BrailleCanvas, x: i32, y: i32, size: i32) {
    for i in -size..=size {
        canvas.set_pixel_signed(x + i, y);
        canvas.set_pixel_signed(x, y + i);
    }
}

/// Stippled even-odd fill. `opacity` in [0, 1] sets the dot density.
pub fn fill_polygon(canvas: &mut BrailleCanvas, ring: &[DVec2], opacity: f64) {
    if ring.len() < 3 || opacity <= 0.0 {
        return;
    }
    let level = (opacity.clamp(0.0, 1.0) * 16.0).round() as u8;

    let (min_y, max_y) = ring
        .iter()
        .fold((f64::MAX, f64::MIN), |(lo, hi), p| (lo.min(p.y), hi.max(p.y)));
    let y_start = min_y.floor().max(0.0) as usize;
    let y_end = (max_y.ceil().max(0.0) as usize).min(canvas.pixel_height());
    let x_limit = canvas.pixel_width() as f64;

    let mut crossings = Vec::with_capacity(8);
    for y in y_start..y_end {
        let sy = y as f64 + 0.5;
        crossings.clear();
        for (i, a) in ring.iter().enumerate() {
            let b = ring[(i + 1) % ring.len()];
            if (a.y <= sy) != (b.y <= sy) {
                crossings.push(a.x + (sy - a.y) / (b.y - a.y) * (b.x - a.x));
            }
        }
        crossings.sort_by(f64::total_cmp);

        for span in crossings.chunks_exact(2) {
            let from = span[0].max(0.0).round() as usize;
            let to = span[1].min(x_limit).round().max(0.0) as usize;
            for x in from..to {
                if BAYER4[y % 4][x % 4] < level {
                    canvas.set_pixel(x, y);
                }
            }
        }
    }
}
