use crate::braille::BrailleCanvas;
use glam::DVec2;

/// Draw a line using Bresenham's algorithm
pub fn draw_line(canvas: &mut BrailleCanvas, x0: i32, y0: i32, x1: i32, y1: i32) {
    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    let mut x = x0;
    let mut y = y0;

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

/// Draw a polyline, skipping segments whose bounding box misses the canvas.
pub fn draw_polyline(canvas: &mut BrailleCanvas, points: &[DVec2]) {
    let (w, h) = (canvas.pixel_width() as i32, canvas.pixel_height() as i32);
    let mut prev: Option<(i32, i32)> = None;

    for p in points {
        if !p.is_finite() {
            prev = None;
            continue;
        }
        let cur = (p.x.round() as i32, p.y.round() as i32);

        if let Some((px, py)) = prev {
            let visible = px.max(cur.0) >= 0
                && px.min(cur.0) < w
                && py.max(cur.1) >= 0
                && py.min(cur.1) < h;
            if visible {
                draw_line(canvas, px, py, cur.0, cur.1);
            }
        }

        prev = Some(cur);
    }
}

/// Draw a filled disc (marker body)
pub fn draw_disc(canvas: &mut BrailleCanvas, cx: i32, cy: i32, radius: i32) {
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            if dx * dx + dy * dy <= radius * radius {
                canvas.set_pixel_signed(cx + dx, cy + dy);
            }
        }
    }
}

/// Draw a circle outline with the midpoint algorithm (hover/selection rings)
pub fn draw_ring(canvas: &mut BrailleCanvas, cx: i32, cy: i32, radius: i32) {
    if radius <= 0 {
        canvas.set_pixel_signed(cx, cy);
        return;
    }

    let mut x = radius;
    let mut y = 0;
    let mut err = 1 - radius;

    while x >= y {
        for (ox, oy) in [
            (x, y),
            (y, x),
            (-y, x),
            (-x, y),
            (-x, -y),
            (-y, -x),
            (y, -x),
            (x, -y),
        ] {
            canvas.set_pixel_signed(cx + ox, cy + oy);
        }

        y += 1;
        if err < 0 {
            err += 2 * y + 1;
        } else {
            x -= 1;
            err += 2 * (y - x) + 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_horizontal_line() {
        let mut canvas = BrailleCanvas::new(5, 1);
        draw_line(&mut canvas, 0, 0, 9, 0);
        // Top row of every cell is lit
        assert_eq!(canvas.to_string(), "⠉⠉⠉⠉⠉");
    }

    #[test]
    fn test_vertical_line() {
        let mut canvas = BrailleCanvas::new(1, 2);
        draw_line(&mut canvas, 0, 0, 0, 7);
        assert_eq!(canvas.to_string(), "⡇\n⡇");
    }

    #[test]
    fn test_polyline_skips_offscreen_segments() {
        let mut canvas = BrailleCanvas::new(4, 2);
        let points = [
            DVec2::new(-50.0, -50.0),
            DVec2::new(-40.0, -50.0),
            DVec2::new(f64::NAN, 0.0),
            DVec2::new(0.0, 0.0),
            DVec2::new(7.0, 0.0),
        ];
        draw_polyline(&mut canvas, &points);
        assert_eq!(canvas.lit_count(), 8);
    }

    #[test]
    fn test_ring_is_hollow() {
        let mut canvas = BrailleCanvas::new(8, 4);
        draw_ring(&mut canvas, 8, 8, 5);
        assert!(!canvas.is_set(8, 8));
        assert!(canvas.is_set(13, 8));
        assert!(canvas.is_set(8, 3));

        let mut filled = BrailleCanvas::new(8, 4);
        draw_disc(&mut filled, 8, 8, 5);
        assert!(filled.is_set(8, 8));
        assert!(filled.lit_count() > canvas.lit_count());
    }
}
