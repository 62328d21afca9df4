use super::{DEFAULT_HEIGHT, DEFAULT_WIDTH};

// ============================================================================
// Utility Functions
// ============================================================================

/// Alpha blend a single color channel
/// Uses fast approximation: (x + 1 + (x >> 8)) >> 8 instead of x / 255
#[inline]
fn blend_channel(src: u8, dst: u8, alpha: u16) -> u8 {
    let result = src as u16 * alpha + dst as u16 * (255 - alpha);
    ((result + 1 + (result >> 8)) >> 8) as u8
}

/// Write ABGR pixel to slice (RGBA8888 little-endian byte order)
#[inline]
fn write_pixel(dest: &mut [u8], r: u8, g: u8, b: u8) {
    dest[0] = 255; // A
    dest[1] = b; // B
    dest[2] = g; // G
    dest[3] = r; // R
}

/// Segments per half circle when outlining round line caps
const CAP_STEPS: usize = 6;

// ============================================================================
// PixelBuffer
// ============================================================================

/// RGBA8888 pixel buffer for software rendering
/// The whole scene is composited here with straight alpha blending, then
/// uploaded to the window texture once per frame.
pub struct PixelBuffer {
    pixels: Vec<u8>,
    width: u32,
    height: u32,
}

impl PixelBuffer {
    /// Create a new pixel buffer with default resolution
    pub fn new() -> Self {
        Self::with_size(DEFAULT_WIDTH, DEFAULT_HEIGHT)
    }

    /// Create a new pixel buffer with custom resolution
    pub fn with_size(width: u32, height: u32) -> Self {
        Self {
            pixels: vec![0; (width * height * 4) as usize],
            width,
            height,
        }
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Check if coordinates are within bounds
    #[inline]
    fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && x < self.width as i32 && y >= 0 && y < self.height as i32
    }

    /// Calculate byte offset for pixel at (x, y)
    #[inline]
    fn pixel_index(&self, x: u32, y: u32) -> usize {
        ((y * self.width + x) * 4) as usize
    }

    /// Clear to a solid color
    pub fn clear(&mut self, r: u8, g: u8, b: u8) {
        for px in self.pixels.chunks_exact_mut(4) {
            write_pixel(px, r, g, b);
        }
    }

    /// Read a pixel from the buffer (bounds checked)
    /// Returns None if coordinates are out of bounds
    #[inline]
    pub fn get_pixel(&self, x: i32, y: i32) -> Option<(u8, u8, u8)> {
        if self.in_bounds(x, y) {
            let idx = self.pixel_index(x as u32, y as u32);
            Some((
                self.pixels[idx + 3], // R
                self.pixels[idx + 2], // G
                self.pixels[idx + 1], // B
            ))
        } else {
            None
        }
    }

    /// Set pixel with alpha blending
    #[inline]
    pub fn blend_pixel(&mut self, x: i32, y: i32, r: u8, g: u8, b: u8, a: u8) {
        if a == 0 || !self.in_bounds(x, y) {
            return;
        }
        let idx = self.pixel_index(x as u32, y as u32);
        let alpha = a as u16;
        self.pixels[idx] = 255; // A - always opaque
        self.pixels[idx + 1] = blend_channel(b, self.pixels[idx + 1], alpha);
        self.pixels[idx + 2] = blend_channel(g, self.pixels[idx + 2], alpha);
        self.pixels[idx + 3] = blend_channel(r, self.pixels[idx + 3], alpha);
    }

    /// Horizontal span with alpha blending, clipped to the buffer
    pub fn hline_blend(&mut self, x1: i32, x2: i32, y: i32, r: u8, g: u8, b: u8, a: u8) {
        if a == 0 || y < 0 || y >= self.height as i32 {
            return;
        }
        let (x1, x2) = if x1 <= x2 { (x1, x2) } else { (x2, x1) };
        let x1 = x1.max(0);
        let x2 = x2.min(self.width as i32 - 1);
        if x1 > x2 {
            return;
        }

        let alpha = a as u16;
        let start = self.pixel_index(x1 as u32, y as u32);
        let end = self.pixel_index(x2 as u32, y as u32) + 4;
        for px in self.pixels[start..end].chunks_exact_mut(4) {
            px[0] = 255;
            px[1] = blend_channel(b, px[1], alpha);
            px[2] = blend_channel(g, px[2], alpha);
            px[3] = blend_channel(r, px[3], alpha);
        }
    }

    /// Fill a rectangle with alpha blending
    pub fn fill_rect_blend(&mut self, x: i32, y: i32, w: u32, h: u32, r: u8, g: u8, b: u8, a: u8) {
        if w == 0 {
            return;
        }
        for row in 0..h as i32 {
            self.hline_blend(x, x + w as i32 - 1, y + row, r, g, b, a);
        }
    }

    /// Fill a circle with alpha blending (each pixel blended once)
    pub fn fill_circle_blend(&mut self, cx: f32, cy: f32, radius: f32, r: u8, g: u8, b: u8, a: u8) {
        self.fill_ellipse_blend(cx, cy, radius, radius, 0.0, r, g, b, a);
    }

    /// Fill a rotated ellipse with alpha blending.
    ///
    /// `rx`/`ry` are the semi-axes before rotation, `angle` rotates the
    /// ellipse clockwise on screen (y down). Rows are solved analytically so
    /// every covered pixel is blended exactly once.
    pub fn fill_ellipse_blend(
        &mut self,
        cx: f32,
        cy: f32,
        rx: f32,
        ry: f32,
        angle: f32,
        r: u8,
        g: u8,
        b: u8,
        a: u8,
    ) {
        if a == 0 || !(rx > 0.0 && ry > 0.0) {
            return;
        }
        let (sin, cos) = angle.sin_cos();
        let inv_rx2 = 1.0 / (rx * rx);
        let inv_ry2 = 1.0 / (ry * ry);

        // Quadratic in dx for a fixed dy: qa·dx² + qb·dx + qc <= 0
        let qa = cos * cos * inv_rx2 + sin * sin * inv_ry2;
        let qb_per_dy = 2.0 * sin * cos * (inv_rx2 - inv_ry2);
        let qc_per_dy2 = sin * sin * inv_rx2 + cos * cos * inv_ry2;

        let half_h = (rx * rx * sin * sin + ry * ry * cos * cos).sqrt();
        let y_start = ((cy - half_h).floor() as i32).max(0);
        let y_end = ((cy + half_h).ceil() as i32).min(self.height as i32 - 1);

        for y in y_start..=y_end {
            let dy = y as f32 + 0.5 - cy;
            let qb = qb_per_dy * dy;
            let qc = qc_per_dy2 * dy * dy - 1.0;
            let disc = qb * qb - 4.0 * qa * qc;
            if disc < 0.0 {
                continue;
            }
            let root = disc.sqrt();
            let dx1 = (-qb - root) / (2.0 * qa);
            let dx2 = (-qb + root) / (2.0 * qa);
            let x1 = (cx + dx1 - 0.5).ceil() as i32;
            let x2 = (cx + dx2 - 0.5).floor() as i32;
            if x1 <= x2 {
                self.hline_blend(x1, x2, y, r, g, b, a);
            }
        }
    }

    /// Fill a polygon with alpha blending
    /// Optimized: preallocates intersection buffer outside loop
    pub fn fill_polygon_blend(&mut self, vertices: &[(f32, f32)], r: u8, g: u8, b: u8, a: u8) {
        if vertices.len() < 3 || a == 0 {
            return;
        }

        let mut min_y = f32::MAX;
        let mut max_y = f32::MIN;
        for (_, y) in vertices {
            min_y = min_y.min(*y);
            max_y = max_y.max(*y);
        }

        let min_y = (min_y as i32).max(0);
        let max_y = (max_y as i32).min(self.height as i32 - 1);

        // Preallocate intersection buffer (reused per scanline)
        let mut intersections = Vec::with_capacity(vertices.len());
        let n = vertices.len();

        for y in min_y..=max_y {
            intersections.clear();
            let yf = y as f32 + 0.5;

            for i in 0..n {
                let (x1, y1) = vertices[i];
                let (x2, y2) = vertices[(i + 1) % n];

                if (y1 <= yf && y2 > yf) || (y2 <= yf && y1 > yf) {
                    let x = x1 + (yf - y1) / (y2 - y1) * (x2 - x1);
                    intersections.push(x.round() as i32);
                }
            }

            intersections.sort_unstable();
            for pair in intersections.chunks_exact(2) {
                self.hline_blend(pair[0], pair[1] - 1, y, r, g, b, a);
            }
        }
    }

    /// Blended line with thickness and round caps.
    ///
    /// The capsule is filled as one convex polygon so overlapping caps never
    /// double-blend. Hairlines fall back to [`PixelBuffer::line_aa_blend`].
    pub fn line_thick_blend(
        &mut self,
        x0: f32,
        y0: f32,
        x1: f32,
        y1: f32,
        thickness: f32,
        r: u8,
        g: u8,
        b: u8,
        a: u8,
    ) {
        if thickness < 1.5 {
            let a = (a as f32 * thickness.clamp(0.0, 1.0)) as u8;
            self.line_aa_blend(x0, y0, x1, y1, r, g, b, a);
            return;
        }

        let half = thickness * 0.5;
        let dx = x1 - x0;
        let dy = y1 - y0;
        let len = (dx * dx + dy * dy).sqrt();
        if len < 0.001 {
            self.fill_circle_blend(x0, y0, half, r, g, b, a);
            return;
        }

        // Perpendicular direction angle; walk each cap through half a turn
        let base = dy.atan2(dx) + std::f32::consts::FRAC_PI_2;
        let mut outline = Vec::with_capacity((CAP_STEPS + 1) * 2);
        for i in 0..=CAP_STEPS {
            let t = base + std::f32::consts::PI * i as f32 / CAP_STEPS as f32;
            outline.push((x0 + t.cos() * half, y0 + t.sin() * half));
        }
        for i in 0..=CAP_STEPS {
            let t = base + std::f32::consts::PI + std::f32::consts::PI * i as f32 / CAP_STEPS as f32;
            outline.push((x1 + t.cos() * half, y1 + t.sin() * half));
        }
        self.fill_polygon_blend(&outline, r, g, b, a);
    }

    /// Anti-aliased line using Xiaolin Wu's algorithm, scaled by `a`.
    /// Accepts f32 endpoints for subpixel precision.
    pub fn line_aa_blend(
        &mut self,
        mut x0: f32,
        mut y0: f32,
        mut x1: f32,
        mut y1: f32,
        r: u8,
        g: u8,
        b: u8,
        a: u8,
    ) {
        if a == 0 {
            return;
        }
        let steep = (y1 - y0).abs() > (x1 - x0).abs();
        if steep {
            std::mem::swap(&mut x0, &mut y0);
            std::mem::swap(&mut x1, &mut y1);
        }
        if x0 > x1 {
            std::mem::swap(&mut x0, &mut x1);
            std::mem::swap(&mut y0, &mut y1);
        }

        let dx = x1 - x0;
        let dy = y1 - y0;
        let gradient = if dx.abs() < 0.001 { 1.0 } else { dy / dx };
        let peak = a as f32;

        let plot = |buf: &mut Self, major: i32, minor: i32, coverage: f32| {
            let alpha = (coverage * peak) as u8;
            if steep {
                buf.blend_pixel(minor, major, r, g, b, alpha);
            } else {
                buf.blend_pixel(major, minor, r, g, b, alpha);
            }
        };

        // First endpoint
        let xend = x0.round();
        let yend = y0 + gradient * (xend - x0);
        let xgap = 1.0 - (x0 + 0.5).fract();
        let xpxl1 = xend as i32;
        let ypxl1 = yend.floor() as i32;
        let fpart = yend - yend.floor();
        plot(self, xpxl1, ypxl1, (1.0 - fpart) * xgap);
        plot(self, xpxl1, ypxl1 + 1, fpart * xgap);
        let mut intery = yend + gradient;

        // Second endpoint
        let xend = x1.round();
        let yend = y1 + gradient * (xend - x1);
        let xgap = (x1 + 0.5).fract();
        let xpxl2 = xend as i32;
        let ypxl2 = yend.floor() as i32;
        let fpart = yend - yend.floor();
        plot(self, xpxl2, ypxl2, (1.0 - fpart) * xgap);
        plot(self, xpxl2, ypxl2 + 1, fpart * xgap);

        // Main line body
        for x in (xpxl1 + 1)..xpxl2 {
            let ipart = intery.floor();
            let fpart = intery - ipart;
            plot(self, x, ipart as i32, 1.0 - fpart);
            plot(self, x, ipart as i32 + 1, fpart);
            intery += gradient;
        }
    }

    /// Get raw pixel data as bytes (for texture upload)
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.pixels
    }
}

impl Default for PixelBuffer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clear_and_read() {
        let mut buf = PixelBuffer::with_size(8, 4);
        buf.clear(10, 20, 30);
        assert_eq!(buf.get_pixel(7, 3), Some((10, 20, 30)));
        assert_eq!(buf.get_pixel(8, 0), None);
    }

    #[test]
    fn test_blend_half() {
        let mut buf = PixelBuffer::with_size(2, 2);
        buf.clear(0, 0, 0);
        buf.blend_pixel(0, 0, 200, 100, 0, 128);
        let (r, g, b) = buf.get_pixel(0, 0).unwrap();
        assert!((99..=101).contains(&r));
        assert!((49..=51).contains(&g));
        assert_eq!(b, 0);
    }

    #[test]
    fn test_ellipse_coverage() {
        let mut buf = PixelBuffer::with_size(40, 40);
        buf.clear(0, 0, 0);
        // Wide ellipse: covers far along x, not along y
        buf.fill_ellipse_blend(20.0, 20.0, 15.0, 4.0, 0.0, 255, 255, 255, 255);
        assert_eq!(buf.get_pixel(20, 20), Some((255, 255, 255)));
        assert_eq!(buf.get_pixel(32, 20), Some((255, 255, 255)));
        assert_eq!(buf.get_pixel(20, 30), Some((0, 0, 0)));
    }

    #[test]
    fn test_rotated_ellipse() {
        let mut buf = PixelBuffer::with_size(40, 40);
        buf.clear(0, 0, 0);
        // Quarter turn: the long axis now runs vertically
        buf.fill_ellipse_blend(20.0, 20.0, 15.0, 4.0, std::f32::consts::FRAC_PI_2, 255, 0, 0, 255);
        assert_eq!(buf.get_pixel(20, 32), Some((255, 0, 0)));
        assert_eq!(buf.get_pixel(32, 20), Some((0, 0, 0)));
    }

    #[test]
    fn test_ellipse_blends_once() {
        let mut buf = PixelBuffer::with_size(30, 30);
        buf.clear(0, 0, 0);
        buf.fill_circle_blend(15.0, 15.0, 10.0, 255, 255, 255, 128);
        // A second blend at 50% would push the value toward 191
        for y in 6..24 {
            if let Some((r, _, _)) = buf.get_pixel(15, y) {
                assert!(r < 140, "pixel (15, {y}) blended more than once: {r}");
            }
        }
    }

    #[test]
    fn test_thick_line_covers_midpoint() {
        let mut buf = PixelBuffer::with_size(50, 50);
        buf.clear(0, 0, 0);
        buf.line_thick_blend(5.0, 25.0, 45.0, 25.0, 6.0, 0, 255, 0, 255);
        assert_eq!(buf.get_pixel(25, 25), Some((0, 255, 0)));
        assert_eq!(buf.get_pixel(25, 27), Some((0, 255, 0)));
        assert_eq!(buf.get_pixel(25, 35), Some((0, 0, 0)));
    }

    #[test]
    fn test_offscreen_draws_are_clipped() {
        let mut buf = PixelBuffer::with_size(10, 10);
        buf.clear(0, 0, 0);
        buf.fill_circle_blend(-50.0, -50.0, 20.0, 255, 0, 0, 255);
        buf.line_thick_blend(-20.0, -5.0, 30.0, -5.0, 3.0, 255, 0, 0, 255);
        buf.hline_blend(-5, 50, 20, 255, 0, 0, 255);
        assert!(buf.as_bytes().chunks_exact(4).all(|px| px[3] == 0));
    }
}
