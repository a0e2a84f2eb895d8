//! Software rasterizer for [`DrawCommand`] logs.

use gkvisor_core::surface::{DrawCommand, DrawingSurface, LineCap, RecordingSurface, StrokeStyle};
use image::{Rgba, RgbaImage};
use kurbo::{BezPath, Point, Rect, Shape, Vec2};
use peniko::Color;
use thiserror::Error;

/// Segments used to approximate a full circle.
const ARC_SEGMENTS: usize = 32;

/// Rasterizer errors.
#[derive(Debug, Error)]
pub enum RasterError {
    #[error("Invalid surface size {0}")]
    InvalidSize(f64),
    #[error("Invalid scale factor {0}")]
    InvalidScale(f64),
}

/// Result of PNG rendering - contains the raw RGBA pixel data and dimensions.
#[derive(Debug)]
pub struct PngRenderResult {
    /// RGBA pixel data (4 bytes per pixel).
    pub rgba_data: Vec<u8>,
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
}

impl PngRenderResult {
    /// RGBA value at a pixel, or `None` out of bounds.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = ((y * self.width + x) * 4) as usize;
        self.rgba_data.get(i..i + 4).map(|p| [p[0], p[1], p[2], p[3]])
    }
}

/// Replays canvas-style drawing commands into a transparent pixel layer.
///
/// Coverage is binary per pixel center; there is no antialiasing.
pub struct Rasterizer {
    scale: f64,
    layer: RgbaImage,
    subpaths: Vec<Vec<Point>>,
    stroke: StrokeStyle,
    fill: Color,
}

impl Rasterizer {
    /// Create a rasterizer for a `surface_size` square, upscaled by `scale`.
    pub fn new(surface_size: f64, scale: f64) -> Result<Self, RasterError> {
        if !(surface_size.is_finite() && surface_size > 0.0) {
            return Err(RasterError::InvalidSize(surface_size));
        }
        if !(scale.is_finite() && scale > 0.0) {
            return Err(RasterError::InvalidScale(scale));
        }
        let side = (surface_size * scale).ceil() as u32;

        Ok(Self {
            scale,
            layer: RgbaImage::new(side, side),
            subpaths: Vec::new(),
            // Canvas 2D defaults.
            stroke: StrokeStyle {
                color: Color::BLACK,
                width: 1.0,
                cap: LineCap::Butt,
            },
            fill: Color::BLACK,
        })
    }

    /// Apply one command.
    pub fn apply(&mut self, command: &DrawCommand) {
        match command {
            DrawCommand::BeginPath => self.subpaths.clear(),
            DrawCommand::MoveTo(p) => self.subpaths.push(vec![*p]),
            DrawCommand::LineTo(p) => self.line_to(*p),
            DrawCommand::Arc {
                center,
                radius,
                start_angle,
                end_angle,
            } => self.arc(*center, *radius, *start_angle, *end_angle),
            DrawCommand::SetStrokeStyle(style) => self.stroke = *style,
            DrawCommand::Stroke => self.stroke_path(),
            DrawCommand::SetFillColor(color) => self.fill = *color,
            DrawCommand::Fill => self.fill_path(),
            DrawCommand::ClearRect(rect) => self.clear_rect(*rect),
        }
    }

    /// Composite the layer over an opaque `background`.
    pub fn finish(self, background: Color) -> PngRenderResult {
        let bg = background.to_rgba8();
        let (width, height) = self.layer.dimensions();
        let mut out = RgbaImage::from_pixel(width, height, Rgba([bg.r, bg.g, bg.b, 255]));
        for (x, y, px) in self.layer.enumerate_pixels() {
            blend(out.get_pixel_mut(x, y), px.0);
        }

        PngRenderResult {
            rgba_data: out.into_raw(),
            width,
            height,
        }
    }

    fn line_to(&mut self, p: Point) {
        match self.subpaths.last_mut() {
            Some(subpath) => subpath.push(p),
            None => self.subpaths.push(vec![p]),
        }
    }

    fn arc(&mut self, center: Point, radius: f64, start: f64, end: f64) {
        let sweep = end - start;
        let steps = ((sweep.abs() / std::f64::consts::TAU) * ARC_SEGMENTS as f64).ceil().max(1.0) as usize;
        for i in 0..=steps {
            let angle = start + sweep * i as f64 / steps as f64;
            let p = center + Vec2::from_angle(angle) * radius;
            // The first arc point joins the current subpath like a line_to.
            self.line_to(p);
        }
    }

    fn stroke_path(&mut self) {
        let half = self.stroke.width / 2.0;
        let color = self.stroke.color.to_rgba8();
        let color = [color.r, color.g, color.b, color.a];
        let cap = self.stroke.cap;

        let segments: Vec<(Point, Point)> = self
            .subpaths
            .iter()
            .flat_map(|sp| sp.windows(2).map(|w| (w[0], w[1])))
            .collect();

        for (a, b) in segments {
            let bounds = Rect::from_points(a, b).inflate(half, half);
            self.paint(bounds, color, |p| segment_covers(p, a, b, half, cap));
        }
    }

    fn fill_path(&mut self) {
        let mut path = BezPath::new();
        for subpath in self.subpaths.iter().filter(|sp| sp.len() > 2) {
            path.move_to(subpath[0]);
            for p in &subpath[1..] {
                path.line_to(*p);
            }
            path.close_path();
        }
        if path.elements().is_empty() {
            return;
        }

        let color = self.fill.to_rgba8();
        let bounds = path.bounding_box();
        self.paint(bounds, [color.r, color.g, color.b, color.a], |p| path.winding(p) != 0);
    }

    fn clear_rect(&mut self, rect: Rect) {
        for (x, y) in self.pixels_in(rect) {
            self.layer.put_pixel(x, y, Rgba([0, 0, 0, 0]));
        }
    }

    /// Source-over `color` onto every pixel in `bounds` whose center passes `covers`.
    fn paint(&mut self, bounds: Rect, color: [u8; 4], covers: impl Fn(Point) -> bool) {
        for (x, y) in self.pixels_in(bounds) {
            if covers(self.center_of(x, y)) {
                blend(self.layer.get_pixel_mut(x, y), color);
            }
        }
    }

    fn center_of(&self, x: u32, y: u32) -> Point {
        Point::new((x as f64 + 0.5) / self.scale, (y as f64 + 0.5) / self.scale)
    }

    /// Pixels whose centers fall inside `rect` (surface space).
    fn pixels_in(&self, rect: Rect) -> Vec<(u32, u32)> {
        let (width, height) = self.layer.dimensions();
        let to_px = |v: f64, max: u32| (v * self.scale - 0.5).ceil().clamp(0.0, max as f64) as u32;
        let (x0, x1) = (to_px(rect.x0, width), to_px(rect.x1, width));
        let (y0, y1) = (to_px(rect.y0, height), to_px(rect.y1, height));

        let mut pixels = Vec::new();
        for y in y0..y1.min(height) {
            for x in x0..x1.min(width) {
                if rect.contains(self.center_of(x, y)) {
                    pixels.push((x, y));
                }
            }
        }
        pixels
    }
}

/// Whether `p` lies within `half` of segment `a`-`b`, honoring the cap style.
fn segment_covers(p: Point, a: Point, b: Point, half: f64, cap: LineCap) -> bool {
    let d = b - a;
    let len_sq = d.hypot2();
    if len_sq < f64::EPSILON {
        return cap == LineCap::Round && (p - a).hypot2() <= half * half;
    }

    let t = (p - a).dot(d) / len_sq;
    match cap {
        LineCap::Round => {
            let nearest = a + d * t.clamp(0.0, 1.0);
            (p - nearest).hypot2() <= half * half
        }
        LineCap::Butt | LineCap::Square => {
            let reach = if cap == LineCap::Square { half / len_sq.sqrt() } else { 0.0 };
            if t < -reach || t > 1.0 + reach {
                return false;
            }
            let perp = (p - a).cross(d).abs() / len_sq.sqrt();
            perp <= half
        }
    }
}

/// Non-premultiplied source-over.
fn blend(dst: &mut Rgba<u8>, src: [u8; 4]) {
    let sa = src[3] as f64 / 255.0;
    if sa <= 0.0 {
        return;
    }
    let da = dst.0[3] as f64 / 255.0;
    let out_a = sa + da * (1.0 - sa);
    for i in 0..3 {
        let s = src[i] as f64;
        let d = dst.0[i] as f64;
        dst.0[i] = ((s * sa + d * da * (1.0 - sa)) / out_a).round() as u8;
    }
    dst.0[3] = (out_a * 255.0).round() as u8;
}

/// Rasterize everything a recording surface has drawn, over its background fill.
pub fn render_surface(surface: &RecordingSurface, scale: f64) -> Result<PngRenderResult, RasterError> {
    let mut rasterizer = Rasterizer::new(surface.size(), scale)?;
    for command in surface.commands() {
        rasterizer.apply(command);
    }
    log::debug!("Rasterized {} commands", surface.commands().len());
    Ok(rasterizer.finish(surface.spec().background))
}

#[cfg(test)]
mod tests {
    use super::*;
    use gkvisor_core::surface::DrawContext;
    use std::f64::consts::PI;

    const WHITE: [u8; 4] = [255, 255, 255, 255];
    const GREY: [u8; 4] = [0x90, 0x90, 0x90, 255];

    fn white_stroke() -> StrokeStyle {
        StrokeStyle {
            color: Color::WHITE,
            width: 3.0,
            cap: LineCap::Round,
        }
    }

    fn grey() -> Color {
        Color::from_rgba8(0x90, 0x90, 0x90, 0xff)
    }

    #[test]
    fn test_stroke_covers_segment() {
        let mut r = Rasterizer::new(20.0, 1.0).unwrap();
        r.apply(&DrawCommand::BeginPath);
        r.apply(&DrawCommand::MoveTo(Point::new(2.0, 10.0)));
        r.apply(&DrawCommand::LineTo(Point::new(18.0, 10.0)));
        r.apply(&DrawCommand::SetStrokeStyle(white_stroke()));
        r.apply(&DrawCommand::Stroke);
        let img = r.finish(grey());

        assert_eq!((img.width, img.height), (20, 20));
        assert_eq!(img.pixel(10, 9), Some(WHITE));
        assert_eq!(img.pixel(10, 10), Some(WHITE));
        assert_eq!(img.pixel(10, 2), Some(GREY));
        assert_eq!(img.pixel(0, 0), Some(GREY));
        assert_eq!(img.pixel(20, 0), None);
    }

    #[test]
    fn test_round_cap_extends_past_endpoint() {
        let mut r = Rasterizer::new(20.0, 1.0).unwrap();
        r.apply(&DrawCommand::MoveTo(Point::new(5.0, 10.0)));
        r.apply(&DrawCommand::LineTo(Point::new(15.0, 10.0)));
        r.apply(&DrawCommand::SetStrokeStyle(white_stroke()));
        r.apply(&DrawCommand::Stroke);
        let img = r.finish(grey());
        // Pixel center (4.5, 10.5) is within 1.5 of the endpoint (5, 10).
        assert_eq!(img.pixel(4, 10), Some(WHITE));

        let mut r = Rasterizer::new(20.0, 1.0).unwrap();
        r.apply(&DrawCommand::MoveTo(Point::new(5.0, 10.0)));
        r.apply(&DrawCommand::LineTo(Point::new(15.0, 10.0)));
        r.apply(&DrawCommand::SetStrokeStyle(StrokeStyle {
            cap: LineCap::Butt,
            ..white_stroke()
        }));
        r.apply(&DrawCommand::Stroke);
        let img = r.finish(grey());
        assert_eq!(img.pixel(4, 10), Some(GREY));
    }

    #[test]
    fn test_fill_arc_draws_dot() {
        let mut r = Rasterizer::new(20.0, 2.0).unwrap();
        r.apply(&DrawCommand::BeginPath);
        r.apply(&DrawCommand::Arc {
            center: Point::new(10.0, 10.0),
            radius: 3.5,
            start_angle: 0.0,
            end_angle: 2.0 * PI,
        });
        r.apply(&DrawCommand::SetFillColor(Color::WHITE));
        r.apply(&DrawCommand::Fill);
        let img = r.finish(grey());

        assert_eq!(img.width, 40);
        assert_eq!(img.pixel(20, 20), Some(WHITE));
        assert_eq!(img.pixel(2, 2), Some(GREY));
    }

    #[test]
    fn test_clear_rect_restores_background() {
        let mut r = Rasterizer::new(10.0, 1.0).unwrap();
        r.apply(&DrawCommand::MoveTo(Point::new(0.0, 5.0)));
        r.apply(&DrawCommand::LineTo(Point::new(10.0, 5.0)));
        r.apply(&DrawCommand::SetStrokeStyle(white_stroke()));
        r.apply(&DrawCommand::Stroke);
        r.apply(&DrawCommand::ClearRect(Rect::new(0.0, 0.0, 10.0, 10.0)));
        let img = r.finish(grey());
        assert!(img.rgba_data.chunks(4).all(|p| p == GREY));
    }

    #[test]
    fn test_render_recorded_surface() {
        use gkvisor_core::config::Container;
        use gkvisor_core::surface::{SurfaceSpec, TargetId};

        let mut surface = RecordingSurface::new(
            TargetId(1),
            SurfaceSpec {
                size: 10.0,
                background: grey(),
                idle_image: String::new(),
                offset: Point::ZERO,
                corner_radius: 0.0,
                z_index: 0,
                class_name: None,
                anchor_top_left: false,
                container: Container::Body,
            },
        );
        surface.begin_path();
        surface.move_to(Point::new(0.0, 5.0));
        surface.line_to(Point::new(10.0, 5.0));
        surface.set_stroke_style(white_stroke());
        surface.stroke();

        let img = render_surface(&surface, 1.0).unwrap();
        assert_eq!(img.pixel(5, 5), Some(WHITE));
        assert_eq!(img.pixel(5, 0), Some(GREY));
    }

    #[test]
    fn test_invalid_dimensions() {
        assert!(matches!(Rasterizer::new(0.0, 1.0), Err(RasterError::InvalidSize(_))));
        assert!(matches!(Rasterizer::new(10.0, f64::NAN), Err(RasterError::InvalidScale(_))));
    }
}
