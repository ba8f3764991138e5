//! SVG rendering of both chart kinds
//!
//! Boxes are drawn with a cabinet (oblique) projection: depth recedes up and
//! to the right at half scale, so front, right and top faces are visible. The
//! camera framing decides where the scene is centred and how far it is
//! zoomed.

use crate::canvas::{BarCanvas, LineCanvas};
use crate::format::escape_markup;
use crate::projection::{AxisSpec, BoxPrimitive, CameraFraming, LineSeries, Rgb, Vec3};

const FIELD_OF_VIEW_DEG: f64 = 75.0;
const DEPTH_FACTOR: f64 = 0.35;
const MARGIN_LEFT: f64 = 70.0;
const MARGIN_RIGHT: f64 = 20.0;
const MARGIN_TOP: f64 = 64.0;
const MARGIN_BOTTOM: f64 = 56.0;

pub struct SvgCanvas {
    width: f64,
    height: f64,
    title: Option<String>,
    camera: Option<CameraFraming>,
    axes: Option<AxisSpec>,
    legend: Vec<(String, Rgb)>,
    body: String,
}

impl SvgCanvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: f64::from(width),
            height: f64::from(height),
            title: None,
            camera: None,
            axes: None,
            legend: Vec::new(),
            body: String::new(),
        }
    }

    pub fn titled(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Close the document
    pub fn finish(self) -> String {
        let mut svg = String::new();
        svg.push_str(&format!(
            r##"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}" style="background:#f0f0f0; border-radius:8px" font-family="sans-serif">"##,
            w = self.width,
            h = self.height
        ));
        let title = self
            .title
            .as_ref()
            .or(self.axes.as_ref().map(|axes| &axes.title));
        if let Some(title) = title {
            svg.push_str(&format!(
                r##"<text x="{:.1}" y="22" text-anchor="middle" font-size="14" font-weight="600" fill="#374151">{}</text>"##,
                self.width / 2.0,
                escape_markup(title)
            ));
        }
        svg.push_str(&self.body);
        svg.push_str(&self.legend_markup());
        svg.push_str("</svg>");
        svg
    }

    fn legend_markup(&self) -> String {
        let mut out = String::new();
        let mut x = MARGIN_LEFT;
        for (name, color) in &self.legend {
            out.push_str(&format!(
                r##"<rect x="{x:.1}" y="34" width="12" height="12" fill="{c}"/><text x="{tx:.1}" y="44" font-size="11" fill="#374151">{n}</text>"##,
                c = color.css(),
                tx = x + 16.0,
                n = escape_markup(name)
            ));
            x += 28.0 + 7.0 * name.chars().count() as f64;
        }
        out
    }

    /// Pixels per scene unit at the camera's focal distance
    fn zoom(&self, camera: &CameraFraming) -> f64 {
        let dx = camera.position.x - camera.look_at.x;
        let dy = camera.position.y - camera.look_at.y;
        let dz = camera.position.z - camera.look_at.z;
        let distance = (dx * dx + dy * dy + dz * dz).sqrt().max(1.0);
        let half_extent = distance * (FIELD_OF_VIEW_DEG.to_radians() / 2.0).tan();
        (self.height / 2.0) / half_extent
    }

    fn project(&self, point: Vec3) -> (f64, f64) {
        let camera = self.camera.unwrap_or(CameraFraming {
            position: Vec3::new(0.0, 5.0, 10.0),
            look_at: Vec3::default(),
        });
        let unit = self.zoom(&camera);
        let dx = point.x - camera.look_at.x;
        let dy = point.y - camera.look_at.y;
        let dz = point.z - camera.look_at.z;
        (
            self.width / 2.0 + (dx - dz * DEPTH_FACTOR) * unit,
            self.height / 2.0 + (-dy + dz * DEPTH_FACTOR) * unit,
        )
    }

    fn polygon(&mut self, corners: [Vec3; 4], fill: Rgb) {
        let points: Vec<String> = corners
            .iter()
            .map(|corner| {
                let (x, y) = self.project(*corner);
                format!("{x:.1},{y:.1}")
            })
            .collect();
        self.body.push_str(&format!(
            r##"<polygon points="{}" fill="{}" stroke="#4b5563" stroke-width="0.5"/>"##,
            points.join(" "),
            fill.css()
        ));
    }

    fn data_to_pixel(axes: &AxisSpec, width: f64, height: f64, x: f64, y: f64) -> (f64, f64) {
        let plot_w = width - MARGIN_LEFT - MARGIN_RIGHT;
        let plot_h = height - MARGIN_TOP - MARGIN_BOTTOM;
        let x_span = (axes.x_max - axes.x_min).max(f64::EPSILON);
        let y_span = (axes.y_max - axes.y_min).max(f64::EPSILON);
        (
            MARGIN_LEFT + (x - axes.x_min) / x_span * plot_w,
            MARGIN_TOP + plot_h - (y - axes.y_min) / y_span * plot_h,
        )
    }
}

impl BarCanvas for SvgCanvas {
    fn frame(&mut self, camera: &CameraFraming) {
        self.camera = Some(*camera);
        let (x1, y1) = self.project(Vec3::new(-100.0, 0.0, 0.0));
        let (x2, y2) = self.project(Vec3::new(100.0, 0.0, 0.0));
        self.body.push_str(&format!(
            r##"<line x1="{x1:.1}" y1="{y1:.1}" x2="{x2:.1}" y2="{y2:.1}" stroke="#9ca3af" stroke-width="1"/>"##
        ));
    }

    fn draw_box(&mut self, primitive: &BoxPrimitive) {
        let c = primitive.center;
        let (hw, hh, hd) = (primitive.width / 2.0, primitive.height / 2.0, primitive.depth / 2.0);
        let (left, right) = (c.x - hw, c.x + hw);
        let (bottom, top) = (c.y - hh, c.y + hh);
        let (back, front) = (c.z - hd, c.z + hd);

        self.polygon(
            [
                Vec3::new(left, bottom, front),
                Vec3::new(right, bottom, front),
                Vec3::new(right, top, front),
                Vec3::new(left, top, front),
            ],
            primitive.color,
        );
        self.polygon(
            [
                Vec3::new(right, bottom, front),
                Vec3::new(right, bottom, back),
                Vec3::new(right, top, back),
                Vec3::new(right, top, front),
            ],
            primitive.color.shade(0.7),
        );
        self.polygon(
            [
                Vec3::new(left, top, front),
                Vec3::new(right, top, front),
                Vec3::new(right, top, back),
                Vec3::new(left, top, back),
            ],
            primitive.color.shade(1.15),
        );

        let (lx, ly) = self.project(Vec3::new(c.x, bottom, front));
        let (vx, vy) = self.project(Vec3::new(c.x, top, back));
        self.body.push_str(&format!(
            r##"<text x="{lx:.1}" y="{:.1}" text-anchor="middle" font-size="11" fill="#374151">{}</text><text x="{vx:.1}" y="{:.1}" text-anchor="middle" font-size="10" fill="#6b7280">{}</text>"##,
            ly + 16.0,
            escape_markup(&primitive.label),
            vy - 6.0,
            crate::format::trim_number(primitive.value)
        ));
    }

    fn placeholder(&mut self, message: &str) {
        write_placeholder(&mut self.body, self.width, self.height, message);
    }
}

impl LineCanvas for SvgCanvas {
    fn axes(&mut self, axes: &AxisSpec) {
        let (w, h) = (self.width, self.height);
        let bottom = h - MARGIN_BOTTOM;
        let right = w - MARGIN_RIGHT;
        self.body.push_str(&format!(
            r##"<line x1="{MARGIN_LEFT}" y1="{bottom}" x2="{right}" y2="{bottom}" stroke="#9ca3af" stroke-width="1.5"/><line x1="{MARGIN_LEFT}" y1="{MARGIN_TOP}" x2="{MARGIN_LEFT}" y2="{bottom}" stroke="#9ca3af" stroke-width="1.5"/>"##
        ));

        for tick in &axes.y_ticks {
            let (_, y) = Self::data_to_pixel(axes, w, h, axes.x_min, tick.position);
            self.body.push_str(&format!(
                r##"<line x1="{MARGIN_LEFT}" y1="{y:.1}" x2="{right}" y2="{y:.1}" stroke="#e5e7eb" stroke-width="1"/><text x="{:.1}" y="{:.1}" text-anchor="end" font-size="11" fill="#6b7280">{}</text>"##,
                MARGIN_LEFT - 6.0,
                y + 4.0,
                escape_markup(&tick.label)
            ));
        }
        for tick in &axes.x_ticks {
            let (x, _) = Self::data_to_pixel(axes, w, h, tick.position, axes.y_min);
            self.body.push_str(&format!(
                r##"<text x="{x:.1}" y="{:.1}" text-anchor="middle" font-size="11" fill="#6b7280">{}</text>"##,
                bottom + 16.0,
                escape_markup(&tick.label)
            ));
        }

        self.body.push_str(&format!(
            r##"<text x="{:.1}" y="{:.1}" text-anchor="middle" font-size="12" fill="#6b7280">{}</text><text x="16" y="{:.1}" text-anchor="middle" font-size="12" fill="#6b7280" transform="rotate(-90, 16, {:.1})">{}</text>"##,
            (MARGIN_LEFT + right) / 2.0,
            h - 10.0,
            escape_markup(&axes.x_title),
            (MARGIN_TOP + bottom) / 2.0,
            (MARGIN_TOP + bottom) / 2.0,
            escape_markup(&axes.y_title)
        ));
        self.axes = Some(axes.clone());
    }

    fn draw_series(&mut self, series: &LineSeries) {
        let Some(axes) = self.axes.as_ref() else {
            return;
        };
        let color = series.color.css();
        let mut markup = String::new();
        for segment in &series.segments {
            let points: Vec<(f64, f64)> = segment
                .iter()
                .map(|(x, y)| Self::data_to_pixel(axes, self.width, self.height, *x, *y))
                .collect();
            if points.len() > 1 {
                let path: Vec<String> = points.iter().map(|(x, y)| format!("{x:.1},{y:.1}")).collect();
                markup.push_str(&format!(
                    r##"<polyline points="{}" fill="none" stroke="{color}" stroke-width="2"/>"##,
                    path.join(" ")
                ));
            }
            for (x, y) in &points {
                markup.push_str(&format!(r##"<circle cx="{x:.1}" cy="{y:.1}" r="3" fill="{color}"/>"##));
            }
        }
        self.body.push_str(&markup);
        self.legend.push((series.name.clone(), series.color));
    }

    fn placeholder(&mut self, message: &str) {
        write_placeholder(&mut self.body, self.width, self.height, message);
    }
}

fn write_placeholder(body: &mut String, width: f64, height: f64, message: &str) {
    body.push_str(&format!(
        r##"<text class="chart-placeholder" x="{:.1}" y="{:.1}" text-anchor="middle" font-size="13" fill="#6b7280">{}</text>"##,
        width / 2.0,
        height / 2.0,
        escape_markup(message)
    ));
}
