//! Mapping aggregates onto drawable primitives
//!
//! Bar geometry is expressed in scene units: the tallest bar is 10 units
//! high, bars are 0.8 wide and 0.5 deep, and consecutive bars start 1.5
//! apart, centred on the origin. Line geometry is expressed in data units
//! (epoch milliseconds or slot indices on x, metric values on y) and mapped
//! onto pixels by the canvas.

use crate::aggregate::{AxisKind, CategoryAggregate, SeriesAggregate};
use crate::format::{compact_tick, nice_step, title_case};
use serde::Serialize;

pub const BAR_WIDTH: f64 = 0.8;
pub const BAR_DEPTH: f64 = 0.5;
pub const BAR_SPACING: f64 = 1.5;
/// Height of the tallest bar, and the scale used when every value is 0
pub const SCENE_HEIGHT: f64 = 10.0;
pub const MIN_BAR_HEIGHT: f64 = 0.01;
const Y_TICK_TARGET: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub fn css(&self) -> String {
        format!("rgb({}, {}, {})", self.0, self.1, self.2)
    }

    /// Scale each channel by `factor`, used for shaded box faces
    pub fn shade(&self, factor: f64) -> Rgb {
        let scale = |c: u8| (f64::from(c) * factor).round().clamp(0.0, 255.0) as u8;
        Rgb(scale(self.0), scale(self.1), scale(self.2))
    }
}

/// Series and bar colours, assigned cyclically by index
pub const PALETTE: [Rgb; 12] = [
    Rgb(75, 192, 192),
    Rgb(255, 99, 132),
    Rgb(54, 162, 235),
    Rgb(255, 206, 86),
    Rgb(153, 102, 255),
    Rgb(255, 159, 64),
    Rgb(199, 199, 199),
    Rgb(83, 102, 83),
    Rgb(0, 128, 128),
    Rgb(233, 30, 99),
    Rgb(121, 85, 72),
    Rgb(0, 0, 0),
];

pub fn palette_color(index: usize) -> Rgb {
    PALETTE[index % PALETTE.len()]
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

/// One bar of the 3D chart, positioned by its centre
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoxPrimitive {
    pub label: String,
    pub value: f64,
    pub center: Vec3,
    pub width: f64,
    pub height: f64,
    pub depth: f64,
    pub color: Rgb,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CameraFraming {
    pub position: Vec3,
    pub look_at: Vec3,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarProjection {
    pub title: String,
    pub bars: Vec<BoxPrimitive>,
    pub camera: CameraFraming,
    /// Scene units per metric unit
    pub scale: f64,
    pub max_value: f64,
}

impl BarProjection {
    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }
}

/// Scene units per metric unit for a chart whose largest value is `max_value`
pub fn bar_scale(max_value: f64) -> f64 {
    if max_value > 0.0 {
        SCENE_HEIGHT / max_value
    } else {
        SCENE_HEIGHT
    }
}

/// Project category values onto evenly spaced boxes with a camera that
/// frames all of them
pub fn project_bars(aggregate: &CategoryAggregate) -> BarProjection {
    let scale = bar_scale(aggregate.max_value);
    let n = aggregate.values.len() as f64;

    let bars = aggregate
        .values
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            let height = (entry.value * scale).max(MIN_BAR_HEIGHT);
            BoxPrimitive {
                label: entry.label().to_string(),
                value: entry.value,
                center: Vec3::new(
                    index as f64 * BAR_SPACING - (n * BAR_SPACING) / 2.0 + BAR_SPACING / 2.0,
                    height / 2.0,
                    0.0,
                ),
                width: BAR_WIDTH,
                height,
                depth: BAR_DEPTH,
                color: palette_color(index),
            }
        })
        .collect();

    let scaled_max = aggregate.max_value * scale;
    let camera = CameraFraming {
        position: Vec3::new(0.0, (scaled_max * 0.75).max(5.0), (n * BAR_SPACING * 0.7).max(10.0)),
        look_at: Vec3::new(0.0, (scaled_max / 3.0).max(0.0), 0.0),
    };

    BarProjection {
        title: format!(
            "{} by {}",
            title_case(&aggregate.metric),
            title_case(&aggregate.category_key)
        ),
        bars,
        camera,
        scale,
        max_value: aggregate.max_value,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tick {
    pub position: f64,
    pub label: String,
}

/// Axis domains, ticks and titles for the line chart
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AxisSpec {
    pub title: String,
    pub x_title: String,
    pub y_title: String,
    pub x_kind: AxisKind,
    pub x_min: f64,
    pub x_max: f64,
    pub x_ticks: Vec<Tick>,
    pub begin_at_zero: bool,
    pub y_min: f64,
    pub y_max: f64,
    pub y_ticks: Vec<Tick>,
}

/// One polyline, broken into segments wherever a point is missing
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineSeries {
    pub name: String,
    pub color: Rgb,
    pub segments: Vec<Vec<(f64, f64)>>,
}

impl LineSeries {
    pub fn point_count(&self) -> usize {
        self.segments.iter().map(Vec::len).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineProjection {
    pub axes: AxisSpec,
    pub series: Vec<LineSeries>,
}

impl LineProjection {
    pub fn is_empty(&self) -> bool {
        self.series.iter().all(|series| series.segments.is_empty())
    }
}

/// Project series onto data-space polylines with zero-based y ticks
pub fn project_lines(aggregate: &SeriesAggregate) -> LineProjection {
    let x_positions: Vec<f64> = aggregate
        .x_values
        .iter()
        .enumerate()
        .map(|(index, x)| match (aggregate.axis, x.time) {
            (AxisKind::Time, Some(time)) => time.timestamp_millis() as f64,
            _ => index as f64,
        })
        .collect();

    let series = aggregate
        .series
        .iter()
        .enumerate()
        .map(|(index, series)| LineSeries {
            name: series.name.clone(),
            color: palette_color(index),
            segments: split_at_gaps(&x_positions, &series.points),
        })
        .collect();

    let x_ticks = aggregate
        .x_values
        .iter()
        .zip(&x_positions)
        .map(|(x, position)| Tick {
            position: *position,
            label: match x.time {
                Some(time) if aggregate.axis == AxisKind::Time => {
                    time.format("%Y-%m-%d").to_string()
                }
                _ => x.label().to_string(),
            },
        })
        .collect();

    let step = nice_step(aggregate.max_value().unwrap_or(0.0), Y_TICK_TARGET);
    let y_max = y_ceiling(aggregate.max_value().unwrap_or(0.0), step);
    let y_ticks = (0..)
        .map(|i| i as f64 * step)
        .take_while(|value| *value <= y_max + step * 1e-9)
        .map(|value| Tick {
            position: value,
            label: compact_tick(value, step),
        })
        .collect();

    let metric = title_case(&aggregate.metric);
    let x_title = title_case(&aggregate.x_axis_key);
    let axes = AxisSpec {
        title: format!(
            "{metric} by {x_title} (Grouped by {})",
            title_case(&aggregate.series_key)
        ),
        x_title,
        y_title: metric,
        x_kind: aggregate.axis,
        x_min: x_positions.iter().copied().fold(f64::INFINITY, f64::min),
        x_max: x_positions.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        x_ticks,
        begin_at_zero: true,
        y_min: 0.0,
        y_max,
        y_ticks,
    };

    LineProjection { axes: normalise_x_domain(axes), series }
}

fn split_at_gaps(xs: &[f64], points: &[Option<f64>]) -> Vec<Vec<(f64, f64)>> {
    let mut segments = Vec::new();
    let mut current = Vec::new();
    for (x, point) in xs.iter().zip(points) {
        match point {
            Some(y) => current.push((*x, *y)),
            None if !current.is_empty() => segments.push(std::mem::take(&mut current)),
            None => {}
        }
    }
    if !current.is_empty() {
        segments.push(current);
    }
    segments
}

fn y_ceiling(max: f64, step: f64) -> f64 {
    if max <= 0.0 {
        step
    } else {
        (max / step).ceil() * step
    }
}

/// Empty or single-position domains are widened so the canvas never divides
/// by zero
fn normalise_x_domain(mut axes: AxisSpec) -> AxisSpec {
    if axes.x_ticks.is_empty() {
        axes.x_min = 0.0;
        axes.x_max = 1.0;
        return axes;
    }
    if axes.x_max <= axes.x_min {
        axes.x_min -= 0.5;
        axes.x_max += 0.5;
    }
    axes
}
