//! Drawing capabilities consumed by the chart views
//!
//! Charts are drawn through these traits so the projection code never knows
//! which surface it targets. [`draw_bar_chart`] and [`draw_line_chart`] are
//! the only callers of the per-primitive methods and take care of the empty
//! case.

use crate::projection::{AxisSpec, BarProjection, BoxPrimitive, CameraFraming, LineProjection, LineSeries};

pub const NO_BAR_DATA: &str = "No data available to display for the selected graph parameters.";
pub const NO_LINE_DATA: &str = "No data available for the chart.";
pub const NO_LINE_SELECTION: &str = "Please select metric, X-axis, and series to display the chart.";

/// Surface that can show a 3D bar scene
pub trait BarCanvas {
    fn frame(&mut self, camera: &CameraFraming);
    fn draw_box(&mut self, primitive: &BoxPrimitive);
    fn placeholder(&mut self, message: &str);
}

/// Surface that can show a 2D line chart
pub trait LineCanvas {
    fn axes(&mut self, axes: &AxisSpec);
    fn draw_series(&mut self, series: &LineSeries);
    fn placeholder(&mut self, message: &str);
}

/// Draw `projection`, or the bar placeholder when there is nothing to show
pub fn draw_bar_chart<C: BarCanvas + ?Sized>(canvas: &mut C, projection: Option<&BarProjection>) {
    match projection {
        Some(projection) if !projection.is_empty() => {
            canvas.frame(&projection.camera);
            for primitive in &projection.bars {
                canvas.draw_box(primitive);
            }
        }
        _ => BarCanvas::placeholder(canvas, NO_BAR_DATA),
    }
}

/// Draw `projection`; `None` means no metric is selected
pub fn draw_line_chart<C: LineCanvas + ?Sized>(canvas: &mut C, projection: Option<&LineProjection>) {
    match projection {
        None => LineCanvas::placeholder(canvas, NO_LINE_SELECTION),
        Some(projection) if projection.is_empty() => LineCanvas::placeholder(canvas, NO_LINE_DATA),
        Some(projection) => {
            canvas.axes(&projection.axes);
            for series in &projection.series {
                canvas.draw_series(series);
            }
        }
    }
}
