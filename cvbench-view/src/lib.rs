//! Viewer pipeline for computer-vision benchmark records
//!
//! Records flow through [`engine`] (filter and sort), [`discovery`] (numeric
//! metrics), [`aggregate`] (category and series grouping) and [`projection`]
//! (scaled primitives) before being drawn through [`canvas`] by [`svg`] or a
//! live [`render`] backend. [`shell`] ties them to a record source.

pub mod aggregate;
pub mod canvas;
pub mod discovery;
pub mod engine;
pub mod form;
pub mod format;
pub mod html;
pub mod path;
pub mod projection;
pub mod record;
pub mod render;
pub mod shell;
pub mod state;
pub mod svg;
pub mod table;

pub use aggregate::{aggregate_categories, aggregate_series, AxisKind, CategoryAggregate, SeriesAggregate};
pub use canvas::{draw_bar_chart, draw_line_chart, BarCanvas, LineCanvas};
pub use discovery::{discover, reconcile, DiscoveryPolicy};
pub use form::BenchmarkDraft;
pub use html::{bar_chart_svg, line_chart_svg, render_page, render_status_page, PageOptions, ViewQuery};
pub use path::Record;
pub use projection::{project_bars, project_lines, BarProjection, BoxPrimitive, CameraFraming, LineProjection};
pub use record::{BenchmarkRecord, DatasetType};
pub use render::{BarScene, RenderLoop, ResourceId, SceneBackend};
pub use shell::{compose, BenchmarkSource, LoadState, Notice, Session, ViewModel};
pub use state::{ChartSelection, FilterState, SortDirection, SortState, ViewState};
pub use svg::SvgCanvas;
pub use table::{build_table, TableView};
