//! Text rendering of the bar scene for `cvbench watch`

use colored::Colorize;
use cvbench_view::canvas::NO_BAR_DATA;
use cvbench_view::{BoxPrimitive, CameraFraming, ResourceId, SceneBackend};
use indexmap::IndexMap;
use std::io::Write;
use tracing::warn;

const BAR_COLUMNS: usize = 48;
const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

/// Scene backend that draws each bar as a row of block characters
pub struct TerminalBackend<W: Write + Send + 'static> {
    out: W,
    title: String,
    next_id: ResourceId,
    bars: IndexMap<ResourceId, BoxPrimitive>,
    clear_screen: bool,
}

impl TerminalBackend<std::io::Stdout> {
    pub fn stdout(title: impl Into<String>) -> Self {
        Self::new(std::io::stdout(), title, true)
    }
}

impl<W: Write + Send + 'static> TerminalBackend<W> {
    pub fn new(out: W, title: impl Into<String>, clear_screen: bool) -> Self {
        Self {
            out,
            title: title.into(),
            next_id: 0,
            bars: IndexMap::new(),
            clear_screen,
        }
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    pub fn live_resources(&self) -> usize {
        self.bars.len()
    }

    pub fn output(&self) -> &W {
        &self.out
    }

    fn emit(&mut self, text: &str) {
        let mut result = Ok(());
        if self.clear_screen {
            result = self.out.write_all(CLEAR_SCREEN.as_bytes());
        }
        let result = result
            .and_then(|_| self.out.write_all(text.as_bytes()))
            .and_then(|_| self.out.flush());
        if let Err(e) = result {
            warn!("Failed to write frame: {}", e);
        }
    }
}

/// Frame text for `bars`, widest bar spanning the full column budget
pub fn render_frame(title: &str, bars: &[&BoxPrimitive]) -> String {
    let label_width = bars.iter().map(|bar| bar.label.chars().count()).max().unwrap_or(0);
    let tallest = bars.iter().map(|bar| bar.height).fold(0.0_f64, f64::max);

    let mut frame = format!("{}\n{}\n", title.bold(), "=".repeat(title.chars().count()));
    for bar in bars {
        let columns = if tallest > 0.0 {
            ((bar.height / tallest) * BAR_COLUMNS as f64).round() as usize
        } else {
            0
        };
        let block = "█".repeat(columns.max(1));
        let color = bar.color;
        frame.push_str(&format!(
            "{:<width$}  {} {}\n",
            bar.label,
            block.truecolor(color.0, color.1, color.2),
            cvbench_view::format::trim_number(bar.value),
            width = label_width
        ));
    }
    frame
}

impl<W: Write + Send + 'static> SceneBackend for TerminalBackend<W> {
    fn acquire(&mut self, primitive: &BoxPrimitive) -> ResourceId {
        self.next_id += 1;
        self.bars.insert(self.next_id, primitive.clone());
        self.next_id
    }

    fn release(&mut self, id: ResourceId) {
        self.bars.shift_remove(&id);
    }

    fn draw_frame(&mut self, resources: &[ResourceId], _camera: &CameraFraming) {
        let bars: Vec<&BoxPrimitive> = resources.iter().filter_map(|id| self.bars.get(id)).collect();
        let frame = render_frame(&self.title, &bars);
        self.emit(&frame);
    }

    fn clear(&mut self) {
        let text = format!("{}\n", NO_BAR_DATA.dimmed());
        self.emit(&text);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cvbench_view::{aggregate_categories, project_bars, RenderLoop};
    use serde_json::json;
    use std::time::Duration;

    fn projection() -> cvbench_view::BarProjection {
        let records = vec![
            json!({"algorithm_name": "Alpha", "speed_metrics": {"ups": 10.0}}),
            json!({"algorithm_name": "Beta", "speed_metrics": {"ups": 5.0}}),
        ];
        project_bars(&aggregate_categories(&records, "algorithm_name", "speed_metrics.ups"))
    }

    #[test]
    fn test_frame_scales_to_tallest_bar() {
        colored::control::set_override(false);
        let projection = projection();
        let bars: Vec<&BoxPrimitive> = projection.bars.iter().collect();
        let frame = render_frame("Ups by Algorithm Name", &bars);
        let lines: Vec<&str> = frame.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[2].starts_with("Alpha"));
        assert_eq!(lines[2].matches('█').count(), BAR_COLUMNS);
        assert_eq!(lines[3].matches('█').count(), BAR_COLUMNS / 2);
        assert!(lines[3].ends_with(" 5"));
    }

    #[tokio::test]
    async fn test_watch_loop_releases_terminal_resources() {
        let backend = TerminalBackend::new(Vec::new(), "test", false);
        let mut render = RenderLoop::new(backend, Duration::from_millis(5));
        let projection = projection();

        render.start(Some(&projection));
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(render.backend().lock().unwrap().live_resources(), 2);

        render.restart(None).await;
        let shared = render.backend();
        let backend = shared.lock().unwrap();
        assert_eq!(backend.live_resources(), 0);
        let written = String::from_utf8_lossy(backend.output());
        assert!(written.contains("Alpha"));
        assert!(written.contains(NO_BAR_DATA));
    }
}
