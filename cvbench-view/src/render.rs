//! Render lifecycle for the 3D bar scene
//!
//! A [`BarScene`] owns one backend resource per bar and hands all of them
//! back when dropped. A [`RenderLoop`] keeps one scene alive inside a tokio
//! task that redraws it on a fixed interval; stopping, restarting or dropping
//! the loop ends the task, which drops the scene and so releases every
//! resource it acquired.

use crate::projection::{BarProjection, BoxPrimitive, CameraFraming};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

pub type ResourceId = u64;

/// Something that holds drawable resources and can present a frame
pub trait SceneBackend: Send + 'static {
    /// Allocate whatever is needed to draw `primitive`
    fn acquire(&mut self, primitive: &BoxPrimitive) -> ResourceId;

    fn release(&mut self, id: ResourceId);

    fn draw_frame(&mut self, resources: &[ResourceId], camera: &CameraFraming);

    /// Show the empty state; called when a loop starts with nothing to draw
    fn clear(&mut self) {}
}

pub type SharedBackend<B> = Arc<Mutex<B>>;

fn lock<B>(backend: &SharedBackend<B>) -> MutexGuard<'_, B> {
    backend.lock().unwrap_or_else(PoisonError::into_inner)
}

/// The resources for one projection, released on drop
pub struct BarScene<B: SceneBackend> {
    backend: SharedBackend<B>,
    resources: Vec<ResourceId>,
    camera: CameraFraming,
}

impl<B: SceneBackend> BarScene<B> {
    pub fn build(backend: SharedBackend<B>, projection: &BarProjection) -> Self {
        let resources = {
            let mut guard = lock(&backend);
            projection
                .bars
                .iter()
                .map(|primitive| guard.acquire(primitive))
                .collect()
        };
        Self {
            backend,
            resources,
            camera: projection.camera,
        }
    }

    pub fn draw(&self) {
        lock(&self.backend).draw_frame(&self.resources, &self.camera);
    }

    pub fn resource_count(&self) -> usize {
        self.resources.len()
    }
}

impl<B: SceneBackend> Drop for BarScene<B> {
    fn drop(&mut self) {
        let mut guard = lock(&self.backend);
        for id in self.resources.drain(..) {
            guard.release(id);
        }
    }
}

struct Running {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Restartable redraw task around a shared backend.
///
/// `start` must be called from within a tokio runtime.
pub struct RenderLoop<B: SceneBackend> {
    backend: SharedBackend<B>,
    interval: Duration,
    running: Option<Running>,
}

impl<B: SceneBackend> RenderLoop<B> {
    pub fn new(backend: B, interval: Duration) -> Self {
        Self {
            backend: Arc::new(Mutex::new(backend)),
            interval,
            running: None,
        }
    }

    /// Handle to the backend, for inspection while the loop runs
    pub fn backend(&self) -> SharedBackend<B> {
        Arc::clone(&self.backend)
    }

    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    /// Acquire resources for `projection` and start redrawing. With nothing
    /// to draw, the backend is cleared and the loop stays idle.
    ///
    /// A loop that is already running is cancelled first; use
    /// [`RenderLoop::restart`] to wait for its resources to be released.
    pub fn start(&mut self, projection: Option<&BarProjection>) {
        if let Some(previous) = self.running.take() {
            previous.cancel.cancel();
        }

        let projection = match projection {
            Some(projection) if !projection.is_empty() => projection,
            _ => {
                debug!("Render loop idle: nothing selected");
                lock(&self.backend).clear();
                return;
            }
        };

        let scene = BarScene::build(Arc::clone(&self.backend), projection);
        debug!("Render loop started with {} bars", scene.resource_count());

        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let interval = self.interval;
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => scene.draw(),
                }
            }
            drop(scene);
        });

        self.running = Some(Running { cancel, handle });
    }

    /// Cancel the task and wait until its scene has been dropped
    pub async fn stop(&mut self) {
        let Some(running) = self.running.take() else {
            return;
        };
        running.cancel.cancel();
        if let Err(e) = running.handle.await {
            warn!("Render task ended abnormally: {}", e);
        }
        debug!("Render loop stopped");
    }

    pub async fn restart(&mut self, projection: Option<&BarProjection>) {
        self.stop().await;
        self.start(projection);
    }
}

impl<B: SceneBackend> Drop for RenderLoop<B> {
    fn drop(&mut self) {
        if let Some(running) = self.running.take() {
            running.cancel.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::aggregate_categories;
    use crate::projection::project_bars;
    use serde_json::json;
    use std::collections::HashSet;

    #[derive(Default)]
    struct CountingBackend {
        next_id: ResourceId,
        live: HashSet<ResourceId>,
        acquired: usize,
        released: usize,
        frames: usize,
        clears: usize,
    }

    impl SceneBackend for CountingBackend {
        fn acquire(&mut self, _primitive: &BoxPrimitive) -> ResourceId {
            self.next_id += 1;
            self.live.insert(self.next_id);
            self.acquired += 1;
            self.next_id
        }

        fn release(&mut self, id: ResourceId) {
            assert!(self.live.remove(&id), "double release of {id}");
            self.released += 1;
        }

        fn draw_frame(&mut self, resources: &[ResourceId], _camera: &CameraFraming) {
            assert!(resources.iter().all(|id| self.live.contains(id)));
            self.frames += 1;
        }

        fn clear(&mut self) {
            self.clears += 1;
        }
    }

    fn projection(names: &[&str]) -> BarProjection {
        let records: Vec<_> = names
            .iter()
            .enumerate()
            .map(|(i, name)| json!({"algorithm_name": name, "speed_metrics": {"t": i + 1}}))
            .collect();
        project_bars(&aggregate_categories(&records, "algorithm_name", "speed_metrics.t"))
    }

    fn counts(render: &RenderLoop<CountingBackend>) -> (usize, usize, usize) {
        let backend = render.backend();
        let guard = lock(&backend);
        (guard.acquired, guard.released, guard.frames)
    }

    #[test]
    fn test_scene_releases_on_drop() {
        let backend = Arc::new(Mutex::new(CountingBackend::default()));
        let scene = BarScene::build(Arc::clone(&backend), &projection(&["a", "b", "c"]));
        assert_eq!(scene.resource_count(), 3);
        scene.draw();
        drop(scene);
        let guard = lock(&backend);
        assert_eq!((guard.acquired, guard.released, guard.frames), (3, 3, 1));
        assert!(guard.live.is_empty());
    }

    #[tokio::test]
    async fn test_stop_releases_everything() {
        let mut render = RenderLoop::new(CountingBackend::default(), Duration::from_millis(5));
        render.start(Some(&projection(&["a", "b", "c"])));
        assert!(render.is_running());
        tokio::time::sleep(Duration::from_millis(30)).await;

        render.stop().await;
        let (acquired, released, frames) = counts(&render);
        assert_eq!(acquired, 3);
        assert_eq!(released, 3);
        assert!(frames >= 1);
        assert!(!render.is_running());
    }

    #[tokio::test]
    async fn test_restart_releases_previous_scene() {
        let mut render = RenderLoop::new(CountingBackend::default(), Duration::from_millis(5));
        render.start(Some(&projection(&["a", "b", "c"])));
        render.restart(Some(&projection(&["a", "b"]))).await;
        let (acquired, released, _) = counts(&render);
        assert_eq!((acquired, released), (5, 3));

        render.stop().await;
        let (acquired, released, _) = counts(&render);
        assert_eq!(acquired, released);
    }

    #[tokio::test]
    async fn test_drop_releases_everything() {
        let mut render = RenderLoop::new(CountingBackend::default(), Duration::from_millis(5));
        render.start(Some(&projection(&["a", "b"])));
        let backend = render.backend();
        drop(render);

        for _ in 0..50 {
            if lock(&backend).released == 2 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        let guard = lock(&backend);
        assert_eq!(guard.acquired, 2);
        assert_eq!(guard.released, 2);
    }

    #[tokio::test]
    async fn test_nothing_selected_stays_idle() {
        let mut render = RenderLoop::new(CountingBackend::default(), Duration::from_millis(5));
        render.start(None);
        assert!(!render.is_running());
        render.restart(Some(&projection(&[]))).await;
        assert!(!render.is_running());

        let backend = render.backend();
        let guard = lock(&backend);
        assert_eq!((guard.acquired, guard.clears), (0, 2));
    }
}
