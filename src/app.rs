use std::path::PathBuf;
use std::sync::mpsc::Receiver;
use std::time::{Duration, Instant};

use terrane_chunk::{ChunkEvent, ChunkManager, DecorationId, JobOut};
use terrane_geom::Vec2;
use terrane_runtime::{ThreadPoolBuildError, WorkQueue, WorkerPool};
use terrane_world::{ConfigError, TerrainSettings};
use thiserror::Error;

use crate::scene::Scene;
use crate::watch;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("failed to start worker pool: {0}")]
    Pool(#[from] ThreadPoolBuildError),
    #[error("invalid terrain settings: {0}")]
    Config(#[from] ConfigError),
}

pub struct AppOptions {
    pub ticks: u64,
    pub workers: usize,
    pub speed: f32,
    pub heading_deg: f32,
    pub tick_ms: u64,
    pub stats_every: u64,
    /// Config file to reload on change.
    pub watch: Option<PathBuf>,
}

pub struct App {
    manager: ChunkManager<WorkerPool<JobOut>>,
    scene: Scene,
    options: AppOptions,
    config_rx: Option<Receiver<()>>,
    next_decoration: u64,
}

impl App {
    pub fn new(
        settings: TerrainSettings,
        options: AppOptions,
    ) -> Result<Self, AppError> {
        let pool = WorkerPool::new(options.workers)?;
        let manager = ChunkManager::new(settings, pool)?;
        let settings = manager.settings();
        log::info!(
            "terrain: chunk size {} ({} world units), {} lods, max view {}, {} workers",
            settings.mesh.chunk_size(),
            settings.mesh.mesh_world_size(),
            settings.lods.len(),
            settings.lods.max_view_distance(),
            manager.queue().workers()
        );
        let config_rx = options.watch.clone().map(watch::watch_config);
        Ok(Self {
            manager,
            scene: Scene::default(),
            options,
            config_rx,
            next_decoration: 0,
        })
    }

    fn viewer_at(&self, tick: u64) -> Vec2 {
        let heading = self.options.heading_deg.to_radians();
        let dir = Vec2::new(heading.cos(), heading.sin());
        dir * (self.options.speed * tick as f32)
    }

    pub fn run(&mut self) {
        let started = Instant::now();
        for tick in 0..self.options.ticks {
            self.reload_if_changed();
            let viewer = self.viewer_at(tick);
            let changes = self.manager.update(viewer);
            self.scene.apply(&changes);
            // one marker per new chunk, owned by the chunk from then on
            for event in &changes {
                if let ChunkEvent::Created { coord } = event {
                    let id = DecorationId(self.next_decoration);
                    self.next_decoration += 1;
                    if self.manager.attach_decoration(*coord, id) {
                        self.scene.note_decoration(*coord);
                    }
                }
            }
            if tick % self.options.stats_every == 0 {
                self.log_stats(tick, viewer);
            }
            if self.options.tick_ms > 0 {
                std::thread::sleep(Duration::from_millis(self.options.tick_ms));
            }
        }
        self.log_stats(self.options.ticks, self.viewer_at(self.options.ticks));
        log::info!("done in {:.2?}", started.elapsed());
    }

    fn reload_if_changed(&mut self) {
        let (Some(rx), Some(path)) = (&self.config_rx, &self.options.watch) else {
            return;
        };
        if !watch::changed(rx) {
            return;
        }
        match terrane_world::load_settings_from_path(path) {
            Ok(settings) => match self.manager.regenerate(settings) {
                Ok(changes) => {
                    log::info!("{} changed; regenerated", path.display());
                    self.scene.apply(&changes);
                }
                Err(e) => log::warn!("{} changed but was rejected: {}", path.display(), e),
            },
            Err(e) => log::warn!("{} changed but was rejected: {}", path.display(), e),
        }
    }

    fn log_stats(&self, tick: u64, viewer: Vec2) {
        let s = self.manager.stats();
        let c = self.scene.counts();
        log::info!(
            "[tick {}] viewer=({:.1}, {:.1}) chunks={} visible={} tris={} colliders={} decorations={} uploads={} jobs: height={} mesh={} in_flight={} stale={}",
            tick,
            viewer.x,
            viewer.y,
            c.chunks,
            c.visible,
            c.drawn_triangles,
            c.colliders,
            c.decorations,
            self.scene.mesh_uploads,
            s.height_jobs,
            s.mesh_jobs,
            self.manager.queue().in_flight(),
            s.stale_results
        );
    }
}
