use std::sync::Arc;

use hashbrown::{HashMap, HashSet};
use terrane_geom::Vec2;
use terrane_runtime::WorkQueue;
use terrane_world::{ChunkCoord, ConfigError, TerrainSettings};

use crate::chunk::{Chunk, DecorationId};
use crate::events::{ChunkChanges, ChunkEvent};
use crate::job::{ChunkId, JobOut, height_job, mesh_job};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ManagerStats {
    pub chunks_created: u64,
    pub chunks_destroyed: u64,
    pub height_jobs: u64,
    pub mesh_jobs: u64,
    /// Results that arrived for a chunk no longer registered.
    pub stale_results: u64,
    pub failed_meshes: u64,
    pub refreshes: u64,
}

/// Owns every chunk and drives them from viewer movement and job results.
///
/// All chunk state is mutated on the thread calling [`ChunkManager::update`];
/// workers only ever see immutable inputs.
pub struct ChunkManager<Q: WorkQueue<JobOut>> {
    settings: Arc<TerrainSettings>,
    queue: Q,
    chunks: HashMap<ChunkCoord, Chunk>,
    visible: HashSet<ChunkCoord>,
    next_id: u64,
    viewer: Vec2,
    last_refresh_viewer: Option<Vec2>,
    stats: ManagerStats,
}

impl<Q: WorkQueue<JobOut>> ChunkManager<Q> {
    /// Fails when `settings` would index past its tables or produce
    /// unusable geometry.
    pub fn new(settings: TerrainSettings, queue: Q) -> Result<Self, ConfigError> {
        settings.validate()?;
        Ok(Self {
            settings: Arc::new(settings),
            queue,
            chunks: HashMap::new(),
            visible: HashSet::new(),
            next_id: 0,
            viewer: Vec2::ZERO,
            last_refresh_viewer: None,
            stats: ManagerStats::default(),
        })
    }

    pub fn settings(&self) -> &TerrainSettings {
        &self.settings
    }

    pub fn queue(&self) -> &Q {
        &self.queue
    }

    pub fn stats(&self) -> ManagerStats {
        self.stats
    }

    pub fn viewer(&self) -> Vec2 {
        self.viewer
    }

    pub fn chunk(&self, coord: ChunkCoord) -> Option<&Chunk> {
        self.chunks.get(&coord)
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    pub fn chunks(&self) -> impl Iterator<Item = &Chunk> {
        self.chunks.values()
    }

    /// Coordinates currently shown, sorted.
    pub fn visible_chunks(&self) -> Vec<ChunkCoord> {
        let mut v: Vec<ChunkCoord> = self.visible.iter().copied().collect();
        v.sort_unstable();
        v
    }

    /// One tick: apply finished jobs, keep colliders current and, when the
    /// viewer moved far enough, rescan which chunks should exist.
    pub fn update(&mut self, viewer: Vec2) -> ChunkChanges {
        self.viewer = viewer;
        let mut changes = ChunkChanges::default();

        for out in self.queue.drain_completed() {
            self.apply_result(out, &mut changes);
        }

        for coord in self.visible_chunks() {
            self.update_collider(coord, &mut changes);
        }

        let threshold_sq = self.settings.streaming.sqr_viewer_move_threshold();
        let refresh = match self.last_refresh_viewer {
            None => true,
            Some(last) => (viewer - last).length_sq() > threshold_sq,
        };
        if refresh {
            self.last_refresh_viewer = Some(viewer);
            self.refresh(&mut changes);
        }
        changes
    }

    /// Tears every chunk down and starts over with `settings` on the next
    /// `update`. Rejected settings leave the current chunks untouched.
    pub fn regenerate(&mut self, settings: TerrainSettings) -> Result<ChunkChanges, ConfigError> {
        settings.validate()?;
        let mut changes = ChunkChanges::default();
        let mut coords: Vec<ChunkCoord> = self.chunks.keys().copied().collect();
        coords.sort_unstable();
        for coord in coords {
            self.destroy_into(coord, &mut changes);
        }
        self.visible.clear();
        self.settings = Arc::new(settings);
        self.last_refresh_viewer = None;
        log::info!(target: "chunk", "regenerating terrain ({} chunks released)", changes.len());
        Ok(changes)
    }

    pub fn destroy_chunk(&mut self, coord: ChunkCoord) -> ChunkChanges {
        let mut changes = ChunkChanges::default();
        self.destroy_into(coord, &mut changes);
        changes
    }

    /// Hands ownership of `decoration` to the chunk at `coord`. Returns false
    /// when no such chunk exists.
    pub fn attach_decoration(&mut self, coord: ChunkCoord, decoration: DecorationId) -> bool {
        match self.chunks.get_mut(&coord) {
            Some(chunk) => {
                chunk.decorations.push(decoration);
                true
            }
            None => false,
        }
    }

    fn refresh(&mut self, changes: &mut ChunkChanges) {
        self.stats.refreshes += 1;
        let mut updated: HashSet<ChunkCoord> = HashSet::new();
        for coord in self.visible_chunks() {
            updated.insert(coord);
            self.evaluate(coord, changes);
        }

        let world_size = self.settings.mesh.mesh_world_size();
        let radius = (self.settings.lods.max_view_distance() / world_size).ceil() as i32;
        let center = ChunkCoord::from_world(self.viewer, world_size);
        for dz in -radius..=radius {
            for dx in -radius..=radius {
                let coord = center.offset(dx, dz);
                if updated.contains(&coord) {
                    continue;
                }
                if self.chunks.contains_key(&coord) {
                    self.evaluate(coord, changes);
                } else {
                    self.create(coord, changes);
                }
            }
        }

        if let Some(unload) = self.settings.streaming.unload_distance {
            let mut far: Vec<ChunkCoord> = self
                .chunks
                .values()
                .filter(|c| !c.visible && c.bounds.distance(self.viewer) > unload)
                .map(|c| c.coord)
                .collect();
            far.sort_unstable();
            for coord in far {
                self.destroy_into(coord, changes);
            }
        }
    }

    fn create(&mut self, coord: ChunkCoord, changes: &mut ChunkChanges) {
        let id = ChunkId(self.next_id);
        self.next_id += 1;
        let chunk = Chunk::new(id, coord, &self.settings.mesh, self.settings.lods.len());
        self.queue
            .submit(height_job(&self.settings, id, coord, chunk.sample_center));
        self.chunks.insert(coord, chunk);
        self.stats.chunks_created += 1;
        self.stats.height_jobs += 1;
        log::debug!(target: "chunk", "created {} ({:?})", coord, id);
        changes.push(ChunkEvent::Created { coord });
    }

    fn destroy_into(&mut self, coord: ChunkCoord, changes: &mut ChunkChanges) {
        self.visible.remove(&coord);
        let Some(chunk) = self.chunks.remove(&coord) else {
            return;
        };
        let teardown = chunk.teardown();
        self.stats.chunks_destroyed += 1;
        log::debug!(
            target: "chunk",
            "destroyed {} ({:?}): {} cached meshes, {} decorations",
            coord,
            teardown.id,
            teardown.cached_meshes,
            teardown.decorations.len()
        );
        changes.push(ChunkEvent::Destroyed { coord, teardown });
    }

    fn apply_result(&mut self, out: JobOut, changes: &mut ChunkChanges) {
        let (id, coord) = (out.chunk(), out.coord());
        let live = self.chunks.get(&coord).is_some_and(|c| c.id == id);
        if !live {
            self.stats.stale_results += 1;
            log::debug!(target: "chunk", "dropping result for {} ({:?}): chunk is gone", coord, id);
            return;
        }
        match out {
            JobOut::HeightField { field, .. } => {
                if let Some(chunk) = self.chunks.get_mut(&coord) {
                    if chunk.height_field.is_none() {
                        chunk.height_field = Some(field);
                    }
                }
                self.evaluate(coord, changes);
            }
            JobOut::Mesh {
                lod_index, result, ..
            } => {
                match result {
                    Ok(mesh) => {
                        if let Some(slot) = self
                            .chunks
                            .get_mut(&coord)
                            .and_then(|c| c.lod_meshes.get_mut(lod_index))
                        {
                            slot.mesh = Some(Arc::new(mesh));
                        }
                    }
                    Err(e) => {
                        self.stats.failed_meshes += 1;
                        log::error!(target: "chunk", "mesh for {} lod index {} failed: {}", coord, lod_index, e);
                        return;
                    }
                }
                self.evaluate(coord, changes);
                if lod_index == self.settings.collider.lod_index {
                    self.update_collider(coord, changes);
                }
            }
        }
    }

    /// Picks the LOD for the current viewer distance, swapping or requesting
    /// meshes, and tracks visibility.
    fn evaluate(&mut self, coord: ChunkCoord, changes: &mut ChunkChanges) {
        let Some(chunk) = self.chunks.get_mut(&coord) else {
            return;
        };
        let Some(field) = chunk.height_field.clone() else {
            return;
        };
        let lods = &self.settings.lods;
        let distance = chunk.bounds.distance(self.viewer);
        let was_visible = chunk.visible;
        let visible = distance <= lods.max_view_distance();

        if visible {
            let lod_index = lods.select(distance);
            if chunk.displayed_lod != Some(lod_index) {
                let slot = &mut chunk.lod_meshes[lod_index];
                if let Some(mesh) = &slot.mesh {
                    chunk.displayed_lod = Some(lod_index);
                    changes.push(ChunkEvent::MeshChanged {
                        coord,
                        lod_index,
                        mesh: Arc::clone(mesh),
                    });
                } else if !slot.requested {
                    slot.requested = true;
                    self.queue
                        .submit(mesh_job(&self.settings, chunk.id, coord, field, lod_index));
                    self.stats.mesh_jobs += 1;
                }
            }
        }

        if was_visible != visible {
            chunk.visible = visible;
            if visible {
                self.visible.insert(coord);
            } else {
                self.visible.remove(&coord);
            }
            changes.push(ChunkEvent::VisibilityChanged { coord, visible });
        }
    }

    /// Requests the collider-LOD mesh once the viewer is inside that LOD's
    /// range, and installs it once the viewer is within activation distance.
    fn update_collider(&mut self, coord: ChunkCoord, changes: &mut ChunkChanges) {
        let Some(chunk) = self.chunks.get_mut(&coord) else {
            return;
        };
        if chunk.collider_applied {
            return;
        }
        let Some(field) = chunk.height_field.clone() else {
            return;
        };
        let index = self.settings.collider.lod_index;
        let sqr_distance = chunk.bounds.sqr_distance(self.viewer);

        let threshold = self.settings.lods.levels()[index].sqr_visible_distance();
        if sqr_distance < threshold && !chunk.lod_meshes[index].requested {
            chunk.lod_meshes[index].requested = true;
            self.queue
                .submit(mesh_job(&self.settings, chunk.id, coord, field, index));
            self.stats.mesh_jobs += 1;
        }

        if sqr_distance < self.settings.collider.sqr_activation_distance() {
            if let Some(mesh) = &chunk.lod_meshes[index].mesh {
                chunk.collider_applied = true;
                log::debug!(target: "chunk", "collider ready for {}", coord);
                changes.push(ChunkEvent::ColliderReady {
                    coord,
                    mesh: Arc::clone(mesh),
                });
            }
        }
    }
}
