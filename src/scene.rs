//! Stand-in for a renderer and physics world: mirrors what the chunk manager
//! reports so the host can log meaningful numbers.

use hashbrown::HashMap;
use terrane_chunk::{ChunkChanges, ChunkEvent};
use terrane_world::ChunkCoord;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct SceneChunk {
    visible: bool,
    lod_index: Option<usize>,
    triangles: usize,
    collider: bool,
    decorations: usize,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SceneCounts {
    pub chunks: usize,
    pub visible: usize,
    pub drawn_triangles: usize,
    pub colliders: usize,
    pub decorations: usize,
}

#[derive(Default)]
pub struct Scene {
    chunks: HashMap<ChunkCoord, SceneChunk>,
    pub mesh_uploads: u64,
}

impl Scene {
    pub fn apply(&mut self, changes: &ChunkChanges) {
        for event in changes {
            match event {
                ChunkEvent::Created { coord } => {
                    self.chunks.insert(*coord, SceneChunk::default());
                }
                ChunkEvent::VisibilityChanged { coord, visible } => {
                    if let Some(c) = self.chunks.get_mut(coord) {
                        c.visible = *visible;
                    }
                }
                ChunkEvent::MeshChanged {
                    coord,
                    lod_index,
                    mesh,
                } => {
                    if let Some(c) = self.chunks.get_mut(coord) {
                        c.lod_index = Some(*lod_index);
                        c.triangles = mesh.triangle_count();
                        self.mesh_uploads += 1;
                    }
                }
                ChunkEvent::ColliderReady { coord, .. } => {
                    if let Some(c) = self.chunks.get_mut(coord) {
                        c.collider = true;
                    }
                }
                ChunkEvent::Destroyed { coord, teardown } => {
                    if let Some(c) = self.chunks.remove(coord) {
                        if c.decorations != teardown.decorations.len() {
                            log::warn!(
                                "{}: scene had {} decorations, chunk released {}",
                                coord,
                                c.decorations,
                                teardown.decorations.len()
                            );
                        }
                    }
                }
            }
        }
    }

    pub fn note_decoration(&mut self, coord: ChunkCoord) {
        if let Some(c) = self.chunks.get_mut(&coord) {
            c.decorations += 1;
        }
    }

    pub fn counts(&self) -> SceneCounts {
        let mut out = SceneCounts {
            chunks: self.chunks.len(),
            ..SceneCounts::default()
        };
        for c in self.chunks.values() {
            if c.visible {
                out.visible += 1;
                out.drawn_triangles += c.triangles;
            }
            out.colliders += usize::from(c.collider);
            out.decorations += c.decorations;
        }
        out
    }
}
