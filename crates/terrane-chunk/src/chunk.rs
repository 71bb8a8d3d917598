use std::sync::Arc;

use terrane_geom::{Rect, Vec2};
use terrane_mesh_cpu::MeshPayload;
use terrane_world::{ChunkCoord, HeightField, MeshSettings};

use crate::job::ChunkId;

/// Host-side object spawned on top of a chunk (trees, rocks, ...). The core
/// only tracks ownership so teardown can hand the ids back.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DecorationId(pub u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChunkState {
    AwaitingHeightField,
    /// Height field stored but no mesh shown yet.
    Idle,
    /// Showing the mesh of this LOD table index.
    MeshReady(usize),
}

#[derive(Clone, Debug, Default)]
pub(crate) struct LodMeshSlot {
    pub(crate) requested: bool,
    pub(crate) mesh: Option<Arc<MeshPayload>>,
}

/// What a destroyed chunk released.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Teardown {
    pub id: ChunkId,
    pub coord: ChunkCoord,
    pub displayed_lod: Option<usize>,
    pub cached_meshes: usize,
    pub had_collider: bool,
    pub decorations: Vec<DecorationId>,
}

pub struct Chunk {
    pub(crate) id: ChunkId,
    pub(crate) coord: ChunkCoord,
    pub(crate) bounds: Rect,
    pub(crate) sample_center: Vec2,
    pub(crate) visible: bool,
    pub(crate) displayed_lod: Option<usize>,
    pub(crate) lod_meshes: Vec<LodMeshSlot>,
    pub(crate) collider_applied: bool,
    pub(crate) height_field: Option<Arc<HeightField>>,
    pub(crate) decorations: Vec<DecorationId>,
}

impl Chunk {
    pub(crate) fn new(id: ChunkId, coord: ChunkCoord, mesh: &MeshSettings, lod_count: usize) -> Self {
        let world_size = mesh.mesh_world_size();
        let position = coord.world_center(world_size);
        // samples between chunk centres, kept integral so neighbours share edge samples
        let step = (mesh.vertices_per_line() - 3) as f32;
        Self {
            id,
            coord,
            bounds: Rect::from_center_size(position, Vec2::new(world_size, world_size)),
            sample_center: Vec2::new(coord.cx as f32 * step, coord.cz as f32 * step),
            visible: false,
            displayed_lod: None,
            lod_meshes: vec![LodMeshSlot::default(); lod_count],
            collider_applied: false,
            height_field: None,
            decorations: Vec::new(),
        }
    }

    pub fn id(&self) -> ChunkId {
        self.id
    }

    pub fn coord(&self) -> ChunkCoord {
        self.coord
    }

    /// Footprint on the XZ plane.
    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    /// Noise-space centre passed to the height-field builder.
    pub fn sample_center(&self) -> Vec2 {
        self.sample_center
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn displayed_lod(&self) -> Option<usize> {
        self.displayed_lod
    }

    pub fn displayed_mesh(&self) -> Option<&Arc<MeshPayload>> {
        self.displayed_lod.and_then(|i| self.lod_mesh(i))
    }

    pub fn lod_mesh(&self, lod_index: usize) -> Option<&Arc<MeshPayload>> {
        self.lod_meshes.get(lod_index).and_then(|s| s.mesh.as_ref())
    }

    pub fn mesh_requested(&self, lod_index: usize) -> bool {
        self.lod_meshes.get(lod_index).is_some_and(|s| s.requested)
    }

    pub fn has_collider(&self) -> bool {
        self.collider_applied
    }

    pub fn height_field(&self) -> Option<&Arc<HeightField>> {
        self.height_field.as_ref()
    }

    pub fn decorations(&self) -> &[DecorationId] {
        &self.decorations
    }

    pub fn state(&self) -> ChunkState {
        match (&self.height_field, self.displayed_lod) {
            (None, _) => ChunkState::AwaitingHeightField,
            (Some(_), None) => ChunkState::Idle,
            (Some(_), Some(i)) => ChunkState::MeshReady(i),
        }
    }

    /// Consumes the chunk, dropping its meshes and height field.
    pub(crate) fn teardown(self) -> Teardown {
        Teardown {
            id: self.id,
            coord: self.coord,
            displayed_lod: self.displayed_lod,
            cached_meshes: self.lod_meshes.iter().filter(|s| s.mesh.is_some()).count(),
            had_collider: self.collider_applied,
            decorations: self.decorations,
        }
    }
}
