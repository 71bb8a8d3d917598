use std::sync::Arc;

use terrane_mesh_cpu::MeshPayload;
use terrane_world::ChunkCoord;

use crate::chunk::Teardown;

/// Something the host has to mirror: show/hide, swap a mesh, install a
/// collider or release a chunk's resources.
#[derive(Clone, Debug)]
pub enum ChunkEvent {
    Created {
        coord: ChunkCoord,
    },
    VisibilityChanged {
        coord: ChunkCoord,
        visible: bool,
    },
    MeshChanged {
        coord: ChunkCoord,
        lod_index: usize,
        mesh: Arc<MeshPayload>,
    },
    ColliderReady {
        coord: ChunkCoord,
        mesh: Arc<MeshPayload>,
    },
    Destroyed {
        coord: ChunkCoord,
        teardown: Teardown,
    },
}

impl ChunkEvent {
    pub fn coord(&self) -> ChunkCoord {
        match self {
            ChunkEvent::Created { coord }
            | ChunkEvent::VisibilityChanged { coord, .. }
            | ChunkEvent::MeshChanged { coord, .. }
            | ChunkEvent::ColliderReady { coord, .. }
            | ChunkEvent::Destroyed { coord, .. } => *coord,
        }
    }
}

/// Events produced by one call into the manager, in the order they happened.
#[derive(Clone, Debug, Default)]
pub struct ChunkChanges {
    pub events: Vec<ChunkEvent>,
}

impl ChunkChanges {
    #[inline]
    pub(crate) fn push(&mut self, event: ChunkEvent) {
        self.events.push(event);
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ChunkEvent> {
        self.events.iter()
    }
}

impl IntoIterator for ChunkChanges {
    type Item = ChunkEvent;
    type IntoIter = std::vec::IntoIter<ChunkEvent>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.into_iter()
    }
}

impl<'a> IntoIterator for &'a ChunkChanges {
    type Item = &'a ChunkEvent;
    type IntoIter = std::slice::Iter<'a, ChunkEvent>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.iter()
    }
}
