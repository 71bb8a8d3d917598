use std::sync::Arc;

use terrane_geom::Vec2;
use terrane_mesh_cpu::{MeshError, MeshPayload, build_terrain_mesh};
use terrane_runtime::Task;
use terrane_world::{ChunkCoord, HeightField, TerrainSettings, build_height_field};

/// Identity of one chunk instance. A coordinate can be destroyed and created
/// again; the id tells the two apart when late results come back.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkId(pub u64);

/// Result of a background job.
#[derive(Debug)]
pub enum JobOut {
    HeightField {
        chunk: ChunkId,
        coord: ChunkCoord,
        field: Arc<HeightField>,
    },
    Mesh {
        chunk: ChunkId,
        coord: ChunkCoord,
        lod_index: usize,
        result: Result<MeshPayload, MeshError>,
    },
}

impl JobOut {
    pub fn chunk(&self) -> ChunkId {
        match self {
            JobOut::HeightField { chunk, .. } | JobOut::Mesh { chunk, .. } => *chunk,
        }
    }

    pub fn coord(&self) -> ChunkCoord {
        match self {
            JobOut::HeightField { coord, .. } | JobOut::Mesh { coord, .. } => *coord,
        }
    }
}

pub(crate) fn height_job(
    settings: &Arc<TerrainSettings>,
    chunk: ChunkId,
    coord: ChunkCoord,
    sample_center: Vec2,
) -> Task<JobOut> {
    let settings = Arc::clone(settings);
    Box::new(move || {
        let n = settings.mesh.vertices_per_line();
        let field = build_height_field(n, n, &settings.height, sample_center);
        JobOut::HeightField {
            chunk,
            coord,
            field: Arc::new(field),
        }
    })
}

pub(crate) fn mesh_job(
    settings: &Arc<TerrainSettings>,
    chunk: ChunkId,
    coord: ChunkCoord,
    field: Arc<HeightField>,
    lod_index: usize,
) -> Task<JobOut> {
    let mesh = settings.mesh;
    let lod = settings.lods.levels()[lod_index].lod;
    Box::new(move || JobOut::Mesh {
        chunk,
        coord,
        lod_index,
        result: build_terrain_mesh(&field, &mesh, lod),
    })
}
