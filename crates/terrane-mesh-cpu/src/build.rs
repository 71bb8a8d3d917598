use terrane_geom::{Vec2, Vec3};
use terrane_world::{HeightField, MeshSettings, SUPPORTED_LODS, lod_skip};

use crate::error::MeshError;
use crate::layout::{BufferSizes, VertexIndexMap, VertexKind};
use crate::mesh_build::{MeshBuild, MeshPayload};

/// Builds the mesh for one chunk at `lod` (0 = full detail).
///
/// `field` must be `vertices_per_line` square for `settings`. The outer
/// sample ring never reaches the output; it only shapes the normals of the
/// mesh edge. Edge-connection vertices take heights interpolated along the
/// coarse edge so the ring-1 border of any two neighbours lines up whatever
/// their LODs.
pub fn build_terrain_mesh(
    field: &HeightField,
    settings: &MeshSettings,
    lod: usize,
) -> Result<MeshPayload, MeshError> {
    let n = settings.vertices_per_line();
    if field.width() != n || field.height() != n {
        return Err(MeshError::WrongDimensions {
            expected: n,
            width: field.width(),
            height: field.height(),
        });
    }
    if lod >= SUPPORTED_LODS {
        return Err(MeshError::UnsupportedLod {
            lod,
            supported: SUPPORTED_LODS,
        });
    }
    let skip = lod_skip(lod);
    let chunk_size = n - 5;
    if chunk_size % skip != 0 {
        return Err(MeshError::DegenerateStride { chunk_size, skip });
    }

    let map = VertexIndexMap::new(n, skip);
    let sizes = BufferSizes::new(n, skip);
    let mut build = MeshBuild::with_sizes(&sizes);

    let world_size = settings.mesh_world_size();
    let top_left = Vec2::new(-1.0, 1.0) * (world_size / 2.0);
    let inner = (n - 3) as f32;

    for y in 0..n {
        for x in 0..n {
            let kind = map.kind(x, y);
            if kind == VertexKind::Skipped {
                continue;
            }
            let slot = map.slot(x, y);

            let percent = Vec2::new((x as f32 - 1.0) / inner, (y as f32 - 1.0) / inner);
            let pos = top_left + Vec2::new(percent.x, -percent.y) * world_size;
            let height = if kind == VertexKind::EdgeConnection {
                edge_connection_height(field, x, y, n, skip)
            } else {
                field.get(x, y)
            };
            build.add_vertex(slot, Vec3::from_ground(pos, height), percent);

            let create = x < n - 1
                && y < n - 1
                && (kind != VertexKind::EdgeConnection || (x != 2 && y != 2));
            if create {
                let step = if kind == VertexKind::Main && x != n - 3 && y != n - 3 {
                    skip
                } else {
                    1
                };
                let a = slot;
                let b = map.slot(x + step, y);
                let c = map.slot(x, y + step);
                let d = map.slot(x + step, y + step);
                build.add_triangle(a, d, c);
                build.add_triangle(d, a, b);
            }
        }
    }

    debug_assert_eq!(build.indices.len(), sizes.indices());
    debug_assert_eq!(build.border_triangles.len(), sizes.border_triangles);

    let mesh = build.finish(lod, settings.flat_shading);
    log::trace!(
        "terrain mesh lod {} ({}x{}): {} verts, {} tris",
        lod,
        n,
        n,
        mesh.vertex_count(),
        mesh.triangle_count()
    );
    Ok(mesh)
}

/// Linear blend between the two main vertices bracketing `(x, y)` along its
/// edge.
fn edge_connection_height(field: &HeightField, x: usize, y: usize, n: usize, skip: usize) -> f32 {
    let vertical = x == 2 || x == n - 3;
    let to_a = (if vertical { y - 2 } else { x - 2 }) % skip;
    let to_b = skip - to_a;
    let t = to_a as f32 / skip as f32;
    let (ha, hb) = if vertical {
        (field.get(x, y - to_a), field.get(x, y + to_b))
    } else {
        (field.get(x - to_a, y), field.get(x + to_b, y))
    };
    ha * (1.0 - t) + hb * t
}
