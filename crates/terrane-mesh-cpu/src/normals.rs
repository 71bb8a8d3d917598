use terrane_geom::Vec3;

use crate::layout::VertexSlot;
use crate::mesh_build::MeshBuild;

/// Unit normal of triangle `(a, b, c)`; counter-clockwise seen from above
/// points up.
#[inline]
pub fn face_normal(a: Vec3, b: Vec3, c: Vec3) -> Vec3 {
    (b - a).cross(c - a).normalized()
}

/// Sum of face normals per vertex, normalised. Border triangles add to the
/// in-mesh corners they touch, which keeps shading continuous across seams.
pub(crate) fn smooth_normals(build: &MeshBuild) -> Vec<Vec3> {
    let mut normals = vec![Vec3::ZERO; build.positions.len()];

    for tri in build.indices.chunks_exact(3) {
        let (a, b, c) = (tri[0] as usize, tri[1] as usize, tri[2] as usize);
        let n = face_normal(build.positions[a], build.positions[b], build.positions[c]);
        normals[a] += n;
        normals[b] += n;
        normals[c] += n;
    }

    for tri in &build.border_triangles {
        let n = face_normal(
            build.position(tri[0]),
            build.position(tri[1]),
            build.position(tri[2]),
        );
        for slot in tri {
            if let VertexSlot::Mesh(i) = *slot {
                normals[i as usize] += n;
            }
        }
    }

    for n in &mut normals {
        *n = n.normalized();
    }
    normals
}
