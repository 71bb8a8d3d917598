use terrane_geom::{Aabb, Vec2, Vec3};

use crate::layout::{BufferSizes, VertexSlot};
use crate::normals::{face_normal, smooth_normals};

/// How the consumer should obtain vertex normals.
#[derive(Clone, Debug, PartialEq)]
pub enum Normals {
    /// One per vertex, computed with the out-of-mesh ring so they agree
    /// across chunk seams.
    Baked(Vec<Vec3>),
    /// Flat-shaded output: every triangle owns its vertices, so per-face
    /// normals are exact. See [`MeshPayload::flat_normals`].
    Recalculate,
}

/// Finished mesh, ready to upload.
#[derive(Clone, Debug, PartialEq)]
pub struct MeshPayload {
    pub lod: usize,
    pub positions: Vec<Vec3>,
    pub uvs: Vec<Vec2>,
    pub indices: Vec<u32>,
    pub normals: Normals,
}

impl MeshPayload {
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn bounds(&self) -> Option<Aabb> {
        Aabb::from_points(self.positions.iter().copied())
    }

    /// Per-vertex normals for a flat-shaded payload (each vertex gets the
    /// normal of the one triangle that uses it). For baked payloads this
    /// returns the baked normals.
    pub fn flat_normals(&self) -> Vec<Vec3> {
        if let Normals::Baked(n) = &self.normals {
            return n.clone();
        }
        let mut out = vec![Vec3::ZERO; self.positions.len()];
        for tri in self.indices.chunks_exact(3) {
            let (a, b, c) = (tri[0] as usize, tri[1] as usize, tri[2] as usize);
            let n = face_normal(self.positions[a], self.positions[b], self.positions[c]);
            out[a] = n;
            out[b] = n;
            out[c] = n;
        }
        out
    }
}

/// Accumulates vertices and triangles while the grid is walked.
pub(crate) struct MeshBuild {
    pub(crate) positions: Vec<Vec3>,
    pub(crate) uvs: Vec<Vec2>,
    pub(crate) indices: Vec<u32>,
    pub(crate) border_positions: Vec<Vec3>,
    pub(crate) border_triangles: Vec<[VertexSlot; 3]>,
}

impl MeshBuild {
    pub(crate) fn with_sizes(sizes: &BufferSizes) -> Self {
        let vertices = sizes.vertices();
        Self {
            positions: vec![Vec3::ZERO; vertices],
            uvs: vec![Vec2::ZERO; vertices],
            indices: Vec::with_capacity(sizes.indices()),
            border_positions: vec![Vec3::ZERO; sizes.border_vertices],
            border_triangles: Vec::with_capacity(sizes.border_triangles),
        }
    }

    #[inline]
    pub(crate) fn add_vertex(&mut self, slot: VertexSlot, position: Vec3, uv: Vec2) {
        match slot {
            VertexSlot::Mesh(i) => {
                self.positions[i as usize] = position;
                self.uvs[i as usize] = uv;
            }
            VertexSlot::Border(i) => self.border_positions[i as usize] = position,
            VertexSlot::Skipped => {}
        }
    }

    /// Triangles touching the border ring only feed normals.
    #[inline]
    pub(crate) fn add_triangle(&mut self, a: VertexSlot, b: VertexSlot, c: VertexSlot) {
        match (a, b, c) {
            (VertexSlot::Mesh(a), VertexSlot::Mesh(b), VertexSlot::Mesh(c)) => {
                self.indices.extend_from_slice(&[a, b, c]);
            }
            _ => self.border_triangles.push([a, b, c]),
        }
    }

    #[inline]
    pub(crate) fn position(&self, slot: VertexSlot) -> Vec3 {
        match slot {
            VertexSlot::Mesh(i) => self.positions[i as usize],
            VertexSlot::Border(i) => self.border_positions[i as usize],
            VertexSlot::Skipped => Vec3::ZERO,
        }
    }

    pub(crate) fn finish(self, lod: usize, flat_shading: bool) -> MeshPayload {
        if flat_shading {
            let positions = self.indices.iter().map(|&i| self.positions[i as usize]).collect();
            let uvs = self.indices.iter().map(|&i| self.uvs[i as usize]).collect();
            let indices = (0..self.indices.len() as u32).collect();
            return MeshPayload {
                lod,
                positions,
                uvs,
                indices,
                normals: Normals::Recalculate,
            };
        }
        let normals = smooth_normals(&self);
        MeshPayload {
            lod,
            positions: self.positions,
            uvs: self.uvs,
            indices: self.indices,
            normals: Normals::Baked(normals),
        }
    }
}
