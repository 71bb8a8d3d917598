//! Vertex classification for one chunk's sample grid.
//!
//! A grid of `n x n` samples is split into rings:
//!
//! * ring 0 is outside the mesh and only feeds normals,
//! * ring 1 is the mesh edge, always at full resolution,
//! * ring 2 holds edge-connection vertices whose heights are interpolated
//!   between the main vertices on either side,
//! * the interior keeps only the main vertices on the LOD stride.

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum VertexKind {
    OutOfMesh,
    MeshEdge,
    EdgeConnection,
    Main,
    Skipped,
}

/// Where a grid sample ended up.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum VertexSlot {
    /// Index into the output vertex buffer.
    Mesh(u32),
    /// Index into the normal-only border buffer.
    Border(u32),
    Skipped,
}

#[inline]
pub fn classify(x: usize, y: usize, n: usize, skip: usize) -> VertexKind {
    let last = n - 1;
    if x == 0 || y == 0 || x == last || y == last {
        return VertexKind::OutOfMesh;
    }
    if x == 1 || y == 1 || x == n - 2 || y == n - 2 {
        return VertexKind::MeshEdge;
    }
    if (x - 2) % skip == 0 && (y - 2) % skip == 0 {
        return VertexKind::Main;
    }
    if x == 2 || y == 2 || x == n - 3 || y == n - 3 {
        return VertexKind::EdgeConnection;
    }
    VertexKind::Skipped
}

/// Slot for every sample, assigned row-major.
#[derive(Clone, Debug)]
pub struct VertexIndexMap {
    n: usize,
    skip: usize,
    slots: Vec<VertexSlot>,
    mesh_vertices: usize,
    border_vertices: usize,
}

impl VertexIndexMap {
    pub fn new(n: usize, skip: usize) -> Self {
        let mut slots = Vec::with_capacity(n * n);
        let mut mesh = 0u32;
        let mut border = 0u32;
        for y in 0..n {
            for x in 0..n {
                let slot = match classify(x, y, n, skip) {
                    VertexKind::OutOfMesh => {
                        border += 1;
                        VertexSlot::Border(border - 1)
                    }
                    VertexKind::Skipped => VertexSlot::Skipped,
                    _ => {
                        mesh += 1;
                        VertexSlot::Mesh(mesh - 1)
                    }
                };
                slots.push(slot);
            }
        }
        Self {
            n,
            skip,
            slots,
            mesh_vertices: mesh as usize,
            border_vertices: border as usize,
        }
    }

    #[inline]
    pub fn vertices_per_line(&self) -> usize {
        self.n
    }

    #[inline]
    pub fn skip(&self) -> usize {
        self.skip
    }

    #[inline]
    pub fn slot(&self, x: usize, y: usize) -> VertexSlot {
        self.slots[y * self.n + x]
    }

    #[inline]
    pub fn kind(&self, x: usize, y: usize) -> VertexKind {
        classify(x, y, self.n, self.skip)
    }

    pub fn mesh_vertices(&self) -> usize {
        self.mesh_vertices
    }

    pub fn border_vertices(&self) -> usize {
        self.border_vertices
    }
}

/// Buffer lengths computed from the grid size alone, used to preallocate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BufferSizes {
    pub mesh_edge_vertices: usize,
    pub edge_connection_vertices: usize,
    pub main_vertices: usize,
    pub triangles: usize,
    pub border_vertices: usize,
    pub border_triangles: usize,
}

impl BufferSizes {
    /// `n` samples per line at stride `skip`; `n - 5` must be a multiple of `skip`.
    pub fn new(n: usize, skip: usize) -> Self {
        let main_per_line = (n - 5) / skip + 1;
        Self {
            mesh_edge_vertices: 4 * (n - 2) - 4,
            edge_connection_vertices: (skip - 1) * (n - 5) / skip * 4,
            main_vertices: main_per_line * main_per_line,
            triangles: 8 * (n - 4) + 2 * (main_per_line - 1) * (main_per_line - 1),
            border_vertices: 4 * n - 4,
            border_triangles: 8 * (n - 2),
        }
    }

    #[inline]
    pub fn vertices(&self) -> usize {
        self.mesh_edge_vertices + self.edge_connection_vertices + self.main_vertices
    }

    #[inline]
    pub fn indices(&self) -> usize {
        self.triangles * 3
    }
}
