use terrane_geom::Vec2;

/// Integer chunk position on the horizontal grid.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkCoord {
    pub cx: i32,
    pub cz: i32,
}

impl ChunkCoord {
    #[inline]
    pub const fn new(cx: i32, cz: i32) -> Self {
        Self { cx, cz }
    }

    #[inline]
    pub fn offset(self, dx: i32, dz: i32) -> Self {
        Self {
            cx: self.cx + dx,
            cz: self.cz + dz,
        }
    }

    /// Chunk whose center is nearest to `p`.
    #[inline]
    pub fn from_world(p: Vec2, chunk_world_size: f32) -> Self {
        Self {
            cx: (p.x / chunk_world_size).round() as i32,
            cz: (p.y / chunk_world_size).round() as i32,
        }
    }

    #[inline]
    pub fn world_center(self, chunk_world_size: f32) -> Vec2 {
        Vec2::new(
            self.cx as f32 * chunk_world_size,
            self.cz as f32 * chunk_world_size,
        )
    }
}

impl From<(i32, i32)> for ChunkCoord {
    fn from(value: (i32, i32)) -> Self {
        Self::new(value.0, value.1)
    }
}

impl From<ChunkCoord> for (i32, i32) {
    fn from(value: ChunkCoord) -> Self {
        (value.cx, value.cz)
    }
}

impl std::fmt::Display for ChunkCoord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.cx, self.cz)
    }
}
