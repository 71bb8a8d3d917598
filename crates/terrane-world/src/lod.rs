use crate::error::ConfigError;
use crate::settings::SUPPORTED_LODS;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LodLevel {
    /// Detail index; 0 is the finest mesh.
    pub lod: usize,
    /// Beyond this distance from the viewer the next coarser level takes over.
    pub visible_distance: f32,
}

impl LodLevel {
    #[inline]
    pub fn skip(&self) -> usize {
        crate::settings::lod_skip(self.lod)
    }

    #[inline]
    pub fn sqr_visible_distance(&self) -> f32 {
        self.visible_distance * self.visible_distance
    }
}

/// Non-empty list of levels with strictly increasing thresholds.
#[derive(Clone, Debug, PartialEq)]
pub struct LodTable {
    levels: Vec<LodLevel>,
}

impl LodTable {
    pub fn new(levels: Vec<LodLevel>) -> Result<Self, ConfigError> {
        if levels.is_empty() {
            return Err(ConfigError::EmptyLodTable);
        }
        for (index, level) in levels.iter().enumerate() {
            if level.lod >= SUPPORTED_LODS {
                return Err(ConfigError::UnsupportedLod {
                    index,
                    lod: level.lod,
                    supported: SUPPORTED_LODS,
                });
            }
            if !level.visible_distance.is_finite() {
                return Err(ConfigError::NonFinite {
                    field: "lods.visible_distance",
                    value: level.visible_distance,
                });
            }
            if level.visible_distance <= 0.0 {
                return Err(ConfigError::OutOfRange {
                    field: "lods.visible_distance",
                    value: level.visible_distance,
                    expected: "> 0",
                });
            }
        }
        if let Some(i) = levels
            .windows(2)
            .position(|w| w[1].visible_distance <= w[0].visible_distance)
        {
            return Err(ConfigError::NonAscendingThresholds {
                index: i + 1,
                previous: levels[i].visible_distance,
                current: levels[i + 1].visible_distance,
            });
        }
        Ok(Self { levels })
    }

    #[inline]
    pub fn levels(&self) -> &[LodLevel] {
        &self.levels
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.levels.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<&LodLevel> {
        self.levels.get(index)
    }

    /// Threshold of the last level: nothing farther is visible.
    #[inline]
    pub fn max_view_distance(&self) -> f32 {
        self.levels[self.levels.len() - 1].visible_distance
    }

    /// Index of the first level whose threshold `distance` does not exceed;
    /// the last level when it exceeds them all.
    pub fn select(&self, distance: f32) -> usize {
        let mut index = 0;
        for (i, level) in self.levels[..self.levels.len() - 1].iter().enumerate() {
            if distance > level.visible_distance {
                index = i + 1;
            } else {
                break;
            }
        }
        index
    }
}
