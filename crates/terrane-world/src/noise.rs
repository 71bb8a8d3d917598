//! Fractal Perlin noise sampled over an unbounded plane.

use fastnoise_lite::{FastNoiseLite, NoiseType};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Deserialize;
use terrane_geom::Vec2;

use crate::grid::Grid;

const OCTAVE_OFFSET_RANGE: i32 = 100_000;
const MIN_SCALE: f32 = 0.0001;
// Global normalization assumes the sum rarely gets close to the theoretical peak.
const GLOBAL_HEADROOM: f32 = 0.9;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NormalizeMode {
    /// Rescale by the min/max seen in one call. Only meaningful for a single
    /// isolated map; neighbouring chunks will not line up.
    Local,
    /// Divide by the theoretical amplitude sum so independently generated
    /// chunks agree on height.
    #[default]
    Global,
}

#[derive(Clone, Debug, PartialEq)]
pub struct NoiseConfig {
    pub seed: i32,
    pub scale: f32,
    pub octaves: u32,
    pub persistence: f32,
    pub lacunarity: f32,
    pub offset: Vec2,
    pub normalize: NormalizeMode,
}

impl Default for NoiseConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            scale: 50.0,
            octaves: 6,
            persistence: 0.6,
            lacunarity: 2.0,
            offset: Vec2::ZERO,
            normalize: NormalizeMode::Global,
        }
    }
}

impl NoiseConfig {
    /// Copy with every parameter forced into its usable range.
    pub fn sanitized(&self) -> Self {
        Self {
            scale: self.scale.max(MIN_SCALE),
            octaves: self.octaves.max(1),
            persistence: self.persistence.clamp(0.0, 1.0),
            lacunarity: self.lacunarity.max(1.0),
            ..self.clone()
        }
    }
}

/// Seeded sampler. Building one derives the per-octave offsets; sampling is
/// read-only, so a field can be shared across threads.
pub struct NoiseField {
    config: NoiseConfig,
    perlin: FastNoiseLite,
    octave_offsets: Vec<Vec2>,
    max_amplitude: f32,
}

impl NoiseField {
    pub fn new(config: &NoiseConfig) -> Self {
        let config = config.sanitized();
        let mut perlin = FastNoiseLite::with_seed(config.seed);
        perlin.set_noise_type(Some(NoiseType::Perlin));
        perlin.set_frequency(Some(1.0));

        let mut rng = ChaCha8Rng::seed_from_u64(u64::from(config.seed as u32));
        let mut octave_offsets = Vec::with_capacity(config.octaves as usize);
        let mut max_amplitude = 0.0_f32;
        let mut amplitude = 1.0_f32;
        for _ in 0..config.octaves {
            let ox = rng.gen_range(-OCTAVE_OFFSET_RANGE..OCTAVE_OFFSET_RANGE) as f32;
            let oy = rng.gen_range(-OCTAVE_OFFSET_RANGE..OCTAVE_OFFSET_RANGE) as f32;
            octave_offsets.push(Vec2::new(ox + config.offset.x, oy - config.offset.y));
            max_amplitude += amplitude;
            amplitude *= config.persistence;
        }

        Self {
            config,
            perlin,
            octave_offsets,
            max_amplitude,
        }
    }

    /// Sum of all octave amplitudes; the largest magnitude the raw sum can reach.
    pub fn max_amplitude(&self) -> f32 {
        self.max_amplitude
    }

    // Perlin remapped to [0, 1].
    #[inline]
    fn coherent(&self, x: f32, y: f32) -> f32 {
        (self.perlin.get_noise_2d(x, y) + 1.0) * 0.5
    }

    /// Raw fractal sum for grid cell `(x, y)` of a map centred on `sample_center`.
    #[inline]
    fn fractal_at(&self, x: f32, y: f32, half: Vec2, sample_center: Vec2) -> f32 {
        let mut amplitude = 1.0_f32;
        let mut frequency = 1.0_f32;
        let mut sum = 0.0_f32;
        // Cell and centre are whole or half samples, so summing them first is
        // exact and neighbouring chunks hit the same sample on shared edges.
        let cx = x - half.x + sample_center.x;
        let cy = y - half.y - sample_center.y;
        for off in &self.octave_offsets {
            let sx = (cx + off.x) / self.config.scale * frequency;
            let sy = (cy + off.y) / self.config.scale * frequency;
            sum += (self.coherent(sx, sy) * 2.0 - 1.0) * amplitude;
            amplitude *= self.config.persistence;
            frequency *= self.config.lacunarity;
        }
        sum
    }

    pub fn generate(&self, width: usize, height: usize, sample_center: Vec2) -> Grid<f32> {
        let mut map = Grid::new(width, height);
        let half = Vec2::new(width as f32 / 2.0, height as f32 / 2.0);
        let mut local_min = f32::MAX;
        let mut local_max = f32::MIN;

        for y in 0..height {
            for x in 0..width {
                let sum = self.fractal_at(x as f32, y as f32, half, sample_center);
                local_min = local_min.min(sum);
                local_max = local_max.max(sum);
                let value = match self.config.normalize {
                    NormalizeMode::Local => sum,
                    NormalizeMode::Global => {
                        let normalized = (sum + 1.0) / (self.max_amplitude / GLOBAL_HEADROOM);
                        normalized.max(0.0)
                    }
                };
                map.set(x, y, value);
            }
        }

        if self.config.normalize == NormalizeMode::Local {
            let range = local_max - local_min;
            for v in &mut map.values {
                *v = if range > 0.0 {
                    (*v - local_min) / range
                } else {
                    0.0
                };
            }
        }
        map
    }
}

/// One-shot helper: build a [`NoiseField`] and sample a `width x height` map.
pub fn generate_noise_map(
    width: usize,
    height: usize,
    config: &NoiseConfig,
    sample_center: Vec2,
) -> Grid<f32> {
    NoiseField::new(config).generate(width, height, sample_center)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_floors_degenerate_parameters() {
        let cfg = NoiseConfig {
            scale: 0.0,
            octaves: 0,
            persistence: 1.5,
            lacunarity: 0.2,
            ..NoiseConfig::default()
        }
        .sanitized();
        assert!(cfg.scale > 0.0);
        assert_eq!(cfg.octaves, 1);
        assert_eq!(cfg.persistence, 1.0);
        assert_eq!(cfg.lacunarity, 1.0);
    }

    #[test]
    fn max_amplitude_is_geometric_sum() {
        let field = NoiseField::new(&NoiseConfig {
            octaves: 3,
            persistence: 0.5,
            ..NoiseConfig::default()
        });
        assert!((field.max_amplitude() - 1.75).abs() < 1e-6);
    }

    #[test]
    fn zero_scale_does_not_produce_nan() {
        let cfg = NoiseConfig {
            scale: 0.0,
            octaves: 1,
            ..NoiseConfig::default()
        };
        let map = generate_noise_map(8, 8, &cfg, Vec2::ZERO);
        assert!(map.values.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn local_mode_spans_unit_range() {
        let cfg = NoiseConfig {
            normalize: NormalizeMode::Local,
            ..NoiseConfig::default()
        };
        let map = generate_noise_map(32, 32, &cfg, Vec2::new(17.0, -3.0));
        let min = map.values.iter().copied().fold(f32::MAX, f32::min);
        let max = map.values.iter().copied().fold(f32::MIN, f32::max);
        assert!(min.abs() < 1e-6);
        assert!((max - 1.0).abs() < 1e-6);
    }
}
