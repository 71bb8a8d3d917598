use terrane_geom::Vec2;

use crate::curve::HeightCurve;
use crate::falloff::generate_falloff_rect;
use crate::grid::Grid;
use crate::noise::{NoiseConfig, generate_noise_map};

#[derive(Clone, Debug)]
pub struct HeightMapSettings {
    pub noise: NoiseConfig,
    pub height_multiplier: f32,
    pub curve: HeightCurve,
    pub use_falloff: bool,
}

impl Default for HeightMapSettings {
    fn default() -> Self {
        Self {
            noise: NoiseConfig::default(),
            height_multiplier: 30.0,
            curve: HeightCurve::linear(),
            use_falloff: false,
        }
    }
}

impl HeightMapSettings {
    pub fn min_height(&self) -> f32 {
        self.height_multiplier * self.curve.evaluate(0.0)
    }

    pub fn max_height(&self) -> f32 {
        self.height_multiplier * self.curve.evaluate(1.0)
    }
}

/// Heights for one chunk plus the range observed while building them.
#[derive(Clone, Debug, PartialEq)]
pub struct HeightField {
    grid: Grid<f32>,
    min_value: f32,
    max_value: f32,
}

impl HeightField {
    /// Wraps precomputed heights, scanning them for the min/max.
    pub fn from_grid(grid: Grid<f32>) -> Self {
        let (min_value, max_value) = if grid.values.is_empty() {
            (0.0, 0.0)
        } else {
            grid.values
                .iter()
                .fold((f32::MAX, f32::MIN), |(lo, hi), &v| (lo.min(v), hi.max(v)))
        };
        Self {
            grid,
            min_value,
            max_value,
        }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.grid.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.grid.height
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> f32 {
        self.grid.get(x, y)
    }

    pub fn values(&self) -> &[f32] {
        &self.grid.values
    }

    pub fn min_value(&self) -> f32 {
        self.min_value
    }

    pub fn max_value(&self) -> f32 {
        self.max_value
    }
}

/// Samples noise around `sample_center`, optionally carves the falloff, then
/// remaps each value through the height curve.
pub fn build_height_field(
    width: usize,
    height: usize,
    settings: &HeightMapSettings,
    sample_center: Vec2,
) -> HeightField {
    let mut grid = generate_noise_map(width, height, &settings.noise, sample_center);

    if settings.use_falloff {
        let falloff = generate_falloff_rect(width, height);
        for (v, f) in grid.values.iter_mut().zip(&falloff.values) {
            *v = (*v - f).clamp(0.0, 1.0);
        }
    }

    let mut curve = settings.curve.evaluator();
    let mut min_value = f32::MAX;
    let mut max_value = f32::MIN;
    for v in &mut grid.values {
        *v *= curve.evaluate(*v) * settings.height_multiplier;
        min_value = min_value.min(*v);
        max_value = max_value.max(*v);
    }
    if grid.values.is_empty() {
        min_value = 0.0;
        max_value = 0.0;
    }

    HeightField {
        grid,
        min_value,
        max_value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn min_max_bracket_every_value() {
        let hf = build_height_field(24, 17, &HeightMapSettings::default(), Vec2::new(3.0, 9.0));
        assert_eq!(hf.width(), 24);
        assert_eq!(hf.height(), 17);
        assert!(hf.min_value() <= hf.max_value());
        for &v in hf.values() {
            assert!(v >= hf.min_value() && v <= hf.max_value());
        }
    }

    #[test]
    fn falloff_flattens_the_rim() {
        let settings = HeightMapSettings {
            use_falloff: true,
            ..HeightMapSettings::default()
        };
        let plain = build_height_field(32, 32, &HeightMapSettings::default(), Vec2::ZERO);
        let carved = build_height_field(32, 32, &settings, Vec2::ZERO);
        for (c, p) in carved.values().iter().zip(plain.values()) {
            assert!(*c <= *p + 1e-6);
        }
        let rim: f32 = (0..32).map(|i| carved.get(i, 0)).sum();
        let rim_plain: f32 = (0..32).map(|i| plain.get(i, 0)).sum();
        assert!(rim < rim_plain);
    }

    #[test]
    fn from_grid_tracks_range() {
        let mut g = Grid::new(3, 2);
        g.values = vec![1.0, -2.0, 5.0, 0.0, 3.0, 4.0];
        let hf = HeightField::from_grid(g);
        assert_eq!(hf.min_value(), -2.0);
        assert_eq!(hf.max_value(), 5.0);
    }

    #[test]
    fn height_range_follows_curve() {
        let s = HeightMapSettings::default();
        assert_eq!(s.min_height(), 0.0);
        assert_eq!(s.max_height(), s.height_multiplier);
    }
}
