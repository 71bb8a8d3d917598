//! Square edge attenuation for island-style maps.

use crate::grid::Grid;

const FALLOFF_STEEPNESS: f32 = 3.0;
const FALLOFF_SHIFT: f32 = 2.2;

/// `v^a / (v^a + (b - b*v)^a)`: stays near 0 in the middle and ramps to 1 at the rim.
#[inline]
pub fn falloff_curve(v: f32) -> f32 {
    let a = v.powf(FALLOFF_STEEPNESS);
    a / (a + (FALLOFF_SHIFT - FALLOFF_SHIFT * v).powf(FALLOFF_STEEPNESS))
}

pub fn generate_falloff_map(size: usize) -> Grid<f32> {
    generate_falloff_rect(size, size)
}

/// Chebyshev radius gives a square silhouette that matches square chunks.
pub fn generate_falloff_rect(width: usize, height: usize) -> Grid<f32> {
    let mut map = Grid::new(width, height);
    for j in 0..height {
        let y = j as f32 / height as f32 * 2.0 - 1.0;
        for i in 0..width {
            let x = i as f32 / width as f32 * 2.0 - 1.0;
            let v = x.abs().max(y.abs());
            map.set(i, j, falloff_curve(v));
        }
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn curve_endpoints() {
        assert_eq!(falloff_curve(0.0), 0.0);
        assert_eq!(falloff_curve(1.0), 1.0);
    }

    #[test]
    fn center_low_corner_high() {
        for size in [2usize, 3, 7, 16, 101] {
            let map = generate_falloff_map(size);
            let c = size / 2;
            assert!(map.get(c, c) < 0.05, "size {size} center {}", map.get(c, c));
            assert!((map.get(0, 0) - 1.0).abs() < 1e-6, "size {size}");
        }
    }

    #[test]
    fn values_stay_in_unit_range() {
        let map = generate_falloff_rect(40, 23);
        assert!(map.values.iter().all(|v| (0.0..=1.0).contains(v)));
    }

    #[test]
    fn monotonic_along_the_radius() {
        let mut prev = 0.0;
        for i in 0..=100 {
            let v = falloff_curve(i as f32 / 100.0);
            assert!(v >= prev);
            prev = v;
        }
    }
}
