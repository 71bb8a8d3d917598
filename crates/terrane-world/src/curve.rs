//! Keyframed remapping curve for noise values.
//!
//! The curve itself is immutable and cheap to clone. Evaluation goes through a
//! [`CurveEvaluator`], which caches the last segment it hit; every concurrent
//! caller makes its own evaluator so no mutable state is ever shared.

use std::sync::Arc;

use crate::error::ConfigError;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Keyframe {
    pub time: f32,
    pub value: f32,
    pub in_tangent: f32,
    pub out_tangent: f32,
}

impl Keyframe {
    pub const fn new(time: f32, value: f32, in_tangent: f32, out_tangent: f32) -> Self {
        Self {
            time,
            value,
            in_tangent,
            out_tangent,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct HeightCurve {
    keys: Arc<[Keyframe]>,
}

impl Default for HeightCurve {
    fn default() -> Self {
        Self::linear()
    }
}

impl HeightCurve {
    /// Keys must be non-empty, finite and strictly increasing in time.
    pub fn new(keys: Vec<Keyframe>) -> Result<Self, ConfigError> {
        if keys.is_empty() {
            return Err(ConfigError::InvalidCurve("needs at least one key".into()));
        }
        for (i, k) in keys.iter().enumerate() {
            let finite = k.time.is_finite()
                && k.value.is_finite()
                && k.in_tangent.is_finite()
                && k.out_tangent.is_finite();
            if !finite {
                return Err(ConfigError::InvalidCurve(format!(
                    "key {i} has a non-finite component"
                )));
            }
        }
        if let Some(i) = keys.windows(2).position(|w| w[1].time <= w[0].time) {
            return Err(ConfigError::InvalidCurve(format!(
                "key {} time {} is not after key {} time {}",
                i + 1,
                keys[i + 1].time,
                i,
                keys[i].time
            )));
        }
        Ok(Self { keys: keys.into() })
    }

    /// Identity on [0, 1].
    pub fn linear() -> Self {
        Self {
            keys: Arc::from([Keyframe::new(0.0, 0.0, 1.0, 1.0), Keyframe::new(1.0, 1.0, 1.0, 1.0)]),
        }
    }

    /// Builds keys from `(time, value)` points with slopes taken from the
    /// neighbouring points.
    pub fn from_points(points: &[(f32, f32)]) -> Result<Self, ConfigError> {
        let tangents = auto_tangents(points);
        let keys = points
            .iter()
            .zip(tangents)
            .map(|(&(t, v), m)| Keyframe::new(t, v, m, m))
            .collect();
        Self::new(keys)
    }

    pub fn keys(&self) -> &[Keyframe] {
        &self.keys
    }

    pub fn evaluator(&self) -> CurveEvaluator<'_> {
        CurveEvaluator {
            keys: &self.keys,
            segment: 0,
        }
    }

    /// Single evaluation without segment caching.
    pub fn evaluate(&self, t: f32) -> f32 {
        self.evaluator().evaluate(t)
    }
}

/// Slope at each point: central difference inside, one-sided at the ends.
pub(crate) fn auto_tangents(points: &[(f32, f32)]) -> Vec<f32> {
    let n = points.len();
    let slope = |a: (f32, f32), b: (f32, f32)| {
        let dt = b.0 - a.0;
        if dt.abs() > f32::EPSILON { (b.1 - a.1) / dt } else { 0.0 }
    };
    (0..n)
        .map(|i| match (i.checked_sub(1), (i + 1 < n).then_some(i + 1)) {
            (Some(p), Some(q)) => slope(points[p], points[q]),
            (None, Some(q)) => slope(points[i], points[q]),
            (Some(p), None) => slope(points[p], points[i]),
            (None, None) => 0.0,
        })
        .collect()
}

pub struct CurveEvaluator<'a> {
    keys: &'a [Keyframe],
    segment: usize,
}

impl CurveEvaluator<'_> {
    pub fn evaluate(&mut self, t: f32) -> f32 {
        let keys = self.keys;
        let first = keys[0];
        let last = keys[keys.len() - 1];
        if keys.len() == 1 || t <= first.time {
            return first.value;
        }
        if t >= last.time {
            return last.value;
        }
        let cached = self.segment;
        let seg = if cached + 1 < keys.len()
            && keys[cached].time <= t
            && t < keys[cached + 1].time
        {
            cached
        } else {
            keys.partition_point(|k| k.time <= t) - 1
        };
        self.segment = seg;
        hermite(keys[seg], keys[seg + 1], t)
    }
}

#[inline]
fn hermite(k0: Keyframe, k1: Keyframe, t: f32) -> f32 {
    let dt = k1.time - k0.time;
    let s = (t - k0.time) / dt;
    let s2 = s * s;
    let s3 = s2 * s;
    let h00 = 2.0 * s3 - 3.0 * s2 + 1.0;
    let h10 = s3 - 2.0 * s2 + s;
    let h01 = -2.0 * s3 + 3.0 * s2;
    let h11 = s3 - s2;
    h00 * k0.value + h10 * dt * k0.out_tangent + h01 * k1.value + h11 * dt * k1.in_tangent
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linear_is_identity_inside_and_clamped_outside() {
        let c = HeightCurve::linear();
        for i in 0..=10 {
            let t = i as f32 / 10.0;
            assert!((c.evaluate(t) - t).abs() < 1e-6);
        }
        assert_eq!(c.evaluate(-3.0), 0.0);
        assert_eq!(c.evaluate(4.0), 1.0);
    }

    #[test]
    fn passes_through_keys() {
        let c = HeightCurve::from_points(&[(0.0, 0.0), (0.3, 0.05), (0.7, 0.6), (1.0, 1.0)])
            .unwrap();
        let mut ev = c.evaluator();
        for k in c.keys() {
            assert!((ev.evaluate(k.time) - k.value).abs() < 1e-6);
        }
    }

    #[test]
    fn cached_segment_matches_fresh_lookup() {
        let c = HeightCurve::from_points(&[(0.0, 0.0), (0.25, 0.1), (0.5, 0.2), (1.0, 1.0)])
            .unwrap();
        let mut ev = c.evaluator();
        // Jump around so the cache is both hit and invalidated.
        for t in [0.9, 0.1, 0.11, 0.6, 0.3, 0.29, 0.99, 0.0] {
            assert_eq!(ev.evaluate(t), c.evaluate(t));
        }
    }

    #[test]
    fn rejects_unsorted_or_empty_keys() {
        assert!(HeightCurve::new(Vec::new()).is_err());
        assert!(HeightCurve::from_points(&[(0.5, 0.0), (0.5, 1.0)]).is_err());
        assert!(HeightCurve::from_points(&[(0.0, f32::NAN)]).is_err());
    }

    #[test]
    fn single_key_is_constant() {
        let c = HeightCurve::from_points(&[(0.4, 0.7)]).unwrap();
        assert_eq!(c.evaluate(0.0), 0.7);
        assert_eq!(c.evaluate(1.0), 0.7);
    }
}
