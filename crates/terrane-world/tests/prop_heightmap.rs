use proptest::prelude::*;
use terrane_geom::Vec2;
use terrane_world::{
    HeightCurve, HeightMapSettings, NoiseConfig, NormalizeMode, build_height_field,
    generate_falloff_map, generate_noise_map,
};

fn coord() -> impl Strategy<Value = f32> {
    -5_000.0f32..5_000.0
}

fn noise_cfg() -> impl Strategy<Value = NoiseConfig> {
    (any::<i32>(), 5.0f32..200.0, 1u32..8, 0.1f32..1.0, 1.0f32..3.0).prop_map(
        |(seed, scale, octaves, persistence, lacunarity)| NoiseConfig {
            seed,
            scale,
            octaves,
            persistence,
            lacunarity,
            offset: Vec2::ZERO,
            normalize: NormalizeMode::Global,
        },
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    // same inputs produce bit-identical maps
    #[test]
    fn noise_is_deterministic(cfg in noise_cfg(), cx in coord(), cz in coord()) {
        let a = generate_noise_map(9, 7, &cfg, Vec2::new(cx, cz));
        let b = generate_noise_map(9, 7, &cfg, Vec2::new(cx, cz));
        let bits = |v: &[f32]| v.iter().map(|f| f.to_bits()).collect::<Vec<_>>();
        prop_assert_eq!(bits(&a.values), bits(&b.values));
    }

    // global normalization never goes below zero
    #[test]
    fn global_noise_is_non_negative(cfg in noise_cfg(), cx in coord(), cz in coord()) {
        let map = generate_noise_map(8, 8, &cfg, Vec2::new(cx, cz));
        for v in &map.values {
            prop_assert!(v.is_finite());
            prop_assert!(*v >= 0.0);
        }
    }

    // local normalization spans exactly [0, 1] when the map is not constant
    #[test]
    fn local_noise_is_unit_range(mut cfg in noise_cfg(), cx in coord(), cz in coord()) {
        cfg.normalize = NormalizeMode::Local;
        let map = generate_noise_map(16, 16, &cfg, Vec2::new(cx, cz));
        for v in &map.values {
            prop_assert!((0.0..=1.0).contains(v));
        }
    }

    #[test]
    fn falloff_is_unit_range(size in 1usize..64) {
        let map = generate_falloff_map(size);
        prop_assert_eq!(map.values.len(), size * size);
        for v in &map.values {
            prop_assert!((0.0..=1.0).contains(v));
        }
    }

    // the recorded range brackets every stored height
    #[test]
    fn height_range_brackets_values(cfg in noise_cfg(), falloff in any::<bool>()) {
        let settings = HeightMapSettings {
            noise: cfg,
            use_falloff: falloff,
            ..HeightMapSettings::default()
        };
        let field = build_height_field(12, 12, &settings, Vec2::ZERO);
        prop_assert!(field.min_value() <= field.max_value());
        for v in field.values() {
            prop_assert!(*v >= field.min_value() && *v <= field.max_value());
        }
    }
}

#[test]
fn concurrent_builds_share_one_curve() {
    let settings = HeightMapSettings {
        curve: HeightCurve::from_points(&[(0.0, 0.0), (0.3, 0.05), (0.6, 0.4), (1.0, 1.0)])
            .unwrap(),
        ..HeightMapSettings::default()
    };
    let centers: Vec<Vec2> = (0..8)
        .map(|i| Vec2::new(i as f32 * 98.0, -(i as f32) * 49.0))
        .collect();
    let sequential: Vec<Vec<f32>> = centers
        .iter()
        .map(|c| build_height_field(33, 33, &settings, *c).values().to_vec())
        .collect();

    let parallel: Vec<Vec<f32>> = std::thread::scope(|s| {
        let handles: Vec<_> = centers
            .iter()
            .map(|c| {
                let settings = &settings;
                s.spawn(move || build_height_field(33, 33, settings, *c).values().to_vec())
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(sequential, parallel);
}
