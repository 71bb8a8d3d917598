use terrane_geom::{Vec2, Vec3};
use terrane_mesh_cpu::{
    BufferSizes, MeshError, Normals, VertexIndexMap, VertexKind, VertexSlot, build_terrain_mesh,
};
use terrane_world::{
    Grid, HeightField, HeightMapSettings, MeshSettings, NoiseConfig, NormalizeMode,
    SUPPORTED_CHUNK_SIZES, SUPPORTED_FLAT_SHADED_CHUNK_SIZES, SUPPORTED_LODS, build_height_field,
    lod_skip,
};

fn settings(chunk_size_index: usize) -> MeshSettings {
    MeshSettings {
        mesh_scale: 2.0,
        chunk_size_index,
        ..MeshSettings::default()
    }
}

fn flat_field(n: usize, h: f32) -> HeightField {
    HeightField::from_grid(Grid::filled(n, n, h))
}

fn mesh_index(slot: VertexSlot) -> usize {
    match slot {
        VertexSlot::Mesh(i) => i as usize,
        other => panic!("expected mesh vertex, got {other:?}"),
    }
}

#[test]
fn lod_zero_counts() {
    let s = settings(2);
    let n = s.vertices_per_line();
    assert_eq!(n, 101);
    let mesh = build_terrain_mesh(&flat_field(n, 0.0), &s, 0).unwrap();
    assert_eq!(mesh.vertex_count(), (n - 2) * (n - 2));
    assert_eq!(mesh.triangle_count(), 2 * (n - 3) * (n - 3));
    assert_eq!(mesh.uvs.len(), mesh.vertex_count());
    assert!(mesh.indices.iter().all(|&i| (i as usize) < mesh.vertex_count()));
}

#[test]
fn produced_sizes_match_analytic_sizes() {
    for index in 0..SUPPORTED_CHUNK_SIZES.len() {
        let s = settings(index);
        let n = s.vertices_per_line();
        let field = flat_field(n, 1.0);
        for lod in 0..SUPPORTED_LODS {
            let sizes = BufferSizes::new(n, lod_skip(lod));
            let mesh = build_terrain_mesh(&field, &s, lod).unwrap();
            assert_eq!(mesh.vertex_count(), sizes.vertices(), "size {index} lod {lod}");
            assert_eq!(mesh.triangle_count(), sizes.triangles, "size {index} lod {lod}");
            assert_eq!(mesh.lod, lod);
        }
    }
}

#[test]
fn edge_connection_heights_follow_a_linear_ramp() {
    let s = settings(0);
    let n = s.vertices_per_line();
    let mut grid = Grid::new(n, n);
    for y in 0..n {
        for x in 0..n {
            grid.set(x, y, 3.0 * x as f32 + 0.5 * y as f32);
        }
    }
    let field = HeightField::from_grid(grid);
    for lod in 1..SUPPORTED_LODS {
        let mesh = build_terrain_mesh(&field, &s, lod).unwrap();
        let map = VertexIndexMap::new(n, lod_skip(lod));
        let mut seen = 0;
        for y in 0..n {
            for x in 0..n {
                if map.kind(x, y) != VertexKind::EdgeConnection {
                    continue;
                }
                let p = mesh.positions[mesh_index(map.slot(x, y))];
                let expected = 3.0 * x as f32 + 0.5 * y as f32;
                assert!((p.y - expected).abs() < 1e-3, "({x},{y}) lod {lod}: {} vs {expected}", p.y);
                seen += 1;
            }
        }
        assert_eq!(seen, BufferSizes::new(n, lod_skip(lod)).edge_connection_vertices);
    }
}

#[test]
fn neighbouring_chunks_share_their_border_at_different_lods() {
    let s = settings(2);
    let n = s.vertices_per_line();
    let world = s.mesh_world_size();
    let step = (n - 3) as f32;
    let height = HeightMapSettings::default();

    let field_a = build_height_field(n, n, &height, Vec2::ZERO);
    let field_b = build_height_field(n, n, &height, Vec2::new(step, 0.0));
    let field_c = build_height_field(n, n, &height, Vec2::new(0.0, step));
    let a = build_terrain_mesh(&field_a, &s, 0).unwrap();
    let b = build_terrain_mesh(&field_b, &s, 2).unwrap();
    let c = build_terrain_mesh(&field_c, &s, 3).unwrap();
    let map_a = VertexIndexMap::new(n, lod_skip(0));
    let map_b = VertexIndexMap::new(n, lod_skip(2));
    let map_c = VertexIndexMap::new(n, lod_skip(3));

    for i in 1..=n - 2 {
        // east edge of A against west edge of B
        let pa = a.positions[mesh_index(map_a.slot(n - 2, i))];
        let pb = b.positions[mesh_index(map_b.slot(1, i))] + Vec3::new(world, 0.0, 0.0);
        assert!((pa.x - pb.x).abs() < 1e-3 && (pa.z - pb.z).abs() < 1e-3);
        assert_eq!(pa.y, pb.y, "row {i}");

        // north edge of A against south edge of C
        let pa = a.positions[mesh_index(map_a.slot(i, 1))];
        let pc = c.positions[mesh_index(map_c.slot(i, n - 2))] + Vec3::new(0.0, 0.0, world);
        assert!((pa.x - pc.x).abs() < 1e-3 && (pa.z - pc.z).abs() < 1e-3);
        assert_eq!(pa.y, pc.y, "column {i}");
    }
}

#[test]
fn flat_terrain_normals_point_up() {
    let s = settings(0);
    let n = s.vertices_per_line();
    let mesh = build_terrain_mesh(&flat_field(n, 4.0), &s, 1).unwrap();
    let Normals::Baked(normals) = &mesh.normals else {
        panic!("smooth shading bakes normals");
    };
    assert_eq!(normals.len(), mesh.vertex_count());
    for n in normals {
        assert!((n.y - 1.0).abs() < 1e-5 && n.x.abs() < 1e-5 && n.z.abs() < 1e-5);
    }
}

#[test]
fn flat_shading_duplicates_vertices() {
    for index in 0..SUPPORTED_FLAT_SHADED_CHUNK_SIZES {
        let s = MeshSettings {
            flat_shading: true,
            flat_chunk_size_index: index,
            ..settings(8)
        };
        let n = s.vertices_per_line();
        assert_eq!(n, SUPPORTED_CHUNK_SIZES[index] + 5);
        let mesh = build_terrain_mesh(&flat_field(n, 0.0), &s, 0).unwrap();
        assert_eq!(mesh.normals, Normals::Recalculate);
        assert_eq!(mesh.vertex_count(), mesh.indices.len());
        assert_eq!(mesh.triangle_count(), 2 * (n - 3) * (n - 3));
        assert!(mesh.indices.iter().enumerate().all(|(i, &v)| v as usize == i));
        assert!(mesh.flat_normals().iter().all(|n| (*n - Vec3::UP).length() < 1e-5));
    }
}

#[test]
fn rejects_bad_inputs() {
    let s = settings(0);
    let n = s.vertices_per_line();
    assert_eq!(
        build_terrain_mesh(&flat_field(n - 1, 0.0), &s, 0),
        Err(MeshError::WrongDimensions { expected: n, width: n - 1, height: n - 1 })
    );
    assert_eq!(
        build_terrain_mesh(&flat_field(n, 0.0), &s, SUPPORTED_LODS),
        Err(MeshError::UnsupportedLod { lod: SUPPORTED_LODS, supported: SUPPORTED_LODS })
    );
}

#[test]
fn generates_a_full_chunk_from_noise() {
    let height = HeightMapSettings {
        noise: NoiseConfig {
            seed: 0,
            scale: 50.0,
            octaves: 6,
            persistence: 0.6,
            lacunarity: 2.0,
            offset: Vec2::ZERO,
            normalize: NormalizeMode::Global,
        },
        ..HeightMapSettings::default()
    };
    let s = settings(2);
    let n = s.vertices_per_line();
    let field = build_height_field(n, n, &height, Vec2::ZERO);
    assert_eq!((field.width(), field.height()), (101, 101));
    assert!(field.min_value().is_finite() && field.max_value().is_finite());
    assert!(field.min_value() <= field.max_value());

    let mesh = build_terrain_mesh(&field, &s, 0).unwrap();
    assert!(mesh.triangle_count() > 0);
    assert!(mesh.positions.iter().all(|p| p.is_finite()));
    let Normals::Baked(normals) = &mesh.normals else {
        panic!("smooth shading bakes normals");
    };
    assert!(normals.iter().all(|n| n.is_finite()));
    let bounds = mesh.bounds().unwrap();
    let half = s.mesh_world_size() / 2.0;
    assert!((bounds.min.x + half).abs() < 1e-3 && (bounds.max.x - half).abs() < 1e-3);
    assert!(bounds.min.y >= field.min_value() && bounds.max.y <= field.max_value());
}
