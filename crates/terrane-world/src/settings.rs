//! File-backed terrain configuration.
//!
//! [`TerrainConfig`] mirrors the TOML layout and is lenient: every field has a
//! default. [`TerrainConfig::validate`] turns it into [`TerrainSettings`], the
//! checked form the rest of the pipeline consumes.

use std::fs;
use std::path::Path;

use serde::Deserialize;
use terrane_geom::Vec2;

use crate::curve::{HeightCurve, Keyframe, auto_tangents};
use crate::error::{ConfigError, SettingsError};
use crate::heightmap::HeightMapSettings;
use crate::lod::{LodLevel, LodTable};
use crate::noise::{NoiseConfig, NormalizeMode};

pub const SUPPORTED_CHUNK_SIZES: [usize; 9] = [48, 72, 96, 120, 144, 168, 192, 216, 240];
/// Flat shading duplicates every vertex, so only the smaller sizes are allowed.
pub const SUPPORTED_FLAT_SHADED_CHUNK_SIZES: usize = 3;
pub const SUPPORTED_LODS: usize = 5;

/// Vertex stride for a detail level.
#[inline]
pub fn lod_skip(lod: usize) -> usize {
    if lod == 0 { 1 } else { lod * 2 }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct TerrainConfig {
    #[serde(default)]
    pub noise: NoiseSection,
    #[serde(default)]
    pub height: HeightSection,
    #[serde(default)]
    pub mesh: MeshSection,
    #[serde(default = "default_lods")]
    pub lods: Vec<LodSection>,
    #[serde(default)]
    pub collision: CollisionSection,
    #[serde(default)]
    pub streaming: StreamingSection,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            noise: NoiseSection::default(),
            height: HeightSection::default(),
            mesh: MeshSection::default(),
            lods: default_lods(),
            collision: CollisionSection::default(),
            streaming: StreamingSection::default(),
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct NoiseSection {
    #[serde(default)]
    pub seed: i32,
    #[serde(default = "default_noise_scale")]
    pub scale: f32,
    #[serde(default = "default_octaves")]
    pub octaves: u32,
    #[serde(default = "default_persistence")]
    pub persistence: f32,
    #[serde(default = "default_lacunarity")]
    pub lacunarity: f32,
    #[serde(default)]
    pub offset: [f32; 2],
    #[serde(default)]
    pub normalize: NormalizeMode,
}
fn default_noise_scale() -> f32 {
    50.0
}
fn default_octaves() -> u32 {
    6
}
fn default_persistence() -> f32 {
    0.6
}
fn default_lacunarity() -> f32 {
    2.0
}
impl Default for NoiseSection {
    fn default() -> Self {
        Self {
            seed: 0,
            scale: default_noise_scale(),
            octaves: default_octaves(),
            persistence: default_persistence(),
            lacunarity: default_lacunarity(),
            offset: [0.0, 0.0],
            normalize: NormalizeMode::Global,
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct HeightSection {
    #[serde(default = "default_height_multiplier")]
    pub multiplier: f32,
    #[serde(default)]
    pub use_falloff: bool,
    /// Empty means the identity curve.
    #[serde(default)]
    pub curve: Vec<KeyframeSection>,
}
fn default_height_multiplier() -> f32 {
    30.0
}
impl Default for HeightSection {
    fn default() -> Self {
        Self {
            multiplier: default_height_multiplier(),
            use_falloff: false,
            curve: Vec::new(),
        }
    }
}

/// Tangents left out are derived from the neighbouring keys.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq)]
pub struct KeyframeSection {
    pub time: f32,
    pub value: f32,
    #[serde(default)]
    pub in_tangent: Option<f32>,
    #[serde(default)]
    pub out_tangent: Option<f32>,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct MeshSection {
    #[serde(default = "default_mesh_scale")]
    pub mesh_scale: f32,
    #[serde(default = "default_chunk_size_index")]
    pub chunk_size_index: usize,
    #[serde(default)]
    pub flat_chunk_size_index: usize,
    #[serde(default)]
    pub flat_shading: bool,
}
fn default_mesh_scale() -> f32 {
    2.5
}
fn default_chunk_size_index() -> usize {
    2
}
impl Default for MeshSection {
    fn default() -> Self {
        Self {
            mesh_scale: default_mesh_scale(),
            chunk_size_index: default_chunk_size_index(),
            flat_chunk_size_index: 0,
            flat_shading: false,
        }
    }
}

#[derive(Clone, Copy, Debug, Deserialize, PartialEq)]
pub struct LodSection {
    pub lod: usize,
    pub visible_distance: f32,
}
fn default_lods() -> Vec<LodSection> {
    vec![
        LodSection { lod: 0, visible_distance: 200.0 },
        LodSection { lod: 1, visible_distance: 400.0 },
        LodSection { lod: 2, visible_distance: 600.0 },
    ]
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct CollisionSection {
    #[serde(default)]
    pub lod_index: usize,
    #[serde(default = "default_activation_distance")]
    pub activation_distance: f32,
}
fn default_activation_distance() -> f32 {
    5.0
}
impl Default for CollisionSection {
    fn default() -> Self {
        Self {
            lod_index: 0,
            activation_distance: default_activation_distance(),
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct StreamingSection {
    #[serde(default = "default_viewer_move_threshold")]
    pub viewer_move_threshold: f32,
    #[serde(default)]
    pub unload_distance: Option<f32>,
}
fn default_viewer_move_threshold() -> f32 {
    25.0
}
impl Default for StreamingSection {
    fn default() -> Self {
        Self {
            viewer_move_threshold: default_viewer_move_threshold(),
            unload_distance: None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MeshSettings {
    pub mesh_scale: f32,
    pub chunk_size_index: usize,
    pub flat_chunk_size_index: usize,
    pub flat_shading: bool,
}

impl Default for MeshSettings {
    fn default() -> Self {
        Self {
            mesh_scale: default_mesh_scale(),
            chunk_size_index: default_chunk_size_index(),
            flat_chunk_size_index: 0,
            flat_shading: false,
        }
    }
}

impl MeshSettings {
    /// Quads per chunk side at LOD 0 for the active shading mode.
    #[inline]
    pub fn chunk_size(&self) -> usize {
        if self.flat_shading {
            SUPPORTED_CHUNK_SIZES[self.flat_chunk_size_index]
        } else {
            SUPPORTED_CHUNK_SIZES[self.chunk_size_index]
        }
    }

    /// Samples per side of a height field, including the one-sample border
    /// used for normals and the edge-connection ring.
    #[inline]
    pub fn vertices_per_line(&self) -> usize {
        self.chunk_size() + 5
    }

    #[inline]
    pub fn mesh_world_size(&self) -> f32 {
        (self.vertices_per_line() - 3) as f32 * self.mesh_scale
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ColliderSettings {
    /// Index into the LOD table of the mesh used for collision.
    pub lod_index: usize,
    pub activation_distance: f32,
}

impl ColliderSettings {
    #[inline]
    pub fn sqr_activation_distance(&self) -> f32 {
        self.activation_distance * self.activation_distance
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StreamingSettings {
    pub viewer_move_threshold: f32,
    pub unload_distance: Option<f32>,
}

impl StreamingSettings {
    #[inline]
    pub fn sqr_viewer_move_threshold(&self) -> f32 {
        self.viewer_move_threshold * self.viewer_move_threshold
    }
}

/// Validated settings shared by the generator, mesher and chunk manager.
#[derive(Clone, Debug)]
pub struct TerrainSettings {
    pub height: HeightMapSettings,
    pub mesh: MeshSettings,
    pub lods: LodTable,
    pub collider: ColliderSettings,
    pub streaming: StreamingSettings,
}

impl TerrainSettings {
    /// Level used for the collision mesh.
    pub fn collider_lod(&self) -> &LodLevel {
        // validate() checked the index
        &self.lods.levels()[self.collider.lod_index]
    }

    /// Re-checks settings that were built or edited in code. Noise values
    /// are left alone since generation sanitises them on every call.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let noise_scale = finite("noise.scale", self.height.noise.scale)?;
        if noise_scale <= 0.0 {
            return Err(ConfigError::NonPositiveScale(noise_scale));
        }
        finite("height.multiplier", self.height.height_multiplier)?;

        let m = &self.mesh;
        positive("mesh.mesh_scale", m.mesh_scale)?;
        if m.chunk_size_index >= SUPPORTED_CHUNK_SIZES.len() {
            return Err(ConfigError::IndexOutOfRange {
                field: "mesh.chunk_size_index",
                index: m.chunk_size_index,
                len: SUPPORTED_CHUNK_SIZES.len(),
            });
        }
        if m.flat_chunk_size_index >= SUPPORTED_FLAT_SHADED_CHUNK_SIZES {
            return Err(ConfigError::IndexOutOfRange {
                field: "mesh.flat_chunk_size_index",
                index: m.flat_chunk_size_index,
                len: SUPPORTED_FLAT_SHADED_CHUNK_SIZES,
            });
        }
        let chunk_size = m.chunk_size();
        for level in self.lods.levels() {
            let skip = level.skip();
            if chunk_size % skip != 0 {
                return Err(ConfigError::DegenerateGeometry {
                    chunk_size,
                    lod: level.lod,
                    skip,
                });
            }
        }

        if self.collider.lod_index >= self.lods.len() {
            return Err(ConfigError::IndexOutOfRange {
                field: "collision.lod_index",
                index: self.collider.lod_index,
                len: self.lods.len(),
            });
        }
        positive(
            "collision.activation_distance",
            self.collider.activation_distance,
        )?;

        let s = &self.streaming;
        let threshold = finite("streaming.viewer_move_threshold", s.viewer_move_threshold)?;
        if threshold < 0.0 {
            return Err(ConfigError::OutOfRange {
                field: "streaming.viewer_move_threshold",
                value: threshold,
                expected: ">= 0",
            });
        }
        if let Some(d) = s.unload_distance {
            positive("streaming.unload_distance", d)?;
        }
        Ok(())
    }
}

impl Default for TerrainSettings {
    fn default() -> Self {
        let lods = default_lods()
            .into_iter()
            .map(|l| LodLevel {
                lod: l.lod,
                visible_distance: l.visible_distance,
            })
            .collect();
        Self {
            height: HeightMapSettings::default(),
            mesh: MeshSettings::default(),
            lods: LodTable::new(lods).unwrap_or_else(|_| unreachable!("default lod table is valid")),
            collider: ColliderSettings {
                lod_index: 0,
                activation_distance: default_activation_distance(),
            },
            streaming: StreamingSettings {
                viewer_move_threshold: default_viewer_move_threshold(),
                unload_distance: None,
            },
        }
    }
}

fn finite(field: &'static str, value: f32) -> Result<f32, ConfigError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ConfigError::NonFinite { field, value })
    }
}

fn positive(field: &'static str, value: f32) -> Result<f32, ConfigError> {
    if finite(field, value)? > 0.0 {
        Ok(value)
    } else {
        Err(ConfigError::OutOfRange {
            field,
            value,
            expected: "> 0",
        })
    }
}

impl TerrainConfig {
    /// Checks every section. Noise parameters with an obvious usable range
    /// are clamped (with a warning); everything else is rejected.
    pub fn validate(&self) -> Result<TerrainSettings, ConfigError> {
        let noise = self.validate_noise()?;
        let curve = self.validate_curve()?;
        let height = HeightMapSettings {
            noise,
            height_multiplier: finite("height.multiplier", self.height.multiplier)?,
            curve,
            use_falloff: self.height.use_falloff,
        };

        let m = &self.mesh;
        let mesh = MeshSettings {
            mesh_scale: m.mesh_scale,
            chunk_size_index: m.chunk_size_index,
            flat_chunk_size_index: m.flat_chunk_size_index,
            flat_shading: m.flat_shading,
        };
        let lods = LodTable::new(
            self.lods
                .iter()
                .map(|l| LodLevel {
                    lod: l.lod,
                    visible_distance: l.visible_distance,
                })
                .collect(),
        )?;
        let settings = TerrainSettings {
            height,
            mesh,
            lods,
            collider: ColliderSettings {
                lod_index: self.collision.lod_index,
                activation_distance: self.collision.activation_distance,
            },
            streaming: StreamingSettings {
                viewer_move_threshold: self.streaming.viewer_move_threshold,
                unload_distance: self.streaming.unload_distance,
            },
        };
        settings.validate()?;
        if let Some(d) = settings.streaming.unload_distance {
            let max_view = settings.lods.max_view_distance();
            if d < max_view {
                log::warn!(
                    "streaming.unload_distance {} is below the max view distance {}; visible chunks may be evicted",
                    d,
                    max_view
                );
            }
        }
        Ok(settings)
    }

    fn validate_noise(&self) -> Result<NoiseConfig, ConfigError> {
        let n = &self.noise;
        let scale = finite("noise.scale", n.scale)?;
        if scale <= 0.0 {
            return Err(ConfigError::NonPositiveScale(scale));
        }
        let persistence = finite("noise.persistence", n.persistence)?;
        let lacunarity = finite("noise.lacunarity", n.lacunarity)?;
        let offset = Vec2::new(
            finite("noise.offset", n.offset[0])?,
            finite("noise.offset", n.offset[1])?,
        );
        let cfg = NoiseConfig {
            seed: n.seed,
            scale,
            octaves: n.octaves,
            persistence,
            lacunarity,
            offset,
            normalize: n.normalize,
        };
        let clean = cfg.sanitized();
        if clean.octaves != cfg.octaves {
            log::warn!("noise.octaves {} raised to {}", cfg.octaves, clean.octaves);
        }
        if clean.persistence != cfg.persistence {
            log::warn!(
                "noise.persistence {} clamped to {}",
                cfg.persistence,
                clean.persistence
            );
        }
        if clean.lacunarity != cfg.lacunarity {
            log::warn!(
                "noise.lacunarity {} raised to {}",
                cfg.lacunarity,
                clean.lacunarity
            );
        }
        if clean.normalize == NormalizeMode::Local {
            log::warn!("noise.normalize = \"local\": neighbouring chunks will not line up");
        }
        Ok(clean)
    }

    fn validate_curve(&self) -> Result<HeightCurve, ConfigError> {
        let sections = &self.height.curve;
        if sections.is_empty() {
            return Ok(HeightCurve::linear());
        }
        let points: Vec<(f32, f32)> = sections.iter().map(|k| (k.time, k.value)).collect();
        let auto = auto_tangents(&points);
        let keys = sections
            .iter()
            .zip(auto)
            .map(|(k, m)| {
                Keyframe::new(
                    k.time,
                    k.value,
                    k.in_tangent.unwrap_or(m),
                    k.out_tangent.unwrap_or(m),
                )
            })
            .collect();
        HeightCurve::new(keys)
    }
}

impl std::str::FromStr for TerrainConfig {
    type Err = toml::de::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        toml::from_str(s)
    }
}

/// Reads, parses and validates a TOML terrain config.
pub fn load_settings_from_path(path: &Path) -> Result<TerrainSettings, SettingsError> {
    let s = fs::read_to_string(path)?;
    let cfg: TerrainConfig = toml::from_str(&s)?;
    Ok(cfg.validate()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        let settings = TerrainConfig::default().validate().unwrap();
        assert_eq!(settings.mesh.chunk_size(), 96);
        assert_eq!(settings.mesh.vertices_per_line(), 101);
        assert!((settings.mesh.mesh_world_size() - 98.0 * 2.5).abs() < 1e-4);
        assert_eq!(settings.lods.len(), 3);
        assert_eq!(settings.collider.activation_distance, 5.0);
        assert_eq!(settings.streaming.viewer_move_threshold, 25.0);
    }

    #[test]
    fn empty_toml_is_default() {
        let cfg: TerrainConfig = "".parse().unwrap();
        assert_eq!(cfg, TerrainConfig::default());
    }

    #[test]
    fn parses_sections() {
        let cfg: TerrainConfig = r#"
            [noise]
            seed = 7
            scale = 80.0
            normalize = "local"
            offset = [10.0, -4.0]

            [height]
            multiplier = 12.0
            use_falloff = true
            curve = [
                { time = 0.0, value = 0.0 },
                { time = 0.4, value = 0.1, in_tangent = 0.0, out_tangent = 0.5 },
                { time = 1.0, value = 1.0 },
            ]

            [mesh]
            mesh_scale = 2.0
            chunk_size_index = 4

            [[lods]]
            lod = 0
            visible_distance = 150.0

            [[lods]]
            lod = 4
            visible_distance = 500.0

            [collision]
            lod_index = 1

            [streaming]
            unload_distance = 900.0
        "#
        .parse()
        .unwrap();
        let s = cfg.validate().unwrap();
        assert_eq!(s.height.noise.seed, 7);
        assert_eq!(s.height.noise.normalize, NormalizeMode::Local);
        assert_eq!(s.height.noise.offset, Vec2::new(10.0, -4.0));
        assert_eq!(s.height.curve.keys().len(), 3);
        assert_eq!(s.height.curve.keys()[1].out_tangent, 0.5);
        assert!(s.height.use_falloff);
        assert_eq!(s.mesh.chunk_size(), 144);
        assert_eq!(s.lods.get(1).map(|l| l.lod), Some(4));
        assert_eq!(s.collider_lod().lod, 4);
        assert_eq!(s.streaming.unload_distance, Some(900.0));
    }

    #[test]
    fn clamps_noise_parameters() {
        let mut cfg = TerrainConfig::default();
        cfg.noise.octaves = 0;
        cfg.noise.persistence = 3.0;
        cfg.noise.lacunarity = 0.5;
        let s = cfg.validate().unwrap();
        assert_eq!(s.height.noise.octaves, 1);
        assert_eq!(s.height.noise.persistence, 1.0);
        assert_eq!(s.height.noise.lacunarity, 1.0);
    }

    #[test]
    fn rejects_invalid_values() {
        let mut cfg = TerrainConfig::default();
        cfg.noise.scale = 0.0;
        assert_eq!(cfg.validate().unwrap_err(), ConfigError::NonPositiveScale(0.0));

        let mut cfg = TerrainConfig::default();
        cfg.noise.persistence = f32::NAN;
        assert!(matches!(
            cfg.validate().unwrap_err(),
            ConfigError::NonFinite { field: "noise.persistence", .. }
        ));

        let mut cfg = TerrainConfig::default();
        cfg.mesh.chunk_size_index = SUPPORTED_CHUNK_SIZES.len();
        assert!(matches!(
            cfg.validate().unwrap_err(),
            ConfigError::IndexOutOfRange { field: "mesh.chunk_size_index", .. }
        ));

        let mut cfg = TerrainConfig::default();
        cfg.collision.lod_index = 3;
        assert!(matches!(
            cfg.validate().unwrap_err(),
            ConfigError::IndexOutOfRange { field: "collision.lod_index", .. }
        ));

        let mut cfg = TerrainConfig::default();
        cfg.lods[1].visible_distance = 100.0;
        assert!(matches!(
            cfg.validate().unwrap_err(),
            ConfigError::NonAscendingThresholds { index: 1, .. }
        ));
    }

    #[test]
    fn settings_edited_in_code_are_rechecked() {
        assert_eq!(TerrainSettings::default().validate(), Ok(()));

        let mut s = TerrainSettings::default();
        s.collider.lod_index = 7;
        assert_eq!(
            s.validate(),
            Err(ConfigError::IndexOutOfRange {
                field: "collision.lod_index",
                index: 7,
                len: 3,
            })
        );

        let mut s = TerrainSettings::default();
        s.mesh.chunk_size_index = 42;
        assert!(matches!(
            s.validate(),
            Err(ConfigError::IndexOutOfRange { field: "mesh.chunk_size_index", index: 42, .. })
        ));

        let mut s = TerrainSettings::default();
        s.mesh.flat_shading = true;
        s.mesh.flat_chunk_size_index = 9;
        assert!(matches!(
            s.validate(),
            Err(ConfigError::IndexOutOfRange { field: "mesh.flat_chunk_size_index", .. })
        ));

        let mut s = TerrainSettings::default();
        s.mesh.mesh_scale = 0.0;
        assert!(matches!(
            s.validate(),
            Err(ConfigError::OutOfRange { field: "mesh.mesh_scale", .. })
        ));

        let mut s = TerrainSettings::default();
        s.height.noise.scale = -1.0;
        assert_eq!(s.validate(), Err(ConfigError::NonPositiveScale(-1.0)));

        let mut s = TerrainSettings::default();
        s.collider.activation_distance = f32::INFINITY;
        assert!(matches!(
            s.validate(),
            Err(ConfigError::NonFinite { field: "collision.activation_distance", .. })
        ));

        let mut s = TerrainSettings::default();
        s.streaming.viewer_move_threshold = -5.0;
        assert!(matches!(
            s.validate(),
            Err(ConfigError::OutOfRange { field: "streaming.viewer_move_threshold", .. })
        ));

        let mut s = TerrainSettings::default();
        s.streaming.unload_distance = Some(0.0);
        assert!(matches!(
            s.validate(),
            Err(ConfigError::OutOfRange { field: "streaming.unload_distance", .. })
        ));
    }

    #[test]
    fn every_supported_size_accepts_every_lod() {
        for index in 0..SUPPORTED_CHUNK_SIZES.len() {
            let mut cfg = TerrainConfig::default();
            cfg.mesh.chunk_size_index = index;
            cfg.lods = (0..SUPPORTED_LODS)
                .map(|lod| LodSection {
                    lod,
                    visible_distance: 100.0 * (lod + 1) as f32,
                })
                .collect();
            assert!(cfg.validate().is_ok(), "size index {index}");
        }
    }

    #[test]
    fn flat_shading_uses_flat_size() {
        let mut cfg = TerrainConfig::default();
        cfg.mesh.flat_shading = true;
        cfg.mesh.flat_chunk_size_index = 1;
        let s = cfg.validate().unwrap();
        assert_eq!(s.mesh.chunk_size(), 72);
        cfg.mesh.flat_chunk_size_index = 3;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn lod_skip_table() {
        assert_eq!(
            (0..SUPPORTED_LODS).map(lod_skip).collect::<Vec<_>>(),
            vec![1, 2, 4, 6, 8]
        );
    }
}
