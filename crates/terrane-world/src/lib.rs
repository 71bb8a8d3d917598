//! Height-field generation and terrain settings.
#![forbid(unsafe_code)]

pub mod chunk_coord;
pub mod curve;
pub mod error;
pub mod falloff;
pub mod grid;
pub mod heightmap;
pub mod lod;
pub mod noise;
pub mod settings;

pub use chunk_coord::ChunkCoord;
pub use curve::{CurveEvaluator, HeightCurve, Keyframe};
pub use error::{ConfigError, SettingsError};
pub use falloff::{generate_falloff_map, generate_falloff_rect};
pub use grid::Grid;
pub use heightmap::{HeightField, HeightMapSettings, build_height_field};
pub use lod::{LodLevel, LodTable};
pub use noise::{NoiseConfig, NoiseField, NormalizeMode, generate_noise_map};
pub use settings::{
    ColliderSettings, MeshSettings, SUPPORTED_CHUNK_SIZES, SUPPORTED_FLAT_SHADED_CHUNK_SIZES,
    SUPPORTED_LODS, StreamingSettings, TerrainConfig, TerrainSettings, load_settings_from_path,
    lod_skip,
};
