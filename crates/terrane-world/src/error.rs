use thiserror::Error;

/// Settings rejected before any generation starts. Each variant names the
/// offending setting so the message can be shown to whoever edits the config.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{field} must be a finite number (got {value})")]
    NonFinite { field: &'static str, value: f32 },
    #[error("noise.scale must be greater than zero (got {0})")]
    NonPositiveScale(f32),
    #[error("{field} = {value} is out of range, expected {expected}")]
    OutOfRange {
        field: &'static str,
        value: f32,
        expected: &'static str,
    },
    #[error("lods must contain at least one level")]
    EmptyLodTable,
    #[error(
        "lods[{index}].visible_distance ({current}) must be greater than the previous level's ({previous})"
    )]
    NonAscendingThresholds {
        index: usize,
        previous: f32,
        current: f32,
    },
    #[error("lods[{index}].lod = {lod} is not supported (expected 0..{supported})")]
    UnsupportedLod {
        index: usize,
        lod: usize,
        supported: usize,
    },
    #[error("{field} = {index} is out of range ({len} entries)")]
    IndexOutOfRange {
        field: &'static str,
        index: usize,
        len: usize,
    },
    #[error("chunk size {chunk_size} cannot be sampled at lod {lod} (vertex stride {skip})")]
    DegenerateGeometry {
        chunk_size: usize,
        lod: usize,
        skip: usize,
    },
    #[error("height curve: {0}")]
    InvalidCurve(String),
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read terrain config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse terrain config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid terrain config: {0}")]
    Invalid(#[from] ConfigError),
}
