use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum MeshError {
    #[error("height field is {width}x{height}, mesh settings need {expected}x{expected}")]
    WrongDimensions {
        expected: usize,
        width: usize,
        height: usize,
    },
    #[error("lod {lod} is not supported (expected 0..{supported})")]
    UnsupportedLod { lod: usize, supported: usize },
    #[error("vertex stride {skip} does not divide chunk size {chunk_size}")]
    DegenerateStride { chunk_size: usize, skip: usize },
}
