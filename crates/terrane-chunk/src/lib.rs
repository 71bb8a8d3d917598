//! Chunk streaming: which chunks exist around the viewer, which LOD each one
//! shows, and when its collision mesh goes live.
#![forbid(unsafe_code)]

mod chunk;
mod events;
mod job;
mod manager;

pub use chunk::{Chunk, ChunkState, DecorationId, Teardown};
pub use events::{ChunkChanges, ChunkEvent};
pub use job::{ChunkId, JobOut};
pub use manager::{ChunkManager, ManagerStats};
