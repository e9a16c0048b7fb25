//! Chunked streams: the per-chunk checksum→compress→encrypt pipeline on
//! write, and decrypt→decompress→verify on read.
//!
//! Generalizes the teacher's one-shot `encode_block`/`decode_block` pair
//! (`block.rs`) — which processes one whole block at a time — into a
//! buffering engine that splits an arbitrarily large entry payload into
//! independently-verified, fixed-size chunks. The processing order
//! (compress before encrypt on write; decrypt before decompress on read)
//! is carried over unchanged.

pub mod input;
pub mod output;

pub use input::{ChunkReaderConfig, ChunkSecuritySettings, ChunkedInputStream};
pub use output::{ChunkWriterConfig, ChunkedOutputStream};
