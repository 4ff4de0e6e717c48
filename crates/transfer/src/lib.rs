//! Chunk planning and checksummed source reads.
//!
//! This crate owns the pure, deterministic half of the upload engine: it
//! splits a file size into contiguous byte-range descriptors and reads
//! exact ranges from disk with SHA-256 digests. Network and concurrency
//! live in `skylift-upload`.

mod plan;
mod source;

pub use plan::{Chunk, ChunkPlan};
pub use source::{calculate_file_checksum, checksum_bytes, read_range};

/// Default chunk size: 4 MiB.
///
/// Larger chunks reduce per-chunk overhead (SHA-256, ACKs, syscalls);
/// smaller chunks parallelize better on flaky links.
pub const DEFAULT_CHUNK_SIZE: u64 = 4 * 1024 * 1024;

/// Errors produced by the transfer crate.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("chunk size must be greater than zero")]
    InvalidChunkSize,

    #[error("chunk size {chunk_size} splits {file_size} bytes into more chunks than indexable")]
    TooManyChunks { file_size: u64, chunk_size: u64 },
}
