use crate::TransferError;

/// A contiguous byte range of the source file, uploaded as one unit.
///
/// The index travels with the chunk on the wire so the platform can
/// reassemble out-of-order completions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunk {
    /// Position within the plan, starting at 0 and strictly increasing.
    pub index: u32,
    /// Byte offset within the file.
    pub offset: u64,
    /// Length in bytes. Zero only for the single chunk of an empty file.
    pub len: u64,
}

/// Ordered chunk descriptors covering a file exactly: contiguous,
/// non-overlapping, lengths summing to the file size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkPlan {
    chunks: Vec<Chunk>,
    file_size: u64,
}

impl ChunkPlan {
    /// Builds the plan for `file_size` bytes split into `chunk_size` pieces.
    ///
    /// The last chunk carries the remainder, or a full `chunk_size` when the
    /// size divides evenly. An empty file yields exactly one zero-length
    /// chunk, so uploading it still produces a content hash. No randomness:
    /// identical inputs always produce identical plans.
    pub fn build(file_size: u64, chunk_size: u64) -> Result<Self, TransferError> {
        if chunk_size == 0 {
            return Err(TransferError::InvalidChunkSize);
        }

        if file_size == 0 {
            return Ok(Self {
                chunks: vec![Chunk {
                    index: 0,
                    offset: 0,
                    len: 0,
                }],
                file_size,
            });
        }

        let count = file_size.div_ceil(chunk_size);
        // Chunk indices are u32 on the wire; refuse plans that cannot be
        // indexed instead of silently truncating.
        if count > u64::from(u32::MAX) {
            return Err(TransferError::TooManyChunks {
                file_size,
                chunk_size,
            });
        }
        let mut chunks = Vec::with_capacity(count as usize);
        for index in 0..count {
            let offset = index * chunk_size;
            chunks.push(Chunk {
                index: index as u32,
                offset,
                len: chunk_size.min(file_size - offset),
            });
        }

        Ok(Self { chunks, file_size })
    }

    /// Chunks in index order.
    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    /// Consumes the plan, returning the chunk list.
    pub fn into_chunks(self) -> Vec<Chunk> {
        self.chunks
    }

    /// Number of chunks. At least 1, even for an empty file.
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Total file size the plan covers.
    pub fn file_size(&self) -> u64 {
        self.file_size
    }
}
