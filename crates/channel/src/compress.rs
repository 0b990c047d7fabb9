//! The channel compression contract. Compression internals are a black box;
//! the channel only relies on an append-only stream with a readable
//! compressed prefix.

use std::io::{self, Write};

/// An append-only compression stream over one channel's block payloads.
pub trait Compressor: Send + std::fmt::Debug {
    /// Appends raw bytes to the stream.
    fn write(&mut self, data: &[u8]) -> io::Result<()>;

    /// Flushes buffered input so [`Compressor::compressed`] reflects all
    /// written data.
    fn flush(&mut self) -> io::Result<()>;

    /// Returns the compressed bytes produced so far.
    fn compressed(&self) -> &[u8];

    /// Upper bound on how many bytes appending and flushing `len` raw bytes
    /// can add to the stream, including whatever finalizing it still adds.
    /// Incompressible input grows past its raw length by the stream's
    /// framing, so `len` alone is not a valid bound.
    fn max_growth(&self, len: usize) -> usize;

    /// Finalizes the stream and returns the complete compressed payload.
    fn finish(self: Box<Self>) -> io::Result<Vec<u8>>;
}

/// Creates one [`Compressor`] per channel.
pub trait CompressorFactory: Send + std::fmt::Debug {
    /// Returns a fresh compressor.
    fn compressor(&self) -> io::Result<Box<dyn Compressor>>;
}

/// A [`Compressor`] over a zstd stream encoder.
pub struct ZstdCompressor {
    encoder: zstd::stream::Encoder<'static, Vec<u8>>,
}

/// Raw input a single zstd block can hold.
const ZSTD_BLOCK_SIZE: usize = 128 * 1024;
/// Header bytes of one zstd block.
const ZSTD_BLOCK_HEADER: usize = 3;
/// Frame header plus the closing block and content checksum.
const ZSTD_FRAME_OVERHEAD: usize = 25;

impl ZstdCompressor {
    /// Returns a new compressor at the provided compression level.
    pub fn new(level: i32) -> io::Result<Self> {
        Ok(Self { encoder: zstd::stream::Encoder::new(Vec::new(), level)? })
    }
}

impl std::fmt::Debug for ZstdCompressor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZstdCompressor")
            .field("compressed_len", &self.encoder.get_ref().len())
            .finish()
    }
}

impl Compressor for ZstdCompressor {
    fn write(&mut self, data: &[u8]) -> io::Result<()> {
        self.encoder.write_all(data)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.encoder.flush()
    }

    fn compressed(&self) -> &[u8] {
        self.encoder.get_ref()
    }

    fn max_growth(&self, len: usize) -> usize {
        // worst case the input lands in raw blocks: one header per started
        // block, the compress-bound slack, and the stream framing.
        len + len / 256 + (len / ZSTD_BLOCK_SIZE + 1) * ZSTD_BLOCK_HEADER + ZSTD_FRAME_OVERHEAD
    }

    fn finish(self: Box<Self>) -> io::Result<Vec<u8>> {
        self.encoder.finish()
    }
}

/// A [`CompressorFactory`] producing [`ZstdCompressor`]s at a fixed level.
#[derive(Debug, Clone, Copy)]
pub struct ZstdCompressorFactory {
    level: i32,
}

impl ZstdCompressorFactory {
    /// Returns a factory at the provided compression level.
    pub const fn new(level: i32) -> Self {
        Self { level }
    }
}

impl Default for ZstdCompressorFactory {
    fn default() -> Self {
        Self::new(zstd::DEFAULT_COMPRESSION_LEVEL)
    }
}

impl CompressorFactory for ZstdCompressorFactory {
    fn compressor(&self) -> io::Result<Box<dyn Compressor>> {
        Ok(Box::new(ZstdCompressor::new(self.level)?))
    }
}
