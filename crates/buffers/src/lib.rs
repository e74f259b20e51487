//! Bounds-checked byte buffer primitives for BSON encoding and decoding.
//!
//! BSON is a little-endian format parsed from and written into
//! fully-buffered regions, so both halves of this crate work over plain
//! byte slices with an explicit cursor:
//!
//! - [`Reader`] reads multi-byte integers and raw slices from a borrowed
//!   buffer.
//! - [`Writer`] writes into a caller-owned, fixed-size buffer. It never
//!   grows the buffer; the caller is expected to have sized it exactly.
//!
//! Every read and write is bounds-checked and returns a [`BufferError`]
//! instead of panicking, since truncated or undersized buffers are
//! ordinary runtime conditions for a codec.

mod reader;
mod writer;

pub use reader::Reader;
pub use writer::Writer;

use thiserror::Error;

/// Error type for buffer cursor operations.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum BufferError {
    #[error("read past end of buffer")]
    OutOfBounds,
    #[error("write past end of buffer")]
    Overflow,
}
