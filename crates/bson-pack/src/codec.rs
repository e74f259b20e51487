//! The codec instance: a registry plus the five public operations.

use bson_pack_buffers::Writer;

use crate::decoder::DocumentDecoder;
use crate::encoder::DocumentEncoder;
use crate::error::BsonError;
use crate::registry::CodecRegistry;
use crate::size;
use crate::values::DocValue;

/// A BSON codec instance.
///
/// Holds the carrier registry, built once at construction. The codec
/// itself is immutable; every operation is a pure function over its
/// inputs, so a single instance can be shared across threads.
#[derive(Debug, Clone, Copy)]
pub struct BsonCodec {
    registry: CodecRegistry,
}

impl Default for BsonCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl BsonCodec {
    /// Codec over the standard carrier registry.
    pub fn new() -> Self {
        Self {
            registry: CodecRegistry::standard(),
        }
    }

    /// Codec over a caller-assembled registry.
    pub fn with_registry(registry: CodecRegistry) -> Self {
        Self { registry }
    }

    /// Exact number of bytes `value` occupies when serialised.
    pub fn calculate_size(&self, value: &DocValue, serialize_functions: bool) -> usize {
        size::calculate_size(value, serialize_functions)
    }

    /// Serialises a document or array into a freshly allocated buffer.
    ///
    /// The buffer is allocated once at the exact precomputed size; in
    /// debug builds the byte count written is asserted against it.
    pub fn serialize(
        &self,
        value: &DocValue,
        check_keys: bool,
        serialize_functions: bool,
    ) -> Result<Vec<u8>, BsonError> {
        let size = self.calculate_size(value, serialize_functions);
        let mut out = vec![0u8; size];
        let mut writer = Writer::new(&mut out);
        let mut encoder = DocumentEncoder {
            writer: &mut writer,
            check_keys,
            serialize_functions,
        };
        encoder.encode(value)?;
        debug_assert_eq!(
            writer.x, size,
            "bytes written must equal the precomputed size"
        );
        Ok(out)
    }

    /// Serialises into a caller-supplied buffer starting at `index`.
    ///
    /// Returns the offset of the last byte written. The encoding is
    /// staged internally first, so a failed encode leaves the caller's
    /// buffer untouched.
    pub fn serialize_with_buffer_and_index(
        &self,
        value: &DocValue,
        check_keys: bool,
        buffer: &mut [u8],
        index: usize,
        serialize_functions: bool,
    ) -> Result<usize, BsonError> {
        let size = self.calculate_size(value, serialize_functions);
        if index + size > buffer.len() {
            return Err(BsonError::BufferTooSmall {
                needed: size,
                offset: index,
                available: buffer.len().saturating_sub(index),
            });
        }
        let staged = self.serialize(value, check_keys, serialize_functions)?;
        buffer[index..index + staged.len()].copy_from_slice(&staged);
        Ok(index + staged.len() - 1)
    }

    /// Parses a single BSON document from the start of `bytes`.
    pub fn deserialize(&self, bytes: &[u8]) -> Result<DocValue, BsonError> {
        DocumentDecoder::new(bytes, self.registry).read_document()
    }

    /// Parses `count` concatenated documents from `buffer` starting at
    /// `start`, storing them into `out` from position `out_index` onward
    /// (growing `out` as needed). Returns the cursor after the last
    /// document.
    pub fn deserialize_stream(
        &self,
        buffer: &[u8],
        start: usize,
        count: usize,
        out: &mut Vec<DocValue>,
        out_index: usize,
    ) -> Result<usize, BsonError> {
        let mut decoder = DocumentDecoder::at_offset(buffer, start, self.registry);
        for i in 0..count {
            let document = decoder.read_document()?;
            let slot = out_index + i;
            if slot < out.len() {
                out[slot] = document;
            } else {
                while out.len() < slot {
                    out.push(DocValue::Null);
                }
                out.push(document);
            }
        }
        Ok(decoder.reader.x)
    }
}
