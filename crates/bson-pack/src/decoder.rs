//! BSON document deserializer.
//!
//! Parses documents from a byte slice without mutating it. Every
//! (sub)document's declared length is validated against the bytes actually
//! consumed, and the trailing NUL is checked. Extended types are
//! materialised through the codec registry.

use bson_pack_buffers::Reader;

use crate::constants::{
    DBREF_DB_KEY, DBREF_ID_KEY, DBREF_REF_KEY, MAX_SAFE_INTEGER, TAG_ARRAY, TAG_BINARY,
    TAG_BOOLEAN, TAG_CODE, TAG_CODE_W_SCOPE, TAG_DATE, TAG_DOUBLE, TAG_INT32, TAG_LONG,
    TAG_MAX_KEY, TAG_MIN_KEY, TAG_NULL, TAG_OBJECT, TAG_OBJECT_ID, TAG_REGEXP, TAG_STRING,
    TAG_SYMBOL, TAG_TIMESTAMP,
};
use crate::error::BsonError;
use crate::registry::CodecRegistry;
use crate::values::{BsonObjectId, DocRegExp, DocValue};

/// Deserializer state for one decode call.
pub(crate) struct DocumentDecoder<'a> {
    pub reader: Reader<'a>,
    registry: CodecRegistry,
}

impl<'a> DocumentDecoder<'a> {
    pub fn new(data: &'a [u8], registry: CodecRegistry) -> Self {
        Self {
            reader: Reader::new(data),
            registry,
        }
    }

    /// Positions the cursor at `start` within `data`.
    pub fn at_offset(data: &'a [u8], start: usize, registry: CodecRegistry) -> Self {
        Self {
            reader: Reader::from_slice(data, start, data.len()),
            registry,
        }
    }

    /// Parses one document at the cursor, leaving the cursor just past its
    /// declared length. A document carrying `$ref` and `$id` comes back as
    /// a DBRef carrier.
    pub fn read_document(&mut self) -> Result<DocValue, BsonError> {
        let fields = self.read_document_fields()?;
        Ok(self.maybe_dbref(fields))
    }

    fn read_document_fields(&mut self) -> Result<Vec<(String, DocValue)>, BsonError> {
        let start = self.reader.x;
        let declared = self.reader.i32()?;
        if declared < 5 {
            return Err(BsonError::LengthMismatch {
                declared: declared.max(0) as usize,
                consumed: 4,
            });
        }
        let declared = declared as usize;
        if start + declared > self.reader.end {
            return Err(BsonError::TruncatedInput {
                declared,
                remaining: self.reader.end - start,
            });
        }
        let end = start + declared;
        let mut fields: Vec<(String, DocValue)> = Vec::new();

        while self.reader.x < end - 1 {
            let tag = self.reader.u8()?;
            if tag == 0 {
                // Terminator before the declared end.
                return Err(BsonError::LengthMismatch {
                    declared,
                    consumed: self.reader.x - start,
                });
            }
            let key = self.read_cstring()?;
            let value = self.read_element(tag)?;
            fields.push((key, value));
        }

        if self.reader.x != end - 1 || self.reader.u8()? != 0 {
            return Err(BsonError::LengthMismatch {
                declared,
                consumed: self.reader.x - start,
            });
        }
        Ok(fields)
    }

    fn read_array(&mut self) -> Result<Vec<DocValue>, BsonError> {
        let start = self.reader.x;
        let fields = self.read_document_fields()?;
        // Element names are insertion indices; gaps are tolerated and
        // padded with null. A document of n bytes holds fewer than n
        // elements, so indices past that are treated as appends rather
        // than letting corrupt input demand huge paddings.
        let max_index = self.reader.x - start;
        let mut items: Vec<DocValue> = Vec::with_capacity(fields.len());
        for (key, value) in fields {
            let index = match key.parse::<usize>() {
                Ok(i) if i < max_index => i,
                _ => items.len(),
            };
            if index >= items.len() {
                items.resize(index, DocValue::Null);
                items.push(value);
            } else {
                items[index] = value;
            }
        }
        Ok(items)
    }

    fn read_element(&mut self, tag: u8) -> Result<DocValue, BsonError> {
        match tag {
            TAG_DOUBLE => Ok(DocValue::Float(self.reader.f64()?)),
            TAG_STRING => Ok(DocValue::Str(self.read_string()?)),
            TAG_OBJECT => self.read_document(),
            TAG_ARRAY => Ok(DocValue::Array(self.read_array()?)),
            TAG_BINARY => {
                let length = self.payload_length()?;
                let sub_type = self.reader.u8()?;
                let data = self.reader.buf(length)?;
                Ok((self.registry.binary)(data.to_vec(), sub_type))
            }
            TAG_OBJECT_ID => {
                let raw = self.reader.buf(12)?;
                let mut id = [0u8; 12];
                id.copy_from_slice(raw);
                Ok((self.registry.object_id)(id))
            }
            TAG_BOOLEAN => Ok(DocValue::Bool(self.reader.u8()? != 0)),
            TAG_DATE => Ok(DocValue::Date(self.reader.i64()?)),
            TAG_NULL => Ok(DocValue::Null),
            TAG_REGEXP => {
                let source = self.read_cstring()?;
                let options = self.read_cstring()?;
                Ok(DocValue::RegExp(DocRegExp::from_options(source, &options)))
            }
            TAG_CODE => {
                let code = self.read_string()?;
                Ok((self.registry.code)(code, Vec::new()))
            }
            TAG_SYMBOL => Ok((self.registry.symbol)(self.read_string()?)),
            TAG_CODE_W_SCOPE => {
                let element_start = self.reader.x;
                let total = self.payload_length()?;
                let code = self.read_string()?;
                let scope = self.read_document_fields()?;
                let consumed = self.reader.x - element_start;
                if consumed != total {
                    return Err(BsonError::LengthMismatch {
                        declared: total,
                        consumed,
                    });
                }
                Ok((self.registry.code)(code, scope))
            }
            TAG_INT32 => Ok(DocValue::Integer(self.reader.i32()? as i64)),
            TAG_TIMESTAMP => {
                let low = self.reader.i32()?;
                let high = self.reader.i32()?;
                Ok((self.registry.timestamp)(low, high))
            }
            TAG_LONG => {
                let value = self.reader.i64()?;
                if value.unsigned_abs() <= MAX_SAFE_INTEGER as u64 {
                    Ok(DocValue::Integer(value))
                } else {
                    Ok((self.registry.long)(value as i32, (value >> 32) as i32))
                }
            }
            TAG_MIN_KEY => Ok((self.registry.min_key)()),
            TAG_MAX_KEY => Ok((self.registry.max_key)()),
            t => Err(BsonError::CorruptTag(t)),
        }
    }

    /// Reads a non-negative i32 length prefix.
    fn payload_length(&mut self) -> Result<usize, BsonError> {
        let length = self.reader.i32()?;
        usize::try_from(length).map_err(|_| BsonError::UnexpectedEof)
    }

    /// Reads a NUL-terminated UTF-8 string, consuming the terminator.
    fn read_cstring(&mut self) -> Result<String, BsonError> {
        let start = self.reader.x;
        let rest = self.reader.subarray();
        let nul = rest
            .iter()
            .position(|&b| b == 0)
            .ok_or(BsonError::UnterminatedCString)?;
        let s = std::str::from_utf8(&rest[..nul]).map_err(|_| BsonError::InvalidUtf8)?;
        self.reader.x = start + nul + 1;
        Ok(s.to_owned())
    }

    /// Reads a length-prefixed string; the prefix counts the trailing NUL.
    fn read_string(&mut self) -> Result<String, BsonError> {
        let length = self.payload_length()?;
        if length == 0 {
            return Ok(String::new());
        }
        let bytes = self.reader.buf(length - 1)?;
        let s = std::str::from_utf8(bytes).map_err(|_| BsonError::InvalidUtf8)?;
        self.reader.skip(1)?;
        Ok(s.to_owned())
    }

    /// A decoded document carrying `$ref` and `$id` becomes a DBRef
    /// carrier; other fields are dropped, matching the projection.
    fn maybe_dbref(&self, fields: Vec<(String, DocValue)>) -> DocValue {
        let mut namespace: Option<String> = None;
        let mut oid: Option<BsonObjectId> = None;
        let mut db: Option<String> = None;
        let mut db_invalid = false;
        for (key, value) in &fields {
            match (key.as_str(), value) {
                (DBREF_REF_KEY, DocValue::Str(s)) => namespace = Some(s.clone()),
                (DBREF_ID_KEY, DocValue::ObjectId(o)) => oid = Some(*o),
                (DBREF_DB_KEY, DocValue::Str(s)) => db = Some(s.clone()),
                (DBREF_DB_KEY, _) => db_invalid = true,
                _ => {}
            }
        }
        match (namespace, oid) {
            (Some(namespace), Some(oid)) if !db_invalid => {
                (self.registry.dbref)(namespace, oid, db)
            }
            _ => DocValue::Object(fields),
        }
    }
}
