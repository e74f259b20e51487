//! BSON document serializer.
//!
//! Writes a value tree into a fixed-size byte buffer: reserve the 4-byte
//! length prefix, emit each element as `tag | name-cstring | payload`,
//! write the trailing NUL, then back-patch the prefix. The buffer is sized
//! by the size calculator up front, so a failed bounds check here means
//! the two disagree.

use bson_pack_buffers::Writer;

use crate::constants::{
    DBREF_DB_KEY, DBREF_ID_KEY, DBREF_REF_KEY, MAX_SAFE_INTEGER, TAG_ARRAY, TAG_BINARY,
    TAG_BOOLEAN, TAG_CODE, TAG_CODE_W_SCOPE, TAG_DATE, TAG_DOUBLE, TAG_INT32, TAG_LONG,
    TAG_MAX_KEY, TAG_MIN_KEY, TAG_NULL, TAG_OBJECT, TAG_OBJECT_ID, TAG_REGEXP, TAG_STRING,
    TAG_SYMBOL, TAG_TIMESTAMP,
};
use crate::error::BsonError;
use crate::size::skipped;
use crate::values::{BsonDbRef, DocValue};

/// The document a DBRef carrier serialises as: `$ref`, `$id`, then `$db`
/// when present and non-null.
pub(crate) fn dbref_projection(dbref: &BsonDbRef) -> Vec<(String, DocValue)> {
    let mut fields = vec![
        (
            DBREF_REF_KEY.to_owned(),
            DocValue::Str(dbref.namespace.clone()),
        ),
        (DBREF_ID_KEY.to_owned(), DocValue::ObjectId(dbref.oid)),
    ];
    if let Some(db) = &dbref.db {
        fields.push((DBREF_DB_KEY.to_owned(), DocValue::Str(db.clone())));
    }
    fields
}

/// Serializer state for one encode call.
pub(crate) struct DocumentEncoder<'w, 'b> {
    pub writer: &'w mut Writer<'b>,
    pub check_keys: bool,
    pub serialize_functions: bool,
}

impl DocumentEncoder<'_, '_> {
    /// Encodes the top-level value, which must be document-shaped.
    pub fn encode(&mut self, value: &DocValue) -> Result<(), BsonError> {
        match value {
            DocValue::Object(fields) => self.write_document(fields),
            DocValue::Array(items) => self.write_array_document(items),
            DocValue::DbRef(dbref) => {
                let projection = dbref_projection(dbref);
                self.write_unchecked_document(&projection)
            }
            _ => Err(BsonError::UnsupportedValue(
                "top-level value must be a document or array",
            )),
        }
    }

    fn write_document(&mut self, fields: &[(String, DocValue)]) -> Result<(), BsonError> {
        let start = self.writer.x;
        self.writer.i32(0)?;
        for (key, value) in fields {
            if skipped(value, self.serialize_functions) {
                continue;
            }
            self.write_element(key, value)?;
        }
        self.writer.u8(0)?;
        self.writer.patch_i32(start, (self.writer.x - start) as i32)?;
        Ok(())
    }

    fn write_array_document(&mut self, items: &[DocValue]) -> Result<(), BsonError> {
        let start = self.writer.x;
        self.writer.i32(0)?;
        for (index, value) in items.iter().enumerate() {
            if skipped(value, self.serialize_functions) {
                continue;
            }
            self.write_element(&index.to_string(), value)?;
        }
        self.writer.u8(0)?;
        self.writer.patch_i32(start, (self.writer.x - start) as i32)?;
        Ok(())
    }

    /// Writes a document with key checking suspended. The DBRef projection
    /// keys start with `$` by construction.
    fn write_unchecked_document(
        &mut self,
        fields: &[(String, DocValue)],
    ) -> Result<(), BsonError> {
        let saved = self.check_keys;
        self.check_keys = false;
        let result = self.write_document(fields);
        self.check_keys = saved;
        result
    }

    fn write_element(&mut self, key: &str, value: &DocValue) -> Result<(), BsonError> {
        if self.check_keys {
            check_key(key)?;
        }
        match value {
            DocValue::Null | DocValue::Undefined => {
                self.writer.u8(TAG_NULL)?;
                self.write_cstring(key)?;
            }
            DocValue::Bool(b) => {
                self.writer.u8(TAG_BOOLEAN)?;
                self.write_cstring(key)?;
                self.writer.u8(u8::from(*b))?;
            }
            DocValue::Integer(i) => {
                if *i >= i32::MIN as i64 && *i <= i32::MAX as i64 {
                    self.writer.u8(TAG_INT32)?;
                    self.write_cstring(key)?;
                    self.writer.i32(*i as i32)?;
                } else if i.unsigned_abs() <= MAX_SAFE_INTEGER as u64 {
                    self.writer.u8(TAG_DOUBLE)?;
                    self.write_cstring(key)?;
                    self.writer.f64(*i as f64)?;
                } else {
                    return Err(BsonError::IntegerOverflow(*i));
                }
            }
            DocValue::Float(f) => {
                if f.fract() == 0.0 && *f >= i32::MIN as f64 && *f <= i32::MAX as f64 {
                    self.writer.u8(TAG_INT32)?;
                    self.write_cstring(key)?;
                    self.writer.i32(*f as i32)?;
                } else {
                    self.writer.u8(TAG_DOUBLE)?;
                    self.write_cstring(key)?;
                    self.writer.f64(*f)?;
                }
            }
            DocValue::Str(s) => {
                self.writer.u8(TAG_STRING)?;
                self.write_cstring(key)?;
                self.write_string(s)?;
            }
            DocValue::Date(ms) => {
                self.writer.u8(TAG_DATE)?;
                self.write_cstring(key)?;
                self.writer.i64(*ms)?;
            }
            DocValue::RegExp(re) => {
                self.writer.u8(TAG_REGEXP)?;
                self.write_cstring(key)?;
                self.write_cstring(&re.source)?;
                self.write_cstring(&re.options())?;
            }
            DocValue::Array(items) => {
                self.writer.u8(TAG_ARRAY)?;
                self.write_cstring(key)?;
                self.write_array_document(items)?;
            }
            DocValue::Object(fields) => {
                self.writer.u8(TAG_OBJECT)?;
                self.write_cstring(key)?;
                self.write_document(fields)?;
            }
            DocValue::Function(src) => {
                self.writer.u8(TAG_CODE)?;
                self.write_cstring(key)?;
                self.write_string(src)?;
            }
            DocValue::Long(l) => {
                self.writer.u8(TAG_LONG)?;
                self.write_cstring(key)?;
                self.writer.i32(l.low)?;
                self.writer.i32(l.high)?;
            }
            DocValue::Timestamp(ts) => {
                self.writer.u8(TAG_TIMESTAMP)?;
                self.write_cstring(key)?;
                self.writer.i32(ts.low)?;
                self.writer.i32(ts.high)?;
            }
            DocValue::ObjectId(oid) => {
                self.writer.u8(TAG_OBJECT_ID)?;
                self.write_cstring(key)?;
                self.writer.buf(&oid.id)?;
            }
            DocValue::Binary(bin) => {
                if bin.position > bin.buffer.len() {
                    return Err(BsonError::UnsupportedValue(
                        "binary position exceeds buffer length",
                    ));
                }
                self.writer.u8(TAG_BINARY)?;
                self.write_cstring(key)?;
                self.writer.i32(bin.position as i32)?;
                self.writer.u8(bin.sub_type)?;
                self.writer.buf(bin.bytes())?;
            }
            DocValue::Code(code) => {
                if code.scope.is_empty() {
                    self.writer.u8(TAG_CODE)?;
                    self.write_cstring(key)?;
                    self.write_string(&code.code)?;
                } else {
                    self.writer.u8(TAG_CODE_W_SCOPE)?;
                    self.write_cstring(key)?;
                    let total_start = self.writer.x;
                    self.writer.i32(0)?;
                    self.write_string(&code.code)?;
                    self.write_document(&code.scope)?;
                    self.writer
                        .patch_i32(total_start, (self.writer.x - total_start) as i32)?;
                }
            }
            DocValue::Symbol(sym) => {
                self.writer.u8(TAG_SYMBOL)?;
                self.write_cstring(key)?;
                self.write_string(&sym.value)?;
            }
            DocValue::Double(d) => {
                self.writer.u8(TAG_DOUBLE)?;
                self.write_cstring(key)?;
                self.writer.f64(d.value)?;
            }
            DocValue::DbRef(dbref) => {
                self.writer.u8(TAG_OBJECT)?;
                self.write_cstring(key)?;
                let projection = dbref_projection(dbref);
                self.write_unchecked_document(&projection)?;
            }
            DocValue::MinKey => {
                self.writer.u8(TAG_MIN_KEY)?;
                self.write_cstring(key)?;
            }
            DocValue::MaxKey => {
                self.writer.u8(TAG_MAX_KEY)?;
                self.write_cstring(key)?;
            }
        }
        Ok(())
    }

    /// Writes UTF-8 bytes followed by a NUL terminator.
    fn write_cstring(&mut self, s: &str) -> Result<(), BsonError> {
        if s.as_bytes().contains(&0) {
            return Err(BsonError::UnsupportedValue(
                "cstring contains an interior NUL byte",
            ));
        }
        self.writer.utf8(s)?;
        self.writer.u8(0)?;
        Ok(())
    }

    /// Writes a length-prefixed string: i32(byte count + 1), bytes, NUL.
    fn write_string(&mut self, s: &str) -> Result<(), BsonError> {
        self.writer.i32(s.len() as i32 + 1)?;
        self.writer.utf8(s)?;
        self.writer.u8(0)?;
        Ok(())
    }
}

fn check_key(key: &str) -> Result<(), BsonError> {
    if key.starts_with('$') {
        return Err(BsonError::KeyStartsWithDollar(key.to_owned()));
    }
    if key.contains('.') {
        return Err(BsonError::KeyContainsDot(key.to_owned()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::size::calculate_size;
    use crate::values::{BsonDouble, BsonLong, BsonObjectId, DocRegExp};

    fn encode(value: &DocValue, check_keys: bool, serialize_functions: bool) -> Vec<u8> {
        try_encode(value, check_keys, serialize_functions).unwrap()
    }

    fn try_encode(
        value: &DocValue,
        check_keys: bool,
        serialize_functions: bool,
    ) -> Result<Vec<u8>, BsonError> {
        let size = calculate_size(value, serialize_functions);
        let mut out = vec![0u8; size];
        let mut writer = Writer::new(&mut out);
        let mut encoder = DocumentEncoder {
            writer: &mut writer,
            check_keys,
            serialize_functions,
        };
        encoder.encode(value)?;
        assert_eq!(writer.x, size, "size precomputation must be exact");
        Ok(out)
    }

    fn doc(fields: &[(&str, DocValue)]) -> DocValue {
        DocValue::Object(
            fields
                .iter()
                .map(|(k, v)| ((*k).to_owned(), v.clone()))
                .collect(),
        )
    }

    #[test]
    fn empty_document_wire_bytes() {
        assert_eq!(encode(&doc(&[]), false, false), [5, 0, 0, 0, 0]);
    }

    #[test]
    fn int32_element_wire_bytes() {
        // {"n":42} => 0C 00 00 00 10 6E 00 2A 00 00 00 00
        let bytes = encode(&doc(&[("n", DocValue::Integer(42))]), false, false);
        assert_eq!(
            bytes,
            [0x0c, 0, 0, 0, 0x10, b'n', 0, 0x2a, 0, 0, 0, 0]
        );
    }

    #[test]
    fn large_host_number_encodes_as_double() {
        let bytes = encode(&doc(&[("n", DocValue::Integer(5_000_000_000))]), false, false);
        assert_eq!(bytes[4], TAG_DOUBLE);
        assert_eq!(&bytes[7..15], &5_000_000_000.0f64.to_le_bytes());
    }

    #[test]
    fn long_carrier_encodes_as_int64() {
        let long = BsonLong::from_i64(5_000_000_000);
        let bytes = encode(&doc(&[("n", DocValue::Long(long))]), false, false);
        assert_eq!(bytes[4], TAG_LONG);
        assert_eq!(&bytes[7..15], &5_000_000_000i64.to_le_bytes());
    }

    #[test]
    fn integer_past_double_precision_is_an_overflow() {
        let err =
            try_encode(&doc(&[("n", DocValue::Integer((1 << 53) + 1))]), false, false).unwrap_err();
        assert_eq!(err, BsonError::IntegerOverflow((1 << 53) + 1));
    }

    #[test]
    fn integral_float_demotes_to_int32() {
        let bytes = encode(&doc(&[("n", DocValue::Float(3.0))]), false, false);
        assert_eq!(bytes[4], TAG_INT32);
        let frac = encode(&doc(&[("n", DocValue::Float(1.5))]), false, false);
        assert_eq!(frac[4], TAG_DOUBLE);
    }

    #[test]
    fn boxed_double_keeps_double_tag() {
        let bytes = encode(
            &doc(&[("n", DocValue::Double(BsonDouble { value: 3.0 }))]),
            false,
            false,
        );
        assert_eq!(bytes[4], TAG_DOUBLE);
    }

    #[test]
    fn strict_keys_reject_dollar_and_dot() {
        let dollar = doc(&[("$set", DocValue::Integer(1))]);
        assert_eq!(
            try_encode(&dollar, true, false).unwrap_err(),
            BsonError::KeyStartsWithDollar("$set".into())
        );
        let dotted = doc(&[("a.b", DocValue::Integer(1))]);
        assert_eq!(
            try_encode(&dotted, true, false).unwrap_err(),
            BsonError::KeyContainsDot("a.b".into())
        );
        // Without strict keys both round through untouched.
        assert!(try_encode(&dollar, false, false).is_ok());
        assert!(try_encode(&dotted, false, false).is_ok());
    }

    #[test]
    fn dbref_projection_escapes_strict_keys() {
        let dbref = crate::values::BsonDbRef::new(
            "users",
            BsonObjectId::new([1; 12]),
            Some("app".into()),
        );
        let value = doc(&[("link", DocValue::DbRef(dbref))]);
        // $ref/$id/$db inside the projection must not trip strict mode.
        let bytes = try_encode(&value, true, false).unwrap();
        assert_eq!(bytes[4], TAG_OBJECT);
    }

    #[test]
    fn regexp_flags_canonical_order() {
        let re = DocRegExp {
            source: "ab".into(),
            ignore_case: true,
            multiline: true,
            global: true,
        };
        let bytes = encode(&doc(&[("r", DocValue::RegExp(re))]), false, false);
        // tag | "r\0" | "ab\0" | "ims\0"
        assert_eq!(&bytes[4..], [0x0b, b'r', 0, b'a', b'b', 0, b'i', b'm', b's', 0, 0]);
    }

    #[test]
    fn interior_nul_in_key_is_rejected() {
        let value = doc(&[("a\0b", DocValue::Integer(1))]);
        assert!(matches!(
            try_encode(&value, false, false),
            Err(BsonError::UnsupportedValue(_))
        ));
    }

    #[test]
    fn function_skipped_then_encoded_as_code() {
        let value = doc(&[
            ("f", DocValue::Function("function () {}".into())),
            ("n", DocValue::Integer(7)),
        ]);
        let without = encode(&value, false, false);
        assert_eq!(without.len(), calculate_size(&value, false));
        assert_eq!(without[4], TAG_INT32);

        let with = encode(&value, false, true);
        assert_eq!(with[4], TAG_CODE);
    }
}
