//! Document value types.
//!
//! [`DocValue`] is the dynamic value model the codec translates to and from
//! BSON bytes: the host primitives (null, booleans, numbers, strings,
//! dates, regular expressions, arrays, ordered objects) plus one variant
//! per extended-type carrier.

/// 64-bit integer carrier held as two signed 32-bit halves.
///
/// Preserves values whose magnitude exceeds 2^53 exactly, where a host
/// float would round. Also the only input form that selects the Int64
/// (0x12) encoding; plain integral numbers promote to Int32 or Double.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BsonLong {
    /// Low 32 bits.
    pub low: i32,
    /// High 32 bits.
    pub high: i32,
}

impl BsonLong {
    pub fn new(low: i32, high: i32) -> Self {
        Self { low, high }
    }

    pub fn from_i64(value: i64) -> Self {
        Self {
            low: value as i32,
            high: (value >> 32) as i32,
        }
    }

    pub fn as_i64(&self) -> i64 {
        ((self.high as i64) << 32) | (self.low as u32 as i64)
    }

    /// Whether the value survives a round-trip through a 64-bit float.
    pub fn fits_safe_integer(&self) -> bool {
        self.as_i64().unsigned_abs() <= crate::constants::MAX_SAFE_INTEGER as u64
    }
}

/// 12-byte ObjectID carrier. The codec treats the bytes as opaque.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BsonObjectId {
    pub id: [u8; 12],
}

impl BsonObjectId {
    pub fn new(id: [u8; 12]) -> Self {
        Self { id }
    }
}

/// Binary data carrier: a raw allocation plus a logical length.
///
/// `position` is the number of valid bytes; the encoder writes exactly
/// `position` bytes of `buffer`, never the full allocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BsonBinary {
    /// Raw allocation.
    pub buffer: Vec<u8>,
    /// Number of valid bytes (<= buffer length).
    pub position: usize,
    /// Subtype byte, written and read verbatim.
    pub sub_type: u8,
}

impl BsonBinary {
    /// Creates a binary carrier whose logical length covers the whole buffer.
    pub fn new(buffer: Vec<u8>, sub_type: u8) -> Self {
        let position = buffer.len();
        Self {
            buffer,
            position,
            sub_type,
        }
    }

    /// The valid region of the buffer.
    pub fn bytes(&self) -> &[u8] {
        &self.buffer[..self.position]
    }
}

/// JavaScript code carrier with an optional scope document.
///
/// An empty scope encodes as plain Code (0x0d); a non-empty scope selects
/// code-with-scope (0x0f).
#[derive(Debug, Clone, PartialEq)]
pub struct BsonCode {
    pub code: String,
    pub scope: Vec<(String, DocValue)>,
}

impl BsonCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            scope: Vec::new(),
        }
    }

    pub fn with_scope(code: impl Into<String>, scope: Vec<(String, DocValue)>) -> Self {
        Self {
            code: code.into(),
            scope,
        }
    }
}

/// Symbol carrier (deprecated BSON type, round-tripped verbatim).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BsonSymbol {
    pub value: String,
}

/// Internal timestamp carrier. Same two-halves layout as [`BsonLong`] but
/// a distinct wire tag (0x11) and never promoted to a host number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BsonTimestamp {
    pub low: i32,
    pub high: i32,
}

impl BsonTimestamp {
    pub fn new(low: i32, high: i32) -> Self {
        Self { low, high }
    }
}

/// Boxed double carrier: forces the Double (0x01) encoding even for
/// integral values the promotion rules would otherwise emit as Int32.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BsonDouble {
    pub value: f64,
}

/// Database reference carrier.
///
/// Encodes as the projected document `{"$ref", "$id", "$db"}` (the `$db`
/// key only when present); decoding a document carrying `$ref` and `$id`
/// reconstructs the carrier.
#[derive(Debug, Clone, PartialEq)]
pub struct BsonDbRef {
    pub namespace: String,
    pub oid: BsonObjectId,
    pub db: Option<String>,
}

impl BsonDbRef {
    pub fn new(namespace: impl Into<String>, oid: BsonObjectId, db: Option<String>) -> Self {
        Self {
            namespace: namespace.into(),
            oid,
            db,
        }
    }
}

/// Host regular expression: a source pattern plus the flag set the host
/// regex model expresses.
///
/// Flags serialise in canonical order `i`, `m`, `s`; `s` stands for the
/// host's "global" flag. Decoding accepts the letters in any order and
/// drops ones outside this set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocRegExp {
    pub source: String,
    pub ignore_case: bool,
    pub multiline: bool,
    pub global: bool,
}

impl DocRegExp {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            ignore_case: false,
            multiline: false,
            global: false,
        }
    }

    /// Flags string in canonical serialisation order.
    pub fn options(&self) -> String {
        let mut out = String::with_capacity(3);
        if self.ignore_case {
            out.push('i');
        }
        if self.multiline {
            out.push('m');
        }
        if self.global {
            out.push('s');
        }
        out
    }

    /// Parses a flags string, ignoring letters the flag set does not express.
    pub fn from_options(source: impl Into<String>, options: &str) -> Self {
        let mut re = Self::new(source);
        for c in options.chars() {
            match c {
                'i' => re.ignore_case = true,
                'm' => re.multiline = true,
                's' => re.global = true,
                _ => {}
            }
        }
        re
    }
}

/// A dynamic document value: the host primitives plus the extended-type
/// carriers the host's native type system does not express.
///
/// Objects are ordered key-value pairs; field iteration order is
/// insertion order and is preserved through a round-trip.
#[derive(Debug, Clone, PartialEq)]
pub enum DocValue {
    /// Null (0x0a).
    Null,
    /// Host undefined; encodes as Null.
    Undefined,
    /// Boolean (0x08).
    Bool(bool),
    /// Integral host number. Promotes to Int32 or Double per range.
    Integer(i64),
    /// Floating host number. Promotes to Int32 when integral and in range.
    Float(f64),
    /// UTF-8 string (0x02).
    Str(String),
    /// UTC datetime, milliseconds since epoch (0x09).
    Date(i64),
    /// Regular expression (0x0b).
    RegExp(DocRegExp),
    /// Array (0x04).
    Array(Vec<DocValue>),
    /// Document (0x03): ordered key-value pairs.
    Object(Vec<(String, DocValue)>),
    /// Host function source text. Skipped unless function serialisation is
    /// enabled, in which case it encodes as Code (0x0d).
    Function(String),
    /// Int64 carrier (0x12).
    Long(BsonLong),
    /// ObjectID carrier (0x07).
    ObjectId(BsonObjectId),
    /// Binary carrier (0x05).
    Binary(BsonBinary),
    /// Code carrier (0x0d / 0x0f).
    Code(BsonCode),
    /// Symbol carrier (0x0e).
    Symbol(BsonSymbol),
    /// Timestamp carrier (0x11).
    Timestamp(BsonTimestamp),
    /// Boxed double carrier (0x01).
    Double(BsonDouble),
    /// Database reference carrier (projected document on the wire).
    DbRef(BsonDbRef),
    /// MinKey sentinel (0xff).
    MinKey,
    /// MaxKey sentinel (0x7f).
    MaxKey,
}

impl DocValue {
    /// Convenience constructor for an object value.
    pub fn object(fields: Vec<(String, DocValue)>) -> Self {
        DocValue::Object(fields)
    }

    pub fn as_object(&self) -> Option<&[(String, DocValue)]> {
        match self {
            DocValue::Object(fields) => Some(fields),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[DocValue]> {
        match self {
            DocValue::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            DocValue::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl From<serde_json::Value> for DocValue {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => DocValue::Null,
            serde_json::Value::Bool(b) => DocValue::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    DocValue::Integer(i)
                } else {
                    DocValue::Float(n.as_f64().unwrap_or(0.0))
                }
            }
            serde_json::Value::String(s) => DocValue::Str(s),
            serde_json::Value::Array(arr) => {
                DocValue::Array(arr.into_iter().map(DocValue::from).collect())
            }
            serde_json::Value::Object(obj) => DocValue::Object(
                obj.into_iter()
                    .map(|(k, v)| (k, DocValue::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<DocValue> for serde_json::Value {
    fn from(v: DocValue) -> Self {
        match v {
            DocValue::Null | DocValue::Undefined => serde_json::Value::Null,
            DocValue::Bool(b) => serde_json::Value::Bool(b),
            DocValue::Integer(i) => serde_json::json!(i),
            DocValue::Float(f) => serde_json::json!(f),
            DocValue::Str(s) => serde_json::Value::String(s),
            DocValue::Date(ms) => serde_json::json!(ms),
            DocValue::RegExp(re) => serde_json::Value::String(re.source),
            DocValue::Array(arr) => {
                serde_json::Value::Array(arr.into_iter().map(serde_json::Value::from).collect())
            }
            DocValue::Object(obj) => serde_json::Value::Object(
                obj.into_iter()
                    .map(|(k, v)| (k, serde_json::Value::from(v)))
                    .collect(),
            ),
            DocValue::Function(src) => serde_json::Value::String(src),
            DocValue::Long(l) => serde_json::json!(l.as_i64()),
            DocValue::ObjectId(oid) => {
                let hex: String = oid.id.iter().map(|b| format!("{b:02x}")).collect();
                serde_json::Value::String(hex)
            }
            DocValue::Binary(bin) => serde_json::json!(bin.bytes()),
            DocValue::Code(code) => serde_json::Value::String(code.code),
            DocValue::Symbol(sym) => serde_json::Value::String(sym.value),
            DocValue::Timestamp(ts) => {
                serde_json::json!({ "low": ts.low, "high": ts.high })
            }
            DocValue::Double(d) => serde_json::json!(d.value),
            DocValue::DbRef(dbref) => {
                serde_json::Value::from(DocValue::Object(crate::encoder::dbref_projection(&dbref)))
            }
            DocValue::MinKey => serde_json::json!({ "$minKey": 1 }),
            DocValue::MaxKey => serde_json::json!({ "$maxKey": 1 }),
        }
    }
}
