//! Codec registry: the carrier constructors used to materialise extended
//! types during decoding.
//!
//! The registry is assembled once per codec from ten constructor
//! functions, one per carrier. Construction fails when any of them is
//! missing. After construction the registry is immutable and safe to
//! share across threads.

use crate::error::BsonError;
use crate::values::{BsonObjectId, DocValue};

/// Builds a Long carrier from its 32-bit halves.
pub type LongCtor = fn(low: i32, high: i32) -> DocValue;
/// Builds an ObjectID carrier from 12 raw bytes.
pub type ObjectIdCtor = fn(id: [u8; 12]) -> DocValue;
/// Builds a Binary carrier from raw bytes and a subtype.
pub type BinaryCtor = fn(buffer: Vec<u8>, sub_type: u8) -> DocValue;
/// Builds a Code carrier from source text and a scope document.
pub type CodeCtor = fn(code: String, scope: Vec<(String, DocValue)>) -> DocValue;
/// Builds a DBRef carrier from its projected fields.
pub type DbRefCtor = fn(namespace: String, oid: BsonObjectId, db: Option<String>) -> DocValue;
/// Builds a Symbol carrier.
pub type SymbolCtor = fn(value: String) -> DocValue;
/// Builds a boxed Double carrier.
pub type DoubleCtor = fn(value: f64) -> DocValue;
/// Builds a Timestamp carrier from its 32-bit halves.
pub type TimestampCtor = fn(low: i32, high: i32) -> DocValue;
/// Builds a MinKey or MaxKey sentinel.
pub type SentinelCtor = fn() -> DocValue;

/// Immutable lookup surface for carrier construction during decode.
#[derive(Debug, Clone, Copy)]
pub struct CodecRegistry {
    pub(crate) long: LongCtor,
    pub(crate) object_id: ObjectIdCtor,
    pub(crate) binary: BinaryCtor,
    pub(crate) code: CodeCtor,
    pub(crate) dbref: DbRefCtor,
    pub(crate) symbol: SymbolCtor,
    pub(crate) double: DoubleCtor,
    pub(crate) timestamp: TimestampCtor,
    pub(crate) min_key: SentinelCtor,
    pub(crate) max_key: SentinelCtor,
}

impl CodecRegistry {
    /// Registry wired to this crate's own carrier types.
    pub fn standard() -> Self {
        RegistryBuilder::new()
            .long(|low, high| DocValue::Long(crate::values::BsonLong { low, high }))
            .object_id(|id| DocValue::ObjectId(BsonObjectId { id }))
            .binary(|buffer, sub_type| {
                DocValue::Binary(crate::values::BsonBinary {
                    position: buffer.len(),
                    buffer,
                    sub_type,
                })
            })
            .code(|code, scope| DocValue::Code(crate::values::BsonCode { code, scope }))
            .dbref(|namespace, oid, db| {
                DocValue::DbRef(crate::values::BsonDbRef {
                    namespace,
                    oid,
                    db,
                })
            })
            .symbol(|value| DocValue::Symbol(crate::values::BsonSymbol { value }))
            .double(|value| DocValue::Double(crate::values::BsonDouble { value }))
            .timestamp(|low, high| DocValue::Timestamp(crate::values::BsonTimestamp { low, high }))
            .min_key(|| DocValue::MinKey)
            .max_key(|| DocValue::MaxKey)
            .build()
            .expect("standard registry supplies all ten constructors")
    }
}

/// Collects carrier constructors; [`RegistryBuilder::build`] checks that
/// all ten are present.
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    long: Option<LongCtor>,
    object_id: Option<ObjectIdCtor>,
    binary: Option<BinaryCtor>,
    code: Option<CodeCtor>,
    dbref: Option<DbRefCtor>,
    symbol: Option<SymbolCtor>,
    double: Option<DoubleCtor>,
    timestamp: Option<TimestampCtor>,
    min_key: Option<SentinelCtor>,
    max_key: Option<SentinelCtor>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn long(mut self, ctor: LongCtor) -> Self {
        self.long = Some(ctor);
        self
    }

    pub fn object_id(mut self, ctor: ObjectIdCtor) -> Self {
        self.object_id = Some(ctor);
        self
    }

    pub fn binary(mut self, ctor: BinaryCtor) -> Self {
        self.binary = Some(ctor);
        self
    }

    pub fn code(mut self, ctor: CodeCtor) -> Self {
        self.code = Some(ctor);
        self
    }

    pub fn dbref(mut self, ctor: DbRefCtor) -> Self {
        self.dbref = Some(ctor);
        self
    }

    pub fn symbol(mut self, ctor: SymbolCtor) -> Self {
        self.symbol = Some(ctor);
        self
    }

    pub fn double(mut self, ctor: DoubleCtor) -> Self {
        self.double = Some(ctor);
        self
    }

    pub fn timestamp(mut self, ctor: TimestampCtor) -> Self {
        self.timestamp = Some(ctor);
        self
    }

    pub fn min_key(mut self, ctor: SentinelCtor) -> Self {
        self.min_key = Some(ctor);
        self
    }

    pub fn max_key(mut self, ctor: SentinelCtor) -> Self {
        self.max_key = Some(ctor);
        self
    }

    /// Finishes the registry, failing on the first missing constructor.
    pub fn build(self) -> Result<CodecRegistry, BsonError> {
        Ok(CodecRegistry {
            long: self.long.ok_or(BsonError::MissingConstructor("Long"))?,
            object_id: self
                .object_id
                .ok_or(BsonError::MissingConstructor("ObjectID"))?,
            binary: self.binary.ok_or(BsonError::MissingConstructor("Binary"))?,
            code: self.code.ok_or(BsonError::MissingConstructor("Code"))?,
            dbref: self.dbref.ok_or(BsonError::MissingConstructor("DBRef"))?,
            symbol: self.symbol.ok_or(BsonError::MissingConstructor("Symbol"))?,
            double: self.double.ok_or(BsonError::MissingConstructor("Double"))?,
            timestamp: self
                .timestamp
                .ok_or(BsonError::MissingConstructor("Timestamp"))?,
            min_key: self
                .min_key
                .ok_or(BsonError::MissingConstructor("MinKey"))?,
            max_key: self
                .max_key
                .ok_or(BsonError::MissingConstructor("MaxKey"))?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_registry_builds() {
        let registry = CodecRegistry::standard();
        assert_eq!((registry.min_key)(), DocValue::MinKey);
        assert_eq!((registry.max_key)(), DocValue::MaxKey);
        assert_eq!(
            (registry.long)(705_032_704, 1),
            DocValue::Long(crate::values::BsonLong::from_i64(5_000_000_000))
        );
    }

    #[test]
    fn missing_constructor_fails_construction() {
        let err = RegistryBuilder::new()
            .long(|low, high| DocValue::Long(crate::values::BsonLong { low, high }))
            .build()
            .unwrap_err();
        assert_eq!(err, BsonError::MissingConstructor("ObjectID"));
    }

    #[test]
    fn registry_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<CodecRegistry>();
    }
}
