//! BSON (Binary JSON) wire-format codec.
//!
//! A bidirectional translator between dynamic document values
//! ([`DocValue`]) and BSON bytes, built from four pieces:
//!
//! - a carrier [`registry`](CodecRegistry) constructed once per codec,
//! - exact encoded-size precomputation ([`calculate_size`]),
//! - a serializer writing into a single exact-size allocation,
//! - a deserializer with incremental parsing of concatenated documents.
//!
//! ```
//! use bson_pack::{BsonCodec, DocValue};
//!
//! let codec = BsonCodec::new();
//! let doc = DocValue::Object(vec![
//!     ("hello".to_string(), DocValue::Str("world".to_string())),
//! ]);
//! let bytes = codec.serialize(&doc, false, false).unwrap();
//! assert_eq!(bytes.len(), codec.calculate_size(&doc, false));
//! assert_eq!(codec.deserialize(&bytes).unwrap(), doc);
//! ```

pub mod constants;

mod codec;
mod decoder;
mod encoder;
mod error;
mod registry;
mod size;
mod values;

pub use codec::BsonCodec;
pub use error::BsonError;
pub use registry::{
    BinaryCtor, CodeCtor, CodecRegistry, DbRefCtor, DoubleCtor, LongCtor, ObjectIdCtor,
    RegistryBuilder, SentinelCtor, SymbolCtor, TimestampCtor,
};
pub use size::calculate_size;
pub use values::{
    BsonBinary, BsonCode, BsonDbRef, BsonDouble, BsonLong, BsonObjectId, BsonSymbol,
    BsonTimestamp, DocRegExp, DocValue,
};
