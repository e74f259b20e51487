//! BSON wire-format constants.

/// Element type tags (the one-byte discriminator preceding each element).
pub const TAG_DOUBLE: u8 = 0x01;
pub const TAG_STRING: u8 = 0x02;
pub const TAG_OBJECT: u8 = 0x03;
pub const TAG_ARRAY: u8 = 0x04;
pub const TAG_BINARY: u8 = 0x05;
pub const TAG_OBJECT_ID: u8 = 0x07;
pub const TAG_BOOLEAN: u8 = 0x08;
pub const TAG_DATE: u8 = 0x09;
pub const TAG_NULL: u8 = 0x0a;
pub const TAG_REGEXP: u8 = 0x0b;
pub const TAG_CODE: u8 = 0x0d;
pub const TAG_SYMBOL: u8 = 0x0e;
pub const TAG_CODE_W_SCOPE: u8 = 0x0f;
pub const TAG_INT32: u8 = 0x10;
pub const TAG_TIMESTAMP: u8 = 0x11;
pub const TAG_LONG: u8 = 0x12;
pub const TAG_MIN_KEY: u8 = 0xff;
pub const TAG_MAX_KEY: u8 = 0x7f;

/// Binary element subtypes. Opaque to the codec; written and read verbatim.
pub const SUBTYPE_DEFAULT: u8 = 0x00;
pub const SUBTYPE_FUNCTION: u8 = 0x01;
pub const SUBTYPE_BYTE_ARRAY: u8 = 0x02;
pub const SUBTYPE_UUID: u8 = 0x03;
pub const SUBTYPE_MD5: u8 = 0x04;
pub const SUBTYPE_USER_DEFINED: u8 = 0x80;

/// Reserved keys of the DBRef projection document.
pub const DBREF_REF_KEY: &str = "$ref";
pub const DBREF_ID_KEY: &str = "$id";
pub const DBREF_DB_KEY: &str = "$db";

/// Largest integer magnitude a 64-bit float can hold without loss.
pub const MAX_SAFE_INTEGER: i64 = 1 << 53;
