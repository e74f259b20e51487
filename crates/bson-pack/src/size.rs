//! Encoded-size precomputation.
//!
//! Computes the exact number of bytes a value occupies in BSON wire form
//! without producing the encoding, so the serializer can make a single
//! exact-size output allocation. The arithmetic here must agree with the
//! encoder byte for byte; the encoder asserts the equality in debug
//! builds.

use crate::encoder::dbref_projection;
use crate::values::DocValue;

/// Returns the payload size of a value in bytes.
///
/// For documents and arrays this is the full encoded size including the
/// length prefix and terminator; for scalars it is the element payload
/// alone (tag and field name are counted by the enclosing document).
///
/// Never fails: values the encoder rejects still get a size assigned,
/// and the rejection happens during serialization.
pub fn calculate_size(value: &DocValue, serialize_functions: bool) -> usize {
    match value {
        DocValue::Null | DocValue::Undefined => 0,
        DocValue::Bool(_) => 1,
        DocValue::Integer(i) => {
            if *i >= i32::MIN as i64 && *i <= i32::MAX as i64 {
                4
            } else {
                8
            }
        }
        DocValue::Float(f) => {
            if f.fract() != 0.0 {
                8
            } else if *f >= i32::MIN as f64 && *f <= i32::MAX as f64 {
                4
            } else {
                8
            }
        }
        DocValue::Str(s) => s.len() + 4 + 1,
        DocValue::Date(_) => 8,
        DocValue::RegExp(re) => re.source.len() + re.options().len() + 2,
        DocValue::Array(items) => array_size(items, serialize_functions),
        DocValue::Object(fields) => document_size(fields, serialize_functions),
        DocValue::Function(src) => {
            if serialize_functions {
                src.len() + 4 + 1
            } else {
                0
            }
        }
        DocValue::Long(_) | DocValue::Timestamp(_) => 8,
        DocValue::ObjectId(_) => 12,
        DocValue::Binary(bin) => bin.position + 4 + 1,
        DocValue::Code(code) => {
            if code.scope.is_empty() {
                code.code.len() + 4 + 1
            } else {
                4 + code.code.len() + 4 + 1 + document_size(&code.scope, serialize_functions)
            }
        }
        DocValue::Symbol(sym) => sym.value.len() + 4 + 1,
        DocValue::Double(_) => 8,
        DocValue::DbRef(dbref) => {
            document_size(&dbref_projection(dbref), serialize_functions)
        }
        DocValue::MinKey | DocValue::MaxKey => 0,
    }
}

/// Size of a document: length prefix, elements, terminator.
pub(crate) fn document_size(fields: &[(String, DocValue)], serialize_functions: bool) -> usize {
    let mut size = 4 + 1;
    for (key, value) in fields {
        if skipped(value, serialize_functions) {
            continue;
        }
        size += 1 + key.len() + 1 + calculate_size(value, serialize_functions);
    }
    size
}

/// Size of an array document: elements carry decimal-string names.
pub(crate) fn array_size(items: &[DocValue], serialize_functions: bool) -> usize {
    let mut size = 4 + 1;
    for (index, value) in items.iter().enumerate() {
        if skipped(value, serialize_functions) {
            continue;
        }
        size += 1 + decimal_digits(index) + 1 + calculate_size(value, serialize_functions);
    }
    size
}

/// Function values vanish entirely unless function serialisation is on.
pub(crate) fn skipped(value: &DocValue, serialize_functions: bool) -> bool {
    matches!(value, DocValue::Function(_)) && !serialize_functions
}

fn decimal_digits(mut index: usize) -> usize {
    let mut digits = 1;
    while index >= 10 {
        index /= 10;
        digits += 1;
    }
    digits
}
