//! The predefined-types table: schema names mapped to per-target
//! native spellings, sizes, and alignments. A configuration table, not
//! a polymorphism hierarchy; the emitter picks one column.
//!
//! Sizes follow the runtime contract: a string is a vector of char and
//! its inline footprint is the vector header. `int24` is deliberately
//! stored in 4 bytes with 32-bit alignment. Embedders may seed the
//! symbol table with an extended copy of this table; `TimeStamp` is the
//! worked example of an application-supplied preset scalar.

use crate::types::{Predef, TypeId};
use flats_rt::VECTOR_HEADER_SIZE;

pub const PREDEFINED_TYPES: &[Predef] = &[
    Predef {
        name: "int8",
        cpp_native_name: "std::int8_t",
        java_native_name: "byte",
        java_flat_name: "Int8",
        id: TypeId::Int8,
        size: 1,
        align: 1,
    },
    Predef {
        name: "char",
        cpp_native_name: "char",
        java_native_name: "byte",
        java_flat_name: "Char8",
        id: TypeId::Char8,
        size: 1,
        align: 1,
    },
    Predef {
        name: "int16",
        cpp_native_name: "std::int16_t",
        java_native_name: "short",
        java_flat_name: "Int16",
        id: TypeId::Int16,
        size: 2,
        align: 2,
    },
    // stored padded: 4 bytes, 32-bit alignment
    Predef {
        name: "int24",
        cpp_native_name: "Int24",
        java_native_name: "int",
        java_flat_name: "Int24",
        id: TypeId::Int24,
        size: 4,
        align: 4,
    },
    Predef {
        name: "int32",
        cpp_native_name: "std::int32_t",
        java_native_name: "int",
        java_flat_name: "Int32",
        id: TypeId::Int32,
        size: 4,
        align: 4,
    },
    Predef {
        name: "int64",
        cpp_native_name: "int64_t",
        java_native_name: "long",
        java_flat_name: "Int64",
        id: TypeId::Int64,
        size: 8,
        align: 8,
    },
    Predef {
        name: "uint8",
        cpp_native_name: "unsigned char",
        java_native_name: "int",
        java_flat_name: "Uint8",
        id: TypeId::Uint8,
        size: 1,
        align: 1,
    },
    Predef {
        name: "uint16",
        cpp_native_name: "std::uint16_t",
        java_native_name: "short",
        java_flat_name: "Uint16",
        id: TypeId::Uint16,
        size: 2,
        align: 2,
    },
    Predef {
        name: "uint32",
        cpp_native_name: "std::uint32_t",
        java_native_name: "int",
        java_flat_name: "Uint32",
        id: TypeId::Uint32,
        size: 4,
        align: 4,
    },
    Predef {
        name: "uint64",
        cpp_native_name: "uint64_t",
        java_native_name: "long",
        java_flat_name: "Uint64",
        id: TypeId::Uint64,
        size: 8,
        align: 8,
    },
    Predef {
        name: "float32",
        cpp_native_name: "float",
        java_native_name: "float",
        java_flat_name: "Float32",
        id: TypeId::Float32,
        size: 4,
        align: 4,
    },
    Predef {
        name: "float64",
        cpp_native_name: "double",
        java_native_name: "double",
        java_flat_name: "Float64",
        id: TypeId::Float64,
        size: 8,
        align: 8,
    },
    Predef {
        name: "string",
        cpp_native_name: "String",
        java_native_name: "String",
        java_flat_name: "String",
        id: TypeId::String,
        size: VECTOR_HEADER_SIZE as i32,
        align: 2,
    },
    Predef {
        name: "TimeStamp",
        cpp_native_name: "TimeStamp",
        java_native_name: "TimeStamp",
        java_flat_name: "TimeStamp",
        id: TypeId::Preset(1),
        size: 16,
        align: 8,
    },
];

pub fn lookup(name: &str) -> Option<&'static Predef> {
    PREDEFINED_TYPES.iter().find(|p| p.name == name)
}
