//! Printable renderings of types and schemas.
//!
//! `type_rep` is the schema-syntax spelling used by the object map and
//! the debug re-print; `cpp_type` / `java_type` / `java_flat_type` pick
//! a native-name column out of the predefined-types table for the
//! emitters. The schema re-print is text that parses back into an
//! equivalent record list.

use crate::error::CoreError;
use crate::symbol_table::SymbolTable;
use crate::types::{RecordId, Status, TypeId, TypeRef};

/// Schema-syntax spelling of a type, e.g. `optional<vector<int32>>` or
/// `int32[10][20]`.
pub fn type_rep(st: &SymbolTable, t: TypeRef) -> String {
    let d = st.ty(t);
    let elem_rep = d.elem.map(|e| type_rep(st, e)).unwrap_or_default();
    match d.id {
        TypeId::Vector => format!("vector<{elem_rep}>"),
        TypeId::Optional => format!("optional<{elem_rep}>"),
        TypeId::Varray => format!("fixed_vector<{elem_rep}, {}>", d.count),
        TypeId::Array => format!("{elem_rep}[{}]", d.count),
        TypeId::String => "string".to_string(),
        _ => d.name.clone(),
    }
}

fn elem_of(st: &SymbolTable, t: TypeRef) -> Result<TypeRef, CoreError> {
    st.ty(t)
        .elem
        .ok_or_else(|| CoreError::Semantic("parameterized type without an element".to_string()))
}

/// C++ spelling of a type as it appears in emitted code.
pub fn cpp_type(st: &SymbolTable, t: TypeRef) -> Result<String, CoreError> {
    let d = st.ty(t);
    Ok(match d.id {
        TypeId::String => "String".to_string(),
        TypeId::Flat | TypeId::Variant | TypeId::Enumeration | TypeId::View | TypeId::Message => {
            d.name.clone()
        }
        TypeId::Optional => format!("Optional<{}>", cpp_type(st, elem_of(st, t)?)?),
        TypeId::Vector => format!("Vector<{}>", cpp_type(st, elem_of(st, t)?)?),
        TypeId::Array => format!("Array<{} , {}>", cpp_type(st, elem_of(st, t)?)?, d.count),
        TypeId::Varray => {
            format!("Fixed_vector<{} , {}>", cpp_type(st, elem_of(st, t)?)?, d.count)
        }
        TypeId::Undefined | TypeId::Bad => {
            return Err(CoreError::Semantic(format!(
                "{} not defined after end of parse",
                d.name
            )));
        }
        _ => d.cpp_native_name.clone(),
    })
}

/// Java spelling of a type (the second column of the predefined-types
/// table; the Java backend itself is not wired to the driver).
pub fn java_type(st: &SymbolTable, t: TypeRef) -> Result<String, CoreError> {
    let d = st.ty(t);
    Ok(match d.id {
        TypeId::String => "String".to_string(),
        TypeId::Flat | TypeId::Variant | TypeId::Enumeration => d.name.clone(),
        TypeId::Optional => java_type(st, elem_of(st, t)?)?,
        TypeId::Vector => format!("{}[]", java_type(st, elem_of(st, t)?)?),
        TypeId::Array | TypeId::Varray => {
            format!("{}[{}]", java_type(st, elem_of(st, t)?)?, d.count)
        }
        TypeId::Undefined | TypeId::Bad => {
            return Err(CoreError::Semantic(format!(
                "{} not defined after end of parse",
                d.name
            )));
        }
        _ => d.java_native_name.clone(),
    })
}

/// Java flat-wrapper spelling (third column of the table).
pub fn java_flat_type(st: &SymbolTable, t: TypeRef) -> Result<String, CoreError> {
    let d = st.ty(t);
    let mut s = match d.id {
        TypeId::Flat => d.name.clone(),
        TypeId::Variant | TypeId::Undefined | TypeId::Bad => "UNIMPLEMENTED".to_string(),
        TypeId::Vector => format!("{}Vector", java_flat_elem(st, t)?),
        TypeId::Array => format!("{}Array_", java_flat_elem(st, t)?),
        TypeId::Varray => format!("{}Fixed_vector_", java_flat_elem(st, t)?),
        _ => d.java_flat_name.clone(),
    };
    if d.count != 1 {
        s.push_str(&d.count.to_string());
    }
    Ok(s)
}

fn java_flat_elem(st: &SymbolTable, t: TypeRef) -> Result<String, CoreError> {
    let e = elem_of(st, t)?;
    let d = st.ty(e);
    Ok(if d.id == TypeId::Flat {
        d.name.clone()
    } else {
        d.java_flat_name.clone()
    })
}

/// Re-print a record list as schema text. Deprecate/delete actions
/// reappear as actions so a reparse reconstructs the same statuses.
pub fn print_schema(st: &SymbolTable, records: &[RecordId]) -> String {
    records.iter().map(|&rid| print_record(st, rid)).collect()
}

pub fn print_record(st: &SymbolTable, rid: RecordId) -> String {
    let rec = st.record(rid);
    let mut out = String::new();
    match rec.id {
        TypeId::Flat | TypeId::Variant => {
            let kw = if rec.id == TypeId::Flat { "flat" } else { "variant" };
            out.push_str(&format!("{} : {} {{\n", rec.name, kw));
            for f in &rec.fields {
                match f.status {
                    Status::Deleting => out.push_str(&format!("   delete {}\n", f.name)),
                    Status::Deprecating => out.push_str(&format!("   deprecate {}\n", f.name)),
                    _ => {
                        if let Some(t) = f.ty {
                            out.push_str(&format!("   {} : {}\n", f.name, type_rep(st, t)));
                        }
                    }
                }
            }
            out.push_str("}\n");
        }
        TypeId::Enumeration => {
            out.push_str(&format!("{} : enum {{ ", rec.name));
            for f in &rec.fields {
                out.push_str(&format!("{} : {} ", f.name, f.value));
            }
            out.push_str("}\n");
        }
        TypeId::View => {
            let of = rec
                .underlying
                .map(|t| st.ty(t).name.clone())
                .unwrap_or_default();
            out.push_str(&format!("{} : view of {} {{ ", rec.name, of));
            for f in &rec.fields {
                out.push_str(&format!("{} ", f.name));
            }
            out.push_str("}\n");
        }
        TypeId::Message => {
            let of = rec
                .underlying
                .map(|t| st.ty(t).name.clone())
                .unwrap_or_default();
            out.push_str(&format!("{} : message of {}\n", rec.name, of));
        }
        _ => {}
    }
    out
}
