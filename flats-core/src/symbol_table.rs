//! The symbol table: owner of every type descriptor and record in a
//! compilation. Names resolve to arena indices; a forward reference
//! inserts an `Undefined` placeholder that is later patched in place,
//! so references taken before the definition keep resolving.

use std::collections::HashMap;

use crate::error::CoreError;
use crate::preset::PREDEFINED_TYPES;
use crate::types::{Predef, Record, RecordId, TypeDesc, TypeId, TypeRef};

#[derive(Debug)]
pub struct SymbolTable {
    types: Vec<TypeDesc>,
    records: Vec<Record>,
    by_name: HashMap<String, TypeRef>,
    /// Named entries in insertion order, for the end-of-parse
    /// undefined check and deterministic iteration.
    order: Vec<TypeRef>,
}

impl SymbolTable {
    /// A table seeded with the built-in predefined types.
    pub fn new() -> Result<SymbolTable, CoreError> {
        SymbolTable::with_presets(PREDEFINED_TYPES)
    }

    /// A table seeded from a caller-supplied predefined-types table
    /// (the built-ins plus application presets).
    pub fn with_presets(presets: &[Predef]) -> Result<SymbolTable, CoreError> {
        let mut st = SymbolTable {
            types: Vec::new(),
            records: Vec::new(),
            by_name: HashMap::new(),
            order: Vec::new(),
        };
        st.seed(presets)?;
        Ok(st)
    }

    fn seed(&mut self, presets: &[Predef]) -> Result<(), CoreError> {
        for p in presets {
            if p.name.is_empty() {
                return Err(CoreError::Semantic(
                    "name missing in predefined type".to_string(),
                ));
            }
            if p.cpp_native_name.is_empty() || p.java_native_name.is_empty() {
                return Err(CoreError::Semantic(format!(
                    "native name missing in predefined type {}",
                    p.name
                )));
            }
            if !p.id.is_seedable() {
                return Err(CoreError::Semantic(format!(
                    "bad kind for predefined type {}",
                    p.name
                )));
            }
            if p.size <= 0 {
                return Err(CoreError::Semantic(format!(
                    "non-positive size for predefined type {}",
                    p.name
                )));
            }
            if p.align <= 0 {
                return Err(CoreError::Semantic(format!(
                    "non-positive alignment for predefined type {}",
                    p.name
                )));
            }
            if self.find(p.name).is_some() {
                return Err(CoreError::Semantic(format!(
                    "repeated fundamental type name {}",
                    p.name
                )));
            }
            self.bind(p.name, TypeDesc::from_predef(p));
        }
        Ok(())
    }

    fn bind(&mut self, name: &str, desc: TypeDesc) -> TypeRef {
        let t = self.alloc_type(desc);
        self.by_name.insert(name.to_string(), t);
        self.order.push(t);
        t
    }

    pub fn alloc_type(&mut self, desc: TypeDesc) -> TypeRef {
        let t = TypeRef(self.types.len());
        self.types.push(desc);
        t
    }

    pub fn alloc_record(&mut self, rec: Record) -> RecordId {
        let r = RecordId(self.records.len());
        self.records.push(rec);
        r
    }

    pub fn find(&self, name: &str) -> Option<TypeRef> {
        self.by_name.get(name).copied()
    }

    /// Bind `name` to an `Undefined` placeholder record type, to be
    /// patched when the definition arrives.
    pub fn intern_placeholder(&mut self, name: &str) -> TypeRef {
        self.bind(name, TypeDesc::named(name, TypeId::Undefined))
    }

    /// Attach a parsed record to the placeholder (or fresh binding)
    /// `t`, patching the descriptor in place. Fails when `t` is already
    /// a defined type.
    pub fn define(&mut self, t: TypeRef, mut rec: Record) -> Result<RecordId, CoreError> {
        if self.types[t.0].id != TypeId::Undefined {
            return Err(CoreError::Semantic(format!(
                "{} defined twice",
                self.types[t.0].name
            )));
        }
        rec.self_type = Some(t);
        let id = rec.id;
        let rid = self.alloc_record(rec);
        let desc = &mut self.types[t.0];
        desc.id = id;
        desc.record = Some(rid);
        Ok(rid)
    }

    pub fn ty(&self, t: TypeRef) -> &TypeDesc {
        &self.types[t.0]
    }

    pub fn ty_mut(&mut self, t: TypeRef) -> &mut TypeDesc {
        &mut self.types[t.0]
    }

    pub fn record(&self, r: RecordId) -> &Record {
        &self.records[r.0]
    }

    pub fn record_mut(&mut self, r: RecordId) -> &mut Record {
        &mut self.records[r.0]
    }

    /// The record behind a record-kinded type, if defined.
    pub fn record_of(&self, t: TypeRef) -> Option<RecordId> {
        self.ty(t).record
    }

    /// Named entries in insertion order.
    pub fn named(&self) -> impl Iterator<Item = TypeRef> + '_ {
        self.order.iter().copied()
    }

    /// After parsing, no placeholder may remain undefined.
    pub fn check_no_undefined(&self) -> Result<(), CoreError> {
        let undefined: Vec<&str> = self
            .named()
            .filter(|&t| self.ty(t).id == TypeId::Undefined)
            .map(|t| self.ty(t).name.as_str())
            .collect();
        if undefined.is_empty() {
            Ok(())
        } else {
            Err(CoreError::Semantic(format!(
                "undefined variants or flats: {}",
                undefined.join(", ")
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeds_the_predefined_types() {
        let st = SymbolTable::new().expect("seed");
        let t = st.find("int32").expect("int32 is predefined");
        assert_eq!(st.ty(t).id, TypeId::Int32);
        assert_eq!(st.ty(t).size, 4);
        assert!(st.find("no_such_type").is_none());
    }

    #[test]
    fn rejects_repeated_preset_names() {
        let twice = [
            PREDEFINED_TYPES[0],
            PREDEFINED_TYPES[0],
        ];
        let err = SymbolTable::with_presets(&twice).unwrap_err();
        assert!(err.to_string().contains("repeated fundamental type name"));
    }

    #[test]
    fn rejects_record_kinds_in_the_preset_table() {
        let bad = [Predef {
            name: "sneaky",
            cpp_native_name: "sneaky",
            java_native_name: "sneaky",
            java_flat_name: "sneaky",
            id: TypeId::Flat,
            size: 4,
            align: 4,
        }];
        let err = SymbolTable::with_presets(&bad).unwrap_err();
        assert!(err.to_string().contains("bad kind"));
    }

    #[test]
    fn placeholders_are_patched_in_place() {
        let mut st = SymbolTable::new().expect("seed");
        let t = st.intern_placeholder("Pending");
        assert_eq!(st.ty(t).id, TypeId::Undefined);
        assert!(st.check_no_undefined().is_err());

        let rid = st
            .define(t, Record::new(TypeId::Flat, "Pending"))
            .expect("patch");
        assert_eq!(st.ty(t).id, TypeId::Flat);
        assert_eq!(st.record_of(t), Some(rid));
        assert_eq!(st.record(rid).self_type, Some(t));
        assert!(st.check_no_undefined().is_ok());
    }

    #[test]
    fn defining_a_bound_name_twice_fails() {
        let mut st = SymbolTable::new().expect("seed");
        let t = st.intern_placeholder("R");
        st.define(t, Record::new(TypeId::Flat, "R")).expect("first");
        let err = st.define(t, Record::new(TypeId::Flat, "R")).unwrap_err();
        assert!(err.to_string().contains("defined twice"));
    }
}
