//! Recursive-descent parser for flats schemas.
//!
//! Produces the declaration-ordered record list plus the populated
//! symbol table. Names can be used before they are defined; a lookup
//! for an unknown name inserts an `Undefined` placeholder that the
//! definition later patches, and no placeholder may remain undefined
//! at end of input. A flat embedding itself by value is rejected here
//! when direct; indirect cycles surface in the layout engine.

use crate::error::CoreError;
use crate::lexer::Lexer;
use crate::symbol_table::SymbolTable;
use crate::types::{Field, Record, RecordId, Status, TypeDesc, TypeId, TypeRef};
use flats_rt::VECTOR_HEADER_SIZE;

/// A parsed compilation unit: the symbol table owns every descriptor,
/// the record list borrows them in declaration order.
#[derive(Debug)]
pub struct Schema {
    pub table: SymbolTable,
    pub records: Vec<RecordId>,
}

pub fn parse(source: &str) -> Result<Schema, CoreError> {
    let parser = Parser {
        lx: Lexer::new(source),
        st: SymbolTable::new()?,
        records: Vec::new(),
        current: None,
    };
    parser.run()
}

struct Parser {
    lx: Lexer,
    st: SymbolTable,
    records: Vec<RecordId>,
    /// Placeholder of the declaration being parsed, for the
    /// direct-self-reference check.
    current: Option<TypeRef>,
}

impl Parser {
    fn perr(&self, message: impl Into<String>) -> CoreError {
        CoreError::Parse {
            line: self.lx.line(),
            message: message.into(),
        }
    }

    fn run(mut self) -> Result<Schema, CoreError> {
        loop {
            if self.lx.at_end()? {
                break;
            }
            let name = self.lx.read_name()?;
            if name == "end" {
                break;
            }

            let nref = match self.st.find(&name) {
                Some(t) if self.st.ty(t).id != TypeId::Undefined => {
                    return Err(self.perr(format!("{name} defined twice")));
                }
                Some(t) => t,
                None => self.st.intern_placeholder(&name),
            };

            self.lx.expect_char(':', &format!("after global name {name}"))?;
            self.current = Some(nref);
            let kind = self.lx.read_name()?;
            let rec = match kind.as_str() {
                "flat" => self.record_body(&name, TypeId::Flat)?,
                "variant" => self.record_body(&name, TypeId::Variant)?,
                "enum" => self.enumeration(&name)?,
                "view" => self.view(&name)?,
                "message" => self.message(&name)?,
                other => {
                    return Err(self.perr(format!(
                        "unexpected '{other}' at start of declaration"
                    )));
                }
            };
            self.current = None;
            self.lx.eat_terminator()?;

            let rid = self.st.define(nref, rec)?;
            self.records.push(rid);
        }

        self.st.check_no_undefined()?;
        self.resolve_deferred()?;
        Ok(Schema {
            table: self.st,
            records: self.records,
        })
    }

    // ---- record bodies ------------------------------------------------

    fn record_body(&mut self, name: &str, kind: TypeId) -> Result<Record, CoreError> {
        let mut rec = Record::new(kind, name);
        self.lx.expect_char('{', &format!("after '{}'", kind.name()))?;
        loop {
            if self.lx.eat('}')? {
                break;
            }
            self.field_into(&mut rec, kind)?;
        }
        Ok(rec)
    }

    fn field_into(&mut self, rec: &mut Record, kind: TypeId) -> Result<(), CoreError> {
        let name = self.lx.read_name()?;
        if name == "deprecate" {
            return self.modify_field(rec, Status::Deprecated, Status::Deprecating);
        }
        if name == "delete" {
            return self.modify_field(rec, Status::Deleted, Status::Deleting);
        }
        if rec.find_field(&name).is_some() {
            return Err(self.perr(format!("member defined twice: {name}")));
        }
        self.lx.expect_char(':', &format!("after member name {name}"))?;
        let t = self.type_expr(kind)?;
        self.lx.eat_terminator()?;
        rec.push_field(Field::new(&name, t));
        Ok(())
    }

    /// `deprecate f` / `delete f`: transition the existing field to its
    /// stable state and push a sentinel recording that the change
    /// happened in this revision. The sentinel keeps the ordinal space.
    fn modify_field(
        &mut self,
        rec: &mut Record,
        stable: Status,
        sentinel: Status,
    ) -> Result<(), CoreError> {
        let name = self.lx.read_name()?;
        let Some(idx) = rec.find_field(&name) else {
            let what = if stable == Status::Deprecated {
                "deprecated"
            } else {
                "deleted"
            };
            return Err(self.perr(format!("{what} field not found: {name}")));
        };
        rec.fields[idx].status = stable;
        self.lx.eat_terminator()?;
        rec.push_field(Field::sentinel(&name, sentinel));
        Ok(())
    }

    fn enumeration(&mut self, name: &str) -> Result<Record, CoreError> {
        let mut rec = Record::new(TypeId::Enumeration, name);
        self.lx.expect_char('{', "after 'enum'")?;
        loop {
            if self.lx.eat('}')? {
                break;
            }
            let ename = self.lx.read_name()?;
            if rec.find_field(&ename).is_some() {
                return Err(self.perr(format!("member defined twice: {ename}")));
            }
            let value = if self.lx.eat(':')? {
                self.number()?
            } else {
                rec.fields.last().map(|f| f.value + 1).unwrap_or(0)
            };
            self.lx.eat_terminator()?;
            rec.push_field(Field::enumerator(&ename, value));
        }
        Ok(rec)
    }

    fn view(&mut self, name: &str) -> Result<Record, CoreError> {
        let underlying = self.underlying_flat(name)?;
        let rid = self
            .st
            .record_of(underlying)
            .ok_or_else(|| self.perr(format!("{name} flat definition not found")))?;

        let mut rec = Record::new(TypeId::View, name);
        rec.underlying = Some(underlying);
        let under_name = self.st.ty(underlying).name.clone();

        if self.lx.eat('{')? {
            // partial view: named subset, order may differ
            loop {
                if self.lx.eat('}')? {
                    break;
                }
                let fname = self.lx.read_name()?;
                self.lx.eat_terminator()?;
                let under = self.st.record(rid);
                let fld = under
                    .find_field(&fname)
                    .map(|i| &under.fields[i])
                    .filter(|f| f.ty.is_some())
                    .ok_or_else(|| {
                        self.perr(format!("{fname} is not a member of {under_name}"))
                    })?;
                rec.fields.push(view_field(fld));
            }
        } else {
            // complete view: every non-elided field
            for i in 0..self.st.record(rid).fields.len() {
                let fld = &self.st.record(rid).fields[i];
                if fld.status.is_elided() || fld.ty.is_none() {
                    continue;
                }
                rec.fields.push(view_field(fld));
            }
        }
        Ok(rec)
    }

    fn message(&mut self, name: &str) -> Result<Record, CoreError> {
        let underlying = self.underlying_flat(name)?;
        let mut rec = Record::new(TypeId::Message, name);
        rec.underlying = Some(underlying);
        Ok(rec)
    }

    /// `of name`, where name must denote an already defined flat.
    fn underlying_flat(&mut self, context: &str) -> Result<TypeRef, CoreError> {
        let of = self.lx.read_name()?;
        if of != "of" {
            return Err(self.perr("'of' expected"));
        }
        let fname = self.lx.read_name()?;
        self.st
            .find(&fname)
            .filter(|&t| self.st.ty(t).id == TypeId::Flat)
            .ok_or_else(|| self.perr(format!("{context}: flat definition {fname} not found")))
    }

    // ---- types --------------------------------------------------------

    /// A type, possibly wrapped by stacked `[n]` array suffixes.
    /// `ctx` is the kind of the enclosing construct; a `flat` may not
    /// embed itself by value, so a direct self-reference is fatal here
    /// (indirect by-value cycles surface in the layout engine).
    fn type_expr(&mut self, ctx: TypeId) -> Result<TypeRef, CoreError> {
        let s = self.lx.read_name()?;
        let mut t = match s.as_str() {
            "optional" => self.opt_or_vec(TypeId::Optional)?,
            "vector" => self.opt_or_vec(TypeId::Vector)?,
            "fixed_vector" => self.varray()?,
            name => match self.st.find(name) {
                Some(t) => {
                    if ctx == TypeId::Flat && self.current == Some(t) {
                        return Err(self.perr(format!("recursive definition of flat: {name}")));
                    }
                    t
                }
                None => self.st.intern_placeholder(name),
            },
        };

        while self.lx.eat('[')? {
            let count = self.array_count()?;
            let (elem_size, elem_align) = {
                let d = self.st.ty(t);
                (d.size, d.align)
            };
            let mut desc = TypeDesc::parameterized(TypeId::Array, t);
            desc.count = count;
            desc.size = count * elem_size;
            desc.align = elem_align;
            t = self.st.alloc_type(desc);
        }
        Ok(t)
    }

    /// `optional<T>` or `vector<T>`. An optional whose inner type can
    /// already represent absence collapses to the inner type.
    fn opt_or_vec(&mut self, id: TypeId) -> Result<TypeRef, CoreError> {
        self.lx.expect_char('<', "after 'vector' or 'optional'")?;
        let t = self.type_expr(id)?;
        self.lx.expect_char('>', "after 'vector' or 'optional'")?;

        if id == TypeId::Optional {
            match self.st.ty(t).id {
                TypeId::Optional | TypeId::Variant | TypeId::Vector | TypeId::String => {
                    return Ok(t);
                }
                TypeId::Flat => self.mark_used_as_optional(t),
                _ => {}
            }
        }
        if id == TypeId::Vector && self.st.ty(t).id == TypeId::Variant {
            return Err(self.perr("vector of variant is not supported"));
        }

        let mut desc = TypeDesc::parameterized(id, t);
        match id {
            TypeId::Vector => {
                desc.size = VECTOR_HEADER_SIZE as i32;
                desc.align = 2;
            }
            TypeId::Optional => {
                let inner = self.st.ty(t);
                desc.size = inner.align + inner.size;
                desc.align = inner.align;
            }
            _ => {}
        }
        Ok(self.st.alloc_type(desc))
    }

    /// `fixed_vector<T, n>`.
    fn varray(&mut self) -> Result<TypeRef, CoreError> {
        self.lx.expect_char('<', "after 'fixed_vector'")?;
        let t = self.type_expr(TypeId::Varray)?;
        self.lx.expect_char(',', "after type in fixed_vector")?;
        let count = self.number()?;
        if count < 1 {
            return Err(self.perr(format!(
                "fixed_vector needs a positive number of elements, got {count}"
            )));
        }
        self.lx.expect_char('>', "after size in fixed_vector")?;
        if self.st.ty(t).id == TypeId::Variant {
            return Err(self.perr("fixed_vector of variant is not supported"));
        }

        let mut desc = TypeDesc::parameterized(TypeId::Varray, t);
        desc.count = count;
        let inner = self.st.ty(t);
        // the used-count needs a 2-byte slot even before 1-aligned elements
        let slot = inner.align.max(2);
        desc.size = slot + count * inner.size;
        desc.align = slot;
        Ok(self.st.alloc_type(desc))
    }

    fn mark_used_as_optional(&mut self, t: TypeRef) {
        if let Some(rid) = self.st.record_of(t) {
            self.st.record_mut(rid).used_as_optional = true;
        }
    }

    /// An integer literal or a qualified enumerator `E::member`; no
    /// other expressions. The enumerator must resolve at this point in
    /// the stream.
    fn number(&mut self) -> Result<i32, CoreError> {
        let c = self.lx.peek_char()?;
        if c.is_ascii_digit() {
            return self.lx.read_number();
        }
        if c.is_ascii_alphabetic() || c == '_' {
            let qualifier = self.lx.read_name()?;
            self.lx.expect_char(':', "in qualified enumerator")?;
            self.lx.expect_char(':', "in qualified enumerator")?;
            let member = self.lx.read_name()?;
            return self.enum_value(&qualifier, &member);
        }
        Err(self.perr("number expected"))
    }

    fn enum_value(&mut self, qualifier: &str, member: &str) -> Result<i32, CoreError> {
        let t = self
            .st
            .find(qualifier)
            .ok_or_else(|| self.perr(format!("undefined enum (qualifier not found): {qualifier}")))?;
        let rid = self
            .st
            .record_of(t)
            .ok_or_else(|| self.perr(format!("undefined enum (qualifier not defined): {qualifier}")))?;
        let rec = self.st.record(rid);
        rec.find_field(member)
            .map(|i| rec.fields[i].value)
            .ok_or_else(|| self.perr(format!("undefined enum member: {qualifier}::{member}")))
    }

    /// `n ]` with n ≥ 1.
    fn array_count(&mut self) -> Result<i32, CoreError> {
        let n = self.number()?;
        if n < 1 {
            return Err(self.perr(format!("non-positive array count {n}")));
        }
        self.lx.expect_char(']', "after array count")?;
        Ok(n)
    }

    // ---- deferred normalization --------------------------------------

    /// Re-apply the optional-collapse rules, the `used-as-optional`
    /// marking, and the vector-of-variant rejection to types whose
    /// inner name was still a placeholder when the field was parsed.
    fn resolve_deferred(&mut self) -> Result<(), CoreError> {
        for ri in 0..self.records.len() {
            let rid = self.records[ri];
            for fi in 0..self.st.record(rid).fields.len() {
                if let Some(t) = self.st.record(rid).fields[fi].ty {
                    let nt = self.normalize(t)?;
                    self.st.record_mut(rid).fields[fi].ty = Some(nt);
                }
            }
        }
        Ok(())
    }

    fn normalize(&mut self, t: TypeRef) -> Result<TypeRef, CoreError> {
        match self.st.ty(t).id {
            TypeId::Optional => {
                let elem = self.st.ty(t).elem.expect("optional has an element");
                let inner = self.normalize(elem)?;
                self.st.ty_mut(t).elem = Some(inner);
                match self.st.ty(inner).id {
                    TypeId::Optional | TypeId::Variant | TypeId::Vector | TypeId::String => {
                        Ok(inner)
                    }
                    TypeId::Flat => {
                        self.mark_used_as_optional(inner);
                        Ok(t)
                    }
                    _ => Ok(t),
                }
            }
            TypeId::Vector | TypeId::Varray => {
                let elem = self.st.ty(t).elem.expect("vector has an element");
                let inner = self.normalize(elem)?;
                self.st.ty_mut(t).elem = Some(inner);
                if self.st.ty(inner).id == TypeId::Variant {
                    let what = if self.st.ty(t).id == TypeId::Vector {
                        "vector"
                    } else {
                        "fixed_vector"
                    };
                    return Err(CoreError::Semantic(format!(
                        "{what} of variant is not supported"
                    )));
                }
                Ok(t)
            }
            TypeId::Array => {
                let elem = self.st.ty(t).elem.expect("array has an element");
                let inner = self.normalize(elem)?;
                self.st.ty_mut(t).elem = Some(inner);
                Ok(t)
            }
            _ => Ok(t),
        }
    }
}

fn view_field(fld: &Field) -> Field {
    let mut vf = Field::new(&fld.name, fld.ty.expect("view source field has a type"));
    vf.index = fld.index;
    vf.status = fld.status;
    vf
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field_type(schema: &Schema, rec: usize, fld: usize) -> TypeRef {
        let rid = schema.records[rec];
        schema.table.record(rid).fields[fld]
            .ty
            .expect("field has a type")
    }

    #[test]
    fn parses_a_simple_flat() {
        let s = parse("H : flat { n : int32 }  end").expect("parse");
        assert_eq!(s.records.len(), 1);
        let rec = s.table.record(s.records[0]);
        assert_eq!(rec.id, TypeId::Flat);
        assert_eq!(rec.name, "H");
        assert_eq!(rec.fields.len(), 1);
        let t = field_type(&s, 0, 0);
        assert_eq!(s.table.ty(t).id, TypeId::Int32);
    }

    #[test]
    fn end_of_input_terminates_like_end() {
        let s = parse("H : flat { n : int32 }").expect("parse without sentinel");
        assert_eq!(s.records.len(), 1);
    }

    #[test]
    fn resolves_forward_references() {
        let s = parse("Var : variant { g : G }  G : flat { n : int32 }").expect("parse");
        let t = field_type(&s, 0, 0);
        assert_eq!(s.table.ty(t).id, TypeId::Flat);
        assert_eq!(s.table.ty(t).name, "G");
    }

    #[test]
    fn accepts_forward_references_inside_flats() {
        // declaration order does not matter while the by-value graph
        // stays acyclic
        let s = parse("F : flat { g : G }  G : flat { n : int32 }").expect("parse");
        let t = field_type(&s, 0, 0);
        assert_eq!(s.table.ty(t).id, TypeId::Flat);
        assert_eq!(s.table.ty(t).name, "G");
    }

    #[test]
    fn flats_may_embed_previously_defined_flats() {
        let s = parse("G : flat { n : int32 }  F : flat { g : G }").expect("parse");
        let t = field_type(&s, 1, 0);
        assert_eq!(s.table.ty(t).name, "G");
    }

    #[test]
    fn rejects_recursive_flats() {
        let err = parse("F : flat { f : F }").unwrap_err();
        assert!(err.to_string().contains("recursive definition of flat"));
    }

    #[test]
    fn rejects_unresolved_placeholders_at_end() {
        let err = parse("V : variant { g : G }").unwrap_err();
        assert!(err.to_string().contains("undefined"));
    }

    #[test]
    fn collapses_redundant_optionals() {
        let s = parse(
            "F : flat { a : optional<optional<int32>> b : optional<string> \
             c : optional<vector<int32>> }",
        )
        .expect("parse");
        assert_eq!(s.table.ty(field_type(&s, 0, 0)).id, TypeId::Optional);
        let inner = s.table.ty(field_type(&s, 0, 0)).elem.expect("inner");
        assert_eq!(s.table.ty(inner).id, TypeId::Int32);
        assert_eq!(s.table.ty(field_type(&s, 0, 1)).id, TypeId::String);
        assert_eq!(s.table.ty(field_type(&s, 0, 2)).id, TypeId::Vector);
    }

    #[test]
    fn collapses_optional_of_variant() {
        let s = parse("V : variant { i : int32 }  F : flat { v : optional<V> }").expect("parse");
        assert_eq!(s.table.ty(field_type(&s, 1, 0)).id, TypeId::Variant);
    }

    #[test]
    fn collapses_deferred_optional_of_variant() {
        // V is still a placeholder when the optional is parsed
        let s = parse("W : variant { v : optional<V> i : int32 }  V : variant { n : int32 }")
            .expect("parse");
        assert_eq!(s.table.ty(field_type(&s, 0, 0)).id, TypeId::Variant);
    }

    #[test]
    fn marks_flats_used_as_optional() {
        let s = parse("G : flat { n : int32 }  F : flat { g : optional<G> }").expect("parse");
        let rid = s.records[0];
        assert!(s.table.record(rid).used_as_optional);
        let t = field_type(&s, 1, 0);
        assert_eq!(s.table.ty(t).id, TypeId::Optional);
    }

    #[test]
    fn marks_deferred_used_as_optional() {
        let s = parse("W : variant { g : optional<G> }  G : flat { n : int32 }").expect("parse");
        let g = s.records[1];
        assert!(s.table.record(g).used_as_optional);
    }

    #[test]
    fn rejects_vector_of_variant() {
        let err = parse("V : variant { i : int32 }  F : flat { v : vector<V> }").unwrap_err();
        assert!(err.to_string().contains("vector of variant"));
    }

    #[test]
    fn rejects_deferred_vector_of_variant() {
        let err =
            parse("W : variant { v : vector<V> }  V : variant { i : int32 }").unwrap_err();
        assert!(err.to_string().contains("vector of variant"));
    }

    #[test]
    fn rejects_fixed_vector_of_variant() {
        let err =
            parse("V : variant { i : int32 }  F : flat { v : fixed_vector<V, 3> }").unwrap_err();
        assert!(err.to_string().contains("fixed_vector of variant"));
    }

    #[test]
    fn stacks_array_suffixes() {
        let s = parse("F : flat { m : int32[10][20] }").expect("parse");
        let outer = field_type(&s, 0, 0);
        assert_eq!(s.table.ty(outer).id, TypeId::Array);
        assert_eq!(s.table.ty(outer).count, 20);
        let inner = s.table.ty(outer).elem.expect("inner");
        assert_eq!(s.table.ty(inner).id, TypeId::Array);
        assert_eq!(s.table.ty(inner).count, 10);
    }

    #[test]
    fn accepts_enumerator_array_counts() {
        let s = parse("E : enum { small : 2 big : 5 }  F : flat { xs : int32[E::big] }")
            .expect("parse");
        let t = field_type(&s, 1, 0);
        assert_eq!(s.table.ty(t).count, 5);
    }

    #[test]
    fn rejects_unknown_enum_qualifiers_and_members() {
        let err = parse("F : flat { xs : int32[Nope::big] }").unwrap_err();
        assert!(err.to_string().contains("qualifier not found"));

        let err = parse("E : enum { a }  F : flat { xs : int32[E::b] }").unwrap_err();
        assert!(err.to_string().contains("undefined enum member"));
    }

    #[test]
    fn rejects_non_positive_array_counts() {
        let err = parse("F : flat { xs : int32[0] }").unwrap_err();
        assert!(err.to_string().contains("non-positive array count"));
    }

    #[test]
    fn enumerators_default_to_previous_plus_one() {
        let s = parse("E : enum { a : 7 b ; c d : 2 e }").expect("parse");
        let rec = s.table.record(s.records[0]);
        let values: Vec<i32> = rec.fields.iter().map(|f| f.value).collect();
        assert_eq!(values, vec![7, 8, 9, 2, 3]);
    }

    #[test]
    fn rejects_duplicate_fields() {
        let err = parse("F : flat { n : int32 n : int64 }").unwrap_err();
        assert!(err.to_string().contains("member defined twice"));
    }

    #[test]
    fn rejects_duplicate_top_level_names() {
        let err = parse("F : flat { n : int32 }  F : flat { m : int32 }").unwrap_err();
        assert!(err.to_string().contains("defined twice"));
    }

    #[test]
    fn deprecate_and_delete_transition_field_status() {
        let s = parse("F : flat { a : int32 b : int64 deprecate a delete b }").expect("parse");
        let rec = s.table.record(s.records[0]);
        assert_eq!(rec.fields.len(), 4, "sentinels keep ordinal space");
        assert_eq!(rec.fields[0].status, Status::Deprecated);
        assert_eq!(rec.fields[1].status, Status::Deleted);
        assert_eq!(rec.fields[2].status, Status::Deprecating);
        assert_eq!(rec.fields[3].status, Status::Deleting);
        assert_eq!(rec.fields[3].index, 3);
    }

    #[test]
    fn deleted_names_stay_reserved() {
        let err = parse("F : flat { a : int32 delete a a : int64 }").unwrap_err();
        assert!(err.to_string().contains("member defined twice"));
    }

    #[test]
    fn deprecate_of_a_missing_field_fails() {
        let err = parse("F : flat { a : int32 deprecate b }").unwrap_err();
        assert!(err.to_string().contains("deprecated field not found"));
    }

    #[test]
    fn parses_partial_views_with_underlying_ordinals() {
        let s = parse(
            "F : flat { a : int32 b : int64 c : char }  V : view of F { c a }",
        )
        .expect("parse");
        let view = s.table.record(s.records[1]);
        assert_eq!(view.id, TypeId::View);
        assert_eq!(view.fields.len(), 2);
        assert_eq!(view.fields[0].name, "c");
        assert_eq!(view.fields[0].index, 2);
        assert_eq!(view.fields[1].name, "a");
        assert_eq!(view.fields[1].index, 0);
    }

    #[test]
    fn complete_views_materialize_every_field() {
        let s = parse("F : flat { a : int32 b : int64 }  V : view of F").expect("parse");
        let view = s.table.record(s.records[1]);
        assert_eq!(view.fields.len(), 2);
        assert_eq!(view.fields[1].index, 1);
    }

    #[test]
    fn views_reject_unknown_members() {
        let err = parse("F : flat { a : int32 }  V : view of F { b }").unwrap_err();
        assert!(err.to_string().contains("is not a member of"));
    }

    #[test]
    fn views_and_messages_require_a_defined_flat() {
        let err = parse("V : view of Missing").unwrap_err();
        assert!(err.to_string().contains("not found"));

        let err = parse("E : enum { a }  M : message of E").unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn parses_messages() {
        let s = parse("H : flat { n : int32 }  M : message of H").expect("parse");
        let msg = s.table.record(s.records[1]);
        assert_eq!(msg.id, TypeId::Message);
        let u = msg.underlying.expect("underlying");
        assert_eq!(s.table.ty(u).name, "H");
    }

    #[test]
    fn terminators_are_interchangeable() {
        let s = parse("F : flat { a : int32 ; b : int64 , c : char }").expect("parse");
        assert_eq!(s.table.record(s.records[0]).fields.len(), 3);
    }

    #[test]
    fn comments_are_whitespace() {
        let s = parse(
            "// a flat\nF : flat { /* inline */ a : int32 } // done",
        )
        .expect("parse");
        assert_eq!(s.table.record(s.records[0]).fields.len(), 1);
    }

    #[test]
    fn missing_punctuation_is_fatal() {
        assert!(parse("F flat { a : int32 }").is_err());
        assert!(parse("F : flat  a : int32 }").is_err());
        assert!(parse("F : flat { a : vector int32> }").is_err());
        assert!(parse("F : flat { a : vector<int32 }").is_err());
        assert!(parse("V : view F").is_err());
    }

    #[test]
    fn precomputes_parameterized_sizes() {
        let s = parse(
            "F : flat { s : string v : vector<int32> o : optional<int32> \
             fv : fixed_vector<int32, 4> ar : int32[3] }",
        )
        .expect("parse");
        assert_eq!(s.table.ty(field_type(&s, 0, 0)).size, 4);
        assert_eq!(s.table.ty(field_type(&s, 0, 1)).size, 4);
        assert_eq!(s.table.ty(field_type(&s, 0, 2)).size, 8);
        assert_eq!(s.table.ty(field_type(&s, 0, 3)).size, 4 + 16);
        assert_eq!(s.table.ty(field_type(&s, 0, 4)).size, 12);
    }
}
