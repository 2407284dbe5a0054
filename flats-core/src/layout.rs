//! The layout engine: field offsets and sizes, record footprints, the
//! variable-part cursor, and the printable object map.
//!
//! Offsets honor alignment unless the packed flag is set: the cursor is
//! rounded up to the field's alignment, recorded, then advanced by the
//! field's size. A record's alignment is the maximum of its field
//! alignments and its fixed size is the cursor rounded up to that. For
//! variants the cursor never advances: every alternative shares the
//! slot after the `{utag, pos}` header, and the whole slot is a
//! constant 8 bytes so layout never depends on the alternatives.
//! Parameterized sizes are re-derived here, bottom-up, so forward
//! references resolved after the field was parsed still lay out
//! correctly.

use std::collections::HashSet;

use crate::error::CoreError;
use crate::printer;
use crate::symbol_table::SymbolTable;
use crate::types::{RecordId, TypeId, TypeRef, VariablePart, DEFAULT_TAIL_BUDGET};
use flats_rt::{VARIANT_SLOT_ALIGN, VARIANT_SLOT_SIZE, VECTOR_HEADER_SIZE};

/// Inline bytes of the `{utag, pos}` variant header preceding the
/// shared alternative slot.
const VARIANT_HEADER: i32 = 4;

/// One printable row of a record's layout.
#[derive(Debug, Clone)]
pub struct FieldEntry {
    /// Pre-elision ordinal, so consumers can tell where deleted fields
    /// were.
    pub index: i32,
    pub offset: i32,
    pub size: i32,
    pub type_id: TypeId,
    pub count: i32,
    pub name: String,
    pub type_rep: String,
}

/// The external layout artifact: header plus one entry per non-elided
/// field. `version` counts every declared field, elided ones included.
#[derive(Debug, Clone)]
pub struct ObjectMap {
    pub name: String,
    pub field_count: i32,
    pub version: i32,
    pub fields: Vec<FieldEntry>,
}

impl ObjectMap {
    pub fn to_text(&self) -> String {
        let mut out = format!("{} {} {}\n", self.name, self.field_count, self.version);
        for f in &self.fields {
            out.push_str(&format!(
                "{{{}, {}, {}, {}, {}, {}, {}}}\n",
                f.index,
                f.offset,
                f.size,
                f.type_id.name(),
                f.count,
                f.name,
                f.type_rep
            ));
        }
        out
    }
}

fn round_up(x: i32, align: i32) -> i32 {
    if align <= 1 {
        x
    } else {
        (x + align - 1) / align * align
    }
}

/// Lay out every record of the schema, in declaration order. Records
/// reached through by-value fields are laid out on demand first.
pub fn layout_schema(
    st: &mut SymbolTable,
    records: &[RecordId],
    packed: bool,
) -> Result<(), CoreError> {
    for &rid in records {
        let mut visiting = HashSet::new();
        ensure_layout(st, rid, packed, &mut visiting)?;
    }
    Ok(())
}

fn ensure_layout(
    st: &mut SymbolTable,
    rid: RecordId,
    packed: bool,
    visiting: &mut HashSet<usize>,
) -> Result<(), CoreError> {
    if st.record(rid).object_map.is_some() {
        return Ok(());
    }

    match st.record(rid).id {
        TypeId::Enumeration => {
            let rec = st.record_mut(rid);
            let version = rec.fields.len() as i32;
            let name = rec.name.clone();
            rec.object_map = Some(ObjectMap {
                name,
                field_count: 0,
                version,
                fields: Vec::new(),
            });
            return Ok(());
        }
        TypeId::Message => {
            // the envelope's layout is the underlying flat's
            if let Some(u) = st.record(rid).underlying {
                if let Some(urid) = st.record_of(u) {
                    ensure_layout(st, urid, packed, visiting)?;
                }
            }
            let rec = st.record_mut(rid);
            let name = rec.name.clone();
            rec.object_map = Some(ObjectMap {
                name,
                field_count: 0,
                version: 0,
                fields: Vec::new(),
            });
            return Ok(());
        }
        _ => {}
    }

    if !visiting.insert(rid.0) {
        return Err(CoreError::Semantic(format!(
            "recursive by-value layout in {}",
            st.record(rid).name
        )));
    }

    let is_variant = st.record(rid).id == TypeId::Variant;
    let nfields = st.record(rid).fields.len();
    let mut position: i32 = if is_variant { VARIANT_HEADER } else { 0 };
    let mut max_align = 1i32;
    let mut entries = Vec::new();
    let mut count = 0i32;

    for i in 0..nfields {
        let (status, ty, index, name) = {
            let f = &st.record(rid).fields[i];
            (f.status, f.ty, f.index, f.name.clone())
        };
        if status.is_elided() {
            continue;
        }
        let Some(tr) = ty else { continue };

        let (size, align) = type_layout(st, tr, packed, visiting)?;
        let offset = if is_variant || packed {
            position
        } else {
            round_up(position, align)
        };
        if !is_variant {
            position = offset + size;
        }
        max_align = max_align.max(align);

        {
            let f = &mut st.record_mut(rid).fields[i];
            f.offset = offset;
            f.size = size;
        }
        let (type_id, tcount) = {
            let d = st.ty(tr);
            (d.id, d.count)
        };
        entries.push(FieldEntry {
            index,
            offset,
            size,
            type_id,
            count: tcount,
            name,
            type_rep: printer::type_rep(st, tr),
        });
        count += 1;
    }

    let (fixed_size, align) = if is_variant {
        (VARIANT_SLOT_SIZE as i32, VARIANT_SLOT_ALIGN as i32)
    } else if packed {
        (position, 1)
    } else {
        (round_up(position, max_align), max_align)
    };

    // publish onto the named descriptor so embedding records see it
    if let Some(t) = st.record(rid).self_type {
        let d = st.ty_mut(t);
        d.size = fixed_size;
        d.align = align;
    }

    let name = st.record(rid).name.clone();
    let rec = st.record_mut(rid);
    rec.var = VariablePart {
        starting: fixed_size,
        next: fixed_size,
        max: fixed_size + DEFAULT_TAIL_BUDGET,
    };
    rec.packed = packed;
    rec.object_map = Some(ObjectMap {
        name,
        field_count: count,
        version: nfields as i32,
        fields: entries,
    });

    visiting.remove(&rid.0);
    Ok(())
}

/// Size and alignment of a field type, re-derived bottom-up. Updates
/// the descriptor in passing so emitters and later fields agree.
fn type_layout(
    st: &mut SymbolTable,
    t: TypeRef,
    packed: bool,
    visiting: &mut HashSet<usize>,
) -> Result<(i32, i32), CoreError> {
    let id = st.ty(t).id;
    let (size, align) = match id {
        TypeId::Flat => {
            let rid = st.record_of(t).ok_or_else(|| {
                CoreError::Semantic(format!("{} not defined after end of parse", st.ty(t).name))
            })?;
            ensure_layout(st, rid, packed, visiting)?;
            let d = st.ty(t);
            (d.size, d.align)
        }
        TypeId::Variant => (VARIANT_SLOT_SIZE as i32, VARIANT_SLOT_ALIGN as i32),
        // unscoped host enums are int-sized
        TypeId::Enumeration => (4, 4),
        TypeId::String | TypeId::Vector => (VECTOR_HEADER_SIZE as i32, 2),
        TypeId::Optional => {
            let elem = elem_of(st, t)?;
            let (es, ea) = type_layout(st, elem, packed, visiting)?;
            (ea + es, ea)
        }
        TypeId::Array => {
            let elem = elem_of(st, t)?;
            let (es, ea) = type_layout(st, elem, packed, visiting)?;
            (st.ty(t).count * es, ea)
        }
        TypeId::Varray => {
            let elem = elem_of(st, t)?;
            let (es, ea) = type_layout(st, elem, packed, visiting)?;
            // the used-count needs a 2-byte slot even before 1-aligned
            // elements
            let slot = ea.max(2);
            (slot + st.ty(t).count * es, slot)
        }
        TypeId::View | TypeId::Message => {
            return Err(CoreError::Semantic(format!(
                "cannot embed a {} by value",
                id.name()
            )));
        }
        TypeId::Undefined | TypeId::Bad => {
            return Err(CoreError::Semantic(format!(
                "{} not defined after end of parse",
                st.ty(t).name
            )));
        }
        _ => {
            let d = st.ty(t);
            (d.size, d.align)
        }
    };

    let d = st.ty_mut(t);
    d.size = size;
    d.align = align;
    Ok((size, align))
}

fn elem_of(st: &SymbolTable, t: TypeRef) -> Result<TypeRef, CoreError> {
    st.ty(t)
        .elem
        .ok_or_else(|| CoreError::Semantic("parameterized type without an element".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;
    use crate::types::Status;

    fn laid_out(source: &str, packed: bool) -> (SymbolTable, Vec<RecordId>) {
        let s = parse(source).expect("parse");
        let mut table = s.table;
        layout_schema(&mut table, &s.records, packed).expect("layout");
        (table, s.records)
    }

    #[test]
    fn aligns_offsets_and_pads_between_fields() {
        let (st, recs) = laid_out("F : flat { a : int32 b : int64 }", false);
        let rec = st.record(recs[0]);
        assert_eq!(rec.fields[0].offset, 0);
        assert_eq!(rec.fields[1].offset, 8, "int64 is 8-aligned");
        let t = rec.self_type.expect("self type");
        assert_eq!(st.ty(t).size, 16);
        assert_eq!(st.ty(t).align, 8);
    }

    #[test]
    fn packed_layout_drops_the_padding() {
        let (st, recs) = laid_out("F : flat { a : int32 b : int64 }", true);
        let rec = st.record(recs[0]);
        assert_eq!(rec.fields[1].offset, 4);
        assert_eq!(st.ty(rec.self_type.expect("self type")).size, 12);
        assert!(rec.packed);
    }

    #[test]
    fn record_alignment_is_the_field_maximum() {
        let (st, recs) = laid_out("H : flat { n : int32 }", false);
        let t = st.record(recs[0]).self_type.expect("self type");
        assert_eq!(st.ty(t).size, 4);
        assert_eq!(st.ty(t).align, 4);
    }

    #[test]
    fn layout_is_monotone_and_aligned() {
        let (st, recs) = laid_out(
            "F : flat { a : char b : int64 c : int16 d : int32[3] e : string f : float64 }",
            false,
        );
        let map = st.record(recs[0]).object_map.as_ref().expect("map");
        for pair in map.fields.windows(2) {
            assert!(pair[0].offset + pair[0].size <= pair[1].offset);
        }
        for f in &map.fields {
            assert_eq!(f.offset % field_align(&st, recs[0], f.index), 0);
        }
    }

    fn field_align(st: &SymbolTable, rid: RecordId, index: i32) -> i32 {
        let rec = st.record(rid);
        let f = rec.fields.iter().find(|f| f.index == index).expect("field");
        st.ty(f.ty.expect("typed")).align
    }

    #[test]
    fn variants_occupy_a_fixed_slot() {
        let (st, recs) = laid_out(
            "Var : variant { i : int32 s : string }  F : flat { v : Var n : int32 }",
            false,
        );
        let var = st.record(recs[0]);
        let offsets: Vec<i32> = var
            .object_map
            .as_ref()
            .expect("map")
            .fields
            .iter()
            .map(|f| f.offset)
            .collect();
        assert!(offsets.windows(2).all(|w| w[0] == w[1]), "shared slot");

        let vt = var.self_type.expect("self type");
        assert_eq!(st.ty(vt).size, VARIANT_SLOT_SIZE as i32);
        assert_eq!(st.ty(vt).align, VARIANT_SLOT_ALIGN as i32);

        let f = st.record(recs[1]);
        assert_eq!(f.fields[0].offset, 0);
        assert_eq!(f.fields[1].offset, 8);
    }

    #[test]
    fn embedded_flats_use_their_computed_footprint() {
        let (st, recs) = laid_out(
            "G : flat { a : int16 b : int16 }  F : flat { g : G n : int64 }",
            false,
        );
        let f = st.record(recs[1]);
        assert_eq!(f.fields[0].offset, 0);
        assert_eq!(f.fields[0].size, 4);
        assert_eq!(f.fields[1].offset, 8);
    }

    #[test]
    fn forward_referenced_optionals_pick_up_real_sizes() {
        let (st, recs) = laid_out(
            "W : variant { g : optional<G> }  G : flat { a : int64 b : int64 }",
            false,
        );
        let w = st.record(recs[0]);
        // optional<G> = one 8-byte flag slot + 16 bytes of G
        assert_eq!(w.fields[0].size, 24);
    }

    #[test]
    fn by_value_layout_cycles_are_fatal() {
        let err = parse("F : flat { o : optional<G> }  G : flat { o : optional<F> }")
            .and_then(|s| {
                let mut table = s.table;
                layout_schema(&mut table, &s.records, false)
            })
            .unwrap_err();
        assert!(err.to_string().contains("recursive by-value layout"));
    }

    #[test]
    fn object_map_elides_removed_fields_but_keeps_version() {
        let (st, recs) = laid_out(
            "F : flat { a : int32 b : int64 c : char deprecate a delete b }",
            false,
        );
        let rec = st.record(recs[0]);
        let map = rec.object_map.as_ref().expect("map");
        assert_eq!(map.version, 5, "three fields plus two sentinels");
        assert_eq!(map.field_count, 2, "deprecated stays, deleted goes");
        let names: Vec<&str> = map.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["a", "c"]);
        assert_eq!(map.fields[0].index, 0);
        assert_eq!(map.fields[1].index, 2, "pre-elision ordinal");
        assert_eq!(rec.fields[0].status, Status::Deprecated);
    }

    #[test]
    fn deleted_fields_release_their_space() {
        let (st, recs) = laid_out("F : flat { a : int32 b : int32 delete a }", false);
        let map = st.record(recs[0]).object_map.as_ref().expect("map");
        assert_eq!(map.fields[0].name, "b");
        assert_eq!(map.fields[0].offset, 0);
    }

    #[test]
    fn variable_part_starts_at_the_fixed_size() {
        let (st, recs) = laid_out("F : flat { s : string n : int64 }", false);
        let rec = st.record(recs[0]);
        let fixed = st.ty(rec.self_type.expect("self type")).size;
        assert_eq!(rec.var.starting, fixed);
        assert_eq!(rec.var.next, fixed);
        assert_eq!(rec.var.max, fixed + DEFAULT_TAIL_BUDGET);

        let mut var = rec.var;
        let first = var.allocate(16).expect("inside the budget");
        assert_eq!(first, fixed);
        assert!(var.allocate(DEFAULT_TAIL_BUDGET).is_err(), "tail too big");
    }

    #[test]
    fn preset_scalars_use_their_table_footprint() {
        let (st, recs) = laid_out("F : flat { ts : TimeStamp n : int32 }", false);
        let rec = st.record(recs[0]);
        assert_eq!(rec.fields[0].size, 16);
        assert_eq!(rec.fields[1].offset, 16);
        assert_eq!(st.ty(rec.self_type.expect("self type")).align, 8);
        let map = rec.object_map.as_ref().expect("map");
        assert_eq!(map.fields[0].type_id.name(), "preset");
    }

    #[test]
    fn object_map_prints_header_and_rows() {
        let (st, recs) = laid_out("H : flat { n : int32 s : string }", false);
        let text = st.record(recs[0]).object_map.as_ref().expect("map").to_text();
        assert!(text.starts_with("H 2 2\n"));
        assert!(text.contains("{0, 0, 4, int32, 1, n, int32}\n"));
        assert!(text.contains("{1, 4, 4, string, 1, s, string}\n"));
    }

    #[test]
    fn declaration_order_does_not_change_descriptors() {
        let a = "Var : variant { g : G }  G : flat { n : int32 }  F : flat { g : G }";
        let b = "G : flat { n : int32 }  F : flat { g : G }  Var : variant { g : G }";
        let (st_a, recs_a) = laid_out(a, false);
        let (st_b, recs_b) = laid_out(b, false);

        let map_of = |st: &SymbolTable, recs: &[RecordId], name: &str| {
            recs.iter()
                .map(|&r| st.record(r))
                .find(|r| r.name == name)
                .and_then(|r| r.object_map.as_ref())
                .map(ObjectMap::to_text)
                .expect("map")
        };
        for name in ["Var", "G", "F"] {
            assert_eq!(map_of(&st_a, &recs_a, name), map_of(&st_b, &recs_b, name));
        }
    }

    #[test]
    fn views_lay_out_their_projection() {
        let (st, recs) = laid_out(
            "F : flat { a : int32 b : int64 c : char }  V : view of F { c a }",
            false,
        );
        let map = st.record(recs[1]).object_map.as_ref().expect("map");
        assert_eq!(map.fields.len(), 2);
        assert_eq!(map.fields[0].index, 2, "underlying ordinal");
        assert_eq!(map.fields[0].offset, 0);
        assert_eq!(map.fields[1].index, 0);
    }

    #[test]
    fn messages_defer_to_their_underlying_flat() {
        let (st, recs) = laid_out("H : flat { n : int32 }  M : message of H", false);
        let msg = st.record(recs[1]);
        assert_eq!(msg.object_map.as_ref().expect("map").field_count, 0);
        let h = st.record(recs[0]).self_type.expect("self type");
        assert_eq!(st.ty(h).size, 4);
    }
}
