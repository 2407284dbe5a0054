//! Pipeline orchestration: parse the schema, run the layout engine,
//! and hand the resolved records to the emitters selected by the
//! driver action.

use crate::codegen_direct::{emit_direct, emit_struct};
use crate::codegen_view::emit_view;
use crate::error::CoreError;
use crate::layout::layout_schema;
use crate::parser::{parse, Schema};
use crate::printer;
use crate::types::TypeId;

/// Driver actions. `Packed` and `PackedView` run the packed layout;
/// `Debug` dumps the parse-tree re-print, object map, direct
/// accessors, and view accessors for every record; `ObjMap` prints the
/// object maps alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Debug,
    Direct,
    Packed,
    View,
    PackedView,
    ObjMap,
}

impl Action {
    pub fn packed(self) -> bool {
        matches!(self, Action::Packed | Action::PackedView)
    }
}

/// Compile a schema into one host-language source artifact (or the
/// requested textual dump). Enumerations contribute values during
/// parsing but are not re-emitted.
pub fn compile(source: &str, action: Action) -> Result<String, CoreError> {
    let Schema { mut table, records } = parse(source)?;
    layout_schema(&mut table, &records, action.packed())?;

    let mut out = String::new();
    match action {
        Action::Debug => {
            for &rid in &records {
                if table.record(rid).id == TypeId::Enumeration {
                    continue;
                }
                out.push_str(&printer::print_record(&table, rid));
                if let Some(map) = &table.record(rid).object_map {
                    out.push_str(&map.to_text());
                }
                emit_direct(&mut out, &table, rid)?;
                emit_view(&mut out, &table, rid)?;
            }
        }
        Action::Direct | Action::Packed => {
            out.push_str("#include<cstdint>\n");
            out.push_str("namespace Flats {\n");
            for &rid in &records {
                if table.record(rid).id == TypeId::Enumeration {
                    continue;
                }
                emit_struct(&mut out, &table, rid)?;
                emit_direct(&mut out, &table, rid)?;
            }
            out.push_str("} // namespace Flats\n");
        }
        Action::View | Action::PackedView => {
            // assumes the struct layout has been emitted elsewhere
            out.push_str("namespace Flats {\n");
            for &rid in &records {
                if table.record(rid).id == TypeId::Enumeration {
                    continue;
                }
                emit_view(&mut out, &table, rid)?;
            }
            out.push_str("} // namespace Flats\n");
        }
        Action::ObjMap => {
            for &rid in &records {
                if table.record(rid).id == TypeId::Enumeration {
                    continue;
                }
                if let Some(map) = &table.record(rid).object_map {
                    out.push_str(&map.to_text());
                }
            }
        }
    }
    Ok(out)
}
