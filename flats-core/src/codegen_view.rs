//! View accessor generation: a read-only projection over a subset of
//! a record's fields, addressed through an `Offsets` table indexed by
//! the underlying field ordinals. Views do not allocate.

use crate::error::CoreError;
use crate::printer::cpp_type;
use crate::symbol_table::SymbolTable;
use crate::types::{RecordId, TypeId};

pub fn emit_view(out: &mut String, st: &SymbolTable, rid: RecordId) -> Result<(), CoreError> {
    let rec = st.record(rid);
    if matches!(rec.id, TypeId::Variant | TypeId::Enumeration | TypeId::Message) {
        return Ok(());
    }
    let n = &rec.name;

    out.push_str("\n\n// view accessors:\n");
    out.push_str(&format!(" struct {n}_view {{\n"));
    out.push_str("   const Offsets m;\n");
    out.push_str("   Byte* buff;\n");
    out.push_str(&format!(
        "   {n}_view(const Offsets& mm, Byte* pp) :m{{mm}}, buff{{pp}} {{}}\n"
    ));

    for f in &rec.fields {
        if f.status.is_elided() {
            continue;
        }
        let Some(t) = f.ty else { continue };
        let cpp = cpp_type(st, t)?;
        out.push_str(&format!(
            "   {cpp}& {}() {{ return *reinterpret_cast<{cpp}*>(buff+m[{}]); }}\n",
            f.name, f.index
        ));
    }
    out.push_str("};\n\n");
    Ok(())
}
