//! Message envelope generation: the top-level wrapper placing a flat
//! and its tail into a caller-provided buffer, plus the free-standing
//! placement helpers. The version word and the allocator live in the
//! envelope, not the flat, because they are shared by everything in
//! the message; the tail budget is a construction-time parameter.

use crate::codegen_direct::{record_needs_allocator, DEFAULT_INIT};
use crate::error::CoreError;
use crate::symbol_table::SymbolTable;
use crate::types::RecordId;

pub fn emit_message(out: &mut String, st: &SymbolTable, rid: RecordId) -> Result<(), CoreError> {
    let rec = st.record(rid);
    let mn = &rec.name;
    let u = rec
        .underlying
        .ok_or_else(|| CoreError::Semantic(format!("message {mn} has no underlying flat")))?;
    let urid = st
        .record_of(u)
        .ok_or_else(|| CoreError::Semantic(format!("message {mn} has no underlying flat")))?;
    let flt = st.record(urid);
    let fname = &flt.name;
    let allo = record_needs_allocator(st, urid);

    out.push_str(&format!("struct {mn} {{\n"));
    out.push_str(&format!("   using Flat = {fname};\n"));
    out.push_str(&format!(
        "   Version v = {{ {} }}; // version is generated\n",
        flt.fields.len()
    ));

    if allo {
        out.push_str("   Allocator alloc;\n");
        out.push_str(&format!("   {mn}(int buffer_size, int tail_size)\n"));
        out.push_str("      :alloc{ size_of<Flat>(),size_of<Flat>() + tail_size }\n");
        out.push_str("      { expect([&] {return static_cast<int>(sizeof(*this)) + alloc.max <=buffer_size; }, Error_code::small_buffer);\n");
        if DEFAULT_INIT {
            out.push_str("        Byte* pp = reinterpret_cast<Byte*>(flat());\n");
            out.push_str("        for (int i = 0; i<size_of<Flat>(); ++i) pp[i]=Byte{0};\n");
            out.push_str("        Byte* p = tail();\n");
            out.push_str("        for (int i = 0; i<tail_size; ++i) p[i]=Byte{0};\n");
        }
        out.push_str("      }\n");

        out.push_str(&format!("   {mn}(Reader, int buffer_size)\n"));
        out.push_str("      { expect([&] {return static_cast<int>(sizeof(*this)) + alloc.max <=buffer_size; }, Error_code::small_buffer); }\n");

        out.push_str(
            "   Byte* tail() { return reinterpret_cast<Byte*>(flat()) + sizeof(Flat); }\n",
        );
        out.push_str("   int current_size() const { return sizeof(*this) + alloc.next; }\n");
        out.push_str("   int current_capacity() const { return alloc.max - alloc.next; }\n");
        out.push_str(&format!(
            "   {fname}_direct direct() {{ return {{ flat(), &alloc }}; }}\n"
        ));
    } else {
        out.push_str(&format!("   {mn}(int buffer_size, int)\n"));
        out.push_str("      { expect([&] {return static_cast<int>(sizeof(*this)) + static_cast<int>(sizeof(Flat)) <= buffer_size; }, Error_code::small_buffer); }\n");

        out.push_str(&format!("   {mn}(Reader, int buffer_size)\n"));
        out.push_str("      { expect([&] {return static_cast<int>(sizeof(*this)) + static_cast<int>(sizeof(Flat)) <= buffer_size; }, Error_code::small_buffer); }\n");

        out.push_str("   int current_size() const { return sizeof(*this)+sizeof(Flat); }\n");
        out.push_str("   int current_capacity() const { return 0; }\n");
        out.push_str(&format!(
            "   {fname}_direct direct() {{ return {{ flat() }}; }}\n"
        ));
    }

    out.push_str(&format!(
        "   {fname}* flat() {{ return reinterpret_cast<{fname}*>(reinterpret_cast<Byte*>(this) + sizeof(*this)); }}\n"
    ));
    out.push_str("   int version() const { return v.v; }\n");
    out.push_str("   int size() const { return current_size()+current_capacity(); }\n");

    out.push_str(&format!("   {mn}* clone(Byte* p) const {{\n"));
    out.push_str("      auto pt = reinterpret_cast<const Byte*>(this);\n");
    out.push_str("      for (int i = 0; i<size(); ++i) p[i]=pt[i];\n");
    out.push_str(&format!("      return reinterpret_cast<{mn}*>(p);\n"));
    out.push_str("   }\n");

    // copy constructor for placement only
    out.push_str(&format!("      {mn}(const {mn}& arg)\n"));
    out.push_str("   {\n");
    out.push_str("      auto p = reinterpret_cast<Byte*>(this);\n");
    out.push_str("      auto pt = reinterpret_cast<const Byte*>(&arg);\n");
    out.push_str("      for (int i = 0; i<size(); ++i) p[i]=pt[i];\n");
    out.push_str("   }\n");

    out.push_str("};\n\n");

    // placement helper functions:
    out.push_str(&format!(
        "inline {mn}* place_{mn}(Byte* buf, int size_of_buffer, int size_of_tail)"
    ));
    out.push_str(&format!(
        "   {{ return new(buf) {mn} {{ size_of_buffer,size_of_tail }}; }}\n\n"
    ));

    out.push_str(&format!(
        "inline {mn}* place_{mn}_reader(Byte* buf, int size_of_buffer, int )"
    ));
    out.push_str(&format!(
        "   {{ return new(buf) {mn} {{ Reader{{}}, size_of_buffer}}; }}\n\n"
    ));

    out.push_str(&format!(
        "inline {mn}* place_{mn}_writer(Byte* buf, int size_of_buffer, int size_of_tail)"
    ));
    out.push_str(&format!(
        "   {{ return new(buf) {mn} {{ size_of_buffer,size_of_tail }}; }}\n\n"
    ));

    Ok(())
}
