//! Direct-accessor code generation.
//!
//! For each record this emits the C++ layout struct and a `_direct`
//! facade over (layout pointer, allocator): typed readers per field,
//! placement-constructing writers, variant facades with the
//! `{utag, pos, union}` layout, and an `Optional_X_ref` facade for
//! records that appear as `optional<X>`. The emitted code targets the
//! runtime contract surface (`Allocator`, `Span`, `Span_ref`,
//! `Optional`, `expect`, construction markers).

use std::collections::HashSet;

use crate::codegen_message;
use crate::error::CoreError;
use crate::printer::cpp_type;
use crate::symbol_table::SymbolTable;
use crate::types::{Field, RecordId, TypeId, TypeRef};

// run-time checks for initialization being done can be compiled into
// the facades
pub(crate) const INITIALIZE_CHECK: bool = false;
pub(crate) const DEFAULT_INIT: bool = true;

const PRESENCE_TEST: &str =
    "expect([&] { return is_present(); }, Error_code::optional_not_present);";

// ---------------------------------------------------------------------
// allocator analysis
// ---------------------------------------------------------------------

/// True when a field of this type makes its facade carry the
/// allocator: strings and vectors always, containers and records
/// through their contents, and containers or optionals of records
/// unconditionally (their accessors thread the allocator into the
/// element facade).
pub fn type_needs_allocator(st: &SymbolTable, t: TypeRef) -> bool {
    needs_allocator_ty(st, t, &mut HashSet::new())
}

pub fn record_needs_allocator(st: &SymbolTable, rid: RecordId) -> bool {
    needs_allocator_rec(st, rid, &mut HashSet::new())
}

fn needs_allocator_ty(st: &SymbolTable, t: TypeRef, seen: &mut HashSet<usize>) -> bool {
    match st.ty(t).id {
        TypeId::String | TypeId::Vector => true,
        TypeId::Optional | TypeId::Array | TypeId::Varray => {
            st.ty(t).elem.is_some_and(|e| {
                st.ty(e).id == TypeId::Flat || needs_allocator_ty(st, e, seen)
            })
        }
        TypeId::Flat | TypeId::Variant => st
            .record_of(t)
            .is_some_and(|r| needs_allocator_rec(st, r, seen)),
        _ => false,
    }
}

fn needs_allocator_rec(st: &SymbolTable, rid: RecordId, seen: &mut HashSet<usize>) -> bool {
    if !seen.insert(rid.0) {
        return false;
    }
    st.record(rid)
        .fields
        .iter()
        .any(|f| f.ty.is_some_and(|t| needs_allocator_ty(st, t, seen)))
}

// ---------------------------------------------------------------------
// type spellings for accessors and initializers
// ---------------------------------------------------------------------

fn elem(st: &SymbolTable, t: TypeRef) -> Result<TypeRef, CoreError> {
    st.ty(t)
        .elem
        .ok_or_else(|| CoreError::Semantic("parameterized type without an element".to_string()))
}

/// The reader's return type: spans for containers, references
/// otherwise.
fn accessor_type(st: &SymbolTable, t: TypeRef) -> Result<String, CoreError> {
    Ok(match st.ty(t).id {
        TypeId::String => "Span<char> ".to_string(),
        TypeId::Vector | TypeId::Array | TypeId::Varray => {
            let e = elem(st, t)?;
            let es = cpp_type(st, e)?;
            if st.ty(e).id == TypeId::Flat {
                format!("Span_ref<{es}, {es}_direct> ")
            } else {
                format!("Span<{es}> ")
            }
        }
        _ => format!("{}& ", cpp_type(st, t)?),
    })
}

/// The writer's argument type: strings, initializer lists for
/// containers, the native type otherwise.
fn initializer_type(st: &SymbolTable, t: TypeRef) -> Result<String, CoreError> {
    Ok(match st.ty(t).id {
        TypeId::String => "const std::string& ".to_string(),
        TypeId::Vector | TypeId::Array | TypeId::Varray => {
            let e = elem(st, t)?;
            match st.ty(e).id {
                TypeId::Variant => {
                    return Err(CoreError::Semantic(
                        "vectors and arrays of variants are not supported".to_string(),
                    ));
                }
                TypeId::Optional => {
                    let inner = elem(st, e)?;
                    format!(
                        "std::initializer_list<Optional_init<{}>>",
                        initializer_elem(st, inner)?
                    )
                }
                _ => format!("std::initializer_list<{}>", initializer_elem(st, e)?),
            }
        }
        TypeId::Optional => {
            let e = elem(st, t)?;
            match st.ty(e).id {
                TypeId::Array => format!(
                    "std::initializer_list<{}>",
                    initializer_elem(st, elem(st, e)?)?
                ),
                _ => initializer_type(st, e)?,
            }
        }
        _ => cpp_type(st, t)?,
    })
}

fn initializer_elem(st: &SymbolTable, t: TypeRef) -> Result<String, CoreError> {
    if st.ty(t).id == TypeId::String {
        Ok("std::string".to_string())
    } else {
        initializer_type(st, t)
    }
}

fn icheck(index: i32) -> String {
    if INITIALIZE_CHECK {
        format!("icheck[{index}]=1; ")
    } else {
        String::new()
    }
}

fn allo_infix(st: &SymbolTable, t: TypeRef) -> &'static str {
    if type_needs_allocator(st, t) {
        "allo,"
    } else {
        ""
    }
}

// ---------------------------------------------------------------------
// struct emitter
// ---------------------------------------------------------------------

/// The C++ struct defining the fixed layout of a flat or view.
/// Variants get their layout from the variant facade; enumerations and
/// messages are not aggregates here.
pub fn emit_struct(out: &mut String, st: &SymbolTable, rid: RecordId) -> Result<(), CoreError> {
    let rec = st.record(rid);
    if matches!(rec.id, TypeId::Variant | TypeId::Enumeration | TypeId::Message) {
        return Ok(());
    }
    out.push_str("\n\n// struct (memory layout):\n");
    out.push_str(&format!("struct {} {{\n", rec.name));
    out.push_str(&format!("   {}(){{}}\n", rec.name));
    for f in &rec.fields {
        if f.status.is_elided() {
            continue;
        }
        let Some(t) = f.ty else { continue };
        out.push_str(&format!("   {} {};\n", cpp_type(st, t)?, f.name));
    }
    out.push_str("};\n");
    Ok(())
}

// ---------------------------------------------------------------------
// field accessors and constructors
// ---------------------------------------------------------------------

fn field_accessor(st: &SymbolTable, m: &Field, test: &str) -> Result<String, CoreError> {
    if m.status.is_elided() {
        return Ok(String::new());
    }
    let Some(t) = m.ty else {
        return Ok(String::new());
    };
    let f = &m.name;
    let elem_is_flat = st
        .ty(t)
        .elem
        .is_some_and(|e| st.ty(e).id == TypeId::Flat);

    Ok(match st.ty(t).id {
        TypeId::Flat => {
            let tn = cpp_type(st, t)?;
            let a = if type_needs_allocator(st, t) { ", allo" } else { "" };
            format!("   auto {f}() {{ {test} return {tn}_direct{{&mbuf->{f}{a}}}; }} // flat\n")
        }
        TypeId::Variant => {
            let tn = cpp_type(st, t)?;
            if type_needs_allocator(st, t) {
                format!("   auto {f}() {{ {test} return {tn}_direct{{&mbuf->{f},allo}}; }} // variant field\n")
            } else {
                format!("   {tn}& {f}() {{ {test} return mbuf->{f}; }} // variant field\n")
            }
        }
        TypeId::Vector | TypeId::Array | TypeId::Varray if elem_is_flat => {
            let es = cpp_type(st, elem(st, t)?)?;
            format!(
                "   auto {f}() {{ {test} return Span_ref<{es}, {es}_direct>{{mbuf->{f}.begin(), mbuf->{f}.end(), allo}}; }}\n"
            )
        }
        TypeId::Optional if elem_is_flat => {
            let es = cpp_type(st, elem(st, t)?)?;
            format!("   auto {f}() {{ {test} return Optional_{es}_ref {{&mbuf->{f},allo}}; }}\n")
        }
        _ => {
            let at = accessor_type(st, t)?;
            format!("   {at}{f}() {{ {test} return mbuf->{f}; }}\n")
        }
    })
}

/// `void f(Init arg) { new(&mbuf->f) T(allo, arg); }`
fn value_ctor(st: &SymbolTable, m: &Field) -> Result<String, CoreError> {
    let t = m.ty.expect("constructor for a typed field");
    Ok(format!(
        "   void {f}({init} arg) {{ {ic}new(&mbuf->{f}) {cpp}({allo}arg); }}\n",
        f = m.name,
        init = initializer_type(st, t)?,
        ic = icheck(m.index),
        cpp = cpp_type(st, t)?,
        allo = allo_infix(st, t),
    ))
}

fn cstring_ctor(st: &SymbolTable, m: &Field) -> Result<String, CoreError> {
    let t = m.ty.expect("constructor for a typed field");
    Ok(format!(
        "   void {f}(const char* arg) {{ {ic}new(&mbuf->{f}) {cpp}({allo}arg); }}\n",
        f = m.name,
        ic = icheck(m.index),
        cpp = cpp_type(st, t)?,
        allo = allo_infix(st, t),
    ))
}

/// Variant field writers are overloads named after the field, one per
/// eligible alternative; the placement type is the variant itself,
/// which routes tag and tail discipline through its constructor.
fn variant_field_ctor(
    st: &SymbolTable,
    m: &Field,
    alt: &Field,
    cstring: bool,
) -> Result<String, CoreError> {
    let vt = m.ty.expect("variant field is typed");
    let at = alt.ty.expect("alternative is typed");
    let init = if cstring {
        "const char* ".to_string()
    } else {
        initializer_type(st, at)?
    };
    Ok(format!(
        "   void {f}({init} arg) {{ {ic}new(&mbuf->{f}) {var}(allo,arg); }}\n",
        f = m.name,
        ic = icheck(m.index),
        var = cpp_type(st, vt)?,
    ))
}

/// `Empty` / `Default` writers, optionals only.
fn marker_ctor(st: &SymbolTable, m: &Field, marker: &str) -> Result<String, CoreError> {
    let t = m.ty.expect("constructor for a typed field");
    Ok(format!(
        "   void {f}({marker}) {{ new(&mbuf->{f}) {cpp}({allo}{marker}{{}}); }}\n",
        f = m.name,
        cpp = cpp_type(st, t)?,
        allo = allo_infix(st, t),
    ))
}

/// `Extent` / `Push` writers for tail vectors and strings.
fn size_ctors(st: &SymbolTable, m: &Field) -> Result<String, CoreError> {
    if m.status.is_elided() {
        return Ok(String::new());
    }
    let Some(t) = m.ty else {
        return Ok(String::new());
    };
    if !matches!(st.ty(t).id, TypeId::Vector | TypeId::String) {
        return Ok(String::new());
    }
    let f = &m.name;
    let cpp = cpp_type(st, t)?;
    Ok(format!(
        "   void {f}(Extent arg) {{ new(&mbuf->{f}) {cpp}(allo,arg); }}\n\
         \x20  void {f}(Push) {{ mbuf->{f}.push(allo); }}\n\
         \x20  template<class Arg> void {f}(Push, Arg arg) {{ mbuf->{f}.push(allo, arg); }}\n"
    ))
}

/// Fixed-vector writer family: extent, push, element push, and the
/// list form; capacity is inline, so no allocator consultation.
fn varray_ctors(st: &SymbolTable, m: &Field) -> Result<String, CoreError> {
    let t = m.ty.expect("constructor for a typed field");
    let e = elem(st, t)?;
    let f = &m.name;
    let mut s = String::new();
    s.push_str(&format!(
        "   void {f}(Extent arg) {{ {ic}new(&mbuf->{f}) {cpp}(arg); }}\n",
        ic = icheck(m.index),
        cpp = cpp_type(st, t)?,
    ));
    s.push_str(&format!("   void {f}(Push) {{ mbuf->{f}.push(); }}\n"));
    if st.ty(e).id == TypeId::String {
        s.push_str(&format!(
            "   void {f}(Push, const char* arg) {{ mbuf->{f}.push(allo,arg); }}\n"
        ));
    } else {
        s.push_str(&format!(
            "   void {f}(Push, {ec} arg) {{ mbuf->{f}.push(arg); }}\n",
            ec = cpp_type(st, e)?,
        ));
    }
    if st.ty(e).id == TypeId::Char8 {
        s.push_str(&cstring_ctor(st, m)?);
    }
    if st.ty(e).id != TypeId::String {
        s.push_str(&value_ctor(st, m)?);
    }
    Ok(s)
}

fn field_constructor(st: &SymbolTable, m: &Field) -> Result<String, CoreError> {
    if m.status.is_elided() {
        return Ok(String::new());
    }
    let Some(t) = m.ty else {
        return Ok(String::new());
    };

    Ok(match st.ty(t).id {
        // member-list initializers for whole flats are deliberately
        // not generated
        TypeId::Flat => String::new(),
        TypeId::Optional => {
            if st.ty(elem(st, t)?).id == TypeId::Flat {
                String::new()
            } else {
                value_ctor(st, m)?
            }
        }
        TypeId::String => {
            let mut s = cstring_ctor(st, m)?;
            s.push_str(&value_ctor(st, m)?);
            s
        }
        TypeId::Array => match st.ty(elem(st, t)?).id {
            TypeId::Char8 => {
                let mut s = cstring_ctor(st, m)?;
                s.push_str(&value_ctor(st, m)?);
                s
            }
            TypeId::Flat => String::new(),
            _ => value_ctor(st, m)?,
        },
        TypeId::Vector => {
            if st.ty(elem(st, t)?).id == TypeId::Flat {
                String::new()
            } else {
                value_ctor(st, m)?
            }
        }
        TypeId::Varray => varray_ctors(st, m)?,
        TypeId::Variant => {
            let Some(vrid) = st.record_of(t) else {
                return Ok(String::new());
            };
            let mut s = String::new();
            for alt in &st.record(vrid).fields {
                if alt.status.is_elided() {
                    continue;
                }
                let Some(at) = alt.ty else { continue };
                if matches!(st.ty(at).id, TypeId::Flat | TypeId::Variant) {
                    continue;
                }
                s.push_str(&variant_field_ctor(st, m, alt, false)?);
                if st.ty(at).id == TypeId::String {
                    s.push_str(&variant_field_ctor(st, m, alt, true)?);
                }
            }
            s
        }
        _ => value_ctor(st, m)?,
    })
}

// ---------------------------------------------------------------------
// direct facade emitter
// ---------------------------------------------------------------------

/// Emit the facade family for one record: the `_direct` accessor for
/// flats and views, the tagged facade for variants, the envelope for
/// messages. Enumerations emit nothing; their values are declared
/// externally.
pub fn emit_direct(out: &mut String, st: &SymbolTable, rid: RecordId) -> Result<(), CoreError> {
    match st.record(rid).id {
        TypeId::Variant => {
            emit_variant(out, st, rid)?;
            if record_needs_allocator(st, rid) {
                emit_variant_direct(out, st, rid)?;
            }
            return Ok(());
        }
        TypeId::Enumeration => return Ok(()),
        TypeId::Message => return codegen_message::emit_message(out, st, rid),
        _ => {}
    }

    let rec = st.record(rid);
    let n = &rec.name;
    let needs = record_needs_allocator(st, rid);

    out.push_str("\n\n// Flat direct accessors:\n");
    out.push_str(&format!(
        "// options: initializer check=={INITIALIZE_CHECK} default initialization=={DEFAULT_INIT}\n\n"
    ));
    out.push_str(&format!("struct {n}_direct {{\n"));
    out.push_str(&format!("   {n}* mbuf;\n"));
    out.push_str("   constexpr static bool flat_tag = true;\n");
    if needs {
        out.push_str("   Allocator* allo;\n");
        out.push_str(&format!(
            "   {n}_direct({n}* pp, Allocator* a) :mbuf{{pp}}, allo{{a}} {{}}\n"
        ));
    } else {
        out.push_str(&format!("   {n}_direct({n}* pp) :mbuf{{pp}} {{}}\n"));
    }
    if INITIALIZE_CHECK {
        out.push_str(&format!("   char icheck[{}] = {{0}};\n", rec.fields.len()));
    }

    for m in &rec.fields {
        out.push_str(&field_accessor(st, m, "")?);
        out.push_str(&field_constructor(st, m)?);
        if !m.status.is_elided()
            && m.ty.is_some_and(|t| st.ty(t).id == TypeId::Optional)
        {
            out.push_str(&marker_ctor(st, m, "Empty")?);
            out.push_str(&marker_ctor(st, m, "Default")?);
        }
        out.push_str(&size_ctors(st, m)?);
        out.push('\n');
    }

    out.push_str("};\n\n");

    if rec.used_as_optional {
        emit_optional_ref(out, st, rid)?;
    }
    Ok(())
}

// ---------------------------------------------------------------------
// variant facades
// ---------------------------------------------------------------------

/// The tagged variant layout plus its constructors and accessors.
/// Alternatives are numbered 1..N in declaration order; tag 0 is
/// unset; removed alternatives keep their number reserved. `alignas`
/// pins the slot the layout engine assigns, since the nested union is
/// a type declaration, not a member.
fn emit_variant(out: &mut String, st: &SymbolTable, rid: RecordId) -> Result<(), CoreError> {
    let rec = st.record(rid);
    let n = &rec.name;

    out.push_str(&format!("struct alignas(8) {n} {{\n"));
    out.push_str("   char utag = 0;\n   Offset pos = 0;\n   union U {\n");
    for m in &rec.fields {
        if m.status.is_elided() {
            continue;
        }
        let Some(t) = m.ty else { continue };
        out.push_str(&format!("   {} {};\n", cpp_type(st, t)?, m.name));
    }
    out.push_str("   };\n");

    out.push_str("   // constructors:\n");
    out.push_str(&format!("   {n}() = default;\n"));
    let mut count = 1;
    for m in &rec.fields {
        let Some(t) = m.ty else { continue };
        if m.status.is_elided() {
            count += 1;
            continue;
        }
        let alt = &m.name;
        match st.ty(t).id {
            TypeId::String => {
                out.push_str(&format!(
                    "   {n}(Allocator* allo, const char* arg)\n\
                     \x20     :utag{{{count}}}, pos{{allo->allocate(sizeof(String))}}\n\
                     \x20  {{\n\
                     \x20     pos -= reinterpret_cast<Byte*>(this) - allo->flat();\t\t// position relative to this\n\
                     \x20     auto p = &reinterpret_cast<{n}::U*>(reinterpret_cast<Byte*>(this) + pos)->{alt};\n\
                     \x20     auto r = allo->place(arg);\n\
                     \x20     p->pos = size_of<String>(); // characters follow immediately\n\
                     \x20     p->sz = r.sz;\n\
                     \x20  }}\n"
                ));
                out.push_str(&format!(
                    "   {n}(Allocator* allo, const std::string& arg)\n\
                     \x20     :utag{{{count}}}, pos{{allo->allocate(sizeof(String))}}\n\
                     \x20  {{\n\
                     \x20     pos -= reinterpret_cast<Byte*>(this) - allo->flat();\t\t// position relative to this\n\
                     \x20     auto p = &reinterpret_cast<{n}::U*>(reinterpret_cast<Byte*>(this) + pos)->{alt};\n\
                     \x20     p->pos = size_of<String>(); // characters follow immediately\n\
                     \x20     p->sz = size_of(arg);\n\
                     \x20     allo->allocate(arg.size());\n\
                     \x20     Byte* q = reinterpret_cast<Byte*>(p)+size_of<String>();\n\
                     \x20     for (auto x : arg) *q++ = Byte(x);\n\
                     \x20  }}\n"
                ));
            }
            // flats need the allocator-threading facade instead
            TypeId::Flat => {}
            _ => {
                let cpp = cpp_type(st, t)?;
                out.push_str(&format!(
                    "   {n}(Allocator* allo,{cpp} arg)\n\
                     \x20     :utag{{{count}}}, pos{{ allo->allocate(sizeof({cpp})) }}\n\
                     \x20     {{\n\
                     \x20     pos -= reinterpret_cast<Byte*>(this) - allo->flat();\t\t// position relative to this\n\
                     \x20     reinterpret_cast<{n}::U*>(reinterpret_cast<Byte*>(this)+pos)->{alt} = arg; }}\n"
                ));
            }
        }
        count += 1;
    }

    out.push_str("   auto tag() { return utag; }\n");
    out.push_str("   bool is_present() { return utag; }\n");

    out.push_str("\n   // variant accessors:\n");
    let mut count = 1;
    for m in &rec.fields {
        let Some(t) = m.ty else { continue };
        if m.status.is_elided() {
            count += 1;
            continue;
        }
        let alt = &m.name;
        match st.ty(t).id {
            TypeId::String => {
                out.push_str(&format!(
                    "   Span<char> {alt}()\n\
                     \x20  {{\n\
                     \x20     expect([&] {{ return utag =={count};}}, Error_code::variant_tag);\n\
                     \x20     auto p = &reinterpret_cast<{n}::U*>(reinterpret_cast<Byte*>(this) + pos)->{alt};\n\
                     \x20     return {{p->begin(), p->end()}};\n\
                     \x20  }}\n"
                ));
            }
            TypeId::Vector | TypeId::Array | TypeId::Varray => {
                let es = cpp_type(st, elem(st, t)?)?;
                out.push_str(&format!(
                    "   Span<{es}> {alt}()\n\
                     \x20  {{\n\
                     \x20     expect([&] {{ return utag =={count};}}, Error_code::variant_tag);\n\
                     \x20     auto p = &reinterpret_cast<{n}::U*>(reinterpret_cast<Byte*>(this) + pos)->{alt};\n\
                     \x20     return {{p->begin(), p->end()}};\n\
                     \x20  }}\n"
                ));
            }
            TypeId::Variant | TypeId::Flat => {
                let tn = cpp_type(st, t)?;
                out.push_str(&format!(
                    "   {tn}_direct {alt}(Allocator* a)\n\
                     \x20  {{\n\
                     \x20     expect([&] {{ return utag =={count};}}, Error_code::variant_tag);\n\
                     \x20     auto p = &reinterpret_cast<{n}::U*>(reinterpret_cast<Byte*>(this) + pos)->{alt};\n\
                     \x20     return {{p,a}};\n\
                     \x20  }}\n"
                ));
            }
            _ => {
                let cpp = cpp_type(st, t)?;
                out.push_str(&format!(
                    "   {cpp}& {alt}() {{ expect([&]{{ return utag=={count};  }}, Error_code::variant_tag);\
                     return reinterpret_cast<{n}::U*>(reinterpret_cast<Byte*>(this)+pos)->{alt}; }}\n"
                ));
            }
        }
        count += 1;
    }
    out.push_str("};\n");
    Ok(())
}

/// Facade threading the allocator through a variant field.
fn emit_variant_direct(
    out: &mut String,
    st: &SymbolTable,
    rid: RecordId,
) -> Result<(), CoreError> {
    let rec = st.record(rid);
    let n = &rec.name;

    out.push_str(&format!("struct {n}_direct {{\n"));
    out.push_str(&format!("   {n}* var;\n"));
    out.push_str("   Allocator* allo;\n");
    out.push_str(&format!(
        "   {n}_direct({n}* v,Allocator* a) :var{{v}}, allo{{a}} {{}}\n"
    ));
    out.push_str("   auto tag() { return var->utag; }\n");
    out.push_str("   bool is_present() { return var->utag; }\n");

    for m in &rec.fields {
        if m.status.is_elided() {
            continue;
        }
        let Some(t) = m.ty else { continue };
        let alt = &m.name;

        // constructor: select and place through the variant itself
        match st.ty(t).id {
            TypeId::Flat | TypeId::Variant => {}
            TypeId::Optional => {
                return Err(CoreError::Semantic(
                    "optional as a variant field is not supported".to_string(),
                ));
            }
            TypeId::String => {
                out.push_str(&format!(
                    "   void {alt}({init} arg) {{ {ic}new(var) {n}(allo,arg); }}\n",
                    init = initializer_type(st, t)?,
                    ic = icheck(m.index),
                ));
                out.push_str(&format!(
                    "   void {alt}(const char* arg) {{ {ic}new(var) {n}(allo,arg); }}\n",
                    ic = icheck(m.index),
                ));
            }
            _ => {
                out.push_str(&format!(
                    "   void {alt}({init} arg) {{ {ic}new(var) {n}(allo,arg); }}\n",
                    init = initializer_type(st, t)?,
                    ic = icheck(m.index),
                ));
            }
        }

        // accessor: delegate to the variant facade
        match st.ty(t).id {
            TypeId::Flat | TypeId::Variant => {
                out.push_str(&format!(
                    "   auto {alt}() {{ return var->{alt}(allo); }} // {}\n",
                    st.ty(t).id.name()
                ));
            }
            _ => {
                out.push_str(&format!(
                    "   {at}{alt}() {{ return var->{alt}(); }}\n",
                    at = accessor_type(st, t)?,
                ));
            }
        }
    }
    out.push_str("};\n");
    Ok(())
}

// ---------------------------------------------------------------------
// optional-ref facade
// ---------------------------------------------------------------------

/// Accessor over `optional<X>` storage, emitted only for records the
/// parser marked used-as-optional. Every field access is gated on
/// presence.
fn emit_optional_ref(out: &mut String, st: &SymbolTable, rid: RecordId) -> Result<(), CoreError> {
    let rec = st.record(rid);
    let n = &rec.name;

    out.push_str(&format!("struct Optional_{n}_ref {{\n"));
    out.push_str(&format!("   Optional<{n}>* val;\n"));
    out.push_str(&format!("   {n}* mbuf;\n"));
    out.push_str("   Allocator* allo;\n");
    out.push_str("   bool is_present() const { return val->filled; }\n");
    out.push_str(
        "   bool is_empty() const { return !is_present(); }\t// pretend to be a container\n\n",
    );
    out.push_str(&format!(
        "   Optional_{n}_ref(Optional<{n}>* v,Allocator* a) :val{{ v }}, mbuf{{ &v->val }}, allo{{ a }} {{}}\n\n"
    ));

    for m in &rec.fields {
        out.push_str(&field_accessor(st, m, PRESENCE_TEST)?);
        if !m.status.is_elided() {
            if let Some(t) = m.ty {
                if st.ty(t).id != TypeId::Flat {
                    out.push_str(&value_ctor(st, m)?);
                }
            }
        }
        out.push('\n');
    }

    out.push_str("};\n\n");
    Ok(())
}
