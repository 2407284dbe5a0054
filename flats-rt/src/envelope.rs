//! The message envelope: a flat plus its version word, allocator, and
//! tail region, laid out in a caller-provided byte buffer.
//!
//! Byte layout, little-endian throughout:
//!
//!   version : i32            (always)
//!   next    : Offset         (messages with tail-allocating fields)
//!   max     : Offset         (ditto)
//!   flat    : fixed layout   (flat_size bytes)
//!   tail    : bump region    (max - flat_size bytes)
//!
//! `next` and `max` are offsets relative to the start of the flat, so a
//! fresh allocator starts at `next == flat_size`. Tail vectors store a
//! `{sz, pos}` header inside the flat with `pos` relative to the header
//! itself; variant slots store `{utag, pos}` with `pos` relative to the
//! slot. The same addressing rules govern the generated C++.

use crate::alloc::{Allocator, TailRef};
use crate::error::{expect, narrow, ErrorCode, RuntimeError};
use crate::{Offset, Size};

/// Byte footprint of a tail vector header (`{sz: Size, pos: Offset}`);
/// strings are vectors of char and share it.
pub const VECTOR_HEADER_SIZE: usize = 4;

/// Inline footprint of a variant slot: `{utag: u8, pos: Offset}` padded
/// to a fixed 8-byte, 8-aligned cell so layout never depends on the
/// alternatives.
pub const VARIANT_SLOT_SIZE: usize = 8;
pub const VARIANT_SLOT_ALIGN: usize = 8;

/// Fixed-width scalar that can be read and written at a byte offset.
pub trait Scalar: Copy {
    const SIZE: usize;
    fn put(self, buf: &mut [u8]);
    fn get(buf: &[u8]) -> Self;
}

macro_rules! impl_scalar {
    ($($t:ty),*) => {$(
        impl Scalar for $t {
            const SIZE: usize = std::mem::size_of::<$t>();
            fn put(self, buf: &mut [u8]) {
                buf[..Self::SIZE].copy_from_slice(&self.to_le_bytes());
            }
            fn get(buf: &[u8]) -> Self {
                let mut raw = [0u8; std::mem::size_of::<$t>()];
                raw.copy_from_slice(&buf[..Self::SIZE]);
                <$t>::from_le_bytes(raw)
            }
        }
    )*};
}

impl_scalar!(u8, i8, u16, i16, u32, i32, u64, i64, f32, f64);

/// A message placed in a caller-provided buffer.
#[derive(Debug)]
pub struct Envelope<'a> {
    buf: &'a mut [u8],
    flat_size: usize,
    has_allocator: bool,
}

impl<'a> Envelope<'a> {
    /// Place a fresh writable message: checks the buffer fits the
    /// envelope plus the tail budget, zero-initializes the fixed part
    /// and the tail, and seeds the allocator. The tail budget is a
    /// construction-time parameter.
    pub fn place_writer(
        buf: &'a mut [u8],
        flat_size: usize,
        version: i32,
        tail_budget: usize,
    ) -> Result<Envelope<'a>, RuntimeError> {
        let max = flat_size + tail_budget;
        expect(8 + max <= buf.len(), ErrorCode::SmallBuffer)?;
        let mut env = Envelope {
            buf,
            flat_size,
            has_allocator: true,
        };
        for b in &mut env.buf[8..8 + max] {
            *b = 0;
        }
        version.put(&mut env.buf[0..]);
        env.store_allocator(Allocator::new(flat_size, max)?);
        Ok(env)
    }

    /// Place a fresh message for a record with no tail-allocating
    /// fields: no allocator word, capacity zero.
    pub fn place_plain(
        buf: &'a mut [u8],
        flat_size: usize,
        version: i32,
    ) -> Result<Envelope<'a>, RuntimeError> {
        expect(4 + flat_size <= buf.len(), ErrorCode::SmallBuffer)?;
        let mut env = Envelope {
            buf,
            flat_size,
            has_allocator: false,
        };
        for b in &mut env.buf[4..4 + flat_size] {
            *b = 0;
        }
        version.put(&mut env.buf[0..]);
        Ok(env)
    }

    /// Open an existing message: the size invariant is checked, the
    /// contents are assumed valid.
    pub fn place_reader(
        buf: &'a mut [u8],
        flat_size: usize,
        has_allocator: bool,
    ) -> Result<Envelope<'a>, RuntimeError> {
        let env = Envelope {
            buf,
            flat_size,
            has_allocator,
        };
        let need = if has_allocator {
            expect(env.buf.len() >= 8, ErrorCode::SmallBuffer)?;
            8 + env.load_allocator().max as usize
        } else {
            4 + flat_size
        };
        expect(need <= env.buf.len(), ErrorCode::SmallBuffer)?;
        Ok(env)
    }

    /// Byte-copy this message into another buffer of sufficient size.
    pub fn clone_into<'b>(&self, dst: &'b mut [u8]) -> Result<Envelope<'b>, RuntimeError> {
        let n = self.size();
        expect(n <= dst.len(), ErrorCode::SmallBuffer)?;
        dst[..n].copy_from_slice(&self.buf[..n]);
        Ok(Envelope {
            buf: dst,
            flat_size: self.flat_size,
            has_allocator: self.has_allocator,
        })
    }

    fn header_size(&self) -> usize {
        if self.has_allocator {
            8
        } else {
            4
        }
    }

    /// Byte index of a flat-relative offset.
    fn at(&self, off: usize) -> usize {
        self.header_size() + off
    }

    fn load_allocator(&self) -> Allocator {
        Allocator {
            next: Offset::get(&self.buf[4..]),
            max: Offset::get(&self.buf[6..]),
        }
    }

    fn store_allocator(&mut self, a: Allocator) {
        a.next.put(&mut self.buf[4..]);
        a.max.put(&mut self.buf[6..]);
    }

    pub fn version(&self) -> i32 {
        i32::get(&self.buf[0..])
    }

    /// Bytes in use: envelope header plus fixed part plus used tail.
    pub fn current_size(&self) -> usize {
        if self.has_allocator {
            self.header_size() + self.load_allocator().next as usize
        } else {
            self.header_size() + self.flat_size
        }
    }

    /// Free tail bytes remaining.
    pub fn current_capacity(&self) -> usize {
        if self.has_allocator {
            self.load_allocator().capacity() as usize
        } else {
            0
        }
    }

    /// Total footprint; `current_size() + current_capacity()` always.
    pub fn size(&self) -> usize {
        self.current_size() + self.current_capacity()
    }

    pub fn flat(&self) -> &[u8] {
        let h = self.header_size();
        &self.buf[h..h + self.flat_size]
    }

    /// Allocate `n` tail bytes; returns the flat-relative offset.
    pub fn allocate(&mut self, n: usize) -> Result<usize, RuntimeError> {
        let mut a = self.load_allocator();
        let off = a.allocate(n)?;
        self.store_allocator(a);
        Ok(off as usize)
    }

    /// Copy a string into the tail, returning where it landed.
    pub fn place_str(&mut self, s: &str) -> Result<TailRef, RuntimeError> {
        let pos = self.allocate(s.len())?;
        let start = self.at(pos);
        self.buf[start..start + s.len()].copy_from_slice(s.as_bytes());
        Ok(TailRef {
            pos: narrow(pos)?,
            sz: narrow(s.len())?,
        })
    }

    /// Read a scalar field at a flat-relative offset.
    pub fn read<T: Scalar>(&self, off: usize) -> T {
        T::get(&self.buf[self.at(off)..])
    }

    /// Write a scalar field at a flat-relative offset.
    pub fn write<T: Scalar>(&mut self, off: usize, v: T) {
        let start = self.at(off);
        v.put(&mut self.buf[start..]);
    }

    // ---- tail vectors -------------------------------------------------

    fn vector_header(&self, field: usize) -> (Size, Offset) {
        (
            Size::get(&self.buf[self.at(field)..]),
            Offset::get(&self.buf[self.at(field) + 2..]),
        )
    }

    fn set_vector_header(&mut self, field: usize, sz: Size, pos: Offset) {
        let start = self.at(field);
        sz.put(&mut self.buf[start..]);
        pos.put(&mut self.buf[start + 2..]);
    }

    /// Reserve `n` elements of a tail vector rooted at `field`.
    pub fn vector_extent<T: Scalar>(&mut self, field: usize, n: Size) -> Result<(), RuntimeError> {
        let abs = self.allocate(n as usize * T::SIZE)?;
        self.set_vector_header(field, n, narrow(abs - field)?);
        Ok(())
    }

    /// Build a string field (a vector of char) from `s`.
    pub fn vector_from_str(&mut self, field: usize, s: &str) -> Result<(), RuntimeError> {
        let r = self.place_str(s)?;
        self.set_vector_header(field, r.sz, r.pos - narrow(field)?);
        Ok(())
    }

    pub fn vector_len(&self, field: usize) -> Size {
        self.vector_header(field).0
    }

    pub fn vector_elem<T: Scalar>(&self, field: usize, i: usize) -> Result<T, RuntimeError> {
        let (sz, pos) = self.vector_header(field);
        expect(i < sz as usize, ErrorCode::BadSpanIndex)?;
        let base = field + pos as usize;
        Ok(T::get(&self.buf[self.at(base + i * T::SIZE)..]))
    }

    pub fn vector_set_elem<T: Scalar>(
        &mut self,
        field: usize,
        i: usize,
        v: T,
    ) -> Result<(), RuntimeError> {
        let (sz, pos) = self.vector_header(field);
        expect(i < sz as usize, ErrorCode::BadSpanIndex)?;
        let start = self.at(field + pos as usize + i * T::SIZE);
        v.put(&mut self.buf[start..]);
        Ok(())
    }

    /// The characters of a string field.
    pub fn vector_text(&self, field: usize) -> String {
        let (sz, pos) = self.vector_header(field);
        let start = self.at(field + pos as usize);
        self.buf[start..start + sz as usize]
            .iter()
            .map(|&b| b as char)
            .collect()
    }

    /// Append to a tail vector. Only the most recently allocated tail
    /// object can grow.
    pub fn vector_push<T: Scalar>(&mut self, field: usize, v: T) -> Result<(), RuntimeError> {
        let (sz, pos) = self.vector_header(field);
        let end = field + pos as usize + sz as usize * T::SIZE;
        expect(
            end == self.load_allocator().next as usize,
            ErrorCode::FixedArrayOverflow,
        )?;
        let abs = self.allocate(T::SIZE)?;
        let start = self.at(abs);
        v.put(&mut self.buf[start..]);
        self.set_vector_header(field, sz + 1, pos);
        Ok(())
    }

    // ---- variant slots ------------------------------------------------

    pub fn variant_tag(&self, field: usize) -> u8 {
        self.buf[self.at(field)]
    }

    /// Alternatives are numbered 1..N; tag 0 means unset.
    pub fn variant_check(&self, field: usize, k: u8) -> Result<(), RuntimeError> {
        expect(self.variant_tag(field) == k, ErrorCode::VariantTag)
    }

    /// Select alternative `k`: allocate its storage in the tail, stamp
    /// the tag and the slot-relative position, and return the
    /// flat-relative offset of the storage.
    pub fn variant_set(
        &mut self,
        field: usize,
        k: u8,
        alt_size: usize,
    ) -> Result<usize, RuntimeError> {
        let abs = self.allocate(alt_size)?;
        let start = self.at(field);
        self.buf[start] = k;
        narrow(abs - field)?.put(&mut self.buf[start + 2..]);
        Ok(abs)
    }

    /// Flat-relative offset of the selected alternative's storage.
    pub fn variant_alt(&self, field: usize) -> usize {
        field + Offset::get(&self.buf[self.at(field) + 2..]) as usize
    }

    pub fn variant_set_scalar<T: Scalar>(
        &mut self,
        field: usize,
        k: u8,
        v: T,
    ) -> Result<(), RuntimeError> {
        let abs = self.variant_set(field, k, T::SIZE)?;
        self.write(abs, v);
        Ok(())
    }

    pub fn variant_scalar<T: Scalar>(&self, field: usize, k: u8) -> Result<T, RuntimeError> {
        self.variant_check(field, k)?;
        Ok(self.read(self.variant_alt(field)))
    }

    /// Select a string alternative; the characters follow the vector
    /// header immediately.
    pub fn variant_set_str(&mut self, field: usize, k: u8, s: &str) -> Result<(), RuntimeError> {
        let alt = self.variant_set(field, k, VECTOR_HEADER_SIZE)?;
        let chars = self.allocate(s.len())?;
        let start = self.at(chars);
        self.buf[start..start + s.len()].copy_from_slice(s.as_bytes());
        self.set_vector_header(alt, narrow(s.len())?, narrow(chars - alt)?);
        Ok(())
    }

    pub fn variant_str(&self, field: usize, k: u8) -> Result<String, RuntimeError> {
        self.variant_check(field, k)?;
        Ok(self.vector_text(self.variant_alt(field)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writer_zeroes_and_accounts_for_the_tail() {
        let mut buf = [0xffu8; 64];
        let env = Envelope::place_writer(&mut buf, 8, 3, 32).expect("place");
        assert_eq!(env.version(), 3);
        assert_eq!(env.current_size(), 8 + 8);
        assert_eq!(env.current_capacity(), 32);
        assert_eq!(env.size(), env.current_size() + env.current_capacity());
        assert!(env.flat().iter().all(|&b| b == 0));
    }

    #[test]
    fn small_buffers_are_rejected() {
        let mut buf = [0u8; 16];
        let err = Envelope::place_writer(&mut buf, 8, 1, 32).unwrap_err();
        assert_eq!(err, RuntimeError(ErrorCode::SmallBuffer));
    }

    #[test]
    fn plain_envelopes_have_no_capacity() {
        let mut buf = [0u8; 16];
        let env = Envelope::place_plain(&mut buf, 4, 1).expect("place");
        assert_eq!(env.current_capacity(), 0);
        assert_eq!(env.current_size(), 4 + 4);
    }

    #[test]
    fn tail_allocation_respects_the_budget() {
        let mut buf = [0u8; 64];
        let mut env = Envelope::place_writer(&mut buf, 8, 1, 16).expect("place");
        assert_eq!(env.allocate(16).expect("fills the tail"), 8);
        let err = env.allocate(1).unwrap_err();
        assert_eq!(err, RuntimeError(ErrorCode::TailTooBig));
    }

    #[test]
    fn string_fields_round_trip_through_the_tail() {
        let mut buf = [0u8; 64];
        let mut env = Envelope::place_writer(&mut buf, 8, 1, 32).expect("place");
        env.vector_from_str(0, "hello").expect("write");
        assert_eq!(env.vector_len(0), 5);
        assert_eq!(env.vector_text(0), "hello");
        assert_eq!(env.current_size(), 8 + 8 + 5);
    }

    #[test]
    fn vectors_grow_only_while_last_allocated() {
        let mut buf = [0u8; 96];
        let mut env = Envelope::place_writer(&mut buf, 16, 1, 64).expect("place");
        env.vector_extent::<i32>(0, 2).expect("reserve");
        env.vector_set_elem::<i32>(0, 0, 7).expect("set");
        env.vector_set_elem::<i32>(0, 1, 9).expect("set");
        env.vector_push::<i32>(0, 11).expect("push while last");
        assert_eq!(env.vector_len(0), 3);
        assert_eq!(env.vector_elem::<i32>(0, 2).expect("read"), 11);

        // a second tail object ends the first one's growth
        env.vector_from_str(8, "x").expect("second allocation");
        let err = env.vector_push::<i32>(0, 13).unwrap_err();
        assert_eq!(err, RuntimeError(ErrorCode::FixedArrayOverflow));
    }

    #[test]
    fn variant_slots_enforce_tag_discipline() {
        let mut buf = [0u8; 64];
        let mut env = Envelope::place_writer(&mut buf, 8, 1, 32).expect("place");
        assert_eq!(env.variant_tag(0), 0, "unset variant reads tag 0");

        env.variant_set_str(0, 2, "hello").expect("select string alt");
        assert_eq!(env.variant_tag(0), 2);
        assert!(env.variant_alt(0) > 0);
        assert_eq!(env.variant_str(0, 2).expect("matching tag"), "hello");

        let err = env.variant_scalar::<i32>(0, 1).unwrap_err();
        assert_eq!(err, RuntimeError(ErrorCode::VariantTag));
    }

    #[test]
    fn readers_and_clones_see_the_writers_bytes() {
        let mut buf = [0u8; 64];
        let mut env = Envelope::place_writer(&mut buf, 8, 2, 32).expect("place");
        env.write::<i32>(0, 77);
        env.vector_from_str(4, "ok").expect("string");
        let total = env.size();

        let mut copy = [0u8; 64];
        let cloned = env.clone_into(&mut copy).expect("clone");
        assert_eq!(cloned.read::<i32>(0), 77);

        let reader = Envelope::place_reader(&mut buf, 8, true).expect("reopen");
        assert_eq!(reader.version(), 2);
        assert_eq!(reader.read::<i32>(0), 77);
        assert_eq!(reader.vector_text(4), "ok");
        assert_eq!(reader.size(), total);
    }
}
