use crate::error::{expect, narrow, ErrorCode, RuntimeError};
use crate::{Offset, Size};

/// Reference to a tail allocation: its offset relative to the start of
/// the flat, and its length in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TailRef {
    pub pos: Offset,
    pub sz: Size,
}

/// Bump allocator over the variable part of a message.
///
/// `next` and `max` are offsets relative to the start of the flat; the
/// tail begins where the fixed part ends, so a fresh allocator starts
/// with `next == fixed_size`. The cursor is not reentrant: one writer
/// per message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(C)]
pub struct Allocator {
    pub next: Offset,
    pub max: Offset,
}

impl Allocator {
    pub fn new(next: usize, max: usize) -> Result<Allocator, RuntimeError> {
        Ok(Allocator {
            next: narrow(next)?,
            max: narrow(max)?,
        })
    }

    /// Allocate `n` bytes from the tail, returning the offset of the
    /// first of them. Fails with `TailTooBig` past the budget.
    pub fn allocate(&mut self, n: usize) -> Result<Offset, RuntimeError> {
        let nx = self.next;
        let sz = narrow(n)?;
        expect(
            nx as i32 + sz as i32 <= self.max as i32,
            ErrorCode::TailTooBig,
        )?;
        self.next += sz;
        Ok(nx)
    }

    /// Free bytes remaining in the tail.
    pub fn capacity(&self) -> Size {
        self.max - self.next
    }
}
