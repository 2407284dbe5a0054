//! Inline container primitives: the parts of a flat that live entirely
//! inside the fixed layout. Tail-backed vectors are a byte-level
//! discipline and live with the envelope instead.

use crate::error::{expect, ErrorCode, RuntimeError};
use crate::marker::Extent;
use crate::span::{Span, SpanMut};
use crate::Size;

/// A value that may be absent. The flag occupies the leading alignment
/// slot of `T` in the generated layout.
#[derive(Debug)]
#[repr(C)]
pub struct Optional<T> {
    filled: bool,
    val: T,
}

impl<T: Default> Optional<T> {
    /// An absent optional (the `Empty` construction marker).
    pub fn empty() -> Optional<T> {
        Optional {
            filled: false,
            val: T::default(),
        }
    }

    /// A present, default-initialized optional (the `Defaulted` marker).
    pub fn defaulted() -> Optional<T> {
        Optional {
            filled: true,
            val: T::default(),
        }
    }
}

impl<T> Optional<T> {
    pub fn new(val: T) -> Optional<T> {
        Optional { filled: true, val }
    }

    pub fn is_present(&self) -> bool {
        self.filled
    }

    pub fn is_empty(&self) -> bool {
        !self.filled
    }

    pub fn access(&self) -> Result<&T, RuntimeError> {
        expect(self.filled, ErrorCode::OptionalNotPresent)?;
        Ok(&self.val)
    }

    pub fn access_mut(&mut self) -> Result<&mut T, RuntimeError> {
        expect(self.filled, ErrorCode::OptionalNotPresent)?;
        Ok(&mut self.val)
    }

    pub fn set(&mut self, val: T) {
        self.val = val;
        self.filled = true;
    }
}

/// N consecutive elements, always fully present.
#[derive(Debug)]
#[repr(C)]
pub struct Array<T, const N: usize> {
    val: [T; N],
}

impl<T: Copy + Default, const N: usize> Array<T, N> {
    pub fn new() -> Array<T, N> {
        Array {
            val: [T::default(); N],
        }
    }

    /// Initialize from a full element list; anything but exactly N
    /// elements is an initializer error.
    pub fn from_slice(items: &[T]) -> Result<Array<T, N>, RuntimeError> {
        expect(items.len() == N, ErrorCode::ArrayInitializer)?;
        let mut val = [T::default(); N];
        val.copy_from_slice(items);
        Ok(Array { val })
    }
}

impl<T: Copy + Default, const N: usize> Default for Array<T, N> {
    fn default() -> Self {
        Array::new()
    }
}

impl<T, const N: usize> Array<T, N> {
    pub fn size(&self) -> Size {
        N as Size
    }

    pub fn as_span(&self) -> Span<'_, T> {
        Span::new(&self.val)
    }

    pub fn as_span_mut(&mut self) -> SpanMut<'_, T> {
        SpanMut::new(&mut self.val)
    }
}

/// An array that tracks how many of its N slots are in use; a vector
/// with a fixed capacity. The used-count precedes the storage.
#[derive(Debug)]
#[repr(C)]
pub struct FixedVector<T, const N: usize> {
    used: Size,
    val: [T; N],
}

impl<T: Copy + Default, const N: usize> FixedVector<T, N> {
    pub fn new() -> FixedVector<T, N> {
        FixedVector {
            used: 0,
            val: [T::default(); N],
        }
    }

    /// Reserve `n` elements, default-initialized.
    pub fn with_extent(ex: Extent) -> Result<FixedVector<T, N>, RuntimeError> {
        let n = ex.0;
        expect(n >= 0 && (n as usize) <= N, ErrorCode::FixedArrayOverflow)?;
        let mut v = FixedVector::new();
        v.used = n;
        Ok(v)
    }

    /// Initialize from up to N elements.
    pub fn from_slice(items: &[T]) -> Result<FixedVector<T, N>, RuntimeError> {
        expect(items.len() <= N, ErrorCode::ArrayInitializer)?;
        let mut v = FixedVector::new();
        v.val[..items.len()].copy_from_slice(items);
        v.used = items.len() as Size;
        Ok(v)
    }

    pub fn push(&mut self, item: T) -> Result<(), RuntimeError> {
        expect((self.used as usize) < N, ErrorCode::FixedArrayOverflow)?;
        self.val[self.used as usize] = item;
        self.used += 1;
        Ok(())
    }
}

impl<T: Copy + Default, const N: usize> Default for FixedVector<T, N> {
    fn default() -> Self {
        FixedVector::new()
    }
}

impl<T, const N: usize> FixedVector<T, N> {
    pub fn size(&self) -> Size {
        self.used
    }

    pub fn max_size(&self) -> Size {
        N as Size
    }

    pub fn can_push(&self) -> Size {
        N as Size - self.used
    }

    pub fn as_span(&self) -> Span<'_, T> {
        Span::new(&self.val[..self.used as usize])
    }
}
