//! Runtime container primitives for flats messages.
//!
//! Generated accessor code addresses a message as a fixed layout plus a
//! bump-allocated tail inside one caller-provided buffer. This crate is
//! the stable surface that code depends on:
//!
//!   error codes + expect()   (check primitive with per-site policies)
//!   Allocator                (tail bump cursor)
//!   Envelope                 (message placement: writer, reader, clone)
//!   Span / Optional / Array / FixedVector
//!   construction markers     (Empty, Defaulted, Push, Extent, ...)
//!
//! The facades do not synchronize; the contract is single writer per
//! message, any number of readers of an immutable one.

// ---------------------------------------------------------------------
// Contract-wide primitive types
// ---------------------------------------------------------------------

/// An opaque byte of a message buffer.
pub type Byte = u8;
/// Relative position inside a flat or message, in bytes.
pub type Offset = i16;
/// Byte or element count of something in a flat or message.
pub type Size = i16;

// ---------------------------------------------------------------------
// Checks and error codes
// ---------------------------------------------------------------------

pub mod error;

// ---------------------------------------------------------------------
// Allocation and the message envelope
// ---------------------------------------------------------------------

pub mod alloc;
pub mod envelope;

// ---------------------------------------------------------------------
// Containers and construction markers
// ---------------------------------------------------------------------

pub mod containers;
pub mod marker;
pub mod span;

// ---------------------------------------------------------------------
// Public API re-exports
// ---------------------------------------------------------------------

pub use alloc::{Allocator, TailRef};
pub use containers::{Array, FixedVector, Optional};
pub use envelope::{Envelope, Scalar, VARIANT_SLOT_ALIGN, VARIANT_SLOT_SIZE, VECTOR_HEADER_SIZE};
pub use error::{expect, expect_with, narrow, ErrorCode, Policy, RuntimeError};
pub use marker::{Defaulted, Empty, Extent, Push, Reader, Writer};
pub use span::{Span, SpanMut};
