//! Construction markers. Generated writer facades take one of these to
//! select a construction form without a value of the field type.

use crate::Size;

/// Construct an absent optional.
#[derive(Debug, Clone, Copy)]
pub struct Empty;

/// Construct a present, default-initialized optional.
///
/// Named `Defaulted` rather than the schema-facing `Default` so the
/// marker does not shadow `std::default::Default` at use sites.
#[derive(Debug, Clone, Copy)]
pub struct Defaulted;

/// Append to the last-allocated tail region.
#[derive(Debug, Clone, Copy)]
pub struct Push;

/// Reserve room for a number of elements in a vector or fixed-vector.
#[derive(Debug, Clone, Copy)]
pub struct Extent(pub Size);

/// Open an existing message without touching its contents.
#[derive(Debug, Clone, Copy)]
pub struct Reader;

/// Open a message for writing.
#[derive(Debug, Clone, Copy)]
pub struct Writer;
