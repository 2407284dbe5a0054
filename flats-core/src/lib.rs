//! Core compiler pipeline for the flats message formats.
//!
//! The pipeline is roughly:
//!
//!   schema text
//!     -> lexer         (character cursor)
//!     -> parser        (symbol table + declaration-ordered records)
//!     -> layout engine (offsets, sizes, object maps)
//!     -> emitters      (structs, direct accessors, views, messages)
//!
//! Higher-level tools (the CLI driver, embedders) should depend on
//! this crate rather than reimplementing the pipeline. Generated code
//! targets the runtime contract in `flats-rt`.

// ---------------------------------------------------------------------
// Error handling
// ---------------------------------------------------------------------

pub mod error;

// ---------------------------------------------------------------------
// Front end: lexing, the symbol table, parsing
// ---------------------------------------------------------------------

pub mod lexer;
pub mod parser;
pub mod preset;
pub mod symbol_table;
pub mod types;

// ---------------------------------------------------------------------
// Layout and printable artifacts
// ---------------------------------------------------------------------

pub mod layout;
pub mod printer;

// ---------------------------------------------------------------------
// Back end: code generation and orchestration
// ---------------------------------------------------------------------

pub mod codegen_direct;
pub mod codegen_message;
pub mod codegen_view;
pub mod compiler;

// ---------------------------------------------------------------------
// Public API re-exports
// ---------------------------------------------------------------------

pub use compiler::{compile, Action};
pub use error::CoreError;
pub use parser::{parse, Schema};
