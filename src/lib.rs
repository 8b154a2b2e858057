//! mcfi-tablegen - build-time table generator for the MCFI sandbox verifier.
//!
//! This crate defines the complete legal-instruction encoding space of a
//! curated x86-64 subset and compiles it into the compact deterministic
//! transition table a separate runtime verifier walks byte by byte. The
//! pipeline has two offline stages:
//!
//! 1. **Enumeration** - the [`catalog`] expands every instruction form
//!    (prefixes, REX templates, opcodes, ModRM/SIB addressing, immediates)
//!    into concrete byte sequences, each tagged with its security
//!    classification ([`AcceptClass`]), and emits them as line-oriented
//!    interchange records.
//! 2. **Compilation** - the records are inserted into a shared prefix
//!    automaton ([`Trie`]), reduced by merging identical subtrees, and
//!    flattened into a dense `states x 256` table plus the verifier
//!    descriptor ([`table::TableDescriptor`]), serialized as a C header.
//!
//! Determinism is a first-class property: identical input always produces a
//! byte-identical artifact. Any structural problem - malformed templates,
//! ambiguous encodings, a missing mandatory control-transfer class - aborts
//! the build with a structured [`BuildError`].
//!
//! # Architecture
//!
//! - [`bits`] - bit-template parsing and expansion
//! - [`addressing`] - register-field, ModRM and SIB enumeration
//! - [`encoding`] - concrete encodings, accept classes, the form assembler
//! - [`catalog`] - the declarative instruction catalog
//! - [`trie`] - the shared prefix automaton and its reduction
//! - [`table`] - state numbering, the dense table and the descriptor
//! - [`emit`] - the C header writer

pub mod addressing;
pub mod bits;
pub mod catalog;
pub mod emit;
pub mod encoding;
pub mod error;
pub mod table;
pub mod trie;

pub use catalog::Catalog;
pub use emit::write_header;
pub use encoding::{AcceptClass, Pattern, Record, Token};
pub use error::{BuildError, BuildResult};
pub use table::{CompiledTable, TableDescriptor};
pub use trie::Trie;

/// Run the whole pipeline in process: catalog, trie, reduction, compilation.
pub fn compile_catalog(catalog: &Catalog) -> BuildResult<CompiledTable> {
    let trie = Trie::from_records(catalog.records())?;
    table::compile(&trie.reduce())
}
