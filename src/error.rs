// This module defines the error types for the table generator using the thiserror
// crate. BuildError covers the three failure families of the pipeline: configuration
// errors (malformed bit templates, an illegal ModRM mode handed to the SIB generator,
// a catalog form that cannot be lowered, interchange lines that do not parse, a state
// space that overflows 16-bit ids), ambiguity errors (a wildcard edge meeting concrete
// byte edges at one automaton position, or two encodings with different accept classes
// terminating on the same state), and the completeness error raised when a mandatory
// control-transfer class ends up with no acceptor. Every variant carries the offending
// record or template so a failed build names its cause. BuildResult<T> is the
// convenience alias used throughout the crate.

//! Error types for the table generator.
//!
//! There is no recoverable-error path: this is an offline build tool, and any
//! failure must stop the build rather than emit a possibly-unsound table.

use thiserror::Error;

use crate::encoding::AcceptClass;

/// Main error type for table generation.
#[derive(Error, Debug)]
pub enum BuildError {
    #[error("bit template `{text}` must be 8 or 16 bits wide, got {got}")]
    TemplateWidth { text: String, got: usize },

    #[error("ModRM template `{text}` is malformed: {reason}")]
    ModRmTemplate { text: String, reason: &'static str },

    #[error("SIB enumeration is undefined for register-direct mode 0b11")]
    SibMode,

    #[error("catalog form `{mnemonic}` cannot be lowered: {reason}")]
    Form {
        mnemonic: &'static str,
        reason: String,
    },

    #[error("interchange line {line}: {reason}")]
    Parse { line: usize, reason: String },

    #[error("interchange line {line}: unknown accept class label `{label}`")]
    UnknownClass { line: usize, label: String },

    #[error("wildcard/concrete overlap at byte {position} of `{record}`")]
    WildcardOverlap { record: String, position: usize },

    #[error(
        "`{record}` terminates on a state already classified as {existing:?}; \
         refusing to reclassify it as {requested:?}"
    )]
    ClassConflict {
        record: String,
        existing: AcceptClass,
        requested: AcceptClass,
    },

    #[error("class {0:?} has no acceptor; the verifier could not recognize it")]
    MissingClass(AcceptClass),

    #[error("{states} states exceed the 16-bit state id space")]
    TableTooLarge { states: usize },

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for generator operations.
pub type BuildResult<T> = Result<T, BuildError>;
