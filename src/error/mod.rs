//! Error types and diagnostics.
//!
//! Errors are split by where they originate:
//!
//! - [`ParseError`]: turning text into a `Document` failed (tokenizer error
//!   or a structural problem in the event stream).
//! - [`StructuralError`]: the event stream fed to the tree builder was
//!   malformed (e.g. an end tag with nothing open). Always fatal.
//! - [`TreeError`]: a mutation was asked to do something that would break
//!   the tree (appending a node under itself, removing a non-child, ...).
//! - [`ValueError`]: a typed accessor could not produce a value.
//!
//! Non-fatal conditions (duplicate ids) are not errors: they are recorded as
//! [`Diagnostic`]s on the document and the operation proceeds.

use std::fmt;

/// Severity level for a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorSeverity {
    /// A non-fatal issue; the operation completed.
    Warning,
    /// A recoverable error.
    Error,
    /// An unrecoverable error; processing must stop.
    Fatal,
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
            Self::Fatal => write!(f, "fatal error"),
        }
    }
}

/// Source location within an XML document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SourceLocation {
    /// 1-based line number.
    pub line: u32,
    /// 1-based column number (in characters, not bytes).
    pub column: u32,
    /// 0-based byte offset from the start of the input.
    pub byte_offset: usize,
}

impl SourceLocation {
    /// Computes the line and column of `byte_offset` within `input`.
    ///
    /// Offsets past the end of the input are clamped to the end.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn locate(input: &str, byte_offset: usize) -> Self {
        let mut end = byte_offset.min(input.len());
        while !input.is_char_boundary(end) {
            end -= 1;
        }
        let before = &input[..end];
        let line = before.matches('\n').count() + 1;
        let line_start = before.rfind('\n').map_or(0, |i| i + 1);
        let column = before[line_start..].chars().count() + 1;
        Self {
            line: line as u32,
            column: column as u32,
            byte_offset,
        }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A single recorded diagnostic.
///
/// Tree-level warnings (such as a duplicate id replacing an earlier one) have
/// no source location; diagnostics raised while reading text do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// The severity of this diagnostic.
    pub severity: ErrorSeverity,
    /// Human-readable message.
    pub message: String,
    /// Where in the source this occurred, if it came from text input.
    pub location: Option<SourceLocation>,
}

impl Diagnostic {
    /// Creates a warning without a source location.
    #[must_use]
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            severity: ErrorSeverity::Warning,
            message: message.into(),
            location: None,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.location {
            Some(loc) => write!(f, "{}: {} at {loc}", self.severity, self.message),
            None => write!(f, "{}: {}", self.severity, self.message),
        }
    }
}

/// The kind of structural violation found in a builder event stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StructuralErrorKind {
    /// An end event arrived while no element was open.
    UnmatchedEnd,
    /// An end event named a different element than the one open.
    MismatchedEnd,
    /// A second top-level element started after the root was closed.
    MultipleRoots,
    /// Non-whitespace character data appeared outside the root element.
    TextOutsideRoot,
    /// The stream ended while elements were still open.
    UnclosedElement,
    /// The stream ended without producing any element.
    NoRootElement,
    /// An element name was empty.
    EmptyName,
    /// An element or attribute name cannot be written back unchanged.
    InvalidName,
}

/// A fatal error in the sequence of events fed to the tree builder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructuralError {
    /// What went wrong.
    pub kind: StructuralErrorKind,
    /// Human-readable message.
    pub message: String,
}

impl StructuralError {
    /// Creates a structural error of the given kind.
    #[must_use]
    pub fn new(kind: StructuralErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for StructuralError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "structural error: {}", self.message)
    }
}

impl std::error::Error for StructuralError {}

/// The error type returned when reading a document from text fails.
#[derive(Debug, Clone)]
pub struct ParseError {
    /// The primary error message.
    pub message: String,
    /// Where in the source the error occurred.
    pub location: SourceLocation,
    /// The structural error that aborted the build, if that was the cause.
    pub structural: Option<StructuralError>,
    /// Diagnostics collected before the error.
    pub diagnostics: Vec<Diagnostic>,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "parse error at {}: {}", self.location, self.message)
    }
}

impl std::error::Error for ParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.structural
            .as_ref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

/// A tree mutation that was rejected because it would break the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    /// The operation needs an element but was given a text node.
    NotAnElement,
    /// The operation needs a text node but was given an element.
    NotText,
    /// The node is not a direct child of the given parent.
    NotAChild,
    /// Appending would make a node its own ancestor.
    Cycle,
    /// Element names must not be empty.
    EmptyName,
    /// The name contains whitespace or markup characters.
    InvalidName(String),
    /// A derived index disagrees with the children it was derived from.
    IndexMismatch(String),
}

impl fmt::Display for TreeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotAnElement => write!(f, "node is not an element"),
            Self::NotText => write!(f, "node is not a text node"),
            Self::NotAChild => write!(f, "node is not a child of this element"),
            Self::Cycle => write!(f, "node cannot be appended to itself or its descendant"),
            Self::EmptyName => write!(f, "element name must not be empty"),
            Self::InvalidName(name) => write!(f, "'{name}' is not a valid name"),
            Self::IndexMismatch(detail) => write!(f, "index mismatch: {detail}"),
        }
    }
}

impl std::error::Error for TreeError {}

/// Why a typed accessor failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueError {
    /// There is no value to convert (missing attribute or no text).
    Missing,
    /// The value is not a valid literal for the requested type.
    Malformed {
        /// The offending value.
        value: String,
        /// The requested type, e.g. `"i32"`.
        target: &'static str,
    },
    /// The value is numeric but does not fit the requested type.
    OutOfRange {
        /// The offending value.
        value: String,
        /// The requested type, e.g. `"u8"`.
        target: &'static str,
    },
}

impl fmt::Display for ValueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing => write!(f, "no value present"),
            Self::Malformed { value, target } => {
                write!(f, "cannot interpret '{value}' as {target}")
            }
            Self::OutOfRange { value, target } => {
                write!(f, "'{value}' is out of range for {target}")
            }
        }
    }
}

impl std::error::Error for ValueError {}
