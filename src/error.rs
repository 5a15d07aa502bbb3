//! Error and warning types for reading, writing and editing documents.
//!
//! The readers are lenient: malformed syntax never produces an [`Error`].
//! Spans that cannot be parsed are kept as opaque `Raw` keys or text nodes,
//! and anything worth reporting is returned as a [`Warning`] next to the
//! populated document.
//!
//! [`Error`] is reserved for conditions the caller has to act on:
//!
//! - **I/O**: the file cannot be opened, read or written
//! - **Lookup**: an entry or key addressed by name does not exist
//! - **Stale handles**: a [`NodeId`](crate::NodeId) whose node was deleted
//! - **Depth guard**: JSON/XML nesting deeper than the configured limit
//!
//! ## Examples
//!
//! ```rust
//! use uconfig::{Document, Error};
//!
//! let mut doc = Document::new();
//! let root = doc.root_id();
//! let err = doc.tree_mut().delete_subentry(root, b"missing").unwrap_err();
//! assert!(matches!(err, Error::NotFound { .. }));
//! ```

use std::fmt;
use thiserror::Error;

/// Represents all failures surfaced by the document API and the codecs.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// IO error during reading or writing
    #[error("IO error: {0}")]
    Io(String),

    /// An entry or key addressed by name does not exist
    #[error("{what} not found: {name}")]
    NotFound { what: &'static str, name: String },

    /// A node handle refers to a node that has since been deleted
    #[error("stale node handle (index {index}, generation {generation})")]
    StaleHandle { index: usize, generation: u32 },

    /// The requested mutation is not allowed on this node
    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    /// A binary payload does not have the width its value type requires
    #[error("invalid {expected} payload: expected {width} bytes, found {found}")]
    InvalidValue {
        expected: &'static str,
        width: usize,
        found: usize,
    },

    /// Nesting deeper than the configured guard
    #[error("nesting depth exceeds limit of {limit} at byte offset {offset}")]
    DepthExceeded { limit: usize, offset: usize },

    /// Custom error
    #[error("Error: {0}")]
    Custom(String),
}

impl Error {
    /// Creates an I/O error for file reading/writing failures.
    pub fn io(msg: &str) -> Self {
        Error::Io(msg.to_string())
    }

    /// Creates a lookup failure for an entry or key name.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use uconfig::Error;
    ///
    /// let err = Error::not_found("entry", b"section");
    /// assert_eq!(err.to_string(), "entry not found: section");
    /// ```
    pub fn not_found(what: &'static str, name: &[u8]) -> Self {
        Error::NotFound {
            what,
            name: String::from_utf8_lossy(name).into_owned(),
        }
    }

    /// Creates an invalid operation error.
    pub fn invalid_operation(msg: &str) -> Self {
        Error::InvalidOperation(msg.to_string())
    }

    /// Creates a custom error with a display message.
    pub fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::io(&err.to_string())
    }
}

/// A recoverable problem noticed while reading.
///
/// Readers keep going after a warning; the affected span is stored in the
/// tree as well as it could be interpreted.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Warning {
    /// An XML closing tag does not match the element it closes
    #[error("closing tag </{found}> does not match <{expected}> at byte offset {offset}")]
    TagMismatch {
        expected: String,
        found: String,
        offset: usize,
    },

    /// A closing tag or bracket with nothing open to close
    #[error("unbalanced closing {what} at byte offset {offset}")]
    UnbalancedClose { what: &'static str, offset: usize },

    /// A comment, CDATA section, declaration or doctype without its terminator
    #[error("unterminated {kind} starting at byte offset {offset}")]
    UnterminatedSection { kind: &'static str, offset: usize },

    /// A tag cut off by the end of input
    #[error("unterminated tag starting at byte offset {offset}")]
    UnterminatedTag { offset: usize },

    /// An object, array or element still open at the end of input
    #[error("{what} still open at end of input")]
    UnclosedContainer { what: &'static str },
}

pub type Result<T> = std::result::Result<T, Error>;
