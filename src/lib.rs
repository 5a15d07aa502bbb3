//! # uconfig
//!
//! Lenient readers and writers for loosely structured configuration files,
//! all sharing one generic document model.
//!
//! ## The model
//!
//! A [`Document`] holds a tree of entries. An entry has an optional name, a
//! codec-defined `kind` tag, an ordered list of [`Key`]s and an ordered list
//! of child entries. A key is an optional name plus a typed [`Value`].
//! Every format maps onto this shape:
//!
//! | format     | codec        | entries                         | keys                     |
//! |------------|--------------|---------------------------------|--------------------------|
//! | key=value  | [`KeyValue`] | one per line                    | `NAME=VALUE`, comments   |
//! | INI        | [`Ini`]      | sections, then one per line     | `NAME=VALUE`, comments   |
//! | 2D table   | [`Table`]    | blocks, then one per row        | one per cell             |
//! | CSV        | [`Csv`]      | like 2D tables, named by header | cells, named by column   |
//! | JSON       | [`Json`]     | objects and arrays              | scalar members           |
//! | XML        | [`Xml`]      | elements, text, comments, ...   | attributes               |
//!
//! Entries live in an arena ([`Tree`]) and are addressed by [`NodeId`] or by
//! name. Borrowed views ([`EntryRef`]) are cheap; [`Entry`] is the owned,
//! detached form that readers build and callers copy out with
//! [`EntryRef::to_entry`].
//!
//! ## Reading and writing
//!
//! Every codec implements [`Codec`], which provides `read`/`write` on paths
//! and `from_slice`/`to_vec` on bytes. Reading never fails on malformed
//! syntax: unparseable spans are kept as `Raw` data and problems come back
//! as [`Warning`]s. The crate-level [`read`] and [`write`] pick the codec
//! from the file extension, which makes format conversion a two-liner:
//!
//! ```rust,no_run
//! let mut doc = uconfig::Document::new();
//! uconfig::read("settings.ini", &mut doc)?;
//! uconfig::write("settings.json", &doc)?;
//! # Ok::<(), uconfig::Error>(())
//! ```
//!
//! ### In memory
//!
//! ```rust
//! use uconfig::{Codec, Ini, Json};
//!
//! let (doc, warnings) = Ini::from_slice(b"[server]\nport=8080\n").unwrap();
//! assert!(warnings.is_empty());
//!
//! let server = doc.get_entry(b"server", None).unwrap();
//! assert_eq!(server.subentry_count(), 1);
//!
//! let json = Json::to_vec(&doc).unwrap();
//! assert!(String::from_utf8(json).unwrap().contains("\"server\""));
//! ```
//!
//! ### Typed values
//!
//! Untyped formats store their values as `Raw` or `Chars` bytes;
//! [`guess_value_type`] and [`Value::guess`] recover booleans and numbers.
//!
//! ```rust
//! use uconfig::{Codec, KeyValue, Value};
//!
//! let (mut doc, _) = KeyValue::from_slice(b"retries=3\n").unwrap();
//! let line = doc.get_entry(b"retries", None).unwrap().id();
//! for key in doc.tree_mut().keys_mut(line).unwrap() {
//!     key.retype_guessed();
//! }
//! assert_eq!(doc.get_key(b"retries", Some(b"retries"), None).unwrap().value, Value::Integer(3));
//! ```
//!
//! ## Logging
//!
//! The crate logs through the [`log`] facade: one `debug!` per file read or
//! written, `trace!` per parsed record and `warn!` per [`Warning`]. No
//! logger is installed.

pub mod codec;
pub mod csv;
pub mod document;
pub mod entry;
pub mod error;
pub mod ini;
pub mod json;
pub mod keyvalue;
pub mod options;
pub mod scan;
pub mod table;
pub mod tree;
pub mod value;
pub mod xml;

pub use codec::Codec;
pub use csv::Csv;
pub use document::{Document, Format};
pub use entry::{Entry, EntryObject, Key};
pub use error::{Error, Result, Warning};
pub use ini::Ini;
pub use json::Json;
pub use keyvalue::KeyValue;
pub use options::{CsvOptions, Delimiter, IniOptions, JsonOptions, TableOptions, XmlOptions};
pub use table::Table;
pub use tree::{EntryRef, NodeId, Tree};
pub use value::{guess_value_type, Value, ValueType};
pub use xml::Xml;

use log::debug;
use std::path::Path;

/// Reads a file with the codec its extension implies.
///
/// Unrecognized extensions are read as key-value files.
///
/// # Errors
///
/// Returns [`Error::Io`] when the file cannot be read, and
/// [`Error::DepthExceeded`] for JSON/XML nested beyond the default guard.
pub fn read(path: impl AsRef<Path>, doc: &mut Document) -> Result<Vec<Warning>> {
    let path = path.as_ref();
    let format = Format::from_path(path).unwrap_or(Format::KeyValue);
    debug!("dispatching {} to the {} reader", path.display(), format);
    match format {
        Format::KeyValue => KeyValue::read(path, doc),
        Format::Ini => Ini::read(path, doc),
        Format::Table => Table::read(path, doc),
        Format::Csv => Csv::read(path, doc),
        Format::Json => Json::read(path, doc),
        Format::Xml => Xml::read(path, doc),
    }
}

/// Writes a document with the codec its target extension implies.
///
/// Without a recognized extension the format recorded by the last read is
/// used, and key-value when there is none.
///
/// # Errors
///
/// Returns [`Error::Io`] when the file cannot be written.
pub fn write(path: impl AsRef<Path>, doc: &Document) -> Result<()> {
    let path = path.as_ref();
    let format = Format::from_path(path)
        .or_else(|| doc.format())
        .unwrap_or(Format::KeyValue);
    debug!("dispatching {} to the {} writer", path.display(), format);
    write_as(path, doc, format)
}

/// Writes a document with an explicit format.
pub fn write_as(path: impl AsRef<Path>, doc: &Document, format: Format) -> Result<()> {
    match format {
        Format::KeyValue => KeyValue::write(path, doc),
        Format::Ini => Ini::write(path, doc),
        Format::Table => Table::write(path, doc),
        Format::Csv => Csv::write(path, doc),
        Format::Json => Json::write(path, doc),
        Format::Xml => Xml::write(path, doc),
    }
}
