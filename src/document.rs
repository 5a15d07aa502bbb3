//! The document container: a parsed hierarchy plus its provenance.
//!
//! A [`Document`] pairs the entry [`Tree`] with a flat metadata [`Entry`]
//! that records where the tree came from (`filename`, `filetype`) and the
//! parameters a writer needs to reproduce the source layout, such as the
//! delimiters of a 2D table.
//!
//! Besides raw [`Tree`] access by [`NodeId`], the document offers a
//! name-addressed API: entries are found by name anywhere below the root,
//! optionally scoped under a named parent.
//!
//! ```rust
//! use uconfig::{Document, Entry, Key};
//!
//! let mut doc = Document::new();
//! doc.add_entry(Entry::named("server", 1), None).unwrap();
//! doc.add_key(Key::new("port", 8080), Some(b"server"), None).unwrap();
//!
//! let port = doc.get_key(b"port", Some(b"server"), None).unwrap();
//! assert_eq!(port.value.as_i32(), Some(8080));
//! ```

use crate::{Entry, EntryRef, Error, Key, NodeId, Result, Tree, Value};
use serde::ser::{Serialize, SerializeStruct, Serializer};
use std::fmt;
use std::path::Path;

/// Metadata key holding the source path.
pub const META_FILENAME: &[u8] = b"filename";
/// Metadata key holding the canonical format tag.
pub const META_FILETYPE: &[u8] = b"filetype";
pub const META_ROW_DELIMITER: &[u8] = b"2d-table/row-delimiter";
pub const META_COLUMN_DELIMITER: &[u8] = b"2d-table/column-delimiter";

/// The supported on-disk formats.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Format {
    KeyValue,
    Ini,
    Table,
    Csv,
    Json,
    Xml,
}

impl Format {
    /// The tag stored under the `filetype` metadata key.
    #[must_use]
    pub const fn as_tag(&self) -> &'static str {
        match self {
            Format::KeyValue => "key-value",
            Format::Ini => "winini",
            Format::Table => "2d-table",
            Format::Csv => "csv",
            Format::Json => "json",
            Format::Xml => "xml",
        }
    }

    pub fn from_tag(tag: &[u8]) -> Option<Self> {
        match tag {
            b"key-value" => Some(Format::KeyValue),
            b"winini" => Some(Format::Ini),
            b"2d-table" => Some(Format::Table),
            b"csv" => Some(Format::Csv),
            b"json" => Some(Format::Json),
            b"xml" => Some(Format::Xml),
            _ => None,
        }
    }

    /// Recognized file extensions, case-insensitive.
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.to_ascii_lowercase().as_str() {
            "ini" => Some(Format::Ini),
            "csv" => Some(Format::Csv),
            "json" => Some(Format::Json),
            "xml" => Some(Format::Xml),
            "tsv" | "tab" => Some(Format::Table),
            "conf" | "cfg" | "properties" | "env" => Some(Format::KeyValue),
            _ => None,
        }
    }

    /// Format implied by a path's extension, if it has a recognized one.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Format::from_extension)
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_tag())
    }
}

/// A parsed configuration file.
#[derive(Debug, Clone, Default)]
pub struct Document {
    tree: Tree,
    metadata: Entry,
}

impl Document {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps an owned hierarchy; `root` becomes the tree's root.
    #[must_use]
    pub fn from_root(root: Entry) -> Self {
        Document {
            tree: Tree::from_entry(root),
            metadata: Entry::default(),
        }
    }

    /// Frees the tree and the metadata.
    pub fn reset(&mut self) {
        self.tree.reset();
        self.metadata.reset();
    }

    #[inline]
    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    #[inline]
    pub fn tree_mut(&mut self) -> &mut Tree {
        &mut self.tree
    }

    #[inline]
    pub fn root_id(&self) -> NodeId {
        self.tree.root()
    }

    /// View of the root entry.
    pub fn root(&self) -> EntryRef<'_> {
        match self.tree.get(self.tree.root()) {
            Some(root) => root,
            // the root slot is created with the tree and never freed
            None => unreachable!("tree without a root"),
        }
    }

    #[inline]
    pub fn metadata(&self) -> &Entry {
        &self.metadata
    }

    #[inline]
    pub fn metadata_mut(&mut self) -> &mut Entry {
        &mut self.metadata
    }

    pub fn metadata_value(&self, name: &[u8]) -> Option<&Value> {
        self.metadata.search_key(name).map(|k| &k.value)
    }

    pub fn set_metadata(&mut self, name: &[u8], value: Value) {
        self.metadata.set_key(name, Key::new(name, value));
    }

    pub fn filename(&self) -> Option<&[u8]> {
        self.metadata_value(META_FILENAME).and_then(Value::as_bytes)
    }

    /// Format recorded by the last read.
    pub fn format(&self) -> Option<Format> {
        self.metadata_value(META_FILETYPE)
            .and_then(Value::as_bytes)
            .and_then(Format::from_tag)
    }

    pub(crate) fn stamp_format(&mut self, format: Format) {
        self.set_metadata(META_FILETYPE, Value::from(format.as_tag()));
    }

    pub(crate) fn stamp_filename(&mut self, path: &Path) {
        self.set_metadata(
            META_FILENAME,
            Value::from(path.to_string_lossy().into_owned()),
        );
    }

    fn resolve(&self, entry: Option<&[u8]>, parent: Option<&[u8]>) -> Result<NodeId> {
        let root = self.tree.root();
        match entry {
            None => Ok(root),
            Some(name) => self
                .tree
                .search_subentry(root, name, parent, true)
                .ok_or_else(|| Error::not_found("entry", name)),
        }
    }

    /// Finds an entry by name anywhere below the root, optionally under a
    /// named parent.
    pub fn get_entry(&self, name: &[u8], parent: Option<&[u8]>) -> Option<EntryRef<'_>> {
        self.resolve(Some(name), parent)
            .ok()
            .and_then(|id| self.tree.get(id))
    }

    /// Appends `entry` under the named parent, or under the root.
    pub fn add_entry(&mut self, entry: Entry, parent: Option<&[u8]>) -> Result<NodeId> {
        let parent = self.resolve(parent, None)?;
        self.tree.add_subentry(parent, entry)
    }

    pub fn delete_entry(&mut self, name: &[u8], parent: Option<&[u8]>) -> Result<()> {
        let id = self.resolve(Some(name), parent)?;
        self.tree.delete_node(id)
    }

    /// Replaces the named entry, subtree included, keeping its position.
    pub fn modify_entry(
        &mut self,
        name: &[u8],
        parent: Option<&[u8]>,
        entry: Entry,
    ) -> Result<NodeId> {
        let id = self.resolve(Some(name), parent)?;
        let owner = self
            .tree
            .entry(id)?
            .parent()
            .map(|p| p.id())
            .ok_or_else(|| Error::invalid_operation("the root entry cannot be replaced"))?;
        self.tree.modify_subentry(owner, name, entry)
    }

    /// Finds a key of the named entry, or of the root when `entry` is `None`.
    pub fn get_key(&self, key: &[u8], entry: Option<&[u8]>, parent: Option<&[u8]>) -> Option<&Key> {
        let id = self.resolve(entry, parent).ok()?;
        self.tree.get(id)?.search_key(key)
    }

    pub fn add_key(&mut self, key: Key, entry: Option<&[u8]>, parent: Option<&[u8]>) -> Result<()> {
        let id = self.resolve(entry, parent)?;
        self.tree.add_key(id, key)
    }

    pub fn delete_key(
        &mut self,
        key: &[u8],
        entry: Option<&[u8]>,
        parent: Option<&[u8]>,
    ) -> Result<()> {
        let id = self.resolve(entry, parent)?;
        self.tree.delete_key(id, key)
    }

    pub fn modify_key(
        &mut self,
        name: &[u8],
        key: Key,
        entry: Option<&[u8]>,
        parent: Option<&[u8]>,
    ) -> Result<()> {
        let id = self.resolve(entry, parent)?;
        self.tree.modify_key(id, name, key)
    }
}

impl Serialize for Document {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Document", 2)?;
        state.serialize_field("root", &self.root().to_entry())?;
        state.serialize_field("metadata", &self.metadata)?;
        state.end()
    }
}
