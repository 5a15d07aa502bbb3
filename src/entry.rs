//! Keys and owned entries.
//!
//! An [`Entry`] is a detached, exclusively owned subtree: codecs build rows,
//! sections and elements as `Entry` values bottom-up and then append them to
//! a document's [`Tree`](crate::Tree), which deep-copies them into its arena.
//! `Clone` on an `Entry` is a deep copy.
//!
//! [`EntryObject`] is the handle callers pass around when they do not care
//! whether they hold their own copy or a view into a document: it is either
//! `Owned(Entry)` or `Borrowed(EntryRef)`. Cloning it always yields an
//! `Owned` copy, so a list of child views can be materialized before the
//! parent is mutated.

use crate::tree::EntryRef;
use crate::Value;
use serde::{Deserialize, Serialize};

/// A named, typed payload attached to an entry.
///
/// Comment lines, table cells and array elements have no name.
#[derive(Clone, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct Key {
    pub name: Option<Vec<u8>>,
    pub value: Value,
}

impl Key {
    pub fn new(name: impl Into<Vec<u8>>, value: impl Into<Value>) -> Self {
        Key {
            name: Some(name.into()),
            value: value.into(),
        }
    }

    /// A key without a name.
    pub fn unnamed(value: impl Into<Value>) -> Self {
        Key {
            name: None,
            value: value.into(),
        }
    }

    #[inline]
    #[must_use]
    pub fn name(&self) -> Option<&[u8]> {
        self.name.as_deref()
    }

    #[inline]
    pub fn is_named(&self, name: &[u8]) -> bool {
        self.name.as_deref() == Some(name)
    }

    /// Replaces a `Raw` or `Chars` payload with the native value its text
    /// guesses to. Other payloads are left alone.
    pub fn retype_guessed(&mut self) {
        if let Some(bytes) = self.value.as_bytes() {
            self.value = Value::guess(bytes);
        }
    }
}

/// An owned tree node.
#[derive(Clone, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct Entry {
    pub name: Option<Vec<u8>>,
    /// Codec-defined type tag.
    pub kind: i32,
    pub keys: Vec<Key>,
    pub subentries: Vec<Entry>,
}

impl Entry {
    pub fn new(kind: i32) -> Self {
        Entry {
            kind,
            ..Default::default()
        }
    }

    pub fn named(name: impl Into<Vec<u8>>, kind: i32) -> Self {
        Entry {
            name: Some(name.into()),
            kind,
            ..Default::default()
        }
    }

    #[inline]
    #[must_use]
    pub fn name(&self) -> Option<&[u8]> {
        self.name.as_deref()
    }

    #[inline]
    pub fn is_named(&self, name: &[u8]) -> bool {
        self.name.as_deref() == Some(name)
    }

    pub fn set_name(&mut self, name: impl Into<Vec<u8>>) {
        self.name = Some(name.into());
    }

    #[inline]
    pub fn key_count(&self) -> usize {
        self.keys.len()
    }

    #[inline]
    pub fn subentry_count(&self) -> usize {
        self.subentries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty() && self.subentries.is_empty()
    }

    /// Drops every key and subentry; name and kind are reset too.
    pub fn reset(&mut self) {
        *self = Entry::default();
    }

    pub fn add_key(&mut self, key: Key) {
        self.keys.push(key);
    }

    pub fn add_subentry(&mut self, entry: Entry) {
        self.subentries.push(entry);
    }

    pub fn exist_key(&self, name: &[u8]) -> bool {
        self.search_key(name).is_some()
    }

    pub fn search_key(&self, name: &[u8]) -> Option<&Key> {
        self.keys.iter().find(|k| k.is_named(name))
    }

    pub fn search_key_mut(&mut self, name: &[u8]) -> Option<&mut Key> {
        self.keys.iter_mut().find(|k| k.is_named(name))
    }

    /// Replaces the first key called `name`, or appends `key` when there is none.
    pub fn set_key(&mut self, name: &[u8], key: Key) {
        match self.search_key_mut(name) {
            Some(slot) => *slot = key,
            None => self.keys.push(key),
        }
    }

    /// Removes the first key called `name`; returns whether one was removed.
    pub fn delete_key(&mut self, name: &[u8]) -> bool {
        match self.keys.iter().position(|k| k.is_named(name)) {
            Some(index) => {
                self.keys.remove(index);
                true
            }
            None => false,
        }
    }

    /// Finds a direct child by name, or any descendant when `recursive`.
    /// Direct children are checked before descending.
    pub fn search_subentry(&self, name: &[u8], recursive: bool) -> Option<&Entry> {
        if let Some(found) = self.subentries.iter().find(|e| e.is_named(name)) {
            return Some(found);
        }
        if !recursive {
            return None;
        }
        self.subentries
            .iter()
            .find_map(|e| e.search_subentry(name, true))
    }

    /// Number of nodes in this subtree, including itself.
    pub fn node_count(&self) -> usize {
        1 + self.subentries.iter().map(Entry::node_count).sum::<usize>()
    }
}

/// Either an owned entry or a borrowed view into a document tree.
#[derive(Debug)]
pub enum EntryObject<'a> {
    Owned(Entry),
    Borrowed(EntryRef<'a>),
}

impl<'a> EntryObject<'a> {
    pub fn is_owned(&self) -> bool {
        matches!(self, EntryObject::Owned(_))
    }

    pub fn name(&self) -> Option<&[u8]> {
        match self {
            EntryObject::Owned(entry) => entry.name(),
            EntryObject::Borrowed(view) => view.name(),
        }
    }

    pub fn kind(&self) -> i32 {
        match self {
            EntryObject::Owned(entry) => entry.kind,
            EntryObject::Borrowed(view) => view.kind(),
        }
    }

    pub fn keys(&self) -> &[Key] {
        match self {
            EntryObject::Owned(entry) => &entry.keys,
            EntryObject::Borrowed(view) => view.keys(),
        }
    }

    pub fn key_count(&self) -> usize {
        self.keys().len()
    }

    pub fn subentry_count(&self) -> usize {
        match self {
            EntryObject::Owned(entry) => entry.subentries.len(),
            EntryObject::Borrowed(view) => view.subentry_count(),
        }
    }

    /// Child handles: views when borrowed, deep copies when owned.
    pub fn subentries(&self) -> Vec<EntryObject<'_>> {
        match self {
            EntryObject::Owned(entry) => entry
                .subentries
                .iter()
                .map(|child| EntryObject::Owned(child.clone()))
                .collect(),
            EntryObject::Borrowed(view) => view.subentries().map(EntryObject::Borrowed).collect(),
        }
    }

    pub fn search_key(&self, name: &[u8]) -> Option<&Key> {
        self.keys().iter().find(|k| k.is_named(name))
    }

    /// Materializes an owned deep copy.
    pub fn into_owned(self) -> Entry {
        match self {
            EntryObject::Owned(entry) => entry,
            EntryObject::Borrowed(view) => view.to_entry(),
        }
    }
}

impl Clone for EntryObject<'_> {
    fn clone(&self) -> Self {
        match self {
            EntryObject::Owned(entry) => EntryObject::Owned(entry.clone()),
            EntryObject::Borrowed(view) => EntryObject::Owned(view.to_entry()),
        }
    }
}

impl From<Entry> for EntryObject<'_> {
    fn from(entry: Entry) -> Self {
        EntryObject::Owned(entry)
    }
}

impl<'a> From<EntryRef<'a>> for EntryObject<'a> {
    fn from(view: EntryRef<'a>) -> Self {
        EntryObject::Borrowed(view)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Entry {
        let mut section = Entry::named("section", 1);
        section.add_key(Key::new("a", "1"));
        section.add_key(Key::unnamed(Value::Chars(b" comment".to_vec())));
        let mut inner = Entry::named("inner", 1);
        inner.add_key(Key::new("b", 2));
        section.add_subentry(inner);
        section
    }

    #[test]
    fn test_key_lookup_and_replace() {
        let mut entry = sample();
        assert!(entry.exist_key(b"a"));
        assert!(!entry.exist_key(b"b"));

        entry.set_key(b"a", Key::new("a", 10));
        assert_eq!(entry.search_key(b"a").unwrap().value, Value::Integer(10));
        assert_eq!(entry.key_count(), 2);

        assert!(entry.delete_key(b"a"));
        assert!(!entry.delete_key(b"a"));
        assert_eq!(entry.key_count(), 1);
    }

    #[test]
    fn test_recursive_search() {
        let mut root = Entry::new(0);
        root.add_subentry(sample());
        assert!(root.search_subentry(b"inner", false).is_none());
        assert_eq!(root.search_subentry(b"inner", true).unwrap().key_count(), 1);
        assert_eq!(root.node_count(), 3);
    }

    #[test]
    fn test_retype_guessed() {
        let mut key = Key::new("port", Value::Raw(b"8080".to_vec()));
        key.retype_guessed();
        assert_eq!(key.value, Value::Integer(8080));
    }

    #[test]
    fn test_clone_of_owned_object_is_deep() {
        let object = EntryObject::Owned(sample());
        let copy = object.clone();
        let (EntryObject::Owned(a), EntryObject::Owned(b)) = (&object, &copy) else {
            panic!("expected owned copies");
        };
        assert_eq!(a, b);
        assert_ne!(
            a.keys[0].value.as_bytes().unwrap().as_ptr(),
            b.keys[0].value.as_bytes().unwrap().as_ptr()
        );
    }
}
