//! Plain `NAME=VALUE` files.
//!
//! Every non-blank line becomes one subentry of the root:
//!
//! | line            | subentry kind        | keys                                  |
//! |-----------------|----------------------|---------------------------------------|
//! | `a=1 # note`    | [`LineKind::KeyVal`] | `a` = Raw `1 `, unnamed Chars ` note` |
//! | `# note`        | [`LineKind::Comment`]| unnamed Chars ` note`                 |
//! | `garbage`       | [`LineKind::Raw`]    | unnamed Raw `garbage`                 |
//!
//! A `NAME=VALUE` subentry is named after its key. Values stay `Raw` until
//! a caller re-types them with [`Key::retype_guessed`](crate::Key::retype_guessed).
//!
//! ```rust
//! use uconfig::{Codec, KeyValue};
//!
//! let (doc, _) = KeyValue::from_slice(b"host=example.org\n# trailing comment\n").unwrap();
//! let host = doc.root().search_subentry(b"host", false).unwrap();
//! assert_eq!(host.keys()[0].value.as_bytes(), Some(&b"example.org"[..]));
//! ```

use crate::scan::{detect_line_delimiter, is_blank, Scanner};
use crate::{Codec, Document, Entry, EntryRef, Format, Key, Result, Value, Warning};
use log::trace;

/// Root kind of a key-value document.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(i32)]
pub enum RootKind {
    Unknown = 0,
    Normal = 1,
}

/// Kind of a line subentry, shared with the INI codec.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(i32)]
pub enum LineKind {
    Raw = 0,
    KeyVal = 1,
    Comment = 2,
}

impl LineKind {
    pub fn from_i32(kind: i32) -> Option<Self> {
        match kind {
            0 => Some(LineKind::Raw),
            1 => Some(LineKind::KeyVal),
            2 => Some(LineKind::Comment),
            _ => None,
        }
    }
}

const KEY_VALUE_DELIMITER: u8 = b'=';
const COMMENT_DELIMITER: u8 = b'#';

/// The key-value codec.
#[derive(Clone, Copy, Debug, Default)]
pub struct KeyValue;

impl Codec for KeyValue {
    const FORMAT: Format = Format::KeyValue;
    type Options = ();

    fn read_from(input: &[u8], doc: &mut Document, _options: &()) -> Result<Vec<Warning>> {
        let mut root = Entry::new(RootKind::Unknown as i32);
        for_each_line(input, |line| {
            root.add_subentry(parse_line(line, &[COMMENT_DELIMITER]));
        });
        if root.subentry_count() > 0 {
            root.kind = RootKind::Normal as i32;
        }
        *doc = Document::from_root(root);
        doc.stamp_format(Self::FORMAT);
        Ok(Vec::new())
    }

    fn write_to(doc: &Document, out: &mut Vec<u8>, _options: &()) -> Result<()> {
        let root = doc.root();
        write_loose_keys(out, root.keys(), COMMENT_DELIMITER);
        for line in root.subentries() {
            write_line(out, line, COMMENT_DELIMITER);
        }
        Ok(())
    }
}

/// Calls `f` with every non-blank line, without its line delimiter.
pub(crate) fn for_each_line(input: &[u8], mut f: impl FnMut(&[u8])) {
    let delimiter = detect_line_delimiter(input);
    let mut scan = Scanner::new(input);
    while !scan.is_eof() {
        let (line, _) = scan.read_until_or_end(delimiter);
        if is_blank(line) {
            continue;
        }
        trace!("line at {}: {:?}", scan.pos(), String::from_utf8_lossy(line));
        f(line);
    }
}

/// Position of the first comment marker that starts the line or follows a
/// blank, and is not the line's last byte.
pub(crate) fn find_comment(line: &[u8], markers: &[u8]) -> Option<usize> {
    let last = line.len().checked_sub(1)?;
    (0..last).find(|&pos| {
        markers.contains(&line[pos]) && (pos == 0 || matches!(line[pos - 1], b' ' | b'\t'))
    })
}

/// Splits `NAME=VALUE`. The delimiter must not be the first byte.
pub(crate) fn parse_key_value(content: &[u8]) -> Option<Key> {
    let pos = content.iter().position(|&b| b == KEY_VALUE_DELIMITER)?;
    if pos == 0 {
        return None;
    }
    Some(Key::new(
        &content[..pos],
        Value::Raw(content[pos + 1..].to_vec()),
    ))
}

/// Parses one line into a line subentry.
pub(crate) fn parse_line(line: &[u8], markers: &[u8]) -> Entry {
    let (content, comment) = match find_comment(line, markers) {
        Some(pos) => (&line[..pos], Some(&line[pos + 1..])),
        None => (line, None),
    };

    let mut entry = Entry::new(LineKind::Raw as i32);
    if let Some(key) = parse_key_value(content) {
        entry.name = key.name.clone();
        entry.kind = LineKind::KeyVal as i32;
        entry.add_key(key);
    } else if comment.is_some() && !is_blank(content) {
        entry.add_key(Key::unnamed(Value::Raw(content.to_vec())));
    }

    match comment {
        Some(text) => {
            entry.add_key(Key::unnamed(Value::Chars(text.to_vec())));
            if entry.key_count() == 1 {
                entry.kind = LineKind::Comment as i32;
            }
        }
        None if entry.key_count() == 0 => {
            entry.add_key(Key::unnamed(Value::Raw(line.to_vec())));
        }
        None => {}
    }
    entry
}

/// Writes one key of a line: `NAME=VALUE`, a comment, or raw bytes.
fn write_key(out: &mut Vec<u8>, key: &Key, comment_delimiter: u8) {
    match (key.name(), &key.value) {
        (Some(name), value) => {
            out.extend_from_slice(name);
            out.push(KEY_VALUE_DELIMITER);
            out.extend_from_slice(&value.to_text());
        }
        (None, Value::Raw(bytes)) => out.extend_from_slice(bytes),
        (None, value) => {
            out.push(comment_delimiter);
            out.extend_from_slice(&value.to_text());
        }
    }
}

/// Writes a line subentry followed by `\n`.
pub(crate) fn write_line(out: &mut Vec<u8>, line: EntryRef<'_>, comment_delimiter: u8) {
    let comment_only = LineKind::from_i32(line.kind()) == Some(LineKind::Comment);
    for key in line.keys() {
        if comment_only && key.name().is_none() {
            out.push(comment_delimiter);
            out.extend_from_slice(&key.value.to_text());
        } else {
            write_key(out, key, comment_delimiter);
        }
    }
    out.push(b'\n');
}

/// Keys attached directly to a container, one per line.
pub(crate) fn write_loose_keys(out: &mut Vec<u8>, keys: &[Key], comment_delimiter: u8) {
    for key in keys {
        write_key(out, key, comment_delimiter);
        out.push(b'\n');
    }
}
