//! Windows-style INI files.
//!
//! Lines are parsed exactly like the key-value format (see
//! [`keyvalue`](crate::keyvalue)), with `;` and `#` both accepted as comment
//! markers. A line of the form `[name]` opens a section; every following
//! line becomes a subentry of that section until the next header. Lines
//! before the first header are collected in an unnamed
//! [`SectionKind::Preamble`] entry.
//!
//! ```rust
//! use uconfig::{Codec, Ini};
//!
//! let input = b"; global\n[server]\nport=8080 ; default\n\n[client]\nretries=3\n";
//! let (doc, _) = Ini::from_slice(input).unwrap();
//! let server = doc.get_entry(b"server", None).unwrap();
//! assert_eq!(server.subentry_count(), 1);
//! assert_eq!(doc.root().subentry_count(), 3);
//! ```

use crate::keyvalue::{self, LineKind};
use crate::scan::trim;
use crate::{Codec, Document, Entry, Format, IniOptions, Key, Result, Value, Warning};
use log::trace;

/// Kind of an entry directly under the root.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(i32)]
pub enum SectionKind {
    Unknown = 0,
    Section = 1,
    /// Lines before the first section header.
    Preamble = 2,
}

const COMMENT_MARKERS: &[u8] = b";#";

/// The INI codec.
#[derive(Clone, Copy, Debug, Default)]
pub struct Ini;

/// Name of a `[name]` header line, once comments are stripped.
fn section_header(content: &[u8]) -> Option<&[u8]> {
    let content = trim(content);
    if content.len() >= 2 && content[0] == b'[' && content[content.len() - 1] == b']' {
        Some(&content[1..content.len() - 1])
    } else {
        None
    }
}

impl Codec for Ini {
    const FORMAT: Format = Format::Ini;
    type Options = IniOptions;

    fn read_from(input: &[u8], doc: &mut Document, _options: &IniOptions) -> Result<Vec<Warning>> {
        let mut root = Entry::new(keyvalue::RootKind::Normal as i32);
        let mut current = Entry::new(SectionKind::Preamble as i32);

        keyvalue::for_each_line(input, |line| {
            let comment = keyvalue::find_comment(line, COMMENT_MARKERS);
            let content = comment.map_or(line, |pos| &line[..pos]);

            match section_header(content) {
                Some(name) => {
                    trace!("section [{}]", String::from_utf8_lossy(name));
                    let finished = std::mem::replace(
                        &mut current,
                        Entry::named(name, SectionKind::Section as i32),
                    );
                    if finished.kind == SectionKind::Section as i32 || !finished.is_empty() {
                        root.add_subentry(finished);
                    }
                    if let Some(pos) = comment {
                        let mut note = Entry::new(LineKind::Comment as i32);
                        note.add_key(Key::unnamed(Value::Chars(line[pos + 1..].to_vec())));
                        current.add_subentry(note);
                    }
                }
                None => current.add_subentry(keyvalue::parse_line(line, COMMENT_MARKERS)),
            }
        });

        if current.kind == SectionKind::Section as i32 || !current.is_empty() {
            root.add_subentry(current);
        }
        *doc = Document::from_root(root);
        doc.stamp_format(Self::FORMAT);
        Ok(Vec::new())
    }

    fn write_to(doc: &Document, out: &mut Vec<u8>, options: &IniOptions) -> Result<()> {
        let marker = options.comment_delimiter;
        let root = doc.root();
        keyvalue::write_loose_keys(out, root.keys(), marker);

        for entry in root.subentries() {
            let is_section = entry.kind() != SectionKind::Preamble as i32;
            if is_section {
                out.push(b'[');
                out.extend_from_slice(entry.name().unwrap_or_default());
                out.extend_from_slice(b"]\n");
            }
            keyvalue::write_loose_keys(out, entry.keys(), marker);
            for line in entry.subentries() {
                keyvalue::write_line(out, line, marker);
            }
            if is_section {
                out.push(b'\n');
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &[u8] = b"# preamble\n\
[general]  ; header note\n\
name=demo\n\
; a comment\n\
\n\
[paths]\n\
root=/srv # trailing\n";

    #[test]
    fn test_sections_and_preamble() {
        let (doc, warnings) = Ini::from_slice(SAMPLE).unwrap();
        assert!(warnings.is_empty());
        let root = doc.root();
        assert_eq!(root.subentry_count(), 3);

        let preamble = root.subentry(0).unwrap();
        assert_eq!(preamble.kind(), SectionKind::Preamble as i32);
        assert_eq!(preamble.name(), None);

        let general = root.subentry(1).unwrap();
        assert!(general.is_named(b"general"));
        // header comment, name=demo, comment line
        assert_eq!(general.subentry_count(), 3);
        assert_eq!(
            general.subentry(0).unwrap().keys()[0].value,
            Value::Chars(b" header note".to_vec())
        );
        let name = general.search_subentry(b"name", false).unwrap();
        assert_eq!(name.kind(), LineKind::KeyVal as i32);

        let paths = root.subentry(2).unwrap();
        let root_line = paths.subentry(0).unwrap();
        assert_eq!(root_line.keys()[0].value, Value::Raw(b"/srv ".to_vec()));
        assert_eq!(
            root_line.keys()[1].value,
            Value::Chars(b" trailing".to_vec())
        );
    }

    #[test]
    fn test_write_layout() {
        let (doc, _) = Ini::from_slice(b"[a]\nx=1\n[b]\ny=2\n").unwrap();
        assert_eq!(
            Ini::to_vec(&doc).unwrap(),
            b"[a]\nx=1\n\n[b]\ny=2\n\n".to_vec()
        );
    }

    #[test]
    fn test_empty_section_is_kept() {
        let (doc, _) = Ini::from_slice(b"[empty]\n[full]\nk=v\n").unwrap();
        assert_eq!(doc.root().subentry_count(), 2);
        assert_eq!(doc.root().subentry(0).unwrap().subentry_count(), 0);
    }

    #[test]
    fn test_comment_delimiter_option() {
        let (doc, _) = Ini::from_slice(b"[s]\n# note\n").unwrap();
        let out = Ini::to_vec_with(&doc, &IniOptions::new().with_comment_delimiter(b'#')).unwrap();
        assert_eq!(out, b"[s]\n# note\n\n".to_vec());
        let out = Ini::to_vec(&doc).unwrap();
        assert_eq!(out, b"[s]\n; note\n\n".to_vec());
    }

    #[test]
    fn test_reread_is_stable() {
        let (doc, _) = Ini::from_slice(SAMPLE).unwrap();
        let written = Ini::to_vec(&doc).unwrap();
        let (again, _) = Ini::from_slice(&written).unwrap();
        assert_eq!(doc.root().node_count(), 9);
        assert_eq!(again.root().node_count(), 9);
        assert!(again.get_entry(b"root", Some(b"paths")).is_some());
        assert_eq!(again.root().to_entry(), doc.root().to_entry());
    }
}
