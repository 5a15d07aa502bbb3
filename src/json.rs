//! JSON documents.
//!
//! Objects and arrays become entries of kind [`JsonKind::Object`] and
//! [`JsonKind::Array`]; scalars become keys of their container. Member names
//! are the entry or key names, array elements are unnamed. Top-level values
//! are stored under the root in the same way, so a file holding one object
//! yields a root with a single unnamed object subentry.
//!
//! Scalars are stored with their native type: strings as `Chars` with
//! escapes decoded, `true`/`false` as `Bool`, and numbers as `Integer` or
//! `Double` when [`Value::guess`] recognizes them. Anything else (`null`,
//! exponents, integers wider than 32 bits) is kept as `Raw` text and written
//! back verbatim. `Raw` text that is not a JSON literal, such as values read
//! from an INI file, is written as a string.
//!
//! A container stores its scalars and its nested containers in two separate
//! lists, so the writer emits all scalar members before nested ones.
//!
//! ```rust
//! use uconfig::{Codec, Json, Value};
//!
//! let (doc, _) = Json::from_slice(br#"{"name": "demo", "ports": [80, 443]}"#).unwrap();
//! let object = doc.root().subentry(0).unwrap();
//! assert_eq!(object.search_key(b"name").unwrap().value, Value::from("demo"));
//! let ports = object.search_subentry(b"ports", false).unwrap();
//! assert_eq!(ports.keys()[1].value, Value::Integer(443));
//! ```

use crate::scan::{write_indentation, Scanner};
use crate::{
    Codec, Document, Entry, EntryRef, Error, Format, JsonOptions, Key, Result, Value, Warning,
};
use log::{trace, warn};

/// Entry kinds produced by the JSON reader.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(i32)]
pub enum JsonKind {
    Unknown = 0,
    Object = 1,
    Array = 16,
}

/// The JSON codec.
#[derive(Clone, Copy, Debug, Default)]
pub struct Json;

impl Codec for Json {
    const FORMAT: Format = Format::Json;
    type Options = JsonOptions;

    fn read_from(input: &[u8], doc: &mut Document, options: &JsonOptions) -> Result<Vec<Warning>> {
        let mut reader = Reader {
            scan: Scanner::new(input),
            max_depth: options.max_depth,
            warnings: Vec::new(),
        };
        let mut root = Entry::new(JsonKind::Object as i32);
        reader.parse_members(&mut root, None, 0)?;
        *doc = Document::from_root(root);
        doc.stamp_format(Self::FORMAT);
        Ok(reader.warnings)
    }

    fn write_to(doc: &Document, out: &mut Vec<u8>, options: &JsonOptions) -> Result<()> {
        let root = doc.root();
        let named = root.keys().iter().any(|k| k.name().is_some())
            || root.subentries().any(|e| e.name().is_some());
        if named {
            write_container(out, root, 0, options.indent);
            out.push(b'\n');
            return Ok(());
        }

        let mut first = true;
        for key in root.keys() {
            if !std::mem::take(&mut first) {
                out.extend_from_slice(b",\n");
            }
            write_scalar(out, &key.value);
        }
        for entry in root.subentries() {
            if !std::mem::take(&mut first) {
                out.extend_from_slice(b",\n");
            }
            write_container(out, entry, 0, options.indent);
        }
        if !first {
            out.push(b'\n');
        }
        Ok(())
    }
}

enum Item {
    Scalar(Value),
    Container(Entry),
}

struct Reader<'a> {
    scan: Scanner<'a>,
    max_depth: usize,
    warnings: Vec<Warning>,
}

impl Reader<'_> {
    fn warn(&mut self, warning: Warning) {
        warn!("{}", warning);
        self.warnings.push(warning);
    }

    /// Reads members into `container` until `close`, or to the end of input
    /// for the top level.
    fn parse_members(
        &mut self,
        container: &mut Entry,
        close: Option<u8>,
        depth: usize,
    ) -> Result<()> {
        let mut name: Option<Vec<u8>> = None;
        loop {
            self.scan.skip_whitespace();
            let Some(byte) = self.scan.peek() else {
                if close.is_some() {
                    let what = if close == Some(b'}') { "object" } else { "array" };
                    self.warn(Warning::UnclosedContainer { what });
                }
                break;
            };
            match byte {
                b',' => {
                    self.scan.bump();
                    flush_dangling(container, name.take());
                }
                b':' => {
                    self.scan.bump();
                }
                b'}' | b']' => {
                    let offset = self.scan.pos();
                    self.scan.bump();
                    if Some(byte) == close {
                        break;
                    }
                    let what = if byte == b'}' { "brace" } else { "bracket" };
                    self.warn(Warning::UnbalancedClose { what, offset });
                    if close.is_some() {
                        break;
                    }
                }
                _ => {
                    let item = self.parse_value(depth)?;
                    self.scan.skip_whitespace();
                    if name.is_none() && self.scan.peek() == Some(b':') {
                        if let Item::Scalar(value) = &item {
                            self.scan.bump();
                            name = Some(value.to_text());
                            continue;
                        }
                    }
                    attach(container, name.take(), item);
                }
            }
        }
        flush_dangling(container, name);
        Ok(())
    }

    fn parse_value(&mut self, depth: usize) -> Result<Item> {
        match self.scan.peek() {
            Some(b'{') => self.parse_container(JsonKind::Object, b'}', depth + 1),
            Some(b'[') => self.parse_container(JsonKind::Array, b']', depth + 1),
            Some(b'"') => Ok(Item::Scalar(Value::Chars(self.parse_string()))),
            _ => {
                let token = self.scan.take_while(|b| {
                    !b.is_ascii_whitespace()
                        && !matches!(b, b',' | b':' | b'{' | b'}' | b'[' | b']' | b'"')
                });
                Ok(Item::Scalar(Value::guess(token)))
            }
        }
    }

    fn parse_container(&mut self, kind: JsonKind, close: u8, depth: usize) -> Result<Item> {
        if depth > self.max_depth {
            return Err(Error::DepthExceeded {
                limit: self.max_depth,
                offset: self.scan.pos(),
            });
        }
        trace!("{:?} at {} (depth {})", kind, self.scan.pos(), depth);
        self.scan.bump();
        let mut entry = Entry::new(kind as i32);
        self.parse_members(&mut entry, Some(close), depth)?;
        Ok(Item::Container(entry))
    }

    /// Reads a string literal and decodes its escapes.
    fn parse_string(&mut self) -> Vec<u8> {
        let start = self.scan.pos();
        self.scan.bump();
        let mut text = Vec::new();
        loop {
            match self.scan.bump() {
                None => {
                    self.warn(Warning::UnterminatedSection {
                        kind: "string",
                        offset: start,
                    });
                    break;
                }
                Some(b'"') => break,
                Some(b'\\') => self.parse_escape(&mut text),
                Some(byte) => text.push(byte),
            }
        }
        text
    }

    fn parse_escape(&mut self, text: &mut Vec<u8>) {
        let Some(byte) = self.scan.bump() else {
            text.push(b'\\');
            return;
        };
        match byte {
            b'n' => text.push(b'\n'),
            b't' => text.push(b'\t'),
            b'r' => text.push(b'\r'),
            b'b' => text.push(0x08),
            b'f' => text.push(0x0c),
            b'"' | b'\\' | b'/' => text.push(byte),
            b'u' => match self.parse_unicode() {
                Some(ch) => {
                    let mut buf = [0u8; 4];
                    text.extend_from_slice(ch.encode_utf8(&mut buf).as_bytes());
                }
                None => text.extend_from_slice(b"\\u"),
            },
            other => {
                text.push(b'\\');
                text.push(other);
            }
        }
    }

    fn hex4(&mut self) -> Option<u32> {
        let digits = self.scan.rest().get(..4)?;
        let code = u32::from_str_radix(std::str::from_utf8(digits).ok()?, 16).ok()?;
        self.scan.advance(4);
        Some(code)
    }

    /// Decodes the code point after `\u`, joining surrogate pairs. On failure
    /// nothing past the `u` is consumed.
    fn parse_unicode(&mut self) -> Option<char> {
        let high = self.hex4()?;
        if !(0xD800..0xDC00).contains(&high) {
            return char::from_u32(high);
        }
        if self.scan.peek_cmp(b"\\u") {
            let saved = self.scan.clone();
            self.scan.advance(2);
            if let Some(low) = self.hex4().filter(|low| (0xDC00..0xE000).contains(low)) {
                return char::from_u32(0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00));
            }
            self.scan = saved;
        }
        Some(char::REPLACEMENT_CHARACTER)
    }
}

/// A member name followed by no value keeps its name with an empty payload.
fn flush_dangling(container: &mut Entry, name: Option<Vec<u8>>) {
    if let Some(name) = name {
        container.add_key(Key::new(name, Value::Raw(Vec::new())));
    }
}

fn attach(container: &mut Entry, name: Option<Vec<u8>>, item: Item) {
    match item {
        Item::Scalar(value) => container.add_key(Key { name, value }),
        Item::Container(mut entry) => {
            entry.name = name;
            container.add_subentry(entry);
        }
    }
}

fn write_string(out: &mut Vec<u8>, text: &[u8]) {
    out.push(b'"');
    for &byte in text {
        match byte {
            b'"' => out.extend_from_slice(b"\\\""),
            b'\\' => out.extend_from_slice(b"\\\\"),
            b'\n' => out.extend_from_slice(b"\\n"),
            b'\r' => out.extend_from_slice(b"\\r"),
            b'\t' => out.extend_from_slice(b"\\t"),
            0x08 => out.extend_from_slice(b"\\b"),
            0x0c => out.extend_from_slice(b"\\f"),
            0x00..=0x1f => out.extend_from_slice(format!("\\u{:04x}", byte).as_bytes()),
            _ => out.push(byte),
        }
    }
    out.push(b'"');
}

fn write_scalar(out: &mut Vec<u8>, value: &Value) {
    match value {
        Value::Chars(text) => write_string(out, text),
        Value::Raw(bytes) if bytes.is_empty() => out.extend_from_slice(b"null"),
        Value::Raw(bytes) if !is_literal(bytes) => write_string(out, bytes),
        Value::Float(f) if !f.is_finite() => out.extend_from_slice(b"null"),
        Value::Double(d) if !d.is_finite() => out.extend_from_slice(b"null"),
        other => out.extend_from_slice(&other.to_text()),
    }
}

/// `null`, `true`, `false` or a number in JSON syntax.
fn is_literal(token: &[u8]) -> bool {
    if matches!(token, b"null" | b"true" | b"false") {
        return true;
    }
    let mut scan = Scanner::new(token);
    if scan.peek() == Some(b'-') {
        scan.bump();
    }
    if scan.take_while(|b| b.is_ascii_digit()).is_empty() {
        return false;
    }
    if scan.peek() == Some(b'.') {
        scan.bump();
        if scan.take_while(|b| b.is_ascii_digit()).is_empty() {
            return false;
        }
    }
    if matches!(scan.peek(), Some(b'e' | b'E')) {
        scan.bump();
        if matches!(scan.peek(), Some(b'+' | b'-')) {
            scan.bump();
        }
        if scan.take_while(|b| b.is_ascii_digit()).is_empty() {
            return false;
        }
    }
    scan.is_eof()
}

fn write_container(out: &mut Vec<u8>, entry: EntryRef<'_>, level: usize, indent: usize) {
    let is_array = entry.kind() == JsonKind::Array as i32;
    let (open, close) = if is_array { (b'[', b']') } else { (b'{', b'}') };
    out.push(open);
    if entry.key_count() == 0 && entry.subentry_count() == 0 {
        out.push(close);
        return;
    }

    let member = |out: &mut Vec<u8>, name: Option<&[u8]>, first: bool| {
        if !first {
            out.push(b',');
        }
        out.push(b'\n');
        write_indentation(out, level + 1, indent);
        if !is_array {
            write_string(out, name.unwrap_or_default());
            out.extend_from_slice(b": ");
        }
    };

    let mut first = true;
    for key in entry.keys() {
        member(out, key.name(), std::mem::take(&mut first));
        write_scalar(out, &key.value);
    }
    for child in entry.subentries() {
        member(out, child.name(), std::mem::take(&mut first));
        write_container(out, child, level + 1, indent);
    }
    out.push(b'\n');
    write_indentation(out, level, indent);
    out.push(close);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(input: &[u8]) -> (Document, Vec<Warning>) {
        Json::from_slice(input).unwrap()
    }

    #[test]
    fn test_nested_structure() {
        let (doc, warnings) = parse(br#"{"a": {"b": [1, 2.5, true, "x"]}, "c": null}"#);
        assert!(warnings.is_empty());
        let object = doc.root().subentry(0).unwrap();
        assert_eq!(object.kind(), JsonKind::Object as i32);
        assert_eq!(
            object.search_key(b"c").unwrap().value,
            Value::Raw(b"null".to_vec())
        );

        let list = doc.root().search_subentry(b"b", true).unwrap();
        assert_eq!(list.kind(), JsonKind::Array as i32);
        let values: Vec<&Value> = list.keys().iter().map(|k| &k.value).collect();
        assert_eq!(
            values,
            vec![
                &Value::Integer(1),
                &Value::Double(2.5),
                &Value::Bool(true),
                &Value::Chars(b"x".to_vec())
            ]
        );
        assert!(list.keys().iter().all(|k| k.name().is_none()));
    }

    #[test]
    fn test_delimiters_inside_strings() {
        let (doc, _) = parse(br#"{"k,ey": "a}b]c:d"}"#);
        let object = doc.root().subentry(0).unwrap();
        assert_eq!(
            object.search_key(b"k,ey").unwrap().value,
            Value::Chars(b"a}b]c:d".to_vec())
        );
    }

    #[test]
    fn test_escapes() {
        let (doc, _) = parse(r#"["line\nbreak \"q\" é 😀 \/"]"#.as_bytes());
        let value = &doc.root().subentry(0).unwrap().keys()[0].value;
        assert_eq!(value.as_str(), Some("line\nbreak \"q\" \u{e9} \u{1f600} /"));

        let out = Json::to_vec(&doc).unwrap();
        let (again, _) = Json::from_slice(&out).unwrap();
        assert_eq!(again.root().to_entry(), doc.root().to_entry());
    }

    #[test]
    fn test_write_layout() {
        let (doc, _) = parse(br#"{"name":"demo","list":[1,{}],"empty":[]}"#);
        let options = JsonOptions::new().with_indent(2);
        let out = String::from_utf8(Json::to_vec_with(&doc, &options).unwrap()).unwrap();
        let expected = "{\n  \"name\": \"demo\",\n  \"list\": [\n    1,\n    {}\n  ],\n  \"empty\": []\n}\n";
        assert_eq!(out, expected);
    }

    #[test]
    fn test_lenient_input() {
        let (doc, warnings) = parse(b"{\"a\": 1, \"b\": [1, 2}");
        assert_eq!(
            warnings,
            vec![
                Warning::UnbalancedClose { what: "brace", offset: 19 },
                Warning::UnclosedContainer { what: "object" }
            ]
        );
        let object = doc.root().subentry(0).unwrap();
        assert_eq!(object.search_subentry(b"b", false).unwrap().key_count(), 2);

        let (doc, warnings) = parse(b"{\"a\": 1} trailing");
        assert!(warnings.is_empty());
        assert_eq!(doc.root().key_count(), 1);
    }

    #[test]
    fn test_depth_guard() {
        let deep = "[".repeat(40);
        let options = JsonOptions::new().with_max_depth(32);
        let mut doc = Document::new();
        let err = Json::read_from(deep.as_bytes(), &mut doc, &options).unwrap_err();
        assert!(matches!(err, Error::DepthExceeded { limit: 32, .. }));

        let ok = "[".repeat(10) + &"]".repeat(10);
        assert!(Json::read_from(ok.as_bytes(), &mut doc, &options).is_ok());
    }

    #[test]
    fn test_large_numbers_stay_verbatim() {
        let (doc, _) = parse(b"[12345678901, 1.5e3, -7]");
        let list = doc.root().subentry(0).unwrap();
        assert_eq!(list.keys()[0].value, Value::Raw(b"12345678901".to_vec()));
        assert_eq!(list.keys()[1].value, Value::Raw(b"1.5e3".to_vec()));
        assert_eq!(list.keys()[2].value, Value::Integer(-7));
        let out = Json::to_vec(&doc).unwrap();
        assert!(String::from_utf8(out).unwrap().contains("12345678901"));
    }

    #[test]
    fn test_foreign_raw_text_is_quoted() {
        let mut section = Entry::named("server", JsonKind::Object as i32);
        section.add_key(Key::new("host", Value::Raw(b"db.local".to_vec())));
        section.add_key(Key::new("port", Value::Raw(b"5432".to_vec())));
        section.add_key(Key::new("scale", Value::Raw(b"-1.5E+3".to_vec())));
        let mut root = Entry::new(JsonKind::Object as i32);
        root.add_subentry(section);

        let out = Json::to_vec(&Document::from_root(root)).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("\"host\": \"db.local\""));
        assert!(text.contains("\"port\": 5432"));
        assert!(text.contains("\"scale\": -1.5E+3"));
        assert!(!is_literal(b"1."));
        assert!(!is_literal(b"-"));
        assert!(!is_literal(b"0x10"));
    }
}
