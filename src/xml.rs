//! XML documents.
//!
//! Every node of the markup becomes an entry; the kind says which markup:
//!
//! | markup                     | kind                     | stored as                       |
//! |----------------------------|--------------------------|---------------------------------|
//! | `<name attr="v">…</name>`  | [`XmlKind::Element`]     | name, one `Chars` key per attr  |
//! | text between tags          | [`XmlKind::Text`]        | unnamed `Chars` key             |
//! | `<!-- … -->`               | [`XmlKind::Comment`]     | unnamed `Raw` key               |
//! | `<![CDATA[ … ]]>`          | [`XmlKind::CData`]       | unnamed `Raw` key               |
//! | `<?target a="v"?>`         | [`XmlKind::Declaration`] | name = target, attribute keys   |
//! | `<!DOCTYPE …>`             | [`XmlKind::Doctype`]     | unnamed `Raw` key               |
//!
//! Unknown `<!…>` markup is kept verbatim as a `Text` entry holding a `Raw`
//! key. The predefined entities and numeric character references are
//! decoded in attribute values and text; the writer escapes them again, so
//! values coming from other formats always produce well-formed markup.
//! Names that are not valid XML names have their offending bytes replaced
//! with `_` on write.
//!
//! The reader never fails on malformed markup. A closing tag that does not
//! match the open element still closes it and is reported as
//! [`Warning::TagMismatch`]; unterminated sections, tags and elements are
//! reported as warnings as well.
//!
//! ```rust
//! use uconfig::{Codec, Value, Warning, Xml};
//!
//! let (doc, warnings) = Xml::from_slice(b"<config><port value=\"80\"/></confg>").unwrap();
//! let port = doc.get_entry(b"port", Some(b"config")).unwrap();
//! assert_eq!(port.search_key(b"value").unwrap().value, Value::from("80"));
//! assert!(matches!(warnings[0], Warning::TagMismatch { .. }));
//! ```

use crate::scan::{is_blank, trim, write_indentation, Scanner};
use crate::{
    Codec, Document, Entry, EntryRef, Error, Format, Key, Result, Value, Warning, XmlOptions,
};
use log::{trace, warn};

/// Entry kinds produced by the XML reader.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(i32)]
pub enum XmlKind {
    Unknown = 0,
    Element = 1,
    Comment = 2,
    CData = 3,
    Declaration = 4,
    Doctype = 5,
    Text = 6,
}

impl XmlKind {
    pub fn from_i32(kind: i32) -> Option<Self> {
        match kind {
            0 => Some(XmlKind::Unknown),
            1 => Some(XmlKind::Element),
            2 => Some(XmlKind::Comment),
            3 => Some(XmlKind::CData),
            4 => Some(XmlKind::Declaration),
            5 => Some(XmlKind::Doctype),
            6 => Some(XmlKind::Text),
            _ => None,
        }
    }
}

/// Element name used when writing an unnamed entry.
const FALLBACK_ELEMENT_NAME: &[u8] = b"entry";

/// Attribute name for unnamed keys that cannot be written as a bare token.
const FALLBACK_ATTRIBUTE_NAME: &[u8] = b"_";

/// The XML codec.
#[derive(Clone, Copy, Debug, Default)]
pub struct Xml;

impl Codec for Xml {
    const FORMAT: Format = Format::Xml;
    type Options = XmlOptions;

    fn read_from(input: &[u8], doc: &mut Document, options: &XmlOptions) -> Result<Vec<Warning>> {
        let mut reader = Reader {
            scan: Scanner::new(input),
            options,
            warnings: Vec::new(),
        };
        let mut root = Entry::new(XmlKind::Unknown as i32);
        reader.parse_content(&mut root, false, 0)?;
        *doc = Document::from_root(root);
        doc.stamp_format(Self::FORMAT);
        Ok(reader.warnings)
    }

    fn write_to(doc: &Document, out: &mut Vec<u8>, options: &XmlOptions) -> Result<()> {
        for node in doc.root().subentries() {
            write_node(out, node, 0, options.indent);
        }
        Ok(())
    }
}

struct Reader<'a> {
    scan: Scanner<'a>,
    options: &'a XmlOptions,
    warnings: Vec<Warning>,
}

impl<'a> Reader<'a> {
    fn warn(&mut self, warning: Warning) {
        warn!("{}", warning);
        self.warnings.push(warning);
    }

    fn push_text(&self, parent: &mut Entry, text: &[u8]) {
        let text = if self.options.trim_text { trim(text) } else { text };
        if text.is_empty() || (self.options.skip_blank_text && is_blank(text)) {
            return;
        }
        let mut node = Entry::new(XmlKind::Text as i32);
        node.add_key(Key::unnamed(Value::Chars(decode_entities(text))));
        parent.add_subentry(node);
    }

    /// Reads up to `terminator`, or to the end of input with a warning.
    fn read_section(&mut self, terminator: &[u8], kind: &'static str, offset: usize) -> &'a [u8] {
        let (span, found) = self.scan.read_until_or_end(terminator);
        if !found {
            self.warn(Warning::UnterminatedSection { kind, offset });
        }
        span
    }

    /// Reads a doctype body up to the `>` outside its internal subset.
    fn read_doctype(&mut self, offset: usize) -> &'a [u8] {
        let rest = self.scan.rest();
        let mut depth = 0usize;
        for (index, &byte) in rest.iter().enumerate() {
            match byte {
                b'[' => depth += 1,
                b']' => depth = depth.saturating_sub(1),
                b'>' if depth == 0 => {
                    self.scan.advance(index + 1);
                    return &rest[..index];
                }
                _ => {}
            }
        }
        self.scan.advance(rest.len());
        self.warn(Warning::UnterminatedSection {
            kind: "doctype",
            offset,
        });
        rest
    }

    /// Reads a tag body up to the `>` that is not inside a quoted value.
    fn read_tag_body(&mut self) -> Option<&'a [u8]> {
        let rest = self.scan.rest();
        let mut quote = None;
        for (index, &byte) in rest.iter().enumerate() {
            match (quote, byte) {
                (None, b'"' | b'\'') => quote = Some(byte),
                (Some(q), _) if byte == q => quote = None,
                (None, b'>') => {
                    self.scan.advance(index + 1);
                    return Some(&rest[..index]);
                }
                _ => {}
            }
        }
        self.scan.advance(rest.len());
        None
    }

    /// Reads nodes into `parent` until its closing tag, or to the end of
    /// input at document level.
    fn parse_content(&mut self, parent: &mut Entry, in_element: bool, depth: usize) -> Result<()> {
        loop {
            let text = self.scan.take_while(|b| b != b'<');
            self.push_text(parent, text);
            if self.scan.is_eof() {
                if in_element {
                    self.warn(Warning::UnclosedContainer { what: "element" });
                }
                return Ok(());
            }

            let offset = self.scan.pos();
            let markup = self.scan.rest();
            if self.scan.peek_cmp(b"<!--") {
                self.scan.advance(4);
                let span = self.read_section(b"-->", "comment", offset);
                parent.add_subentry(raw_node(XmlKind::Comment, span));
            } else if self.scan.peek_cmp(b"<![CDATA[") {
                self.scan.advance(9);
                let span = self.read_section(b"]]>", "CDATA section", offset);
                parent.add_subentry(raw_node(XmlKind::CData, span));
            } else if self.scan.peek_cmp(b"<?") {
                self.scan.advance(2);
                let span = self.read_section(b"?>", "declaration", offset);
                parent.add_subentry(declaration(span));
            } else if self.scan.peek_cmp(b"<!DOCTYPE") {
                self.scan.advance(9);
                let span = self.read_doctype(offset);
                parent.add_subentry(raw_node(XmlKind::Doctype, span));
            } else if self.scan.peek_cmp(b"<!") {
                self.scan.advance(2);
                self.read_section(b">", "markup", offset);
                let span = &markup[..self.scan.pos() - offset];
                parent.add_subentry(raw_node(XmlKind::Text, span));
            } else if self.scan.peek_cmp(b"</") {
                self.scan.advance(2);
                let (name, found) = self.scan.read_until_or_end(b">");
                if !found {
                    self.warn(Warning::UnterminatedTag { offset });
                }
                let name = trim(name);
                if !in_element {
                    self.warn(Warning::UnbalancedClose { what: "tag", offset });
                    continue;
                }
                if parent.name() != Some(name) {
                    self.warn(Warning::TagMismatch {
                        expected: String::from_utf8_lossy(parent.name().unwrap_or_default())
                            .into_owned(),
                        found: String::from_utf8_lossy(name).into_owned(),
                        offset,
                    });
                }
                return Ok(());
            } else {
                self.scan.bump();
                let Some(body) = self.read_tag_body() else {
                    self.warn(Warning::UnterminatedTag { offset });
                    if in_element {
                        self.warn(Warning::UnclosedContainer { what: "element" });
                    }
                    return Ok(());
                };
                self.parse_element(parent, body, offset, depth)?;
            }
        }
    }

    fn parse_element(
        &mut self,
        parent: &mut Entry,
        body: &[u8],
        offset: usize,
        depth: usize,
    ) -> Result<()> {
        let self_closing = body.last() == Some(&b'/');
        let body = if self_closing { &body[..body.len() - 1] } else { body };
        let name_len = body
            .iter()
            .position(u8::is_ascii_whitespace)
            .unwrap_or(body.len());
        let (name, attributes) = body.split_at(name_len);
        if name.is_empty() {
            // not a tag, e.g. a stray "< " in text
            let mut text = Entry::new(XmlKind::Text as i32);
            text.add_key(Key::unnamed(Value::Raw([&b"<"[..], body, &b">"[..]].concat())));
            parent.add_subentry(text);
            return Ok(());
        }

        trace!("element <{}> at {}", String::from_utf8_lossy(name), offset);
        let mut element = Entry::named(name, XmlKind::Element as i32);
        element.keys = parse_attributes(attributes);
        if !self_closing {
            if depth + 1 > self.options.max_depth {
                return Err(Error::DepthExceeded {
                    limit: self.options.max_depth,
                    offset,
                });
            }
            self.parse_content(&mut element, true, depth + 1)?;
        }
        parent.add_subentry(element);
        Ok(())
    }
}

fn raw_node(kind: XmlKind, span: &[u8]) -> Entry {
    let mut node = Entry::new(kind as i32);
    node.add_key(Key::unnamed(Value::Raw(span.to_vec())));
    node
}

/// `target a="b" c='d' flag` → name `target`, keys `a`, `c`, unnamed `flag`.
fn declaration(span: &[u8]) -> Entry {
    let span = trim(span);
    let target_len = span
        .iter()
        .position(u8::is_ascii_whitespace)
        .unwrap_or(span.len());
    let (target, attributes) = span.split_at(target_len);
    let mut node = Entry::named(target, XmlKind::Declaration as i32);
    node.keys = parse_attributes(attributes);
    node
}

/// Parses `name="value"` pairs. Bare tokens become unnamed `Raw` keys.
fn parse_attributes(input: &[u8]) -> Vec<Key> {
    let mut scan = Scanner::new(input);
    let mut keys = Vec::new();
    loop {
        scan.skip_whitespace();
        if scan.is_eof() {
            break;
        }
        let name = scan.take_while(|b| !b.is_ascii_whitespace() && b != b'=');
        scan.skip_whitespace();
        if scan.peek() != Some(b'=') {
            keys.push(Key::unnamed(Value::Raw(name.to_vec())));
            continue;
        }
        scan.bump();
        scan.skip_whitespace();
        let value = match scan.peek() {
            Some(quote @ (b'"' | b'\'')) => {
                scan.bump();
                scan.read_until_or_end(&[quote]).0
            }
            _ => scan.take_while(|b| !b.is_ascii_whitespace()),
        };
        keys.push(Key::new(name, Value::Chars(decode_entities(value))));
    }
    keys
}

fn write_payload(out: &mut Vec<u8>, node: EntryRef<'_>) {
    for key in node.keys() {
        out.extend_from_slice(&key.value.to_text());
    }
}

/// Text content: `Chars` is escaped, `Raw` markup is written as is.
fn write_text(out: &mut Vec<u8>, node: EntryRef<'_>) {
    for key in node.keys() {
        match &key.value {
            Value::Raw(bytes) => out.extend_from_slice(bytes),
            other => escape_into(out, &other.to_text(), false),
        }
    }
}

/// Decodes `&amp;`, `&lt;`, `&gt;`, `&quot;`, `&apos;` and `&#N;`/`&#xN;`.
/// Anything else after a `&` is kept verbatim.
fn decode_entities(input: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(input.len());
    let mut pos = 0;
    while pos < input.len() {
        if input[pos] == b'&' {
            let end = input[pos..].iter().take(12).position(|&b| b == b';');
            if let Some(end) = end {
                if let Some(decoded) = decode_entity(&input[pos + 1..pos + end]) {
                    let mut buffer = [0u8; 4];
                    out.extend_from_slice(decoded.encode_utf8(&mut buffer).as_bytes());
                    pos += end + 1;
                    continue;
                }
            }
        }
        out.push(input[pos]);
        pos += 1;
    }
    out
}

fn decode_entity(name: &[u8]) -> Option<char> {
    match name {
        b"amp" => Some('&'),
        b"lt" => Some('<'),
        b"gt" => Some('>'),
        b"quot" => Some('"'),
        b"apos" => Some('\''),
        [b'#', b'x' | b'X', hex @ ..] => std::str::from_utf8(hex)
            .ok()
            .and_then(|hex| u32::from_str_radix(hex, 16).ok())
            .and_then(char::from_u32),
        [b'#', digits @ ..] => std::str::from_utf8(digits)
            .ok()
            .and_then(|digits| digits.parse::<u32>().ok())
            .and_then(char::from_u32),
        _ => None,
    }
}

fn escape_into(out: &mut Vec<u8>, text: &[u8], in_attribute: bool) {
    for &byte in text {
        match byte {
            b'&' => out.extend_from_slice(b"&amp;"),
            b'<' => out.extend_from_slice(b"&lt;"),
            b'>' => out.extend_from_slice(b"&gt;"),
            b'"' if in_attribute => out.extend_from_slice(b"&quot;"),
            _ => out.push(byte),
        }
    }
}

fn is_name_byte(byte: u8) -> bool {
    !byte.is_ascii_whitespace()
        && !matches!(byte, b'<' | b'>' | b'"' | b'\'' | b'=' | b'/' | b'&' | b'?' | b'!')
}

/// Writes `name` with every byte that cannot appear in a name replaced by `_`.
fn write_name(out: &mut Vec<u8>, name: &[u8], fallback: &[u8]) {
    if name.is_empty() {
        out.extend_from_slice(fallback);
        return;
    }
    out.extend(name.iter().map(|&b| if is_name_byte(b) { b } else { b'_' }));
}

fn write_attributes(out: &mut Vec<u8>, keys: &[Key]) {
    for key in keys {
        let text = key.value.to_text();
        let name = match key.name() {
            Some(name) => name,
            None => {
                let token = trim(&text);
                if token.is_empty() {
                    continue;
                }
                if token.iter().all(|&b| is_name_byte(b)) {
                    out.push(b' ');
                    out.extend_from_slice(token);
                    continue;
                }
                FALLBACK_ATTRIBUTE_NAME
            }
        };
        out.push(b' ');
        write_name(out, name, FALLBACK_ATTRIBUTE_NAME);
        out.extend_from_slice(b"=\"");
        escape_into(out, &text, true);
        out.push(b'"');
    }
}

fn write_node(out: &mut Vec<u8>, node: EntryRef<'_>, level: usize, indent: usize) {
    write_indentation(out, level, indent);
    match XmlKind::from_i32(node.kind()) {
        Some(XmlKind::Comment) => {
            out.extend_from_slice(b"<!--");
            write_payload(out, node);
            out.extend_from_slice(b"-->");
        }
        Some(XmlKind::CData) => {
            out.extend_from_slice(b"<![CDATA[");
            write_payload(out, node);
            out.extend_from_slice(b"]]>");
        }
        Some(XmlKind::Declaration) => {
            out.extend_from_slice(b"<?");
            out.extend_from_slice(node.name().unwrap_or(b"xml"));
            write_attributes(out, node.keys());
            out.extend_from_slice(b"?>");
        }
        Some(XmlKind::Doctype) => {
            out.extend_from_slice(b"<!DOCTYPE");
            write_payload(out, node);
            out.push(b'>');
        }
        Some(XmlKind::Text) => write_text(out, node),
        _ => write_element(out, node, level, indent),
    }
    out.push(b'\n');
}

fn write_element(out: &mut Vec<u8>, node: EntryRef<'_>, level: usize, indent: usize) {
    let name = node.name().unwrap_or_default();
    out.push(b'<');
    write_name(out, name, FALLBACK_ELEMENT_NAME);
    write_attributes(out, node.keys());

    let inline_text = node
        .subentry(0)
        .filter(|child| node.subentry_count() == 1 && child.kind() == XmlKind::Text as i32);
    if node.subentry_count() == 0 {
        out.extend_from_slice(b" />");
        return;
    }
    out.push(b'>');
    match inline_text {
        Some(text) => write_text(out, text),
        None => {
            out.push(b'\n');
            for child in node.subentries() {
                write_node(out, child, level + 1, indent);
            }
            write_indentation(out, level, indent);
        }
    }
    out.extend_from_slice(b"</");
    write_name(out, name, FALLBACK_ELEMENT_NAME);
    out.push(b'>');
}
