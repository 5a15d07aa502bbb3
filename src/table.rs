//! Generic delimited 2D tables.
//!
//! The input is cut into rows on the row delimiter and every row into cells
//! on the column delimiter. Rows that do not contain the column delimiter at
//! all are not data: they are kept verbatim as a single `Raw` key. Runs of
//! data rows and runs of raw rows are grouped into alternating blocks under
//! the root:
//!
//! ```text
//! root
//! ├── "Comment"  (BlockKind::Comment)   raw rows before the table
//! ├── "Table"    (BlockKind::Table)     one RowKind::Row per data row
//! └── "Comment"                         raw rows after it
//! ```
//!
//! The delimiters used for reading are recorded in the document metadata
//! and reused by the writer unless the caller overrides them.

use crate::document::{META_COLUMN_DELIMITER, META_ROW_DELIMITER};
use crate::scan::Scanner;
use crate::{
    Codec, Delimiter, Document, Entry, Format, Key, Result, TableOptions, Value, Warning,
};
use log::trace;

/// Kind of a block under the root.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(i32)]
pub enum BlockKind {
    Unknown = 0,
    Table = 1,
    Comment = 2,
}

/// Kind of a row inside a block.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(i32)]
pub enum RowKind {
    Raw = 0,
    Row = 1,
    /// A row whose cells name the columns, set by the CSV reader.
    Header = 2,
}

pub(crate) const TABLE_BLOCK_NAME: &[u8] = b"Table";
pub(crate) const COMMENT_BLOCK_NAME: &[u8] = b"Comment";

/// The 2D-table codec. Defaults: rows on `\n`, columns on a space.
#[derive(Clone, Copy, Debug, Default)]
pub struct Table;

impl Codec for Table {
    const FORMAT: Format = Format::Table;
    type Options = TableOptions;

    fn read_from(input: &[u8], doc: &mut Document, options: &TableOptions) -> Result<Vec<Warning>> {
        let row = options.row_delimiter_or_default();
        let column = options.column_delimiter_or_default();
        let blocks = parse_blocks(input, row.as_bytes(), column.as_bytes(), options);
        install(doc, blocks, Self::FORMAT, &row, &column);
        Ok(Vec::new())
    }

    fn write_to(doc: &Document, out: &mut Vec<u8>, options: &TableOptions) -> Result<()> {
        let row = resolve_delimiter(
            doc,
            &options.row_delimiter,
            META_ROW_DELIMITER,
            Delimiter::LineFeed,
        );
        let column = resolve_delimiter(
            doc,
            &options.column_delimiter,
            META_COLUMN_DELIMITER,
            Delimiter::Space,
        );
        write_blocks(doc, out, &row, &column);
        Ok(())
    }
}

/// Replaces the document with `blocks` and records the delimiters.
pub(crate) fn install(
    doc: &mut Document,
    blocks: Vec<Entry>,
    format: Format,
    row: &Delimiter,
    column: &Delimiter,
) {
    let mut root = Entry::new(BlockKind::Unknown as i32);
    root.subentries = blocks;
    *doc = Document::from_root(root);
    doc.stamp_format(format);
    doc.set_metadata(META_ROW_DELIMITER, Value::Chars(row.as_bytes().to_vec()));
    doc.set_metadata(META_COLUMN_DELIMITER, Value::Chars(column.as_bytes().to_vec()));
}

/// Explicit option, then the delimiter recorded at read time, then `default`.
pub(crate) fn resolve_delimiter(
    doc: &Document,
    explicit: &Option<Delimiter>,
    metadata_key: &[u8],
    default: Delimiter,
) -> Vec<u8> {
    if let Some(delimiter) = explicit {
        return delimiter.as_bytes().to_vec();
    }
    doc.metadata_value(metadata_key)
        .and_then(Value::as_bytes)
        .filter(|bytes| !bytes.is_empty())
        .map_or_else(|| default.as_bytes().to_vec(), <[u8]>::to_vec)
}

/// Cuts a row into cells. Returns `None` when the column delimiter does not
/// occur outside quotes.
///
/// A cell that starts with `"` extends to the next `"` that is followed by
/// the delimiter or the end of the row, so quoted cells may contain the
/// delimiter.
pub(crate) fn split_cells<'a>(row: &'a [u8], delimiter: &[u8]) -> Option<Vec<&'a [u8]>> {
    if delimiter.is_empty() {
        return None;
    }
    let mut cells = Vec::new();
    let mut start = 0;
    let mut pos = 0;
    let mut in_quotes = false;
    while pos < row.len() {
        let closes = |pos: usize| pos + 1 == row.len() || row[pos + 1..].starts_with(delimiter);
        match row[pos] {
            b'"' if !in_quotes && pos == start => in_quotes = true,
            b'"' if in_quotes && closes(pos) => in_quotes = false,
            _ if !in_quotes && row[pos..].starts_with(delimiter) => {
                cells.push(&row[start..pos]);
                pos += delimiter.len();
                start = pos;
                continue;
            }
            _ => {}
        }
        pos += 1;
    }
    if cells.is_empty() {
        return None;
    }
    cells.push(&row[start..]);
    Some(cells)
}

fn unquote(cell: &[u8]) -> &[u8] {
    if cell.len() >= 2 && cell[0] == b'"' && cell[cell.len() - 1] == b'"' {
        &cell[1..cell.len() - 1]
    } else {
        cell
    }
}

fn parse_row(row: &[u8], delimiter: &[u8], options: &TableOptions) -> Entry {
    let cells: Vec<&[u8]> = split_cells(row, delimiter)
        .unwrap_or_default()
        .into_iter()
        .filter(|cell| !(options.skip_empty_cells && cell.is_empty()))
        .collect();

    if cells.is_empty() {
        let mut raw = Entry::new(RowKind::Raw as i32);
        raw.add_key(Key::unnamed(Value::Raw(row.to_vec())));
        return raw;
    }

    let mut entry = Entry::new(RowKind::Row as i32);
    for cell in cells {
        let value = if options.guess_types {
            Value::guess(cell)
        } else {
            Value::Chars(unquote(cell).to_vec())
        };
        entry.add_key(Key::unnamed(value));
    }
    entry
}

/// Reads rows and groups them into alternating table and comment blocks.
pub(crate) fn parse_blocks(
    input: &[u8],
    row_delimiter: &[u8],
    column_delimiter: &[u8],
    options: &TableOptions,
) -> Vec<Entry> {
    let mut blocks = Vec::new();
    let mut current: Option<Entry> = None;
    let mut scan = Scanner::new(input);

    while !scan.is_eof() {
        let (row, _) = scan.read_until_or_end(row_delimiter);
        if options.skip_empty_rows && row.is_empty() {
            continue;
        }
        let line = parse_row(row, column_delimiter, options);
        trace!("row at {}: {} cells", scan.pos(), line.key_count());

        let (kind, name) = if line.kind == RowKind::Raw as i32 {
            (BlockKind::Comment, COMMENT_BLOCK_NAME)
        } else {
            (BlockKind::Table, TABLE_BLOCK_NAME)
        };
        let same_block = current.as_ref().is_some_and(|b| b.kind == kind as i32);
        if !same_block {
            blocks.extend(current.take());
            current = Some(Entry::named(name, kind as i32));
        }
        if let Some(block) = current.as_mut() {
            block.add_subentry(line);
        }
    }
    blocks.extend(current);
    blocks
}

fn needs_quotes(cell: &[u8], row: &[u8], column: &[u8]) -> bool {
    use crate::scan::find;
    find(cell, column).is_some()
        || find(cell, row).is_some()
        || (cell.len() >= 2 && cell[0] == b'"' && cell[cell.len() - 1] == b'"')
}

/// Writes every block's rows, each followed by the row delimiter.
pub(crate) fn write_blocks(doc: &Document, out: &mut Vec<u8>, row: &[u8], column: &[u8]) {
    for block in doc.root().subentries() {
        for line in block.subentries() {
            if line.kind() == RowKind::Raw as i32 {
                for key in line.keys() {
                    out.extend_from_slice(&key.value.to_text());
                }
            } else {
                for (index, key) in line.keys().iter().enumerate() {
                    if index > 0 {
                        out.extend_from_slice(column);
                    }
                    let cell = key.value.to_text();
                    if needs_quotes(&cell, row, column) {
                        out.push(b'"');
                        out.extend_from_slice(&cell);
                        out.push(b'"');
                    } else {
                        out.extend_from_slice(&cell);
                    }
                }
            }
            out.extend_from_slice(row);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cells(row: &[u8], delimiter: &[u8]) -> Option<Vec<Vec<u8>>> {
        split_cells(row, delimiter).map(|c| c.into_iter().map(<[u8]>::to_vec).collect())
    }

    #[test]
    fn test_split_cells() {
        assert_eq!(
            cells(b"a b  c", b" "),
            Some(vec![b"a".to_vec(), b"b".to_vec(), vec![], b"c".to_vec()])
        );
        assert_eq!(cells(b"single", b" "), None);
        assert_eq!(
            cells(b"\"x, y\",z", b","),
            Some(vec![b"\"x, y\"".to_vec(), b"z".to_vec()])
        );
        assert_eq!(
            cells(b"a::b", b"::"),
            Some(vec![b"a".to_vec(), b"b".to_vec()])
        );
        // only a quoted delimiter
        assert_eq!(cells(b"\"a,b\"", b","), None);
    }

    #[test]
    fn test_blocks_alternate() {
        let input = b"#fstab\n#header\n/dev/sda1 / ext4\n/dev/sda2 /home ext4\ntrailer\n";
        let (doc, _) = Table::from_slice(input).unwrap();
        let root = doc.root();
        let kinds: Vec<i32> = root.subentries().map(|b| b.kind()).collect();
        assert_eq!(
            kinds,
            vec![
                BlockKind::Comment as i32,
                BlockKind::Table as i32,
                BlockKind::Comment as i32
            ]
        );
        let table = root.subentry(1).unwrap();
        assert!(table.is_named(TABLE_BLOCK_NAME));
        assert_eq!(table.subentry_count(), 2);
        assert_eq!(
            table.subentry(1).unwrap().keys()[1].value,
            Value::Chars(b"/home".to_vec())
        );
    }

    #[test]
    fn test_skip_empty_cells_and_rows() {
        let options = TableOptions::new()
            .with_skip_empty_cells(true)
            .with_skip_empty_rows(true);
        let mut doc = Document::new();
        Table::read_from(b"a    b\n\n\nc  d\n", &mut doc, &options).unwrap();
        let table = doc.root().subentry(0).unwrap();
        assert_eq!(doc.root().subentry_count(), 1);
        assert_eq!(table.subentry_count(), 2);
        assert!(table.subentries().all(|row| row.key_count() == 2));
    }

    #[test]
    fn test_delimiters_come_back_from_metadata() {
        let options = TableOptions::new()
            .with_column_delimiter(Delimiter::Tab)
            .with_row_delimiter(Delimiter::CrLf);
        let mut doc = Document::new();
        Table::read_from(b"a\tb\r\nc\td\r\n", &mut doc, &options).unwrap();
        assert_eq!(Table::to_vec(&doc).unwrap(), b"a\tb\r\nc\td\r\n".to_vec());

        let options = TableOptions::new().with_column_delimiter("|");
        let piped = Table::to_vec_with(&doc, &options).unwrap();
        assert_eq!(piped, b"a|b\r\nc|d\r\n".to_vec());
    }

    #[test]
    fn test_quoted_cells_round_trip() {
        let (doc, _) = Table::from_slice(b"\"a b\" c\n").unwrap();
        let row = doc.root().subentry(0).unwrap().subentry(0).unwrap();
        assert_eq!(row.keys()[0].value, Value::Chars(b"a b".to_vec()));
        assert_eq!(Table::to_vec(&doc).unwrap(), b"\"a b\" c\n".to_vec());
    }

    #[test]
    fn test_guess_types() {
        let options = TableOptions::new().with_guess_types(true);
        let mut doc = Document::new();
        Table::read_from(b"1 2.5 true x\n", &mut doc, &options).unwrap();
        let row = doc.root().subentry(0).unwrap().subentry(0).unwrap();
        let values: Vec<&Value> = row.keys().iter().map(|k| &k.value).collect();
        assert_eq!(
            values,
            vec![
                &Value::Integer(1),
                &Value::Double(2.5),
                &Value::Bool(true),
                &Value::Raw(b"x".to_vec())
            ]
        );
    }

    #[test]
    fn test_missing_final_delimiter() {
        let (doc, _) = Table::from_slice(b"a b\nc d").unwrap();
        assert_eq!(doc.root().subentry(0).unwrap().subentry_count(), 2);
        assert_eq!(Table::to_vec(&doc).unwrap(), b"a b\nc d\n".to_vec());
    }
}
