//! Comma-separated values.
//!
//! CSV is a 2D table with `,` and `\n` as default delimiters, plus two
//! optional promotions applied to every table block after reading:
//!
//! - **column names**: the block's first row is marked
//!   [`RowKind::Header`] and each following row names its keys after the
//!   header cell in the same column
//! - **row names**: every row entry is named after its first cell
//!
//! Promotions only name things; the header row stays in the tree, so the
//! writer reproduces it like any other row.
//!
//! ```rust
//! use uconfig::{Codec, Csv};
//!
//! let (doc, _) = Csv::from_slice(b"id,port\nweb,80\ndb,5432\n").unwrap();
//! let db = doc.root().search_subentry(b"db", true).unwrap();
//! let fields = db.key_map();
//! assert_eq!(fields[&b"port"[..]].as_bytes(), Some(&b"5432"[..]));
//! ```

use crate::document::{META_COLUMN_DELIMITER, META_ROW_DELIMITER};
use crate::table::{self, BlockKind, RowKind};
use crate::{Codec, CsvOptions, Delimiter, Document, Entry, Format, Result, Warning};
use log::debug;

/// The CSV codec.
#[derive(Clone, Copy, Debug, Default)]
pub struct Csv;

impl Codec for Csv {
    const FORMAT: Format = Format::Csv;
    type Options = CsvOptions;

    fn read_from(input: &[u8], doc: &mut Document, options: &CsvOptions) -> Result<Vec<Warning>> {
        let row = options.table.row_delimiter.clone().unwrap_or(Delimiter::LineFeed);
        let column = options.table.column_delimiter.clone().unwrap_or(Delimiter::Comma);
        let mut blocks =
            table::parse_blocks(input, row.as_bytes(), column.as_bytes(), &options.table);
        for block in blocks.iter_mut().filter(|b| b.kind == BlockKind::Table as i32) {
            promote(block, options);
        }
        table::install(doc, blocks, Self::FORMAT, &row, &column);
        Ok(Vec::new())
    }

    fn write_to(doc: &Document, out: &mut Vec<u8>, options: &CsvOptions) -> Result<()> {
        let row = table::resolve_delimiter(
            doc,
            &options.table.row_delimiter,
            META_ROW_DELIMITER,
            Delimiter::LineFeed,
        );
        let column = table::resolve_delimiter(
            doc,
            &options.table.column_delimiter,
            META_COLUMN_DELIMITER,
            Delimiter::Comma,
        );
        table::write_blocks(doc, out, &row, &column);
        Ok(())
    }
}

/// Applies header and row-name promotion to one table block.
fn promote(block: &mut Entry, options: &CsvOptions) {
    if options.column_names {
        let names: Vec<Vec<u8>> = match block.subentries.first_mut() {
            Some(header) => {
                header.kind = RowKind::Header as i32;
                header.keys.iter().map(|k| k.value.to_text()).collect()
            }
            None => Vec::new(),
        };
        debug!("csv header with {} columns", names.len());
        for row in block.subentries.iter_mut().skip(1) {
            for (key, name) in row.keys.iter_mut().zip(&names) {
                key.name = Some(name.clone());
            }
        }
    }

    if options.row_names {
        for row in &mut block.subentries {
            if let Some(first) = row.keys.first() {
                row.name = Some(first.value.to_text());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{TableOptions, Value};

    #[test]
    fn test_header_promotion() {
        let (doc, _) = Csv::from_slice(b"name,size\nalpha,1\nbeta,2,extra\n").unwrap();
        let block = doc.root().subentry(0).unwrap();
        let header = block.subentry(0).unwrap();
        assert_eq!(header.kind(), RowKind::Header as i32);

        let beta = block.subentry(2).unwrap();
        assert!(beta.is_named(b"beta"));
        assert_eq!(
            beta.search_key(b"size").unwrap().value,
            Value::Chars(b"2".to_vec())
        );
        // cells past the header stay unnamed
        assert_eq!(beta.keys()[2].name(), None);
    }

    #[test]
    fn test_promotions_can_be_disabled() {
        let options = CsvOptions::new()
            .with_column_names(false)
            .with_row_names(false);
        let mut doc = Document::new();
        Csv::read_from(b"a,b\nc,d\n", &mut doc, &options).unwrap();
        let block = doc.root().subentry(0).unwrap();
        assert!(block
            .subentries()
            .all(|row| row.name().is_none() && row.kind() == RowKind::Row as i32));
        assert!(block.subentry(1).unwrap().keys()[0].name().is_none());
    }

    #[test]
    fn test_write_reproduces_input() {
        let input = b"# exported\nname,note\nx,\"a,b\"\n";
        let (doc, _) = Csv::from_slice(input).unwrap();
        assert_eq!(doc.format(), Some(Format::Csv));
        assert_eq!(Csv::to_vec(&doc).unwrap(), input.to_vec());
    }

    #[test]
    fn test_semicolon_dialect() {
        let options = CsvOptions::new()
            .with_table(TableOptions::new().with_column_delimiter(Delimiter::Semicolon));
        let mut doc = Document::new();
        Csv::read_from(b"k;v\na;1\n", &mut doc, &options).unwrap();
        assert_eq!(Csv::to_vec(&doc).unwrap(), b"k;v\na;1\n".to_vec());
    }
}
