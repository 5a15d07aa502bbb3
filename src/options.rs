//! Configuration options for the codecs.
//!
//! This module provides the per-format knobs passed to the `*_with` entry
//! points of [`Codec`](crate::Codec):
//!
//! - [`Delimiter`]: row and column separators for 2D tables and CSV
//! - [`TableOptions`], [`CsvOptions`]: delimiters, blank-cell handling and
//!   header promotion
//! - [`IniOptions`]: comment marker used when writing
//! - [`JsonOptions`], [`XmlOptions`]: depth guard and indentation
//!
//! Delimiters left unset on a table writer are taken from the document's
//! metadata, which the reader filled in, and only then from the defaults.
//!
//! ## Examples
//!
//! ```rust
//! use uconfig::{Delimiter, TableOptions};
//!
//! let options = TableOptions::new()
//!     .with_column_delimiter(Delimiter::Tab)
//!     .with_skip_empty_cells(true);
//! assert_eq!(options.column_delimiter, Some(Delimiter::Tab));
//! ```

/// Default nesting limit for the recursive JSON and XML readers.
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// A row or column separator.
///
/// Separators are byte strings; `Custom` covers anything multi-byte that the
/// named variants do not.
///
/// # Examples
///
/// ```rust
/// use uconfig::Delimiter;
///
/// assert_eq!(Delimiter::Comma.as_bytes(), b",");
/// assert_eq!(Delimiter::CrLf.as_bytes(), b"\r\n");
/// assert_eq!(Delimiter::from_bytes(b"\t"), Delimiter::Tab);
/// assert_eq!(Delimiter::from_bytes(b"::"), Delimiter::Custom(b"::".to_vec()));
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, Default)]
pub enum Delimiter {
    #[default]
    Comma,
    Tab,
    Pipe,
    Space,
    Semicolon,
    LineFeed,
    CarriageReturn,
    CrLf,
    Custom(Vec<u8>),
}

impl Delimiter {
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Delimiter::Comma => b",",
            Delimiter::Tab => b"\t",
            Delimiter::Pipe => b"|",
            Delimiter::Space => b" ",
            Delimiter::Semicolon => b";",
            Delimiter::LineFeed => b"\n",
            Delimiter::CarriageReturn => b"\r",
            Delimiter::CrLf => b"\r\n",
            Delimiter::Custom(bytes) => bytes,
        }
    }

    /// Maps a byte string back to its named variant when there is one.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        match bytes {
            b"," => Delimiter::Comma,
            b"\t" => Delimiter::Tab,
            b"|" => Delimiter::Pipe,
            b" " => Delimiter::Space,
            b";" => Delimiter::Semicolon,
            b"\n" => Delimiter::LineFeed,
            b"\r" => Delimiter::CarriageReturn,
            b"\r\n" => Delimiter::CrLf,
            other => Delimiter::Custom(other.to_vec()),
        }
    }
}

impl From<&str> for Delimiter {
    fn from(value: &str) -> Self {
        Delimiter::from_bytes(value.as_bytes())
    }
}

/// Options for the generic 2D-table codec.
///
/// # Examples
///
/// ```rust
/// use uconfig::{Delimiter, TableOptions};
///
/// let options = TableOptions::new();
/// assert_eq!(options.row_delimiter, None);
/// assert_eq!(options.row_delimiter_or_default(), Delimiter::LineFeed);
/// assert_eq!(options.column_delimiter_or_default(), Delimiter::Space);
/// ```
#[derive(Clone, Debug, PartialEq, Default)]
pub struct TableOptions {
    /// `None` means "from metadata when writing, `\n` otherwise".
    pub row_delimiter: Option<Delimiter>,
    /// `None` means "from metadata when writing, a space otherwise".
    pub column_delimiter: Option<Delimiter>,
    /// Drop rows that contain no bytes at all.
    pub skip_empty_rows: bool,
    /// Collapse runs of column delimiters, as in whitespace-aligned files.
    pub skip_empty_cells: bool,
    /// Store cells as guessed native values instead of `Chars`.
    pub guess_types: bool,
}

impl TableOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_row_delimiter(mut self, delimiter: impl Into<Delimiter>) -> Self {
        self.row_delimiter = Some(delimiter.into());
        self
    }

    #[must_use]
    pub fn with_column_delimiter(mut self, delimiter: impl Into<Delimiter>) -> Self {
        self.column_delimiter = Some(delimiter.into());
        self
    }

    #[must_use]
    pub fn with_skip_empty_rows(mut self, skip: bool) -> Self {
        self.skip_empty_rows = skip;
        self
    }

    #[must_use]
    pub fn with_skip_empty_cells(mut self, skip: bool) -> Self {
        self.skip_empty_cells = skip;
        self
    }

    #[must_use]
    pub fn with_guess_types(mut self, guess: bool) -> Self {
        self.guess_types = guess;
        self
    }

    pub fn row_delimiter_or_default(&self) -> Delimiter {
        self.row_delimiter.clone().unwrap_or(Delimiter::LineFeed)
    }

    pub fn column_delimiter_or_default(&self) -> Delimiter {
        self.column_delimiter.clone().unwrap_or(Delimiter::Space)
    }
}

/// Options for the CSV codec.
///
/// Header-row and row-name promotion are both on by default.
///
/// # Examples
///
/// ```rust
/// use uconfig::CsvOptions;
///
/// let options = CsvOptions::new().with_row_names(false);
/// assert!(options.column_names);
/// assert!(!options.row_names);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct CsvOptions {
    pub table: TableOptions,
    /// Name every cell after the first row's cell in the same column.
    pub column_names: bool,
    /// Name every row after its first cell.
    pub row_names: bool,
}

impl Default for CsvOptions {
    fn default() -> Self {
        CsvOptions {
            table: TableOptions::default(),
            column_names: true,
            row_names: true,
        }
    }
}

impl CsvOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_table(mut self, table: TableOptions) -> Self {
        self.table = table;
        self
    }

    #[must_use]
    pub fn with_column_names(mut self, enabled: bool) -> Self {
        self.column_names = enabled;
        self
    }

    #[must_use]
    pub fn with_row_names(mut self, enabled: bool) -> Self {
        self.row_names = enabled;
        self
    }
}

/// Options for the INI codec.
#[derive(Clone, Debug, PartialEq)]
pub struct IniOptions {
    /// Written in front of unnamed comment keys; `;` by default.
    pub comment_delimiter: u8,
}

impl Default for IniOptions {
    fn default() -> Self {
        IniOptions {
            comment_delimiter: b';',
        }
    }
}

impl IniOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_comment_delimiter(mut self, delimiter: u8) -> Self {
        self.comment_delimiter = delimiter;
        self
    }
}

/// Options for the JSON codec.
///
/// # Examples
///
/// ```rust
/// use uconfig::JsonOptions;
///
/// let options = JsonOptions::new().with_indent(2);
/// assert_eq!(options.indent, 2);
/// assert_eq!(options.max_depth, 256);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct JsonOptions {
    pub max_depth: usize,
    /// Spaces per nesting level when writing.
    pub indent: usize,
}

impl Default for JsonOptions {
    fn default() -> Self {
        JsonOptions {
            max_depth: DEFAULT_MAX_DEPTH,
            indent: 4,
        }
    }
}

impl JsonOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    #[must_use]
    pub fn with_indent(mut self, indent: usize) -> Self {
        self.indent = indent;
        self
    }
}

/// Options for the XML codec.
#[derive(Clone, Debug, PartialEq)]
pub struct XmlOptions {
    /// Drop text nodes made only of whitespace.
    pub skip_blank_text: bool,
    /// Strip leading and trailing whitespace from text nodes.
    pub trim_text: bool,
    pub max_depth: usize,
    pub indent: usize,
}

impl Default for XmlOptions {
    fn default() -> Self {
        XmlOptions {
            skip_blank_text: true,
            trim_text: true,
            max_depth: DEFAULT_MAX_DEPTH,
            indent: 2,
        }
    }
}

impl XmlOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_skip_blank_text(mut self, skip: bool) -> Self {
        self.skip_blank_text = skip;
        self
    }

    #[must_use]
    pub fn with_trim_text(mut self, trim: bool) -> Self {
        self.trim_text = trim;
        self
    }

    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    #[must_use]
    pub fn with_indent(mut self, indent: usize) -> Self {
        self.indent = indent;
        self
    }
}
