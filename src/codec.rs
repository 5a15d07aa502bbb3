//! The uniform entry points every format implements.
//!
//! A codec only has to turn bytes into a populated [`Document`] and back
//! ([`Codec::read_from`] / [`Codec::write_to`]); file handling, metadata
//! stamping and logging are shared by the provided methods.

use crate::{Document, Format, Result, Warning};
use log::{debug, warn};
use std::fs;
use std::path::Path;

/// One reader and one writer for a format.
pub trait Codec {
    /// Recorded under the `filetype` metadata key by [`Codec::read_from`].
    const FORMAT: Format;

    type Options: Default;

    /// Replaces the document's contents with `input` parsed as this format.
    ///
    /// Implementations reset `doc`, build the tree, and stamp the `filetype`
    /// metadata together with any format parameters the writer needs.
    ///
    /// # Errors
    ///
    /// Malformed syntax is reported through the returned warnings. Errors
    /// are reserved for the nesting guard.
    fn read_from(input: &[u8], doc: &mut Document, options: &Self::Options)
        -> Result<Vec<Warning>>;

    /// Appends the serialized document to `out`.
    fn write_to(doc: &Document, out: &mut Vec<u8>, options: &Self::Options) -> Result<()>;

    /// Reads a file with default options.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`](crate::Error::Io) without touching `doc` when
    /// the file cannot be read.
    fn read(path: impl AsRef<Path>, doc: &mut Document) -> Result<Vec<Warning>> {
        Self::read_with(path, doc, &Self::Options::default())
    }

    fn read_with(
        path: impl AsRef<Path>,
        doc: &mut Document,
        options: &Self::Options,
    ) -> Result<Vec<Warning>> {
        let path = path.as_ref();
        let input = fs::read(path)?;
        let warnings = Self::read_from(&input, doc, options)?;
        doc.stamp_filename(path);
        for warning in &warnings {
            warn!("{}: {}", path.display(), warning);
        }
        debug!(
            "read {} as {}: {} bytes, {} nodes, {} warnings",
            path.display(),
            Self::FORMAT,
            input.len(),
            doc.tree().len(),
            warnings.len()
        );
        Ok(warnings)
    }

    /// Writes a file with default options.
    fn write(path: impl AsRef<Path>, doc: &Document) -> Result<()> {
        Self::write_with(path, doc, &Self::Options::default())
    }

    fn write_with(path: impl AsRef<Path>, doc: &Document, options: &Self::Options) -> Result<()> {
        let path = path.as_ref();
        let out = Self::to_vec_with(doc, options)?;
        fs::write(path, &out)?;
        debug!(
            "wrote {} as {}: {} bytes, {} nodes",
            path.display(),
            Self::FORMAT,
            out.len(),
            doc.tree().len()
        );
        Ok(())
    }

    /// Parses an in-memory input into a fresh document.
    fn from_slice(input: &[u8]) -> Result<(Document, Vec<Warning>)> {
        let mut doc = Document::new();
        let warnings = Self::read_from(input, &mut doc, &Self::Options::default())?;
        Ok((doc, warnings))
    }

    fn to_vec(doc: &Document) -> Result<Vec<u8>> {
        Self::to_vec_with(doc, &Self::Options::default())
    }

    fn to_vec_with(doc: &Document, options: &Self::Options) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        Self::write_to(doc, &mut out, options)?;
        Ok(out)
    }
}
