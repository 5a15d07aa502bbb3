//! Byte-level helpers shared by the readers and writers.

/// Position of the first occurrence of `needle` in `haystack`.
///
/// An empty needle never matches.
pub fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || needle.len() > haystack.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Picks the line delimiter of a text from its first line break:
/// `\r\n`, `\r` or `\n`. Text without line breaks reports `\n`.
pub fn detect_line_delimiter(input: &[u8]) -> &'static [u8] {
    match input.iter().position(|&b| b == b'\n' || b == b'\r') {
        Some(pos) if input[pos] == b'\r' => {
            if input.get(pos + 1) == Some(&b'\n') {
                b"\r\n"
            } else {
                b"\r"
            }
        }
        _ => b"\n",
    }
}

/// Strips ASCII whitespace from both ends.
pub fn trim(bytes: &[u8]) -> &[u8] {
    let start = bytes
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(bytes.len());
    let end = bytes
        .iter()
        .rposition(|b| !b.is_ascii_whitespace())
        .map_or(start, |p| p + 1);
    &bytes[start..end]
}

#[inline]
pub fn is_blank(bytes: &[u8]) -> bool {
    bytes.iter().all(u8::is_ascii_whitespace)
}

/// Appends `level * width` spaces.
pub fn write_indentation(out: &mut Vec<u8>, level: usize, width: usize) {
    out.resize(out.len() + level * width, b' ');
}

/// A forward-only cursor over an in-memory input.
#[derive(Debug, Clone)]
pub struct Scanner<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> Scanner<'a> {
    pub fn new(input: &'a [u8]) -> Self {
        Scanner { input, pos: 0 }
    }

    #[inline]
    pub fn pos(&self) -> usize {
        self.pos
    }

    #[inline]
    pub fn is_eof(&self) -> bool {
        self.pos >= self.input.len()
    }

    #[inline]
    pub fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    /// Compares the upcoming bytes with `expected` without consuming them.
    #[inline]
    pub fn peek_cmp(&self, expected: &[u8]) -> bool {
        self.input[self.pos..].starts_with(expected)
    }

    #[inline]
    pub fn bump(&mut self) -> Option<u8> {
        let byte = self.peek()?;
        self.pos += 1;
        Some(byte)
    }

    pub fn advance(&mut self, count: usize) {
        self.pos = (self.pos + count).min(self.input.len());
    }

    /// Remaining input, not consumed.
    pub fn rest(&self) -> &'a [u8] {
        &self.input[self.pos..]
    }

    /// Consumes everything up to and including `delimiter` and returns the
    /// bytes before it. Without a match nothing is consumed.
    pub fn read_until(&mut self, delimiter: &[u8]) -> Option<&'a [u8]> {
        let offset = find(self.rest(), delimiter)?;
        let span = &self.input[self.pos..self.pos + offset];
        self.pos += offset + delimiter.len();
        Some(span)
    }

    /// Like [`Scanner::read_until`], but takes the rest of the input when the
    /// delimiter is missing. The flag tells whether the delimiter was found.
    pub fn read_until_or_end(&mut self, delimiter: &[u8]) -> (&'a [u8], bool) {
        match self.read_until(delimiter) {
            Some(span) => (span, true),
            None => {
                let span = self.rest();
                self.pos = self.input.len();
                (span, false)
            }
        }
    }

    /// Consumes bytes while `predicate` holds and returns them.
    pub fn take_while(&mut self, predicate: impl Fn(u8) -> bool) -> &'a [u8] {
        let start = self.pos;
        while self.peek().is_some_and(&predicate) {
            self.pos += 1;
        }
        &self.input[start..self.pos]
    }

    pub fn skip_whitespace(&mut self) {
        self.take_while(|b| b.is_ascii_whitespace());
    }
}
