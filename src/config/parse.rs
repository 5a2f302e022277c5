//! Line-level parsing of `KEY = VALUE` files.
//!
//! Each line is handled on its own: it is truncated to the configured maximum
//! length, trimmed, and split on the first `=`. Anything after a second `=`
//! and anything from a `#` onwards is dropped. Keys are upper-cased and must
//! start with an ASCII letter `A`-`Z`.

use std::fmt;
use std::io::{self, BufRead};

/// Longest line, in characters, considered when reading a file.
pub const MAX_LINE_LEN: usize = 1023;

/// Where the value of a line ends when it carries a `#` comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CommentBoundary {
    /// The value is everything before the `#`.
    #[default]
    AtMarker,
    /// The character right before the `#` is dropped as well.
    ///
    /// Older files were written against a reader with this behaviour, so
    /// `DELAY = 10# ms` loads as `1` here. A `#` at the very start of the
    /// value leaves the value untouched.
    BeforeMarker,
}

/// Options controlling how config text is parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseOptions {
    pub comment_boundary: CommentBoundary,
    pub max_line_len: usize,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            comment_boundary: CommentBoundary::default(),
            max_line_len: MAX_LINE_LEN,
        }
    }
}

impl ParseOptions {
    pub fn with_comment_boundary(mut self, boundary: CommentBoundary) -> Self {
        self.comment_boundary = boundary;
        self
    }
}

/// Why a line was left out of the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    MissingSeparator,
    EmptyKey,
    InvalidKeyStart(char),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::MissingSeparator => f.write_str("no '=' separator"),
            SkipReason::EmptyKey => f.write_str("empty key"),
            SkipReason::InvalidKeyStart(c) => {
                write!(f, "key starts with {c:?}, expected a letter A-Z")
            }
        }
    }
}

/// A line that could not be turned into an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SkippedLine {
    /// 1-based line number.
    pub line: usize,
    pub reason: SkipReason,
}

/// Summary of a load.
///
/// Blank lines and lines starting with `#` are neither applied nor skipped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Number of entries written into the store.
    pub applied: usize,
    pub skipped: Vec<SkippedLine>,
    /// 1-based numbers of lines cut at the maximum line length.
    pub truncated: Vec<usize>,
}

impl LoadReport {
    /// Returns true when no line was skipped or truncated.
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty() && self.truncated.is_empty()
    }
}

#[derive(Debug, PartialEq, Eq)]
pub(crate) enum ParsedLine {
    Entry { key: String, value: String },
    Ignored,
    Skipped(SkipReason),
}

/// Returns true if `key` may be stored from a file.
pub fn is_valid_key(key: &str) -> bool {
    key.as_bytes().first().is_some_and(u8::is_ascii_uppercase)
}

/// Trims and upper-cases a raw key, checking its first character.
pub(crate) fn normalize_key(raw: &str) -> Result<String, SkipReason> {
    let key = raw.trim().to_ascii_uppercase();
    if is_valid_key(&key) {
        return Ok(key);
    }
    match key.chars().next() {
        None => Err(SkipReason::EmptyKey),
        Some(c) => Err(SkipReason::InvalidKeyStart(c)),
    }
}

/// Reads one `\n`-terminated line into `buf` as raw bytes.
///
/// At most `cap` bytes are kept; the rest of the line is consumed and
/// dropped. Returns `None` at end of input, otherwise whether bytes were
/// dropped. The newline itself is not stored.
pub(crate) fn read_capped_line<R: BufRead>(
    reader: &mut R,
    buf: &mut Vec<u8>,
    cap: usize,
) -> io::Result<Option<bool>> {
    buf.clear();
    let mut read_any = false;
    let mut overflowed = false;

    loop {
        let (used, found_newline) = {
            let available = match reader.fill_buf() {
                Ok(bytes) => bytes,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            if available.is_empty() {
                return Ok(read_any.then_some(overflowed));
            }

            let (part, used, found_newline) = match available.iter().position(|&b| b == b'\n') {
                Some(pos) => (&available[..pos], pos + 1, true),
                None => (available, available.len(), false),
            };
            let room = cap.saturating_sub(buf.len());
            if part.len() > room {
                overflowed = true;
            }
            buf.extend_from_slice(&part[..part.len().min(room)]);
            (used, found_newline)
        };

        reader.consume(used);
        read_any = true;
        if found_newline {
            return Ok(Some(overflowed));
        }
    }
}

/// Cuts `line` to at most `max` characters.
pub(crate) fn truncate_line(line: &str, max: usize) -> (&str, bool) {
    match line.char_indices().nth(max) {
        Some((idx, _)) => (&line[..idx], true),
        None => (line, false),
    }
}

pub(crate) fn parse_line(raw: &str, options: &ParseOptions) -> ParsedLine {
    let line = raw.trim();
    if line.is_empty() || line.starts_with('#') {
        return ParsedLine::Ignored;
    }

    let Some((key, rest)) = line.split_once('=') else {
        return ParsedLine::Skipped(SkipReason::MissingSeparator);
    };

    // Runs of '=' count as a single separator.
    let rest = rest.trim_start_matches('=');
    let value = match rest.find('=') {
        Some(end) => &rest[..end],
        None => rest,
    };

    let key = match normalize_key(key) {
        Ok(key) => key,
        Err(reason) => return ParsedLine::Skipped(reason),
    };
    let value = strip_comment(value, options.comment_boundary).trim().to_string();

    ParsedLine::Entry { key, value }
}

fn strip_comment(value: &str, boundary: CommentBoundary) -> &str {
    let Some(pos) = value.find('#') else {
        return value;
    };
    match boundary {
        CommentBoundary::AtMarker => &value[..pos],
        CommentBoundary::BeforeMarker if pos == 0 => value,
        CommentBoundary::BeforeMarker => {
            let cut = value[..pos]
                .char_indices()
                .next_back()
                .map_or(0, |(idx, _)| idx);
            &value[..cut]
        }
    }
}
