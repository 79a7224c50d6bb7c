use crate::models::Highlight;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, trace};

/// Separator line between two clippings in `My Clippings.txt`.
pub const CLIPPING_DELIMITER: &str = "==========";

const CLIPPINGS_FILE: &str = "documents/My Clippings.txt";
const MIN_CLIPPING_LINES: usize = 5;
const TITLE_LINE: usize = 1;
const LOCATION_LINE: usize = 2;
const QUOTE_LINE: usize = 4;

#[derive(Debug, Error)]
pub enum ClippingsError {
    #[error("Failed to read clippings file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Splits a clippings export into highlights, in file order.
///
/// Chunks with fewer than five lines are dropped. That covers the empty
/// tail after the final delimiter as well as truncated entries.
pub fn parse_clippings(content: &str) -> Vec<Highlight> {
    let mut highlights = Vec::new();

    for (index, chunk) in content.split(CLIPPING_DELIMITER).enumerate() {
        let lines = split_lines(chunk);

        if lines.len() < MIN_CLIPPING_LINES {
            trace!(chunk = index, lines = lines.len(), "Skipping short clipping chunk");
            continue;
        }

        highlights.push(Highlight::new(
            lines[TITLE_LINE],
            lines[LOCATION_LINE],
            lines[QUOTE_LINE],
        ));
    }

    debug!(count = highlights.len(), "Parsed clippings");
    highlights
}

fn is_line_break(c: char) -> bool {
    matches!(
        c,
        '\n' | '\r' | '\u{0b}' | '\u{0c}' | '\u{1c}' | '\u{1d}' | '\u{1e}' | '\u{85}' | '\u{2028}' | '\u{2029}'
    )
}

/// Splits on every Unicode line boundary, treating `\r\n` as one break.
/// A trailing break does not produce an empty last line.
fn split_lines(text: &str) -> Vec<&str> {
    let mut lines = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        if !is_line_break(c) {
            continue;
        }
        lines.push(&text[start..i]);
        start = i + c.len_utf8();
        if c == '\r' {
            if let Some(&(_, '\n')) = chars.peek() {
                chars.next();
                start += 1;
            }
        }
    }
    if start < text.len() {
        lines.push(&text[start..]);
    }

    lines
}

pub fn clippings_path(kindle_location: &Path) -> PathBuf {
    kindle_location.join(CLIPPINGS_FILE)
}

pub fn read_clippings(kindle_location: &Path) -> Result<Vec<Highlight>, ClippingsError> {
    let path = clippings_path(kindle_location);
    let content = std::fs::read_to_string(&path)
        .map_err(|source| ClippingsError::Read { path, source })?;

    Ok(parse_clippings(&content))
}

/// Location text as shown in the uploaded annotation block.
pub fn display_location(location: &str) -> String {
    location.replace('-', "")
}
