use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::{DefjumpError, Result};

/// A resolved source location.
///
/// `line` and `column` are both 1-based; `column` counts characters, not
/// bytes. A position with `line == 0` is invalid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    /// Path of the unit containing the declaration.
    pub path: PathBuf,
    /// Byte offset of the declaration, starting at 0.
    pub offset: usize,
    /// Line number, starting at 1.
    pub line: u32,
    /// Column number, starting at 1 (character count).
    pub column: u32,
}

impl Position {
    /// Returns `true` if the position carries a real line number.
    pub fn is_valid(&self) -> bool {
        self.line > 0
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path = self.path.display().to_string();
        match (self.is_valid(), path.is_empty()) {
            (true, false) => write!(f, "{}:{}:{}", path, self.line, self.column),
            (true, true) => write!(f, "{}:{}", self.line, self.column),
            (false, false) => write!(f, "{}", path),
            (false, true) => write!(f, "-"),
        }
    }
}

/// The textual extent a query denotes: a unit plus one or two byte offsets.
///
/// `end == start` for a point query. Offsets are validated against the
/// unit's byte length before any parsing happens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryPosition {
    pub path: PathBuf,
    pub start: usize,
    pub end: usize,
}

/// Parses the numeric value of an `#`-prefixed decimal offset.
fn parse_octothorp_decimal(s: &str) -> Option<usize> {
    s.strip_prefix('#')?.parse().ok()
}

/// Parses a query of the form `<path>:#<start>[,#<end>]`.
///
/// The last colon separates the path from the offsets, so paths containing
/// colons still parse. A single offset denotes a point query. Numbers
/// without a `#` prefix are rejected (reserved for other position forms).
pub fn parse_query(query: &str) -> Result<QueryPosition> {
    if query.is_empty() {
        return Err(DefjumpError::QueryMalformed {
            message: "no source position specified".to_string(),
        });
    }

    let colon = query.rfind(':').ok_or_else(|| DefjumpError::QueryMalformed {
        message: format!("bad position syntax {query:?}"),
    })?;
    let (path, offsets) = (&query[..colon], &query[colon + 1..]);

    let (start, end) = match offsets.split_once(',') {
        // e.g. "foo.go:#123,#456"
        Some((a, b)) => (parse_octothorp_decimal(a), parse_octothorp_decimal(b)),
        // e.g. "foo.go:#123"
        None => {
            let n = parse_octothorp_decimal(offsets);
            (n, n)
        }
    };
    match (start, end) {
        (Some(start), Some(end)) => Ok(QueryPosition {
            path: PathBuf::from(path),
            start,
            end,
        }),
        _ => Err(DefjumpError::QueryMalformed {
            message: format!("invalid offset {offsets:?} in query position"),
        }),
    }
}

/// Range-checks query offsets against a unit's byte length.
///
/// An offset equal to the length is valid (the cursor may sit at end of
/// file); anything past it is malformed.
pub fn check_offsets(qpos: &QueryPosition, unit_len: usize) -> Result<()> {
    for offset in [qpos.start, qpos.end] {
        if offset > unit_len {
            return Err(DefjumpError::QueryMalformed {
                message: format!(
                    "offset {} is beyond the end of {} ({} bytes)",
                    offset,
                    qpos.path.display(),
                    unit_len
                ),
            });
        }
    }
    Ok(())
}

/// Translates a byte offset within `source` into a `Position`.
///
/// Shared by every resolution tier. The line is 1 plus the number of
/// newlines before the offset; the column counts characters since the last
/// newline. `offset` must be within `0..=source.len()`.
pub fn position_at(path: &Path, source: &[u8], offset: usize) -> Position {
    let offset = offset.min(source.len());
    let before = &source[..offset];
    let line_start = match before.iter().rposition(|&b| b == b'\n') {
        Some(i) => i + 1,
        None => 0,
    };
    let line = before.iter().filter(|&&b| b == b'\n').count() as u32 + 1;
    let column = String::from_utf8_lossy(&before[line_start..]).chars().count() as u32 + 1;
    Position {
        path: path.to_path_buf(),
        offset,
        line,
        column,
    }
}
