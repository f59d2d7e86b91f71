use super::types::{Position, Region, RegionKind, TranslationUnit};
use std::io::{self, Read};
use thiserror::Error;

/// The delimiter character. One opens a statement, three open a block.
pub const DELIMITER: u8 = b'`';

const BLOCK_DELIMITER: &[u8] = b"```";
const STATEMENT_DELIMITER: &[u8] = b"`";

/// A scan failure, positioned at the opening delimiter that never closed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("parse error at {position}: {message}")]
pub struct ParseError {
    pub position: Position,
    pub message: String,
}

/// Byte offset plus the line/column it corresponds to.
#[derive(Debug, Clone, Copy)]
struct Cursor {
    offset: usize,
    line: usize,
    column: usize,
}

impl Cursor {
    fn position(&self) -> Position {
        Position::new(self.line, self.column)
    }
}

struct Scanner<'a> {
    data: &'a [u8],
    regions: Vec<Region>,
}

impl Scanner<'_> {
    fn advance(&self, cursor: &mut Cursor) {
        if cursor.offset >= self.data.len() {
            return;
        }
        if self.data[cursor.offset] == b'\n' {
            cursor.line += 1;
            cursor.column = 0;
        } else {
            cursor.column += 1;
        }
        cursor.offset += 1;
    }

    /// Walk from a known cursor up to `offset`, keeping line/column in step.
    fn advance_to(&self, from: Cursor, offset: usize) -> Cursor {
        let mut cursor = from;
        while cursor.offset < offset {
            self.advance(&mut cursor);
        }
        cursor
    }

    fn emit(&mut self, kind: RegionKind, start: Cursor, end: Cursor) {
        if end.offset <= start.offset {
            return;
        }
        self.regions.push(Region {
            kind,
            start: start.position(),
            end: end.position(),
            data: self.data[start.offset..end.offset].to_vec(),
        });
    }

    fn find_from(&self, from: usize, delimiter: &[u8]) -> Option<usize> {
        self.data[from..]
            .windows(delimiter.len())
            .position(|w| w == delimiter)
            .map(|i| from + i)
    }

    fn is_block_open(&self, offset: usize) -> bool {
        self.data[offset..].starts_with(BLOCK_DELIMITER)
    }

    fn run(mut self) -> Result<Vec<Region>, ParseError> {
        let mut cursor = Cursor {
            offset: 0,
            line: 0,
            column: 0,
        };
        let mut host_start = cursor;

        while cursor.offset < self.data.len() {
            if self.data[cursor.offset] != DELIMITER {
                self.advance(&mut cursor);
                continue;
            }

            self.emit(RegionKind::Host, host_start, cursor);

            let (kind, delimiter, message) = if self.is_block_open(cursor.offset) {
                (
                    RegionKind::Block,
                    BLOCK_DELIMITER,
                    "unterminated python block (missing closing ```)",
                )
            } else {
                (
                    RegionKind::Statement,
                    STATEMENT_DELIMITER,
                    "unterminated python statement (missing closing `)",
                )
            };

            let open = cursor;
            let content_start = self.advance_to(open, open.offset + delimiter.len());
            let close = self
                .find_from(content_start.offset, delimiter)
                .ok_or_else(|| ParseError {
                    position: open.position(),
                    message: message.to_string(),
                })?;

            let content_end = self.advance_to(content_start, close);
            self.emit(kind, content_start, content_end);

            cursor = self.advance_to(content_end, close + delimiter.len());
            host_start = cursor;
        }

        self.emit(RegionKind::Host, host_start, cursor);
        Ok(self.regions)
    }
}

/// Split a source file into host, statement and block regions.
///
/// Regions come back in source order and never overlap. Empty regions are
/// dropped, so two adjacent embedded regions have nothing between them.
pub fn scan_bytes(data: &[u8]) -> Result<TranslationUnit, ParseError> {
    let regions = Scanner {
        data,
        regions: Vec::new(),
    }
    .run()?;

    Ok(TranslationUnit {
        data: data.to_vec(),
        regions,
    })
}

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("failed reading source: {0}")]
    Io(#[from] io::Error),

    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// Read everything from `reader`, then scan it.
pub fn scan_reader<R: Read>(mut reader: R) -> Result<TranslationUnit, ScanError> {
    let mut data = Vec::new();
    reader.read_to_end(&mut data)?;
    Ok(scan_bytes(&data)?)
}
