use std::fmt;

/// A zero-based location in a source file.
///
/// Columns count bytes, not characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, col {}", self.line, self.column)
    }
}

/// What a region of source text holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegionKind {
    /// Host-language text, copied through untouched.
    Host,
    /// `` `expr` ``: evaluated, replaced by the value's text.
    Statement,
    /// ```` ```code``` ````: executed, replaced by what it printed.
    Block,
}

impl RegionKind {
    pub fn is_embedded(self) -> bool {
        !matches!(self, RegionKind::Host)
    }
}

impl fmt::Display for RegionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RegionKind::Host => "host",
            RegionKind::Statement => "statement",
            RegionKind::Block => "block",
        };
        f.write_str(name)
    }
}

/// A half-open `[start, end)` span of a file and an owned copy of its bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region {
    pub kind: RegionKind,
    pub start: Position,
    pub end: Position,
    pub data: Vec<u8>,
}

/// One scanned source file: its bytes and the regions that make it up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationUnit {
    pub data: Vec<u8>,
    pub regions: Vec<Region>,
}
