mod scanner;
mod types;

pub use scanner::{scan_bytes, scan_reader, ParseError, ScanError, DELIMITER};
pub use types::{Position, Region, RegionKind, TranslationUnit};
