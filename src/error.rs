use crate::parser::{ParseError, ScanError};
use crate::translator::TranslationError;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("{0}")]
    Validation(&'static str),

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Translation(#[from] TranslationError),

    #[error("output directory {output:?} must not be inside input directory {input:?}")]
    OutputInsideInput { input: PathBuf, output: PathBuf },

    #[error("input is a directory, but output {0:?} is not a directory")]
    OutputNotDirectory(PathBuf),

    #[error("input is a file, but output {0:?} is a directory")]
    OutputIsDirectory(PathBuf),

    #[error("translate {path:?}: {source}")]
    File {
        path: PathBuf,
        #[source]
        source: Box<Error>,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn io(context: impl Into<String>, source: io::Error) -> Self {
        Error::Io {
            context: context.into(),
            source,
        }
    }

    pub(crate) fn in_file(path: &Path, source: Error) -> Self {
        Error::File {
            path: path.to_path_buf(),
            source: Box::new(source),
        }
    }

    /// Render as `file:line:col: message` when the failure points into a
    /// source file. Lines and columns are one-based.
    pub fn diagnostic(&self) -> String {
        let Error::File { path, source } = self else {
            return self.to_string();
        };
        match source.as_ref() {
            Error::Translation(te) => format!(
                "{}:{}:{}: {}",
                path.display(),
                te.region.start.line + 1,
                te.region.start.column + 1,
                te.source
            ),
            Error::Parse(pe) => format!(
                "{}:{}:{}: {}",
                path.display(),
                pe.position.line + 1,
                pe.position.column + 1,
                pe.message
            ),
            _ => self.to_string(),
        }
    }
}

impl From<ScanError> for Error {
    fn from(err: ScanError) -> Self {
        match err {
            ScanError::Io(source) => Error::io("read input", source),
            ScanError::Parse(pe) => Error::Parse(pe),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluator::EvalError;
    use crate::parser::{Position, Region, RegionKind};

    #[test]
    fn translation_diagnostic_is_one_based() {
        let te = TranslationError {
            region: Region {
                kind: RegionKind::Statement,
                start: Position::new(4, 9),
                end: Position::new(4, 12),
                data: b"1/0".to_vec(),
            },
            source: EvalError::Closed,
        };
        let err = Error::in_file(Path::new("src/A.japaya"), te.into());
        assert_eq!(err.diagnostic(), "src/A.japaya:5:10: python worker is closed");
    }

    #[test]
    fn parse_diagnostic_uses_opening_position() {
        let pe = ParseError {
            position: Position::new(1, 0),
            message: "unterminated python statement (missing closing `)".to_string(),
        };
        let err = Error::in_file(Path::new("B.java"), pe.into());
        assert_eq!(
            err.diagnostic(),
            "B.java:2:1: unterminated python statement (missing closing `)"
        );
    }

    #[test]
    fn other_errors_render_plainly() {
        let err = Error::Validation("empty input path");
        assert_eq!(err.diagnostic(), "empty input path");
    }
}
