//! Translate host-language sources with embedded Python regions.
//!
//! `` `expr` `` is replaced by the text of the expression's value and
//! ```` ```code``` ```` by whatever the code prints. Everything else is copied
//! through unchanged.

pub mod error;
pub mod evaluator;
pub mod parser;
pub mod translator;
pub mod worker;

pub use error::{Error, Result};
pub use evaluator::{Context, EvalError, Evaluator, PythonError};
pub use parser::{scan_bytes, ParseError, Position, Region, RegionKind, TranslationUnit};
pub use translator::{translate_path, translate_unit, TranslationError};
pub use worker::{PythonEvaluator, PythonWorker, WorkerConfig};
