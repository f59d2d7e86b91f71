mod context;

pub use context::{CancelHandle, Context, Interrupt};

use crate::parser::RegionKind;
use crate::worker::RequestKind;
use std::error::Error as StdError;
use std::io;
use thiserror::Error;

/// Turns the code of one embedded region into the text that replaces it.
///
/// Statements yield the text of their value; blocks yield what they printed.
/// Implementations must not carry bindings from one call into the next.
pub trait Evaluator {
    fn eval(&self, ctx: &Context, kind: RegionKind, code: &[u8]) -> Result<Vec<u8>, EvalError>;
}

impl<E: Evaluator + ?Sized> Evaluator for &E {
    fn eval(&self, ctx: &Context, kind: RegionKind, code: &[u8]) -> Result<Vec<u8>, EvalError> {
        (**self).eval(ctx, kind, code)
    }
}

/// A fault raised by guest code inside the worker.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("python eval failed ({kind}): {message}{}", stdout_suffix(.stdout))]
pub struct PythonError {
    pub kind: RequestKind,
    pub message: String,
    pub stdout: String,
    pub stderr: String,
}

fn stdout_suffix(stdout: &str) -> String {
    if stdout.is_empty() {
        String::new()
    } else {
        format!(" [stdout={:?}]", stdout)
    }
}

#[derive(Debug, Error)]
pub enum EvalError {
    #[error("python worker is closed")]
    Closed,

    #[error("evaluation cancelled")]
    Cancelled,

    #[error("evaluation deadline exceeded")]
    DeadlineExceeded,

    #[error("invalid kind {0:?} (expected stmt|block)")]
    InvalidKind(String),

    #[error("failed {op} python worker: {source}")]
    Io {
        op: &'static str,
        #[source]
        source: io::Error,
    },

    #[error("python worker closed its output before responding")]
    Disconnected,

    #[error("invalid python response JSON: {source} (line={preview:?})")]
    Transport {
        preview: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("python worker channel is out of sync after an earlier transport error")]
    Desynchronized,

    #[error("failed encoding python request: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("python worker lock poisoned")]
    Poisoned,

    #[error(transparent)]
    Python(#[from] PythonError),

    #[error(transparent)]
    Other(Box<dyn StdError + Send + Sync>),
}

impl EvalError {
    pub fn other<E>(err: E) -> Self
    where
        E: Into<Box<dyn StdError + Send + Sync>>,
    {
        EvalError::Other(err.into())
    }

    /// True for failures that leave the worker channel unusable.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            EvalError::Io { .. }
                | EvalError::Disconnected
                | EvalError::Transport { .. }
                | EvalError::Desynchronized
        )
    }
}

impl From<Interrupt> for EvalError {
    fn from(interrupt: Interrupt) -> Self {
        match interrupt {
            Interrupt::Cancelled => EvalError::Cancelled,
            Interrupt::DeadlineExceeded => EvalError::DeadlineExceeded,
        }
    }
}
