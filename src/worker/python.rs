use super::config::WorkerConfig;
use super::protocol::RequestKind;
use super::session::{CloseError, PythonWorker, StartError};
use crate::evaluator::{Context, EvalError, Evaluator};
use crate::parser::RegionKind;

/// [`Evaluator`] backed by a single [`PythonWorker`].
pub struct PythonEvaluator {
    worker: PythonWorker,
}

impl PythonEvaluator {
    pub fn start(config: &WorkerConfig) -> Result<Self, StartError> {
        Ok(Self {
            worker: PythonWorker::start(config)?,
        })
    }

    pub fn worker(&self) -> &PythonWorker {
        &self.worker
    }

    pub fn close(&self) -> Result<(), CloseError> {
        self.worker.close()
    }
}

impl Evaluator for PythonEvaluator {
    fn eval(&self, ctx: &Context, kind: RegionKind, code: &[u8]) -> Result<Vec<u8>, EvalError> {
        let kind = match kind {
            RegionKind::Statement => RequestKind::Stmt,
            RegionKind::Block => RequestKind::Block,
            RegionKind::Host => return Err(EvalError::InvalidKind(kind.to_string())),
        };
        self.worker.eval_kind(ctx, kind, code)
    }
}
