mod config;
mod protocol;
mod python;
mod session;

pub use config::{default_python, ConfigError, WorkerConfig, PY_DIR_ENV};
pub use protocol::{
    decode_response, encode_request, preview, RequestKind, WorkerRequest, WorkerResponse,
};
pub use python::PythonEvaluator;
pub use session::{CloseError, PythonWorker, StartError};
