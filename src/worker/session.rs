use super::config::{ConfigError, WorkerConfig};
use super::protocol::{self, RequestKind, WorkerRequest};
use crate::evaluator::{Context, EvalError, PythonError};
use std::fs;
use std::io::{self, BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, ExitStatus, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, OnceLock, PoisonError};
use tempfile::TempDir;
use thiserror::Error;
use tracing::{debug, info, warn};

const BOOTSTRAP: &[u8] = include_bytes!("bootstrap.py");
const BOOTSTRAP_NAME: &str = "worker.py";

#[derive(Debug, Error)]
pub enum StartError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed creating worker directory: {0}")]
    TempDir(#[source] io::Error),

    #[error("failed writing worker bootstrap: {0}")]
    Bootstrap(#[source] io::Error),

    #[error("failed starting {program:?}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("python worker started without {0} pipe")]
    MissingPipe(&'static str),
}

/// How a worker ended. Kept so repeated `close` calls can report it again.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CloseError {
    #[error("python worker exited with {0}")]
    Exit(ExitStatus),

    #[error("failed waiting for python worker: {0}")]
    Wait(String),
}

/// Everything guarded by the request lock.
struct Channel {
    child: Child,
    stdin: Option<ChildStdin>,
    stdout: BufReader<ChildStdout>,
    workdir: Option<TempDir>,
    desynced: bool,
}

/// A long-lived interpreter process that evaluates one snippet at a time.
///
/// Every request runs in a fresh top-level namespace, so variables and
/// functions never carry over. Modules the interpreter has imported are
/// cached process-wide, so mutable module state does.
pub struct PythonWorker {
    channel: Mutex<Channel>,
    closed: AtomicBool,
    close_result: OnceLock<Result<(), CloseError>>,
    pid: u32,
}

impl PythonWorker {
    pub fn start(config: &WorkerConfig) -> Result<Self, StartError> {
        config.validate()?;
        let (program, args) = config.command()?;

        let workdir = tempfile::Builder::new()
            .prefix("japaya-py-")
            .tempdir()
            .map_err(StartError::TempDir)?;
        let script = workdir.path().join(BOOTSTRAP_NAME);
        fs::write(&script, BOOTSTRAP).map_err(StartError::Bootstrap)?;

        let mut child = Command::new(&program)
            .args(&args)
            .arg("-u")
            .arg(&script)
            .envs(config.environment())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|source| StartError::Spawn {
                program: program.clone(),
                source,
            })?;

        let stdin = child.stdin.take();
        let stdout = child.stdout.take();
        let (stdin, stdout) = match (stdin, stdout) {
            (Some(stdin), Some(stdout)) => (stdin, stdout),
            (stdin, _) => {
                let missing = if stdin.is_none() { "stdin" } else { "stdout" };
                let _ = child.kill();
                let _ = child.wait();
                return Err(StartError::MissingPipe(missing));
            }
        };

        let pid = child.id();
        info!(
            pid,
            python = %program,
            python_dir = ?config.python_dir,
            "started python worker"
        );

        Ok(Self {
            channel: Mutex::new(Channel {
                child,
                stdin: Some(stdin),
                stdout: BufReader::new(stdout),
                workdir: Some(workdir),
                desynced: false,
            }),
            closed: AtomicBool::new(false),
            close_result: OnceLock::new(),
            pid,
        })
    }

    /// OS process id of the interpreter.
    pub fn id(&self) -> u32 {
        self.pid
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Run one snippet and return its output.
    ///
    /// Callers queue on the request lock. `ctx` is checked once, right after
    /// the lock is taken; a request already written runs to completion.
    pub fn eval(&self, ctx: &Context, kind: &str, code: &[u8]) -> Result<Vec<u8>, EvalError> {
        if self.is_closed() {
            return Err(EvalError::Closed);
        }
        let kind: RequestKind = kind.parse().map_err(EvalError::InvalidKind)?;
        self.eval_kind(ctx, kind, code)
    }

    pub fn eval_kind(
        &self,
        ctx: &Context,
        kind: RequestKind,
        code: &[u8],
    ) -> Result<Vec<u8>, EvalError> {
        if self.is_closed() {
            return Err(EvalError::Closed);
        }

        let mut channel = self.channel.lock().map_err(|_| EvalError::Poisoned)?;

        // close() may have won the race for the lock.
        if self.is_closed() {
            return Err(EvalError::Closed);
        }
        ctx.check()?;

        if channel.desynced {
            return Err(EvalError::Desynchronized);
        }

        let result = channel.round_trip(kind, code);
        if matches!(&result, Err(e) if e.is_transport()) {
            channel.desynced = true;
        }
        result
    }

    /// Close the worker's stdin and wait for it to exit.
    ///
    /// Only the first call does any work; later calls return the same result.
    pub fn close(&self) -> Result<(), CloseError> {
        self.close_result
            .get_or_init(|| {
                self.closed.store(true, Ordering::SeqCst);

                let mut channel = self
                    .channel
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner);
                channel.shutdown(self.pid)
            })
            .clone()
    }
}

impl Drop for PythonWorker {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

impl Channel {
    fn round_trip(&mut self, kind: RequestKind, code: &[u8]) -> Result<Vec<u8>, EvalError> {
        let request = WorkerRequest {
            kind,
            code: String::from_utf8_lossy(code).into_owned(),
        };
        let line = protocol::encode_request(&request).map_err(EvalError::Encode)?;

        debug!(kind = %kind, bytes = code.len(), "sending python request");

        let stdin = self.stdin.as_mut().ok_or(EvalError::Closed)?;
        stdin
            .write_all(&line)
            .and_then(|()| stdin.flush())
            .map_err(|source| EvalError::Io {
                op: "writing to",
                source,
            })?;

        let mut response_line = Vec::new();
        let n = self
            .stdout
            .read_until(b'\n', &mut response_line)
            .map_err(|source| EvalError::Io {
                op: "reading from",
                source,
            })?;
        if n == 0 {
            return Err(EvalError::Disconnected);
        }

        let response =
            protocol::decode_response(&response_line).map_err(|source| EvalError::Transport {
                preview: protocol::preview(&response_line),
                source,
            })?;

        let stdout = normalize_newlines(response.stdout.unwrap_or_default());
        let stderr = normalize_newlines(response.stderr.unwrap_or_default());

        if !response.ok {
            return Err(PythonError {
                kind,
                message: response.err.unwrap_or_default(),
                stdout,
                stderr,
            }
            .into());
        }

        if !stdout.is_empty() {
            debug!(kind = %kind, %stdout, "statement wrote to stdout");
        }
        if !stderr.is_empty() {
            debug!(kind = %kind, %stderr, "snippet wrote to stderr");
        }

        Ok(response.out.unwrap_or_default().into_bytes())
    }

    fn shutdown(&mut self, pid: u32) -> Result<(), CloseError> {
        drop(self.stdin.take());

        let status = self.child.wait();

        if let Some(dir) = self.workdir.take() {
            let path = dir.path().to_path_buf();
            if let Err(e) = dir.close() {
                warn!(pid, path = %path.display(), error = %e, "failed removing worker directory");
            }
        }

        match status {
            Ok(status) if status.success() => {
                info!(pid, "python worker exited");
                Ok(())
            }
            Ok(status) => Err(CloseError::Exit(status)),
            Err(e) => Err(CloseError::Wait(e.to_string())),
        }
    }
}

fn normalize_newlines(s: String) -> String {
    if s.contains("\r\n") {
        s.replace("\r\n", "\n")
    } else {
        s
    }
}
