use std::env;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Environment variable the bootstrap reads to find the prelude directory.
pub const PY_DIR_ENV: &str = "JAPAYA_PY_DIR";

const PYTHONPATH_ENV: &str = "PYTHONPATH";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("python command is empty")]
    EmptyCommand,

    #[error("cannot split python command {0:?}")]
    UnsplittableCommand(String),

    #[error("invalid python dir {path:?}: {reason}")]
    PythonDir { path: PathBuf, reason: String },
}

/// How to launch the interpreter behind a worker.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkerConfig {
    /// Interpreter command line, split like a shell would (`"python3 -X utf8"`).
    /// Falls back to [`default_python`] when unset.
    pub python: Option<String>,
    /// Directory added to the module search path and loaded as the prelude.
    pub python_dir: Option<PathBuf>,
}

/// `python` on Windows, `python3` everywhere else.
pub fn default_python() -> &'static str {
    if cfg!(windows) {
        "python"
    } else {
        "python3"
    }
}

impl WorkerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn python(mut self, python: impl Into<String>) -> Self {
        self.python = Some(python.into());
        self
    }

    pub fn python_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.python_dir = Some(dir.into());
        self
    }

    /// Program and leading arguments for the interpreter.
    pub fn command(&self) -> Result<(String, Vec<String>), ConfigError> {
        let raw = match self.python.as_deref().map(str::trim) {
            None | Some("") => return Ok((default_python().to_string(), Vec::new())),
            Some(raw) => raw,
        };

        let mut words = shlex::split(raw)
            .ok_or_else(|| ConfigError::UnsplittableCommand(raw.to_string()))?
            .into_iter();
        let program = words.next().ok_or(ConfigError::EmptyCommand)?;
        Ok((program, words.collect()))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.command()?;
        if let Some(dir) = &self.python_dir {
            validate_dir(dir)?;
        }
        Ok(())
    }

    /// Extra environment the interpreter needs, if a python dir is set.
    pub fn environment(&self) -> Vec<(&'static str, OsString)> {
        let Some(dir) = &self.python_dir else {
            return Vec::new();
        };

        let mut paths = vec![dir.clone()];
        if let Some(existing) = env::var_os(PYTHONPATH_ENV) {
            paths.extend(env::split_paths(&existing));
        }
        let python_path = env::join_paths(paths).unwrap_or_else(|_| dir.clone().into_os_string());

        vec![
            (PYTHONPATH_ENV, python_path),
            (PY_DIR_ENV, dir.clone().into_os_string()),
        ]
    }
}

fn validate_dir(dir: &Path) -> Result<(), ConfigError> {
    let reason = match dir.metadata() {
        Ok(meta) if meta.is_dir() => return Ok(()),
        Ok(_) => "not a directory".to_string(),
        Err(e) => e.to_string(),
    };
    Err(ConfigError::PythonDir {
        path: dir.to_path_buf(),
        reason,
    })
}
