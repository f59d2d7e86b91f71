use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How the worker should run a snippet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RequestKind {
    /// Evaluate one expression and return its `str()`.
    #[serde(rename = "stmt")]
    Stmt,
    /// Execute statements and return captured stdout.
    #[serde(rename = "block")]
    Block,
}

impl RequestKind {
    pub fn as_str(self) -> &'static str {
        match self {
            RequestKind::Stmt => "stmt",
            RequestKind::Block => "block",
        }
    }
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequestKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "stmt" => Ok(RequestKind::Stmt),
            "block" => Ok(RequestKind::Block),
            other => Err(other.to_string()),
        }
    }
}

/// One line written to the worker's stdin.
#[derive(Debug, Serialize, Deserialize)]
pub struct WorkerRequest {
    pub kind: RequestKind,
    pub code: String,
}

/// One line read back from the worker's stdout.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct WorkerResponse {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub out: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub err: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stdout: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stderr: Option<String>,
}

const PREVIEW_LIMIT: usize = 200;

fn trim(line: &[u8]) -> &[u8] {
    let start = line
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(line.len());
    let end = line
        .iter()
        .rposition(|b| !b.is_ascii_whitespace())
        .map_or(start, |i| i + 1);
    &line[start..end]
}

/// Serialize a request as a single newline-terminated JSON line.
pub fn encode_request(req: &WorkerRequest) -> serde_json::Result<Vec<u8>> {
    let mut line = serde_json::to_vec(req)?;
    line.push(b'\n');
    Ok(line)
}

pub fn decode_response(line: &[u8]) -> serde_json::Result<WorkerResponse> {
    serde_json::from_slice(trim(line))
}

/// A bounded, printable excerpt of a line that failed to decode.
pub fn preview(line: &[u8]) -> String {
    let text = String::from_utf8_lossy(trim(line));
    match text.char_indices().nth(PREVIEW_LIMIT) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.into_owned(),
    }
}
