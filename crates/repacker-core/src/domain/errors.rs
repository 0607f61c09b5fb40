//! Errors - エラー型と分類
//!
//! すべての失敗は `RepackError` で表現し、`ErrorKind` で運用上の扱いを決める。
//! プロセスを止めるのは Usage と Precondition だけ。

use std::path::PathBuf;

use thiserror::Error;

/// ErrorKind はエラーの運用分類
///
/// - Usage: 引数の誤り（usage を表示して即終了）
/// - Precondition: 設定ファイルやディレクトリの欠如（即終了）
/// - Transient: 次のパスで自然に再試行される一時的な失敗
/// - ExternalTool: 外部ツール（h5repack, h5dump, scp, スケジューラ）の失敗
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Usage,
    Precondition,
    Transient,
    ExternalTool,
}

impl ErrorKind {
    /// プロセスを終了させるべき分類か
    pub fn is_fatal(self) -> bool {
        matches!(self, ErrorKind::Usage | ErrorKind::Precondition)
    }
}

#[derive(Debug, Error)]
pub enum RepackError {
    #[error("usage: {0}")]
    Usage(String),

    #[error("configuration file not found: {}", .0.display())]
    ConfigNotFound(PathBuf),

    #[error("failed to parse configuration {}: {source}", path.display())]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("producer configuration not found: {}", .0.display())]
    ProducerConfigNotFound(PathBuf),

    #[error("producer configuration has no `{key}` entry")]
    ProducerKeyMissing { key: &'static str },

    #[error("producer configuration entry `{key}` is not a single-quoted value: {line}")]
    ProducerValueUnquoted { key: &'static str, line: String },

    #[error("directory not found: {}", .0.display())]
    DirectoryNotFound(PathBuf),

    #[error("no candidate files in {}", .0.display())]
    NoCandidates(PathBuf),

    #[error("i/o error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to spawn `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{program}` exited with status {status:?}: {stderr}")]
    ToolFailed {
        program: String,
        status: Option<i32>,
        stderr: String,
    },
}

impl RepackError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RepackError::Usage(_) => ErrorKind::Usage,
            RepackError::ConfigNotFound(_)
            | RepackError::ConfigParse { .. }
            | RepackError::InvalidConfig(_)
            | RepackError::ProducerConfigNotFound(_)
            | RepackError::ProducerKeyMissing { .. }
            | RepackError::ProducerValueUnquoted { .. }
            | RepackError::DirectoryNotFound(_)
            | RepackError::NoCandidates(_) => ErrorKind::Precondition,
            RepackError::Io { .. } => ErrorKind::Transient,
            RepackError::Spawn { .. } | RepackError::ToolFailed { .. } => ErrorKind::ExternalTool,
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        RepackError::Io {
            path: path.into(),
            source,
        }
    }
}
