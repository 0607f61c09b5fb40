//! CommandRunner port - 外部コマンド実行の抽象化
//!
//! h5repack / h5dump / scp / スケジューラ照会はすべてこの trait を通す。

use async_trait::async_trait;

use crate::domain::RepackError;

/// 終了したコマンドの出力
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// シグナルで終了した場合は None
    pub status: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            status: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    pub fn failed(status: i32, stderr: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    pub fn success(&self) -> bool {
        self.status == Some(0)
    }

    /// 失敗なら ToolFailed に変換
    pub fn into_result(self, program: &str) -> Result<Self, RepackError> {
        if self.success() {
            Ok(self)
        } else {
            Err(RepackError::ToolFailed {
                program: program.to_string(),
                status: self.status,
                stderr: self.stderr.trim().to_string(),
            })
        }
    }
}

#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// コマンドを起動して終了まで待つ。起動できなければ Spawn エラー
    async fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput, RepackError>;
}
