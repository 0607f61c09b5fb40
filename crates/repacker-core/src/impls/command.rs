//! CommandRunner の実装
//!
//! - TokioCommandRunner: tokio::process で実際に起動する
//! - ScriptedCommandRunner: 呼び出しを記録し、用意した出力を返す（開発・テスト用）

use std::collections::{HashMap, VecDeque};
use std::process::Stdio;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use tokio::process::Command;
use tracing::trace;

use crate::domain::RepackError;
use crate::ports::{CommandOutput, CommandRunner};

#[derive(Debug, Clone, Copy, Default)]
pub struct TokioCommandRunner;

#[async_trait]
impl CommandRunner for TokioCommandRunner {
    async fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput, RepackError> {
        trace!(program, ?args, "spawning command");
        let output = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|source| RepackError::Spawn {
                program: program.to_string(),
                source,
            })?;

        Ok(CommandOutput {
            status: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// 記録された 1 回の呼び出し
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
}

#[derive(Debug, Default)]
struct ScriptState {
    responses: HashMap<String, VecDeque<CommandOutput>>,
    invocations: Vec<Invocation>,
}

/// program ごとに出力を積んでおき、呼ばれた順に返す
///
/// 積んだ出力が尽きたら成功（空の stdout）を返す。
#[derive(Debug, Default)]
pub struct ScriptedCommandRunner {
    state: Mutex<ScriptState>,
}

impl ScriptedCommandRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_response(&self, program: &str, output: CommandOutput) {
        self.lock()
            .responses
            .entry(program.to_string())
            .or_default()
            .push_back(output);
    }

    pub fn invocations(&self) -> Vec<Invocation> {
        self.lock().invocations.clone()
    }

    pub fn invocations_of(&self, program: &str) -> Vec<Invocation> {
        self.lock()
            .invocations
            .iter()
            .filter(|inv| inv.program == program)
            .cloned()
            .collect()
    }

    fn lock(&self) -> MutexGuard<'_, ScriptState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl CommandRunner for ScriptedCommandRunner {
    async fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput, RepackError> {
        let mut state = self.lock();
        state.invocations.push(Invocation {
            program: program.to_string(),
            args: args.to_vec(),
        });
        let output = state
            .responses
            .get_mut(program)
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| CommandOutput::ok(""));
        Ok(output)
    }
}
