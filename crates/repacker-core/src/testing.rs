//! テスト用の fake（Compressor, LivenessProbe, RemoteCopier）

use std::collections::{HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};

use crate::app::shutdown::ShutdownTrigger;
use crate::domain::RepackError;
use crate::impls::InMemoryFileSystem;
use crate::ports::{Compressor, LivenessProbe, RemoteCopier};

pub(crate) fn t(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
}

#[derive(Default)]
struct CompressorState {
    compressed: HashSet<PathBuf>,
    checks: Vec<PathBuf>,
    repacks: Vec<(PathBuf, PathBuf, u8)>,
    fail_next: usize,
    appear_on_repack: VecDeque<PathBuf>,
    /// 先に積まれた check の答え（None は h5dump の失敗）
    scripted_checks: VecDeque<Option<bool>>,
    output_modified: DateTime<Utc>,
    keeps_level_hidden: bool,
}

/// InMemoryFileSystem に `packed` を書き出す Compressor
pub(crate) struct FakeCompressor {
    fs: Arc<InMemoryFileSystem>,
    state: Mutex<CompressorState>,
}

impl FakeCompressor {
    pub(crate) fn new(fs: Arc<InMemoryFileSystem>) -> Self {
        Self {
            fs,
            state: Mutex::new(CompressorState {
                output_modified: t(0),
                ..CompressorState::default()
            }),
        }
    }

    pub(crate) fn mark_compressed(&self, path: impl AsRef<Path>) {
        self.state
            .lock()
            .unwrap()
            .compressed
            .insert(path.as_ref().to_path_buf());
    }

    /// 次の repack を失敗させる（一時ファイルの書きかけを残す）
    pub(crate) fn fail_next_repack(&self) {
        self.state.lock().unwrap().fail_next += 1;
    }

    /// 次の repack 中に新しい候補ファイルを出現させる
    pub(crate) fn appear_during_next_repack(&self, path: impl AsRef<Path>) {
        self.state
            .lock()
            .unwrap()
            .appear_on_repack
            .push_back(path.as_ref().to_path_buf());
    }

    /// 次の is_compressed の答えを積む。None なら失敗を返す
    pub(crate) fn push_check(&self, answer: Option<bool>) {
        self.state.lock().unwrap().scripted_checks.push_back(answer);
    }

    /// repack 出力の mtime
    pub(crate) fn write_output_at(&self, modified: DateTime<Utc>) {
        self.state.lock().unwrap().output_modified = modified;
    }

    /// repack 後も dump に目標レベルが現れないファイル（小さすぎて filter がかからない等）
    pub(crate) fn keep_level_hidden(&self) {
        self.state.lock().unwrap().keeps_level_hidden = true;
    }

    pub(crate) fn repacks(&self) -> Vec<(PathBuf, PathBuf, u8)> {
        self.state.lock().unwrap().repacks.clone()
    }

    pub(crate) fn checks(&self) -> usize {
        self.state.lock().unwrap().checks.len()
    }
}

#[async_trait]
impl Compressor for FakeCompressor {
    async fn is_compressed(&self, path: &Path, _level: u8) -> Result<bool, RepackError> {
        let mut state = self.state.lock().unwrap();
        state.checks.push(path.to_path_buf());
        match state.scripted_checks.pop_front() {
            Some(Some(answer)) => Ok(answer),
            Some(None) => Err(RepackError::ToolFailed {
                program: "h5dump".into(),
                status: Some(1),
                stderr: "unable to open file".into(),
            }),
            None => Ok(state.compressed.contains(path)),
        }
    }

    async fn repack(&self, src: &Path, dst: &Path, level: u8) -> Result<(), RepackError> {
        let mut state = self.state.lock().unwrap();
        state
            .repacks
            .push((src.to_path_buf(), dst.to_path_buf(), level));
        if let Some(appearing) = state.appear_on_repack.pop_front() {
            self.fs.write(appearing, "raw", t(0));
        }
        if state.fail_next > 0 {
            state.fail_next -= 1;
            self.fs.write(dst, "partial", t(0));
            return Err(RepackError::ToolFailed {
                program: "h5repack".into(),
                status: Some(1),
                stderr: "simulated failure".into(),
            });
        }
        self.fs.write(dst, "packed", state.output_modified);
        if !state.keeps_level_hidden {
            state.compressed.insert(src.to_path_buf());
        }
        Ok(())
    }
}

/// 用意した答えを順に返し、尽きたら `fallback` を返す probe
pub(crate) struct ScriptedProbe {
    answers: Mutex<VecDeque<bool>>,
    fallback: bool,
    calls: Mutex<usize>,
    trigger_at: Option<(usize, ShutdownTrigger)>,
}

impl ScriptedProbe {
    pub(crate) fn new(answers: &[bool], fallback: bool) -> Self {
        Self {
            answers: Mutex::new(answers.iter().copied().collect()),
            fallback,
            calls: Mutex::new(0),
            trigger_at: None,
        }
    }

    /// `call` 回目の問い合わせで shutdown を要求する
    pub(crate) fn trigger_shutdown_at(mut self, call: usize, trigger: ShutdownTrigger) -> Self {
        self.trigger_at = Some((call, trigger));
        self
    }

    pub(crate) fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl LivenessProbe for ScriptedProbe {
    async fn is_alive(&self) -> Result<bool, RepackError> {
        let call = {
            let mut calls = self.calls.lock().unwrap();
            *calls += 1;
            *calls
        };
        if let Some((at, trigger)) = &self.trigger_at
            && *at == call
        {
            trigger.trigger();
        }
        Ok(self
            .answers
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(self.fallback))
    }
}

/// 常にエラーを返す probe
pub(crate) struct BrokenProbe;

#[async_trait]
impl LivenessProbe for BrokenProbe {
    async fn is_alive(&self) -> Result<bool, RepackError> {
        Err(RepackError::ToolFailed {
            program: "qstat".into(),
            status: Some(1),
            stderr: "cannot connect to server".into(),
        })
    }
}

#[derive(Default)]
pub(crate) struct RecordingCopier {
    copies: Mutex<Vec<Vec<PathBuf>>>,
    fail: bool,
}

impl RecordingCopier {
    pub(crate) fn failing() -> Self {
        Self {
            copies: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub(crate) fn copies(&self) -> Vec<Vec<PathBuf>> {
        self.copies.lock().unwrap().clone()
    }
}

#[async_trait]
impl RemoteCopier for RecordingCopier {
    async fn copy(&self, files: &[PathBuf]) -> Result<(), RepackError> {
        self.copies.lock().unwrap().push(files.to_vec());
        if self.fail {
            return Err(RepackError::ToolFailed {
                program: "scp".into(),
                status: Some(1),
                stderr: "Permission denied (publickey)".into(),
            });
        }
        Ok(())
    }
}
