//! RepackPass - 候補ファイルを 1 回なめて圧縮する
//!
//! # フロー（1 ファイルごと、パス順に逐次）
//! 0. このプロセスが repack した後に変更されていなければ skip
//! 1. 圧縮レベルを確認し、目標レベルなら skip
//!    （live mode で確認に失敗したら待たずに次のパスへ回す）
//! 2. live mode なら header を待つ（待つ間も圧縮レベルを確認する）
//! 3. 一時出力ファイルがあれば skip（別の repack が進行中）
//! 4. 一時ファイルへ repack し、成功したら元のパスへ rename
//! 5. 圧縮レベルを再確認
//! 6. 有効ならデータファイルと header をリモートコピー
//!
//! ファイル単位の失敗はログに残すだけで、次のパスで自然に再試行される。

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::app::readiness::{HeaderWait, Readiness, ReadinessPolicy};
use crate::app::shutdown::Shutdown;
use crate::domain::{
    CandidateFile, CandidatePattern, FileOutcome, PassReport, RemoteCopyStatus, RepackError,
};
use crate::ports::{Clock, Compressor, FileSystem, RemoteCopier};

pub struct RepackPass {
    pub(crate) fs: Arc<dyn FileSystem>,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) compressor: Arc<dyn Compressor>,
    pub(crate) copier: Option<Arc<dyn RemoteCopier>>,
    pub(crate) directory: PathBuf,
    pub(crate) pattern: CandidatePattern,
    pub(crate) level: u8,
    /// Some なら live mode（header を待つ）
    pub(crate) readiness: Option<ReadinessPolicy>,
    pub(crate) finished: FinishedFiles,
}

/// このプロセスが置き換えたファイルと、置き換え直後の mtime
///
/// repack 後のデータファイルは header より新しくなるので、
/// 圧縮レベルが dump に現れないファイルでも再び header を待たないようにする。
#[derive(Debug, Default)]
pub(crate) struct FinishedFiles {
    files: Mutex<HashMap<PathBuf, DateTime<Utc>>>,
}

impl FinishedFiles {
    fn record(&self, path: &Path, modified: DateTime<Utc>) {
        self.lock().insert(path.to_path_buf(), modified);
    }

    /// 記録時から mtime が変わっていないか（producer が上書きしたら false）
    fn unchanged(&self, path: &Path, modified: Option<DateTime<Utc>>) -> bool {
        modified.is_some_and(|m| self.lock().get(path) == Some(&m))
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<PathBuf, DateTime<Utc>>> {
        self.files.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl RepackPass {
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// 一覧の失敗をそのまま返す
    pub fn try_candidates(&self) -> Result<Vec<CandidateFile>, RepackError> {
        let paths = self
            .fs
            .list_dir(&self.directory)
            .map_err(|e| RepackError::io(&self.directory, e))?;
        Ok(self.pattern.select(paths))
    }

    /// 一覧に失敗したら警告して空とみなす（live mode ではディレクトリがまだないことがある）
    pub fn candidates(&self) -> Vec<CandidateFile> {
        self.try_candidates().unwrap_or_else(|err| {
            warn!(error = %err, "failed to list candidate files");
            Vec::new()
        })
    }

    pub fn census(&self) -> usize {
        self.candidates().len()
    }

    /// 現在の候補すべてに対してパスを実行する
    pub async fn run(&self, shutdown: &mut Shutdown) -> PassReport {
        let candidates = self.candidates();
        self.run_on(&candidates, shutdown).await
    }

    pub async fn run_on(&self, candidates: &[CandidateFile], shutdown: &mut Shutdown) -> PassReport {
        let mut report = PassReport::default();
        for file in candidates {
            if shutdown.is_requested() {
                break;
            }
            let outcome = self.process(file, shutdown).await;
            report.record(&outcome);
            if outcome == FileOutcome::Cancelled {
                break;
            }
        }
        debug!(?report, directory = %self.directory.display(), "repack pass finished");
        report
    }

    async fn is_compressed(&self, path: &Path) -> Result<bool, RepackError> {
        self.compressor.is_compressed(path, self.level).await
    }

    fn modified(&self, path: &Path) -> Option<DateTime<Utc>> {
        self.fs.modified(path).ok().flatten()
    }

    async fn process(&self, file: &CandidateFile, shutdown: &mut Shutdown) -> FileOutcome {
        let path = file.path();

        if self.finished.unchanged(path, self.modified(path)) {
            debug!(file = %path.display(), "repacked earlier in this run, skipping");
            return FileOutcome::AlreadyCompressed;
        }

        match self.is_compressed(path).await {
            Ok(true) => {
                info!(
                    file = %path.display(),
                    kind = ?file.kind(),
                    level = self.level,
                    "already compressed, skipping"
                );
                return FileOutcome::AlreadyCompressed;
            }
            Ok(false) => {}
            // header 待ちの判定に使えないので、次のパスで確認し直す
            Err(err) if self.readiness.is_some() => {
                warn!(file = %path.display(), error = %err, "compression check failed, will retry next pass");
                return FileOutcome::Failed {
                    reason: err.to_string(),
                };
            }
            Err(err) => {
                debug!(file = %path.display(), error = %err, "compression check failed, repacking anyway");
            }
        }

        if let Some(policy) = self.readiness {
            let wait = HeaderWait {
                fs: &*self.fs,
                clock: &*self.clock,
                compressor: &*self.compressor,
                level: self.level,
            };
            match wait.wait(file, policy, shutdown).await {
                Readiness::Ready => {}
                Readiness::Compressed => return FileOutcome::AlreadyCompressed,
                Readiness::Gone => {
                    info!(file = %path.display(), "data file disappeared, skipping");
                    return FileOutcome::Vanished;
                }
                Readiness::Cancelled => return FileOutcome::Cancelled,
            }
        }

        let temp = file.temp_path();
        if self.fs.exists(&temp) {
            info!(
                file = %path.display(),
                temp = %temp.display(),
                "repack already in progress, skipping"
            );
            return FileOutcome::InProgress;
        }

        info!(file = %path.display(), level = self.level, "repacking");
        if let Err(err) = self.compressor.repack(path, &temp, self.level).await {
            warn!(file = %path.display(), error = %err, "repack failed, will retry next pass");
            self.discard_temp(&temp);
            return FileOutcome::Failed {
                reason: err.to_string(),
            };
        }

        if let Err(err) = self.fs.rename(&temp, path) {
            warn!(file = %path.display(), error = %err, "failed to replace original with repacked file");
            self.discard_temp(&temp);
            return FileOutcome::Failed {
                reason: RepackError::io(path, err).to_string(),
            };
        }

        if let Some(modified) = self.modified(path) {
            self.finished.record(path, modified);
        }

        if matches!(self.is_compressed(path).await, Ok(false)) {
            warn!(
                file = %path.display(),
                level = self.level,
                "file does not report target level after repack"
            );
        }

        let remote_copy = self.copy_remote(file).await;
        info!(file = %path.display(), ?remote_copy, "repacked");
        FileOutcome::Repacked { remote_copy }
    }

    /// 自分が作った一時ファイルを消す。残すと以後のパスが InProgress で止まる
    fn discard_temp(&self, temp: &Path) {
        if self.fs.exists(temp)
            && let Err(err) = self.fs.remove_file(temp)
        {
            warn!(temp = %temp.display(), error = %err, "failed to remove temporary output");
        }
    }

    async fn copy_remote(&self, file: &CandidateFile) -> RemoteCopyStatus {
        let Some(copier) = &self.copier else {
            return RemoteCopyStatus::Disabled;
        };
        let mut files = vec![file.path().to_path_buf()];
        if self.fs.exists(file.header_path()) {
            files.push(file.header_path().to_path_buf());
        }
        match copier.copy(&files).await {
            Ok(()) => RemoteCopyStatus::Copied,
            Err(err) => {
                warn!(file = %file.path().display(), error = %err, "remote copy failed");
                RemoteCopyStatus::Failed
            }
        }
    }
}
