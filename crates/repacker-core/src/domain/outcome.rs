//! Outcome - 1 ファイル / 1 パスの処理結果

use serde::{Deserialize, Serialize};

/// リモートコピーの結果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemoteCopyStatus {
    Disabled,
    Copied,
    Failed,
}

/// FileOutcome は 1 パス中の 1 候補ファイルの結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    /// 圧縮して元のパスに置き換えた
    Repacked { remote_copy: RemoteCopyStatus },
    /// すでに目標レベルで圧縮済み
    AlreadyCompressed,
    /// 一時出力ファイルが存在する（別の repack が進行中）
    InProgress,
    /// 外部ツールの失敗など。次のパスで再試行される
    Failed { reason: String },
    /// header 待ちの間にデータファイルが消えた
    Vanished,
    /// header 待ちの間に shutdown が要求された
    Cancelled,
}

/// PassReport は 1 パス（または複数パスの合計）の集計
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassReport {
    pub repacked: usize,
    pub already_compressed: usize,
    pub in_progress: usize,
    pub failed: usize,
    pub cancelled: usize,
    pub vanished: usize,
    pub remote_copy_failures: usize,
}

impl PassReport {
    pub fn record(&mut self, outcome: &FileOutcome) {
        match outcome {
            FileOutcome::Repacked { remote_copy } => {
                self.repacked += 1;
                if *remote_copy == RemoteCopyStatus::Failed {
                    self.remote_copy_failures += 1;
                }
            }
            FileOutcome::AlreadyCompressed => self.already_compressed += 1,
            FileOutcome::InProgress => self.in_progress += 1,
            FileOutcome::Failed { .. } => self.failed += 1,
            FileOutcome::Vanished => self.vanished += 1,
            FileOutcome::Cancelled => self.cancelled += 1,
        }
    }

    pub fn merge(&mut self, other: &PassReport) {
        self.repacked += other.repacked;
        self.already_compressed += other.already_compressed;
        self.in_progress += other.in_progress;
        self.failed += other.failed;
        self.cancelled += other.cancelled;
        self.vanished += other.vanished;
        self.remote_copy_failures += other.remote_copy_failures;
    }

    /// 処理対象になったファイル数
    pub fn total(&self) -> usize {
        self.repacked
            + self.already_compressed
            + self.in_progress
            + self.failed
            + self.cancelled
            + self.vanished
    }
}
