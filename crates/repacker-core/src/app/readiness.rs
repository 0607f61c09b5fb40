//! Readiness - データファイルの書き込み完了判定（live mode のみ）
//!
//! producer はデータファイルを書き終えると header ファイルを書く。
//! header が存在し、かつデータファイルより古くなければ書き込み完了とみなす。
//! 同名ファイルが上書きされた場合、前回の header は古いので待ちに入る。

use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::app::shutdown::Shutdown;
use crate::domain::CandidateFile;
use crate::ports::{Clock, Compressor, FileSystem};

/// header を待つ間隔と、header 出現後の settle 時間
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadinessPolicy {
    pub poll_interval: Duration,
    pub settle_delay: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    Ready,
    /// 待っている間に目標レベルで圧縮済みになった
    Compressed,
    /// データファイルが消えた
    Gone,
    Cancelled,
}

/// header が存在し、データファイルの mtime 以降に更新されているか
pub fn header_is_fresh(data: DateTime<Utc>, header: Option<DateTime<Utc>>) -> bool {
    header.is_some_and(|header| header >= data)
}

fn mtime(fs: &dyn FileSystem, file: &Path) -> Option<DateTime<Utc>> {
    fs.modified(file).unwrap_or_else(|e| {
        warn!(file = %file.display(), error = %e, "failed to read modification time");
        None
    })
}

/// header 待ちに必要な ports
pub struct HeaderWait<'a> {
    pub fs: &'a dyn FileSystem,
    pub clock: &'a dyn Clock,
    pub compressor: &'a dyn Compressor,
    pub level: u8,
}

impl HeaderWait<'_> {
    /// header が新しくなるまで待ち、その後 settle 時間だけ待つ
    ///
    /// # フロー
    /// 1. data の mtime を読む。消えていれば `Gone`
    /// 2. header が fresh なら 5 へ
    /// 3. 圧縮レベルを確認し、目標レベルなら `Compressed`
    /// 4. `poll_interval` 眠って 1 に戻る（上限なし）
    /// 5. `settle_delay` 眠る
    ///
    /// どの sleep も shutdown で中断され、その場合は `Readiness::Cancelled`。
    pub async fn wait(
        &self,
        file: &CandidateFile,
        policy: ReadinessPolicy,
        shutdown: &mut Shutdown,
    ) -> Readiness {
        let mut announced = false;
        loop {
            let Some(data) = mtime(self.fs, file.path()) else {
                debug!(file = %file.path().display(), "data file disappeared");
                return Readiness::Gone;
            };
            if header_is_fresh(data, mtime(self.fs, file.header_path())) {
                break;
            }
            if announced && self.is_compressed(file.path()).await {
                debug!(file = %file.path().display(), "compressed while waiting for header");
                return Readiness::Compressed;
            }
            if !announced {
                debug!(
                    file = %file.path().display(),
                    header = %file.header_path().display(),
                    "waiting for header file"
                );
                announced = true;
            }
            if shutdown.sleep(self.clock, policy.poll_interval).await {
                return Readiness::Cancelled;
            }
        }

        if shutdown.sleep(self.clock, policy.settle_delay).await {
            return Readiness::Cancelled;
        }
        Readiness::Ready
    }

    async fn is_compressed(&self, path: &Path) -> bool {
        self.compressor
            .is_compressed(path, self.level)
            .await
            .unwrap_or(false)
    }
}
