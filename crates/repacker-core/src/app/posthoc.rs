//! PostHocRun - 終了済みジョブの出力ディレクトリを 1 回だけ処理する

use tracing::info;

use crate::app::pass::RepackPass;
use crate::app::shutdown::Shutdown;
use crate::domain::RepackError;
use crate::observability::{ExitReason, RunMode, RunSummary, elapsed_secs};
use crate::ports::Clock;

pub struct PostHocRun {
    pub(crate) pass: RepackPass,
}

impl PostHocRun {
    pub fn pass(&self) -> &RepackPass {
        &self.pass
    }

    /// 候補が 1 つもなければ、外部ツールを呼ぶ前に Precondition エラー
    pub async fn run(&self, mut shutdown: Shutdown) -> Result<RunSummary, RepackError> {
        let started = self.pass.clock.now();
        let directory = self.pass.directory();
        let candidates = self.pass.try_candidates().map_err(|err| match err {
            RepackError::Io { source, .. } if source.kind() == std::io::ErrorKind::NotFound => {
                RepackError::DirectoryNotFound(directory.to_path_buf())
            }
            other => other,
        })?;
        if candidates.is_empty() {
            return Err(RepackError::NoCandidates(directory.to_path_buf()));
        }

        info!(
            directory = %directory.display(),
            files = candidates.len(),
            "repacking existing output"
        );
        let totals = self.pass.run_on(&candidates, &mut shutdown).await;
        let exit_reason = if shutdown.is_requested() {
            ExitReason::Interrupted
        } else {
            ExitReason::Completed
        };
        info!(repacked = totals.repacked, failed = totals.failed, "done");

        Ok(RunSummary {
            mode: RunMode::PostHoc,
            passes: 1,
            exit_reason,
            elapsed_secs: elapsed_secs(started, self.pass.clock.now()),
            totals,
        })
    }
}
