//! Poller - live mode のポーリングループ
//!
//! # フロー
//! 1. producer が生きている、または直前のパスで候補数が変わった間は繰り返す
//!    - パス前に census
//!    - repack パス
//!    - パス後に census
//!    - poll_interval 眠る
//! 2. ループを抜けたら最後にもう 1 回無条件でパスを実行する
//!    （最後の生存確認とプロセス終了の間に書かれたファイルを拾う）
//!
//! shutdown が要求されたら最終パスを行わずに戻る。

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::app::pass::RepackPass;
use crate::app::shutdown::Shutdown;
use crate::domain::{FileCensus, PassReport};
use crate::observability::{ExitReason, RunMode, RunSummary, elapsed_secs};
use crate::ports::{Clock, LivenessProbe};

pub struct Poller {
    pub(crate) pass: RepackPass,
    pub(crate) probe: Arc<dyn LivenessProbe>,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) poll_interval: Duration,
    pub(crate) job: String,
}

impl Poller {
    pub fn pass(&self) -> &RepackPass {
        &self.pass
    }

    /// probe の失敗は「まだ生きている」とみなす（取りこぼすより待つほうが安全）
    async fn producer_alive(&self) -> bool {
        match self.probe.is_alive().await {
            Ok(alive) => alive,
            Err(err) => {
                warn!(job = %self.job, error = %err, "liveness check failed, assuming producer is running");
                true
            }
        }
    }

    pub async fn run(&self, mut shutdown: Shutdown) -> RunSummary {
        let mut totals = PassReport::default();
        let mut census = FileCensus::stable();
        let mut cycles: u64 = 0;
        let started = self.clock.now();

        info!(
            job = %self.job,
            directory = %self.pass.directory().display(),
            poll_interval_secs = self.poll_interval.as_secs(),
            "watching for new output files"
        );

        loop {
            if shutdown.is_requested() {
                return self.interrupted(started, cycles, totals);
            }
            let alive = self.producer_alive().await;
            if !alive && !census.changed() {
                break;
            }

            let before = self.pass.census();
            let report = self.pass.run(&mut shutdown).await;
            let after = self.pass.census();
            census = FileCensus::new(before, after);
            totals.merge(&report);
            cycles += 1;
            debug!(cycle = cycles, alive, before, after, "poll cycle finished");

            if shutdown.sleep(&*self.clock, self.poll_interval).await {
                return self.interrupted(started, cycles, totals);
            }
        }

        info!(job = %self.job, cycles, "producer finished and file count settled, running final pass");
        let report = self.pass.run(&mut shutdown).await;
        totals.merge(&report);
        if shutdown.is_requested() {
            return self.interrupted(started, cycles, totals);
        }

        let elapsed_secs = elapsed_secs(started, self.clock.now());
        info!(
            job = %self.job,
            repacked = totals.repacked,
            failed = totals.failed,
            elapsed_secs,
            "done"
        );
        RunSummary {
            mode: RunMode::Live,
            passes: cycles + 1,
            exit_reason: ExitReason::Completed,
            elapsed_secs,
            totals,
        }
    }

    fn interrupted(&self, started: DateTime<Utc>, cycles: u64, totals: PassReport) -> RunSummary {
        info!(job = %self.job, cycles, "shutdown requested, stopping");
        RunSummary {
            mode: RunMode::Live,
            passes: cycles,
            exit_reason: ExitReason::Interrupted,
            elapsed_secs: elapsed_secs(started, self.clock.now()),
            totals,
        }
    }
}
