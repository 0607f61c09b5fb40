//! RepackerBuilder - 設定から Poller / PostHocRun を組み立てる
//!
//! # 学習ポイント
//! - Builder パターンの実装
//! - 起動時検証（Fail-fast 設計）
//! - ports の差し替え（テストでは fake を注入）

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::app::pass::{FinishedFiles, RepackPass};
use crate::app::poller::Poller;
use crate::app::posthoc::PostHocRun;
use crate::app::readiness::ReadinessPolicy;
use crate::config::{ProducerConfig, RepackConfig};
use crate::domain::{CandidatePattern, RepackError};
use crate::impls::{H5Tools, LocalFileSystem, ScpCopier, TokioCommandRunner, probe_for};
use crate::ports::{Clock, CommandRunner, Compressor, FileSystem, LivenessProbe, RemoteCopier, SystemClock};

/// RepackerBuilder は実行モードごとのランナーを構築
///
/// # 使用例
/// ```ignore
/// let poller = RepackerBuilder::new(config).build_live("rams_run1")?;
/// let summary = poller.run(shutdown).await;
/// ```
///
/// 明示されなかった port は本番用の実装で埋める。
pub struct RepackerBuilder {
    config: RepackConfig,
    clock: Option<Arc<dyn Clock>>,
    fs: Option<Arc<dyn FileSystem>>,
    runner: Option<Arc<dyn CommandRunner>>,
    compressor: Option<Arc<dyn Compressor>>,
    probe: Option<Arc<dyn LivenessProbe>>,
    copier: Option<Arc<dyn RemoteCopier>>,
}

impl RepackerBuilder {
    pub fn new(config: RepackConfig) -> Self {
        Self {
            config,
            clock: None,
            fs: None,
            runner: None,
            compressor: None,
            probe: None,
            copier: None,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn with_file_system(mut self, fs: Arc<dyn FileSystem>) -> Self {
        self.fs = Some(fs);
        self
    }

    /// 外部コマンドの実行方法（compressor / probe / copier の既定実装が使う）
    pub fn with_runner(mut self, runner: Arc<dyn CommandRunner>) -> Self {
        self.runner = Some(runner);
        self
    }

    pub fn with_compressor(mut self, compressor: Arc<dyn Compressor>) -> Self {
        self.compressor = Some(compressor);
        self
    }

    pub fn with_probe(mut self, probe: Arc<dyn LivenessProbe>) -> Self {
        self.probe = Some(probe);
        self
    }

    pub fn with_copier(mut self, copier: Arc<dyn RemoteCopier>) -> Self {
        self.copier = Some(copier);
        self
    }

    /// live mode: producer 設定からディレクトリを求め、ポーリングループを作る
    ///
    /// # 検証
    /// - job 識別子が空でない
    /// - 設定値が範囲内
    /// - producer 設定ファイルが存在し、prefix キーを含む
    pub fn build_live(self, job: &str) -> Result<Poller, RepackError> {
        let job = job.trim();
        if job.is_empty() {
            return Err(RepackError::Usage("job identifier must not be empty".into()));
        }
        self.config.validate()?;
        let producer = ProducerConfig::read(&self.config.producer_config)?;

        let mut pattern = CandidatePattern::new(self.config.file_types);
        if let Some(prefix) = producer.file_prefix() {
            pattern = pattern.with_prefix(prefix);
        }
        let readiness = ReadinessPolicy {
            poll_interval: self.config.header_poll_interval(),
            settle_delay: self.config.settle_delay(),
        };
        let poll_interval = self.config.poll_interval();
        let runner = self.runner();
        let probe = self
            .probe
            .clone()
            .unwrap_or_else(|| probe_for(&self.config.liveness, runner.clone(), job));
        let clock = self.clock();
        let pass = self.pass(runner, producer.watched_directory(), pattern, Some(readiness));

        Ok(Poller {
            pass,
            probe,
            clock,
            poll_interval,
            job: job.to_string(),
        })
    }

    /// post-hoc mode: 指定ディレクトリを 1 回だけ処理する
    ///
    /// ディレクトリが存在しなければ Precondition エラー。
    /// 候補が空かどうかは `PostHocRun::run` が外部ツールを呼ぶ前に確かめる。
    pub fn build_post_hoc(self, directory: &Path) -> Result<PostHocRun, RepackError> {
        self.config.validate()?;
        let fs = self.fs();
        if fs.list_dir(directory).is_err() {
            return Err(RepackError::DirectoryNotFound(directory.to_path_buf()));
        }
        let pattern = CandidatePattern::new(self.config.file_types);
        let runner = self.runner();
        let pass = self.pass(runner, directory.to_path_buf(), pattern, None);
        Ok(PostHocRun { pass })
    }

    fn clock(&self) -> Arc<dyn Clock> {
        self.clock.clone().unwrap_or_else(|| Arc::new(SystemClock))
    }

    fn fs(&self) -> Arc<dyn FileSystem> {
        self.fs.clone().unwrap_or_else(|| Arc::new(LocalFileSystem))
    }

    fn runner(&self) -> Arc<dyn CommandRunner> {
        self.runner
            .clone()
            .unwrap_or_else(|| Arc::new(TokioCommandRunner))
    }

    fn pass(
        &self,
        runner: Arc<dyn CommandRunner>,
        directory: PathBuf,
        pattern: CandidatePattern,
        readiness: Option<ReadinessPolicy>,
    ) -> RepackPass {
        let compressor = self
            .compressor
            .clone()
            .unwrap_or_else(|| Arc::new(H5Tools::new(runner.clone(), &self.config.tools)));
        let copier = self.copier.clone().or_else(|| {
            ScpCopier::from_config(runner, &self.config.remote_copy)
                .map(|c| Arc::new(c) as Arc<dyn RemoteCopier>)
        });
        RepackPass {
            fs: self.fs(),
            clock: self.clock(),
            compressor,
            copier,
            directory,
            pattern,
            level: self.config.compression_level,
            readiness,
            finished: FinishedFiles::default(),
        }
    }
}
