//! LivenessProbe の実装（プロセス表 / バッチスケジューラ / ファームスケジューラ）
//!
//! どの実装も「コマンドを 1 回実行して出力を数える」に帰着する。
//! 出力の解釈は純粋関数に分けてあり、コマンドなしでテストできる。

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::{CommandSpec, LivenessConfig, LivenessMode};
use crate::domain::RepackError;
use crate::ports::{CommandRunner, LivenessProbe};

/// ファームスケジューラがジョブなしのときに返すメッセージ
const FARM_NO_JOBS: &str = "No unfinished job found";

/// 設定された mode に対応する probe を作る
pub fn probe_for(
    config: &LivenessConfig,
    runner: Arc<dyn CommandRunner>,
    job: &str,
) -> Arc<dyn LivenessProbe> {
    match config.mode {
        LivenessMode::Process => Arc::new(ProcessProbe::new(
            runner,
            config.process_list.clone(),
            job,
        )),
        LivenessMode::Batch => Arc::new(BatchSchedulerProbe::new(
            runner,
            config.batch_query.clone(),
            job,
        )),
        LivenessMode::Farm => Arc::new(FarmSchedulerProbe::new(
            runner,
            config.farm_query.clone(),
            job,
        )),
    }
}

/// `pid comm` 形式のプロセス一覧に、pid かコマンド名が一致する行があるか
pub fn process_table_contains(listing: &str, job: &str) -> bool {
    listing.lines().any(|line| {
        let mut cols = line.split_whitespace();
        let pid = cols.next();
        let comm = cols.next();
        pid == Some(job) || comm == Some(job)
    })
}

/// long-form 照会で `Job_Name = <job>` の行数
pub fn batch_job_count(listing: &str, job: &str) -> usize {
    listing
        .lines()
        .filter_map(|line| line.split_once('='))
        .filter(|(key, value)| key.trim() == "Job_Name" && value.trim() == job)
        .count()
}

/// キュー一覧のいずれかの列がジョブ名と一致する行があるか（見出し行は除く）
pub fn farm_queue_contains(listing: &str, job: &str) -> bool {
    listing
        .lines()
        .filter(|line| !line.trim_start().starts_with("JOBID"))
        .any(|line| line.split_whitespace().any(|col| col == job))
}

/// プロセス表を直接引く
pub struct ProcessProbe {
    runner: Arc<dyn CommandRunner>,
    command: CommandSpec,
    job: String,
}

impl ProcessProbe {
    pub fn new(runner: Arc<dyn CommandRunner>, command: CommandSpec, job: &str) -> Self {
        Self {
            runner,
            command,
            job: job.to_string(),
        }
    }
}

#[async_trait]
impl LivenessProbe for ProcessProbe {
    async fn is_alive(&self) -> Result<bool, RepackError> {
        let output = self
            .runner
            .run(&self.command.program, &self.command.args)
            .await?
            .into_result(&self.command.program)?;
        Ok(process_table_contains(&output.stdout, &self.job))
    }
}

/// バッチスケジューラの long-form 照会
pub struct BatchSchedulerProbe {
    runner: Arc<dyn CommandRunner>,
    command: CommandSpec,
    job: String,
}

impl BatchSchedulerProbe {
    pub fn new(runner: Arc<dyn CommandRunner>, command: CommandSpec, job: &str) -> Self {
        Self {
            runner,
            command,
            job: job.to_string(),
        }
    }
}

#[async_trait]
impl LivenessProbe for BatchSchedulerProbe {
    async fn is_alive(&self) -> Result<bool, RepackError> {
        let output = self
            .runner
            .run(&self.command.program, &self.command.args)
            .await?
            .into_result(&self.command.program)?;
        Ok(batch_job_count(&output.stdout, &self.job) > 0)
    }
}

/// ファームスケジューラのキュー一覧
pub struct FarmSchedulerProbe {
    runner: Arc<dyn CommandRunner>,
    command: CommandSpec,
    job: String,
}

impl FarmSchedulerProbe {
    pub fn new(runner: Arc<dyn CommandRunner>, command: CommandSpec, job: &str) -> Self {
        Self {
            runner,
            command,
            job: job.to_string(),
        }
    }
}

#[async_trait]
impl LivenessProbe for FarmSchedulerProbe {
    async fn is_alive(&self) -> Result<bool, RepackError> {
        let output = self
            .runner
            .run(&self.command.program, &self.command.args)
            .await?;
        // キューが空だと非ゼロ終了する実装がある
        if !output.success() && output.stderr.contains(FARM_NO_JOBS) {
            return Ok(false);
        }
        let output = output.into_result(&self.command.program)?;
        Ok(farm_queue_contains(&output.stdout, &self.job))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::impls::ScriptedCommandRunner;
    use crate::ports::CommandOutput;
    use rstest::rstest;

    const PS_LISTING: &str = "    1 systemd\n 4242 rams-6.3\n 5151 bash\n";

    const QSTAT_LISTING: &str = "\
Job Id: 1234.head
    Job_Name = rams_run1
    Job_Owner = user@login
    job_state = R
Job Id: 1235.head
    Job_Name = rams_run10
    job_state = Q
";

    const BJOBS_LISTING: &str = "\
JOBID   USER    STAT  QUEUE      FROM_HOST   EXEC_HOST   JOB_NAME   SUBMIT_TIME
8812    user    RUN   normal     login1      node17      rams_run1  Oct 19 10:02
";

    #[rstest]
    #[case::by_pid("4242", true)]
    #[case::by_name("rams-6.3", true)]
    #[case::absent("9999", false)]
    #[case::partial_name("rams", false)]
    fn process_table_lookup(#[case] job: &str, #[case] expected: bool) {
        assert_eq!(process_table_contains(PS_LISTING, job), expected);
    }

    #[rstest]
    #[case::present("rams_run1", 1)]
    #[case::no_prefix_match("rams_run", 0)]
    #[case::other("other", 0)]
    fn batch_count_matches_whole_name(#[case] job: &str, #[case] expected: usize) {
        assert_eq!(batch_job_count(QSTAT_LISTING, job), expected);
    }

    #[test]
    fn farm_listing_skips_header() {
        assert!(farm_queue_contains(BJOBS_LISTING, "rams_run1"));
        assert!(!farm_queue_contains(BJOBS_LISTING, "JOB_NAME"));
        assert!(!farm_queue_contains(BJOBS_LISTING, "rams_run2"));
    }

    #[tokio::test]
    async fn probe_for_selects_configured_strategy() {
        let runner = Arc::new(ScriptedCommandRunner::new());
        runner.push_response("qstat", CommandOutput::ok(QSTAT_LISTING));
        let config = LivenessConfig {
            mode: LivenessMode::Batch,
            ..LivenessConfig::default()
        };

        let probe = probe_for(&config, runner.clone(), "rams_run1");

        assert!(probe.is_alive().await.unwrap());
        assert_eq!(runner.invocations_of("qstat")[0].args, vec!["-f"]);
        assert!(runner.invocations_of("ps").is_empty());
    }

    #[tokio::test]
    async fn process_table_reports_gone_job() {
        let runner = Arc::new(ScriptedCommandRunner::new());
        runner.push_response("ps", CommandOutput::ok(PS_LISTING));
        let probe = probe_for(&LivenessConfig::default(), runner, "31337");
        assert!(!probe.is_alive().await.unwrap());
    }

    #[tokio::test]
    async fn failed_scheduler_query_is_an_error() {
        let runner = Arc::new(ScriptedCommandRunner::new());
        runner.push_response("qstat", CommandOutput::failed(1, "cannot connect to server"));
        let probe = BatchSchedulerProbe::new(runner, CommandSpec::new("qstat", &["-f"]), "rams_run1");
        assert!(probe.is_alive().await.is_err());
    }

    #[tokio::test]
    async fn farm_empty_queue_means_gone() {
        let runner = Arc::new(ScriptedCommandRunner::new());
        runner.push_response("bjobs", CommandOutput::failed(255, "No unfinished job found\n"));
        let probe = FarmSchedulerProbe::new(runner, CommandSpec::new("bjobs", &["-w"]), "rams_run1");
        assert!(!probe.is_alive().await.unwrap());
    }
}
