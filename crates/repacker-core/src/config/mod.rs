//! Config - デプロイ時に固定される設定
//!
//! 実行モード（live / post-hoc）は CLI 引数で決まり、ここには含めない。
//! すべての項目にデフォルトがあり、TOML ファイルで上書きできる。
//!
//! ```toml
//! compression_level = 6
//! poll_interval_secs = 5
//! file_types = "AL"
//! producer_config = "RAMSIN"
//!
//! [liveness]
//! mode = "batch"
//!
//! [remote_copy]
//! enabled = true
//! destination = "user@archive:/data/run1"
//! ```

pub mod producer;

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::{FileTypeFilter, RepackError};

pub use self::producer::ProducerConfig;

/// `--config` 未指定のときに探すファイル名
pub const DEFAULT_CONFIG_FILE: &str = "repacker.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RepackConfig {
    /// gzip 圧縮レベル（1..=9）
    pub compression_level: u8,
    pub poll_interval_secs: u64,
    /// header 出現後に待つ秒数
    pub settle_delay_secs: u64,
    pub header_poll_interval_secs: u64,
    pub file_types: FileTypeFilter,
    /// producer 側の設定ファイル（live mode でディレクトリを求める）
    pub producer_config: PathBuf,
    pub log_level: String,
    pub liveness: LivenessConfig,
    pub tools: ToolsConfig,
    pub remote_copy: RemoteCopyConfig,
}

impl Default for RepackConfig {
    fn default() -> Self {
        Self {
            compression_level: 6,
            poll_interval_secs: 5,
            settle_delay_secs: 2,
            header_poll_interval_secs: 1,
            file_types: FileTypeFilter::Both,
            producer_config: PathBuf::from("RAMSIN"),
            log_level: "info".to_string(),
            liveness: LivenessConfig::default(),
            tools: ToolsConfig::default(),
            remote_copy: RemoteCopyConfig::default(),
        }
    }
}

impl RepackConfig {
    /// TOML ファイルを読み込んで検証する
    pub fn load(path: &Path) -> Result<Self, RepackError> {
        let text = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => RepackError::ConfigNotFound(path.to_path_buf()),
            _ => RepackError::io(path, e),
        })?;
        let config = Self::from_toml(&text).map_err(|source| RepackError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// 明示されたファイル、なければ `repacker.toml`、それもなければデフォルト
    pub fn load_or_default(explicit: Option<&Path>) -> Result<Self, RepackError> {
        match explicit {
            Some(path) => Self::load(path),
            None if Path::new(DEFAULT_CONFIG_FILE).is_file() => {
                Self::load(Path::new(DEFAULT_CONFIG_FILE))
            }
            None => Ok(Self::default()),
        }
    }

    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// 範囲外の値を起動時に弾く（Fail-fast）
    pub fn validate(&self) -> Result<(), RepackError> {
        if !(1..=9).contains(&self.compression_level) {
            return Err(RepackError::InvalidConfig(format!(
                "compression_level must be within 1..=9, got {}",
                self.compression_level
            )));
        }
        if self.poll_interval_secs == 0 {
            return Err(RepackError::InvalidConfig(
                "poll_interval_secs must be greater than zero".into(),
            ));
        }
        if self.header_poll_interval_secs == 0 {
            return Err(RepackError::InvalidConfig(
                "header_poll_interval_secs must be greater than zero".into(),
            ));
        }
        if self.tools.repack.is_empty() || self.tools.dump.is_empty() {
            return Err(RepackError::InvalidConfig(
                "tools.repack and tools.dump must name a program".into(),
            ));
        }
        self.liveness.active_command().validate("liveness")?;
        if self.remote_copy.enabled {
            match &self.remote_copy.destination {
                Some(dest) if dest.contains(':') => {}
                Some(dest) => {
                    return Err(RepackError::InvalidConfig(format!(
                        "remote_copy.destination must look like user@host:path, got `{dest}`"
                    )));
                }
                None => {
                    return Err(RepackError::InvalidConfig(
                        "remote_copy.enabled requires remote_copy.destination".into(),
                    ));
                }
            }
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_secs(self.settle_delay_secs)
    }

    pub fn header_poll_interval(&self) -> Duration {
        Duration::from_secs(self.header_poll_interval_secs)
    }
}

/// producer の生存確認方法
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LivenessMode {
    /// プロセス表を直接引く
    #[default]
    Process,
    /// バッチスケジューラの long-form ジョブ照会
    Batch,
    /// ファームスケジューラのキュー一覧
    Farm,
}

/// 外部コマンド（program + args）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandSpec {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
}

impl CommandSpec {
    pub fn new(program: &str, args: &[&str]) -> Self {
        Self {
            program: program.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }

    fn validate(&self, section: &str) -> Result<(), RepackError> {
        if self.program.is_empty() {
            return Err(RepackError::InvalidConfig(format!(
                "{section} command must name a program"
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LivenessConfig {
    pub mode: LivenessMode,
    pub process_list: CommandSpec,
    pub batch_query: CommandSpec,
    pub farm_query: CommandSpec,
}

impl Default for LivenessConfig {
    fn default() -> Self {
        Self {
            mode: LivenessMode::Process,
            process_list: CommandSpec::new("ps", &["-e", "-o", "pid=,comm="]),
            batch_query: CommandSpec::new("qstat", &["-f"]),
            farm_query: CommandSpec::new("bjobs", &["-w"]),
        }
    }
}

impl LivenessConfig {
    /// mode で選ばれたコマンド
    pub fn active_command(&self) -> &CommandSpec {
        match self.mode {
            LivenessMode::Process => &self.process_list,
            LivenessMode::Batch => &self.batch_query,
            LivenessMode::Farm => &self.farm_query,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ToolsConfig {
    pub repack: String,
    pub dump: String,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            repack: "h5repack".to_string(),
            dump: "h5dump".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RemoteCopyConfig {
    pub enabled: bool,
    pub program: String,
    /// `user@host:path`
    pub destination: Option<String>,
    /// 鍵認証に使う秘密鍵（未指定なら ssh のデフォルト）
    pub identity_file: Option<PathBuf>,
}

impl Default for RemoteCopyConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            program: "scp".to_string(),
            destination: None,
            identity_file: None,
        }
    }
}
