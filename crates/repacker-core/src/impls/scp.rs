//! ScpCopier - 鍵認証済みの secure copy によるリモートコピー

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;

use crate::config::RemoteCopyConfig;
use crate::domain::RepackError;
use crate::ports::{CommandRunner, RemoteCopier};

pub struct ScpCopier {
    runner: Arc<dyn CommandRunner>,
    program: String,
    destination: String,
    identity_file: Option<PathBuf>,
}

impl ScpCopier {
    pub fn new(runner: Arc<dyn CommandRunner>, program: &str, destination: &str) -> Self {
        Self {
            runner,
            program: program.to_string(),
            destination: destination.to_string(),
            identity_file: None,
        }
    }

    pub fn with_identity_file(mut self, identity_file: PathBuf) -> Self {
        self.identity_file = Some(identity_file);
        self
    }

    /// 有効かつ宛先があるときだけ作る
    pub fn from_config(
        runner: Arc<dyn CommandRunner>,
        config: &RemoteCopyConfig,
    ) -> Option<Self> {
        if !config.enabled {
            return None;
        }
        let destination = config.destination.as_deref()?;
        let copier = Self::new(runner, &config.program, destination);
        Some(match &config.identity_file {
            Some(identity) => copier.with_identity_file(identity.clone()),
            None => copier,
        })
    }

    /// `-q -B` でプロンプトを出さない（パスワード認証にはフォールバックしない）
    pub fn args(&self, files: &[PathBuf]) -> Vec<String> {
        let mut args = vec!["-q".to_string(), "-B".to_string()];
        if let Some(identity) = &self.identity_file {
            args.push("-i".to_string());
            args.push(identity.display().to_string());
        }
        args.extend(files.iter().map(|f| f.display().to_string()));
        args.push(self.destination.clone());
        args
    }
}

#[async_trait]
impl RemoteCopier for ScpCopier {
    async fn copy(&self, files: &[PathBuf]) -> Result<(), RepackError> {
        if files.is_empty() {
            return Ok(());
        }
        self.runner
            .run(&self.program, &self.args(files))
            .await?
            .into_result(&self.program)?;
        Ok(())
    }
}
