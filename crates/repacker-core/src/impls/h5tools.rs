//! H5Tools - HDF5 付属ツールによる Compressor 実装
//!
//! - 圧縮レベルの確認: `h5dump -pH <file>` の出力に `LEVEL <n>` が含まれるか
//! - 圧縮: `h5repack -f SHUF -f GZIP=<n> <src> <dst>`

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::config::ToolsConfig;
use crate::domain::RepackError;
use crate::ports::{CommandRunner, Compressor};

pub struct H5Tools {
    runner: Arc<dyn CommandRunner>,
    repack_program: String,
    dump_program: String,
}

impl H5Tools {
    pub fn new(runner: Arc<dyn CommandRunner>, tools: &ToolsConfig) -> Self {
        Self {
            runner,
            repack_program: tools.repack.clone(),
            dump_program: tools.dump.clone(),
        }
    }

    pub fn repack_args(src: &Path, dst: &Path, level: u8) -> Vec<String> {
        vec![
            "-f".to_string(),
            "SHUF".to_string(),
            "-f".to_string(),
            format!("GZIP={level}"),
            src.display().to_string(),
            dst.display().to_string(),
        ]
    }
}

/// dump 出力に `LEVEL <n>` が（大文字小文字を無視して）含まれるか
///
/// `LEVEL 6` が `LEVEL 60` にマッチしないよう、直後が数字なら不一致とする。
pub fn dump_reports_level(dump: &str, level: u8) -> bool {
    let haystack = dump.to_ascii_uppercase();
    let needle = format!("LEVEL {level}");
    haystack.match_indices(&needle).any(|(idx, _)| {
        !haystack[idx + needle.len()..]
            .starts_with(|c: char| c.is_ascii_digit())
    })
}

#[async_trait]
impl Compressor for H5Tools {
    async fn is_compressed(&self, path: &Path, level: u8) -> Result<bool, RepackError> {
        let args = vec!["-pH".to_string(), path.display().to_string()];
        let output = self
            .runner
            .run(&self.dump_program, &args)
            .await?
            .into_result(&self.dump_program)?;
        let compressed = dump_reports_level(&output.stdout, level);
        debug!(file = %path.display(), level, compressed, "inspected compression level");
        Ok(compressed)
    }

    async fn repack(&self, src: &Path, dst: &Path, level: u8) -> Result<(), RepackError> {
        let args = Self::repack_args(src, dst, level);
        self.runner
            .run(&self.repack_program, &args)
            .await?
            .into_result(&self.repack_program)?;
        Ok(())
    }
}
