//! RemoteCopier port - repack 済みファイルのリモートコピー

use std::path::PathBuf;

use async_trait::async_trait;

use crate::domain::RepackError;

#[async_trait]
pub trait RemoteCopier: Send + Sync {
    async fn copy(&self, files: &[PathBuf]) -> Result<(), RepackError>;
}
