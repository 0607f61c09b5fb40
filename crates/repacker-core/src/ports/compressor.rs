//! Compressor port - 圧縮ツールの抽象化

use std::path::Path;

use async_trait::async_trait;

use crate::domain::RepackError;

#[async_trait]
pub trait Compressor: Send + Sync {
    /// ファイルがすでに `level` で圧縮されているか（メタデータを調べる）
    async fn is_compressed(&self, path: &Path, level: u8) -> Result<bool, RepackError>;

    /// `src` を圧縮して `dst` に書き出す。`src` は変更しない
    async fn repack(&self, src: &Path, dst: &Path, level: u8) -> Result<(), RepackError>;
}
