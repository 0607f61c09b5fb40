//! FileSystem port - ディレクトリ一覧と mtime の抽象化
//!
//! 実装は `impls::LocalFileSystem`（std::fs）と `impls::InMemoryFileSystem`（テスト用）。

use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

pub trait FileSystem: Send + Sync {
    /// ディレクトリ直下の通常ファイル
    fn list_dir(&self, dir: &Path) -> io::Result<Vec<PathBuf>>;

    /// 最終更新時刻。ファイルが存在しなければ `Ok(None)`
    fn modified(&self, path: &Path) -> io::Result<Option<DateTime<Utc>>>;

    fn exists(&self, path: &Path) -> bool;

    /// `to` が存在すれば置き換える
    fn rename(&self, from: &Path, to: &Path) -> io::Result<()>;

    fn remove_file(&self, path: &Path) -> io::Result<()>;
}
