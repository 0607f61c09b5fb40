//! InMemoryFileSystem - 開発・テスト用の FileSystem 実装
//!
//! mtime を任意に設定できるので、header 待ちの判定を実時間なしで検証できる。

use std::collections::{BTreeMap, BTreeSet};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};

use crate::ports::FileSystem;

#[derive(Debug, Clone, PartialEq, Eq)]
struct MemFile {
    modified: DateTime<Utc>,
    contents: Vec<u8>,
}

#[derive(Debug, Default)]
struct MemState {
    dirs: BTreeSet<PathBuf>,
    files: BTreeMap<PathBuf, MemFile>,
}

#[derive(Debug, Default)]
pub struct InMemoryFileSystem {
    state: Mutex<MemState>,
}

impl InMemoryFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_dir(&self, dir: impl AsRef<Path>) {
        self.lock().dirs.insert(normalize(dir.as_ref()));
    }

    /// ファイルを作成（または上書き）する。親ディレクトリも作る
    pub fn write(
        &self,
        path: impl AsRef<Path>,
        contents: impl Into<Vec<u8>>,
        modified: DateTime<Utc>,
    ) {
        let path = normalize(path.as_ref());
        let mut state = self.lock();
        if let Some(parent) = path.parent() {
            state.dirs.insert(parent.to_path_buf());
        }
        state.files.insert(
            path,
            MemFile {
                modified,
                contents: contents.into(),
            },
        );
    }

    /// mtime だけ更新する（存在しなければ空ファイルを作る）
    pub fn touch(&self, path: impl AsRef<Path>, modified: DateTime<Utc>) {
        let path = normalize(path.as_ref());
        let existing = self.lock().files.get(&path).map(|f| f.contents.clone());
        self.write(path, existing.unwrap_or_default(), modified);
    }

    pub fn contents(&self, path: impl AsRef<Path>) -> Option<Vec<u8>> {
        self.lock()
            .files
            .get(&normalize(path.as_ref()))
            .map(|f| f.contents.clone())
    }

    fn lock(&self) -> MutexGuard<'_, MemState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// `out/` と `out`、`./out` と `out` を同じキーにする
fn normalize(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| !matches!(c, std::path::Component::CurDir))
        .collect()
}

fn not_found(path: &Path) -> io::Error {
    io::Error::new(
        io::ErrorKind::NotFound,
        format!("{} does not exist", path.display()),
    )
}

impl FileSystem for InMemoryFileSystem {
    fn list_dir(&self, dir: &Path) -> io::Result<Vec<PathBuf>> {
        let dir = normalize(dir);
        let state = self.lock();
        if !state.dirs.contains(&dir) {
            return Err(not_found(&dir));
        }
        Ok(state
            .files
            .keys()
            .filter(|p| p.parent() == Some(dir.as_path()))
            .cloned()
            .collect())
    }

    fn modified(&self, path: &Path) -> io::Result<Option<DateTime<Utc>>> {
        Ok(self.lock().files.get(&normalize(path)).map(|f| f.modified))
    }

    fn exists(&self, path: &Path) -> bool {
        let path = normalize(path);
        let state = self.lock();
        state.files.contains_key(&path) || state.dirs.contains(&path)
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        let mut state = self.lock();
        let file = state
            .files
            .remove(&normalize(from))
            .ok_or_else(|| not_found(from))?;
        state.files.insert(normalize(to), file);
        Ok(())
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        self.lock()
            .files
            .remove(&normalize(path))
            .map(|_| ())
            .ok_or_else(|| not_found(path))
    }
}
