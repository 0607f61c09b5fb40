//! Candidate - 圧縮対象ファイルの命名規則
//!
//! 対象は `<prefix>-<A|L>-<suffix>.h5` に一致するデータファイル。
//! 各データファイルには書き込み完了を示す header ファイルが隣に置かれる。

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

const DATA_EXTENSION: &str = ".h5";
const HEADER_SUFFIX: &str = "head.txt";
/// header 名を作るときに data ファイル名の末尾から落とすバイト数（`.h5` + 2 文字）
const HEADER_STRIP_LEN: usize = 5;
const TEMP_SUFFIX: &str = ".repack.tmp";

/// データファイルの種別（`-A-` analysis / `-L-` lite）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FileKind {
    Analysis,
    Lite,
}

impl FileKind {
    fn marker(self) -> &'static str {
        match self {
            FileKind::Analysis => "-A-",
            FileKind::Lite => "-L-",
        }
    }
}

/// どの種別を対象にするか（設定値 `"A"`, `"L"`, `"AL"`）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FileTypeFilter {
    #[serde(rename = "A")]
    Analysis,
    #[serde(rename = "L")]
    Lite,
    #[default]
    #[serde(rename = "AL")]
    Both,
}

impl FileTypeFilter {
    fn kinds(self) -> &'static [FileKind] {
        match self {
            FileTypeFilter::Analysis => &[FileKind::Analysis],
            FileTypeFilter::Lite => &[FileKind::Lite],
            FileTypeFilter::Both => &[FileKind::Analysis, FileKind::Lite],
        }
    }
}

/// CandidatePattern はファイル名が対象かどうかを判定する
///
/// prefix を指定しない場合は空でない任意の prefix を受け付ける（post-hoc mode 用）。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidatePattern {
    prefix: Option<String>,
    filter: FileTypeFilter,
}

impl CandidatePattern {
    pub fn new(filter: FileTypeFilter) -> Self {
        Self {
            prefix: None,
            filter,
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        self.prefix = (!prefix.is_empty()).then_some(prefix);
        self
    }

    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    pub fn filter(&self) -> FileTypeFilter {
        self.filter
    }

    /// ファイル名を分類する。対象外なら None。
    pub fn classify(&self, file_name: &str) -> Option<FileKind> {
        let stem = file_name.strip_suffix(DATA_EXTENSION)?;
        match &self.prefix {
            Some(prefix) => {
                let rest = stem.strip_prefix(prefix.as_str())?;
                self.kind_at(rest)
            }
            None => (1..stem.len())
                .filter(|&i| stem.is_char_boundary(i))
                .find_map(|i| self.kind_at(&stem[i..])),
        }
    }

    pub fn matches(&self, file_name: &str) -> bool {
        self.classify(file_name).is_some()
    }

    /// `-A-rest` / `-L-rest` の形で rest が空でなければ種別を返す
    fn kind_at(&self, s: &str) -> Option<FileKind> {
        self.filter.kinds().iter().copied().find(|kind| {
            s.strip_prefix(kind.marker())
                .is_some_and(|rest| !rest.is_empty())
        })
    }

    /// ディレクトリ一覧から対象ファイルを抜き出す（パス順）
    pub fn select(&self, paths: impl IntoIterator<Item = PathBuf>) -> Vec<CandidateFile> {
        let mut candidates: Vec<CandidateFile> = paths
            .into_iter()
            .filter_map(|path| {
                let kind = self.classify(path.file_name()?.to_str()?)?;
                CandidateFile::new(path, kind)
            })
            .collect();
        candidates.sort();
        candidates
    }
}

/// 同じディレクトリに置かれる header ファイルのパス
///
/// ファイル名の末尾 5 バイトを `head.txt` に置き換える。
/// `run-A-2000-01-01-000000-g1.h5` -> `run-A-2000-01-01-000000-head.txt`
pub fn header_path_for(path: &Path) -> Option<PathBuf> {
    let name = path.file_name()?.to_str()?;
    let cut = name.len().checked_sub(HEADER_STRIP_LEN)?;
    if cut == 0 || !name.is_char_boundary(cut) {
        return None;
    }
    Some(path.with_file_name(format!("{}{HEADER_SUFFIX}", &name[..cut])))
}

/// CandidateFile は圧縮対象のデータファイル
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct CandidateFile {
    path: PathBuf,
    header: PathBuf,
    kind: FileKind,
}

impl CandidateFile {
    /// header パスを導出できない名前は None
    pub fn new(path: PathBuf, kind: FileKind) -> Option<Self> {
        let header = header_path_for(&path)?;
        Some(Self { path, header, kind })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn header_path(&self) -> &Path {
        &self.header
    }

    pub fn kind(&self) -> FileKind {
        self.kind
    }

    /// repack の出力先。拡張子が `.h5` で終わらないので候補には数えられない。
    pub fn temp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(TEMP_SUFFIX);
        self.path.with_file_name(name)
    }
}
