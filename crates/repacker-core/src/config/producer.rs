//! ProducerConfig - シミュレーション側の設定ファイル（RAMSIN）の読み取り
//!
//! 必要なのは出力先 prefix のキーだけ:
//!
//! ```text
//!    AFILEPREF   'z.test02/NOBAK/run'
//! ```
//!
//! 値のディレクトリ部分が live mode の監視対象になる。

use std::path::{Path, PathBuf};

use crate::domain::RepackError;

/// 出力ファイル prefix を表すキー
pub const PREFIX_KEY: &str = "AFILEPREF";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProducerConfig {
    output_prefix: String,
}

impl ProducerConfig {
    /// ファイルを読み込んで解析する。ファイルがなければ Precondition エラー。
    pub fn read(path: &Path) -> Result<Self, RepackError> {
        let text = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => RepackError::ProducerConfigNotFound(path.to_path_buf()),
            _ => RepackError::io(path, e),
        })?;
        Self::parse(&text)
    }

    /// 最初に現れた `AFILEPREF` 行の single-quote 値を取り出す
    ///
    /// - 行頭の空白は任意
    /// - `!` で始まる行はコメント
    /// - キーと値の間の空白と `=` は読み飛ばす
    pub fn parse(text: &str) -> Result<Self, RepackError> {
        for line in text.lines() {
            let trimmed = line.trim_start();
            if trimmed.starts_with('!') {
                continue;
            }
            let Some(rest) = trimmed.strip_prefix(PREFIX_KEY) else {
                continue;
            };
            // AFILEPREFX のような別キーは対象外
            if !rest.starts_with(|c: char| c.is_whitespace() || c == '=') {
                continue;
            }
            let value = rest.trim_start_matches(|c: char| c.is_whitespace() || c == '=');
            let quoted = value
                .strip_prefix('\'')
                .and_then(|v| v.find('\'').map(|end| &v[..end]));
            return match quoted {
                Some(prefix) => Ok(Self {
                    output_prefix: prefix.to_string(),
                }),
                None => Err(RepackError::ProducerValueUnquoted {
                    key: PREFIX_KEY,
                    line: line.to_string(),
                }),
            };
        }
        Err(RepackError::ProducerKeyMissing { key: PREFIX_KEY })
    }

    /// 設定値そのまま（例: `z.test02/NOBAK/run`）
    pub fn output_prefix(&self) -> &str {
        &self.output_prefix
    }

    /// 最後の `/` までを含むディレクトリ部分。`/` がなければ `./`
    pub fn watched_directory(&self) -> PathBuf {
        match self.output_prefix.rfind('/') {
            Some(idx) => PathBuf::from(&self.output_prefix[..=idx]),
            None => PathBuf::from("./"),
        }
    }

    /// 最後の `/` より後ろ。データファイル名の prefix になる
    pub fn file_prefix(&self) -> Option<&str> {
        let name = match self.output_prefix.rfind('/') {
            Some(idx) => &self.output_prefix[idx + 1..],
            None => self.output_prefix.as_str(),
        };
        (!name.is_empty()).then_some(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn derives_watched_directory_from_prefix() {
        let cfg = ProducerConfig::parse("   AFILEPREF   'z.test02/NOBAK/run'\n").unwrap();
        assert_eq!(cfg.output_prefix(), "z.test02/NOBAK/run");
        assert_eq!(cfg.watched_directory(), PathBuf::from("z.test02/NOBAK/"));
        assert_eq!(cfg.file_prefix(), Some("run"));
    }

    #[test]
    fn finds_key_among_other_namelist_entries() {
        let text = "\
$MODEL_FILE_INFO
   TIMMAX   = 3600.,
   AFILEPREFX = 'ignored/',
!  AFILEPREF = 'commented/out',
   AFILEPREF = 'output/run1',
   HFILIN = 'hist/h',
$END
";
        let cfg = ProducerConfig::parse(text).unwrap();
        assert_eq!(cfg.watched_directory(), PathBuf::from("output/"));
        assert_eq!(cfg.file_prefix(), Some("run1"));
    }

    #[rstest]
    #[case::bare_name("run", "./", Some("run"))]
    #[case::trailing_slash("out/", "out/", None)]
    #[case::absolute("/scratch/job/run", "/scratch/job/", Some("run"))]
    fn splits_directory_and_prefix(
        #[case] value: &str,
        #[case] dir: &str,
        #[case] prefix: Option<&str>,
    ) {
        let cfg = ProducerConfig::parse(&format!("   AFILEPREF   '{value}'")).unwrap();
        assert_eq!(cfg.watched_directory(), PathBuf::from(dir));
        assert_eq!(cfg.file_prefix(), prefix);
    }

    #[test]
    fn missing_key_is_precondition_error() {
        let err = ProducerConfig::parse("   HFILIN = 'hist/h'\n").unwrap_err();
        assert!(matches!(err, RepackError::ProducerKeyMissing { .. }));
        assert!(err.kind().is_fatal());
    }

    #[test]
    fn unquoted_value_is_rejected() {
        let err = ProducerConfig::parse("   AFILEPREF = output/run1\n").unwrap_err();
        assert!(matches!(err, RepackError::ProducerValueUnquoted { .. }));
    }

    #[test]
    fn read_missing_file_is_precondition_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = ProducerConfig::read(&dir.path().join("RAMSIN")).unwrap_err();
        assert!(matches!(err, RepackError::ProducerConfigNotFound(_)));
    }

    #[test]
    fn read_parses_file_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("RAMSIN");
        std::fs::write(&path, "   AFILEPREF   'z.test02/NOBAK/run'\n").unwrap();
        let cfg = ProducerConfig::read(&path).unwrap();
        assert_eq!(cfg.watched_directory(), PathBuf::from("z.test02/NOBAK/"));
    }
}
