//! Domain model（候補ファイル、census、処理結果、エラー）

pub mod candidate;
pub mod census;
pub mod errors;
pub mod outcome;

pub use self::candidate::{CandidateFile, CandidatePattern, FileKind, FileTypeFilter, header_path_for};
pub use self::census::FileCensus;
pub use self::errors::{ErrorKind, RepackError};
pub use self::outcome::{FileOutcome, PassReport, RemoteCopyStatus};
