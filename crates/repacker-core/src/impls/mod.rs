//! Impls - ports の実装
//!
//! # 本番用
//! - **LocalFileSystem**: std::fs
//! - **TokioCommandRunner**: tokio::process
//! - **H5Tools**: h5dump / h5repack による Compressor
//! - **ProcessProbe / BatchSchedulerProbe / FarmSchedulerProbe**: producer の生存確認
//! - **ScpCopier**: リモートコピー
//!
//! # 開発・テスト用
//! - **InMemoryFileSystem**: mtime を自由に設定できる FileSystem
//! - **ScriptedCommandRunner**: 呼び出しを記録し、用意した出力を返す

pub mod command;
pub mod h5tools;
pub mod liveness;
pub mod local_fs;
pub mod memory_fs;
pub mod scp;

// 主要な型を再エクスポート
pub use self::command::{Invocation, ScriptedCommandRunner, TokioCommandRunner};
pub use self::h5tools::H5Tools;
pub use self::liveness::{BatchSchedulerProbe, FarmSchedulerProbe, ProcessProbe, probe_for};
pub use self::local_fs::LocalFileSystem;
pub use self::memory_fs::InMemoryFileSystem;
pub use self::scp::ScpCopier;
