//! Ports - 抽象化レイヤー
//!
//! このモジュールは Hexagonal Architecture の「ポート」を定義します。
//! 外部とのやり取り（時刻、ファイルシステム、外部コマンド、スケジューラ）は
//! すべて trait 越しに行い、ループ本体はテストで差し替え可能にしています。

pub mod clock;
pub mod command;
pub mod compressor;
pub mod filesystem;
pub mod liveness;
pub mod remote_copy;

// 主要な trait を再エクスポート
pub use self::clock::{Clock, FakeClock, SystemClock};
pub use self::command::{CommandOutput, CommandRunner};
pub use self::compressor::Compressor;
pub use self::filesystem::FileSystem;
pub use self::liveness::LivenessProbe;
pub use self::remote_copy::RemoteCopier;
