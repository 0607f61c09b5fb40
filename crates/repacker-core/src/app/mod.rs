//! App - アプリケーション層
//!
//! このモジュールは、ports を組み合わせてアプリケーションロジックを実装します。
//!
//! # 主要コンポーネント
//! - **RepackerBuilder**: 設定と ports のワイヤリング
//! - **RepackPass**: 候補ファイルを 1 回なめて圧縮する
//! - **Poller**: live mode のポーリングループ
//! - **PostHocRun**: 終了済みジョブのディレクトリを 1 回だけ処理
//! - **readiness**: header ファイルによる書き込み完了判定
//! - **shutdown**: 待ち時間を中断するシグナル

pub mod builder;
pub mod pass;
pub mod poller;
pub mod posthoc;
pub mod readiness;
pub mod shutdown;

// 主要な型を再エクスポート
pub use self::builder::RepackerBuilder;
pub use self::pass::RepackPass;
pub use self::poller::Poller;
pub use self::posthoc::PostHocRun;
pub use self::readiness::{HeaderWait, Readiness, ReadinessPolicy, header_is_fresh};
pub use self::shutdown::{Shutdown, ShutdownTrigger};
