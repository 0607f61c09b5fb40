//! LivenessProbe port - producer ジョブの生存確認
//!
//! # 実装
//! - ProcessProbe: プロセス表
//! - BatchSchedulerProbe: バッチスケジューラの long-form 照会
//! - FarmSchedulerProbe: ファームスケジューラのキュー一覧
//!
//! 結果はキャッシュしない。毎サイクル問い合わせる。

use async_trait::async_trait;

use crate::domain::RepackError;

#[async_trait]
pub trait LivenessProbe: Send + Sync {
    async fn is_alive(&self) -> Result<bool, RepackError>;
}
