//! Observability - 実行結果のサマリ（`--json` で出力される）

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::PassReport;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    Live,
    PostHoc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitReason {
    /// live: producer 終了かつ候補数が安定 / post-hoc: 1 パス完了
    Completed,
    /// shutdown が要求された
    Interrupted,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub mode: RunMode,
    pub passes: u64,
    pub exit_reason: ExitReason,
    /// 開始から終了までの経過秒（Clock 基準）
    pub elapsed_secs: u64,
    pub totals: PassReport,
}

/// `started` から `now` までの秒数（時計が戻った場合は 0）
pub fn elapsed_secs(started: DateTime<Utc>, now: DateTime<Utc>) -> u64 {
    u64::try_from((now - started).num_seconds()).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_serializes_with_snake_case_enums() {
        let summary = RunSummary {
            mode: RunMode::PostHoc,
            passes: 1,
            exit_reason: ExitReason::Completed,
            elapsed_secs: 12,
            totals: PassReport {
                repacked: 1,
                ..Default::default()
            },
        };
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["mode"], "post_hoc");
        assert_eq!(json["exit_reason"], "completed");
        assert_eq!(json["totals"]["repacked"], 1);
        assert_eq!(json["elapsed_secs"], 12);
    }

    #[test]
    fn elapsed_never_goes_negative() {
        let start = DateTime::<Utc>::default();
        let later = start + chrono::Duration::seconds(90);
        assert_eq!(elapsed_secs(start, later), 90);
        assert_eq!(elapsed_secs(later, start), 0);
    }
}
