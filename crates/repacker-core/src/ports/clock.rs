//! Clock port - 時刻と sleep の抽象化
//!
//! ポーリングループの待ち時間はすべてここを通る。
//! テストでは FakeClock を使い、実時間を待たずに何回・何秒眠ったかを検証する。

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Clock は現在時刻と sleep を提供
///
/// # テスト容易性
/// - trait により時刻を差し替え可能
/// - テストでは FakeClock を使用
#[async_trait]
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    async fn sleep(&self, duration: Duration);
}

/// 本番用
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

#[async_trait]
impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// テスト用: sleep は即座に戻り、仮想時刻だけ進める
#[derive(Debug)]
pub struct FakeClock {
    state: Mutex<FakeClockState>,
}

#[derive(Debug)]
struct FakeClockState {
    now: DateTime<Utc>,
    sleeps: Vec<Duration>,
}

impl FakeClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            state: Mutex::new(FakeClockState {
                now: start,
                sleeps: Vec::new(),
            }),
        }
    }

    /// これまでの sleep 要求（順番どおり）
    pub fn sleeps(&self) -> Vec<Duration> {
        self.lock().sleeps.clone()
    }

    pub fn advance(&self, duration: Duration) {
        let mut state = self.lock();
        state.now += chrono::Duration::from_std(duration).unwrap_or_else(|_| chrono::Duration::zero());
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, FakeClockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for FakeClock {
    fn default() -> Self {
        Self::new(DateTime::<Utc>::default())
    }
}

#[async_trait]
impl Clock for FakeClock {
    fn now(&self) -> DateTime<Utc> {
        self.lock().now
    }

    async fn sleep(&self, duration: Duration) {
        {
            let mut state = self.lock();
            state.sleeps.push(duration);
        }
        self.advance(duration);
        // 他の future（shutdown 待ちなど）に実行機会を渡す
        tokio::task::yield_now().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[tokio::test]
    async fn fake_clock_records_sleeps_and_advances() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let clock = FakeClock::new(start);

        clock.sleep(Duration::from_secs(5)).await;
        clock.sleep(Duration::from_secs(2)).await;

        assert_eq!(
            clock.sleeps(),
            vec![Duration::from_secs(5), Duration::from_secs(2)]
        );
        assert_eq!(clock.now(), start + chrono::Duration::seconds(7));
    }

    #[test]
    fn system_clock_is_close_to_now() {
        let before = Utc::now();
        let now = SystemClock.now();
        assert!(now >= before);
    }
}
