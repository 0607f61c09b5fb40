//! Shutdown - 待ち時間を中断するためのシグナル
//!
//! `ShutdownTrigger` を drop してもシグナルは発火しない（永久に待つだけ）。

use std::time::Duration;

use tokio::sync::watch;

use crate::ports::Clock;

/// shutdown を要求する側
#[derive(Debug, Clone)]
pub struct ShutdownTrigger {
    tx: watch::Sender<bool>,
}

impl ShutdownTrigger {
    pub fn trigger(&self) {
        // receiver がすでにいなくても構わない
        let _ = self.tx.send(true);
    }
}

/// shutdown を待つ側
#[derive(Debug, Clone)]
pub struct Shutdown {
    rx: watch::Receiver<bool>,
}

pub fn channel() -> (ShutdownTrigger, Shutdown) {
    let (tx, rx) = watch::channel(false);
    (ShutdownTrigger { tx }, Shutdown { rx })
}

impl Shutdown {
    /// 発火しないシグナル（post-hoc mode やテスト用）
    pub fn never() -> Self {
        channel().1
    }

    pub fn is_requested(&self) -> bool {
        *self.rx.borrow()
    }

    /// 要求されるまで待つ。trigger 側が drop されたら永久に待つ
    pub async fn requested(&mut self) {
        loop {
            if *self.rx.borrow_and_update() {
                return;
            }
            if self.rx.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }

    /// `duration` 眠る。途中で shutdown が要求されたら true
    pub async fn sleep(&mut self, clock: &dyn Clock, duration: Duration) -> bool {
        if self.is_requested() {
            return true;
        }
        tokio::select! {
            _ = clock.sleep(duration) => self.is_requested(),
            _ = self.requested() => true,
        }
    }
}
