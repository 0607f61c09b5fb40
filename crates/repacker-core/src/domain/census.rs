//! Census - パス前後の候補ファイル数

use serde::{Deserialize, Serialize};

/// FileCensus はパス開始時と終了時の候補数
///
/// ファイルの同一性は追わない。数が変わったかどうかだけが終了判定に使われる。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FileCensus {
    pub before: usize,
    pub after: usize,
}

impl FileCensus {
    pub fn new(before: usize, after: usize) -> Self {
        Self { before, after }
    }

    /// まだパスを走らせていない状態（0 == 0）
    pub fn stable() -> Self {
        Self::default()
    }

    /// パス中に新しいファイルが現れた（または消えた）か
    pub fn changed(&self) -> bool {
        self.before != self.after
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_census_is_stable() {
        assert!(!FileCensus::stable().changed());
    }

    #[test]
    fn differing_counts_are_a_change() {
        assert!(FileCensus::new(3, 4).changed());
        assert!(FileCensus::new(4, 3).changed());
        assert!(!FileCensus::new(4, 4).changed());
    }
}
