use crate::state::RoundResult;
use std::collections::VecDeque;

pub const DEFAULT_HISTORY_CAPACITY: usize = 3;

/// 最近几局结果的环形缓存，供新连接的客户端回放。
/// 按完成顺序保存，超出容量时淘汰最旧的一局。
#[derive(Debug, Clone)]
pub struct RoundHistory {
    entries: VecDeque<RoundResult>,
    capacity: usize,
}

impl Default for RoundHistory {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_HISTORY_CAPACITY)
    }
}

impl RoundHistory {
    /// 容量至少为 1
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity + 1),
            capacity,
        }
    }

    pub fn record(&mut self, result: RoundResult) {
        self.entries.push_back(result);
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
    }

    /// 返回副本，调用方修改它不会影响缓存
    pub fn snapshot(&self) -> Vec<RoundResult> {
        self.entries.iter().cloned().collect()
    }

    pub fn latest(&self) -> Option<&RoundResult> {
        self.entries.back()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::Hand;
    use crate::state::Side;
    use chrono::Utc;

    fn result(round_id: u64) -> RoundResult {
        RoundResult {
            round_id,
            hand1: Hand::parse(&["10-S", "10-D"]).unwrap(),
            hand2: Hand::parse(&["3-H", "4-H"]).unwrap(),
            winner: Side::Player1,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_starts_empty() {
        let history = RoundHistory::default();
        assert!(history.is_empty());
        assert!(history.snapshot().is_empty());
        assert_eq!(history.capacity(), 3);
    }

    #[test]
    fn test_never_exceeds_capacity() {
        let mut history = RoundHistory::default();
        for id in 1..=50 {
            history.record(result(id));
            assert!(history.len() <= 3);
        }
        let ids: Vec<_> = history.snapshot().iter().map(|r| r.round_id).collect();
        assert_eq!(ids, vec![48, 49, 50]);
    }

    #[test]
    fn test_snapshot_is_a_copy() {
        let mut history = RoundHistory::default();
        history.record(result(1));
        let mut snap = history.snapshot();
        snap.clear();
        snap.push(result(99));
        assert_eq!(history.len(), 1);
        assert_eq!(history.latest().map(|r| r.round_id), Some(1));
    }

    #[test]
    fn test_zero_capacity_is_clamped() {
        let mut history = RoundHistory::with_capacity(0);
        history.record(result(1));
        history.record(result(2));
        assert_eq!(history.snapshot().len(), 1);
        assert_eq!(history.latest().map(|r| r.round_id), Some(2));
    }
}
