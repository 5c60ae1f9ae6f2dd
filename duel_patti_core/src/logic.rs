use crate::card::DrawPolicy;
use crate::config::{GameConfig, PayoutConfig};
use crate::error::SettlementRejection;
use crate::history::RoundHistory;
use crate::money::Amount;
use crate::rank::compare_hands;
use crate::state::*;
use chrono::Utc;
use parking_lot::Mutex;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::debug;

// --- 结算 ---

/// 根据一局的结果结算一张注单。纯函数，无副作用。
///
/// - 开出平局且押平局: 赢，按平局赔率
/// - 押中的玩家获胜: 赢，按获胜赔率
/// - 其余情况: 输，派彩为 0，赔率记录该位置本应适用的赔率
///
/// 派彩 = 本金 × 赔率，截断到分，再以最高派彩封顶。
pub fn settle(wager: &Wager, result: &RoundResult, payout: &PayoutConfig) -> SettlementOutcome {
    let multiplier = match wager.chip {
        Side::Tie => payout.tie_multiplier,
        Side::Player1 | Side::Player2 => payout.win_multiplier,
    };

    let status = if wager.chip == result.winner {
        BetStatus::Win
    } else {
        BetStatus::Loss
    };

    let payout_amount = match status {
        BetStatus::Win => wager.stake.apply(multiplier).min(payout.max_cashout),
        BetStatus::Loss => Amount::ZERO,
    };

    SettlementOutcome {
        chip: wager.chip,
        stake: wager.stake,
        payout: payout_amount,
        multiplier,
        status,
    }
}

// --- 开局 ---

/// 生成每一局的结果，并把结果写入历史缓存。
///
/// 生成结果与写入历史在同一把锁内完成，任何读者都不会先看到结果、
/// 后看到历史；并发的请求也不会乱序写入。
pub struct RoundProducer {
    draw_policy: DrawPolicy,
    inner: Mutex<ProducerState>,
}

struct ProducerState {
    next_round_id: RoundId,
    accepting: bool,
    history: RoundHistory,
    rng: StdRng,
}

impl RoundProducer {
    pub fn new(config: &GameConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self::with_rng(config.draw_policy, config.history_capacity, rng)
    }

    pub fn with_rng(draw_policy: DrawPolicy, history_capacity: usize, rng: StdRng) -> Self {
        Self {
            draw_policy,
            inner: Mutex::new(ProducerState {
                next_round_id: 1,
                accepting: true,
                history: RoundHistory::with_capacity(history_capacity),
                rng,
            }),
        }
    }

    /// 开出新的一局
    pub fn new_round(&self) -> Result<RoundResult, SettlementRejection> {
        self.resolve_round(None)
    }

    /// 开出当前这一局。`expected` 指定了局号时，必须与当前开放的局号一致。
    pub fn resolve_round(&self, expected: Option<RoundId>) -> Result<RoundResult, SettlementRejection> {
        let mut state = self.inner.lock();

        if !state.accepting {
            return Err(SettlementRejection::NoActiveRound);
        }
        if let Some(requested) = expected {
            if requested != state.next_round_id {
                return Err(SettlementRejection::RoundClosed {
                    requested,
                    current: state.next_round_id,
                });
            }
        }

        let (hand1, hand2) = self.draw_policy.deal(&mut state.rng);
        let winner = compare_hands(&hand1, &hand2);
        let result = RoundResult {
            round_id: state.next_round_id,
            hand1,
            hand2,
            winner,
            created_at: Utc::now(),
        };

        state.history.record(result.clone());
        state.next_round_id += 1;

        debug!("第 {} 局: {} vs {} -> {}", result.round_id, result.hand1, result.hand2, result.winner);
        Ok(result)
    }

    /// 下一局将使用的局号
    pub fn open_round_id(&self) -> RoundId {
        self.inner.lock().next_round_id
    }

    /// 锁桌，之后的开局请求全部被拒绝
    pub fn close(&self) {
        self.inner.lock().accepting = false;
    }

    pub fn reopen(&self) {
        self.inner.lock().accepting = true;
    }

    pub fn history_snapshot(&self) -> Vec<RoundResult> {
        self.inner.lock().history.snapshot()
    }
}

// --- 单元测试 ---
