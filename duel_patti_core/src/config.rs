use crate::card::DrawPolicy;
use crate::error::ConfigError;
use crate::history::DEFAULT_HISTORY_CAPACITY;
use crate::money::{Amount, Multiplier};
use serde::{Deserialize, Serialize};

/// 结算相关的配置
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayoutConfig {
    /// 单张注单的最高派彩
    pub max_cashout: Amount,
    pub win_multiplier: Multiplier,
    pub tie_multiplier: Multiplier,
}

impl Default for PayoutConfig {
    fn default() -> Self {
        Self {
            max_cashout: Amount::from_major(10_000),
            win_multiplier: Multiplier::from_hundredths(198),
            tie_multiplier: Multiplier::from_hundredths(50),
        }
    }
}

/// 一张牌桌的完整配置，全部由外部提供
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameConfig {
    pub payout: PayoutConfig,
    pub history_capacity: usize,
    pub draw_policy: DrawPolicy,
    /// 固定随机种子，便于复现；None 时使用系统熵
    pub seed: Option<u64>,
    /// RD 请求生成的结果是否也广播给整个房间
    pub broadcast_requested_rounds: bool,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            payout: PayoutConfig::default(),
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            draw_policy: DrawPolicy::default(),
            seed: None,
            broadcast_requested_rounds: false,
        }
    }
}

impl GameConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.payout.max_cashout.is_positive() {
            return Err(ConfigError::InvalidValue(
                "max_cashout must be greater than 0".to_string(),
            ));
        }

        if self.payout.win_multiplier.hundredths() == 0 {
            return Err(ConfigError::InvalidValue(
                "win_multiplier must be greater than 0".to_string(),
            ));
        }

        if self.history_capacity == 0 {
            return Err(ConfigError::InvalidValue(
                "history_capacity must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}
